//! Sparse adjacency construction and accounting.
//!
//! Adjacencies are CSR matrices ([`sprs::CsMat`]) over `f64` edge weights.
//! Construction is symmetric (undirected semantics); degree accounting is by
//! column sums, so a weighted degree vector sums to twice the total edge
//! weight. That is the `2m` convention every modularity normalization in
//! this crate shares.

use ndarray::{Array1, Array2, Axis};
use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use sprs::{CsMat, TriMat};

use crate::error::{Error, Result};

/// Build a symmetric (n, n) CSR adjacency from an undirected weighted edge list.
///
/// Each `(i, j, w)` with `i != j` is stored in both directions; self-loops
/// are stored once. Duplicate pairs accumulate. Rejects out-of-range node
/// indices and negative weights.
pub fn adjacency_from_edges(n: usize, edges: &[(usize, usize, f64)]) -> Result<CsMat<f64>> {
    let mut tri = TriMat::new((n, n));
    for &(i, j, w) in edges {
        if i >= n || j >= n {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: i.max(j) + 1,
            });
        }
        if w < 0.0 {
            return Err(Error::InvalidParameter {
                name: "edge_weight",
                message: "edge weights must be non-negative",
            });
        }
        if i == j {
            tri.add_triplet(i, i, w);
        } else {
            tri.add_triplet(i, j, w);
            tri.add_triplet(j, i, w);
        }
    }
    let mat: CsMat<f64> = tri.to_csr();
    Ok(mat)
}

/// Unit-weight CSR adjacency from a petgraph undirected graph.
pub fn adjacency_from_graph<N, E>(graph: &UnGraph<N, E>) -> CsMat<f64> {
    let n = graph.node_count();
    let mut tri = TriMat::new((n, n));
    for edge in graph.edge_references() {
        let i = edge.source().index();
        let j = edge.target().index();
        if i == j {
            tri.add_triplet(i, i, 1.0);
        } else {
            tri.add_triplet(i, j, 1.0);
            tri.add_triplet(j, i, 1.0);
        }
    }
    tri.to_csr()
}

/// Weighted degree vector: column sums of the adjacency.
pub fn degree_vector(adjacency: &CsMat<f64>) -> Array1<f64> {
    let mut degrees = Array1::zeros(adjacency.cols());
    for row in adjacency.outer_iterator() {
        for (j, &w) in row.iter() {
            degrees[j] += w;
        }
    }
    degrees
}

/// Total edge weight under the `2m` convention: the sum of all degrees.
pub fn total_edge_weight(degrees: &Array1<f64>) -> f64 {
    degrees.sum()
}

/// Symmetrically normalized adjacency with self-loops:
/// `D^{-1/2} (A + I) D^{-1/2}` (Kipf & Welling 2017).
///
/// This is the form the propagation layers expect as input; pooling layers
/// consume the raw adjacency instead.
pub fn normalized_adjacency(adjacency: &CsMat<f64>) -> Result<CsMat<f64>> {
    let n = adjacency.rows();
    if n != adjacency.cols() {
        return Err(Error::ShapeMismatch {
            expected: format!("{n} x {n}"),
            actual: format!("{} x {}", adjacency.rows(), adjacency.cols()),
        });
    }

    // A + I, duplicates summed by CSR conversion.
    let mut tri = TriMat::new((n, n));
    for (i, row) in adjacency.outer_iterator().enumerate() {
        for (j, &w) in row.iter() {
            tri.add_triplet(i, j, w);
        }
    }
    for i in 0..n {
        tri.add_triplet(i, i, 1.0);
    }
    let with_loops: CsMat<f64> = tri.to_csr();

    // Self-loops guarantee strictly positive degrees.
    let degrees = degree_vector(&with_loops);
    let inv_sqrt = degrees.mapv(|d| 1.0 / d.sqrt());

    let mut scaled = TriMat::new((n, n));
    for (i, row) in with_loops.outer_iterator().enumerate() {
        for (j, &w) in row.iter() {
            scaled.add_triplet(i, j, w * inv_sqrt[i] * inv_sqrt[j]);
        }
    }
    Ok(scaled.to_csr())
}

/// Sparse-dense product `A · X`, O(nnz · cols) time, (rows(A), cols(X)) output.
///
/// The only place adjacency ever meets a dense matrix; nothing n x n is
/// materialized. Dimensions must agree (`A.cols() == X.nrows()`); layers
/// validate before calling.
pub fn spmm(adjacency: &CsMat<f64>, dense: &Array2<f64>) -> Array2<f64> {
    debug_assert_eq!(adjacency.cols(), dense.nrows());
    let mut out = Array2::zeros((adjacency.rows(), dense.ncols()));
    for (i, row) in adjacency.outer_iterator().enumerate() {
        let mut out_row = out.row_mut(i);
        for (j, &w) in row.iter() {
            out_row.scaled_add(w, &dense.row(j));
        }
    }
    out
}

/// Column sums of a dense matrix, shape (cols,).
pub(crate) fn column_sums(dense: &Array2<f64>) -> Array1<f64> {
    dense.sum_axis(Axis(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn ring4() -> CsMat<f64> {
        adjacency_from_edges(4, &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0), (3, 0, 1.0)]).unwrap()
    }

    #[test]
    fn test_from_edges_is_symmetric() {
        let adj = ring4();
        assert_eq!(adj.rows(), 4);
        assert_eq!(adj.cols(), 4);
        assert_eq!(adj.nnz(), 8);
        for (i, row) in adj.outer_iterator().enumerate() {
            for (j, &w) in row.iter() {
                assert_eq!(adj.get(j, i), Some(&w));
            }
        }
    }

    #[test]
    fn test_from_edges_rejects_out_of_range() {
        let err = adjacency_from_edges(2, &[(0, 5, 1.0)]).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn test_from_edges_rejects_negative_weight() {
        let err = adjacency_from_edges(2, &[(0, 1, -1.0)]).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }

    #[test]
    fn test_degrees_and_edge_weight() {
        let adj = ring4();
        let degrees = degree_vector(&adj);
        assert_eq!(degrees, array![2.0, 2.0, 2.0, 2.0]);
        // 4 unit edges, each counted twice.
        assert_eq!(total_edge_weight(&degrees), 8.0);
    }

    #[test]
    fn test_petgraph_bridge_matches_edge_list() {
        let mut graph = UnGraph::<(), ()>::new_undirected();
        let a = graph.add_node(());
        let b = graph.add_node(());
        let c = graph.add_node(());
        let _ = graph.add_edge(a, b, ());
        let _ = graph.add_edge(b, c, ());

        let adj = adjacency_from_graph(&graph);
        let expected = adjacency_from_edges(3, &[(0, 1, 1.0), (1, 2, 1.0)]).unwrap();
        assert_eq!(adj, expected);
    }

    #[test]
    fn test_spmm_matches_dense_product() {
        let adj = ring4();
        let x = array![[1.0, 0.0], [0.0, 1.0], [2.0, 0.0], [0.0, 2.0]];
        let out = spmm(&adj, &x);
        // Row i of a ring sums rows i-1 and i+1 of x.
        assert_eq!(out, array![[0.0, 3.0], [3.0, 0.0], [0.0, 3.0], [3.0, 0.0]]);
    }

    #[test]
    fn test_normalized_adjacency_rows_of_regular_graph() {
        // Every node of the 4-ring has degree 3 after self-loops, so each
        // entry of the normalized matrix is exactly 1/3.
        let norm = normalized_adjacency(&ring4()).unwrap();
        for row in norm.outer_iterator() {
            for (_, &w) in row.iter() {
                assert!((w - 1.0 / 3.0).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_normalized_adjacency_rejects_non_square() {
        let mut tri = TriMat::new((2, 3));
        tri.add_triplet(0, 1, 1.0);
        let rect: CsMat<f64> = tri.to_csr();
        let err = normalized_adjacency(&rect).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }
}
