//! Low-rank spectral (modularity) loss and collapse regularization.
//!
//! The modularity matrix `B = A - d·dᵀ / 2m` is never formed: pooling with
//! the assignment matrix S turns `trace(Sᵀ B S)` into a (k, k) term computed
//! from `A · S` (O(nnz · k)) plus a rank-1 correction built from the (k,)
//! vector `Sᵀ d`. Nothing n x n is ever materialized.

use ndarray::{Array1, Array2};
use sprs::CsMat;

use crate::graph::spmm;

/// Floor applied to cluster sizes before they are used as divisors.
///
/// A cluster whose assignment mass collapses to zero would otherwise produce
/// a division by zero in the pooling-weight normalization.
pub(crate) const SIZE_EPSILON: f64 = 1e-12;

/// Negative soft modularity of `assignments` on `adjacency`.
///
/// ```text
/// loss = -trace(SᵀAᵀS - (Sᵀd)(dᵀS) / (2·w_own)) / (2·w_scale)
/// ```
///
/// `degrees` and `edge_weight_own` must belong to `adjacency` (they scope the
/// configuration null model); `edge_weight_scale` sets the scale of the loss
/// and is the primary graph's total edge weight when `adjacency` is an
/// auxiliary graph, so blended terms stay commensurable.
///
/// Minimizing this loss maximizes modularity. Edge weights are under the
/// `2m` convention (`edge_weight_* = Σ degrees`), and both weights must be
/// strictly positive; callers check before entering.
pub(crate) fn spectral_loss(
    adjacency: &CsMat<f64>,
    assignments: &Array2<f64>,
    degrees: &Array1<f64>,
    edge_weight_own: f64,
    edge_weight_scale: f64,
) -> f64 {
    // (A·S)ᵀ·S, a (k, k) pooled graph via one sparse and one dense product.
    let propagated = spmm(adjacency, assignments);
    let pooled = propagated.t().dot(assignments);

    // Rank-1 null-model correction: only its diagonal contributes to the
    // trace, so the (k, k) outer product reduces to a sum of squares.
    let pooled_degrees = assignments.t().dot(degrees);
    let null_trace = pooled_degrees.mapv(|v| v * v).sum() / (2.0 * edge_weight_own);

    let trace = pooled.diag().sum();
    -(trace - null_trace) / (2.0 * edge_weight_scale)
}

/// Collapse regularization: `‖sizes‖₂ / n · √k - 1`.
///
/// Zero when the soft partition is perfectly uniform (all sizes `n/k`),
/// `√k - 1` when all mass collapses onto a single cluster.
pub(crate) fn collapse_loss(cluster_sizes: &Array1<f64>, n_nodes: usize, n_clusters: usize) -> f64 {
    let norm = cluster_sizes.mapv(|s| s * s).sum().sqrt();
    norm / n_nodes as f64 * (n_clusters as f64).sqrt() - 1.0
}
