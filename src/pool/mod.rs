//! Differentiable modularity pooling.
//!
//! Given node features and a sparse adjacency, the pooling layer learns a
//! soft partition of the nodes into k clusters by descending on a
//! modularity-based objective, with no labels involved.
//!
//! ## The Modularity Objective
//!
//! Modularity compares the edge weight observed inside clusters to the
//! weight expected under a degree-preserving random null model:
//!
//! ```text
//! Q = (1/2m) × Σ_ij [A_ij − (d_i × d_j)/(2m)] × δ(c_i, c_j)
//! ```
//!
//! With a soft assignment matrix S (n × k, rows on the simplex), the hard
//! indicator δ relaxes to `trace(Sᵀ B S)` over the modularity matrix
//! `B = A − d·dᵀ/2m`. B is dense and n × n, which is fatal for large
//! graphs, so it is never formed. Instead:
//!
//! - `Sᵀ A S` is computed as a sparse-dense product `A·S` (O(edges·k))
//!   followed by a dense (k × n)·(n × k) product;
//! - the null-model term `Sᵀ d·dᵀ S` is the outer product of the (k,)
//!   vector `Sᵀd` with itself: rank one, so its trace is a sum of squares.
//!
//! Every intermediate is n × k, k × k, or k × d.
//!
//! ## Collapse Regularization
//!
//! Pure modularity descent happily parks every node in one cluster. The
//! collapse term `‖sizes‖₂/n·√k − 1` is zero for a perfectly balanced soft
//! partition and grows toward `√k − 1` as mass concentrates, and is always
//! registered alongside the spectral terms.
//!
//! ## Objectives
//!
//! [`Objective`] selects what the spectral machinery runs on: the primary
//! adjacency alone ([`Objective::Modularity`]), or a λ-blend with a
//! diversity, group, or protected-group-pair ("fairness") adjacency. The
//! λ = 0 / λ = 1 boundaries switch terms off entirely; see [`Objective`]
//! for the contract.
//!
//! ## Usage
//!
//! ```rust
//! use ndarray::Array2;
//! use partio::graph::adjacency_from_edges;
//! use partio::{ClusterPooling, DenseMap, LossKind, Objective};
//!
//! // Two triangles joined by one edge.
//! let adjacency = adjacency_from_edges(
//!     6,
//!     &[
//!         (0, 1, 1.0), (1, 2, 1.0), (0, 2, 1.0),
//!         (3, 4, 1.0), (4, 5, 1.0), (3, 5, 1.0),
//!         (2, 3, 1.0),
//!     ],
//! )?;
//! let features = Array2::from_shape_fn((6, 4), |(i, j)| ((i + 2 * j) % 5) as f64 * 0.2);
//!
//! let layer = ClusterPooling::new(DenseMap::orthogonal(4, 2, 42)?);
//! let out = layer.forward(&features, &adjacency, Objective::Modularity)?;
//!
//! assert!(out.losses.get(LossKind::Spectral).is_some());
//! assert!(out.losses.get(LossKind::Collapse).is_some());
//! # Ok::<(), partio::Error>(())
//! ```
//!
//! ## References
//!
//! - Tsitsulin, Palowitch, Perozzi, Müller (2023). "Graph Clustering with
//!   Graph Neural Networks." JMLR 24.
//! - Newman (2006). "Modularity and community structure in networks."
//! - Ying et al. (2018). "Hierarchical Graph Representation Learning with
//!   Differentiable Pooling."

mod layer;
mod objective;
mod spectral;

#[cfg(test)]
mod variant_tests;

pub use layer::{ClusterPooling, PoolOutput};
pub use objective::{LossKind, LossLedger, Objective};
