//! # partio
//!
//! Differentiable modularity pooling: soft graph clustering layers that
//! optimize a spectral relaxation of modularity, with collapse
//! regularization and optional diversity / fairness / group blends.
//!
//! The crate is a forward-computation core. One call to
//! [`ClusterPooling::forward`] takes dense node features plus one or more
//! sparse adjacencies and returns pooled cluster features, a soft assignment
//! matrix, and a [`LossLedger`] of scalar terms for the surrounding training
//! loop to descend on. Gradients, optimizers, and data loading live with the
//! caller; the layer consumes an already-configured [`DenseMap`].
//!
//! Nothing n × n is ever materialized: the modularity matrix is folded into
//! n × k and k × k products, which is what makes the layers usable on large
//! graphs. See the [`pool`] module docs for the math.
//!
//! ## Layers
//!
//! - [`ClusterPooling`]: soft assignments + pooled features + loss terms,
//!   with the objective selected per call via [`Objective`].
//! - [`GraphConv`] / [`EmbeddingConv`]: neighborhood propagation over a
//!   pre-normalized adjacency, with or without input features.
//!
//! ## Example
//!
//! ```rust
//! use ndarray::Array2;
//! use partio::graph::adjacency_from_edges;
//! use partio::{ClusterPooling, DenseMap, Objective};
//!
//! let adjacency =
//!     adjacency_from_edges(4, &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0), (3, 0, 1.0)])?;
//! let features = Array2::from_shape_fn((4, 3), |(i, j)| 0.25 * (i + j) as f64);
//!
//! let layer = ClusterPooling::new(DenseMap::orthogonal(3, 2, 1)?);
//! let out = layer.forward(&features, &adjacency, Objective::Modularity)?;
//!
//! // Every node got a distribution over the two clusters.
//! for row in out.assignments.rows() {
//!     assert!((row.sum() - 1.0).abs() < 1e-9);
//! }
//! println!("training scalar: {}", out.losses.total());
//! # Ok::<(), partio::Error>(())
//! ```

pub mod activation;
/// Error types used across `partio`.
pub mod error;
pub mod graph;
pub mod linear;
pub mod metrics;
pub mod pool;
pub mod propagate;

pub use activation::Activation;
pub use error::{Error, Result};
pub use linear::DenseMap;
pub use pool::{ClusterPooling, LossKind, LossLedger, Objective, PoolOutput};
pub use propagate::{EmbeddingConv, GraphConv};
