//! The cluster-assignment pooling layer.

use ndarray::{Array2, ArrayViewMut1, Axis};
use rand::{Rng, RngCore};
use sprs::CsMat;

use crate::activation::Activation;
use crate::error::{Error, Result};
use crate::graph::{column_sums, degree_vector, total_edge_weight};
use crate::linear::DenseMap;
use crate::pool::objective::{LossKind, LossLedger, Objective};
use crate::pool::spectral::{collapse_loss, SIZE_EPSILON};

/// Everything one forward call produces.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolOutput {
    /// Cluster representations, (k, d), or (n, d) when unpooling.
    pub features: Array2<f64>,
    /// Soft assignments, (n, k); every row is a distribution over clusters.
    pub assignments: Array2<f64>,
    /// Scalar loss terms registered by this call.
    pub losses: LossLedger,
}

/// Soft modularity pooling layer (Tsitsulin et al. 2023).
///
/// Projects node features through a configured [`DenseMap`] into cluster
/// logits, softmaxes them into a soft partition, and derives pooled cluster
/// features plus the spectral and collapse loss terms that drive training.
/// Which spectral terms appear is decided by the [`Objective`] passed per
/// call.
///
/// The layer owns no mutable state: `forward` is deterministic, and all loss
/// terms come back in the returned [`PoolOutput`].
///
/// # Example
///
/// ```rust
/// use ndarray::Array2;
/// use partio::graph::adjacency_from_edges;
/// use partio::{ClusterPooling, DenseMap, Objective};
///
/// let adjacency =
///     adjacency_from_edges(4, &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0), (3, 0, 1.0)])?;
/// let features = Array2::from_shape_fn((4, 3), |(i, j)| 0.1 * (i * 3 + j) as f64);
///
/// let layer = ClusterPooling::new(DenseMap::orthogonal(3, 2, 7)?);
/// let out = layer.forward(&features, &adjacency, Objective::Modularity)?;
///
/// assert_eq!(out.assignments.dim(), (4, 2));
/// assert_eq!(out.features.dim(), (2, 3));
/// # Ok::<(), partio::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ClusterPooling {
    transform: DenseMap,
    collapse_weight: f64,
    dropout: f64,
    unpool: bool,
}

impl ClusterPooling {
    /// Wrap a configured linear map; k is its output dimension.
    ///
    /// Defaults: collapse weight 0.1, no dropout, no unpooling.
    pub fn new(transform: DenseMap) -> Self {
        Self {
            transform,
            collapse_weight: 0.1,
            dropout: 0.0,
            unpool: false,
        }
    }

    /// Set the collapse-regularization weight.
    pub fn with_collapse_weight(mut self, weight: f64) -> Self {
        self.collapse_weight = weight;
        self
    }

    /// Set the dropout rate applied to pre-softmax logits in
    /// [`forward_train`](Self::forward_train).
    pub fn with_dropout(mut self, rate: f64) -> Self {
        self.dropout = rate;
        self
    }

    /// Broadcast pooled features back to node level, preserving input shape.
    pub fn with_unpooling(mut self, unpool: bool) -> Self {
        self.unpool = unpool;
        self
    }

    /// Number of clusters k.
    pub fn n_clusters(&self) -> usize {
        self.transform.out_dim()
    }

    /// Deterministic forward pass (dropout never applied).
    pub fn forward(
        &self,
        features: &Array2<f64>,
        adjacency: &CsMat<f64>,
        objective: Objective<'_>,
    ) -> Result<PoolOutput> {
        self.run(features, adjacency, objective, None)
    }

    /// Training forward pass: inverted dropout on the pre-softmax logits,
    /// driven by a caller-owned RNG.
    pub fn forward_train(
        &self,
        features: &Array2<f64>,
        adjacency: &CsMat<f64>,
        objective: Objective<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<PoolOutput> {
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(Error::InvalidParameter {
                name: "dropout",
                message: "dropout rate must lie in [0, 1)",
            });
        }
        self.run(features, adjacency, objective, Some(rng))
    }

    fn run(
        &self,
        features: &Array2<f64>,
        adjacency: &CsMat<f64>,
        objective: Objective<'_>,
        dropout_rng: Option<&mut dyn RngCore>,
    ) -> Result<PoolOutput> {
        let n = features.nrows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if features.ncols() != self.transform.in_dim() {
            return Err(Error::DimensionMismatch {
                expected: self.transform.in_dim(),
                found: features.ncols(),
            });
        }
        if adjacency.rows() != adjacency.cols() {
            return Err(Error::ShapeMismatch {
                expected: format!("{n} x {n}"),
                actual: format!("{} x {}", adjacency.rows(), adjacency.cols()),
            });
        }
        if adjacency.rows() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: adjacency.rows(),
            });
        }
        if self.collapse_weight < 0.0 {
            return Err(Error::InvalidParameter {
                name: "collapse_weight",
                message: "collapse weight must be non-negative",
            });
        }
        objective.validate(n)?;

        let degrees = degree_vector(adjacency);
        let edge_weight = total_edge_weight(&degrees);
        if edge_weight <= 0.0 {
            return Err(Error::EdgelessGraph);
        }

        let k = self.n_clusters();
        let mut logits = self.transform.apply(features);
        if let Some(rng) = dropout_rng {
            apply_dropout(&mut logits, self.dropout, rng);
        }
        softmax_rows(&mut logits);
        let assignments = logits;

        // Size-invariant pooling weights; the epsilon floor keeps a fully
        // collapsed cluster from dividing by zero.
        let cluster_sizes = column_sums(&assignments);
        let safe_sizes = cluster_sizes.mapv(|s| s.max(SIZE_EPSILON));
        let pooling = &assignments / &safe_sizes;

        let mut losses = LossLedger::default();
        objective.accumulate(&mut losses, &assignments, adjacency, &degrees, edge_weight)?;
        losses.record(
            LossKind::Collapse,
            self.collapse_weight * collapse_loss(&cluster_sizes, n, k),
        );

        // Pooled features are per-cluster averages, fixed SELU on top.
        let mut pooled = pooling.t().dot(features);
        Activation::Selu.apply(&mut pooled);
        let features_out = if self.unpool {
            pooling.dot(&pooled)
        } else {
            pooled
        };

        Ok(PoolOutput {
            features: features_out,
            assignments,
            losses,
        })
    }
}

/// Inverted dropout: zero with probability `rate`, rescale survivors so the
/// expectation is unchanged.
fn apply_dropout(logits: &mut Array2<f64>, rate: f64, rng: &mut dyn RngCore) {
    if rate == 0.0 {
        return;
    }
    let keep = 1.0 - rate;
    for v in logits.iter_mut() {
        if rng.gen::<f64>() < rate {
            *v = 0.0;
        } else {
            *v /= keep;
        }
    }
}

/// Row-wise softmax with max subtraction.
fn softmax_rows(logits: &mut Array2<f64>) {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        logits
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .for_each(softmax_row);
    }
    #[cfg(not(feature = "parallel"))]
    for row in logits.axis_iter_mut(Axis(0)) {
        softmax_row(row);
    }
}

fn softmax_row(mut row: ArrayViewMut1<'_, f64>) {
    let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for v in row.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in row.iter_mut() {
        *v /= sum;
    }
}
