//! Loss-composition strategies for the pooling layer.
//!
//! The four layer flavors (plain, diversity-aware, fairness-aware,
//! group-aware) share the whole assignment/pooling computation and differ
//! only in which adjacency-derived loss terms they register and how a mixing
//! coefficient λ blends them. [`Objective`] encodes that difference as data:
//! each variant names the auxiliary graphs it needs, and
//! [`Objective::accumulate`] writes the resulting terms into a
//! [`LossLedger`].
//!
//! # The λ-boundary contract
//!
//! Whether a term exists in the ledger is decided by *exact* floating-point
//! comparison against 0.0 and 1.0. At λ = 0 the auxiliary term is skipped
//! entirely (its graph is never touched); at λ = 1 the base modularity term
//! is skipped for the diversity and group objectives. This is a control-flow
//! contract, not an optimization: the set of registered terms is part of the
//! API, and an edgeless auxiliary graph only errors when its term is
//! actually computed.

use ndarray::{Array1, Array2};
use sprs::CsMat;

use crate::error::{Error, Result};
use crate::graph::{degree_vector, total_edge_weight};
use crate::pool::spectral::spectral_loss;

/// Identity of a scalar loss term in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossKind {
    /// Negative modularity of the primary adjacency.
    Spectral,
    /// Collapse regularization (always present).
    Collapse,
    /// Diversity-graph spectral term, scaled by λ.
    Diversity,
    /// Absolute disparity between the red and blue group terms, scaled by λ.
    Fairness,
    /// Group-graph spectral term, scaled by λ.
    Group,
}

/// Ordered record of the scalar loss terms produced by one forward call.
///
/// Terms appear in registration order (auxiliary term, spectral term,
/// collapse term); a term suppressed by the λ-boundary contract is absent,
/// not zero.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LossLedger {
    terms: Vec<(LossKind, f64)>,
}

impl LossLedger {
    pub(crate) fn record(&mut self, kind: LossKind, value: f64) {
        self.terms.push((kind, value));
    }

    /// Value of the first term of the given kind, if registered.
    pub fn get(&self, kind: LossKind) -> Option<f64> {
        self.terms
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|&(_, v)| v)
    }

    /// Sum of all registered terms, the scalar a training step descends on.
    pub fn total(&self) -> f64 {
        self.terms.iter().map(|&(_, v)| v).sum()
    }

    /// All registered terms, in registration order.
    pub fn terms(&self) -> &[(LossKind, f64)] {
        &self.terms
    }

    /// Number of registered terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// True when no term has been registered.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// What the pooling layer optimizes, and with which auxiliary graphs.
///
/// All auxiliary adjacencies must be defined over the same node set as the
/// primary adjacency. λ must lie in `[0, 1]`.
#[derive(Debug, Clone, Copy)]
pub enum Objective<'a> {
    /// Modularity of the primary adjacency only.
    Modularity,
    /// Blend of a diversity-graph objective (weight λ) and modularity
    /// (weight 1−λ).
    Diversity {
        /// Diversity adjacency over the same nodes.
        graph: &'a CsMat<f64>,
        /// Mixing coefficient in `[0, 1]`.
        lambda: f64,
    },
    /// Penalizes disparity between two protected-group subgraphs:
    /// `|λ·(red_loss − blue_loss)|`, plus the (unscaled) modularity term
    /// while λ ≠ 1.
    Fairness {
        /// "Red" group adjacency.
        red: &'a CsMat<f64>,
        /// "Blue" group adjacency.
        blue: &'a CsMat<f64>,
        /// Mixing coefficient in `[0, 1]`.
        lambda: f64,
    },
    /// Blend of one group-graph objective (weight λ) and modularity
    /// (weight 1−λ).
    Group {
        /// Group adjacency over the same nodes.
        graph: &'a CsMat<f64>,
        /// Mixing coefficient in `[0, 1]`.
        lambda: f64,
    },
}

impl Objective<'_> {
    /// Structural checks before any computation: λ range and auxiliary
    /// adjacency shapes against the node count `n`.
    pub(crate) fn validate(&self, n: usize) -> Result<()> {
        match self {
            Objective::Modularity => Ok(()),
            Objective::Diversity { graph, lambda } => {
                check_lambda(*lambda)?;
                check_square(graph, n)
            }
            Objective::Fairness { red, blue, lambda } => {
                check_lambda(*lambda)?;
                check_square(red, n)?;
                check_square(blue, n)
            }
            Objective::Group { graph, lambda } => {
                check_lambda(*lambda)?;
                check_square(graph, n)
            }
        }
    }

    /// Register this objective's spectral terms for `assignments`.
    ///
    /// `primary`, `primary_degrees`, and `primary_edge_weight` describe the
    /// primary adjacency; auxiliary graphs bring their own degree accounting
    /// for the null model but are expressed on the primary edge-weight scale.
    pub(crate) fn accumulate(
        &self,
        ledger: &mut LossLedger,
        assignments: &Array2<f64>,
        primary: &CsMat<f64>,
        primary_degrees: &Array1<f64>,
        primary_edge_weight: f64,
    ) -> Result<()> {
        let base = |ledger: &mut LossLedger, scale: f64| {
            let loss = spectral_loss(
                primary,
                assignments,
                primary_degrees,
                primary_edge_weight,
                primary_edge_weight,
            );
            ledger.record(LossKind::Spectral, scale * loss);
        };

        match self {
            Objective::Modularity => base(ledger, 1.0),
            Objective::Diversity { graph, lambda } => {
                if *lambda != 0.0 {
                    let aux = aux_spectral(graph, assignments, primary_edge_weight)?;
                    ledger.record(LossKind::Diversity, lambda * aux);
                }
                if *lambda != 1.0 {
                    base(ledger, 1.0 - lambda);
                }
            }
            Objective::Fairness { red, blue, lambda } => {
                if *lambda != 0.0 {
                    let red_loss = aux_spectral(red, assignments, primary_edge_weight)?;
                    let blue_loss = aux_spectral(blue, assignments, primary_edge_weight)?;
                    ledger.record(LossKind::Fairness, (lambda * (red_loss - blue_loss)).abs());
                }
                if *lambda != 1.0 {
                    // The modularity term stays unscaled here; the λ ≠ 1
                    // conditional is its only complement.
                    base(ledger, 1.0);
                }
            }
            Objective::Group { graph, lambda } => {
                if *lambda != 0.0 {
                    let aux = aux_spectral(graph, assignments, primary_edge_weight)?;
                    ledger.record(LossKind::Group, lambda * aux);
                }
                if *lambda != 1.0 {
                    base(ledger, 1.0 - lambda);
                }
            }
        }
        Ok(())
    }
}

/// Spectral loss of an auxiliary graph: its own degrees scope the null
/// model, the primary edge weight sets the scale.
fn aux_spectral(
    graph: &CsMat<f64>,
    assignments: &Array2<f64>,
    primary_edge_weight: f64,
) -> Result<f64> {
    let degrees = degree_vector(graph);
    let own = total_edge_weight(&degrees);
    if own <= 0.0 {
        return Err(Error::EdgelessGraph);
    }
    Ok(spectral_loss(
        graph,
        assignments,
        &degrees,
        own,
        primary_edge_weight,
    ))
}

fn check_lambda(lambda: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&lambda) {
        return Err(Error::InvalidParameter {
            name: "lambda",
            message: "mixing coefficient must lie in [0, 1]",
        });
    }
    Ok(())
}

fn check_square(graph: &CsMat<f64>, n: usize) -> Result<()> {
    if graph.rows() != graph.cols() {
        return Err(Error::ShapeMismatch {
            expected: format!("{n} x {n}"),
            actual: format!("{} x {}", graph.rows(), graph.cols()),
        });
    }
    if graph.rows() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            found: graph.rows(),
        });
    }
    Ok(())
}
