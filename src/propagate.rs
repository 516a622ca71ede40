//! Node-embedding propagation layers.
//!
//! Graph convolution in the Kipf & Welling style, with two departures that
//! match the clustering pipeline upstream of the pooling layer: the default
//! nonlinearity is SELU, and an optional per-channel skip term is added
//! before the activation.
//!
//! Both layers expect a *pre-normalized* adjacency; build one with
//! [`crate::graph::normalized_adjacency`]. [`GraphConv`] transforms and
//! propagates input node features; [`EmbeddingConv`] carries its own
//! trainable embedding table for graphs with no informative features, and
//! only consumes the adjacency.
//!
//! # References
//!
//! - Kipf & Welling (2017). "Semi-Supervised Classification with Graph
//!   Convolutional Networks."

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sprs::CsMat;

use crate::activation::Activation;
use crate::error::{Error, Result};
use crate::graph::spmm;

/// Graph convolution over input node features.
///
/// Forward: `act(Â · (F · W + b) [+ skip])` with Â the normalized
/// adjacency, W a (d, c) kernel, and `skip` an optional per-channel vector.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphConv {
    kernel: Array2<f64>,
    bias: Array1<f64>,
    skip: Option<Array1<f64>>,
    activation: Activation,
}

impl GraphConv {
    /// Build from explicit parameters.
    pub fn from_parts(
        kernel: Array2<f64>,
        bias: Array1<f64>,
        skip: Option<Array1<f64>>,
    ) -> Result<Self> {
        let channels = kernel.ncols();
        if kernel.nrows() == 0 || channels == 0 {
            return Err(Error::EmptyInput);
        }
        if bias.len() != channels {
            return Err(Error::DimensionMismatch {
                expected: channels,
                found: bias.len(),
            });
        }
        if let Some(skip) = &skip {
            if skip.len() != channels {
                return Err(Error::DimensionMismatch {
                    expected: channels,
                    found: skip.len(),
                });
            }
        }
        Ok(Self {
            kernel,
            bias,
            skip,
            activation: Activation::Selu,
        })
    }

    /// Seeded Glorot-uniform kernel and skip vector, zero bias, skip
    /// connection enabled.
    pub fn glorot(in_dim: usize, channels: usize, seed: u64) -> Result<Self> {
        let (kernel, skip) = glorot_pair((in_dim, channels), seed)?;
        Self::from_parts(kernel, Array1::zeros(channels), Some(skip))
    }

    /// Replace the output activation (default SELU).
    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Drop the skip term.
    pub fn without_skip(mut self) -> Self {
        self.skip = None;
        self
    }

    /// Output width c.
    pub fn channels(&self) -> usize {
        self.kernel.ncols()
    }

    /// Propagate `features` through `norm_adjacency`, (n, c) output.
    pub fn forward(
        &self,
        features: &Array2<f64>,
        norm_adjacency: &CsMat<f64>,
    ) -> Result<Array2<f64>> {
        check_square(norm_adjacency)?;
        if features.nrows() != norm_adjacency.rows() {
            return Err(Error::DimensionMismatch {
                expected: norm_adjacency.rows(),
                found: features.nrows(),
            });
        }
        if features.ncols() != self.kernel.nrows() {
            return Err(Error::DimensionMismatch {
                expected: self.kernel.nrows(),
                found: features.ncols(),
            });
        }

        let transformed = features.dot(&self.kernel) + &self.bias;
        let mut out = spmm(norm_adjacency, &transformed);
        if let Some(skip) = &self.skip {
            out += skip;
        }
        self.activation.apply(&mut out);
        Ok(out)
    }
}

/// Features-free graph convolution: a trainable (n, c) embedding table
/// propagated through the adjacency.
///
/// The node count is fixed at construction; the adjacency must match it
/// exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingConv {
    table: Array2<f64>,
    bias: Array1<f64>,
    skip: Option<Array1<f64>>,
    activation: Activation,
}

impl EmbeddingConv {
    /// Build from an explicit embedding table and parameters.
    pub fn from_parts(
        table: Array2<f64>,
        bias: Array1<f64>,
        skip: Option<Array1<f64>>,
    ) -> Result<Self> {
        let channels = table.ncols();
        if table.nrows() == 0 || channels == 0 {
            return Err(Error::EmptyInput);
        }
        if bias.len() != channels {
            return Err(Error::DimensionMismatch {
                expected: channels,
                found: bias.len(),
            });
        }
        if let Some(skip) = &skip {
            if skip.len() != channels {
                return Err(Error::DimensionMismatch {
                    expected: channels,
                    found: skip.len(),
                });
            }
        }
        Ok(Self {
            table,
            bias,
            skip,
            activation: Activation::Selu,
        })
    }

    /// Seeded Glorot-uniform table and skip vector for `num_nodes` nodes.
    pub fn glorot(num_nodes: usize, channels: usize, seed: u64) -> Result<Self> {
        let (table, skip) = glorot_pair((num_nodes, channels), seed)?;
        Self::from_parts(table, Array1::zeros(channels), Some(skip))
    }

    /// Replace the output activation (default SELU).
    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Drop the skip term.
    pub fn without_skip(mut self) -> Self {
        self.skip = None;
        self
    }

    /// Node count the table was sized for.
    pub fn num_nodes(&self) -> usize {
        self.table.nrows()
    }

    /// Propagate the embedding table through `norm_adjacency`, (n, c) output.
    pub fn forward(&self, norm_adjacency: &CsMat<f64>) -> Result<Array2<f64>> {
        check_square(norm_adjacency)?;
        if norm_adjacency.rows() != self.table.nrows() {
            return Err(Error::DimensionMismatch {
                expected: self.table.nrows(),
                found: norm_adjacency.rows(),
            });
        }

        let seeded = &self.table + &self.bias;
        let mut out = spmm(norm_adjacency, &seeded);
        if let Some(skip) = &self.skip {
            out += skip;
        }
        self.activation.apply(&mut out);
        Ok(out)
    }
}

fn check_square(adjacency: &CsMat<f64>) -> Result<()> {
    if adjacency.rows() != adjacency.cols() {
        return Err(Error::ShapeMismatch {
            expected: "square adjacency".to_string(),
            actual: format!("{} x {}", adjacency.rows(), adjacency.cols()),
        });
    }
    Ok(())
}

fn glorot_pair(shape: (usize, usize), seed: u64) -> Result<(Array2<f64>, Array1<f64>)> {
    let (rows, cols) = shape;
    if rows == 0 || cols == 0 {
        return Err(Error::EmptyInput);
    }
    let limit = (6.0 / (rows + cols) as f64).sqrt();
    let mut rng = StdRng::seed_from_u64(seed);
    let main = Array2::from_shape_fn(shape, |_| rng.gen_range(-limit..limit));
    let skip = Array1::from_shape_fn(cols, |_| rng.gen_range(-limit..limit));
    Ok((main, skip))
}
