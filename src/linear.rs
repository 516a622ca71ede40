//! The configured linear map consumed by the pooling layer.
//!
//! [`DenseMap`] is a plain affine transform `F · W + b`. The pooling layer
//! treats it as externally configured state: how its entries are trained is
//! the caller's concern. Two seeded initializers are provided: orthogonal
//! columns (the usual choice for assignment logits) and Glorot uniform.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::error::{Error, Result};

/// Affine map from feature space (d) to cluster-logit space (k).
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMap {
    /// Weight matrix, shape (d, k).
    weight: Array2<f64>,
    /// Bias vector, shape (k,).
    bias: Array1<f64>,
}

impl DenseMap {
    /// Build from explicit weight and bias.
    ///
    /// Fails when the bias length does not match the weight's output
    /// dimension, or when either dimension is zero.
    pub fn from_parts(weight: Array2<f64>, bias: Array1<f64>) -> Result<Self> {
        if weight.nrows() == 0 || weight.ncols() == 0 {
            return Err(Error::EmptyInput);
        }
        if bias.len() != weight.ncols() {
            return Err(Error::DimensionMismatch {
                expected: weight.ncols(),
                found: bias.len(),
            });
        }
        Ok(Self { weight, bias })
    }

    /// Seeded orthogonal initialization, zero bias.
    ///
    /// Draws a Gaussian matrix and orthonormalizes along the smaller
    /// dimension with modified Gram–Schmidt, so either the columns
    /// (`in_dim >= out_dim`) or the rows are orthonormal.
    pub fn orthogonal(in_dim: usize, out_dim: usize, seed: u64) -> Result<Self> {
        if in_dim == 0 || out_dim == 0 {
            return Err(Error::EmptyInput);
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut weight =
            Array2::from_shape_fn((in_dim, out_dim), |_| rng.sample::<f64, _>(StandardNormal));

        if in_dim >= out_dim {
            gram_schmidt_columns(&mut weight);
        } else {
            let mut t = weight.t().to_owned();
            gram_schmidt_columns(&mut t);
            weight = t.t().to_owned();
        }

        Self::from_parts(weight, Array1::zeros(out_dim))
    }

    /// Seeded Glorot (Xavier) uniform initialization, zero bias.
    pub fn glorot(in_dim: usize, out_dim: usize, seed: u64) -> Result<Self> {
        if in_dim == 0 || out_dim == 0 {
            return Err(Error::EmptyInput);
        }
        let limit = (6.0 / (in_dim + out_dim) as f64).sqrt();
        let mut rng = StdRng::seed_from_u64(seed);
        let weight = Array2::from_shape_fn((in_dim, out_dim), |_| rng.gen_range(-limit..limit));
        Self::from_parts(weight, Array1::zeros(out_dim))
    }

    /// Input dimension d.
    pub fn in_dim(&self) -> usize {
        self.weight.nrows()
    }

    /// Output dimension k.
    pub fn out_dim(&self) -> usize {
        self.weight.ncols()
    }

    /// Apply the map: `features · W + b`, shape (n, k).
    pub fn apply(&self, features: &Array2<f64>) -> Array2<f64> {
        features.dot(&self.weight) + &self.bias
    }
}

/// Orthonormalize the columns of `m` in place (modified Gram–Schmidt).
///
/// Requires nrows >= ncols. Gaussian draws are linearly independent with
/// probability one; a vanishing residual norm still falls back to a unit
/// basis vector so the result is always well formed.
fn gram_schmidt_columns(m: &mut Array2<f64>) {
    let (rows, cols) = m.dim();
    for j in 0..cols {
        for prev in 0..j {
            let proj = m.column(j).dot(&m.column(prev));
            let prev_col = m.column(prev).to_owned();
            let mut col = m.column_mut(j);
            col.scaled_add(-proj, &prev_col);
        }
        let norm = m.column(j).dot(&m.column(j)).sqrt();
        if norm > 1e-12 {
            m.column_mut(j).mapv_inplace(|v| v / norm);
        } else {
            let mut col = m.column_mut(j);
            col.fill(0.0);
            col[j % rows] = 1.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_parts_rejects_mismatched_bias() {
        let w = Array2::<f64>::zeros((3, 2));
        let b = Array1::<f64>::zeros(3);
        let err = DenseMap::from_parts(w, b).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 2, found: 3 }));
    }

    #[test]
    fn test_orthogonal_columns_are_orthonormal() {
        let map = DenseMap::orthogonal(8, 3, 42).unwrap();
        let w = map.weight;
        for a in 0..3 {
            for b in 0..3 {
                let dot = w.column(a).dot(&w.column(b));
                let expected = if a == b { 1.0 } else { 0.0 };
                assert!(
                    (dot - expected).abs() < 1e-10,
                    "column pair ({a}, {b}) dot = {dot}"
                );
            }
        }
    }

    #[test]
    fn test_orthogonal_wide_rows_are_orthonormal() {
        let map = DenseMap::orthogonal(2, 5, 7).unwrap();
        let w = map.weight;
        for a in 0..2 {
            for b in 0..2 {
                let dot = w.row(a).dot(&w.row(b));
                let expected = if a == b { 1.0 } else { 0.0 };
                assert!((dot - expected).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_glorot_stays_within_limit() {
        let map = DenseMap::glorot(10, 6, 1).unwrap();
        let limit = (6.0 / 16.0f64).sqrt();
        assert!(map.weight.iter().all(|v| v.abs() <= limit));
    }

    #[test]
    fn test_apply_adds_bias() {
        let map = DenseMap::from_parts(
            array![[1.0, 0.0], [0.0, 1.0]],
            array![10.0, -10.0],
        )
        .unwrap();
        let out = map.apply(&array![[2.0, 3.0]]);
        assert_eq!(out, array![[12.0, -7.0]]);
    }

    #[test]
    fn test_seeded_init_is_deterministic() {
        let a = DenseMap::orthogonal(5, 2, 99).unwrap();
        let b = DenseMap::orthogonal(5, 2, 99).unwrap();
        assert_eq!(a, b);
    }
}
