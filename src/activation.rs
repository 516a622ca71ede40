//! Elementwise nonlinearities for layer outputs.
//!
//! Layers accept an activation by name (`"selu"`, `"relu"`, ...) or as an
//! [`Activation`] value. Unrecognized names fail at configuration time,
//! before any forward call.

use core::str::FromStr;

use ndarray::Array2;

use crate::error::{Error, Result};

/// Scale constant of the SELU activation (Klambauer et al. 2017).
pub const SELU_SCALE: f64 = 1.050_700_987_355_480_5;

/// Alpha constant of the SELU activation (Klambauer et al. 2017).
pub const SELU_ALPHA: f64 = 1.673_263_242_354_377_2;

/// Named elementwise activation.
///
/// `Selu` is the default used by the pooling and propagation layers;
/// `Identity` passes values through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Scaled exponential linear unit (self-normalizing).
    Selu,
    /// Rectified linear unit.
    Relu,
    /// Logistic sigmoid.
    Sigmoid,
    /// Hyperbolic tangent.
    Tanh,
    /// No-op.
    Identity,
}

impl Activation {
    /// Evaluate the activation at a single point.
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Activation::Selu => {
                if x > 0.0 {
                    SELU_SCALE * x
                } else {
                    SELU_SCALE * SELU_ALPHA * (x.exp() - 1.0)
                }
            }
            Activation::Relu => x.max(0.0),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Tanh => x.tanh(),
            Activation::Identity => x,
        }
    }

    /// Apply the activation elementwise, in place.
    pub fn apply(&self, x: &mut Array2<f64>) {
        if matches!(self, Activation::Identity) {
            return;
        }
        x.mapv_inplace(|v| self.eval(v));
    }
}

impl Default for Activation {
    fn default() -> Self {
        Activation::Selu
    }
}

impl FromStr for Activation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "selu" => Ok(Activation::Selu),
            "relu" => Ok(Activation::Relu),
            "sigmoid" => Ok(Activation::Sigmoid),
            "tanh" => Ok(Activation::Tanh),
            "identity" | "linear" => Ok(Activation::Identity),
            other => Err(Error::UnknownActivation(other.to_string())),
        }
    }
}
