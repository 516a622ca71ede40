use core::fmt;

/// Result alias for `partio`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by pooling and propagation layers.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// Matrix dimension mismatch (usize).
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Shape mismatch (string description).
    ShapeMismatch {
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        actual: String,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// Activation name not recognized at configuration time.
    UnknownActivation(String),

    /// Adjacency has zero total edge weight; modularity is undefined.
    EdgelessGraph,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::ShapeMismatch { expected, actual } => {
                write!(f, "shape mismatch: expected {expected}, actual {actual}")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::UnknownActivation(name) => {
                write!(f, "unknown activation '{name}'")
            }
            Error::EdgelessGraph => write!(f, "graph has no edge weight"),
        }
    }
}

impl std::error::Error for Error {}
