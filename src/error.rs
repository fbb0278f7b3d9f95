//! Error types shared by every layer.
//!
//! Shape problems are the only failures a well-formed training loop should
//! ever see, so they carry enough detail to find the offending layer:
//! which operation complained, what it wanted, and what it got.

use core::fmt;

/// Shorthand for results produced by layer operations.
pub type Result<T> = core::result::Result<T, LayerError>;

/// A dimensionality mismatch between a tensor and what an operation expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeError {
    /// The operation that rejected the tensor, e.g. `"AffineLayer::fprop"`.
    pub op: &'static str,
    /// The shape the operation required.
    pub expected: Vec<usize>,
    /// The shape it was given.
    pub found: Vec<usize>,
}

impl ShapeError {
    /// Creates a new shape error.
    pub fn new(op: &'static str, expected: impl Into<Vec<usize>>, found: impl Into<Vec<usize>>) -> Self {
        Self {
            op,
            expected: expected.into(),
            found: found.into(),
        }
    }
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected shape {:?}, found {:?}",
            self.op, self.expected, self.found
        )
    }
}

impl std::error::Error for ShapeError {}

/// Everything that can go wrong while propagating through a layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerError {
    /// Input, output, gradient or parameter dimensionality mismatch.
    Shape(ShapeError),

    /// `set_params` was given the wrong number of tensors.
    ParamCount {
        /// Number of parameter tensors the layer owns.
        expected: usize,
        /// Number of tensors supplied.
        found: usize,
    },

    /// A construction argument is outside its valid domain.
    InvalidArgument(String),

    /// A backward pass needs state that only a forward pass records.
    MissingForwardState(&'static str),
}

impl fmt::Display for LayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shape(e) => write!(f, "shape error: {e}"),
            Self::ParamCount { expected, found } => write!(
                f,
                "expected {expected} parameter tensors, found {found}"
            ),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::MissingForwardState(op) => {
                write!(f, "{op}: no recorded stochastic forward pass for this batch")
            }
        }
    }
}

impl std::error::Error for LayerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Shape(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ShapeError> for LayerError {
    fn from(e: ShapeError) -> Self {
        Self::Shape(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_error_display_names_operation() {
        let e = LayerError::from(ShapeError::new("AffineLayer::fprop", [2, 3], [2, 5]));
        assert_eq!(
            e.to_string(),
            "shape error: AffineLayer::fprop: expected shape [2, 3], found [2, 5]"
        );
        assert!(std::error::Error::source(&e).is_some());
    }

    #[test]
    fn param_count_display() {
        let e = LayerError::ParamCount { expected: 2, found: 1 };
        assert_eq!(e.to_string(), "expected 2 parameter tensors, found 1");
    }
}
