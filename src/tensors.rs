//! Core tensor data structure.
//!
//! # Batch Tensors
//!
//! Every layer consumes and produces a [`Tensor`]: a flat, row-major `f64`
//! buffer plus a shape. Axis 0 is always the batch axis; the remaining axes
//! describe a single example.
//!
//! ## Design Highlights
//! - Shape is stored as a `Vec<usize>` and enforced at construction
//! - [`Tensor::new`] panics on inconsistent parts (a programming error),
//!   [`Tensor::try_new`] validates untrusted parts and reports a [`ShapeError`]
//! - Reshaping never touches element values, only the shape
//! - The [`tensor!`](crate::tensor) macro builds tensors from nested literals
//!
//! ## Limitations
//! - Row-major only
//! - No broadcasting or slicing; layers do their own indexing
//!
//! ## Example
//!
//! ```rust
//! use mlp_layers::tensors::Tensor;
//! let t = Tensor::new(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
//! assert_eq!(t.shape(), &[2, 3]);
//! assert_eq!(t.row(1), &[4.0, 5.0, 6.0]);
//! ```

use crate::approx::{ApproxEquality, RelativeEq};
use crate::error::ShapeError;
use briny::prelude::*;

/// An N-dimensional `f64` tensor with a shape and flat row-major data.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl Validate for Tensor {
    fn validate(&self) -> core::result::Result<(), ValidationError> {
        if self.shape.iter().product::<usize>() != self.data.len() {
            return Err(ValidationError);
        }
        Ok(())
    }
}

impl Tensor {
    /// Creates a new tensor with the given shape and flat data.
    ///
    /// # Panics
    /// Panics if the number of elements in `data` does not match the shape product.
    pub fn new(shape: impl Into<Vec<usize>>, data: Vec<f64>) -> Self {
        let shape = shape.into();
        assert_eq!(
            shape.iter().product::<usize>(),
            data.len(),
            "shape {:?} is incompatible with {} data elements",
            shape,
            data.len()
        );
        Self { shape, data }
    }

    /// Creates a tensor from parts that have not been checked yet.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if the element count does not match the shape.
    pub fn try_new(shape: impl Into<Vec<usize>>, data: Vec<f64>) -> Result<Self, ShapeError> {
        let raw = Self {
            shape: shape.into(),
            data,
        };
        let expected = raw.shape.iter().product::<usize>();
        let found = raw.data.len();

        TrustedData::new(raw)
            .map(TrustedData::into_inner)
            .map_err(|_| ShapeError::new("Tensor::try_new", [expected], [found]))
    }

    /// A tensor of the given shape filled with `value`.
    pub fn filled(shape: impl Into<Vec<usize>>, value: f64) -> Self {
        let shape = shape.into();
        let len = shape.iter().product();
        Self {
            shape,
            data: vec![value; len],
        }
    }

    /// A tensor of the given shape filled with zeros.
    pub fn zeros(shape: impl Into<Vec<usize>>) -> Self {
        Self::filled(shape, 0.0)
    }

    /// A zero tensor with the same shape as `self`.
    #[must_use]
    pub fn zeros_like(&self) -> Self {
        Self::zeros(self.shape.clone())
    }

    /// A tensor of the same shape whose data is `f` applied element-wise.
    #[must_use]
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    /// The shape of the tensor.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// The flat row-major data.
    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// The flat row-major data, mutably.
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consumes the tensor, returning its flat data.
    #[must_use]
    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// Total number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the tensor holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of axes.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Size of the leading (batch) axis, or `0` for a rank-0 tensor.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    /// Number of elements in one example, i.e. the product of every axis
    /// after the batch axis.
    #[must_use]
    pub fn example_len(&self) -> usize {
        self.shape.iter().skip(1).product()
    }

    /// Row `i` of a tensor viewed as `(shape[0], example_len)`.
    ///
    /// # Panics
    /// Panics if `i` is out of bounds.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        let width = self.example_len();
        &self.data[i * width..(i + 1) * width]
    }

    /// Returns a copy of this tensor with a new shape and identical data.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if `shape` holds a different element count.
    pub fn reshape(&self, shape: impl Into<Vec<usize>>) -> Result<Self, ShapeError> {
        self.clone().into_reshaped(shape)
    }

    /// Reinterprets this tensor with a new shape without copying its data.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if `shape` holds a different element count.
    pub fn into_reshaped(self, shape: impl Into<Vec<usize>>) -> Result<Self, ShapeError> {
        let shape = shape.into();
        if shape.iter().product::<usize>() != self.data.len() {
            return Err(ShapeError::new("Tensor::reshape", shape, self.shape));
        }
        Ok(Self {
            shape,
            data: self.data,
        })
    }

    /// Replaces this tensor's data with another tensor of the same shape.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if the shapes differ; `self` is left untouched.
    pub fn update(&mut self, mut other: Self) -> Result<(), ShapeError> {
        if self.shape != other.shape {
            return Err(ShapeError::new("Tensor::update", self.shape.clone(), other.shape));
        }
        core::mem::swap(&mut self.data, &mut other.data);
        Ok(())
    }

    /// Checks that this tensor has exactly `expected` as its shape.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] tagged with `op` otherwise.
    pub fn expect_shape(&self, op: &'static str, expected: &[usize]) -> Result<(), ShapeError> {
        if self.shape != expected {
            return Err(ShapeError::new(op, expected, self.shape.clone()));
        }
        Ok(())
    }

    /// Checks that this tensor is `(batch, width)`.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] tagged with `op` otherwise.
    pub fn expect_matrix(&self, op: &'static str, width: usize) -> Result<(), ShapeError> {
        if self.shape.len() != 2 || self.shape[1] != width {
            return Err(ShapeError::new(
                op,
                [self.batch_size(), width],
                self.shape.clone(),
            ));
        }
        Ok(())
    }

    /// Grades how closely this tensor matches `other` element-wise.
    ///
    /// Tensors of different shapes are always [`ApproxEquality::Scarce`].
    #[must_use]
    pub fn approx_eq(&self, other: &Self) -> ApproxEquality {
        if self.shape != other.shape {
            return ApproxEquality::Scarce;
        }
        self.data[..].approx_eq(&other.data[..])
    }

    /// Largest absolute element-wise difference between two same-shaped tensors.
    ///
    /// # Errors
    /// Returns a [`ShapeError`] if the shapes differ.
    pub fn max_abs_diff(&self, other: &Self) -> Result<f64, ShapeError> {
        other.expect_shape("Tensor::max_abs_diff", &self.shape)?;
        Ok(self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max))
    }
}

/// Defines a tensor from nested literal arrays.
///
/// Supports arbitrary dimensionality as long as sublists are uniform in shape.
/// Negative or computed entries go in parentheses.
///
/// # Example
/// ```
/// use mlp_layers::tensor;
/// let t = tensor!([[1.0, 2.0], [3.0, (-4.0)]]);
/// assert_eq!(t.shape(), &[2, 2]);
/// assert_eq!(t.data()[3], -4.0);
/// ```
#[macro_export]
macro_rules! tensor {
    (( $e:expr )) => {
        $crate::tensors::Tensor::new(::std::vec::Vec::<usize>::new(), vec![($e) as f64])
    };

    ($lit:literal) => {
        $crate::tensors::Tensor::new(::std::vec::Vec::<usize>::new(), vec![$lit as f64])
    };

    ([ $( $inner:tt ),+ $(,)? ]) => {{
        let children = vec![ $( $crate::tensor!($inner) ),+ ];
        let first_shape = children[0].shape().to_vec();
        assert!(children.iter().all(|c| c.shape() == first_shape.as_slice()),
            "ragged tensor literal (rows have mismatched shapes)");
        let mut shape = vec![children.len()];
        shape.extend_from_slice(&first_shape);
        let mut data = ::std::vec::Vec::with_capacity(children.len() * children[0].len());
        for c in children { data.extend(c.into_data()); }
        $crate::tensors::Tensor::new(shape, data)
    }};
}
