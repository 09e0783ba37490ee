//! Dense tensor type definition and basic operations
//!
//! This module defines the core `DenseND<T>` type and provides creation and
//! accessor methods. Shape manipulation lives in `shape_ops`.

use scirs2_core::ndarray_ext::{Array, IxDyn};
use scirs2_core::numeric::Num;
use std::borrow::Cow;

use crate::types::Shape;

/// Dense N-dimensional tensor backed by scirs2_core's ndarray
///
/// Operators read an input through a view and always return a freshly
/// allocated output; they never reallocate or retain the input.
///
/// # Type Parameters
///
/// * `T` - The element type (typically `f32` or `f64`)
///
/// # Memory Layout
///
/// Tensors built by this crate are C-contiguous (row-major). Tensors built
/// from a foreign array may be strided; [`DenseND::contiguous_data`] hides
/// the difference from operators.
///
/// # Examples
///
/// ```
/// use tenxform_core::dense::DenseND;
///
/// let tensor = DenseND::<f64>::zeros(&[2, 3, 4]);
/// assert_eq!(tensor.shape(), &[2, 3, 4]);
/// assert_eq!(tensor.rank(), 3);
/// ```
#[derive(Clone)]
pub struct DenseND<T> {
    /// Underlying ndarray storage (via scirs2_core)
    pub(crate) data: Array<T, IxDyn>,
}

impl<T> DenseND<T>
where
    T: Clone + Num,
{
    /// Create a tensor from an existing ndarray
    ///
    /// # Examples
    ///
    /// ```
    /// use scirs2_core::ndarray_ext::Array;
    /// use tenxform_core::dense::DenseND;
    ///
    /// let arr = Array::<f64, _>::zeros(vec![2, 3]);
    /// let tensor = DenseND::from_array(arr);
    /// assert_eq!(tensor.shape(), &[2, 3]);
    /// ```
    pub fn from_array(array: Array<T, IxDyn>) -> Self {
        Self { data: array }
    }

    /// Create a tensor from a vector with given shape
    ///
    /// # Arguments
    ///
    /// * `vec` - Flattened data in row-major order
    /// * `shape` - Target shape
    ///
    /// # Errors
    ///
    /// Returns an error if `vec.len()` differs from the product of `shape`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenxform_core::dense::DenseND;
    ///
    /// let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    /// let tensor = DenseND::from_vec(data, &[2, 3]).unwrap();
    /// assert_eq!(tensor.shape(), &[2, 3]);
    ///
    /// assert!(DenseND::from_vec(vec![1.0, 2.0], &[3]).is_err());
    /// ```
    pub fn from_vec(vec: Vec<T>, shape: &[usize]) -> anyhow::Result<Self> {
        let total: usize = shape.iter().product();
        if vec.len() != total {
            anyhow::bail!(
                "Shape {:?} requires {} elements, but got {}",
                shape,
                total,
                vec.len()
            );
        }
        let array = Array::from_shape_vec(IxDyn(shape), vec)?;
        Ok(Self { data: array })
    }

    /// Get the rank (number of dimensions) of this tensor
    pub fn rank(&self) -> usize {
        self.data.ndim()
    }

    /// Get the shape of this tensor
    ///
    /// # Examples
    ///
    /// ```
    /// use tenxform_core::dense::DenseND;
    ///
    /// let tensor = DenseND::<f32>::zeros(&[2, 3, 4]);
    /// assert_eq!(tensor.shape(), &[2, 3, 4]);
    /// ```
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Get the shape as an inline small vector, for building derived shapes
    pub fn shape_small(&self) -> Shape {
        Shape::from_slice(self.shape())
    }

    /// Get a copy of the shape as a vector.
    pub fn shape_vec(&self) -> Vec<usize> {
        self.shape().to_vec()
    }

    /// Get the total number of elements
    ///
    /// # Examples
    ///
    /// ```
    /// use tenxform_core::dense::DenseND;
    ///
    /// let tensor = DenseND::<f32>::zeros(&[2, 3, 4]);
    /// assert_eq!(tensor.len(), 24);
    /// ```
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the tensor is empty (has zero elements)
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check if the tensor is contiguous in row-major order.
    pub fn is_contiguous(&self) -> bool {
        self.data.is_standard_layout()
    }

    /// Get an immutable reference to the underlying ndarray
    pub fn as_array(&self) -> &Array<T, IxDyn> {
        &self.data
    }

    /// Borrow the elements as a row-major slice.
    ///
    /// Zero-copy for contiguous tensors; strided tensors are gathered into
    /// an owned buffer in logical row-major order.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenxform_core::dense::DenseND;
    ///
    /// let tensor = DenseND::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
    /// assert_eq!(&tensor.contiguous_data()[..], &[1.0, 2.0, 3.0, 4.0]);
    /// ```
    pub fn contiguous_data(&self) -> Cow<'_, [T]> {
        match self.data.as_slice() {
            Some(slice) => Cow::Borrowed(slice),
            None => Cow::Owned(self.to_vec()),
        }
    }

    /// Create a tensor filled with a specific value
    ///
    /// # Examples
    ///
    /// ```
    /// use tenxform_core::dense::DenseND;
    ///
    /// let tensor = DenseND::from_elem(&[2, 3], 5.0);
    /// assert_eq!(tensor[&[0, 0]], 5.0);
    /// assert_eq!(tensor[&[1, 2]], 5.0);
    /// ```
    pub fn from_elem(shape: &[usize], value: T) -> Self {
        Self {
            data: Array::from_elem(IxDyn(shape), value),
        }
    }

    /// Create a tensor of zeros
    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            data: Array::zeros(IxDyn(shape)),
        }
    }

    /// Create a tensor of ones
    pub fn ones(shape: &[usize]) -> Self {
        Self {
            data: Array::ones(IxDyn(shape)),
        }
    }

    /// Convert the tensor to a flat vector in row-major order
    ///
    /// # Examples
    ///
    /// ```
    /// use tenxform_core::dense::DenseND;
    ///
    /// let tensor = DenseND::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
    /// assert_eq!(tensor.to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
    /// ```
    pub fn to_vec(&self) -> Vec<T> {
        self.data.iter().cloned().collect()
    }

    /// Create an iterator over all elements in row-major order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    /// Check if two tensors have the same shape
    pub fn same_shape(&self, other: &Self) -> bool {
        self.shape() == other.shape()
    }
}
