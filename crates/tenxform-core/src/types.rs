//! Core type definitions for TenXform tensors.
//!
//! - Type aliases for tensor dimensions ([`Axis`], [`Rank`], [`Shape`])
//! - The numeric element trait ([`Element`]) every operator is generic over

use scirs2_core::numeric::{Float, FromPrimitive, NumCast};
use smallvec::SmallVec;
use std::fmt;

// Re-export the actual DenseND implementation
pub use crate::dense::DenseND;

/// Type alias for tensor axis index.
///
/// Zero-indexed (0 is the outermost axis).
pub type Axis = usize;

/// Type alias for tensor rank (number of dimensions).
///
/// # Examples
///
/// ```
/// use tenxform_core::{Rank, DenseND};
///
/// let image = DenseND::<f32>::zeros(&[1, 3, 8, 8]);
/// let rank: Rank = image.rank();
/// assert_eq!(rank, 4);
/// ```
pub type Rank = usize;

/// Shape type using SmallVec to avoid heap allocation for common cases.
///
/// Operators in this library work on tensors of rank 2 to 4, plus one
/// for unsqueeze, so six inline slots cover every shape they produce.
///
/// # Examples
///
/// ```
/// use tenxform_core::{Shape, DenseND};
///
/// let tensor = DenseND::<f64>::zeros(&[2, 3, 4]);
/// let shape: Shape = tensor.shape_small();
/// assert_eq!(&shape[..], &[2, 3, 4]);
/// ```
pub type Shape = SmallVec<[usize; 6]>;

/// Numeric element type accepted by every tensor-transform operator.
///
/// Supports ordering, min/max, arithmetic and conversion from the `f64`
/// parameters operators are configured with. Implemented for `f32` and `f64`.
///
/// # Examples
///
/// ```
/// use tenxform_core::Element;
///
/// fn halfway<T: Element>(a: T, b: T) -> T {
///     (a + b) / T::from_f64(2.0).unwrap()
/// }
///
/// assert_eq!(halfway(10.0f32, 20.0f32), 15.0);
/// ```
pub trait Element: Float + FromPrimitive + NumCast + fmt::Debug + Send + Sync + 'static {}

impl<T> Element for T where T: Float + FromPrimitive + NumCast + fmt::Debug + Send + Sync + 'static {}
