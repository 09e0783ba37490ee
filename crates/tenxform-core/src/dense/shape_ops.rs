//! Shape manipulation operations on tensors
//!
//! Reshape, unsqueeze and squeeze. None of these reorder elements: in
//! row-major layout, inserting or removing a size-1 axis leaves the buffer
//! byte-identical.

use super::types::DenseND;
use scirs2_core::ndarray_ext::IxDyn;
use scirs2_core::numeric::Num;

/// Negative positions resolve as `axis + rank + 1`.
fn resolve_insert(axis: isize, rank: usize) -> Option<usize> {
    let resolved = if axis < 0 {
        axis + rank as isize + 1
    } else {
        axis
    };
    if (0..=rank as isize).contains(&resolved) {
        Some(resolved as usize)
    } else {
        None
    }
}

impl<T> DenseND<T>
where
    T: Clone + Num,
{
    /// Resolve a signed insertion axis for a tensor of the given rank.
    ///
    /// Negative positions count from the end, so `-1` appends a trailing
    /// axis. The resolved position must lie in `[0, rank]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the resolved position falls outside `[0, rank]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenxform_core::DenseND;
    ///
    /// assert_eq!(DenseND::<f64>::resolve_insert_axis(-1, 3).unwrap(), 3);
    /// assert_eq!(DenseND::<f64>::resolve_insert_axis(-4, 3).unwrap(), 0);
    /// assert!(DenseND::<f64>::resolve_insert_axis(-5, 3).is_err());
    /// assert!(DenseND::<f64>::resolve_insert_axis(4, 3).is_err());
    /// ```
    pub fn resolve_insert_axis(axis: isize, rank: usize) -> anyhow::Result<usize> {
        resolve_insert(axis, rank).ok_or_else(|| {
            anyhow::anyhow!(
                "Insertion axis {} out of range for rank {} (valid: {}..={})",
                axis,
                rank,
                -(rank as isize) - 1,
                rank
            )
        })
    }

    /// Reshape the tensor to a new shape
    ///
    /// Elements keep their row-major order.
    ///
    /// # Errors
    ///
    /// Returns an error if the element counts differ.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenxform_core::DenseND;
    ///
    /// let tensor = DenseND::<f64>::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// let reshaped = tensor.reshape(&[3, 2]).unwrap();
    /// assert_eq!(reshaped.shape(), &[3, 2]);
    /// assert_eq!(reshaped[&[1, 0]], 3.0);
    /// ```
    pub fn reshape(&self, new_shape: &[usize]) -> anyhow::Result<Self> {
        let new_size: usize = new_shape.iter().product();
        let old_size = self.len();
        if new_size != old_size {
            anyhow::bail!(
                "Cannot reshape tensor of size {} into shape {:?} (size {})",
                old_size,
                new_shape,
                new_size
            );
        }
        if let Ok(reshaped) = self.data.view().into_shape_with_order(IxDyn(new_shape)) {
            Ok(Self {
                data: reshaped.to_owned(),
            })
        } else {
            Self::from_vec(self.to_vec(), new_shape)
        }
    }

    /// Add a singleton dimension at the specified axis.
    ///
    /// # Errors
    ///
    /// Returns an error if `axis > rank`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenxform_core::DenseND;
    ///
    /// let tensor = DenseND::<f64>::zeros(&[3, 5]);
    /// let unsqueezed = tensor.unsqueeze(1).unwrap();
    /// assert_eq!(unsqueezed.shape(), &[3, 1, 5]);
    /// ```
    pub fn unsqueeze(&self, axis: usize) -> anyhow::Result<Self> {
        if axis > self.rank() {
            anyhow::bail!(
                "Axis {} out of bounds for result rank {}",
                axis,
                self.rank() + 1
            );
        }

        let mut new_shape = self.shape_small();
        new_shape.insert(axis, 1);

        self.reshape(&new_shape)
    }

    /// Add a singleton dimension at a signed position.
    ///
    /// Negative positions count from the end (see [`DenseND::resolve_insert_axis`]).
    ///
    /// # Examples
    ///
    /// ```
    /// use tenxform_core::DenseND;
    ///
    /// let tensor = DenseND::<f64>::zeros(&[3, 5]);
    /// assert_eq!(tensor.unsqueeze_signed(-1).unwrap().shape(), &[3, 5, 1]);
    /// assert_eq!(tensor.unsqueeze_signed(-3).unwrap().shape(), &[1, 3, 5]);
    /// ```
    pub fn unsqueeze_signed(&self, axis: isize) -> anyhow::Result<Self> {
        let resolved = Self::resolve_insert_axis(axis, self.rank())?;
        self.unsqueeze(resolved)
    }

    /// Remove a specific singleton dimension.
    ///
    /// # Errors
    ///
    /// Returns an error if the axis is out of bounds or its size is not 1.
    pub fn squeeze_axis(&self, axis: usize) -> anyhow::Result<Self> {
        if axis >= self.rank() {
            anyhow::bail!("Axis {} out of bounds for rank {}", axis, self.rank());
        }

        if self.shape()[axis] != 1 {
            anyhow::bail!(
                "Cannot squeeze axis {} with size {}",
                axis,
                self.shape()[axis]
            );
        }

        let mut new_shape = self.shape_small();
        new_shape.remove(axis);

        self.reshape(&new_shape)
    }
}
