//! Shared helpers for operator kernels
//!
//! Every operator in this crate works plane by plane: the trailing one or two
//! axes form a plane, everything before them is flattened into an outer
//! batch-channel index. Planes are independent, so [`for_each_plane`] can hand
//! them to worker threads without synchronization.

use tenxform_core::Element;

use crate::error::{OpError, OpResult};

/// Product of the leading `shape.len() - inner` extents.
pub(crate) fn outer_count(shape: &[usize], inner: usize) -> usize {
    shape[..shape.len().saturating_sub(inner)].iter().product()
}

/// Convert an `f64` configuration value into the element type.
pub(crate) fn to_elem<T: Element>(op: &'static str, name: &'static str, value: f64) -> OpResult<T> {
    T::from_f64(value).ok_or_else(|| {
        OpError::invalid_parameter(op, name, format!("{} is not representable", value))
    })
}

/// `extent * factor`, or an error naming `name` when the product overflows.
pub(crate) fn checked_extent(
    op: &'static str,
    name: &'static str,
    extent: usize,
    factor: usize,
) -> OpResult<usize> {
    extent.checked_mul(factor).ok_or_else(|| {
        OpError::invalid_parameter(
            op,
            name,
            format!("{} x {} overflows the addressable extent", extent, factor),
        )
    })
}

/// Reject an output shape whose element count does not fit in `usize`.
pub(crate) fn checked_volume(op: &'static str, name: &'static str, shape: &[usize]) -> OpResult<()> {
    shape
        .iter()
        .try_fold(1usize, |acc, &extent| acc.checked_mul(extent))
        .map(|_| ())
        .ok_or_else(|| {
            OpError::invalid_parameter(
                op,
                name,
                format!("output shape {:?} overflows the addressable size", shape),
            )
        })
}

/// Check the number of input tensors handed to a generic `compute`.
pub(crate) fn expect_inputs<X>(op: &'static str, inputs: &[X], expected: usize) -> OpResult<()> {
    if inputs.len() != expected {
        return Err(OpError::InputCount {
            op,
            expected,
            actual: inputs.len(),
        });
    }
    Ok(())
}

/// Run `f(plane_index, plane)` over consecutive `plane_len` chunks of `out`.
///
/// With the `parallel` feature the planes are processed concurrently.
pub(crate) fn for_each_plane<T, F>(out: &mut [T], plane_len: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    if plane_len == 0 {
        return;
    }

    #[cfg(feature = "parallel")]
    {
        use scirs2_core::parallel_ops::*;

        out.par_chunks_mut(plane_len)
            .enumerate()
            .for_each(|(p, plane)| f(p, plane));
    }

    #[cfg(not(feature = "parallel"))]
    {
        out.chunks_mut(plane_len)
            .enumerate()
            .for_each(|(p, plane)| f(p, plane));
    }
}
