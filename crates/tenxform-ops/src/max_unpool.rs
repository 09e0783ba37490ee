//! Max-unpooling: scatter pooled values back to their recorded positions
//!
//! Inputs are a pooled `(N, C, H, W)` tensor and an index map of the same
//! shape holding, for every pooled element, the flattened offset inside a
//! `dst_h * dst_w` plane it was taken from. The output is zero except at
//! those offsets.
//!
//! Every index is checked before anything is written. An entry outside
//! `[0, dst_h * dst_w)` fails the call with [`OpError::IndexOutOfRange`];
//! it is never clamped or wrapped. When two entries of one plane name the
//! same offset the later one wins. Avoiding duplicates is up to the caller.

use scirs2_core::numeric::{Num, ToPrimitive};
use tenxform_core::{DenseND, Element};

use crate::error::{OpError, OpResult};
use crate::operator::TensorOp;
use crate::tracing_support::record_op;
use crate::utils::{checked_extent, checked_volume, expect_inputs, for_each_plane};

const NAME: &str = "max_unpool";

/// Max-unpool configuration; both destination extents are required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct MaxUnpoolParams {
    pub dst_h: Option<usize>,
    pub dst_w: Option<usize>,
}

impl MaxUnpoolParams {
    pub fn new(dst_h: usize, dst_w: usize) -> Self {
        MaxUnpoolParams {
            dst_h: Some(dst_h),
            dst_w: Some(dst_w),
        }
    }
}

/// Max-unpool operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxUnpool {
    dst_h: usize,
    dst_w: usize,
    plane_len: usize,
}

/// Create a max-unpool operator.
///
/// # Errors
///
/// [`OpError::MissingParameter`] when either destination extent is unset,
/// and [`OpError::InvalidParameter`] when `dst_h * dst_w` overflows.
///
/// # Examples
///
/// ```
/// use tenxform_ops::{max_unpool, MaxUnpoolParams, OpError};
///
/// let op = max_unpool(MaxUnpoolParams::new(4, 6)).unwrap();
/// assert_eq!(op.destination(), (4, 6));
///
/// let unset = MaxUnpoolParams { dst_h: Some(4), dst_w: None };
/// assert!(matches!(max_unpool(unset), Err(OpError::MissingParameter { .. })));
/// ```
pub fn max_unpool(params: MaxUnpoolParams) -> OpResult<MaxUnpool> {
    let dst_h = params.dst_h.ok_or(OpError::MissingParameter {
        op: NAME,
        name: "dst_h",
    })?;
    let dst_w = params.dst_w.ok_or(OpError::MissingParameter {
        op: NAME,
        name: "dst_w",
    })?;
    let plane_len = checked_extent(NAME, "dst_w", dst_h, dst_w)?;
    Ok(MaxUnpool {
        dst_h,
        dst_w,
        plane_len,
    })
}

impl MaxUnpool {
    pub fn destination(&self) -> (usize, usize) {
        (self.dst_h, self.dst_w)
    }

    /// Output shape for pooled values and index map shapes.
    pub fn output_shape(&self, values: &[usize], indices: &[usize]) -> OpResult<Vec<usize>> {
        if values.len() != 4 {
            return Err(OpError::invalid_rank(NAME, "4", values.len()));
        }
        if indices != values {
            return Err(OpError::ShapeMismatch {
                op: NAME,
                expected: values.to_vec(),
                actual: indices.to_vec(),
            });
        }
        let out = vec![values[0], values[1], self.dst_h, self.dst_w];
        checked_volume(NAME, "dst_h", &out)?;
        Ok(out)
    }

    /// Scatter `values` to the offsets recorded in `indices`.
    ///
    /// Floating-point index entries are truncated toward zero.
    ///
    /// # Errors
    ///
    /// Shape errors as for [`MaxUnpool::output_shape`], then
    /// [`OpError::IndexOutOfRange`] for the first entry outside the plane
    /// (including finite values too wide for `i64`), or
    /// [`OpError::NonIntegralIndex`] for a NaN or infinite entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenxform_core::DenseND;
    /// use tenxform_ops::{max_unpool, MaxUnpoolParams};
    ///
    /// let values = DenseND::<f32>::from_vec(vec![5.0, 7.0], &[1, 1, 1, 2]).unwrap();
    /// let indices = DenseND::<i64>::from_vec(vec![1, 3], &[1, 1, 1, 2]).unwrap();
    ///
    /// let op = max_unpool(MaxUnpoolParams::new(2, 2)).unwrap();
    /// let out = op.forward(&values, &indices).unwrap();
    /// assert_eq!(out.to_vec(), vec![0.0, 5.0, 0.0, 7.0]);
    /// ```
    pub fn forward<T, I>(&self, values: &DenseND<T>, indices: &DenseND<I>) -> OpResult<DenseND<T>>
    where
        T: Element,
        I: Clone + Num + ToPrimitive,
    {
        let _span = op_span!("max_unpool", input_shape = ?values.shape(), dst_h = self.dst_h, dst_w = self.dst_w);

        let out_shape = self.output_shape(values.shape(), indices.shape())?;
        let plane_len = self.plane_len;
        let src_plane = values.shape()[2] * values.shape()[3];
        let offsets = self.checked_offsets(indices, plane_len)?;

        let data = values.contiguous_data();
        let src_all: &[T] = &data;
        let planes = out_shape[0] * out_shape[1];

        let mut out = vec![T::zero(); planes * plane_len];
        for_each_plane(&mut out, plane_len, |p, plane| {
            let range = p * src_plane..(p + 1) * src_plane;
            for (&value, &offset) in src_all[range.clone()].iter().zip(&offsets[range]) {
                plane[offset] = value;
            }
        });

        let output = DenseND::from_vec(out, &out_shape)?;
        record_op(NAME, output.shape());
        Ok(output)
    }

    fn checked_offsets<I>(&self, indices: &DenseND<I>, plane_len: usize) -> OpResult<Vec<usize>>
    where
        I: Clone + Num + ToPrimitive,
    {
        indices
            .contiguous_data()
            .iter()
            .enumerate()
            .map(|(position, idx)| {
                let index = match idx.to_i64() {
                    Some(index) => index,
                    // Finite but wider than i64: saturate so the range check fails
                    None => match idx.to_f64() {
                        Some(v) if v.is_finite() => {
                            if v < 0.0 {
                                i64::MIN
                            } else {
                                i64::MAX
                            }
                        }
                        _ => return Err(OpError::NonIntegralIndex { position }),
                    },
                };
                if index < 0 || index as u64 >= plane_len as u64 {
                    return Err(OpError::IndexOutOfRange {
                        index,
                        position,
                        plane_len,
                    });
                }
                Ok(index as usize)
            })
            .collect()
    }
}

impl<T: Element> TensorOp<T> for MaxUnpool {
    fn name(&self) -> &'static str {
        NAME
    }

    /// Pooled values followed by the index map.
    fn num_inputs(&self) -> usize {
        2
    }

    fn infer_shape(&self, inputs: &[&[usize]]) -> OpResult<Vec<usize>> {
        expect_inputs(NAME, inputs, 2)?;
        self.output_shape(inputs[0], inputs[1])
    }

    fn compute(&self, inputs: &[&DenseND<T>]) -> OpResult<DenseND<T>> {
        expect_inputs(NAME, inputs, 2)?;
        self.forward(inputs[0], inputs[1])
    }
}
