//! Nearest-neighbour upsampling by an integer factor
//!
//! A `(N, C, W)` input scales its last axis, a `(N, C, H, W)` input scales
//! the last two. Output index `(..., h, w)` reads source `(..., h/scale, w/scale)`
//! with floor division, so every source element fills a constant block.

use tenxform_core::{DenseND, Element};

use crate::error::{OpError, OpResult};
use crate::operator::TensorOp;
use crate::tracing_support::record_op;
use crate::utils::{checked_extent, checked_volume, expect_inputs, for_each_plane, outer_count};

const NAME: &str = "upsample";

/// Upsample configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct UpsampleParams {
    pub scale: usize,
    /// Input rank, 3 or 4
    pub dims: usize,
}

impl Default for UpsampleParams {
    fn default() -> Self {
        UpsampleParams { scale: 1, dims: 4 }
    }
}

impl UpsampleParams {
    pub fn new(scale: usize, dims: usize) -> Self {
        UpsampleParams { scale, dims }
    }
}

/// Nearest-neighbour upsample operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upsample {
    scale: usize,
    dims: usize,
}

/// Build an upsample operator.
///
/// # Errors
///
/// [`OpError::UnsupportedDims`] for `dims` other than 3 or 4, and
/// [`OpError::InvalidParameter`] for a zero scale.
pub fn upsample(params: UpsampleParams) -> OpResult<Upsample> {
    if params.dims != 3 && params.dims != 4 {
        return Err(OpError::UnsupportedDims(params.dims));
    }
    if params.scale == 0 {
        return Err(OpError::invalid_parameter(NAME, "scale", "must be at least 1"));
    }
    Ok(Upsample {
        scale: params.scale,
        dims: params.dims,
    })
}

impl Upsample {
    pub fn scale(&self) -> usize {
        self.scale
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn output_shape(&self, input_shape: &[usize]) -> OpResult<Vec<usize>> {
        if input_shape.len() != self.dims {
            return Err(OpError::invalid_rank(
                NAME,
                self.dims.to_string(),
                input_shape.len(),
            ));
        }
        let mut out = input_shape.to_vec();
        for extent in out.iter_mut().skip(2) {
            *extent = checked_extent(NAME, "scale", *extent, self.scale)?;
        }
        checked_volume(NAME, "scale", &out)?;
        Ok(out)
    }

    /// Upsample `input`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenxform_core::DenseND;
    /// use tenxform_ops::{upsample, UpsampleParams};
    ///
    /// let x = DenseND::<f64>::from_vec(vec![1.0, 2.0], &[1, 1, 2]).unwrap();
    /// let op = upsample(UpsampleParams::new(3, 3)).unwrap();
    /// assert_eq!(op.forward(&x).unwrap().to_vec(), vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
    /// ```
    pub fn forward<T: Element>(&self, input: &DenseND<T>) -> OpResult<DenseND<T>> {
        let _span = op_span!("upsample", input_shape = ?input.shape(), scale = self.scale);

        let out_shape = self.output_shape(input.shape())?;
        let s = self.scale;
        let w = input.shape()[self.dims - 1];
        let (h, sh) = if self.dims == 4 {
            (input.shape()[2], s)
        } else {
            (1, 1)
        };
        let (out_h, out_w) = (h * sh, w * s);
        let planes = outer_count(input.shape(), self.dims - 2);

        let data = input.contiguous_data();
        let src_all: &[T] = &data;

        let mut out = vec![T::zero(); planes * out_h * out_w];
        for_each_plane(&mut out, out_h * out_w, |p, plane| {
            let src = &src_all[p * h * w..(p + 1) * h * w];
            for (oh, row) in plane.chunks_mut(out_w).enumerate() {
                let line = &src[(oh / sh) * w..(oh / sh + 1) * w];
                for (ow, value) in row.iter_mut().enumerate() {
                    *value = line[ow / s];
                }
            }
        });

        let output = DenseND::from_vec(out, &out_shape)?;
        record_op(NAME, output.shape());
        Ok(output)
    }
}

impl<T: Element> TensorOp<T> for Upsample {
    fn name(&self) -> &'static str {
        NAME
    }

    fn infer_shape(&self, inputs: &[&[usize]]) -> OpResult<Vec<usize>> {
        expect_inputs(NAME, inputs, 1)?;
        self.output_shape(inputs[0])
    }

    fn compute(&self, inputs: &[&DenseND<T>]) -> OpResult<DenseND<T>> {
        expect_inputs(NAME, inputs, 1)?;
        self.forward(inputs[0])
    }
}
