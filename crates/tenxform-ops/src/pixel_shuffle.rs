//! Pixel shuffle (depth-to-space) and its inverse
//!
//! With upscale factor `r`, [`PixelShuffle`] maps `(..., C, H, W)` to
//! `(..., C/r², H*r, W*r)`. Output channel `p` at block offset `(sh, sw)`
//! reads input channel `q = p*r² + sh*r + sw`:
//!
//! ```text
//! out[..., p, i*r + sh, j*r + sw] = in[..., p*r*r + sh*r + sw, i, j]
//! ```
//!
//! [`PixelUnshuffle`] is the exact inverse, mapping `(..., C, H, W)` to
//! `(..., C*r², H/r, W/r)`. Leading axes are treated as a flat batch.

use tenxform_core::{DenseND, Element};

use crate::error::{OpError, OpResult};
use crate::operator::TensorOp;
use crate::tracing_support::record_op;
use crate::utils::{checked_extent, checked_volume, expect_inputs, for_each_plane, outer_count};

const SHUFFLE: &str = "pixel_shuffle";
const UNSHUFFLE: &str = "pixel_unshuffle";

/// Pixel shuffle configuration, shared by both directions
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct PixelShuffleParams {
    pub upscale_factor: usize,
}

impl Default for PixelShuffleParams {
    fn default() -> Self {
        PixelShuffleParams { upscale_factor: 1 }
    }
}

impl PixelShuffleParams {
    pub fn new(upscale_factor: usize) -> Self {
        PixelShuffleParams { upscale_factor }
    }
}

fn check_factor(op: &'static str, params: &PixelShuffleParams) -> OpResult<usize> {
    if params.upscale_factor == 0 {
        return Err(OpError::invalid_parameter(op, "upscale_factor", "must be at least 1"));
    }
    Ok(params.upscale_factor)
}

fn split_chw(op: &'static str, shape: &[usize]) -> OpResult<(usize, usize, usize)> {
    let rank = shape.len();
    if rank < 3 {
        return Err(OpError::invalid_rank(op, "at least 3", rank));
    }
    Ok((shape[rank - 3], shape[rank - 2], shape[rank - 1]))
}

/// Channel-to-space rearrangement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelShuffle {
    factor: usize,
}

/// Space-to-channel rearrangement, the inverse of [`PixelShuffle`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelUnshuffle {
    factor: usize,
}

/// Build a pixel shuffle operator.
///
/// # Examples
///
/// ```
/// use tenxform_core::DenseND;
/// use tenxform_ops::{pixel_shuffle, PixelShuffleParams};
///
/// let x = DenseND::<f32>::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[1, 4, 1, 1]).unwrap();
/// let op = pixel_shuffle(PixelShuffleParams::new(2)).unwrap();
/// let y = op.forward(&x).unwrap();
/// assert_eq!(y.shape(), &[1, 1, 2, 2]);
/// assert_eq!(y.to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
/// ```
pub fn pixel_shuffle(params: PixelShuffleParams) -> OpResult<PixelShuffle> {
    Ok(PixelShuffle {
        factor: check_factor(SHUFFLE, &params)?,
    })
}

/// Build a pixel unshuffle operator.
pub fn pixel_unshuffle(params: PixelShuffleParams) -> OpResult<PixelUnshuffle> {
    Ok(PixelUnshuffle {
        factor: check_factor(UNSHUFFLE, &params)?,
    })
}

impl PixelShuffle {
    pub fn upscale_factor(&self) -> usize {
        self.factor
    }

    pub fn output_shape(&self, input_shape: &[usize]) -> OpResult<Vec<usize>> {
        let (c, h, w) = split_chw(SHUFFLE, input_shape)?;
        let r = self.factor;
        let r2 = checked_extent(SHUFFLE, "upscale_factor", r, r)?;
        if c % r2 != 0 {
            return Err(OpError::IndivisibleChannels {
                op: SHUFFLE,
                channels: c,
                divisor: r2,
            });
        }

        let rank = input_shape.len();
        let mut out = input_shape.to_vec();
        out[rank - 3] = c / r2;
        out[rank - 2] = checked_extent(SHUFFLE, "upscale_factor", h, r)?;
        out[rank - 1] = checked_extent(SHUFFLE, "upscale_factor", w, r)?;
        checked_volume(SHUFFLE, "upscale_factor", &out)?;
        Ok(out)
    }

    pub fn forward<T: Element>(&self, input: &DenseND<T>) -> OpResult<DenseND<T>> {
        let _span = op_span!("pixel_shuffle", input_shape = ?input.shape(), factor = self.factor);

        let out_shape = self.output_shape(input.shape())?;
        let (_, h, w) = split_chw(SHUFFLE, input.shape())?;
        let r = self.factor;
        let (out_h, out_w) = (h * r, w * r);
        let planes = outer_count(&out_shape, 2);

        let data = input.contiguous_data();
        let src_all: &[T] = &data;
        let src_plane = h * w;

        let mut out = vec![T::zero(); planes * out_h * out_w];
        for_each_plane(&mut out, out_h * out_w, |g, plane| {
            let base = g * r * r;
            for (oh, row) in plane.chunks_mut(out_w).enumerate() {
                let (i, sh) = (oh / r, oh % r);
                for (ow, value) in row.iter_mut().enumerate() {
                    let (j, sw) = (ow / r, ow % r);
                    let q = base + sh * r + sw;
                    *value = src_all[q * src_plane + i * w + j];
                }
            }
        });

        let output = DenseND::from_vec(out, &out_shape)?;
        record_op(SHUFFLE, output.shape());
        Ok(output)
    }
}

impl PixelUnshuffle {
    pub fn downscale_factor(&self) -> usize {
        self.factor
    }

    pub fn output_shape(&self, input_shape: &[usize]) -> OpResult<Vec<usize>> {
        let (c, h, w) = split_chw(UNSHUFFLE, input_shape)?;
        let r = self.factor;
        for (name, extent) in [("height", h), ("width", w)] {
            if extent % r != 0 {
                return Err(OpError::invalid_parameter(
                    UNSHUFFLE,
                    "upscale_factor",
                    format!("{} extent {} is not divisible by {}", name, extent, r),
                ));
            }
        }

        let r2 = checked_extent(UNSHUFFLE, "upscale_factor", r, r)?;
        let rank = input_shape.len();
        let mut out = input_shape.to_vec();
        out[rank - 3] = checked_extent(UNSHUFFLE, "upscale_factor", c, r2)?;
        out[rank - 2] = h / r;
        out[rank - 1] = w / r;
        Ok(out)
    }

    pub fn forward<T: Element>(&self, input: &DenseND<T>) -> OpResult<DenseND<T>> {
        let _span = op_span!("pixel_unshuffle", input_shape = ?input.shape(), factor = self.factor);

        let out_shape = self.output_shape(input.shape())?;
        let (_, h, w) = split_chw(UNSHUFFLE, input.shape())?;
        let r = self.factor;
        let (out_h, out_w) = (h / r, w / r);
        let planes = outer_count(&out_shape, 2);

        let data = input.contiguous_data();
        let src_all: &[T] = &data;
        let src_plane = h * w;

        let mut out = vec![T::zero(); planes * out_h * out_w];
        for_each_plane(&mut out, out_h * out_w, |g, plane| {
            let src = &src_all[(g / (r * r)) * src_plane..][..src_plane];
            let (sh, sw) = ((g % (r * r)) / r, g % r);
            for (i, row) in plane.chunks_mut(out_w).enumerate() {
                let line = &src[(i * r + sh) * w..];
                for (j, value) in row.iter_mut().enumerate() {
                    *value = line[j * r + sw];
                }
            }
        });

        let output = DenseND::from_vec(out, &out_shape)?;
        record_op(UNSHUFFLE, output.shape());
        Ok(output)
    }
}

impl<T: Element> TensorOp<T> for PixelShuffle {
    fn name(&self) -> &'static str {
        SHUFFLE
    }

    fn infer_shape(&self, inputs: &[&[usize]]) -> OpResult<Vec<usize>> {
        expect_inputs(SHUFFLE, inputs, 1)?;
        self.output_shape(inputs[0])
    }

    fn compute(&self, inputs: &[&DenseND<T>]) -> OpResult<DenseND<T>> {
        expect_inputs(SHUFFLE, inputs, 1)?;
        self.forward(inputs[0])
    }
}

impl<T: Element> TensorOp<T> for PixelUnshuffle {
    fn name(&self) -> &'static str {
        UNSHUFFLE
    }

    fn infer_shape(&self, inputs: &[&[usize]]) -> OpResult<Vec<usize>> {
        expect_inputs(UNSHUFFLE, inputs, 1)?;
        self.output_shape(inputs[0])
    }

    fn compute(&self, inputs: &[&DenseND<T>]) -> OpResult<DenseND<T>> {
        expect_inputs(UNSHUFFLE, inputs, 1)?;
        self.forward(inputs[0])
    }
}
