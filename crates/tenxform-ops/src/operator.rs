//! The operator contract shared by every tensor transform
//!
//! Each operator is a small immutable value built by its constructor function
//! (`bilinear_resize`, `pad`, ...) from a parameter struct. Constructors
//! validate everything that does not depend on the input shape; the rest is
//! checked by [`TensorOp::infer_shape`] before any output is allocated.
//!
//! Operators hold no mutable state, so one instance can be shared across
//! threads and called concurrently.

use tenxform_core::{DenseND, Element};

use crate::activation::{
    hard_sigmoid, hard_swish, relu6, HardSigmoidParams, Relu6Params,
};
use crate::error::OpResult;
use crate::max_unpool::{max_unpool, MaxUnpoolParams};
use crate::pad::{pad, PadParams};
use crate::pixel_shuffle::{pixel_shuffle, pixel_unshuffle, PixelShuffleParams};
use crate::resize::{bilinear_resize, ResizeParams};
use crate::unsqueeze::{unsqueeze, UnsqueezeParams};
use crate::upsample::{upsample, UpsampleParams};

/// Shape inference, forward computation and optional gradient of one operator.
///
/// # Examples
///
/// ```
/// use tenxform_core::DenseND;
/// use tenxform_ops::{upsample, TensorOp, UpsampleParams};
///
/// let op = upsample(UpsampleParams::new(2, 4)).unwrap();
/// let x = DenseND::<f32>::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[1, 1, 2, 2]).unwrap();
///
/// let shape = TensorOp::<f32>::infer_shape(&op, &[x.shape()]).unwrap();
/// let y = op.compute(&[&x]).unwrap();
/// assert_eq!(y.shape(), shape.as_slice());
/// ```
pub trait TensorOp<T: Element>: Send + Sync {
    /// Stable operator name, as used in errors and log spans.
    fn name(&self) -> &'static str;

    /// Number of input tensors `compute` expects.
    fn num_inputs(&self) -> usize {
        1
    }

    /// Output shape for the given input shapes.
    fn infer_shape(&self, inputs: &[&[usize]]) -> OpResult<Vec<usize>>;

    /// Forward computation. The output shape equals `infer_shape` of the
    /// input shapes.
    fn compute(&self, inputs: &[&DenseND<T>]) -> OpResult<DenseND<T>>;

    /// Gradient with respect to the first input.
    ///
    /// `Ok(None)` means the operator defines no gradient. Callers that need
    /// full differentiability must treat that as a hard limitation rather
    /// than as a zero gradient.
    fn gradient(
        &self,
        _output_grad: &DenseND<T>,
        _inputs: &[&DenseND<T>],
    ) -> OpResult<Option<DenseND<T>>> {
        Ok(None)
    }
}

/// Configuration of any operator in this crate.
///
/// A closed set of tagged variants: the host selects an operator by
/// configuration value and calls [`OpConfig::build`]. With the `serde`
/// feature the tag is the `type` field:
///
/// ```json
/// { "type": "pad", "up": 1, "down": 1, "left": 2, "right": 2, "mode": "reflect" }
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", rename_all = "snake_case")
)]
pub enum OpConfig {
    BilinearResize(ResizeParams),
    Pad(PadParams),
    PixelShuffle(PixelShuffleParams),
    PixelUnshuffle(PixelShuffleParams),
    Upsample(UpsampleParams),
    Unsqueeze(UnsqueezeParams),
    MaxUnpool(MaxUnpoolParams),
    Relu6(Relu6Params),
    HardSigmoid(HardSigmoidParams),
    HardSwish,
}

impl OpConfig {
    /// Validate the configuration and build the operator it names.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenxform_core::DenseND;
    /// use tenxform_ops::{OpConfig, UnsqueezeParams};
    ///
    /// let op = OpConfig::Unsqueeze(UnsqueezeParams::new(-1)).build::<f64>().unwrap();
    /// let x = DenseND::<f64>::zeros(&[2, 3]);
    /// assert_eq!(op.compute(&[&x]).unwrap().shape(), &[2, 3, 1]);
    /// ```
    pub fn build<T: Element>(&self) -> OpResult<Box<dyn TensorOp<T>>> {
        Ok(match self {
            OpConfig::BilinearResize(p) => Box::new(bilinear_resize(p.clone())?),
            OpConfig::Pad(p) => Box::new(pad(p.clone())?),
            OpConfig::PixelShuffle(p) => Box::new(pixel_shuffle(p.clone())?),
            OpConfig::PixelUnshuffle(p) => Box::new(pixel_unshuffle(p.clone())?),
            OpConfig::Upsample(p) => Box::new(upsample(p.clone())?),
            OpConfig::Unsqueeze(p) => Box::new(unsqueeze(p.clone())?),
            OpConfig::MaxUnpool(p) => Box::new(max_unpool(p.clone())?),
            OpConfig::Relu6(p) => Box::new(relu6(p.clone())?),
            OpConfig::HardSigmoid(p) => Box::new(hard_sigmoid(p.clone())?),
            OpConfig::HardSwish => Box::new(hard_swish()),
        })
    }
}
