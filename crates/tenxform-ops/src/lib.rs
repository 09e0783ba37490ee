//! # tenxform-ops
//!
//! Dense tensor-transform operators for TenXform.
//!
//! ## Overview
//!
//! Every operator follows one contract ([`TensorOp`]): shape inference,
//! forward computation and, where one is defined, a gradient. Operators are
//! built by one constructor function each from a plain parameter struct and
//! hold no mutable state.
//!
//! **Operators:**
//! - **Bilinear resize** - pixel-center or corner-aligned resampling, with a
//!   reusable coordinate plan ([`ResizePlan`])
//! - **Pad / crop** - signed edge offsets on the two trailing axes, with
//!   constant, replicate and reflect fill
//! - **Pixel shuffle / unshuffle** - depth-to-space and its inverse
//! - **Upsample** - nearest-neighbour integer upscaling of 3D or 4D input
//! - **Unsqueeze** - size-1 axis insertion with signed positions
//! - **Max-unpool** - scatter of pooled values to recorded offsets
//! - **Activations** - ReLU6, hard sigmoid, hard swish
//!
//! ## Quick Start
//!
//! ```rust
//! use tenxform_core::DenseND;
//! use tenxform_ops::{bilinear_resize, pad, PadMode, PadParams, ResizeParams};
//!
//! // A 1x1x1x4 row resized to width 7 with aligned corners
//! let x = DenseND::<f64>::from_vec(vec![0.0, 10.0, 20.0, 30.0], &[1, 1, 1, 4]).unwrap();
//! let resize = bilinear_resize(
//!     ResizeParams::default().with_target_width(7).with_align_corners(true),
//! )
//! .unwrap();
//! let y = resize.forward(&x).unwrap();
//! assert_eq!(y[&[0, 0, 0, 3]], 15.0);
//!
//! // Reflect padding excludes the edge value
//! let reflect = pad(PadParams::new(0, 0, 2, 0).with_mode(PadMode::Reflect)).unwrap();
//! let z = reflect.forward(&x).unwrap();
//! assert_eq!(z.to_vec(), vec![20.0, 10.0, 0.0, 10.0, 20.0, 30.0]);
//! ```
//!
//! ## Dynamic Configuration
//!
//! A host that selects operators at run time uses [`OpConfig`]:
//!
//! ```rust
//! use tenxform_core::DenseND;
//! use tenxform_ops::{OpConfig, PixelShuffleParams};
//!
//! let op = OpConfig::PixelShuffle(PixelShuffleParams::new(2)).build::<f32>().unwrap();
//! let x = DenseND::<f32>::zeros(&[1, 8, 3, 3]);
//! assert_eq!(op.infer_shape(&[x.shape()]).unwrap(), vec![1, 2, 6, 6]);
//! ```
//!
//! ## Errors
//!
//! All operators return [`OpResult`]. Configuration problems are reported at
//! construction or shape inference, before any output is allocated; see
//! [`OpError::is_configuration`].
//!
//! ## Features
//!
//! - `parallel` (default) - Process batch-channel planes concurrently
//! - `serde` - Serialize and deserialize parameter structs and [`OpConfig`]
//! - `tracing` - Structured logging of operator calls (see [`tracing_support`])
//!
//! ## SciRS2 Integration
//!
//! This crate uses `scirs2-core` for array storage, numeric traits and
//! parallel iteration. Direct use of `ndarray`, `rayon` or `num-traits` is
//! avoided.

#![deny(warnings)]

#[macro_use]
pub mod tracing_support;

pub mod activation;
pub mod error;
pub mod max_unpool;
pub mod operator;
pub mod pad;
pub mod pixel_shuffle;
pub mod resize;
pub mod unsqueeze;
pub mod upsample;

mod utils;


// Re-exports
pub use activation::*;
pub use error::{OpError, OpResult};
pub use max_unpool::*;
pub use operator::{OpConfig, TensorOp};
pub use pad::*;
pub use pixel_shuffle::*;
pub use resize::*;
pub use unsqueeze::*;
pub use upsample::*;
