//! # TenXform
//!
//! Dense tensor-transform operators in pure Rust.
//!
//! TenXform bundles:
//!
//! - [`core`]: the dense tensor type [`DenseND`](core::DenseND) and shape operations
//! - [`ops`]: operators with shape inference, forward computation and gradients
//!   where defined
//!
//! ## Quick Start
//!
//! ```
//! use tenxform::prelude::*;
//!
//! let x = DenseND::<f32>::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[1, 1, 2, 2]).unwrap();
//!
//! // Nearest-neighbour upsampling
//! let up = upsample(UpsampleParams::new(2, 4)).unwrap();
//! let y = up.forward(&x).unwrap();
//! assert_eq!(y.shape(), &[1, 1, 4, 4]);
//!
//! // Replicate padding
//! let padded = pad(PadParams::new(1, 1, 1, 1).with_mode(PadMode::Replicate))
//!     .unwrap()
//!     .forward(&y)
//!     .unwrap();
//! assert_eq!(padded.shape(), &[1, 1, 6, 6]);
//! assert_eq!(padded[&[0, 0, 0, 0]], 1.0);
//! ```
//!
//! ## Operators Selected at Run Time
//!
//! ```
//! use tenxform::prelude::*;
//!
//! let pipeline = [
//!     OpConfig::BilinearResize(ResizeParams::default().with_scale_factor(2.0)),
//!     OpConfig::PixelUnshuffle(PixelShuffleParams::new(2)),
//!     OpConfig::Unsqueeze(UnsqueezeParams::new(0)),
//! ];
//!
//! let mut x = DenseND::<f64>::ones(&[1, 3, 4, 4]);
//! for config in &pipeline {
//!     let op = config.build::<f64>().unwrap();
//!     x = op.compute(&[&x]).unwrap();
//! }
//! assert_eq!(x.shape(), &[1, 1, 12, 4, 4]);
//! ```
//!
//! ## Features
//!
//! - `parallel` (default): Process batch-channel planes concurrently
//! - `serde`: Serialize operator configurations
//! - `tracing`: Structured logging of operator calls
//! - `full`: Enable all features

#![deny(warnings)]

// Re-export all components
pub use tenxform_core as core;
pub use tenxform_ops as ops;

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! # Example
    //!
    //! ```
    //! use tenxform::prelude::*;
    //!
    //! let tensor = DenseND::<f64>::zeros(&[1, 3, 8, 8]);
    //! let op = bilinear_resize(ResizeParams::default().with_target(4, 4)).unwrap();
    //! assert_eq!(op.forward(&tensor).unwrap().shape(), &[1, 3, 4, 4]);
    //! ```

    // Core types
    pub use crate::core::{DenseND, Element};

    // Operator contract and configuration
    pub use crate::ops::{OpConfig, OpError, OpResult, TensorOp};

    // Operators
    pub use crate::ops::{
        bilinear_resize, hard_sigmoid, hard_swish, max_unpool, pad, pixel_shuffle,
        pixel_unshuffle, relu6, unsqueeze, upsample,
    };

    // Parameters
    pub use crate::ops::{
        HardSigmoidParams, MaxUnpoolParams, PadMode, PadParams, PixelShuffleParams, Relu6Params,
        ResizeParams, ResizePlan, UnsqueezeParams, UpsampleParams,
    };
}
