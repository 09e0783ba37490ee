//! # tenxform-core
//!
//! Core tensor types and shape operations for TenXform.
//!
//! This crate provides the building blocks that the operator library in
//! `tenxform-ops` reads from and writes into:
//!
//! - **Dense tensor representation** ([`DenseND`]) in row-major layout
//! - **Element trait** ([`Element`]) covering single and double precision
//! - **Shape operations** (reshape, unsqueeze, squeeze) that never reorder data
//!
//! ## Core Principles
//!
//! ### SciRS2 Integration
//!
//! This crate uses `scirs2-core` for array storage and numeric traits.
//! Direct use of `ndarray` or `num-traits` is avoided.
//!
//! ### Memory Layout
//!
//! Tensors are C-contiguous (row-major): the outermost dimension varies
//! slowest. The buffer length always equals the product of the shape.
//!
//! ## Quick Start
//!
//! ```
//! use tenxform_core::DenseND;
//!
//! // A 1x1x2x2 NCHW image
//! let image = DenseND::<f32>::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[1, 1, 2, 2]).unwrap();
//! assert_eq!(image.shape(), &[1, 1, 2, 2]);
//! assert_eq!(image.rank(), 4);
//! assert_eq!(image[&[0, 0, 1, 0]], 3.0);
//! ```
//!
//! ## Shape Operations
//!
//! ```
//! use tenxform_core::DenseND;
//!
//! let tensor = DenseND::<f64>::zeros(&[2, 3]);
//!
//! // Insert a size-1 axis; negative positions count from the end
//! let unsqueezed = tensor.unsqueeze_signed(-1).unwrap();
//! assert_eq!(unsqueezed.shape(), &[2, 3, 1]);
//!
//! let reshaped = tensor.reshape(&[3, 2]).unwrap();
//! assert_eq!(reshaped.shape(), &[3, 2]);
//! ```
//!
//! ## Error Handling
//!
//! Operations return `Result<T, anyhow::Error>`:
//!
//! ```
//! use tenxform_core::DenseND;
//!
//! let tensor = DenseND::<f64>::zeros(&[2, 3]);
//! assert!(tensor.reshape(&[7]).is_err());
//! assert!(tensor.unsqueeze(3).is_err());
//! ```

#![deny(warnings)]

pub mod dense;
pub mod types;

#[cfg(test)]
mod property_tests;

pub use types::{Axis, DenseND, Element, Rank, Shape};
