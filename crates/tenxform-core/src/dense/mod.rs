//! Dense tensor implementation and operations
//!
//! The tensor type lives in [`types`]; shape manipulation and trait
//! implementations are split into their own sub-modules.

// Core type definition
pub mod types;

mod shape_ops;

// Supporting modules
pub mod densend_traits;

// Re-export the main type
pub use types::DenseND;
