//! Error types for tensor-transform operators
//!
//! Errors fall into two classes:
//!
//! - **Configuration errors**, detected during setup or shape inference,
//!   before any output is produced.
//! - **Runtime invariant violations**, detected during compute (an
//!   out-of-range scatter index in max-unpooling).
//!
//! Both abort the call; operators never return partial results.

use thiserror::Error;

/// Error type for tensor-transform operators
#[derive(Error, Debug)]
pub enum OpError {
    /// Target size and scale factor were both given, or neither was.
    #[error("{op}: invalid sizing mode: {reason}")]
    InvalidSizing { op: &'static str, reason: String },

    /// A parameter value is outside its valid domain.
    #[error("{op}: invalid parameter '{name}': {reason}")]
    InvalidParameter {
        op: &'static str,
        name: &'static str,
        reason: String,
    },

    /// A required parameter was not provided.
    #[error("{op}: missing required parameter '{name}'")]
    MissingParameter { op: &'static str, name: &'static str },

    /// Pad offsets mix strictly positive and strictly negative values.
    #[error("pad: offsets (up={up}, down={down}, left={left}, right={right}) mix padding and cropping")]
    MixedPadSigns {
        up: isize,
        down: isize,
        left: isize,
        right: isize,
    },

    /// Channel count is not divisible by the squared upscale factor.
    #[error("{op}: channel count {channels} is not divisible by {divisor}")]
    IndivisibleChannels {
        op: &'static str,
        channels: usize,
        divisor: usize,
    },

    /// Signed insertion axis resolves outside `[0, rank]`.
    #[error("unsqueeze: axis {axis} out of range for rank {rank}")]
    AxisOutOfRange { axis: isize, rank: usize },

    /// Upsample `dims` other than 3 or 4.
    #[error("upsample: dims {0} is not supported (expected 3 or 4)")]
    UnsupportedDims(usize),

    /// Input rank is not one the operator accepts.
    #[error("{op}: unsupported input rank {actual}, expected {expected}")]
    InvalidRank {
        op: &'static str,
        expected: String,
        actual: usize,
    },

    /// Input shapes are inconsistent with each other or with the output.
    #[error("{op}: shape mismatch - expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        op: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// An output extent would be negative or zero where data is required.
    #[error("{op}: {axis} extent {extent} is invalid: {reason}")]
    EmptyExtent {
        op: &'static str,
        axis: &'static str,
        extent: isize,
        reason: &'static str,
    },

    /// Wrong number of input tensors for the operator.
    #[error("{op}: expected {expected} input tensor(s), got {actual}")]
    InputCount {
        op: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Scatter index outside the destination plane.
    #[error("max_unpool: index {index} at position {position} out of range for plane of {plane_len} elements")]
    IndexOutOfRange {
        index: i64,
        position: usize,
        plane_len: usize,
    },

    /// Scatter index that is not an integer (NaN or infinite).
    #[error("max_unpool: index at position {position} is not an integer")]
    NonIntegralIndex { position: usize },

    /// Failure reported by the tensor core.
    #[error(transparent)]
    Tensor(#[from] anyhow::Error),
}

/// Result type for operator calls
pub type OpResult<T> = Result<T, OpError>;

impl OpError {
    /// Whether this error was detected during setup or shape inference.
    ///
    /// Returns `false` for runtime invariant violations found while computing
    /// and for failures reported by the tensor core.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenxform_ops::OpError;
    ///
    /// assert!(OpError::UnsupportedDims(5).is_configuration());
    /// let runtime = OpError::IndexOutOfRange { index: 9, position: 0, plane_len: 4 };
    /// assert!(!runtime.is_configuration());
    /// ```
    pub fn is_configuration(&self) -> bool {
        !matches!(
            self,
            OpError::IndexOutOfRange { .. } | OpError::NonIntegralIndex { .. } | OpError::Tensor(_)
        )
    }

    pub(crate) fn invalid_parameter(
        op: &'static str,
        name: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        OpError::InvalidParameter {
            op,
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_rank(op: &'static str, expected: impl Into<String>, actual: usize) -> Self {
        OpError::InvalidRank {
            op,
            expected: expected.into(),
            actual,
        }
    }
}
