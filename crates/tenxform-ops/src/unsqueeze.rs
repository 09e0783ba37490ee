//! Insertion of a size-1 axis
//!
//! Negative positions count from the end and resolve as `axis + rank + 1`;
//! the resolved position must lie in `[0, rank]`. The output buffer equals
//! the input buffer element for element.

use tenxform_core::{DenseND, Element};

use crate::error::{OpError, OpResult};
use crate::operator::TensorOp;
use crate::tracing_support::record_op;
use crate::utils::expect_inputs;

const NAME: &str = "unsqueeze";

/// Unsqueeze configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct UnsqueezeParams {
    /// Signed insertion position (required)
    pub axis: Option<isize>,
}

impl UnsqueezeParams {
    pub fn new(axis: isize) -> Self {
        UnsqueezeParams { axis: Some(axis) }
    }
}

/// Axis insertion operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsqueeze {
    axis: isize,
}

/// Build an unsqueeze operator; the insertion position is required.
pub fn unsqueeze(params: UnsqueezeParams) -> OpResult<Unsqueeze> {
    let axis = params.axis.ok_or(OpError::MissingParameter {
        op: NAME,
        name: "axis",
    })?;
    Ok(Unsqueeze { axis })
}

impl Unsqueeze {
    pub fn axis(&self) -> isize {
        self.axis
    }

    /// Insertion position for an input of rank `rank`.
    pub fn resolve(&self, rank: usize) -> OpResult<usize> {
        DenseND::<f64>::resolve_insert_axis(self.axis, rank).map_err(|_| OpError::AxisOutOfRange {
            axis: self.axis,
            rank,
        })
    }

    pub fn output_shape(&self, input_shape: &[usize]) -> OpResult<Vec<usize>> {
        let position = self.resolve(input_shape.len())?;
        let mut out = input_shape.to_vec();
        out.insert(position, 1);
        Ok(out)
    }

    /// # Examples
    ///
    /// ```
    /// use tenxform_core::DenseND;
    /// use tenxform_ops::{unsqueeze, UnsqueezeParams};
    ///
    /// let x = DenseND::<f32>::zeros(&[3, 4]);
    /// let op = unsqueeze(UnsqueezeParams::new(-2)).unwrap();
    /// assert_eq!(op.forward(&x).unwrap().shape(), &[3, 1, 4]);
    /// ```
    pub fn forward<T: Element>(&self, input: &DenseND<T>) -> OpResult<DenseND<T>> {
        let _span = op_span!("unsqueeze", input_shape = ?input.shape(), axis = self.axis);

        let out_shape = self.output_shape(input.shape())?;
        let output = input.reshape(&out_shape)?;
        record_op(NAME, output.shape());
        Ok(output)
    }
}

impl<T: Element> TensorOp<T> for Unsqueeze {
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

    /// Pass-through: the output gradient reshaped to the input shape.
    fn gradient(
        &self,
        output_grad: &DenseND<T>,
        inputs: &[&DenseND<T>],
    ) -> OpResult<Option<DenseND<T>>> {
        expect_inputs(NAME, inputs, 1)?;
        let expected = self.output_shape(inputs[0].shape())?;
        if output_grad.shape() != expected.as_slice() {
            return Err(OpError::ShapeMismatch {
                op: NAME,
                expected,
                actual: output_grad.shape_vec(),
            });
        }
        Ok(Some(output_grad.reshape(inputs[0].shape())?))
    }
}
