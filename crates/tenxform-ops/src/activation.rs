//! Element-wise clipped activations
//!
//! - [`Relu6`]: `y = min(max(x, 0) + slope * min(x, 0), threshold)`
//! - [`HardSigmoid`]: `y = clamp(alpha * x + beta, 0, 1)`
//! - [`HardSwish`]: `y = x * clamp(x / 6 + 0.5, 0, 1)`
//!
//! All three keep the input shape. Only ReLU6 defines a gradient.

use tenxform_core::{DenseND, Element};

use crate::error::{OpError, OpResult};
use crate::operator::TensorOp;
use crate::tracing_support::record_op;
use crate::utils::{expect_inputs, to_elem};

const RELU6: &str = "relu6";
const HARD_SIGMOID: &str = "hard_sigmoid";
const HARD_SWISH: &str = "hard_swish";

fn map_elementwise<T: Element, F>(input: &DenseND<T>, f: F) -> DenseND<T>
where
    F: Fn(T) -> T,
{
    DenseND::from_array(input.as_array().mapv(f))
}

fn clamp_unit<T: Element>(v: T) -> T {
    v.max(T::zero()).min(T::one())
}

fn check_finite(op: &'static str, name: &'static str, value: f64) -> OpResult<()> {
    if !value.is_finite() {
        return Err(OpError::invalid_parameter(
            op,
            name,
            format!("{} is not finite", value),
        ));
    }
    Ok(())
}

/// ReLU6 configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct Relu6Params {
    /// Slope applied to negative inputs
    pub slope: f64,
    /// Upper clip value
    pub threshold: f64,
}

impl Default for Relu6Params {
    fn default() -> Self {
        Relu6Params {
            slope: 0.0,
            threshold: 6.0,
        }
    }
}

impl Relu6Params {
    pub fn with_slope(mut self, slope: f64) -> Self {
        self.slope = slope;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }
}

/// Hard sigmoid configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct HardSigmoidParams {
    pub alpha: f64,
    pub beta: f64,
}

impl Default for HardSigmoidParams {
    fn default() -> Self {
        HardSigmoidParams {
            alpha: 0.2,
            beta: 0.5,
        }
    }
}

impl HardSigmoidParams {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relu6 {
    params: Relu6Params,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HardSigmoid {
    params: HardSigmoidParams,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HardSwish;

pub fn relu6(params: Relu6Params) -> OpResult<Relu6> {
    check_finite(RELU6, "slope", params.slope)?;
    check_finite(RELU6, "threshold", params.threshold)?;
    Ok(Relu6 { params })
}

pub fn hard_sigmoid(params: HardSigmoidParams) -> OpResult<HardSigmoid> {
    check_finite(HARD_SIGMOID, "alpha", params.alpha)?;
    check_finite(HARD_SIGMOID, "beta", params.beta)?;
    Ok(HardSigmoid { params })
}

pub fn hard_swish() -> HardSwish {
    HardSwish
}

impl Relu6 {
    pub fn params(&self) -> &Relu6Params {
        &self.params
    }

    /// # Examples
    ///
    /// ```
    /// use tenxform_core::DenseND;
    /// use tenxform_ops::{relu6, Relu6Params};
    ///
    /// let x = DenseND::<f32>::from_vec(vec![-2.0, 3.0, 9.0], &[3]).unwrap();
    /// let op = relu6(Relu6Params::default()).unwrap();
    /// assert_eq!(op.forward(&x).unwrap().to_vec(), vec![0.0, 3.0, 6.0]);
    /// ```
    pub fn forward<T: Element>(&self, input: &DenseND<T>) -> OpResult<DenseND<T>> {
        let _span = op_span!("relu6", input_shape = ?input.shape());

        let slope: T = to_elem(RELU6, "slope", self.params.slope)?;
        let threshold: T = to_elem(RELU6, "threshold", self.params.threshold)?;
        let zero = T::zero();
        let output = map_elementwise(input, |x| {
            (x.max(zero) + slope * x.min(zero)).min(threshold)
        });

        record_op(RELU6, output.shape());
        Ok(output)
    }

    /// `dx = dy * (x > 0 ? 1 : slope) * (x < threshold ? 1 : 0)`
    pub fn backward<T: Element>(
        &self,
        output_grad: &DenseND<T>,
        input: &DenseND<T>,
    ) -> OpResult<DenseND<T>> {
        if !output_grad.same_shape(input) {
            return Err(OpError::ShapeMismatch {
                op: RELU6,
                expected: input.shape_vec(),
                actual: output_grad.shape_vec(),
            });
        }
        let slope: T = to_elem(RELU6, "slope", self.params.slope)?;
        let threshold: T = to_elem(RELU6, "threshold", self.params.threshold)?;
        let zero = T::zero();

        let mut grad = output_grad.as_array().to_owned();
        grad.zip_mut_with(input.as_array(), |dy, &x| {
            let pass = if x > zero { T::one() } else { slope };
            *dy = if x < threshold { *dy * pass } else { zero };
        });
        Ok(DenseND::from_array(grad))
    }
}

impl HardSigmoid {
    pub fn params(&self) -> &HardSigmoidParams {
        &self.params
    }

    pub fn forward<T: Element>(&self, input: &DenseND<T>) -> OpResult<DenseND<T>> {
        let _span = op_span!("hard_sigmoid", input_shape = ?input.shape());

        let alpha: T = to_elem(HARD_SIGMOID, "alpha", self.params.alpha)?;
        let beta: T = to_elem(HARD_SIGMOID, "beta", self.params.beta)?;
        let output = map_elementwise(input, |x| clamp_unit(alpha * x + beta));

        record_op(HARD_SIGMOID, output.shape());
        Ok(output)
    }
}

impl HardSwish {
    pub fn forward<T: Element>(&self, input: &DenseND<T>) -> OpResult<DenseND<T>> {
        let _span = op_span!("hard_swish", input_shape = ?input.shape());

        let sixth: T = to_elem(HARD_SWISH, "scale", 1.0 / 6.0)?;
        let half: T = to_elem(HARD_SWISH, "offset", 0.5)?;
        let output = map_elementwise(input, |x| x * clamp_unit(x * sixth + half));

        record_op(HARD_SWISH, output.shape());
        Ok(output)
    }
}

macro_rules! elementwise_op {
    ($ty:ty, $name:expr) => {
        impl<T: Element> TensorOp<T> for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn infer_shape(&self, inputs: &[&[usize]]) -> OpResult<Vec<usize>> {
                expect_inputs($name, inputs, 1)?;
                Ok(inputs[0].to_vec())
            }

            fn compute(&self, inputs: &[&DenseND<T>]) -> OpResult<DenseND<T>> {
                expect_inputs($name, inputs, 1)?;
                self.forward(inputs[0])
            }
        }
    };
}

elementwise_op!(HardSigmoid, HARD_SIGMOID);
elementwise_op!(HardSwish, HARD_SWISH);

impl<T: Element> TensorOp<T> for Relu6 {
    fn name(&self) -> &'static str {
        RELU6
    }

    fn infer_shape(&self, inputs: &[&[usize]]) -> OpResult<Vec<usize>> {
        expect_inputs(RELU6, inputs, 1)?;
        Ok(inputs[0].to_vec())
    }

    fn compute(&self, inputs: &[&DenseND<T>]) -> OpResult<DenseND<T>> {
        expect_inputs(RELU6, inputs, 1)?;
        self.forward(inputs[0])
    }

    fn gradient(
        &self,
        output_grad: &DenseND<T>,
        inputs: &[&DenseND<T>],
    ) -> OpResult<Option<DenseND<T>>> {
        expect_inputs(RELU6, inputs, 1)?;
        self.backward(output_grad, inputs[0]).map(Some)
    }
}
