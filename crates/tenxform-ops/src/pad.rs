//! Padding and cropping of the two trailing axes
//!
//! Four signed edge offsets `(up, down, left, right)` act on the height and
//! width axes of a rank 2, 3 or 4 tensor. Non-negative offsets pad, offsets
//! that are all non-positive crop. Mixing strictly positive and strictly
//! negative offsets in one operator is rejected at construction.
//!
//! Padding regions are filled according to [`PadMode`]:
//!
//! - `Constant`: the configured fill value.
//! - `Replicate`: the nearest edge value, so corners take the corner value.
//! - `Reflect`: mirror image excluding the edge itself. `[1, 2, 3, 4, 5]`
//!   padded by two on the left becomes `[3, 2, 1, 2, 3, 4, 5]`.
//!
//! Every output cell is resolved through a per-axis source index map, which
//! is separable: reflecting columns and then rows gives the same corners as
//! reflecting the already-padded rows.
//!
//! # Gradient
//!
//! Gradients do not flow through padding. [`TensorOp::gradient`] returns a
//! zero tensor shaped like the input.

use tenxform_core::{DenseND, Element};

use crate::error::{OpError, OpResult};
use crate::operator::TensorOp;
use crate::tracing_support::record_op;
use crate::utils::{checked_volume, expect_inputs, for_each_plane, outer_count, to_elem};

const NAME: &str = "pad";

/// Fill policy for padding regions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum PadMode {
    /// Fill with a constant value
    #[default]
    Constant,
    /// Repeat the nearest edge value
    Replicate,
    /// Mirror interior values, excluding the edge
    Reflect,
}

/// Pad/crop configuration
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct PadParams {
    pub up: isize,
    pub down: isize,
    pub left: isize,
    pub right: isize,
    pub mode: PadMode,
    /// Fill value for [`PadMode::Constant`]
    pub value: f64,
}

impl PadParams {
    pub fn new(up: isize, down: isize, left: isize, right: isize) -> Self {
        PadParams {
            up,
            down,
            left,
            right,
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: PadMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }
}

/// Pad or crop operator
#[derive(Debug, Clone, PartialEq)]
pub struct Pad {
    params: PadParams,
    crop: bool,
}

/// Validate offsets and build the operator.
///
/// # Errors
///
/// Returns [`OpError::MixedPadSigns`] if the offsets mix strictly positive
/// and strictly negative values, and [`OpError::InvalidParameter`] for a
/// non-finite fill value.
///
/// # Examples
///
/// ```
/// use tenxform_core::DenseND;
/// use tenxform_ops::{pad, PadMode, PadParams};
///
/// let x = DenseND::<f64>::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0], &[1, 1, 1, 5]).unwrap();
/// let op = pad(PadParams::new(0, 0, 2, 0).with_mode(PadMode::Reflect)).unwrap();
/// assert_eq!(op.forward(&x).unwrap().to_vec(), vec![3.0, 2.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
///
/// assert!(pad(PadParams::new(1, -1, 0, 0)).is_err());
/// ```
pub fn pad(params: PadParams) -> OpResult<Pad> {
    let offsets = [params.up, params.down, params.left, params.right];
    let any_positive = offsets.iter().any(|&o| o > 0);
    let any_negative = offsets.iter().any(|&o| o < 0);

    if any_positive && any_negative {
        return Err(OpError::MixedPadSigns {
            up: params.up,
            down: params.down,
            left: params.left,
            right: params.right,
        });
    }
    if !params.value.is_finite() {
        return Err(OpError::invalid_parameter(
            NAME,
            "value",
            format!("{} is not finite", params.value),
        ));
    }

    Ok(Pad {
        params,
        crop: any_negative,
    })
}

/// Source index for output position `o` along one axis, or `None` for a
/// constant-filled cell.
fn source_index(mode: PadMode, o: usize, before: isize, extent: usize) -> Option<usize> {
    let i = o as isize - before;
    let last = extent as isize - 1;
    if (0..=last).contains(&i) {
        return Some(i as usize);
    }
    match mode {
        PadMode::Constant => None,
        PadMode::Replicate => Some(i.clamp(0, last) as usize),
        PadMode::Reflect => Some((if i < 0 { -i } else { 2 * last - i }) as usize),
    }
}

fn axis_map(mode: PadMode, out_extent: usize, before: isize, extent: usize) -> Vec<Option<usize>> {
    (0..out_extent)
        .map(|o| source_index(mode, o, before, extent))
        .collect()
}

impl Pad {
    pub fn params(&self) -> &PadParams {
        &self.params
    }

    /// `true` if the offsets crop instead of pad.
    pub fn is_crop(&self) -> bool {
        self.crop
    }

    fn check_axis(
        &self,
        axis: &'static str,
        extent: usize,
        before: (&'static str, isize),
        after: (&'static str, isize),
    ) -> OpResult<usize> {
        let out = isize::try_from(extent)
            .ok()
            .and_then(|e| e.checked_add(before.1))
            .and_then(|e| e.checked_add(after.1))
            .ok_or_else(|| {
                OpError::invalid_parameter(
                    NAME,
                    before.0,
                    format!(
                        "{} extent {} with offsets {} and {} overflows",
                        axis, extent, before.1, after.1
                    ),
                )
            })?;
        if out < 0 {
            return Err(OpError::EmptyExtent {
                op: NAME,
                axis,
                extent: out,
                reason: "crop removes more than the input extent",
            });
        }
        if self.crop {
            return Ok(out as usize);
        }

        for (name, offset) in [before, after] {
            if offset == 0 {
                continue;
            }
            match self.params.mode {
                PadMode::Constant => {}
                PadMode::Replicate if extent == 0 => {
                    return Err(OpError::EmptyExtent {
                        op: NAME,
                        axis,
                        extent: 0,
                        reason: "replicate padding needs a non-empty axis",
                    });
                }
                PadMode::Replicate => {}
                PadMode::Reflect if offset as usize >= extent => {
                    return Err(OpError::invalid_parameter(
                        NAME,
                        name,
                        format!(
                            "reflect offset {} must be smaller than the {} extent {}",
                            offset, axis, extent
                        ),
                    ));
                }
                PadMode::Reflect => {}
            }
        }

        Ok(out as usize)
    }

    /// Output shape: the input shape with the trailing two extents adjusted.
    pub fn output_shape(&self, input_shape: &[usize]) -> OpResult<Vec<usize>> {
        let rank = input_shape.len();
        if !(2..=4).contains(&rank) {
            return Err(OpError::invalid_rank(NAME, "2, 3 or 4", rank));
        }
        let p = &self.params;
        let out_h = self.check_axis("height", input_shape[rank - 2], ("up", p.up), ("down", p.down))?;
        let out_w = self.check_axis(
            "width",
            input_shape[rank - 1],
            ("left", p.left),
            ("right", p.right),
        )?;

        let mut out = input_shape.to_vec();
        out[rank - 2] = out_h;
        out[rank - 1] = out_w;
        checked_volume(NAME, "offsets", &out)?;
        Ok(out)
    }

    /// Pad or crop `input`.
    pub fn forward<T: Element>(&self, input: &DenseND<T>) -> OpResult<DenseND<T>> {
        let _span = op_span!("pad", input_shape = ?input.shape(), crop = self.crop);

        let out_shape = self.output_shape(input.shape())?;
        let rank = out_shape.len();
        let (h, w) = (input.shape()[rank - 2], input.shape()[rank - 1]);
        let (out_h, out_w) = (out_shape[rank - 2], out_shape[rank - 1]);
        let planes = outer_count(&out_shape, 2);

        let fill: T = to_elem(NAME, "value", self.params.value)?;
        let data = input.contiguous_data();
        let src_all: &[T] = &data;
        let mut out = vec![fill; planes * out_h * out_w];

        if self.crop {
            let top = (-self.params.up) as usize;
            let left = (-self.params.left) as usize;
            for_each_plane(&mut out, out_h * out_w, |p, plane| {
                let src = &src_all[p * h * w..(p + 1) * h * w];
                for (i, row) in plane.chunks_mut(out_w).enumerate() {
                    let start = (top + i) * w + left;
                    row.copy_from_slice(&src[start..start + out_w]);
                }
            });
        } else {
            let mode = self.params.mode;
            let rows = axis_map(mode, out_h, self.params.up, h);
            let cols = axis_map(mode, out_w, self.params.left, w);
            for_each_plane(&mut out, out_h * out_w, |p, plane| {
                let src = &src_all[p * h * w..(p + 1) * h * w];
                for (row, src_row) in plane.chunks_mut(out_w).zip(&rows) {
                    let Some(r) = src_row else { continue };
                    for (value, src_col) in row.iter_mut().zip(&cols) {
                        if let Some(c) = src_col {
                            *value = src[r * w + c];
                        }
                    }
                }
            });
        }

        let output = DenseND::from_vec(out, &out_shape)?;
        record_op(NAME, output.shape());
        Ok(output)
    }
}

impl<T: Element> TensorOp<T> for Pad {
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

    /// Padding derivatives are dropped: the input gradient is all zeros.
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
        Ok(Some(DenseND::zeros(inputs[0].shape())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(h: usize, w: usize) -> DenseND<f64> {
        DenseND::from_vec((1..=h * w).map(|v| v as f64).collect(), &[h, w]).unwrap()
    }

    #[test]
    fn test_constant_fill() {
        let op = pad(PadParams::new(1, 0, 0, 1).with_value(-1.0)).unwrap();
        let out = op.forward(&grid(2, 2)).unwrap();
        assert_eq!(out.shape(), &[3, 3]);
        assert_eq!(
            out.to_vec(),
            vec![-1.0, -1.0, -1.0, 1.0, 2.0, -1.0, 3.0, 4.0, -1.0]
        );
    }

    #[test]
    fn test_reflect_row() {
        let x = DenseND::<f64>::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0], &[1, 1, 1, 5]).unwrap();
        let op = pad(PadParams::new(0, 0, 2, 2).with_mode(PadMode::Reflect)).unwrap();
        assert_eq!(
            op.forward(&x).unwrap().to_vec(),
            vec![3.0, 2.0, 1.0, 2.0, 3.0, 4.0, 5.0, 4.0, 3.0]
        );
    }

    #[test]
    fn test_reflect_corners_use_padded_rows() {
        // 1 2 3
        // 4 5 6
        // 7 8 9
        let op = pad(PadParams::new(1, 1, 1, 1).with_mode(PadMode::Reflect)).unwrap();
        let out = op.forward(&grid(3, 3)).unwrap();
        assert_eq!(out.shape(), &[5, 5]);
        assert_eq!(out[&[0, 0]], 5.0);
        assert_eq!(out[&[0, 4]], 5.0);
        assert_eq!(out[&[4, 0]], 5.0);
        assert_eq!(out[&[0, 2]], 5.0);
        assert_eq!(out[&[2, 0]], 5.0);
        assert_eq!(out[&[4, 2]], 5.0);
        assert_eq!(out[&[1, 1]], 1.0);
        assert_eq!(out[&[0, 1]], 4.0);
    }

    #[test]
    fn test_replicate_edges_and_corners() {
        let op = pad(PadParams::new(1, 1, 2, 1).with_mode(PadMode::Replicate)).unwrap();
        let out = op.forward(&grid(2, 2)).unwrap();
        assert_eq!(out.shape(), &[4, 5]);
        assert_eq!(
            out.to_vec(),
            vec![
                1.0, 1.0, 1.0, 2.0, 2.0, //
                1.0, 1.0, 1.0, 2.0, 2.0, //
                3.0, 3.0, 3.0, 4.0, 4.0, //
                3.0, 3.0, 3.0, 4.0, 4.0,
            ]
        );
    }

    #[test]
    fn test_crop_interior() {
        let op = pad(PadParams::new(-1, 0, -1, -1)).unwrap();
        assert!(op.is_crop());
        let out = op.forward(&grid(3, 4)).unwrap();
        assert_eq!(out.shape(), &[2, 2]);
        assert_eq!(out.to_vec(), vec![6.0, 7.0, 10.0, 11.0]);
    }

    #[test]
    fn test_pad_then_crop_restores_input() {
        let x = DenseND::<f32>::from_vec((0..24).map(|v| v as f32).collect(), &[2, 3, 4]).unwrap();
        let padded = pad(PadParams::new(2, 1, 0, 3).with_value(9.0))
            .unwrap()
            .forward(&x)
            .unwrap();
        assert_eq!(padded.shape(), &[2, 6, 7]);
        let back = pad(PadParams::new(-2, -1, 0, -3))
            .unwrap()
            .forward(&padded)
            .unwrap();
        assert_eq!(back, x);
    }

    #[test]
    fn test_mixed_signs_rejected() {
        let err = pad(PadParams::new(1, 0, -1, 0)).unwrap_err();
        assert!(matches!(err, OpError::MixedPadSigns { .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_zero_offsets_copy() {
        let op = pad(PadParams::default()).unwrap();
        assert!(!op.is_crop());
        assert_eq!(op.forward(&grid(2, 3)).unwrap(), grid(2, 3));
    }

    #[test]
    fn test_crop_too_far_rejected() {
        let op = pad(PadParams::new(-2, -2, 0, 0)).unwrap();
        assert!(matches!(
            op.output_shape(&[3, 3]),
            Err(OpError::EmptyExtent { axis: "height", extent: -1, .. })
        ));
    }

    #[test]
    fn test_reflect_offset_must_fit() {
        let op = pad(PadParams::new(0, 0, 3, 0).with_mode(PadMode::Reflect)).unwrap();
        assert!(matches!(
            op.output_shape(&[1, 3]),
            Err(OpError::InvalidParameter { name: "left", .. })
        ));
        assert!(op.output_shape(&[1, 4]).is_ok());
    }

    #[test]
    fn test_replicate_needs_non_empty_axis() {
        let op = pad(PadParams::new(0, 0, 1, 0).with_mode(PadMode::Replicate)).unwrap();
        let err = op.output_shape(&[2, 0]).unwrap_err();
        assert!(matches!(
            err,
            OpError::EmptyExtent {
                axis: "width",
                extent: 0,
                ..
            }
        ));
        assert!(err.is_configuration());

        // Padding only the other axis leaves the empty one alone
        let rows = pad(PadParams::new(1, 0, 0, 0).with_mode(PadMode::Replicate)).unwrap();
        assert_eq!(rows.output_shape(&[2, 0]).unwrap(), vec![3, 0]);
    }

    #[test]
    fn test_overflowing_offsets_rejected() {
        let op = pad(PadParams::new(isize::MAX, 1, 0, 0)).unwrap();
        let err = op.output_shape(&[4, 4]).unwrap_err();
        assert!(matches!(err, OpError::InvalidParameter { name: "up", .. }));
        assert!(err.is_configuration());

        let wide = pad(PadParams::new(0, 0, isize::MAX / 2, 0)).unwrap();
        assert!(matches!(
            wide.output_shape(&[1, 8, 4, 4]),
            Err(OpError::InvalidParameter { name: "offsets", .. })
        ));
    }

    #[test]
    fn test_rank_limits() {
        let op = pad(PadParams::new(1, 1, 1, 1)).unwrap();
        assert!(op.output_shape(&[4]).is_err());
        assert!(op.output_shape(&[1, 1, 1, 1, 1]).is_err());
        assert_eq!(op.output_shape(&[2, 3, 4, 5]).unwrap(), vec![2, 3, 6, 7]);
    }

    #[test]
    fn test_gradient_is_zero() {
        let op = pad(PadParams::new(1, 1, 1, 1)).unwrap();
        let x = grid(2, 2);
        let g = DenseND::<f64>::ones(&[4, 4]);
        let grad = TensorOp::<f64>::gradient(&op, &g, &[&x]).unwrap().unwrap();
        assert_eq!(grad, DenseND::zeros(&[2, 2]));

        let wrong = DenseND::<f64>::ones(&[3, 3]);
        assert!(matches!(
            op.gradient(&wrong, &[&x]),
            Err(OpError::ShapeMismatch { .. })
        ));
    }
}
