//! Bilinear spatial resize of NCHW tensors
//!
//! The output height and width come either from an explicit target size or
//! from a scale factor, never both. Source coordinates are mapped per axis
//! with one of two conventions:
//!
//! - **align corners**: `src = dst * (src_extent - 1) / (dst_extent - 1)`,
//!   so the first and last samples of both grids coincide.
//! - **pixel centers** (default): `src = (dst + 0.5) * src_extent / dst_extent - 0.5`.
//!
//! The mapped coordinate is clamped into `[0, src_extent - 1]` and blended
//! from its four neighbours:
//!
//! ```text
//! out = (1-fh)*((1-fw)*q00 + fw*q01) + fh*((1-fw)*q10 + fw*q11)
//! ```
//!
//! Per-axis coordinate tables live in an explicit [`ResizePlan`]. A caller
//! that resizes many tensors of the same size keeps one plan and passes it
//! to [`BilinearResize::forward_with_plan`]; the plan is rebuilt only when
//! the source size, target size or alignment mode changes.
//!
//! # Gradient
//!
//! No backward pass is defined. [`TensorOp::gradient`] returns `Ok(None)`.

use tenxform_core::{DenseND, Element};

use crate::error::{OpError, OpResult};
use crate::operator::TensorOp;
use crate::tracing_support::{record_op, record_plan_rebuild};
use crate::utils::{checked_volume, expect_inputs, for_each_plane, outer_count, to_elem};

const NAME: &str = "bilinear_resize";

/// Resize configuration.
///
/// Exactly one sizing mode must be active: a target size (either extent may
/// be left unset and then keeps the input's own extent) or a scale factor.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ResizeParams {
    pub target_height: Option<usize>,
    pub target_width: Option<usize>,
    pub scale_factor: Option<f64>,
    pub align_corners: bool,
}

impl ResizeParams {
    pub fn with_target(mut self, height: usize, width: usize) -> Self {
        self.target_height = Some(height);
        self.target_width = Some(width);
        self
    }

    pub fn with_target_height(mut self, height: usize) -> Self {
        self.target_height = Some(height);
        self
    }

    pub fn with_target_width(mut self, width: usize) -> Self {
        self.target_width = Some(width);
        self
    }

    pub fn with_scale_factor(mut self, scale: f64) -> Self {
        self.scale_factor = Some(scale);
        self
    }

    pub fn with_align_corners(mut self, align_corners: bool) -> Self {
        self.align_corners = align_corners;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Sizing {
    Target {
        height: Option<usize>,
        width: Option<usize>,
    },
    Scale(f64),
}

/// Source coordinates and blend weights for every destination index of one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisTable {
    /// Clamped real-valued source coordinate
    pub coords: Vec<f64>,
    /// Lower neighbour index
    pub lo: Vec<usize>,
    /// Upper neighbour index (`lo + 1`, or `lo` for a single-sample source)
    pub hi: Vec<usize>,
    /// Weight of the upper neighbour, `coord - lo`
    pub frac: Vec<f64>,
}

impl AxisTable {
    /// Build the table mapping `dst` destination indices onto `src` samples.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenxform_ops::AxisTable;
    ///
    /// let table = AxisTable::build(4, 7, true);
    /// assert_eq!(table.coords[3], 1.5);
    /// assert_eq!((table.lo[3], table.hi[3]), (1, 2));
    /// assert_eq!(table.frac[3], 0.5);
    /// ```
    pub fn build(src: usize, dst: usize, align_corners: bool) -> Self {
        let mut table = AxisTable {
            coords: Vec::with_capacity(dst),
            lo: Vec::with_capacity(dst),
            hi: Vec::with_capacity(dst),
            frac: Vec::with_capacity(dst),
        };
        let max_coord = src.saturating_sub(1) as f64;

        for d in 0..dst {
            let coord = if align_corners {
                if dst > 1 {
                    d as f64 * max_coord / (dst - 1) as f64
                } else {
                    0.0
                }
            } else {
                (d as f64 + 0.5) * src as f64 / dst as f64 - 0.5
            };
            let coord = coord.clamp(0.0, max_coord);

            let (lo, hi) = if src > 1 {
                let lo = (coord.floor() as usize).min(src - 2);
                (lo, lo + 1)
            } else {
                (0, 0)
            };

            table.coords.push(coord);
            table.lo.push(lo);
            table.hi.push(hi);
            table.frac.push(coord - lo as f64);
        }

        table
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

/// Cached coordinate tables for one `(source, target, align_corners)` key.
///
/// # Examples
///
/// ```
/// use tenxform_core::DenseND;
/// use tenxform_ops::{bilinear_resize, ResizeParams, ResizePlan};
///
/// let op = bilinear_resize(ResizeParams::default().with_target(4, 4)).unwrap();
/// let mut plan = ResizePlan::default();
///
/// let x = DenseND::<f32>::ones(&[1, 3, 2, 2]);
/// let y = op.forward_with_plan(&x, &mut plan).unwrap();
/// assert_eq!(y.shape(), &[1, 3, 4, 4]);
/// assert!(plan.is_valid_for((2, 2), (4, 4), false));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResizePlan {
    source: (usize, usize),
    target: (usize, usize),
    align_corners: bool,
    rows: AxisTable,
    cols: AxisTable,
}

impl Default for AxisTable {
    fn default() -> Self {
        AxisTable::build(0, 0, false)
    }
}

impl ResizePlan {
    /// Build the row and column tables for a `source` to `target` resize.
    pub fn new(source: (usize, usize), target: (usize, usize), align_corners: bool) -> Self {
        ResizePlan {
            source,
            target,
            align_corners,
            rows: AxisTable::build(source.0, target.0, align_corners),
            cols: AxisTable::build(source.1, target.1, align_corners),
        }
    }

    pub fn source(&self) -> (usize, usize) {
        self.source
    }

    pub fn target(&self) -> (usize, usize) {
        self.target
    }

    pub fn align_corners(&self) -> bool {
        self.align_corners
    }

    pub fn rows(&self) -> &AxisTable {
        &self.rows
    }

    pub fn cols(&self) -> &AxisTable {
        &self.cols
    }

    /// Target equals source; the resize is an exact copy.
    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }

    pub fn is_valid_for(
        &self,
        source: (usize, usize),
        target: (usize, usize),
        align_corners: bool,
    ) -> bool {
        self.source == source && self.target == target && self.align_corners == align_corners
    }

    /// Bring the plan in line with `op` applied to `input_shape`.
    ///
    /// Returns `true` if the tables were rebuilt.
    pub fn refresh(&mut self, op: &BilinearResize, input_shape: &[usize]) -> OpResult<bool> {
        let out = op.output_shape(input_shape)?;
        let source = (input_shape[2], input_shape[3]);
        let target = (out[2], out[3]);

        if self.is_valid_for(source, target, op.align_corners) {
            return Ok(false);
        }

        record_plan_rebuild(source, target, op.align_corners);
        *self = ResizePlan::new(source, target, op.align_corners);
        Ok(true)
    }
}

/// Bilinear resize operator
#[derive(Debug, Clone, PartialEq)]
pub struct BilinearResize {
    sizing: Sizing,
    align_corners: bool,
}

/// Validate resize parameters and build the operator.
///
/// # Errors
///
/// - [`OpError::InvalidSizing`] if both a target size and a scale factor are
///   given, or neither.
/// - [`OpError::InvalidParameter`] for a non-finite or non-positive scale
///   factor, or an explicit target extent of zero.
///
/// # Examples
///
/// ```
/// use tenxform_ops::{bilinear_resize, ResizeParams};
///
/// assert!(bilinear_resize(ResizeParams::default().with_scale_factor(2.0)).is_ok());
/// assert!(bilinear_resize(ResizeParams::default()).is_err());
/// assert!(bilinear_resize(
///     ResizeParams::default().with_target_width(8).with_scale_factor(2.0)
/// )
/// .is_err());
/// ```
pub fn bilinear_resize(params: ResizeParams) -> OpResult<BilinearResize> {
    let has_target = params.target_height.is_some() || params.target_width.is_some();

    let sizing = match (has_target, params.scale_factor) {
        (true, None) => {
            for (name, extent) in [
                ("target_height", params.target_height),
                ("target_width", params.target_width),
            ] {
                if extent == Some(0) {
                    return Err(OpError::invalid_parameter(NAME, name, "must be positive"));
                }
            }
            Sizing::Target {
                height: params.target_height,
                width: params.target_width,
            }
        }
        (false, Some(scale)) => {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(OpError::invalid_parameter(
                    NAME,
                    "scale_factor",
                    format!("{} is not a positive finite number", scale),
                ));
            }
            Sizing::Scale(scale)
        }
        (true, Some(_)) => {
            return Err(OpError::InvalidSizing {
                op: NAME,
                reason: "target size and scale factor are mutually exclusive".to_string(),
            })
        }
        (false, None) => {
            return Err(OpError::InvalidSizing {
                op: NAME,
                reason: "neither target size nor scale factor given".to_string(),
            })
        }
    };

    Ok(BilinearResize {
        sizing,
        align_corners: params.align_corners,
    })
}

/// `floor(src * scale)`, rejected when it does not fit in `usize`.
fn scaled_extent(src: usize, scale: f64) -> OpResult<usize> {
    let extent = (src as f64 * scale).floor();
    if extent >= usize::MAX as f64 {
        return Err(OpError::invalid_parameter(
            NAME,
            "scale_factor",
            format!("{} x {} overflows the addressable extent", src, scale),
        ));
    }
    Ok(extent as usize)
}

impl BilinearResize {
    pub fn align_corners(&self) -> bool {
        self.align_corners
    }

    /// Resolve the output height and width for a source of `(src_h, src_w)`.
    pub fn resolve_target(&self, src_h: usize, src_w: usize) -> OpResult<(usize, usize)> {
        let (dst_h, dst_w) = match self.sizing {
            Sizing::Target { height, width } => (height.unwrap_or(src_h), width.unwrap_or(src_w)),
            Sizing::Scale(scale) => (scaled_extent(src_h, scale)?, scaled_extent(src_w, scale)?),
        };

        for (axis, src, dst) in [("height", src_h, dst_h), ("width", src_w, dst_w)] {
            if dst == 0 && src > 0 {
                return Err(OpError::EmptyExtent {
                    op: NAME,
                    axis,
                    extent: 0,
                    reason: "scale factor resolves to an empty output",
                });
            }
            if src == 0 && dst > 0 {
                return Err(OpError::EmptyExtent {
                    op: NAME,
                    axis,
                    extent: 0,
                    reason: "cannot interpolate from an empty source",
                });
            }
        }

        Ok((dst_h, dst_w))
    }

    /// Output shape for an NCHW input shape.
    pub fn output_shape(&self, input_shape: &[usize]) -> OpResult<Vec<usize>> {
        if input_shape.len() != 4 {
            return Err(OpError::invalid_rank(NAME, "4", input_shape.len()));
        }
        let (dst_h, dst_w) = self.resolve_target(input_shape[2], input_shape[3])?;
        let out = vec![input_shape[0], input_shape[1], dst_h, dst_w];
        checked_volume(NAME, "target", &out)?;
        Ok(out)
    }

    /// Build a fresh plan for `input_shape`.
    pub fn plan(&self, input_shape: &[usize]) -> OpResult<ResizePlan> {
        let out = self.output_shape(input_shape)?;
        Ok(ResizePlan::new(
            (input_shape[2], input_shape[3]),
            (out[2], out[3]),
            self.align_corners,
        ))
    }

    /// Resize `input`, building the coordinate tables for this call only.
    pub fn forward<T: Element>(&self, input: &DenseND<T>) -> OpResult<DenseND<T>> {
        let _span = op_span!("bilinear_resize", input_shape = ?input.shape());

        let out_shape = self.output_shape(input.shape())?;
        let output = if out_shape == input.shape() {
            DenseND::from_vec(input.to_vec(), &out_shape)?
        } else {
            let plan = self.plan(input.shape())?;
            interpolate(input, &plan)?
        };

        record_op(NAME, output.shape());
        Ok(output)
    }

    /// Resize `input` reusing `plan`, which is rebuilt first if it was made
    /// for a different size or alignment mode.
    pub fn forward_with_plan<T: Element>(
        &self,
        input: &DenseND<T>,
        plan: &mut ResizePlan,
    ) -> OpResult<DenseND<T>> {
        let _span = op_span!("bilinear_resize", input_shape = ?input.shape(), cached = true);

        plan.refresh(self, input.shape())?;
        let output = if plan.is_identity() {
            DenseND::from_vec(input.to_vec(), input.shape())?
        } else {
            interpolate(input, plan)?
        };

        record_op(NAME, output.shape());
        Ok(output)
    }
}

fn weights<T: Element>(fracs: &[f64]) -> OpResult<Vec<T>> {
    fracs.iter().map(|&f| to_elem(NAME, "weight", f)).collect()
}

fn interpolate<T: Element>(input: &DenseND<T>, plan: &ResizePlan) -> OpResult<DenseND<T>> {
    let (src_h, src_w) = plan.source();
    let (dst_h, dst_w) = plan.target();
    let planes = outer_count(input.shape(), 2);

    let fh: Vec<T> = weights(&plan.rows().frac)?;
    let fw: Vec<T> = weights(&plan.cols().frac)?;
    let rows = plan.rows();
    let cols = plan.cols();

    let data = input.contiguous_data();
    let src_all: &[T] = &data;
    let src_plane = src_h * src_w;
    let one = T::one();

    let mut out = vec![T::zero(); planes * dst_h * dst_w];
    for_each_plane(&mut out, dst_h * dst_w, |p, plane| {
        let src = &src_all[p * src_plane..(p + 1) * src_plane];
        for (i, row) in plane.chunks_mut(dst_w).enumerate() {
            let top = rows.lo[i] * src_w;
            let bottom = rows.hi[i] * src_w;
            let a = fh[i];
            for (j, value) in row.iter_mut().enumerate() {
                let (c0, c1, b) = (cols.lo[j], cols.hi[j], fw[j]);
                let upper = (one - b) * src[top + c0] + b * src[top + c1];
                let lower = (one - b) * src[bottom + c0] + b * src[bottom + c1];
                *value = (one - a) * upper + a * lower;
            }
        }
    });

    let shape = [input.shape()[0], input.shape()[1], dst_h, dst_w];
    Ok(DenseND::from_vec(out, &shape)?)
}

impl<T: Element> TensorOp<T> for BilinearResize {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[f64]) -> DenseND<f64> {
        DenseND::from_vec(values.to_vec(), &[1, 1, 1, values.len()]).unwrap()
    }

    #[test]
    fn test_align_corners_formula() {
        let op = bilinear_resize(
            ResizeParams::default()
                .with_target_width(7)
                .with_align_corners(true),
        )
        .unwrap();
        let out = op.forward(&row(&[0.0, 10.0, 20.0, 30.0])).unwrap();
        assert_eq!(out.shape(), &[1, 1, 1, 7]);
        assert!((out[&[0, 0, 0, 3]] - 15.0).abs() < 1e-12);
        assert_eq!(out[&[0, 0, 0, 0]], 0.0);
        assert_eq!(out[&[0, 0, 0, 6]], 30.0);
    }

    #[test]
    fn test_pixel_center_formula() {
        let op = bilinear_resize(ResizeParams::default().with_target_width(2)).unwrap();
        let out = op.forward(&row(&[0.0, 10.0, 20.0, 30.0])).unwrap();
        assert_eq!(out.shape(), &[1, 1, 1, 2]);
        assert!((out[&[0, 0, 0, 0]] - 5.0).abs() < 1e-12);
        assert!((out[&[0, 0, 0, 1]] - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_identity_is_exact_copy() {
        let x = DenseND::<f32>::from_vec((0..24).map(|v| v as f32 * 0.1).collect(), &[1, 2, 3, 4])
            .unwrap();
        for align in [false, true] {
            let op = bilinear_resize(
                ResizeParams::default()
                    .with_target(3, 4)
                    .with_align_corners(align),
            )
            .unwrap();
            assert_eq!(op.forward(&x).unwrap(), x);
        }
    }

    #[test]
    fn test_unset_target_keeps_input_extent() {
        let op = bilinear_resize(ResizeParams::default().with_target_height(5)).unwrap();
        assert_eq!(op.output_shape(&[2, 3, 4, 6]).unwrap(), vec![2, 3, 5, 6]);
    }

    #[test]
    fn test_scale_factor_floors() {
        let op = bilinear_resize(ResizeParams::default().with_scale_factor(1.5)).unwrap();
        assert_eq!(op.output_shape(&[1, 1, 3, 5]).unwrap(), vec![1, 1, 4, 7]);
    }

    #[test]
    fn test_sizing_errors() {
        let both = ResizeParams::default()
            .with_target(4, 4)
            .with_scale_factor(2.0);
        assert!(matches!(
            bilinear_resize(both),
            Err(OpError::InvalidSizing { .. })
        ));
        assert!(matches!(
            bilinear_resize(ResizeParams::default()),
            Err(OpError::InvalidSizing { .. })
        ));
        for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                bilinear_resize(ResizeParams::default().with_scale_factor(scale)),
                Err(OpError::InvalidParameter { .. })
            ));
        }
        assert!(bilinear_resize(ResizeParams::default().with_target_width(0)).is_err());
    }

    #[test]
    fn test_scale_to_empty_output_rejected() {
        let op = bilinear_resize(ResizeParams::default().with_scale_factor(0.1)).unwrap();
        let err = op.output_shape(&[1, 1, 4, 4]).unwrap_err();
        assert!(matches!(err, OpError::EmptyExtent { axis: "height", .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_huge_scale_rejected() {
        let op = bilinear_resize(ResizeParams::default().with_scale_factor(1e300)).unwrap();
        let err = op.output_shape(&[1, 1, 4, 4]).unwrap_err();
        assert!(matches!(
            err,
            OpError::InvalidParameter {
                name: "scale_factor",
                ..
            }
        ));
        assert!(err.is_configuration());
        assert!(op.forward(&DenseND::<f32>::ones(&[1, 1, 4, 4])).is_err());
    }

    #[test]
    fn test_oversized_target_rejected() {
        let op = bilinear_resize(ResizeParams::default().with_target(usize::MAX / 2, 4)).unwrap();
        assert!(matches!(
            op.output_shape(&[1, 1, 2, 2]),
            Err(OpError::InvalidParameter { name: "target", .. })
        ));
    }

    #[test]
    fn test_rank_must_be_four() {
        let op = bilinear_resize(ResizeParams::default().with_target(2, 2)).unwrap();
        assert!(matches!(
            op.output_shape(&[3, 4, 4]),
            Err(OpError::InvalidRank { actual: 3, .. })
        ));
    }

    #[test]
    fn test_single_sample_source_broadcasts() {
        let x = DenseND::<f64>::from_vec(vec![7.0, -2.0], &[1, 2, 1, 1]).unwrap();
        for align in [false, true] {
            let op = bilinear_resize(
                ResizeParams::default()
                    .with_target(3, 2)
                    .with_align_corners(align),
            )
            .unwrap();
            let out = op.forward(&x).unwrap();
            assert_eq!(out.shape(), &[1, 2, 3, 2]);
            assert!(out.to_vec()[..6].iter().all(|&v| v == 7.0));
            assert!(out.to_vec()[6..].iter().all(|&v| v == -2.0));
        }
    }

    #[test]
    fn test_align_corners_single_destination() {
        let table = AxisTable::build(5, 1, true);
        assert_eq!(table.coords, vec![0.0]);
        assert_eq!(table.frac, vec![0.0]);
    }

    #[test]
    fn test_table_neighbours_stay_in_range() {
        for (src, dst) in [(2, 9), (5, 3), (7, 7), (3, 1)] {
            for align in [false, true] {
                let t = AxisTable::build(src, dst, align);
                assert_eq!(t.len(), dst);
                for d in 0..dst {
                    assert!(t.hi[d] < src);
                    assert_eq!(t.hi[d], t.lo[d] + 1);
                    assert!((0.0..=1.0).contains(&t.frac[d]));
                }
            }
        }
    }

    #[test]
    fn test_plan_rebuilds_only_on_change() {
        let op = bilinear_resize(ResizeParams::default().with_target(6, 6)).unwrap();
        let mut plan = ResizePlan::default();

        assert!(plan.refresh(&op, &[1, 1, 3, 3]).unwrap());
        assert!(!plan.refresh(&op, &[2, 4, 3, 3]).unwrap());
        assert!(plan.refresh(&op, &[1, 1, 4, 3]).unwrap());

        let aligned = bilinear_resize(
            ResizeParams::default()
                .with_target(6, 6)
                .with_align_corners(true),
        )
        .unwrap();
        assert!(plan.refresh(&aligned, &[1, 1, 4, 3]).unwrap());
        assert!(plan.align_corners());
    }

    #[test]
    fn test_forward_with_plan_matches_forward() {
        let op = bilinear_resize(ResizeParams::default().with_scale_factor(2.5)).unwrap();
        let mut plan = ResizePlan::default();
        let x = DenseND::<f64>::from_vec((0..30).map(|v| (v * v) as f64).collect(), &[1, 2, 3, 5])
            .unwrap();

        let direct = op.forward(&x).unwrap();
        let cached = op.forward_with_plan(&x, &mut plan).unwrap();
        let again = op.forward_with_plan(&x, &mut plan).unwrap();
        assert_eq!(direct, cached);
        assert_eq!(cached, again);
    }

    #[test]
    fn test_downscale_averages_pairs() {
        let x = DenseND::<f64>::from_vec(vec![0.0, 2.0, 4.0, 6.0], &[1, 1, 1, 4]).unwrap();
        let op = bilinear_resize(ResizeParams::default().with_target_width(2)).unwrap();
        assert_eq!(op.forward(&x).unwrap().to_vec(), vec![1.0, 5.0]);
    }

    #[test]
    fn test_no_gradient() {
        let op = bilinear_resize(ResizeParams::default().with_target(2, 2)).unwrap();
        let x = DenseND::<f32>::ones(&[1, 1, 1, 1]);
        let g = DenseND::<f32>::ones(&[1, 1, 2, 2]);
        assert!(op.gradient(&g, &[&x]).unwrap().is_none());
    }
}
