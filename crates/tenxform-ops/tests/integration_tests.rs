//! Integration tests for tenxform-ops with tenxform-core
//!
//! These tests drive operators through the public API the way a host engine
//! does: build from a configuration, infer the output shape, compute.

use scirs2_core::ndarray_ext::{Array, IxDyn};
use tenxform_core::DenseND;
use tenxform_ops::*;

fn row(values: &[f64]) -> DenseND<f64> {
    DenseND::from_vec(values.to_vec(), &[1, 1, 1, values.len()]).unwrap()
}

fn run(op: &dyn TensorOp<f64>, inputs: &[&DenseND<f64>]) -> DenseND<f64> {
    let shapes: Vec<&[usize]> = inputs.iter().map(|t| t.shape()).collect();
    let expected = op.infer_shape(&shapes).unwrap();
    let out = op.compute(inputs).unwrap();
    assert_eq!(out.shape(), expected.as_slice());
    out
}

#[test]
fn test_resize_corner_alignment() {
    let op = OpConfig::BilinearResize(
        ResizeParams::default()
            .with_target_width(7)
            .with_align_corners(true),
    )
    .build::<f64>()
    .unwrap();
    let out = run(op.as_ref(), &[&row(&[0.0, 10.0, 20.0, 30.0])]);
    assert_eq!(out[&[0, 0, 0, 3]], 15.0);
}

#[test]
fn test_resize_pixel_center() {
    let op = OpConfig::BilinearResize(ResizeParams::default().with_target_width(2))
        .build::<f64>()
        .unwrap();
    let out = run(op.as_ref(), &[&row(&[0.0, 10.0, 20.0, 30.0])]);
    assert_eq!(out[&[0, 0, 0, 0]], 5.0);
}

#[test]
fn test_resize_plan_shared_across_batches() {
    let op = bilinear_resize(ResizeParams::default().with_target(5, 5)).unwrap();
    let mut plan = ResizePlan::default();
    for batch in 1..4 {
        let x = DenseND::<f32>::ones(&[batch, 2, 3, 3]);
        let y = op.forward_with_plan(&x, &mut plan).unwrap();
        assert_eq!(y.shape(), &[batch, 2, 5, 5]);
        assert!(y.iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }
    assert!(plan.is_valid_for((3, 3), (5, 5), false));
}

#[test]
fn test_reflect_padding_boundary() {
    let op = OpConfig::Pad(PadParams::new(0, 0, 2, 0).with_mode(PadMode::Reflect))
        .build::<f64>()
        .unwrap();
    let out = run(op.as_ref(), &[&row(&[1.0, 2.0, 3.0, 4.0, 5.0])]);
    assert_eq!(&out.to_vec()[..3], &[3.0, 2.0, 1.0]);
    assert_eq!(&out.to_vec()[2..], &[1.0, 2.0, 3.0, 4.0, 5.0]);
}

#[test]
fn test_pad_crop_inverse() {
    let x = DenseND::<f64>::from_vec((0..60).map(|v| v as f64).collect(), &[1, 3, 4, 5]).unwrap();
    let padded = pad(PadParams::new(1, 2, 3, 0).with_value(7.5))
        .unwrap()
        .forward(&x)
        .unwrap();
    let cropped = pad(PadParams::new(-1, -2, -3, 0))
        .unwrap()
        .forward(&padded)
        .unwrap();
    assert_eq!(cropped, x);
}

#[test]
fn test_pixel_shuffle_round_trip() {
    for k in 1..=3 {
        let c = k * k;
        let x = DenseND::<f64>::from_vec((0..c * 4).map(|v| v as f64).collect(), &[1, c, 2, 2])
            .unwrap();
        let shuffle = OpConfig::PixelShuffle(PixelShuffleParams::new(k))
            .build::<f64>()
            .unwrap();
        let unshuffle = OpConfig::PixelUnshuffle(PixelShuffleParams::new(k))
            .build::<f64>()
            .unwrap();
        let y = run(shuffle.as_ref(), &[&x]);
        assert_eq!(y.shape(), &[1, 1, 2 * k, 2 * k]);
        assert_eq!(run(unshuffle.as_ref(), &[&y]), x);
    }
}

#[test]
fn test_upsample_block_replication() {
    let x = DenseND::<f64>::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[1, 1, 2, 2]).unwrap();
    let op = OpConfig::Upsample(UpsampleParams::new(2, 4))
        .build::<f64>()
        .unwrap();
    let y = run(op.as_ref(), &[&x]);
    for i in 0..4 {
        for j in 0..4 {
            assert_eq!(y[&[0, 0, i, j]], x[&[0, 0, i / 2, j / 2]]);
        }
    }
}

#[test]
fn test_unsqueeze_shape_law() {
    let x = DenseND::<f64>::from_vec((0..24).map(|v| v as f64).collect(), &[2, 3, 4]).unwrap();
    for axis in -4isize..=3 {
        let op = OpConfig::Unsqueeze(UnsqueezeParams::new(axis))
            .build::<f64>()
            .unwrap();
        let y = run(op.as_ref(), &[&x]);
        assert_eq!(y.rank(), 4);
        assert_eq!(y.to_vec(), x.to_vec());
    }
}

#[test]
fn test_max_unpool_out_of_range_index() {
    let values = DenseND::<f64>::from_vec(vec![1.0, 2.0], &[1, 1, 1, 2]).unwrap();
    let indices = DenseND::<f64>::from_vec(vec![0.0, 4.0], &[1, 1, 1, 2]).unwrap();
    let op = OpConfig::MaxUnpool(MaxUnpoolParams::new(2, 2))
        .build::<f64>()
        .unwrap();

    let shapes: [&[usize]; 2] = [values.shape(), indices.shape()];
    assert_eq!(op.infer_shape(&shapes).unwrap(), vec![1, 1, 2, 2]);

    let err = op.compute(&[&values, &indices]).unwrap_err();
    assert!(matches!(err, OpError::IndexOutOfRange { index: 4, .. }));
    assert!(!err.is_configuration());
}

#[test]
fn test_configuration_errors_before_compute() {
    let configs = [
        OpConfig::BilinearResize(ResizeParams::default()),
        OpConfig::Pad(PadParams::new(2, -1, 0, 0)),
        OpConfig::Upsample(UpsampleParams::new(2, 2)),
        OpConfig::Unsqueeze(UnsqueezeParams::default()),
        OpConfig::MaxUnpool(MaxUnpoolParams::default()),
    ];
    for config in configs {
        let err = config.build::<f32>().err().unwrap();
        assert!(err.is_configuration(), "{:?}", config);
    }

    let shuffle = OpConfig::PixelShuffle(PixelShuffleParams::new(2))
        .build::<f32>()
        .unwrap();
    let err = shuffle.infer_shape(&[&[1, 2, 4, 4]]).unwrap_err();
    assert!(matches!(err, OpError::IndivisibleChannels { .. }));

    let unsqueeze = OpConfig::Unsqueeze(UnsqueezeParams::new(5))
        .build::<f32>()
        .unwrap();
    assert!(matches!(
        unsqueeze.infer_shape(&[&[2, 2]]),
        Err(OpError::AxisOutOfRange { axis: 5, rank: 2 })
    ));
}

#[test]
fn test_gradient_contract() {
    let x = DenseND::<f64>::from_vec(vec![-1.0, 2.0, 7.0, 3.0], &[1, 1, 2, 2]).unwrap();

    let pad_op = OpConfig::Pad(PadParams::new(1, 1, 1, 1))
        .build::<f64>()
        .unwrap();
    let grad = pad_op
        .gradient(&DenseND::ones(&[1, 1, 4, 4]), &[&x])
        .unwrap()
        .unwrap();
    assert_eq!(grad, DenseND::zeros(&[1, 1, 2, 2]));

    let unsqueeze_op = OpConfig::Unsqueeze(UnsqueezeParams::new(-1))
        .build::<f64>()
        .unwrap();
    let dy = DenseND::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[1, 1, 2, 2, 1]).unwrap();
    let grad = unsqueeze_op.gradient(&dy, &[&x]).unwrap().unwrap();
    assert_eq!(grad.shape(), x.shape());

    let relu = OpConfig::Relu6(Relu6Params::default())
        .build::<f64>()
        .unwrap();
    let grad = relu
        .gradient(&DenseND::ones(&[1, 1, 2, 2]), &[&x])
        .unwrap()
        .unwrap();
    assert_eq!(grad.to_vec(), vec![0.0, 1.0, 0.0, 1.0]);

    let resize = OpConfig::BilinearResize(ResizeParams::default().with_scale_factor(2.0))
        .build::<f64>()
        .unwrap();
    assert!(resize
        .gradient(&DenseND::ones(&[1, 1, 4, 4]), &[&x])
        .unwrap()
        .is_none());
}

#[test]
fn test_strided_input() {
    // Swapped trailing axes: logical order differs from memory order
    let strided = DenseND::from_array(
        Array::from_shape_vec(IxDyn(&[1, 1, 2, 3]), (0..6).map(|v| v as f64).collect())
            .unwrap()
            .permuted_axes(IxDyn(&[0, 1, 3, 2])),
    );
    assert!(!strided.is_contiguous());

    let up = upsample(UpsampleParams::new(2, 4)).unwrap();
    let y = up.forward(&strided).unwrap();
    assert_eq!(y.shape(), &[1, 1, 6, 4]);
    assert_eq!(y[&[0, 0, 2, 0]], strided[&[0, 0, 1, 0]]);
    assert_eq!(y[&[0, 0, 5, 3]], strided[&[0, 0, 2, 1]]);
}

#[test]
fn test_operators_are_shareable_across_threads() {
    let op = bilinear_resize(ResizeParams::default().with_target(8, 8)).unwrap();
    let x = DenseND::<f32>::from_vec((0..16).map(|v| v as f32).collect(), &[1, 1, 4, 4]).unwrap();
    let expected = op.forward(&x).unwrap();

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| assert_eq!(op.forward(&x).unwrap(), expected));
        }
    });
}

#[cfg(feature = "serde")]
#[test]
fn test_config_serde_round_trip() {
    let configs = vec![
        OpConfig::BilinearResize(
            ResizeParams::default()
                .with_target(4, 6)
                .with_align_corners(true),
        ),
        OpConfig::Pad(
            PadParams::new(-1, -1, 0, 0)
                .with_mode(PadMode::Replicate)
                .with_value(2.0),
        ),
        OpConfig::MaxUnpool(MaxUnpoolParams::new(8, 8)),
        OpConfig::HardSwish,
    ];
    let json = serde_json::to_string(&configs).unwrap();
    assert!(json.contains(r#""type":"bilinear_resize""#));
    assert!(json.contains(r#""mode":"replicate""#));
    let back: Vec<OpConfig> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, configs);
}

#[cfg(feature = "tracing")]
#[test]
fn test_tracing_initializes_once() {
    use tenxform_ops::tracing_support::{init_tracing, TracingConfig, TracingFormat};

    let config = TracingConfig {
        format: TracingFormat::Compact,
        filter: "tenxform_ops=debug".to_string(),
        ..TracingConfig::default()
    };
    assert!(init_tracing(config.clone()).is_ok());
    assert!(init_tracing(config).is_err());

    let op = upsample(UpsampleParams::new(2, 3)).unwrap();
    let x = DenseND::<f32>::ones(&[1, 1, 3]);
    assert_eq!(op.forward(&x).unwrap().shape(), &[1, 1, 6]);
}
