use image::{GrayImage, Luma};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::motion_pipeline::background::{BackgroundMode, BackgroundModel};
use crate::motion_pipeline::common::error::DetectionError;
use crate::motion_pipeline::frame::{BlurKernel, Frame, preprocess};
use crate::motion_pipeline::mask::{CleanupConfig, DiffPolicy, MaskConfig, MotionExtractor, MotionMask};

fn scene_with_square(x0: u32, y0: u32, w: u32, h: u32) -> Frame {
    let mut image = GrayImage::new(100, 100);
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            image.put_pixel(x, y, Luma([255]));
        }
    }
    Frame::Gray(image)
}

fn black_background(blur: BlurKernel) -> BackgroundModel {
    let frame = Frame::Gray(GrayImage::new(100, 100));
    BackgroundModel::capture(BackgroundMode::Static, 1.0, &[preprocess(&frame, blur)]).unwrap()
}

fn extractor(threshold: u8, policy: DiffPolicy, cleanup: CleanupConfig) -> MotionExtractor {
    MotionExtractor::new(MaskConfig {
        pixel_diff_threshold: threshold,
        diff_policy: policy,
        blur: BlurKernel::Size5,
        cleanup,
    })
    .unwrap()
}

#[test]
fn test_matching_frame_yields_empty_mask() {
    let background = black_background(BlurKernel::Size5);
    let mask = extractor(25, DiffPolicy::Absolute, CleanupConfig::default())
        .extract(&Frame::Gray(GrayImage::new(100, 100)), &background)
        .unwrap();

    assert_eq!(mask.dimensions(), (100, 100));
    assert_eq!(mask.foreground_count(), 0);
}

#[test]
fn test_square_mask_includes_blurred_rim() {
    let background = black_background(BlurKernel::Size5);
    let mask = extractor(25, DiffPolicy::Absolute, CleanupConfig::default())
        .extract(&scene_with_square(40, 40, 20, 20), &background)
        .unwrap();

    // The 5x5 blur pushes the edge one pixel outward; the four diagonal
    // corner pixels stay just under the threshold: 22 * 22 - 4.
    assert_eq!(mask.foreground_count(), 480);
    assert!(mask.is_foreground(39, 45));
    assert!(!mask.is_foreground(39, 39));
    assert!(!mask.is_foreground(38, 45));
    assert!(mask.as_image().pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
}

#[test]
fn test_square_mask_is_exact_above_rim_intensity() {
    let background = black_background(BlurKernel::Size5);
    let mask = extractor(100, DiffPolicy::Absolute, CleanupConfig::default())
        .extract(&scene_with_square(40, 40, 20, 20), &background)
        .unwrap();

    assert_eq!(mask.foreground_count(), 400);
    assert!(mask.is_foreground(40, 40));
    assert!(!mask.is_foreground(39, 40));
}

#[test]
fn test_squared_policy_is_more_sensitive() {
    let background = black_background(BlurKernel::Size5);
    let frame = scene_with_square(40, 40, 20, 20);

    let absolute = extractor(25, DiffPolicy::Absolute, CleanupConfig::default())
        .extract(&frame, &background)
        .unwrap();
    let squared = extractor(25, DiffPolicy::Squared, CleanupConfig::default())
        .extract(&frame, &background)
        .unwrap();

    assert!(squared.foreground_count() > absolute.foreground_count());
}

#[test]
fn test_squared_score_saturates() {
    assert_eq!(DiffPolicy::Squared.score(0, 5), 25);
    assert_eq!(DiffPolicy::Squared.score(200, 0), 255);
    assert_eq!(DiffPolicy::Absolute.score(10, 200), 190);
}

#[test]
fn test_opening_removes_isolated_speck() {
    let background = black_background(BlurKernel::Size5);
    let mut image = GrayImage::new(100, 100);
    image.put_pixel(50, 50, Luma([255]));
    let frame = Frame::Gray(image);

    let raw = extractor(
        25,
        DiffPolicy::Absolute,
        CleanupConfig {
            open_size: 1,
            close_size: None,
            dilate_size: None,
        },
    )
    .extract(&frame, &background)
    .unwrap();
    assert_eq!(raw.foreground_count(), 1);

    let cleaned = extractor(25, DiffPolicy::Absolute, CleanupConfig::default())
        .extract(&frame, &background)
        .unwrap();
    assert_eq!(cleaned.foreground_count(), 0);
}

#[test]
fn test_extra_dilation_grows_silhouette() {
    let background = black_background(BlurKernel::Size5);
    let mask = extractor(
        25,
        DiffPolicy::Absolute,
        CleanupConfig {
            open_size: 3,
            close_size: Some(3),
            dilate_size: Some(3),
        },
    )
    .extract(&scene_with_square(40, 40, 20, 20), &background)
    .unwrap();

    assert_eq!(mask.foreground_count(), 24 * 24 - 4);
}

#[test]
fn test_even_structuring_element_is_rejected() {
    let result = MotionExtractor::new(MaskConfig {
        cleanup: CleanupConfig {
            open_size: 4,
            close_size: None,
            dilate_size: None,
        },
        ..MaskConfig::default()
    });
    assert!(matches!(result, Err(DetectionError::InvalidConfig(_))));
}

#[test]
fn test_dimension_mismatch_is_reported() {
    let background = black_background(BlurKernel::Size5);
    let result = extractor(25, DiffPolicy::Absolute, CleanupConfig::default())
        .extract(&Frame::Gray(GrayImage::new(64, 48)), &background);

    assert!(matches!(
        result,
        Err(DetectionError::DimensionMismatch {
            expected: (100, 100),
            actual: (64, 48)
        })
    ));
}

#[test]
fn test_raising_threshold_never_adds_foreground() {
    let mut rng = StdRng::seed_from_u64(7);
    let reference = GrayImage::from_fn(48, 48, |_, _| Luma([rng.r#gen::<u8>()]));
    let current = GrayImage::from_fn(48, 48, |_, _| Luma([rng.r#gen::<u8>()]));

    let blur = BlurKernel::Size3;
    let background = BackgroundModel::capture(
        BackgroundMode::Static,
        1.0,
        &[preprocess(&Frame::Gray(reference), blur)],
    )
    .unwrap();
    let current = preprocess(&Frame::Gray(current), blur);

    for policy in [DiffPolicy::Absolute, DiffPolicy::Squared] {
        let mut previous = u32::MAX;
        for threshold in (0..=255u8).step_by(5) {
            let extractor = MotionExtractor::new(MaskConfig {
                pixel_diff_threshold: threshold,
                diff_policy: policy,
                blur,
                cleanup: CleanupConfig {
                    open_size: 3,
                    close_size: Some(5),
                    dilate_size: Some(3),
                },
            })
            .unwrap();
            let count = extractor
                .extract_preprocessed(&current, &background)
                .unwrap()
                .foreground_count();
            assert!(count <= previous, "{:?} threshold {}", policy, threshold);
            previous = count;
        }
    }
}

#[test]
fn test_from_image_normalizes_values() {
    let mut image = GrayImage::new(3, 1);
    image.put_pixel(1, 0, Luma([1]));
    image.put_pixel(2, 0, Luma([77]));
    let mask = MotionMask::from_image(image);

    assert_eq!(mask.foreground_count(), 2);
    assert_eq!(mask.as_image().get_pixel(2, 0).0[0], 255);
    assert!(!mask.is_foreground(0, 0));
}
