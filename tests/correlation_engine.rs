mod common;

use common::{crop, noise, paste, pattern, reference};
use equipmatch::kernel::{
    scan_best, score_at, score_map, PreparedProbe, ScanParams, ZnccFft, ZnccIntegral, ZnccScalar,
};
use equipmatch::{CorrelationEngine, ImageView, MatchAttempt, SkipReason};

#[test]
fn template_equal_to_probe_scores_one_at_origin() {
    let (w, h) = (24, 18);
    let data = noise(w, h, 3);
    let view = ImageView::from_slice(&data, w, h).unwrap();
    let template = reference("aed_self", data.clone(), w, h);

    match CorrelationEngine::default().score(view, &template) {
        MatchAttempt::Scored { score, x, y } => {
            assert!((score - 1.0).abs() < 1e-9, "score {score}");
            assert_eq!((x, y), (0, 0));
        }
        other => panic!("expected a score, got {other:?}"),
    }
}

#[test]
fn oversized_templates_are_always_skipped() {
    let (w, h) = (16, 12);
    let data = noise(w, h, 5);
    let view = ImageView::from_slice(&data, w, h).unwrap();
    let engine = CorrelationEngine::default();

    for (tw, th) in [(17, 4), (4, 13), (20, 20), (17, 12), (16, 13)] {
        let template = reference("oxygen_big", noise(tw, th, 9), tw, th);
        let attempt = engine.score(view, &template);
        assert!(attempt.is_skipped(), "{tw}x{th} was scored");
        assert!(matches!(
            attempt,
            MatchAttempt::Skipped(SkipReason::TemplateTooLarge { .. })
        ));
    }

    // Same size as the probe still fits.
    let same = reference("oxygen_same", noise(w, h, 11), w, h);
    assert!(!engine.score(view, &same).is_skipped());
}

#[test]
fn embedded_patch_is_found_at_its_location() {
    let (w, h) = (80, 60);
    let mut image = noise(w, h, 21);
    let patch = pattern(12, 9, 29, 17);
    paste(&mut image, w, &patch, 12, 41, 27);
    let view = ImageView::from_slice(&image, w, h).unwrap();
    let template = reference("aed_1", patch, 12, 9);

    let attempt = CorrelationEngine::default().score(view, &template);
    assert_eq!(attempt.score().map(|s| (s - 1.0).abs() < 1e-9), Some(true));
    assert!(matches!(attempt, MatchAttempt::Scored { x: 41, y: 27, .. }));
}

#[test]
fn score_is_invariant_to_brightness_and_contrast() {
    let (w, h) = (50, 40);
    let image = noise(w, h, 33);
    // Template is a darker, lower-contrast copy of a probe window.
    let window = crop(&image, w, 7, 11, 10, 8);
    let dimmed: Vec<u8> = window.iter().map(|&v| (v / 2) + 10).collect();
    let view = ImageView::from_slice(&image, w, h).unwrap();
    let template = reference("aed_dim", dimmed, 10, 8);

    match CorrelationEngine::default().score(view, &template) {
        MatchAttempt::Scored { score, x, y } => {
            assert!(score > 0.99, "score {score}");
            assert_eq!((x, y), (7, 11));
        }
        other => panic!("expected a score, got {other:?}"),
    }
}

#[test]
fn inverted_template_scores_near_minus_one_at_its_location() {
    let (w, h) = (30, 30);
    let image = noise(w, h, 44);
    let window = crop(&image, w, 5, 5, 6, 6);
    let inverted: Vec<u8> = window.iter().map(|&v| 255 - v).collect();
    let view = ImageView::from_slice(&image, w, h).unwrap();
    let probe = PreparedProbe::new(view);
    let plan = reference("aed_inv", inverted, 6, 6).plan().clone();

    let at = score_at::<ZnccIntegral>(&probe, &plan, 5, 5, ScanParams::default()).unwrap();
    assert!((at + 1.0).abs() < 1e-9, "score {at}");
}

#[test]
fn integral_kernel_agrees_with_bruteforce_on_noise() {
    let (w, h) = (41, 33);
    let image = noise(w, h, 77);
    let template = reference("aed_n", noise(7, 5, 78), 7, 5);
    let view = ImageView::from_slice(&image, w, h).unwrap();
    let probe = PreparedProbe::new(view);
    let params = ScanParams::default();

    let fast = scan_best::<ZnccIntegral>(&probe, template.plan(), params).unwrap();
    let slow = scan_best::<ZnccScalar>(&probe, template.plan(), params).unwrap();
    assert!((fast.score - slow.score).abs() < 1e-9);
    assert!((-1.0..=1.0).contains(&fast.score));
}

#[test]
fn flat_probe_windows_score_zero() {
    let (w, h) = (20, 20);
    let image = vec![128u8; w * h];
    let view = ImageView::from_slice(&image, w, h).unwrap();
    let template = reference("aed_t", pattern(4, 4, 3, 5), 4, 4);

    match CorrelationEngine::default().score(view, &template) {
        MatchAttempt::Scored { score, x, y } => {
            assert_eq!(score, 0.0);
            assert_eq!((x, y), (0, 0));
        }
        other => panic!("expected a score, got {other:?}"),
    }
}

#[test]
fn flat_template_matches_flat_window_of_same_level() {
    let (w, h) = (40, 30);
    let mut image = pattern(w, h, 13, 7);
    paste(&mut image, w, &vec![200u8; 36], 6, 21, 9);
    let view = ImageView::from_slice(&image, w, h).unwrap();
    let template = reference("aed_flat", vec![200u8; 36], 6, 6);

    let attempt = CorrelationEngine::default().score(view, &template);
    assert_eq!(attempt, MatchAttempt::Scored { score: 1.0, x: 21, y: 9 });

    let other_level = reference("aed_flat_dark", vec![20u8; 36], 6, 6);
    assert!(matches!(
        CorrelationEngine::default().score(view, &other_level),
        MatchAttempt::Skipped(SkipReason::Degenerate(_))
    ));
}

#[test]
fn fft_surface_agrees_with_bruteforce_on_noise() {
    let (w, h) = (53, 37);
    let image = noise(w, h, 90);
    let template = reference("splint_n", noise(13, 11, 91), 13, 11);
    let probe = PreparedProbe::new(ImageView::from_slice(&image, w, h).unwrap());
    let params = ScanParams::default();

    let fast = score_map::<ZnccFft>(&probe, template.plan(), params).unwrap();
    let slow = score_map::<ZnccScalar>(&probe, template.plan(), params).unwrap();
    assert_eq!((fast.width(), fast.height()), (41, 27));
    for y in 0..fast.height() {
        for x in 0..fast.width() {
            let (f, s) = (fast.get(x, y).unwrap(), slow.get(x, y).unwrap());
            assert!((f - s).abs() < 1e-9, "({x}, {y}): {f} vs {s}");
        }
    }
}

#[test]
fn large_template_is_located_on_a_wide_image() {
    let (w, h) = (320, 240);
    let mut image = noise(w, h, 95);
    let patch = pattern(64, 48, 7, 29);
    paste(&mut image, w, &patch, 64, 201, 150);
    let view = ImageView::from_slice(&image, w, h).unwrap();
    let template = reference("stretcher_top", patch, 64, 48);

    match CorrelationEngine::default().score(view, &template) {
        MatchAttempt::Scored { score, x, y } => {
            assert!((score - 1.0).abs() < 1e-9, "score {score}");
            assert_eq!((x, y), (201, 150));
        }
        other => panic!("expected a score, got {other:?}"),
    }
}
