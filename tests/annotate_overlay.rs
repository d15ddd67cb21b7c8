#![cfg(feature = "annotate")]

mod common;

use common::{noise, paste, probe, reference};
use equipmatch::{Annotator, BatchDetector, TemplateLibrary};
use image::Rgb;

const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

#[test]
fn detected_region_is_outlined() {
    let (w, h) = (120, 100);
    let mut image = noise(w, h, 7);
    let patch = noise(24, 20, 8);
    paste(&mut image, w, &patch, 24, 50, 60);
    let library = TemplateLibrary::from_references([reference("aed_1", patch, 24, 20)]);
    let probe = probe(image, w, h);
    let original = probe.color().clone();

    let result = BatchDetector::default().detect_one(&probe, &library);
    let region = result.region("aed").unwrap();
    let annotated = Annotator::new().unwrap().render(probe.color(), &result);

    assert_eq!(probe.color(), &original);
    assert_eq!(annotated.dimensions(), original.dimensions());
    let bottom = (region.bottom() - 1) as u32;
    let right = (region.right() - 1) as u32;
    assert_eq!(*annotated.get_pixel(region.x as u32 + 5, bottom), BLUE);
    assert_eq!(*annotated.get_pixel(region.x as u32 + 5, bottom - 1), BLUE);
    assert_eq!(*annotated.get_pixel(right, bottom - 8), BLUE);
    assert_eq!(*annotated.get_pixel(region.x as u32, bottom - 8), BLUE);
    // Interior pixels keep their gray value.
    let inside = annotated.get_pixel(region.x as u32 + 10, bottom - 8);
    assert_eq!(inside, original.get_pixel(region.x as u32 + 10, bottom - 8));
}

#[test]
fn undetected_categories_leave_the_image_untouched() {
    let (w, h) = (60, 40);
    let library = TemplateLibrary::from_references([
        reference("aed_1", noise(9, 9, 1), 9, 9),
        reference("oxygen_1", noise(70, 9, 2), 70, 9),
    ]);
    let probe = probe(noise(w, h, 3), w, h);

    let result = BatchDetector::default().detect_one(&probe, &library);
    assert_eq!(result.detected().count(), 0);
    let annotated = Annotator::new().unwrap().render(probe.color(), &result);
    assert_eq!(&annotated, probe.color());
}
