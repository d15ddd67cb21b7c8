//! Overlay rendering of detection results (feature `annotate`).
//!
//! Draws each detected category's bounding region and a `"name (0.87)"`
//! label on a copy of the probe's colour image.

use crate::detect::{BoundingRegion, DetectionResult};
use crate::util::{EquipMatchError, EquipMatchResult};
use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

const FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Colours and sizes used by the [`Annotator`].
#[derive(Clone, Copy, Debug)]
pub struct AnnotateStyle {
    pub box_color: Rgb<u8>,
    pub text_color: Rgb<u8>,
    /// Rectangle outline thickness in pixels.
    pub thickness: u32,
    /// Label glyph height in pixels.
    pub font_px: f32,
    /// Padding around the label text inside its background bar.
    pub label_padding: u32,
}

impl Default for AnnotateStyle {
    fn default() -> Self {
        Self {
            box_color: Rgb([0, 0, 255]),
            text_color: Rgb([255, 255, 255]),
            thickness: 2,
            font_px: 18.0,
            label_padding: 3,
        }
    }
}

/// Renders detection overlays.
pub struct Annotator {
    font: FontRef<'static>,
    style: AnnotateStyle,
}

impl Annotator {
    /// Creates an annotator with the bundled font and default style.
    pub fn new() -> EquipMatchResult<Self> {
        Self::with_style(AnnotateStyle::default())
    }

    pub fn with_style(style: AnnotateStyle) -> EquipMatchResult<Self> {
        let font = FontRef::try_from_slice(FONT_DATA).map_err(|err| EquipMatchError::ImageIo {
            reason: format!("bundled font: {err}"),
        })?;
        Ok(Self { font, style })
    }

    pub fn style(&self) -> &AnnotateStyle {
        &self.style
    }

    /// Label text for a category and score.
    pub fn label(category: &str, score: f64) -> String {
        format!("{category} ({score:.2})")
    }

    /// Returns an annotated copy of `color`; the input is not modified.
    pub fn render(&self, color: &RgbImage, result: &DetectionResult) -> RgbImage {
        let mut out = color.clone();
        for decision in result.detected() {
            let (Some(region), Some(score)) = (decision.region(), decision.score()) else {
                continue;
            };
            self.draw_region(&mut out, region);
            self.draw_label(&mut out, region, &Self::label(decision.category(), score));
        }
        out
    }

    fn draw_region(&self, canvas: &mut RgbImage, region: BoundingRegion) {
        for inset in 0..self.style.thickness {
            let inset_px = inset as usize;
            if region.width <= 2 * inset_px || region.height <= 2 * inset_px {
                break;
            }
            let rect = Rect::at((region.x + inset_px) as i32, (region.y + inset_px) as i32)
                .of_size(
                    (region.width - 2 * inset_px) as u32,
                    (region.height - 2 * inset_px) as u32,
                );
            draw_hollow_rect_mut(canvas, rect, self.style.box_color);
        }
    }

    fn draw_label(&self, canvas: &mut RgbImage, region: BoundingRegion, text: &str) {
        let scale = PxScale::from(self.style.font_px);
        let (text_w, text_h) = text_size(scale, &self.font, text);
        let pad = self.style.label_padding;
        let bar_w = text_w + 2 * pad;
        let bar_h = text_h + 2 * pad;

        // Above the box when there is room, otherwise clamped to the top edge.
        let bar_x = region.x as i32;
        let bar_y = (region.y as i32 - bar_h as i32).max(0);
        draw_filled_rect_mut(
            canvas,
            Rect::at(bar_x, bar_y).of_size(bar_w.max(1), bar_h.max(1)),
            self.style.box_color,
        );
        draw_text_mut(
            canvas,
            self.style.text_color,
            bar_x + pad as i32,
            bar_y + pad as i32,
            scale,
            &self.font,
            text,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::Annotator;

    #[test]
    fn label_uses_two_decimals() {
        assert_eq!(Annotator::label("aed", 0.98765), "aed (0.99)");
        assert_eq!(Annotator::label("oxygen", 1.0), "oxygen (1.00)");
    }
}
