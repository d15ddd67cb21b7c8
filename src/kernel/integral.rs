//! Direct kernel: window statistics from summed-area tables.
//!
//! The denominator of the ZNCC score needs the window mean and spread, which
//! the integral image yields in constant time per placement. The numerator
//! uses the zero-mean template: since `sum(t') == 0`,
//! `sum(t' * (I - mean_I)) == sum(t' * I)`, so no per-window mean subtraction
//! is needed.

use crate::image::integral::WindowSums;
use crate::kernel::{Kernel, PreparedProbe};
use crate::template::TemplatePlan;

/// Integral-image ZNCC kernel with a direct cross term.
///
/// Cheapest for small templates, where a full transform costs more than
/// `h * w` multiplications per placement.
pub struct ZnccIntegral;

impl Kernel for ZnccIntegral {
    fn prepare(_probe: &PreparedProbe<'_>, _plan: &TemplatePlan) -> Self {
        ZnccIntegral
    }

    #[inline]
    fn window_sums(
        &self,
        probe: &PreparedProbe<'_>,
        x: usize,
        y: usize,
        w: usize,
        h: usize,
    ) -> WindowSums {
        probe.integral().window(x, y, w, h)
    }

    fn cross_term(
        &self,
        probe: &PreparedProbe<'_>,
        plan: &TemplatePlan,
        x: usize,
        y: usize,
    ) -> f64 {
        let image = probe.image();
        let w = plan.width();
        let t_prime = plan.zero_mean();

        let mut dot = 0.0f64;
        for (ty, t_row) in t_prime.chunks_exact(w).enumerate() {
            if let Some(row) = image.row(y + ty) {
                for (&t, &value) in t_row.iter().zip(&row[x..x + w]) {
                    dot += t * f64::from(value);
                }
            }
        }
        dot
    }
}

#[cfg(test)]
mod tests {
    use super::ZnccIntegral;
    use crate::kernel::{scan_best, score_at, PreparedProbe, ScanParams, ZnccScalar};
    use crate::template::TemplatePlan;
    use crate::ImageView;

    fn pattern(width: usize, height: usize, a: usize, b: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(((x * a) ^ (y * b) ^ (x * y)) as u8);
            }
        }
        data
    }

    #[test]
    fn integral_scores_match_bruteforce_everywhere() {
        let (img_w, img_h) = (23, 17);
        let (tpl_w, tpl_h) = (5, 4);
        let image = pattern(img_w, img_h, 17, 9);
        let tpl = pattern(tpl_w, tpl_h, 5, 11);

        let view = ImageView::from_slice(&image, img_w, img_h).unwrap();
        let probe = PreparedProbe::new(view);
        let plan = TemplatePlan::from_view(ImageView::from_slice(&tpl, tpl_w, tpl_h).unwrap());
        let params = ScanParams::default();

        for y in 0..=img_h - tpl_h {
            for x in 0..=img_w - tpl_w {
                let fast = score_at::<ZnccIntegral>(&probe, &plan, x, y, params).unwrap();
                let slow = score_at::<ZnccScalar>(&probe, &plan, x, y, params).unwrap();
                assert!((fast - slow).abs() < 1e-9, "({x}, {y}): {fast} vs {slow}");
            }
        }

        let fast = scan_best::<ZnccIntegral>(&probe, &plan, params).unwrap();
        let slow = scan_best::<ZnccScalar>(&probe, &plan, params).unwrap();
        assert!((fast.score - slow.score).abs() < 1e-9);
    }
}
