//! Template statistics precomputed once per reference image.

use crate::image::ImageView;

/// Variance floor (sum of squared deviations) below which a template is flat.
const FLAT_EPS: f64 = 1e-6;

/// Precomputed mean, spread and zero-mean buffer for ZNCC scoring.
///
/// Because the zero-mean template sums to zero, the correlation numerator
/// against any window reduces to `sum(t' * I)` without subtracting the window
/// mean.
#[derive(Clone, Debug)]
pub struct TemplatePlan {
    width: usize,
    height: usize,
    mean: f64,
    centered_sum_sq: f64,
    zero_mean: Vec<f64>,
}

impl TemplatePlan {
    /// Builds a plan from a template view.
    pub fn from_view(tpl: ImageView<'_, u8>) -> Self {
        let width = tpl.width();
        let height = tpl.height();
        let count = (width * height) as f64;

        let mut sum = 0.0f64;
        for y in 0..height {
            if let Some(row) = tpl.row(y) {
                sum += row.iter().map(|&v| f64::from(v)).sum::<f64>();
            }
        }
        let mean = sum / count;

        let mut zero_mean = Vec::with_capacity(width * height);
        let mut centered_sum_sq = 0.0f64;
        for y in 0..height {
            if let Some(row) = tpl.row(y) {
                for &value in row {
                    let d = f64::from(value) - mean;
                    centered_sum_sq += d * d;
                    zero_mean.push(d);
                }
            }
        }

        Self {
            width,
            height,
            mean,
            centered_sum_sq,
            zero_mean,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of template pixels.
    pub fn count(&self) -> usize {
        self.width * self.height
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sum of squared deviations from the mean (`n * variance`).
    pub fn centered_sum_sq(&self) -> f64 {
        self.centered_sum_sq
    }

    /// Returns `true` when the template has no intensity variation.
    pub fn is_flat(&self) -> bool {
        self.centered_sum_sq <= FLAT_EPS
    }

    /// Zero-mean template values in row-major order.
    pub fn zero_mean(&self) -> &[f64] {
        &self.zero_mean
    }
}
