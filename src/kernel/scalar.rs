//! Brute-force reference kernel.
//!
//! Recomputes the window statistics from the pixels at every placement and
//! subtracts both means explicitly. Cost is `O(h * w)` per placement for every
//! term; it exists to cross-check the production kernel.

use crate::image::integral::WindowSums;
use crate::kernel::{Kernel, PreparedProbe};
use crate::template::TemplatePlan;

/// Reference ZNCC kernel without precomputed window statistics.
pub struct ZnccScalar;

impl Kernel for ZnccScalar {
    fn prepare(_probe: &PreparedProbe<'_>, _plan: &TemplatePlan) -> Self {
        ZnccScalar
    }

    fn window_sums(
        &self,
        probe: &PreparedProbe<'_>,
        x: usize,
        y: usize,
        w: usize,
        h: usize,
    ) -> WindowSums {
        let image = probe.image();
        let mut sum = 0u64;
        let mut sum_sq = 0u64;
        for ty in 0..h {
            if let Some(row) = image.row(y + ty) {
                for &value in &row[x..x + w] {
                    let v = u64::from(value);
                    sum += v;
                    sum_sq += v * v;
                }
            }
        }
        WindowSums { sum, sum_sq }
    }

    fn cross_term(
        &self,
        probe: &PreparedProbe<'_>,
        plan: &TemplatePlan,
        x: usize,
        y: usize,
    ) -> f64 {
        let n = plan.count();
        let w = plan.width();
        let window_mean = self.window_sums(probe, x, y, w, plan.height()).mean(n);
        let image = probe.image();
        let t_prime = plan.zero_mean();

        let mut dot = 0.0f64;
        for ty in 0..plan.height() {
            if let Some(row) = image.row(y + ty) {
                let base = ty * w;
                for (tx, &value) in row[x..x + w].iter().enumerate() {
                    dot += t_prime[base + tx] * (f64::from(value) - window_mean);
                }
            }
        }
        dot
    }
}
