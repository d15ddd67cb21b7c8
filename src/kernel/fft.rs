//! Transform-domain kernel: the whole cross-term surface from one FFT product.
//!
//! The numerator `sum(t' * I)` at every placement is the cross-correlation of
//! the zero-mean template with the probe, `IFFT(FFT(I) * conj(FFT(t')))`.
//! The grid is at least as large as the probe and the template sits at the
//! origin, so no placement inside the probe wraps around. Window statistics
//! still come from the integral image.

use crate::image::integral::WindowSums;
use crate::image::ImageView;
use crate::kernel::{Kernel, PreparedProbe};
use crate::template::TemplatePlan;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::fmt;
use std::sync::Arc;

/// Templates with at least this many pixels are scanned with [`ZnccFft`].
pub const FFT_MIN_AREA: usize = 64;

/// Smallest length `>= n` whose only prime factors are 2, 3 and 5.
fn fast_len(n: usize) -> usize {
    let mut len = n.max(1);
    loop {
        let mut rest = len;
        for p in [2, 3, 5] {
            while rest % p == 0 {
                rest /= p;
            }
        }
        if rest == 1 {
            return len;
        }
        len += 1;
    }
}

/// `out[x * height + y] = src[y * width + x]`.
fn transpose(src: &[Complex<f64>], width: usize, height: usize, out: &mut [Complex<f64>]) {
    for (y, row) in src.chunks_exact(width).enumerate().take(height) {
        for (x, &value) in row.iter().enumerate() {
            out[x * height + y] = value;
        }
    }
}

/// Forward transform of a probe plus the plans reused for every template.
pub struct ProbeSpectrum {
    width: usize,
    height: usize,
    data: Vec<Complex<f64>>,
    row_fwd: Arc<dyn Fft<f64>>,
    col_fwd: Arc<dyn Fft<f64>>,
    row_inv: Arc<dyn Fft<f64>>,
    col_inv: Arc<dyn Fft<f64>>,
}

impl fmt::Debug for ProbeSpectrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeSpectrum")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl ProbeSpectrum {
    /// Zero-pads the probe to a fast transform size and transforms it.
    pub fn new(image: ImageView<'_, u8>) -> Self {
        let width = fast_len(image.width());
        let height = fast_len(image.height());
        let mut planner = FftPlanner::new();
        let mut spectrum = Self {
            width,
            height,
            data: Vec::new(),
            row_fwd: planner.plan_fft_forward(width),
            col_fwd: planner.plan_fft_forward(height),
            row_inv: planner.plan_fft_inverse(width),
            col_inv: planner.plan_fft_inverse(height),
        };

        let mut data = vec![Complex::new(0.0, 0.0); width * height];
        for (y, row) in (0..image.height()).filter_map(|y| image.row(y)).enumerate() {
            let dst = &mut data[y * width..y * width + row.len()];
            for (d, &value) in dst.iter_mut().zip(row) {
                *d = Complex::new(f64::from(value), 0.0);
            }
        }
        spectrum.forward(&mut data);
        spectrum.data = data;
        spectrum
    }

    /// Padded grid width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Padded grid height.
    pub fn height(&self) -> usize {
        self.height
    }

    fn forward(&self, data: &mut [Complex<f64>]) {
        self.transform_2d(data, &*self.row_fwd, &*self.col_fwd);
    }

    fn inverse(&self, data: &mut [Complex<f64>]) {
        self.transform_2d(data, &*self.row_inv, &*self.col_inv);
    }

    /// Row transforms, then column transforms on the transposed grid.
    fn transform_2d(&self, data: &mut [Complex<f64>], rows: &dyn Fft<f64>, cols: &dyn Fft<f64>) {
        rows.process(data);
        let mut columns = vec![Complex::new(0.0, 0.0); data.len()];
        transpose(data, self.width, self.height, &mut columns);
        cols.process(&mut columns);
        transpose(&columns, self.height, self.width, data);
    }

    /// Cross term `sum(t' * I)` for every grid offset, row-major with the
    /// padded width as stride.
    ///
    /// Returns an empty surface when the template is larger than the grid.
    pub fn cross_surface(&self, plan: &TemplatePlan) -> Vec<f64> {
        if plan.width() > self.width || plan.height() > self.height {
            return Vec::new();
        }
        let mut buf = vec![Complex::new(0.0, 0.0); self.width * self.height];
        for (ty, t_row) in plan.zero_mean().chunks_exact(plan.width()).enumerate() {
            let dst = &mut buf[ty * self.width..ty * self.width + plan.width()];
            for (d, &t) in dst.iter_mut().zip(t_row) {
                *d = Complex::new(t, 0.0);
            }
        }
        self.forward(&mut buf);
        for (b, &s) in buf.iter_mut().zip(&self.data) {
            *b = s * b.conj();
        }
        self.inverse(&mut buf);

        let scale = 1.0 / (self.width * self.height) as f64;
        buf.iter().map(|c| c.re * scale).collect()
    }
}

/// FFT ZNCC kernel for larger templates.
///
/// Preparing the kernel computes the cross term of every placement at once;
/// the probe transform itself is shared by all templates through
/// [`PreparedProbe::spectrum`].
#[derive(Clone, Debug)]
pub struct ZnccFft {
    stride: usize,
    cross: Vec<f64>,
}

impl Kernel for ZnccFft {
    fn prepare(probe: &PreparedProbe<'_>, plan: &TemplatePlan) -> Self {
        // Flat templates never reach the cross term.
        if plan.is_flat() {
            return Self {
                stride: 0,
                cross: Vec::new(),
            };
        }
        let spectrum = probe.spectrum();
        Self {
            stride: spectrum.width(),
            cross: spectrum.cross_surface(plan),
        }
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

    #[inline]
    fn cross_term(
        &self,
        _probe: &PreparedProbe<'_>,
        _plan: &TemplatePlan,
        x: usize,
        y: usize,
    ) -> f64 {
        self.cross.get(y * self.stride + x).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{fast_len, ZnccFft};
    use crate::kernel::{score_map, PreparedProbe, ScanParams, ZnccScalar};
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
    fn fast_lengths_are_five_smooth() {
        assert_eq!(fast_len(1), 1);
        assert_eq!(fast_len(7), 8);
        assert_eq!(fast_len(11), 12);
        assert_eq!(fast_len(31), 32);
        assert_eq!(fast_len(97), 100);
    }

    #[test]
    fn fft_surface_matches_bruteforce_on_odd_sizes() {
        let (img_w, img_h) = (29, 19);
        let (tpl_w, tpl_h) = (7, 5);
        let image = pattern(img_w, img_h, 17, 9);
        let tpl = pattern(tpl_w, tpl_h, 5, 11);

        let probe = PreparedProbe::new(ImageView::from_slice(&image, img_w, img_h).unwrap());
        let plan = TemplatePlan::from_view(ImageView::from_slice(&tpl, tpl_w, tpl_h).unwrap());
        let params = ScanParams::default();

        let fast = score_map::<ZnccFft>(&probe, &plan, params).unwrap();
        let slow = score_map::<ZnccScalar>(&probe, &plan, params).unwrap();
        assert_eq!((fast.width(), fast.height()), (23, 15));
        for (i, (f, s)) in fast.scores().iter().zip(slow.scores()).enumerate() {
            let (f, s) = (f.unwrap(), s.unwrap());
            assert!((f - s).abs() < 1e-9, "placement {i}: {f} vs {s}");
        }
    }
}
