//! Summed-area tables for constant-time window statistics.
//!
//! Both tables have one extra leading row and column of zeros, so the sum of
//! the window with top-left `(x, y)` and size `w x h` is
//! `t[y+h][x+w] - t[y][x+w] - t[y+h][x] + t[y][x]`.

use crate::image::ImageView;

/// Integral image of intensities and squared intensities.
#[derive(Clone, Debug)]
pub struct IntegralImage {
    width: usize,
    height: usize,
    sum: Vec<u64>,
    sum_sq: Vec<u64>,
}

/// Sum and sum of squares over one window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowSums {
    pub sum: u64,
    pub sum_sq: u64,
}

impl IntegralImage {
    /// Builds both tables in a single pass over the image.
    pub fn from_view(image: ImageView<'_, u8>) -> Self {
        let width = image.width();
        let height = image.height();
        let cols = width + 1;
        let mut sum = vec![0u64; cols * (height + 1)];
        let mut sum_sq = vec![0u64; cols * (height + 1)];

        for (y, row) in (0..height).filter_map(|y| image.row(y)).enumerate() {
            let mut row_sum = 0u64;
            let mut row_sum_sq = 0u64;
            let above = y * cols;
            let here = (y + 1) * cols;
            for (x, &value) in row.iter().enumerate() {
                let v = u64::from(value);
                row_sum += v;
                row_sum_sq += v * v;
                sum[here + x + 1] = sum[above + x + 1] + row_sum;
                sum_sq[here + x + 1] = sum_sq[above + x + 1] + row_sum_sq;
            }
        }

        Self {
            width,
            height,
            sum,
            sum_sq,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the sums over the `w x h` window at `(x, y)`.
    ///
    /// The caller guarantees the window lies inside the image.
    #[inline]
    pub fn window(&self, x: usize, y: usize, w: usize, h: usize) -> WindowSums {
        debug_assert!(x + w <= self.width && y + h <= self.height);
        let cols = self.width + 1;
        let a = y * cols + x;
        let b = y * cols + x + w;
        let c = (y + h) * cols + x;
        let d = (y + h) * cols + x + w;
        WindowSums {
            sum: self.sum[d] + self.sum[a] - self.sum[b] - self.sum[c],
            sum_sq: self.sum_sq[d] + self.sum_sq[a] - self.sum_sq[b] - self.sum_sq[c],
        }
    }
}

impl WindowSums {
    /// Sum of squared deviations from the window mean (`n * variance`).
    ///
    /// Evaluated as `(n * sum_sq - sum^2) / n` in integer arithmetic so large
    /// windows do not lose precision to cancellation.
    #[inline]
    pub fn centered_sum_sq(&self, count: usize) -> f64 {
        let n = count as u128;
        let sum = u128::from(self.sum);
        let scaled = (n * u128::from(self.sum_sq)).saturating_sub(sum * sum);
        scaled as f64 / count as f64
    }

    #[inline]
    pub fn mean(&self, count: usize) -> f64 {
        self.sum as f64 / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::IntegralImage;
    use crate::ImageView;

    #[test]
    fn window_sums_match_direct_sums() {
        let width = 7;
        let height = 5;
        let data: Vec<u8> = (0..width * height)
            .map(|i| ((i * 37 + 11) % 251) as u8)
            .collect();
        let view = ImageView::from_slice(&data, width, height).unwrap();
        let integral = IntegralImage::from_view(view);

        for (x, y, w, h) in [(0, 0, 7, 5), (2, 1, 3, 2), (6, 4, 1, 1), (1, 0, 4, 5)] {
            let mut sum = 0u64;
            let mut sum_sq = 0u64;
            for yy in y..y + h {
                for xx in x..x + w {
                    let v = u64::from(data[yy * width + xx]);
                    sum += v;
                    sum_sq += v * v;
                }
            }
            let got = integral.window(x, y, w, h);
            assert_eq!(got.sum, sum);
            assert_eq!(got.sum_sq, sum_sq);
        }
    }

    #[test]
    fn flat_window_has_zero_spread() {
        let data = vec![42u8; 16];
        let view = ImageView::from_slice(&data, 4, 4).unwrap();
        let integral = IntegralImage::from_view(view);
        let sums = integral.window(1, 1, 2, 2);
        assert_eq!(sums.centered_sum_sq(4), 0.0);
        assert_eq!(sums.mean(4), 42.0);
    }
}
