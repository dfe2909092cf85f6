//! Discrete Laplacian response and its statistics

use image::GrayImage;
use ndarray::Array2;

/// Reflect-101 border: -1 -> 1, n -> n-2
fn reflect_101(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    let mut i = i;
    while i < 0 || i >= n {
        if i < 0 {
            i = -i;
        }
        if i >= n {
            i = 2 * (n - 1) - i;
        }
    }
    i as usize
}

/// Apply the 3x3 Laplacian kernel `[0,1,0; 1,-4,1; 0,1,0]`
///
/// Output has the same shape as the input, indexed `[row, col]`.
pub fn laplacian(gray: &GrayImage) -> Array2<f64> {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    let px = |x: isize, y: isize| -> f64 {
        let xs = reflect_101(x, w) as u32;
        let ys = reflect_101(y, h) as u32;
        gray.get_pixel(xs, ys)[0] as f64
    };

    Array2::from_shape_fn((h, w), |(row, col)| {
        let (x, y) = (col as isize, row as isize);
        px(x, y - 1) + px(x - 1, y) + px(x + 1, y) + px(x, y + 1) - 4.0 * px(x, y)
    })
}

/// Summary of a Laplacian response
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResponseStatistics {
    /// Mean response
    pub mean: f64,
    /// Population variance of the response
    pub variance: f64,
    /// Minimum response
    pub min: f64,
    /// Maximum response
    pub max: f64,
}

impl ResponseStatistics {
    /// Compute statistics over a response; empty input yields zeros
    pub fn compute(response: &Array2<f64>) -> Self {
        if response.is_empty() {
            return Self::default();
        }

        let mean = response.mean().unwrap_or(0.0);
        let variance = response.var(0.0);
        let min = response.iter().cloned().fold(f64::MAX, f64::min);
        let max = response.iter().cloned().fold(f64::MIN, f64::max);

        Self {
            mean,
            variance,
            min,
            max,
        }
    }
}
