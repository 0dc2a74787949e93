//! Bivariate Gaussian kernel density estimation
//!
//! The estimator places a Gaussian kernel on every sample. The kernel
//! covariance is the unbiased sample covariance scaled by `bandwidth²`, so the
//! bandwidth acts as a dimensionless smoothing factor: smaller values keep
//! local detail, larger values smooth towards a single blob.
//!
//! # Examples
//!
//! ```
//! use keeper_stats::kde::GaussianKde2d;
//!
//! let points = vec![(0.0, 0.0), (1.0, 0.2), (0.4, 1.0), (0.8, 0.7)];
//! let kde = GaussianKde2d::new(points, 0.25).unwrap();
//! let grid = kde.evaluate_on_bounds(50, 50);
//! assert_eq!(grid.values.len(), 50 * 50);
//! assert!(grid.values.iter().all(|v| *v >= 0.0));
//! ```

use std::{f64::consts::PI, num::NonZeroUsize, thread};

use crate::histogram::linspace;

/// Relative determinant below which the covariance is treated as singular.
///
/// Compared against `det / (var_x * var_y)`, i.e. `1 - correlation²`.
const SINGULAR_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum KdeError {
    #[display("density estimation needs at least 2 samples (got {count})")]
    TooFewPoints { count: usize },
    #[display("sample covariance is singular (determinant {determinant})")]
    SingularCovariance { determinant: f64 },
    #[display("bandwidth must be positive and finite (got {bandwidth})")]
    InvalidBandwidth { bandwidth: f64 },
}

/// A fitted bivariate Gaussian kernel density estimator.
#[derive(Debug, Clone)]
pub struct GaussianKde2d {
    points: Vec<(f64, f64)>,
    covariance: [[f64; 2]; 2],
    inv_covariance: [[f64; 2]; 2],
    norm: f64,
}

/// Density values evaluated on a regular grid.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    /// Grid coordinates along the x axis (ascending, endpoints inclusive).
    pub xs: Vec<f64>,
    /// Grid coordinates along the y axis (ascending, endpoints inclusive).
    pub ys: Vec<f64>,
    /// Density values in row-major order: `values[iy * xs.len() + ix]`.
    pub values: Vec<f64>,
}

impl DensityGrid {
    /// Density at grid cell `(ix, iy)`.
    #[must_use]
    pub fn at(&self, ix: usize, iy: usize) -> Option<f64> {
        if ix >= self.xs.len() || iy >= self.ys.len() {
            return None;
        }
        self.values.get(iy * self.xs.len() + ix).copied()
    }
}

impl GaussianKde2d {
    /// Fits an estimator to `points` with the given bandwidth factor.
    ///
    /// Fails when fewer than two samples are given or when the samples do not
    /// span two dimensions (zero variance on an axis, or perfectly collinear
    /// samples), since the kernel covariance cannot be inverted then.
    pub fn new(points: Vec<(f64, f64)>, bandwidth: f64) -> Result<Self, KdeError> {
        if !bandwidth.is_finite() || bandwidth <= 0.0 {
            return Err(KdeError::InvalidBandwidth { bandwidth });
        }
        if points.len() < 2 {
            return Err(KdeError::TooFewPoints {
                count: points.len(),
            });
        }

        let data_cov = sample_covariance(&points);
        let (sxx, sxy, syy) = (data_cov[0][0], data_cov[0][1], data_cov[1][1]);
        let data_det = sxx * syy - sxy * sxy;
        if !data_det.is_finite()
            || sxx <= 0.0
            || syy <= 0.0
            || data_det <= SINGULAR_TOLERANCE * sxx * syy
        {
            return Err(KdeError::SingularCovariance {
                determinant: data_det,
            });
        }

        let scale = bandwidth * bandwidth;
        let covariance = [[sxx * scale, sxy * scale], [sxy * scale, syy * scale]];
        let det = covariance[0][0] * covariance[1][1] - covariance[0][1] * covariance[1][0];
        let inv_covariance = [
            [covariance[1][1] / det, -covariance[0][1] / det],
            [-covariance[1][0] / det, covariance[0][0] / det],
        ];
        let norm = 2.0 * PI * det.sqrt();

        Ok(Self {
            points,
            covariance,
            inv_covariance,
            norm,
        })
    }

    /// The kernel covariance matrix (sample covariance × bandwidth²).
    #[must_use]
    pub fn kernel_covariance(&self) -> [[f64; 2]; 2] {
        self.covariance
    }

    /// Estimated probability density at `(x, y)`.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn density(&self, x: f64, y: f64) -> f64 {
        let [[a, b], [c, d]] = self.inv_covariance;
        let sum = self
            .points
            .iter()
            .map(|&(px, py)| {
                let (dx, dy) = (x - px, y - py);
                let mahalanobis = dx * (a * dx + b * dy) + dy * (c * dx + d * dy);
                (-0.5 * mahalanobis).exp()
            })
            .sum::<f64>();
        sum / (self.norm * self.points.len() as f64)
    }

    /// Evaluates the density on the grid spanned by `xs × ys`.
    ///
    /// Rows of the grid are split across scoped worker threads; each grid
    /// point is independent so the result does not depend on the split.
    #[must_use]
    pub fn evaluate_grid(&self, xs: &[f64], ys: &[f64]) -> DensityGrid {
        let nx = xs.len();
        let mut values = vec![0.0; nx * ys.len()];
        if !values.is_empty() {
            let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get);
            let rows_per_chunk = ys.len().div_ceil(workers).max(1);
            thread::scope(|s| {
                for (chunk_idx, chunk) in values.chunks_mut(rows_per_chunk * nx).enumerate() {
                    let row_offset = chunk_idx * rows_per_chunk;
                    s.spawn(move || {
                        for (i, value) in chunk.iter_mut().enumerate() {
                            let (ix, iy) = (i % nx, row_offset + i / nx);
                            *value = self.density(xs[ix], ys[iy]);
                        }
                    });
                }
            });
        }
        DensityGrid {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            values,
        }
    }

    /// Evaluates the density on an `nx × ny` grid spanning the samples' bounding box.
    #[must_use]
    pub fn evaluate_on_bounds(&self, nx: usize, ny: usize) -> DensityGrid {
        let (x_min, x_max, y_min, y_max) = self.points.iter().fold(
            (
                f64::INFINITY,
                f64::NEG_INFINITY,
                f64::INFINITY,
                f64::NEG_INFINITY,
            ),
            |(x0, x1, y0, y1), &(x, y)| (x0.min(x), x1.max(x), y0.min(y), y1.max(y)),
        );
        let xs = linspace(x_min, x_max, nx);
        let ys = linspace(y_min, y_max, ny);
        self.evaluate_grid(&xs, &ys)
    }
}

/// Unbiased (`n - 1`) sample covariance matrix of 2D points.
#[expect(clippy::cast_precision_loss)]
fn sample_covariance(points: &[(f64, f64)]) -> [[f64; 2]; 2] {
    let n = points.len() as f64;
    let (sum_x, sum_y) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x, sy + y));
    let (mean_x, mean_y) = (sum_x / n, sum_y / n);
    let (sxx, sxy, syy) = points.iter().fold((0.0, 0.0, 0.0), |(xx, xy, yy), &(x, y)| {
        let (dx, dy) = (x - mean_x, y - mean_y);
        (xx + dx * dx, xy + dx * dy, yy + dy * dy)
    });
    let ddof = n - 1.0;
    [[sxx / ddof, sxy / ddof], [sxy / ddof, syy / ddof]]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<(f64, f64)> {
        vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]
    }

    #[test]
    fn test_too_few_points() {
        let err = GaussianKde2d::new(vec![(1.0, 1.0)], 0.25).unwrap_err();
        assert_eq!(err, KdeError::TooFewPoints { count: 1 });
    }

    #[test]
    fn test_identical_points_are_singular() {
        let err = GaussianKde2d::new(vec![(2.0, 3.0); 5], 0.25).unwrap_err();
        assert!(matches!(err, KdeError::SingularCovariance { .. }));
    }

    #[test]
    fn test_collinear_points_are_singular() {
        let points = (0..10).map(|i| (f64::from(i), 2.0 * f64::from(i))).collect();
        let err = GaussianKde2d::new(points, 0.25).unwrap_err();
        assert!(matches!(err, KdeError::SingularCovariance { .. }));
    }

    #[test]
    fn test_invalid_bandwidth() {
        let err = GaussianKde2d::new(square(), 0.0).unwrap_err();
        assert!(matches!(err, KdeError::InvalidBandwidth { .. }));
    }

    #[test]
    fn test_kernel_covariance_scaled_by_bandwidth() {
        // Sample variance of {0,1,0,1} with ddof=1 is 1/3
        let kde = GaussianKde2d::new(square(), 0.5).unwrap();
        let cov = kde.kernel_covariance();
        assert!((cov[0][0] - 0.25 / 3.0).abs() < 1e-12);
        assert!((cov[1][1] - 0.25 / 3.0).abs() < 1e-12);
        assert!(cov[0][1].abs() < 1e-12);
    }

    #[test]
    fn test_density_matches_closed_form() {
        // Four corners of the unit square: diagonal covariance of 1/3
        let points = vec![(0.0, 0.0), (1.0, 1.0), (1.0, 0.0), (0.0, 1.0)];
        let kde = GaussianKde2d::new(points.clone(), 1.0).unwrap();
        let var = 1.0 / 3.0;
        let norm = 2.0 * PI * var;
        let expected = points
            .iter()
            .map(|&(px, py)| {
                let d2 = (0.5 - px) * (0.5 - px) + (0.5 - py) * (0.5 - py);
                (-0.5 * d2 / var).exp() / norm
            })
            .sum::<f64>()
            / 4.0;
        assert!((kde.density(0.5, 0.5) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_density_integrates_to_roughly_one() {
        let kde = GaussianKde2d::new(square(), 0.25).unwrap();
        let xs = linspace(-2.0, 3.0, 201);
        let ys = linspace(-2.0, 3.0, 201);
        let grid = kde.evaluate_grid(&xs, &ys);
        let cell = (xs[1] - xs[0]) * (ys[1] - ys[0]);
        let mass = grid.values.iter().sum::<f64>() * cell;
        assert!((mass - 1.0).abs() < 0.01, "mass = {mass}");
    }

    #[test]
    fn test_grid_layout_and_densest_point() {
        let points = vec![(0.0, 0.0), (0.1, 0.05), (0.05, 0.1), (2.0, 2.0)];
        let kde = GaussianKde2d::new(points, 0.25).unwrap();
        let grid = kde.evaluate_on_bounds(30, 20);
        assert_eq!(grid.xs.len(), 30);
        assert_eq!(grid.ys.len(), 20);
        assert_eq!(grid.values.len(), 600);
        assert_eq!(grid.xs[0], 0.0);
        assert_eq!(grid.xs[29], 2.0);
        assert_eq!(grid.at(3, 2), Some(kde.density(grid.xs[3], grid.ys[2])));
        assert_eq!(grid.at(30, 0), None);
        // The densest point lies in the cluster near the origin
        let densest = (0..20)
            .flat_map(|iy| (0..30).map(move |ix| (ix, iy)))
            .max_by(|a, b| {
                let (da, db) = (grid.at(a.0, a.1).unwrap(), grid.at(b.0, b.1).unwrap());
                da.total_cmp(&db)
            })
            .unwrap();
        assert!(grid.xs[densest.0] < 1.0 && grid.ys[densest.1] < 1.0);
    }
}
