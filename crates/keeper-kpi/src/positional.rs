//! PI1: goalkeeper positional distribution
//!
//! Summarizes where the goalkeeper stands: the mean position and a smoothed
//! density surface over every valid `(#x0, #y0)` sample.
//!
//! # Sample handling
//!
//! - The mean x and mean y each skip their own missing values.
//! - Samples (and the density estimate) only use rows where both coordinates
//!   are present, so x and y stay paired.
//! - Above [`DensityConfig::max_samples`] samples, a uniform random subset
//!   (without replacement, original order kept) feeds the estimator. With
//!   [`DensityConfig::seed`] unset the surface differs between runs; the mean
//!   position never does.
//!
//! # Degenerate inputs
//!
//! When the estimator cannot be fitted (a single sample, all samples equal,
//! or collinear samples) the result carries
//! [`DensityEstimate::Unavailable`] with the points that were offered to the
//! estimator, so a caller can still draw a scatter.

use std::time::Instant;

use keeper_stats::{descriptive::mean_of_present, kde::GaussianKde2d};
use rand::{SeedableRng as _, seq::index};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::{
    config::DensityConfig,
    frame::{Column, FrameTable, Point},
    outcome::{KpiResult, KpiValue},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionalDistribution {
    /// Mean goalkeeper position.
    pub mean_position: Point,
    /// Every valid position sample, in frame order.
    pub samples: Vec<Point>,
    pub density: DensityEstimate,
}

#[derive(Debug, Clone, PartialEq, Serialize, derive_more::IsVariant)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DensityEstimate {
    Surface(DensitySurface),
    /// The estimator could not be fitted; `points` are the samples it was given.
    Unavailable { reason: String, points: Vec<Point> },
}

/// Density values over a regular grid spanning the samples' bounding box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensitySurface {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    /// Row-major values: `values[iy * xs.len() + ix]`.
    pub values: Vec<f64>,
    pub bandwidth: f64,
    /// Number of samples the estimator was fitted to.
    pub fitted_samples: usize,
    /// Whether the samples were sub-sampled before fitting.
    pub subsampled: bool,
}

impl DensitySurface {
    /// Grid location with the highest density: the goalkeeper's main dwell zone.
    #[must_use]
    pub fn peak(&self) -> Option<Point> {
        let (idx, _) = self
            .values
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))?;
        let nx = self.xs.len();
        Some(Point::new(self.xs[idx % nx], self.ys[idx / nx]))
    }
}

/// Computes the goalkeeper's positional distribution.
///
/// ```
/// use keeper_kpi::{
///     config::DensityConfig,
///     frame::{Column, FrameTable},
///     positional::positional_distribution,
/// };
///
/// let table = FrameTable::default()
///     .with_numeric(Column::X0, vec![Some(0.0), Some(2.0), Some(1.0)])
///     .unwrap()
///     .with_numeric(Column::Y0, vec![Some(0.0), Some(0.0), Some(2.0)])
///     .unwrap();
/// let pi1 = positional_distribution(&table, &DensityConfig::default())
///     .unwrap()
///     .computed()
///     .unwrap();
/// assert!((pi1.mean_position.x - 1.0).abs() < 1e-12);
/// assert!((pi1.mean_position.y - 2.0 / 3.0).abs() < 1e-12);
/// assert!(pi1.density.is_surface());
/// ```
pub fn positional_distribution(
    table: &FrameTable,
    config: &DensityConfig,
) -> KpiResult<PositionalDistribution> {
    config.validate()?;
    let pairs = table.required_pairs(Column::X0, Column::Y0)?;

    let samples = pairs
        .iter()
        .filter_map(|&(x, y)| Some(Point::new(x?, y?)))
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .collect::<Vec<_>>();
    if samples.is_empty() {
        return Ok(KpiValue::InsufficientData);
    }

    let (Some(mean_x), Some(mean_y)) = (
        mean_of_present(pairs.iter().map(|(x, _)| *x)),
        mean_of_present(pairs.iter().map(|(_, y)| *y)),
    ) else {
        return Ok(KpiValue::InsufficientData);
    };

    let density = estimate_density(&samples, config);
    Ok(KpiValue::Computed(PositionalDistribution {
        mean_position: Point::new(mean_x, mean_y),
        samples,
        density,
    }))
}

fn estimate_density(samples: &[Point], config: &DensityConfig) -> DensityEstimate {
    let subsampled = samples.len() > config.max_samples;
    let fitted = if subsampled {
        subsample(samples, config.max_samples, config.seed)
    } else {
        samples.to_vec()
    };

    let started = Instant::now();
    let kde = match GaussianKde2d::new(
        fitted.iter().map(|p| (p.x, p.y)).collect(),
        config.bandwidth,
    ) {
        Ok(kde) => kde,
        Err(err) => {
            log::warn!("positional density unavailable: {err}");
            return DensityEstimate::Unavailable {
                reason: err.to_string(),
                points: fitted,
            };
        }
    };
    let grid = kde.evaluate_on_bounds(config.grid_size, config.grid_size);
    log::debug!(
        "density surface {n}x{n} over {} samples in {:?}",
        fitted.len(),
        started.elapsed(),
        n = config.grid_size,
    );

    DensityEstimate::Surface(DensitySurface {
        xs: grid.xs,
        ys: grid.ys,
        values: grid.values,
        bandwidth: config.bandwidth,
        fitted_samples: fitted.len(),
        subsampled,
    })
}

/// Uniform random subset of `amount` samples, in their original order.
fn subsample(samples: &[Point], amount: usize, seed: Option<u64>) -> Vec<Point> {
    let mut rng = match seed {
        Some(seed) => Pcg32::seed_from_u64(seed),
        None => Pcg32::from_os_rng(),
    };
    let mut picked = index::sample(&mut rng, samples.len(), amount).into_vec();
    picked.sort_unstable();
    log::debug!(
        "sub-sampled {} of {} positions for density estimation",
        picked.len(),
        samples.len()
    );
    picked.into_iter().map(|i| samples[i]).collect()
}
