//! Engine configuration
//!
//! All options have defaults; a JSON configuration only needs to name the
//! values it changes:
//!
//! ```
//! use keeper_kpi::config::KpiConfig;
//!
//! let config: KpiConfig =
//!     serde_json::from_str(r#"{"heatmap": {"bins_x": 12}, "density": {"seed": 7}}"#).unwrap();
//! assert_eq!(config.heatmap.bins_x, 12);
//! assert_eq!(config.heatmap.bins_y, 10);
//! assert_eq!(config.density.seed, Some(7));
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

pub const DEFAULT_BINS: usize = 10;
pub const DEFAULT_BANDWIDTH: f64 = 0.25;
pub const DEFAULT_GRID_SIZE: usize = 120;
pub const DEFAULT_MAX_SAMPLES: usize = 3000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KpiConfig {
    pub heatmap: HeatmapConfig,
    pub density: DensityConfig,
}

/// Threat zone histogram resolution and range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    pub bins_x: usize,
    pub bins_y: usize,
    /// Fixed x range. When `None` the range is taken from the data.
    pub x_range: Option<(f64, f64)>,
    /// Fixed y range. When `None` the range is taken from the data.
    pub y_range: Option<(f64, f64)>,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            bins_x: DEFAULT_BINS,
            bins_y: DEFAULT_BINS,
            x_range: None,
            y_range: None,
        }
    }
}

/// Positional density estimation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    /// Kernel bandwidth factor applied to the sample covariance.
    pub bandwidth: f64,
    /// Number of grid points along each axis of the density surface.
    pub grid_size: usize,
    /// Sample count above which positions are sub-sampled before estimation.
    pub max_samples: usize,
    /// Seed for sub-sampling. Without a seed sub-sampling differs per run.
    pub seed: Option<u64>,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            bandwidth: DEFAULT_BANDWIDTH,
            grid_size: DEFAULT_GRID_SIZE,
            max_samples: DEFAULT_MAX_SAMPLES,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("heatmap needs at least one bin per axis (got {bins_x}x{bins_y})")]
    ZeroBins { bins_x: usize, bins_y: usize },
    #[display("invalid heatmap {axis} range {min}..={max}")]
    InvalidRange { axis: char, min: f64, max: f64 },
    #[display("density bandwidth must be positive and finite (got {bandwidth})")]
    InvalidBandwidth { bandwidth: f64 },
    #[display("density grid needs at least 2 points per axis (got {grid_size})")]
    GridTooSmall { grid_size: usize },
    #[display("density sample cap must be at least 2 (got {max_samples})")]
    SampleCapTooSmall { max_samples: usize },
}

impl KpiConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.heatmap.validate()?;
        self.density.validate()
    }
}

impl HeatmapConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Self {
            bins_x,
            bins_y,
            x_range,
            y_range,
        } = *self;
        if bins_x == 0 || bins_y == 0 {
            return Err(ConfigError::ZeroBins { bins_x, bins_y });
        }
        for (axis, range) in [('x', x_range), ('y', y_range)] {
            match range {
                Some((min, max)) if !min.is_finite() || !max.is_finite() || min >= max => {
                    return Err(ConfigError::InvalidRange { axis, min, max });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl DensityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.bandwidth.is_finite() || self.bandwidth <= 0.0 {
            return Err(ConfigError::InvalidBandwidth {
                bandwidth: self.bandwidth,
            });
        }
        if self.grid_size < 2 {
            return Err(ConfigError::GridTooSmall {
                grid_size: self.grid_size,
            });
        }
        if self.max_samples < 2 {
            return Err(ConfigError::SampleCapTooSmall {
                max_samples: self.max_samples,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = KpiConfig::default();
        assert_eq!(config.heatmap.bins_x, 10);
        assert_eq!(config.heatmap.bins_y, 10);
        assert!((config.density.bandwidth - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.density.grid_size, 120);
        assert_eq!(config.density.max_samples, 3000);
        assert_eq!(config.density.seed, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_bins() {
        let mut config = KpiConfig::default();
        config.heatmap.bins_y = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroBins {
                bins_x: 10,
                bins_y: 0
            })
        );
    }

    #[test]
    fn test_inverted_range() {
        let mut config = KpiConfig::default();
        config.heatmap.y_range = Some((1.0, 0.0));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRange { axis: 'y', .. })
        ));
    }

    #[test]
    fn test_density_limits() {
        let mut config = KpiConfig::default();
        config.density.bandwidth = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBandwidth { .. })
        ));

        let mut config = KpiConfig::default();
        config.density.grid_size = 1;
        assert_eq!(
            config.validate(),
            Err(ConfigError::GridTooSmall { grid_size: 1 })
        );

        let mut config = KpiConfig::default();
        config.density.max_samples = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::SampleCapTooSmall { max_samples: 0 })
        );
    }

    #[test]
    fn test_ranges_deserialize_as_pairs() {
        let config: KpiConfig =
            serde_json::from_str(r#"{"heatmap": {"x_range": [0.0, 1.0]}}"#).unwrap();
        assert_eq!(config.heatmap.x_range, Some((0.0, 1.0)));
    }
}
