//! Numeric kernels for the goalkeeper KPI engine.
//!
//! This crate provides the statistical building blocks the KPI engine is
//! assembled from. Apart from `derive_more` for its error types it only uses
//! the standard library.
//!
//! - **Descriptive statistics**: null-tolerant mean, median, variance, min and max
//! - **2D histograms**: fixed-resolution binning with per-axis edges
//! - **Kernel density estimation**: bivariate Gaussian KDE evaluated on regular grids
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`histogram`]: Two-dimensional histogram construction
//! - [`kde`]: Gaussian kernel density estimation
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use keeper_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Creating a 2D histogram
//!
//! ```
//! use keeper_stats::histogram::Histogram2d;
//!
//! let points = [(0.0, 0.0), (4.0, 2.0), (10.0, 5.0)];
//! let histogram = Histogram2d::new(points, 10, 10, None, None).unwrap();
//! assert_eq!(histogram.total(), 3);
//! ```
//!
//! ## Estimating a density surface
//!
//! ```
//! use keeper_stats::kde::GaussianKde2d;
//!
//! let points = vec![(0.0, 0.0), (1.0, 0.5), (0.3, 1.0)];
//! let kde = GaussianKde2d::new(points, 0.25).unwrap();
//! assert!(kde.density(0.4, 0.5) > 0.0);
//! ```

pub mod descriptive;
pub mod histogram;
pub mod kde;
