//! PI3: threat frequency by zone
//!
//! Bins ball positions into a grid so the zones where the ball spends most
//! time stand out. Frames missing either ball coordinate are left out.
//!
//! By default the grid spans the observed ball range of the slice, which
//! means two heatmaps built from differently filtered slices do not share bin
//! boundaries. Set [`HeatmapConfig::x_range`] / [`HeatmapConfig::y_range`] to
//! compare slices on a common grid.

use keeper_stats::histogram::Histogram2d;
use serde::Serialize;

use crate::{
    config::HeatmapConfig,
    frame::{Column, FrameTable},
    outcome::{KpiResult, KpiValue},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatHeatmap {
    /// Ball observations per cell, indexed `counts[x_bin][y_bin]`.
    pub counts: Vec<Vec<u64>>,
    pub x_edges: Vec<f64>,
    pub y_edges: Vec<f64>,
    /// Ball observations that took part (both coordinates present).
    pub observations: u64,
    /// Observations outside a configured fixed range.
    pub outside: u64,
    pub hottest_zone: Option<Zone>,
}

/// A single heatmap cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Zone {
    pub x_bin: usize,
    pub y_bin: usize,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub count: u64,
}

/// Builds the ball-position heatmap.
///
/// ```
/// use keeper_kpi::{
///     config::HeatmapConfig,
///     frame::{Column, FrameTable},
///     threat_zone::threat_frequency_by_zone,
/// };
///
/// let table = FrameTable::default()
///     .with_numeric(Column::BallX, vec![Some(0.0), Some(1.0), None])
///     .unwrap()
///     .with_numeric(Column::BallY, vec![Some(0.0), Some(1.0), Some(0.5)])
///     .unwrap();
/// let pi3 = threat_frequency_by_zone(&table, &HeatmapConfig::default())
///     .unwrap()
///     .computed()
///     .unwrap();
/// assert_eq!(pi3.observations, 2);
/// assert_eq!(pi3.x_edges.len(), 11);
/// ```
pub fn threat_frequency_by_zone(
    table: &FrameTable,
    config: &HeatmapConfig,
) -> KpiResult<ThreatHeatmap> {
    config.validate()?;
    let pairs = table.required_pairs(Column::BallX, Column::BallY)?;
    let points = pairs
        .into_iter()
        .filter_map(|(x, y)| Some((x?, y?)))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect::<Vec<_>>();
    if points.is_empty() {
        return Ok(KpiValue::InsufficientData);
    }

    let observations = points.len() as u64;
    let histogram = Histogram2d::new(
        points,
        config.bins_x,
        config.bins_y,
        config.x_range,
        config.y_range,
    )?;
    if histogram.outside > 0 {
        log::debug!(
            "{} of {observations} ball positions outside the configured heatmap range",
            histogram.outside
        );
    }

    let hottest_zone = histogram.peak().map(|(x_bin, y_bin, count)| Zone {
        x_bin,
        y_bin,
        x_range: (histogram.x_edges[x_bin], histogram.x_edges[x_bin + 1]),
        y_range: (histogram.y_edges[y_bin], histogram.y_edges[y_bin + 1]),
        count,
    });

    Ok(KpiValue::Computed(ThreatHeatmap {
        counts: histogram.counts,
        x_edges: histogram.x_edges,
        y_edges: histogram.y_edges,
        observations,
        outside: histogram.outside,
        hottest_zone,
    }))
}
