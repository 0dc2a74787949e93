//! PI4: goalkeeper reaction intensity
//!
//! The speed of every frame is the magnitude of the goalkeeper velocity
//! `(#vx0, #vy0)`. A frame missing either component has no speed; it keeps
//! its slot in the speed series (as `None`) but does not count towards the
//! mean or the maximum.

use keeper_stats::descriptive::DescriptiveStats;
use serde::Serialize;

use crate::{
    frame::{Column, FrameTable},
    outcome::{KpiResult, KpiValue},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReactionIntensity {
    /// Speed per frame, aligned with the input rows.
    pub speeds: Vec<Option<f64>>,
    pub mean_speed: f64,
    pub max_speed: f64,
    /// Number of frames with a speed.
    pub valid_frames: usize,
}

/// Computes per-frame speed and its mean and maximum.
///
/// ```
/// use keeper_kpi::{
///     frame::{Column, FrameTable},
///     reaction::reaction_intensity,
/// };
///
/// let table = FrameTable::default()
///     .with_numeric(Column::Vx0, vec![Some(3.0), Some(0.0)])
///     .unwrap()
///     .with_numeric(Column::Vy0, vec![Some(4.0), Some(0.0)])
///     .unwrap();
/// let pi4 = reaction_intensity(&table).unwrap().computed().unwrap();
/// assert_eq!(pi4.speeds, vec![Some(5.0), Some(0.0)]);
/// assert_eq!(pi4.mean_speed, 2.5);
/// assert_eq!(pi4.max_speed, 5.0);
/// ```
pub fn reaction_intensity(table: &FrameTable) -> KpiResult<ReactionIntensity> {
    let velocities = table.required_pairs(Column::Vx0, Column::Vy0)?;
    let speeds = velocities
        .into_iter()
        .map(|(vx, vy)| Some(vx?.hypot(vy?)).filter(|speed| !speed.is_nan()))
        .collect::<Vec<_>>();

    let Some(stats) = DescriptiveStats::from_optional(speeds.iter().copied()) else {
        return Ok(KpiValue::InsufficientData);
    };

    Ok(KpiValue::Computed(ReactionIntensity {
        speeds,
        mean_speed: stats.mean,
        max_speed: stats.max,
        valid_frames: stats.count,
    }))
}
