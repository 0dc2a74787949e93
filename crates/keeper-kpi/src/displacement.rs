//! PI2: distance travelled by the goalkeeper
//!
//! Row order is the time axis: the distance covered between two consecutive
//! frames is the straight-line distance between their positions, and the
//! total is the sum over all steps.
//!
//! The slice must be complete: every row needs both `#x0` and `#y0`. A gap
//! would silently merge or drop steps, so it is rejected with
//! [`KpiError::IncompleteRows`] instead; filter incomplete rows first.

use serde::Serialize;

use crate::{
    frame::{Column, FrameTable, Point},
    outcome::{KpiError, KpiResult, KpiValue},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Displacement {
    /// Distance covered between frame `i` and frame `i + 1`.
    pub step_distances: Vec<f64>,
    /// Running total after each step.
    pub cumulative_distances: Vec<f64>,
    pub total_distance: f64,
}

/// Computes the step and total distance travelled.
///
/// Slices with fewer than two frames produce no steps and a total of zero.
///
/// ```
/// use keeper_kpi::{
///     displacement::distance_travelled,
///     frame::{Column, FrameTable},
/// };
///
/// let table = FrameTable::default()
///     .with_numeric(Column::X0, vec![Some(0.0), Some(3.0)])
///     .unwrap()
///     .with_numeric(Column::Y0, vec![Some(0.0), Some(4.0)])
///     .unwrap();
/// let pi2 = distance_travelled(&table).unwrap().computed().unwrap();
/// assert_eq!(pi2.step_distances, vec![5.0]);
/// assert_eq!(pi2.total_distance, 5.0);
/// ```
pub fn distance_travelled(table: &FrameTable) -> KpiResult<Displacement> {
    let pairs = table.required_pairs(Column::X0, Column::Y0)?;
    let positions = pairs
        .into_iter()
        .enumerate()
        .map(|(row, pair)| match pair {
            (Some(x), Some(y)) => Ok(Point::new(x, y)),
            (None, _) => Err(KpiError::IncompleteRows {
                column: Column::X0,
                row,
            }),
            (_, None) => Err(KpiError::IncompleteRows {
                column: Column::Y0,
                row,
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let step_distances = positions
        .windows(2)
        .map(|w| w[0].distance(w[1]))
        .collect::<Vec<_>>();
    let cumulative_distances = step_distances
        .iter()
        .scan(0.0, |total, d| {
            *total += d;
            Some(*total)
        })
        .collect::<Vec<_>>();
    let total_distance = cumulative_distances.last().copied().unwrap_or(0.0);

    Ok(KpiValue::Computed(Displacement {
        step_distances,
        cumulative_distances,
        total_distance,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(points: &[(Option<f64>, Option<f64>)]) -> FrameTable {
        FrameTable::default()
            .with_numeric(Column::X0, points.iter().map(|p| p.0).collect())
            .unwrap()
            .with_numeric(Column::Y0, points.iter().map(|p| p.1).collect())
            .unwrap()
    }

    #[test]
    fn test_empty_and_single_row() {
        for points in [&[][..], &[(Some(1.0), Some(1.0))][..]] {
            let pi2 = distance_travelled(&table(points))
                .unwrap()
                .computed()
                .unwrap();
            assert!(pi2.step_distances.is_empty());
            assert!(pi2.cumulative_distances.is_empty());
            assert_eq!(pi2.total_distance, 0.0);
        }
    }

    #[test]
    fn test_steps_and_running_total() {
        let pi2 = distance_travelled(&table(&[
            (Some(0.0), Some(0.0)),
            (Some(3.0), Some(4.0)),
            (Some(3.0), Some(4.0)),
            (Some(3.0), Some(5.0)),
        ]))
        .unwrap()
        .computed()
        .unwrap();
        assert_eq!(pi2.step_distances, vec![5.0, 0.0, 1.0]);
        assert_eq!(pi2.cumulative_distances, vec![5.0, 5.0, 6.0]);
        assert_eq!(pi2.total_distance, 6.0);
    }

    #[test]
    fn test_gap_is_rejected() {
        let err = distance_travelled(&table(&[
            (Some(0.0), Some(0.0)),
            (Some(1.0), None),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            KpiError::IncompleteRows {
                column: Column::Y0,
                row: 1
            }
        );
    }

    #[test]
    fn test_missing_column() {
        let t = FrameTable::default()
            .with_numeric(Column::Y0, vec![Some(0.0)])
            .unwrap();
        assert!(matches!(
            distance_travelled(&t),
            Err(KpiError::MissingColumn(_))
        ));
    }
}
