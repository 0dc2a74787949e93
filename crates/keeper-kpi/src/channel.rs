//! PI5: threat progression channels
//!
//! Splits the pitch width into three lateral channels and counts how many
//! frames fall into each, answering "down which side did the opponent build
//! most of its threats?".
//!
//! The lateral coordinate is `#x0`, which must already be normalized to
//! `[0, 1]` by the caller. Values outside that interval are still classified
//! (below 0 is [`Channel::Left`], above 1 is [`Channel::Right`]) and are
//! tallied in [`ThreatChannels::out_of_range`]. Frames without a lateral
//! value are not classified.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    frame::{Column, FrameTable},
    outcome::{KpiResult, KpiValue},
};

/// Upper bound (exclusive) of the left channel.
pub const LEFT_UPPER: f64 = 0.33;
/// Upper bound (exclusive) of the central channel.
pub const CENTRAL_UPPER: f64 = 0.66;

/// A lateral channel of the pitch.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    derive_more::Display,
)]
pub enum Channel {
    Left,
    Central,
    Right,
}

impl Channel {
    /// All channels in canonical order.
    pub const ALL: [Channel; 3] = [Channel::Left, Channel::Central, Channel::Right];

    /// Channel of a normalized lateral coordinate.
    ///
    /// ```
    /// use keeper_kpi::channel::Channel;
    ///
    /// assert_eq!(Channel::classify(0.1), Channel::Left);
    /// assert_eq!(Channel::classify(0.33), Channel::Central);
    /// assert_eq!(Channel::classify(0.66), Channel::Right);
    /// ```
    #[must_use]
    pub fn classify(lateral: f64) -> Self {
        if lateral < LEFT_UPPER {
            Channel::Left
        } else if lateral < CENTRAL_UPPER {
            Channel::Central
        } else {
            Channel::Right
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatChannels {
    /// Frames per channel; every channel is present, in canonical order.
    pub counts: BTreeMap<Channel, u64>,
    /// Share of classified frames per channel, in percent.
    ///
    /// With no classified frames these are the (zero) counts.
    pub percentages: BTreeMap<Channel, f64>,
    pub total_threats: u64,
    /// Classified frames whose lateral value lies outside `[0, 1]`.
    pub out_of_range: u64,
}

impl ThreatChannels {
    #[must_use]
    pub fn count(&self, channel: Channel) -> u64 {
        self.counts.get(&channel).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn percentage(&self, channel: Channel) -> f64 {
        self.percentages.get(&channel).copied().unwrap_or(0.0)
    }

    /// The channel with the most frames; ties go to the earlier channel.
    #[must_use]
    pub fn dominant(&self) -> Option<Channel> {
        if self.total_threats == 0 {
            return None;
        }
        Channel::ALL
            .into_iter()
            .rev()
            .max_by_key(|channel| self.count(*channel))
    }
}

/// Tabulates frames per lateral channel.
///
/// ```
/// use keeper_kpi::{
///     channel::{Channel, threat_progression_channels},
///     frame::{Column, FrameTable},
/// };
///
/// let table = FrameTable::default()
///     .with_numeric(Column::X0, vec![Some(0.1), Some(0.5), Some(0.9)])
///     .unwrap();
/// let pi5 = threat_progression_channels(&table).unwrap().computed().unwrap();
/// assert_eq!(pi5.total_threats, 3);
/// assert_eq!(pi5.count(Channel::Central), 1);
/// assert!((pi5.percentage(Channel::Left) - 33.33).abs() < 0.01);
/// ```
#[expect(clippy::cast_precision_loss)]
pub fn threat_progression_channels(table: &FrameTable) -> KpiResult<ThreatChannels> {
    let lateral = table.required_numeric(Column::X0)?;

    let mut counts = Channel::ALL
        .into_iter()
        .map(|channel| (channel, 0_u64))
        .collect::<BTreeMap<_, _>>();
    let mut out_of_range = 0;
    for x in lateral.iter().flatten().copied().filter(|x| !x.is_nan()) {
        if !(0.0..=1.0).contains(&x) {
            out_of_range += 1;
        }
        *counts.entry(Channel::classify(x)).or_default() += 1;
    }
    if out_of_range > 0 {
        log::warn!(
            "{out_of_range} lateral values outside [0, 1]; {} is expected to be normalized",
            Column::X0
        );
    }

    let total_threats = counts.values().sum::<u64>();
    let percentages = counts
        .iter()
        .map(|(channel, count)| {
            let pct = if total_threats > 0 {
                *count as f64 / total_threats as f64 * 100.0
            } else {
                *count as f64
            };
            (*channel, pct)
        })
        .collect();

    Ok(KpiValue::Computed(ThreatChannels {
        counts,
        percentages,
        total_threats,
        out_of_range,
    }))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::outcome::KpiError;

    fn table(xs: Vec<Option<f64>>) -> FrameTable {
        FrameTable::default().with_numeric(Column::X0, xs).unwrap()
    }

    #[test]
    fn test_one_per_channel() {
        let pi5 = threat_progression_channels(&table(vec![Some(0.1), Some(0.5), Some(0.9)]))
            .unwrap()
            .computed()
            .unwrap();
        for channel in Channel::ALL {
            assert_eq!(pi5.count(channel), 1);
            assert!((pi5.percentage(channel) - 33.33).abs() < 0.01);
        }
        assert_eq!(pi5.total_threats, 3);
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(Channel::classify(0.329_999), Channel::Left);
        assert_eq!(Channel::classify(0.33), Channel::Central);
        assert_eq!(Channel::classify(0.659_999), Channel::Central);
        assert_eq!(Channel::classify(0.66), Channel::Right);
        assert_eq!(Channel::classify(1.0), Channel::Right);
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let pi5 = threat_progression_channels(&table(vec![]))
            .unwrap()
            .computed()
            .unwrap();
        assert_eq!(pi5.total_threats, 0);
        assert_eq!(pi5.counts.len(), 3);
        assert_eq!(pi5.percentages.len(), 3);
        assert!(pi5.percentages.values().all(|p| *p == 0.0));
        assert_eq!(pi5.dominant(), None);
    }

    #[test]
    fn test_canonical_order_and_zero_fill() {
        let pi5 = threat_progression_channels(&table(vec![Some(0.8), Some(0.9)]))
            .unwrap()
            .computed()
            .unwrap();
        assert_eq!(
            pi5.counts.keys().copied().collect::<Vec<_>>(),
            Channel::ALL.to_vec()
        );
        assert_eq!(pi5.count(Channel::Left), 0);
        assert_eq!(pi5.percentage(Channel::Right), 100.0);
        assert_eq!(pi5.dominant(), Some(Channel::Right));
    }

    #[test]
    fn test_missing_values_not_classified() {
        let pi5 = threat_progression_channels(&table(vec![None, Some(0.2), None]))
            .unwrap()
            .computed()
            .unwrap();
        assert_eq!(pi5.total_threats, 1);
        assert_eq!(pi5.count(Channel::Left), 1);
    }

    #[test]
    fn test_out_of_range_still_classified() {
        let pi5 = threat_progression_channels(&table(vec![Some(-0.5), Some(1.5), Some(0.5)]))
            .unwrap()
            .computed()
            .unwrap();
        assert_eq!(pi5.out_of_range, 2);
        assert_eq!(pi5.count(Channel::Left), 1);
        assert_eq!(pi5.count(Channel::Right), 1);
    }

    #[test]
    fn test_dominant_tie_prefers_earlier_channel() {
        let pi5 = threat_progression_channels(&table(vec![Some(0.5), Some(0.1)]))
            .unwrap()
            .computed()
            .unwrap();
        assert_eq!(pi5.dominant(), Some(Channel::Left));
    }

    #[test]
    fn test_missing_lateral_column_is_an_error() {
        let t = FrameTable::default()
            .with_numeric(Column::Y0, vec![Some(0.5)])
            .unwrap();
        assert!(matches!(
            threat_progression_channels(&t),
            Err(KpiError::MissingColumn(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_counts_and_percentages_add_up(
            xs in prop::collection::vec(prop::option::of(0.0f64..=1.0), 0..200),
        ) {
            let pi5 = threat_progression_channels(&table(xs.clone()))
                .unwrap()
                .computed()
                .unwrap();
            let classified = xs.iter().flatten().count() as u64;
            prop_assert_eq!(pi5.counts.values().sum::<u64>(), pi5.total_threats);
            prop_assert_eq!(pi5.total_threats, classified);
            if pi5.total_threats > 0 {
                let sum = pi5.percentages.values().sum::<f64>();
                prop_assert!((sum - 100.0).abs() < 1e-9);
            }
        }

        #[test]
        fn prop_recomputing_is_idempotent(
            xs in prop::collection::vec(prop::option::of(0.0f64..=1.0), 0..100),
        ) {
            let t = table(xs);
            prop_assert_eq!(
                threat_progression_channels(&t).unwrap(),
                threat_progression_channels(&t).unwrap()
            );
        }
    }
}
