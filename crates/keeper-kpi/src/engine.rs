//! KPI orchestration
//!
//! [`KpiEngine`] runs a requested [`KpiSet`] over a single frame slice. KPIs
//! share no state, so each one runs on its own scoped thread and the results
//! are gathered into a [`KpiReport`]. A KPI that fails (e.g. a missing column)
//! only fails its own slot in the report.
//!
//! ```
//! use keeper_kpi::{
//!     config::KpiConfig,
//!     engine::{KpiEngine, KpiKind, KpiSet},
//!     frame::{Column, FrameTable},
//! };
//!
//! let table = FrameTable::default()
//!     .with_numeric(Column::X0, vec![Some(0.1), Some(0.5), Some(0.9)])
//!     .unwrap();
//! let engine = KpiEngine::new(KpiConfig::default()).unwrap();
//! let report = engine.compute(&table, KpiSet::all());
//!
//! // PI5 only needs `#x0`; PI2 also needs `#y0`
//! assert!(report.channels.as_ref().unwrap().is_ok());
//! assert!(report.displacement.as_ref().unwrap().is_err());
//! assert!(report.get_error(KpiKind::Displacement).is_some());
//! ```

use std::{fmt, thread, time::Instant};

use serde::{Serialize, Serializer, ser::SerializeMap as _};

use crate::{
    channel::{ThreatChannels, threat_progression_channels},
    config::{ConfigError, KpiConfig},
    displacement::{Displacement, distance_travelled},
    frame::FrameTable,
    outcome::{KpiError, KpiResult, KpiValue},
    positional::{PositionalDistribution, positional_distribution},
    reaction::{ReactionIntensity, reaction_intensity},
    threat_zone::{ThreatHeatmap, threat_frequency_by_zone},
};

/// Identifies one of the five performance indicators.
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
#[serde(rename_all = "snake_case")]
pub enum KpiKind {
    #[display("PI1 positional distribution")]
    Positional,
    #[display("PI2 distance travelled")]
    Displacement,
    #[display("PI3 threat frequency by zone")]
    ThreatZones,
    #[display("PI4 reaction intensity")]
    Reaction,
    #[display("PI5 threat progression channels")]
    Channels,
}

impl KpiKind {
    pub const ALL: [KpiKind; 5] = [
        KpiKind::Positional,
        KpiKind::Displacement,
        KpiKind::ThreatZones,
        KpiKind::Reaction,
        KpiKind::Channels,
    ];

    /// Short identifier (`pi1` .. `pi5`).
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            KpiKind::Positional => "pi1",
            KpiKind::Displacement => "pi2",
            KpiKind::ThreatZones => "pi3",
            KpiKind::Reaction => "pi4",
            KpiKind::Channels => "pi5",
        }
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// A set of KPIs to compute.
///
/// ```
/// use keeper_kpi::engine::{KpiKind, KpiSet};
///
/// let set = KpiSet::empty().with(KpiKind::Reaction).with(KpiKind::Positional);
/// assert!(set.contains(KpiKind::Reaction));
/// assert!(!set.contains(KpiKind::Channels));
/// // Iteration follows PI numbering
/// assert_eq!(
///     set.iter().collect::<Vec<_>>(),
///     [KpiKind::Positional, KpiKind::Reaction]
/// );
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct KpiSet(u8);

impl KpiSet {
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub fn all() -> Self {
        KpiKind::ALL.into_iter().collect()
    }

    #[must_use]
    pub const fn with(self, kind: KpiKind) -> Self {
        Self(self.0 | kind.bit())
    }

    #[must_use]
    pub const fn contains(self, kind: KpiKind) -> bool {
        self.0 & kind.bit() != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = KpiKind> {
        KpiKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }

    pub(crate) const fn bits(self) -> u8 {
        self.0
    }
}

impl FromIterator<KpiKind> for KpiSet {
    fn from_iter<I: IntoIterator<Item = KpiKind>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl fmt::Debug for KpiSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(KpiKind::id)).finish()
    }
}

impl Serialize for KpiSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Results of one engine run. A `None` slot was not requested.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiReport {
    /// Number of frames in the analysed slice.
    pub row_count: usize,
    pub positional: Option<KpiResult<PositionalDistribution>>,
    pub displacement: Option<KpiResult<Displacement>>,
    pub threat_zones: Option<KpiResult<ThreatHeatmap>>,
    pub reaction: Option<KpiResult<ReactionIntensity>>,
    pub channels: Option<KpiResult<ThreatChannels>>,
}

impl KpiReport {
    fn empty(row_count: usize) -> Self {
        Self {
            row_count,
            positional: None,
            displacement: None,
            threat_zones: None,
            reaction: None,
            channels: None,
        }
    }

    /// KPIs present in this report.
    #[must_use]
    pub fn kinds(&self) -> KpiSet {
        KpiKind::ALL
            .into_iter()
            .filter(|kind| self.outcome(*kind).is_some())
            .collect()
    }

    /// The error of `kind`, if it was requested and failed.
    #[must_use]
    pub fn get_error(&self, kind: KpiKind) -> Option<&KpiError> {
        match self.outcome(kind)? {
            Outcome::Error(err) => Some(err),
            Outcome::Computed | Outcome::InsufficientData => None,
        }
    }

    /// Whether `kind` was requested and ended with insufficient data.
    #[must_use]
    pub fn is_insufficient(&self, kind: KpiKind) -> bool {
        matches!(self.outcome(kind), Some(Outcome::InsufficientData))
    }

    fn outcome(&self, kind: KpiKind) -> Option<Outcome<'_>> {
        match kind {
            KpiKind::Positional => self.positional.as_ref().map(Outcome::of),
            KpiKind::Displacement => self.displacement.as_ref().map(Outcome::of),
            KpiKind::ThreatZones => self.threat_zones.as_ref().map(Outcome::of),
            KpiKind::Reaction => self.reaction.as_ref().map(Outcome::of),
            KpiKind::Channels => self.channels.as_ref().map(Outcome::of),
        }
    }
}

enum Outcome<'a> {
    Computed,
    InsufficientData,
    Error(&'a KpiError),
}

impl<'a> Outcome<'a> {
    fn of<T>(result: &'a KpiResult<T>) -> Self {
        match result {
            Ok(KpiValue::Computed(_)) => Outcome::Computed,
            Ok(KpiValue::InsufficientData) => Outcome::InsufficientData,
            Err(err) => Outcome::Error(err),
        }
    }
}

/// Serialized form of a single KPI slot.
///
/// `{"status": "computed", "value": ...}`, `{"status": "insufficient_data"}`
/// or `{"status": "error", "message": "..."}`.
struct SlotView<'a, T>(&'a KpiResult<T>);

impl<T: Serialize> Serialize for SlotView<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Ok(value) => value.serialize(serializer),
            Err(err) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("status", "error")?;
                map.serialize_entry("message", &err.to_string())?;
                map.end()
            }
        }
    }
}

impl Serialize for KpiReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("row_count", &self.row_count)?;
        if let Some(slot) = &self.positional {
            map.serialize_entry(KpiKind::Positional.id(), &SlotView(slot))?;
        }
        if let Some(slot) = &self.displacement {
            map.serialize_entry(KpiKind::Displacement.id(), &SlotView(slot))?;
        }
        if let Some(slot) = &self.threat_zones {
            map.serialize_entry(KpiKind::ThreatZones.id(), &SlotView(slot))?;
        }
        if let Some(slot) = &self.reaction {
            map.serialize_entry(KpiKind::Reaction.id(), &SlotView(slot))?;
        }
        if let Some(slot) = &self.channels {
            map.serialize_entry(KpiKind::Channels.id(), &SlotView(slot))?;
        }
        map.end()
    }
}

/// Stateless KPI runner holding a validated configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiEngine {
    config: KpiConfig,
}

impl KpiEngine {
    pub fn new(config: KpiConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &KpiConfig {
        &self.config
    }

    /// Computes every KPI in `kpis` over `table`.
    #[must_use]
    pub fn compute(&self, table: &FrameTable, kpis: KpiSet) -> KpiReport {
        let started = Instant::now();
        let mut report = KpiReport::empty(table.len());
        let config = &self.config;
        let KpiReport {
            positional,
            displacement,
            threat_zones,
            reaction,
            channels,
            ..
        } = &mut report;

        thread::scope(|s| {
            if kpis.contains(KpiKind::Positional) {
                s.spawn(move || {
                    *positional = Some(timed(KpiKind::Positional, || {
                        positional_distribution(table, &config.density)
                    }));
                });
            }
            if kpis.contains(KpiKind::Displacement) {
                s.spawn(move || {
                    *displacement = Some(timed(KpiKind::Displacement, || {
                        distance_travelled(table)
                    }));
                });
            }
            if kpis.contains(KpiKind::ThreatZones) {
                s.spawn(move || {
                    *threat_zones = Some(timed(KpiKind::ThreatZones, || {
                        threat_frequency_by_zone(table, &config.heatmap)
                    }));
                });
            }
            if kpis.contains(KpiKind::Reaction) {
                s.spawn(move || {
                    *reaction = Some(timed(KpiKind::Reaction, || reaction_intensity(table)));
                });
            }
            if kpis.contains(KpiKind::Channels) {
                s.spawn(move || {
                    *channels = Some(timed(KpiKind::Channels, || {
                        threat_progression_channels(table)
                    }));
                });
            }
        });

        log::debug!(
            "computed {:?} over {} frames in {:?}",
            kpis,
            table.len(),
            started.elapsed()
        );
        report
    }
}

fn timed<T>(kind: KpiKind, f: impl FnOnce() -> KpiResult<T>) -> KpiResult<T> {
    let started = Instant::now();
    let result = f();
    match &result {
        Ok(KpiValue::Computed(_)) => {
            log::debug!("{kind} computed in {:?}", started.elapsed());
        }
        Ok(KpiValue::InsufficientData) => log::info!("{kind}: insufficient data"),
        Err(err) => log::warn!("{kind} failed: {err}"),
    }
    result
}
