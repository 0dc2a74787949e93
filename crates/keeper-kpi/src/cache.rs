//! Content-addressed memoization of engine runs
//!
//! The engine itself is stateless. Callers that re-run the same analysis
//! (same slice, same configuration, same KPIs) can put a [`KpiCache`] in
//! front of it. Entries are keyed by a SHA-256 digest of the slice contents,
//! the configuration and the requested KPI set, so two equal slices share an
//! entry regardless of where they came from.
//!
//! A cached report is returned as-is: with unseeded sub-sampling a cache hit
//! repeats the density surface of the first run instead of drawing a new one.
//!
//! ```
//! use keeper_kpi::{
//!     cache::KpiCache,
//!     config::KpiConfig,
//!     engine::{KpiEngine, KpiSet},
//!     frame::{Column, FrameTable},
//! };
//!
//! let engine = KpiEngine::new(KpiConfig::default()).unwrap();
//! let table = FrameTable::default()
//!     .with_numeric(Column::X0, vec![Some(0.2)])
//!     .unwrap();
//! let cache = KpiCache::new();
//! let first = cache.get_or_compute(&engine, &table, KpiSet::all());
//! let second = cache.get_or_compute(&engine, &table.clone(), KpiSet::all());
//! assert!(std::sync::Arc::ptr_eq(&first, &second));
//! assert_eq!((cache.hits(), cache.misses()), (1, 1));
//! ```

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use sha2::{Digest as _, Sha256};

use crate::{
    config::KpiConfig,
    engine::{KpiEngine, KpiReport, KpiSet},
    frame::{Column, Context, FrameTable},
};

/// SHA-256 digest identifying an engine run.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    #[must_use]
    pub fn new(table: &FrameTable, config: &KpiConfig, kpis: KpiSet) -> Self {
        let mut hasher = Sha256::new();
        hash_table(&mut hasher, table);
        hash_config(&mut hasher, config);
        hasher.update([kpis.bits()]);
        Self(hasher.finalize().into())
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({self})")
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

fn hash_table(hasher: &mut Sha256, table: &FrameTable) {
    hasher.update((table.len() as u64).to_le_bytes());
    for column in Column::NUMERIC {
        let Some(values) = table.numeric(column) else {
            hasher.update([0_u8]);
            continue;
        };
        hasher.update([1_u8]);
        for value in values {
            match value {
                Some(v) => {
                    hasher.update([1_u8]);
                    hasher.update(v.to_bits().to_le_bytes());
                }
                None => hasher.update([0_u8]),
            }
        }
    }
    match table.contexts() {
        Some(labels) => {
            hasher.update([1_u8]);
            for label in labels {
                hasher.update([match label {
                    Context::Training => 0_u8,
                    Context::Match => 1,
                }]);
            }
        }
        None => hasher.update([0_u8]),
    }
}

fn hash_config(hasher: &mut Sha256, config: &KpiConfig) {
    let KpiConfig { heatmap, density } = config;
    hasher.update((heatmap.bins_x as u64).to_le_bytes());
    hasher.update((heatmap.bins_y as u64).to_le_bytes());
    for range in [heatmap.x_range, heatmap.y_range] {
        match range {
            Some((min, max)) => {
                hasher.update([1_u8]);
                hasher.update(min.to_bits().to_le_bytes());
                hasher.update(max.to_bits().to_le_bytes());
            }
            None => hasher.update([0_u8]),
        }
    }
    hasher.update(density.bandwidth.to_bits().to_le_bytes());
    hasher.update((density.grid_size as u64).to_le_bytes());
    hasher.update((density.max_samples as u64).to_le_bytes());
    match density.seed {
        Some(seed) => {
            hasher.update([1_u8]);
            hasher.update(seed.to_le_bytes());
        }
        None => hasher.update([0_u8]),
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, Arc<KpiReport>>,
    hits: u64,
    misses: u64,
}

/// Thread-safe report cache.
#[derive(Debug, Default)]
pub struct KpiCache {
    state: Mutex<CacheState>,
}

impl KpiCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        // Entries are only inserted whole, so a poisoned map is still consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached report for this run, computing it on a miss.
    ///
    /// The lock is not held while computing, so concurrent misses for the
    /// same key may both compute; the first stored report wins.
    pub fn get_or_compute(
        &self,
        engine: &KpiEngine,
        table: &FrameTable,
        kpis: KpiSet,
    ) -> Arc<KpiReport> {
        let key = CacheKey::new(table, engine.config(), kpis);
        {
            let mut state = self.state();
            if let Some(report) = state.entries.get(&key).cloned() {
                state.hits += 1;
                log::debug!("cache hit {key}");
                return report;
            }
            state.misses += 1;
        }

        log::debug!("cache miss {key}");
        let report = Arc::new(engine.compute(table, kpis));
        Arc::clone(self.state().entries.entry(key).or_insert(report))
    }

    #[must_use]
    pub fn hits(&self) -> u64 {
        self.state().hits
    }

    #[must_use]
    pub fn misses(&self) -> u64 {
        self.state().misses
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry and resets the counters.
    pub fn clear(&self) {
        *self.state() = CacheState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::KpiKind;

    fn table(xs: Vec<Option<f64>>) -> FrameTable {
        let ys = xs.iter().map(|x| x.map(|x| x * 2.0)).collect();
        FrameTable::default()
            .with_numeric(Column::X0, xs)
            .unwrap()
            .with_numeric(Column::Y0, ys)
            .unwrap()
    }

    fn engine() -> KpiEngine {
        let mut config = KpiConfig::default();
        config.density.grid_size = 4;
        KpiEngine::new(config).unwrap()
    }

    #[test]
    fn test_key_depends_on_content() {
        let config = KpiConfig::default();
        let a = CacheKey::new(&table(vec![Some(0.1), None]), &config, KpiSet::all());
        let b = CacheKey::new(&table(vec![Some(0.1), None]), &config, KpiSet::all());
        let c = CacheKey::new(&table(vec![Some(0.1), Some(0.0)]), &config, KpiSet::all());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string().len(), 64);
    }

    #[test]
    fn test_key_depends_on_config_and_kpis() {
        let t = table(vec![Some(0.1)]);
        let config = KpiConfig::default();
        let mut other = config.clone();
        other.heatmap.bins_x = 11;
        let base = CacheKey::new(&t, &config, KpiSet::all());
        assert_ne!(base, CacheKey::new(&t, &other, KpiSet::all()));
        assert_ne!(
            base,
            CacheKey::new(&t, &config, KpiSet::empty().with(KpiKind::Channels))
        );
    }

    #[test]
    fn test_key_depends_on_context() {
        let config = KpiConfig::default();
        let t = table(vec![Some(0.1)]);
        let labeled = t.clone().with_context(vec![Context::Training]).unwrap();
        assert_ne!(
            CacheKey::new(&t, &config, KpiSet::all()),
            CacheKey::new(&labeled, &config, KpiSet::all())
        );
    }

    #[test]
    fn test_hits_and_misses() {
        let cache = KpiCache::new();
        let engine = engine();
        let t = table(vec![Some(0.1), Some(0.7), Some(0.4)]);

        let first = cache.get_or_compute(&engine, &t, KpiSet::all());
        let second = cache.get_or_compute(&engine, &t, KpiSet::all());
        assert!(Arc::ptr_eq(&first, &second));
        let _ = cache.get_or_compute(&engine, &t, KpiSet::empty().with(KpiKind::Reaction));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.hits(), 0);
    }

    #[test]
    fn test_cached_report_matches_direct_run() {
        let cache = KpiCache::new();
        let engine = engine();
        let t = table(vec![Some(0.1), Some(0.7), Some(0.4)]);
        let set = KpiSet::empty()
            .with(KpiKind::Displacement)
            .with(KpiKind::Channels);
        let cached = cache.get_or_compute(&engine, &t, set);
        assert_eq!(*cached, engine.compute(&t, set));
    }
}
