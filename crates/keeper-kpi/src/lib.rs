//! Spatio-temporal KPI engine for goalkeeper performance analysis
//!
//! This crate turns a table of tracking frames (goalkeeper position and
//! velocity, ball position) into five performance indicators:
//!
//! | KPI | Module           | Result                                   |
//! |-----|------------------|------------------------------------------|
//! | PI1 | [`positional`]   | mean position and a density surface      |
//! | PI2 | [`displacement`] | per-step and total distance travelled    |
//! | PI3 | [`threat_zone`]  | ball-position heatmap                    |
//! | PI4 | [`reaction`]     | per-frame speed with its mean and max    |
//! | PI5 | [`channel`]      | frames per lateral channel               |
//!
//! # Workflow
//!
//! 1. **Load** a column-oriented [`frame::RawTable`] and validate it into a
//!    [`frame::FrameTable`]
//! 2. **Slice** it by frame range ([`selection::FrameRange`])
//! 3. **Label** every frame with a context ([`context::infer_context`]) and
//!    keep the frames of the context under analysis
//! 4. **Compute** the KPIs with [`engine::KpiEngine`], optionally behind a
//!    [`cache::KpiCache`]
//!
//! Every KPI is a pure function of the slice it is given. A KPI whose
//! required columns are absent fails on its own with a [`outcome::KpiError`];
//! a KPI without usable observations reports
//! [`outcome::KpiValue::InsufficientData`].
//!
//! # Example
//!
//! ```
//! use keeper_kpi::{
//!     config::KpiConfig,
//!     context::infer_context,
//!     engine::{KpiEngine, KpiSet},
//!     frame::{Context, FrameTable, RawTable},
//!     selection::FrameRange,
//! };
//!
//! let raw: RawTable = serde_json::from_str(
//!     r##"{
//!         "#x0": [0.10, 0.12, 0.50, 0.55],
//!         "#y0": [0.20, 0.25, 0.30, 0.10],
//!         "#vx0": [3.0, 0.0, 1.0, 0.5],
//!         "#vy0": [4.0, 0.0, 1.0, 0.5],
//!         "#ball_x": [10.0, 12.0, 30.0, null],
//!         "#ball_y": [40.0, 38.0, 20.0, 22.0]
//!     }"##,
//! )
//! .unwrap();
//! let table = FrameTable::from_raw(raw).unwrap();
//! let slice = table.select_range(&FrameRange::default()).unwrap();
//! let matches = infer_context(&slice).select(Context::Match);
//!
//! let engine = KpiEngine::new(KpiConfig::default()).unwrap();
//! let report = engine.compute(&matches, KpiSet::all());
//! let pi3 = report.threat_zones.unwrap().unwrap().computed().unwrap();
//! assert_eq!(pi3.observations, 3);
//! ```

pub mod cache;
pub mod channel;
pub mod config;
pub mod context;
pub mod displacement;
pub mod engine;
pub mod frame;
pub mod outcome;
pub mod positional;
pub mod reaction;
pub mod selection;
pub mod threat_zone;
pub mod validation;
