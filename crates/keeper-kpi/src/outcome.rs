//! KPI results and errors
//!
//! A KPI either fails with a [`KpiError`] (the caller broke a contract, e.g.
//! a required column is absent) or produces a [`KpiValue`]. Having no usable
//! observations is an expected situation, not an error: it is reported as
//! [`KpiValue::InsufficientData`] so the remaining KPIs and the caller carry on.

use keeper_stats::histogram::HistogramError;
use serde::Serialize;

use crate::{
    config::ConfigError,
    frame::{Column, MissingColumnError},
};

/// Value of a KPI computed over a frame slice.
#[derive(Debug, Clone, PartialEq, Serialize, derive_more::IsVariant)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum KpiValue<T> {
    Computed(T),
    /// The slice holds no valid observation of the KPI's inputs.
    InsufficientData,
}

impl<T> KpiValue<T> {
    #[must_use]
    pub fn computed(self) -> Option<T> {
        match self {
            KpiValue::Computed(value) => Some(value),
            KpiValue::InsufficientData => None,
        }
    }

    #[must_use]
    pub fn as_computed(&self) -> Option<&T> {
        match self {
            KpiValue::Computed(value) => Some(value),
            KpiValue::InsufficientData => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum KpiError {
    #[display("{_0}")]
    MissingColumn(MissingColumnError),
    #[display("invalid configuration: {_0}")]
    Config(ConfigError),
    #[display("histogram construction failed: {_0}")]
    Histogram(HistogramError),
    /// A step-wise KPI received a slice with gaps it cannot bridge.
    #[display("column {column} has no value at row {row}; drop incomplete rows first")]
    #[from(skip)]
    IncompleteRows { column: Column, row: usize },
}

pub type KpiResult<T> = Result<KpiValue<T>, KpiError>;
