//! Analysis context labelling
//!
//! Every frame belongs to exactly one [`Context`]. Tables that already carry
//! a context column keep their labels untouched; unlabelled tables are
//! treated as match data.
//!
//! ```
//! use keeper_kpi::{
//!     context::infer_context,
//!     frame::{Column, Context, FrameTable},
//! };
//!
//! let table = FrameTable::default()
//!     .with_numeric(Column::X0, vec![Some(0.2), Some(0.4)])
//!     .unwrap();
//! let labeled = infer_context(&table);
//! assert_eq!(labeled.contexts(), &[Context::Match, Context::Match]);
//! assert_eq!(labeled.select(Context::Training).len(), 0);
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::frame::{Column, Context, FrameTable};

/// Label given to every frame of a table without a context column.
pub const DEFAULT_CONTEXT: Context = Context::Match;

/// A frame table whose context column is guaranteed to exist.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledFrames {
    table: FrameTable,
}

/// Ensures `table` has a context column.
///
/// An existing column is passed through unchanged; otherwise every row is
/// labelled [`DEFAULT_CONTEXT`]. The input table is never modified.
#[must_use]
pub fn infer_context(table: &FrameTable) -> LabeledFrames {
    if table.has(Column::Context) {
        return LabeledFrames {
            table: table.clone(),
        };
    }
    log::debug!(
        "no context column, labelling {} frames as {DEFAULT_CONTEXT}",
        table.len()
    );
    LabeledFrames {
        table: table.clone().fill_context(DEFAULT_CONTEXT),
    }
}

impl LabeledFrames {
    #[must_use]
    pub fn table(&self) -> &FrameTable {
        &self.table
    }

    /// Context label of every frame.
    #[must_use]
    pub fn contexts(&self) -> &[Context] {
        self.table.contexts().unwrap_or_default()
    }

    /// Number of frames labelled `context`.
    #[must_use]
    pub fn count(&self, context: Context) -> usize {
        self.contexts().iter().filter(|c| **c == context).count()
    }

    /// The frames labelled `context`, in their original order.
    #[must_use]
    pub fn select(&self, context: Context) -> FrameTable {
        let indices = self
            .contexts()
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == context)
            .map(|(i, _)| i);
        self.table.take_rows(indices)
    }
}

/// The phase of the season an analysis is run for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum AnalysisPhase {
    #[display("Post-match")]
    PostMatch,
    Training,
}

impl AnalysisPhase {
    /// The frame context holding the data for this phase.
    #[must_use]
    pub fn data_context(self) -> Context {
        match self {
            AnalysisPhase::PostMatch => Context::Match,
            AnalysisPhase::Training => Context::Training,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown analysis phase {phase:?} (expected post-match or training)")]
pub struct ParsePhaseError {
    pub phase: String,
}

impl FromStr for AnalysisPhase {
    type Err = ParsePhaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let phase = s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "");
        match phase.as_str() {
            "postmatch" | "match" => Ok(AnalysisPhase::PostMatch),
            "training" => Ok(AnalysisPhase::Training),
            _ => Err(ParsePhaseError {
                phase: s.to_owned(),
            }),
        }
    }
}
