//! Positional frame range selection
//!
//! Callers narrow a frame table to a window of interest before handing it to
//! the engine: `start..end` stepping by `step`, like a Python slice. The
//! selected rows keep their relative order.

use serde::{Deserialize, Serialize};

use crate::frame::{Column, FrameTable};

/// A `start..end` window over frames, taking every `step`-th frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameRange {
    /// First frame (inclusive).
    pub start: usize,
    /// End of the window (exclusive). `None` means the end of the table.
    pub end: Option<usize>,
    /// Distance between selected frames. Must be at least 1.
    pub step: usize,
}

impl Default for FrameRange {
    fn default() -> Self {
        Self {
            start: 0,
            end: None,
            step: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum SelectionError {
    #[display("frame step must be at least 1")]
    ZeroStep,
}

impl FrameRange {
    #[must_use]
    pub fn new(start: usize, end: Option<usize>, step: usize) -> Self {
        Self { start, end, step }
    }

    /// Row indices selected from a table with `len` rows.
    ///
    /// `end` is clamped to `len`; a window starting at or past its end
    /// selects nothing.
    pub fn indices(&self, len: usize) -> Result<impl Iterator<Item = usize>, SelectionError> {
        if self.step == 0 {
            return Err(SelectionError::ZeroStep);
        }
        let end = self.end.map_or(len, |end| end.min(len));
        Ok((self.start..end).step_by(self.step))
    }
}

impl FrameTable {
    /// Rows of this table inside `range`, in their original order.
    ///
    /// ```
    /// use keeper_kpi::{
    ///     frame::{Column, FrameTable},
    ///     selection::FrameRange,
    /// };
    ///
    /// let x = (0..10).map(|i| Some(f64::from(i))).collect();
    /// let table = FrameTable::default().with_numeric(Column::X0, x).unwrap();
    /// let window = table.select_range(&FrameRange::new(2, Some(9), 3)).unwrap();
    /// assert_eq!(
    ///     window.numeric(Column::X0),
    ///     Some(&[Some(2.0), Some(5.0), Some(8.0)][..])
    /// );
    /// ```
    pub fn select_range(&self, range: &FrameRange) -> Result<FrameTable, SelectionError> {
        Ok(self.take_rows(range.indices(self.len())?))
    }

    /// Rows in which every listed numeric column holds a value, in their
    /// original order. Columns absent from the table do not filter anything.
    #[must_use]
    pub fn complete_rows(&self, columns: &[Column]) -> FrameTable {
        let present = columns
            .iter()
            .filter_map(|column| self.numeric(*column))
            .collect::<Vec<_>>();
        self.take_rows(
            (0..self.len()).filter(|row| present.iter().all(|values| values[*row].is_some())),
        )
    }
}
