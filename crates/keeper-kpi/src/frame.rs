//! Typed frame table and its input schema
//!
//! A frame table holds one row per sampled time instant. Row order is the
//! implicit time axis, so every operation that derives a new table from an
//! existing one keeps the relative order of the rows it retains.
//!
//! # Schema
//!
//! | Column            | Name              | Kind    |
//! |-------------------|-------------------|---------|
//! | [`Column::X0`]    | `#x0`             | numeric |
//! | [`Column::Y0`]    | `#y0`             | numeric |
//! | [`Column::Vx0`]   | `#vx0`            | numeric |
//! | [`Column::Vy0`]   | `#vy0`            | numeric |
//! | [`Column::BallX`] | `#ball_x`         | numeric |
//! | [`Column::BallY`] | `#ball_y`         | numeric |
//! | [`Column::Context`] | `context` / `contexto` | label |
//!
//! Every column is optional at the table level. Numeric cells may be missing
//! (`null`); context labels may not. Operations that need a column check for
//! it with [`FrameTable::require`], which reports every absent column of the
//! request in a single [`MissingColumnError`].
//!
//! # Input format
//!
//! [`RawTable`] is the serde-facing, column-oriented form:
//!
//! ```json
//! {
//!   "#x0": [0.12, 0.15, null],
//!   "#y0": [0.50, 0.52, 0.49],
//!   "contexto": ["Jogo", "Jogo", "Treino"]
//! }
//! ```
//!
//! ```
//! use keeper_kpi::frame::{Column, Context, FrameTable, RawTable};
//!
//! let raw: RawTable = serde_json::from_str(
//!     r##"{"#x0": [0.1, null], "#y0": [0.5, 0.6], "contexto": ["Jogo", "Treino"]}"##,
//! )
//! .unwrap();
//! let table = FrameTable::from_raw(raw).unwrap();
//! assert_eq!(table.len(), 2);
//! assert_eq!(table.numeric(Column::X0), Some(&[Some(0.1), None][..]));
//! assert_eq!(table.contexts(), Some(&[Context::Match, Context::Training][..]));
//! assert!(table.require(&[Column::X0, Column::BallX]).is_err());
//! ```

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// A column of the frame schema.
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
    Deserialize,
    derive_more::Display,
)]
pub enum Column {
    /// Goalkeeper position, x (lateral) coordinate.
    #[serde(rename = "#x0")]
    #[display("#x0")]
    X0,
    /// Goalkeeper position, y coordinate.
    #[serde(rename = "#y0")]
    #[display("#y0")]
    Y0,
    /// Goalkeeper velocity, x component.
    #[serde(rename = "#vx0")]
    #[display("#vx0")]
    Vx0,
    /// Goalkeeper velocity, y component.
    #[serde(rename = "#vy0")]
    #[display("#vy0")]
    Vy0,
    /// Ball position, x coordinate.
    #[serde(rename = "#ball_x")]
    #[display("#ball_x")]
    BallX,
    /// Ball position, y coordinate.
    #[serde(rename = "#ball_y")]
    #[display("#ball_y")]
    BallY,
    /// Analysis context label.
    #[serde(rename = "context", alias = "contexto")]
    #[display("context")]
    Context,
}

impl Column {
    /// Every schema column, in schema order.
    pub const ALL: [Column; 7] = [
        Column::X0,
        Column::Y0,
        Column::Vx0,
        Column::Vy0,
        Column::BallX,
        Column::BallY,
        Column::Context,
    ];

    /// The numeric schema columns.
    pub const NUMERIC: [Column; 6] = [
        Column::X0,
        Column::Y0,
        Column::Vx0,
        Column::Vy0,
        Column::BallX,
        Column::BallY,
    ];

    /// Input names accepted for this column, preferred name first.
    #[must_use]
    pub fn names(self) -> &'static [&'static str] {
        match self {
            Column::X0 => &["#x0"],
            Column::Y0 => &["#y0"],
            Column::Vx0 => &["#vx0"],
            Column::Vy0 => &["#vy0"],
            Column::BallX => &["#ball_x"],
            Column::BallY => &["#ball_y"],
            Column::Context => &["context", "contexto"],
        }
    }

    #[must_use]
    pub fn is_numeric(self) -> bool {
        self != Column::Context
    }
}

/// Analysis context of a frame.
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
    Deserialize,
    derive_more::Display,
)]
pub enum Context {
    Training,
    Match,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown context label {label:?} (expected Training/Treino or Match/Jogo)")]
pub struct ParseContextError {
    pub label: String,
}

impl FromStr for Context {
    type Err = ParseContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        if ["training", "treino"]
            .iter()
            .any(|name| label.eq_ignore_ascii_case(name))
        {
            Ok(Context::Training)
        } else if ["match", "jogo"]
            .iter()
            .any(|name| label.eq_ignore_ascii_case(name))
        {
            Ok(Context::Match)
        } else {
            Err(ParseContextError {
                label: s.to_owned(),
            })
        }
    }
}

/// A point on the pitch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// One or more required columns are absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, derive_more::Display, derive_more::Error)]
#[display("missing required column(s): {}", ColumnList(missing))]
pub struct MissingColumnError {
    pub missing: Vec<Column>,
}

struct ColumnList<'a>(&'a [Column]);

impl fmt::Display for ColumnList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, column) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{column}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum TableError {
    #[display("column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: Column,
        expected: usize,
        actual: usize,
    },
    #[display("column '{column}' has the wrong type (expected {expected})")]
    ColumnType {
        column: Column,
        expected: &'static str,
    },
    #[display("invalid context label {label:?} at row {row}")]
    InvalidContextLabel { row: usize, label: String },
}

/// Column-oriented table as it arrives from the loading layer.
///
/// Columns outside the schema are kept here but ignored by
/// [`FrameTable::from_raw`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTable {
    pub columns: BTreeMap<String, RawColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawColumn {
    Numeric(Vec<Option<f64>>),
    Labels(Vec<Option<String>>),
}

/// A validated, column-oriented frame table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameTable {
    len: usize,
    numeric: BTreeMap<Column, Vec<Option<f64>>>,
    context: Option<Vec<Context>>,
}

impl FrameTable {
    /// Validates a raw table against the schema.
    ///
    /// Absent schema columns are not an error here; they are reported by the
    /// operations that need them.
    pub fn from_raw(mut raw: RawTable) -> Result<Self, TableError> {
        let mut table = FrameTable::default();
        for column in Column::ALL {
            let Some(values) = column
                .names()
                .iter()
                .find_map(|name| raw.columns.remove(*name))
            else {
                continue;
            };
            table = match (column, values) {
                (Column::Context, RawColumn::Labels(labels)) => {
                    let labels = parse_labels(labels)?;
                    table.with_context(labels)?
                }
                // Empty and all-null label columns deserialize as numeric
                (Column::Context, RawColumn::Numeric(values)) if values.is_empty() => {
                    table.with_context(Vec::new())?
                }
                (Column::Context, RawColumn::Numeric(values)) => {
                    return Err(match values.iter().position(Option::is_none) {
                        Some(row) => TableError::InvalidContextLabel {
                            row,
                            label: "null".to_owned(),
                        },
                        None => TableError::ColumnType {
                            column,
                            expected: "labels",
                        },
                    });
                }
                (_, RawColumn::Numeric(values)) => table.with_numeric(column, values)?,
                (_, RawColumn::Labels(_)) => {
                    return Err(TableError::ColumnType {
                        column,
                        expected: "numbers",
                    });
                }
            };
        }
        Ok(table)
    }

    /// Adds (or replaces) a numeric column.
    pub fn with_numeric(
        mut self,
        column: Column,
        values: Vec<Option<f64>>,
    ) -> Result<Self, TableError> {
        if !column.is_numeric() {
            return Err(TableError::ColumnType {
                column,
                expected: "labels",
            });
        }
        self.check_len(column, values.len())?;
        self.numeric.insert(column, values);
        Ok(self)
    }

    /// Adds (or replaces) the context column.
    pub fn with_context(mut self, labels: Vec<Context>) -> Result<Self, TableError> {
        self.check_len(Column::Context, labels.len())?;
        self.context = Some(labels);
        Ok(self)
    }

    fn check_len(&mut self, column: Column, actual: usize) -> Result<(), TableError> {
        let other_columns = self.numeric.keys().filter(|c| **c != column).count()
            + usize::from(self.context.is_some() && column != Column::Context);
        if other_columns == 0 {
            self.len = actual;
            return Ok(());
        }
        if actual != self.len {
            return Err(TableError::LengthMismatch {
                column,
                expected: self.len,
                actual,
            });
        }
        Ok(())
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `column` is present.
    #[must_use]
    pub fn has(&self, column: Column) -> bool {
        match column {
            Column::Context => self.context.is_some(),
            _ => self.numeric.contains_key(&column),
        }
    }

    /// Values of a numeric column, `None` if the column is absent.
    #[must_use]
    pub fn numeric(&self, column: Column) -> Option<&[Option<f64>]> {
        self.numeric.get(&column).map(Vec::as_slice)
    }

    /// Context labels, `None` if the column is absent.
    #[must_use]
    pub fn contexts(&self) -> Option<&[Context]> {
        self.context.as_deref()
    }

    /// Checks that every column in `columns` is present.
    ///
    /// All absent columns are listed in the error, in request order.
    pub fn require(&self, columns: &[Column]) -> Result<(), MissingColumnError> {
        let missing = columns
            .iter()
            .copied()
            .filter(|column| !self.has(*column))
            .collect::<Vec<_>>();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(MissingColumnError { missing })
        }
    }

    /// Values of a numeric column that must be present.
    pub fn required_numeric(&self, column: Column) -> Result<&[Option<f64>], MissingColumnError> {
        self.numeric(column).ok_or_else(|| MissingColumnError {
            missing: vec![column],
        })
    }

    /// Row-aligned pairs from two numeric columns that must both be present.
    pub fn required_pairs(
        &self,
        first: Column,
        second: Column,
    ) -> Result<Vec<(Option<f64>, Option<f64>)>, MissingColumnError> {
        if let (Some(a), Some(b)) = (self.numeric(first), self.numeric(second)) {
            return Ok(a.iter().copied().zip(b.iter().copied()).collect());
        }
        Err(MissingColumnError {
            missing: [first, second]
                .into_iter()
                .filter(|column| !self.has(*column))
                .collect(),
        })
    }

    /// Schema columns absent from this table.
    #[must_use]
    pub fn missing_columns(&self) -> Vec<Column> {
        Column::ALL
            .into_iter()
            .filter(|column| !self.has(*column))
            .collect()
    }

    /// Sets every row's context label to `context`.
    pub(crate) fn fill_context(mut self, context: Context) -> Self {
        self.context = Some(vec![context; self.len]);
        self
    }

    /// A new table holding the rows at `indices`, in the given order.
    pub(crate) fn take_rows<I>(&self, indices: I) -> FrameTable
    where
        I: IntoIterator<Item = usize>,
    {
        let indices = indices.into_iter().collect::<Vec<_>>();
        let numeric = self
            .numeric
            .iter()
            .map(|(column, values)| (*column, indices.iter().map(|&i| values[i]).collect()))
            .collect();
        let context = self
            .context
            .as_ref()
            .map(|labels| indices.iter().map(|&i| labels[i]).collect());
        FrameTable {
            len: indices.len(),
            numeric,
            context,
        }
    }
}

fn parse_labels(labels: Vec<Option<String>>) -> Result<Vec<Context>, TableError> {
    labels
        .into_iter()
        .enumerate()
        .map(|(row, label)| {
            let label = label.ok_or_else(|| TableError::InvalidContextLabel {
                row,
                label: "null".to_owned(),
            })?;
            label
                .parse()
                .map_err(|ParseContextError { label }| TableError::InvalidContextLabel { row, label })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawTable {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_context_aliases() {
        assert_eq!("Treino".parse::<Context>().unwrap(), Context::Training);
        assert_eq!("jogo".parse::<Context>().unwrap(), Context::Match);
        assert_eq!(" MATCH ".parse::<Context>().unwrap(), Context::Match);
        assert!("friendly".parse::<Context>().is_err());
        assert_eq!(Context::Match.to_string(), "Match");
    }

    #[test]
    fn test_from_raw_reads_schema_columns() {
        let table = FrameTable::from_raw(raw(
            r##"{"#x0": [1, 2, 3], "#ball_x": [null, 0.5, 1.0], "other": ["a", "b", "c"]}"##,
        ))
        .unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.numeric(Column::X0), Some(&[Some(1.0), Some(2.0), Some(3.0)][..]));
        assert_eq!(table.numeric(Column::BallX).unwrap()[0], None);
        assert!(!table.has(Column::Context));
        assert_eq!(
            table.missing_columns(),
            vec![
                Column::Y0,
                Column::Vx0,
                Column::Vy0,
                Column::BallY,
                Column::Context
            ]
        );
    }

    #[test]
    fn test_from_raw_length_mismatch() {
        let err = FrameTable::from_raw(raw(r##"{"#x0": [1, 2, 3], "#y0": [1, 2]}"##)).unwrap_err();
        assert_eq!(
            err,
            TableError::LengthMismatch {
                column: Column::Y0,
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_from_raw_rejects_bad_labels() {
        let err = FrameTable::from_raw(raw(r#"{"context": ["Match", "Cup"]}"#)).unwrap_err();
        assert_eq!(
            err,
            TableError::InvalidContextLabel {
                row: 1,
                label: "Cup".to_owned()
            }
        );

        let err = FrameTable::from_raw(raw(r#"{"contexto": [null, null]}"#)).unwrap_err();
        assert!(matches!(err, TableError::InvalidContextLabel { row: 0, .. }));
    }

    #[test]
    fn test_from_raw_empty_labelled_table() {
        let table =
            FrameTable::from_raw(raw(r##"{"#x0": [], "#y0": [], "contexto": []}"##)).unwrap();
        assert!(table.is_empty());
        assert!(table.has(Column::Context));
        assert_eq!(table.contexts(), Some(&[][..]));
        assert_eq!(crate::context::infer_context(&table).table(), &table);
    }

    #[test]
    fn test_from_raw_rejects_text_in_numeric_column() {
        let err = FrameTable::from_raw(raw(r##"{"#vx0": ["fast"]}"##)).unwrap_err();
        assert!(matches!(
            err,
            TableError::ColumnType {
                column: Column::Vx0,
                ..
            }
        ));
    }

    #[test]
    fn test_require_lists_every_missing_column() {
        let table = FrameTable::default()
            .with_numeric(Column::X0, vec![Some(0.0)])
            .unwrap();
        let err = table
            .require(&[Column::X0, Column::Vx0, Column::Vy0])
            .unwrap_err();
        assert_eq!(err.missing, vec![Column::Vx0, Column::Vy0]);
        assert_eq!(
            err.to_string(),
            "missing required column(s): #vx0, #vy0"
        );
    }

    #[test]
    fn test_with_numeric_length_checked_against_context() {
        let table = FrameTable::default()
            .with_context(vec![Context::Match; 2])
            .unwrap();
        let err = table
            .with_numeric(Column::X0, vec![Some(1.0)])
            .unwrap_err();
        assert!(matches!(err, TableError::LengthMismatch { .. }));
    }

    #[test]
    fn test_replacing_only_column_resets_length() {
        let table = FrameTable::default()
            .with_numeric(Column::X0, vec![Some(1.0)])
            .unwrap()
            .with_numeric(Column::X0, vec![Some(1.0), Some(2.0)])
            .unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_take_rows_keeps_order() {
        let table = FrameTable::default()
            .with_numeric(Column::X0, vec![Some(0.0), Some(1.0), Some(2.0), Some(3.0)])
            .unwrap()
            .with_context(vec![
                Context::Match,
                Context::Training,
                Context::Match,
                Context::Training,
            ])
            .unwrap();
        let taken = table.take_rows([1, 3]);
        assert_eq!(taken.len(), 2);
        assert_eq!(taken.numeric(Column::X0), Some(&[Some(1.0), Some(3.0)][..]));
        assert_eq!(
            taken.contexts(),
            Some(&[Context::Training, Context::Training][..])
        );
    }

    #[test]
    fn test_point_distance() {
        assert!((Point::new(0.0, 0.0).distance(Point::new(3.0, 4.0)) - 5.0).abs() < 1e-12);
    }
}
