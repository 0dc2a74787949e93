//! Data quality summary of a frame table
//!
//! A quick look at what a table actually contains before running KPIs on it:
//! which schema columns are there, and how many of their cells are empty.

use serde::Serialize;

use crate::frame::{Column, FrameTable};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnQuality {
    pub column: Column,
    pub present: bool,
    /// Missing cells; always 0 for an absent column.
    pub nulls: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataQualityReport {
    pub rows: usize,
    /// One entry per schema column, in schema order.
    pub columns: Vec<ColumnQuality>,
    pub total_nulls: usize,
    pub missing_columns: Vec<Column>,
}

impl DataQualityReport {
    /// Summarizes `table`.
    ///
    /// ```
    /// use keeper_kpi::{
    ///     frame::{Column, FrameTable},
    ///     validation::DataQualityReport,
    /// };
    ///
    /// let table = FrameTable::default()
    ///     .with_numeric(Column::X0, vec![Some(0.1), None, None])
    ///     .unwrap();
    /// let report = DataQualityReport::from_table(&table);
    /// assert_eq!(report.rows, 3);
    /// assert_eq!(report.total_nulls, 2);
    /// assert!(report.missing_columns.contains(&Column::Y0));
    /// ```
    #[must_use]
    pub fn from_table(table: &FrameTable) -> Self {
        let columns = Column::ALL
            .into_iter()
            .map(|column| ColumnQuality {
                column,
                present: table.has(column),
                nulls: table
                    .numeric(column)
                    .map_or(0, |values| values.iter().filter(|v| v.is_none()).count()),
            })
            .collect::<Vec<_>>();
        let total_nulls = columns.iter().map(|c| c.nulls).sum();
        Self {
            rows: table.len(),
            columns,
            total_nulls,
            missing_columns: table.missing_columns(),
        }
    }

    /// Whether every schema column is present without gaps.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_columns.is_empty() && self.total_nulls == 0
    }

    #[must_use]
    pub fn column(&self, column: Column) -> Option<&ColumnQuality> {
        self.columns.iter().find(|c| c.column == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Context;

    #[test]
    fn test_empty_table() {
        let report = DataQualityReport::from_table(&FrameTable::default());
        assert_eq!(report.rows, 0);
        assert_eq!(report.columns.len(), Column::ALL.len());
        assert_eq!(report.missing_columns, Column::ALL.to_vec());
        assert!(!report.is_complete());
    }

    #[test]
    fn test_complete_table() {
        let mut table = FrameTable::default();
        for column in Column::NUMERIC {
            table = table.with_numeric(column, vec![Some(1.0), Some(2.0)]).unwrap();
        }
        let table = table
            .with_context(vec![Context::Match, Context::Training])
            .unwrap();
        let report = DataQualityReport::from_table(&table);
        assert!(report.is_complete());
        assert!(report.columns.iter().all(|c| c.present));
    }

    #[test]
    fn test_null_counts_per_column() {
        let table = FrameTable::default()
            .with_numeric(Column::BallX, vec![None, Some(1.0), None])
            .unwrap()
            .with_numeric(Column::BallY, vec![Some(0.0), None, Some(1.0)])
            .unwrap();
        let report = DataQualityReport::from_table(&table);
        assert_eq!(report.column(Column::BallX).unwrap().nulls, 2);
        assert_eq!(report.column(Column::BallY).unwrap().nulls, 1);
        assert_eq!(report.total_nulls, 3);
        let x0 = report.column(Column::X0).unwrap();
        assert!(!x0.present);
        assert_eq!(x0.nulls, 0);
    }

    #[test]
    fn test_serializes_column_names() {
        let table = FrameTable::default()
            .with_numeric(Column::X0, vec![None])
            .unwrap();
        let json = serde_json::to_value(DataQualityReport::from_table(&table)).unwrap();
        assert_eq!(json["columns"][0]["column"], "#x0");
        assert_eq!(json["columns"][0]["nulls"], 1);
        assert_eq!(json["missing_columns"][0], "#y0");
    }
}
