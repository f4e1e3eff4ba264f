// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::ops::Range;

use crate::{AggregateRow, CellValue, ColumnSpec, GridError, GridResult, Row, RowSource};

/// In-memory rows of one ledger-style grid. The last row is always the
/// summary row: derived from the editable rows, never stored, never edited.
#[derive(Debug, Clone)]
pub struct TabularDataStore {
    columns: Vec<ColumnSpec>,
    rows: Vec<Row>,
    summary: AggregateRow,
    skipped: Vec<GridError>,
    dirty: bool,
}

impl TabularDataStore {
    /// An empty `rows` starts the store with a single blank placeholder row.
    pub fn new(columns: Vec<ColumnSpec>, summary: AggregateRow, rows: Vec<Row>) -> GridResult<Self> {
        if summary.numeric_column() >= columns.len() {
            return Err(GridError::IndexOutOfRange {
                index: summary.numeric_column(),
                len: columns.len(),
            });
        }
        check_widths(&rows, columns.len())?;

        let mut store = Self {
            columns,
            rows,
            summary,
            skipped: Vec::new(),
            dirty: false,
        };
        if store.rows.is_empty() {
            store.rows.push(store.blank_row());
        }
        store.recompute();
        Ok(store)
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Editable rows plus the summary row.
    pub fn row_count(&self) -> usize {
        self.rows.len() + 1
    }

    pub fn editable_row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn summary_index(&self) -> usize {
        self.rows.len()
    }

    pub fn is_summary(&self, row: usize) -> bool {
        row == self.summary_index()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn summary(&self) -> &AggregateRow {
        &self.summary
    }

    pub fn total_cents(&self) -> i64 {
        self.summary.total_cents()
    }

    /// Cells the last recomputation could not read as currency.
    pub fn skipped(&self) -> &[GridError] {
        &self.skipped
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn value_at(&self, row: usize, column: usize) -> GridResult<CellValue> {
        self.check_cell(row, column)?;
        if self.is_summary(row) {
            return Ok(self.summary.cell(column));
        }
        Ok(self.rows[row][column].clone())
    }

    pub fn set_value_at(&mut self, row: usize, column: usize, value: CellValue) -> GridResult<()> {
        self.check_cell(row, column)?;
        if self.is_summary(row) || !self.columns[column].editable {
            return Err(GridError::ReadOnlyCell { row, column });
        }
        self.rows[row][column] = value;
        self.touch();
        Ok(())
    }

    /// Inserts a blank row at `at`; `at == row_count() - 1` lands directly
    /// above the summary row. Returns the new row's index.
    pub fn insert_row(&mut self, at: usize) -> GridResult<usize> {
        if at > self.summary_index() {
            return Err(GridError::InvalidPosition {
                position: at,
                max: self.summary_index(),
            });
        }
        let blank = self.blank_row();
        self.rows.insert(at, blank);
        self.touch();
        Ok(at)
    }

    pub fn delete_row(&mut self, at: Option<usize>) -> GridResult<Row> {
        let Some(at) = at else {
            return Err(GridError::NoSelection);
        };
        if at > self.summary_index() {
            return Err(GridError::InvalidPosition {
                position: at,
                max: self.summary_index(),
            });
        }
        if self.is_summary(at) {
            return Err(GridError::NoSelection);
        }
        let removed = self.rows.remove(at);
        self.touch();
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.rows = vec![self.blank_row()];
        self.touch();
    }

    /// Appends every row or none of them.
    pub fn append_rows(&mut self, rows: Vec<Row>) -> GridResult<Range<usize>> {
        check_widths(&rows, self.columns.len())?;
        let first = self.rows.len();
        self.rows.extend(rows);
        self.touch();
        Ok(first..self.rows.len())
    }

    pub fn blank_row(&self) -> Row {
        self.columns
            .iter()
            .map(|column| CellValue::blank(column.kind))
            .collect()
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.skipped = self.summary.recompute(&self.rows).skipped;
    }

    fn check_cell(&self, row: usize, column: usize) -> GridResult<()> {
        if row >= self.row_count() {
            return Err(GridError::IndexOutOfRange {
                index: row,
                len: self.row_count(),
            });
        }
        if column >= self.column_count() {
            return Err(GridError::IndexOutOfRange {
                index: column,
                len: self.column_count(),
            });
        }
        Ok(())
    }
}

fn check_widths(rows: &[Row], expected: usize) -> GridResult<()> {
    match rows.iter().find(|row| row.len() != expected) {
        Some(row) => Err(GridError::ColumnCount {
            expected,
            got: row.len(),
        }),
        None => Ok(()),
    }
}

impl RowSource for TabularDataStore {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn display_text(&self, row: usize, column: usize) -> String {
        self.rows.as_slice().display_text(row, column)
    }

    fn sort_value(&self, row: usize, column: usize) -> CellValue {
        self.rows.as_slice().sort_value(row, column)
    }
}

#[cfg(test)]
mod tests {
    use super::TabularDataStore;
    use crate::{AggregateRow, CellValue, ColumnSpec, GridError, ValueKind};

    fn ledger(rows: &[(&str, &str)]) -> TabularDataStore {
        let columns = vec![
            ColumnSpec::new("item", ValueKind::Text),
            ColumnSpec::new("amount", ValueKind::Currency),
        ];
        let rows = rows
            .iter()
            .map(|(label, amount)| vec![CellValue::text(*label), CellValue::text(*amount)])
            .collect();
        TabularDataStore::new(columns, AggregateRow::new("Total", 0, 1), rows)
            .expect("ledger should build")
    }

    #[test]
    fn summary_row_recomputes() {
        let store = ledger(&[("A", "$10.00"), ("B", "$5.00")]);
        assert_eq!(store.row_count(), 3);
        assert_eq!(store.value_at(2, 0), Ok(CellValue::text("Total")));
        assert_eq!(store.value_at(2, 1).map(|value| value.display()), Ok("$15.00".to_owned()));
        assert!(!store.is_dirty());
    }

    #[test]
    fn summary_row_is_read_only() {
        let mut store = ledger(&[("A", "$1.00")]);
        assert_eq!(
            store.set_value_at(1, 1, CellValue::Currency(5)),
            Err(GridError::ReadOnlyCell { row: 1, column: 1 })
        );
        assert_eq!(store.total_cents(), 100);
        assert!(!store.is_dirty());
    }

    #[test]
    fn non_editable_column_is_read_only() {
        let columns = vec![
            ColumnSpec::new("id", ValueKind::Integer).read_only(),
            ColumnSpec::new("amount", ValueKind::Currency),
        ];
        let mut store =
            TabularDataStore::new(columns, AggregateRow::new("Total", 0, 1), Vec::new())
                .expect("store should build");
        assert_eq!(
            store.set_value_at(0, 0, CellValue::Integer(1)),
            Err(GridError::ReadOnlyCell { row: 0, column: 0 })
        );
    }

    #[test]
    fn out_of_range_reads_fail() {
        let store = ledger(&[("A", "$1.00")]);
        assert_eq!(
            store.value_at(2, 0),
            Err(GridError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(
            store.value_at(0, 2),
            Err(GridError::IndexOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn insert_and_delete_keep_summary_last() {
        let mut store = ledger(&[("A", "$1.00"), ("B", "$2.00")]);

        assert_eq!(store.insert_row(2), Ok(2));
        assert_eq!(store.row_count(), 4);
        assert_eq!(store.value_at(3, 0), Ok(CellValue::text("Total")));
        assert_eq!(
            store.insert_row(4),
            Err(GridError::InvalidPosition { position: 4, max: 3 })
        );

        assert_eq!(store.delete_row(Some(3)), Err(GridError::NoSelection));
        assert_eq!(store.delete_row(None), Err(GridError::NoSelection));
        assert_eq!(
            store.delete_row(Some(9)),
            Err(GridError::InvalidPosition { position: 9, max: 3 })
        );
        assert_eq!(store.row_count(), 4);

        let removed = store.delete_row(Some(0)).expect("row 0 deletes");
        assert_eq!(removed[0], CellValue::text("A"));
        assert_eq!(store.total_cents(), 200);
        assert!(store.is_dirty());
    }

    #[test]
    fn clear_leaves_one_blank_row() {
        let mut store = ledger(&[("A", "$1.00"), ("B", "$2.00")]);
        store.clear();
        assert_eq!(store.row_count(), 2);
        assert_eq!(store.total_cents(), 0);
        assert_eq!(store.value_at(0, 1), Ok(CellValue::Currency(0)));
    }

    #[test]
    fn malformed_cells_are_skipped_not_fatal() {
        let store = ledger(&[("A", "$3.00"), ("B", "lots")]);
        assert_eq!(store.total_cents(), 300);
        assert_eq!(
            store.skipped(),
            &[GridError::MalformedCurrency {
                row: 1,
                raw: "lots".to_owned(),
            }]
        );
    }

    #[test]
    fn append_is_all_or_nothing() {
        let mut store = ledger(&[("A", "$1.00")]);
        let bad = vec![
            vec![CellValue::text("B"), CellValue::Currency(100)],
            vec![CellValue::text("C")],
        ];
        assert_eq!(
            store.append_rows(bad),
            Err(GridError::ColumnCount { expected: 2, got: 1 })
        );
        assert_eq!(store.editable_row_count(), 1);

        let good = vec![
            vec![CellValue::text("B"), CellValue::Currency(100)],
            vec![CellValue::text("C"), CellValue::Currency(250)],
        ];
        assert_eq!(store.append_rows(good), Ok(1..3));
        assert_eq!(store.total_cents(), 450);
    }
}
