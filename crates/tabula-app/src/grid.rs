// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::sync::Arc;

use crate::{
    CellEditorRegistry, CellValue, ColumnSpec, EventBus, FilterProjection, FilterSpec, GridCommand,
    GridError, GridEvent, GridResult, GridState, ParseError, Row, SortSpec, SubscriptionId,
    TabularDataStore,
};

/// What a display collaborator needs from any editable grid surface.
/// Row positions are always in visible coordinates.
pub trait GridView {
    fn title(&self) -> &str;
    fn columns(&self) -> &[ColumnSpec];
    fn row_count(&self) -> usize;
    fn display_at(&self, row: usize, column: usize) -> GridResult<String>;
    fn is_editable(&self, row: usize, column: usize) -> bool;
    fn set_value_at(&mut self, row: usize, column: usize, raw: &str) -> GridResult<()>;
    fn apply_filter(&mut self, spec: FilterSpec) -> GridResult<()>;
    fn clear_filter(&mut self);
    fn apply_sort(&mut self, spec: SortSpec) -> GridResult<()>;
    fn clear_sort(&mut self);
    fn state(&self) -> &GridState;

    /// Text an inline editor starts from.
    fn edit_text(&self, row: usize, column: usize) -> GridResult<String> {
        self.display_at(row, column)
    }

    /// Re-reads anything that may have changed behind the grid's back.
    fn refresh(&mut self) -> GridResult<()> {
        Ok(())
    }

    fn insert_row(&mut self) -> GridResult<Option<usize>> {
        Err(GridError::Unsupported("row insertion"))
    }

    fn delete_row(&mut self, _row: Option<usize>) -> GridResult<()> {
        Err(GridError::Unsupported("row deletion"))
    }

    fn clear(&mut self) -> GridResult<()> {
        Err(GridError::Unsupported("clearing"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisibleRow {
    Editable(usize),
    Summary,
}

/// One editable, filterable, sortable ledger grid: a [`TabularDataStore`]
/// seen through a [`FilterProjection`], with edits validated by a shared
/// [`CellEditorRegistry`].
///
/// The summary row is always the last visible row, whatever the filter or
/// sort.
#[derive(Debug)]
pub struct GridController {
    title: String,
    store: TabularDataStore,
    editors: Arc<CellEditorRegistry>,
    projection: FilterProjection,
    state: GridState,
    events: EventBus<GridEvent>,
}

impl GridController {
    pub fn new(
        title: impl Into<String>,
        store: TabularDataStore,
        editors: Arc<CellEditorRegistry>,
    ) -> Self {
        let projection = FilterProjection::new(&store);
        Self {
            title: title.into(),
            store,
            editors,
            projection,
            state: GridState::default(),
            events: EventBus::new(),
        }
    }

    pub fn store(&self) -> &TabularDataStore {
        &self.store
    }

    pub fn editable_rows(&self) -> &[Row] {
        self.store.rows()
    }

    pub fn editors(&self) -> &CellEditorRegistry {
        &self.editors
    }

    pub fn total_cents(&self) -> i64 {
        self.store.total_cents()
    }

    pub fn header(&self, column: usize) -> Option<&str> {
        self.store
            .columns()
            .get(column)
            .map(|column| column.label.as_str())
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&GridEvent) + 'static,
    {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Visible editable rows plus the summary row.
    pub fn visible_row_count(&self) -> usize {
        self.projection.visible_count() + 1
    }

    pub fn summary_position(&self) -> usize {
        self.projection.visible_count()
    }

    pub fn value_at(&self, position: usize, column: usize) -> GridResult<CellValue> {
        match self.locate(position)? {
            VisibleRow::Editable(row) => self.store.value_at(row, column),
            VisibleRow::Summary => self.store.value_at(self.store.summary_index(), column),
        }
    }

    pub fn is_filtered(&self) -> bool {
        self.state.is_filtered()
    }

    pub fn is_sorted(&self) -> bool {
        self.state.is_sorted()
    }

    /// Parses `raw` with the column's editor and writes it. On any failure
    /// the cell keeps its previous value.
    pub fn set_cell(&mut self, position: usize, column: usize, raw: &str) -> GridResult<()> {
        let row = match self.locate(position)? {
            VisibleRow::Summary => {
                return Err(GridError::ReadOnlyCell {
                    row: position,
                    column,
                });
            }
            VisibleRow::Editable(row) => row,
        };
        let spec = self
            .store
            .columns()
            .get(column)
            .ok_or(GridError::IndexOutOfRange {
                index: column,
                len: self.store.column_count(),
            })?;
        let value = match self.editors.parse(spec, raw) {
            Ok(value) => value,
            Err(ParseError::ReadOnly) => {
                return Err(GridError::ReadOnlyCell {
                    row: position,
                    column,
                });
            }
            Err(error) => return Err(error.into()),
        };

        let before = self.total_cents();
        self.store.set_value_at(row, column, value)?;
        self.projection.rebuild(&self.store);

        match self.projection.position_of(row) {
            Some(now) if now == position => {
                self.events.publish(&GridEvent::DataChanged { row: now, column });
            }
            _ => self.events.publish(&GridEvent::LayoutChanged),
        }
        self.publish_total(before);
        Ok(())
    }

    /// Adds a blank row directly after the last visible editable row.
    /// Returns its visible position, or `None` when the active filter
    /// hides it.
    pub fn add_row(&mut self) -> GridResult<Option<usize>> {
        let at = self
            .projection
            .visible_rows()
            .last()
            .map_or(self.store.editable_row_count(), |row| row + 1);
        let before = self.total_cents();
        let row = self.store.insert_row(at)?;
        self.projection.rebuild(&self.store);

        let position = self.projection.position_of(row);
        match position {
            Some(first) => self.events.publish(&GridEvent::RowsInserted { first, last: first }),
            None => self.events.publish(&GridEvent::LayoutChanged),
        }
        self.publish_total(before);
        Ok(position)
    }

    pub fn remove_row(&mut self, position: Option<usize>) -> GridResult<Row> {
        let position = position.ok_or(GridError::NoSelection)?;
        let row = match self.locate(position) {
            Ok(VisibleRow::Editable(row)) => row,
            Ok(VisibleRow::Summary) => return Err(GridError::NoSelection),
            Err(_) => {
                return Err(GridError::InvalidPosition {
                    position,
                    max: self.summary_position(),
                });
            }
        };

        let before = self.total_cents();
        let removed = self.store.delete_row(Some(row))?;
        self.projection.rebuild(&self.store);
        self.events.publish(&GridEvent::RowsRemoved {
            first: position,
            last: position,
        });
        self.publish_total(before);
        Ok(removed)
    }

    pub fn clear_rows(&mut self) {
        let before = self.total_cents();
        self.store.clear();
        self.projection.rebuild(&self.store);
        self.events.publish(&GridEvent::LayoutChanged);
        self.publish_total(before);
    }

    /// Appends a completed batch in one step, e.g. the result of a
    /// background import. Nothing is appended if any row has the wrong
    /// width.
    pub fn apply_batch(&mut self, rows: Vec<Row>) -> GridResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let before = self.total_cents();
        let appended = self.store.append_rows(rows)?;
        self.projection.rebuild(&self.store);
        self.events.publish(&GridEvent::LayoutChanged);
        self.publish_total(before);
        tracing::debug!(grid = %self.title, rows = appended.len(), "applied batch");
        Ok(appended.len())
    }

    pub fn filter(&mut self, spec: FilterSpec) -> GridResult<()> {
        self.check_column(spec.column)?;
        if self.state.dispatch(GridCommand::ApplyFilter(spec)).is_empty() {
            return self.projection.predicate_status().map_err(GridError::from);
        }
        let result = self
            .projection
            .set_predicate(self.state.filter_spec().cloned(), &self.store);
        self.events.publish(&GridEvent::LayoutChanged);
        result.map_err(GridError::from)
    }

    pub fn unfilter(&mut self) {
        if self.state.dispatch(GridCommand::ClearFilter).is_empty() {
            return;
        }
        // Clearing never fails to compile.
        let _ = self.projection.set_predicate(None, &self.store);
        self.events.publish(&GridEvent::LayoutChanged);
    }

    pub fn sort(&mut self, spec: SortSpec) -> GridResult<()> {
        self.check_column(spec.column)?;
        if self.state.dispatch(GridCommand::ApplySort(spec)).is_empty() {
            return Ok(());
        }
        self.projection.set_sort(Some(spec), &self.store);
        self.events.publish(&GridEvent::LayoutChanged);
        Ok(())
    }

    pub fn unsort(&mut self) {
        if self.state.dispatch(GridCommand::ClearSort).is_empty() {
            return;
        }
        self.projection.set_sort(None, &self.store);
        self.events.publish(&GridEvent::LayoutChanged);
    }

    pub fn mark_saved(&mut self) {
        self.store.mark_clean();
    }

    fn locate(&self, position: usize) -> GridResult<VisibleRow> {
        let visible = self.projection.visible_count();
        if position < visible {
            return self.projection.visible_row_at(position).map(VisibleRow::Editable);
        }
        if position == visible {
            return Ok(VisibleRow::Summary);
        }
        Err(GridError::IndexOutOfRange {
            index: position,
            len: visible + 1,
        })
    }

    fn check_column(&self, column: usize) -> GridResult<()> {
        if column >= self.store.column_count() {
            return Err(GridError::IndexOutOfRange {
                index: column,
                len: self.store.column_count(),
            });
        }
        Ok(())
    }

    fn publish_total(&mut self, before: i64) {
        let cents = self.total_cents();
        if cents == before {
            return;
        }
        self.events.publish(&GridEvent::DataChanged {
            row: self.summary_position(),
            column: self.store.summary().numeric_column(),
        });
        self.events.publish(&GridEvent::TotalChanged { cents });
    }
}

impl GridView for GridController {
    fn title(&self) -> &str {
        &self.title
    }

    fn columns(&self) -> &[ColumnSpec] {
        self.store.columns()
    }

    fn row_count(&self) -> usize {
        self.visible_row_count()
    }

    fn display_at(&self, row: usize, column: usize) -> GridResult<String> {
        let value = self.value_at(row, column)?;
        Ok(self.editors.format(&self.store.columns()[column], &value))
    }

    fn is_editable(&self, row: usize, column: usize) -> bool {
        let Ok(VisibleRow::Editable(_)) = self.locate(row) else {
            return false;
        };
        self.store
            .columns()
            .get(column)
            .is_some_and(|spec| !self.editors.editor_for(spec).is_read_only())
    }

    fn set_value_at(&mut self, row: usize, column: usize, raw: &str) -> GridResult<()> {
        self.set_cell(row, column, raw)
    }

    fn apply_filter(&mut self, spec: FilterSpec) -> GridResult<()> {
        self.filter(spec)
    }

    fn clear_filter(&mut self) {
        self.unfilter();
    }

    fn apply_sort(&mut self, spec: SortSpec) -> GridResult<()> {
        self.sort(spec)
    }

    fn clear_sort(&mut self) {
        self.unsort();
    }

    fn state(&self) -> &GridState {
        &self.state
    }

    fn insert_row(&mut self) -> GridResult<Option<usize>> {
        self.add_row()
    }

    fn delete_row(&mut self, row: Option<usize>) -> GridResult<()> {
        self.remove_row(row).map(|_| ())
    }

    fn clear(&mut self) -> GridResult<()> {
        self.clear_rows();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{GridController, GridView};
    use crate::{
        AggregateRow, CellEditorRegistry, CellValue, ColumnSpec, EditorKind, FilterSpec,
        GridError, GridEvent, MatchMode, ParseError, SortSpec, TabularDataStore, ValueKind,
    };
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    fn grid(rows: &[(&str, i64)]) -> GridController {
        let columns = vec![
            ColumnSpec::new("item", ValueKind::Text).with_label("Item"),
            ColumnSpec::new("amount", ValueKind::Currency).with_label("Amount"),
        ];
        let rows = rows
            .iter()
            .map(|(label, cents)| vec![CellValue::text(*label), CellValue::Currency(*cents)])
            .collect();
        let store = TabularDataStore::new(columns, AggregateRow::new("Total", 0, 1), rows)
            .expect("store should build");
        let editors = CellEditorRegistry::new().with("amount", EditorKind::currency());
        GridController::new("Ledger", store, Arc::new(editors))
    }

    fn recorder(grid: &mut GridController) -> Rc<RefCell<Vec<GridEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        grid.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        seen
    }

    #[test]
    fn edit_goes_through_editor_and_updates_total() {
        let mut grid = grid(&[("Rent", 100_000), ("Food", 20_000)]);
        let events = recorder(&mut grid);

        grid.set_value_at(1, 1, "$250.00").expect("valid amount");
        assert_eq!(grid.display_at(2, 1).as_deref(), Ok("$1250.00"));
        assert_eq!(
            *events.borrow(),
            vec![
                GridEvent::DataChanged { row: 1, column: 1 },
                GridEvent::DataChanged { row: 2, column: 1 },
                GridEvent::TotalChanged { cents: 125_000 },
            ]
        );
    }

    #[test]
    fn rejected_edit_keeps_old_value() {
        let mut grid = grid(&[("Rent", 100_000)]);
        assert_eq!(
            grid.set_value_at(0, 1, "a lot"),
            Err(GridError::Parse(ParseError::InvalidMoney))
        );
        assert_eq!(grid.display_at(0, 1).as_deref(), Ok("$1000.00"));
        assert!(!grid.store().is_dirty());
    }

    #[test]
    fn summary_row_stays_last_and_read_only() {
        let mut grid = grid(&[("Rent", 100), ("Gas", 200), ("Rental", 300)]);
        grid.filter(FilterSpec::new("Ren", MatchMode::Substring, 0))
            .expect("filter applies");
        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.display_at(2, 0).as_deref(), Ok("Total"));
        assert_eq!(grid.display_at(2, 1).as_deref(), Ok("$6.00"));
        assert!(!grid.is_editable(2, 0));
        assert_eq!(
            grid.set_value_at(2, 1, "1"),
            Err(GridError::ReadOnlyCell { row: 2, column: 1 })
        );
    }

    #[test]
    fn edits_address_visible_rows() {
        let mut grid = grid(&[("b", 100), ("a", 200), ("c", 300)]);
        grid.sort(SortSpec::asc(0)).expect("sort applies");
        grid.set_value_at(0, 1, "9").expect("valid amount");
        assert_eq!(grid.editable_rows()[1][1], CellValue::Currency(900));
    }

    #[test]
    fn insert_follows_last_visible_row() {
        let mut grid = grid(&[("Rent", 100), ("Gas", 200), ("Rental", 300), ("Phone", 400)]);
        grid.filter(FilterSpec::new("Ren", MatchMode::Substring, 0))
            .expect("filter applies");

        let position = grid.add_row().expect("insert succeeds");
        assert_eq!(position, None);
        assert_eq!(grid.editable_rows().len(), 5);
        assert!(grid.editable_rows()[3][0].is_null());

        grid.unfilter();
        assert_eq!(grid.add_row(), Ok(Some(5)));
        assert_eq!(grid.display_at(6, 0).as_deref(), Ok("Total"));
    }

    #[test]
    fn delete_without_selection_changes_nothing() {
        let mut grid = grid(&[("Rent", 100)]);
        assert_eq!(grid.delete_row(None), Err(GridError::NoSelection));
        assert_eq!(grid.delete_row(Some(1)), Err(GridError::NoSelection));
        assert_eq!(
            grid.delete_row(Some(5)),
            Err(GridError::InvalidPosition { position: 5, max: 1 })
        );
        assert_eq!(grid.row_count(), 2);
    }

    #[test]
    fn delete_removes_visible_row() {
        let mut grid = grid(&[("a", 100), ("b", 200), ("c", 300)]);
        grid.sort(SortSpec::desc(1)).expect("sort applies");
        let removed = grid.remove_row(Some(0)).expect("row deletes");
        assert_eq!(removed[0], CellValue::text("c"));
        assert_eq!(grid.total_cents(), 300);
    }

    #[test]
    fn invalid_regex_is_reported_and_hides_rows() {
        let mut grid = grid(&[("a", 1)]);
        assert_eq!(
            grid.filter(FilterSpec::new("[", MatchMode::RegularExpression, 0)),
            Err(GridError::Parse(ParseError::InvalidPattern))
        );
        assert_eq!(grid.row_count(), 1);
        assert!(grid.is_filtered());
        grid.unfilter();
        assert_eq!(grid.row_count(), 2);
    }

    #[test]
    fn reapplying_a_broken_pattern_reports_it_again() {
        let mut grid = grid(&[("a", 1)]);
        let broken = FilterSpec::new("(a", MatchMode::RegularExpression, 0);
        assert!(grid.filter(broken.clone()).is_err());
        assert_eq!(
            grid.filter(broken),
            Err(GridError::Parse(ParseError::InvalidPattern))
        );

        let fixed = FilterSpec::new("a", MatchMode::Substring, 0);
        grid.filter(fixed.clone()).expect("valid pattern applies");
        assert_eq!(grid.filter(fixed), Ok(()));
    }

    #[test]
    fn filter_column_must_exist() {
        let mut grid = grid(&[("a", 1)]);
        assert_eq!(
            grid.filter(FilterSpec::new("a", MatchMode::Substring, 7)),
            Err(GridError::IndexOutOfRange { index: 7, len: 2 })
        );
        assert!(!grid.is_filtered());
    }

    #[test]
    fn batch_is_atomic() {
        let mut grid = grid(&[("a", 1)]);
        let events = recorder(&mut grid);
        let bad = vec![vec![CellValue::text("b")]];
        assert_eq!(
            grid.apply_batch(bad),
            Err(GridError::ColumnCount { expected: 2, got: 1 })
        );
        assert!(events.borrow().is_empty());

        let good = vec![
            vec![CellValue::text("b"), CellValue::Currency(10)],
            vec![CellValue::text("c"), CellValue::Currency(20)],
        ];
        assert_eq!(grid.apply_batch(good), Ok(2));
        assert_eq!(grid.total_cents(), 31);
        assert!(events.borrow().contains(&GridEvent::TotalChanged { cents: 31 }));
    }

    #[test]
    fn clear_publishes_zero_total() {
        let mut grid = grid(&[("a", 100)]);
        let events = recorder(&mut grid);
        GridView::clear(&mut grid).expect("ledger clears");
        assert_eq!(grid.row_count(), 2);
        assert!(events.borrow().contains(&GridEvent::TotalChanged { cents: 0 }));
    }
}
