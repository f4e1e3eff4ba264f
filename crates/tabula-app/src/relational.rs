// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;

use crate::validation::parse_date;
use crate::{
    CellEditorRegistry, CellValue, ColumnSpec, EditorKind, EventBus, FilterProjection, FilterSpec,
    ForeignKeyRef, GridCommand, GridError, GridEvent, GridResult, GridState, GridView, ParseError,
    Row, RowSource, SortSpec, SubscriptionId, ValueKind,
};

pub const UNRESOLVED_PLACEHOLDER: &str = "(unresolved)";

/// Narrow relational-access contract the browser consumes. One
/// implementation wraps a single database connection.
pub trait RelationalSource {
    /// Every row of `relation`, cells in the order of `columns`.
    fn select_all(&self, relation: &str, columns: &[&str]) -> Result<Vec<Row>>;
    /// Current `(key, label)` pairs of a referenced relation.
    fn key_labels(&self, reference: &ForeignKeyRef) -> Result<Vec<(CellValue, String)>>;
    fn update_cell(
        &self,
        relation: &str,
        key_column: &str,
        key: &CellValue,
        column: &str,
        value: &CellValue,
    ) -> Result<()>;
    /// Changes whenever any relation visible through this source changes.
    fn data_version(&self) -> Result<u64>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationColumn {
    pub name: String,
    pub label: String,
    pub kind: ValueKind,
    pub editable: bool,
    pub reference: Option<ForeignKeyRef>,
}

impl RelationColumn {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            kind,
            editable: true,
            reference: None,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn references(mut self, reference: ForeignKeyRef) -> Self {
        self.reference = Some(reference);
        self
    }
}

/// Which relation to browse and how its columns are shown. The first
/// column named `primary_key` is the row identity and is never editable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationSpec {
    pub relation: String,
    pub title: String,
    pub primary_key: String,
    pub columns: Vec<RelationColumn>,
}

impl RelationSpec {
    pub fn new(relation: impl Into<String>, primary_key: impl Into<String>) -> Self {
        let relation = relation.into();
        Self {
            title: relation.clone(),
            relation,
            primary_key: primary_key.into(),
            columns: Vec::new(),
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn column(mut self, column: RelationColumn) -> Self {
        self.columns.push(column);
        self
    }
}

#[derive(Debug, Clone, Default)]
struct KeyLabels {
    pairs: Vec<(CellValue, String)>,
    by_key: BTreeMap<String, String>,
}

impl KeyLabels {
    fn new(pairs: Vec<(CellValue, String)>) -> Self {
        let by_key = pairs
            .iter()
            .map(|(key, label)| (key.display(), label.clone()))
            .collect();
        Self { pairs, by_key }
    }

    /// A raw key wins over a label that happens to look like one.
    fn find_key(&self, raw: &str) -> Option<&CellValue> {
        self.pairs
            .iter()
            .find(|(key, _)| key.display() == raw)
            .or_else(|| self.pairs.iter().find(|(_, label)| label == raw))
            .map(|(key, _)| key)
    }
}

/// The loaded result set with its resolved labels, kept apart from the
/// projection so both can be borrowed at once.
#[derive(Debug, Clone, Default)]
struct RecordSet {
    records: Vec<Row>,
    labels: BTreeMap<usize, KeyLabels>,
    references: Vec<Option<ForeignKeyRef>>,
}

impl RecordSet {
    fn resolve(&self, column: usize, key: &CellValue) -> GridResult<String> {
        let unresolved = || GridError::UnresolvedReference {
            column,
            key: key.display(),
        };
        self.labels
            .get(&column)
            .and_then(|labels| labels.by_key.get(&key.display()))
            .cloned()
            .ok_or_else(unresolved)
    }

    fn display(&self, row: usize, column: usize) -> String {
        let Some(value) = self.records.get(row).and_then(|cells| cells.get(column)) else {
            return String::new();
        };
        if value.is_null() || !self.is_reference(column) {
            return value.display();
        }
        self.resolve(column, value)
            .unwrap_or_else(|_| UNRESOLVED_PLACEHOLDER.to_owned())
    }

    fn is_reference(&self, column: usize) -> bool {
        self.references.get(column).is_some_and(Option::is_some)
    }
}

impl RowSource for RecordSet {
    fn row_count(&self) -> usize {
        self.records.len()
    }

    fn display_text(&self, row: usize, column: usize) -> String {
        self.display(row, column)
    }

    fn sort_value(&self, row: usize, column: usize) -> CellValue {
        if self.is_reference(column) {
            let text = self.display(row, column);
            if text.is_empty() {
                return CellValue::Null;
            }
            return CellValue::Text(text);
        }
        self.records.as_slice().sort_value(row, column)
    }
}

/// A grid over a live relation. Foreign-key columns hold raw keys and show
/// the referenced relation's label; labels and records are re-read whenever
/// the source's data version moves.
pub struct RelationalBrowser<'a> {
    source: &'a dyn RelationalSource,
    spec: RelationSpec,
    columns: Vec<ColumnSpec>,
    key_index: usize,
    editors: Arc<CellEditorRegistry>,
    set: RecordSet,
    loaded_version: Option<u64>,
    projection: FilterProjection,
    state: GridState,
    events: EventBus<GridEvent>,
}

impl std::fmt::Debug for RelationalBrowser<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationalBrowser")
            .field("relation", &self.spec.relation)
            .field("records", &self.set.records.len())
            .field("loaded_version", &self.loaded_version)
            .finish()
    }
}

impl<'a> RelationalBrowser<'a> {
    pub fn open(
        source: &'a dyn RelationalSource,
        spec: RelationSpec,
        editors: Arc<CellEditorRegistry>,
    ) -> GridResult<Self> {
        let key_index = spec
            .columns
            .iter()
            .position(|column| column.name == spec.primary_key)
            .ok_or_else(|| {
                GridError::Backend(format!(
                    "relation {} does not list its primary key column {}",
                    spec.relation, spec.primary_key
                ))
            })?;
        let columns = spec
            .columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let mut out = ColumnSpec::new(column.name.clone(), column.kind)
                    .with_label(column.label.clone());
                out.editable = index != key_index && column.editable;
                out
            })
            .collect();
        let references = spec
            .columns
            .iter()
            .map(|column| column.reference.clone())
            .collect();

        let mut browser = Self {
            source,
            spec,
            columns,
            key_index,
            editors,
            set: RecordSet {
                references,
                ..RecordSet::default()
            },
            loaded_version: None,
            projection: FilterProjection::default(),
            state: GridState::default(),
            events: EventBus::new(),
        };
        browser.reload()?;
        Ok(browser)
    }

    pub fn relation(&self) -> &str {
        &self.spec.relation
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&GridEvent) + 'static,
    {
        self.events.subscribe(handler)
    }

    /// Raw stored value at a visible position; foreign keys come back as
    /// keys, not labels.
    pub fn raw_value_at(&self, position: usize, column: usize) -> GridResult<CellValue> {
        let row = self.projection.visible_row_at(position)?;
        self.set.records[row]
            .get(column)
            .cloned()
            .ok_or(GridError::IndexOutOfRange {
                index: column,
                len: self.columns.len(),
            })
    }

    pub fn resolve_foreign_key(&self, column: usize, key: &CellValue) -> GridResult<String> {
        if !self.set.is_reference(column) {
            return Err(GridError::Unsupported("label lookup on a plain column"));
        }
        self.set.resolve(column, key)
    }

    /// Re-reads records and labels if the source moved on since the last
    /// load. Returns whether anything was re-read.
    pub fn sync(&mut self) -> GridResult<bool> {
        let version = self.source.data_version().map_err(backend)?;
        if self.loaded_version == Some(version) {
            return Ok(false);
        }
        self.reload()?;
        self.events.publish(&GridEvent::LayoutChanged);
        Ok(true)
    }

    fn reload(&mut self) -> GridResult<()> {
        let names = self
            .spec
            .columns
            .iter()
            .map(|column| column.name.as_str())
            .collect::<Vec<_>>();
        let records = self
            .source
            .select_all(&self.spec.relation, &names)
            .map_err(backend)?;
        if let Some(row) = records.iter().find(|row| row.len() != self.columns.len()) {
            return Err(GridError::ColumnCount {
                expected: self.columns.len(),
                got: row.len(),
            });
        }

        let mut labels = BTreeMap::new();
        for (index, column) in self.spec.columns.iter().enumerate() {
            if let Some(reference) = &column.reference {
                let pairs = self.source.key_labels(reference).map_err(backend)?;
                labels.insert(index, KeyLabels::new(pairs));
            }
        }

        self.set.records = records
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&self.spec.columns)
                    .map(|(value, column)| coerce(column.kind, value))
                    .collect()
            })
            .collect();
        self.set.labels = labels;
        self.loaded_version = Some(self.source.data_version().map_err(backend)?);
        self.projection.rebuild(&self.set);
        tracing::debug!(
            relation = %self.spec.relation,
            records = self.set.records.len(),
            version = ?self.loaded_version,
            "loaded relation"
        );
        Ok(())
    }

    fn record_with_key(&self, key: &CellValue) -> Option<usize> {
        self.set
            .records
            .iter()
            .position(|record| record.get(self.key_index) == Some(key))
    }

    fn check_column(&self, column: usize) -> GridResult<()> {
        if column >= self.columns.len() {
            return Err(GridError::IndexOutOfRange {
                index: column,
                len: self.columns.len(),
            });
        }
        Ok(())
    }

    fn parse_edit(&self, column: usize, raw: &str) -> GridResult<CellValue> {
        let spec = &self.columns[column];
        if !spec.editable {
            return Err(ParseError::ReadOnly.into());
        }
        if let Some(reference) = &self.spec.columns[column].reference {
            let editor = EditorKind::ForeignKey(reference.clone());
            editor.parse(raw)?;
            let wanted = raw.trim().to_owned();
            return self
                .set
                .labels
                .get(&column)
                .and_then(|labels| labels.find_key(&wanted))
                .cloned()
                .ok_or(GridError::InvalidReference {
                    column,
                    key: wanted,
                });
        }
        Ok(self.editors.parse(spec, raw)?)
    }
}

impl GridView for RelationalBrowser<'_> {
    fn title(&self) -> &str {
        &self.spec.title
    }

    fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    fn row_count(&self) -> usize {
        self.projection.visible_count()
    }

    fn display_at(&self, row: usize, column: usize) -> GridResult<String> {
        self.check_column(column)?;
        let source_row = self.projection.visible_row_at(row)?;
        if self.set.is_reference(column) {
            return Ok(self.set.display(source_row, column));
        }
        let value = &self.set.records[source_row][column];
        Ok(self.editors.format(&self.columns[column], value))
    }

    fn edit_text(&self, row: usize, column: usize) -> GridResult<String> {
        if self.set.is_reference(column) {
            return self.raw_value_at(row, column).map(|value| value.display());
        }
        self.display_at(row, column)
    }

    fn is_editable(&self, row: usize, column: usize) -> bool {
        row < self.projection.visible_count()
            && self
                .columns
                .get(column)
                .is_some_and(|spec| spec.editable && !self.editors.editor_for(spec).is_read_only())
    }

    fn set_value_at(&mut self, row: usize, column: usize, raw: &str) -> GridResult<()> {
        self.check_column(column)?;
        // The caller addresses the row it was shown, so pin its key before
        // a reload can move positions around.
        let shown = self.projection.visible_row_at(row)?;
        let key = self.set.records[shown][self.key_index].clone();
        if column == self.key_index {
            return Err(GridError::ReadOnlyCell { row, column });
        }
        let source_row = if self.sync()? {
            self.record_with_key(&key).ok_or_else(|| {
                GridError::Backend(format!(
                    "{} row {} no longer exists",
                    self.spec.relation,
                    key.display()
                ))
            })?
        } else {
            shown
        };
        let position = self.projection.position_of(source_row);
        let value = match self.parse_edit(column, raw) {
            Err(GridError::Parse(ParseError::ReadOnly)) => {
                return Err(GridError::ReadOnlyCell { row, column });
            }
            other => other?,
        };

        self.source
            .update_cell(
                &self.spec.relation,
                &self.spec.primary_key,
                &key,
                &self.columns[column].name,
                &value,
            )
            .map_err(backend)?;
        tracing::debug!(
            relation = %self.spec.relation,
            key = %key.display(),
            column = %self.columns[column].name,
            "committed cell edit"
        );

        self.set.records[source_row][column] = value;
        self.projection.rebuild(&self.set);
        match (position, self.projection.position_of(source_row)) {
            (Some(before), Some(now)) if before == now => {
                self.events.publish(&GridEvent::DataChanged { row: now, column })
            }
            _ => self.events.publish(&GridEvent::LayoutChanged),
        }
        if let Ok(version) = self.source.data_version() {
            self.loaded_version = Some(version);
        }
        Ok(())
    }

    fn apply_filter(&mut self, spec: FilterSpec) -> GridResult<()> {
        self.check_column(spec.column)?;
        if self.state.dispatch(GridCommand::ApplyFilter(spec)).is_empty() {
            return self.projection.predicate_status().map_err(GridError::from);
        }
        let result = self
            .projection
            .set_predicate(self.state.filter_spec().cloned(), &self.set);
        self.events.publish(&GridEvent::LayoutChanged);
        result.map_err(GridError::from)
    }

    fn clear_filter(&mut self) {
        if self.state.dispatch(GridCommand::ClearFilter).is_empty() {
            return;
        }
        let _ = self.projection.set_predicate(None, &self.set);
        self.events.publish(&GridEvent::LayoutChanged);
    }

    fn apply_sort(&mut self, spec: SortSpec) -> GridResult<()> {
        self.check_column(spec.column)?;
        if self.state.dispatch(GridCommand::ApplySort(spec)).is_empty() {
            return Ok(());
        }
        self.projection.set_sort(Some(spec), &self.set);
        self.events.publish(&GridEvent::LayoutChanged);
        Ok(())
    }

    fn clear_sort(&mut self) {
        if self.state.dispatch(GridCommand::ClearSort).is_empty() {
            return;
        }
        self.projection.set_sort(None, &self.set);
        self.events.publish(&GridEvent::LayoutChanged);
    }

    fn state(&self) -> &GridState {
        &self.state
    }

    fn refresh(&mut self) -> GridResult<()> {
        self.sync().map(|_| ())
    }
}

fn backend(error: anyhow::Error) -> GridError {
    GridError::Backend(format!("{error:#}"))
}

/// Stored values arrive as plain SQL types; columns declared as currency or
/// date are lifted into their typed form when the stored value allows it.
fn coerce(kind: ValueKind, value: CellValue) -> CellValue {
    match (kind, value) {
        (ValueKind::Currency, CellValue::Integer(cents)) => CellValue::Currency(cents),
        (ValueKind::Currency, CellValue::Real(amount)) => {
            CellValue::Currency((amount * 100.0).round() as i64)
        }
        (ValueKind::Date, CellValue::Text(raw)) => match parse_date(&raw) {
            Ok(date) => CellValue::Date(date),
            Err(_) => CellValue::Text(raw),
        },
        (_, value) => value,
    }
}
