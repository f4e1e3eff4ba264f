// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;

use crate::validation::wildcard_to_regex;
use crate::{CellValue, GridError, GridResult, ParseError, Row, SortDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    Substring,
    Wildcard,
    FixedString,
    RegularExpression,
}

impl MatchMode {
    pub const ALL: [Self; 4] = [
        Self::Substring,
        Self::Wildcard,
        Self::FixedString,
        Self::RegularExpression,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Substring => "substring",
            Self::Wildcard => "wildcard",
            Self::FixedString => "fixed string",
            Self::RegularExpression => "regular expression",
        }
    }

    /// Reads a stored label back, ignoring case and surrounding blanks.
    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|mode| mode.label() == wanted)
    }

    pub fn next(self) -> Self {
        let index = Self::ALL
            .iter()
            .position(|mode| *mode == self)
            .unwrap_or_default();
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub pattern: String,
    pub mode: MatchMode,
    pub column: usize,
    pub case_sensitive: bool,
}

impl FilterSpec {
    pub fn new(pattern: impl Into<String>, mode: MatchMode, column: usize) -> Self {
        Self {
            pattern: pattern.into(),
            mode,
            column,
            case_sensitive: true,
        }
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: usize,
    pub direction: SortDirection,
}

impl SortSpec {
    pub const fn asc(column: usize) -> Self {
        Self {
            column,
            direction: SortDirection::Asc,
        }
    }

    pub const fn desc(column: usize) -> Self {
        Self {
            column,
            direction: SortDirection::Desc,
        }
    }
}

/// The rows a projection reads through. Only editable rows are exposed;
/// summary rows never take part in filtering or sorting.
pub trait RowSource {
    fn row_count(&self) -> usize;
    /// Text the filter predicate is matched against.
    fn display_text(&self, row: usize, column: usize) -> String;
    /// Typed value the sort key is taken from.
    fn sort_value(&self, row: usize, column: usize) -> CellValue;
}

impl RowSource for [Row] {
    fn row_count(&self) -> usize {
        self.len()
    }

    fn display_text(&self, row: usize, column: usize) -> String {
        self.get(row)
            .and_then(|cells| cells.get(column))
            .map(CellValue::display)
            .unwrap_or_default()
    }

    fn sort_value(&self, row: usize, column: usize) -> CellValue {
        self.get(row)
            .and_then(|cells| cells.get(column))
            .cloned()
            .unwrap_or(CellValue::Null)
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Contains { needle: String, fold: bool },
    Equals { needle: String, fold: bool },
    Pattern(Regex),
    Nothing,
}

impl Matcher {
    fn compile(spec: &FilterSpec) -> Result<Self, ParseError> {
        let fold = !spec.case_sensitive;
        let needle = if fold {
            spec.pattern.to_lowercase()
        } else {
            spec.pattern.clone()
        };
        match spec.mode {
            MatchMode::Substring => Ok(Self::Contains { needle, fold }),
            MatchMode::FixedString => Ok(Self::Equals { needle, fold }),
            MatchMode::Wildcard => build_regex(&wildcard_to_regex(&spec.pattern), fold),
            MatchMode::RegularExpression => build_regex(&spec.pattern, fold),
        }
    }

    fn matches(&self, text: &str) -> bool {
        match self {
            Self::Contains { needle, fold: true } => text.to_lowercase().contains(needle.as_str()),
            Self::Contains { needle, fold: false } => text.contains(needle.as_str()),
            Self::Equals { needle, fold: true } => text.to_lowercase() == *needle,
            Self::Equals { needle, fold: false } => text == needle,
            Self::Pattern(regex) => regex.is_match(text),
            Self::Nothing => false,
        }
    }
}

fn build_regex(pattern: &str, fold: bool) -> Result<Matcher, ParseError> {
    RegexBuilder::new(pattern)
        .case_insensitive(fold)
        .build()
        .map(Matcher::Pattern)
        .map_err(|_| ParseError::InvalidPattern)
}

/// Read-through index over a [`RowSource`]: maps visible positions to
/// source rows under an optional filter and an optional stable sort.
///
/// The visible list is rebuilt in full whenever the predicate, the sort,
/// or the source changes.
#[derive(Debug, Clone, Default)]
pub struct FilterProjection {
    filter: Option<FilterSpec>,
    matcher: Option<Matcher>,
    predicate_error: Option<ParseError>,
    sort: Option<SortSpec>,
    visible: Vec<usize>,
}

impl FilterProjection {
    pub fn new(source: &(impl RowSource + ?Sized)) -> Self {
        let mut projection = Self::default();
        projection.rebuild(source);
        projection
    }

    /// Replaces the predicate and rebuilds. A pattern that does not compile
    /// leaves a predicate that matches nothing and reports `InvalidPattern`.
    pub fn set_predicate(
        &mut self,
        spec: Option<FilterSpec>,
        source: &(impl RowSource + ?Sized),
    ) -> Result<(), ParseError> {
        let compiled = spec.as_ref().map(Matcher::compile).transpose();
        let result = match compiled {
            Ok(matcher) => {
                self.matcher = matcher;
                self.predicate_error = None;
                Ok(())
            }
            Err(error) => {
                self.matcher = Some(Matcher::Nothing);
                self.predicate_error = Some(error);
                Err(error)
            }
        };
        self.filter = spec;
        self.rebuild(source);
        result
    }

    pub fn set_sort(&mut self, sort: Option<SortSpec>, source: &(impl RowSource + ?Sized)) {
        self.sort = sort;
        self.rebuild(source);
    }

    pub fn filter(&self) -> Option<&FilterSpec> {
        self.filter.as_ref()
    }

    pub fn sort(&self) -> Option<SortSpec> {
        self.sort
    }

    /// The error the current predicate failed to compile with, if any.
    pub fn predicate_status(&self) -> Result<(), ParseError> {
        self.predicate_error.map_or(Ok(()), Err)
    }

    pub fn rebuild(&mut self, source: &(impl RowSource + ?Sized)) {
        let rows = source.row_count();
        self.visible = match (&self.filter, &self.matcher) {
            (Some(spec), Some(matcher)) => (0..rows)
                .filter(|row| matcher.matches(&source.display_text(*row, spec.column)))
                .collect(),
            _ => (0..rows).collect(),
        };

        if let Some(sort) = self.sort {
            let mut keyed = self
                .visible
                .iter()
                .map(|row| (*row, source.sort_value(*row, sort.column)))
                .collect::<Vec<_>>();
            keyed.sort_by(|(_, left), (_, right)| compare_sort_values(left, right, sort.direction));
            self.visible = keyed.into_iter().map(|(row, _)| row).collect();
        }

        tracing::debug!(
            rows,
            visible = self.visible.len(),
            filtered = self.filter.is_some(),
            sorted = self.sort.is_some(),
            "rebuilt projection"
        );
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    pub fn visible_rows(&self) -> &[usize] {
        &self.visible
    }

    pub fn visible_row_at(&self, position: usize) -> GridResult<usize> {
        self.visible
            .get(position)
            .copied()
            .ok_or(GridError::IndexOutOfRange {
                index: position,
                len: self.visible.len(),
            })
    }

    pub fn position_of(&self, source_row: usize) -> Option<usize> {
        self.visible.iter().position(|row| *row == source_row)
    }
}

/// Nulls sort last in either direction; `sort_by` keeps ties in source order.
fn compare_sort_values(left: &CellValue, right: &CellValue, direction: SortDirection) -> Ordering {
    match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ordering = left.cmp_value(right);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
    }
}
