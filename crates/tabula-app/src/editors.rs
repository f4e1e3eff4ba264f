// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;
use time::Date;
use time::macros::date;

use crate::validation::{apply_mask, format_cents, format_date, parse_cents, parse_date};
use crate::{CellValue, ColumnSpec, ParseError, ValueKind};

pub const MAX_CURRENCY_CENTS: i64 = 10_000_000;
pub const MIN_EDIT_DATE: Date = date!(1752 - 09 - 14);
pub const MAX_EDIT_DATE: Date = date!(9999 - 12 - 31);
pub const PHONE_SKELETON: &str = "(999) 999-9999";

/// A column of another relation that a foreign key points into, plus the
/// column whose text stands in for the key on screen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ForeignKeyRef {
    pub relation: String,
    pub key_column: String,
    pub display_column: String,
}

impl ForeignKeyRef {
    pub fn new(
        relation: impl Into<String>,
        key_column: impl Into<String>,
        display_column: impl Into<String>,
    ) -> Self {
        Self {
            relation: relation.into(),
            key_column: key_column.into(),
            display_column: display_column.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorKind {
    Text,
    Integer,
    Real,
    Currency {
        min_cents: i64,
        max_cents: i64,
        allow_negative: bool,
    },
    Date {
        min: Date,
        max: Date,
    },
    Masked {
        skeleton: String,
    },
    /// Accepts a key of the referenced relation. Membership in the current
    /// key set is checked by the grid that owns the live relation.
    ForeignKey(ForeignKeyRef),
    ReadOnly,
}

static FALLBACK_TEXT: EditorKind = EditorKind::Text;
static FALLBACK_INTEGER: EditorKind = EditorKind::Integer;
static FALLBACK_REAL: EditorKind = EditorKind::Real;
static FALLBACK_READ_ONLY: EditorKind = EditorKind::ReadOnly;
static FALLBACK_CURRENCY: EditorKind = EditorKind::Currency {
    min_cents: 0,
    max_cents: MAX_CURRENCY_CENTS,
    allow_negative: false,
};
static FALLBACK_DATE: EditorKind = EditorKind::Date {
    min: MIN_EDIT_DATE,
    max: MAX_EDIT_DATE,
};

impl EditorKind {
    pub const fn currency() -> Self {
        Self::Currency {
            min_cents: 0,
            max_cents: MAX_CURRENCY_CENTS,
            allow_negative: false,
        }
    }

    pub const fn date() -> Self {
        Self::Date {
            min: MIN_EDIT_DATE,
            max: MAX_EDIT_DATE,
        }
    }

    pub fn phone() -> Self {
        Self::Masked {
            skeleton: PHONE_SKELETON.to_owned(),
        }
    }

    pub fn fallback_for(column: &ColumnSpec) -> &'static Self {
        if !column.editable {
            return &FALLBACK_READ_ONLY;
        }
        match column.kind {
            ValueKind::Text => &FALLBACK_TEXT,
            ValueKind::Integer => &FALLBACK_INTEGER,
            ValueKind::Real => &FALLBACK_REAL,
            ValueKind::Currency => &FALLBACK_CURRENCY,
            ValueKind::Date => &FALLBACK_DATE,
        }
    }

    pub const fn is_read_only(&self) -> bool {
        matches!(self, Self::ReadOnly)
    }

    /// Turns raw user input into a cell value. Never panics; malformed or
    /// out-of-range input comes back as a `ParseError`.
    pub fn parse(&self, raw: &str) -> Result<CellValue, ParseError> {
        match self {
            Self::Text => Ok(CellValue::Text(raw.to_owned())),
            Self::Integer => parse_integer(raw),
            Self::Real => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Ok(CellValue::Null);
                }
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .map(CellValue::Real)
                    .ok_or(ParseError::InvalidNumber)
            }
            Self::Currency {
                min_cents,
                max_cents,
                allow_negative,
            } => {
                let cents = parse_cents(raw, *allow_negative)?;
                let floor = if *allow_negative {
                    -*max_cents
                } else {
                    *min_cents
                };
                if cents < floor || cents > *max_cents {
                    return Err(ParseError::MoneyOutOfRange);
                }
                Ok(CellValue::Currency(cents))
            }
            Self::Date { min, max } => {
                if raw.trim().is_empty() {
                    return Ok(CellValue::Null);
                }
                let value = parse_date(raw)?;
                if value < *min || value > *max {
                    return Err(ParseError::DateOutOfRange);
                }
                Ok(CellValue::Date(value))
            }
            Self::Masked { skeleton } => apply_mask(skeleton, raw).map(CellValue::Text),
            Self::ForeignKey(_) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(ParseError::InvalidKey);
                }
                Ok(trimmed
                    .parse::<i64>()
                    .map(CellValue::Integer)
                    .unwrap_or_else(|_| CellValue::text(trimmed)))
            }
            Self::ReadOnly => Err(ParseError::ReadOnly),
        }
    }

    /// The text an editor is seeded with; `parse` accepts it back unchanged.
    pub fn format(&self, value: &CellValue) -> String {
        match (self, value) {
            (Self::Currency { .. }, CellValue::Currency(cents)) => format_cents(*cents),
            (Self::Date { .. }, CellValue::Date(date)) => format_date(*date),
            _ => value.display(),
        }
    }
}

fn parse_integer(raw: &str) -> Result<CellValue, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(CellValue::Null);
    }
    trimmed
        .parse::<i64>()
        .map(CellValue::Integer)
        .map_err(|_| ParseError::InvalidNumber)
}

/// Column name to editor mapping. Built once and shared read-only between
/// grids; columns without an entry get an editor derived from their kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellEditorRegistry {
    editors: BTreeMap<String, EditorKind>,
}

impl CellEditorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, kind: EditorKind) -> Self {
        self.insert(column, kind);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, kind: EditorKind) -> Option<EditorKind> {
        self.editors.insert(column.into(), kind)
    }

    pub fn get(&self, column: &str) -> Option<&EditorKind> {
        self.editors.get(column)
    }

    pub fn len(&self) -> usize {
        self.editors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.editors.is_empty()
    }

    /// Read-only columns stay read-only whatever was registered for them.
    pub fn editor_for(&self, column: &ColumnSpec) -> &EditorKind {
        if !column.editable {
            return &FALLBACK_READ_ONLY;
        }
        self.editors
            .get(&column.name)
            .unwrap_or_else(|| EditorKind::fallback_for(column))
    }

    pub fn parse(&self, column: &ColumnSpec, raw: &str) -> Result<CellValue, ParseError> {
        self.editor_for(column).parse(raw)
    }

    pub fn format(&self, column: &ColumnSpec, value: &CellValue) -> String {
        self.editor_for(column).format(value)
    }
}
