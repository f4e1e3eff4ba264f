// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use time::Date;

use crate::MatchMode;
use crate::validation::{format_cents, format_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Text,
    Currency,
    Date,
    Integer,
    Real,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Null,
    Text(String),
    Currency(i64),
    Date(Date),
    Integer(i64),
    Real(f64),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn blank(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Currency => Self::Currency(0),
            ValueKind::Text => Self::Text(String::new()),
            ValueKind::Date | ValueKind::Integer | ValueKind::Real => Self::Null,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Text(value) => value.clone(),
            Self::Currency(cents) => format_cents(*cents),
            Self::Date(value) => format_date(*value),
            Self::Integer(value) => value.to_string(),
            Self::Real(value) => value.to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(value) => value.is_empty(),
            _ => false,
        }
    }

    pub fn as_cents(&self) -> Option<i64> {
        match self {
            Self::Currency(cents) => Some(*cents),
            _ => None,
        }
    }

    /// Typed comparison used by sorting: numbers compare numerically, text
    /// compares case-insensitively, dates chronologically. Values of
    /// different families order numbers before dates before text.
    pub fn cmp_value(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(left), Some(right)) => return left.total_cmp(&right),
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => {}
        }

        match (self, other) {
            (Self::Date(left), Self::Date(right)) => left.cmp(right),
            (Self::Date(_), _) => Ordering::Less,
            (_, Self::Date(_)) => Ordering::Greater,
            (left, right) => left
                .display()
                .to_lowercase()
                .cmp(&right.display().to_lowercase()),
        }
    }

    fn numeric(&self) -> Option<f64> {
        match self {
            Self::Currency(cents) => Some(*cents as f64 / 100.0),
            Self::Integer(value) => Some(*value as f64),
            Self::Real(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

pub type Row = Vec<CellValue>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub label: String,
    pub kind: ValueKind,
    pub editable: bool,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            kind,
            editable: true,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerSide {
    Income,
    Expenses,
}

impl LedgerSide {
    pub const fn header(self) -> &'static str {
        match self {
            Self::Income => "Money In",
            Self::Expenses => "Money Out",
        }
    }

    pub const fn summary_label(self) -> &'static str {
        match self {
            Self::Income => "Total Income",
            Self::Expenses => "Total Expenses",
        }
    }

    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expenses => "expenses",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingKey {
    FilterSyntax,
    DeleteOriginalsAfterImport,
}

impl SettingKey {
    pub const ALL: [Self; 2] = [Self::FilterSyntax, Self::DeleteOriginalsAfterImport];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FilterSyntax => "ui.filter_syntax",
            Self::DeleteOriginalsAfterImport => "import.delete_originals",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ui.filter_syntax" => Some(Self::FilterSyntax),
            "import.delete_originals" => Some(Self::DeleteOriginalsAfterImport),
            _ => None,
        }
    }

    pub const fn expected_value_kind(self) -> SettingValueKind {
        match self {
            Self::FilterSyntax => SettingValueKind::Text,
            Self::DeleteOriginalsAfterImport => SettingValueKind::Bool,
        }
    }

    pub fn default_value(self) -> SettingValue {
        match self {
            Self::FilterSyntax => SettingValue::Text(MatchMode::default().label().to_owned()),
            Self::DeleteOriginalsAfterImport => SettingValue::Bool(false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingValueKind {
    Bool,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingValue {
    Bool(bool),
    Text(String),
}

impl SettingValue {
    pub fn parse_for_key(key: SettingKey, raw: &str) -> Option<Self> {
        match key.expected_value_kind() {
            SettingValueKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => Some(Self::Bool(true)),
                "0" | "false" | "off" | "no" => Some(Self::Bool(false)),
                _ => None,
            },
            SettingValueKind::Text if key == SettingKey::FilterSyntax => {
                MatchMode::parse(raw).map(|mode| Self::Text(mode.label().to_owned()))
            }
            SettingValueKind::Text => Some(Self::Text(raw.to_owned())),
        }
    }

    pub fn to_storage(&self, key: SettingKey) -> Option<String> {
        match (key.expected_value_kind(), self) {
            (SettingValueKind::Bool, Self::Bool(value)) => {
                Some(if *value { "true" } else { "false" }.to_owned())
            }
            (SettingValueKind::Text, Self::Text(value)) if key == SettingKey::FilterSyntax => {
                MatchMode::parse(value).map(|mode| mode.label().to_owned())
            }
            (SettingValueKind::Text, Self::Text(value)) => Some(value.clone()),
            _ => None,
        }
    }
}
