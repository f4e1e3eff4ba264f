// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    InvalidMoney,
    NegativeMoney,
    MoneyOutOfRange,
    InvalidNumber,
    InvalidDate,
    DateOutOfRange,
    MaskMismatch,
    InvalidKey,
    InvalidPattern,
    ReadOnly,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMoney => f.write_str("invalid money value"),
            Self::NegativeMoney => f.write_str("negative money value"),
            Self::MoneyOutOfRange => f.write_str("money value out of range"),
            Self::InvalidNumber => f.write_str("invalid number"),
            Self::InvalidDate => f.write_str("invalid date value; use YYYY-MM-DD"),
            Self::DateOutOfRange => f.write_str("date value out of range"),
            Self::MaskMismatch => f.write_str("value does not fit the input mask"),
            Self::InvalidKey => f.write_str("invalid key value"),
            Self::InvalidPattern => f.write_str("invalid filter pattern"),
            Self::ReadOnly => f.write_str("column is read-only"),
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    IndexOutOfRange { index: usize, len: usize },
    InvalidPosition { position: usize, max: usize },
    ReadOnlyCell { row: usize, column: usize },
    NoSelection,
    MalformedCurrency { row: usize, raw: String },
    Parse(ParseError),
    UnresolvedReference { column: usize, key: String },
    InvalidReference { column: usize, key: String },
    ColumnCount { expected: usize, got: usize },
    Unsupported(&'static str),
    Backend(String),
}

impl std::fmt::Display for GridError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} is out of range for {len} entries")
            }
            Self::InvalidPosition { position, max } => {
                write!(f, "position {position} is invalid; expected 0..={max}")
            }
            Self::ReadOnlyCell { row, column } => {
                write!(f, "cell ({row}, {column}) is read-only")
            }
            Self::NoSelection => f.write_str("no row selected"),
            Self::MalformedCurrency { row, raw } => {
                write!(f, "row {row} holds malformed currency {raw:?}")
            }
            Self::Parse(error) => write!(f, "{error}"),
            Self::UnresolvedReference { column, key } => {
                write!(f, "column {column} references missing key {key}")
            }
            Self::InvalidReference { column, key } => {
                write!(f, "key {key} does not exist for column {column}")
            }
            Self::ColumnCount { expected, got } => {
                write!(f, "row has {got} cells; expected {expected}")
            }
            Self::Unsupported(operation) => write!(f, "{operation} is not supported here"),
            Self::Backend(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for GridError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(error) => Some(error),
            _ => None,
        }
    }
}

impl From<ParseError> for GridError {
    fn from(error: ParseError) -> Self {
        Self::Parse(error)
    }
}

pub type GridResult<T> = std::result::Result<T, GridError>;
