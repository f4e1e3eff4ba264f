// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cell::RefCell;
use std::rc::Rc;

use crate::validation::{format_cents, parse_cents};
use crate::{CellValue, EventBus, GridError, LedgerSide, Row, SubscriptionId, ValueKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateOutcome {
    pub total_cents: i64,
    pub skipped: Vec<GridError>,
}

/// The read-only summary row of a ledger: a label plus the sum of one
/// numeric column over every editable row. Currency sums are held in cents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRow {
    label: String,
    label_column: usize,
    numeric_column: usize,
    kind: ValueKind,
    total_cents: i64,
}

impl AggregateRow {
    pub fn new(label: impl Into<String>, label_column: usize, numeric_column: usize) -> Self {
        Self {
            label: label.into(),
            label_column,
            numeric_column,
            kind: ValueKind::Currency,
            total_cents: 0,
        }
    }

    /// Sums a plain integer column instead of a currency one.
    pub fn counting(label: impl Into<String>, label_column: usize, numeric_column: usize) -> Self {
        Self {
            kind: ValueKind::Integer,
            ..Self::new(label, label_column, numeric_column)
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn numeric_column(&self) -> usize {
        self.numeric_column
    }

    pub fn total_cents(&self) -> i64 {
        self.total_cents
    }

    pub fn total_display(&self) -> String {
        self.total_cell().display()
    }

    pub fn recompute(&mut self, rows: &[Row]) -> AggregateOutcome {
        let outcome = match self.kind {
            ValueKind::Integer => sum_integers(rows, self.numeric_column),
            _ => sum_currency(rows, self.numeric_column),
        };
        self.total_cents = outcome.total_cents;
        outcome
    }

    pub fn cell(&self, column: usize) -> CellValue {
        if column == self.numeric_column {
            self.total_cell()
        } else if column == self.label_column {
            CellValue::Text(self.label.clone())
        } else {
            CellValue::Null
        }
    }

    fn total_cell(&self) -> CellValue {
        match self.kind {
            ValueKind::Integer => CellValue::Integer(self.total_cents),
            _ => CellValue::Currency(self.total_cents),
        }
    }
}

/// Sums `column` across `rows`. Cells that cannot be read as currency are
/// skipped and reported; blank cells count as zero.
pub fn sum_currency(rows: &[Row], column: usize) -> AggregateOutcome {
    let mut total_cents = 0i64;
    let mut skipped = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let parsed = match row.get(column) {
            Some(CellValue::Currency(cents)) => Some(*cents),
            Some(CellValue::Null) | None => None,
            Some(CellValue::Text(raw)) if raw.trim().is_empty() => None,
            Some(CellValue::Text(raw)) => match parse_cents(raw, true) {
                Ok(cents) => Some(cents),
                Err(_) => {
                    skipped.push(malformed(index, raw));
                    None
                }
            },
            Some(other) => {
                skipped.push(malformed(index, &other.display()));
                None
            }
        };
        if let Some(cents) = parsed {
            total_cents = total_cents.saturating_add(cents);
        }
    }

    AggregateOutcome {
        total_cents,
        skipped,
    }
}

fn sum_integers(rows: &[Row], column: usize) -> AggregateOutcome {
    let mut total_cents = 0i64;
    let mut skipped = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        match row.get(column) {
            Some(CellValue::Integer(value)) => total_cents = total_cents.saturating_add(*value),
            Some(cell) if cell.is_null() => {}
            Some(other) => skipped.push(malformed(index, &other.display())),
            None => {}
        }
    }
    AggregateOutcome {
        total_cents,
        skipped,
    }
}

fn malformed(row: usize, raw: &str) -> GridError {
    tracing::warn!(row, raw, "skipping malformed currency cell");
    GridError::MalformedCurrency {
        row,
        raw: raw.to_owned(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemainingChanged {
    pub income_cents: i64,
    pub expense_cents: i64,
    pub remaining_cents: i64,
}

/// Difference aggregate shared by an income and an expense ledger.
///
/// Each ledger is handed a [`SharedTotals`] at construction and publishes its
/// total into it; subscribers hear about every change of the remainder.
/// Handlers receive the new figures in the event and must not borrow the
/// shared cell again.
#[derive(Debug, Default)]
pub struct RunningTotals {
    income_cents: i64,
    expense_cents: i64,
    bus: EventBus<RemainingChanged>,
}

pub type SharedTotals = Rc<RefCell<RunningTotals>>;

impl RunningTotals {
    pub fn shared() -> SharedTotals {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn label() -> &'static str {
        "Income Minus Expenses"
    }

    pub fn publish(&mut self, side: LedgerSide, cents: i64) {
        let previous = self.remaining_cents();
        match side {
            LedgerSide::Income => self.income_cents = cents,
            LedgerSide::Expenses => self.expense_cents = cents,
        }
        if self.remaining_cents() != previous {
            let event = RemainingChanged {
                income_cents: self.income_cents,
                expense_cents: self.expense_cents,
                remaining_cents: self.remaining_cents(),
            };
            self.bus.publish(&event);
        }
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&RemainingChanged) + 'static,
    {
        self.bus.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn income_cents(&self) -> i64 {
        self.income_cents
    }

    pub fn expense_cents(&self) -> i64 {
        self.expense_cents
    }

    pub fn remaining_cents(&self) -> i64 {
        self.income_cents.saturating_sub(self.expense_cents)
    }

    pub fn remaining_display(&self) -> String {
        format_cents(self.remaining_cents())
    }
}

#[cfg(test)]
mod tests {
    use super::{AggregateRow, RunningTotals, sum_currency};
    use crate::{CellValue, GridError, LedgerSide};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn sums_parseable_cells_and_skips_malformed() {
        let rows = vec![
            vec![CellValue::text("A"), CellValue::text("$10.00")],
            vec![CellValue::text("B"), CellValue::Currency(500)],
            vec![CellValue::text("C"), CellValue::text("ten dollars")],
            vec![CellValue::text("D"), CellValue::text("")],
        ];

        let outcome = sum_currency(&rows, 1);
        assert_eq!(outcome.total_cents, 1_500);
        assert_eq!(
            outcome.skipped,
            vec![GridError::MalformedCurrency {
                row: 2,
                raw: "ten dollars".to_owned(),
            }]
        );
    }

    #[test]
    fn summary_cells_carry_label_and_total() {
        let mut aggregate = AggregateRow::new("Total Income", 0, 1);
        aggregate.recompute(&[vec![CellValue::text("Pay"), CellValue::Currency(4_250)]]);

        assert_eq!(aggregate.cell(0), CellValue::text("Total Income"));
        assert_eq!(aggregate.cell(1).display(), "$42.50");
        assert_eq!(aggregate.cell(2), CellValue::Null);
        assert_eq!(aggregate.total_display(), "$42.50");
    }

    #[test]
    fn counting_aggregate_sums_integers() {
        let mut aggregate = AggregateRow::counting("Total", 0, 1);
        let outcome = aggregate.recompute(&[
            vec![CellValue::text("a.png"), CellValue::Integer(2_048)],
            vec![CellValue::text("b.png"), CellValue::Null],
            vec![CellValue::text("c.png"), CellValue::Integer(1)],
        ]);
        assert!(outcome.skipped.is_empty());
        assert_eq!(aggregate.cell(1), CellValue::Integer(2_049));
        assert_eq!(aggregate.total_display(), "2049");
    }

    #[test]
    fn difference_follows_either_side() {
        let totals = RunningTotals::shared();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        totals
            .borrow_mut()
            .subscribe(move |event| sink.borrow_mut().push(event.remaining_cents));

        totals.borrow_mut().publish(LedgerSide::Income, 10_000);
        totals.borrow_mut().publish(LedgerSide::Expenses, 4_000);
        assert_eq!(totals.borrow().remaining_display(), "$60.00");

        totals.borrow_mut().publish(LedgerSide::Expenses, 7_000);
        assert_eq!(totals.borrow().remaining_display(), "$30.00");
        assert_eq!(totals.borrow().income_cents(), 10_000);

        totals.borrow_mut().publish(LedgerSide::Expenses, 7_000);
        assert_eq!(*seen.borrow(), vec![10_000, 6_000, 3_000]);
    }

    #[test]
    fn negative_remainder_is_signed() {
        let mut totals = RunningTotals::default();
        totals.publish(LedgerSide::Expenses, 250);
        assert_eq!(totals.remaining_display(), "-$2.50");
    }
}
