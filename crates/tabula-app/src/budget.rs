// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::cell::Ref;
use std::rc::Rc;
use std::sync::Arc;

use crate::validation::{format_cents, parse_cents};
use crate::{
    AggregateRow, CellEditorRegistry, CellValue, ColumnSpec, EditorKind, GridController,
    GridEvent, GridResult, LedgerSide, Row, RunningTotals, SharedTotals, TabularDataStore,
    ValueKind,
};

pub const ITEM_COLUMN: usize = 0;
pub const AMOUNT_COLUMN: usize = 1;

/// Serialized form of a budget: each ledger as `[label, amount]` pairs
/// ending with its summary row. The summary row is stored as a zero
/// placeholder, since readers of the file add every stored amount and
/// supply the summary label themselves.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    #[serde(default)]
    pub income: Vec<(String, String)>,
    #[serde(default)]
    pub expenses: Vec<(String, String)>,
}

impl BudgetSnapshot {
    pub fn ledger(&self, side: LedgerSide) -> &[(String, String)] {
        match side {
            LedgerSide::Income => &self.income,
            LedgerSide::Expenses => &self.expenses,
        }
    }
}

pub fn ledger_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("item", ValueKind::Text).with_label("Item"),
        ColumnSpec::new("amount", ValueKind::Currency).with_label("Amount"),
    ]
}

pub fn ledger_editors() -> CellEditorRegistry {
    CellEditorRegistry::new().with("amount", EditorKind::currency())
}

/// Income and expense ledgers plus the remainder between them. Each ledger
/// publishes its total into the shared [`RunningTotals`] through a
/// subscription made here; the ledgers never see each other.
#[derive(Debug)]
pub struct BudgetSheet {
    income: GridController,
    expenses: GridController,
    totals: SharedTotals,
}

impl BudgetSheet {
    pub fn new(income: Vec<Row>, expenses: Vec<Row>) -> GridResult<Self> {
        let editors = Arc::new(ledger_editors());
        let totals = RunningTotals::shared();
        let income = ledger(LedgerSide::Income, income, &editors, &totals)?;
        let expenses = ledger(LedgerSide::Expenses, expenses, &editors, &totals)?;
        Ok(Self {
            income,
            expenses,
            totals,
        })
    }

    pub fn empty() -> GridResult<Self> {
        Self::new(Vec::new(), Vec::new())
    }

    /// The last pair of each ledger is its summary row and is dropped.
    /// Amounts that do not parse are kept as text.
    pub fn from_snapshot(snapshot: &BudgetSnapshot) -> GridResult<Self> {
        Self::new(
            rows_from_pairs(LedgerSide::Income, snapshot.ledger(LedgerSide::Income)),
            rows_from_pairs(LedgerSide::Expenses, snapshot.ledger(LedgerSide::Expenses)),
        )
    }

    pub fn snapshot(&self) -> BudgetSnapshot {
        BudgetSnapshot {
            income: pairs_from_ledger(LedgerSide::Income, &self.income),
            expenses: pairs_from_ledger(LedgerSide::Expenses, &self.expenses),
        }
    }

    pub fn ledger(&self, side: LedgerSide) -> &GridController {
        match side {
            LedgerSide::Income => &self.income,
            LedgerSide::Expenses => &self.expenses,
        }
    }

    pub fn ledger_mut(&mut self, side: LedgerSide) -> &mut GridController {
        match side {
            LedgerSide::Income => &mut self.income,
            LedgerSide::Expenses => &mut self.expenses,
        }
    }

    pub fn totals(&self) -> Ref<'_, RunningTotals> {
        self.totals.borrow()
    }

    pub fn shared_totals(&self) -> SharedTotals {
        Rc::clone(&self.totals)
    }

    pub fn remaining_display(&self) -> String {
        self.totals.borrow().remaining_display()
    }

    pub fn is_dirty(&self) -> bool {
        self.income.store().is_dirty() || self.expenses.store().is_dirty()
    }

    pub fn mark_saved(&mut self) {
        self.income.mark_saved();
        self.expenses.mark_saved();
    }
}

fn ledger(
    side: LedgerSide,
    rows: Vec<Row>,
    editors: &Arc<CellEditorRegistry>,
    totals: &SharedTotals,
) -> GridResult<GridController> {
    let summary = AggregateRow::new(side.summary_label(), ITEM_COLUMN, AMOUNT_COLUMN);
    let store = TabularDataStore::new(ledger_columns(), summary, rows)?;
    let mut grid = GridController::new(side.header(), store, Arc::clone(editors));

    totals.borrow_mut().publish(side, grid.total_cents());
    let link = Rc::clone(totals);
    grid.subscribe(move |event| {
        if let GridEvent::TotalChanged { cents } = event {
            link.borrow_mut().publish(side, *cents);
        }
    });
    Ok(grid)
}

fn rows_from_pairs(side: LedgerSide, pairs: &[(String, String)]) -> Vec<Row> {
    let body = match pairs.split_last() {
        Some((last, rest)) if is_summary_placeholder(side, last) => rest,
        Some((last, _)) => {
            // A stored amount on the summary row still counts toward the
            // total, so it survives as an ordinary row.
            tracing::warn!(
                ledger = side.header(),
                amount = %last.1,
                "summary row carries an amount; keeping it as a row"
            );
            pairs
        }
        None => pairs,
    };
    body.iter()
        .map(|(label, amount)| {
            let amount = match parse_cents(amount, true) {
                Ok(cents) => CellValue::Currency(cents),
                Err(_) => CellValue::Text(amount.clone()),
            };
            vec![CellValue::Text(label.clone()), amount]
        })
        .collect()
}

fn pairs_from_ledger(side: LedgerSide, grid: &GridController) -> Vec<(String, String)> {
    let mut pairs = grid
        .editable_rows()
        .iter()
        .map(|row| {
            let cell = |column: usize| row.get(column).map(CellValue::display).unwrap_or_default();
            (cell(ITEM_COLUMN), cell(AMOUNT_COLUMN))
        })
        .collect::<Vec<_>>();
    pairs.push((String::new(), format_cents(0)));
    pairs
}

fn is_summary_placeholder(side: LedgerSide, (label, amount): &(String, String)) -> bool {
    label == side.summary_label()
        || amount.trim().is_empty()
        || parse_cents(amount, true).is_ok_and(|cents| cents == 0)
}

#[cfg(test)]
mod tests {
    use super::{BudgetSheet, BudgetSnapshot};
    use crate::{GridView, LedgerSide};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn pair(label: &str, amount: &str) -> (String, String) {
        (label.to_owned(), amount.to_owned())
    }

    #[test]
    fn remaining_tracks_both_ledgers() {
        let mut sheet = BudgetSheet::empty().expect("sheet builds");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        sheet
            .shared_totals()
            .borrow_mut()
            .subscribe(move |event| sink.borrow_mut().push(event.remaining_cents));

        sheet
            .ledger_mut(LedgerSide::Income)
            .set_value_at(0, 1, "$100.00")
            .expect("income edit");
        sheet
            .ledger_mut(LedgerSide::Expenses)
            .set_value_at(0, 1, "$40.00")
            .expect("expense edit");
        assert_eq!(sheet.remaining_display(), "$60.00");

        sheet
            .ledger_mut(LedgerSide::Expenses)
            .set_value_at(0, 1, "$70.00")
            .expect("expense edit");
        assert_eq!(sheet.remaining_display(), "$30.00");
        assert_eq!(sheet.totals().income_cents(), 10_000);
        assert_eq!(*seen.borrow(), vec![10_000, 6_000, 3_000]);
    }

    #[test]
    fn snapshot_keeps_raw_text_and_writes_a_zero_summary() {
        let snapshot = BudgetSnapshot {
            income: vec![pair("Salary", "$2500.00"), pair("Total Income", "$2500.00")],
            expenses: vec![
                pair("Rent", "$1,200.00"),
                pair("Misc", "a bit"),
                pair("Total Expenses", "$999.00"),
            ],
        };
        let sheet = BudgetSheet::from_snapshot(&snapshot).expect("sheet builds");
        assert_eq!(sheet.remaining_display(), "$1300.00");
        assert!(!sheet.is_dirty());

        let saved = sheet.snapshot();
        assert_eq!(saved.income, vec![pair("Salary", "$2500.00"), pair("", "$0.00")]);
        assert_eq!(
            saved.expenses,
            vec![pair("Rent", "$1200.00"), pair("Misc", "a bit"), pair("", "$0.00")]
        );
    }

    #[test]
    fn blank_last_row_is_the_summary() {
        let snapshot = BudgetSnapshot {
            income: vec![pair("Salary", "$100.00"), pair("", "$0.00")],
            expenses: vec![pair("", "$0.00")],
        };
        let sheet = BudgetSheet::from_snapshot(&snapshot).expect("sheet builds");
        let income = sheet.ledger(LedgerSide::Income);
        assert_eq!(income.row_count(), 2);
        assert_eq!(income.display_at(0, 0).as_deref(), Ok("Salary"));
        assert_eq!(income.display_at(1, 0).as_deref(), Ok("Total Income"));
        assert_eq!(income.display_at(1, 1).as_deref(), Ok("$100.00"));
        assert_eq!(sheet.snapshot().income, snapshot.income);
    }

    #[test]
    fn amount_on_an_unlabelled_last_row_still_counts() {
        let snapshot = BudgetSnapshot {
            income: vec![pair("Salary", "$100.00"), pair("", "$5.00")],
            expenses: Vec::new(),
        };
        let sheet = BudgetSheet::from_snapshot(&snapshot).expect("sheet builds");
        assert_eq!(sheet.ledger(LedgerSide::Income).total_cents(), 10_500);
    }

    #[test]
    fn empty_sheet_has_one_blank_row_per_ledger() {
        let sheet = BudgetSheet::from_snapshot(&BudgetSnapshot::default()).expect("sheet builds");
        for side in [LedgerSide::Income, LedgerSide::Expenses] {
            let ledger = sheet.ledger(side);
            assert_eq!(ledger.row_count(), 2);
            assert_eq!(ledger.title(), side.header());
            assert_eq!(ledger.display_at(1, 0).as_deref(), Ok(side.summary_label()));
        }
        assert_eq!(sheet.remaining_display(), "$0.00");
    }
}
