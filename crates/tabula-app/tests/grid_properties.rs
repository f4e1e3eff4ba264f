// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::sync::Arc;
use tabula_app::{
    AggregateRow, BudgetSheet, BudgetSnapshot, CellEditorRegistry, CellValue, ColumnSpec,
    EditorKind, FilterProjection, FilterSpec, GridController, GridError, GridView, LedgerSide,
    MatchMode, Row, SortSpec, TabularDataStore, ValueKind,
};

fn ledger_rows(items: &[(&str, &str)]) -> Vec<Row> {
    items
        .iter()
        .map(|(item, amount)| vec![CellValue::text(*item), CellValue::text(*amount)])
        .collect()
}

fn ledger(items: &[(&str, &str)]) -> Result<GridController> {
    let columns = vec![
        ColumnSpec::new("item", ValueKind::Text),
        ColumnSpec::new("amount", ValueKind::Currency),
    ];
    let store = TabularDataStore::new(columns, AggregateRow::new("Total", 0, 1), ledger_rows(items))?;
    Ok(GridController::new(
        "Ledger",
        store,
        Arc::new(CellEditorRegistry::new().with("amount", EditorKind::currency())),
    ))
}

#[test]
fn summary_row_stays_last_through_inserts_and_deletes() -> Result<()> {
    let mut grid = ledger(&[("Rent", "$10.00")])?;
    // add, add, delete first, add, delete last editable, delete, delete, add
    let script: [i32; 8] = [1, 1, 0, 1, -1, 0, 0, 1];
    for step in script {
        match step {
            1 => {
                grid.add_row()?;
            }
            0 => {
                let _ = grid.remove_row(Some(0));
            }
            _ => {
                let last = grid.summary_position().saturating_sub(1);
                let _ = grid.remove_row(Some(last));
            }
        }
        let summary = grid.summary_position();
        assert!(grid.row_count() >= 1);
        assert_eq!(summary, grid.row_count() - 1);
        assert_eq!(grid.display_at(summary, 0)?, "Total");
        assert!(!grid.is_editable(summary, 0));
        assert!(!grid.is_editable(summary, 1));
    }
    Ok(())
}

#[test]
fn deleting_every_row_leaves_only_the_summary() -> Result<()> {
    let mut grid = ledger(&[("A", "$1.00"), ("B", "$2.00")])?;
    grid.remove_row(Some(0))?;
    grid.remove_row(Some(0))?;
    assert_eq!(grid.row_count(), 1);
    assert_eq!(grid.display_at(0, 1)?, "$0.00");
    assert_eq!(grid.remove_row(Some(0)), Err(GridError::NoSelection));
    Ok(())
}

#[test]
fn aggregate_sums_parseable_cells() -> Result<()> {
    let grid = ledger(&[("A", "$10.00"), ("B", "$5.00")])?;
    assert_eq!(grid.display_at(grid.summary_position(), 1)?, "$15.00");

    let mut messy = ledger(&[("A", "$10.00"), ("B", "ten dollars"), ("C", "$5.00")])?;
    assert_eq!(messy.display_at(messy.summary_position(), 1)?, "$15.00");
    assert_eq!(messy.store().skipped().len(), 1);

    messy.set_cell(1, 1, "$2.50")?;
    assert_eq!(messy.display_at(messy.summary_position(), 1)?, "$17.50");
    assert!(messy.store().skipped().is_empty());
    Ok(())
}

#[test]
fn summary_row_in_saved_budget_is_not_counted_twice() -> Result<()> {
    let snapshot = BudgetSnapshot {
        income: vec![
            ("A".to_owned(), "$10.00".to_owned()),
            ("B".to_owned(), "$5.00".to_owned()),
            ("Total Income".to_owned(), "$0.00".to_owned()),
        ],
        expenses: Vec::new(),
    };
    let sheet = BudgetSheet::from_snapshot(&snapshot)?;
    let income = sheet.ledger(LedgerSide::Income);
    assert_eq!(income.display_at(income.summary_position(), 1)?, "$15.00");
    assert_eq!(income.summary_position(), 2);
    Ok(())
}

#[test]
fn remaining_follows_each_ledger_independently() -> Result<()> {
    let mut sheet = BudgetSheet::empty()?;
    sheet.ledger_mut(LedgerSide::Income).set_cell(0, 1, "$100.00")?;
    sheet.ledger_mut(LedgerSide::Expenses).set_cell(0, 1, "$40.00")?;
    assert_eq!(sheet.remaining_display(), "$60.00");

    sheet.ledger_mut(LedgerSide::Expenses).set_cell(0, 1, "$70.00")?;
    assert_eq!(sheet.remaining_display(), "$30.00");
    assert_eq!(sheet.totals().income_cents(), 10_000);
    Ok(())
}

#[test]
fn projection_maps_visible_positions_to_source_rows() -> Result<()> {
    let rows = ledger_rows(&[
        ("apple", "$1.00"),
        ("match one", "$2.00"),
        ("pear", "$3.00"),
        ("match two", "$4.00"),
        ("plum", "$5.00"),
    ]);
    let mut projection = FilterProjection::new(rows.as_slice());
    projection.set_predicate(
        Some(FilterSpec::new("match", MatchMode::Substring, 0)),
        rows.as_slice(),
    )?;
    assert_eq!(projection.visible_row_at(0)?, 1);
    assert_eq!(projection.visible_row_at(1)?, 3);
    assert_eq!(
        projection.visible_row_at(2),
        Err(GridError::IndexOutOfRange { index: 2, len: 2 })
    );
    Ok(())
}

#[test]
fn sorting_keeps_equal_rows_in_original_order() -> Result<()> {
    let mut grid = ledger(&[
        ("first", "$5.00"),
        ("second", "$1.00"),
        ("third", "$5.00"),
        ("fourth", "$1.00"),
    ])?;
    grid.apply_sort(SortSpec::asc(1))?;
    let order = (0..4)
        .map(|row| grid.display_at(row, 0))
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(order, vec!["second", "fourth", "first", "third"]);

    grid.apply_sort(SortSpec::desc(1))?;
    let order = (0..4)
        .map(|row| grid.display_at(row, 0))
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(order, vec!["first", "third", "second", "fourth"]);
    assert_eq!(grid.display_at(4, 0)?, "Total");
    Ok(())
}

#[test]
fn delete_without_selection_changes_nothing() -> Result<()> {
    let mut grid = ledger(&[("A", "$1.00"), ("B", "$2.00")])?;
    let before = grid.row_count();
    assert_eq!(grid.delete_row(None), Err(GridError::NoSelection));
    assert_eq!(grid.row_count(), before);
    assert_eq!(grid.total_cents(), 300);
    Ok(())
}

#[test]
fn formatted_currency_parses_back_to_the_same_value() -> Result<()> {
    let editor = EditorKind::currency();
    for raw in ["0", "$0.00", "12", "12.5", "$12.50", " 7.05 ", "$1,234.56", "99999.99"] {
        let parsed = editor.parse(raw)?;
        let reparsed = editor.parse(&editor.format(&parsed))?;
        assert_eq!(reparsed, parsed, "raw {raw:?}");
    }
    Ok(())
}

#[test]
fn filtered_grid_keeps_summary_over_all_rows() -> Result<()> {
    let mut grid = ledger(&[("Rent", "$700.00"), ("Food", "$200.00"), ("Fuel", "$50.00")])?;
    grid.apply_filter(FilterSpec::new("F*", MatchMode::Wildcard, 0))?;
    assert_eq!(grid.row_count(), 3);
    assert_eq!(grid.display_at(2, 1)?, "$950.00");

    let position = grid.insert_row()?;
    assert_eq!(position, None, "a blank item does not match F*");
    assert_eq!(grid.store().editable_row_count(), 4);
    Ok(())
}
