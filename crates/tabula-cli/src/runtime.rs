// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabula_app::validation::format_cents;
use tabula_app::{BudgetSheet, BudgetSnapshot, GridView, LedgerSide, RelationalBrowser};
use tabula_db::{Database, inventory_editors, inventory_relations};
use tabula_tui::AppRuntime;

const LEDGERS: [LedgerSide; 2] = [LedgerSide::Income, LedgerSide::Expenses];

/// The two-ledger budget in the terminal UI. A runtime without a path
/// holds demo data and never writes.
pub struct BudgetRuntime {
    sheet: BudgetSheet,
    path: Option<PathBuf>,
}

impl BudgetRuntime {
    pub fn load(path: &Path) -> Result<Self> {
        let snapshot = tabula_db::load_budget(path)?;
        let sheet = BudgetSheet::from_snapshot(&snapshot)
            .with_context(|| format!("build budget from {}", path.display()))?;
        Ok(Self {
            sheet,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn demo(snapshot: &BudgetSnapshot) -> Result<Self> {
        let sheet = BudgetSheet::from_snapshot(snapshot).context("build demo budget")?;
        Ok(Self { sheet, path: None })
    }

    pub fn sheet(&self) -> &BudgetSheet {
        &self.sheet
    }

    pub fn totals_text(&self) -> String {
        let totals = self.sheet.totals();
        format!(
            "{}: {}\n{}: {}\nRemaining: {}",
            LedgerSide::Income.summary_label(),
            format_cents(totals.income_cents()),
            LedgerSide::Expenses.summary_label(),
            format_cents(totals.expense_cents()),
            totals.remaining_display(),
        )
    }

    /// Writes the sheet if anything changed since the last save.
    pub fn save_if_dirty(&mut self) -> Result<bool> {
        if !self.sheet.is_dirty() || self.path.is_none() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }
}

impl AppRuntime for BudgetRuntime {
    fn title(&self) -> &str {
        "Budget"
    }

    fn tab_count(&self) -> usize {
        LEDGERS.len()
    }

    fn tab(&self, index: usize) -> Option<&dyn GridView> {
        LEDGERS
            .get(index)
            .map(|side| self.sheet.ledger(*side) as &dyn GridView)
    }

    fn tab_mut(&mut self, index: usize) -> Option<&mut dyn GridView> {
        let side = *LEDGERS.get(index)?;
        Some(self.sheet.ledger_mut(side) as &mut dyn GridView)
    }

    fn summary_line(&self) -> Option<String> {
        Some(format!(
            "Remaining: {}",
            self.sheet.remaining_display()
        ))
    }

    fn save(&mut self) -> Result<String> {
        let Some(path) = &self.path else {
            return Ok("demo budget is not saved".to_owned());
        };
        tabula_db::save_budget(path, &self.sheet.snapshot())?;
        self.sheet.mark_saved();
        Ok(format!("saved {}", path.display()))
    }
}

/// One tab per inventory relation. Edits are written through as they are
/// committed, so saving only re-reads.
pub struct BrowserRuntime<'a> {
    db: &'a Database,
    browsers: Vec<RelationalBrowser<'a>>,
}

impl<'a> BrowserRuntime<'a> {
    pub fn open(db: &'a Database, include_staff: bool) -> Result<Self> {
        let editors = Arc::new(inventory_editors());
        let browsers = inventory_relations(include_staff)
            .into_iter()
            .map(|spec| {
                let relation = spec.relation.clone();
                RelationalBrowser::open(db, spec, Arc::clone(&editors))
                    .with_context(|| format!("load {relation} from {}", db.label()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { db, browsers })
    }

    pub fn relations(&self) -> Vec<&str> {
        self.browsers.iter().map(RelationalBrowser::relation).collect()
    }
}

impl AppRuntime for BrowserRuntime<'_> {
    fn title(&self) -> &str {
        "Inventory"
    }

    fn tab_count(&self) -> usize {
        self.browsers.len()
    }

    fn tab(&self, index: usize) -> Option<&dyn GridView> {
        self.browsers
            .get(index)
            .map(|browser| browser as &dyn GridView)
    }

    fn tab_mut(&mut self, index: usize) -> Option<&mut dyn GridView> {
        self.browsers
            .get_mut(index)
            .map(|browser| browser as &mut dyn GridView)
    }

    fn summary_line(&self) -> Option<String> {
        Some(self.db.label().to_owned())
    }

    fn activate_tab(&mut self, index: usize) -> Result<()> {
        if let Some(browser) = self.browsers.get_mut(index) {
            browser
                .refresh()
                .with_context(|| format!("reload {}", browser.relation()))?;
        }
        Ok(())
    }

    fn save(&mut self) -> Result<String> {
        let mut reloaded = 0;
        for browser in &mut self.browsers {
            if browser.sync()? {
                reloaded += 1;
            }
        }
        Ok(format!(
            "changes are saved on commit; {reloaded} relation(s) reloaded"
        ))
    }
}
