// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tabula_app::BudgetSnapshot;

use crate::data_dir;

pub const BUDGET_FILE_NAME: &str = "budget_data.json";

pub fn default_budget_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("TABULA_BUDGET_PATH") {
        return Ok(PathBuf::from(override_path));
    }
    Ok(data_dir()?.join(BUDGET_FILE_NAME))
}

/// Reads a saved budget. A missing file is an empty budget, not an error.
pub fn load_budget(path: &Path) -> Result<BudgetSnapshot> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no saved budget; starting empty");
            return Ok(BudgetSnapshot::default());
        }
        Err(error) => {
            return Err(error).with_context(|| format!("read budget file {}", path.display()));
        }
    };
    if raw.trim().is_empty() {
        return Ok(BudgetSnapshot::default());
    }
    serde_json::from_str(&raw).with_context(|| format!("parse budget file {}", path.display()))
}

pub fn save_budget(path: &Path, snapshot: &BudgetSnapshot) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create budget directory {}", parent.display()))?;
    }
    let encoded = serde_json::to_string(snapshot).context("encode budget")?;
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, encoded)
        .with_context(|| format!("write budget file {}", staging.display()))?;
    fs::rename(&staging, path)
        .with_context(|| format!("replace budget file {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        income = snapshot.income.len(),
        expenses = snapshot.expenses.len(),
        "saved budget"
    );
    Ok(())
}
