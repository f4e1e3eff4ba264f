// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod budget;
pub mod import;
pub mod inventory;
pub mod settings;

pub use budget::*;
pub use import::*;
pub use inventory::*;
pub use settings::*;

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, OptionalExtension, params};
use std::cell::Cell;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tabula_app::validation::{format_date, parse_date};
use tabula_app::{CellValue, ForeignKeyRef, RelationSpec, RelationalSource, Row};

pub const APP_NAME: &str = "tabula";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PragmaColumn {
    pub cid: i32,
    pub name: String,
    pub column_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub primary_key: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyInfo {
    pub column: String,
    pub table: String,
    pub to_column: String,
}

/// A single SQLite connection serving every browser opened on it.
pub struct Database {
    conn: Connection,
    label: String,
    writes: Cell<u64>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("label", &self.label)
            .field("writes", &self.writes.get())
            .finish()
    }
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        tracing::info!(path = %path.display(), "opened database");
        Ok(Self {
            conn,
            label: printable,
            writes: Cell::new(0),
        })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        tracing::info!("opened in-memory database");
        Ok(Self {
            conn,
            label: ":memory:".to_owned(),
            writes: Cell::new(0),
        })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Closes the connection and reports any error from doing so. Dropping
    /// a `Database` also closes it, silently.
    pub fn close(self) -> Result<()> {
        let label = self.label;
        self.conn
            .close()
            .map_err(|(_, error)| error)
            .with_context(|| format!("close database {label}"))?;
        tracing::info!(database = %label, "closed database");
        Ok(())
    }

    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT name
                FROM sqlite_master
                WHERE type = 'table'
                  AND name NOT LIKE 'sqlite_%'
                ORDER BY name ASC
                ",
            )
            .context("prepare table names query")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("query table names")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect table names")
    }

    pub fn table_columns(&self, table: &str) -> Result<Vec<PragmaColumn>> {
        ensure_identifier("table", table)?;

        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .with_context(|| format!("inspect columns for {table}"))?;
        let rows = stmt
            .query_map([], |row| {
                let not_null: i32 = row.get(3)?;
                let primary_key: i32 = row.get(5)?;
                Ok(PragmaColumn {
                    cid: row.get(0)?,
                    name: row.get(1)?,
                    column_type: row.get(2)?,
                    not_null: not_null != 0,
                    default_value: row.get(4)?,
                    primary_key,
                })
            })
            .with_context(|| format!("query column info for {table}"))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("collect columns for {table}"))
    }

    pub fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyInfo>> {
        ensure_identifier("table", table)?;

        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA foreign_key_list({table})"))
            .with_context(|| format!("inspect foreign keys for {table}"))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ForeignKeyInfo {
                    table: row.get(2)?,
                    column: row.get(3)?,
                    to_column: row.get(4)?,
                })
            })
            .with_context(|| format!("query foreign keys for {table}"))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("collect foreign keys for {table}"))
    }

    /// Checks that a browser description matches the live schema: the
    /// relation and every column exist, the primary key is one, and every
    /// reference is a declared foreign key.
    pub fn verify_relation(&self, spec: &RelationSpec) -> Result<()> {
        let columns = self.table_columns(&spec.relation)?;
        if columns.is_empty() {
            bail!("table `{}` does not exist", spec.relation);
        }
        let missing = spec
            .columns
            .iter()
            .filter(|column| !columns.iter().any(|live| live.name == column.name))
            .map(|column| column.name.as_str())
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            bail!(
                "table `{}` is missing columns: {}",
                spec.relation,
                missing.join(", ")
            );
        }
        if !columns
            .iter()
            .any(|live| live.name == spec.primary_key && live.primary_key > 0)
        {
            bail!(
                "column `{}` is not the primary key of `{}`",
                spec.primary_key,
                spec.relation
            );
        }

        let declared = self.foreign_keys(&spec.relation)?;
        for column in &spec.columns {
            let Some(reference) = &column.reference else {
                continue;
            };
            let matches = declared.iter().any(|fk| {
                fk.column == column.name
                    && fk.table.eq_ignore_ascii_case(&reference.relation)
                    && fk.to_column == reference.key_column
            });
            if !matches {
                bail!(
                    "`{}.{}` is not declared as a foreign key to `{}.{}`",
                    spec.relation,
                    column.name,
                    reference.relation,
                    reference.key_column
                );
            }
        }
        Ok(())
    }

    pub fn select_all(&self, relation: &str, columns: &[&str]) -> Result<Vec<Row>> {
        ensure_identifier("table", relation)?;
        for column in columns {
            ensure_identifier("column", column)?;
        }
        if columns.is_empty() {
            bail!("select from {relation} needs at least one column");
        }

        let query = format!("SELECT {} FROM {relation} ORDER BY rowid", columns.join(", "));
        let mut stmt = self
            .conn
            .prepare(&query)
            .with_context(|| format!("prepare select from {relation}"))?;
        let mut rows = stmt
            .query([])
            .with_context(|| format!("select from {relation}"))?;

        let mut output = Vec::new();
        while let Some(row) = rows
            .next()
            .with_context(|| format!("scan rows of {relation}"))?
        {
            let mut cells = Vec::with_capacity(columns.len());
            for index in 0..columns.len() {
                let value = row
                    .get_ref(index)
                    .map(value_ref_to_cell)
                    .with_context(|| format!("read column {index} of {relation}"))?;
                cells.push(value);
            }
            output.push(cells);
        }
        Ok(output)
    }

    pub fn key_labels(&self, reference: &ForeignKeyRef) -> Result<Vec<(CellValue, String)>> {
        let ForeignKeyRef {
            relation,
            key_column,
            display_column,
        } = reference;
        ensure_identifier("table", relation)?;
        ensure_identifier("column", key_column)?;
        ensure_identifier("column", display_column)?;

        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {key_column}, {display_column} FROM {relation} ORDER BY {display_column}, {key_column}"
            ))
            .with_context(|| format!("prepare key labels for {relation}"))?;
        let rows = stmt
            .query_map([], |row| {
                let key = value_ref_to_cell(row.get_ref(0)?);
                let label = value_ref_to_cell(row.get_ref(1)?).display();
                Ok((key, label))
            })
            .with_context(|| format!("query key labels for {relation}"))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("collect key labels for {relation}"))
    }

    pub fn resolve_label(&self, reference: &ForeignKeyRef, key: &CellValue) -> Result<Option<String>> {
        let ForeignKeyRef {
            relation,
            key_column,
            display_column,
        } = reference;
        ensure_identifier("table", relation)?;
        ensure_identifier("column", key_column)?;
        ensure_identifier("column", display_column)?;

        self.conn
            .query_row(
                &format!("SELECT {display_column} FROM {relation} WHERE {key_column} = ?"),
                params![cell_to_sql(key, false)],
                |row| row.get_ref(0).map(|value| value_ref_to_cell(value).display()),
            )
            .optional()
            .with_context(|| format!("resolve {relation}.{key_column} = {}", key.display()))
    }

    pub fn update_cell(
        &self,
        relation: &str,
        key_column: &str,
        key: &CellValue,
        column: &str,
        value: &CellValue,
    ) -> Result<()> {
        ensure_identifier("table", relation)?;
        ensure_identifier("column", key_column)?;
        ensure_identifier("column", column)?;

        let stores_dollars = self
            .table_columns(relation)?
            .iter()
            .find(|live| live.name == column)
            .ok_or_else(|| anyhow!("table `{relation}` has no column `{column}`"))?
            .column_type
            .to_ascii_uppercase()
            .contains("REAL");
        let changed = self
            .conn
            .execute(
                &format!("UPDATE {relation} SET {column} = ?1 WHERE {key_column} = ?2"),
                params![cell_to_sql(value, stores_dollars), cell_to_sql(key, false)],
            )
            .with_context(|| format!("update {relation}.{column}"))?;
        if changed == 0 {
            bail!(
                "no {relation} row has {key_column} = {}; it may have been deleted",
                key.display()
            );
        }
        self.writes.set(self.writes.get() + 1);
        tracing::debug!(relation, column, key = %key.display(), "updated cell");
        Ok(())
    }

    /// Moves on every write through this handle and on every commit made
    /// by another connection to the same file.
    pub fn data_version(&self) -> Result<u64> {
        let external: i64 = self
            .conn
            .query_row("PRAGMA data_version", [], |row| row.get(0))
            .context("read data version")?;
        let external = u64::try_from(external).unwrap_or_default();
        Ok((external << 32) | (self.writes.get() & 0xffff_ffff))
    }
}

impl RelationalSource for Database {
    fn select_all(&self, relation: &str, columns: &[&str]) -> Result<Vec<Row>> {
        Database::select_all(self, relation, columns)
    }

    fn key_labels(&self, reference: &ForeignKeyRef) -> Result<Vec<(CellValue, String)>> {
        Database::key_labels(self, reference)
    }

    fn update_cell(
        &self,
        relation: &str,
        key_column: &str,
        key: &CellValue,
        column: &str,
        value: &CellValue,
    ) -> Result<()> {
        Database::update_cell(self, relation, key_column, key, column, value)
    }

    fn data_version(&self) -> Result<u64> {
        Database::data_version(self)
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("TABULA_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }
    Ok(data_dir()?.join("inventory.db"))
}

/// Per-user data directory, created on first use.
pub fn data_dir() -> Result<PathBuf> {
    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set TABULA_DB_PATH to a writable database path")
    })?;
    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir)
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn value_ref_to_cell(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(value) => CellValue::Integer(value),
        ValueRef::Real(value) => CellValue::Real(value),
        ValueRef::Text(value) => CellValue::Text(String::from_utf8_lossy(value).into_owned()),
        ValueRef::Blob(value) => CellValue::Text(format!("<{} bytes>", value.len())),
    }
}

fn cell_to_sql(value: &CellValue, stores_dollars: bool) -> Value {
    match value {
        CellValue::Null => Value::Null,
        CellValue::Text(text) => match parse_date(text) {
            Ok(date) => Value::Text(format_date(date)),
            Err(_) => Value::Text(text.clone()),
        },
        CellValue::Currency(cents) if stores_dollars => Value::Real(*cents as f64 / 100.0),
        CellValue::Currency(cents) => Value::Integer(*cents),
        CellValue::Date(date) => Value::Text(format_date(*date)),
        CellValue::Integer(value) => Value::Integer(*value),
        CellValue::Real(value) => Value::Real(*value),
    }
}

fn is_safe_identifier(identifier: &str) -> bool {
    !identifier.is_empty()
        && identifier
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
}

fn ensure_identifier(kind: &str, identifier: &str) -> Result<()> {
    if !is_safe_identifier(identifier) {
        bail!("invalid {kind} name: {identifier:?}");
    }
    Ok(())
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}
