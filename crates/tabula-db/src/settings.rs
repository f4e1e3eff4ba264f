// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tabula_app::{SettingKey, SettingValue};

use crate::APP_NAME;

pub fn default_settings_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("TABULA_SETTINGS_PATH") {
        return Ok(PathBuf::from(override_path));
    }
    let config_root = dirs::config_dir().ok_or_else(|| {
        anyhow!("cannot resolve config directory; set TABULA_SETTINGS_PATH to the settings file")
    })?;
    Ok(config_root.join(APP_NAME).join("settings.toml"))
}

/// Persistent user preferences kept as a flat TOML table of strings.
///
/// Values are written back by [`SettingsStore::flush`]. A store that is
/// dropped with unsaved changes flushes itself and logs any failure.
/// Keys this build does not know about are carried through untouched.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
    dirty: bool,
}

impl SettingsStore {
    pub fn load(path: &Path) -> Result<Self> {
        let values = match fs::read_to_string(path) {
            Ok(raw) => toml::from_str::<BTreeMap<String, toml::Value>>(&raw)
                .with_context(|| format!("parse settings file {}", path.display()))?
                .into_iter()
                .map(|(key, value)| {
                    let text = match value {
                        toml::Value::String(text) => text,
                        other => other.to_string(),
                    };
                    (key, text)
                })
                .collect(),
            Err(error) if error.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("read settings file {}", path.display()));
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            values,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Stored value for `key`, or its default when absent or unreadable.
    pub fn get(&self, key: SettingKey) -> SettingValue {
        let Some(raw) = self.values.get(key.as_str()) else {
            return key.default_value();
        };
        SettingValue::parse_for_key(key, raw).unwrap_or_else(|| {
            tracing::warn!(key = key.as_str(), raw = %raw, "ignoring unreadable setting");
            key.default_value()
        })
    }

    pub fn get_bool(&self, key: SettingKey) -> bool {
        matches!(self.get(key), SettingValue::Bool(true))
    }

    pub fn set(&mut self, key: SettingKey, value: SettingValue) -> Result<()> {
        let Some(encoded) = value.to_storage(key) else {
            bail!(
                "setting {} expects a {:?} value, got {value:?}",
                key.as_str(),
                key.expected_value_kind()
            );
        };
        if self.values.get(key.as_str()) != Some(&encoded) {
            self.values.insert(key.as_str().to_owned(), encoded);
            self.dirty = true;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("create settings directory {}", parent.display()))?;
        }
        let encoded = toml::to_string(&self.values).context("encode settings")?;
        fs::write(&self.path, encoded)
            .with_context(|| format!("write settings file {}", self.path.display()))?;
        self.dirty = false;
        tracing::debug!(path = %self.path.display(), "flushed settings");
        Ok(())
    }
}

impl Drop for SettingsStore {
    fn drop(&mut self) {
        if let Err(error) = self.flush() {
            tracing::warn!(error = %format!("{error:#}"), "failed to save settings on exit");
        }
    }
}
