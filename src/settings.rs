use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::config::MonitorConfig;
use crate::language::Language;

const SETTINGS_ENV: &str = "PROCTOR_SETTINGS";
const DEBUG_ENV: &str = "PROCTOR_DEBUG";
const DEFAULT_FILE: &str = "proctor-settings.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserSettings {
    pub language: Language,
    /// Log a debug entry for every key event no rule matched.
    pub verbose_key_logging: bool,
    pub monitor: MonitorConfig,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("ignoring malformed settings in {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    /// Open the store at `PROCTOR_SETTINGS`, or next to the working directory.
    pub fn from_env() -> Result<Self> {
        let path = env::var_os(SETTINGS_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE));
        Self::new(path)
    }

    pub fn settings(&self) -> UserSettings {
        self.read().clone()
    }

    pub fn monitor(&self) -> MonitorConfig {
        self.read().monitor.clone()
    }

    pub fn language(&self) -> Language {
        self.read().language
    }

    /// Verbose key logging, forced on by `PROCTOR_DEBUG=1|true`.
    pub fn verbose_key_logging(&self) -> bool {
        debug_env_enabled() || self.read().verbose_key_logging
    }

    pub fn update_language(&self, language: Language) -> Result<()> {
        let mut guard = self.write();
        guard.language = language;
        self.persist(&guard)
    }

    pub fn update_verbose_key_logging(&self, enabled: bool) -> Result<()> {
        let mut guard = self.write();
        guard.verbose_key_logging = enabled;
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserSettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn debug_env_enabled() -> bool {
    env::var(DEBUG_ENV)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
