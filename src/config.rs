//! `field-studio.yaml`: where it is looked for, what it holds and the
//! environment overrides applied on top.

use crate::theme::ThemeMode;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "field-studio.yaml";

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Seeded in-process backend; nothing leaves the machine.
    #[default]
    Memory,
    /// External command speaking the JSON envelope protocol.
    Cli { command: String },
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub theme: ThemeMode,
    #[serde(default)]
    pub backend: BackendConfig,
    // Collection opened on start, by id
    #[serde(default)]
    pub default_collection: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            data_dir: default_data_dir(),
            theme: ThemeMode::default(),
            backend: BackendConfig::default(),
            default_collection: None,
        }
    }
}

fn default_title() -> String {
    "Field Studio".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".field-studio")
}

pub fn validate_app_config(cfg: &AppConfig) -> Result<(), String> {
    if cfg.title.trim().is_empty() {
        return Err("title must not be empty".into());
    }
    if cfg.data_dir.as_os_str().is_empty() {
        return Err("data_dir must not be empty".into());
    }
    if let BackendConfig::Cli { command } = &cfg.backend {
        if command.trim().is_empty() {
            return Err("backend 'cli' requires a non-empty 'command'".into());
        }
        if shlex::split(command).is_none() {
            return Err(format!("backend command has unbalanced quotes: {command}"));
        }
    }
    if let Some(id) = &cfg.default_collection {
        if id.trim().is_empty() {
            return Err("default_collection must not be blank".into());
        }
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<AppConfig> {
    let s = fs::read_to_string(path).with_context(|| format!("reading {path:?}"))?;
    let mut cfg: AppConfig =
        serde_yaml::from_str(&s).with_context(|| format!("parsing {path:?}"))?;
    // a relative data dir is anchored at the config file
    if cfg.data_dir.is_relative() {
        if let Some(dir) = path.parent() {
            cfg.data_dir = dir.join(&cfg.data_dir);
        }
    }
    Ok(cfg)
}

/// Find and read the config. `env` is the environment lookup, passed in so
/// discovery can be exercised without touching the process environment.
pub fn discover(env: &dyn Fn(&str) -> Option<String>, cwd: &Path) -> Result<AppConfig> {
    let mut cfg = if let Some(base) = env("CMS_TUI_CONFIG_DIR") {
        let entry = PathBuf::from(base).join(CONFIG_FILE);
        read_config(&entry)?
    } else {
        let candidates = [cwd.join(CONFIG_FILE), cwd.join(".tui").join(CONFIG_FILE)];
        match candidates.iter().find(|p| p.exists()) {
            Some(p) => read_config(p)?,
            None => {
                tracing::debug!("no {CONFIG_FILE} found, using defaults");
                AppConfig::default()
            }
        }
    };
    if let Some(dir) = env("CMS_TUI_DATA_DIR").filter(|d| !d.trim().is_empty()) {
        cfg.data_dir = PathBuf::from(dir);
    }
    if let Some(command) = env("CMS_TUI_BACKEND_CMD").filter(|c| !c.trim().is_empty()) {
        cfg.backend = BackendConfig::Cli { command };
    }
    validate_app_config(&cfg).map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    Ok(cfg)
}

pub fn load_config() -> Result<AppConfig> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    discover(&|k| std::env::var(k).ok(), &cwd)
}
