//! The terminal belongs to the UI, so tracing output goes to a file in the
//! data dir. `CMS_TUI_LOG` takes an `EnvFilter` directive (default `info`).

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE: &str = "field-studio.log";

pub fn log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LOG_FILE)
}

pub fn filter_from(directive: Option<String>) -> EnvFilter {
    let directive = directive.unwrap_or_else(|| "info".into());
    EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("ignoring CMS_TUI_LOG={directive:?}: {e}");
        EnvFilter::new("info")
    })
}

pub fn init(data_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(data_dir).with_context(|| format!("creating {data_dir:?}"))?;
    let path = log_path(data_dir);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening {path:?}"))?;
    tracing_subscriber::registry()
        .with(filter_from(std::env::var("CMS_TUI_LOG").ok()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("installing tracing subscriber")?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log = %path.display(),
        "field studio starting"
    );
    Ok(path)
}
