pub mod activity_log;
pub mod config;
pub mod error;
pub mod fullscreen;
pub mod host;
pub mod language;
pub mod media;
pub mod mouse;
pub mod session;
pub mod settings;
pub mod summary;
pub mod violations;
mod utils;

use std::path::PathBuf;

use anyhow::{Context, Result};

pub use config::MonitorConfig;
pub use error::{Capability, ProctorError};
pub use session::{SessionController, SessionStatus, ViewModel};
pub use summary::SessionSummary;

use settings::SettingsStore;

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("proctor starting up...");

    let script = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: proctor <script.jsonl>")?;
    let settings = SettingsStore::from_env()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    runtime.block_on(host::replay(&script, &settings))
}
