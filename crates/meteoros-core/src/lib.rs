pub mod config;
pub mod error;

pub use config::{Config, ValidationResult, WeatherApiConfig};
pub use error::{
    AppError, ConfigError, NetworkError, NotificationError, ReqwestErrorExt, RusqliteErrorExt,
    StorageError, ValidationError, WeatherError,
};

use anyhow::Result;

/// Initialize logging for the application.
///
/// Reads the filter from `RUST_LOG`, defaulting to `info`. Safe to call more
/// than once; later calls keep the subscriber installed by the first.
pub fn init() -> Result<()> {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Meteoros core initialized");
    } else {
        tracing::debug!("Tracing subscriber already installed");
    }
    Ok(())
}
