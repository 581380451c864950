pub mod api;
pub mod catalog;
pub mod composer;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod modals;
pub mod models;
pub mod pdf;
pub mod session;
pub mod storage;
pub mod upload;

pub use error::{AppError, ValidationError};

use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber. `RUST_LOG` wins over the
/// built-in default filter. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    tracing::debug!("{} v{} tracing initialised", config::APP_NAME, config::APP_VERSION);
}
