pub mod clean;
pub mod config;
pub mod driver;
pub mod notebook;
pub mod table;

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the fmt subscriber. `RUST_LOG` wins; otherwise `LOG_LEVEL`, then `info`.
pub fn init_tracing() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        EnvFilter::default().add_directive(level.parse().unwrap_or(Level::INFO.into()))
    });
    fmt().with_env_filter(env).with_target(false).init();
}
