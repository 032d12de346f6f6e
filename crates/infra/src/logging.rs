use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::AppConfig;

/// Installs the global subscriber: JSON lines in production, compact text
/// elsewhere. An unparsable `LOG_LEVEL` falls back to `info`.
pub fn init_tracing(config: &AppConfig) -> Result<()> {
    let filter = log_filter(&config.log_level);
    let builder = fmt().with_env_filter(filter).with_target(false);

    if config.is_production() {
        builder
            .json()
            .with_current_span(true)
            .try_init()
            .map_err(|err| anyhow::anyhow!(err))?;
    } else {
        builder
            .compact()
            .try_init()
            .map_err(|err| anyhow::anyhow!(err))?;
    }

    tracing::info!(
        app_env = %config.app_env,
        data_backend = %config.data_backend,
        "tracing initialised"
    );
    Ok(())
}

fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}
