//! Logging and tracing bootstrap.

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

use locallib_kernel::settings::{LogFormat, TelemetrySettings};

/// Build the filter: `RUST_LOG` when set, otherwise the configured directives.
pub fn env_filter(settings: &TelemetrySettings) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&settings.filter)
            .map_err(|e| anyhow!("invalid log filter '{}': {}", settings.filter, e)),
    }
}

/// Install the global tracing subscriber.
///
/// A subscriber that is already installed (tests, embedding binaries) is left
/// in place.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = env_filter(settings)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match settings.log_format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    if installed.is_err() {
        tracing::debug!(target: "locallib-telemetry", "subscriber already installed");
    } else {
        tracing::info!(
            target: "locallib-telemetry",
            format = ?settings.log_format,
            "telemetry initialized"
        );
    }

    Ok(())
}
