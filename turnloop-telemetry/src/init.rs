//! Telemetry initialization and configuration

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Output format of the console subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Initialize console logging with the default human-readable format
///
/// The filter comes from `RUST_LOG` and falls back to `info`. Only the first
/// call installs a subscriber; later calls are no-ops.
///
/// # Example
/// ```
/// use turnloop_telemetry::init_telemetry;
/// init_telemetry("turnloop").expect("Failed to initialize telemetry");
/// ```
pub fn init_telemetry(service_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    init_telemetry_with(service_name, LogFormat::Pretty)
}

/// Initialize console logging with an explicit format
pub fn init_telemetry_with(
    service_name: &str,
    format: LogFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    let mut outcome: Result<(), Box<dyn std::error::Error>> = Ok(());

    INIT.call_once(|| {
        let registry = tracing_subscriber::registry().with(filter);
        let installed = match format {
            LogFormat::Pretty => registry
                .with(tracing_subscriber::fmt::layer().with_target(true).with_line_number(true))
                .try_init(),
            LogFormat::Json => registry
                .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
                .try_init(),
        };

        match installed {
            Ok(()) => tracing::info!(service.name = service_name, ?format, "Telemetry initialized"),
            Err(e) => outcome = Err(Box::new(e)),
        }
    });

    outcome
}
