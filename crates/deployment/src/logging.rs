//! Logging setup.

/// Initializes the global subscriber.
///
/// `RUST_LOG` takes precedence over `level`. Lambda forwards stdout to
/// CloudWatch, which adds its own timestamps, so ANSI colors and times are off.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "fhircloud_deployment={level},fhircloud_routing={level},fhircloud_persistence={level},fhircloud_search={level},fhircloud_authz={level},tower_http={level}"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).without_time())
        .with(filter)
        .init();
}
