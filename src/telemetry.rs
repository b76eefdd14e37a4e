use crate::config::ObservabilityConfig;
use crate::runs::RunId;
use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set. JSON output carries the
/// current span and span list so run and trace ids appear on every line.
pub fn init_telemetry(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init()?;
    }

    tracing::info!("Automation runs telemetry initialized");
    Ok(())
}

/// Generate a trace ID for linking a run to the request that started it
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span carrying the run and trace ids for one run operation
pub fn create_run_span(operation: &str, run_id: &RunId, trace_id: &str) -> tracing::Span {
    tracing::info_span!(
        "automation_run",
        operation = operation,
        run.id = %run_id,
        trace.id = trace_id,
        otel.kind = "internal"
    )
}

pub fn shutdown_telemetry() {
    tracing::info!("Automation runs telemetry shutdown complete");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_ids_are_unique() {
        let a = generate_trace_id();
        let b = generate_trace_id();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
