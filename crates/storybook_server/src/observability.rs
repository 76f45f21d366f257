//! Log output and span export for the server process.
//!
//! Driven by the `[observability]` config section. `RUST_LOG` overrides the
//! configured filter when set.

use crate::ObservabilitySettings;
use opentelemetry::{KeyValue, global, trace::TracerProvider};
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use opentelemetry_stdout::SpanExporter;
use storybook_error::{ConfigError, StorybookResult};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Installed telemetry. Call [`Telemetry::shutdown`] before exit to flush spans.
#[derive(Debug)]
pub struct Telemetry {
    provider: Option<SdkTracerProvider>,
}

impl Telemetry {
    /// Flush and stop span export.
    pub fn shutdown(self) {
        if let Some(provider) = self.provider {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Span exporter did not shut down cleanly");
            }
        }
    }
}

/// Install the global subscriber: the log filter, a plain or JSON fmt layer
/// and, when `export_spans` is set, an OpenTelemetry layer writing spans to
/// stdout.
///
/// Fails if the filter does not parse or a global subscriber is already set.
pub fn init_telemetry(settings: &ObservabilitySettings) -> StorybookResult<Telemetry> {
    let filter = env_filter(settings, std::env::var("RUST_LOG").ok())?;

    let fmt_layer = if settings.json_logs {
        tracing_subscriber::fmt::layer().json().with_target(true).boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(true).boxed()
    };

    let provider = settings.export_spans.then(|| tracer_provider(settings));
    let otel_layer = provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(settings.service_name.clone()))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .map_err(|e| ConfigError::new(format!("Failed to install subscriber: {}", e)))?;

    tracing::info!(
        service = %settings.service_name,
        json = settings.json_logs,
        export_spans = settings.export_spans,
        "Telemetry initialized"
    );
    Ok(Telemetry { provider })
}

fn tracer_provider(settings: &ObservabilitySettings) -> SdkTracerProvider {
    let resource = Resource::builder()
        .with_service_name(settings.service_name.clone())
        .with_attributes(vec![KeyValue::new(
            "service.version",
            env!("CARGO_PKG_VERSION"),
        )])
        .build();
    let provider = SdkTracerProvider::builder()
        .with_simple_exporter(SpanExporter::default())
        .with_resource(resource)
        .build();
    global::set_tracer_provider(provider.clone());
    provider
}

/// `rust_log` when present, else the configured filter.
fn env_filter(
    settings: &ObservabilitySettings,
    rust_log: Option<String>,
) -> StorybookResult<EnvFilter> {
    let directives = rust_log
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| settings.log_filter.clone());
    EnvFilter::try_new(&directives).map_err(|e| {
        ConfigError::new(format!("Invalid log filter '{}': {}", directives, e)).into()
    })
}
