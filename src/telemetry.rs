use std::time::Duration;

use anyhow::{Context, Result};
use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::{TonicExporterBuilder, WithExportConfig};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::Config;
use opentelemetry_sdk::{runtime, Resource};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use tracing::error;
use tracing_opentelemetry::{MetricsLayer, OpenTelemetryLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

/// Providers installed by [`init_telemetry`], flushed by [`Telemetry::shutdown`].
#[derive(Default)]
pub struct Telemetry {
    meter_provider: Option<SdkMeterProvider>,
}

impl Telemetry {
    /// Flushes buffered spans and metrics. Call once, after the server stops.
    pub fn shutdown(self) {
        global::shutdown_tracer_provider();
        if let Some(meter_provider) = self.meter_provider {
            if let Err(err) = meter_provider.shutdown() {
                error!("Failed to shut down meter provider: {}", err);
            }
        }
    }
}

/// Installs the global subscriber.
///
/// Without an endpoint only the console layer is installed. With one, traces and
/// metrics are exported over OTLP and the console layer is kept when `console` is set.
pub fn init_telemetry(endpoint: Option<&str>, console: bool) -> Result<Telemetry> {
    let filter = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("INFO"));

    let (tracer, meter) = match endpoint {
        Some(endpoint) => {
            let service_resource = Resource::new(vec![
                KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
                KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
            ]);

            let tracer_provider = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(build_tonic_exporter(endpoint))
                .with_trace_config(Config::default().with_resource(service_resource.clone()))
                .install_batch(runtime::Tokio)
                .context("Failed to install tracer")?;
            let tracer = tracer_provider.tracer(env!("CARGO_PKG_NAME"));
            global::set_tracer_provider(tracer_provider);

            let meter = opentelemetry_otlp::new_pipeline()
                .metrics(runtime::Tokio)
                .with_exporter(build_tonic_exporter(endpoint))
                .with_resource(service_resource)
                .build()
                .context("Failed to install meter")?;

            global::set_text_map_propagator(TraceContextPropagator::new());
            (Some(tracer), Some(meter))
        }
        None => (None, None),
    };

    let console_layer = (endpoint.is_none() || console).then(tracing_subscriber::fmt::layer);

    Registry::default()
        .with(filter)
        .with(tracer.map(OpenTelemetryLayer::new))
        .with(meter.clone().map(MetricsLayer::new))
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(Telemetry {
        meter_provider: meter,
    })
}

fn build_tonic_exporter(endpoint: &str) -> TonicExporterBuilder {
    opentelemetry_otlp::new_exporter()
        .tonic()
        .with_timeout(Duration::from_secs(15))
        .with_endpoint(endpoint)
}
