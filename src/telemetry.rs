//! Logging and OpenTelemetry export for the command line tool.
//!
//! Logs always go to stderr, filtered by `RUST_LOG` (default `info`), so
//! stdout carries nothing but the command's JSON output. When any
//! `OTEL_EXPORTER_OTLP_*` variable is set, spans are exported over OTLP too.

use opentelemetry::{KeyValue, trace::TracerProvider as _};
use opentelemetry_sdk::{
    Resource,
    trace::{RandomIdGenerator, Sampler, SdkTracerProvider},
};
use opentelemetry_semantic_conventions::{
    SCHEMA_URL,
    attribute::{DEPLOYMENT_ENVIRONMENT_NAME, SERVICE_VERSION},
};
use std::env;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Telemetry protocol to use for OTLP export
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TelemetryProtocol {
    HTTP,
    GRPC,
}

impl TelemetryProtocol {
    /// Determines telemetry protocol from environment variables if OTEL is configured
    fn from_env() -> Option<Self> {
        let is_enabled = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok()
            || env::var("OTEL_EXPORTER_OTLP_HEADERS").is_ok()
            || env::var("OTEL_EXPORTER_OTLP_PROTOCOL").is_ok();
        if !is_enabled {
            return None;
        }
        let protocol = env::var("OTEL_EXPORTER_OTLP_PROTOCOL")
            .map(|s| Self::parse(&s))
            .unwrap_or(TelemetryProtocol::HTTP);
        Some(protocol)
    }

    fn parse(s: &str) -> Self {
        match s {
            "grpc" => TelemetryProtocol::GRPC,
            _ => TelemetryProtocol::HTTP,
        }
    }
}

/// Generates a semantic OpenTelemetry `Resource` describing this tool
fn resource() -> Resource {
    let deployment_env = env::var("DEPLOYMENT_ENV").unwrap_or_else(|_| "develop".to_string());
    Resource::builder()
        .with_service_name(env!("CARGO_PKG_NAME"))
        .with_schema_url(
            [
                KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
                KeyValue::new(DEPLOYMENT_ENVIRONMENT_NAME, deployment_env),
            ],
            SCHEMA_URL,
        )
        .build()
}

fn init_tracer_provider(
    telemetry_protocol: TelemetryProtocol,
) -> Result<SdkTracerProvider, opentelemetry_otlp::ExporterBuildError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder();
    let exporter = match telemetry_protocol {
        TelemetryProtocol::HTTP => exporter.with_http().build(),
        TelemetryProtocol::GRPC => exporter.with_tonic().build(),
    }?;
    Ok(SdkTracerProvider::builder()
        .with_sampler(Sampler::ParentBased(Box::new(Sampler::AlwaysOn)))
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource())
        .with_batch_exporter(exporter)
        .build())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installed subscriber; flushes pending spans on drop.
pub struct Telemetry {
    tracer_provider: Option<SdkTracerProvider>,
}

impl Telemetry {
    /// Installs the global subscriber, exporting over OTLP if configured.
    pub fn new() -> Self {
        let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        let tracer_provider = match TelemetryProtocol::from_env().map(init_tracer_provider) {
            Some(Ok(provider)) => Some(provider),
            Some(Err(err)) => {
                eprintln!("Failed to build OTLP span exporter: {err}");
                None
            }
            None => None,
        };
        match tracer_provider.as_ref() {
            Some(provider) => {
                let tracer = provider.tracer("applepay-rs");
                tracing_subscriber::registry()
                    .with(env_filter())
                    .with(fmt_layer)
                    .with(OpenTelemetryLayer::new(tracer))
                    .init();
                tracing::debug!("OpenTelemetry trace export is enabled");
            }
            None => {
                tracing_subscriber::registry()
                    .with(env_filter())
                    .with(fmt_layer)
                    .init();
            }
        }
        Self { tracer_provider }
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Telemetry {
    fn drop(&mut self) {
        if let Some(tracer_provider) = self.tracer_provider.as_ref() {
            if let Err(err) = tracer_provider.shutdown() {
                eprintln!("{err:?}");
            }
        }
    }
}
