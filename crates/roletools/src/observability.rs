//! Tracing subscriber setup.
//!
//! Text or JSON logs filtered by `RUST_LOG`, falling back to the configured
//! level. With the `observability` feature, spans are also bridged to
//! OpenTelemetry and exported to stdout.

use crate::LoggingConfig;
use roletools_error::{ConfigError, RoletoolsResult};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

fn env_filter(config: &LoggingConfig, verbose: bool) -> RoletoolsResult<EnvFilter> {
    if verbose {
        return Ok(EnvFilter::new("debug"));
    }
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level()))
        .map_err(|e| ConfigError::new(format!("Invalid log filter '{}': {e}", config.level())).into())
}

fn fmt_layer<S>(config: &LoggingConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    if *config.json() {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_level(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_level(true)
            .boxed()
    }
}

/// Install the global subscriber. `verbose` forces debug output.
///
/// # Errors
///
/// Fails when the configured level is not a valid filter directive.
#[cfg(not(feature = "observability"))]
pub fn init_logging(config: &LoggingConfig, verbose: bool) -> RoletoolsResult<()> {
    tracing_subscriber::registry()
        .with(env_filter(config, verbose)?)
        .with(fmt_layer(config))
        .init();
    Ok(())
}

/// Install the global subscriber with an OpenTelemetry bridge.
///
/// # Errors
///
/// Fails when the configured level is not a valid filter directive.
#[cfg(feature = "observability")]
pub fn init_logging(config: &LoggingConfig, verbose: bool) -> RoletoolsResult<()> {
    use opentelemetry::{KeyValue, global, trace::TracerProvider};
    use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
    use opentelemetry_stdout::SpanExporter;

    let resource = Resource::builder()
        .with_service_name(env!("CARGO_PKG_NAME"))
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
    let otel_layer = tracing_opentelemetry::layer().with_tracer(provider.tracer(env!("CARGO_PKG_NAME")));

    tracing_subscriber::registry()
        .with(env_filter(config, verbose)?)
        .with(fmt_layer(config))
        .with(otel_layer)
        .init();
    Ok(())
}
