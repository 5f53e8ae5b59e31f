//! Process-wide tracing setup: `RUST_LOG`-filtered output on stderr, plus an
//! OTLP exporter when a collector URL is configured.

use std::{env, io};

use opentelemetry::trace::{TraceError, TracerProvider as _};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace::Tracer};
use thiserror::Error;
use tracing::*;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{
    layer::SubscriberExt,
    registry::LookupSpan,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter, Layer,
};

pub const OTLP_URL_ENVVAR: &str = "VALMON_OTLP_URL";
pub const SVC_LABEL_ENVVAR: &str = "VALMON_SVC_LABEL";

const TRACER_NAME: &str = "valmon";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("otlp exporter: {0}")]
    Otlp(#[from] TraceError),

    #[error("global subscriber: {0}")]
    AlreadyInstalled(#[from] TryInitError),
}

/// Who is logging, and where spans go besides stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    whoami: String,
    otlp_url: Option<String>,
}

impl LoggerConfig {
    pub fn new(whoami: impl Into<String>) -> Self {
        Self {
            whoami: whoami.into(),
            otlp_url: None,
        }
    }

    /// Reads the service label and collector URL from the environment. The
    /// label, if any, is appended to `base` as `base%label`.
    pub fn from_env(base: &str) -> Self {
        Self::from_vars(base, |var| env::var(var).ok())
    }

    fn from_vars(base: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let whoami = match lookup(SVC_LABEL_ENVVAR) {
            Some(label) => format!("{base}%{label}"),
            None => base.to_owned(),
        };
        Self {
            whoami,
            otlp_url: lookup(OTLP_URL_ENVVAR).filter(|url| !url.trim().is_empty()),
        }
    }

    pub fn with_otlp_url(mut self, url: impl Into<String>) -> Self {
        self.otlp_url = Some(url.into());
        self
    }

    pub fn whoami(&self) -> &str {
        &self.whoami
    }

    pub fn otlp_url(&self) -> Option<&str> {
        self.otlp_url.as_deref()
    }
}

/// Installs the global subscriber. Must run inside a Tokio runtime when an
/// OTLP URL is set, since the batch exporter is spawned on it.
pub fn init(config: &LoggerConfig) -> Result<(), LoggingError> {
    let stderr = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(io::stderr)
        .with_filter(EnvFilter::from_default_env());
    let otlp = config.otlp_url().map(otlp_layer).transpose()?;

    tracing_subscriber::registry()
        .with(stderr)
        .with(otlp)
        .try_init()?;

    debug!(whoami = %config.whoami, otlp = ?config.otlp_url, "logging started");
    Ok(())
}

fn otlp_layer<S>(url: &str) -> Result<OpenTelemetryLayer<S, Tracer>, TraceError>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let provider = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(opentelemetry_otlp::new_exporter().tonic().with_endpoint(url))
        .install_batch(runtime::Tokio)?;
    let tracer = provider.tracer(TRACER_NAME);
    // finalize() flushes through the global handle
    opentelemetry::global::set_tracer_provider(provider);
    Ok(tracing_opentelemetry::layer().with_tracer(tracer))
}

/// Flushes pending OTLP batches. A no-op when no exporter was installed.
pub fn finalize() {
    debug!("shutting down logging");
    opentelemetry::global::shutdown_tracer_provider();
}
