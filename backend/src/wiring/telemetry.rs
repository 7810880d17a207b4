//! Tracing, error reporting and metrics initialisation.

use std::sync::Arc;

#[cfg(feature = "metrics")]
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use color_eyre::eyre::Result;
#[cfg(feature = "metrics")]
use color_eyre::eyre::eyre;
use librecash::domain::ports::BotMetrics;
#[cfg(not(feature = "metrics"))]
use librecash::domain::ports::NoOpBotMetrics;
#[cfg(feature = "metrics")]
use librecash::outbound::metrics::PrometheusBotMetrics;
use librecash::reporting::reporting_layer;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Metrics sink for the domain plus, with the `metrics` feature, the
/// middleware serving `/metrics`.
pub(crate) struct Telemetry {
    pub(crate) metrics: Arc<dyn BotMetrics>,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: PrometheusMetrics,
}

/// Install JSON tracing plus the error-reporting layer and build the
/// metrics sink.
///
/// A second tracing initialisation is logged and ignored.
pub(crate) fn init_telemetry() -> Result<Telemetry> {
    if let Err(error) = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().json())
        .with(reporting_layer())
        .try_init()
    {
        warn!(error = %error, "tracing init failed");
    }
    build_metrics()
}

#[cfg(feature = "metrics")]
fn build_metrics() -> Result<Telemetry> {
    let prometheus = PrometheusMetricsBuilder::new("librecash")
        .endpoint("/metrics")
        .build()
        .map_err(|error| eyre!("failed to configure Prometheus: {error}"))?;
    let metrics = PrometheusBotMetrics::new(&prometheus.registry)?;
    Ok(Telemetry {
        metrics: Arc::new(metrics),
        prometheus,
    })
}

#[cfg(not(feature = "metrics"))]
#[expect(
    clippy::unnecessary_wraps,
    reason = "mirrors the fallible Prometheus build"
)]
fn build_metrics() -> Result<Telemetry> {
    Ok(Telemetry {
        metrics: Arc::new(NoOpBotMetrics),
    })
}
