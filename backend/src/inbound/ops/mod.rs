//! Operational HTTP surface: health probes and, with the `metrics` feature,
//! the Prometheus scrape endpoint.
//!
//! Both the listener and the delivery worker run one of these next to their
//! main loop; the bot itself speaks no HTTP.

mod health;

use std::net::SocketAddr;

use actix_web::dev::Server;
use actix_web::{App, HttpServer, web};
#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

pub use health::{HealthState, ReadinessProbe, live, ready};

/// Ops server settings.
pub struct OpsServerConfig {
    /// Listener address.
    pub bind_addr: SocketAddr,
    /// Middleware serving `/metrics` and recording request counters.
    #[cfg(feature = "metrics")]
    pub prometheus: PrometheusMetrics,
}

/// Bind the ops server.
///
/// The returned [`Server`] must be awaited (or spawned) to accept requests.
/// A single worker is enough for probe traffic.
///
/// # Errors
/// Propagates [`std::io::Error`] when the socket cannot be bound.
pub fn create_ops_server(
    health_state: web::Data<HealthState>,
    config: OpsServerConfig,
) -> std::io::Result<Server> {
    let OpsServerConfig {
        bind_addr,
        #[cfg(feature = "metrics")]
        prometheus,
    } = config;

    let server = HttpServer::new(move || {
        let probes = App::new()
            .app_data(health_state.clone())
            .service(ready)
            .service(live);

        #[cfg(feature = "metrics")]
        let app = probes.wrap(prometheus.clone());
        #[cfg(not(feature = "metrics"))]
        let app = probes;

        app
    })
    .workers(1)
    .disable_signals()
    .bind(bind_addr)?
    .run();
    Ok(server)
}
