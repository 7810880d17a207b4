//! Liveness and readiness probes for orchestrators.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use async_trait::async_trait;
use tracing::warn;

use crate::outbound::persistence::DbPool;

/// Dependency check consulted by the readiness probe.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// `Err` carries a short reason when the dependency is unusable.
    async fn check(&self) -> Result<(), String>;
}

#[async_trait]
impl ReadinessProbe for DbPool {
    async fn check(&self) -> Result<(), String> {
        self.ping().await.map_err(|error| error.to_string())
    }
}

/// Shared probe state.
///
/// Starts live but not ready. The process marks itself ready once its
/// workers are running and unhealthy when shutdown begins.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
    probe: Option<Arc<dyn ReadinessProbe>>,
}

impl HealthState {
    /// State with an optional dependency probe.
    #[must_use]
    pub const fn new(probe: Option<Arc<dyn ReadinessProbe>>) -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
            probe,
        }
    }

    /// Mark the process as ready.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Fail liveness so orchestrators notice the drain.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Whether the process is alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Whether the process is ready and its dependency answers.
    pub async fn is_ready(&self) -> bool {
        if !self.ready.load(Ordering::Acquire) || !self.is_alive() {
            return false;
        }
        let Some(probe) = &self.probe else {
            return true;
        };
        if let Err(reason) = probe.check().await {
            warn!(reason = %reason, "readiness dependency check failed");
            return false;
        }
        true
    }
}

fn probe_response(probe_ok: bool) -> HttpResponse {
    let mut response = if probe_ok {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };
    response
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}

/// 200 once ready and the dependency check passes, 503 otherwise.
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    probe_response(state.is_ready().await)
}

/// 200 while alive, 503 once draining.
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    probe_response(state.is_alive())
}

#[cfg(test)]
mod tests {
    //! Regression coverage for the probe handlers.
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;

    use super::*;

    async fn status(state: HealthState, path: &str) -> StatusCode {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(ready)
                .service(live),
        )
        .await;
        let request = actix_test::TestRequest::get().uri(path).to_request();
        actix_test::call_service(&app, request).await.status()
    }

    fn probe(result: Result<(), String>) -> Option<Arc<dyn ReadinessProbe>> {
        let mut probe = MockReadinessProbe::new();
        probe.expect_check().returning(move || result.clone());
        Some(Arc::new(probe))
    }

    #[rstest]
    #[actix_rt::test]
    async fn not_ready_until_marked() {
        assert_eq!(
            status(HealthState::new(None), "/health/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[rstest]
    #[case(Ok(()), StatusCode::OK)]
    #[case(Err("connection refused".to_owned()), StatusCode::SERVICE_UNAVAILABLE)]
    #[actix_rt::test]
    async fn readiness_follows_the_dependency(
        #[case] check: Result<(), String>,
        #[case] expected: StatusCode,
    ) {
        let state = HealthState::new(probe(check));
        state.mark_ready();
        assert_eq!(status(state, "/health/ready").await, expected);
    }

    #[rstest]
    #[actix_rt::test]
    async fn draining_fails_both_probes() {
        let health = HealthState::new(None);
        health.mark_ready();
        health.mark_unhealthy();
        let state = web::Data::new(health);
        let app = actix_test::init_service(
            App::new()
                .app_data(state.clone())
                .service(ready)
                .service(live),
        )
        .await;
        for path in ["/health/live", "/health/ready"] {
            let request = actix_test::TestRequest::get().uri(path).to_request();
            let response = actix_test::call_service(&app, request).await;
            assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE, "{path}");
            assert_eq!(
                response
                    .headers()
                    .get(header::CACHE_CONTROL)
                    .and_then(|value| value.to_str().ok()),
                Some("no-store")
            );
        }
    }
}
