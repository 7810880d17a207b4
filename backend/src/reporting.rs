//! Error reporting to a Sentry-compatible collector.
//!
//! Reporting is off unless a DSN is configured. Once enabled, `ERROR`
//! tracing events become reported events and `WARN`/`INFO` events become
//! breadcrumbs, so panics caught by the fanout dispatcher and failed
//! deliveries reach the collector through the ordinary `tracing` calls.
//! Each update is handled under its own hub carrying the sender as the
//! reported user.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sentry::protocol::Event;
use sentry::types::Dsn;
use sentry::{ClientInitGuard, ClientOptions, Hub, SentryFutureExt};
use sentry_tracing::EventFilter;
use thiserror::Error;
use tracing::{Level, info, warn};
use tracing_subscriber::Layer;
use tracing_subscriber::registry::LookupSpan;

use crate::domain::UserId;

const SERVICE_TAG: &str = "librecash";
const COMPONENT_TAG: &str = "telegram-bot";
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Errors raised while enabling reporting.
#[derive(Debug, Error)]
pub enum ReportingError {
    /// The configured DSN does not parse.
    #[error("error_reporting_dsn is not a valid DSN: {0}")]
    InvalidDsn(#[from] sentry::types::ParseDsnError),
}

/// Collector connection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportingConfig {
    /// Collector DSN; reporting is disabled when absent.
    pub dsn: Option<String>,
    /// Deployment label such as `production`.
    pub environment: Option<String>,
}

/// Keeps the reporting client alive; flushes pending events on drop.
pub struct ReportingGuard {
    client: ClientInitGuard,
}

impl ReportingGuard {
    /// Send queued events, waiting at most two seconds.
    pub fn flush(&self) {
        info!("flushing error reports before shutdown");
        if !self.client.flush(Some(FLUSH_TIMEOUT)) {
            warn!("error reports were still pending at shutdown");
        }
    }
}

/// Enable reporting when `config` carries a DSN.
///
/// # Errors
/// [`ReportingError::InvalidDsn`] when the DSN is malformed.
pub fn init_reporting(config: &ReportingConfig) -> Result<Option<ReportingGuard>, ReportingError> {
    let Some(raw) = config.dsn.as_deref().map(str::trim).filter(|dsn| !dsn.is_empty()) else {
        info!("error reporting disabled");
        return Ok(None);
    };
    let options = client_options(raw.parse()?, config.environment.clone());
    info!(environment = ?options.environment, "error reporting enabled");
    Ok(Some(ReportingGuard {
        client: sentry::init(options),
    }))
}

fn client_options(dsn: Dsn, environment: Option<String>) -> ClientOptions {
    ClientOptions {
        dsn: Some(dsn),
        release: sentry::release_name!(),
        environment: environment.map(Cow::Owned),
        attach_stacktrace: true,
        before_send: Some(Arc::new(|mut event: Event<'static>| {
            event.tags.insert("service".to_owned(), SERVICE_TAG.to_owned());
            event.tags.insert("component".to_owned(), COMPONENT_TAG.to_owned());
            Some(event)
        })),
        ..ClientOptions::default()
    }
}

/// Tracing layer forwarding events to the current hub.
///
/// Without an initialised client the layer records nothing.
#[must_use]
pub fn reporting_layer<S>() -> impl Layer<S>
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span>,
{
    sentry_tracing::layer().event_filter(|metadata| match *metadata.level() {
        Level::ERROR => EventFilter::Event,
        Level::WARN | Level::INFO => EventFilter::Breadcrumb,
        Level::DEBUG | Level::TRACE => EventFilter::Ignore,
    })
}

/// Run `future` under a hub that reports `user_id` as the affected user.
pub fn with_reported_user<F>(
    user_id: UserId,
    username: Option<String>,
    future: F,
) -> impl Future<Output = F::Output>
where
    F: Future,
{
    let hub = Arc::new(Hub::new_from_top(Hub::current()));
    hub.configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username,
            ..sentry::User::default()
        }));
    });
    future.bind_hub(hub)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;
    use sentry::Level as SentryLevel;
    use tracing::error;
    use tracing_subscriber::layer::SubscriberExt;

    use super::*;

    fn with_layer(emit: impl FnOnce()) -> Vec<Event<'static>> {
        sentry::test::with_captured_events(|| {
            let subscriber = tracing_subscriber::registry().with(reporting_layer());
            tracing::subscriber::with_default(subscriber, emit);
        })
    }

    #[rstest]
    fn errors_become_events_and_warnings_breadcrumbs() {
        let events = with_layer(|| {
            warn!(listing_id = 7, "fanout job failed");
            error!(listing_id = 7, "fanout job panicked");
        });

        assert_eq!(events.len(), 1, "{events:?}");
        let event = events.first().expect("one event");
        assert_eq!(event.level, SentryLevel::Error);
        assert_eq!(event.message.as_deref(), Some("fanout job panicked"));
        assert!(
            event
                .breadcrumbs
                .values
                .iter()
                .any(|crumb| crumb.message.as_deref() == Some("fanout job failed"))
        );
    }

    #[rstest]
    fn debug_events_are_ignored() {
        let events = with_layer(|| tracing::debug!("dispatching update"));
        assert!(events.is_empty());
    }

    #[rstest]
    fn events_carry_the_reported_user() {
        let events = sentry::test::with_captured_events(|| {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("runtime");
            runtime.block_on(with_reported_user(
                UserId::new(42),
                Some("alice".to_owned()),
                async { sentry::capture_message("delivery failed", SentryLevel::Error) },
            ));
        });

        let user = events
            .first()
            .and_then(|event| event.user.clone())
            .expect("user attached");
        assert_eq!(user.id.as_deref(), Some("42"));
        assert_eq!(user.username.as_deref(), Some("alice"));
    }

    #[rstest]
    #[case(None)]
    #[case(Some("   "))]
    fn missing_dsn_disables_reporting(#[case] dsn: Option<&str>) {
        let config = ReportingConfig {
            dsn: dsn.map(str::to_owned),
            environment: None,
        };
        assert!(init_reporting(&config).expect("no error").is_none());
    }

    #[rstest]
    fn malformed_dsn_is_rejected() {
        let config = ReportingConfig {
            dsn: Some("not a dsn".to_owned()),
            environment: None,
        };
        assert!(matches!(
            init_reporting(&config),
            Err(ReportingError::InvalidDsn(_))
        ));
    }

    #[rstest]
    fn events_are_tagged_with_the_service() {
        let dsn: Dsn = "https://public@errors.example.com/1".parse().expect("dsn");
        let options = client_options(dsn, Some("staging".to_owned()));
        assert_eq!(options.environment.as_deref(), Some("staging"));
        let before_send = options.before_send.clone().expect("hook");
        let event = (*before_send)(Event::default()).expect("kept");

        assert_eq!(event.tags.get("service").map(String::as_str), Some(SERVICE_TAG));
        assert_eq!(event.tags.get("component").map(String::as_str), Some(COMPONENT_TAG));
    }
}
