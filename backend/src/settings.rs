//! Process configuration loaded via OrthoConfig.
//!
//! Every field can come from a `LIBRECASH_*` environment variable or the
//! configuration file; accessors apply defaults and validation so callers
//! never see a half-configured value.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;
use zeroize::Zeroizing;

use crate::domain::ChatId;
use crate::outbound::telegram::DEFAULT_TELEGRAM_API_URL;
use crate::reporting::ReportingConfig;

const DEFAULT_LOCALES_DIR: &str = "locales";
const DEFAULT_SEND_RATE_PER_SECOND: u32 = 30;
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_OPS_PORT: u16 = 8081;
const DEFAULT_FANOUT_CHANNEL_CAPACITY: usize = 256;
const DEFAULT_DATABASE_POOL_SIZE: u32 = 10;
const DEFAULT_PID_DIR: &str = ".";

/// Errors raised when a required or malformed setting is used.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// `LIBRECASH_TELEGRAM_TOKEN` is unset or blank.
    #[error("telegram_token is required")]
    MissingTelegramToken,
    /// `LIBRECASH_DATABASE_URL` is unset or blank.
    #[error("database_url is required")]
    MissingDatabaseUrl,
    /// The Bot API base URL does not parse.
    #[error("telegram_api_url is not a valid URL: {0}")]
    InvalidApiUrl(#[from] url::ParseError),
    /// The send rate is zero.
    #[error("send_rate_per_second must be at least 1")]
    ZeroSendRate,
}

/// Runtime settings shared by every subcommand.
#[derive(Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LIBRECASH")]
pub struct AppSettings {
    /// Bot API token.
    pub telegram_token: Option<String>,
    /// Bot API base URL override.
    pub telegram_api_url: Option<String>,
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Connections each process keeps open.
    pub database_pool_size: Option<u32>,
    /// Chat that receives new-user notices.
    pub admin_channel_chat_id: Option<i64>,
    /// Directory holding `<code>.json` catalogs.
    pub locales_dir: Option<PathBuf>,
    /// Delivery worker rate ceiling.
    pub send_rate_per_second: Option<u32>,
    /// Long-poll wait in seconds.
    pub poll_timeout_secs: Option<u64>,
    /// Health and metrics listener.
    pub ops_bind_addr: Option<SocketAddr>,
    /// Bound of the live fanout job channel.
    pub fanout_channel_capacity: Option<usize>,
    /// Directory holding the per-subcommand PID lock files.
    pub pid_dir: Option<PathBuf>,
    /// Sentry-compatible collector DSN; reporting is off when unset.
    pub error_reporting_dsn: Option<String>,
    /// Environment label attached to reported errors.
    pub error_reporting_environment: Option<String>,
}

impl fmt::Debug for AppSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppSettings")
            .field("telegram_token", &self.telegram_token.as_ref().map(|_| "<redacted>"))
            .field("telegram_api_url", &self.telegram_api_url)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("database_pool_size", &self.database_pool_size)
            .field("admin_channel_chat_id", &self.admin_channel_chat_id)
            .field("locales_dir", &self.locales_dir)
            .field("send_rate_per_second", &self.send_rate_per_second)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("ops_bind_addr", &self.ops_bind_addr)
            .field("fanout_channel_capacity", &self.fanout_channel_capacity)
            .field("pid_dir", &self.pid_dir)
            .field(
                "error_reporting_dsn",
                &self.error_reporting_dsn.as_ref().map(|_| "<redacted>"),
            )
            .field("error_reporting_environment", &self.error_reporting_environment)
            .finish()
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl AppSettings {
    /// Bot token wrapped for zeroisation on drop.
    ///
    /// # Errors
    /// [`SettingsError::MissingTelegramToken`] when unset or blank.
    pub fn telegram_token(&self) -> Result<Zeroizing<String>, SettingsError> {
        non_blank(self.telegram_token.as_ref())
            .map(|token| Zeroizing::new(token.to_owned()))
            .ok_or(SettingsError::MissingTelegramToken)
    }

    /// Bot API base URL.
    ///
    /// # Errors
    /// [`SettingsError::InvalidApiUrl`] when the override does not parse.
    pub fn telegram_api_url(&self) -> Result<Url, SettingsError> {
        let raw = non_blank(self.telegram_api_url.as_ref()).unwrap_or(DEFAULT_TELEGRAM_API_URL);
        Ok(Url::parse(raw)?)
    }

    /// Database connection string.
    ///
    /// # Errors
    /// [`SettingsError::MissingDatabaseUrl`] when unset or blank.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        non_blank(self.database_url.as_ref()).ok_or(SettingsError::MissingDatabaseUrl)
    }

    /// Pool size for the PostgreSQL adapters.
    #[must_use]
    pub fn database_pool_size(&self) -> u32 {
        self.database_pool_size.unwrap_or(DEFAULT_DATABASE_POOL_SIZE)
    }

    /// Admin channel, if configured.
    #[must_use]
    pub fn admin_chat_id(&self) -> Option<ChatId> {
        self.admin_channel_chat_id.map(ChatId::new)
    }

    /// Locales directory.
    #[must_use]
    pub fn locales_dir(&self) -> PathBuf {
        self.locales_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCALES_DIR))
    }

    /// Delivery rate ceiling.
    ///
    /// # Errors
    /// [`SettingsError::ZeroSendRate`] when configured as zero.
    pub fn send_rate_per_second(&self) -> Result<u32, SettingsError> {
        match self.send_rate_per_second {
            Some(0) => Err(SettingsError::ZeroSendRate),
            Some(rate) => Ok(rate),
            None => Ok(DEFAULT_SEND_RATE_PER_SECOND),
        }
    }

    /// Long-poll wait.
    #[must_use]
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs.unwrap_or(DEFAULT_POLL_TIMEOUT_SECS))
    }

    /// Health and metrics listener address.
    #[must_use]
    pub fn ops_bind_addr(&self) -> SocketAddr {
        self.ops_bind_addr
            .unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_OPS_PORT)))
    }

    /// Live fanout channel bound.
    #[must_use]
    pub fn fanout_channel_capacity(&self) -> usize {
        self.fanout_channel_capacity
            .unwrap_or(DEFAULT_FANOUT_CHANNEL_CAPACITY)
            .max(1)
    }

    /// PID lock file for the `role` subcommand, e.g. `librecash-listen.pid`.
    #[must_use]
    pub fn pid_file(&self, role: &str) -> PathBuf {
        self.pid_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PID_DIR))
            .join(format!("librecash-{role}.pid"))
    }

    /// Error reporting collector settings.
    #[must_use]
    pub fn reporting(&self) -> ReportingConfig {
        ReportingConfig {
            dsn: non_blank(self.error_reporting_dsn.as_ref()).map(str::to_owned),
            environment: non_blank(self.error_reporting_environment.as_ref()).map(str::to_owned),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for configuration loading.

    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    use super::*;

    const KEYS: [&str; 13] = [
        "LIBRECASH_TELEGRAM_TOKEN",
        "LIBRECASH_TELEGRAM_API_URL",
        "LIBRECASH_DATABASE_URL",
        "LIBRECASH_DATABASE_POOL_SIZE",
        "LIBRECASH_ADMIN_CHANNEL_CHAT_ID",
        "LIBRECASH_LOCALES_DIR",
        "LIBRECASH_SEND_RATE_PER_SECOND",
        "LIBRECASH_POLL_TIMEOUT_SECS",
        "LIBRECASH_OPS_BIND_ADDR",
        "LIBRECASH_FANOUT_CHANNEL_CAPACITY",
        "LIBRECASH_PID_DIR",
        "LIBRECASH_ERROR_REPORTING_DSN",
        "LIBRECASH_ERROR_REPORTING_ENVIRONMENT",
    ];

    fn load_with(overrides: &[(&str, &str)]) -> AppSettings {
        let vars: Vec<(&str, Option<String>)> = KEYS
            .iter()
            .map(|key| {
                let value = overrides
                    .iter()
                    .find(|(name, _)| name == key)
                    .map(|(_, value)| (*value).to_owned());
                (*key, value)
            })
            .collect();
        let _guard = lock_env(vars);
        AppSettings::load_from_iter([OsString::from("librecash")]).expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let settings = load_with(&[]);
        assert_eq!(
            settings.telegram_api_url().expect("default url").as_str(),
            "https://api.telegram.org/"
        );
        assert_eq!(settings.send_rate_per_second().expect("rate"), 30);
        assert_eq!(settings.poll_timeout(), Duration::from_secs(30));
        assert_eq!(settings.ops_bind_addr().to_string(), "0.0.0.0:8081");
        assert_eq!(settings.fanout_channel_capacity(), 256);
        assert_eq!(settings.database_pool_size(), 10);
        assert_eq!(settings.locales_dir(), PathBuf::from("locales"));
        assert!(settings.admin_chat_id().is_none());
        assert_eq!(settings.pid_file("listen"), PathBuf::from("./librecash-listen.pid"));
        assert_eq!(settings.reporting(), ReportingConfig::default());
        assert!(matches!(
            settings.telegram_token(),
            Err(SettingsError::MissingTelegramToken)
        ));
        assert!(matches!(
            settings.database_url(),
            Err(SettingsError::MissingDatabaseUrl)
        ));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let settings = load_with(&[
            ("LIBRECASH_TELEGRAM_TOKEN", "123:abc"),
            ("LIBRECASH_DATABASE_URL", "postgres://localhost/librecash"),
            ("LIBRECASH_ADMIN_CHANNEL_CHAT_ID", "-1001234"),
            ("LIBRECASH_SEND_RATE_PER_SECOND", "10"),
            ("LIBRECASH_OPS_BIND_ADDR", "127.0.0.1:9000"),
            ("LIBRECASH_DATABASE_POOL_SIZE", "4"),
            ("LIBRECASH_PID_DIR", "/run/librecash"),
            ("LIBRECASH_ERROR_REPORTING_DSN", "https://key@errors.example.com/3"),
            ("LIBRECASH_ERROR_REPORTING_ENVIRONMENT", "production"),
        ]);
        assert_eq!(settings.telegram_token().expect("token").as_str(), "123:abc");
        assert_eq!(
            settings.database_url().expect("url"),
            "postgres://localhost/librecash"
        );
        assert_eq!(settings.admin_chat_id(), Some(ChatId::new(-1_001_234)));
        assert_eq!(settings.send_rate_per_second().expect("rate"), 10);
        assert_eq!(settings.ops_bind_addr().port(), 9000);
        assert_eq!(settings.database_pool_size(), 4);
        assert_eq!(
            settings.pid_file("send"),
            PathBuf::from("/run/librecash/librecash-send.pid")
        );
        assert_eq!(
            settings.reporting(),
            ReportingConfig {
                dsn: Some("https://key@errors.example.com/3".to_owned()),
                environment: Some("production".to_owned()),
            }
        );
    }

    #[rstest]
    fn zero_rate_is_rejected() {
        let settings = AppSettings {
            send_rate_per_second: Some(0),
            ..AppSettings::default()
        };
        assert!(matches!(
            settings.send_rate_per_second(),
            Err(SettingsError::ZeroSendRate)
        ));
    }

    #[rstest]
    fn malformed_api_url_is_rejected() {
        let settings = AppSettings {
            telegram_api_url: Some("not a url".to_owned()),
            ..AppSettings::default()
        };
        assert!(matches!(
            settings.telegram_api_url(),
            Err(SettingsError::InvalidApiUrl(_))
        ));
    }

    #[rstest]
    fn debug_output_redacts_secrets() {
        let settings = AppSettings {
            telegram_token: Some("123:secret".to_owned()),
            database_url: Some("postgres://user:pw@db/librecash".to_owned()),
            error_reporting_dsn: Some("https://dsnkey@errors.example.com/3".to_owned()),
            ..AppSettings::default()
        };
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("secret"));
        assert!(!rendered.contains("pw@db"));
        assert!(!rendered.contains("dsnkey"));
    }
}
