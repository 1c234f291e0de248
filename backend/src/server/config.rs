//! Process settings loaded via OrthoConfig.
//!
//! Flags carry an OrthoConfig default; the remaining fields are optional and
//! their accessors resolve the documented default so the rest of the
//! composition root never sees an unset value.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::DispatcherSettings;
use crate::domain::cache_aside::DEFAULT_CACHE_TTL;
use crate::domain::dispatcher::{DEFAULT_DRAIN_TIMEOUT, DEFAULT_HANDLER_TIMEOUT};
use crate::outbound::mail::SmtpSettings;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_USER_SERVICE_URL: &str = "http://localhost:8081";
const DEFAULT_PET_SERVICE_URL: &str = "http://localhost:8082";
const DEFAULT_RPC_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_DB_POOL_SIZE: u32 = 10;
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_SENDER_EMAIL: &str = "noreply@petstore.example";

/// Errors raised while resolving settings into typed values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// A URL setting did not parse.
    #[error("{field} is not a valid URL: {message}")]
    InvalidUrl {
        /// Setting name.
        field: &'static str,
        /// Parser diagnostic.
        message: String,
    },
}

/// Settings shared by every service process.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PETSTORE")]
pub struct ServiceSettings {
    /// Listen address for the HTTP endpoints and probes.
    pub bind_addr: Option<String>,
    /// Postgres URL; unset selects the in-memory store.
    pub database_url: Option<String>,
    /// Leave schema migrations to an out-of-band job instead of running them at startup.
    #[ortho_config(default = false)]
    pub skip_migrations: bool,
    /// Upper bound on pooled Postgres connections.
    pub db_pool_size: Option<u32>,
    /// Redis URL; unset selects the in-memory cache and in-process bus.
    pub redis_url: Option<String>,
    /// Lifetime of cached entities.
    pub cache_ttl_seconds: Option<u64>,
    /// Base URL of the user service.
    pub user_service_url: Option<String>,
    /// Base URL of the pet service.
    pub pet_service_url: Option<String>,
    /// Deadline for outbound lookups and connection checkouts.
    pub rpc_timeout_ms: Option<u64>,
    /// SMTP relay; unset selects the log-only mailer.
    pub smtp_host: Option<String>,
    /// SMTP relay port.
    pub smtp_port: Option<u16>,
    /// SMTP login user.
    pub smtp_username: Option<String>,
    /// SMTP login password.
    pub smtp_password: Option<String>,
    /// Sender address on notification emails.
    pub sender_email: Option<String>,
    /// Per-message handler deadline in the notification worker.
    pub handler_timeout_seconds: Option<u64>,
    /// Shutdown drain deadline in the notification worker.
    pub drain_timeout_seconds: Option<u64>,
    /// Concurrent handler bound; unset means unbounded.
    pub max_in_flight: Option<usize>,
}

impl ServiceSettings {
    /// Listen address, defaulting to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> &str {
        self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    }

    /// Postgres pool bound, defaulting to ten connections. Zero falls back to the default.
    pub fn db_pool_size(&self) -> u32 {
        self.db_pool_size
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_DB_POOL_SIZE)
    }

    /// Cache entry lifetime, defaulting to one hour.
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl_seconds
            .map_or(DEFAULT_CACHE_TTL, Duration::from_secs)
    }

    /// Outbound call deadline, defaulting to five seconds.
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms.unwrap_or(DEFAULT_RPC_TIMEOUT_MS))
    }

    /// Parsed user service base URL.
    pub fn user_service_url(&self) -> Result<Url, SettingsError> {
        parse_url(
            "user_service_url",
            self.user_service_url
                .as_deref()
                .unwrap_or(DEFAULT_USER_SERVICE_URL),
        )
    }

    /// Parsed pet service base URL.
    pub fn pet_service_url(&self) -> Result<Url, SettingsError> {
        parse_url(
            "pet_service_url",
            self.pet_service_url
                .as_deref()
                .unwrap_or(DEFAULT_PET_SERVICE_URL),
        )
    }

    /// Relay settings when a host is configured.
    pub fn smtp(&self) -> Option<SmtpSettings> {
        let host = self.smtp_host.as_deref()?.trim();
        if host.is_empty() {
            return None;
        }
        Some(SmtpSettings {
            host: host.to_owned(),
            port: self.smtp_port.unwrap_or(DEFAULT_SMTP_PORT),
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            sender: self.sender_email().to_owned(),
            timeout: self.rpc_timeout(),
        })
    }

    /// Sender address, defaulting to `noreply@petstore.example`.
    pub fn sender_email(&self) -> &str {
        self.sender_email.as_deref().unwrap_or(DEFAULT_SENDER_EMAIL)
    }

    /// Dispatcher tuning for the notification worker.
    pub fn dispatcher(&self) -> DispatcherSettings {
        DispatcherSettings {
            handler_timeout: self
                .handler_timeout_seconds
                .map_or(DEFAULT_HANDLER_TIMEOUT, Duration::from_secs),
            drain_timeout: self
                .drain_timeout_seconds
                .map_or(DEFAULT_DRAIN_TIMEOUT, Duration::from_secs),
            max_in_flight: self.max_in_flight.filter(|limit| *limit > 0),
        }
    }
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, SettingsError> {
    Url::parse(raw).map_err(|err| SettingsError::InvalidUrl {
        field,
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    //! Settings resolution from the environment.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 17] = [
        "PETSTORE_BIND_ADDR",
        "PETSTORE_DATABASE_URL",
        "PETSTORE_SKIP_MIGRATIONS",
        "PETSTORE_DB_POOL_SIZE",
        "PETSTORE_REDIS_URL",
        "PETSTORE_CACHE_TTL_SECONDS",
        "PETSTORE_USER_SERVICE_URL",
        "PETSTORE_PET_SERVICE_URL",
        "PETSTORE_RPC_TIMEOUT_MS",
        "PETSTORE_SMTP_HOST",
        "PETSTORE_SMTP_PORT",
        "PETSTORE_SMTP_USERNAME",
        "PETSTORE_SMTP_PASSWORD",
        "PETSTORE_SENDER_EMAIL",
        "PETSTORE_HANDLER_TIMEOUT_SECONDS",
        "PETSTORE_DRAIN_TIMEOUT_SECONDS",
        "PETSTORE_MAX_IN_FLIGHT",
    ];

    fn env_with(overrides: &[(&str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    fn load_from_empty_args() -> ServiceSettings {
        ServiceSettings::load_from_iter([OsString::from("adoption-backend")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_nothing_is_set() {
        let _guard = lock_env(env_with(&[]));

        let settings = load_from_empty_args();
        assert_eq!(settings.bind_addr(), "0.0.0.0:8080");
        assert!(settings.database_url.is_none());
        assert!(!settings.skip_migrations);
        assert_eq!(settings.db_pool_size(), 10);
        assert!(settings.redis_url.is_none());
        assert_eq!(settings.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(settings.rpc_timeout(), Duration::from_secs(5));
        assert_eq!(
            settings.user_service_url().expect("default url").as_str(),
            "http://localhost:8081/"
        );
        assert!(settings.smtp().is_none());
        assert_eq!(settings.dispatcher(), DispatcherSettings::default());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(env_with(&[
            ("PETSTORE_BIND_ADDR", "127.0.0.1:9090"),
            ("PETSTORE_SKIP_MIGRATIONS", "true"),
            ("PETSTORE_DB_POOL_SIZE", "24"),
            ("PETSTORE_CACHE_TTL_SECONDS", "120"),
            ("PETSTORE_PET_SERVICE_URL", "http://pets.internal:9000"),
            ("PETSTORE_SMTP_HOST", "smtp.example.com"),
            ("PETSTORE_SMTP_PORT", "465"),
            ("PETSTORE_SENDER_EMAIL", "adoptions@example.com"),
            ("PETSTORE_HANDLER_TIMEOUT_SECONDS", "3"),
            ("PETSTORE_MAX_IN_FLIGHT", "4"),
        ]));

        let settings = load_from_empty_args();
        assert_eq!(settings.bind_addr(), "127.0.0.1:9090");
        assert!(settings.skip_migrations);
        assert_eq!(settings.db_pool_size(), 24);
        assert_eq!(settings.cache_ttl(), Duration::from_secs(120));
        assert_eq!(
            settings.pet_service_url().expect("valid url").host_str(),
            Some("pets.internal")
        );
        let smtp = settings.smtp().expect("smtp configured");
        assert_eq!(smtp.port, 465);
        assert_eq!(smtp.sender, "adoptions@example.com");
        let dispatcher = settings.dispatcher();
        assert_eq!(dispatcher.handler_timeout, Duration::from_secs(3));
        assert_eq!(dispatcher.drain_timeout, DEFAULT_DRAIN_TIMEOUT);
        assert_eq!(dispatcher.max_in_flight, Some(4));
    }

    #[rstest]
    #[case(Some("   "))]
    #[case(None)]
    fn blank_smtp_host_selects_log_mailer(#[case] host: Option<&str>) {
        let settings = ServiceSettings {
            smtp_host: host.map(str::to_owned),
            ..ServiceSettings::default()
        };
        assert!(settings.smtp().is_none());
    }

    #[test]
    fn zero_in_flight_limit_means_unbounded() {
        let settings = ServiceSettings {
            max_in_flight: Some(0),
            ..ServiceSettings::default()
        };
        assert_eq!(settings.dispatcher().max_in_flight, None);
    }

    #[rstest]
    #[case(None, 10)]
    #[case(Some(0), 10)]
    #[case(Some(3), 3)]
    fn pool_size_falls_back_when_unset_or_zero(#[case] size: Option<u32>, #[case] expected: u32) {
        let settings = ServiceSettings {
            db_pool_size: size,
            ..ServiceSettings::default()
        };
        assert_eq!(settings.db_pool_size(), expected);
    }

    #[test]
    fn invalid_urls_name_the_setting() {
        let settings = ServiceSettings {
            user_service_url: Some("not a url".to_owned()),
            ..ServiceSettings::default()
        };
        let error = settings.user_service_url().expect_err("invalid url");
        assert!(matches!(
            error,
            SettingsError::InvalidUrl {
                field: "user_service_url",
                ..
            }
        ));
    }
}
