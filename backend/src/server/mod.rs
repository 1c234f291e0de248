//! Composition root: pick adapters from settings and run one service process.
//!
//! Purpose: Each process hosts exactly one role. The HTTP roles serve their
//! RPC endpoints plus probes; the notification role runs the event dispatcher
//! and serves probes only.
//!
//! Adapter selection: a database URL selects the Postgres store (migrations
//! run at startup), otherwise records live in memory. A Redis URL selects the
//! Redis cache and pub/sub bus, otherwise both are in-process.

mod config;

pub use config::{ServiceSettings, SettingsError};

use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, web};
use clap::Subcommand;
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use crate::domain::ports::{EntityCache, EntityStore, EventBus, EventBusError, Mailer, MailerError};
use crate::domain::{
    ApplicationWorkflow, CacheAsideRepository, DrainOutcome, Entity, EventDispatcher,
    NotificationComposer, PetService, UserService,
};
use crate::inbound::http::RequestSpan;
use crate::inbound::http::health::HealthState;
use crate::inbound::http::routes;
use crate::outbound::bus::{BusApplicationEventPublisher, InMemoryEventBus, RedisEventBus};
use crate::outbound::cache::{InMemoryEntityCache, RedisEntityCache};
use crate::outbound::directory::{HttpPetDirectory, HttpUserDirectory};
use crate::outbound::mail::{LogMailer, SmtpMailer};
use crate::outbound::persistence::{
    DbPool, DieselEntityStore, InMemoryEntityStore, MigrationError, PoolConfig, PoolError,
    run_pending_migrations,
};
use crate::outbound::redis::{RedisPool, RedisPoolError};

/// Which service this process hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum ServiceRole {
    /// User records over `/rpc/users`.
    Users,
    /// Pet listings over `/rpc/pets`.
    Pets,
    /// Adoption applications over `/rpc/applications`.
    Applications,
    /// Notification worker consuming application events.
    Notifications,
}

impl ServiceRole {
    /// Name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Pets => "pets",
            Self::Applications => "applications",
            Self::Notifications => "notifications",
        }
    }
}

/// Failures that stop a process from starting or serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A setting could not be resolved.
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// The Postgres pool could not be built.
    #[error(transparent)]
    Database(#[from] PoolError),
    /// Schema migrations failed.
    #[error(transparent)]
    Migrations(#[from] MigrationError),
    /// The Redis pool could not be built.
    #[error(transparent)]
    Redis(#[from] RedisPoolError),
    /// The SMTP transport could not be built.
    #[error(transparent)]
    Mailer(#[from] MailerError),
    /// An outbound HTTP client could not be built.
    #[error("failed to build directory client: {0}")]
    Directory(#[from] reqwest::Error),
    /// The dispatcher could not subscribe.
    #[error(transparent)]
    Bus(#[from] EventBusError),
    /// Binding or serving HTTP failed.
    #[error("http server failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Connections shared by every repository a process builds.
#[derive(Clone)]
pub struct Infrastructure {
    db: Option<DbPool>,
    redis: Option<RedisPool>,
    cache_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl Infrastructure {
    /// Dial the configured backends, running migrations when Postgres is used
    /// unless `skip_migrations` is set.
    ///
    /// # Errors
    ///
    /// Fails when a configured backend is unreachable or migrations fail.
    pub async fn connect(settings: &ServiceSettings) -> Result<Self, ServerError> {
        let db = match settings.database_url.as_deref() {
            Some(url) => {
                if settings.skip_migrations {
                    info!("skipping schema migrations");
                } else {
                    run_pending_migrations(url).await?;
                }
                let config = PoolConfig::new(url)
                    .with_max_size(settings.db_pool_size())
                    .with_connection_timeout(settings.rpc_timeout());
                Some(DbPool::new(config).await?)
            }
            None => {
                warn!("no database configured; records are held in memory");
                None
            }
        };
        let redis = match settings.redis_url.as_deref() {
            Some(url) => Some(RedisPool::connect(url, settings.rpc_timeout()).await?),
            None => {
                warn!("no redis configured; cache and event bus are in-process");
                None
            }
        };
        Ok(Self {
            db,
            redis,
            cache_ttl: settings.cache_ttl(),
            clock: Arc::new(DefaultClock),
        })
    }

    /// In-memory store, cache and bus with the given cache lifetime.
    pub fn in_memory(cache_ttl: Duration) -> Self {
        Self {
            db: None,
            redis: None,
            cache_ttl,
            clock: Arc::new(DefaultClock),
        }
    }

    /// Cache-aside repository over the selected store and cache.
    pub fn repository<E: Entity>(&self) -> CacheAsideRepository<E> {
        let store: Arc<dyn EntityStore<E>> = match &self.db {
            Some(pool) => Arc::new(DieselEntityStore::<E>::new(pool.clone())),
            None => Arc::new(InMemoryEntityStore::<E>::new()),
        };
        let cache: Arc<dyn EntityCache<E>> = match &self.redis {
            Some(pool) => Arc::new(RedisEntityCache::<E>::new(pool.clone())),
            None => Arc::new(InMemoryEntityCache::<E>::new()),
        };
        CacheAsideRepository::new(store, cache, Arc::clone(&self.clock)).with_ttl(self.cache_ttl)
    }

    /// Event bus over Redis pub/sub, or in-process when Redis is absent.
    pub fn event_bus(&self) -> Arc<dyn EventBus> {
        match &self.redis {
            Some(pool) => Arc::new(RedisEventBus::new(pool.clone())),
            None => Arc::new(InMemoryEventBus::new()),
        }
    }
}

/// Run one service process until the HTTP server receives a stop signal.
///
/// # Errors
///
/// Returns the first startup failure, or the server's I/O error.
pub async fn run(role: ServiceRole, settings: ServiceSettings) -> Result<(), ServerError> {
    let infrastructure = Infrastructure::connect(&settings).await?;
    info!(
        service = role.name(),
        bind_addr = settings.bind_addr(),
        "starting service"
    );
    match role {
        ServiceRole::Users => {
            let service = web::Data::new(UserService::new(infrastructure.repository()));
            serve(settings.bind_addr(), move |cfg: &mut web::ServiceConfig| {
                cfg.app_data(service.clone());
                routes::user_service(cfg);
            })
            .await?;
        }
        ServiceRole::Pets => {
            let service = web::Data::new(PetService::new(infrastructure.repository()));
            serve(settings.bind_addr(), move |cfg: &mut web::ServiceConfig| {
                cfg.app_data(service.clone());
                routes::pet_service(cfg);
            })
            .await?;
        }
        ServiceRole::Applications => {
            let bus = infrastructure.event_bus();
            let publisher = Arc::new(BusApplicationEventPublisher::new(Arc::clone(&bus)));
            let workflow = web::Data::new(ApplicationWorkflow::new(
                infrastructure.repository(),
                publisher,
            ));
            let served = serve(settings.bind_addr(), move |cfg: &mut web::ServiceConfig| {
                cfg.app_data(workflow.clone());
                routes::application_service(cfg);
            })
            .await;
            close_bus(bus.as_ref()).await;
            served?;
        }
        ServiceRole::Notifications => run_notifications(&settings, &infrastructure).await?,
    }
    info!(service = role.name(), "service stopped");
    Ok(())
}

async fn run_notifications(
    settings: &ServiceSettings,
    infrastructure: &Infrastructure,
) -> Result<(), ServerError> {
    let timeout = settings.rpc_timeout();
    let users = Arc::new(HttpUserDirectory::new(settings.user_service_url()?, timeout)?);
    let pets = Arc::new(HttpPetDirectory::new(settings.pet_service_url()?, timeout)?);
    let composer =
        NotificationComposer::new(users, pets, select_mailer(settings)?).with_lookup_timeout(timeout);

    let bus = infrastructure.event_bus();
    let dispatcher = EventDispatcher::new(Arc::clone(&bus), Arc::new(composer))
        .with_settings(settings.dispatcher());
    let running = match dispatcher.start().await {
        Ok(running) => running,
        Err(err) => {
            close_bus(bus.as_ref()).await;
            return Err(err.into());
        }
    };

    let served = serve(settings.bind_addr(), routes::probes_only).await;
    match running.shutdown().await {
        DrainOutcome::Drained => info!("notification dispatcher drained"),
        DrainOutcome::TimedOut { abandoned } => {
            warn!(abandoned, "drain timed out; abandoning in-flight notifications");
        }
    }
    served?;
    Ok(())
}

/// SMTP when a relay host is configured, otherwise log-only delivery.
fn select_mailer(settings: &ServiceSettings) -> Result<Arc<dyn Mailer>, MailerError> {
    match settings.smtp() {
        Some(smtp) => {
            info!(host = %smtp.host, port = smtp.port, "delivering notifications over SMTP");
            Ok(Arc::new(SmtpMailer::new(smtp)?))
        }
        None => {
            warn!("no SMTP relay configured; notifications are only logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

async fn close_bus(bus: &dyn EventBus) {
    if let Err(err) = bus.close().await {
        warn!(error = %err, "failed to close event bus");
    }
}

/// Bind and run an HTTP server with the probes, request spans and `configure`.
async fn serve<F>(bind_addr: &str, configure: F) -> std::io::Result<()>
where
    F: Fn(&mut web::ServiceConfig) + Send + Clone + 'static,
{
    let health_state = web::Data::new(HealthState::new());
    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(server_health_state.clone())
            .wrap(RequestSpan)
            .configure(configure.clone())
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_serving();
    let outcome = server.await;
    health_state.mark_draining();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewUser, User};
    use rstest::rstest;

    #[tokio::test]
    async fn connect_without_backends_selects_in_memory_adapters() {
        let settings = ServiceSettings::default();
        let infrastructure = Infrastructure::connect(&settings)
            .await
            .expect("in-memory infrastructure");
        assert!(infrastructure.db.is_none());
        assert!(infrastructure.redis.is_none());
        assert_eq!(infrastructure.cache_ttl, Duration::from_secs(3600));

        let users = infrastructure.repository::<User>();
        let created = users
            .create(NewUser {
                username: "ada".to_owned(),
                email: "ada@example.com".to_owned(),
                full_name: Some("Ada Lovelace".to_owned()),
            })
            .await
            .expect("created");
        assert_eq!(users.get(&created.id).await.expect("found"), created);
    }

    #[tokio::test]
    async fn repositories_do_not_share_keyspaces() {
        let infrastructure = Infrastructure::in_memory(Duration::from_secs(60));
        let first = infrastructure.repository::<User>();
        let second = infrastructure.repository::<User>();
        let created = first
            .create(NewUser {
                username: "grace".to_owned(),
                email: "grace@example.com".to_owned(),
                full_name: None,
            })
            .await
            .expect("created");
        assert!(second.get(&created.id).await.is_err());
    }

    #[tokio::test]
    async fn in_process_bus_is_closed_once() {
        let bus = Infrastructure::in_memory(Duration::from_secs(60)).event_bus();
        close_bus(bus.as_ref()).await;
        let error = bus
            .publish("application.created", b"{}".to_vec())
            .await
            .expect_err("closed bus rejects publishes");
        assert!(matches!(error, EventBusError::Closed { .. }));
        close_bus(bus.as_ref()).await;
    }

    #[rstest]
    #[case(None, false)]
    #[case(Some("smtp.example.com"), true)]
    fn mailer_follows_smtp_host(#[case] host: Option<&str>, #[case] smtp: bool) {
        let settings = ServiceSettings {
            smtp_host: host.map(str::to_owned),
            ..ServiceSettings::default()
        };
        assert_eq!(settings.smtp().is_some(), smtp);
        assert!(select_mailer(&settings).is_ok());
    }

    #[rstest]
    #[case(ServiceRole::Users, "users")]
    #[case(ServiceRole::Notifications, "notifications")]
    fn roles_have_log_names(#[case] role: ServiceRole, #[case] name: &str) {
        assert_eq!(role.name(), name);
    }
}
