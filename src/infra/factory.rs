use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::{info, warn};
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::ports::{Clock, ReservationLockStore};
use crate::error::AppError;
use crate::state::{Adapters, AppState, Repositories};
use crate::infra::clock::SystemClock;
use crate::infra::discount::NoDiscount;
use crate::infra::lock_store::{memory::InMemoryLockStore, redis::RedisLockStore};
use crate::infra::notification::http_notification_service::HttpNotificationService;
use crate::infra::repositories::{
    postgres_booking_repo::PostgresBookingRepo, postgres_meal_repo::PostgresMealRepo,
    postgres_payment_repo::PostgresPaymentRepo, postgres_room_repo::PostgresRoomRepo,
    sqlite_booking_repo::SqliteBookingRepo, sqlite_meal_repo::SqliteMealRepo,
    sqlite_payment_repo::SqlitePaymentRepo, sqlite_room_repo::SqliteRoomRepo,
};

pub async fn bootstrap_state(config: &Config) -> Result<AppState, AppError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let lock_store: Arc<dyn ReservationLockStore> = match &config.redis_url {
        Some(url) => {
            info!("Connecting reservation lock store to Redis...");
            Arc::new(RedisLockStore::connect(url).await?)
        }
        None => {
            warn!("REDIS_URL not set; holds are kept in process memory and lost on restart");
            Arc::new(InMemoryLockStore::new(clock.clone()))
        }
    };

    let notifier = Arc::new(HttpNotificationService::new(
        config.notification_url.clone(),
        config.notification_token.clone(),
    )?);

    let repos = connect_repositories(&config.database_url).await?;

    Ok(AppState::assemble(
        config.clone(),
        repos,
        Adapters { lock_store, notifier, discounts: Arc::new(NoDiscount), clock },
    ))
}

/// Opens the database named by `database_url`, runs its migrations and returns the
/// matching repositories. Postgres URLs select Postgres; anything else is SQLite.
pub async fn connect_repositories(database_url: &str) -> Result<Repositories, AppError> {
    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().map_err(AppError::Database)?;
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await?;

        run_postgres_migrations(&pool).await?;

        Ok(Repositories {
            rooms: Arc::new(PostgresRoomRepo::new(pool.clone())),
            bookings: Arc::new(PostgresBookingRepo::new(pool.clone())),
            payments: Arc::new(PostgresPaymentRepo::new(pool.clone())),
            meals: Arc::new(PostgresMealRepo::new(pool)),
        })
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        run_sqlite_migrations(&pool).await?;

        Ok(Repositories {
            rooms: Arc::new(SqliteRoomRepo::new(pool.clone())),
            bookings: Arc::new(SqliteBookingRepo::new(pool.clone())),
            payments: Arc::new(SqlitePaymentRepo::new(pool.clone())),
            meals: Arc::new(SqliteMealRepo::new(pool)),
        })
    }
}

async fn run_postgres_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations/postgres").run(pool).await?;
    Ok(())
}

async fn run_sqlite_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations/sqlite").run(pool).await?;
    Ok(())
}
