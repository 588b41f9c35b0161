//! Backend entry-point: configuration, pool construction, embedded
//! migrations, and REST wiring.

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use diesel::{Connection, PgConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use backend::config::AppConfig;
#[cfg(debug_assertions)]
use backend::doc::ApiDoc;
use backend::domain::ports::{LedgerNotifier, NoopNotifier};
use backend::domain::{Amount, WithdrawalLedgerService};
use backend::inbound::http::health::{live, ready, HealthState};
use backend::inbound::http::state::HttpState;
use backend::inbound::http::withdrawals::{
    approve_withdrawal, create_withdrawal, get_author_balance, list_author_withdrawals,
    list_withdrawals, pay_withdrawal, reject_withdrawal,
};
use backend::outbound::notifier::WebhookNotifier;
use backend::outbound::persistence::{DbPool, DieselLedgerRepository, PoolConfig};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let config = AppConfig::load().map_err(std::io::Error::other)?;
    let database_url = config
        .database_url()
        .ok_or_else(|| std::io::Error::other("LEDGER_DATABASE_URL is not set"))?
        .to_owned();

    run_migrations(database_url.clone()).await?;

    let pool = DbPool::new(
        PoolConfig::new(database_url).with_max_size(config.pool_max_size),
    )
    .await
    .map_err(std::io::Error::other)?;

    let minimum_withdrawal =
        Amount::new(config.minimum_withdrawal).map_err(std::io::Error::other)?;

    match config.webhook_url() {
        Some(endpoint) => {
            let notifier =
                Arc::new(WebhookNotifier::new(endpoint).map_err(std::io::Error::other)?);
            serve(&config, pool, notifier, minimum_withdrawal).await
        }
        None => serve(&config, pool, Arc::new(NoopNotifier), minimum_withdrawal).await,
    }
}

/// Apply pending migrations over a blocking connection before serving.
async fn run_migrations(database_url: String) -> std::io::Result<()> {
    let applied = web::block(move || {
        let mut conn = PgConnection::establish(&database_url)
            .map_err(|err| format!("database connection failed: {err}"))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map(|versions| versions.len())
            .map_err(|err| format!("migrations failed: {err}"))
    })
    .await
    .map_err(std::io::Error::other)?
    .map_err(std::io::Error::other)?;

    info!(applied, "database migrations up to date");
    Ok(())
}

async fn serve<N>(
    config: &AppConfig,
    pool: DbPool,
    notifier: Arc<N>,
    minimum_withdrawal: Amount,
) -> std::io::Result<()>
where
    N: LedgerNotifier + 'static,
{
    let repository = Arc::new(DieselLedgerRepository::new(pool));
    let service = Arc::new(WithdrawalLedgerService::new(
        repository,
        notifier,
        Arc::new(DefaultClock),
        minimum_withdrawal,
    ));
    let http_state = web::Data::new(HttpState::new(service.clone(), service));

    let health_state = web::Data::new(HealthState::new());
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        let api = web::scope("/api")
            .service(create_withdrawal)
            .service(list_author_withdrawals)
            .service(get_author_balance)
            .service(list_withdrawals)
            .service(approve_withdrawal)
            .service(reject_withdrawal)
            .service(pay_withdrawal);

        let app = App::new()
            .app_data(server_health_state.clone())
            .app_data(http_state.clone())
            .service(api)
            .service(ready)
            .service(live);

        #[cfg(debug_assertions)]
        let app = app
            .service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

        app
    })
    .bind(config.bind_addr())?
    .run();

    info!(bind_addr = config.bind_addr(), "ledger service listening");
    health_state.mark_ready();
    server.await
}
