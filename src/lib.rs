pub(crate) mod controllers;
pub(crate) mod core;
pub(crate) mod routes;
pub(crate) mod store;
pub(crate) mod types;
pub(crate) mod utils;

use axum::http::HeaderValue;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::core::error::ConfigError as Error;
use crate::core::{config::Args, state::AppState};
use crate::store::mongo::MongoCatalogStore;
use crate::store::postgres::PgIdentityStore;
use crate::utils::password::PasswordHasher;

pub async fn run() -> Result<(), Error> {
    let config = Args::load()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_new(&config.log_level).unwrap_or_default())
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::debug!(?config, "Loaded configuration");

    let identities =
        PgIdentityStore::connect(&config.database_url(), config.database_max_connections).await?;

    sqlx::migrate!()
        .run(identities.pool())
        .await
        .map_err(Error::DatabaseMigration)?;

    let reports = MongoCatalogStore::connect(&config.mongo_url(), &config.mongo_name).await?;
    reports.initialize_indexes().await?;

    let state = AppState::new(
        Arc::new(identities),
        Arc::new(reports),
        &config.secret,
        PasswordHasher::default(),
    )?;

    let allowed_origins = config
        .origins()
        .map(HeaderValue::from_str)
        .collect::<Result<Vec<_>, _>>()?;

    let app = routes::router::routes(state, allowed_origins, config.requests_per_second);

    let address = format!("{}:{}", config.host, config.port);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(Error::IO)?;

    tracing::info!("listening on {}", address);

    axum::serve(listener, app).await.map_err(Error::IO)?;

    Ok(())
}
