use axum_helpers::{JwtAuth, create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::mongodb::{Database, connect_from_config_with_retry};
use domain_tasks::{InMemoryTaskRepository, MongoTaskRepository};
use domain_users::{InMemoryUserRepository, MongoUserRepository};
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::{Config, StoreBackend};
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let jwt = JwtAuth::new(&config.jwt);
    info!(store = %config.store, "Selected task store");

    let (api_routes, mongo_client) = match config.store {
        StoreBackend::MongoDb => {
            info!("Connecting to MongoDB at {}", config.mongodb.url());
            let client = connect_from_config_with_retry(&config.mongodb, None).await?;
            let db = client.database(config.mongodb.database());
            info!(
                "Successfully connected to MongoDB database: {}",
                config.mongodb.database()
            );

            let (tasks, users) = init_mongo_repositories(&db).await?;
            (api::routes(tasks, users, jwt), Some(client))
        }
        StoreBackend::Memory => {
            info!("Using in-memory store, data is lost on restart");
            let routes = api::routes(
                InMemoryTaskRepository::new(),
                InMemoryUserRepository::new(),
                jwt,
            );
            (routes, None)
        }
    };

    let state = AppState {
        config,
        mongo_client,
    };

    let app = create_router::<openapi::ApiDoc>(api_routes, &state.config.cors)?
        .merge(api::health::router(state.mongo_client.clone()))
        .merge(health_router(state.config.app));

    info!("Starting Taskboard API (30s shutdown timeout)");

    let shutdown_client = state.mongo_client.clone();

    create_production_app(
        app,
        &state.config.server,
        Duration::from_secs(30),
        async move {
            if let Some(client) = shutdown_client {
                info!("Shutting down: closing MongoDB connections");
                client.shutdown().await;
                info!("MongoDB connection closed");
            }
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Taskboard API shutdown complete");
    Ok(())
}

async fn init_mongo_repositories(
    db: &Database,
) -> eyre::Result<(MongoTaskRepository, MongoUserRepository)> {
    let tasks = MongoTaskRepository::new(db);
    tasks.create_indexes().await?;

    let users = MongoUserRepository::new(db);
    users.create_indexes().await?;

    info!("MongoDB indexes ensured");
    Ok((tasks, users))
}
