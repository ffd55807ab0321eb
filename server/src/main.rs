// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::http::HeaderName;
use std::sync::Arc;
use taskbuddy_server::config::ServerConfig;
use taskbuddy_server::database::{self, SqliteTaskStore};
use taskbuddy_server::routes;
use taskbuddy_server::state::AppState;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting up the server...");

    let config = ServerConfig::from_env();
    tracing::debug!("Configuration: {:?}", config);

    let db_pool = match database::establish_connection_pool(&config.database_url).await {
        Ok(pool) => {
            tracing::info!("Database connection was made successfully.");
            pool
        }
        Err(e) => {
            tracing::error!("Failed to connect with the database: {:?}", e);
            std::process::exit(1);
        }
    };

    let store = SqliteTaskStore::new(db_pool).with_timeout(config.store_timeout);
    let app_routes = routes::create_router(
        AppState::new(Arc::new(store)).with_board_limit(config.max_boards),
    );

    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
        ])
        .allow_origin(Any);

    let app = app_routes.layer(cors).layer(TraceLayer::new_for_http());

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", config.bind_addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("The server listens on http://{}", config.bind_addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
