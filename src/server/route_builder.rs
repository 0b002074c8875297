use axum::{Router, extract::DefaultBodyLimit};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::AppState;
use crate::config::Config;
use crate::database;
use crate::store::{MessageStore, SqliteStore};
use crate::utils::jwt::JwtService;

const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", crate::api::routes(state))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn register_routes(config: &Config) -> anyhow::Result<Router> {
    let db = database::create_pool(&config.database_url).await?;

    tracing::info!("Database connected and migrations applied");

    let store: Arc<dyn MessageStore> =
        Arc::new(SqliteStore::new(db, config.change_feed_capacity));
    let jwt_service = Arc::new(JwtService::new(&config.secret_key));

    let state = Arc::new(AppState::new(store, jwt_service));

    Ok(build_router(state))
}
