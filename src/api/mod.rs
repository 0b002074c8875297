pub mod admin;
pub mod conversations;
pub mod messages;
pub mod users;

use axum::Router;
use std::sync::Arc;

use crate::services::aggregator::{RoleInference, TagRoleInference};
use crate::store::MessageStore;
use crate::utils::jwt::JwtService;

pub struct AppState {
    pub store: Arc<dyn MessageStore>,
    pub jwt_service: Arc<JwtService>,
    pub inference: Arc<dyn RoleInference>,
}

impl AppState {
    pub fn new(store: Arc<dyn MessageStore>, jwt_service: Arc<JwtService>) -> Self {
        Self {
            store,
            jwt_service,
            inference: Arc::new(TagRoleInference),
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}

pub fn routes(state: Arc<AppState>) -> Router {
    let ws_route = Router::new()
        .route(
            "/ws",
            axum::routing::get(crate::websocket::handlers::ws_handler),
        )
        .with_state(state.clone());

    let protected_routes = Router::new()
        .nest("/conversations", conversations::routes(state.clone()))
        .nest("/messages", messages::routes(state.clone()))
        .nest("/users", users::routes(state.clone()))
        .nest("/admin", admin::routes(state.clone()))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(ws_route)
        .merge(protected_routes)
}
