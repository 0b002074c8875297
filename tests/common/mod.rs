#![allow(dead_code)]

pub mod ws_helpers;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use dealroom::api::AppState;
use dealroom::models::session::Session;
use dealroom::models::user::{User, UserRole};
use dealroom::server::route_builder::build_router;
use dealroom::store::{InMemoryStore, MessageStore};
use dealroom::utils::jwt::JwtService;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret";

pub fn sales() -> User {
    User::new("sam", "Sam Sales", UserRole::SalesProfessional).with_avatar_seed("seed-sam")
}

pub fn investor() -> User {
    User::new("ivy", "Ivy Investor", UserRole::Investor).with_avatar_seed("seed-ivy")
}

pub fn corporation() -> User {
    User::new("acme", "Acme Corp", UserRole::Corporation)
}

pub fn admin() -> User {
    User::new("root", "Site Admin", UserRole::Admin)
}

/// Stores the four standard users and returns them.
pub async fn seed_users(store: &dyn MessageStore) -> Vec<User> {
    let users = vec![sales(), investor(), corporation(), admin()];
    for user in &users {
        store.upsert_user(user).await.unwrap();
    }
    users
}

pub fn session(user: &User) -> Session {
    Session::from(user)
}

pub async fn memory_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    seed_users(store.as_ref()).await;
    store
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub store: Arc<InMemoryStore>,
}

impl TestApp {
    pub async fn new() -> Self {
        let store = memory_store().await;
        let state = Arc::new(AppState::new(
            store.clone(),
            Arc::new(JwtService::new(TEST_SECRET)),
        ));
        Self {
            router: build_router(state.clone()),
            state,
            store,
        }
    }

    pub fn token(&self, user_id: &str) -> String {
        self.state.jwt_service.generate_token(user_id).unwrap()
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        user_id: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user_id) = user_id {
            builder = builder.header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.token(user_id)),
            );
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }
}
