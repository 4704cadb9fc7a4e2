use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use fashiondesk_db::OrderStore;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    store: Arc<OrderStore>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub store: HealthCheck,
    pub checked_at: String,
}

pub fn router(store: Arc<OrderStore>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { store })
}

async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let store = store_check(&state.store).await;
    let ready = store.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "fashiondesk-server runtime initialized".to_string(),
        },
        store,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn store_check(store: &OrderStore) -> HealthCheck {
    match store.len().await {
        0 => HealthCheck { status: "degraded", detail: "order store is empty".to_string() },
        count => HealthCheck { status: "ready", detail: format!("{count} orders loaded") },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use fashiondesk_db::OrderStore;

    use crate::health::{health, HealthState};

    #[tokio::test]
    async fn health_returns_ready_for_a_seeded_store() {
        let store = Arc::new(OrderStore::seeded());

        let (status, Json(payload)) = health(State(HealthState { store })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.store.detail, "3 orders loaded");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_for_an_empty_store() {
        let store = Arc::new(OrderStore::default());

        let (status, Json(payload)) = health(State(HealthState { store })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.store.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }
}
