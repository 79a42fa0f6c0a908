//! Read-only query API.
//!
//! Two endpoints over the conversation store, both read-only:
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /memories/latest?count=N` | Newest `N` turns (1..=100, default 5) as `[{role, content}]`, oldest-first |
//! | `GET /messages?offset&limit&ascending` | Full message records, paginated |
//!
//! Writes happen only through the engine; the API never mutates.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::error;

use tether_core::message::{Message, Role};
use tether_store::{ConversationStore, StoreError};

/// Default turn count for `GET /memories/latest`.
const DEFAULT_LATEST_COUNT: i64 = 5;
/// Maximum turn count for `GET /memories/latest`.
const MAX_LATEST_COUNT: i64 = 100;

/// One turn in a `GET /memories/latest` response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnView {
    /// Turn attribution.
    pub role: Role,
    /// Plain-text content.
    pub content: String,
}

#[derive(Deserialize)]
struct LatestQuery {
    count: Option<i64>,
}

#[derive(Deserialize)]
struct MessagesQuery {
    offset: Option<i64>,
    limit: Option<i64>,
    ascending: Option<bool>,
}

struct ApiError(StoreError);

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "query api request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": self.0.to_string()})),
        )
            .into_response()
    }
}

/// Build the query API router over `store`.
pub fn router(store: Arc<ConversationStore>) -> Router {
    Router::new()
        .route("/memories/latest", get(latest_memories))
        .route("/messages", get(list_messages))
        .with_state(store)
}

async fn latest_memories(
    State(store): State<Arc<ConversationStore>>,
    Query(params): Query<LatestQuery>,
) -> Result<Json<Vec<TurnView>>, ApiError> {
    let count = params
        .count
        .unwrap_or(DEFAULT_LATEST_COUNT)
        .clamp(1, MAX_LATEST_COUNT);
    let turns = store
        .recent_messages(count)?
        .iter()
        .map(|m| TurnView {
            role: m.role,
            content: m.content_text(),
        })
        .collect();
    Ok(Json(turns))
}

async fn list_messages(
    State(store): State<Arc<ConversationStore>>,
    Query(params): Query<MessagesQuery>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let page = store.get_messages(
        params.offset.unwrap_or(0),
        params.limit.unwrap_or(DEFAULT_LATEST_COUNT),
        params.ascending.unwrap_or(true),
    )?;
    Ok(Json(page))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{DateTime, Utc};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn seeded_store(n: usize) -> Arc<ConversationStore> {
        let store = ConversationStore::open_in_memory().unwrap();
        for i in 1..=n {
            let role = if i % 2 == 0 { Role::Assistant } else { Role::User };
            store
                .save_message(&Message {
                    id: format!("m{i:02}"),
                    role,
                    content: json!(format!("turn {i}")),
                    timestamp: DateTime::parse_from_rfc3339(&format!(
                        "2026-01-01T00:00:{:02}Z",
                        i
                    ))
                    .unwrap()
                    .with_timezone(&Utc),
                })
                .unwrap();
        }
        Arc::new(store)
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn latest_defaults_to_five_oldest_first() {
        let router = router(seeded_store(8));
        let (status, body) = get_json(router, "/memories/latest").await;
        assert_eq!(status, StatusCode::OK);

        let turns: Vec<TurnView> = serde_json::from_value(body).unwrap();
        assert_eq!(turns.len(), 5);
        // Newest five of eight, presented in conversation order.
        assert_eq!(turns[0].content, "turn 4");
        assert_eq!(turns[4].content, "turn 8");
        assert_eq!(turns[3].role, Role::User);
    }

    #[tokio::test]
    async fn latest_count_is_clamped_to_the_valid_range() {
        let store = seeded_store(3);

        let (_, body) = get_json(router(Arc::clone(&store)), "/memories/latest?count=1000").await;
        assert_eq!(body.as_array().unwrap().len(), 3);

        let (_, body) = get_json(router(Arc::clone(&store)), "/memories/latest?count=0").await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (_, body) = get_json(router(store), "/memories/latest?count=-7").await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn latest_with_empty_store_is_an_empty_array() {
        let router = router(Arc::new(ConversationStore::open_in_memory().unwrap()));
        let (status, body) = get_json(router, "/memories/latest").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn messages_paginate_full_records() {
        let router = router(seeded_store(4));
        let (status, body) = get_json(router, "/messages?offset=1&limit=2&ascending=true").await;
        assert_eq!(status, StatusCode::OK);

        let page = body.as_array().unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0]["id"], "m02");
        assert_eq!(page[1]["id"], "m03");
        assert!(page[0]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn messages_descending_newest_first() {
        let router = router(seeded_store(3));
        let (_, body) = get_json(router, "/messages?limit=2&ascending=false").await;
        let page = body.as_array().unwrap();
        assert_eq!(page[0]["id"], "m03");
        assert_eq!(page[1]["id"], "m02");
    }
}
