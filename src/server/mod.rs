//! REST API over the flashcard store.
//!
//! Handlers validate request shape only; study logic stays with the
//! client. `start_server` binds a listener and runs axum in the background
//! until [`ApiServer::shutdown`] is called.

mod error;
mod handlers;

pub use error::ApiError;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;

use crate::ai::ExplanationProvider;
use crate::flashcards::FlashcardStorage;
use crate::settings::PromptTemplates;

/// Server state shared across requests
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<FlashcardStorage>,
    /// `None` when no API key is configured
    pub explainer: Option<Arc<dyn ExplanationProvider>>,
    pub templates: PromptTemplates,
}

impl AppState {
    pub fn new(storage: Arc<FlashcardStorage>) -> Self {
        Self {
            storage,
            explainer: None,
            templates: PromptTemplates::default(),
        }
    }

    pub fn with_explainer(mut self, explainer: Arc<dyn ExplanationProvider>) -> Self {
        self.explainer = Some(explainer);
        self
    }

    pub fn with_templates(mut self, templates: PromptTemplates) -> Self {
        self.templates = templates;
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/decks", get(handlers::list_decks).post(handlers::create_deck))
        .route(
            "/api/decks/{id}",
            get(handlers::get_deck)
                .put(handlers::update_deck)
                .delete(handlers::delete_deck),
        )
        .route(
            "/api/decks/{deck_id}/cards",
            get(handlers::list_cards).post(handlers::create_card),
        )
        .route("/api/decks/{deck_id}/cards/import", post(handlers::import_cards))
        .route(
            "/api/decks/{deck_id}/session",
            get(handlers::get_session)
                .put(handlers::save_session)
                .delete(handlers::delete_session),
        )
        .route(
            "/api/cards/{id}",
            put(handlers::update_card).delete(handlers::delete_card),
        )
        .route("/api/explain", post(handlers::explain))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Handle to a running API server
pub struct ApiServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ApiServer {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop accepting connections and wait for in-flight requests
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.task.await;
    }
}

/// Bind `addr` and serve the API in a background task
pub async fn start_server(addr: &str, state: AppState) -> std::io::Result<ApiServer> {
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    let addr = listener.local_addr()?;
    log::info!("API server listening on http://{}", addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                log::info!("API server shutting down");
            })
            .await
        {
            log::error!("API server error: {}", e);
        }
    });

    Ok(ApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AiError, ExplanationProvider};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct EchoProvider;

    #[async_trait]
    impl ExplanationProvider for EchoProvider {
        async fn generate_explanation(&self, prompt: &str) -> crate::ai::Result<String> {
            Ok(format!("echo: {}", prompt))
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl ExplanationProvider for FailingProvider {
        async fn generate_explanation(&self, _prompt: &str) -> crate::ai::Result<String> {
            Err(AiError::EmptyResponse)
        }
    }

    fn test_state() -> (AppState, TempDir) {
        let temp = TempDir::new().unwrap();
        let storage = FlashcardStorage::new(temp.path().to_path_buf());
        storage.init().unwrap();
        (AppState::new(Arc::new(storage)), temp)
    }

    async fn send(state: &AppState, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = router(state.clone())
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_deck_crud() {
        let (state, _temp) = test_state();

        let (status, deck) = send(
            &state,
            Method::POST,
            "/api/decks",
            Some(json!({"name": "Spanish", "description": "Verbs"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(deck["name"], "Spanish");
        assert_eq!(deck["cardCount"], 0);
        let id = deck["id"].as_i64().unwrap();

        let (status, decks) = send(&state, Method::GET, "/api/decks", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decks.as_array().unwrap().len(), 1);

        let (status, updated) = send(
            &state,
            Method::PUT,
            &format!("/api/decks/{}", id),
            Some(json!({"description": null})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Spanish");
        assert!(updated.get("description").map_or(true, Value::is_null));

        let (status, _) = send(&state, Method::DELETE, &format!("/api/decks/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&state, Method::GET, &format!("/api/decks/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].as_str().unwrap().contains("Deck not found"));
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let (state, _temp) = test_state();

        let (status, body) = send(&state, Method::POST, "/api/decks", Some(json!({"name": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "name must not be empty");

        let deck = state.storage.create_deck("D".to_string(), None).unwrap().deck;
        let (status, _) = send(
            &state,
            Method::POST,
            &format!("/api/decks/{}/cards", deck.id),
            Some(json!({"front": "Q", "back": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &state,
            Method::POST,
            "/api/decks/999/cards",
            Some(json!({"front": "Q", "back": "A"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cards_and_import() {
        let (state, _temp) = test_state();
        let deck = state.storage.create_deck("D".to_string(), None).unwrap().deck;

        let (status, card) = send(
            &state,
            Method::POST,
            &format!("/api/decks/{}/cards", deck.id),
            Some(json!({"front": "Q", "back": "A"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(card["status"], "new");
        let card_id = card["id"].as_i64().unwrap();

        let (status, imported) = send(
            &state,
            Method::POST,
            &format!("/api/decks/{}/cards/import", deck.id),
            Some(json!({"text": "a|1\nbroken line\nb\t2"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(imported["count"], 2);

        let (status, updated) = send(
            &state,
            Method::PUT,
            &format!("/api/cards/{}", card_id),
            Some(json!({"status": "easy"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "easy");
        assert!(updated["lastReviewedAt"].is_string());

        let (_, cards) = send(&state, Method::GET, &format!("/api/decks/{}/cards", deck.id), None).await;
        assert_eq!(cards.as_array().unwrap().len(), 3);

        let (_, stats) = send(&state, Method::GET, &format!("/api/decks/{}", deck.id), None).await;
        assert_eq!(stats["cardCount"], 3);
        assert_eq!(stats["masteredCount"], 1);

        let (status, _) = send(&state, Method::DELETE, &format!("/api/cards/{}", card_id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&state, Method::DELETE, &format!("/api/cards/{}", card_id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_session_routes() {
        let (state, _temp) = test_state();
        let deck = state.storage.create_deck("D".to_string(), None).unwrap().deck;
        let card = state
            .storage
            .create_card(deck.id, "Q".to_string(), "A".to_string())
            .unwrap();
        let uri = format!("/api/decks/{}/session", deck.id);

        let (status, body) = send(&state, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_null());

        let snapshot = json!({
            "state": {
                "queue": [card],
                "stats": {"easy": 1, "good": 0, "again": 2}
            }
        });
        let (status, saved) = send(&state, Method::PUT, &uri, Some(snapshot)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["deckId"], deck.id);
        assert_eq!(saved["state"]["stats"]["again"], 2);

        let (_, loaded) = send(&state, Method::GET, &uri, None).await;
        assert_eq!(loaded["state"]["queue"][0]["front"], "Q");

        let (status, _) = send(&state, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, body) = send(&state, Method::GET, &uri, None).await;
        assert!(body.is_null());
    }

    #[tokio::test]
    async fn test_explain() {
        let (state, _temp) = test_state();
        let deck = state.storage.create_deck("D".to_string(), None).unwrap().deck;
        let card = state
            .storage
            .create_card(deck.id, "Closure".to_string(), "Function + scope".to_string())
            .unwrap();
        let request = json!({"cardId": card.id, "template": "memory"});

        let (status, _) = send(&state, Method::POST, "/api/explain", Some(request.clone())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let mut templates = PromptTemplates::default();
        templates.memory = "Remember {front} as {back}".to_string();
        let with_ai = state
            .clone()
            .with_explainer(Arc::new(EchoProvider))
            .with_templates(templates);
        let (status, body) = send(&with_ai, Method::POST, "/api/explain", Some(request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "echo: Remember Closure as Function + scope");

        let (status, _) = send(&with_ai, Method::POST, "/api/explain", Some(json!({"cardId": 999}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let failing = state.with_explainer(Arc::new(FailingProvider));
        let (status, _) = send(
            &failing,
            Method::POST,
            "/api/explain",
            Some(json!({"cardId": card.id})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let (state, _temp) = test_state();
        state.storage.seed_if_empty().unwrap();

        let server = start_server("127.0.0.1:0", state).await.unwrap();
        let decks: Value = reqwest::get(format!("{}/api/decks", server.base_url()))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(decks.as_array().unwrap().len(), 2);

        server.shutdown().await;
    }
}
