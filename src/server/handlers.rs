use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::AppState;
use crate::flashcards::{
    Card, CardUpdate, DeckUpdate, DeckWithStats, SessionState, StudySession,
};
use crate::settings::PromptKind;

type ApiResult<T> = Result<T, ApiError>;

fn require_text(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(())
}

// ==================== Decks ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeckRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

pub async fn list_decks(State(state): State<AppState>) -> ApiResult<Json<Vec<DeckWithStats>>> {
    Ok(Json(state.storage.list_decks()?))
}

pub async fn get_deck(
    State(state): State<AppState>,
    Path(deck_id): Path<i64>,
) -> ApiResult<Json<DeckWithStats>> {
    Ok(Json(state.storage.get_deck(deck_id)?))
}

pub async fn create_deck(
    State(state): State<AppState>,
    Json(req): Json<CreateDeckRequest>,
) -> ApiResult<(StatusCode, Json<DeckWithStats>)> {
    require_text("name", &req.name)?;
    let deck = state
        .storage
        .create_deck(req.name.trim().to_string(), req.description)?;
    Ok((StatusCode::CREATED, Json(deck)))
}

pub async fn update_deck(
    State(state): State<AppState>,
    Path(deck_id): Path<i64>,
    Json(update): Json<DeckUpdate>,
) -> ApiResult<Json<DeckWithStats>> {
    if let Some(name) = &update.name {
        require_text("name", name)?;
    }
    Ok(Json(state.storage.update_deck(deck_id, update)?))
}

pub async fn delete_deck(
    State(state): State<AppState>,
    Path(deck_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.storage.delete_deck(deck_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Cards ====================

#[derive(Debug, Deserialize)]
pub struct CreateCardRequest {
    pub front: String,
    pub back: String,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub count: usize,
}

pub async fn list_cards(
    State(state): State<AppState>,
    Path(deck_id): Path<i64>,
) -> ApiResult<Json<Vec<Card>>> {
    state.storage.get_deck(deck_id)?;
    Ok(Json(state.storage.list_cards(deck_id)?))
}

pub async fn create_card(
    State(state): State<AppState>,
    Path(deck_id): Path<i64>,
    Json(req): Json<CreateCardRequest>,
) -> ApiResult<(StatusCode, Json<Card>)> {
    require_text("front", &req.front)?;
    require_text("back", &req.back)?;
    let card = state.storage.create_card(deck_id, req.front, req.back)?;
    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn import_cards(
    State(state): State<AppState>,
    Path(deck_id): Path<i64>,
    Json(req): Json<ImportRequest>,
) -> ApiResult<(StatusCode, Json<ImportResponse>)> {
    let count = state.storage.import_cards(deck_id, &req.text)?;
    Ok((StatusCode::CREATED, Json(ImportResponse { count })))
}

pub async fn update_card(
    State(state): State<AppState>,
    Path(card_id): Path<i64>,
    Json(update): Json<CardUpdate>,
) -> ApiResult<Json<Card>> {
    if let Some(front) = &update.front {
        require_text("front", front)?;
    }
    if let Some(back) = &update.back {
        require_text("back", back)?;
    }
    Ok(Json(state.storage.update_card(card_id, update)?))
}

pub async fn delete_card(
    State(state): State<AppState>,
    Path(card_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.storage.delete_card(card_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Sessions ====================

#[derive(Debug, Deserialize)]
pub struct SaveSessionRequest {
    pub state: SessionState,
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(deck_id): Path<i64>,
) -> ApiResult<Json<Option<StudySession>>> {
    Ok(Json(state.storage.get_session(deck_id)?))
}

pub async fn save_session(
    State(state): State<AppState>,
    Path(deck_id): Path<i64>,
    Json(req): Json<SaveSessionRequest>,
) -> ApiResult<Json<StudySession>> {
    state.storage.get_deck(deck_id)?;
    Ok(Json(state.storage.save_session(deck_id, req.state)?))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(deck_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.storage.delete_session(deck_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Explanations ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainRequest {
    pub card_id: i64,
    #[serde(default)]
    pub template: PromptKind,
}

#[derive(Debug, Serialize)]
pub struct ExplainResponse {
    pub text: String,
}

pub async fn explain(
    State(state): State<AppState>,
    Json(req): Json<ExplainRequest>,
) -> ApiResult<Json<ExplainResponse>> {
    let provider = state
        .explainer
        .clone()
        .ok_or_else(|| ApiError::Unavailable("No AI API key configured".to_string()))?;

    let card = state.storage.get_card(req.card_id)?;
    let prompt = state.templates.render(req.template, &card);
    let text = provider.generate_explanation(&prompt).await?;

    Ok(Json(ExplainResponse { text }))
}
