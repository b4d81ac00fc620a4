mod images;
mod saved;
mod stories;

use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    routing::{get, post},
};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::services::{orchestrator::StoryOrchestrator, storage::StoryStorage, store::StoryStore};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<StoryOrchestrator>,
    pub store: Arc<StoryStore>,
    pub storage: Arc<StoryStorage>,
}

/// The `/api` surface: stories, saved artifacts and images.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/stories", get(stories::list_stories))
        .route("/api/stories/generate", post(stories::generate_story))
        .route("/api/stories/regenerate-text", post(stories::regenerate_text))
        .route("/api/stories/regenerate-image", post(stories::regenerate_image))
        .route("/api/stories/current", get(stories::current_story))
        .route(
            "/api/stories/:id",
            get(stories::get_story).delete(stories::delete_story),
        )
        .route("/api/stories/:id/save", post(saved::save_story))
        .route("/api/saved", get(saved::list_saved))
        .route("/api/saved/upload", post(saved::upload_story))
        .route(
            "/api/saved/:filename",
            get(saved::load_saved).delete(saved::delete_saved),
        )
        .route("/api/saved/:filename/download", get(saved::download_saved))
        .route("/api/images/generate", post(images::generate_image))
        .with_state(state)
}

/// Unwraps a JSON body, turning extractor rejections (bad JSON, unknown enum values) into validation errors.
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}
