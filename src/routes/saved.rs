use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use http::header;
use serde_json::json;

use super::AppState;
use crate::error::{AppError, Result};
use crate::models::api::{SaveStoryRequest, SaveStoryResponse};
use crate::models::{SavedStoryInfo, Story};

const UPLOAD_FIELDS: [&str; 2] = ["story_file", "file"];

pub async fn save_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<SaveStoryResponse>> {
    let request: SaveStoryRequest = if body.iter().all(u8::is_ascii_whitespace) {
        SaveStoryRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("Invalid save request: {}", e)))?
    };

    let story = state
        .store
        .find_by_id(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Story {}", id)))?;

    let filename = state.storage.save(&story, request.filename.as_deref()).await?;
    Ok(Json(SaveStoryResponse { filename }))
}

pub async fn list_saved(State(state): State<AppState>) -> Result<Json<Vec<SavedStoryInfo>>> {
    Ok(Json(state.storage.list().await?))
}

pub async fn load_saved(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<Story>> {
    let story = state.storage.load(&filename).await?;
    state.store.set_current(story.clone()).await;
    Ok(Json(story))
}

pub async fn delete_saved(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<serde_json::Value>> {
    state.storage.remove(&filename).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn download_saved(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse> {
    let (filename, bytes) = state.storage.download(&filename).await?;
    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];
    Ok((headers, bytes))
}

pub async fn upload_story(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Story>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid upload: {}", e)))?
    {
        let name = field.name().unwrap_or("unknown").to_string();
        if UPLOAD_FIELDS.contains(&name.as_str()) {
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Invalid upload: {}", e)))?;

            let story = state.storage.upload(&data)?;
            state.store.set_current(story.clone()).await;
            return Ok(Json(story));
        }
    }

    Err(AppError::Validation("Upload is missing the story_file field".into()))
}
