use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde_json::json;
use tracing::info;

use super::{AppState, json_body};
use crate::error::{AppError, Result};
use crate::models::api::{
    RegenerateImageRequest, RegenerateImageResponse, RegenerateTextRequest, RegenerateTextResponse,
};
use crate::models::{Scene, Story, StoryPrompt};

pub async fn generate_story(
    State(state): State<AppState>,
    payload: std::result::Result<Json<StoryPrompt>, JsonRejection>,
) -> Result<Json<Story>> {
    let prompt = json_body(payload)?;
    let story = state.orchestrator.generate(&prompt).await?;

    info!("Generated story {} ({:?})", story.id, story.title);
    state.store.set_current(story.clone()).await;
    Ok(Json(story))
}

pub async fn list_stories(State(state): State<AppState>) -> Json<Vec<Story>> {
    Json(state.store.list().await)
}

pub async fn get_story(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Story>> {
    state
        .store
        .find_by_id(&id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Story {}", id)))
}

pub async fn delete_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    state.store.remove(&id).await?;
    info!("Story {} deleted", id);
    Ok(Json(json!({ "message": "Story deleted successfully" })))
}

pub async fn current_story(State(state): State<AppState>) -> Result<Json<Story>> {
    state
        .store
        .current()
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No story is currently open".into()))
}

pub async fn regenerate_text(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegenerateTextRequest>, JsonRejection>,
) -> Result<Json<RegenerateTextResponse>> {
    let request = json_body(payload)?;
    if request.story_id.is_none() && request.prompt.is_some() && request.current_text.is_none() {
        return Err(AppError::Validation("currentText is required with a prompt".into()));
    }

    let target = resolve_target(
        &state,
        request.story_id.as_deref(),
        request.prompt,
        request.current_text,
        None,
        request.scene_index,
    )
    .await?;

    let text = state
        .orchestrator
        .regenerate_scene_text(target.story(), request.scene_index)
        .await?;

    if let SceneTarget::Stored(story) = &target {
        state
            .store
            .update_scene_text_by_id(&story.id, request.scene_index, text.clone())
            .await?;
    }
    Ok(Json(RegenerateTextResponse { text }))
}

pub async fn regenerate_image(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegenerateImageRequest>, JsonRejection>,
) -> Result<Json<RegenerateImageResponse>> {
    let request = json_body(payload)?;
    if request.story_id.is_none()
        && request.prompt.is_some()
        && request.current_text.is_none()
        && request.image_prompt.is_none()
    {
        return Err(AppError::Validation(
            "currentText or imagePrompt is required with a prompt".into(),
        ));
    }

    let target = resolve_target(
        &state,
        request.story_id.as_deref(),
        request.prompt,
        request.current_text,
        request.image_prompt,
        request.scene_index,
    )
    .await?;

    let image_url = state
        .orchestrator
        .regenerate_scene_image(target.story(), request.scene_index)
        .await?;

    if let SceneTarget::Stored(story) = &target {
        state
            .store
            .update_scene_image_by_id(&story.id, request.scene_index, image_url.clone())
            .await?;
    }
    Ok(Json(RegenerateImageResponse { image_url }))
}

/// Which story a regeneration request talks about.
enum SceneTarget {
    /// A registered story, named by id or current when the request arrived.
    /// Results are committed back to that story by id.
    Stored(Story),
    /// Built from the request body alone; nothing is committed.
    Detached(Story),
}

impl SceneTarget {
    fn story(&self) -> &Story {
        match self {
            SceneTarget::Stored(story) | SceneTarget::Detached(story) => story,
        }
    }
}

/// A `story_id` names a stored story, a bare prompt describes a detached one,
/// and a request with neither falls back to the current story.
async fn resolve_target(
    state: &AppState,
    story_id: Option<&str>,
    prompt: Option<StoryPrompt>,
    current_text: Option<String>,
    image_prompt: Option<String>,
    scene_index: usize,
) -> Result<SceneTarget> {
    if let Some(id) = story_id {
        return state
            .store
            .find_by_id(id)
            .await
            .map(SceneTarget::Stored)
            .ok_or_else(|| AppError::NotFound(format!("Story {}", id)));
    }

    if let Some(prompt) = prompt {
        prompt.validate()?;
        let mut scenes = vec![Scene::new(""); prompt.num_scenes as usize];
        if let Some(scene) = scenes.get_mut(scene_index) {
            scene.text = current_text.unwrap_or_default();
            scene.image_prompt = image_prompt;
        }
        return Ok(SceneTarget::Detached(Story::new("", prompt, scenes)));
    }

    state
        .store
        .current()
        .await
        .map(SceneTarget::Stored)
        .ok_or_else(|| AppError::Validation("Request names no story and none is open".into()))
}
