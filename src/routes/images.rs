use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use super::{AppState, json_body};
use crate::error::{AppError, Result};
use crate::models::api::{GenerateImageRequest, GenerateImageResponse};
use crate::services::generator::{ImageRequest, ImageSize};

/// Stand-alone illustration, outside of any story.
pub async fn generate_image(
    State(state): State<AppState>,
    payload: std::result::Result<Json<GenerateImageRequest>, JsonRejection>,
) -> Result<Json<GenerateImageResponse>> {
    let body = json_body(payload)?;
    let prompt = body.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(AppError::Validation("Image prompt must not be empty".into()));
    }

    let mut request = ImageRequest::new(prompt.clone());
    if let (Some(width), Some(height)) = (body.width, body.height) {
        request.image_size = ImageSize::Custom { width, height };
    }
    request.num_inference_steps = body.num_inference_steps;
    request.guidance_scale = body.guidance_scale;
    request.negative_prompt = body.negative_prompt;

    let image_url = state.orchestrator.images().generate_image(&request).await?;
    Ok(Json(GenerateImageResponse { image_url, prompt }))
}
