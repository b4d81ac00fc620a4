//! Request and response bodies of the HTTP surface.

use serde::{Deserialize, Serialize};

use super::StoryPrompt;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateTextRequest {
    #[serde(default)]
    pub story_id: Option<String>,
    #[serde(default)]
    pub prompt: Option<StoryPrompt>,
    #[serde(default)]
    pub current_text: Option<String>,
    pub scene_index: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegenerateTextResponse {
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateImageRequest {
    #[serde(default)]
    pub story_id: Option<String>,
    #[serde(default)]
    pub prompt: Option<StoryPrompt>,
    #[serde(default)]
    pub current_text: Option<String>,
    #[serde(default)]
    pub image_prompt: Option<String>,
    pub scene_index: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateImageResponse {
    pub image_url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SaveStoryRequest {
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveStoryResponse {
    pub filename: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageRequest {
    pub prompt: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub num_inference_steps: Option<u32>,
    #[serde(default)]
    pub guidance_scale: Option<f32>,
    #[serde(default)]
    pub negative_prompt: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageResponse {
    pub image_url: String,
    pub prompt: String,
}
