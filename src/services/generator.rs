//! Capabilities consumed from the text and image providers.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::models::{ArtStyle, Story, StoryPrompt};

/// Base seed for scene illustrations; scene `i` uses `SCENE_SEED_BASE + i`.
pub const SCENE_SEED_BASE: u64 = 42;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce a titled story with exactly `prompt.num_scenes` scenes.
    async fn generate_story(&self, prompt: &StoryPrompt) -> Result<Story>;

    async fn regenerate_scene_text(
        &self,
        prompt: &StoryPrompt,
        scene_index: usize,
        current_text: &str,
    ) -> Result<String>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Returns the URL of the generated image.
    async fn generate_image(&self, request: &ImageRequest) -> Result<String>;
}

/// Either a provider preset name or explicit pixel dimensions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ImageSize {
    Preset(String),
    Custom { width: u32, height: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub prompt: String,
    pub image_size: ImageSize,
    pub seed: Option<u64>,
    pub num_inference_steps: Option<u32>,
    pub guidance_scale: Option<f32>,
    pub negative_prompt: Option<String>,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        ImageRequest {
            prompt: prompt.into(),
            image_size: ImageSize::Preset(ArtStyle::default().preferred_image_size().into()),
            seed: None,
            num_inference_steps: None,
            guidance_scale: None,
            negative_prompt: None,
        }
    }

    /// Illustration request for one scene of a story drawn in `style`.
    pub fn for_scene(prompt: impl Into<String>, style: ArtStyle, scene_index: usize) -> Self {
        ImageRequest {
            image_size: ImageSize::Preset(style.preferred_image_size().into()),
            seed: Some(SCENE_SEED_BASE + scene_index as u64),
            ..ImageRequest::new(prompt)
        }
    }
}
