use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::models::{Scene, Story, StoryPrompt};
use crate::services::generator::TextGenerator;
use crate::services::{prompts, scenes};

const UNTITLED: &str = "Untitled Story";

/// Text model client speaking the Ollama `/api/generate` protocol.
pub struct LLMClient {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl LLMClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(LLMClient {
            client,
            api_url: settings.llm_api_url.clone(),
            api_key: settings.llm_api_key.clone(),
            model: settings.llm_model.clone(),
            temperature: settings.llm_temperature,
        })
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        let mut request_builder = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
                "options": {
                    "temperature": temperature
                }
            }));

        if let Some(api_key) = &self.api_key {
            request_builder = request_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Generator(format!(
                "Text model returned {}: {}",
                status, error_text
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generator(format!("Unexpected text model response: {}", e)))?;

        let output = body.response.trim().to_string();
        if output.is_empty() {
            return Err(AppError::Generator("Text model returned no output".into()));
        }
        Ok(output)
    }

    async fn story_sketch(&self, prompt: &StoryPrompt) -> Result<String> {
        info!("Creating a {}-scene {} story sketch", prompt.num_scenes, prompt.genre);
        let sketch = self.complete(&prompts::story_sketch(prompt), self.temperature).await?;
        debug!("Story sketch: {:.300}", sketch);
        Ok(sketch)
    }

    async fn character_profile(&self, sketch: &str, prompt: &StoryPrompt) -> Result<String> {
        info!("Creating character profile");
        let text = prompts::character_profile(sketch, prompt.character_text());
        self.complete(&text, self.temperature).await
    }

    async fn story_scenes(&self, sketch: &str, character: &str, num_scenes: u8) -> Result<Vec<String>> {
        info!("Developing {} story scenes", num_scenes);
        let raw = self
            .complete(&prompts::story_scenes(sketch, character, num_scenes), self.temperature)
            .await?;
        Ok(scenes::split_scenes(&raw, num_scenes as usize))
    }

    /// Falls back to the scene text itself when the model cannot help.
    async fn image_prompt(
        &self,
        scene_text: &str,
        scene_index: usize,
        appearance: &str,
        prompt: &StoryPrompt,
    ) -> String {
        let request = prompts::scene_image_prompt(scene_text, scene_index, appearance, prompt);
        match self.complete(&request, 0.7).await {
            Ok(image_prompt) => image_prompt,
            Err(e) => {
                warn!("Image prompt for scene {} failed, using scene text: {}", scene_index + 1, e);
                scene_text.to_string()
            }
        }
    }

    async fn title(&self, idea: &str, sketch: &str) -> String {
        match self.complete(&prompts::story_title(idea, sketch), 0.7).await {
            Ok(title) => clean_title(&title),
            Err(e) => {
                warn!("Title generation failed: {}", e);
                UNTITLED.to_string()
            }
        }
    }
}

#[async_trait]
impl TextGenerator for LLMClient {
    async fn generate_story(&self, prompt: &StoryPrompt) -> Result<Story> {
        let sketch = self.story_sketch(prompt).await?;
        let character = self.character_profile(&sketch, prompt).await?;
        let scene_texts = self
            .story_scenes(&sketch, &character, prompt.num_scenes)
            .await?;

        let appearance = physical_appearance(&character);
        let mut story_scenes = Vec::with_capacity(scene_texts.len());
        for (index, text) in scene_texts.into_iter().enumerate() {
            let image_prompt = self.image_prompt(&text, index, &appearance, prompt).await;
            story_scenes.push(Scene::new(text).with_image_prompt(image_prompt));
        }

        let title = self.title(&prompt.idea, &sketch).await;
        Ok(Story::new(title, prompt.clone(), story_scenes))
    }

    async fn regenerate_scene_text(
        &self,
        prompt: &StoryPrompt,
        scene_index: usize,
        current_text: &str,
    ) -> Result<String> {
        let request = prompts::regenerate_scene(prompt, scene_index, current_text);
        self.complete(&request, self.temperature + 0.1).await
    }
}

fn clean_title(raw: &str) -> String {
    let title = raw
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("")
        .replace('"', "");
    let title = title.trim();
    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title.to_string()
    }
}

/// Collect the PHYSICAL APPEARANCE section of a character profile on one line.
fn physical_appearance(profile: &str) -> String {
    const OTHER_SECTIONS: [&str; 4] = ["PERSONALITY", "BACKGROUND", "RELATIONSHIPS", "GROWTH"];

    let mut parts = Vec::new();
    let mut inside = false;
    for line in profile.lines() {
        if line.contains("PHYSICAL APPEARANCE") {
            inside = true;
            if let Some((_, rest)) = line.split_once(':') {
                let rest = rest.trim();
                if !rest.is_empty() {
                    parts.push(rest.to_string());
                }
            }
            continue;
        }
        if OTHER_SECTIONS.iter().any(|s| line.contains(s)) {
            inside = false;
        } else if inside && !line.trim().is_empty() {
            parts.push(line.trim().to_string());
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_lose_quotes_and_trailing_lines() {
        assert_eq!(clean_title("\"The Silver Key\"\n\nHope you like it"), "The Silver Key");
        assert_eq!(clean_title("  \n\"\"  "), UNTITLED);
    }

    #[test]
    fn extracts_physical_appearance_section() {
        let profile = "Name: Pip\n\nPHYSICAL APPEARANCE: A small red fox.\nWears a blue scarf.\n\n\
PERSONALITY:\nCurious and brave.";
        assert_eq!(physical_appearance(profile), "A small red fox. Wears a blue scarf.");
    }

    #[test]
    fn missing_appearance_section_yields_empty_text() {
        assert_eq!(physical_appearance("PERSONALITY: shy"), "");
    }
}
