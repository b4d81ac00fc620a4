//! Turns a prompt into an illustrated story and regenerates single scenes.
//!
//! Whole-story generation fails fast on text and is best-effort on images: a
//! scene whose illustration fails keeps `image_url` unset and the run moves on.
//! Single-scene regeneration never mutates anything; callers commit the result.

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::models::{Scene, Story, StoryPrompt};
use crate::services::generator::{ImageGenerator, ImageRequest, TextGenerator};

pub struct StoryOrchestrator {
    text: Arc<dyn TextGenerator>,
    images: Arc<dyn ImageGenerator>,
}

impl StoryOrchestrator {
    pub fn new(text: Arc<dyn TextGenerator>, images: Arc<dyn ImageGenerator>) -> Self {
        StoryOrchestrator { text, images }
    }

    pub fn images(&self) -> &dyn ImageGenerator {
        self.images.as_ref()
    }

    pub async fn generate(&self, prompt: &StoryPrompt) -> Result<Story> {
        prompt.validate()?;

        info!("Generating story with {} scenes", prompt.num_scenes);
        let mut story = self.text.generate_story(prompt).await?;

        if story.scenes.len() != prompt.num_scenes as usize {
            return Err(AppError::Generator(format!(
                "Text generator returned {} scenes, expected {}",
                story.scenes.len(),
                prompt.num_scenes
            )));
        }

        // One scene at a time, in index order.
        let total = story.scenes.len();
        for index in 0..total {
            let scene = &story.scenes[index];
            if scene.image_url.is_some() || scene.image_prompt.is_none() {
                continue;
            }

            let request = ImageRequest::for_scene(
                scene_image_prompt(&story.prompt, scene),
                story.prompt.art_style,
                index,
            );
            match self.images.generate_image(&request).await {
                Ok(url) => {
                    info!("Illustrated scene {} ({}/{})", index, index + 1, total);
                    story.scenes[index].image_url = Some(url);
                }
                Err(e) => warn!("Image generation failed for scene {}: {}", index, e),
            }
        }

        Ok(story)
    }

    pub async fn regenerate_scene_text(&self, story: &Story, scene_index: usize) -> Result<String> {
        story.check_scene_index(scene_index)?;
        self.text
            .regenerate_scene_text(&story.prompt, scene_index, &story.scenes[scene_index].text)
            .await
    }

    pub async fn regenerate_scene_image(&self, story: &Story, scene_index: usize) -> Result<String> {
        story.check_scene_index(scene_index)?;
        let scene = &story.scenes[scene_index];
        let request = ImageRequest::for_scene(
            scene_image_prompt(&story.prompt, scene),
            story.prompt.art_style,
            scene_index,
        );
        self.images.generate_image(&request).await
    }
}

/// The scene's stored image prompt, or `setting. text` when it has none, styled with the art style.
pub fn scene_image_prompt(prompt: &StoryPrompt, scene: &Scene) -> String {
    let base = match scene.image_prompt.as_deref().map(str::trim) {
        Some(stored) if !stored.is_empty() => stored.to_string(),
        _ => {
            let mut parts: Vec<&str> = Vec::new();
            if let Some(setting) = prompt.setting_text() {
                parts.push(setting);
            }
            parts.push(scene.text.trim());
            parts.join(". ")
        }
    };
    format!("{}, in {} style", base, prompt.art_style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{fox_prompt, fox_story};
    use crate::services::generator::{MockImageGenerator, MockTextGenerator};

    fn scripted_story(prompt: &StoryPrompt) -> Story {
        let scenes = (0..prompt.num_scenes)
            .map(|i| Scene::new(format!("Scene text {}", i)).with_image_prompt(format!("picture {}", i)))
            .collect();
        Story::new("Scripted", prompt.clone(), scenes)
    }

    fn orchestrator(text: MockTextGenerator, images: MockImageGenerator) -> StoryOrchestrator {
        StoryOrchestrator::new(Arc::new(text), Arc::new(images))
    }

    #[tokio::test]
    async fn generates_one_scene_per_requested_scene() {
        for n in [3u8, 7, 10] {
            let mut text = MockTextGenerator::new();
            text.expect_generate_story()
                .times(1)
                .returning(|prompt| Ok(scripted_story(prompt)));
            let mut images = MockImageGenerator::new();
            images
                .expect_generate_image()
                .times(n as usize)
                .returning(|req| Ok(format!("https://img.example/{}.png", req.seed.unwrap_or(0))));

            let mut prompt = fox_prompt();
            prompt.num_scenes = n;
            let story = orchestrator(text, images).generate(&prompt).await.unwrap();

            assert_eq!(story.scenes.len(), n as usize);
            assert!(story.scenes.iter().all(|s| s.image_url.is_some()));
        }
    }

    #[tokio::test]
    async fn failed_illustration_leaves_only_that_scene_bare() {
        let mut text = MockTextGenerator::new();
        text.expect_generate_story()
            .returning(|prompt| Ok(scripted_story(prompt)));
        let mut images = MockImageGenerator::new();
        images.expect_generate_image().times(3).returning(|req| {
            if req.prompt.starts_with("picture 1") {
                Err(AppError::Generator("provider down".into()))
            } else {
                Ok(format!("https://img.example/{}", req.prompt.len()))
            }
        });

        let story = orchestrator(text, images).generate(&fox_prompt()).await.unwrap();

        assert!(story.scenes[0].image_url.is_some());
        assert!(story.scenes[1].image_url.is_none());
        assert!(story.scenes[2].image_url.is_some());
    }

    #[tokio::test]
    async fn scenes_without_image_prompt_or_with_image_are_skipped() {
        let mut text = MockTextGenerator::new();
        text.expect_generate_story().returning(|prompt| {
            let mut story = scripted_story(prompt);
            story.scenes[0].image_prompt = None;
            story.scenes[1].image_url = Some("https://img.example/kept.png".into());
            Ok(story)
        });
        let mut images = MockImageGenerator::new();
        images
            .expect_generate_image()
            .times(1)
            .withf(|req| req.prompt == "picture 2, in Watercolor style" && req.seed == Some(44))
            .returning(|_| Ok("https://img.example/new.png".into()));

        let story = orchestrator(text, images).generate(&fox_prompt()).await.unwrap();

        assert!(story.scenes[0].image_url.is_none());
        assert_eq!(story.scenes[1].image_url.as_deref(), Some("https://img.example/kept.png"));
        assert_eq!(story.scenes[2].image_url.as_deref(), Some("https://img.example/new.png"));
    }

    #[tokio::test]
    async fn text_failure_aborts_generation() {
        let mut text = MockTextGenerator::new();
        text.expect_generate_story()
            .returning(|_| Err(AppError::Generator("model offline".into())));
        let images = MockImageGenerator::new();

        let err = orchestrator(text, images).generate(&fox_prompt()).await.unwrap_err();
        assert!(matches!(err, AppError::Generator(_)));
    }

    #[tokio::test]
    async fn invalid_prompt_never_reaches_a_generator() {
        let mut prompt = fox_prompt();
        prompt.num_scenes = 12;

        let err = orchestrator(MockTextGenerator::new(), MockImageGenerator::new())
            .generate(&prompt)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn wrong_scene_count_from_text_generator_is_an_error() {
        let mut text = MockTextGenerator::new();
        text.expect_generate_story().returning(|prompt| {
            let mut story = scripted_story(prompt);
            story.scenes.pop();
            Ok(story)
        });

        let err = orchestrator(text, MockImageGenerator::new())
            .generate(&fox_prompt())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Generator(_)));
    }

    #[tokio::test]
    async fn regenerating_text_passes_current_scene_and_leaves_story_untouched() {
        let story = fox_story();
        let before = story.clone();

        let mut text = MockTextGenerator::new();
        text.expect_regenerate_scene_text()
            .times(1)
            .withf(|_, index, current| *index == 1 && current.starts_with("The key opens"))
            .returning(|_, _, _| Ok("A new door appears.".into()));

        let new_text = orchestrator(text, MockImageGenerator::new())
            .regenerate_scene_text(&story, 1)
            .await
            .unwrap();

        assert_eq!(new_text, "A new door appears.");
        assert_eq!(story, before);
    }

    #[tokio::test]
    async fn out_of_range_regeneration_is_rejected_without_calls() {
        let story = fox_story();
        let orchestrator = orchestrator(MockTextGenerator::new(), MockImageGenerator::new());

        let text_err = orchestrator.regenerate_scene_text(&story, 3).await.unwrap_err();
        let image_err = orchestrator.regenerate_scene_image(&story, 99).await.unwrap_err();

        assert!(matches!(text_err, AppError::Validation(_)));
        assert!(matches!(image_err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn regenerating_image_synthesizes_prompt_when_scene_has_none() {
        let mut story = fox_story();
        story.prompt.setting = Some("a snowy forest".into());

        let mut images = MockImageGenerator::new();
        images
            .expect_generate_image()
            .times(1)
            .withf(|req| {
                req.prompt
                    == "a snowy forest. The key opens a door in an old oak tree., in Watercolor style"
            })
            .returning(|_| Ok("https://img.example/oak.png".into()));

        let url = orchestrator(MockTextGenerator::new(), images)
            .regenerate_scene_image(&story, 1)
            .await
            .unwrap();
        assert_eq!(url, "https://img.example/oak.png");
    }

    #[tokio::test]
    async fn regeneration_failure_propagates() {
        let story = fox_story();
        let mut images = MockImageGenerator::new();
        images
            .expect_generate_image()
            .returning(|_| Err(AppError::Generator("rate limited".into())));

        let err = orchestrator(MockTextGenerator::new(), images)
            .regenerate_scene_image(&story, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Generator(_)));
    }
}
