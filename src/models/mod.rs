pub mod api;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AppError, Result};

pub const MIN_SCENES: u8 = 3;
pub const MAX_SCENES: u8 = 10;
pub const DEFAULT_SCENES: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Genre {
    Fantasy,
    #[serde(rename = "Science Fiction")]
    ScienceFiction,
    Mystery,
    Adventure,
    Romance,
    Horror,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    Lighthearted,
    Serious,
    Funny,
    Dramatic,
    Mysterious,
    Educational,
    Inspirational,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtStyle {
    #[default]
    #[serde(rename = "Digital Painting")]
    DigitalPainting,
    Watercolor,
    #[serde(rename = "Pixel Art")]
    PixelArt,
    #[serde(rename = "Comic Book")]
    ComicBook,
    #[serde(rename = "3D Rendered")]
    Rendered3d,
    #[serde(rename = "Children's Book Illustration")]
    ChildrensBook,
    #[serde(rename = "Concept Art")]
    ConceptArt,
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Genre::Fantasy => "Fantasy",
            Genre::ScienceFiction => "Science Fiction",
            Genre::Mystery => "Mystery",
            Genre::Adventure => "Adventure",
            Genre::Romance => "Romance",
            Genre::Horror => "Horror",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tone::Lighthearted => "Lighthearted",
            Tone::Serious => "Serious",
            Tone::Funny => "Funny",
            Tone::Dramatic => "Dramatic",
            Tone::Mysterious => "Mysterious",
            Tone::Educational => "Educational",
            Tone::Inspirational => "Inspirational",
        };
        f.write_str(name)
    }
}

impl fmt::Display for ArtStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtStyle::DigitalPainting => "Digital Painting",
            ArtStyle::Watercolor => "Watercolor",
            ArtStyle::PixelArt => "Pixel Art",
            ArtStyle::ComicBook => "Comic Book",
            ArtStyle::Rendered3d => "3D Rendered",
            ArtStyle::ChildrensBook => "Children's Book Illustration",
            ArtStyle::ConceptArt => "Concept Art",
        };
        f.write_str(name)
    }
}

impl ArtStyle {
    /// Image size preset that suits the style's usual composition.
    pub fn preferred_image_size(&self) -> &'static str {
        match self {
            ArtStyle::PixelArt => "square_hd",
            ArtStyle::ComicBook | ArtStyle::ConceptArt => "landscape_16_9",
            _ => "landscape_4_3",
        }
    }
}

fn default_num_scenes() -> u8 {
    DEFAULT_SCENES
}

/// What the user asked for. Kept on the story so regeneration has the original context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryPrompt {
    pub idea: String,
    pub genre: Genre,
    pub tone: Tone,
    #[serde(default = "default_num_scenes")]
    pub num_scenes: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_character: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setting: Option<String>,
    #[serde(default)]
    pub art_style: ArtStyle,
}

impl StoryPrompt {
    pub fn validate(&self) -> Result<()> {
        if self.idea.trim().is_empty() {
            return Err(AppError::Validation("Story idea must not be empty".into()));
        }
        if !(MIN_SCENES..=MAX_SCENES).contains(&self.num_scenes) {
            return Err(AppError::Validation(format!(
                "numScenes must be between {} and {}, got {}",
                MIN_SCENES, MAX_SCENES, self.num_scenes
            )));
        }
        Ok(())
    }

    pub fn setting_text(&self) -> Option<&str> {
        self.setting.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn character_text(&self) -> Option<&str> {
        self.main_character
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Scene {
    pub fn new(text: impl Into<String>) -> Self {
        Scene {
            text: text.into(),
            image_prompt: None,
            image_url: None,
        }
    }

    pub fn with_image_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.image_prompt = Some(prompt.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: String,
    pub title: String,
    pub prompt: StoryPrompt,
    pub scenes: Vec<Scene>,
    pub creation_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Story {
    /// A fresh story with a newly minted id.
    pub fn new(title: impl Into<String>, prompt: StoryPrompt, scenes: Vec<Scene>) -> Self {
        Story {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            prompt,
            scenes,
            creation_date: Utc::now(),
            updated_at: None,
        }
    }

    pub fn check_scene_index(&self, scene_index: usize) -> Result<()> {
        if scene_index >= self.scenes.len() {
            return Err(AppError::Validation(format!(
                "Scene index {} is out of range for a story with {} scenes",
                scene_index,
                self.scenes.len()
            )));
        }
        Ok(())
    }
}

/// Listing entry for a saved artifact. Carries no scene bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedStoryInfo {
    pub filename: String,
    pub id: String,
    pub title: String,
    pub num_scenes: usize,
    pub creation_date: DateTime<Utc>,
    pub prompt: StoryPrompt,
    pub file_size: u64,
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn prompt_uses_display_names_on_the_wire() {
        let json = r#"{
            "idea": "a robot learns to paint",
            "genre": "Science Fiction",
            "tone": "Inspirational",
            "artStyle": "Children's Book Illustration"
        }"#;
        let prompt: StoryPrompt = serde_json::from_str(json).unwrap();
        assert_eq!(prompt.genre, Genre::ScienceFiction);
        assert_eq!(prompt.art_style, ArtStyle::ChildrensBook);
        assert_eq!(prompt.num_scenes, DEFAULT_SCENES);
        assert_eq!(prompt.art_style.to_string(), "Children's Book Illustration");
    }

    #[test]
    fn unknown_genre_is_rejected() {
        let json = r#"{"idea":"x","genre":"Western","tone":"Serious","artStyle":"Watercolor"}"#;
        assert!(serde_json::from_str::<StoryPrompt>(json).is_err());
    }

    #[test]
    fn validation_checks_idea_and_scene_count() {
        assert!(fox_prompt().validate().is_ok());

        let mut blank = fox_prompt();
        blank.idea = "   ".into();
        assert!(matches!(blank.validate(), Err(AppError::Validation(_))));

        for bad in [2, 11] {
            let mut prompt = fox_prompt();
            prompt.num_scenes = bad;
            assert!(matches!(prompt.validate(), Err(AppError::Validation(_))));
        }
    }

    #[test]
    fn scene_index_bounds() {
        let story = fox_story();
        assert!(story.check_scene_index(2).is_ok());
        assert!(matches!(
            story.check_scene_index(3),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn art_styles_pick_image_sizes() {
        assert_eq!(ArtStyle::PixelArt.preferred_image_size(), "square_hd");
        assert_eq!(ArtStyle::ConceptArt.preferred_image_size(), "landscape_16_9");
        assert_eq!(ArtStyle::Watercolor.preferred_image_size(), "landscape_4_3");
    }
}
