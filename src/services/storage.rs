//! Saved story artifacts.
//!
//! A `.story` file is a zip archive holding `metadata.json` (title, prompt and
//! ordered scenes) plus, when available, the scene illustrations under
//! `images/scene_<i>.png`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use zip::{CompressionMethod, ZipArchive, ZipWriter, write::FileOptions};

use crate::error::{AppError, Result};
use crate::models::{MAX_SCENES, MIN_SCENES, SavedStoryInfo, Scene, Story, StoryPrompt};
use crate::utils::{STORY_EXTENSION, checked_filename, slugify, strip_bom};
use uuid::Uuid;

const METADATA_ENTRY: &str = "metadata.json";

#[derive(Debug, Serialize, Deserialize)]
struct StoryDocument {
    #[serde(default)]
    id: Option<String>,
    title: String,
    prompt: StoryPrompt,
    #[serde(default)]
    num_scenes: usize,
    #[serde(default)]
    creation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<String>,
    scenes: Vec<SceneRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SceneRecord {
    index: usize,
    text: String,
    #[serde(rename = "imageUrl", default)]
    image_url: Option<String>,
    #[serde(rename = "imagePrompt", default)]
    image_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_file: Option<String>,
}

impl StoryDocument {
    fn from_story(story: &Story, images: &[Option<String>]) -> Self {
        StoryDocument {
            id: Some(story.id.clone()),
            title: story.title.clone(),
            prompt: story.prompt.clone(),
            num_scenes: story.scenes.len(),
            creation_date: Some(story.creation_date.to_rfc3339()),
            updated_at: story.updated_at.map(|t| t.to_rfc3339()),
            scenes: story
                .scenes
                .iter()
                .enumerate()
                .map(|(index, scene)| SceneRecord {
                    index,
                    text: scene.text.clone(),
                    image_url: scene.image_url.clone(),
                    image_prompt: scene.image_prompt.clone(),
                    image_file: images.get(index).cloned().flatten(),
                })
                .collect(),
        }
    }

    fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now)
    }

    /// `fallback_id` is used for older artifacts that were saved without an id.
    fn into_story(mut self, fallback_id: impl FnOnce() -> String) -> std::result::Result<Story, String> {
        self.scenes.sort_by_key(|s| s.index);
        let creation_date = self.creation_date();
        let updated_at = self.updated_at.as_deref().and_then(parse_timestamp);

        let count = self.scenes.len();
        if !(MIN_SCENES as usize..=MAX_SCENES as usize).contains(&count) {
            return Err(format!(
                "story has {} scenes, expected {} to {}",
                count, MIN_SCENES, MAX_SCENES
            ));
        }

        // Older artifacts carry no numScenes in their prompt.
        let mut prompt = self.prompt;
        prompt.num_scenes = count as u8;
        prompt.validate().map_err(|e| format!("invalid prompt: {}", e))?;

        Ok(Story {
            id: self.id.filter(|id| !id.is_empty()).unwrap_or_else(fallback_id),
            title: self.title,
            prompt,
            scenes: self
                .scenes
                .into_iter()
                .map(|record| Scene {
                    text: record.text,
                    image_prompt: record.image_prompt,
                    image_url: record.image_url,
                })
                .collect(),
            creation_date,
            updated_at,
        })
    }
}

/// Same key, same id: keeps id-less artifacts addressable across reads.
fn stable_id(key: &[u8]) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key).to_string()
}

fn read_story(bytes: &[u8], key: &[u8]) -> std::result::Result<Story, String> {
    read_document(bytes)?.into_story(|| stable_id(key))
}

/// Accepts RFC 3339 as well as the naive ISO timestamps of older artifacts.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|t| t.and_utc())
        })
}

fn read_document(bytes: &[u8]) -> std::result::Result<StoryDocument, String> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| format!("not a story archive: {}", e))?;
    let mut entry = archive
        .by_name(METADATA_ENTRY)
        .map_err(|_| format!("{} not found", METADATA_ENTRY))?;
    let mut json = String::new();
    entry
        .read_to_string(&mut json)
        .map_err(|e| format!("unreadable {}: {}", METADATA_ENTRY, e))?;

    let document: StoryDocument =
        serde_json::from_str(&json).map_err(|e| format!("invalid {}: {}", METADATA_ENTRY, e))?;
    if document.scenes.is_empty() {
        return Err("story has no scenes".to_string());
    }
    Ok(document)
}

fn write_archive(
    document: &StoryDocument,
    images: &[(String, Vec<u8>)],
) -> std::result::Result<Vec<u8>, String> {
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for (name, bytes) in images {
        writer.start_file(name.as_str(), options).map_err(|e| e.to_string())?;
        writer.write_all(bytes).map_err(|e| e.to_string())?;
    }

    let metadata = serde_json::to_vec_pretty(document).map_err(|e| e.to_string())?;
    writer.start_file(METADATA_ENTRY, options).map_err(|e| e.to_string())?;
    writer.write_all(&metadata).map_err(|e| e.to_string())?;

    let cursor = writer.finish().map_err(|e| e.to_string())?;
    Ok(cursor.into_inner())
}

pub struct StoryStorage {
    stories_dir: PathBuf,
    http: Option<reqwest::Client>,
}

impl StoryStorage {
    /// Client for embedding illustrations, giving up on an image after `timeout`.
    pub fn image_client(timeout: Duration) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder().timeout(timeout).build()?)
    }

    /// `http` is used to embed illustrations into saved artifacts; `None` stores URLs only.
    pub async fn new(stories_dir: impl Into<PathBuf>, http: Option<reqwest::Client>) -> Result<Self> {
        let stories_dir = stories_dir.into();
        tokio::fs::create_dir_all(&stories_dir).await?;
        debug!("Story storage directory: {}", stories_dir.display());
        Ok(StoryStorage { stories_dir, http })
    }

    pub fn stories_dir(&self) -> &Path {
        &self.stories_dir
    }

    fn path_of(&self, filename: &str) -> PathBuf {
        self.stories_dir.join(filename)
    }

    async fn existing_path(&self, filename: &str) -> Result<(String, PathBuf)> {
        let filename = checked_filename(filename)?;
        let path = self.path_of(&filename);
        if !tokio::fs::try_exists(&path).await? {
            return Err(AppError::NotFound(format!("Saved story {}", filename)));
        }
        Ok((filename, path))
    }

    /// Serializes the story under `filename`, or under a name derived from its title.
    pub async fn save(&self, story: &Story, filename: Option<&str>) -> Result<String> {
        let filename = match filename.map(str::trim).filter(|f| !f.is_empty()) {
            Some(name) => checked_filename(name)?,
            None => self.derived_filename(story).await,
        };

        let (image_files, images) = self.fetch_images(story).await;
        let document = StoryDocument::from_story(story, &image_files);
        let bytes = write_archive(&document, &images).map_err(AppError::Persistence)?;

        let path = self.path_of(&filename);
        let staging = self.path_of(&format!(".{}.{}.tmp", filename, Uuid::new_v4().simple()));
        let written = match tokio::fs::write(&staging, &bytes).await {
            Ok(()) => tokio::fs::rename(&staging, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }

        info!("Story {} saved to {}", story.id, path.display());
        Ok(filename)
    }

    /// `<slug>.story`, suffixed with the story id when another story already owns that name.
    async fn derived_filename(&self, story: &Story) -> String {
        let slug = match slugify(&story.title) {
            s if s.is_empty() => "untitled".to_string(),
            s => s,
        };
        let candidate = format!("{}{}", slug, STORY_EXTENSION);

        let owner = match tokio::fs::read(self.path_of(&candidate)).await {
            Ok(bytes) => Some(read_document(&bytes).ok().and_then(|doc| doc.id)),
            Err(_) => None,
        };
        match owner {
            Some(Some(id)) if id == story.id => candidate,
            None => candidate,
            Some(_) => {
                let short: String = story.id.chars().take(8).collect();
                format!("{}_{}{}", slug, short, STORY_EXTENSION)
            }
        }
    }

    async fn fetch_images(&self, story: &Story) -> (Vec<Option<String>>, Vec<(String, Vec<u8>)>) {
        let mut files = vec![None; story.scenes.len()];
        let mut images = Vec::new();
        let Some(http) = &self.http else {
            return (files, images);
        };

        for (index, scene) in story.scenes.iter().enumerate() {
            let Some(url) = scene.image_url.as_deref() else {
                continue;
            };
            match fetch_bytes(http, url).await {
                Ok(bytes) => {
                    let name = format!("images/scene_{}.png", index);
                    files[index] = Some(name.clone());
                    images.push((name, bytes));
                }
                Err(e) => warn!("Could not embed image for scene {}: {}", index, e),
            }
        }
        (files, images)
    }

    pub async fn list(&self) -> Result<Vec<SavedStoryInfo>> {
        let mut entries = tokio::fs::read_dir(&self.stories_dir).await?;
        let mut stories = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let filename = entry.file_name().to_string_lossy().to_string();
            if !filename.ends_with(STORY_EXTENSION) || filename.starts_with('.') {
                continue;
            }

            let bytes = match tokio::fs::read(entry.path()).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    error!("Error reading {}: {}", filename, e);
                    continue;
                }
            };
            let story = match read_story(&bytes, filename.as_bytes()) {
                Ok(story) => story,
                Err(e) => {
                    error!("Error reading story metadata from {}: {}", filename, e);
                    continue;
                }
            };

            stories.push(SavedStoryInfo {
                filename,
                num_scenes: story.scenes.len(),
                id: story.id,
                title: story.title,
                creation_date: story.creation_date,
                prompt: story.prompt,
                file_size: bytes.len() as u64,
            });
        }

        stories.sort_by(|a, b| b.creation_date.cmp(&a.creation_date));
        Ok(stories)
    }

    pub async fn load(&self, filename: &str) -> Result<Story> {
        let (filename, path) = self.existing_path(filename).await?;
        let bytes = tokio::fs::read(&path).await?;
        let story = read_story(&bytes, filename.as_bytes())
            .map_err(|e| AppError::Persistence(format!("Story file {} is unreadable: {}", filename, e)))?;
        info!("Story loaded from {}", path.display());
        Ok(story)
    }

    pub async fn remove(&self, filename: &str) -> Result<()> {
        let (_, path) = self.existing_path(filename).await?;
        tokio::fs::remove_file(&path).await?;
        info!("Story deleted: {}", path.display());
        Ok(())
    }

    /// Raw artifact bytes together with the `.story` name to offer for download.
    pub async fn download(&self, filename: &str) -> Result<(String, Vec<u8>)> {
        let (filename, path) = self.existing_path(filename).await?;
        let bytes = tokio::fs::read(&path).await?;
        Ok((filename, bytes))
    }

    /// Parses an uploaded artifact. Nothing is written to the stories directory.
    pub fn upload(&self, bytes: &[u8]) -> Result<Story> {
        let bytes = strip_bom(bytes);
        read_story(bytes, bytes).map_err(|e| AppError::Validation(format!("Malformed story file: {}", e)))
    }
}

async fn fetch_bytes(http: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = http.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}
