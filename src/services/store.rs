//! Process-local registry of stories.
//!
//! Each story id owns exactly one record, kept in insertion order. The current
//! story is a pointer to one of those records, so scene updates made through it
//! are visible in `list()` too.

use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::models::{Scene, Story};

#[derive(Default)]
pub struct StoryStore {
    inner: RwLock<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    stories: Vec<Story>,
    current: Option<String>,
}

impl StoreInner {
    fn position(&self, id: &str) -> Option<usize> {
        self.stories.iter().position(|s| s.id == id)
    }

    fn upsert(&mut self, story: Story) {
        match self.position(&story.id) {
            Some(index) => self.stories[index] = story,
            None => self.stories.push(story),
        }
    }

    fn scene_mut(&mut self, id: &str, scene_index: usize) -> Result<&mut Scene> {
        let story = self
            .stories
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Story {}", id)))?;
        story.check_scene_index(scene_index)?;
        story.updated_at = Some(Utc::now());
        Ok(&mut story.scenes[scene_index])
    }

    fn current_id(&self) -> Result<String> {
        self.current
            .clone()
            .ok_or_else(|| AppError::Validation("No story is currently open".into()))
    }
}

impl StoryStore {
    pub fn new() -> Self {
        StoryStore::default()
    }

    /// Registers the story, replacing any record with the same id in place.
    pub async fn add(&self, story: Story) {
        self.inner.write().await.upsert(story);
    }

    /// Registers the story and makes it current.
    pub async fn set_current(&self, story: Story) {
        let mut inner = self.inner.write().await;
        inner.current = Some(story.id.clone());
        inner.upsert(story);
    }

    pub async fn current(&self) -> Option<Story> {
        let inner = self.inner.read().await;
        let id = inner.current.as_deref()?;
        inner.stories.iter().find(|s| s.id == id).cloned()
    }

    pub async fn find_by_id(&self, id: &str) -> Option<Story> {
        let inner = self.inner.read().await;
        inner.stories.iter().find(|s| s.id == id).cloned()
    }

    pub async fn list(&self) -> Vec<Story> {
        self.inner.read().await.stories.clone()
    }

    /// Drops the story; the current pointer is cleared if it pointed there.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let index = inner
            .position(id)
            .ok_or_else(|| AppError::NotFound(format!("Story {}", id)))?;
        inner.stories.remove(index);
        if inner.current.as_deref() == Some(id) {
            inner.current = None;
        }
        Ok(())
    }

    pub async fn update_scene_text(&self, scene_index: usize, text: String) -> Result<()> {
        let mut inner = self.inner.write().await;
        let id = inner.current_id()?;
        inner.scene_mut(&id, scene_index)?.text = text;
        Ok(())
    }

    pub async fn update_scene_image(&self, scene_index: usize, image_url: String) -> Result<()> {
        let mut inner = self.inner.write().await;
        let id = inner.current_id()?;
        inner.scene_mut(&id, scene_index)?.image_url = Some(image_url);
        Ok(())
    }

    pub async fn update_scene_text_by_id(&self, id: &str, scene_index: usize, text: String) -> Result<()> {
        self.inner.write().await.scene_mut(id, scene_index)?.text = text;
        Ok(())
    }

    pub async fn update_scene_image_by_id(
        &self,
        id: &str,
        scene_index: usize,
        image_url: String,
    ) -> Result<()> {
        self.inner.write().await.scene_mut(id, scene_index)?.image_url = Some(image_url);
        Ok(())
    }
}
