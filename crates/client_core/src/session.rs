//! The session controller: enumerations, position, selection, and refresh.

use std::sync::Arc;

use serde_json::Value;
use shared::{
    domain::{FileId, ModelId},
    error::SessionError,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cache::{CacheKey, ResourceCache};
use crate::ResourceFetcher;

/// Shown in a display slot whose resource could not be fetched.
pub const PLACEHOLDER_TEXT: &str = "no data available";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Back,
    Forward,
}

/// The two independently selectable result panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelSlot {
    A,
    B,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PanelContent {
    /// Header echoing the selected model name; empty when no model is selected.
    pub header: String,
    /// Pretty-printed JSON, or [`PLACEHOLDER_TEXT`].
    pub text: String,
}

/// Immutable view of the session handed to the UI after every operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub models: Vec<ModelId>,
    pub files: Vec<FileId>,
    pub position: Option<usize>,
    pub current_file: Option<FileId>,
    pub slot_a: Option<ModelId>,
    pub slot_b: Option<ModelId>,
    pub back_enabled: bool,
    pub forward_enabled: bool,
    pub keywords_text: String,
    pub panel_a: PanelContent,
    pub panel_b: PanelContent,
}

#[derive(Default)]
struct SessionState {
    models: Vec<ModelId>,
    files: Vec<FileId>,
    position: Option<usize>,
    slot_a: Option<ModelId>,
    slot_b: Option<ModelId>,
    // Bumped on every position or model-selection change; a refresh that
    // started under an older generation must not overwrite display state.
    generation: u64,
    cache: ResourceCache,
    keywords_text: String,
    panel_a: PanelContent,
    panel_b: PanelContent,
}

impl SessionState {
    fn current_file(&self) -> Option<&FileId> {
        self.position.and_then(|position| self.files.get(position))
    }

    fn snapshot(&self) -> SessionSnapshot {
        let back_enabled = matches!(self.position, Some(position) if position > 0);
        let forward_enabled =
            matches!(self.position, Some(position) if position + 1 < self.files.len());
        SessionSnapshot {
            models: self.models.clone(),
            files: self.files.clone(),
            position: self.position,
            current_file: self.current_file().cloned(),
            slot_a: self.slot_a.clone(),
            slot_b: self.slot_b.clone(),
            back_enabled,
            forward_enabled,
            keywords_text: self.keywords_text.clone(),
            panel_a: self.panel_a.clone(),
            panel_b: self.panel_b.clone(),
        }
    }
}

pub struct SessionController {
    fetcher: Arc<dyn ResourceFetcher>,
    inner: Mutex<SessionState>,
}

impl SessionController {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self {
            fetcher,
            inner: Mutex::new(SessionState::default()),
        }
    }

    /// Loads the model and file enumerations concurrently, defaults the two
    /// model slots to the first two entries, and loads content for position 0
    /// when the file list is non-empty.
    ///
    /// Either enumeration failing is fatal to the session; the caller surfaces
    /// the error once and must not retry.
    pub async fn initialize(&self) -> Result<SessionSnapshot, SessionError> {
        let (models, files) = tokio::join!(self.fetcher.model_list(), self.fetcher.file_list());
        let models = models
            .map_err(|err| SessionError::Initialization(format!("model list: {err:#}")))?;
        let files =
            files.map_err(|err| SessionError::Initialization(format!("file list: {err:#}")))?;

        info!(
            models = models.len(),
            files = files.len(),
            "session initialized"
        );

        let has_files = {
            let mut state = self.inner.lock().await;
            state.slot_a = models.first().cloned();
            state.slot_b = models.get(1).or_else(|| models.first()).cloned();
            state.models = models;
            state.position = if files.is_empty() { None } else { Some(0) };
            state.files = files;
            state.generation += 1;
            state.position.is_some()
        };

        if has_files {
            self.refresh_content().await
        } else {
            Ok(self.snapshot().await)
        }
    }

    /// Moves the position to the given file and refreshes content.
    ///
    /// A file id absent from the list is rejected with
    /// [`SessionError::NotFound`] and leaves the session untouched.
    pub async fn select_file(&self, file_id: &FileId) -> Result<SessionSnapshot, SessionError> {
        {
            let mut state = self.inner.lock().await;
            let position = state
                .files
                .iter()
                .position(|file| file == file_id)
                .ok_or_else(|| SessionError::NotFound(file_id.to_string()))?;
            state.position = Some(position);
            state.generation += 1;
        }
        self.refresh_content().await
    }

    /// Steps the position by one, clamped at the sequence boundaries. Stepping
    /// past a boundary is a no-op that does not refetch anything.
    pub async fn navigate(&self, direction: Direction) -> Result<SessionSnapshot, SessionError> {
        let moved = {
            let mut state = self.inner.lock().await;
            let Some(position) = state.position else {
                return Ok(state.snapshot());
            };
            let next = match direction {
                Direction::Back => position.saturating_sub(1),
                Direction::Forward => (position + 1).min(state.files.len().saturating_sub(1)),
            };
            if next == position {
                false
            } else {
                state.position = Some(next);
                state.generation += 1;
                true
            }
        };

        if moved {
            self.refresh_content().await
        } else {
            Ok(self.snapshot().await)
        }
    }

    /// Re-points one panel slot at a different model and refreshes content for
    /// the current file; the position does not change.
    pub async fn set_model(
        &self,
        slot: PanelSlot,
        model: ModelId,
    ) -> Result<SessionSnapshot, SessionError> {
        {
            let mut state = self.inner.lock().await;
            match slot {
                PanelSlot::A => state.slot_a = Some(model),
                PanelSlot::B => state.slot_b = Some(model),
            }
            state.generation += 1;
        }
        self.refresh_content().await
    }

    /// Fetches keywords and both model results for the current file, all three
    /// concurrently with an all-complete join. Each slot degrades to
    /// [`PLACEHOLDER_TEXT`] independently; failures are never cached, so the
    /// next refresh re-attempts them.
    pub async fn refresh_content(&self) -> Result<SessionSnapshot, SessionError> {
        let (generation, file, slot_a, slot_b) = {
            let state = self.inner.lock().await;
            let Some(file) = state.current_file().cloned() else {
                return Ok(state.snapshot());
            };
            (
                state.generation,
                file,
                state.slot_a.clone(),
                state.slot_b.clone(),
            )
        };
        let base = file.base_name().to_string();

        let (keywords, result_a, result_b) = tokio::join!(
            self.load_keywords(&base),
            self.load_result(slot_a.as_ref(), &base),
            self.load_result(slot_b.as_ref(), &base),
        );

        let mut state = self.inner.lock().await;
        if state.generation != generation {
            // A newer selection superseded this refresh; the cache is already
            // warmed, only the display state is left alone.
            debug!(file = %file, "discarding stale refresh");
            return Ok(state.snapshot());
        }

        state.keywords_text = panel_text(keywords.as_ref());
        state.panel_a = PanelContent {
            header: header_text(slot_a.as_ref()),
            text: panel_text(result_a.as_ref()),
        };
        state.panel_b = PanelContent {
            header: header_text(slot_b.as_ref()),
            text: panel_text(result_b.as_ref()),
        };
        Ok(state.snapshot())
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().await.snapshot()
    }

    /// Raw image bytes for a file. Images are not part of the session cache;
    /// callers keep their own decoded textures.
    pub async fn load_image(&self, file: &FileId) -> anyhow::Result<Vec<u8>> {
        self.fetcher.image(file).await
    }

    async fn load_keywords(&self, base: &str) -> Option<Value> {
        let key = CacheKey::keywords(base);
        if let Some(value) = self.inner.lock().await.cache.get(&key).cloned() {
            return Some(value);
        }
        match self.fetcher.keywords(base).await {
            Ok(value) => {
                self.inner.lock().await.cache.insert(key, value.clone());
                Some(value)
            }
            Err(err) => {
                debug!(base, "keywords fetch failed: {err:#}");
                None
            }
        }
    }

    async fn load_result(&self, model: Option<&ModelId>, base: &str) -> Option<Value> {
        let model = model?;
        let key = CacheKey::result(model, base);
        if let Some(value) = self.inner.lock().await.cache.get(&key).cloned() {
            return Some(value);
        }
        match self.fetcher.result(model, base).await {
            Ok(value) => {
                self.inner.lock().await.cache.insert(key, value.clone());
                Some(value)
            }
            Err(err) => {
                debug!(%model, base, "result fetch failed: {err:#}");
                None
            }
        }
    }
}

fn panel_text(value: Option<&Value>) -> String {
    value
        .and_then(|value| serde_json::to_string_pretty(value).ok())
        .unwrap_or_else(|| PLACEHOLDER_TEXT.to_string())
}

fn header_text(model: Option<&ModelId>) -> String {
    model.map(|model| model.0.clone()).unwrap_or_default()
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
