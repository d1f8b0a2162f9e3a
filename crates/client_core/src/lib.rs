//! Session controller and resource plumbing for the side-by-side result viewer.
//!
//! The controller owns the model/file enumerations, the current position, and
//! the session-scoped resource cache. All remote access goes through the
//! [`ResourceFetcher`] seam so the controller can be driven by a scripted
//! fetcher in tests and by [`HttpFetcher`] in the applications.

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::domain::{FileId, ModelId};

mod cache;
mod session;

pub use cache::{CacheKey, ResourceCache, ResourceKind};
pub use session::{
    Direction, PanelContent, PanelSlot, SessionController, SessionSnapshot, PLACEHOLDER_TEXT,
};

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Read-only access to the externally hosted viewer resources.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn model_list(&self) -> Result<Vec<ModelId>>;
    async fn file_list(&self) -> Result<Vec<FileId>>;
    async fn keywords(&self, base: &str) -> Result<Value>;
    async fn result(&self, model: &ModelId, base: &str) -> Result<Value>;
    async fn image(&self, file: &FileId) -> Result<Vec<u8>>;
}

/// Fetcher placeholder for sessions constructed before a server URL is known.
pub struct MissingResourceFetcher;

#[async_trait]
impl ResourceFetcher for MissingResourceFetcher {
    async fn model_list(&self) -> Result<Vec<ModelId>> {
        Err(anyhow!("resource backend is unavailable"))
    }

    async fn file_list(&self) -> Result<Vec<FileId>> {
        Err(anyhow!("resource backend is unavailable"))
    }

    async fn keywords(&self, base: &str) -> Result<Value> {
        Err(anyhow!("resource backend is unavailable for base '{base}'"))
    }

    async fn result(&self, model: &ModelId, base: &str) -> Result<Value> {
        Err(anyhow!(
            "resource backend is unavailable for model '{model}' base '{base}'"
        ))
    }

    async fn image(&self, file: &FileId) -> Result<Vec<u8>> {
        Err(anyhow!("resource backend is unavailable for file '{file}'"))
    }
}

/// HTTP fetcher against the dataset server's `/api` routes.
pub struct HttpFetcher {
    http: Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn model_list(&self) -> Result<Vec<ModelId>> {
        let models = self
            .http
            .get(self.url("/api/models"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(models)
    }

    async fn file_list(&self) -> Result<Vec<FileId>> {
        let files = self
            .http
            .get(self.url("/api/files"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(files)
    }

    async fn keywords(&self, base: &str) -> Result<Value> {
        let value = self
            .http
            .get(self.url(&format!("/api/keywords/{base}")))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(value)
    }

    async fn result(&self, model: &ModelId, base: &str) -> Result<Value> {
        let value = self
            .http
            .get(self.url(&format!("/api/results/{model}/{base}")))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(value)
    }

    async fn image(&self, file: &FileId) -> Result<Vec<u8>> {
        let bytes = self
            .http
            .get(self.url(&format!("/api/image/{file}")))
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
