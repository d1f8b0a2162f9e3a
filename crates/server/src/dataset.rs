//! Filesystem dataset backing the viewer API.
//!
//! Layout under the dataset root:
//!   images/              image files, one per file identifier
//!   keywords/            <base>.json keyword documents
//!   results/<model>/     <base>.json result documents, one directory per model
//!
//! Result and keyword lookups accept pre-flattened `<base>.json` documents and
//! fall back to the newest `<base>*`-prefixed JSON, matching the raw capture
//! layout where several timestamped runs share a base name.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use shared::scan;

#[derive(Debug, Clone)]
pub struct Dataset {
    root: PathBuf,
}

impl Dataset {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(anyhow!(
                "dataset directory does not exist: {}",
                root.display()
            ));
        }
        Ok(Self { root })
    }

    /// Sorted model identifiers: one per subdirectory of `results/`.
    pub fn models(&self) -> Result<Vec<String>> {
        let results_dir = self.root.join("results");
        scan::sorted_subdirectories(&results_dir)
            .with_context(|| format!("failed to list {}", results_dir.display()))
    }

    /// Sorted image file identifiers under `images/`.
    pub fn files(&self) -> Result<Vec<String>> {
        let images_dir = self.root.join("images");
        scan::sorted_image_files(&images_dir)
            .with_context(|| format!("failed to list {}", images_dir.display()))
    }

    pub fn image_path(&self, file_name: &str) -> Result<PathBuf> {
        ensure_plain_name(file_name)?;
        Ok(self.root.join("images").join(file_name))
    }

    pub fn keywords(&self, base: &str) -> Result<Option<Value>> {
        ensure_plain_name(base)?;
        load_json_document(&self.root.join("keywords"), base)
    }

    pub fn result(&self, model: &str, base: &str) -> Result<Option<Value>> {
        ensure_plain_name(model)?;
        ensure_plain_name(base)?;
        load_json_document(&self.root.join("results").join(model), base)
    }
}

fn ensure_plain_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(anyhow!("invalid resource name '{name}'"));
    }
    Ok(())
}

fn load_json_document(dir: &Path, base: &str) -> Result<Option<Value>> {
    let exact = dir.join(format!("{base}.json"));
    let path = if exact.is_file() {
        Some(exact)
    } else {
        scan::latest_prefixed_json(dir, base)
            .with_context(|| format!("failed to list {}", dir.display()))?
    };

    let Some(path) = path else {
        return Ok(None);
    };
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value = serde_json::from_str(&raw)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;
    Ok(Some(value))
}
