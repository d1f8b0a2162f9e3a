//! Dataset preparation: flattens a raw capture directory into the layout the
//! server expects.
//!
//! Source layout:
//!   raw_images/            captured chart images
//!   raw_results/<model>/   per-model run documents, possibly several per base
//!   raw_keywords/          keyword run documents, possibly several per base
//!
//! For each image only the newest run per base name is kept, keyword documents
//! are trimmed to a fixed field whitelist, and result documents lose their
//! top-level `metadata` block. Two manifests (`models.json`, `files.json`)
//! record the sorted enumerations.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use shared::{domain::base_name, scan};

/// Keyword document fields the viewer consumes; everything else is dropped.
const KEYWORD_FIELDS: [&str; 3] = ["ocr_results", "identified_keywords", "statistics"];

#[derive(Debug, Default)]
pub struct PrepareSummary {
    pub models: usize,
    pub files: usize,
    pub keywords_written: usize,
    pub results_written: usize,
}

pub fn prepare_dataset(source: &Path, output: &Path) -> Result<PrepareSummary> {
    let raw_images = source.join("raw_images");
    let raw_results = source.join("raw_results");
    let raw_keywords = source.join("raw_keywords");

    let models = scan::sorted_subdirectories(&raw_results)
        .with_context(|| format!("failed to list {}", raw_results.display()))?;
    let files = scan::sorted_image_files(&raw_images)
        .with_context(|| format!("failed to list {}", raw_images.display()))?;

    let images_out = output.join("images");
    let keywords_out = output.join("keywords");
    let results_out = output.join("results");
    fs::create_dir_all(&images_out)
        .with_context(|| format!("failed to create {}", images_out.display()))?;
    fs::create_dir_all(&keywords_out)
        .with_context(|| format!("failed to create {}", keywords_out.display()))?;
    fs::create_dir_all(&results_out)
        .with_context(|| format!("failed to create {}", results_out.display()))?;

    write_json(&output.join("models.json"), &json!(models))?;
    write_json(&output.join("files.json"), &json!(files))?;

    let mut summary = PrepareSummary {
        models: models.len(),
        files: files.len(),
        ..PrepareSummary::default()
    };

    for file in &files {
        fs::copy(raw_images.join(file), images_out.join(file))
            .with_context(|| format!("failed to copy image '{file}'"))?;
        let base = base_name(file);

        if let Some(path) = scan::latest_prefixed_json(&raw_keywords, base)
            .with_context(|| format!("failed to list {}", raw_keywords.display()))?
        {
            let document = read_json(&path)?;
            write_json(
                &keywords_out.join(format!("{base}.json")),
                &trim_keyword_document(document),
            )?;
            summary.keywords_written += 1;
        }

        for model in &models {
            let model_dir = raw_results.join(model);
            let Some(path) = scan::latest_prefixed_json(&model_dir, base)
                .with_context(|| format!("failed to list {}", model_dir.display()))?
            else {
                continue;
            };
            let document = read_json(&path)?;
            let model_out = results_out.join(model);
            fs::create_dir_all(&model_out)
                .with_context(|| format!("failed to create {}", model_out.display()))?;
            write_json(
                &model_out.join(format!("{base}.json")),
                &trim_result_document(document),
            )?;
            summary.results_written += 1;
        }
    }

    Ok(summary)
}

/// Keeps only the whitelisted fields, substituting an empty object for any
/// that are absent so the served shape is uniform.
fn trim_keyword_document(document: Value) -> Value {
    let mut fields = match document {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    let mut trimmed = Map::new();
    for field in KEYWORD_FIELDS {
        let value = fields.remove(field).unwrap_or_else(|| json!({}));
        trimmed.insert(field.to_string(), value);
    }
    Value::Object(trimmed)
}

fn trim_result_document(mut document: Value) -> Value {
    if let Some(fields) = document.as_object_mut() {
        fields.remove("metadata");
    }
    document
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn write_json(path: &Path, value: &Value) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to render {}", path.display()))?;
    fs::write(path, rendered).with_context(|| format!("failed to write {}", path.display()))
}
