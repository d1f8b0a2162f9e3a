//! Directory-scanning conventions shared by the dataset server and the
//! preparation tool: which files count as images, and how timestamped capture
//! runs collapse to a single "latest" JSON document per base name.

use std::io;
use std::path::{Path, PathBuf};

pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

pub fn has_image_extension(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, extension)| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| extension.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Sorted names of the subdirectories of `dir`; empty when `dir` is absent.
pub fn sorted_subdirectories(dir: &Path) -> io::Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Sorted image file names in `dir`; empty when `dir` is absent.
pub fn sorted_image_files(dir: &Path) -> io::Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type()?.is_file() && has_image_extension(&name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Lexicographically last `<base>*.json` in `dir`; the capture convention
/// timestamps run files so the newest one sorts last.
pub fn latest_prefixed_json(dir: &Path, base: &str) -> io::Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(base) && name.ends_with(".json") && entry.file_type()?.is_file() {
            candidates.push(name);
        }
    }
    candidates.sort();
    Ok(candidates.pop().map(|name| dir.join(name)))
}
