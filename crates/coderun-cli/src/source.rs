//! Loading source files and working out their language.

use anyhow::{Context, Result};
use coderun_types::Language;
use std::path::Path;

/// Pick the language for `path`: an explicit name wins, then the file extension,
/// then the configured default.
pub fn resolve_language(explicit: Option<&str>, path: &Path, default: &str) -> Result<Language> {
    if let Some(name) = explicit {
        return Ok(name.parse()?);
    }

    if let Some(language) = path
        .extension()
        .and_then(|extension| extension.to_str())
        .and_then(Language::from_extension)
    {
        return Ok(language);
    }

    log::debug!(
        "No language detected for {}, using default {}",
        path.display(),
        default
    );
    Ok(default.parse()?)
}

pub async fn read_source(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Stdin for a one-shot run, from `--input` or `--input-file`.
pub async fn captured_input(inline: Option<String>, file: Option<&Path>) -> Result<Option<String>> {
    if let Some(input) = inline {
        // Shell arguments cannot carry real newlines easily.
        return Ok(Some(input.replace("\\n", "\n")));
    }
    match file {
        Some(path) => Ok(Some(read_source(path).await?)),
        None => Ok(None),
    }
}

/// Snippet title when none is given: the file name without extension.
pub fn default_title(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or(coderun_types::DEFAULT_SNIPPET_TITLE)
        .to_string()
}
