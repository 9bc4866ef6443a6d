use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::models::{EnrichedArticle, Script};

const BATCH_VERSION: &str = "1.0";

/// Handoff file between scout-news and write-script: one scored, enriched
/// batch plus provenance.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchData {
    pub version: String,
    pub created_at: String,
    pub query: String,
    pub articles: Vec<EnrichedArticle>,
}

impl BatchData {
    pub fn new(query: impl Into<String>, articles: Vec<EnrichedArticle>) -> Self {
        Self {
            version: BATCH_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            query: query.into(),
            articles,
        }
    }
}

/// Default directory for batch files
pub fn get_default_batch_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .context("Could not determine local data directory")?
        .join("ai-satirist")
        .join("batches");

    fs::create_dir_all(&data_dir).context("Failed to create batch directory")?;

    Ok(data_dir)
}

/// Default location of the persistent score cache
pub fn get_default_cache_path() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .context("Could not determine local data directory")?
        .join("ai-satirist");

    fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

    Ok(data_dir.join("article_scores.db"))
}

pub fn save_batch(data: &BatchData, filename: &str) -> Result<PathBuf> {
    let batch_dir = get_default_batch_dir()?;
    let filepath = batch_dir.join(filename);

    let json = serde_json::to_string_pretty(data).context("Failed to serialize batch data")?;

    fs::write(&filepath, json).context("Failed to write batch file")?;

    Ok(filepath)
}

pub fn load_batch(filepath: &PathBuf) -> Result<BatchData> {
    if !filepath.exists() {
        anyhow::bail!("Batch file not found: {}", filepath.display());
    }

    let content = fs::read_to_string(filepath)
        .with_context(|| format!("Failed to read batch file: {}", filepath.display()))?;

    let data: BatchData = serde_json::from_str(&content).with_context(|| {
        format!(
            "Failed to parse batch JSON from {}. The file may be corrupted or not a batch file.",
            filepath.display()
        )
    })?;

    if data.version != BATCH_VERSION {
        anyhow::bail!(
            "Unsupported batch file version: {}. Expected {}. Please regenerate with scout-news.",
            data.version,
            BATCH_VERSION
        );
    }

    Ok(data)
}

/// List available batch files, newest first
pub fn list_batch_files() -> Result<Vec<(PathBuf, BatchData)>> {
    let batch_dir = get_default_batch_dir()?;

    let mut files = Vec::new();

    if batch_dir.exists() {
        for entry in fs::read_dir(&batch_dir).context("Failed to read batch directory")? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                match load_batch(&path) {
                    Ok(data) => files.push((path, data)),
                    Err(e) => {
                        eprintln!("Warning: Could not load {}: {}", path.display(), e);
                    }
                }
            }
        }
    }

    files.sort_by(|a, b| b.1.created_at.cmp(&a.1.created_at));

    Ok(files)
}

pub fn save_script(script: &Script, filename: &str) -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .context("Could not determine local data directory")?
        .join("ai-satirist")
        .join("scripts");

    fs::create_dir_all(&data_dir).context("Failed to create scripts directory")?;

    let filepath = data_dir.join(filename);
    let json = serde_json::to_string_pretty(script).context("Failed to serialize script")?;
    fs::write(&filepath, json).context("Failed to write script file")?;

    Ok(filepath)
}
