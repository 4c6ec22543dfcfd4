use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{serde_as, DefaultOnError, VecSkipError};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

/// Sample catalog written on first run when no dataset exists yet.
const SEED_DATASET: &str = include_str!("../../demos/hunts-data.json");

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Category {
    Flames,
    Embers,
    Alchemy,
}

impl Category {
    /// PEAK hunt style the category stands for.
    pub fn hunt_style(self) -> &'static str {
        match self {
            Category::Flames => "Hypothesis-driven",
            Category::Embers => "Baseline",
            Category::Alchemy => "Model-Assisted",
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Submitter {
    #[serde_as(as = "DefaultOnError")]
    pub name: String,
    #[serde_as(as = "DefaultOnError")]
    pub link: Option<String>,
}

impl Submitter {
    pub fn link(&self) -> Option<&str> {
        self.link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
    }
}

/// One catalogued hunt. A field that is absent, null or of the wrong type
/// comes out empty; an unknown category deserializes to `None` and tag
/// entries that are not strings are dropped.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hunt {
    #[serde_as(as = "DefaultOnError")]
    pub id: String,
    #[serde_as(as = "DefaultOnError")]
    pub category: Option<Category>,
    #[serde_as(as = "DefaultOnError")]
    pub title: String,
    #[serde_as(as = "DefaultOnError")]
    pub tactic: String,
    #[serde_as(as = "DefaultOnError")]
    pub notes: String,
    #[serde_as(as = "DefaultOnError<VecSkipError<_>>")]
    pub tags: Vec<String>,
    #[serde_as(as = "DefaultOnError")]
    pub submitter: Submitter,
    #[serde_as(as = "DefaultOnError")]
    pub why: String,
    #[serde_as(as = "DefaultOnError")]
    pub references: String,
    #[serde_as(as = "DefaultOnError")]
    pub file_path: String,
}

impl Hunt {
    /// Trim tags and drop the blank ones so chips and filters agree on
    /// the stored values.
    fn normalize(&mut self) {
        for tag in &mut self.tags {
            let trimmed = tag.trim();
            if trimmed.len() != tag.len() {
                *tag = trimmed.to_string();
            }
        }
        self.tags.retain(|tag| !tag.is_empty());
    }

    /// Split the comma separated tactic field into trimmed, non-empty names.
    pub fn tactics(&self) -> impl Iterator<Item = &str> {
        split_tactics(&self.tactic)
    }

    pub fn display_title(&self) -> &str {
        let title = self.title.trim();
        if !title.is_empty() {
            return title;
        }
        let notes = self.notes.trim();
        if !notes.is_empty() {
            return notes;
        }
        "Untitled hunt"
    }

    pub fn category_label(&self) -> &str {
        self.category
            .as_ref()
            .map(|category| category.as_ref())
            .unwrap_or("Uncategorized")
    }

    pub fn reference_lines(&self) -> impl Iterator<Item = &str> {
        self.references
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }
}

pub fn split_tactics(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',')
        .map(str::trim)
        .filter(|tactic| !tactic.is_empty())
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("reading dataset {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("writing seed dataset {}", path.display())]
    Seed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing dataset {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub fn load_from_path(path: &Path) -> Result<Vec<Hunt>, CatalogError> {
    let raw = fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let hunts = parse_dataset(&raw).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(count = hunts.len(), path = %path.display(), "loaded hunt dataset");
    Ok(hunts)
}

/// Parse a JSON array of hunts. Entries that are not objects are skipped
/// with a warning instead of failing the whole dataset.
pub fn parse_dataset(raw: &str) -> Result<Vec<Hunt>, serde_json::Error> {
    let entries: Vec<Value> = serde_json::from_str(raw)?;
    let mut hunts = Vec::with_capacity(entries.len());
    let mut seen = HashSet::new();
    for (position, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<Hunt>(entry) {
            Ok(mut hunt) => {
                hunt.normalize();
                if !hunt.id.is_empty() && !seen.insert(hunt.id.clone()) {
                    tracing::warn!(id = %hunt.id, "duplicate hunt id in dataset");
                }
                hunts.push(hunt);
            }
            Err(err) => {
                tracing::warn!(?err, position, "skipping malformed hunt entry");
            }
        }
    }
    Ok(hunts)
}

/// The bundled sample catalog as raw JSON.
pub fn seed_dataset() -> &'static str {
    SEED_DATASET
}

/// Write the bundled sample catalog to `path` if nothing exists there yet.
pub fn ensure_dataset(path: &Path) -> Result<bool, CatalogError> {
    if path.exists() {
        return Ok(false);
    }
    let seed_err = |source| CatalogError::Seed {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(seed_err)?;
    }
    fs::write(path, SEED_DATASET).map_err(seed_err)?;
    tracing::info!(path = %path.display(), "seeded sample hunt dataset");
    Ok(true)
}
