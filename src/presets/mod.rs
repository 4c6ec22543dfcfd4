//! Named filter snapshots: two built-ins plus user presets kept in SQLite.

use std::collections::HashSet;

use thiserror::Error;

use crate::engine::FilterSnapshot;
use crate::storage::{PresetRecord, StorageHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPreset {
    pub id: String,
    pub label: String,
    pub filters: FilterSnapshot,
    pub built_in: bool,
}

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("preset label cannot be empty")]
    EmptyLabel,
    #[error("preset '{0}' is built in and cannot be deleted")]
    BuiltIn(String),
    #[error("no preset with id '{0}'")]
    NotFound(String),
    #[error("preset storage failed")]
    Storage(#[source] anyhow::Error),
}

pub fn built_in_presets() -> Vec<FilterPreset> {
    vec![
        FilterPreset {
            id: "baseline-core".into(),
            label: "Baseline sweeps".into(),
            filters: FilterSnapshot {
                tags: vec!["baseline".into()],
                ..FilterSnapshot::default()
            },
            built_in: true,
        },
        FilterPreset {
            id: "exfil-watch".into(),
            label: "Exfil & C2 watchlist".into(),
            filters: FilterSnapshot {
                tactics: vec!["Command and Control".into(), "Exfiltration".into()],
                ..FilterSnapshot::default()
            },
            built_in: true,
        },
    ]
}

/// Lowercase, whitespace runs become `-`, anything outside `[a-z0-9-]` is
/// dropped and repeated dashes collapse.
pub fn slugify(label: &str) -> String {
    let lowered = label.trim().to_lowercase();
    let kept: String = lowered
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || *ch == '-')
        .collect();
    kept.split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// `base`, then `base-1`, `base-2`, ... until `taken` rejects none.
pub fn unique_id(base: &str, taken: impl Fn(&str) -> bool) -> String {
    let base = if base.is_empty() { "preset" } else { base };
    if !taken(base) {
        return base.to_string();
    }
    let mut suffix = 1usize;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

#[derive(Clone)]
pub struct PresetStore {
    storage: StorageHandle,
}

impl PresetStore {
    pub fn new(storage: StorageHandle) -> Self {
        Self { storage }
    }

    /// Built-ins first, then user presets ordered by label.
    pub fn all(&self) -> Result<Vec<FilterPreset>, PresetError> {
        let mut presets = built_in_presets();
        presets.extend(self.user_presets()?);
        Ok(presets)
    }

    pub fn get(&self, id: &str) -> Result<FilterPreset, PresetError> {
        self.all()?
            .into_iter()
            .find(|preset| preset.id == id)
            .ok_or_else(|| PresetError::NotFound(id.to_string()))
    }

    pub fn user_presets(&self) -> Result<Vec<FilterPreset>, PresetError> {
        let records = self.storage.list_presets().map_err(PresetError::Storage)?;
        Ok(records.into_iter().filter_map(decode_record).collect())
    }

    pub fn save(&self, label: &str, filters: &FilterSnapshot) -> Result<FilterPreset, PresetError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(PresetError::EmptyLabel);
        }
        let mut taken: HashSet<String> = built_in_presets()
            .into_iter()
            .map(|preset| preset.id)
            .collect();
        let records = self.storage.list_presets().map_err(PresetError::Storage)?;
        taken.extend(records.into_iter().map(|record| record.id));
        let id = unique_id(&slugify(label), |candidate| taken.contains(candidate));

        let json = serde_json::to_string(filters)
            .map_err(|err| PresetError::Storage(err.into()))?;
        self.storage
            .insert_preset(&id, label, &json)
            .map_err(PresetError::Storage)?;
        Ok(FilterPreset {
            id,
            label: label.to_string(),
            filters: filters.clone(),
            built_in: false,
        })
    }

    pub fn delete(&self, id: &str) -> Result<(), PresetError> {
        if built_in_presets().iter().any(|preset| preset.id == id) {
            return Err(PresetError::BuiltIn(id.to_string()));
        }
        let removed = self.storage.delete_preset(id).map_err(PresetError::Storage)?;
        if !removed {
            return Err(PresetError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

fn decode_record(record: PresetRecord) -> Option<FilterPreset> {
    match serde_json::from_str::<FilterSnapshot>(&record.filters) {
        Ok(filters) => Some(FilterPreset {
            id: record.id,
            label: record.label,
            filters,
            built_in: false,
        }),
        Err(err) => {
            tracing::warn!(?err, id = %record.id, "skipping corrupt preset row");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::catalog::Category;
    use crate::engine::{SortDirection, SortKey, SortSpec};
    use crate::storage::tests::init_storage;

    #[test]
    fn slugs_and_suffixes() {
        assert_eq!(slugify("  Exfil & C2   Watch! "), "exfil-c2-watch");
        assert_eq!(slugify("Été"), "t");
        let taken = ["sweep", "sweep-1"];
        assert_eq!(unique_id("sweep", |id| taken.contains(&id)), "sweep-2");
        assert_eq!(unique_id("", |_| false), "preset");
    }

    #[test]
    fn save_list_and_delete_user_presets() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let store = PresetStore::new(storage);
        let filters = FilterSnapshot {
            category: Some(Category::Embers),
            tags: vec!["windows".into()],
            sort_by: Some(SortSpec::new(SortKey::Title, SortDirection::Asc)),
            ..FilterSnapshot::default()
        };

        let first = store.save("Windows baselines", &filters)?;
        let second = store.save("Windows baselines", &filters)?;
        assert_eq!(first.id, "windows-baselines");
        assert_eq!(second.id, "windows-baselines-1");

        let all = store.all()?;
        let ids: Vec<_> = all.iter().map(|preset| preset.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["baseline-core", "exfil-watch", "windows-baselines", "windows-baselines-1"]
        );
        assert_eq!(store.get("windows-baselines")?.filters, filters);

        store.delete("windows-baselines")?;
        assert_matches!(
            store.delete("windows-baselines"),
            Err(PresetError::NotFound(id)) if id == "windows-baselines"
        );
        Ok(())
    }

    #[test]
    fn built_in_ids_are_reserved() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let store = PresetStore::new(storage);
        let saved = store.save("Baseline core", &FilterSnapshot::default())?;
        assert_eq!(saved.id, "baseline-core-1");
        assert_matches!(store.delete("exfil-watch"), Err(PresetError::BuiltIn(_)));
        assert_matches!(store.save("   ", &FilterSnapshot::default()), Err(PresetError::EmptyLabel));
        Ok(())
    }

    #[test]
    fn corrupt_rows_are_skipped() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        storage.insert_preset("broken", "Broken", "{not json")?;
        let store = PresetStore::new(storage);
        store.save("Fine", &FilterSnapshot::default())?;
        let users = store.user_presets()?;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, "fine");
        Ok(())
    }
}
