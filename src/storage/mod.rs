use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use time::OffsetDateTime;

use crate::config::{ConfigPaths, StorageOptions};

mod schema;

/// Raw preset row; `filters` is the JSON text as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetRecord {
    pub id: String,
    pub label: String,
    pub filters: String,
    pub created_at: i64,
}

#[derive(Clone)]
pub struct StorageHandle {
    db_path: Arc<PathBuf>,
    options: Arc<StorageOptions>,
}

impl StorageHandle {
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&*self.db_path)
            .with_context(|| format!("opening database {}", self.db_path.display()))?;
        prepare_connection(&conn, &self.options)?;
        Ok(conn)
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.connect()?;
        f(&conn)
    }

    pub fn list_presets(&self) -> Result<Vec<PresetRecord>> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, label, filters, created_at
                     FROM presets
                     ORDER BY label COLLATE NOCASE, id",
                )
                .context("preparing preset listing")?;
            let records = stmt
                .query_map([], |row| {
                    Ok(PresetRecord {
                        id: row.get(0)?,
                        label: row.get(1)?,
                        filters: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()
                .context("reading preset rows")?;
            Ok(records)
        })
    }

    pub fn preset_exists(&self, id: &str) -> Result<bool> {
        self.with_connection(|conn| {
            let found: Option<i64> = conn
                .query_row("SELECT 1 FROM presets WHERE id = ?1", [id], |row| row.get(0))
                .optional()
                .context("checking preset id")?;
            Ok(found.is_some())
        })
    }

    pub fn insert_preset(&self, id: &str, label: &str, filters_json: &str) -> Result<PresetRecord> {
        let created_at = OffsetDateTime::now_utc().unix_timestamp();
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO presets (id, label, filters, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![id, label, filters_json, created_at],
            )
            .with_context(|| format!("inserting preset {id}"))?;
            Ok(())
        })?;
        tracing::info!(id, label, "saved filter preset");
        Ok(PresetRecord {
            id: id.to_string(),
            label: label.to_string(),
            filters: filters_json.to_string(),
            created_at,
        })
    }

    /// Returns `false` when no row had that id.
    pub fn delete_preset(&self, id: &str) -> Result<bool> {
        let removed = self.with_connection(|conn| {
            conn.execute("DELETE FROM presets WHERE id = ?1", [id])
                .with_context(|| format!("deleting preset {id}"))
        })?;
        if removed > 0 {
            tracing::info!(id, "deleted filter preset");
        }
        Ok(removed > 0)
    }
}

pub fn init(paths: &ConfigPaths, storage: &StorageOptions) -> Result<StorageHandle> {
    let db_path = if storage.database_path.as_os_str().is_empty() {
        &paths.database_path
    } else {
        &storage.database_path
    };
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    let conn = Connection::open(db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    prepare_connection(&conn, storage)?;
    schema::apply(&conn)?;
    Ok(StorageHandle {
        db_path: Arc::new(db_path.clone()),
        options: Arc::new(storage.clone()),
    })
}

fn prepare_connection(conn: &Connection, storage: &StorageOptions) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("setting journal_mode=WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .context("setting synchronous=NORMAL")?;
    conn.pragma_update(
        None,
        "wal_autocheckpoint",
        storage.wal_autocheckpoint.to_string(),
    )
    .context("setting wal_autocheckpoint")?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    pub(crate) fn init_storage() -> anyhow::Result<(TempDir, StorageHandle)> {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted(temp.path());
        paths.ensure_directories()?;
        let mut options = StorageOptions::default();
        options.database_path = paths.database_path.clone();
        let storage = init(&paths, &options)?;
        Ok((temp, storage))
    }

    #[test]
    fn presets_round_trip_through_sqlite() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        storage.insert_preset("zeta", "Zeta sweep", r#"{"tags":["z"]}"#)?;
        storage.insert_preset("alpha", "alpha checks", "{}")?;

        let listed = storage.list_presets()?;
        let ids: Vec<_> = listed.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "zeta"]);
        assert!(storage.preset_exists("zeta")?);

        assert!(storage.delete_preset("zeta")?);
        assert!(!storage.delete_preset("zeta")?);
        assert!(!storage.preset_exists("zeta")?);
        Ok(())
    }

    #[test]
    fn duplicate_preset_id_is_rejected() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        storage.insert_preset("dup", "Dup", "{}")?;
        assert!(storage.insert_preset("dup", "Dup again", "{}").is_err());
        Ok(())
    }
}
