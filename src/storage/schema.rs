use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn apply(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS presets (
            id TEXT PRIMARY KEY,
            label TEXT NOT NULL,
            filters TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS presets_label_idx ON presets(label COLLATE NOCASE);
        "#,
    )
    .context("applying schema migrations")?;
    Ok(())
}
