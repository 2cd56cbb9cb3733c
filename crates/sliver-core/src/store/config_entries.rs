//! Queries over the flattened configuration entries.

use rusqlite::params;

use crate::error::StoreError;
use crate::store::SymbolStore;
use crate::types::{ConfigEntry, ConfigFormat};

fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<ConfigEntry> {
    let format: String = row.get("format")?;
    Ok(ConfigEntry {
        id: row.get("id")?,
        file_path: row.get("file_path")?,
        key_path: row.get("key_path")?,
        leaf_name: row.get("leaf_name")?,
        value_type: row.get("value_type")?,
        rendered_value: row.get("rendered_value")?,
        raw_value: row.get("raw_value")?,
        depth: row.get("depth")?,
        parent_path: row.get("parent_path")?,
        format: ConfigFormat::parse(&format).unwrap_or(ConfigFormat::Json),
        config_type: row.get("config_type")?,
        description: row.get("description")?,
        line: row.get("line")?,
    })
}

impl SymbolStore {
    /// All entries of one configuration file, in document order.
    pub fn config_entries_for_file(&self, file_path: &str) -> Result<Vec<ConfigEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM config_entries WHERE file_path = ?1 ORDER BY line, key_path",
        )?;
        let entries = stmt
            .query_map(params![file_path], row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Entries whose dotted path starts with `prefix`.
    pub fn config_entries_with_prefix(&self, prefix: &str) -> Result<Vec<ConfigEntry>, StoreError> {
        let pattern = format!("{}%", prefix.replace('%', ""));
        let mut stmt = self.conn.prepare(
            "SELECT * FROM config_entries WHERE key_path LIKE ?1 ORDER BY file_path, key_path",
        )?;
        let entries = stmt
            .query_map(params![pattern], row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Substring search over key paths and rendered values.
    pub fn search_config_entries(&self, query: &str) -> Result<Vec<ConfigEntry>, StoreError> {
        let pattern = format!("%{}%", query.replace('%', ""));
        let mut stmt = self.conn.prepare(
            "SELECT * FROM config_entries
             WHERE key_path LIKE ?1 OR rendered_value LIKE ?1
             ORDER BY file_path, key_path",
        )?;
        let entries = stmt
            .query_map(params![pattern], row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}
