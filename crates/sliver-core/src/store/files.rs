//! File record CRUD and the per-file write transaction.

use std::collections::HashMap;

use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::{type_index, SymbolStore};
use crate::types::{FileIndex, Language, ParseStatus, ParseWarning};

/// Row-level view of a file record, without the snapshot payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSummary {
    pub file_path: String,
    pub relative_path: String,
    pub language: Language,
    pub checksum: String,
    pub line_count: u32,
    pub parse_status: ParseStatus,
    pub warnings: Vec<ParseWarning>,
    pub byte_size: Option<u64>,
}

impl SymbolStore {
    /// Persist one file's parse output.
    ///
    /// Runs the full write protocol in a single transaction: delete the prior
    /// row (cascading every normalized projection), insert the new row with
    /// its serialized snapshot, then re-derive symbols, references, call
    /// edges, type relationships, structural type rows, config entries, and
    /// import/export rows. A crash mid-way leaves the prior state intact.
    pub fn save_file(&mut self, index: &FileIndex) -> Result<(), StoreError> {
        let snapshot = serde_json::to_string(index)?;
        let warnings = serde_json::to_string(&index.warnings)?;

        let tx = self.conn.transaction()?;

        tx.execute(
            "DELETE FROM files WHERE file_path = ?1",
            params![index.file_path],
        )?;

        tx.execute(
            "INSERT INTO files (file_path, relative_path, language, checksum, last_modified, summary, line_count, parse_status, warnings, byte_size, snapshot)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                index.file_path,
                index.relative_path,
                index.language.as_str(),
                index.checksum,
                index.last_modified,
                index.summary,
                index.line_count,
                index.parse_status.as_str(),
                warnings,
                index.byte_size.map(|b| b as i64),
                snapshot,
            ],
        )?;

        for symbol in &index.symbols {
            let func = symbol.as_function();
            tx.execute(
                "INSERT OR REPLACE INTO symbols (id, file_path, name, qualified_name, kind, signature, start_line, end_line, local_name, parent_function, parent_class, nesting_depth, is_exported, record)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    symbol.id,
                    index.file_path,
                    symbol.name,
                    symbol.qualified_name,
                    symbol.kind.as_str(),
                    symbol.signature,
                    symbol.location.start_line,
                    symbol.location.end_line,
                    symbol.local_name(),
                    symbol.parent_function(),
                    func.and_then(|f| f.parent_class.as_deref()),
                    symbol.nesting_depth(),
                    is_exported(symbol) as i32,
                    serde_json::to_string(symbol)?,
                ],
            )?;
        }

        for r in &index.references {
            tx.execute(
                "INSERT OR REPLACE INTO symbol_references (id, file_path, symbol_name, resolved_symbol_id, referencing_symbol_id, referencing_symbol_name, line, col, snippet, kind)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    r.id,
                    index.file_path,
                    r.symbol_name,
                    r.resolved_symbol_id,
                    r.referencing_symbol_id,
                    r.referencing_symbol_name,
                    r.line,
                    r.column,
                    r.snippet,
                    r.kind.as_str(),
                ],
            )?;
        }

        for edge in &index.calls {
            tx.execute(
                "INSERT INTO call_graph (id, file_path, caller_id, caller_name, callee_name, resolved_callee_id, call_count, is_async, is_conditional)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT (caller_id, callee_name) DO UPDATE SET
                    call_count = call_count + excluded.call_count,
                    is_async = is_async | excluded.is_async,
                    is_conditional = is_conditional | excluded.is_conditional",
                params![
                    edge.id,
                    index.file_path,
                    edge.caller_id,
                    edge.caller_name,
                    edge.callee_name,
                    edge.resolved_callee_id,
                    edge.call_count,
                    edge.is_async as i32,
                    edge.is_conditional as i32,
                ],
            )?;
        }

        for rel in &index.type_relations {
            tx.execute(
                "INSERT OR REPLACE INTO type_relationships (id, file_path, source_id, source_name, target_name, target_base_name, resolved_target_id, kind)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    rel.id,
                    index.file_path,
                    rel.source_id,
                    rel.source_name,
                    rel.target_name,
                    rel.target_base_name,
                    rel.resolved_target_id,
                    rel.kind.as_str(),
                ],
            )?;
        }

        type_index::write_type_rows(&tx, index)?;

        for entry in &index.config_entries {
            tx.execute(
                "INSERT OR REPLACE INTO config_entries (id, file_path, key_path, leaf_name, value_type, rendered_value, raw_value, depth, parent_path, format, config_type, description, line)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    entry.id,
                    index.file_path,
                    entry.key_path,
                    entry.leaf_name,
                    entry.value_type,
                    entry.rendered_value,
                    entry.raw_value,
                    entry.depth,
                    entry.parent_path,
                    entry.format.as_str(),
                    entry.config_type,
                    entry.description,
                    entry.line,
                ],
            )?;
        }

        for import in &index.imports {
            tx.execute(
                "INSERT INTO file_imports (file_path, module, specifiers, type_only, line, resolved_path, is_external, is_reexport)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    index.file_path,
                    import.module,
                    serde_json::to_string(&import.specifiers)?,
                    import.type_only as i32,
                    import.line,
                    import.resolved_path,
                    import.is_external as i32,
                    import.is_reexport as i32,
                ],
            )?;
        }

        for export in &index.exports {
            tx.execute(
                "INSERT INTO file_exports (file_path, name, is_default, is_reexport, source_module, resolved_source_path, line)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    index.file_path,
                    export.name,
                    export.is_default as i32,
                    export.is_reexport as i32,
                    export.source_module,
                    export.resolved_source_path,
                    export.line,
                ],
            )?;
        }

        tx.commit()?;
        self.mark_dirty();
        Ok(())
    }

    /// Load the complete file record from its snapshot.
    pub fn get_file(&self, file_path: &str) -> Result<Option<FileIndex>, StoreError> {
        let snapshot: Option<String> = self
            .conn
            .query_row(
                "SELECT snapshot FROM files WHERE file_path = ?1",
                params![file_path],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(ignore_no_rows)?;
        match snapshot {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    /// Find a file by its content checksum.
    pub fn get_file_by_checksum(&self, checksum: &str) -> Result<Option<FileIndex>, StoreError> {
        let snapshot: Option<String> = self
            .conn
            .query_row(
                "SELECT snapshot FROM files WHERE checksum = ?1 LIMIT 1",
                params![checksum],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(ignore_no_rows)?;
        match snapshot {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    /// Stored checksum for a path, if the file is indexed.
    pub fn get_checksum(&self, file_path: &str) -> Result<Option<String>, StoreError> {
        self.conn
            .query_row(
                "SELECT checksum FROM files WHERE file_path = ?1",
                params![file_path],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(ignore_no_rows)
    }

    /// All stored (path, checksum) pairs, for the change-detection pass.
    pub fn checksums(&self) -> Result<HashMap<String, String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT file_path, checksum FROM files")?;
        let map = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(map)
    }

    /// Delete a file record and every normalized row derived from it.
    /// Returns whether a record existed.
    pub fn remove_file(&mut self, file_path: &str) -> Result<bool, StoreError> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM files WHERE file_path = ?1", params![file_path])?;
        tx.commit()?;
        if removed > 0 {
            self.mark_dirty();
        }
        Ok(removed > 0)
    }

    /// All indexed files, ordered by relative path.
    pub fn list_files(&self) -> Result<Vec<FileSummary>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT file_path, relative_path, language, checksum, line_count, parse_status, warnings, byte_size
             FROM files ORDER BY relative_path",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, u32>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, Option<i64>>(7)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut summaries = Vec::with_capacity(rows.len());
        for (file_path, relative_path, language, checksum, line_count, status, warnings, byte_size) in
            rows
        {
            summaries.push(FileSummary {
                file_path,
                relative_path,
                language: Language::parse(&language)
                    .ok_or_else(|| StoreError::Internal(format!("bad language tag: {language}")))?,
                checksum,
                line_count,
                parse_status: ParseStatus::parse(&status)
                    .ok_or_else(|| StoreError::Internal(format!("bad parse status: {status}")))?,
                warnings: serde_json::from_str(&warnings)?,
                byte_size: byte_size.map(|b| b as u64),
            });
        }
        Ok(summaries)
    }

    /// Absolute paths of every indexed file.
    pub fn file_paths(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT file_path FROM files ORDER BY file_path")?;
        let paths = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(paths)
    }

    /// (absolute, relative) path pairs of every indexed file.
    pub fn file_path_pairs(&self) -> Result<Vec<(String, String)>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT file_path, relative_path FROM files ORDER BY file_path")?;
        let pairs = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pairs)
    }
}

fn is_exported(symbol: &crate::types::Symbol) -> bool {
    match &symbol.data {
        crate::types::SymbolData::Function(f) => f.modifiers.is_exported,
        crate::types::SymbolData::Variable(v) => v.exported,
        // Classes, interfaces, and aliases record exported-ness in the
        // file's export list; treat presence there as the authority.
        _ => false,
    }
}

pub(crate) fn ignore_no_rows<T>(e: rusqlite::Error) -> Result<Option<T>, StoreError> {
    match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(other.into()),
    }
}
