//! The SQLite-backed symbol store.
//!
//! All persistent state lives here: file records with their serialized
//! snapshots, the normalized symbol/reference/graph projections, the FTS5
//! mirror of the symbol table, the structural type index, and the Markov
//! chain tables. Mutation funnels through per-file transactions so a crash
//! mid-write leaves the prior state intact.

mod config_entries;
mod deps;
mod files;
mod graph;
mod markov;
mod search;
mod symbols;
mod type_index;

pub use files::FileSummary;
pub use markov::{ChainMeta, Transition};
pub use search::{SearchFilters, SearchHit};
pub use symbols::ClassOrInterface;
pub use type_index::{TypeFacets, TypeMatchMode};

use std::cell::{Cell, RefCell};
use std::path::Path;

use rusqlite::Connection;

use crate::error::StoreError;

const SCHEMA_VERSION: u32 = 2;

/// Embedded symbol database. One connection, single writer; readers share
/// the same handle behind whatever lock the host wraps it in.
pub struct SymbolStore {
    conn: Connection,
    /// Set on any write; the fuzzy snapshot is rebuilt on next search miss.
    fuzzy_dirty: Cell<bool>,
    fuzzy_cache: RefCell<Option<Vec<search::FuzzyRow>>>,
}

impl SymbolStore {
    /// Open or create a symbol database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Internal(format!("create {}: {e}", parent.display())))?;
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Create an in-memory symbol database (for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        // recursive_triggers keeps the FTS mirror in sync when REPLACE
        // conflict resolution deletes a row.
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA recursive_triggers = ON;")?;
        let store = SymbolStore {
            conn,
            fuzzy_dirty: Cell::new(true),
            fuzzy_cache: RefCell::new(None),
        };
        store.initialize_schema()?;
        store.migrate()?;
        // Indexed column arrives via migration on pre-v2 databases, so the
        // index itself is created only after migrate() has run.
        store.conn.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_typerel_base ON type_relationships(target_base_name);",
        )?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            -- File records; `snapshot` is the serialized FileIndex and the
            -- single source of truth for per-file content.
            CREATE TABLE IF NOT EXISTS files (
                file_path TEXT PRIMARY KEY,
                relative_path TEXT NOT NULL,
                language TEXT NOT NULL CHECK (language IN ('typescript', 'javascript', 'python', 'config')),
                checksum TEXT NOT NULL,
                last_modified INTEGER NOT NULL DEFAULT 0,
                summary TEXT NOT NULL DEFAULT '',
                line_count INTEGER NOT NULL DEFAULT 0,
                parse_status TEXT NOT NULL CHECK (parse_status IN ('complete', 'partial', 'skipped')),
                warnings TEXT NOT NULL DEFAULT '[]',
                byte_size INTEGER,
                snapshot TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_files_checksum ON files(checksum);
            CREATE INDEX IF NOT EXISTS idx_files_relative ON files(relative_path);

            -- Symbols
            CREATE TABLE IF NOT EXISTS symbols (
                id TEXT PRIMARY KEY,
                file_path TEXT NOT NULL REFERENCES files(file_path) ON DELETE CASCADE,
                name TEXT NOT NULL,
                qualified_name TEXT NOT NULL,
                kind TEXT NOT NULL,
                signature TEXT NOT NULL DEFAULT '',
                start_line INTEGER NOT NULL,
                end_line INTEGER NOT NULL,
                local_name TEXT NOT NULL DEFAULT '',
                parent_function TEXT,
                parent_class TEXT,
                nesting_depth INTEGER NOT NULL DEFAULT 0,
                is_exported INTEGER NOT NULL DEFAULT 0,
                record TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_symbols_file_name ON symbols(file_path, name);
            CREATE INDEX IF NOT EXISTS idx_symbols_name ON symbols(name);
            CREATE INDEX IF NOT EXISTS idx_symbols_kind ON symbols(kind);

            -- FTS5 mirror of {name, qualified_name, signature}, kept in sync
            -- by triggers on the symbols table.
            CREATE VIRTUAL TABLE IF NOT EXISTS symbols_fts USING fts5(
                name, qualified_name, signature,
                content='symbols', content_rowid='rowid'
            );
            CREATE TRIGGER IF NOT EXISTS symbols_fts_insert AFTER INSERT ON symbols BEGIN
                INSERT INTO symbols_fts(rowid, name, qualified_name, signature)
                VALUES (new.rowid, new.name, new.qualified_name, new.signature);
            END;
            CREATE TRIGGER IF NOT EXISTS symbols_fts_delete AFTER DELETE ON symbols BEGIN
                INSERT INTO symbols_fts(symbols_fts, rowid, name, qualified_name, signature)
                VALUES ('delete', old.rowid, old.name, old.qualified_name, old.signature);
            END;
            CREATE TRIGGER IF NOT EXISTS symbols_fts_update AFTER UPDATE ON symbols BEGIN
                INSERT INTO symbols_fts(symbols_fts, rowid, name, qualified_name, signature)
                VALUES ('delete', old.rowid, old.name, old.qualified_name, old.signature);
                INSERT INTO symbols_fts(rowid, name, qualified_name, signature)
                VALUES (new.rowid, new.name, new.qualified_name, new.signature);
            END;

            -- References
            CREATE TABLE IF NOT EXISTS symbol_references (
                id TEXT PRIMARY KEY,
                file_path TEXT NOT NULL REFERENCES files(file_path) ON DELETE CASCADE,
                symbol_name TEXT NOT NULL,
                resolved_symbol_id TEXT,
                referencing_symbol_id TEXT,
                referencing_symbol_name TEXT,
                line INTEGER NOT NULL,
                col INTEGER NOT NULL DEFAULT 0,
                snippet TEXT NOT NULL DEFAULT '',
                kind TEXT NOT NULL CHECK (kind IN ('call', 'read', 'write', 'type', 'import'))
            );
            CREATE INDEX IF NOT EXISTS idx_refs_name ON symbol_references(symbol_name);
            CREATE INDEX IF NOT EXISTS idx_refs_file ON symbol_references(file_path);

            -- Call graph; one row per (caller, callee name) with a count.
            CREATE TABLE IF NOT EXISTS call_graph (
                id TEXT PRIMARY KEY,
                file_path TEXT NOT NULL REFERENCES files(file_path) ON DELETE CASCADE,
                caller_id TEXT NOT NULL,
                caller_name TEXT NOT NULL,
                callee_name TEXT NOT NULL,
                resolved_callee_id TEXT,
                call_count INTEGER NOT NULL DEFAULT 1,
                is_async INTEGER NOT NULL DEFAULT 0,
                is_conditional INTEGER NOT NULL DEFAULT 0,
                UNIQUE (caller_id, callee_name)
            );
            CREATE INDEX IF NOT EXISTS idx_calls_callee ON call_graph(callee_name);
            CREATE INDEX IF NOT EXISTS idx_calls_caller ON call_graph(caller_id);
            CREATE INDEX IF NOT EXISTS idx_calls_file ON call_graph(file_path);

            -- Type hierarchy
            CREATE TABLE IF NOT EXISTS type_relationships (
                id TEXT PRIMARY KEY,
                file_path TEXT NOT NULL REFERENCES files(file_path) ON DELETE CASCADE,
                source_id TEXT NOT NULL,
                source_name TEXT NOT NULL,
                target_name TEXT NOT NULL,
                target_base_name TEXT NOT NULL DEFAULT '',
                resolved_target_id TEXT,
                kind TEXT NOT NULL CHECK (kind IN ('extends', 'implements', 'mixin'))
            );
            CREATE INDEX IF NOT EXISTS idx_typerel_target ON type_relationships(target_name);
            CREATE INDEX IF NOT EXISTS idx_typerel_source ON type_relationships(source_id);

            -- Structural type index over function/method signatures
            CREATE TABLE IF NOT EXISTS symbol_types (
                symbol_id TEXT PRIMARY KEY,
                file_path TEXT NOT NULL REFERENCES files(file_path) ON DELETE CASCADE,
                return_raw TEXT,
                return_normalized TEXT,
                return_base TEXT,
                return_inner TEXT,
                return_is_async INTEGER NOT NULL DEFAULT 0,
                return_is_nullable INTEGER NOT NULL DEFAULT 0,
                return_is_array INTEGER NOT NULL DEFAULT 0,
                return_is_generic INTEGER NOT NULL DEFAULT 0,
                param_count INTEGER NOT NULL DEFAULT 0,
                is_method INTEGER NOT NULL DEFAULT 0,
                parent_class TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_symtypes_base ON symbol_types(return_base);

            CREATE TABLE IF NOT EXISTS symbol_type_params (
                symbol_id TEXT NOT NULL,
                file_path TEXT NOT NULL REFERENCES files(file_path) ON DELETE CASCADE,
                param_index INTEGER NOT NULL,
                name TEXT NOT NULL,
                raw TEXT,
                normalized TEXT,
                base TEXT,
                inner TEXT,
                is_optional INTEGER NOT NULL DEFAULT 0,
                is_nullable INTEGER NOT NULL DEFAULT 0,
                is_array INTEGER NOT NULL DEFAULT 0,
                is_generic INTEGER NOT NULL DEFAULT 0,
                has_default INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (symbol_id, param_index)
            );
            CREATE INDEX IF NOT EXISTS idx_symtypeparams_base ON symbol_type_params(base);

            -- Configuration entries
            CREATE TABLE IF NOT EXISTS config_entries (
                id TEXT PRIMARY KEY,
                file_path TEXT NOT NULL REFERENCES files(file_path) ON DELETE CASCADE,
                key_path TEXT NOT NULL,
                leaf_name TEXT NOT NULL,
                value_type TEXT NOT NULL,
                rendered_value TEXT NOT NULL DEFAULT '',
                raw_value TEXT NOT NULL DEFAULT 'null',
                depth INTEGER NOT NULL DEFAULT 0,
                parent_path TEXT,
                format TEXT NOT NULL CHECK (format IN ('json', 'yaml', 'toml')),
                config_type TEXT,
                description TEXT,
                line INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_config_file ON config_entries(file_path);
            CREATE INDEX IF NOT EXISTS idx_config_key ON config_entries(key_path);

            -- Imports / exports
            CREATE TABLE IF NOT EXISTS file_imports (
                file_path TEXT NOT NULL REFERENCES files(file_path) ON DELETE CASCADE,
                module TEXT NOT NULL,
                specifiers TEXT NOT NULL DEFAULT '[]',
                type_only INTEGER NOT NULL DEFAULT 0,
                line INTEGER NOT NULL DEFAULT 0,
                resolved_path TEXT,
                is_external INTEGER NOT NULL DEFAULT 0,
                is_reexport INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_imports_file ON file_imports(file_path);
            CREATE INDEX IF NOT EXISTS idx_imports_resolved ON file_imports(resolved_path);

            CREATE TABLE IF NOT EXISTS file_exports (
                file_path TEXT NOT NULL REFERENCES files(file_path) ON DELETE CASCADE,
                name TEXT NOT NULL,
                is_default INTEGER NOT NULL DEFAULT 0,
                is_reexport INTEGER NOT NULL DEFAULT 0,
                source_module TEXT,
                resolved_source_path TEXT,
                line INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_exports_file ON file_exports(file_path);
            CREATE INDEX IF NOT EXISTS idx_exports_name ON file_exports(name);

            -- Markov chains
            CREATE TABLE IF NOT EXISTS markov_chains (
                name TEXT PRIMARY KEY,
                description TEXT NOT NULL DEFAULT '',
                state_count INTEGER NOT NULL DEFAULT 0,
                transition_count INTEGER NOT NULL DEFAULT 0,
                built_at INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS markov_transitions (
                chain TEXT NOT NULL,
                from_state TEXT NOT NULL,
                to_state TEXT NOT NULL,
                raw_count INTEGER NOT NULL DEFAULT 0,
                probability REAL NOT NULL DEFAULT 0.0,
                PRIMARY KEY (chain, from_state, to_state)
            );
            CREATE INDEX IF NOT EXISTS idx_markov_from ON markov_transitions(chain, from_state);

            CREATE TABLE IF NOT EXISTS markov_state_sums (
                chain TEXT NOT NULL,
                state TEXT NOT NULL,
                total INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (chain, state)
            );

            CREATE TABLE IF NOT EXISTS markov_file_deps (
                chain TEXT NOT NULL,
                file_path TEXT NOT NULL,
                PRIMARY KEY (chain, file_path)
            );
            ",
        )?;

        self.conn.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES ('schema_version', ?1)",
            rusqlite::params![SCHEMA_VERSION.to_string()],
        )?;

        Ok(())
    }

    /// Additive migration. Databases created before v2 lack the
    /// `target_base_name` column; add it and back-fill from `target_name`.
    fn migrate(&self) -> Result<(), StoreError> {
        let version = self.schema_version()?;
        if version >= SCHEMA_VERSION {
            return Ok(());
        }

        if version < 2 && !self.column_exists("type_relationships", "target_base_name")? {
            self.conn.execute_batch(
                "ALTER TABLE type_relationships ADD COLUMN target_base_name TEXT NOT NULL DEFAULT '';",
            )?;
            let rows: Vec<(String, String)> = {
                let mut stmt = self
                    .conn
                    .prepare("SELECT id, target_name FROM type_relationships")?;
                let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<_, _>>()?;
                rows
            };
            for (id, target_name) in rows {
                self.conn.execute(
                    "UPDATE type_relationships SET target_base_name = ?1 WHERE id = ?2",
                    rusqlite::params![crate::types::base_type_name(&target_name), id],
                )?;
            }
        }

        self.conn.execute(
            "UPDATE meta SET value = ?1 WHERE key = 'schema_version'",
            rusqlite::params![SCHEMA_VERSION.to_string()],
        )?;
        Ok(())
    }

    fn column_exists(&self, table: &str, column: &str) -> Result<bool, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({table})"))?;
        let names: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<_, _>>()?;
        Ok(names.iter().any(|n| n == column))
    }

    /// Get the current schema version.
    pub fn schema_version(&self) -> Result<u32, StoreError> {
        let version: String = self.conn.query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )?;
        version
            .parse()
            .map_err(|e| StoreError::Internal(format!("invalid schema version: {e}")))
    }

    pub(crate) fn mark_dirty(&self) {
        self.fuzzy_dirty.set(true);
    }
}

/// Aggregate counts reported by `sliver index` and the stats endpoint.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct StoreStats {
    pub file_count: usize,
    pub symbol_count: usize,
    pub reference_count: usize,
    pub call_edge_count: usize,
    pub type_relation_count: usize,
    pub config_entry_count: usize,
    pub files_by_language: Vec<(String, usize)>,
}

impl SymbolStore {
    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let count = |table: &str| -> Result<usize, StoreError> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
            Ok(n as usize)
        };
        let mut stmt = self
            .conn
            .prepare("SELECT language, COUNT(*) FROM files GROUP BY language ORDER BY language")?;
        let files_by_language = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as usize)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StoreStats {
            file_count: count("files")?,
            symbol_count: count("symbols")?,
            reference_count: count("symbol_references")?,
            call_edge_count: count("call_graph")?,
            type_relation_count: count("type_relationships")?,
            config_entry_count: count("config_entries")?,
            files_by_language,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_fixtures;
