//! The indexing orchestrator.
//!
//! `index_directory` walks the root, parses changed files in parallel, and
//! writes each file inside its own store transaction from a single writer.
//! After a full pass it runs the cross-file resolver and rebuilds the Markov
//! chains. `index_file`/`remove_file` are the unit operations the watcher
//! replays.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::UNIX_EPOCH;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use sliver_core::config::SliverConfig;
use sliver_core::error::StoreError;
use sliver_core::id;
use sliver_core::store::SymbolStore;
use sliver_core::types::{FileIndex, IndexFileError, IndexTotals, Language};
use sliver_parsers::import_resolver::ImportResolver;
use sliver_parsers::parser::{ParseOptions, ParseOutput};
use sliver_parsers::registry::ParserRegistry;
use sliver_parsers::walker::FileWalker;

use crate::markov::MarkovEngine;
use crate::resolve;
use crate::SharedStore;

/// Cooperative cancellation flag checked between files.
pub type CancelFlag = Arc<AtomicBool>;

pub struct Indexer {
    root: PathBuf,
    config: SliverConfig,
    registry: ParserRegistry,
    import_resolver: ImportResolver,
    store: SharedStore,
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("walker: {0}")]
    Walker(#[from] sliver_parsers::walker::WalkerError),

    #[error("cannot read {path}: {message}")]
    Io { path: String, message: String },

    #[error("no parser owns {0}")]
    UnknownExtension(String),
}

impl Indexer {
    pub fn new(root: &Path, config: SliverConfig, store: SharedStore) -> Self {
        Indexer {
            root: root.to_path_buf(),
            import_resolver: ImportResolver::new(root),
            config,
            registry: ParserRegistry::new(),
            store,
        }
    }

    /// Open the store at the configured path and build an indexer around it.
    pub fn open(root: &Path, config: SliverConfig) -> Result<Self, IndexError> {
        let store = SymbolStore::open(&config.database_path(root))?;
        Ok(Self::new(root, config, Arc::new(Mutex::new(store))))
    }

    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &SliverConfig {
        &self.config
    }

    /// Full pass over the root directory. Unchanged files (same SHA-256) are
    /// skipped; per-file failures are collected, never fatal.
    pub fn index_directory(&self, cancel: Option<&CancelFlag>) -> Result<IndexTotals, IndexError> {
        let walker = FileWalker::new(&self.root, &self.config.include, &self.config.exclude)?;
        let files = walker.walk();
        let mut totals = IndexTotals {
            files_found: files.len(),
            ..Default::default()
        };

        let stored_checksums = self.lock_store().checksums()?;
        let options = ParseOptions::from_config(&self.config);

        // Read + checksum + parse in parallel; all writes stay on this thread.
        let parsed: Vec<Result<Option<FileIndex>, IndexFileError>> = files
            .par_iter()
            .map(|path| {
                let content = match std::fs::read_to_string(path) {
                    Ok(c) => c,
                    Err(e) => {
                        return Err(IndexFileError {
                            file_path: path.display().to_string(),
                            message: e.to_string(),
                        });
                    }
                };
                let checksum = id::content_checksum(content.as_bytes());
                let key = path_key(path);
                if stored_checksums.get(&key).map(String::as_str) == Some(checksum.as_str()) {
                    return Ok(None);
                }
                Ok(Some(self.build_file_index(path, &content, checksum, &options)))
            })
            .collect();

        for result in parsed {
            if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                info!("index pass cancelled after {} files", totals.files_indexed);
                break;
            }
            match result {
                Ok(Some(index)) => {
                    debug!("indexing {}", index.relative_path);
                    match self.lock_store().save_file(&index) {
                        Ok(()) => totals.files_indexed += 1,
                        Err(e) => totals.errors.push(IndexFileError {
                            file_path: index.file_path.clone(),
                            message: e.to_string(),
                        }),
                    }
                }
                Ok(None) => totals.files_skipped += 1,
                Err(e) => {
                    warn!("skipping {}: {}", e.file_path, e.message);
                    totals.errors.push(e);
                }
            }
        }

        self.finish_pass()?;
        info!(
            "indexed {} files ({} unchanged, {} errors)",
            totals.files_indexed,
            totals.files_skipped,
            totals.errors.len()
        );
        Ok(totals)
    }

    /// Index one file. With `force`, the checksum gate is bypassed. Returns
    /// whether the store changed.
    pub fn index_file(&self, path: &Path, force: bool) -> Result<bool, IndexError> {
        let content = std::fs::read_to_string(path).map_err(|e| IndexError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if self.registry.language_for(path).is_none() {
            return Err(IndexError::UnknownExtension(path.display().to_string()));
        }

        let checksum = id::content_checksum(content.as_bytes());
        if !force {
            let stored = self.lock_store().get_checksum(&path_key(path))?;
            if stored.as_deref() == Some(checksum.as_str()) {
                return Ok(false);
            }
        }

        let options = ParseOptions::from_config(&self.config);
        let index = self.build_file_index(path, &content, checksum, &options);
        self.lock_store().save_file(&index)?;
        self.finish_pass()?;
        Ok(true)
    }

    /// Drop one file and everything derived from it.
    pub fn remove_file(&self, path: &Path) -> Result<bool, IndexError> {
        let removed = self.lock_store().remove_file(&path_key(path))?;
        if removed {
            self.finish_pass()?;
        }
        Ok(removed)
    }

    /// Force re-index of a named file set (the `sync_index` operation).
    pub fn sync_index(&self, files: &[PathBuf]) -> Result<IndexTotals, IndexError> {
        let mut totals = IndexTotals {
            files_found: files.len(),
            ..Default::default()
        };
        for path in files {
            match self.index_file(path, true) {
                Ok(true) => totals.files_indexed += 1,
                Ok(false) => totals.files_skipped += 1,
                Err(e) => totals.errors.push(IndexFileError {
                    file_path: path.display().to_string(),
                    message: e.to_string(),
                }),
            }
        }
        Ok(totals)
    }

    /// Post-pass work shared by every mutation: back-fill cross-file IDs,
    /// then rebuild the chains.
    fn finish_pass(&self) -> Result<(), IndexError> {
        let mut store = self.lock_store();
        resolve::resolve_symbol_references(&mut store)?;
        MarkovEngine::new().build_chains(&mut store)?;
        Ok(())
    }

    fn lock_store(&self) -> std::sync::MutexGuard<'_, SymbolStore> {
        match self.store.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Assemble the full file record from one parse.
    fn build_file_index(
        &self,
        path: &Path,
        content: &str,
        checksum: String,
        options: &ParseOptions,
    ) -> FileIndex {
        let language = self
            .registry
            .language_for(path)
            .unwrap_or(Language::Config);
        let output = self
            .registry
            .parse_file(path, content, options)
            .unwrap_or_default();

        let file_path = path_key(path);
        let relative_path = path
            .strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        let last_modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        let parse_status = output.status();
        let ParseOutput {
            symbols,
            mut imports,
            mut exports,
            references,
            calls,
            type_relations,
            config_entries,
            warnings,
        } = output;

        for import in &mut imports {
            self.import_resolver.apply(path, language, import);
        }
        for export in &mut exports {
            if let Some(source_module) = export.source_module.clone() {
                if let sliver_parsers::import_resolver::Resolution::Resolved(target) =
                    self.import_resolver.resolve(path, language, &source_module)
                {
                    export.resolved_source_path = Some(target);
                }
            }
        }

        FileIndex {
            summary: summarize(&symbols, &imports, language),
            line_count: content.lines().count() as u32,
            byte_size: Some(content.len() as u64),
            file_path,
            relative_path,
            language,
            checksum,
            last_modified,
            parse_status,
            warnings,
            symbols,
            imports,
            exports,
            references,
            calls,
            type_relations,
            config_entries,
        }
    }
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// One-line human summary stored on the file record.
fn summarize(
    symbols: &[sliver_core::types::Symbol],
    imports: &[sliver_core::types::Import],
    language: Language,
) -> String {
    use sliver_core::types::SymbolKind;

    let functions = symbols
        .iter()
        .filter(|s| matches!(s.kind, SymbolKind::Function | SymbolKind::Callback))
        .count();
    let classes = symbols.iter().filter(|s| s.kind == SymbolKind::Class).count();
    let interfaces = symbols
        .iter()
        .filter(|s| s.kind == SymbolKind::Interface)
        .count();

    let mut parts = Vec::new();
    if classes > 0 {
        parts.push(format!("{classes} classes"));
    }
    if interfaces > 0 {
        parts.push(format!("{interfaces} interfaces"));
    }
    if functions > 0 {
        parts.push(format!("{functions} functions"));
    }
    if !imports.is_empty() {
        parts.push(format!("{} imports", imports.len()));
    }
    if parts.is_empty() {
        format!("{language} file")
    } else {
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn indexer_for(root: &Path) -> Indexer {
        let store = SymbolStore::in_memory().unwrap();
        Indexer::new(root, SliverConfig::default(), Arc::new(Mutex::new(store)))
    }

    #[test]
    fn test_full_pass_and_skip_on_reindex() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/a.ts"), "function foo() {}\n").unwrap();

        let indexer = indexer_for(dir.path());
        let first = indexer.index_directory(None).unwrap();
        assert_eq!(first.files_found, 1);
        assert_eq!(first.files_indexed, 1);
        assert_eq!(first.files_skipped, 0);

        let first_id = {
            let store = indexer.store();
            let guard = store.lock().unwrap();
            guard.symbols_named("foo").unwrap()[0].id.clone()
        };

        // Unchanged content: nothing is rewritten and IDs stay stable.
        let second = indexer.index_directory(None).unwrap();
        assert_eq!(second.files_indexed, 0);
        assert_eq!(second.files_skipped, 1);

        let second_id = {
            let store = indexer.store();
            let guard = store.lock().unwrap();
            guard.symbols_named("foo").unwrap()[0].id.clone()
        };
        assert_eq!(first_id, second_id);
    }

    #[test]
    fn test_changed_file_reindexed() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.ts");
        fs::write(&file, "function foo() {}\n").unwrap();

        let indexer = indexer_for(dir.path());
        indexer.index_directory(None).unwrap();

        fs::write(&file, "function bar() {}\n").unwrap();
        let totals = indexer.index_directory(None).unwrap();
        assert_eq!(totals.files_indexed, 1);

        let store = indexer.store();
        let guard = store.lock().unwrap();
        assert!(guard.symbols_named("foo").unwrap().is_empty());
        assert_eq!(guard.symbols_named("bar").unwrap().len(), 1);
    }

    #[test]
    fn test_remove_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.ts");
        fs::write(&file, "function foo() {}\n").unwrap();

        let indexer = indexer_for(dir.path());
        indexer.index_directory(None).unwrap();
        assert!(indexer.remove_file(&file).unwrap());

        let store = indexer.store();
        let guard = store.lock().unwrap();
        assert!(guard.symbols_named("foo").unwrap().is_empty());
        assert!(guard.list_files().unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_file_collected_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("good.ts"), "function ok() {}\n").unwrap();

        let indexer = indexer_for(dir.path());
        let totals = indexer
            .sync_index(&[dir.path().join("missing.ts"), dir.path().join("good.ts")])
            .unwrap();
        assert_eq!(totals.files_indexed, 1);
        assert_eq!(totals.errors.len(), 1);
    }

    #[test]
    fn test_cross_file_resolution_after_pass() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("lib.ts"),
            "export function helper() {\n  return 1;\n}\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("main.ts"),
            "function main() {\n  helper();\n}\n",
        )
        .unwrap();

        let indexer = indexer_for(dir.path());
        indexer.index_directory(None).unwrap();

        let store = indexer.store();
        let guard = store.lock().unwrap();
        let edges = guard.callers_of("helper").unwrap();
        assert_eq!(edges.len(), 1);
        let helper_id = guard.symbols_named("helper").unwrap()[0].id.clone();
        assert_eq!(edges[0].resolved_callee_id.as_deref(), Some(helper_id.as_str()));
    }

    #[test]
    fn test_cancellation_leaves_store_consistent() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            fs::write(dir.path().join(format!("f{i}.ts")), format!("function f{i}() {{}}\n"))
                .unwrap();
        }

        let indexer = indexer_for(dir.path());
        let cancel: CancelFlag = Arc::new(AtomicBool::new(true));
        let totals = indexer.index_directory(Some(&cancel)).unwrap();
        // Cancelled before the first write.
        assert_eq!(totals.files_indexed, 0);

        // The store still answers queries.
        let store = indexer.store();
        let guard = store.lock().unwrap();
        assert!(guard.list_files().unwrap().is_empty());
    }
}
