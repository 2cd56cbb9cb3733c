/// Shared helpers for sliver integration tests.
///
/// Import from any integration test file with:
///   `#[path = "common/mod.rs"] mod common;`
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use sliver_core::config::SliverConfig;
use sliver_core::store::SymbolStore;
use sliver_engine::indexer::Indexer;

/// Write the given (relative path, content) files into a temp dir and index
/// it with an in-memory store. Hold the TempDir to keep the tree alive.
#[allow(dead_code)]
pub fn index_project(files: &[(&str, &str)]) -> (TempDir, Indexer) {
    let dir = TempDir::new().unwrap();
    write_files(dir.path(), files);

    let store = SymbolStore::in_memory().unwrap();
    let indexer = Indexer::new(
        dir.path(),
        SliverConfig::default(),
        Arc::new(Mutex::new(store)),
    );
    indexer.index_directory(None).unwrap();
    (dir, indexer)
}

#[allow(dead_code)]
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (relative, content) in files {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}
