// Re-indexing an unchanged tree must be a no-op with stable symbol IDs.

use crate::common::index_project;

#[test]
fn reindex_of_unchanged_tree_is_noop_with_stable_ids() {
    let (_dir, indexer) = index_project(&[("src/a.ts", "function foo() {}\n")]);

    let store = indexer.store();
    let first_id = {
        let guard = store.lock().unwrap();
        let symbols = guard.symbols_named("foo").unwrap();
        assert_eq!(symbols.len(), 1);
        symbols[0].id.clone()
    };

    let totals = indexer.index_directory(None).unwrap();
    assert_eq!(totals.files_skipped, 1);
    assert_eq!(totals.files_indexed, 0);

    let guard = store.lock().unwrap();
    assert_eq!(guard.symbols_named("foo").unwrap()[0].id, first_id);
}

#[test]
fn checksum_gate_uses_content_not_mtime() {
    let (dir, indexer) = index_project(&[("src/a.ts", "function foo() {}\n")]);

    // Rewrite identical bytes: still skipped.
    std::fs::write(dir.path().join("src/a.ts"), "function foo() {}\n").unwrap();
    let totals = indexer.index_directory(None).unwrap();
    assert_eq!(totals.files_skipped, 1);
    assert_eq!(totals.files_indexed, 0);
}
