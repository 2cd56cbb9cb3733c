// Deleting a file removes its references without touching the files that
// defined the referenced symbols.

use sliver_core::config::MarkovConfig;
use sliver_engine::retrieve::RetrievalApi;

use crate::common::index_project;

#[test]
fn removing_referencing_file_clears_its_references_only() {
    let (dir, indexer) = index_project(&[
        (
            "src/b.ts",
            "export function S() {\n  return 1;\n}\n",
        ),
        (
            "src/a.ts",
            "import { S } from './b';\nfunction useIt() {\n  S();\n}\n",
        ),
    ]);

    let api = RetrievalApi::new(indexer.store(), MarkovConfig::default());
    let before = api.find_references("S").unwrap();
    assert!(before.total > 0);

    indexer.remove_file(&dir.path().join("src/a.ts")).unwrap();

    let after = api.find_references("S").unwrap();
    assert_eq!(after.total, 0);
    assert!(after.groups.is_empty());

    // The defining file is untouched.
    let store = indexer.store();
    let guard = store.lock().unwrap();
    assert_eq!(guard.symbols_named("S").unwrap().len(), 1);
    assert_eq!(guard.list_files().unwrap().len(), 1);
}

#[test]
fn removing_a_file_leaves_no_rows_in_any_normalized_table() {
    let (dir, indexer) = index_project(&[(
        "src/full.ts",
        "import { x } from './other';\nexport class Widget extends Base {\n  render(): string {\n    return paint();\n  }\n}\n",
    )]);

    indexer.remove_file(&dir.path().join("src/full.ts")).unwrap();

    let store = indexer.store();
    let guard = store.lock().unwrap();
    let stats = guard.stats().unwrap();
    assert_eq!(stats.file_count, 0);
    assert_eq!(stats.symbol_count, 0);
    assert_eq!(stats.reference_count, 0);
    assert_eq!(stats.call_edge_count, 0);
    assert_eq!(stats.type_relation_count, 0);
}
