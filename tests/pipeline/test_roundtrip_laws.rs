// Store round-trip laws: save;delete;save == save, and save;save == save.

use sliver_core::store::SymbolStore;
use sliver_parsers::parser::{LanguageParser, ParseOptions};
use sliver_parsers::typescript::TypeScriptParser;
use std::path::PathBuf;

fn file_index_from(source: &str) -> sliver_core::types::FileIndex {
    let parser = TypeScriptParser::new();
    let path = PathBuf::from("/p/src/law.ts");
    let output = parser.parse(&path, source, &ParseOptions::default());
    sliver_core::types::FileIndex {
        file_path: "/p/src/law.ts".into(),
        relative_path: "src/law.ts".into(),
        language: sliver_core::types::Language::Typescript,
        checksum: sliver_core::id::content_checksum(source.as_bytes()),
        last_modified: 1_700_000_000,
        summary: String::new(),
        line_count: source.lines().count() as u32,
        parse_status: output.status(),
        warnings: output.warnings,
        byte_size: Some(source.len() as u64),
        symbols: output.symbols,
        imports: output.imports,
        exports: output.exports,
        references: output.references,
        calls: output.calls,
        type_relations: output.type_relations,
        config_entries: output.config_entries,
    }
}

fn observable_state(store: &SymbolStore) -> (usize, usize, usize, usize, Vec<String>) {
    let stats = store.stats().unwrap();
    let mut ids: Vec<String> = store
        .symbols_in_file("/p/src/law.ts")
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    ids.sort();
    (
        stats.file_count,
        stats.symbol_count,
        stats.reference_count,
        stats.call_edge_count,
        ids,
    )
}

const SOURCE: &str = "export function alpha() {\n  beta();\n}\nexport function beta() {\n  return 1;\n}\n";

#[test]
fn save_delete_save_equals_save() {
    let index = file_index_from(SOURCE);

    let mut once = SymbolStore::in_memory().unwrap();
    once.save_file(&index).unwrap();

    let mut cycled = SymbolStore::in_memory().unwrap();
    cycled.save_file(&index).unwrap();
    cycled.remove_file("/p/src/law.ts").unwrap();
    cycled.save_file(&index).unwrap();

    assert_eq!(observable_state(&once), observable_state(&cycled));
}

#[test]
fn save_twice_equals_save_once() {
    let index = file_index_from(SOURCE);

    let mut once = SymbolStore::in_memory().unwrap();
    once.save_file(&index).unwrap();

    let mut twice = SymbolStore::in_memory().unwrap();
    twice.save_file(&index).unwrap();
    twice.save_file(&index).unwrap();

    assert_eq!(observable_state(&once), observable_state(&twice));
}
