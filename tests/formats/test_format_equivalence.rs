// Compact and markdown renderings derive from the same records, so they
// must expose the same (symbol name, file path, line) facts.

use proptest::prelude::*;

use sliver_core::types::SymbolKind;
use sliver_engine::retrieve::{SearchResults, SymbolRow};
use sliver_output::{OutputFormat, OutputFormatter};

fn kind_strategy() -> impl Strategy<Value = SymbolKind> {
    prop_oneof![
        Just(SymbolKind::Function),
        Just(SymbolKind::Method),
        Just(SymbolKind::Class),
        Just(SymbolKind::Interface),
        Just(SymbolKind::Variable),
    ]
}

fn row_strategy() -> impl Strategy<Value = SymbolRow> {
    (
        "[a-zA-Z][a-zA-Z0-9_]{2,12}",
        kind_strategy(),
        "[a-z]{1,8}/[a-z]{1,8}\\.ts",
        1u32..5000,
        proptest::option::of(0.01f64..1.0),
    )
        .prop_map(|(name, kind, file, line, score)| SymbolRow {
            qualified_name: name.clone(),
            signature: format!("function {name}()"),
            name,
            kind,
            file_path: format!("/p/{file}"),
            line,
            score,
        })
}

proptest! {
    #[test]
    fn compact_and_markdown_expose_same_tuples(
        rows in proptest::collection::vec(row_strategy(), 0..8)
    ) {
        let results = SearchResults {
            query: "q".into(),
            offset: 0,
            hits: rows.clone(),
        };
        let compact = OutputFormat::Compact.formatter().format_search(&results);
        let markdown = OutputFormat::Markdown.formatter().format_search(&results);

        for row in &rows {
            let line = row.line.to_string();
            for rendering in [&compact, &markdown] {
                prop_assert!(rendering.contains(&row.name));
                prop_assert!(rendering.contains(&row.file_path));
                prop_assert!(rendering.contains(&line));
            }
        }
    }
}

#[test]
fn compact_sections_carry_single_header_row() {
    let results = SearchResults {
        query: "q".into(),
        offset: 0,
        hits: vec![],
    };
    let compact = OutputFormat::Compact.formatter().format_search(&results);
    let lines: Vec<&str> = compact.lines().collect();
    assert_eq!(lines[0], "[SYMBOLS]");
    assert_eq!(lines.len(), 2, "empty result is tag + header only");
}
