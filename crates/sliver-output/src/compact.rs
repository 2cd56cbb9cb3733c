//! Tab-separated compact rendering: a `[SECTION]` tag, one header row, then
//! data rows. Tabs inside values are flattened to spaces so columns stay
//! aligned for the consumer.

use sliver_core::store::{FileSummary, StoreStats};
use sliver_core::types::{ConfigEntry, IndexTotals};
use sliver_engine::markov::SuggestResponse;
use sliver_engine::retrieve::{
    ArchitectureOverview, CallTrace, ClassDetail, FunctionDetail, ReferencesResult,
    RelatedContext, SearchResults, SymbolRow,
};

use crate::OutputFormatter;

pub struct CompactFormatter;

fn cell(value: &str) -> String {
    value.replace(['\t', '\n'], " ")
}

fn section(tag: &str, header: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    out.push('[');
    out.push_str(tag);
    out.push_str("]\n");
    out.push_str(&header.join("\t"));
    out.push('\n');
    for row in rows {
        let cells: Vec<String> = row.iter().map(|v| cell(v)).collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }
    out
}

fn symbol_rows(rows: &[SymbolRow]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            vec![
                row.name.clone(),
                row.kind.as_str().to_string(),
                row.file_path.clone(),
                row.line.to_string(),
                row.score.map(|s| format!("{s:.3}")).unwrap_or_default(),
                row.signature.clone(),
            ]
        })
        .collect()
}

impl OutputFormatter for CompactFormatter {
    fn format_search(&self, results: &SearchResults) -> String {
        section(
            "SYMBOLS",
            &["name", "kind", "file", "line", "score", "signature"],
            &symbol_rows(&results.hits),
        )
    }

    fn format_function(&self, detail: &FunctionDetail) -> String {
        let symbol = &detail.symbol;
        let data = symbol.as_function();
        let rows = vec![vec![
            symbol.qualified_name.clone(),
            symbol.kind.as_str().to_string(),
            detail.file_path.clone(),
            symbol.location.start_line.to_string(),
            symbol.location.end_line.to_string(),
            data.map(|f| f.nesting_depth.to_string()).unwrap_or_default(),
            data.and_then(|f| f.parent_function.clone()).unwrap_or_default(),
            symbol.signature.clone(),
        ]];
        section(
            "FUNCTION",
            &["qualified_name", "kind", "file", "start", "end", "depth", "parent", "signature"],
            &rows,
        )
    }

    fn format_class(&self, detail: &ClassDetail) -> String {
        let symbol = &detail.symbol;
        let mut out = section(
            "CLASS",
            &["name", "kind", "file", "start", "end", "signature"],
            &[vec![
                symbol.name.clone(),
                symbol.kind.as_str().to_string(),
                detail.file_path.clone(),
                symbol.location.start_line.to_string(),
                symbol.location.end_line.to_string(),
                symbol.signature.clone(),
            ]],
        );
        if let Some(class) = symbol.as_class() {
            let member_rows: Vec<Vec<String>> = class
                .method_names
                .iter()
                .map(|m| vec!["method".to_string(), m.clone()])
                .chain(
                    class
                        .properties
                        .iter()
                        .map(|p| vec!["property".to_string(), p.name.clone()]),
                )
                .collect();
            out.push_str(&section("MEMBERS", &["role", "name"], &member_rows));
        }
        if let Some(interface) = symbol.as_interface() {
            let member_rows: Vec<Vec<String>> = interface
                .methods
                .iter()
                .map(|m| vec!["method".to_string(), m.name.clone()])
                .chain(
                    interface
                        .properties
                        .iter()
                        .map(|p| vec!["property".to_string(), p.name.clone()]),
                )
                .collect();
            out.push_str(&section("MEMBERS", &["role", "name"], &member_rows));
        }
        out
    }

    fn format_references(&self, result: &ReferencesResult) -> String {
        let rows: Vec<Vec<String>> = result
            .groups
            .iter()
            .flat_map(|group| {
                group.references.iter().map(|r| {
                    vec![
                        result.symbol_name.clone(),
                        group.file_path.clone(),
                        r.line.to_string(),
                        r.kind.as_str().to_string(),
                        r.referencing_symbol_name.clone().unwrap_or_default(),
                        r.snippet.clone(),
                    ]
                })
            })
            .collect();
        section(
            "REFERENCES",
            &["name", "file", "line", "kind", "in", "snippet"],
            &rows,
        )
    }

    fn format_trace(&self, trace: &CallTrace) -> String {
        let rows: Vec<Vec<String>> = trace
            .entries
            .iter()
            .map(|e| {
                vec![
                    e.depth.to_string(),
                    e.caller_name.clone(),
                    e.callee_name.clone(),
                    e.call_count.to_string(),
                    flag(e.is_async),
                    flag(e.is_conditional),
                    flag(e.resolved),
                ]
            })
            .collect();
        section(
            "CALLS",
            &["depth", "caller", "callee", "count", "async", "cond", "resolved"],
            &rows,
        )
    }

    fn format_related(&self, context: &RelatedContext) -> String {
        let mut out = self.format_function(&FunctionDetail {
            symbol: context.function.clone(),
            file_path: context.function.location.file_path.clone(),
        });
        out.push_str(&section(
            "CALLEES",
            &["name", "kind", "file", "line", "score", "signature"],
            &symbol_rows(&context.callees),
        ));
        out.push_str(&section(
            "TYPES",
            &["name", "kind", "file", "line", "score", "signature"],
            &symbol_rows(&context.types),
        ));
        if let Some(source) = &context.source {
            out.push_str("[SOURCE]\n");
            out.push_str(source);
            out.push('\n');
        }
        out
    }

    fn format_overview(&self, overview: &ArchitectureOverview) -> String {
        let module_rows: Vec<Vec<String>> = overview
            .modules
            .iter()
            .map(|m| {
                vec![
                    m.name.clone(),
                    m.file_count.to_string(),
                    m.line_count.to_string(),
                    m.top_exports
                        .iter()
                        .map(|e| e.name.as_str())
                        .collect::<Vec<_>>()
                        .join(","),
                    m.narrative.clone().unwrap_or_default(),
                ]
            })
            .collect();
        let mut out = section(
            "MODULES",
            &["module", "files", "lines", "top_exports", "narrative"],
            &module_rows,
        );

        let dep_rows: Vec<Vec<String>> = overview
            .dependencies
            .iter()
            .map(|d| {
                vec![
                    d.from.clone(),
                    d.to.clone(),
                    d.import_count.to_string(),
                    d.type_only_count.to_string(),
                ]
            })
            .collect();
        out.push_str(&section(
            "DEPENDENCIES",
            &["from", "to", "imports", "type_only"],
            &dep_rows,
        ));

        let entry_rows: Vec<Vec<String>> = overview
            .entry_points
            .iter()
            .map(|e| vec![e.clone()])
            .collect();
        out.push_str(&section("ENTRY_POINTS", &["path"], &entry_rows));
        out
    }

    fn format_suggestions(&self, response: &SuggestResponse) -> String {
        let rows: Vec<Vec<String>> = response
            .suggestions
            .iter()
            .map(|s| {
                vec![
                    s.symbol_name.clone(),
                    format!("{:.3}", s.score),
                    s.depth.to_string(),
                    s.file_path.clone(),
                    s.path.join(" > "),
                ]
            })
            .collect();
        let mut out = section(
            "SUGGESTIONS",
            &["name", "score", "depth", "file", "path"],
            &rows,
        );
        out.push_str(&section(
            "CHAINS",
            &["chain"],
            &response
                .chains_used
                .iter()
                .map(|c| vec![c.clone()])
                .collect::<Vec<_>>(),
        ));
        out
    }

    fn format_files(&self, files: &[FileSummary]) -> String {
        let rows: Vec<Vec<String>> = files
            .iter()
            .map(|f| {
                vec![
                    f.relative_path.clone(),
                    f.language.as_str().to_string(),
                    f.line_count.to_string(),
                    f.parse_status.as_str().to_string(),
                    f.warnings
                        .iter()
                        .map(|w| w.code.as_str())
                        .collect::<Vec<_>>()
                        .join(","),
                ]
            })
            .collect();
        section(
            "FILES",
            &["path", "language", "lines", "status", "warnings"],
            &rows,
        )
    }

    fn format_config_entries(&self, entries: &[ConfigEntry]) -> String {
        let rows: Vec<Vec<String>> = entries
            .iter()
            .map(|e| {
                vec![
                    e.key_path.clone(),
                    e.value_type.clone(),
                    e.rendered_value.clone(),
                    e.file_path.clone(),
                    e.line.to_string(),
                    e.description.clone().unwrap_or_default(),
                ]
            })
            .collect();
        section(
            "CONFIG",
            &["key", "type", "value", "file", "line", "description"],
            &rows,
        )
    }

    fn format_stats(&self, stats: &StoreStats) -> String {
        let mut rows = vec![
            vec!["files".to_string(), stats.file_count.to_string()],
            vec!["symbols".to_string(), stats.symbol_count.to_string()],
            vec!["references".to_string(), stats.reference_count.to_string()],
            vec!["call_edges".to_string(), stats.call_edge_count.to_string()],
            vec![
                "type_relations".to_string(),
                stats.type_relation_count.to_string(),
            ],
            vec![
                "config_entries".to_string(),
                stats.config_entry_count.to_string(),
            ],
        ];
        for (language, count) in &stats.files_by_language {
            rows.push(vec![format!("files:{language}"), count.to_string()]);
        }
        section("STATS", &["metric", "value"], &rows)
    }

    fn format_index_totals(&self, totals: &IndexTotals) -> String {
        let mut out = section(
            "INDEX",
            &["found", "indexed", "skipped", "errors"],
            &[vec![
                totals.files_found.to_string(),
                totals.files_indexed.to_string(),
                totals.files_skipped.to_string(),
                totals.errors.len().to_string(),
            ]],
        );
        if !totals.errors.is_empty() {
            let rows: Vec<Vec<String>> = totals
                .errors
                .iter()
                .map(|e| vec![e.file_path.clone(), e.message.clone()])
                .collect();
            out.push_str(&section("ERRORS", &["file", "message"], &rows));
        }
        out
    }
}

fn flag(value: bool) -> String {
    if value { "y" } else { "n" }.to_string()
}
