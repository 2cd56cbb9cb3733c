//! Output rendering for sliver retrieval results.
//!
//! Every endpoint's structured record renders to a compact tab-separated
//! form (section tag header + one header row, built for low-token LLM
//! consumption), a human-readable markdown form, or raw JSON. Both text
//! forms are derived from the same records, so they expose the same facts.

pub mod compact;
pub mod json;
pub mod markdown;

use sliver_core::store::{FileSummary, StoreStats};
use sliver_core::types::{ConfigEntry, IndexTotals};
use sliver_engine::markov::SuggestResponse;
use sliver_engine::retrieve::{
    ArchitectureOverview, CallTrace, ClassDetail, FunctionDetail, ReferencesResult,
    RelatedContext, SearchResults,
};

/// Rendering selected by the caller's `format` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Compact,
    Markdown,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "compact" => Some(OutputFormat::Compact),
            "markdown" => Some(OutputFormat::Markdown),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }

    pub fn formatter(self) -> Box<dyn OutputFormatter> {
        match self {
            OutputFormat::Compact => Box::new(compact::CompactFormatter),
            OutputFormat::Markdown => Box::new(markdown::MarkdownFormatter),
            OutputFormat::Json => Box::new(json::JsonFormatter),
        }
    }
}

/// One method per retrieval result shape.
pub trait OutputFormatter {
    fn format_search(&self, results: &SearchResults) -> String;
    fn format_function(&self, detail: &FunctionDetail) -> String;
    fn format_class(&self, detail: &ClassDetail) -> String;
    fn format_references(&self, result: &ReferencesResult) -> String;
    fn format_trace(&self, trace: &CallTrace) -> String;
    fn format_related(&self, context: &RelatedContext) -> String;
    fn format_overview(&self, overview: &ArchitectureOverview) -> String;
    fn format_suggestions(&self, response: &SuggestResponse) -> String;
    fn format_files(&self, files: &[FileSummary]) -> String;
    fn format_config_entries(&self, entries: &[ConfigEntry]) -> String;
    fn format_stats(&self, stats: &StoreStats) -> String;
    fn format_index_totals(&self, totals: &IndexTotals) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use sliver_core::types::SymbolKind;
    use sliver_engine::retrieve::SymbolRow;

    fn sample_results() -> SearchResults {
        SearchResults {
            query: "user".into(),
            offset: 0,
            hits: vec![
                SymbolRow {
                    name: "UserService".into(),
                    qualified_name: "UserService".into(),
                    kind: SymbolKind::Class,
                    signature: "class UserService".into(),
                    file_path: "/p/src/user.ts".into(),
                    line: 4,
                    score: None,
                },
                SymbolRow {
                    name: "createUser".into(),
                    qualified_name: "createUser".into(),
                    kind: SymbolKind::Function,
                    signature: "function createUser()".into(),
                    file_path: "/p/src/user.ts".into(),
                    line: 40,
                    score: Some(0.82),
                },
            ],
        }
    }

    /// Both text renderings expose the same (name, file, line) facts.
    #[test]
    fn test_compact_and_markdown_expose_same_tuples() {
        let results = sample_results();
        let compact = OutputFormat::Compact.formatter().format_search(&results);
        let markdown = OutputFormat::Markdown.formatter().format_search(&results);

        for hit in &results.hits {
            let line = hit.line.to_string();
            for rendering in [&compact, &markdown] {
                assert!(rendering.contains(&hit.name), "{rendering}");
                assert!(rendering.contains(&hit.file_path));
                assert!(rendering.contains(&line));
            }
        }
    }

    #[test]
    fn test_compact_has_section_and_header_row() {
        let rendered = OutputFormat::Compact
            .formatter()
            .format_search(&sample_results());
        let mut lines = rendered.lines();
        assert_eq!(lines.next(), Some("[SYMBOLS]"));
        let header = lines.next().unwrap();
        assert!(header.split('\t').count() >= 4);
    }

    #[test]
    fn test_json_round_trips() {
        let rendered = OutputFormat::Json.formatter().format_search(&sample_results());
        let back: SearchResults = serde_json::from_str(&rendered).unwrap();
        assert_eq!(back.hits.len(), 2);
    }
}
