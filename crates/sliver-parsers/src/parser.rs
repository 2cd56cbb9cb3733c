//! The parser contract shared by every language implementation.

use std::path::Path;

use sliver_core::config::SliverConfig;
use sliver_core::types::{
    CallEdge, ConfigEntry, Export, Import, Language, ParseStatus, ParseWarning, Reference, Symbol,
    TypeRelation,
};

/// Extraction knobs handed to every parser.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub max_file_size_bytes: u64,
    pub max_nesting_depth: u32,
    pub min_nested_lines: u32,
    pub include_private: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::from_config(&SliverConfig::default())
    }
}

impl ParseOptions {
    pub fn from_config(config: &SliverConfig) -> Self {
        Self {
            max_file_size_bytes: config.max_file_size_bytes,
            max_nesting_depth: config.max_nesting_depth,
            min_nested_lines: config.min_nested_lines,
            include_private: config.include_private,
        }
    }
}

/// Everything a parser extracts from one file.
#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    pub symbols: Vec<Symbol>,
    pub imports: Vec<Import>,
    pub exports: Vec<Export>,
    pub references: Vec<Reference>,
    pub calls: Vec<CallEdge>,
    pub type_relations: Vec<TypeRelation>,
    pub config_entries: Vec<ConfigEntry>,
    pub warnings: Vec<ParseWarning>,
}

impl ParseOutput {
    /// Status the file record should carry given the collected warnings.
    pub fn status(&self) -> ParseStatus {
        if self.warnings.is_empty() {
            ParseStatus::Complete
        } else if self.is_empty() {
            ParseStatus::Skipped
        } else {
            ParseStatus::Partial
        }
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
            && self.imports.is_empty()
            && self.exports.is_empty()
            && self.references.is_empty()
            && self.calls.is_empty()
            && self.type_relations.is_empty()
            && self.config_entries.is_empty()
    }

    /// An empty output carrying a single warning.
    pub fn warning_only(warning: ParseWarning) -> Self {
        ParseOutput {
            warnings: vec![warning],
            ..Default::default()
        }
    }
}

/// Contract every language parser implements.
///
/// `parse` must not panic: grammar failures become warnings on the output.
/// Size guarding and panic containment happen in the registry, so parser
/// bodies can stay straight-line.
pub trait LanguageParser: Send + Sync {
    /// Canonical language tag for files this parser owns.
    fn language(&self) -> Language;

    /// File extensions (without dot) this parser claims.
    fn extensions(&self) -> &'static [&'static str];

    /// Per-path language tag. Parsers owning several tags (TypeScript also
    /// parses JavaScript) override this.
    fn language_for(&self, _path: &Path) -> Language {
        self.language()
    }

    fn parse(&self, path: &Path, content: &str, options: &ParseOptions) -> ParseOutput;
}

#[cfg(test)]
mod tests {
    use super::*;
    use sliver_core::types::WarningCode;

    #[test]
    fn test_status_derivation() {
        let out = ParseOutput::default();
        assert_eq!(out.status(), ParseStatus::Complete);

        let out = ParseOutput::warning_only(ParseWarning::new(WarningCode::FileTooLarge, "big"));
        assert_eq!(out.status(), ParseStatus::Skipped);

        let mut out = ParseOutput::warning_only(ParseWarning::new(WarningCode::ParseError, "mid"));
        out.exports.push(Export {
            name: "x".into(),
            ..Default::default()
        });
        assert_eq!(out.status(), ParseStatus::Partial);
    }
}
