//! Extension-to-parser dispatch with the shared size guard and panic
//! containment.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use tracing::warn;

use sliver_core::types::{Language, ParseWarning, WarningCode};

use crate::config_files::ConfigParser;
use crate::parser::{LanguageParser, ParseOptions, ParseOutput};
use crate::python::PythonParser;
use crate::typescript::TypeScriptParser;

/// Owns one parser per language and routes files by extension.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn LanguageParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        ParserRegistry {
            parsers: vec![
                Box::new(TypeScriptParser::new()),
                Box::new(PythonParser::new()),
                Box::new(ConfigParser::new()),
            ],
        }
    }

    /// The parser owning a path's extension, if any.
    pub fn parser_for(&self, path: &Path) -> Option<&dyn LanguageParser> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        self.parsers
            .iter()
            .find(|p| p.extensions().contains(&ext.as_str()))
            .map(|p| p.as_ref())
    }

    /// Language tag a path would be indexed under, if any parser owns it.
    pub fn language_for(&self, path: &Path) -> Option<Language> {
        self.parser_for(path).map(|p| p.language_for(path))
    }

    /// Run the owning parser with the size ceiling and panic containment
    /// applied. Oversize files and parser panics both yield an empty output
    /// with a single warning instead of aborting the indexing pass.
    pub fn parse_file(
        &self,
        path: &Path,
        content: &str,
        options: &ParseOptions,
    ) -> Option<ParseOutput> {
        let parser = self.parser_for(path)?;

        if content.len() as u64 > options.max_file_size_bytes {
            return Some(ParseOutput::warning_only(ParseWarning::new(
                WarningCode::FileTooLarge,
                format!(
                    "{} bytes exceeds the {} byte ceiling",
                    content.len(),
                    options.max_file_size_bytes
                ),
            )));
        }

        let result = catch_unwind(AssertUnwindSafe(|| parser.parse(path, content, options)));
        match result {
            Ok(output) => Some(output),
            Err(payload) => {
                let message = panic_message(&payload);
                warn!("parser panicked on {}: {message}", path.display());
                Some(ParseOutput::warning_only(ParseWarning::new(
                    WarningCode::ParseError,
                    format!("parser failure: {message}"),
                )))
            }
        }
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
