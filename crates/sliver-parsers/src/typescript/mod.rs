//! TypeScript and JavaScript parser built on tree-sitter.
//!
//! Owns `.ts`/`.tsx`/`.js`/`.jsx`. TSX grammar is used for the JSX-capable
//! extensions. Extraction happens in two passes over one tree: a declaration
//! walk that emits symbols (with nested functions and callbacks), and a
//! reference walk that emits identifier references and call edges.

mod declarations;
mod functions;
mod helpers;
mod references;

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use tree_sitter::{Node, Parser};

use sliver_core::types::{
    CallEdge, Export, Import, Language, ParseWarning, Reference, Symbol, TypeRelation,
    WarningCode,
};

use crate::parser::{LanguageParser, ParseOptions, ParseOutput};

/// Per-file extraction state shared by the walk modules.
pub(crate) struct Ctx<'a> {
    source: &'a [u8],
    text: &'a str,
    file_path: &'a str,
    options: &'a ParseOptions,
    symbols: Vec<Symbol>,
    imports: Vec<Import>,
    exports: Vec<Export>,
    references: Vec<Reference>,
    calls: Vec<CallEdge>,
    type_relations: Vec<TypeRelation>,
    /// Dedupe set for callbacks, keyed by (start line, end line).
    callback_spans: HashSet<(u32, u32)>,
}

impl<'a> Ctx<'a> {
    fn new(text: &'a str, file_path: &'a str, options: &'a ParseOptions) -> Self {
        Ctx {
            source: text.as_bytes(),
            text,
            file_path,
            options,
            symbols: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            references: Vec::new(),
            calls: Vec::new(),
            type_relations: Vec::new(),
            callback_spans: HashSet::new(),
        }
    }

    /// Module-level statement dispatch. Exported declarations re-enter here
    /// from the export handler with the flag set.
    fn extract_statement(&mut self, node: Node<'a>, exported: bool) {
        match node.kind() {
            "function_declaration" | "generator_function_declaration" => {
                self.emit_top_level_function(node, exported);
            }
            "lexical_declaration" | "variable_declaration" => {
                self.emit_top_level_binding(node, exported);
                self.extract_variables(node, exported);
            }
            "class_declaration" | "abstract_class_declaration" => {
                self.extract_class(node, exported);
            }
            "interface_declaration" => self.extract_interface(node, exported),
            "type_alias_declaration" => self.extract_type_alias(node, exported),
            "import_statement" => self.extract_import(node),
            "export_statement" => self.extract_export(node),
            "comment" => {}
            _ => self.walk_for_functions(node, None, 0),
        }
    }
}

pub struct TypeScriptParser {
    parser: Mutex<Parser>,
}

impl TypeScriptParser {
    pub fn new() -> Self {
        TypeScriptParser {
            parser: Mutex::new(Parser::new()),
        }
    }

    fn grammar_for(path: &Path) -> tree_sitter::Language {
        match path.extension().and_then(|e| e.to_str()) {
            Some("tsx") | Some("jsx") => tree_sitter_typescript::LANGUAGE_TSX.into(),
            _ => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        }
    }
}

impl Default for TypeScriptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for TypeScriptParser {
    fn language(&self) -> Language {
        Language::Typescript
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ts", "tsx", "js", "jsx"]
    }

    fn language_for(&self, path: &Path) -> Language {
        match path.extension().and_then(|e| e.to_str()) {
            Some("js") | Some("jsx") => Language::Javascript,
            _ => Language::Typescript,
        }
    }

    fn parse(&self, path: &Path, content: &str, options: &ParseOptions) -> ParseOutput {
        let mut parser = match self.parser.lock() {
            Ok(p) => p,
            Err(poisoned) => poisoned.into_inner(),
        };
        if parser.set_language(&Self::grammar_for(path)).is_err() {
            return ParseOutput::warning_only(ParseWarning::new(
                WarningCode::ParseError,
                "grammar initialization failed",
            ));
        }
        let Some(tree) = parser.parse(content, None) else {
            return ParseOutput::warning_only(ParseWarning::new(
                WarningCode::ParseError,
                "tree-sitter returned no tree",
            ));
        };
        drop(parser);

        let file_path = path.to_string_lossy().replace('\\', "/");
        let mut ctx = Ctx::new(content, &file_path, options);

        let root = tree.root_node();
        let mut cursor = root.walk();
        let statements: Vec<Node> = root.children(&mut cursor).collect();
        for statement in statements {
            ctx.extract_statement(statement, false);
        }
        ctx.extract_references_and_calls(root);

        let mut warnings = Vec::new();
        if root.has_error() {
            warnings.push(ParseWarning::new(
                WarningCode::ParseError,
                "source contains syntax errors; extraction may be incomplete",
            ));
        }

        ParseOutput {
            symbols: ctx.symbols,
            imports: ctx.imports,
            exports: ctx.exports,
            references: ctx.references,
            calls: ctx.calls,
            type_relations: ctx.type_relations,
            config_entries: Vec::new(),
            warnings,
        }
    }
}
