//! Python parser built on tree-sitter-python.
//!
//! Same contract as the TypeScript parser with the language-appropriate
//! equivalents: `def`/`class`/module assignments become symbols, `__all__`
//! drives exports, inheritance lists become extends edges, and references
//! and call edges come from a second walk over the same tree.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use tree_sitter::{Node, Parser};

use sliver_core::id;
use sliver_core::types::{
    base_type_name, CallEdge, ClassData, Export, FunctionData, Import, ImportSpecifier, Language,
    Location, Modifiers, Param, ParseWarning, Property, Reference, ReferenceKind, Symbol,
    SymbolKind, TypeRelation, TypeRelationKind, VariableData, VariableKeyword, WarningCode,
};

use crate::parser::{LanguageParser, ParseOptions, ParseOutput};

const STOP_WORDS: &[&str] = &["as", "is", "in", "of", "if", "do"];

pub struct PythonParser {
    parser: Mutex<Parser>,
}

impl PythonParser {
    pub fn new() -> Self {
        PythonParser {
            parser: Mutex::new(Parser::new()),
        }
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageParser for PythonParser {
    fn language(&self) -> Language {
        Language::Python
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }

    fn parse(&self, path: &Path, content: &str, options: &ParseOptions) -> ParseOutput {
        let mut parser = match self.parser.lock() {
            Ok(p) => p,
            Err(poisoned) => poisoned.into_inner(),
        };
        if parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .is_err()
        {
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
        let mut ctx = PyCtx {
            source: content.as_bytes(),
            text: content,
            file_path: &file_path,
            options,
            out: ParseOutput::default(),
        };

        let root = tree.root_node();
        let mut cursor = root.walk();
        let statements: Vec<Node> = root.children(&mut cursor).collect();
        for statement in statements {
            ctx.extract_statement(statement);
        }
        ctx.extract_references_and_calls(root);

        let mut out = ctx.out;
        if root.has_error() {
            out.warnings.push(ParseWarning::new(
                WarningCode::ParseError,
                "source contains syntax errors; extraction may be incomplete",
            ));
        }
        out
    }
}

struct PyCtx<'a> {
    source: &'a [u8],
    text: &'a str,
    file_path: &'a str,
    options: &'a ParseOptions,
    out: ParseOutput,
}

fn text_of<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

fn start_line(node: Node) -> u32 {
    node.start_position().row as u32 + 1
}

fn end_line(node: Node) -> u32 {
    node.end_position().row as u32 + 1
}

fn location(file_path: &str, node: Node) -> Location {
    Location {
        file_path: file_path.to_string(),
        start_line: start_line(node),
        end_line: end_line(node),
        start_col: Some(node.start_position().column as u32),
        end_col: Some(node.end_position().column as u32),
    }
}

/// First statement of a body when it is a bare string literal.
fn docstring(body: Node, source: &[u8]) -> Option<String> {
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let expr = first.named_child(0)?;
    if expr.kind() != "string" {
        return None;
    }
    let raw = text_of(expr, source)
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    if raw.is_empty() {
        None
    } else {
        Some(raw.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}

fn signature_of(node: Node, source: &[u8]) -> String {
    let head_end = node
        .child_by_field_name("body")
        .map(|b| b.start_byte())
        .unwrap_or_else(|| node.end_byte());
    let slice = &source[node.start_byte()..head_end];
    let text = std::str::from_utf8(slice).unwrap_or("");
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_end_matches(':').trim_end();
    trimmed.chars().take(200).collect()
}

fn extract_params(node: Node, source: &[u8]) -> Vec<Param> {
    let Some(list) = node.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut params = Vec::new();
    let mut cursor = list.walk();
    for child in list.named_children(&mut cursor) {
        match child.kind() {
            "identifier" => params.push(Param {
                name: text_of(child, source).to_string(),
                ..Default::default()
            }),
            "typed_parameter" => {
                let name = child
                    .named_child(0)
                    .map(|n| text_of(n, source).to_string())
                    .unwrap_or_default();
                params.push(Param {
                    name,
                    type_text: child
                        .child_by_field_name("type")
                        .map(|t| text_of(t, source).to_string()),
                    ..Default::default()
                });
            }
            "default_parameter" | "typed_default_parameter" => {
                let name = child
                    .child_by_field_name("name")
                    .map(|n| text_of(n, source).to_string())
                    .unwrap_or_default();
                params.push(Param {
                    name,
                    type_text: child
                        .child_by_field_name("type")
                        .map(|t| text_of(t, source).to_string()),
                    default_text: child
                        .child_by_field_name("value")
                        .map(|v| text_of(v, source).to_string()),
                    optional: true,
                    ..Default::default()
                });
            }
            "list_splat_pattern" | "dictionary_splat_pattern" => {
                params.push(Param {
                    name: text_of(child, source)
                        .trim_start_matches('*')
                        .to_string(),
                    rest: true,
                    ..Default::default()
                });
            }
            _ => {}
        }
    }
    params
}

fn decorators_of(node: Node, source: &[u8]) -> Vec<String> {
    let Some(parent) = node.parent() else {
        return Vec::new();
    };
    if parent.kind() != "decorated_definition" {
        return Vec::new();
    }
    let mut cursor = parent.walk();
    parent
        .children(&mut cursor)
        .filter(|c| c.kind() == "decorator")
        .map(|c| text_of(c, source).to_string())
        .collect()
}

fn is_async_def(node: Node) -> bool {
    let mut cursor = node.walk();
    let result = node.children(&mut cursor).any(|c| c.kind() == "async");
    result
}

impl<'a> PyCtx<'a> {
    fn extract_statement(&mut self, node: Node<'a>) {
        match node.kind() {
            "function_definition" => self.emit_function(node, None, None, 0),
            "class_definition" => self.extract_class(node),
            "decorated_definition" => {
                if let Some(definition) = node.child_by_field_name("definition") {
                    self.extract_statement(definition);
                }
            }
            "import_statement" => self.extract_import(node),
            "import_from_statement" => self.extract_from_import(node),
            "expression_statement" => self.extract_module_assignment(node),
            _ => {}
        }
    }

    fn emit_function(
        &mut self,
        node: Node<'a>,
        parent_class: Option<&str>,
        parent_function: Option<&str>,
        depth: u32,
    ) {
        if depth > self.options.max_nesting_depth {
            return;
        }
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = text_of(name_node, self.source).to_string();
        let lines = end_line(node).saturating_sub(start_line(node)) + 1;
        if depth > 0 && lines < self.options.min_nested_lines {
            return;
        }

        let is_dunder = name.starts_with("__") && name.ends_with("__");
        let is_private = name.starts_with('_') && !is_dunder;
        if is_private && !self.options.include_private {
            return;
        }

        let kind = if parent_class.is_some() {
            if name == "__init__" {
                SymbolKind::Constructor
            } else {
                SymbolKind::Method
            }
        } else {
            SymbolKind::Function
        };

        let qualified = match (parent_class, parent_function) {
            (Some(class), _) => format!("{class}.{name}"),
            (None, Some(parent)) => format!("{parent}.{name}"),
            (None, None) => name.clone(),
        };

        let loc = location(self.file_path, node);
        let body = node.child_by_field_name("body");
        let modifiers = Modifiers {
            is_async: is_async_def(node),
            is_private,
            is_static: decorators_of(node, self.source)
                .iter()
                .any(|d| d.contains("staticmethod") || d.contains("classmethod")),
            ..Default::default()
        };
        let data = FunctionData {
            params: extract_params(node, self.source),
            return_type: node
                .child_by_field_name("return_type")
                .map(|t| text_of(t, self.source).to_string()),
            modifiers,
            parent_class: parent_class.map(String::from),
            parent_function: parent_function.map(String::from),
            nesting_depth: depth,
            local_name: name.clone(),
            decorators: decorators_of(node, self.source),
            type_params: Vec::new(),
        };
        let mut symbol = Symbol::function(
            id::symbol_id(self.file_path, &qualified, kind, loc.start_line),
            name,
            qualified.clone(),
            kind,
            signature_of(node, self.source),
            loc,
            data,
        );
        symbol.doc = body.and_then(|b| docstring(b, self.source));
        self.out.symbols.push(symbol);

        if let Some(body) = body {
            self.walk_for_nested(body, &qualified, depth + 1);
        }
    }

    /// Nested `def`s inside a function body, parented to `parent`.
    fn walk_for_nested(&mut self, node: Node<'a>, parent: &str, depth: u32) {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "function_definition" => {
                    self.emit_function(child, None, Some(parent), depth);
                }
                "decorated_definition" => {
                    if let Some(def) = child.child_by_field_name("definition") {
                        if def.kind() == "function_definition" {
                            self.emit_function(def, None, Some(parent), depth);
                        }
                    }
                }
                "class_definition" => {
                    // Local classes are not indexed; their bodies are opaque.
                }
                _ => self.walk_for_nested(child, parent, depth),
            }
        }
    }

    fn extract_class(&mut self, node: Node<'a>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = text_of(name_node, self.source).to_string();
        let loc = location(self.file_path, node);
        let class_id = id::symbol_id(self.file_path, &name, SymbolKind::Class, loc.start_line);

        let mut data = ClassData {
            decorators: decorators_of(node, self.source),
            ..Default::default()
        };

        if let Some(superclasses) = node.child_by_field_name("superclasses") {
            let mut cursor = superclasses.walk();
            for base in superclasses.named_children(&mut cursor) {
                if base.kind() == "keyword_argument" {
                    continue;
                }
                let target = text_of(base, self.source).to_string();
                if target.is_empty() {
                    continue;
                }
                if data.extends.is_none() {
                    data.extends = Some(target.clone());
                } else {
                    data.implements.push(target.clone());
                }
                self.out.type_relations.push(TypeRelation {
                    id: id::type_relation_id(&class_id, &target, TypeRelationKind::Extends),
                    source_id: class_id.clone(),
                    source_name: name.clone(),
                    target_name: target.clone(),
                    target_base_name: base_type_name(&target),
                    resolved_target_id: None,
                    kind: TypeRelationKind::Extends,
                });
            }
        }

        let body = node.child_by_field_name("body");
        if let Some(body) = body {
            let mut cursor = body.walk();
            let members: Vec<Node> = body.named_children(&mut cursor).collect();
            for member in members {
                match member.kind() {
                    "function_definition" => {
                        let method_name = member
                            .child_by_field_name("name")
                            .map(|n| text_of(n, self.source).to_string())
                            .unwrap_or_default();
                        if method_name == "__init__" {
                            data.constructor_signature = Some(signature_of(member, self.source));
                        }
                        data.method_names.push(method_name);
                        self.emit_function(member, Some(&name), None, 0);
                    }
                    "decorated_definition" => {
                        if let Some(def) = member.child_by_field_name("definition") {
                            if def.kind() == "function_definition" {
                                let method_name = def
                                    .child_by_field_name("name")
                                    .map(|n| text_of(n, self.source).to_string())
                                    .unwrap_or_default();
                                data.method_names.push(method_name);
                                self.emit_function(def, Some(&name), None, 0);
                            }
                        }
                    }
                    "expression_statement" => {
                        if let Some(prop) = self.class_property(member) {
                            data.properties.push(prop);
                        }
                    }
                    _ => {}
                }
            }
        }

        let mut symbol = Symbol::class(class_id, name, signature_of(node, self.source), loc, data);
        symbol.doc = body.and_then(|b| docstring(b, self.source));
        self.out.symbols.push(symbol);
    }

    fn class_property(&self, statement: Node<'a>) -> Option<Property> {
        let assignment = statement.named_child(0)?;
        if assignment.kind() != "assignment" {
            return None;
        }
        let left = assignment.child_by_field_name("left")?;
        if left.kind() != "identifier" {
            return None;
        }
        Some(Property {
            name: text_of(left, self.source).to_string(),
            type_text: assignment
                .child_by_field_name("type")
                .map(|t| text_of(t, self.source).to_string()),
            default_text: assignment
                .child_by_field_name("right")
                .map(|r| text_of(r, self.source).to_string()),
            ..Default::default()
        })
    }

    /// Module-level assignments: `__all__` feeds exports, plain names become
    /// variables.
    fn extract_module_assignment(&mut self, statement: Node<'a>) {
        let Some(assignment) = statement.named_child(0) else {
            return;
        };
        if assignment.kind() != "assignment" {
            return;
        }
        let Some(left) = assignment.child_by_field_name("left") else {
            return;
        };
        if left.kind() != "identifier" {
            return;
        }
        let name = text_of(left, self.source).to_string();

        if name == "__all__" {
            if let Some(right) = assignment.child_by_field_name("right") {
                let mut cursor = right.walk();
                for item in right.named_children(&mut cursor) {
                    if item.kind() == "string" {
                        let export_name = text_of(item, self.source)
                            .trim_matches(|c| c == '"' || c == '\'')
                            .to_string();
                        self.out.exports.push(Export {
                            name: export_name,
                            is_default: false,
                            is_reexport: false,
                            source_module: None,
                            resolved_source_path: None,
                            line: start_line(item),
                        });
                    }
                }
            }
            return;
        }

        if name.starts_with('_') && !self.options.include_private {
            return;
        }
        let keyword = if name.chars().all(|c| c.is_uppercase() || c == '_' || c.is_ascii_digit()) {
            VariableKeyword::Const
        } else {
            VariableKeyword::Var
        };
        let loc = location(self.file_path, assignment);
        self.out.symbols.push(Symbol::variable(
            id::symbol_id(self.file_path, &name, SymbolKind::Variable, loc.start_line),
            name,
            signature_of(assignment, self.source),
            loc,
            VariableData {
                keyword,
                type_text: assignment
                    .child_by_field_name("type")
                    .map(|t| text_of(t, self.source).to_string()),
                exported: false,
            },
        ));
    }

    fn extract_import(&mut self, node: Node<'a>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "dotted_name" => {
                    let module = text_of(child, self.source).to_string();
                    self.out.imports.push(Import {
                        specifiers: vec![ImportSpecifier {
                            name: module.clone(),
                            ..Default::default()
                        }],
                        module,
                        line: start_line(node),
                        ..Default::default()
                    });
                }
                "aliased_import" => {
                    let module = child
                        .child_by_field_name("name")
                        .map(|n| text_of(n, self.source).to_string())
                        .unwrap_or_default();
                    let alias = child
                        .child_by_field_name("alias")
                        .map(|a| text_of(a, self.source).to_string());
                    self.out.imports.push(Import {
                        specifiers: vec![ImportSpecifier {
                            name: module.clone(),
                            alias,
                            ..Default::default()
                        }],
                        module,
                        line: start_line(node),
                        ..Default::default()
                    });
                }
                _ => {}
            }
        }
    }

    fn extract_from_import(&mut self, node: Node<'a>) {
        let module = node
            .child_by_field_name("module_name")
            .map(|m| text_of(m, self.source).to_string())
            .unwrap_or_default();

        let mut specifiers = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "dotted_name" | "identifier"
                    if node
                        .child_by_field_name("module_name")
                        .map_or(true, |m| m.id() != child.id()) =>
                {
                    specifiers.push(ImportSpecifier {
                        name: text_of(child, self.source).to_string(),
                        ..Default::default()
                    });
                }
                "aliased_import" => {
                    specifiers.push(ImportSpecifier {
                        name: child
                            .child_by_field_name("name")
                            .map(|n| text_of(n, self.source).to_string())
                            .unwrap_or_default(),
                        alias: child
                            .child_by_field_name("alias")
                            .map(|a| text_of(a, self.source).to_string()),
                        ..Default::default()
                    });
                }
                "wildcard_import" => {
                    specifiers.push(ImportSpecifier {
                        name: "*".to_string(),
                        is_namespace: true,
                        ..Default::default()
                    });
                }
                _ => {}
            }
        }

        self.out.imports.push(Import {
            module,
            specifiers,
            line: start_line(node),
            ..Default::default()
        });
    }

    fn enclosing_function(&self, line: u32) -> Option<(String, String)> {
        self.out
            .symbols
            .iter()
            .filter(|s| s.kind.is_function_like())
            .filter(|s| s.location.start_line <= line && line <= s.location.end_line)
            .max_by_key(|s| (s.location.start_line, std::cmp::Reverse(s.location.end_line)))
            .map(|s| (s.id.clone(), s.qualified_name.clone()))
    }

    fn extract_references_and_calls(&mut self, root: Node<'a>) {
        let mut edges: HashMap<(String, String), CallEdge> = HashMap::new();
        self.walk_references(root, &mut edges);

        let mut calls: Vec<CallEdge> = edges.into_values().collect();
        calls.sort_by(|a, b| {
            a.caller_id
                .cmp(&b.caller_id)
                .then_with(|| a.callee_name.cmp(&b.callee_name))
        });
        self.out.calls = calls;
    }

    fn walk_references(&mut self, node: Node<'a>, edges: &mut HashMap<(String, String), CallEdge>) {
        if node.kind() == "call" {
            self.record_call_edge(node, edges);
        }
        if node.kind() == "identifier" {
            self.record_reference(node);
        }

        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children {
            self.walk_references(child, edges);
        }
    }

    fn record_reference(&mut self, node: Node<'a>) {
        let text = text_of(node, self.source);
        if text.chars().count() <= 1 || STOP_WORDS.contains(&text) {
            return;
        }
        if is_declared_name(node) {
            return;
        }

        let kind = py_reference_kind(node);
        let line = start_line(node);
        let column = node.start_position().column as u32;
        let (referencing_symbol_id, referencing_symbol_name) = match self.enclosing_function(line) {
            Some((id, name)) => (Some(id), Some(name)),
            None => (None, None),
        };

        self.out.references.push(Reference {
            id: id::reference_id(self.file_path, text, kind, line, column),
            symbol_name: text.to_string(),
            resolved_symbol_id: None,
            file_path: self.file_path.to_string(),
            referencing_symbol_id,
            referencing_symbol_name,
            line,
            column,
            snippet: self
                .text
                .lines()
                .nth(line.saturating_sub(1) as usize)
                .unwrap_or("")
                .trim()
                .to_string(),
            kind,
        });
    }

    fn record_call_edge(&mut self, call: Node<'a>, edges: &mut HashMap<(String, String), CallEdge>) {
        let Some(function_side) = call.child_by_field_name("function") else {
            return;
        };
        let callee = match function_side.kind() {
            "identifier" => text_of(function_side, self.source).to_string(),
            "attribute" => function_side
                .child_by_field_name("attribute")
                .map(|a| text_of(a, self.source).to_string())
                .unwrap_or_default(),
            _ => return,
        };
        if callee.is_empty() {
            return;
        }
        let Some((caller_id, caller_name)) = self.enclosing_function(start_line(call)) else {
            return;
        };

        let mut is_async = false;
        let mut is_conditional = false;
        let mut current = call;
        while let Some(parent) = current.parent() {
            match parent.kind() {
                "await" => is_async = true,
                "if_statement" | "try_statement" | "conditional_expression" => {
                    is_conditional = true
                }
                "function_definition" => break,
                _ => {}
            }
            current = parent;
        }

        let key = (caller_id.clone(), callee.clone());
        let edge = edges.entry(key).or_insert_with(|| CallEdge {
            id: id::call_edge_id(&caller_id, &callee),
            caller_id,
            caller_name,
            callee_name: callee,
            resolved_callee_id: None,
            call_count: 0,
            is_async: false,
            is_conditional: false,
        });
        edge.call_count += 1;
        edge.is_async |= is_async;
        edge.is_conditional |= is_conditional;
    }
}

fn is_declared_name(node: Node) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    match parent.kind() {
        "function_definition" | "class_definition" => parent
            .child_by_field_name("name")
            .is_some_and(|n| n.id() == node.id()),
        "parameters" | "typed_parameter" | "default_parameter" | "typed_default_parameter" => {
            true
        }
        "assignment" => parent
            .child_by_field_name("left")
            .is_some_and(|n| n.id() == node.id()),
        _ => false,
    }
}

fn py_reference_kind(node: Node) -> ReferenceKind {
    if let Some(parent) = node.parent() {
        if parent.kind() == "call" {
            if let Some(function_side) = parent.child_by_field_name("function") {
                if function_side.id() == node.id() {
                    return ReferenceKind::Call;
                }
            }
        }
        if parent.kind() == "type" {
            return ReferenceKind::Type;
        }
    }

    let mut current = node;
    while let Some(parent) = current.parent() {
        match parent.kind() {
            "import_statement" | "import_from_statement" | "aliased_import" => {
                return ReferenceKind::Import;
            }
            "block" | "module" => break,
            _ => current = parent,
        }
    }

    ReferenceKind::Read
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(content: &str) -> ParseOutput {
        let parser = PythonParser::new();
        parser.parse(&PathBuf::from("/p/src/mod.py"), content, &ParseOptions::default())
    }

    fn symbol<'a>(out: &'a ParseOutput, qualified: &str) -> &'a Symbol {
        out.symbols
            .iter()
            .find(|s| s.qualified_name == qualified)
            .unwrap_or_else(|| panic!("symbol {qualified} missing"))
    }

    #[test]
    fn test_function_with_typed_params() {
        let out = parse("def fetch(url: str, timeout: int = 30) -> dict:\n    \"\"\"Fetch a URL.\"\"\"\n    return {}\n");
        let fetch = symbol(&out, "fetch");
        assert_eq!(fetch.kind, SymbolKind::Function);
        assert_eq!(fetch.doc.as_deref(), Some("Fetch a URL."));
        let data = fetch.as_function().unwrap();
        assert_eq!(data.params.len(), 2);
        assert_eq!(data.params[0].type_text.as_deref(), Some("str"));
        assert_eq!(data.params[1].default_text.as_deref(), Some("30"));
        assert!(data.params[1].optional);
        assert_eq!(data.return_type.as_deref(), Some("dict"));
    }

    #[test]
    fn test_async_function() {
        let out = parse("async def poll():\n    await tick()\n");
        let poll = symbol(&out, "poll");
        assert!(poll.as_function().unwrap().modifiers.is_async);

        let tick = out.calls.iter().find(|c| c.callee_name == "tick").unwrap();
        assert!(tick.is_async);
    }

    #[test]
    fn test_class_with_methods_and_bases() {
        let source = "class UserService(BaseService, Cacheable):\n    \"\"\"User operations.\"\"\"\n    retries = 3\n\n    def __init__(self, db):\n        self.db = db\n\n    def find(self, user_id: int):\n        return self.db.get(user_id)\n";
        let out = parse(source);

        let class = symbol(&out, "UserService");
        assert_eq!(class.kind, SymbolKind::Class);
        assert_eq!(class.doc.as_deref(), Some("User operations."));
        let data = class.as_class().unwrap();
        assert_eq!(data.extends.as_deref(), Some("BaseService"));
        assert!(data.method_names.contains(&"find".to_string()));
        assert!(data.constructor_signature.is_some());
        assert!(data.properties.iter().any(|p| p.name == "retries"));

        assert_eq!(symbol(&out, "UserService.__init__").kind, SymbolKind::Constructor);
        assert_eq!(symbol(&out, "UserService.find").kind, SymbolKind::Method);

        assert_eq!(out.type_relations.len(), 2);
        assert!(out
            .type_relations
            .iter()
            .all(|r| r.kind == TypeRelationKind::Extends));
    }

    #[test]
    fn test_nested_function_rules() {
        let source = "def outer():\n    def inner():\n        a = 1\n        b = 2\n        return a + b\n    def tiny(): return 1\n    return inner\n";
        let out = parse(source);

        let inner = symbol(&out, "outer.inner");
        assert_eq!(inner.parent_function(), Some("outer"));
        assert_eq!(inner.nesting_depth(), 1);
        assert!(!out.symbols.iter().any(|s| s.name == "tiny"));
    }

    #[test]
    fn test_imports() {
        let source = "import os\nimport numpy as np\nfrom .utils import helper, slugify as slug\nfrom pkg.sub import *\n";
        let out = parse(source);
        assert_eq!(out.imports.len(), 4);

        assert_eq!(out.imports[0].module, "os");
        assert_eq!(out.imports[1].specifiers[0].alias.as_deref(), Some("np"));

        let relative = &out.imports[2];
        assert_eq!(relative.module, ".utils");
        assert_eq!(relative.specifiers.len(), 2);
        assert_eq!(relative.specifiers[1].alias.as_deref(), Some("slug"));

        assert!(out.imports[3].specifiers[0].is_namespace);
    }

    #[test]
    fn test_dunder_all_exports() {
        let out = parse("__all__ = [\"foo\", \"Bar\"]\n\ndef foo():\n    pass\n");
        assert_eq!(out.exports.len(), 2);
        assert_eq!(out.exports[0].name, "foo");
        assert_eq!(out.exports[1].name, "Bar");
    }

    #[test]
    fn test_module_variables() {
        let out = parse("MAX_SIZE = 100\ncurrent = None\n_hidden = 1\n");
        let max = symbol(&out, "MAX_SIZE");
        match &max.data {
            sliver_core::types::SymbolData::Variable(v) => {
                assert_eq!(v.keyword, VariableKeyword::Const)
            }
            other => panic!("expected variable, got {other:?}"),
        }
        assert!(out.symbols.iter().any(|s| s.name == "current"));
        assert!(!out.symbols.iter().any(|s| s.name == "_hidden"));
    }

    #[test]
    fn test_call_edges_and_references() {
        let source = "def main():\n    setup()\n    if ready:\n        run()\n        run()\n";
        let out = parse(source);

        let run = out.calls.iter().find(|c| c.callee_name == "run").unwrap();
        assert_eq!(run.call_count, 2);
        assert!(run.is_conditional);
        assert_eq!(run.caller_name, "main");

        let refs: Vec<&Reference> = out
            .references
            .iter()
            .filter(|r| r.symbol_name == "setup" && r.kind == ReferenceKind::Call)
            .collect();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].referencing_symbol_name.as_deref(), Some("main"));
    }

    #[test]
    fn test_private_function_skipped() {
        let out = parse("def _internal():\n    pass\n\ndef public():\n    pass\n");
        assert!(!out.symbols.iter().any(|s| s.name == "_internal"));
        assert!(out.symbols.iter().any(|s| s.name == "public"));
    }
}
