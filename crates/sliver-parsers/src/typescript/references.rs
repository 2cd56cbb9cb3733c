//! Reference and call-edge extraction.
//!
//! Every interesting identifier becomes a reference tagged by its syntactic
//! role; every call expression contributes to the per-(caller, callee)
//! aggregated edge set.

use std::collections::HashMap;

use tree_sitter::Node;

use sliver_core::id;
use sliver_core::types::{CallEdge, Reference, ReferenceKind};

use super::helpers::{line_snippet, node_text, start_col, start_line, trailing_callee_name};
use super::Ctx;

/// Tokens never worth recording as references.
const STOP_WORDS: &[&str] = &["as", "is", "in", "of", "if", "do"];

fn is_function_boundary(kind: &str) -> bool {
    matches!(
        kind,
        "function_declaration"
            | "generator_function_declaration"
            | "function_expression"
            | "function"
            | "arrow_function"
            | "method_definition"
    )
}

impl<'a> Ctx<'a> {
    /// Innermost emitted function-like symbol whose range contains `line`.
    fn enclosing_function(&self, line: u32) -> Option<(String, String)> {
        self.symbols
            .iter()
            .filter(|s| s.kind.is_function_like())
            .filter(|s| s.location.start_line <= line && line <= s.location.end_line)
            .max_by_key(|s| (s.location.start_line, std::cmp::Reverse(s.location.end_line)))
            .map(|s| (s.id.clone(), s.qualified_name.clone()))
    }

    pub(super) fn extract_references_and_calls(&mut self, root: Node<'a>) {
        let mut edges: HashMap<(String, String), CallEdge> = HashMap::new();
        self.walk_references(root, &mut edges);

        let mut calls: Vec<CallEdge> = edges.into_values().collect();
        calls.sort_by(|a, b| {
            a.caller_id
                .cmp(&b.caller_id)
                .then_with(|| a.callee_name.cmp(&b.callee_name))
        });
        self.calls = calls;
    }

    fn walk_references(&mut self, node: Node<'a>, edges: &mut HashMap<(String, String), CallEdge>) {
        if node.kind() == "call_expression" {
            self.record_call_edge(node, edges);
        }

        match node.kind() {
            "identifier" | "type_identifier" | "shorthand_property_identifier" => {
                self.record_reference(node);
            }
            _ => {}
        }

        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children {
            self.walk_references(child, edges);
        }
    }

    fn record_reference(&mut self, node: Node<'a>) {
        let text = node_text(node, self.source);
        if text.chars().count() <= 1 || STOP_WORDS.contains(&text) {
            return;
        }
        if is_declared_name(node) {
            return;
        }

        let kind = reference_kind(node);
        let line = start_line(node);
        let column = start_col(node);
        let enclosing = self.enclosing_function(line);

        let (referencing_symbol_id, referencing_symbol_name) = match enclosing {
            Some((id, name)) => (Some(id), Some(name)),
            None => (None, None),
        };
        self.references.push(Reference {
            id: id::reference_id(self.file_path, text, kind, line, column),
            symbol_name: text.to_string(),
            resolved_symbol_id: None,
            file_path: self.file_path.to_string(),
            referencing_symbol_id,
            referencing_symbol_name,
            line,
            column,
            snippet: line_snippet(self.text, line),
            kind,
        });
    }

    fn record_call_edge(&mut self, call: Node<'a>, edges: &mut HashMap<(String, String), CallEdge>) {
        let Some(function_side) = call.child_by_field_name("function") else {
            return;
        };
        let Some(callee_raw) = trailing_callee_name(function_side, self.source) else {
            return;
        };
        let callee = sliver_core::types::base_type_name(callee_raw);
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
                "await_expression" => is_async = true,
                "if_statement" | "try_statement" | "ternary_expression" => is_conditional = true,
                kind if is_function_boundary(kind) => break,
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

/// Whether this identifier is the declared name of its parent node rather
/// than a use of an existing symbol.
fn is_declared_name(node: Node) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    match parent.kind() {
        "function_declaration"
        | "generator_function_declaration"
        | "class_declaration"
        | "abstract_class_declaration"
        | "interface_declaration"
        | "type_alias_declaration"
        | "enum_declaration"
        | "method_definition"
        | "variable_declarator"
        | "public_field_definition"
        | "property_signature"
        | "type_parameter" => parent
            .child_by_field_name("name")
            .is_some_and(|name| name.id() == node.id()),
        "required_parameter" | "optional_parameter" => parent
            .child_by_field_name("pattern")
            .is_some_and(|pattern| pattern.id() == node.id()),
        _ => false,
    }
}

fn reference_kind(node: Node) -> ReferenceKind {
    if node.kind() == "type_identifier" {
        return ReferenceKind::Type;
    }

    if let Some(parent) = node.parent() {
        if parent.kind() == "call_expression" {
            if let Some(function_side) = parent.child_by_field_name("function") {
                if function_side.id() == node.id() {
                    return ReferenceKind::Call;
                }
            }
        }
        if parent.kind() == "assignment_expression" {
            if let Some(left) = parent.child_by_field_name("left") {
                if left.id() == node.id() {
                    return ReferenceKind::Write;
                }
            }
        }
    }

    // Inside an import clause every identifier is an import reference.
    let mut current = node;
    while let Some(parent) = current.parent() {
        match parent.kind() {
            "import_statement" | "import_clause" | "named_imports" | "namespace_import" => {
                return ReferenceKind::Import;
            }
            "statement_block" | "program" | "class_body" => break,
            _ => current = parent,
        }
    }

    ReferenceKind::Read
}
