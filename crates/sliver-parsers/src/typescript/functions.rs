//! Function, nested-function, and callback extraction.
//!
//! The walk owns the attribution rules: a nested function is attached to its
//! nearest emitted ancestor, recursion into an emitted function's body always
//! re-parents to that function, and anonymous literals the walk does not emit
//! are traversed transparently.

use tree_sitter::Node;

use sliver_core::id;
use sliver_core::types::{FunctionData, Location, Modifiers, Symbol, SymbolKind};

use super::helpers::{
    doc_comment, end_line, extract_params, first_string_argument, has_keyword, node_text,
    return_type_of, signature_of, slugify, start_line, trailing_callee_name, type_params_of,
};
use super::Ctx;

/// Call names whose function-literal arguments are test-framework callbacks;
/// the callback is named after the first string argument.
const TEST_CALLERS: &[&str] = &[
    "describe", "it", "test", "beforeEach", "afterEach", "beforeAll", "afterAll", "before",
    "after", "suite", "spec", "context",
];

/// Call names registering event handlers; the first string argument is the
/// event name and lands in the callback context.
const EVENT_CALLERS: &[&str] = &["on", "once", "addEventListener"];

/// Remaining callback-shaped methods.
const OTHER_CALLERS: &[&str] = &[
    "then", "catch", "finally", "action", "command", "option", "use", "subscribe", "handle",
];

/// Array iteration methods whose literals are not worth indexing.
const BLOCKED_CALLERS: &[&str] = &[
    "map", "filter", "reduce", "forEach", "find", "some", "every", "flatMap", "sort",
    "findIndex", "reduceRight",
];

fn is_callback_caller(name: &str) -> bool {
    TEST_CALLERS.contains(&name) || EVENT_CALLERS.contains(&name) || OTHER_CALLERS.contains(&name)
}

fn is_function_literal(kind: &str) -> bool {
    matches!(kind, "arrow_function" | "function_expression" | "function")
}

impl<'a> Ctx<'a> {
    /// Walk statements looking for functions to attribute to
    /// `parent_qualified`. `depth` is the nesting depth any function found
    /// here would receive.
    pub(super) fn walk_for_functions(
        &mut self,
        node: Node<'a>,
        parent_qualified: Option<&str>,
        depth: u32,
    ) {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children {
            self.visit_for_functions(child, parent_qualified, depth);
        }
    }

    fn visit_for_functions(&mut self, node: Node<'a>, parent_qualified: Option<&str>, depth: u32) {
        match node.kind() {
            "function_declaration" | "generator_function_declaration" => {
                let name = node
                    .child_by_field_name("name")
                    .map(|n| node_text(n, self.source).to_string());
                if let Some(name) = name {
                    self.emit_function(node, node, &name, parent_qualified, depth, None, false);
                }
                // The recursive emit owns this subtree; do not keep walking
                // under the current parent.
            }
            "lexical_declaration" | "variable_declaration" => {
                self.visit_declarators(node, parent_qualified, depth);
            }
            "call_expression" => {
                self.visit_call_arguments(node, parent_qualified, depth);
            }
            kind if is_function_literal(kind) => {
                // Anonymous literal outside a recognized callback position:
                // traverse transparently, keeping the current attribution.
                self.walk_for_functions(node, parent_qualified, depth);
            }
            _ => {
                self.walk_for_functions(node, parent_qualified, depth);
            }
        }
    }

    /// `const f = () => {}` and friends, at any depth.
    pub(super) fn visit_declarators(
        &mut self,
        declaration: Node<'a>,
        parent_qualified: Option<&str>,
        depth: u32,
    ) {
        let mut cursor = declaration.walk();
        let declarators: Vec<Node> = declaration
            .named_children(&mut cursor)
            .filter(|c| c.kind() == "variable_declarator")
            .collect();
        for declarator in declarators {
            let value = declarator.child_by_field_name("value");
            let name = declarator
                .child_by_field_name("name")
                .map(|n| node_text(n, self.source).to_string());
            match (name, value) {
                (Some(name), Some(value)) if is_function_literal(value.kind()) => {
                    self.emit_function(
                        declarator,
                        value,
                        &name,
                        parent_qualified,
                        depth,
                        None,
                        false,
                    );
                }
                (_, Some(value)) => {
                    self.walk_for_functions(value, parent_qualified, depth);
                }
                _ => {}
            }
        }
    }

    /// Function literals passed as arguments to a recognized call.
    fn visit_call_arguments(
        &mut self,
        call: Node<'a>,
        parent_qualified: Option<&str>,
        depth: u32,
    ) {
        let callee = call
            .child_by_field_name("function")
            .and_then(|f| trailing_callee_name(f, self.source))
            .unwrap_or("");

        // Walk the callee side (chained calls live there).
        if let Some(function_side) = call.child_by_field_name("function") {
            self.walk_for_functions(function_side, parent_qualified, depth);
        }

        let Some(args) = call.child_by_field_name("arguments") else {
            return;
        };
        let mut cursor = args.walk();
        let arg_nodes: Vec<Node> = args.named_children(&mut cursor).collect();
        for arg in arg_nodes {
            if !is_function_literal(arg.kind()) {
                self.walk_for_functions(arg, parent_qualified, depth);
                continue;
            }
            let blocked = BLOCKED_CALLERS.contains(&callee);
            if blocked || !is_callback_caller(callee) {
                // Not a recognized callback: the literal is transparent.
                self.walk_for_functions(arg, parent_qualified, depth);
                continue;
            }
            self.emit_callback(call, arg, callee, parent_qualified, depth);
        }
    }

    /// Emit a named function (declaration or binding) and recurse into its
    /// body with the new function as parent.
    #[allow(clippy::too_many_arguments)]
    fn emit_function(
        &mut self,
        decl_node: Node<'a>,
        fn_node: Node<'a>,
        name: &str,
        parent_qualified: Option<&str>,
        depth: u32,
        parent_class: Option<&str>,
        exported: bool,
    ) {
        if depth > self.options.max_nesting_depth {
            return;
        }
        let lines = end_line(fn_node).saturating_sub(start_line(decl_node)) + 1;
        if depth > 0 && lines < self.options.min_nested_lines {
            return;
        }
        let is_private = name.starts_with('_');
        if is_private && !self.options.include_private {
            return;
        }

        let qualified = match parent_qualified {
            Some(parent) => format!("{parent}.{name}"),
            None => name.to_string(),
        };
        let body = fn_node.child_by_field_name("body");
        let location = Location {
            file_path: self.file_path.to_string(),
            start_line: start_line(decl_node),
            end_line: end_line(fn_node),
            start_col: Some(decl_node.start_position().column as u32),
            end_col: Some(fn_node.end_position().column as u32),
        };
        let modifiers = Modifiers {
            is_async: has_keyword(fn_node, "async") || has_keyword(decl_node, "async"),
            is_generator: fn_node.kind() == "generator_function_declaration"
                || has_keyword(fn_node, "*"),
            is_exported: exported,
            is_private,
            ..Default::default()
        };
        let data = FunctionData {
            params: extract_params(fn_node, self.source),
            return_type: return_type_of(fn_node, self.source),
            modifiers,
            parent_class: parent_class.map(String::from),
            parent_function: parent_qualified.map(String::from),
            nesting_depth: depth,
            local_name: name.to_string(),
            decorators: Vec::new(),
            type_params: type_params_of(fn_node, self.source),
        };
        let mut symbol = Symbol::function(
            id::symbol_id(self.file_path, &qualified, SymbolKind::Function, location.start_line),
            name.to_string(),
            qualified.clone(),
            SymbolKind::Function,
            super::helpers::signature_with_body(decl_node, body, self.source),
            location,
            data,
        );
        symbol.doc = doc_comment(decl_node, self.source);
        self.symbols.push(symbol);

        if let Some(body) = body {
            self.walk_for_functions(body, Some(&qualified), depth + 1);
        }
    }

    /// Emit a callback literal recognized from its enclosing call.
    fn emit_callback(
        &mut self,
        call: Node<'a>,
        literal: Node<'a>,
        callee: &str,
        parent_qualified: Option<&str>,
        depth: u32,
    ) {
        if depth > self.options.max_nesting_depth {
            return;
        }
        let span = (start_line(literal), end_line(literal));
        if !self.callback_spans.insert(span) {
            return;
        }

        let string_arg = first_string_argument(call, self.source);
        let (name, context) = if TEST_CALLERS.contains(&callee) {
            let name = string_arg
                .as_deref()
                .map(|s| slugify(s, 60))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("{callee}_callback_{}", span.0));
            (name, callee.to_string())
        } else if EVENT_CALLERS.contains(&callee) {
            let context = string_arg.clone().unwrap_or_else(|| callee.to_string());
            let name = string_arg
                .as_deref()
                .map(|s| slugify(s, 60))
                .filter(|s| !s.is_empty())
                .map(|s| format!("{callee} {s}"))
                .unwrap_or_else(|| format!("{callee}_callback_{}", span.0));
            (name, context)
        } else {
            (format!("{callee}_callback_{}", span.0), callee.to_string())
        };

        let qualified = match parent_qualified {
            Some(parent) => format!("{parent}.{name}"),
            None => name.clone(),
        };
        let location = Location {
            file_path: self.file_path.to_string(),
            start_line: span.0,
            end_line: span.1,
            start_col: Some(literal.start_position().column as u32),
            end_col: Some(literal.end_position().column as u32),
        };
        let modifiers = Modifiers {
            is_async: has_keyword(literal, "async"),
            callback_context: Some(context),
            ..Default::default()
        };
        let data = FunctionData {
            params: extract_params(literal, self.source),
            return_type: return_type_of(literal, self.source),
            modifiers,
            parent_class: None,
            parent_function: parent_qualified.map(String::from),
            nesting_depth: depth,
            local_name: name.clone(),
            decorators: Vec::new(),
            type_params: Vec::new(),
        };
        let symbol = Symbol::function(
            id::symbol_id(self.file_path, &qualified, SymbolKind::Callback, span.0),
            name,
            qualified.clone(),
            SymbolKind::Callback,
            signature_of(literal, self.source),
            location,
            data,
        );
        self.symbols.push(symbol);

        if let Some(body) = literal.child_by_field_name("body") {
            self.walk_for_functions(body, Some(&qualified), depth + 1);
        }
    }

    /// Emit a top-level function reached from the module walk, carrying the
    /// export flag.
    pub(super) fn emit_top_level_function(&mut self, node: Node<'a>, exported: bool) {
        let name = node
            .child_by_field_name("name")
            .map(|n| node_text(n, self.source).to_string());
        if let Some(name) = name {
            self.emit_function(node, node, &name, None, 0, None, exported);
        }
    }

    /// Emit a top-level `const f = ...` function binding with export flag.
    pub(super) fn emit_top_level_binding(&mut self, declaration: Node<'a>, exported: bool) -> bool {
        let mut emitted_any = false;
        let mut cursor = declaration.walk();
        let declarators: Vec<Node> = declaration
            .named_children(&mut cursor)
            .filter(|c| c.kind() == "variable_declarator")
            .collect();
        for declarator in declarators {
            let value = declarator.child_by_field_name("value");
            let name = declarator
                .child_by_field_name("name")
                .map(|n| node_text(n, self.source).to_string());
            if let (Some(name), Some(value)) = (name, value) {
                if is_function_literal(value.kind()) {
                    self.emit_function(declarator, value, &name, None, 0, None, exported);
                    emitted_any = true;
                } else {
                    self.walk_for_functions(value, None, 0);
                }
            }
        }
        emitted_any
    }

    /// Emit a class method or constructor, then scan its body for nested
    /// functions parented to `Class.method`.
    pub(super) fn emit_method(&mut self, node: Node<'a>, class_name: &str, class_exported: bool) {
        use super::helpers::accessibility_of;
        use sliver_core::types::Visibility;

        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = node_text(name_node, self.source).to_string();
        let kind = if name == "constructor" {
            SymbolKind::Constructor
        } else {
            SymbolKind::Method
        };
        let visibility = accessibility_of(node, self.source);
        let is_private = visibility == Visibility::Private || name.starts_with('_');
        if is_private && !self.options.include_private {
            return;
        }

        let qualified = format!("{class_name}.{name}");
        let location = Location {
            file_path: self.file_path.to_string(),
            start_line: start_line(node),
            end_line: end_line(node),
            start_col: Some(node.start_position().column as u32),
            end_col: Some(node.end_position().column as u32),
        };
        let modifiers = Modifiers {
            is_async: has_keyword(node, "async"),
            is_static: has_keyword(node, "static"),
            is_generator: has_keyword(node, "*"),
            is_abstract: has_keyword(node, "abstract"),
            is_private,
            is_protected: visibility == Visibility::Protected,
            is_exported: class_exported,
            ..Default::default()
        };
        let data = FunctionData {
            params: extract_params(node, self.source),
            return_type: return_type_of(node, self.source),
            modifiers,
            parent_class: Some(class_name.to_string()),
            parent_function: None,
            nesting_depth: 0,
            local_name: name.clone(),
            decorators: super::helpers::decorators_of(node, self.source),
            type_params: type_params_of(node, self.source),
        };
        let mut symbol = Symbol::function(
            id::symbol_id(self.file_path, &qualified, kind, location.start_line),
            name,
            qualified.clone(),
            kind,
            signature_of(node, self.source),
            location,
            data,
        );
        symbol.doc = doc_comment(node, self.source);
        self.symbols.push(symbol);

        if let Some(body) = node.child_by_field_name("body") {
            self.walk_for_functions(body, Some(&qualified), 1);
        }
    }
}
