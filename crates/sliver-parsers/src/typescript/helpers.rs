//! Shared node utilities for the TypeScript/JavaScript parser.

use tree_sitter::Node;

use sliver_core::types::{Param, Visibility};

pub fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

pub fn start_line(node: Node) -> u32 {
    node.start_position().row as u32 + 1
}

pub fn end_line(node: Node) -> u32 {
    node.end_position().row as u32 + 1
}

pub fn start_col(node: Node) -> u32 {
    node.start_position().column as u32
}

/// Source line the node starts on, trimmed. Used for reference snippets.
pub fn line_snippet(source: &str, line: u32) -> String {
    source
        .lines()
        .nth(line.saturating_sub(1) as usize)
        .unwrap_or("")
        .trim()
        .to_string()
}

/// One-line signature: declaration text up to (not including) the body,
/// whitespace collapsed and capped.
pub fn signature_of(node: Node, source: &[u8]) -> String {
    signature_with_body(node, node.child_by_field_name("body"), source)
}

/// Signature computed from an explicit (declaration, body) pair; used when
/// the body belongs to a different node than the declaration (arrow
/// function bindings).
pub fn signature_with_body(node: Node, body: Option<Node>, source: &[u8]) -> String {
    let head_end = body.map(|b| b.start_byte()).unwrap_or_else(|| node.end_byte());
    let head_end = head_end.max(node.start_byte());
    let slice = &source[node.start_byte()..head_end];
    let text = std::str::from_utf8(slice).unwrap_or("");
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed
        .trim_end_matches('{')
        .trim_end()
        .trim_end_matches("=>")
        .trim_end();
    truncate(trimmed, 200)
}

pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max).collect()
}

/// Leading `/** ... */` or `//` comment block directly above a declaration.
/// Exported declarations look above their wrapping export statement.
pub fn doc_comment(node: Node, source: &[u8]) -> Option<String> {
    if let Some(found) = doc_comment_above(node, source) {
        return Some(found);
    }
    let parent = node.parent()?;
    if parent.kind() == "export_statement" {
        return doc_comment_above(parent, source);
    }
    None
}

fn doc_comment_above(node: Node, source: &[u8]) -> Option<String> {
    let mut sibling = node.prev_sibling()?;
    // Decorators sit between the doc comment and the declaration.
    while sibling.kind() == "decorator" {
        sibling = sibling.prev_sibling()?;
    }
    if sibling.kind() != "comment" {
        return None;
    }
    if sibling.end_position().row + 1 < node.start_position().row {
        return None;
    }
    let raw = node_text(sibling, source);
    let cleaned = clean_comment(raw);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn clean_comment(raw: &str) -> String {
    raw.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches("/**")
                .trim_start_matches("/*")
                .trim_end_matches("*/")
                .trim_start_matches("//")
                .trim_start_matches('*')
                .trim()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the parameter list of a function-like node.
pub fn extract_params(node: Node, source: &[u8]) -> Vec<Param> {
    let mut params = Vec::new();

    // Arrow functions with a single bare parameter use the `parameter` field.
    if let Some(single) = node.child_by_field_name("parameter") {
        params.push(Param {
            name: node_text(single, source).to_string(),
            ..Default::default()
        });
        return params;
    }

    let Some(list) = node.child_by_field_name("parameters") else {
        return params;
    };

    let mut cursor = list.walk();
    for child in list.named_children(&mut cursor) {
        match child.kind() {
            "required_parameter" | "optional_parameter" => {
                let pattern = child.child_by_field_name("pattern");
                let rest = pattern.is_some_and(|p| p.kind() == "rest_pattern");
                let name = pattern
                    .map(|p| {
                        node_text(p, source)
                            .trim_start_matches("...")
                            .to_string()
                    })
                    .unwrap_or_default();
                let type_text = child
                    .child_by_field_name("type")
                    .map(|t| type_annotation_text(t, source));
                let default_text = child
                    .child_by_field_name("value")
                    .map(|v| node_text(v, source).to_string());
                params.push(Param {
                    name,
                    optional: child.kind() == "optional_parameter" || default_text.is_some(),
                    rest,
                    type_text,
                    default_text,
                    doc: None,
                });
            }
            "identifier" => {
                params.push(Param {
                    name: node_text(child, source).to_string(),
                    ..Default::default()
                });
            }
            "rest_pattern" => {
                params.push(Param {
                    name: node_text(child, source).trim_start_matches("...").to_string(),
                    rest: true,
                    ..Default::default()
                });
            }
            _ => {}
        }
    }
    params
}

/// Text of a `type_annotation` node without the leading colon.
pub fn type_annotation_text(node: Node, source: &[u8]) -> String {
    let text = node_text(node, source).trim().to_string();
    text.trim_start_matches(':').trim().to_string()
}

pub fn return_type_of(node: Node, source: &[u8]) -> Option<String> {
    node.child_by_field_name("return_type")
        .map(|t| type_annotation_text(t, source))
}

/// Names of declared type parameters, e.g. `<T, U extends V>` → ["T", "U extends V"].
pub fn type_params_of(node: Node, source: &[u8]) -> Vec<String> {
    let Some(list) = node.child_by_field_name("type_parameters") else {
        return Vec::new();
    };
    let mut cursor = list.walk();
    list.named_children(&mut cursor)
        .map(|child| node_text(child, source).to_string())
        .collect()
}

/// Decorator texts attached directly before a declaration node.
pub fn decorators_of(node: Node, source: &[u8]) -> Vec<String> {
    let mut decorators = Vec::new();
    // Decorators are preceding siblings of the declaration...
    let mut sibling = node.prev_sibling();
    while let Some(s) = sibling {
        if s.kind() == "decorator" {
            decorators.push(node_text(s, source).to_string());
            sibling = s.prev_sibling();
        } else {
            break;
        }
    }
    decorators.reverse();
    // ...or leading children on class members.
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "decorator" {
            decorators.push(node_text(child, source).to_string());
        }
    }
    decorators
}

/// Modifier keywords that appear as leading children of a node.
pub fn has_keyword(node: Node, keyword: &str) -> bool {
    let mut cursor = node.walk();
    let result = node.children(&mut cursor).any(|c| c.kind() == keyword);
    result
}

pub fn accessibility_of(node: Node, source: &[u8]) -> Visibility {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "accessibility_modifier" {
            return match node_text(child, source) {
                "private" => Visibility::Private,
                "protected" => Visibility::Protected,
                _ => Visibility::Public,
            };
        }
    }
    Visibility::Public
}

/// Synthesize a callback name from a test description: keep letters, digits
/// and single spaces, cap at 60 characters.
pub fn slugify(text: &str, max: usize) -> String {
    let filtered: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '_' || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect();
    let collapsed = filtered.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate(&collapsed, max)
}

/// First string literal among a call's arguments, unquoted.
pub fn first_string_argument(call: Node, source: &[u8]) -> Option<String> {
    let args = call.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    for arg in args.named_children(&mut cursor) {
        if arg.kind() == "string" {
            let raw = node_text(arg, source);
            return Some(raw.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string());
        }
    }
    None
}

/// Trailing identifier of a call target: `a.b.c` → `c`, `foo` → `foo`.
pub fn trailing_callee_name<'a>(function_node: Node<'a>, source: &'a [u8]) -> Option<&'a str> {
    match function_node.kind() {
        "identifier" => Some(node_text(function_node, source)),
        "member_expression" => {
            let property = function_node.child_by_field_name("property")?;
            Some(node_text(property, source))
        }
        // `foo!()` / `foo as T` style wrappers: unwrap the inner expression.
        "non_null_expression" | "as_expression" | "parenthesized_expression" => {
            let mut cursor = function_node.walk();
            let inner = function_node.named_children(&mut cursor).next()?;
            trailing_callee_name(inner, source)
        }
        _ => None,
    }
}
