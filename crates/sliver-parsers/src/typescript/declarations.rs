//! Top-level declaration extraction: classes with their members, interfaces,
//! type aliases, variables, imports, and exports.

use tree_sitter::Node;

use sliver_core::id;
use sliver_core::types::{
    base_type_name, ClassData, Export, Import, ImportSpecifier, InterfaceData, InterfaceMethod,
    Location, Property, Symbol, SymbolKind, TypeAliasData, TypeRelation, TypeRelationKind,
    VariableData, VariableKeyword,
};

use super::helpers::{
    accessibility_of, decorators_of, doc_comment, end_line, has_keyword, node_text, signature_of,
    start_line, type_annotation_text, type_params_of,
};
use super::Ctx;

impl<'a> Ctx<'a> {
    pub(super) fn extract_class(&mut self, node: Node<'a>, exported: bool) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = node_text(name_node, self.source).to_string();
        let is_abstract = node.kind() == "abstract_class_declaration";

        let mut data = ClassData {
            decorators: decorators_of(node, self.source),
            type_params: type_params_of(node, self.source),
            is_abstract,
            ..Default::default()
        };

        // Heritage: extends value + implements list.
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() != "class_heritage" {
                continue;
            }
            let mut heritage_cursor = child.walk();
            for clause in child.children(&mut heritage_cursor) {
                match clause.kind() {
                    "extends_clause" => {
                        let mut c = clause.walk();
                        if let Some(value) = clause.named_children(&mut c).next() {
                            data.extends = Some(node_text(value, self.source).to_string());
                        };
                    }
                    "implements_clause" => {
                        let mut c = clause.walk();
                        for ty in clause.named_children(&mut c) {
                            data.implements.push(node_text(ty, self.source).to_string());
                        }
                    }
                    _ => {}
                }
            }
        }

        let location = Location {
            file_path: self.file_path.to_string(),
            start_line: start_line(node),
            end_line: end_line(node),
            start_col: Some(node.start_position().column as u32),
            end_col: Some(node.end_position().column as u32),
        };
        let class_id = id::symbol_id(self.file_path, &name, SymbolKind::Class, location.start_line);

        if let Some(extends) = &data.extends {
            self.type_relations.push(TypeRelation {
                id: id::type_relation_id(&class_id, extends, TypeRelationKind::Extends),
                source_id: class_id.clone(),
                source_name: name.clone(),
                target_name: extends.clone(),
                target_base_name: base_type_name(extends),
                resolved_target_id: None,
                kind: TypeRelationKind::Extends,
            });
        }
        for implemented in &data.implements {
            self.type_relations.push(TypeRelation {
                id: id::type_relation_id(&class_id, implemented, TypeRelationKind::Implements),
                source_id: class_id.clone(),
                source_name: name.clone(),
                target_name: implemented.clone(),
                target_base_name: base_type_name(implemented),
                resolved_target_id: None,
                kind: TypeRelationKind::Implements,
            });
        }

        // Members: methods become their own symbols; properties and the
        // constructor signature stay on the class record.
        if let Some(body) = node.child_by_field_name("body") {
            let mut body_cursor = body.walk();
            let members: Vec<Node> = body.named_children(&mut body_cursor).collect();
            for member in members {
                match member.kind() {
                    "method_definition" | "abstract_method_signature" => {
                        let member_name = member
                            .child_by_field_name("name")
                            .map(|n| node_text(n, self.source).to_string())
                            .unwrap_or_default();
                        if member_name == "constructor" {
                            data.constructor_signature =
                                Some(signature_of(member, self.source));
                        }
                        data.method_names.push(member_name);
                        if member.kind() == "method_definition" {
                            self.emit_method(member, &name, exported);
                        }
                    }
                    "public_field_definition" | "field_definition" => {
                        data.properties.push(self.extract_property(member));
                    }
                    _ => {}
                }
            }
        }

        let mut symbol = Symbol::class(
            class_id,
            name,
            signature_of(node, self.source),
            location,
            data,
        );
        symbol.doc = doc_comment(node, self.source);
        self.symbols.push(symbol);
    }

    fn extract_property(&mut self, node: Node<'a>) -> Property {
        let name = node
            .child_by_field_name("name")
            .map(|n| node_text(n, self.source).to_string())
            .unwrap_or_default();
        Property {
            name,
            type_text: node
                .child_by_field_name("type")
                .map(|t| type_annotation_text(t, self.source)),
            optional: node_text(node, self.source).contains("?:"),
            readonly: has_keyword(node, "readonly"),
            is_static: has_keyword(node, "static"),
            visibility: accessibility_of(node, self.source),
            default_text: node
                .child_by_field_name("value")
                .map(|v| node_text(v, self.source).to_string()),
            doc: doc_comment(node, self.source),
        }
    }

    pub(super) fn extract_interface(&mut self, node: Node<'a>, _exported: bool) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = node_text(name_node, self.source).to_string();

        let mut data = InterfaceData {
            type_params: type_params_of(node, self.source),
            ..Default::default()
        };

        // Interface extends list; the clause kind differs across grammar
        // versions, so match by suffix.
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind().contains("extends") {
                let mut c = child.walk();
                for ty in child.named_children(&mut c) {
                    let text = node_text(ty, self.source).to_string();
                    if !text.is_empty() {
                        data.extends.push(text);
                    }
                }
            }
        }

        let location = Location {
            file_path: self.file_path.to_string(),
            start_line: start_line(node),
            end_line: end_line(node),
            start_col: Some(node.start_position().column as u32),
            end_col: Some(node.end_position().column as u32),
        };
        let interface_id =
            id::symbol_id(self.file_path, &name, SymbolKind::Interface, location.start_line);

        for extended in &data.extends {
            self.type_relations.push(TypeRelation {
                id: id::type_relation_id(&interface_id, extended, TypeRelationKind::Extends),
                source_id: interface_id.clone(),
                source_name: name.clone(),
                target_name: extended.clone(),
                target_base_name: base_type_name(extended),
                resolved_target_id: None,
                kind: TypeRelationKind::Extends,
            });
        }

        if let Some(body) = node.child_by_field_name("body") {
            let mut body_cursor = body.walk();
            for member in body.named_children(&mut body_cursor) {
                match member.kind() {
                    "property_signature" => {
                        let prop_name = member
                            .child_by_field_name("name")
                            .map(|n| node_text(n, self.source).to_string())
                            .unwrap_or_default();
                        data.properties.push(Property {
                            name: prop_name,
                            type_text: member
                                .child_by_field_name("type")
                                .map(|t| type_annotation_text(t, self.source)),
                            optional: node_text(member, self.source).contains("?:"),
                            readonly: has_keyword(member, "readonly"),
                            ..Default::default()
                        });
                    }
                    "method_signature" | "construct_signature" | "call_signature" => {
                        let method_name = member
                            .child_by_field_name("name")
                            .map(|n| node_text(n, self.source).to_string())
                            .unwrap_or_default();
                        data.methods.push(InterfaceMethod {
                            name: method_name,
                            signature: signature_of(member, self.source),
                            optional: node_text(member, self.source).contains("?("),
                        });
                    }
                    _ => {}
                }
            }
        }

        let mut symbol = Symbol::interface(
            interface_id,
            name,
            signature_of(node, self.source),
            location,
            data,
        );
        symbol.doc = doc_comment(node, self.source);
        self.symbols.push(symbol);
    }

    pub(super) fn extract_type_alias(&mut self, node: Node<'a>, _exported: bool) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = node_text(name_node, self.source).to_string();
        let type_text = node
            .child_by_field_name("value")
            .map(|v| node_text(v, self.source).to_string())
            .unwrap_or_default();

        let location = Location {
            file_path: self.file_path.to_string(),
            start_line: start_line(node),
            end_line: end_line(node),
            start_col: Some(node.start_position().column as u32),
            end_col: Some(node.end_position().column as u32),
        };
        let mut symbol = Symbol::type_alias(
            id::symbol_id(self.file_path, &name, SymbolKind::TypeAlias, location.start_line),
            name,
            signature_of(node, self.source),
            location,
            TypeAliasData {
                type_text,
                type_params: type_params_of(node, self.source),
            },
        );
        symbol.doc = doc_comment(node, self.source);
        self.symbols.push(symbol);
    }

    /// Non-function variable bindings. Only exported ones and top-level
    /// `const` bindings are emitted; local mutables are noise.
    pub(super) fn extract_variables(&mut self, declaration: Node<'a>, exported: bool) {
        let keyword = match declaration.kind() {
            "variable_declaration" => VariableKeyword::Var,
            _ if node_text(declaration, self.source).starts_with("let") => VariableKeyword::Let,
            _ => VariableKeyword::Const,
        };

        let mut cursor = declaration.walk();
        let declarators: Vec<Node> = declaration
            .named_children(&mut cursor)
            .filter(|c| c.kind() == "variable_declarator")
            .collect();
        for declarator in declarators {
            let Some(name_node) = declarator.child_by_field_name("name") else {
                continue;
            };
            if name_node.kind() != "identifier" {
                continue;
            }
            let value_is_function = declarator
                .child_by_field_name("value")
                .is_some_and(|v| {
                    matches!(v.kind(), "arrow_function" | "function_expression" | "function")
                });
            if value_is_function {
                continue;
            }
            let name = node_text(name_node, self.source).to_string();
            let location = Location {
                file_path: self.file_path.to_string(),
                start_line: start_line(declarator),
                end_line: end_line(declarator),
                start_col: Some(declarator.start_position().column as u32),
                end_col: Some(declarator.end_position().column as u32),
            };
            let symbol = Symbol::variable(
                id::symbol_id(self.file_path, &name, SymbolKind::Variable, location.start_line),
                name,
                signature_of(declarator, self.source),
                location,
                VariableData {
                    keyword,
                    type_text: declarator
                        .child_by_field_name("type")
                        .map(|t| type_annotation_text(t, self.source)),
                    exported,
                },
            );
            self.symbols.push(symbol);
        }
    }

    pub(super) fn extract_import(&mut self, node: Node<'a>) {
        let Some(source_node) = node.child_by_field_name("source") else {
            return;
        };
        let module = node_text(source_node, self.source)
            .trim_matches(|c| c == '"' || c == '\'')
            .to_string();

        let mut specifiers = Vec::new();
        let type_only = {
            let mut cursor = node.walk();
            let result = node.children(&mut cursor)
                .any(|c| c.kind() == "type" || node_text(c, self.source) == "type");
            result
        };

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() != "import_clause" {
                continue;
            }
            let mut clause_cursor = child.walk();
            for part in child.named_children(&mut clause_cursor) {
                match part.kind() {
                    "identifier" => specifiers.push(ImportSpecifier {
                        name: node_text(part, self.source).to_string(),
                        is_default: true,
                        ..Default::default()
                    }),
                    "namespace_import" => {
                        let mut ns_cursor = part.walk();
                        if let Some(alias) = part
                            .named_children(&mut ns_cursor)
                            .find(|c| c.kind() == "identifier")
                        {
                            specifiers.push(ImportSpecifier {
                                name: "*".to_string(),
                                alias: Some(node_text(alias, self.source).to_string()),
                                is_namespace: true,
                                ..Default::default()
                            });
                        };
                    }
                    "named_imports" => {
                        let mut named_cursor = part.walk();
                        for spec in part.named_children(&mut named_cursor) {
                            if spec.kind() != "import_specifier" {
                                continue;
                            }
                            let spec_name = spec
                                .child_by_field_name("name")
                                .map(|n| node_text(n, self.source).to_string())
                                .unwrap_or_default();
                            let alias = spec
                                .child_by_field_name("alias")
                                .map(|n| node_text(n, self.source).to_string());
                            specifiers.push(ImportSpecifier {
                                name: spec_name,
                                alias,
                                ..Default::default()
                            });
                        }
                    }
                    _ => {}
                }
            }
        }

        self.imports.push(Import {
            module,
            specifiers,
            type_only,
            line: start_line(node),
            resolved_path: None,
            is_external: false,
            is_reexport: false,
        });
    }

    /// `export ...` statements: exported declarations recurse back into the
    /// module walk with the export flag; clause and star forms produce
    /// export (and re-export import) records.
    pub(super) fn extract_export(&mut self, node: Node<'a>) {
        let is_default = has_keyword(node, "default");
        let source_module = node.child_by_field_name("source").map(|s| {
            node_text(s, self.source)
                .trim_matches(|c| c == '"' || c == '\'')
                .to_string()
        });

        if let Some(declaration) = node.child_by_field_name("declaration") {
            self.extract_statement(declaration, true);
            // Name the export after the declared symbol.
            let declared = declaration
                .child_by_field_name("name")
                .map(|n| node_text(n, self.source).to_string());
            if let Some(name) = declared {
                self.exports.push(Export {
                    name,
                    is_default,
                    is_reexport: false,
                    source_module: None,
                    resolved_source_path: None,
                    line: start_line(node),
                });
            } else if declaration.kind() == "lexical_declaration"
                || declaration.kind() == "variable_declaration"
            {
                let mut cursor = declaration.walk();
                let names: Vec<String> = declaration
                    .named_children(&mut cursor)
                    .filter(|c| c.kind() == "variable_declarator")
                    .filter_map(|d| d.child_by_field_name("name"))
                    .map(|n| node_text(n, self.source).to_string())
                    .collect();
                for name in names {
                    self.exports.push(Export {
                        name,
                        is_default,
                        is_reexport: false,
                        source_module: None,
                        resolved_source_path: None,
                        line: start_line(node),
                    });
                }
            }
            return;
        }

        let mut found_clause = false;
        let mut cursor = node.walk();
        let clauses: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in clauses {
            if child.kind() != "export_clause" {
                continue;
            }
            found_clause = true;
            let mut clause_cursor = child.walk();
            for spec in child.named_children(&mut clause_cursor) {
                if spec.kind() != "export_specifier" {
                    continue;
                }
                let name = spec
                    .child_by_field_name("alias")
                    .or_else(|| spec.child_by_field_name("name"))
                    .map(|n| node_text(n, self.source).to_string())
                    .unwrap_or_default();
                self.exports.push(Export {
                    name,
                    is_default: false,
                    is_reexport: source_module.is_some(),
                    source_module: source_module.clone(),
                    resolved_source_path: None,
                    line: start_line(node),
                });
            }
        }

        // `export * from './x'`
        if !found_clause {
            if let Some(module) = &source_module {
                self.exports.push(Export {
                    name: "*".to_string(),
                    is_default: false,
                    is_reexport: true,
                    source_module: Some(module.clone()),
                    resolved_source_path: None,
                    line: start_line(node),
                });
            } else if is_default {
                // `export default <expression>`
                self.exports.push(Export {
                    name: "default".to_string(),
                    is_default: true,
                    is_reexport: false,
                    source_module: None,
                    resolved_source_path: None,
                    line: start_line(node),
                });
            }
        }

        // Re-exports also act as imports of the source module.
        if let Some(module) = source_module {
            self.imports.push(Import {
                module,
                specifiers: Vec::new(),
                type_only: false,
                line: start_line(node),
                resolved_path: None,
                is_external: false,
                is_reexport: true,
            });
        }
    }
}
