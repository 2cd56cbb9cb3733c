use serde::{Deserialize, Serialize};

/// Source languages the indexer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Typescript,
    Javascript,
    Python,
    Config,
}

impl Language {
    /// Returns the lowercase string representation of this language.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Typescript => "typescript",
            Language::Javascript => "javascript",
            Language::Python => "python",
            Language::Config => "config",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "typescript" => Some(Language::Typescript),
            "javascript" => Some(Language::Javascript),
            "python" => Some(Language::Python),
            "config" => Some(Language::Config),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much of a file the parser managed to process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStatus {
    Complete,
    Partial,
    Skipped,
}

impl ParseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseStatus::Complete => "complete",
            ParseStatus::Partial => "partial",
            ParseStatus::Skipped => "skipped",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "complete" => Some(ParseStatus::Complete),
            "partial" => Some(ParseStatus::Partial),
            "skipped" => Some(ParseStatus::Skipped),
            _ => None,
        }
    }
}

/// Reason a file was only partially indexed or skipped entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningCode {
    FileTooLarge,
    ParseError,
    Timeout,
}

impl WarningCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCode::FileTooLarge => "FILE_TOO_LARGE",
            WarningCode::ParseError => "PARSE_ERROR",
            WarningCode::Timeout => "TIMEOUT",
        }
    }
}

/// A diagnostic attached to a file record, never raised as an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseWarning {
    pub code: WarningCode,
    pub message: String,
}

impl ParseWarning {
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Symbol variants extracted from source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Constructor,
    Callback,
    Class,
    Interface,
    TypeAlias,
    Variable,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Constructor => "constructor",
            SymbolKind::Callback => "callback",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::TypeAlias => "type_alias",
            SymbolKind::Variable => "variable",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "function" => Some(SymbolKind::Function),
            "method" => Some(SymbolKind::Method),
            "constructor" => Some(SymbolKind::Constructor),
            "callback" => Some(SymbolKind::Callback),
            "class" => Some(SymbolKind::Class),
            "interface" => Some(SymbolKind::Interface),
            "type_alias" => Some(SymbolKind::TypeAlias),
            "variable" => Some(SymbolKind::Variable),
            _ => None,
        }
    }

    /// True for the function-shaped variants that carry `FunctionData`.
    pub fn is_function_like(&self) -> bool {
        matches!(
            self,
            SymbolKind::Function
                | SymbolKind::Method
                | SymbolKind::Constructor
                | SymbolKind::Callback
        )
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source location of a symbol. Lines are 1-based; columns are byte offsets
/// from the start of the line when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    #[serde(default)]
    pub start_col: Option<u32>,
    #[serde(default)]
    pub end_col: Option<u32>,
}

impl Location {
    pub fn new(file_path: impl Into<String>, start_line: u32, end_line: u32) -> Self {
        Self {
            file_path: file_path.into(),
            start_line,
            end_line,
            start_col: None,
            end_col: None,
        }
    }

    pub fn line_count(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// A single parameter of a function or method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default)]
    pub type_text: Option<String>,
    #[serde(default)]
    pub default_text: Option<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub rest: bool,
    #[serde(default)]
    pub doc: Option<String>,
}

/// Modifier flags on a function-like symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub is_async: bool,
    #[serde(default)]
    pub is_exported: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_protected: bool,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_generator: bool,
    /// For callbacks: the enclosing call's function name or the event name.
    #[serde(default)]
    pub callback_context: Option<String>,
}

/// Member visibility on classes and interfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Protected,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Protected => "protected",
        }
    }
}

/// A property of a class or interface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(default)]
    pub type_text: Option<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub default_text: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
}

/// Variant payload for function, method, constructor, and callback symbols.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionData {
    pub params: Vec<Param>,
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Name of the enclosing class for methods and constructors.
    #[serde(default)]
    pub parent_class: Option<String>,
    /// Qualified name of the enclosing function for nested functions.
    #[serde(default)]
    pub parent_function: Option<String>,
    /// 0 for top-level functions, 1..=3 for nested ones.
    #[serde(default)]
    pub nesting_depth: u32,
    /// The unqualified name as written at the declaration site.
    #[serde(default)]
    pub local_name: String,
    #[serde(default)]
    pub decorators: Vec<String>,
    #[serde(default)]
    pub type_params: Vec<String>,
}

/// Variant payload for class symbols. Methods are separate symbols with
/// `parent_class` set; this record keeps their declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassData {
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub implements: Vec<String>,
    #[serde(default)]
    pub method_names: Vec<String>,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub constructor_signature: Option<String>,
    #[serde(default)]
    pub decorators: Vec<String>,
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default)]
    pub is_abstract: bool,
}

/// A method signature declared on an interface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceMethod {
    pub name: String,
    pub signature: String,
    #[serde(default)]
    pub optional: bool,
}

/// Variant payload for interface symbols.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceData {
    #[serde(default)]
    pub extends: Vec<String>,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub methods: Vec<InterfaceMethod>,
    #[serde(default)]
    pub type_params: Vec<String>,
}

/// Variant payload for type alias symbols.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeAliasData {
    pub type_text: String,
    #[serde(default)]
    pub type_params: Vec<String>,
}

/// Declaration keyword of a variable binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKeyword {
    #[default]
    Const,
    Let,
    Var,
}

impl VariableKeyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKeyword::Const => "const",
            VariableKeyword::Let => "let",
            VariableKeyword::Var => "var",
        }
    }
}

/// Variant payload for variable symbols.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableData {
    #[serde(default)]
    pub keyword: VariableKeyword,
    #[serde(default)]
    pub type_text: Option<String>,
    #[serde(default)]
    pub exported: bool,
}

/// Kind-specific payload of a [`Symbol`]. The four function-shaped kinds
/// share `FunctionData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum SymbolData {
    Function(FunctionData),
    Class(ClassData),
    Interface(InterfaceData),
    TypeAlias(TypeAliasData),
    Variable(VariableData),
}

/// A named entity extracted from source: function, method, constructor,
/// callback, class, interface, type alias, or variable.
///
/// One storage shape carries all common fields plus a kind tag and the
/// variant payload, so downstream consumers cannot disagree about field
/// presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    /// Deterministic ID derived from (file, qualified name, kind, start line).
    pub id: String,
    /// Simple name (e.g. `handler`).
    pub name: String,
    /// Dotted path unique within the file (e.g. `Router.handler`).
    pub qualified_name: String,
    pub kind: SymbolKind,
    /// One-line rendering of the declaration.
    pub signature: String,
    pub location: Location,
    #[serde(default)]
    pub doc: Option<String>,
    pub data: SymbolData,
}

impl Symbol {
    pub fn function(
        id: String,
        name: String,
        qualified_name: String,
        kind: SymbolKind,
        signature: String,
        location: Location,
        data: FunctionData,
    ) -> Self {
        debug_assert!(kind.is_function_like());
        Symbol {
            id,
            name,
            qualified_name,
            kind,
            signature,
            location,
            doc: None,
            data: SymbolData::Function(data),
        }
    }

    pub fn class(
        id: String,
        name: String,
        signature: String,
        location: Location,
        data: ClassData,
    ) -> Self {
        Symbol {
            id,
            qualified_name: name.clone(),
            name,
            kind: SymbolKind::Class,
            signature,
            location,
            doc: None,
            data: SymbolData::Class(data),
        }
    }

    pub fn interface(
        id: String,
        name: String,
        signature: String,
        location: Location,
        data: InterfaceData,
    ) -> Self {
        Symbol {
            id,
            qualified_name: name.clone(),
            name,
            kind: SymbolKind::Interface,
            signature,
            location,
            doc: None,
            data: SymbolData::Interface(data),
        }
    }

    pub fn type_alias(
        id: String,
        name: String,
        signature: String,
        location: Location,
        data: TypeAliasData,
    ) -> Self {
        Symbol {
            id,
            qualified_name: name.clone(),
            name,
            kind: SymbolKind::TypeAlias,
            signature,
            location,
            doc: None,
            data: SymbolData::TypeAlias(data),
        }
    }

    pub fn variable(
        id: String,
        name: String,
        signature: String,
        location: Location,
        data: VariableData,
    ) -> Self {
        Symbol {
            id,
            qualified_name: name.clone(),
            name,
            kind: SymbolKind::Variable,
            signature,
            location,
            doc: None,
            data: SymbolData::Variable(data),
        }
    }

    pub fn as_function(&self) -> Option<&FunctionData> {
        match &self.data {
            SymbolData::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassData> {
        match &self.data {
            SymbolData::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_interface(&self) -> Option<&InterfaceData> {
        match &self.data {
            SymbolData::Interface(i) => Some(i),
            _ => None,
        }
    }

    /// Local name for function-like symbols, simple name otherwise.
    pub fn local_name(&self) -> &str {
        match &self.data {
            SymbolData::Function(f) if !f.local_name.is_empty() => &f.local_name,
            _ => &self.name,
        }
    }

    /// Nesting depth for function-like symbols, 0 otherwise.
    pub fn nesting_depth(&self) -> u32 {
        match &self.data {
            SymbolData::Function(f) => f.nesting_depth,
            _ => 0,
        }
    }

    /// Enclosing function qualified name for nested functions.
    pub fn parent_function(&self) -> Option<&str> {
        match &self.data {
            SymbolData::Function(f) => f.parent_function.as_deref(),
            _ => None,
        }
    }
}

/// One name brought in by an import statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSpecifier {
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_namespace: bool,
}

/// An import statement. `resolved_path` is filled by the import resolver;
/// external and built-in modules stay unresolved with `is_external` set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Import {
    pub module: String,
    #[serde(default)]
    pub specifiers: Vec<ImportSpecifier>,
    #[serde(default)]
    pub type_only: bool,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub resolved_path: Option<String>,
    #[serde(default)]
    pub is_external: bool,
    #[serde(default)]
    pub is_reexport: bool,
}

/// An exported name, possibly re-exported from another module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Export {
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_reexport: bool,
    #[serde(default)]
    pub source_module: Option<String>,
    #[serde(default)]
    pub resolved_source_path: Option<String>,
    #[serde(default)]
    pub line: u32,
}

/// The flavour of a reference occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Call,
    Read,
    Write,
    Type,
    Import,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Call => "call",
            ReferenceKind::Read => "read",
            ReferenceKind::Write => "write",
            ReferenceKind::Type => "type",
            ReferenceKind::Import => "import",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "call" => Some(ReferenceKind::Call),
            "read" => Some(ReferenceKind::Read),
            "write" => Some(ReferenceKind::Write),
            "type" => Some(ReferenceKind::Type),
            "import" => Some(ReferenceKind::Import),
            _ => None,
        }
    }
}

/// A usage of a symbol name within a file. `resolved_symbol_id` starts out
/// `None` and is back-filled by the cross-file resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
    pub symbol_name: String,
    #[serde(default)]
    pub resolved_symbol_id: Option<String>,
    pub file_path: String,
    #[serde(default)]
    pub referencing_symbol_id: Option<String>,
    #[serde(default)]
    pub referencing_symbol_name: Option<String>,
    pub line: u32,
    /// Byte offset from start of line (tree-sitter column).
    pub column: u32,
    #[serde(default)]
    pub snippet: String,
    pub kind: ReferenceKind,
}

/// A (caller, callee name) pair with an aggregated count. One edge exists per
/// distinct pair within a file; repeat calls bump `call_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEdge {
    pub id: String,
    pub caller_id: String,
    pub caller_name: String,
    pub callee_name: String,
    #[serde(default)]
    pub resolved_callee_id: Option<String>,
    #[serde(default = "default_call_count")]
    pub call_count: u32,
    /// The call is reached under an `await` expression.
    #[serde(default)]
    pub is_async: bool,
    /// The call sits inside an if/try/ternary ancestor.
    #[serde(default)]
    pub is_conditional: bool,
}

fn default_call_count() -> u32 {
    1
}

/// Kinds of nominal-type relationships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRelationKind {
    Extends,
    Implements,
    Mixin,
}

impl TypeRelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeRelationKind::Extends => "extends",
            TypeRelationKind::Implements => "implements",
            TypeRelationKind::Mixin => "mixin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "extends" => Some(TypeRelationKind::Extends),
            "implements" => Some(TypeRelationKind::Implements),
            "mixin" => Some(TypeRelationKind::Mixin),
            _ => None,
        }
    }
}

/// An extends/implements/mixin edge. `target_base_name` is the target with
/// generic arguments stripped, so `Repository<User>` is also findable as
/// `Repository`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeRelation {
    pub id: String,
    pub source_id: String,
    pub source_name: String,
    pub target_name: String,
    pub target_base_name: String,
    #[serde(default)]
    pub resolved_target_id: Option<String>,
    pub kind: TypeRelationKind,
}

/// On-disk format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Toml => "toml",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "json" => Some(ConfigFormat::Json),
            "yaml" => Some(ConfigFormat::Yaml),
            "toml" => Some(ConfigFormat::Toml),
            _ => None,
        }
    }
}

/// One leaf (or container) of a configuration document, addressed by its
/// dotted key path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub id: String,
    pub file_path: String,
    /// Dotted path from the document root, e.g. `compilerOptions.target`.
    pub key_path: String,
    pub leaf_name: String,
    /// Value type tag: string, number, boolean, array, object, null.
    pub value_type: String,
    /// Human-readable rendering of the value.
    pub rendered_value: String,
    /// JSON serialization of the raw value.
    pub raw_value: String,
    pub depth: u32,
    #[serde(default)]
    pub parent_path: Option<String>,
    pub format: ConfigFormat,
    /// Recognized config file type (e.g. `tsconfig`), when known.
    #[serde(default)]
    pub config_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub line: u32,
}

/// Complete parse output for a single source file. The serde_json
/// serialization of this record is the per-file snapshot persisted in the
/// `files` table; every normalized table is a projection of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileIndex {
    pub file_path: String,
    pub relative_path: String,
    pub language: Language,
    /// Hex-encoded SHA-256 of the raw content.
    pub checksum: String,
    /// Last-modified time, seconds since the Unix epoch.
    pub last_modified: i64,
    #[serde(default)]
    pub summary: String,
    pub line_count: u32,
    pub parse_status: ParseStatus,
    #[serde(default)]
    pub warnings: Vec<ParseWarning>,
    #[serde(default)]
    pub byte_size: Option<u64>,
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    #[serde(default)]
    pub imports: Vec<Import>,
    #[serde(default)]
    pub exports: Vec<Export>,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub calls: Vec<CallEdge>,
    #[serde(default)]
    pub type_relations: Vec<TypeRelation>,
    #[serde(default)]
    pub config_entries: Vec<ConfigEntry>,
}

impl FileIndex {
    /// An empty record for a file that was skipped before parsing.
    pub fn skipped(
        file_path: impl Into<String>,
        relative_path: impl Into<String>,
        language: Language,
        checksum: impl Into<String>,
        warning: ParseWarning,
    ) -> Self {
        FileIndex {
            file_path: file_path.into(),
            relative_path: relative_path.into(),
            language,
            checksum: checksum.into(),
            last_modified: 0,
            summary: String::new(),
            line_count: 0,
            parse_status: ParseStatus::Skipped,
            warnings: vec![warning],
            byte_size: None,
            symbols: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            references: Vec::new(),
            calls: Vec::new(),
            type_relations: Vec::new(),
            config_entries: Vec::new(),
        }
    }
}

/// Totals returned by `index_directory`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexTotals {
    pub files_found: usize,
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub errors: Vec<IndexFileError>,
}

/// A per-file failure collected during a directory pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexFileError {
    pub file_path: String,
    pub message: String,
}

/// Strips generic arguments from a type name: `Repository<User>` → `Repository`.
pub fn base_type_name(target: &str) -> String {
    match target.find('<') {
        Some(idx) => target[..idx].trim().to_string(),
        None => target.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_kind_roundtrip() {
        for kind in [
            SymbolKind::Function,
            SymbolKind::Method,
            SymbolKind::Constructor,
            SymbolKind::Callback,
            SymbolKind::Class,
            SymbolKind::Interface,
            SymbolKind::TypeAlias,
            SymbolKind::Variable,
        ] {
            assert_eq!(SymbolKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_base_type_name_strips_generics() {
        assert_eq!(base_type_name("Repository<User>"), "Repository");
        assert_eq!(base_type_name("Map<string, number>"), "Map");
        assert_eq!(base_type_name("Plain"), "Plain");
    }

    #[test]
    fn test_file_index_snapshot_roundtrip() {
        let idx = FileIndex {
            file_path: "/p/src/a.ts".into(),
            relative_path: "src/a.ts".into(),
            language: Language::Typescript,
            checksum: "deadbeef".into(),
            last_modified: 1_700_000_000,
            summary: "one function".into(),
            line_count: 3,
            parse_status: ParseStatus::Complete,
            warnings: vec![],
            byte_size: Some(42),
            symbols: vec![Symbol::function(
                "id1".into(),
                "foo".into(),
                "foo".into(),
                SymbolKind::Function,
                "function foo()".into(),
                Location::new("/p/src/a.ts", 1, 3),
                FunctionData {
                    local_name: "foo".into(),
                    ..Default::default()
                },
            )],
            imports: vec![],
            exports: vec![],
            references: vec![],
            calls: vec![],
            type_relations: vec![],
            config_entries: vec![],
        };
        let json = serde_json::to_string(&idx).unwrap();
        let back: FileIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back.symbols.len(), 1);
        assert_eq!(back.symbols[0].name, "foo");
        assert_eq!(back.language, Language::Typescript);
    }

    #[test]
    fn test_location_line_count() {
        assert_eq!(Location::new("f", 5, 5).line_count(), 1);
        assert_eq!(Location::new("f", 1, 10).line_count(), 10);
    }
}
