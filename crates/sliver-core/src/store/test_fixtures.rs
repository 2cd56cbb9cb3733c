//! Shared builders for store unit tests.

use crate::id;
use crate::types::{
    FileIndex, FunctionData, Language, Location, ParseStatus, Symbol, SymbolKind,
};

pub fn simple_function(file_path: &str, name: &str, start: u32, end: u32) -> Symbol {
    Symbol::function(
        id::symbol_id(file_path, name, SymbolKind::Function, start),
        name.to_string(),
        name.to_string(),
        SymbolKind::Function,
        format!("function {name}()"),
        Location::new(file_path, start, end),
        FunctionData {
            local_name: name.to_string(),
            ..Default::default()
        },
    )
}

pub fn method_of(file_path: &str, class: &str, name: &str, start: u32, end: u32) -> Symbol {
    let qualified = format!("{class}.{name}");
    Symbol::function(
        id::symbol_id(file_path, &qualified, SymbolKind::Method, start),
        name.to_string(),
        qualified,
        SymbolKind::Method,
        format!("{name}()"),
        Location::new(file_path, start, end),
        FunctionData {
            local_name: name.to_string(),
            parent_class: Some(class.to_string()),
            ..Default::default()
        },
    )
}

pub fn file_index_with(file_path: &str, symbols: Vec<Symbol>) -> FileIndex {
    let relative = file_path.trim_start_matches("/p/").to_string();
    FileIndex {
        file_path: file_path.to_string(),
        relative_path: relative,
        language: Language::Typescript,
        checksum: id::content_checksum(file_path.as_bytes()),
        last_modified: 1_700_000_000,
        summary: String::new(),
        line_count: symbols
            .iter()
            .map(|s| s.location.end_line)
            .max()
            .unwrap_or(1),
        parse_status: ParseStatus::Complete,
        warnings: Vec::new(),
        byte_size: None,
        symbols,
        imports: Vec::new(),
        exports: Vec::new(),
        references: Vec::new(),
        calls: Vec::new(),
        type_relations: Vec::new(),
        config_entries: Vec::new(),
    }
}
