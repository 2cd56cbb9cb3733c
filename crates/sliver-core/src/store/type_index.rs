//! Structural type index over function and method signatures.
//!
//! Every function/method contributes one row describing its return type and
//! one row per parameter, each split into normalized facets so callers can
//! search by type shape without a type checker.

use rusqlite::{params, Transaction};

use crate::error::StoreError;
use crate::store::SymbolStore;
use crate::types::{FileIndex, Symbol, SymbolData};

/// Match modes for structural type search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeMatchMode {
    /// Normalized text equality.
    Exact,
    /// Generic-free base name equality.
    Base,
    /// Substring of the inner generic arguments.
    Inner,
    /// Substring of any normalized facet.
    Partial,
}

/// A type string split into the indexed facets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeFacets {
    pub raw: String,
    /// Whitespace-collapsed, lowercased rendering.
    pub normalized: String,
    /// Base name with generic arguments removed, lowercased.
    pub base: String,
    /// Inner generic arguments, lowercased; empty when not generic.
    pub inner: String,
    pub is_async: bool,
    pub is_nullable: bool,
    pub is_array: bool,
    pub is_generic: bool,
}

const ASYNC_WRAPPERS: &[&str] = &["promise", "awaitable", "coroutine", "task"];
const ARRAY_WRAPPERS: &[&str] = &["array", "list", "readonlyarray"];

/// Split a type string into its indexed facets.
pub fn analyze_type(raw: &str) -> TypeFacets {
    let trimmed = raw.trim();
    let normalized = normalize_whitespace(trimmed).to_lowercase();

    let is_nullable = normalized.contains("| null")
        || normalized.contains("| undefined")
        || normalized.contains("|null")
        || normalized.contains("|undefined")
        || normalized.starts_with("optional[");

    // Strip a trailing `[]` before looking at the base name.
    let mut core = trimmed.trim_end_matches(|c: char| c.is_whitespace());
    let suffix_array = core.ends_with("[]");
    if suffix_array {
        core = core[..core.len() - 2].trim_end();
    }

    let (base_raw, inner_raw) = split_generic(core);
    let base = base_raw.to_lowercase();
    let inner = normalize_whitespace(inner_raw).to_lowercase();
    let is_generic = !inner.is_empty();
    let is_async = ASYNC_WRAPPERS.contains(&base.as_str());
    let is_array = suffix_array || ARRAY_WRAPPERS.contains(&base.as_str());

    TypeFacets {
        raw: trimmed.to_string(),
        normalized,
        base,
        inner,
        is_async,
        is_nullable,
        is_array,
        is_generic,
    }
}

/// Split `Promise<User>` into (`Promise`, `User`); handles Python-style
/// `List[int]` brackets too. Non-generic types return an empty inner.
fn split_generic(text: &str) -> (&str, &str) {
    for (open, close) in [('<', '>'), ('[', ']')] {
        if let Some(start) = text.find(open) {
            let end = text.rfind(close).unwrap_or(text.len());
            if end > start {
                return (text[..start].trim(), text[start + 1..end].trim());
            }
            return (text[..start].trim(), "");
        }
    }
    (text.trim(), "")
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Insert the structural type rows for every function-like symbol of a file.
/// Runs inside the per-file write transaction.
pub(crate) fn write_type_rows(tx: &Transaction, index: &FileIndex) -> Result<(), StoreError> {
    for symbol in &index.symbols {
        let func = match &symbol.data {
            SymbolData::Function(f) if symbol.kind.is_function_like() => f,
            _ => continue,
        };

        let ret = func.return_type.as_deref().map(analyze_type);
        tx.execute(
            "INSERT OR REPLACE INTO symbol_types (symbol_id, file_path, return_raw, return_normalized, return_base, return_inner, return_is_async, return_is_nullable, return_is_array, return_is_generic, param_count, is_method, parent_class)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                symbol.id,
                index.file_path,
                ret.as_ref().map(|f| f.raw.as_str()),
                ret.as_ref().map(|f| f.normalized.as_str()),
                ret.as_ref().map(|f| f.base.as_str()),
                ret.as_ref().map(|f| f.inner.as_str()),
                ret.as_ref().map_or(false, |f| f.is_async || func.modifiers.is_async) as i32,
                ret.as_ref().map_or(false, |f| f.is_nullable) as i32,
                ret.as_ref().map_or(false, |f| f.is_array) as i32,
                ret.as_ref().map_or(false, |f| f.is_generic) as i32,
                func.params.len() as i64,
                matches!(
                    symbol.kind,
                    crate::types::SymbolKind::Method | crate::types::SymbolKind::Constructor
                ) as i32,
                func.parent_class,
            ],
        )?;

        for (idx_pos, param) in func.params.iter().enumerate() {
            let facets = param.type_text.as_deref().map(analyze_type);
            tx.execute(
                "INSERT OR REPLACE INTO symbol_type_params (symbol_id, file_path, param_index, name, raw, normalized, base, inner, is_optional, is_nullable, is_array, is_generic, has_default)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    symbol.id,
                    index.file_path,
                    idx_pos as u32,
                    param.name,
                    facets.as_ref().map(|f| f.raw.as_str()),
                    facets.as_ref().map(|f| f.normalized.as_str()),
                    facets.as_ref().map(|f| f.base.as_str()),
                    facets.as_ref().map(|f| f.inner.as_str()),
                    param.optional as i32,
                    facets.as_ref().map_or(false, |f| f.is_nullable) as i32,
                    facets.as_ref().map_or(false, |f| f.is_array) as i32,
                    facets.as_ref().map_or(false, |f| f.is_generic) as i32,
                    param.default_text.is_some() as i32,
                ],
            )?;
        }
    }
    Ok(())
}

impl SymbolStore {
    /// Functions and methods whose return type matches `target` under the
    /// given mode. With `async_variants`, `T` also matches any async return
    /// whose inner generic argument contains `T`.
    pub fn search_by_return_type(
        &self,
        target: &str,
        mode: TypeMatchMode,
        async_variants: bool,
    ) -> Result<Vec<Symbol>, StoreError> {
        let facets = analyze_type(target);
        let (clause, value) = mode_clause("return_normalized", "return_base", "return_inner", mode, &facets);

        let ids: Vec<String> = if async_variants {
            let sql = format!(
                "SELECT symbol_id FROM symbol_types WHERE {clause}
                 OR (return_is_async = 1 AND return_inner LIKE ?2)
                 ORDER BY symbol_id"
            );
            let inner_pattern = format!("%{}%", facets.normalized);
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params![value, inner_pattern], |row| row.get(0))?
                .collect::<Result<_, _>>()?;
            rows
        } else {
            let sql = format!("SELECT symbol_id FROM symbol_types WHERE {clause} ORDER BY symbol_id");
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params![value], |row| row.get(0))?
                .collect::<Result<_, _>>()?;
            rows
        };

        self.symbols_for_ids(&ids)
    }

    /// Functions and methods with at least one parameter whose type matches
    /// `target` under the given mode.
    pub fn search_by_param_type(
        &self,
        target: &str,
        mode: TypeMatchMode,
    ) -> Result<Vec<Symbol>, StoreError> {
        let facets = analyze_type(target);
        let (clause, value) = mode_clause("normalized", "base", "inner", mode, &facets);

        let sql = format!(
            "SELECT DISTINCT symbol_id FROM symbol_type_params WHERE {clause} ORDER BY symbol_id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let ids: Vec<String> = stmt
            .query_map(params![value], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        self.symbols_for_ids(&ids)
    }

    fn symbols_for_ids(&self, ids: &[String]) -> Result<Vec<Symbol>, StoreError> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(sym) = self.get_symbol_by_id(id)? {
                out.push(sym);
            }
        }
        Ok(out)
    }
}

fn mode_clause(
    normalized_col: &str,
    base_col: &str,
    inner_col: &str,
    mode: TypeMatchMode,
    facets: &TypeFacets,
) -> (String, String) {
    match mode {
        TypeMatchMode::Exact => (format!("{normalized_col} = ?1"), facets.normalized.clone()),
        TypeMatchMode::Base => (format!("{base_col} = ?1"), facets.base.clone()),
        TypeMatchMode::Inner => (
            format!("{inner_col} LIKE ?1"),
            format!("%{}%", facets.normalized),
        ),
        TypeMatchMode::Partial => (
            format!("({normalized_col} LIKE ?1 OR {base_col} LIKE ?1 OR {inner_col} LIKE ?1)"),
            format!("%{}%", facets.normalized),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_fixtures::file_index_with;
    use crate::types::{FunctionData, Location, Modifiers, Param, SymbolKind};
    use crate::id;

    fn typed_function(file: &str, name: &str, line: u32, ret: &str, params: Vec<Param>) -> Symbol {
        Symbol::function(
            id::symbol_id(file, name, SymbolKind::Function, line),
            name.to_string(),
            name.to_string(),
            SymbolKind::Function,
            format!("function {name}(): {ret}"),
            Location::new(file, line, line + 5),
            FunctionData {
                params,
                return_type: Some(ret.to_string()),
                local_name: name.to_string(),
                modifiers: Modifiers::default(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_analyze_generic_type() {
        let f = analyze_type("Promise<User>");
        assert_eq!(f.base, "promise");
        assert_eq!(f.inner, "user");
        assert!(f.is_async);
        assert!(f.is_generic);
        assert!(!f.is_array);
    }

    #[test]
    fn test_analyze_array_and_nullable() {
        let f = analyze_type("User[]");
        assert!(f.is_array);
        assert_eq!(f.base, "user");

        let f = analyze_type("string | null");
        assert!(f.is_nullable);

        let f = analyze_type("Optional[int]");
        assert!(f.is_nullable);
        assert_eq!(f.base, "optional");
        assert_eq!(f.inner, "int");
    }

    #[test]
    fn test_search_by_return_type_modes() {
        let mut store = SymbolStore::in_memory().unwrap();
        let file = "/p/src/api.ts";
        let idx = file_index_with(
            file,
            vec![
                typed_function(file, "fetchUser", 1, "Promise<User>", vec![]),
                typed_function(file, "getUser", 10, "User", vec![]),
                typed_function(file, "listNames", 20, "string[]", vec![]),
            ],
        );
        store.save_file(&idx).unwrap();

        let exact = store
            .search_by_return_type("User", TypeMatchMode::Exact, false)
            .unwrap();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].name, "getUser");

        // With async variants, `User` also matches `Promise<User>`.
        let with_async = store
            .search_by_return_type("User", TypeMatchMode::Exact, true)
            .unwrap();
        assert_eq!(with_async.len(), 2);

        let base = store
            .search_by_return_type("Promise<Anything>", TypeMatchMode::Base, false)
            .unwrap();
        assert_eq!(base.len(), 1);
        assert_eq!(base[0].name, "fetchUser");

        let inner = store
            .search_by_return_type("User", TypeMatchMode::Inner, false)
            .unwrap();
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].name, "fetchUser");
    }

    #[test]
    fn test_search_by_param_type() {
        let mut store = SymbolStore::in_memory().unwrap();
        let file = "/p/src/api.ts";
        let idx = file_index_with(
            file,
            vec![typed_function(
                file,
                "saveUser",
                1,
                "void",
                vec![Param {
                    name: "user".into(),
                    type_text: Some("User".into()),
                    ..Default::default()
                }],
            )],
        );
        store.save_file(&idx).unwrap();

        let hits = store
            .search_by_param_type("User", TypeMatchMode::Exact)
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "saveUser");

        assert!(store
            .search_by_param_type("Order", TypeMatchMode::Exact)
            .unwrap()
            .is_empty());
    }
}
