//! Symbol lookup: per-file name resolution with the documented precedence,
//! class-or-interface fallback, and global name queries.

use rusqlite::params;

use crate::error::StoreError;
use crate::store::files::ignore_no_rows;
use crate::store::SymbolStore;
use crate::types::{Symbol, SymbolKind};

/// Result of [`SymbolStore::get_class_or_interface`]: class wins over
/// interface when both share the name.
#[derive(Debug, Clone)]
pub enum ClassOrInterface {
    Class(Symbol),
    Interface(Symbol),
}

impl ClassOrInterface {
    pub fn symbol(&self) -> &Symbol {
        match self {
            ClassOrInterface::Class(s) | ClassOrInterface::Interface(s) => s,
        }
    }
}

fn row_to_symbol(row: &rusqlite::Row) -> rusqlite::Result<String> {
    row.get("record")
}

impl SymbolStore {
    fn decode(&self, record: String) -> Result<Symbol, StoreError> {
        serde_json::from_str(&record).map_err(Into::into)
    }

    /// Look up a function-like symbol in a file by name.
    ///
    /// Precedence: (1) exact qualified-name match; (2) unique local-name
    /// match; (3) unique dot-suffix match for dotted queries. A multi-match
    /// at (2) or (3) without an exact win is an [`StoreError::Ambiguous`]
    /// carrying the candidate qualified names.
    pub fn get_function(&self, file_path: &str, name: &str) -> Result<Symbol, StoreError> {
        self.lookup_with_precedence(
            file_path,
            name,
            &["function", "method", "constructor", "callback"],
        )
    }

    fn lookup_with_precedence(
        &self,
        file_path: &str,
        name: &str,
        kinds: &[&str],
    ) -> Result<Symbol, StoreError> {
        let kind_list = sql_string_list(kinds);

        // Strategy 1: exact qualified name.
        let sql = format!(
            "SELECT record FROM symbols WHERE file_path = ?1 AND qualified_name = ?2 AND kind IN ({kind_list}) ORDER BY start_line LIMIT 1"
        );
        let exact: Option<String> = self
            .conn
            .query_row(&sql, params![file_path, name], row_to_symbol)
            .map(Some)
            .or_else(ignore_no_rows)?;
        if let Some(record) = exact {
            return self.decode(record);
        }

        // Strategy 2: local name, unique within the file.
        let sql = format!(
            "SELECT record, qualified_name FROM symbols WHERE file_path = ?1 AND local_name = ?2 AND kind IN ({kind_list}) ORDER BY start_line"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let local: Vec<(String, String)> = stmt
            .query_map(params![file_path, name], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<Result<_, _>>()?;
        match local.len() {
            1 => return self.decode(local.into_iter().next().expect("len checked").0),
            n if n > 1 => {
                return Err(StoreError::ambiguous(
                    name,
                    local.into_iter().map(|(_, q)| q).collect(),
                ));
            }
            _ => {}
        }

        // Strategy 3: dot-suffix match on qualified name, for dotted queries.
        if name.contains('.') {
            let sql = format!(
                "SELECT record, qualified_name FROM symbols WHERE file_path = ?1 AND (qualified_name = ?2 OR qualified_name LIKE ?3) AND kind IN ({kind_list}) ORDER BY start_line"
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let pattern = format!("%.{name}");
            let suffix: Vec<(String, String)> = stmt
                .query_map(params![file_path, name, pattern], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?
                .collect::<Result<_, _>>()?;
            match suffix.len() {
                1 => return self.decode(suffix.into_iter().next().expect("len checked").0),
                n if n > 1 => {
                    return Err(StoreError::ambiguous(
                        name,
                        suffix.into_iter().map(|(_, q)| q).collect(),
                    ));
                }
                _ => {}
            }
        }

        Err(StoreError::not_found(format!(
            "function '{name}' in {file_path}"
        )))
    }

    pub fn get_class(&self, file_path: &str, name: &str) -> Result<Symbol, StoreError> {
        self.get_kind_by_name(file_path, name, SymbolKind::Class)
            .and_then(|opt| {
                opt.ok_or_else(|| StoreError::not_found(format!("class '{name}' in {file_path}")))
            })
    }

    pub fn get_interface(&self, file_path: &str, name: &str) -> Result<Symbol, StoreError> {
        self.get_kind_by_name(file_path, name, SymbolKind::Interface)
            .and_then(|opt| {
                opt.ok_or_else(|| {
                    StoreError::not_found(format!("interface '{name}' in {file_path}"))
                })
            })
    }

    /// Resolve a nominal type that may be either a class or an interface,
    /// preferring the class.
    pub fn get_class_or_interface(
        &self,
        file_path: &str,
        name: &str,
    ) -> Result<ClassOrInterface, StoreError> {
        if let Some(class) = self.get_kind_by_name(file_path, name, SymbolKind::Class)? {
            return Ok(ClassOrInterface::Class(class));
        }
        if let Some(iface) = self.get_kind_by_name(file_path, name, SymbolKind::Interface)? {
            return Ok(ClassOrInterface::Interface(iface));
        }
        Err(StoreError::not_found(format!(
            "class or interface '{name}' in {file_path}"
        )))
    }

    /// Per-variant lookup by (file, simple name). Earliest declaration wins
    /// when a file reuses a name for the same kind.
    pub fn get_symbol_of_kind(
        &self,
        file_path: &str,
        name: &str,
        kind: SymbolKind,
    ) -> Result<Option<Symbol>, StoreError> {
        self.get_kind_by_name(file_path, name, kind)
    }

    fn get_kind_by_name(
        &self,
        file_path: &str,
        name: &str,
        kind: SymbolKind,
    ) -> Result<Option<Symbol>, StoreError> {
        let record: Option<String> = self
            .conn
            .query_row(
                "SELECT record FROM symbols WHERE file_path = ?1 AND name = ?2 AND kind = ?3 ORDER BY start_line LIMIT 1",
                params![file_path, name, kind.as_str()],
                row_to_symbol,
            )
            .map(Some)
            .or_else(ignore_no_rows)?;
        record.map(|r| self.decode(r)).transpose()
    }

    pub fn get_symbol_by_id(&self, id: &str) -> Result<Option<Symbol>, StoreError> {
        let record: Option<String> = self
            .conn
            .query_row(
                "SELECT record FROM symbols WHERE id = ?1",
                params![id],
                row_to_symbol,
            )
            .map(Some)
            .or_else(ignore_no_rows)?;
        record.map(|r| self.decode(r)).transpose()
    }

    /// All symbols with the given simple name, ordered by (file, line) so
    /// name-based resolution has a deterministic first candidate.
    pub fn symbols_named(&self, name: &str) -> Result<Vec<Symbol>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT record FROM symbols WHERE name = ?1 ORDER BY file_path, start_line",
        )?;
        let records: Vec<String> = stmt
            .query_map(params![name], row_to_symbol)?
            .collect::<Result<_, _>>()?;
        records.into_iter().map(|r| self.decode(r)).collect()
    }

    /// All symbols in a file, ordered by position.
    pub fn symbols_in_file(&self, file_path: &str) -> Result<Vec<Symbol>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT record FROM symbols WHERE file_path = ?1 ORDER BY start_line, qualified_name",
        )?;
        let records: Vec<String> = stmt
            .query_map(params![file_path], row_to_symbol)?
            .collect::<Result<_, _>>()?;
        records.into_iter().map(|r| self.decode(r)).collect()
    }

    /// Simple-name index over every stored symbol: (name, id, kind) rows in
    /// deterministic (name, file, line) order, so "first match" resolution is
    /// stable across runs. Used by the cross-file resolver.
    pub fn symbol_name_index(&self) -> Result<Vec<(String, String, SymbolKind)>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, id, kind FROM symbols ORDER BY name, file_path, start_line")?;
        let rows: Vec<(String, String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<Result<_, _>>()?;
        Ok(rows
            .into_iter()
            .filter_map(|(name, id, kind)| SymbolKind::parse(&kind).map(|k| (name, id, k)))
            .collect())
    }
}

fn sql_string_list(items: &[&str]) -> String {
    items
        .iter()
        .map(|s| format!("'{s}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_fixtures::{file_index_with, method_of, simple_function};
    use crate::types::{ClassData, Location, Symbol};
    use crate::{id, types::InterfaceData};

    fn class_named(file: &str, name: &str, line: u32) -> Symbol {
        Symbol::class(
            id::symbol_id(file, name, SymbolKind::Class, line),
            name.to_string(),
            format!("class {name}"),
            Location::new(file, line, line + 5),
            ClassData::default(),
        )
    }

    fn interface_named(file: &str, name: &str, line: u32) -> Symbol {
        Symbol::interface(
            id::symbol_id(file, name, SymbolKind::Interface, line),
            name.to_string(),
            format!("interface {name}"),
            Location::new(file, line, line + 3),
            InterfaceData::default(),
        )
    }

    #[test]
    fn test_exact_qualified_name_wins() {
        let mut store = SymbolStore::in_memory().unwrap();
        let file = "/p/src/router.ts";
        let idx = file_index_with(
            file,
            vec![
                method_of(file, "Router", "handler", 10, 20),
                method_of(file, "Server", "handler", 30, 40),
            ],
        );
        store.save_file(&idx).unwrap();

        let sym = store.get_function(file, "Router.handler").unwrap();
        assert_eq!(sym.qualified_name, "Router.handler");
    }

    #[test]
    fn test_duplicate_local_name_is_ambiguous() {
        let mut store = SymbolStore::in_memory().unwrap();
        let file = "/p/src/router.ts";
        let idx = file_index_with(
            file,
            vec![
                method_of(file, "Router", "handler", 10, 20),
                method_of(file, "Server", "handler", 30, 40),
            ],
        );
        store.save_file(&idx).unwrap();

        match store.get_function(file, "handler") {
            Err(StoreError::Ambiguous { candidates, .. }) => {
                assert_eq!(candidates, vec!["Router.handler", "Server.handler"]);
            }
            other => panic!("expected Ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn test_unique_local_name_resolves() {
        let mut store = SymbolStore::in_memory().unwrap();
        let file = "/p/src/a.ts";
        let idx = file_index_with(file, vec![method_of(file, "Router", "route", 5, 9)]);
        store.save_file(&idx).unwrap();

        let sym = store.get_function(file, "route").unwrap();
        assert_eq!(sym.qualified_name, "Router.route");
    }

    #[test]
    fn test_dotted_suffix_match_when_unique() {
        let mut store = SymbolStore::in_memory().unwrap();
        let file = "/p/src/a.ts";
        // Nested function: local name `inner`, qualified three segments deep.
        // Querying the last two segments exercises the suffix strategy.
        let mut sym = method_of(file, "Outer", "inner", 5, 9);
        sym.qualified_name = "Outer.middle.inner".into();
        let idx = file_index_with(file, vec![sym]);
        store.save_file(&idx).unwrap();

        let found = store.get_function(file, "middle.inner").unwrap();
        assert_eq!(found.qualified_name, "Outer.middle.inner");
    }

    #[test]
    fn test_missing_function_is_not_found() {
        let mut store = SymbolStore::in_memory().unwrap();
        let file = "/p/src/a.ts";
        store
            .save_file(&file_index_with(file, vec![simple_function(file, "foo", 1, 3)]))
            .unwrap();

        assert!(matches!(
            store.get_function(file, "bar"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_class_preferred_over_interface() {
        let mut store = SymbolStore::in_memory().unwrap();
        let file = "/p/src/shape.ts";
        let idx = file_index_with(
            file,
            vec![interface_named(file, "Shape", 1), class_named(file, "Shape", 10)],
        );
        store.save_file(&idx).unwrap();

        match store.get_class_or_interface(file, "Shape").unwrap() {
            ClassOrInterface::Class(s) => assert_eq!(s.kind, SymbolKind::Class),
            ClassOrInterface::Interface(_) => panic!("class should win"),
        }
    }

    #[test]
    fn test_interface_fallback() {
        let mut store = SymbolStore::in_memory().unwrap();
        let file = "/p/src/shape.ts";
        store
            .save_file(&file_index_with(file, vec![interface_named(file, "Drawable", 1)]))
            .unwrap();

        assert!(matches!(
            store.get_class_or_interface(file, "Drawable").unwrap(),
            ClassOrInterface::Interface(_)
        ));
    }

    #[test]
    fn test_symbols_named_ordered_by_file_then_line() {
        let mut store = SymbolStore::in_memory().unwrap();
        store
            .save_file(&file_index_with(
                "/p/src/b.ts",
                vec![simple_function("/p/src/b.ts", "init", 1, 4)],
            ))
            .unwrap();
        store
            .save_file(&file_index_with(
                "/p/src/a.ts",
                vec![simple_function("/p/src/a.ts", "init", 7, 12)],
            ))
            .unwrap();

        let symbols = store.symbols_named("init").unwrap();
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].location.file_path, "/p/src/a.ts");
    }
}
