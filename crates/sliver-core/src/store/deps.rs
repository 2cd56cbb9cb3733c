//! Dependency queries over the import/export tables: direct imports,
//! reverse dependencies, and bounded transitive traversal.

use std::collections::{HashSet, VecDeque};

use rusqlite::params;

use crate::error::StoreError;
use crate::store::SymbolStore;
use crate::types::{Export, Import, ImportSpecifier};

fn row_to_import(row: &rusqlite::Row) -> rusqlite::Result<Import> {
    let specifiers: String = row.get("specifiers")?;
    Ok(Import {
        module: row.get("module")?,
        specifiers: serde_json::from_str::<Vec<ImportSpecifier>>(&specifiers).unwrap_or_default(),
        type_only: row.get::<_, i32>("type_only")? != 0,
        line: row.get("line")?,
        resolved_path: row.get("resolved_path")?,
        is_external: row.get::<_, i32>("is_external")? != 0,
        is_reexport: row.get::<_, i32>("is_reexport")? != 0,
    })
}

fn row_to_export(row: &rusqlite::Row) -> rusqlite::Result<Export> {
    Ok(Export {
        name: row.get("name")?,
        is_default: row.get::<_, i32>("is_default")? != 0,
        is_reexport: row.get::<_, i32>("is_reexport")? != 0,
        source_module: row.get("source_module")?,
        resolved_source_path: row.get("resolved_source_path")?,
        line: row.get("line")?,
    })
}

impl SymbolStore {
    /// Imports declared by one file.
    pub fn imports_of(&self, file_path: &str) -> Result<Vec<Import>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM file_imports WHERE file_path = ?1 ORDER BY line")?;
        let imports = stmt
            .query_map(params![file_path], row_to_import)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(imports)
    }

    /// Exports declared by one file.
    pub fn exports_of(&self, file_path: &str) -> Result<Vec<Export>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM file_exports WHERE file_path = ?1 ORDER BY line")?;
        let exports = stmt
            .query_map(params![file_path], row_to_export)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(exports)
    }

    /// Files this file depends on, via resolved import paths.
    pub fn dependencies_of(&self, file_path: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT resolved_path FROM file_imports
             WHERE file_path = ?1 AND resolved_path IS NOT NULL
             ORDER BY resolved_path",
        )?;
        let deps = stmt
            .query_map(params![file_path], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(deps)
    }

    /// Files that import this file (reverse dependencies).
    pub fn dependents_of(&self, file_path: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT file_path FROM file_imports
             WHERE resolved_path = ?1
             ORDER BY file_path",
        )?;
        let deps = stmt
            .query_map(params![file_path], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(deps)
    }

    /// Breadth-first transitive dependencies, excluding the start file,
    /// bounded by `max_depth` hops.
    pub fn transitive_dependencies(
        &self,
        file_path: &str,
        max_depth: u32,
    ) -> Result<Vec<String>, StoreError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, u32)> = VecDeque::new();
        let mut out = Vec::new();
        queue.push_back((file_path.to_string(), 0));
        seen.insert(file_path.to_string());

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for dep in self.dependencies_of(&current)? {
                if seen.insert(dep.clone()) {
                    out.push(dep.clone());
                    queue.push_back((dep, depth + 1));
                }
            }
        }
        Ok(out)
    }

    /// Every import row in the store, with the importing file. The
    /// architecture overview builds module edges from this.
    pub fn all_imports(&self) -> Result<Vec<(String, Import)>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM file_imports ORDER BY file_path, line")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>("file_path")?, row_to_import(row)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Every export row in the store, with the exporting file.
    pub fn all_exports(&self) -> Result<Vec<(String, Export)>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM file_exports ORDER BY file_path, line")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>("file_path")?, row_to_export(row)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_fixtures::file_index_with;

    fn import_of(module: &str, resolved: Option<&str>) -> Import {
        Import {
            module: module.to_string(),
            resolved_path: resolved.map(String::from),
            is_external: resolved.is_none(),
            ..Default::default()
        }
    }

    #[test]
    fn test_dependencies_and_dependents() {
        let mut store = SymbolStore::in_memory().unwrap();

        let mut a = file_index_with("/p/src/a.ts", vec![]);
        a.imports = vec![
            import_of("./b", Some("/p/src/b.ts")),
            import_of("express", None),
        ];
        store.save_file(&a).unwrap();
        store.save_file(&file_index_with("/p/src/b.ts", vec![])).unwrap();

        assert_eq!(store.dependencies_of("/p/src/a.ts").unwrap(), vec!["/p/src/b.ts"]);
        assert_eq!(store.dependents_of("/p/src/b.ts").unwrap(), vec!["/p/src/a.ts"]);
        assert!(store.dependents_of("/p/src/a.ts").unwrap().is_empty());
    }

    #[test]
    fn test_transitive_dependencies_bounded() {
        let mut store = SymbolStore::in_memory().unwrap();

        // a -> b -> c -> d
        for (file, dep) in [
            ("/p/a.ts", Some("/p/b.ts")),
            ("/p/b.ts", Some("/p/c.ts")),
            ("/p/c.ts", Some("/p/d.ts")),
            ("/p/d.ts", None),
        ] {
            let mut idx = file_index_with(file, vec![]);
            if let Some(d) = dep {
                idx.imports = vec![import_of("./x", Some(d))];
            }
            store.save_file(&idx).unwrap();
        }

        let one_hop = store.transitive_dependencies("/p/a.ts", 1).unwrap();
        assert_eq!(one_hop, vec!["/p/b.ts"]);

        let all = store.transitive_dependencies("/p/a.ts", 10).unwrap();
        assert_eq!(all, vec!["/p/b.ts", "/p/c.ts", "/p/d.ts"]);
    }

    #[test]
    fn test_cycle_terminates() {
        let mut store = SymbolStore::in_memory().unwrap();
        for (file, dep) in [("/p/a.ts", "/p/b.ts"), ("/p/b.ts", "/p/a.ts")] {
            let mut idx = file_index_with(file, vec![]);
            idx.imports = vec![import_of("./x", Some(dep))];
            store.save_file(&idx).unwrap();
        }

        let deps = store.transitive_dependencies("/p/a.ts", 10).unwrap();
        assert_eq!(deps, vec!["/p/b.ts"]);
    }
}
