//! Graph queries over references, call edges, and type relationships, plus
//! the null-only ID back-fill used by the cross-file resolver.

use rusqlite::params;

use crate::error::StoreError;
use crate::store::SymbolStore;
use crate::types::{CallEdge, Reference, ReferenceKind, TypeRelation, TypeRelationKind};

fn row_to_reference(row: &rusqlite::Row) -> rusqlite::Result<Reference> {
    let kind: String = row.get("kind")?;
    Ok(Reference {
        id: row.get("id")?,
        symbol_name: row.get("symbol_name")?,
        resolved_symbol_id: row.get("resolved_symbol_id")?,
        file_path: row.get("file_path")?,
        referencing_symbol_id: row.get("referencing_symbol_id")?,
        referencing_symbol_name: row.get("referencing_symbol_name")?,
        line: row.get("line")?,
        column: row.get("col")?,
        snippet: row.get("snippet")?,
        kind: ReferenceKind::parse(&kind).unwrap_or(ReferenceKind::Read),
    })
}

fn row_to_call_edge(row: &rusqlite::Row) -> rusqlite::Result<CallEdge> {
    Ok(CallEdge {
        id: row.get("id")?,
        caller_id: row.get("caller_id")?,
        caller_name: row.get("caller_name")?,
        callee_name: row.get("callee_name")?,
        resolved_callee_id: row.get("resolved_callee_id")?,
        call_count: row.get("call_count")?,
        is_async: row.get::<_, i32>("is_async")? != 0,
        is_conditional: row.get::<_, i32>("is_conditional")? != 0,
    })
}

fn row_to_type_relation(row: &rusqlite::Row) -> rusqlite::Result<TypeRelation> {
    let kind: String = row.get("kind")?;
    Ok(TypeRelation {
        id: row.get("id")?,
        source_id: row.get("source_id")?,
        source_name: row.get("source_name")?,
        target_name: row.get("target_name")?,
        target_base_name: row.get("target_base_name")?,
        resolved_target_id: row.get("resolved_target_id")?,
        kind: TypeRelationKind::parse(&kind).unwrap_or(TypeRelationKind::Extends),
    })
}

impl SymbolStore {
    /// All references to a symbol name, ordered by (file, line).
    pub fn references_to(&self, name: &str) -> Result<Vec<Reference>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM symbol_references WHERE symbol_name = ?1 ORDER BY file_path, line, col",
        )?;
        let refs = stmt
            .query_map(params![name], row_to_reference)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(refs)
    }

    /// References occurring inside one file.
    pub fn references_in_file(&self, file_path: &str) -> Result<Vec<Reference>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM symbol_references WHERE file_path = ?1 ORDER BY line, col",
        )?;
        let refs = stmt
            .query_map(params![file_path], row_to_reference)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(refs)
    }

    /// Reference counts per symbol name, used by export scoring.
    pub fn reference_count(&self, name: &str) -> Result<usize, StoreError> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM symbol_references WHERE symbol_name = ?1",
            params![name],
            |r| r.get(0),
        )?;
        Ok(n as usize)
    }

    /// Outgoing call edges of a caller symbol.
    pub fn callees_of(&self, caller_id: &str) -> Result<Vec<CallEdge>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM call_graph WHERE caller_id = ?1 ORDER BY callee_name",
        )?;
        let edges = stmt
            .query_map(params![caller_id], row_to_call_edge)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(edges)
    }

    /// Incoming call edges matching a callee name.
    pub fn callers_of(&self, callee_name: &str) -> Result<Vec<CallEdge>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM call_graph WHERE callee_name = ?1 ORDER BY caller_name",
        )?;
        let edges = stmt
            .query_map(params![callee_name], row_to_call_edge)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(edges)
    }

    /// Every call edge in the store. The Markov builder consumes this.
    pub fn all_call_edges(&self) -> Result<Vec<CallEdge>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM call_graph ORDER BY caller_id, callee_name")?;
        let edges = stmt
            .query_map([], row_to_call_edge)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(edges)
    }

    /// Every reference in the store, ordered deterministically. The Markov
    /// cooccurrence builder consumes this.
    pub fn all_references(&self) -> Result<Vec<Reference>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM symbol_references ORDER BY file_path, line, col")?;
        let refs = stmt
            .query_map([], row_to_reference)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(refs)
    }

    /// Type relationships whose source is the given symbol.
    pub fn type_relations_from(&self, source_id: &str) -> Result<Vec<TypeRelation>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM type_relationships WHERE source_id = ?1 ORDER BY target_name",
        )?;
        let rels = stmt
            .query_map(params![source_id], row_to_type_relation)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rels)
    }

    /// Implementations/extensions of a nominal type. Matches both the full
    /// target text and the generic-free base, so `Repository<User>` edges are
    /// found when searching for `Repository`.
    pub fn type_relations_to(&self, target: &str) -> Result<Vec<TypeRelation>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM type_relationships WHERE target_name = ?1 OR target_base_name = ?1
             ORDER BY source_name",
        )?;
        let rels = stmt
            .query_map(params![target], row_to_type_relation)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rels)
    }

    pub fn all_type_relations(&self) -> Result<Vec<TypeRelation>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM type_relationships ORDER BY source_id, target_name")?;
        let rels = stmt
            .query_map([], row_to_type_relation)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rels)
    }

    /// Distinct files contributing call edges. Chain bookkeeping uses this.
    pub fn files_with_call_edges(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT file_path FROM call_graph ORDER BY file_path")?;
        let rows = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Distinct files contributing references.
    pub fn files_with_references(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT file_path FROM symbol_references ORDER BY file_path")?;
        let rows = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // --- Resolver back-fill -------------------------------------------------
    //
    // Each setter writes only where the stored ID is still null, which makes
    // the resolver pass idempotent.

    /// (row id, callee name) of call edges not yet linked to a symbol.
    pub fn unresolved_call_edges(&self) -> Result<Vec<(String, String)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, callee_name FROM call_graph WHERE resolved_callee_id IS NULL ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn set_call_edge_target(&mut self, edge_id: &str, symbol_id: &str) -> Result<bool, StoreError> {
        let n = self.conn.execute(
            "UPDATE call_graph SET resolved_callee_id = ?2 WHERE id = ?1 AND resolved_callee_id IS NULL",
            params![edge_id, symbol_id],
        )?;
        Ok(n > 0)
    }

    /// (row id, target base name) of type relationships not yet linked.
    pub fn unresolved_type_relations(&self) -> Result<Vec<(String, String)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, target_base_name FROM type_relationships WHERE resolved_target_id IS NULL ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn set_type_relation_target(
        &mut self,
        relation_id: &str,
        symbol_id: &str,
    ) -> Result<bool, StoreError> {
        let n = self.conn.execute(
            "UPDATE type_relationships SET resolved_target_id = ?2 WHERE id = ?1 AND resolved_target_id IS NULL",
            params![relation_id, symbol_id],
        )?;
        Ok(n > 0)
    }

    /// (row id, symbol name) of references not yet linked.
    pub fn unresolved_references(&self) -> Result<Vec<(String, String)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, symbol_name FROM symbol_references WHERE resolved_symbol_id IS NULL ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn set_reference_target(
        &mut self,
        reference_id: &str,
        symbol_id: &str,
    ) -> Result<bool, StoreError> {
        let n = self.conn.execute(
            "UPDATE symbol_references SET resolved_symbol_id = ?2 WHERE id = ?1 AND resolved_symbol_id IS NULL",
            params![reference_id, symbol_id],
        )?;
        Ok(n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id;
    use crate::store::test_fixtures::{file_index_with, simple_function};

    fn reference(file: &str, name: &str, line: u32, kind: ReferenceKind) -> Reference {
        Reference {
            id: id::reference_id(file, name, kind, line, 4),
            symbol_name: name.to_string(),
            resolved_symbol_id: None,
            file_path: file.to_string(),
            referencing_symbol_id: None,
            referencing_symbol_name: Some("caller".to_string()),
            line,
            column: 4,
            snippet: format!("{name}()"),
            kind,
        }
    }

    #[test]
    fn test_references_removed_with_file() {
        let mut store = SymbolStore::in_memory().unwrap();

        // File B defines S; file A references it.
        let file_b = "/p/src/b.ts";
        store
            .save_file(&file_index_with(file_b, vec![simple_function(file_b, "S", 1, 5)]))
            .unwrap();

        let file_a = "/p/src/a.ts";
        let mut idx_a = file_index_with(file_a, vec![]);
        idx_a.references = vec![reference(file_a, "S", 3, ReferenceKind::Call)];
        store.save_file(&idx_a).unwrap();

        assert_eq!(store.references_to("S").unwrap().len(), 1);

        store.remove_file(file_a).unwrap();
        assert!(store.references_to("S").unwrap().is_empty());
        // File B unchanged.
        assert!(store.get_file(file_b).unwrap().is_some());
    }

    #[test]
    fn test_call_edge_upsert_accumulates() {
        let mut store = SymbolStore::in_memory().unwrap();
        let file = "/p/src/a.ts";
        let caller = simple_function(file, "main", 1, 20);
        let edge = CallEdge {
            id: id::call_edge_id(&caller.id, "helper"),
            caller_id: caller.id.clone(),
            caller_name: "main".into(),
            callee_name: "helper".into(),
            resolved_callee_id: None,
            call_count: 3,
            is_async: false,
            is_conditional: true,
        };
        let mut idx = file_index_with(file, vec![caller]);
        idx.calls = vec![edge];
        store.save_file(&idx).unwrap();

        let edges = store.callers_of("helper").unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].call_count, 3);
        assert!(edges[0].is_conditional);
    }

    #[test]
    fn test_type_relation_base_name_match() {
        let mut store = SymbolStore::in_memory().unwrap();
        let file = "/p/src/repo.ts";
        let source = simple_function(file, "UserRepo", 1, 30);
        let rel = TypeRelation {
            id: id::type_relation_id(&source.id, "Repository<User>", TypeRelationKind::Implements),
            source_id: source.id.clone(),
            source_name: "UserRepo".into(),
            target_name: "Repository<User>".into(),
            target_base_name: "Repository".into(),
            resolved_target_id: None,
            kind: TypeRelationKind::Implements,
        };
        let mut idx = file_index_with(file, vec![source]);
        idx.type_relations = vec![rel];
        store.save_file(&idx).unwrap();

        assert_eq!(store.type_relations_to("Repository").unwrap().len(), 1);
        assert_eq!(store.type_relations_to("Repository<User>").unwrap().len(), 1);
        assert!(store.type_relations_to("Repo").unwrap().is_empty());
    }

    #[test]
    fn test_backfill_writes_only_nulls() {
        let mut store = SymbolStore::in_memory().unwrap();
        let file = "/p/src/a.ts";
        let mut idx = file_index_with(file, vec![]);
        idx.references = vec![reference(file, "S", 3, ReferenceKind::Call)];
        store.save_file(&idx).unwrap();

        let unresolved = store.unresolved_references().unwrap();
        assert_eq!(unresolved.len(), 1);
        let ref_id = unresolved[0].0.clone();

        assert!(store.set_reference_target(&ref_id, "sym1").unwrap());
        // Second write is a no-op: the ID is no longer null.
        assert!(!store.set_reference_target(&ref_id, "sym2").unwrap());

        let refs = store.references_to("S").unwrap();
        assert_eq!(refs[0].resolved_symbol_id.as_deref(), Some("sym1"));
    }
}
