//! The retrieval API: thin composition over the store serving the
//! agent-facing tools. Every endpoint returns structured records; rendering
//! to compact or markdown form happens in the output crate.

pub mod architecture;

pub use architecture::{ArchitectureOverview, ModuleDependency, ModuleInfo};

use std::sync::MutexGuard;

use serde::{Deserialize, Serialize};

use sliver_core::config::MarkovConfig;
use sliver_core::error::{ResolveError, StoreError};
use sliver_core::store::{FileSummary, SearchFilters, StoreStats, SymbolStore};
use sliver_core::types::{
    CallEdge, ConfigEntry, Language, Reference, Symbol, SymbolKind,
};

use crate::markov::{MarkovEngine, SuggestOptions, SuggestResponse};
use crate::paths;
use crate::SharedStore;

/// Calls deeper than this are not traced regardless of the request.
pub const MAX_TRACE_DEPTH: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum RetrieveError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("cannot read {path}: {message}")]
    Io { path: String, message: String },
}

/// One row of a symbol listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRow {
    pub name: String,
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub signature: String,
    pub file_path: String,
    pub line: u32,
    #[serde(default)]
    pub score: Option<f64>,
}

impl SymbolRow {
    pub fn from_symbol(symbol: &Symbol) -> Self {
        SymbolRow {
            name: symbol.name.clone(),
            qualified_name: symbol.qualified_name.clone(),
            kind: symbol.kind,
            signature: symbol.signature.clone(),
            file_path: symbol.location.file_path.clone(),
            line: symbol.location.start_line,
            score: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub offset: usize,
    pub hits: Vec<SymbolRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDetail {
    pub symbol: Symbol,
    pub file_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDetail {
    pub symbol: Symbol,
    pub file_path: String,
    /// False when the nominal type resolved to an interface.
    pub is_class: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReferenceGroup {
    pub file_path: String,
    pub references: Vec<Reference>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferencesResult {
    pub symbol_name: String,
    pub total: usize,
    pub groups: Vec<FileReferenceGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub depth: u32,
    pub caller_name: String,
    pub callee_name: String,
    pub call_count: u32,
    pub is_async: bool,
    pub is_conditional: bool,
    pub resolved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallTrace {
    pub root: String,
    pub depth: u32,
    pub entries: Vec<TraceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedContext {
    pub function: Symbol,
    /// The function's own source lines, when the file is still readable.
    pub source: Option<String>,
    pub callees: Vec<SymbolRow>,
    /// Nominal types the function references in type position.
    pub types: Vec<SymbolRow>,
}

pub struct RetrievalApi {
    store: SharedStore,
    markov: MarkovEngine,
    markov_config: MarkovConfig,
}

impl RetrievalApi {
    pub fn new(store: SharedStore, markov_config: MarkovConfig) -> Self {
        RetrievalApi {
            store,
            markov: MarkovEngine::new(),
            markov_config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SymbolStore> {
        match self.store.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Hybrid symbol search with pagination.
    pub fn search_symbols(
        &self,
        query: &str,
        kind: Option<SymbolKind>,
        language: Option<Language>,
        limit: usize,
        offset: usize,
    ) -> Result<SearchResults, RetrieveError> {
        let filters = SearchFilters {
            kind,
            language,
            limit: Some(limit),
            offset,
        };
        let hits = self.lock().search_symbols(query, &filters)?;
        Ok(SearchResults {
            query: query.to_string(),
            offset,
            hits: hits
                .iter()
                .map(|hit| {
                    let mut row = SymbolRow::from_symbol(&hit.symbol);
                    row.score = hit.score;
                    row
                })
                .collect(),
        })
    }

    /// Function lookup with path-hint resolution and ambiguity reporting.
    pub fn get_function(&self, file_hint: &str, name: &str) -> Result<FunctionDetail, RetrieveError> {
        let store = self.lock();
        let file_path = paths::resolve_path(&store, file_hint)?;
        let symbol = store.get_function(&file_path, name)?;
        Ok(FunctionDetail { symbol, file_path })
    }

    /// Class lookup; falls back to an interface of the same name.
    pub fn get_class(&self, file_hint: &str, name: &str) -> Result<ClassDetail, RetrieveError> {
        let store = self.lock();
        let file_path = paths::resolve_path(&store, file_hint)?;
        let resolved = store.get_class_or_interface(&file_path, name)?;
        let is_class = matches!(resolved, sliver_core::store::ClassOrInterface::Class(_));
        Ok(ClassDetail {
            symbol: resolved.symbol().clone(),
            file_path,
            is_class,
        })
    }

    /// All references to a name, grouped by referencing file. An unknown
    /// name yields an empty result, not an error.
    pub fn find_references(&self, name: &str) -> Result<ReferencesResult, RetrieveError> {
        let references = self.lock().references_to(name)?;
        let total = references.len();

        let mut groups: Vec<FileReferenceGroup> = Vec::new();
        for reference in references {
            match groups.last_mut() {
                Some(group) if group.file_path == reference.file_path => {
                    group.references.push(reference);
                }
                _ => groups.push(FileReferenceGroup {
                    file_path: reference.file_path.clone(),
                    references: vec![reference],
                }),
            }
        }

        Ok(ReferencesResult {
            symbol_name: name.to_string(),
            total,
            groups,
        })
    }

    /// Breadth-first walk of the call graph starting at a function name.
    pub fn trace_calls(&self, function_name: &str, depth: u32) -> Result<CallTrace, RetrieveError> {
        let depth = depth.clamp(1, MAX_TRACE_DEPTH);
        let store = self.lock();

        let mut entries = Vec::new();
        let mut frontier: Vec<(String, String)> = store
            .symbols_named(function_name)?
            .into_iter()
            .filter(|s| s.kind.is_function_like())
            .map(|s| (s.id, s.qualified_name))
            .collect();
        let mut seen: std::collections::HashSet<String> =
            frontier.iter().map(|(id, _)| id.clone()).collect();

        for level in 1..=depth {
            let mut next: Vec<(String, String)> = Vec::new();
            for (caller_id, caller_name) in &frontier {
                for edge in store.callees_of(caller_id)? {
                    entries.push(TraceEntry {
                        depth: level,
                        caller_name: caller_name.clone(),
                        callee_name: edge.callee_name.clone(),
                        call_count: edge.call_count,
                        is_async: edge.is_async,
                        is_conditional: edge.is_conditional,
                        resolved: edge.resolved_callee_id.is_some(),
                    });
                    if let Some(callee_id) = edge.resolved_callee_id {
                        if seen.insert(callee_id.clone()) {
                            if let Some(callee) = store.get_symbol_by_id(&callee_id)? {
                                next.push((callee_id, callee.qualified_name));
                            }
                        }
                    }
                }
            }
            frontier = next;
            if frontier.is_empty() {
                break;
            }
        }

        Ok(CallTrace {
            root: function_name.to_string(),
            depth,
            entries,
        })
    }

    /// Bundle a function's source, its immediate callees, and the types it
    /// references.
    pub fn get_related_context(&self, name: &str) -> Result<RelatedContext, RetrieveError> {
        let store = self.lock();
        let function = store
            .symbols_named(name)?
            .into_iter()
            .find(|s| s.kind.is_function_like())
            .ok_or_else(|| StoreError::not_found(format!("function '{name}'")))?;

        let source = read_symbol_source(&function);

        let mut callees = Vec::new();
        for edge in store.callees_of(&function.id)? {
            if let Some(callee_id) = &edge.resolved_callee_id {
                if let Some(symbol) = store.get_symbol_by_id(callee_id)? {
                    callees.push(SymbolRow::from_symbol(&symbol));
                    continue;
                }
            }
            callees.push(unresolved_row(&edge));
        }

        let mut types = Vec::new();
        let mut seen_types = std::collections::HashSet::new();
        for reference in store.references_in_file(&function.location.file_path)? {
            if reference.referencing_symbol_id.as_deref() != Some(function.id.as_str()) {
                continue;
            }
            if reference.kind != sliver_core::types::ReferenceKind::Type {
                continue;
            }
            if !seen_types.insert(reference.symbol_name.clone()) {
                continue;
            }
            if let Some(target_id) = &reference.resolved_symbol_id {
                if let Some(symbol) = store.get_symbol_by_id(target_id)? {
                    types.push(SymbolRow::from_symbol(&symbol));
                }
            }
        }

        Ok(RelatedContext {
            function,
            source,
            callees,
            types,
        })
    }

    pub fn get_architecture_overview(
        &self,
        focus: Option<&str>,
    ) -> Result<ArchitectureOverview, RetrieveError> {
        architecture::build_overview(&self.lock(), focus)
    }

    pub fn suggest_related(
        &self,
        symbol_name: &str,
        options: Option<SuggestOptions>,
    ) -> Result<SuggestResponse, RetrieveError> {
        let options = options.unwrap_or_else(|| SuggestOptions::from_config(&self.markov_config));
        Ok(self
            .markov
            .suggest_related(&self.lock(), symbol_name, &options)?)
    }

    pub fn list_files(&self) -> Result<Vec<FileSummary>, RetrieveError> {
        Ok(self.lock().list_files()?)
    }

    /// Config entries scoped by file, dotted-path prefix, or substring.
    pub fn get_config_entries(
        &self,
        file_hint: Option<&str>,
        prefix: Option<&str>,
        query: Option<&str>,
    ) -> Result<Vec<ConfigEntry>, RetrieveError> {
        let store = self.lock();
        if let Some(hint) = file_hint {
            let file_path = paths::resolve_path(&store, hint)?;
            return Ok(store.config_entries_for_file(&file_path)?);
        }
        if let Some(prefix) = prefix {
            return Ok(store.config_entries_with_prefix(prefix)?);
        }
        if let Some(query) = query {
            return Ok(store.search_config_entries(query)?);
        }
        Ok(Vec::new())
    }

    pub fn dependencies(&self, file_hint: &str) -> Result<Vec<String>, RetrieveError> {
        let store = self.lock();
        let file_path = paths::resolve_path(&store, file_hint)?;
        Ok(store.dependencies_of(&file_path)?)
    }

    pub fn dependents(&self, file_hint: &str) -> Result<Vec<String>, RetrieveError> {
        let store = self.lock();
        let file_path = paths::resolve_path(&store, file_hint)?;
        Ok(store.dependents_of(&file_path)?)
    }

    pub fn stats(&self) -> Result<StoreStats, RetrieveError> {
        Ok(self.lock().stats()?)
    }
}

fn unresolved_row(edge: &CallEdge) -> SymbolRow {
    SymbolRow {
        name: edge.callee_name.clone(),
        qualified_name: edge.callee_name.clone(),
        kind: SymbolKind::Function,
        signature: String::new(),
        file_path: String::new(),
        line: 0,
        score: None,
    }
}

/// Read a symbol's own lines from disk; None when the file is gone.
fn read_symbol_source(symbol: &Symbol) -> Option<String> {
    let content = std::fs::read_to_string(&symbol.location.file_path).ok()?;
    let start = symbol.location.start_line.saturating_sub(1) as usize;
    let end = symbol.location.end_line as usize;
    let lines: Vec<&str> = content.lines().skip(start).take(end - start).collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::Indexer;
    use sliver_core::config::SliverConfig;
    use std::fs;
    use std::sync::{Arc, Mutex};

    fn api_over(dir: &std::path::Path) -> RetrievalApi {
        let store = SymbolStore::in_memory().unwrap();
        let indexer = Indexer::new(dir, SliverConfig::default(), Arc::new(Mutex::new(store)));
        indexer.index_directory(None).unwrap();
        RetrievalApi::new(indexer.store(), MarkovConfig::default())
    }

    #[test]
    fn test_get_function_with_partial_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join("src/auth.ts"),
            "export function login(user: string) {\n  return user;\n}\n",
        )
        .unwrap();

        let api = api_over(dir.path());
        let detail = api.get_function("auth.ts", "login").unwrap();
        assert_eq!(detail.symbol.name, "login");
        assert!(detail.file_path.ends_with("src/auth.ts"));
    }

    #[test]
    fn test_ambiguous_function_error_carries_suggestions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("routes.ts"),
            "class Router {\n  handler() {\n    return 1;\n  }\n}\nclass Server {\n  handler() {\n    return 2;\n  }\n}\n",
        )
        .unwrap();

        let api = api_over(dir.path());
        match api.get_function("routes.ts", "handler") {
            Err(RetrieveError::Store(StoreError::Ambiguous { candidates, .. })) => {
                assert_eq!(candidates, vec!["Router.handler", "Server.handler"]);
            }
            other => panic!("expected Ambiguous, got {other:?}"),
        }

        let specific = api.get_function("routes.ts", "Router.handler").unwrap();
        assert_eq!(specific.symbol.qualified_name, "Router.handler");
    }

    #[test]
    fn test_find_references_groups_by_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("lib.ts"), "export function util() {\n  return 1;\n}\n")
            .unwrap();
        fs::write(dir.path().join("a.ts"), "function fa() {\n  util();\n}\n").unwrap();
        fs::write(dir.path().join("b.ts"), "function fb() {\n  util();\n  util();\n}\n").unwrap();

        let api = api_over(dir.path());
        let result = api.find_references("util").unwrap();
        assert!(result.total >= 3);
        assert!(result.groups.len() >= 2);
        for group in &result.groups {
            assert!(!group.references.is_empty());
        }
    }

    #[test]
    fn test_find_references_empty_for_unknown() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.ts"), "function fa() {}\n").unwrap();

        let api = api_over(dir.path());
        let result = api.find_references("ghost").unwrap();
        assert_eq!(result.total, 0);
        assert!(result.groups.is_empty());
    }

    #[test]
    fn test_trace_calls_walks_levels() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("app.ts"),
            "function level2() {\n  return 2;\n}\nfunction level1() {\n  level2();\n}\nfunction entry() {\n  level1();\n}\n",
        )
        .unwrap();

        let api = api_over(dir.path());
        let trace = api.trace_calls("entry", 3).unwrap();
        assert!(trace
            .entries
            .iter()
            .any(|e| e.depth == 1 && e.callee_name == "level1"));
        assert!(trace
            .entries
            .iter()
            .any(|e| e.depth == 2 && e.callee_name == "level2"));
    }

    #[test]
    fn test_trace_depth_capped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.ts"), "function f() {}\n").unwrap();
        let api = api_over(dir.path());
        let trace = api.trace_calls("f", 99).unwrap();
        assert_eq!(trace.depth, MAX_TRACE_DEPTH);
    }

    #[test]
    fn test_related_context() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("svc.ts"),
            "interface Config {\n  url: string;\n}\nfunction helper() {\n  return 1;\n}\nfunction main(cfg: Config) {\n  helper();\n  return cfg.url;\n}\n",
        )
        .unwrap();

        let api = api_over(dir.path());
        let context = api.get_related_context("main").unwrap();
        assert_eq!(context.function.name, "main");
        assert!(context.source.as_deref().unwrap_or("").contains("helper()"));
        assert!(context.callees.iter().any(|c| c.name == "helper"));
        assert!(context.types.iter().any(|t| t.name == "Config"));
    }
}
