//! Architecture overview assembly: module grouping, export scoring,
//! cross-module dependency edges, entry-point detection, and module
//! narratives.

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};

use sliver_core::store::SymbolStore;

use super::RetrieveError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportScore {
    pub name: String,
    pub score: usize,
    pub reference_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub name: String,
    pub file_count: usize,
    pub line_count: u64,
    pub files: Vec<String>,
    pub top_exports: Vec<ExportScore>,
    pub narrative: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDependency {
    pub from: String,
    pub to: String,
    pub import_count: u32,
    /// Type-only imports are kept out of `import_count`.
    pub type_only_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchitectureOverview {
    pub modules: Vec<ModuleInfo>,
    pub dependencies: Vec<ModuleDependency>,
    pub entry_points: Vec<String>,
}

/// Roots whose first child directory is the meaningful module name.
const GROUPING_ROOTS: &[&str] = &["src", "lib", "app", "packages"];

/// Conventional entry file paths probed before the fallback.
const CONVENTIONAL_ENTRIES: &[&str] = &[
    "index.ts", "index.js", "src/index.ts", "src/index.js", "src/main.ts", "src/cli.ts",
    "main.py", "app.py",
];

/// Module of a root-relative path: `src/storage/files.ts` → `src/storage`,
/// `tools/gen.py` → `tools`, `index.ts` → `(root)`.
pub fn module_of(relative_path: &str) -> String {
    let mut segments = relative_path.split('/');
    let Some(first) = segments.next() else {
        return "(root)".to_string();
    };
    let Some(second) = segments.next() else {
        return "(root)".to_string();
    };
    if GROUPING_ROOTS.contains(&first) && segments.next().is_some() {
        format!("{first}/{second}")
    } else {
        first.to_string()
    }
}

pub(super) fn build_overview(
    store: &SymbolStore,
    focus: Option<&str>,
) -> Result<ArchitectureOverview, RetrieveError> {
    let files = store.list_files()?;
    let pairs = store.file_path_pairs()?;
    let absolute_to_module: HashMap<&str, String> = pairs
        .iter()
        .map(|(absolute, relative)| (absolute.as_str(), module_of(relative)))
        .collect();

    // Group files by module.
    let mut grouped: BTreeMap<String, Vec<&sliver_core::store::FileSummary>> = BTreeMap::new();
    for file in &files {
        grouped
            .entry(module_of(&file.relative_path))
            .or_default()
            .push(file);
    }

    // Export scores per module: presence in the export table plus how often
    // the exported name is referenced anywhere.
    let mut exports_by_module: HashMap<String, Vec<ExportScore>> = HashMap::new();
    for (file_path, export) in store.all_exports()? {
        if export.name == "*" {
            continue;
        }
        let Some(module) = absolute_to_module.get(file_path.as_str()) else {
            continue;
        };
        let reference_count = store.reference_count(&export.name)?;
        exports_by_module
            .entry(module.clone())
            .or_default()
            .push(ExportScore {
                score: 1 + reference_count,
                reference_count,
                name: export.name,
            });
    }

    let mut modules = Vec::with_capacity(grouped.len());
    for (name, group) in &grouped {
        if focus.is_some_and(|f| f != name.as_str()) {
            continue;
        }
        let mut top_exports = exports_by_module.remove(name).unwrap_or_default();
        top_exports.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
        top_exports.dedup_by(|a, b| a.name == b.name);
        top_exports.truncate(5);

        modules.push(ModuleInfo {
            name: name.clone(),
            file_count: group.len(),
            line_count: group.iter().map(|f| f.line_count as u64).sum(),
            files: group.iter().map(|f| f.relative_path.clone()).collect(),
            top_exports,
            narrative: narrative_for(name),
        });
    }

    // Cross-module dependency edges from resolved imports; a graph map
    // deduplicates the pairs and keeps traversal deterministic.
    let module_names: Vec<&String> = grouped.keys().collect();
    let index_of: HashMap<&str, u32> = module_names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i as u32))
        .collect();
    let mut graph: DiGraphMap<u32, (u32, u32)> = DiGraphMap::new();

    for (file_path, import) in store.all_imports()? {
        let Some(resolved) = &import.resolved_path else {
            continue;
        };
        let (Some(from_module), Some(to_module)) = (
            absolute_to_module.get(file_path.as_str()),
            absolute_to_module.get(resolved.as_str()),
        ) else {
            continue;
        };
        if from_module == to_module {
            continue;
        }
        let (Some(&from), Some(&to)) = (
            index_of.get(from_module.as_str()),
            index_of.get(to_module.as_str()),
        ) else {
            continue;
        };
        let weight = graph.edge_weight_mut(from, to);
        match weight {
            Some((imports, type_only)) => {
                if import.type_only {
                    *type_only += 1;
                } else {
                    *imports += 1;
                }
            }
            None => {
                let initial = if import.type_only { (0, 1) } else { (1, 0) };
                graph.add_edge(from, to, initial);
            }
        }
    }

    let mut dependencies = Vec::new();
    for (from, to, (import_count, type_only_count)) in graph.all_edges() {
        let from_name = module_names[from as usize].clone();
        let to_name = module_names[to as usize].clone();
        if focus.is_some_and(|f| f != from_name && f != to_name) {
            continue;
        }
        dependencies.push(ModuleDependency {
            from: from_name,
            to: to_name,
            import_count: *import_count,
            type_only_count: *type_only_count,
        });
    }
    dependencies.sort_by(|a, b| a.from.cmp(&b.from).then_with(|| a.to.cmp(&b.to)));

    let entry_points = detect_entry_points(store, &files)?;

    Ok(ArchitectureOverview {
        modules,
        dependencies,
        entry_points,
    })
}

/// Entry points from the package manifest, conventional paths, then a
/// no-dependents fallback.
fn detect_entry_points(
    store: &SymbolStore,
    files: &[sliver_core::store::FileSummary],
) -> Result<Vec<String>, RetrieveError> {
    let mut entries: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    // package.json bin/main/exports/module values.
    for key in ["bin", "main", "exports", "module"] {
        for entry in store.config_entries_with_prefix(key)? {
            if entry.config_type.as_deref() != Some("package") {
                continue;
            }
            if entry.value_type != "string" {
                continue;
            }
            let value = entry.rendered_value.trim_start_matches("./").to_string();
            if value.is_empty() || !seen.insert(value.clone()) {
                continue;
            }
            entries.push(value);
        }
    }

    // Conventional locations that actually exist in the index.
    for candidate in CONVENTIONAL_ENTRIES {
        if files.iter().any(|f| f.relative_path == *candidate) && seen.insert(candidate.to_string())
        {
            entries.push(candidate.to_string());
        }
    }

    // Fallback: source files nothing else imports.
    if entries.is_empty() {
        for file in files {
            if file.language == sliver_core::types::Language::Config {
                continue;
            }
            if store.dependents_of(&file.file_path)?.is_empty() {
                entries.push(file.relative_path.clone());
                if entries.len() >= 5 {
                    break;
                }
            }
        }
    }

    Ok(entries)
}

/// Canned narratives for conventionally named modules.
fn narrative_for(module: &str) -> Option<String> {
    let leaf = module.rsplit('/').next().unwrap_or(module);
    let text = match leaf {
        "parser" | "parsers" | "parsing" => "Turns raw source files into structured records.",
        "storage" | "store" | "db" | "database" => "Owns persistence and the query surface over it.",
        "cli" | "commands" => "Command-line entry points and argument handling.",
        "api" | "routes" | "server" => "External request handling and endpoint wiring.",
        "models" | "types" | "schema" => "Shared data shapes used across the codebase.",
        "utils" | "util" | "helpers" | "common" => "Small shared helpers with no domain state.",
        "services" | "core" | "engine" => "Domain logic coordinating the other modules.",
        "config" | "settings" => "Configuration loading and defaults.",
        "watcher" | "watch" => "File-change monitoring and incremental updates.",
        "index" | "indexer" | "indexing" => "Builds and maintains the searchable index.",
        "tests" | "test" | "__tests__" => "Test suites.",
        _ => return None,
    };
    Some(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::Indexer;
    use sliver_core::config::SliverConfig;
    use std::fs;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_module_of() {
        assert_eq!(module_of("src/storage/files.ts"), "src/storage");
        assert_eq!(module_of("src/main.ts"), "src");
        assert_eq!(module_of("tools/gen.py"), "tools");
        assert_eq!(module_of("index.ts"), "(root)");
    }

    fn build(dir: &std::path::Path) -> ArchitectureOverview {
        let store = sliver_core::store::SymbolStore::in_memory().unwrap();
        let indexer = Indexer::new(dir, SliverConfig::default(), Arc::new(Mutex::new(store)));
        indexer.index_directory(None).unwrap();
        let store = indexer.store();
        let guard = store.lock().unwrap();
        build_overview(&guard, None).unwrap()
    }

    #[test]
    fn test_overview_modules_and_edges() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/storage")).unwrap();
        fs::create_dir_all(dir.path().join("src/api")).unwrap();
        fs::write(
            dir.path().join("src/storage/files.ts"),
            "export function save() {\n  return 1;\n}\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("src/api/routes.ts"),
            "import { save } from '../storage/files';\nexport function route() {\n  save();\n}\n",
        )
        .unwrap();

        let overview = build(dir.path());
        let names: Vec<&str> = overview.modules.iter().map(|m| m.name.as_str()).collect();
        assert!(names.contains(&"src/storage"));
        assert!(names.contains(&"src/api"));

        let edge = overview
            .dependencies
            .iter()
            .find(|d| d.from == "src/api" && d.to == "src/storage")
            .expect("cross-module edge");
        assert_eq!(edge.import_count, 1);
        assert_eq!(edge.type_only_count, 0);

        let storage = overview
            .modules
            .iter()
            .find(|m| m.name == "src/storage")
            .unwrap();
        assert!(storage.top_exports.iter().any(|e| e.name == "save"));
        assert!(storage.narrative.is_some());
    }

    #[test]
    fn test_entry_points_from_manifest_and_convention() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join("package.json"),
            "{\n  \"main\": \"dist/out.js\",\n  \"bin\": {\n    \"tool\": \"./bin/tool.js\"\n  }\n}\n",
        )
        .unwrap();
        fs::write(dir.path().join("src/index.ts"), "export function boot() {}\n").unwrap();

        let overview = build(dir.path());
        assert!(overview.entry_points.contains(&"dist/out.js".to_string()));
        assert!(overview.entry_points.contains(&"bin/tool.js".to_string()));
        assert!(overview.entry_points.contains(&"src/index.ts".to_string()));
    }

    #[test]
    fn test_focus_filters_modules() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/a")).unwrap();
        fs::create_dir_all(dir.path().join("src/b")).unwrap();
        fs::write(dir.path().join("src/a/x.ts"), "export function ax() {}\n").unwrap();
        fs::write(dir.path().join("src/b/y.ts"), "export function by() {}\n").unwrap();

        let store = sliver_core::store::SymbolStore::in_memory().unwrap();
        let indexer = Indexer::new(
            dir.path(),
            SliverConfig::default(),
            Arc::new(Mutex::new(store)),
        );
        indexer.index_directory(None).unwrap();
        let store = indexer.store();
        let guard = store.lock().unwrap();
        let overview = build_overview(&guard, Some("src/a")).unwrap();
        assert_eq!(overview.modules.len(), 1);
        assert_eq!(overview.modules[0].name, "src/a");
    }
}
