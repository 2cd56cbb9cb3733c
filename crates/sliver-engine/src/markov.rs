//! Markov chain construction and ranked suggestion traversal.
//!
//! One chain per relationship class, states keyed by symbol ID:
//! - `call_flow`: caller → callee, weighted by call count
//! - `cooccurrence`: symbols referenced within the same enclosing function
//!   (or file, for top-level references), weighted by frequency
//! - `type_affinity`: symbols sharing a base-type cluster
//!
//! `suggest_related` walks each selected chain breadth-first, multiplies
//! probabilities along a path, takes the max per target across chains, and
//! returns a ranked, capped list.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use sliver_core::config::MarkovConfig;
use sliver_core::error::StoreError;
use sliver_core::store::SymbolStore;

pub const CHAIN_CALL_FLOW: &str = "call_flow";
pub const CHAIN_COOCCURRENCE: &str = "cooccurrence";
pub const CHAIN_TYPE_AFFINITY: &str = "type_affinity";

/// Options for one `suggest_related` query.
#[derive(Debug, Clone)]
pub struct SuggestOptions {
    pub depth: u32,
    pub min_probability: f64,
    pub max_results: usize,
    /// Restrict to specific chains; `None` means all built chains.
    pub chains: Option<Vec<String>>,
}

impl Default for SuggestOptions {
    fn default() -> Self {
        Self::from_config(&MarkovConfig::default())
    }
}

impl SuggestOptions {
    pub fn from_config(config: &MarkovConfig) -> Self {
        SuggestOptions {
            depth: config.depth,
            min_probability: config.min_probability,
            max_results: config.max_results,
            chains: None,
        }
    }
}

/// One ranked suggestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub symbol_name: String,
    pub score: f64,
    pub depth: u32,
    /// Symbol names along the strongest path, start excluded.
    pub path: Vec<String>,
    pub file_path: String,
    pub explanation: Option<String>,
}

/// The full response: an empty `chains_used` distinguishes "no chains have
/// transitions for this symbol" from "chains missing entirely".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestResponse {
    pub symbol_name: String,
    pub suggestions: Vec<Suggestion>,
    pub chains_used: Vec<String>,
}

pub struct MarkovEngine;

impl MarkovEngine {
    pub fn new() -> Self {
        MarkovEngine
    }

    /// Rebuild every chain from the normalized tables.
    pub fn build_chains(&self, store: &mut SymbolStore) -> Result<(), StoreError> {
        self.build_call_flow(store)?;
        self.build_cooccurrence(store)?;
        self.build_type_affinity(store)?;
        Ok(())
    }

    fn build_call_flow(&self, store: &mut SymbolStore) -> Result<(), StoreError> {
        let mut transitions: HashMap<(String, String), u64> = HashMap::new();
        for edge in store.all_call_edges()? {
            let Some(callee_id) = edge.resolved_callee_id else {
                continue;
            };
            if callee_id == edge.caller_id {
                continue;
            }
            *transitions.entry((edge.caller_id, callee_id)).or_insert(0) +=
                edge.call_count as u64;
        }
        let rows = sorted_rows(transitions);
        debug!("call_flow chain: {} transitions", rows.len());
        store.replace_chain(CHAIN_CALL_FLOW, "caller to callee, weighted by call count", &rows)?;
        let files = store.files_with_call_edges()?;
        store.set_chain_file_deps(CHAIN_CALL_FLOW, &files)?;
        Ok(())
    }

    fn build_cooccurrence(&self, store: &mut SymbolStore) -> Result<(), StoreError> {
        // Group resolved references by enclosing function, falling back to
        // the file for top-level references.
        let mut groups: HashMap<String, Vec<String>> = HashMap::new();
        for reference in store.all_references()? {
            let Some(symbol_id) = reference.resolved_symbol_id else {
                continue;
            };
            let group = reference
                .referencing_symbol_id
                .unwrap_or_else(|| format!("file:{}", reference.file_path));
            groups.entry(group).or_default().push(symbol_id);
        }

        let mut transitions: HashMap<(String, String), u64> = HashMap::new();
        for mut members in groups.into_values() {
            members.sort();
            members.dedup();
            for a in &members {
                for b in &members {
                    if a != b {
                        *transitions.entry((a.clone(), b.clone())).or_insert(0) += 1;
                    }
                }
            }
        }
        let rows = sorted_rows(transitions);
        debug!("cooccurrence chain: {} transitions", rows.len());
        store.replace_chain(
            CHAIN_COOCCURRENCE,
            "symbols referenced within the same scope",
            &rows,
        )?;
        let files = store.files_with_references()?;
        store.set_chain_file_deps(CHAIN_COOCCURRENCE, &files)?;
        Ok(())
    }

    fn build_type_affinity(&self, store: &mut SymbolStore) -> Result<(), StoreError> {
        // Cluster sources by the base type they extend or implement.
        let mut clusters: HashMap<String, Vec<String>> = HashMap::new();
        for relation in store.all_type_relations()? {
            clusters
                .entry(relation.target_base_name)
                .or_default()
                .push(relation.source_id);
        }

        let mut transitions: HashMap<(String, String), u64> = HashMap::new();
        for mut members in clusters.into_values() {
            members.sort();
            members.dedup();
            for a in &members {
                for b in &members {
                    if a != b {
                        *transitions.entry((a.clone(), b.clone())).or_insert(0) += 1;
                    }
                }
            }
        }
        let rows = sorted_rows(transitions);
        store.replace_chain(
            CHAIN_TYPE_AFFINITY,
            "symbols sharing a base type cluster",
            &rows,
        )?;
        Ok(())
    }

    /// Ranked related-symbol suggestions for a symbol name.
    pub fn suggest_related(
        &self,
        store: &SymbolStore,
        symbol_name: &str,
        options: &SuggestOptions,
    ) -> Result<SuggestResponse, StoreError> {
        let start_ids: Vec<String> = store
            .symbols_named(symbol_name)?
            .into_iter()
            .map(|s| s.id)
            .collect();
        if start_ids.is_empty() {
            return Ok(SuggestResponse {
                symbol_name: symbol_name.to_string(),
                suggestions: Vec::new(),
                chains_used: Vec::new(),
            });
        }

        let chain_names: Vec<String> = match &options.chains {
            Some(selected) => selected.clone(),
            None => store.chains()?.into_iter().map(|c| c.name).collect(),
        };

        struct Candidate {
            score: f64,
            depth: u32,
            path: Vec<String>,
            chain: String,
        }

        let mut best: HashMap<String, Candidate> = HashMap::new();
        let mut chains_used: Vec<String> = Vec::new();

        for chain in &chain_names {
            // A chain counts as used when the start state has any outgoing
            // transitions, whether or not they survive the threshold.
            let mut chain_hit = false;
            for start in &start_ids {
                if !store.transitions_from(chain, start)?.is_empty() {
                    chain_hit = true;
                    break;
                }
            }
            if chain_hit {
                chains_used.push(chain.clone());
            } else {
                continue;
            }

            // (state, probability so far, depth, path of state ids)
            let mut queue: VecDeque<(String, f64, u32, Vec<String>)> = VecDeque::new();
            for start in &start_ids {
                queue.push_back((start.clone(), 1.0, 0, vec![start.clone()]));
            }

            while let Some((state, probability, depth, path)) = queue.pop_front() {
                if depth >= options.depth {
                    continue;
                }
                for transition in store.transitions_from(chain, &state)? {
                    let next_probability = probability * transition.probability;
                    if next_probability < options.min_probability {
                        continue;
                    }
                    let target = transition.to_state.clone();
                    if start_ids.contains(&target) || path.contains(&target) {
                        continue;
                    }
                    let mut next_path = path.clone();
                    next_path.push(target.clone());

                    let better = best
                        .get(&target)
                        .map_or(true, |existing| next_probability > existing.score);
                    if better {
                        best.insert(
                            target.clone(),
                            Candidate {
                                score: next_probability,
                                depth: depth + 1,
                                path: next_path.clone(),
                                chain: chain.clone(),
                            },
                        );
                    }
                    queue.push_back((target, next_probability, depth + 1, next_path));
                }
            }
        }

        let mut suggestions = Vec::with_capacity(best.len());
        for (target_id, candidate) in best {
            let Some(symbol) = store.get_symbol_by_id(&target_id)? else {
                continue;
            };
            let mut path_names = Vec::with_capacity(candidate.path.len().saturating_sub(1));
            for id in candidate.path.iter().skip(1) {
                if let Some(s) = store.get_symbol_by_id(id)? {
                    path_names.push(s.name);
                }
            }
            let explanation = Some(format!(
                "{}: {} → {} (p={:.3})",
                candidate.chain,
                symbol_name,
                path_names.join(" → "),
                candidate.score,
            ));
            suggestions.push(Suggestion {
                symbol_name: symbol.name.clone(),
                score: candidate.score,
                depth: candidate.depth,
                path: path_names,
                file_path: symbol.location.file_path.clone(),
                explanation,
            });
        }

        suggestions.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.symbol_name.cmp(&b.symbol_name))
        });
        suggestions.truncate(options.max_results);

        Ok(SuggestResponse {
            symbol_name: symbol_name.to_string(),
            suggestions,
            chains_used,
        })
    }
}

impl Default for MarkovEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn sorted_rows(transitions: HashMap<(String, String), u64>) -> Vec<(String, String, u64)> {
    let mut rows: Vec<(String, String, u64)> = transitions
        .into_iter()
        .map(|((from, to), count)| (from, to, count))
        .collect();
    rows.sort();
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use sliver_core::id;
    use sliver_core::types::{
        CallEdge, FileIndex, FunctionData, Language, Location, ParseStatus, Symbol, SymbolKind,
    };

    fn function_named(file: &str, name: &str, line: u32) -> Symbol {
        Symbol::function(
            id::symbol_id(file, name, SymbolKind::Function, line),
            name.to_string(),
            name.to_string(),
            SymbolKind::Function,
            format!("function {name}()"),
            Location::new(file, line, line + 2),
            FunctionData {
                local_name: name.to_string(),
                ..Default::default()
            },
        )
    }

    fn index_with(file: &str, symbols: Vec<Symbol>, calls: Vec<CallEdge>) -> FileIndex {
        FileIndex {
            file_path: file.to_string(),
            relative_path: file.trim_start_matches("/p/").to_string(),
            language: Language::Typescript,
            checksum: id::content_checksum(file.as_bytes()),
            last_modified: 0,
            summary: String::new(),
            line_count: 10,
            parse_status: ParseStatus::Complete,
            warnings: vec![],
            byte_size: None,
            symbols,
            imports: vec![],
            exports: vec![],
            references: vec![],
            calls,
            type_relations: vec![],
            config_entries: vec![],
        }
    }

    fn edge(caller: &Symbol, callee: &Symbol, count: u32) -> CallEdge {
        CallEdge {
            id: id::call_edge_id(&caller.id, &callee.name),
            caller_id: caller.id.clone(),
            caller_name: caller.name.clone(),
            callee_name: callee.name.clone(),
            resolved_callee_id: Some(callee.id.clone()),
            call_count: count,
            is_async: false,
            is_conditional: false,
        }
    }

    /// a calls b (3x) and c (1x); b calls c.
    fn seeded_store() -> SymbolStore {
        let mut store = SymbolStore::in_memory().unwrap();
        let file = "/p/app.ts";
        let a = function_named(file, "alpha", 1);
        let b = function_named(file, "beta", 10);
        let c = function_named(file, "gamma", 20);
        let calls = vec![edge(&a, &b, 3), edge(&a, &c, 1), edge(&b, &c, 1)];
        store
            .save_file(&index_with(file, vec![a, b, c], calls))
            .unwrap();
        MarkovEngine::new().build_chains(&mut store).unwrap();
        store
    }

    #[test]
    fn test_call_flow_probabilities() {
        let store = seeded_store();
        let a_id = store.symbols_named("alpha").unwrap()[0].id.clone();
        let transitions = store.transitions_from(CHAIN_CALL_FLOW, &a_id).unwrap();
        assert_eq!(transitions.len(), 2);
        let total: f64 = transitions.iter().map(|t| t.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!((transitions[0].probability - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_suggest_direct_and_transitive() {
        let store = seeded_store();
        let response = MarkovEngine::new()
            .suggest_related(&store, "alpha", &SuggestOptions::default())
            .unwrap();

        assert!(response.chains_used.contains(&CHAIN_CALL_FLOW.to_string()));
        let names: Vec<&str> = response
            .suggestions
            .iter()
            .map(|s| s.symbol_name.as_str())
            .collect();
        assert!(names.contains(&"beta"));
        assert!(names.contains(&"gamma"));

        let beta = response
            .suggestions
            .iter()
            .find(|s| s.symbol_name == "beta")
            .unwrap();
        assert!((beta.score - 0.75).abs() < 1e-9);
        assert_eq!(beta.depth, 1);

        // gamma direct (0.25) beats transitive through beta (0.75 * 1.0 =
        // 0.75): the max wins.
        let gamma = response
            .suggestions
            .iter()
            .find(|s| s.symbol_name == "gamma")
            .unwrap();
        assert!((gamma.score - 0.75).abs() < 1e-9);
        assert_eq!(gamma.path.last().map(String::as_str), Some("gamma"));
    }

    #[test]
    fn test_min_probability_filter() {
        let store = seeded_store();
        let response = MarkovEngine::new()
            .suggest_related(
                &store,
                "alpha",
                &SuggestOptions {
                    min_probability: 0.5,
                    ..Default::default()
                },
            )
            .unwrap();
        let names: Vec<&str> = response
            .suggestions
            .iter()
            .map(|s| s.symbol_name.as_str())
            .collect();
        assert!(names.contains(&"beta"));
        // 0.25 direct edge filtered; only the 0.75 path reaches gamma.
        assert!(response.suggestions.iter().all(|s| s.score >= 0.5));
    }

    #[test]
    fn test_isolated_symbol_reports_no_chains() {
        let mut store = SymbolStore::in_memory().unwrap();
        let file = "/p/solo.ts";
        let solo = function_named(file, "solo", 1);
        store.save_file(&index_with(file, vec![solo], vec![])).unwrap();
        MarkovEngine::new().build_chains(&mut store).unwrap();

        let response = MarkovEngine::new()
            .suggest_related(&store, "solo", &SuggestOptions::default())
            .unwrap();
        assert!(response.suggestions.is_empty());
        assert!(response.chains_used.is_empty());
    }

    #[test]
    fn test_max_results_cap() {
        let mut store = SymbolStore::in_memory().unwrap();
        let file = "/p/fan.ts";
        let hub = function_named(file, "hub", 1);
        let mut symbols = vec![hub.clone()];
        let mut calls = Vec::new();
        for i in 0..30 {
            let target = function_named(file, &format!("spoke{i:02}"), 10 + i);
            calls.push(edge(&hub, &target, 1));
            symbols.push(target);
        }
        store.save_file(&index_with(file, symbols, calls)).unwrap();
        MarkovEngine::new().build_chains(&mut store).unwrap();

        let response = MarkovEngine::new()
            .suggest_related(
                &store,
                "hub",
                &SuggestOptions {
                    min_probability: 0.0,
                    max_results: 5,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(response.suggestions.len(), 5);
    }
}
