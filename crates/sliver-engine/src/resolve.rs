//! Cross-file resolution: back-fills null ID fields on call edges, type
//! relationships, and references once all files are indexed.
//!
//! Resolution is name-based and takes the first candidate in (file path,
//! start line) order, which makes the pass deterministic across runs. The
//! store only writes where the stored ID is still null, so re-running the
//! pass on a fully resolved store performs no writes.

use std::collections::HashMap;

use tracing::debug;

use sliver_core::error::StoreError;
use sliver_core::store::SymbolStore;
use sliver_core::types::SymbolKind;

/// Totals for one resolver pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveTotals {
    pub calls_resolved: usize,
    pub types_resolved: usize,
    pub references_resolved: usize,
}

pub fn resolve_symbol_references(store: &mut SymbolStore) -> Result<ResolveTotals, StoreError> {
    // One snapshot of the name index serves all three passes. Rows arrive in
    // (name, file, line) order, so the first insert per name wins.
    let mut first_by_name: HashMap<String, String> = HashMap::new();
    let mut first_type_by_name: HashMap<String, String> = HashMap::new();
    for (name, id, kind) in store.symbol_name_index()? {
        first_by_name.entry(name.clone()).or_insert_with(|| id.clone());
        if matches!(kind, SymbolKind::Class | SymbolKind::Interface) {
            first_type_by_name.entry(name).or_insert(id);
        }
    }

    let mut totals = ResolveTotals::default();

    for (edge_id, callee_name) in store.unresolved_call_edges()? {
        if let Some(symbol_id) = first_by_name.get(&callee_name) {
            if store.set_call_edge_target(&edge_id, symbol_id)? {
                totals.calls_resolved += 1;
            }
        }
    }

    for (relation_id, target_base) in store.unresolved_type_relations()? {
        if let Some(symbol_id) = first_type_by_name.get(&target_base) {
            if store.set_type_relation_target(&relation_id, symbol_id)? {
                totals.types_resolved += 1;
            }
        }
    }

    for (reference_id, symbol_name) in store.unresolved_references()? {
        if let Some(symbol_id) = first_by_name.get(&symbol_name) {
            if store.set_reference_target(&reference_id, symbol_id)? {
                totals.references_resolved += 1;
            }
        }
    }

    debug!(
        "resolver pass: {} calls, {} type edges, {} references",
        totals.calls_resolved, totals.types_resolved, totals.references_resolved
    );
    Ok(totals)
}
