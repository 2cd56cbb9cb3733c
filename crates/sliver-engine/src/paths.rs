//! User-supplied path hints to canonical indexed paths.
//!
//! Resolution order: exact absolute match, exact relative match, unambiguous
//! suffix match, unique basename match. Each step short-circuits on a unique
//! hit; multiple hits yield an error carrying the candidates.

use sliver_core::error::ResolveError;
use sliver_core::store::SymbolStore;

pub fn resolve_path(store: &SymbolStore, hint: &str) -> Result<String, ResolveError> {
    let hint = hint.trim().replace('\\', "/");
    if hint.is_empty() {
        return Err(ResolveError::NotFound(hint));
    }
    let pairs = store.file_path_pairs().map_err(ResolveError::Store)?;

    // Exact absolute.
    if let Some((absolute, _)) = pairs.iter().find(|(absolute, _)| *absolute == hint) {
        return Ok(absolute.clone());
    }

    // Exact relative.
    let relative_hits: Vec<&(String, String)> = pairs
        .iter()
        .filter(|(_, relative)| *relative == hint)
        .collect();
    match relative_hits.len() {
        1 => return Ok(relative_hits[0].0.clone()),
        n if n > 1 => {
            return Err(ambiguous(&hint, &relative_hits));
        }
        _ => {}
    }

    // Suffix match on either form, e.g. `storage/files.ts`.
    let suffix = format!("/{}", hint.trim_start_matches('/'));
    let suffix_hits: Vec<&(String, String)> = pairs
        .iter()
        .filter(|(absolute, relative)| {
            absolute.ends_with(&suffix) || relative.ends_with(&suffix)
        })
        .collect();
    match suffix_hits.len() {
        1 => return Ok(suffix_hits[0].0.clone()),
        n if n > 1 => return Err(ambiguous(&hint, &suffix_hits)),
        _ => {}
    }

    // Bare file name.
    let basename_hits: Vec<&(String, String)> = pairs
        .iter()
        .filter(|(absolute, _)| {
            absolute.rsplit('/').next().is_some_and(|name| name == hint)
        })
        .collect();
    match basename_hits.len() {
        1 => Ok(basename_hits[0].0.clone()),
        0 => Err(ResolveError::NotFound(hint)),
        _ => Err(ambiguous(&hint, &basename_hits)),
    }
}

fn ambiguous(hint: &str, hits: &[&(String, String)]) -> ResolveError {
    ResolveError::Ambiguous {
        hint: hint.to_string(),
        candidates: hits.iter().map(|(_, relative)| relative.clone()).collect(),
    }
}
