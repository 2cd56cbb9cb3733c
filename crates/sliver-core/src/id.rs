//! Deterministic identifier derivation.
//!
//! Every stored entity gets an 11-character base62 string computed from its
//! identity tuple, so re-indexing unchanged content yields identical IDs.
//! File content checksums use SHA-256 and are stored hex-encoded.

use sha2::{Digest, Sha256};
use xxhash_rust::xxh64::xxh64;

use crate::types::{ReferenceKind, SymbolKind, TypeRelationKind};

const BASE62_CHARS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Encode a u64 value as a base62 string (11 chars, zero-padded).
fn base62_encode(mut value: u64) -> String {
    if value == 0 {
        return "0".repeat(11);
    }
    let mut result = Vec::with_capacity(11);
    while value > 0 {
        let idx = (value % 62) as usize;
        result.push(BASE62_CHARS[idx]);
        value /= 62;
    }
    while result.len() < 11 {
        result.push(b'0');
    }
    result.reverse();
    String::from_utf8(result).expect("base62 chars are valid UTF-8")
}

fn hash_parts(parts: &[&str]) -> String {
    let mut input = String::with_capacity(parts.iter().map(|p| p.len() + 1).sum());
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            input.push('\0');
        }
        input.push_str(part);
    }
    base62_encode(xxh64(input.as_bytes(), 0))
}

/// ID of a symbol: derived from (file, qualified name, kind, start line).
pub fn symbol_id(file_path: &str, qualified_name: &str, kind: SymbolKind, start_line: u32) -> String {
    hash_parts(&[
        file_path,
        qualified_name,
        kind.as_str(),
        &start_line.to_string(),
    ])
}

/// ID of a reference occurrence.
pub fn reference_id(
    file_path: &str,
    symbol_name: &str,
    kind: ReferenceKind,
    line: u32,
    column: u32,
) -> String {
    hash_parts(&[
        file_path,
        symbol_name,
        kind.as_str(),
        &line.to_string(),
        &column.to_string(),
    ])
}

/// ID of a call edge, keyed by (caller, callee name).
pub fn call_edge_id(caller_id: &str, callee_name: &str) -> String {
    hash_parts(&[caller_id, callee_name])
}

/// ID of a type relationship edge.
pub fn type_relation_id(source_id: &str, target_name: &str, kind: TypeRelationKind) -> String {
    hash_parts(&[source_id, target_name, kind.as_str()])
}

/// ID of a configuration entry, keyed by (file, dotted path).
pub fn config_entry_id(file_path: &str, key_path: &str) -> String {
    hash_parts(&[file_path, key_path])
}

/// Hex-encoded SHA-256 of raw file content, used for change detection.
pub fn content_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(out, "{byte:02x}");
    }
    out
}
