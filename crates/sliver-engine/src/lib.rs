//! The sliver engine: everything between the parsers and the wire.
//!
//! - [`indexer`] — walks a tree, dispatches files to parsers, persists
//!   records with checksum-gated change detection
//! - [`resolve`] — the post-pass that links name-only references to symbol IDs
//! - [`markov`] — chain construction and ranked suggestion traversal
//! - [`paths`] — user path hints to canonical indexed paths
//! - [`retrieve`] — the query layer behind every agent-facing tool

pub mod indexer;
pub mod markov;
pub mod paths;
pub mod resolve;
pub mod retrieve;

use std::sync::{Arc, Mutex};

use sliver_core::store::SymbolStore;

/// Shared handle to the single-writer store.
pub type SharedStore = Arc<Mutex<SymbolStore>>;
