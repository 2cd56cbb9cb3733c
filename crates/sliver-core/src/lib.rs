//! Core types, deterministic IDs, and the SQLite symbol store for sliver.
//!
//! This crate provides the foundational pieces used across all sliver crates:
//! - [`types`] — The symbol model: files, symbols, references, edges
//! - [`error`] — The error taxonomy shared by store and retrieval layers
//! - [`id`] — Deterministic identifier derivation (base62 of xxhash64)
//! - [`config`] — Configuration loading from `.sliver/sliver.json`
//! - [`store`] — The [`SymbolStore`](store::SymbolStore), an embedded SQLite
//!   database with FTS5 search, graph tables, and Markov chain storage
//! - [`fuzzy`] — Edit-distance scoring used by the hybrid search fallback

pub mod config;
pub mod error;
pub mod fuzzy;
pub mod id;
pub mod store;
pub mod types;
