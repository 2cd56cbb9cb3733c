//! Hybrid symbol search: FTS5 first, fuzzy fallback second.
//!
//! Bare queries are rewritten to prefix queries before hitting the FTS
//! index. If the FTS call fails or returns nothing, search falls back to
//! scoring an in-memory snapshot of (name, qualified name, signature). The
//! snapshot is invalidated by a flag flipped on any write and rebuilt lazily
//! on the next miss.

use rusqlite::params;
use tracing::debug;

use crate::error::StoreError;
use crate::fuzzy::{self, FuzzyScore};
use crate::store::SymbolStore;
use crate::types::{Language, Symbol, SymbolKind};

/// Optional narrowing and pagination for a search.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub kind: Option<SymbolKind>,
    pub language: Option<Language>,
    pub limit: Option<usize>,
    pub offset: usize,
}

/// One search result. `score` and `fuzzy` are set only on the fallback path;
/// FTS hits arrive in index relevance order.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub symbol: Symbol,
    pub score: Option<f64>,
    pub fuzzy: Option<FuzzyScore>,
}

/// Snapshot row for the fuzzy fallback scan.
#[derive(Debug, Clone)]
pub(crate) struct FuzzyRow {
    pub id: String,
    pub name: String,
    pub qualified_name: String,
    pub signature: String,
    pub kind: String,
    pub language: String,
}

const DEFAULT_LIMIT: usize = 50;

impl SymbolStore {
    /// Full-text search over symbol names, qualified names, and signatures,
    /// with fuzzy fallback.
    pub fn search_symbols(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        // Queries made only of dots, underscores, and digits have no
        // searchable FTS tokens; go straight to the fallback.
        let degenerate = query
            .chars()
            .all(|c| c == '.' || c == '_' || c.is_ascii_digit());

        if !degenerate {
            match self.fts_search(query, filters) {
                Ok(hits) if !hits.is_empty() => return Ok(hits),
                Ok(_) => {}
                Err(e) => {
                    debug!("FTS search failed, using fuzzy fallback: {e}");
                }
            }
        }

        self.fuzzy_search(query, filters)
    }

    fn fts_search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let match_expr = rewrite_query(query);
        let limit = filters.limit.unwrap_or(DEFAULT_LIMIT);

        let mut sql = String::from(
            "SELECT s.record FROM symbols_fts f
             JOIN symbols s ON s.rowid = f.rowid
             JOIN files fl ON fl.file_path = s.file_path
             WHERE f.symbols_fts MATCH ?1",
        );
        if filters.kind.is_some() {
            sql.push_str(" AND s.kind = ?2");
        }
        if filters.language.is_some() {
            sql.push_str(" AND fl.language = ?3");
        }
        sql.push_str(" ORDER BY f.rank LIMIT ?4 OFFSET ?5");

        let kind = filters.kind.map(|k| k.as_str()).unwrap_or("");
        let language = filters.language.map(|l| l.as_str()).unwrap_or("");
        let mut stmt = self.conn.prepare(&sql)?;
        let records: Vec<String> = stmt
            .query_map(
                params![match_expr, kind, language, limit as i64, filters.offset as i64],
                |row| row.get(0),
            )?
            .collect::<Result<_, _>>()?;

        records
            .into_iter()
            .map(|r| {
                Ok(SearchHit {
                    symbol: serde_json::from_str(&r)?,
                    score: None,
                    fuzzy: None,
                })
            })
            .collect()
    }

    fn fuzzy_search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<SearchHit>, StoreError> {
        self.ensure_fuzzy_snapshot()?;
        let cache = self.fuzzy_cache.borrow();
        let rows = cache.as_ref().expect("snapshot built above");

        let mut scored: Vec<(f64, FuzzyScore, &FuzzyRow)> = rows
            .iter()
            .filter(|row| {
                filters
                    .kind
                    .map_or(true, |k| row.kind == k.as_str())
                    && filters
                        .language
                        .map_or(true, |l| row.language == l.as_str())
            })
            .filter_map(|row| {
                fuzzy::score_symbol(query, &row.name, &row.qualified_name, &row.signature)
                    .map(|m| (m.score, m, row))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.2.qualified_name.cmp(&b.2.qualified_name))
        });

        let limit = filters.limit.unwrap_or(DEFAULT_LIMIT);
        let ids: Vec<(String, f64, FuzzyScore)> = scored
            .into_iter()
            .skip(filters.offset)
            .take(limit)
            .map(|(score, m, row)| (row.id.clone(), score, m))
            .collect();
        drop(cache);

        let mut hits = Vec::with_capacity(ids.len());
        for (id, score, m) in ids {
            if let Some(symbol) = self.get_symbol_by_id(&id)? {
                hits.push(SearchHit {
                    symbol,
                    score: Some(score),
                    fuzzy: Some(m),
                });
            }
        }
        Ok(hits)
    }

    fn ensure_fuzzy_snapshot(&self) -> Result<(), StoreError> {
        if !self.fuzzy_dirty.get() && self.fuzzy_cache.borrow().is_some() {
            return Ok(());
        }
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.name, s.qualified_name, s.signature, s.kind, fl.language
             FROM symbols s JOIN files fl ON fl.file_path = s.file_path",
        )?;
        let rows: Vec<FuzzyRow> = stmt
            .query_map([], |row| {
                Ok(FuzzyRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    qualified_name: row.get(2)?,
                    signature: row.get(3)?,
                    kind: row.get(4)?,
                    language: row.get(5)?,
                })
            })?
            .collect::<Result<_, _>>()?;
        *self.fuzzy_cache.borrow_mut() = Some(rows);
        self.fuzzy_dirty.set(false);
        Ok(())
    }
}

/// FTS operator characters and keywords that disable the prefix rewrite.
fn has_fts_operators(query: &str) -> bool {
    query.chars().any(|c| "\"*():^+-".contains(c))
        || query
            .split_whitespace()
            .any(|t| matches!(t, "AND" | "OR" | "NOT" | "NEAR"))
}

/// Rewrite a bare query into a quoted prefix query; pass operator queries
/// through untouched.
fn rewrite_query(query: &str) -> String {
    if has_fts_operators(query) {
        return query.to_string();
    }
    query
        .split_whitespace()
        .map(|token| format!("\"{}\"*", token.replace('"', "")))
        .collect::<Vec<_>>()
        .join(" ")
}
