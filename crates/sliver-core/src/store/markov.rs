//! Markov chain storage: chain metadata, the sparse transition matrix, and
//! per-state normalization sums.
//!
//! The sums make incremental updates cheap: bumping `(s, t)` adjusts one
//! count, one sum, and renormalizes only the transitions out of `s`. For
//! every state with at least one outgoing transition, the outgoing
//! probabilities sum to 1.0 within float error.

use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::SymbolStore;

/// One row of a chain's sparse transition matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from_state: String,
    pub to_state: String,
    pub raw_count: u64,
    pub probability: f64,
}

/// Chain bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainMeta {
    pub name: String,
    pub description: String,
    pub state_count: u64,
    pub transition_count: u64,
    /// Seconds since the Unix epoch at build time.
    pub built_at: i64,
}

fn now_epoch() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

impl SymbolStore {
    /// Replace a chain wholesale: clears prior rows, inserts the raw counts,
    /// and computes per-state sums and probabilities in one transaction.
    pub fn replace_chain(
        &mut self,
        name: &str,
        description: &str,
        transitions: &[(String, String, u64)],
    ) -> Result<(), StoreError> {
        use std::collections::HashMap;

        let mut sums: HashMap<&str, u64> = HashMap::new();
        for (from, _, count) in transitions {
            *sums.entry(from.as_str()).or_insert(0) += count;
        }
        let state_count = {
            let mut states: std::collections::HashSet<&str> = std::collections::HashSet::new();
            for (from, to, _) in transitions {
                states.insert(from);
                states.insert(to);
            }
            states.len() as u64
        };

        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM markov_transitions WHERE chain = ?1", params![name])?;
        tx.execute("DELETE FROM markov_state_sums WHERE chain = ?1", params![name])?;

        for (from, to, count) in transitions {
            let total = sums[from.as_str()];
            let probability = if total > 0 {
                *count as f64 / total as f64
            } else {
                0.0
            };
            tx.execute(
                "INSERT INTO markov_transitions (chain, from_state, to_state, raw_count, probability)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![name, from, to, *count as i64, probability],
            )?;
        }
        for (state, total) in &sums {
            tx.execute(
                "INSERT INTO markov_state_sums (chain, state, total) VALUES (?1, ?2, ?3)",
                params![name, state, *total as i64],
            )?;
        }

        tx.execute(
            "INSERT INTO markov_chains (name, description, state_count, transition_count, built_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (name) DO UPDATE SET
                description = excluded.description,
                state_count = excluded.state_count,
                transition_count = excluded.transition_count,
                built_at = excluded.built_at",
            params![
                name,
                description,
                state_count as i64,
                transitions.len() as i64,
                now_epoch()
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Add `delta` observations of `(from, to)`. Only the transitions out of
    /// `from` are renormalized.
    pub fn increment_transition(
        &mut self,
        chain: &str,
        from: &str,
        to: &str,
        delta: u64,
    ) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO markov_transitions (chain, from_state, to_state, raw_count, probability)
             VALUES (?1, ?2, ?3, ?4, 0.0)
             ON CONFLICT (chain, from_state, to_state) DO UPDATE SET
                raw_count = raw_count + excluded.raw_count",
            params![chain, from, to, delta as i64],
        )?;
        tx.execute(
            "INSERT INTO markov_state_sums (chain, state, total) VALUES (?1, ?2, ?3)
             ON CONFLICT (chain, state) DO UPDATE SET total = total + excluded.total",
            params![chain, from, delta as i64],
        )?;
        tx.execute(
            "UPDATE markov_transitions
             SET probability = CAST(raw_count AS REAL) /
                 (SELECT total FROM markov_state_sums WHERE chain = ?1 AND state = ?2)
             WHERE chain = ?1 AND from_state = ?2",
            params![chain, from],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Outgoing transitions of a state, highest probability first.
    pub fn transitions_from(&self, chain: &str, state: &str) -> Result<Vec<Transition>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT from_state, to_state, raw_count, probability FROM markov_transitions
             WHERE chain = ?1 AND from_state = ?2
             ORDER BY probability DESC, to_state",
        )?;
        let rows = stmt
            .query_map(params![chain, state], |row| {
                Ok(Transition {
                    from_state: row.get(0)?,
                    to_state: row.get(1)?,
                    raw_count: row.get::<_, i64>(2)? as u64,
                    probability: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn chain_meta(&self, name: &str) -> Result<Option<ChainMeta>, StoreError> {
        let meta = self
            .conn
            .query_row(
                "SELECT name, description, state_count, transition_count, built_at
                 FROM markov_chains WHERE name = ?1",
                params![name],
                |row| {
                    Ok(ChainMeta {
                        name: row.get(0)?,
                        description: row.get(1)?,
                        state_count: row.get::<_, i64>(2)? as u64,
                        transition_count: row.get::<_, i64>(3)? as u64,
                        built_at: row.get(4)?,
                    })
                },
            )
            .map(Some)
            .or_else(crate::store::files::ignore_no_rows)?;
        Ok(meta)
    }

    pub fn chains(&self) -> Result<Vec<ChainMeta>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT name, description, state_count, transition_count, built_at
             FROM markov_chains ORDER BY name",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ChainMeta {
                    name: row.get(0)?,
                    description: row.get(1)?,
                    state_count: row.get::<_, i64>(2)? as u64,
                    transition_count: row.get::<_, i64>(3)? as u64,
                    built_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Record which files contributed observations to a chain.
    pub fn set_chain_file_deps(&mut self, chain: &str, files: &[String]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM markov_file_deps WHERE chain = ?1", params![chain])?;
        for file in files {
            tx.execute(
                "INSERT OR IGNORE INTO markov_file_deps (chain, file_path) VALUES (?1, ?2)",
                params![chain, file],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn chain_file_deps(&self, chain: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT file_path FROM markov_file_deps WHERE chain = ?1 ORDER BY file_path",
        )?;
        let rows = stmt
            .query_map(params![chain], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(from: &str, to: &str, count: u64) -> (String, String, u64) {
        (from.to_string(), to.to_string(), count)
    }

    fn row_probability_sum(store: &SymbolStore, chain: &str, state: &str) -> f64 {
        store
            .transitions_from(chain, state)
            .unwrap()
            .iter()
            .map(|tr| tr.probability)
            .sum()
    }

    #[test]
    fn test_replace_chain_normalizes_rows() {
        let mut store = SymbolStore::in_memory().unwrap();
        store
            .replace_chain(
                "call_flow",
                "caller to callee",
                &[t("a", "b", 3), t("a", "c", 1), t("b", "c", 5)],
            )
            .unwrap();

        let from_a = store.transitions_from("call_flow", "a").unwrap();
        assert_eq!(from_a.len(), 2);
        assert_eq!(from_a[0].to_state, "b");
        assert!((from_a[0].probability - 0.75).abs() < 1e-9);
        assert!((row_probability_sum(&store, "call_flow", "a") - 1.0).abs() < 1e-9);
        assert!((row_probability_sum(&store, "call_flow", "b") - 1.0).abs() < 1e-9);

        let meta = store.chain_meta("call_flow").unwrap().unwrap();
        assert_eq!(meta.state_count, 3);
        assert_eq!(meta.transition_count, 3);
    }

    #[test]
    fn test_increment_renormalizes_one_row() {
        let mut store = SymbolStore::in_memory().unwrap();
        store
            .replace_chain("call_flow", "", &[t("a", "b", 1), t("a", "c", 1)])
            .unwrap();

        store.increment_transition("call_flow", "a", "b", 2).unwrap();

        let from_a = store.transitions_from("call_flow", "a").unwrap();
        assert_eq!(from_a[0].to_state, "b");
        assert!((from_a[0].probability - 0.75).abs() < 1e-9);
        assert!((row_probability_sum(&store, "call_flow", "a") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_increment_creates_new_state() {
        let mut store = SymbolStore::in_memory().unwrap();
        store.increment_transition("cooccurrence", "x", "y", 1).unwrap();

        let from_x = store.transitions_from("cooccurrence", "x").unwrap();
        assert_eq!(from_x.len(), 1);
        assert!((from_x[0].probability - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_replace_clears_stale_transitions() {
        let mut store = SymbolStore::in_memory().unwrap();
        store
            .replace_chain("call_flow", "", &[t("a", "b", 1)])
            .unwrap();
        store
            .replace_chain("call_flow", "", &[t("c", "d", 1)])
            .unwrap();

        assert!(store.transitions_from("call_flow", "a").unwrap().is_empty());
        assert_eq!(store.transitions_from("call_flow", "c").unwrap().len(), 1);
    }

    #[test]
    fn test_chain_file_deps_replaced() {
        let mut store = SymbolStore::in_memory().unwrap();
        store
            .set_chain_file_deps("call_flow", &["/p/a.ts".into(), "/p/b.ts".into()])
            .unwrap();
        store.set_chain_file_deps("call_flow", &["/p/c.ts".into()]).unwrap();

        assert_eq!(store.chain_file_deps("call_flow").unwrap(), vec!["/p/c.ts"]);
    }
}
