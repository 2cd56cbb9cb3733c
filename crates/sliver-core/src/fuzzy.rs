//! Edit-distance scoring for the hybrid search fallback.
//!
//! When the FTS index is unavailable or returns nothing, search falls back to
//! scanning a cached snapshot of (name, qualified name, signature) and scoring
//! each candidate here. Scores land in (0, 1]; candidates whose normalized
//! distance exceeds the threshold are dropped.

use serde::{Deserialize, Serialize};

/// Maximum normalized edit distance for a candidate to qualify.
pub const DISTANCE_THRESHOLD: f64 = 0.4;

/// Which indexed field produced the winning score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchField {
    Name,
    QualifiedName,
    Signature,
}

impl MatchField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchField::Name => "name",
            MatchField::QualifiedName => "qualified_name",
            MatchField::Signature => "signature",
        }
    }
}

/// Match metadata returned with each fuzzy hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyScore {
    pub score: f64,
    pub field: MatchField,
    /// Matched character ranges in the winning field, `[start, end)`.
    pub ranges: Vec<(usize, usize)>,
}

pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_len = a.chars().count();
    let b_len = b.chars().count();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut d = vec![vec![0; b_len + 1]; a_len + 1];

    for (i, row) in d.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, val) in d[0].iter_mut().enumerate() {
        *val = j;
    }

    for (i, ca) in a.chars().enumerate() {
        for (j, cb) in b.chars().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            d[i + 1][j + 1] = std::cmp::min(
                std::cmp::min(d[i][j + 1] + 1, d[i + 1][j] + 1),
                d[i][j] + cost,
            );
        }
    }

    d[a_len][b_len]
}

/// Matches query characters in order against the text, returning the matched
/// character positions collapsed into ranges. Abbreviations like `usrSvc`
/// against `UserService` land here.
fn subsequence_ranges(query_lower: &str, text_lower: &str) -> Option<Vec<(usize, usize)>> {
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    let mut query_chars = query_lower.chars();
    let mut needle = query_chars.next()?;

    for (pos, c) in text_lower.chars().enumerate() {
        if c != needle {
            continue;
        }
        match ranges.last_mut() {
            Some(last) if last.1 == pos => last.1 = pos + 1,
            _ => ranges.push((pos, pos + 1)),
        }
        match query_chars.next() {
            Some(next) => needle = next,
            None => return Some(ranges),
        }
    }
    None
}

/// Score `text` against `query`, case-insensitively.
///
/// Precedence: containment (scored by coverage), then normalized edit
/// distance within [`DISTANCE_THRESHOLD`], then in-order subsequence match.
fn score_text(query_lower: &str, text: &str) -> Option<(f64, Vec<(usize, usize)>)> {
    if query_lower.is_empty() || text.is_empty() {
        return None;
    }
    let text_lower = text.to_lowercase();
    let q_chars = query_lower.chars().count();
    let t_chars = text_lower.chars().count();

    if let Some(start) = text_lower.find(query_lower) {
        let char_start = text_lower[..start].chars().count();
        let coverage = q_chars as f64 / t_chars as f64;
        let score = 0.6 + 0.4 * coverage;
        return Some((score, vec![(char_start, char_start + q_chars)]));
    }

    let dist = levenshtein(query_lower, &text_lower);
    let max_len = std::cmp::max(q_chars, t_chars);
    let normalized = dist as f64 / max_len as f64;
    if normalized <= DISTANCE_THRESHOLD {
        return Some((1.0 - normalized, vec![(0, t_chars)]));
    }

    let ranges = subsequence_ranges(query_lower, &text_lower)?;
    let score = 0.3 + 0.4 * (q_chars as f64 / t_chars as f64);
    Some((score, ranges))
}

/// Score a (name, qualified name, signature) triple, keeping the best field.
pub fn score_symbol(
    query: &str,
    name: &str,
    qualified_name: &str,
    signature: &str,
) -> Option<FuzzyScore> {
    let query_lower = query.to_lowercase();
    let mut best: Option<FuzzyScore> = None;

    for (field, text) in [
        (MatchField::Name, name),
        (MatchField::QualifiedName, qualified_name),
        (MatchField::Signature, signature),
    ] {
        if let Some((score, ranges)) = score_text(&query_lower, text) {
            let better = best.as_ref().map_or(true, |b| score > b.score);
            if better {
                best = Some(FuzzyScore {
                    score,
                    field,
                    ranges,
                });
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", "abc"), 0);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }

    #[test]
    fn test_abbreviation_matches_as_subsequence() {
        let m = score_symbol("usrSvc", "UserService", "UserService", "class UserService")
            .expect("should match");
        assert!(m.score > 0.0 && m.score <= 1.0);
    }

    #[test]
    fn test_subsequence_ranges_collapse_runs() {
        let ranges = subsequence_ranges("usrsvc", "userservice").unwrap();
        // u, s at 0..2, r at 3, s at 4, v at 7, c at 9.
        assert_eq!(ranges, vec![(0, 2), (3, 5), (7, 8), (9, 10)]);
    }

    #[test]
    fn test_containment_beats_distance() {
        let m = score_symbol("Service", "UserService", "UserService", "").unwrap();
        assert_eq!(m.field, MatchField::Name);
        assert_eq!(m.ranges, vec![(4, 11)]);
        assert!(m.score > 0.6);
    }

    #[test]
    fn test_unrelated_name_rejected() {
        assert!(score_symbol("zzzz", "UserService", "UserService", "").is_none());
    }

    #[test]
    fn test_exact_match_scores_one() {
        let m = score_symbol("foo", "foo", "foo", "function foo()").unwrap();
        assert!((m.score - 1.0).abs() < 1e-9);
    }
}
