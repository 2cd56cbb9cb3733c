// Hybrid search: abbreviation queries that match no FTS token still find
// their target through the fuzzy fallback, with a score in (0, 1].

use sliver_core::config::MarkovConfig;
use sliver_engine::retrieve::RetrievalApi;

use crate::common::index_project;

#[test]
fn abbreviation_falls_back_to_fuzzy_with_bounded_score() {
    let (_dir, indexer) = index_project(&[(
        "src/user_service.ts",
        "export class UserService {\n  create(): void {}\n}\n",
    )]);
    let api = RetrievalApi::new(indexer.store(), MarkovConfig::default());

    let results = api
        .search_symbols("usrSvc", None, None, 20, 0)
        .unwrap();
    assert!(!results.hits.is_empty());
    assert_eq!(results.hits[0].name, "UserService");
    let score = results.hits[0].score.expect("fuzzy hit carries a score");
    assert!(score > 0.0 && score <= 1.0);
}

#[test]
fn prefix_queries_use_the_index() {
    let (_dir, indexer) = index_project(&[(
        "src/user_service.ts",
        "export class UserService {\n  create(): void {}\n}\n",
    )]);
    let api = RetrievalApi::new(indexer.store(), MarkovConfig::default());

    let results = api.search_symbols("user", None, None, 20, 0).unwrap();
    assert!(results.hits.iter().any(|h| h.name == "UserService"));
}

#[test]
fn no_results_is_empty_not_error() {
    let (_dir, indexer) = index_project(&[("src/a.ts", "function foo() {}\n")]);
    let api = RetrievalApi::new(indexer.store(), MarkovConfig::default());

    let results = api
        .search_symbols("zzzzqqqq", None, None, 20, 0)
        .unwrap();
    assert!(results.hits.is_empty());
}
