// Ambiguous function lookups return candidates; qualified names
// disambiguate.

use sliver_core::config::MarkovConfig;
use sliver_core::error::StoreError;
use sliver_engine::retrieve::{RetrievalApi, RetrieveError};

use crate::common::index_project;

const ROUTES: &str = "class Router {
  handler() {
    return 1;
  }
}

class Server {
  handler() {
    return 2;
  }
}
";

#[test]
fn duplicate_local_name_yields_candidates() {
    let (_dir, indexer) = index_project(&[("src/routes.ts", ROUTES)]);
    let api = RetrievalApi::new(indexer.store(), MarkovConfig::default());

    match api.get_function("routes.ts", "handler") {
        Err(RetrieveError::Store(StoreError::Ambiguous { candidates, .. })) => {
            assert_eq!(candidates, vec!["Router.handler", "Server.handler"]);
        }
        other => panic!("expected ambiguous error, got {other:?}"),
    }
}

#[test]
fn qualified_name_selects_the_specific_one() {
    let (_dir, indexer) = index_project(&[("src/routes.ts", ROUTES)]);
    let api = RetrievalApi::new(indexer.store(), MarkovConfig::default());

    let detail = api.get_function("routes.ts", "Router.handler").unwrap();
    assert_eq!(detail.symbol.qualified_name, "Router.handler");
    let data = detail.symbol.as_function().unwrap();
    assert_eq!(data.parent_class.as_deref(), Some("Router"));
}
