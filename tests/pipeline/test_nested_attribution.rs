// Nested function extraction through the full pipeline: attribution,
// depth tracking, and the emitted-set invariants.

use crate::common::index_project;

const NESTED_SOURCE: &str = "function outer() {
  function inner() {
    const a = 1;
    const b = 2;
    const c = 3;
    const d = 4;
    const e = 5;
    const f = 6;
    const g = 7;
    return a + b + c;
  }
  return inner;
}
";

#[test]
fn nested_function_attributed_to_enclosing() {
    let (_dir, indexer) = index_project(&[("src/nest.ts", NESTED_SOURCE)]);
    let store = indexer.store();
    let guard = store.lock().unwrap();

    let outer = &guard.symbols_named("outer").unwrap()[0];
    assert_eq!(outer.nesting_depth(), 0);
    assert!(outer.parent_function().is_none());

    let inner = &guard.symbols_named("inner").unwrap()[0];
    assert_eq!(inner.qualified_name, "outer.inner");
    assert_eq!(inner.parent_function(), Some("outer"));
    assert_eq!(inner.nesting_depth(), 1);
}

#[test]
fn emitted_set_respects_depth_and_intermediate_invariants() {
    let source = "function a() {
  function b() {
    function c() {
      function d() {
        function e() {
          const x = 1;
          const y = 2;
          return x + y;
        }
        return e;
      }
      return d;
    }
    return c;
  }
  return b;
}
";
    let (_dir, indexer) = index_project(&[("src/deep.ts", source)]);
    let store = indexer.store();
    let guard = store.lock().unwrap();
    let symbols = guard.symbols_in_file(&guard.file_paths().unwrap()[0]).unwrap();

    // Depth never exceeds 3, and the depth-4 function is absent.
    assert!(symbols.iter().all(|s| s.nesting_depth() <= 3));
    assert!(!symbols.iter().any(|s| s.name == "e"));

    // Every parent_function is itself in the emitted set, and no emitted
    // function skips over an emitted intermediate ancestor.
    for symbol in &symbols {
        if let Some(parent) = symbol.parent_function() {
            let parent_symbol = symbols
                .iter()
                .find(|s| s.qualified_name == parent)
                .unwrap_or_else(|| panic!("parent {parent} not emitted"));
            assert_eq!(
                symbol.nesting_depth(),
                parent_symbol.nesting_depth() + 1,
                "{} skips an intermediate ancestor",
                symbol.qualified_name
            );
        }
    }
}

#[test]
fn short_nested_functions_not_emitted() {
    let source = "function outer() {\n  function tiny() { return 1; }\n  return tiny;\n}\n";
    let (_dir, indexer) = index_project(&[("src/short.ts", source)]);
    let store = indexer.store();
    let guard = store.lock().unwrap();
    assert!(guard.symbols_named("tiny").unwrap().is_empty());
}
