// Callback recognition through the full pipeline: test-framework naming,
// event contexts, array-method blocking, and span dedupe.

use sliver_core::types::SymbolKind;

use crate::common::index_project;

const TEST_FILE: &str = "describe(\"Auth flow\", () => {
  it(\"logs in\", () => {});
});

const doubled = [1, 2, 3].map(x => x + 1);
";

#[test]
fn test_framework_callbacks_named_from_first_string_argument() {
    let (_dir, indexer) = index_project(&[("src/auth.test.ts", TEST_FILE)]);
    let store = indexer.store();
    let guard = store.lock().unwrap();

    let file = &guard.file_paths().unwrap()[0];
    let callbacks: Vec<_> = guard
        .symbols_in_file(file)
        .unwrap()
        .into_iter()
        .filter(|s| s.kind == SymbolKind::Callback)
        .collect();
    assert_eq!(callbacks.len(), 2);

    let auth = callbacks.iter().find(|s| s.name == "Auth flow").unwrap();
    let auth_data = auth.as_function().unwrap();
    assert_eq!(auth_data.modifiers.callback_context.as_deref(), Some("describe"));

    let login = callbacks.iter().find(|s| s.name == "logs in").unwrap();
    let login_data = login.as_function().unwrap();
    assert_eq!(login_data.modifiers.callback_context.as_deref(), Some("it"));
}

#[test]
fn array_method_literals_produce_no_callbacks() {
    let (_dir, indexer) = index_project(&[("src/auth.test.ts", TEST_FILE)]);
    let store = indexer.store();
    let guard = store.lock().unwrap();

    let file = &guard.file_paths().unwrap()[0];
    let names: Vec<String> = guard
        .symbols_in_file(file)
        .unwrap()
        .into_iter()
        .filter(|s| s.kind == SymbolKind::Callback)
        .map(|s| s.name)
        .collect();
    // Only the two test callbacks; nothing from `.map`.
    assert_eq!(names.len(), 2);
}

#[test]
fn no_two_callbacks_share_a_span() {
    let source = "server.on(\"request\", (req) => {\n  handle(req);\n});\nclient.once(\"close\", () => {\n  cleanup();\n});\n";
    let (_dir, indexer) = index_project(&[("src/events.ts", source)]);
    let store = indexer.store();
    let guard = store.lock().unwrap();

    let file = &guard.file_paths().unwrap()[0];
    let mut spans: Vec<(u32, u32)> = guard
        .symbols_in_file(file)
        .unwrap()
        .into_iter()
        .filter(|s| s.kind == SymbolKind::Callback)
        .map(|s| (s.location.start_line, s.location.end_line))
        .collect();
    let total = spans.len();
    spans.sort();
    spans.dedup();
    assert_eq!(spans.len(), total);
}
