// Integration test entry point for end-to-end pipeline scenarios.
#[path = "common/mod.rs"]
mod common;

#[path = "pipeline/test_stable_ids.rs"]
mod test_stable_ids;
#[path = "pipeline/test_nested_attribution.rs"]
mod test_nested_attribution;
#[path = "pipeline/test_callback_naming.rs"]
mod test_callback_naming;
#[path = "pipeline/test_ambiguous_lookup.rs"]
mod test_ambiguous_lookup;
#[path = "pipeline/test_reference_deletion.rs"]
mod test_reference_deletion;
#[path = "pipeline/test_search_fallback.rs"]
mod test_search_fallback;
#[path = "pipeline/test_roundtrip_laws.rs"]
mod test_roundtrip_laws;
