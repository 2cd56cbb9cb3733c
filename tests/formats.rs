// Integration test entry point for rendering and chain properties.
#[path = "common/mod.rs"]
mod common;

#[path = "formats/test_format_equivalence.rs"]
mod test_format_equivalence;
#[path = "formats/test_markov_properties.rs"]
mod test_markov_properties;
