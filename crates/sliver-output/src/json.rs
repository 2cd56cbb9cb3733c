//! Raw JSON rendering, for scripted consumers.

use serde::Serialize;

use sliver_core::store::{FileSummary, StoreStats};
use sliver_core::types::{ConfigEntry, IndexTotals};
use sliver_engine::markov::SuggestResponse;
use sliver_engine::retrieve::{
    ArchitectureOverview, CallTrace, ClassDetail, FunctionDetail, ReferencesResult,
    RelatedContext, SearchResults,
};

use crate::OutputFormatter;

pub struct JsonFormatter;

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}

impl OutputFormatter for JsonFormatter {
    fn format_search(&self, results: &SearchResults) -> String {
        to_json(results)
    }

    fn format_function(&self, detail: &FunctionDetail) -> String {
        to_json(detail)
    }

    fn format_class(&self, detail: &ClassDetail) -> String {
        to_json(detail)
    }

    fn format_references(&self, result: &ReferencesResult) -> String {
        to_json(result)
    }

    fn format_trace(&self, trace: &CallTrace) -> String {
        to_json(trace)
    }

    fn format_related(&self, context: &RelatedContext) -> String {
        to_json(context)
    }

    fn format_overview(&self, overview: &ArchitectureOverview) -> String {
        to_json(overview)
    }

    fn format_suggestions(&self, response: &SuggestResponse) -> String {
        to_json(response)
    }

    fn format_files(&self, files: &[FileSummary]) -> String {
        to_json(&files)
    }

    fn format_config_entries(&self, entries: &[ConfigEntry]) -> String {
        to_json(&entries)
    }

    fn format_stats(&self, stats: &StoreStats) -> String {
        to_json(stats)
    }

    fn format_index_totals(&self, totals: &IndexTotals) -> String {
        to_json(totals)
    }
}
