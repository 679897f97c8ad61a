//! Per-turn loop state and the metadata persisted between turns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::message::{Message, ToolCallRequest};
use crate::tools::ToolResult;

/// One model round that produced at least one tool call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRound {
    /// Concatenated text parts streamed during the round.
    pub response_text: String,
    pub tool_calls: Vec<ToolCallRequest>,
}

/// Tool results keyed by call id. A recorded result is never replaced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolResults(BTreeMap<String, ToolResult>);

impl ToolResults {
    /// Record `result` for `id`. Returns `false`, leaving the existing
    /// entry untouched, when `id` already has a result.
    pub fn record(&mut self, id: impl Into<String>, result: ToolResult) -> bool {
        use std::collections::btree_map::Entry;
        match self.0.entry(id.into()) {
            Entry::Vacant(slot) => {
                slot.insert(result);
                true
            }
            Entry::Occupied(slot) => {
                tracing::debug!(id = %slot.key(), "result already recorded, keeping the first");
                false
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&ToolResult> {
        self.0.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    /// Recorded call ids, in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What a finished turn hands back for persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallsMetadata {
    #[serde(default)]
    pub rounds: Vec<ToolCallRound>,
    #[serde(default)]
    pub results: ToolResults,
}

/// Mutable state of one agent run. Never shared between runs.
#[derive(Debug, Default)]
pub struct LoopState {
    /// Messages most recently sent to the model.
    pub messages: Vec<Message>,
    pub results: ToolResults,
    pub rounds: Vec<ToolCallRound>,
}

impl LoopState {
    /// Start a run. Only the prior results carry over; prior rounds belong
    /// to the earlier turn.
    pub fn seeded(prior: Option<&ToolCallsMetadata>) -> Self {
        Self {
            messages: Vec::new(),
            results: prior.map(|m| m.results.clone()).unwrap_or_default(),
            rounds: Vec::new(),
        }
    }

    pub fn into_metadata(self) -> ToolCallsMetadata {
        ToolCallsMetadata {
            rounds: self.rounds,
            results: self.results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_never_overwrites() {
        let mut results = ToolResults::default();
        assert!(results.record("call_0", ToolResult::success("first".into())));
        assert!(!results.record("call_0", ToolResult::error("second".into())));
        assert_eq!(results.get("call_0").unwrap().content, "first");
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn metadata_serializes_results_as_a_map() {
        let mut metadata = ToolCallsMetadata::default();
        metadata
            .results
            .record("call_3", ToolResult::success("ok".into()));
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["results"]["call_3"]["content"], "ok");
        let back: ToolCallsMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(back, metadata);
    }

    #[test]
    fn seeding_keeps_results_only() {
        let mut prior = ToolCallsMetadata::default();
        prior.rounds.push(ToolCallRound::default());
        prior.results.record("call_0", ToolResult::success("x".into()));
        let state = LoopState::seeded(Some(&prior));
        assert!(state.rounds.is_empty());
        assert!(state.results.contains("call_0"));
    }
}
