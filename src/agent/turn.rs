//! Turn state management
//!
//! Tracks one user turn through the loop: completion rounds, dispatched tool
//! calls, and document references captured from search results. Nothing here
//! outlives the turn.

use serde_json::Value;

use crate::core::search_result_id;

/// State of a single user turn
#[derive(Debug, Clone)]
pub struct TurnState {
    /// Completion requests made so far (1-based once started)
    pub round: usize,
    /// Tool calls dispatched so far
    pub tool_calls: usize,
    /// Maximum tool calls allowed in this turn
    pub max_tool_calls: usize,
    /// Document ids captured from search results, in capture order
    pub doc_references: Vec<String>,
}

impl TurnState {
    /// Create a new turn state with the given cap
    pub fn new(max_tool_calls: usize) -> Self {
        Self {
            round: 0,
            tool_calls: 0,
            max_tool_calls,
            doc_references: Vec::new(),
        }
    }

    /// Advance to the next completion request
    pub fn next_round(&mut self) -> usize {
        self.round += 1;
        self.round
    }

    /// Whether another tool call fits under the cap
    pub fn can_dispatch(&self) -> bool {
        self.tool_calls < self.max_tool_calls
    }

    /// Count a dispatched tool call, capturing any document reference
    pub fn record_dispatch(&mut self, result: Option<&Value>) {
        self.tool_calls += 1;
        if let Some(id) = result.and_then(search_result_id) {
            self.doc_references.push(id);
        }
    }

    /// The most recently captured document id
    pub fn reference_doc_id(&self) -> Option<&str> {
        self.doc_references.last().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_turn_state_new() {
        let state = TurnState::new(10);
        assert_eq!(state.round, 0);
        assert_eq!(state.tool_calls, 0);
        assert!(state.doc_references.is_empty());
        assert!(state.reference_doc_id().is_none());
    }

    #[test]
    fn test_can_dispatch() {
        let mut state = TurnState::new(2);
        assert!(state.can_dispatch());

        state.record_dispatch(None);
        assert!(state.can_dispatch());

        state.record_dispatch(None);
        assert!(!state.can_dispatch()); // Reached the cap
    }

    #[test]
    fn test_captures_search_references() {
        let mut state = TurnState::new(10);
        state.record_dispatch(Some(&json!({"temperature_2m": 21.5})));
        state.record_dispatch(Some(&json!({"type": "search-result", "id": "doc1"})));
        state.record_dispatch(Some(&json!({"type": "search-result", "id": "doc2"})));

        assert_eq!(state.doc_references, vec!["doc1", "doc2"]);
        assert_eq!(state.reference_doc_id(), Some("doc2"));
        assert_eq!(state.tool_calls, 3);
    }
}
