//! Which tool, if any, a round is forced to call.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// How pinned tools (`#tool` references) are spent across rounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForcedToolPolicy {
    /// Each round takes the next pinned tool until none are left.
    #[default]
    Consume,
    /// Only the first round may be forced; later pins are ignored.
    FirstRound,
}

/// Queue of tools pinned for one turn, in mention order.
#[derive(Debug, Clone)]
pub struct PinnedTools {
    queue: VecDeque<String>,
    policy: ForcedToolPolicy,
}

impl PinnedTools {
    pub fn new(pinned: Vec<String>, policy: ForcedToolPolicy) -> Self {
        Self {
            queue: pinned.into(),
            policy,
        }
    }

    /// Tool forced for `round` (0-based), consuming it from the queue.
    pub fn next_for_round(&mut self, round: usize) -> Option<String> {
        match self.policy {
            ForcedToolPolicy::Consume => self.queue.pop_front(),
            ForcedToolPolicy::FirstRound if round == 0 => self.queue.pop_front(),
            ForcedToolPolicy::FirstRound => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pins() -> Vec<String> {
        vec!["find_files".into(), "count_tabs".into()]
    }

    #[test]
    fn consume_spends_one_pin_per_round() {
        let mut pinned = PinnedTools::new(pins(), ForcedToolPolicy::Consume);
        assert_eq!(pinned.next_for_round(0).as_deref(), Some("find_files"));
        assert_eq!(pinned.next_for_round(1).as_deref(), Some("count_tabs"));
        assert_eq!(pinned.next_for_round(2), None);
    }

    #[test]
    fn first_round_only_forces_round_zero() {
        let mut pinned = PinnedTools::new(pins(), ForcedToolPolicy::FirstRound);
        assert_eq!(pinned.next_for_round(0).as_deref(), Some("find_files"));
        assert_eq!(pinned.next_for_round(1), None);
    }

    #[test]
    fn policy_reads_from_config_names() {
        let policy: ForcedToolPolicy = serde_json::from_str("\"first_round\"").unwrap();
        assert_eq!(policy, ForcedToolPolicy::FirstRound);
    }
}
