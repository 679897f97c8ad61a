//! Token estimates for prompt budgeting.
//!
//! The default estimate is a whitespace-delimited word count, which is what
//! local models tolerate well enough for budget enforcement. A BPE counter
//! (cl100k_base via tiktoken-rs) can be selected in config for tighter
//! estimates.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tiktoken_rs::CoreBPE;

use crate::constants::TOKENS_PER_MESSAGE_OVERHEAD;
use crate::message::Message;

/// Which estimator the config asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterKind {
    #[default]
    Words,
    Bpe,
}

/// Best-effort token counter.
#[derive(Clone)]
pub enum TokenCounter {
    Words,
    Bpe(Arc<CoreBPE>),
}

impl TokenCounter {
    pub fn from_kind(kind: CounterKind) -> Result<Self> {
        match kind {
            CounterKind::Words => Ok(Self::Words),
            CounterKind::Bpe => {
                let bpe = tiktoken_rs::cl100k_base().context("Failed to load cl100k_base tokenizer")?;
                Ok(Self::Bpe(Arc::new(bpe)))
            }
        }
    }

    pub fn count(&self, text: &str) -> usize {
        match self {
            Self::Words => text.split_whitespace().count(),
            Self::Bpe(bpe) => bpe.encode_ordinary(text).len(),
        }
    }

    /// Count a message including the per-message overhead.
    pub fn count_message(&self, message: &Message) -> usize {
        TOKENS_PER_MESSAGE_OVERHEAD + self.count(&message.flatten())
    }
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Words => write!(f, "TokenCounter::Words"),
            Self::Bpe(_) => write!(f, "TokenCounter::Bpe"),
        }
    }
}

/// Format a token count for display. Example: "1,234 / 4,096"
pub fn format_token_usage(used: usize, limit: usize) -> String {
    format!("{} / {}", format_number(used), format_number(limit))
}

fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_splits_on_any_whitespace() {
        let counter = TokenCounter::Words;
        assert_eq!(counter.count("list  files\tthen\ndelete them"), 5);
        assert_eq!(counter.count("   "), 0);
    }

    #[test]
    fn message_count_includes_overhead() {
        let counter = TokenCounter::Words;
        let message = Message::user("one two");
        assert_eq!(counter.count_message(&message), 2 + TOKENS_PER_MESSAGE_OVERHEAD);
    }

    #[test]
    fn usage_is_grouped_by_thousands() {
        assert_eq!(format_token_usage(1234, 4096), "1,234 / 4,096");
        assert_eq!(format_token_usage(12, 1_000_000), "12 / 1,000,000");
    }
}
