//! Prompt assembly: turns the running conversation into the message list
//! sent on each round, within a token budget.
//!
//! Message order is system prompt, earlier turns, the current request, then
//! for every completed round an assistant message (text plus tool calls)
//! followed by a user message carrying that round's tool results. Earlier
//! turns are laid out the same way: their prompt, their rounds with the
//! results they recorded, then their closing reply.
//!
//! When the estimate exceeds the budget, results of earlier turns' rounds are
//! replaced by [`ELIDED_RESULT`] oldest first, then the oldest earlier turns
//! are dropped, then the results of the current turn's older rounds are
//! elided. The system prompt, the current request and the latest round are
//! always kept whole.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::agent::{ToolCallRound, ToolCallsMetadata, ToolResults};
use crate::constants::{ELIDED_RESULT, TOKENS_CONVERSATION_FRAMING};
use crate::error::AgentError;
use crate::message::{ContentPart, Message, Role};

/// One completed exchange, as kept in session history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub prompt: String,
    pub response: String,
    #[serde(default)]
    pub tool_calls: ToolCallsMetadata,
}

/// Everything the assembler may draw on for one render.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub system_prompt: &'a str,
    pub history: &'a [ChatTurn],
    pub request: &'a str,
    pub rounds: &'a [ToolCallRound],
    pub results: &'a ToolResults,
}

/// Bookkeeping about one render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptStats {
    pub estimated_tokens: usize,
    pub budget: usize,
    pub history_turns_dropped: usize,
    pub rounds_elided: usize,
}

impl PromptStats {
    pub fn over_budget(&self) -> bool {
        self.estimated_tokens > self.budget
    }
}

#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    pub messages: Vec<Message>,
    pub stats: PromptStats,
}

/// Produces the messages for the next model request.
///
/// Implementations must be deterministic for the same inputs.
pub trait PromptAssembler: Send + Sync {
    fn render(
        &self,
        context: &PromptContext<'_>,
        budget: usize,
        counter: &dyn Fn(&Message) -> usize,
    ) -> Result<RenderedPrompt, AgentError>;
}

/// The default chat-transcript layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranscriptAssembler;

/// An earlier turn laid out as messages: the prompt, each tool round with
/// the results that turn recorded, then the text that followed the last
/// round.
struct TurnBlock<'a> {
    turn: &'a ChatTurn,
    prompt: Message,
    rounds: Vec<[Message; 2]>,
    reply: Option<Message>,
    elided: usize,
}

impl<'a> TurnBlock<'a> {
    fn new(turn: &'a ChatTurn) -> Self {
        let metadata = &turn.tool_calls;
        let rounds = metadata
            .rounds
            .iter()
            .map(|r| round_messages(r, &metadata.results, false))
            .collect();

        // The saved response repeats the text streamed during the rounds.
        let streamed: String = metadata
            .rounds
            .iter()
            .map(|r| r.response_text.as_str())
            .collect();
        let reply = turn
            .response
            .strip_prefix(streamed.as_str())
            .unwrap_or(&turn.response);
        let reply = (!reply.is_empty() || metadata.rounds.is_empty())
            .then(|| Message::assistant(reply));

        Self {
            turn,
            prompt: Message::user(turn.prompt.as_str()),
            rounds,
            reply,
            elided: 0,
        }
    }

    fn cost(&self, counter: &dyn Fn(&Message) -> usize) -> usize {
        counter(&self.prompt)
            + self.rounds.iter().map(|r| cost(r, counter)).sum::<usize>()
            + self.reply.as_ref().map_or(0, counter)
    }

    fn into_messages(self) -> impl Iterator<Item = Message> {
        std::iter::once(self.prompt)
            .chain(self.rounds.into_iter().flatten())
            .chain(self.reply)
    }
}

fn round_messages(round: &ToolCallRound, results: &ToolResults, elide: bool) -> [Message; 2] {
    let mut call_parts = Vec::with_capacity(round.tool_calls.len() + 1);
    if !round.response_text.is_empty() {
        call_parts.push(ContentPart::Text {
            text: round.response_text.clone(),
        });
    }
    call_parts.extend(
        round
            .tool_calls
            .iter()
            .map(|call| ContentPart::ToolCall { call: call.clone() }),
    );

    // One result per id; a repeated id in the round was only run once.
    let mut seen = HashSet::new();
    let result_parts = round
        .tool_calls
        .iter()
        .filter(|call| seen.insert(call.id.as_str()))
        .filter_map(|call| {
            let result = results.get(&call.id)?;
            let content = if elide {
                ELIDED_RESULT.to_string()
            } else {
                result.content.clone()
            };
            Some(ContentPart::ToolResult {
                call_id: call.id.clone(),
                name: call.name.clone(),
                content,
            })
        })
        .collect();

    [
        Message::new(Role::Assistant, call_parts),
        Message::new(Role::User, result_parts),
    ]
}

fn cost(messages: &[Message], counter: &dyn Fn(&Message) -> usize) -> usize {
    messages.iter().map(counter).sum()
}

/// Replace `slot` with its elided form when that saves tokens. Returns the
/// new running total, or `None` when nothing was saved.
fn elide_round(
    slot: &mut [Message; 2],
    round: &ToolCallRound,
    results: &ToolResults,
    total: usize,
    counter: &dyn Fn(&Message) -> usize,
) -> Option<usize> {
    let replacement = round_messages(round, results, true);
    let (before, after) = (cost(slot, counter), cost(&replacement, counter));
    if after >= before {
        return None;
    }
    *slot = replacement;
    Some(total - before + after)
}

impl PromptAssembler for TranscriptAssembler {
    fn render(
        &self,
        context: &PromptContext<'_>,
        budget: usize,
        counter: &dyn Fn(&Message) -> usize,
    ) -> Result<RenderedPrompt, AgentError> {
        if context.request.trim().is_empty() {
            return Err(AgentError::Prompt("empty request".into()));
        }

        let system = Message::system(context.system_prompt);
        let request = Message::user(context.request);
        let mut turns: Vec<TurnBlock<'_>> = context.history.iter().map(TurnBlock::new).collect();
        let mut rounds: Vec<[Message; 2]> = context
            .rounds
            .iter()
            .map(|r| round_messages(r, context.results, false))
            .collect();

        let mut total = TOKENS_CONVERSATION_FRAMING
            + counter(&system)
            + counter(&request)
            + turns.iter().map(|t| t.cost(counter)).sum::<usize>()
            + rounds.iter().map(|r| cost(r, counter)).sum::<usize>();

        // Earlier turns give way first: their tool results, then whole turns.
        'history: for block in turns.iter_mut() {
            let turn = block.turn;
            for (index, round) in turn.tool_calls.rounds.iter().enumerate() {
                if total <= budget {
                    break 'history;
                }
                let slot = &mut block.rounds[index];
                let results = &turn.tool_calls.results;
                if let Some(t) = elide_round(slot, round, results, total, counter) {
                    total = t;
                    block.elided += 1;
                }
            }
        }

        let mut dropped = 0;
        while total > budget && dropped < turns.len() {
            total -= turns[dropped].cost(counter);
            dropped += 1;
        }
        let mut elided: usize = turns[dropped..].iter().map(|t| t.elided).sum();

        let last_round = rounds.len().saturating_sub(1);
        for (index, round) in context.rounds.iter().enumerate().take(last_round) {
            if total <= budget {
                break;
            }
            let slot = &mut rounds[index];
            if let Some(t) = elide_round(slot, round, context.results, total, counter) {
                total = t;
                elided += 1;
            }
        }

        let stats = PromptStats {
            estimated_tokens: total,
            budget,
            history_turns_dropped: dropped,
            rounds_elided: elided,
        };
        if stats.over_budget() {
            tracing::warn!(
                estimated = total,
                budget,
                "prompt still exceeds the token budget after elision"
            );
        } else if dropped > 0 || elided > 0 {
            tracing::debug!(dropped, elided, estimated = total, "prompt trimmed to budget");
        }

        let mut messages = vec![system];
        messages.extend(turns.into_iter().skip(dropped).flat_map(TurnBlock::into_messages));
        messages.push(request);
        messages.extend(rounds.into_iter().flatten());

        Ok(RenderedPrompt { messages, stats })
    }
}
