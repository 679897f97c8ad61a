//! The tool-calling conversation loop.
//!
//! [`AgentLoop::run`] drives one user turn: render the prompt, stream one
//! model response, run the tool calls it asked for, record the round, and
//! go again until a round asks for no tools. Rounds never overlap; the calls
//! within a round run concurrently.

mod policy;
mod state;

use std::collections::HashSet;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::error::AgentError;
use crate::message::{Message, ToolCallRequest};
use crate::output::Renderer;
use crate::prompt::{ChatTurn, PromptAssembler, PromptContext};
use crate::provider::{ChatRequest, ModelBackend, StreamPart, ToolChoice};
use crate::tools::{ToolInvoker, ToolSpec};

pub use policy::{ForcedToolPolicy, PinnedTools};
pub use state::{LoopState, ToolCallRound, ToolCallsMetadata, ToolResults};

/// Loop settings taken from config.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub system_prompt: String,
    pub max_rounds: usize,
    pub forced_tool_policy: ForcedToolPolicy,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            system_prompt: crate::constants::DEFAULT_SYSTEM_PROMPT.to_string(),
            max_rounds: crate::constants::DEFAULT_MAX_ROUNDS,
            forced_tool_policy: ForcedToolPolicy::default(),
        }
    }
}

/// One user turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnRequest<'a> {
    pub prompt: &'a str,
    /// Earlier turns of the conversation, oldest first.
    pub history: &'a [ChatTurn],
    /// Tools referenced in the prompt, in mention order.
    pub pinned_tools: &'a [String],
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The last round asked for no tools.
    Completed,
    Cancelled,
    RoundLimitExceeded,
}

#[derive(Debug, Clone)]
pub struct LoopOutcome {
    pub metadata: ToolCallsMetadata,
    pub termination: Termination,
    /// All text streamed during the turn.
    pub response: String,
}

/// Runs turns against one backend, tool set and prompt layout.
pub struct AgentLoop<'a> {
    backend: &'a dyn ModelBackend,
    tools: &'a dyn ToolInvoker,
    assembler: &'a dyn PromptAssembler,
    settings: &'a AgentSettings,
}

impl<'a> AgentLoop<'a> {
    pub fn new(
        backend: &'a dyn ModelBackend,
        tools: &'a dyn ToolInvoker,
        assembler: &'a dyn PromptAssembler,
        settings: &'a AgentSettings,
    ) -> Self {
        Self {
            backend,
            tools,
            assembler,
            settings,
        }
    }

    /// Tools to offer for a round, and whether one of them is required.
    fn select_tools(&self, all: &[ToolSpec], pinned: Option<String>) -> (Vec<ToolSpec>, ToolChoice) {
        if let Some(name) = pinned {
            if let Some(spec) = all.iter().find(|t| t.name == name) {
                return (vec![spec.clone()], ToolChoice::Required(name));
            }
            tracing::warn!(tool = %name, "referenced tool is not available, offering all tools");
        }
        (all.to_vec(), ToolChoice::Auto)
    }

    /// Run one turn to completion, cancellation or the round limit.
    ///
    /// `prior` seeds the accumulated results so calls already answered in
    /// an earlier turn are not run again. A backend failure ends the turn
    /// with an error; everything else ends with a [`LoopOutcome`].
    pub async fn run(
        &self,
        request: TurnRequest<'_>,
        prior: Option<&ToolCallsMetadata>,
        sink: &mut dyn Renderer,
        cancel: CancellationToken,
    ) -> Result<LoopOutcome, AgentError> {
        let mut state = LoopState::seeded(prior);
        let mut pinned = PinnedTools::new(
            request.pinned_tools.to_vec(),
            self.settings.forced_tool_policy,
        );
        let definitions = self.tools.definitions();
        let budget = self.backend.max_input_tokens();
        let counter = |m: &Message| self.backend.count_message_tokens(m);
        let mut response = String::new();

        let finish = |state: LoopState, termination: Termination, response: String| LoopOutcome {
            metadata: state.into_metadata(),
            termination,
            response,
        };

        let mut round = 0;
        loop {
            if cancel.is_cancelled() {
                return Ok(finish(state, Termination::Cancelled, response));
            }
            if round >= self.settings.max_rounds {
                tracing::warn!(max_rounds = self.settings.max_rounds, "round limit reached");
                return Ok(finish(state, Termination::RoundLimitExceeded, response));
            }

            let context = PromptContext {
                system_prompt: &self.settings.system_prompt,
                history: request.history,
                request: request.prompt,
                rounds: &state.rounds,
                results: &state.results,
            };
            let rendered = self.assembler.render(&context, budget, &counter)?;
            state.messages = rendered.messages;

            let (tools, tool_choice) = self.select_tools(&definitions, pinned.next_for_round(round));
            tracing::debug!(
                round,
                messages = state.messages.len(),
                tokens = rendered.stats.estimated_tokens,
                ?tool_choice,
                "starting round"
            );
            let chat = ChatRequest {
                messages: state.messages.clone(),
                tools,
                tool_choice,
            };

            let mut stream = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Ok(finish(state, Termination::Cancelled, response));
                }
                sent = self.backend.send(chat, cancel.child_token()) => sent?,
            };

            let mut text = String::new();
            let mut calls: Vec<ToolCallRequest> = Vec::new();
            loop {
                let part = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return Ok(finish(state, Termination::Cancelled, response));
                    }
                    part = stream.next() => part,
                };
                match part {
                    None => break,
                    Some(Err(e)) => return Err(e.into()),
                    Some(Ok(StreamPart::Text(t))) => {
                        sink.render_token(&t);
                        text.push_str(&t);
                    }
                    Some(Ok(StreamPart::ToolCall(call))) => calls.push(call),
                }
            }
            response.push_str(&text);

            if calls.is_empty() {
                tracing::debug!(round, "round produced no tool calls, turn complete");
                return Ok(finish(state, Termination::Completed, response));
            }

            // Skip calls answered earlier, and duplicate ids within the round.
            let mut seen = HashSet::new();
            let pending: Vec<&ToolCallRequest> = calls
                .iter()
                .filter(|c| !state.results.contains(&c.id) && seen.insert(c.id.as_str()))
                .collect();
            tracing::debug!(round, calls = calls.len(), pending = pending.len(), "invoking tools");

            for call in &pending {
                sink.tool_start(&call.name, &call.arguments);
            }
            let invocations = pending
                .iter()
                .map(|call| self.tools.invoke(call, cancel.child_token()));
            let results = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Ok(finish(state, Termination::Cancelled, response));
                }
                results = join_all(invocations) => results,
            };
            if cancel.is_cancelled() {
                return Ok(finish(state, Termination::Cancelled, response));
            }

            for (call, result) in pending.iter().zip(results) {
                sink.tool_result(&call.name, &result);
                state.results.record(call.id.as_str(), result);
            }
            state.rounds.push(ToolCallRound {
                response_text: text,
                tool_calls: calls,
            });
            tracing::debug!(round, recorded = state.results.len(), "round recorded");
            round += 1;
        }
    }
}
