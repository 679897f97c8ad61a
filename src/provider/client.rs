//! Ollama chat client.
//!
//! [`OllamaBackend`] posts the rendered conversation to `/api/chat` with
//! streaming enabled and hands the body to a spawned decode task, which
//! feeds parsed parts into the returned [`ResponseStream`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::decode;
use super::wire::{ChatBody, ErrorBody};
use super::{ChatRequest, ModelBackend, ResponseStream};
use crate::constants::{MAX_DECODE_BUFFER, STREAM_CHANNEL_CAPACITY};
use crate::error::BackendError;
use crate::message::Message;
use crate::tokens::TokenCounter;

/// A local Ollama server serving one model.
pub struct OllamaBackend {
    http: reqwest::Client,
    base_url: String,
    model: String,
    counter: TokenCounter,
    max_input_tokens: usize,
    /// Source of tool-call ids; shared with every decode task.
    next_call_id: Arc<AtomicU64>,
}

impl OllamaBackend {
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        counter: TokenCounter,
        max_input_tokens: usize,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            counter,
            max_input_tokens,
            next_call_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number new tool calls after every `call_{n}` id in `seen`, so results
    /// loaded from a resumed session never match a fresh call.
    pub fn continue_call_ids<'s>(&self, seen: impl IntoIterator<Item = &'s str>) {
        let next = seen
            .into_iter()
            .filter_map(|id| id.strip_prefix("call_")?.parse::<u64>().ok())
            .map(|n| n + 1)
            .max()
            .unwrap_or(0);
        self.next_call_id.fetch_max(next, Ordering::Relaxed);
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn max_input_tokens(&self) -> usize {
        self.max_input_tokens
    }

    fn count_tokens(&self, text: &str) -> usize {
        self.counter.count(text)
    }

    fn count_message_tokens(&self, message: &Message) -> usize {
        self.counter.count_message(message)
    }

    async fn send(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
    ) -> Result<ResponseStream, BackendError> {
        let body = ChatBody::new(&self.model, &request);
        let url = format!("{}/api/chat", self.base_url);
        tracing::debug!(
            model = %self.model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            "sending chat request"
        );

        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = serde_json::from_str::<ErrorBody>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let (tx, stream) = ResponseStream::channel(STREAM_CHANNEL_CAPACITY);
        let ids = Arc::clone(&self.next_call_id);
        tokio::spawn(async move {
            let bytes = Box::pin(response.bytes_stream());
            decode::pump(bytes, tx, &ids, MAX_DECODE_BUFFER, cancel).await;
        });
        Ok(stream)
    }
}
