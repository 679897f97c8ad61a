//! Model backend abstraction for toolchat.
//!
//! The agent loop talks to a [`ModelBackend`]: it sends the rendered
//! conversation plus the offered tools and gets back a [`ResponseStream`] of
//! text increments and fully-assembled tool calls, in arrival order. The
//! only production backend is [`OllamaBackend`], which speaks Ollama's
//! JSON-lines `/api/chat` protocol.

mod client;
mod decode;
mod listing;
mod wire;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::BackendError;
use crate::message::{Message, ToolCallRequest};
use crate::tools::ToolSpec;

pub use client::OllamaBackend;
pub use listing::{discover_model, list_models, print_models};

/// How the model may use the offered tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolChoice {
    /// The model may call any offered tool, or none.
    Auto,
    /// The model must call the named tool.
    Required(String),
}

/// One model request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSpec>,
    pub tool_choice: ToolChoice,
}

/// One decoded element of a streamed response.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamPart {
    Text(String),
    ToolCall(ToolCallRequest),
}

/// Ordered stream of decoded parts produced by a backend's decode task.
///
/// Ends when the response is complete. A backend error is delivered in
/// place and ends the stream.
pub struct ResponseStream {
    rx: mpsc::Receiver<Result<StreamPart, BackendError>>,
}

impl ResponseStream {
    /// Create a stream together with the sender its producer writes to.
    pub fn channel(capacity: usize) -> (mpsc::Sender<Result<StreamPart, BackendError>>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self { rx })
    }

    /// Next part, or `None` once the producer is finished.
    pub async fn next(&mut self) -> Option<Result<StreamPart, BackendError>> {
        self.rx.recv().await
    }
}

/// A streaming chat model.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Name of the model requests are sent to.
    fn model_name(&self) -> &str;

    /// Prompt token budget for this model.
    fn max_input_tokens(&self) -> usize;

    /// Estimated token count of `text`.
    fn count_tokens(&self, text: &str) -> usize;

    /// Estimated token count of a whole message, overhead included.
    fn count_message_tokens(&self, message: &Message) -> usize;

    /// Start a streamed request.
    ///
    /// Returns once the response headers arrive; the body is decoded in the
    /// background until it ends, the stream is dropped or `cancel` fires.
    async fn send(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
    ) -> Result<ResponseStream, BackendError>;
}
