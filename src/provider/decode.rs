//! JSON-lines decoding for Ollama's streamed chat responses.
//!
//! Bytes arrive in arbitrary chunks. [`LineDecoder`] reassembles complete
//! lines (holding back partial lines and split UTF-8 sequences), and
//! [`parse_line`] turns one line into zero or more [`StreamPart`]s.
//! [`pump`] drives both from a byte stream onto the part channel.

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::{Stream, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::wire::StreamChunk;
use super::StreamPart;
use crate::error::BackendError;
use crate::message::ToolCallRequest;

/// Reassembles newline-terminated lines from arbitrary byte chunks.
#[derive(Debug)]
pub(crate) struct LineDecoder {
    buffer: String,
    pending_utf8: Vec<u8>,
    max_buffer: usize,
}

impl LineDecoder {
    pub fn new(max_buffer: usize) -> Self {
        Self {
            buffer: String::new(),
            pending_utf8: Vec::new(),
            max_buffer,
        }
    }

    /// Feed one chunk and return every line it completed.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, BackendError> {
        self.pending_utf8.extend_from_slice(bytes);
        if self.pending_utf8.len() > self.max_buffer || self.buffer.len() > self.max_buffer {
            self.buffer.clear();
            self.pending_utf8.clear();
            return Err(BackendError::BufferOverflow(self.max_buffer));
        }
        self.drain_utf8();

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line = self.buffer[..pos].trim_end_matches('\r').to_string();
            self.buffer.drain(..=pos);
            if !line.trim().is_empty() {
                lines.push(line);
            }
        }
        Ok(lines)
    }

    /// The unterminated remainder, once the byte stream has ended.
    pub fn finish(&mut self) -> Option<String> {
        if !self.pending_utf8.is_empty() {
            let rest = String::from_utf8_lossy(&self.pending_utf8).into_owned();
            self.buffer.push_str(&rest);
            self.pending_utf8.clear();
        }
        let line = std::mem::take(&mut self.buffer);
        let line = line.trim_end_matches('\r');
        (!line.trim().is_empty()).then(|| line.to_string())
    }

    /// Move complete UTF-8 sequences into the line buffer, keeping an
    /// incomplete trailing sequence for the next chunk.
    fn drain_utf8(&mut self) {
        loop {
            match std::str::from_utf8(&self.pending_utf8) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.pending_utf8.clear();
                    return;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    if let Ok(valid) = std::str::from_utf8(&self.pending_utf8[..valid_up_to]) {
                        self.buffer.push_str(valid);
                    }
                    match e.error_len() {
                        // Incomplete sequence at the end: wait for more bytes.
                        None => {
                            self.pending_utf8.drain(..valid_up_to);
                            return;
                        }
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            self.pending_utf8.drain(..valid_up_to + len);
                        }
                    }
                }
            }
        }
    }
}

/// Tool-call arguments normalised to a JSON object.
fn normalize_arguments(arguments: Value) -> Result<Value, serde_json::Error> {
    match arguments {
        Value::Null => Ok(Value::Object(Default::default())),
        Value::String(raw) => serde_json::from_str(&raw),
        other => Ok(other),
    }
}

/// Parse one complete line into stream parts.
///
/// Ids for tool calls come from `ids`, so they are unique per backend.
/// A call whose string arguments are not valid JSON is dropped with a
/// warning; the rest of the line still decodes.
pub(crate) fn parse_line(line: &str, ids: &AtomicU64) -> Result<Vec<StreamPart>, serde_json::Error> {
    let chunk: StreamChunk = serde_json::from_str(line)?;
    let mut parts = Vec::new();

    if let Some(message) = chunk.message {
        if let Some(text) = message.content.filter(|t| !t.is_empty()) {
            parts.push(StreamPart::Text(text));
        }
        for call in message.tool_calls.unwrap_or_default() {
            let name = call.function.name;
            let arguments = match normalize_arguments(call.function.arguments) {
                Ok(arguments) => arguments,
                Err(e) => {
                    tracing::warn!(tool = %name, error = %e, "dropping tool call with malformed arguments");
                    continue;
                }
            };
            let id = format!("call_{}", ids.fetch_add(1, Ordering::Relaxed));
            parts.push(StreamPart::ToolCall(ToolCallRequest {
                id,
                name,
                arguments,
            }));
        }
    }

    if chunk.done {
        tracing::debug!(
            prompt_tokens = chunk.prompt_eval_count.unwrap_or(0),
            completion_tokens = chunk.eval_count.unwrap_or(0),
            "response complete"
        );
    }

    Ok(parts)
}

/// Forward parsed parts; `false` once the receiver is gone.
async fn forward(
    tx: &mpsc::Sender<Result<StreamPart, BackendError>>,
    line: &str,
    ids: &AtomicU64,
) -> bool {
    match parse_line(line, ids) {
        Ok(parts) => {
            for part in parts {
                if tx.send(Ok(part)).await.is_err() {
                    return false;
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, line = %line, "skipping undecodable stream line");
        }
    }
    true
}

/// Decode `bytes` onto `tx` until the stream ends, fails, the receiver is
/// dropped or `cancel` fires.
pub(crate) async fn pump<S, B, E>(
    mut bytes: S,
    tx: mpsc::Sender<Result<StreamPart, BackendError>>,
    ids: &AtomicU64,
    max_buffer: usize,
    cancel: CancellationToken,
) where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut decoder = LineDecoder::new(max_buffer);
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("stream decode cancelled");
                return;
            }
            next = bytes.next() => next,
        };

        let chunk = match next {
            Some(Ok(chunk)) => chunk,
            Some(Err(e)) => {
                let _ = tx.send(Err(BackendError::Stream(e.to_string()))).await;
                return;
            }
            None => break,
        };

        let lines = match decoder.push(chunk.as_ref()) {
            Ok(lines) => lines,
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                return;
            }
        };
        for line in lines {
            if !forward(&tx, &line, ids).await {
                return;
            }
        }
    }

    if let Some(line) = decoder.finish() {
        forward(&tx, &line, ids).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parts_of(lines: &[&str]) -> Vec<StreamPart> {
        let ids = AtomicU64::new(0);
        lines
            .iter()
            .filter_map(|l| parse_line(l, &ids).ok())
            .flatten()
            .collect()
    }

    #[test]
    fn decoder_holds_partial_lines() {
        let mut decoder = LineDecoder::new(1024);
        assert!(decoder.push(b"{\"a\":").unwrap().is_empty());
        let lines = decoder.push(b"1}\n{\"b\"").unwrap();
        assert_eq!(lines, vec!["{\"a\":1}".to_string()]);
        assert_eq!(decoder.finish().as_deref(), Some("{\"b\""));
    }

    #[test]
    fn decoder_joins_split_utf8() {
        let mut decoder = LineDecoder::new(1024);
        let bytes = "héllo\n".as_bytes();
        // Split inside the two-byte 'é'.
        assert!(decoder.push(&bytes[..2]).unwrap().is_empty());
        let lines = decoder.push(&bytes[2..]).unwrap();
        assert_eq!(lines, vec!["héllo".to_string()]);
    }

    #[test]
    fn decoder_rejects_oversized_buffer() {
        let mut decoder = LineDecoder::new(8);
        let err = decoder.push(b"0123456789").unwrap_err();
        assert!(matches!(err, BackendError::BufferOverflow(8)));
    }

    #[test]
    fn text_and_tool_calls_are_decoded() {
        let parts = parts_of(&[
            r#"{"message":{"content":"Looking "},"done":false}"#,
            r#"{"message":{"content":"","tool_calls":[{"function":{"name":"find_files","arguments":{"pattern":"*.ts"}}}]},"done":false}"#,
        ]);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], StreamPart::Text("Looking ".into()));
        match &parts[1] {
            StreamPart::ToolCall(call) => {
                assert_eq!(call.id, "call_0");
                assert_eq!(call.name, "find_files");
                assert_eq!(call.arguments, json!({"pattern": "*.ts"}));
            }
            other => panic!("expected tool call, got {other:?}"),
        }
    }

    #[test]
    fn string_arguments_are_parsed() {
        let parts = parts_of(&[
            r#"{"message":{"tool_calls":[{"function":{"name":"count_tabs","arguments":"{\"tabGroup\":2}"}}]}}"#,
        ]);
        assert_eq!(
            parts,
            vec![StreamPart::ToolCall(ToolCallRequest {
                id: "call_0".into(),
                name: "count_tabs".into(),
                arguments: json!({"tabGroup": 2}),
            })]
        );
    }

    #[test]
    fn malformed_string_arguments_drop_only_that_call() {
        let parts = parts_of(&[
            r#"{"message":{"content":"ok","tool_calls":[{"function":{"name":"a","arguments":"{oops"}},{"function":{"name":"b","arguments":{}}}]}}"#,
        ]);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], StreamPart::Text("ok".into()));
        assert!(matches!(&parts[1], StreamPart::ToolCall(c) if c.name == "b"));
    }

    #[test]
    fn unparsable_line_is_skipped() {
        let good = [
            r#"{"message":{"content":"Hel"}}"#,
            r#"{"message":{"content":"lo"},"done":true}"#,
        ];
        let with_noise = [good[0], "{not json", good[1]];
        assert_eq!(parts_of(&good), parts_of(&with_noise));
    }

    #[tokio::test]
    async fn pump_parses_trailing_line_and_skips_noise() {
        let chunks: Vec<Result<Vec<u8>, String>> = vec![
            Ok(b"{\"message\":{\"content\":\"Do\"}}\ngarbage\n{\"mess".to_vec()),
            Ok(b"age\":{\"content\":\"ne.\"},\"done\":true}".to_vec()),
        ];
        let (tx, mut rx) = mpsc::channel(16);
        let ids = AtomicU64::new(0);
        pump(
            futures::stream::iter(chunks),
            tx,
            &ids,
            1024,
            CancellationToken::new(),
        )
        .await;

        let mut text = String::new();
        while let Some(part) = rx.recv().await {
            match part.unwrap() {
                StreamPart::Text(t) => text.push_str(&t),
                StreamPart::ToolCall(c) => panic!("unexpected call {c:?}"),
            }
        }
        assert_eq!(text, "Done.");
    }

    #[tokio::test]
    async fn pump_reports_read_errors() {
        let chunks: Vec<Result<Vec<u8>, String>> = vec![Err("connection reset".into())];
        let (tx, mut rx) = mpsc::channel(4);
        let ids = AtomicU64::new(0);
        pump(
            futures::stream::iter(chunks),
            tx,
            &ids,
            1024,
            CancellationToken::new(),
        )
        .await;
        let first = rx.recv().await.unwrap();
        assert!(matches!(first, Err(BackendError::Stream(_))));
        assert!(rx.recv().await.is_none());
    }
}
