//! Ollama `/api/chat` and `/api/tags` wire types, and the conversion from
//! toolchat's messages into them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ChatRequest, ToolChoice};
use crate::message::{ContentPart, Message, Role};
use crate::tools::ToolSpec;

// ── Request types ──────────────────────────────────────────────────

/// Body for `POST /api/chat`.
#[derive(Debug, Serialize)]
pub(crate) struct ChatBody {
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<WireTool>,
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireMessage {
    pub role: &'static str,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<WireToolCall>,
    /// Set on `tool` messages so the model can match results to calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireToolCall {
    pub function: WireFunctionCall,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireFunctionCall {
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireTool {
    #[serde(rename = "type")]
    pub tool_type: &'static str,
    pub function: WireFunctionDef,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireFunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl From<&ToolSpec> for WireTool {
    fn from(spec: &ToolSpec) -> Self {
        Self {
            tool_type: "function",
            function: WireFunctionDef {
                name: spec.name.clone(),
                description: spec.description.clone(),
                parameters: spec.parameters.clone(),
            },
        }
    }
}

fn plain(role: &'static str, content: String) -> WireMessage {
    WireMessage {
        role,
        content,
        tool_calls: Vec::new(),
        tool_name: None,
    }
}

/// Append the wire form of `message` to `out`.
///
/// Tool results become one `tool` message each; any text in the same
/// message follows them as a regular message.
fn push_message(out: &mut Vec<WireMessage>, message: &Message) {
    let role = match message.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    };

    if message.role == Role::Assistant {
        let tool_calls = message
            .tool_calls()
            .map(|call| WireToolCall {
                function: WireFunctionCall {
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                },
            })
            .collect();
        out.push(WireMessage {
            role,
            content: message.text(),
            tool_calls,
            tool_name: None,
        });
        return;
    }

    for part in &message.content {
        if let ContentPart::ToolResult { name, content, .. } = part {
            out.push(WireMessage {
                role: "tool",
                content: content.clone(),
                tool_calls: Vec::new(),
                tool_name: Some(name.clone()),
            });
        }
    }
    let text = message.text();
    let has_results = message
        .content
        .iter()
        .any(|p| matches!(p, ContentPart::ToolResult { .. }));
    if !text.is_empty() || !has_results {
        out.push(plain(role, text));
    }
}

impl ChatBody {
    /// Build the request body. Ollama has no tool-choice switch, so a
    /// required tool is expressed by offering only that tool and telling
    /// the model to call it.
    pub fn new(model: &str, request: &ChatRequest) -> Self {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        for message in &request.messages {
            push_message(&mut messages, message);
        }

        let tools = match &request.tool_choice {
            ToolChoice::Auto => request.tools.iter().map(WireTool::from).collect(),
            ToolChoice::Required(name) => {
                messages.push(plain(
                    "system",
                    format!("Call the `{name}` tool to answer."),
                ));
                request
                    .tools
                    .iter()
                    .filter(|t| &t.name == name)
                    .map(WireTool::from)
                    .collect()
            }
        };

        Self {
            model: model.to_string(),
            messages,
            tools,
            stream: true,
        }
    }
}

// ── Response types ─────────────────────────────────────────────────

/// One JSON line of a streamed `/api/chat` response.
#[derive(Debug, Deserialize)]
pub(crate) struct StreamChunk {
    #[serde(default)]
    pub message: Option<ChunkMessage>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    #[serde(default)]
    pub eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChunkMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ChunkToolCall>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChunkToolCall {
    pub function: ChunkFunction,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChunkFunction {
    pub name: String,
    /// An object, or a JSON-encoded string from some models.
    #[serde(default)]
    pub arguments: Value,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

/// Response of `GET /api/tags`.
#[derive(Debug, Deserialize)]
pub(crate) struct TagsResponse {
    #[serde(default)]
    pub models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagModel {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ToolCallRequest;
    use serde_json::json;

    fn spec(name: &str) -> ToolSpec {
        ToolSpec {
            name: name.into(),
            description: format!("{name} tool"),
            parameters: json!({"type": "object"}),
        }
    }

    #[test]
    fn tool_results_become_tool_messages() {
        let call = ToolCallRequest {
            id: "call_0".into(),
            name: "find_files".into(),
            arguments: json!({"pattern": "*.ts"}),
        };
        let request = ChatRequest {
            messages: vec![
                Message::user("list ts files"),
                Message::new(
                    Role::Assistant,
                    vec![ContentPart::ToolCall { call: call.clone() }],
                ),
                Message::new(
                    Role::User,
                    vec![ContentPart::ToolResult {
                        call_id: call.id.clone(),
                        name: call.name.clone(),
                        content: "Found 0 files".into(),
                    }],
                ),
            ],
            tools: vec![spec("find_files")],
            tool_choice: ToolChoice::Auto,
        };

        let body = serde_json::to_value(ChatBody::new("m", &request)).unwrap();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["tool_calls"][0]["function"]["name"], "find_files");
        assert_eq!(messages[2]["role"], "tool");
        assert_eq!(messages[2]["tool_name"], "find_files");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["stream"], true);
    }

    #[test]
    fn required_choice_offers_only_that_tool() {
        let request = ChatRequest {
            messages: vec![Message::user("how many tabs?")],
            tools: vec![spec("find_files"), spec("count_tabs")],
            tool_choice: ToolChoice::Required("count_tabs".into()),
        };

        let body = ChatBody::new("m", &request);
        assert_eq!(body.tools.len(), 1);
        assert_eq!(body.tools[0].function.name, "count_tabs");
        let last = body.messages.last().unwrap();
        assert_eq!(last.role, "system");
        assert!(last.content.contains("`count_tabs`"));
    }
}
