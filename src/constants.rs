//! Centralized constants for toolchat.
//!
//! All magic numbers, default strings, and configuration constants live here
//! so they can be changed in one place.

/// Application name used in CLI output and directory paths.
pub const APP_NAME: &str = "toolchat";

/// Default model name. Matched as a substring against installed Ollama models.
pub const DEFAULT_MODEL: &str = "qwen2.5-coder:7b";

/// Default base URL for the local Ollama server.
pub const OLLAMA_DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default prompt token budget handed to the prompt assembler.
pub const DEFAULT_MAX_INPUT_TOKENS: usize = 4096;

/// Default system prompt prepended to every request.
pub const DEFAULT_SYSTEM_PROMPT: &str = "The user will ask a question, or ask you to perform a task, and it may \
require lots of research to answer correctly. There is a selection of tools that let you perform \
actions or retrieve helpful context to answer the user's question. If you aren't sure which tool \
is relevant, you can call multiple tools. You can call tools repeatedly to take actions or gather \
as much context as needed until you have completed the task fully. Don't make assumptions about \
the situation; gather context first, then perform the task or answer the question. Don't ask the \
user for confirmation to use tools, just use them.";

/// Configuration filename.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Per-project configuration filename.
pub const PROJECT_CONFIG_FILENAME: &str = "toolchat.toml";

/// Readline history filename.
pub const HISTORY_FILENAME: &str = "chat_history.txt";

/// Default log filter when neither `RUST_LOG` nor `--verbose` is given.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

// --- Agent loop ---

/// Maximum number of model requests per user turn.
pub const DEFAULT_MAX_ROUNDS: usize = 16;

/// Capacity of the channel between the decode task and the agent loop.
pub const STREAM_CHANNEL_CAPACITY: usize = 256;

/// Maximum bytes buffered by the line decoder before the stream is abandoned.
pub const MAX_DECODE_BUFFER: usize = 16 * 1024 * 1024;

// --- Prompt assembly ---

/// Approximate token overhead per message (role markers, etc.).
pub const TOKENS_PER_MESSAGE_OVERHEAD: usize = 4;

/// Approximate token overhead for conversation framing.
pub const TOKENS_CONVERSATION_FRAMING: usize = 2;

/// Replacement text for tool results dropped to fit the token budget.
pub const ELIDED_RESULT: &str = "[tool result elided to fit the context window]";

// --- Tool limits ---

/// Default glob patterns excluded from file search and deletion.
pub const DEFAULT_EXCLUDES: &[&str] = &["**/node_modules/**"];

/// Default timeout for terminal commands, in seconds.
pub const COMMAND_DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum bytes of command output returned to the model.
pub const COMMAND_MAX_OUTPUT_SIZE: usize = 30_000;

/// Environment variables removed before spawning terminal commands.
pub const COMMAND_STRIPPED_ENV_VARS: &[&str] = &[
    "OPENAI_API_KEY",
    "ANTHROPIC_API_KEY",
    "OPENROUTER_API_KEY",
    "AWS_SECRET_ACCESS_KEY",
    "GITHUB_TOKEN",
];

/// Maximum number of paths the find tool lists.
pub const FIND_MAX_RESULTS: usize = 1000;
