// src/services/llm.rs
use futures::StreamExt;
use log::{debug, error, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::config::LlmConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Transport failure before or while talking to the provider.
    Request(String),
    /// The provider answered with a non-success status.
    Status { status: u16, body: String },
    /// The body broke off mid-stream.
    Stream(String),
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LlmError::Request(msg) => write!(f, "LLM request failed: {}", msg),
            LlmError::Status { status, body } => write!(f, "LLM returned {}: {}", status, body),
            LlmError::Stream(msg) => write!(f, "LLM stream failed: {}", msg),
        }
    }
}

impl std::error::Error for LlmError {}

/// Text fragments of the generated JSON, in arrival order.
pub type TextStream = ReceiverStream<Result<String, LlmError>>;

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    stream: bool,
    response_format: Value,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<Value>,
}

/// JSON schema of `ScenarioSet`, sent so the model answers with that object only.
pub fn scenario_schema() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "scenario_set",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "scenarios": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "event": { "type": "string" },
                                "description": { "type": "string" }
                            },
                            "required": ["event", "description"],
                            "additionalProperties": false
                        }
                    }
                },
                "required": ["scenarios"],
                "additionalProperties": false
            }
        }
    })
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    config: LlmConfig,
}

impl OpenAiClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Request(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }

    /// Starts a streaming completion and returns the content fragments.
    ///
    /// Fails before any text is produced if the provider is unreachable or
    /// rejects the request.
    pub async fn stream_scenarios(&self, prompt: &str) -> Result<TextStream, LlmError> {
        let payload = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![Message { role: "user", content: prompt }],
            stream: true,
            response_format: scenario_schema(),
        };

        info!("Requesting scenarios from {} (model {})", self.endpoint(), self.config.model);
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!("LLM HTTP request failed: {}", e);
                LlmError::Request(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("LLM returned status {}: {}", status, body);
            return Err(LlmError::Status { status: status.as_u16(), body });
        }

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut decoder = SseDecoder::default();

            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        error!("LLM stream broke off: {}", e);
                        let _ = tx.send(Err(LlmError::Stream(e.to_string()))).await;
                        return;
                    }
                };
                for event in decoder.push(&chunk) {
                    match event {
                        SseEvent::Text(text) => {
                            if tx.send(Ok(text)).await.is_err() {
                                debug!("LLM stream receiver dropped");
                                return;
                            }
                        }
                        SseEvent::Done => {
                            debug!("LLM stream finished");
                            return;
                        }
                        SseEvent::Error(msg) => {
                            let _ = tx.send(Err(LlmError::Stream(msg))).await;
                            return;
                        }
                    }
                }
            }
            match decoder.finish() {
                Some(SseEvent::Text(text)) => {
                    let _ = tx.send(Ok(text)).await;
                }
                Some(SseEvent::Error(msg)) => {
                    let _ = tx.send(Err(LlmError::Stream(msg))).await;
                }
                _ => {}
            }
        });

        Ok(ReceiverStream::new(rx))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    Text(String),
    Done,
    /// The provider reported an error in place of a chunk.
    Error(String),
}

/// Line-oriented decoder for the completion event stream.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
}

impl SseDecoder {
    /// Feeds raw bytes and returns every event whose line is complete.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.pending.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = parse_line(line.trim_end_matches(['\r', '\n'])) {
                events.push(event);
            }
        }
        events
    }

    /// Handles a final line that arrived without a trailing newline.
    pub fn finish(&mut self) -> Option<SseEvent> {
        if self.pending.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        parse_line(line.trim_end())
    }
}

fn parse_line(line: &str) -> Option<SseEvent> {
    let data = line.strip_prefix("data:")?.trim_start();
    if data == "[DONE]" {
        return Some(SseEvent::Done);
    }
    match serde_json::from_str::<CompletionChunk>(data) {
        Ok(CompletionChunk { error: Some(err), .. }) => {
            let msg = err
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            warn!("LLM stream reported an error: {}", msg);
            Some(SseEvent::Error(msg))
        }
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .filter(|text| !text.is_empty())
            .map(SseEvent::Text),
        Err(e) => {
            warn!("Skipping malformed LLM stream line: {}", e);
            None
        }
    }
}
