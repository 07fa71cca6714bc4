use super::{LLMProvider, Message, ResponseStream, StreamEvent};
use crate::config::ApiConfig;
use crate::core::error::AppError;
use crate::providers::base_client::{HttpClient, sse_data_lines};
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f64,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Extracts the text carried by one `data:` payload, if any.
fn parse_delta(data: &str) -> Result<Option<String>, AppError> {
    let chunk: StreamChunk = serde_json::from_str(data)?;

    if let Some(error) = chunk.error {
        return Err(AppError::Api(format!("Stream reported an error: {}", error)));
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty()))
}

struct DeltaState {
    lines: BoxStream<'static, Result<String, AppError>>,
    content: String,
}

/// Turns `data:` payloads into deltas followed by one aggregate message.
fn delta_events(lines: BoxStream<'static, Result<String, AppError>>) -> ResponseStream {
    let state = DeltaState {
        lines,
        content: String::new(),
    };

    stream::unfold(Some(state), |state| async move {
        let mut state = state?;
        while let Some(item) = state.lines.next().await {
            match item.and_then(|data| parse_delta(&data)) {
                Ok(Some(text)) => {
                    state.content.push_str(&text);
                    return Some((Ok(StreamEvent::Delta(text)), Some(state)));
                }
                Ok(None) => continue,
                Err(e) => return Some((Err(e), None)),
            }
        }

        let aggregate = Message::assistant(std::mem::take(&mut state.content));
        Some((Ok(StreamEvent::Completed(aggregate)), None))
    })
    .boxed()
}

/// OpenAI-compatible chat completions transport
#[derive(Clone)]
pub struct OpenAIProvider {
    client: HttpClient,
    model: String,
    temperature: f64,
}

impl OpenAIProvider {
    pub fn new(config: &ApiConfig) -> Result<Self, AppError> {
        let client = HttpClient::new(
            config.url.clone(),
            config.key.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait::async_trait]
impl LLMProvider for OpenAIProvider {
    fn model(&self) -> &str {
        &self.model
    }

    async fn get_response_stream(&self, messages: &[Message]) -> Result<ResponseStream, AppError> {
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            stream: true,
        };

        debug!(
            endpoint = self.client.endpoint(),
            model = %self.model,
            messages = messages.len(),
            "requesting streamed completion"
        );

        let response = self.client.post("chat/completions", &payload).await?;

        let is_event_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("text/event-stream"));

        if is_event_stream {
            return Ok(delta_events(sse_data_lines(response)));
        }

        // Some compatible servers ignore `stream` and answer with a plain completion.
        debug!("endpoint answered without an event stream");
        let body = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&body)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        let event = Ok(StreamEvent::Completed(Message::assistant(content)));
        Ok(stream::iter([event]).boxed())
    }
}
