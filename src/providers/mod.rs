use crate::core::error::AppError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One item of a streamed chat completion
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Incremental piece of generated text
    Delta(String),
    /// Finalized assistant message, emitted once the stream is exhausted
    Completed(Message),
}

pub type ResponseStream = BoxStream<'static, Result<StreamEvent, AppError>>;

#[async_trait]
pub trait LLMProvider {
    fn model(&self) -> &str;

    async fn get_response_stream(&self, messages: &[Message]) -> Result<ResponseStream, AppError>;
}

pub mod base_client;
pub mod openai;
