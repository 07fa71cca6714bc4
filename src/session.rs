//! Conversation state for one run of the tool.
//!
//! The history always starts with the system prompt. A successful
//! [`ConversationSession::generate`] leaves exactly the system prompt plus the
//! latest request/reply pair, so repeated regenerations never grow the payload.
//! A failed call leaves the history untouched.
//!
//! Sessions take `&mut self` for generation: one in-flight call per session.

use crate::core::error::AppError;
use crate::providers::{LLMProvider, Message};
use crate::stream::{CleanCommand, Sanitizer};
use tracing::debug;

/// Request/reply pairs kept after a successful generation.
const RETAINED_EXCHANGES: usize = 1;

pub struct ConversationSession {
    provider: Box<dyn LLMProvider>,
    sanitizer: Sanitizer,
    messages: Vec<Message>,
}

impl ConversationSession {
    pub fn new(
        provider: Box<dyn LLMProvider>,
        sanitizer: Sanitizer,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            sanitizer,
            messages: vec![Message::system(system_prompt)],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Asks the model for a command answering `request`.
    pub async fn generate(&mut self, request: &str) -> Result<CleanCommand, AppError> {
        // The user turn is provisional until a command comes back.
        let mut payload = self.messages.clone();
        payload.push(Message::user(request));

        debug!(
            request,
            model = self.provider.model(),
            messages = payload.len(),
            "generating command"
        );

        match self.request_command(&payload).await {
            Ok(command) => {
                self.commit(request, &command);
                Ok(command)
            }
            Err(e) => {
                debug!(
                    request,
                    model = self.provider.model(),
                    error = %e,
                    "generation failed, history unchanged"
                );
                Err(e)
            }
        }
    }

    async fn request_command(&self, payload: &[Message]) -> Result<CleanCommand, AppError> {
        let stream = self.provider.get_response_stream(payload).await?;
        self.sanitizer.accumulate(stream).await
    }

    fn commit(&mut self, request: &str, command: &CleanCommand) {
        self.messages.push(Message::user(request));

        // Everything but the system prompt and the newest turns goes before the reply lands.
        let keep = RETAINED_EXCHANGES * 2 - 1;
        let excess = (self.messages.len() - 1).saturating_sub(keep);
        self.messages.drain(1..1 + excess);

        self.messages.push(Message::assistant(command.as_str()));
    }
}
