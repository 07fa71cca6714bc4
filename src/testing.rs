//! Scripted stand-ins for the model transport, the command runner and the terminal.

use crate::app::Interaction;
use crate::core::error::AppError;
use crate::core::executor::CommandRunner;
use crate::display::{FailureChoice, UserChoice};
use crate::providers::{LLMProvider, Message, ResponseStream, StreamEvent};
use crate::stream::CleanCommand;
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

type Reply = Result<Vec<Result<StreamEvent, AppError>>, AppError>;

/// Replays canned streams in order and records every request payload.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Reply>>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Streams `fragments` followed by their concatenation as the aggregate.
    pub fn reply(self, fragments: &[&str]) -> Self {
        let mut events: Vec<Result<StreamEvent, AppError>> = fragments
            .iter()
            .map(|f| Ok(StreamEvent::Delta(f.to_string())))
            .collect();
        events.push(Ok(StreamEvent::Completed(Message::assistant(
            fragments.concat(),
        ))));
        self.push(Ok(events))
    }

    /// Streams `fragments`, then a transport error.
    pub fn reply_then_fail(self, fragments: &[&str], err: AppError) -> Self {
        let mut events: Vec<Result<StreamEvent, AppError>> = fragments
            .iter()
            .map(|f| Ok(StreamEvent::Delta(f.to_string())))
            .collect();
        events.push(Err(err));
        self.push(Ok(events))
    }

    /// Fails before any stream is opened.
    pub fn fail(self, err: AppError) -> Self {
        self.push(Err(err))
    }

    pub fn requests(&self) -> Arc<Mutex<Vec<Vec<Message>>>> {
        Arc::clone(&self.requests)
    }

    fn push(self, reply: Reply) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn get_response_stream(&self, messages: &[Message]) -> Result<ResponseStream, AppError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::Api("no scripted reply left".to_string())));
        reply.map(|events| stream::iter(events).boxed())
    }
}

/// Fails commands listed in `failing` and records every command it was asked to run.
#[derive(Default)]
pub struct ScriptedRunner {
    failing: Vec<(String, String)>,
    ran: Arc<Mutex<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, command: &str, reason: &str) -> Self {
        self.failing.push((command.to_string(), reason.to_string()));
        self
    }

    pub fn ran(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.ran)
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &str) -> Result<(), AppError> {
        self.ran.lock().unwrap().push(command.to_string());
        match self.failing.iter().find(|(c, _)| c == command) {
            Some((_, reason)) => Err(AppError::Execution(reason.clone())),
            None => Ok(()),
        }
    }
}

/// What the scripted terminal saw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Presented(String),
    Executing(String),
    Finished(bool),
    FailureOffered(String),
    Notice(String),
}

/// Answers menu prompts from a fixed script.
#[derive(Default)]
pub struct ScriptedUi {
    choices: VecDeque<UserChoice>,
    failure_choices: VecDeque<FailureChoice>,
    events: Arc<Mutex<Vec<UiEvent>>>,
}

impl ScriptedUi {
    pub fn new(choices: &[UserChoice], failure_choices: &[FailureChoice]) -> Self {
        Self {
            choices: choices.iter().copied().collect(),
            failure_choices: failure_choices.iter().copied().collect(),
            events: Arc::default(),
        }
    }

    pub fn events(&self) -> Arc<Mutex<Vec<UiEvent>>> {
        Arc::clone(&self.events)
    }

    fn record(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl Interaction for ScriptedUi {
    fn present(&mut self, _request: &str, command: &CleanCommand) {
        self.record(UiEvent::Presented(command.to_string()));
    }

    fn choose(&mut self) -> Result<UserChoice, AppError> {
        self.choices
            .pop_front()
            .ok_or_else(|| AppError::Input("script ran out of choices".to_string()))
    }

    fn choose_after_failure(&mut self, reason: &str) -> Result<FailureChoice, AppError> {
        self.record(UiEvent::FailureOffered(reason.to_string()));
        self.failure_choices
            .pop_front()
            .ok_or_else(|| AppError::Input("script ran out of failure choices".to_string()))
    }

    fn executing(&mut self, command: &CleanCommand) {
        self.record(UiEvent::Executing(command.to_string()));
    }

    fn finished(&mut self, success: bool) {
        self.record(UiEvent::Finished(success));
    }

    fn notice(&mut self, message: &str) {
        self.record(UiEvent::Notice(message.to_string()));
    }
}
