//! Reduction of a streamed completion into one executable command.
//!
//! Fragments are concatenated in arrival order and sanitized once the stream
//! is exhausted. Sanitization strips the presentation artifacts models like to
//! add around a command: an opening code fence, the shell-name label that
//! follows it, and the closing fence.

use crate::core::error::AppError;
use crate::providers::{ResponseStream, StreamEvent};
use futures::StreamExt;
use regex::Regex;
use std::fmt;
use std::ops::Deref;
use tracing::debug;

const FENCE: &str = "```";

/// A non-empty, trimmed command with no surrounding fences or labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanCommand(String);

impl CleanCommand {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for CleanCommand {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CleanCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strips code fences and shell-name labels from model output.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    label: Option<Regex>,
}

impl Sanitizer {
    /// Builds a sanitizer recognising the given shell-name labels.
    pub fn new<S: AsRef<str>>(labels: &[S]) -> Result<Self, AppError> {
        let alternatives: Vec<String> = labels
            .iter()
            .map(|label| label.as_ref().trim())
            .filter(|label| !label.is_empty())
            .map(regex::escape)
            .collect();

        if alternatives.is_empty() {
            return Ok(Self { label: None });
        }

        // A label only counts when the rest of its line is blank.
        let pattern = format!(r"^(?i:{})[ \t]*(?:\r?\n|$)", alternatives.join("|"));
        let label = Regex::new(&pattern)
            .map_err(|e| AppError::Config(format!("Invalid shell label list: {}", e)))?;

        Ok(Self { label: Some(label) })
    }

    /// Runs the fence/label pass until the text stops changing.
    pub fn sanitize(&self, raw: &str) -> String {
        let mut current = raw.trim();
        loop {
            let next = self.strip_once(current);
            if next == current {
                return next.to_string();
            }
            current = next;
        }
    }

    fn strip_once<'a>(&self, text: &'a str) -> &'a str {
        let mut text = text.trim();

        if let Some(rest) = text.strip_prefix(FENCE) {
            text = rest;
            if let Some(label) = self.label.as_ref().and_then(|re| re.find(text)) {
                text = &text[label.end()..];
            }
        }

        if let Some(rest) = text.strip_suffix(FENCE) {
            text = rest;
        }

        text.trim()
    }

    /// Wraps already sanitized text, rejecting empty results.
    fn finish(&self, sanitized: String) -> Option<CleanCommand> {
        if sanitized.is_empty() {
            None
        } else {
            Some(CleanCommand(sanitized))
        }
    }

    /// Consumes the whole stream and returns the sanitized command.
    ///
    /// Transport errors abort accumulation. When the fragments sanitize to
    /// nothing, the aggregate message delivered at the end of the stream is
    /// used instead.
    pub async fn accumulate(&self, mut stream: ResponseStream) -> Result<CleanCommand, AppError> {
        let mut text = String::new();
        let mut aggregate = None;

        while let Some(event) = stream.next().await {
            match event? {
                StreamEvent::Delta(fragment) => {
                    debug!(%fragment, "received fragment");
                    text.push_str(&fragment);
                }
                StreamEvent::Completed(message) => aggregate = Some(message),
            }
        }

        if let Some(command) = self.finish(self.sanitize(&text)) {
            debug!(%command, "sanitized command");
            return Ok(command);
        }

        let fallback = aggregate
            .and_then(|message| self.finish(self.sanitize(&message.content)))
            .ok_or(AppError::EmptyResult)?;
        debug!(command = %fallback, "fragments were empty, used aggregate message");
        Ok(fallback)
    }
}
