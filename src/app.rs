use crate::core::error::AppError;
use crate::core::executor::CommandRunner;
use crate::display::{FailureChoice, UserChoice};
use crate::session::ConversationSession;
use crate::stream::CleanCommand;
use tracing::debug;

/// Terminal side of the command loop
pub trait Interaction {
    fn present(&mut self, request: &str, command: &CleanCommand);
    fn choose(&mut self) -> Result<UserChoice, AppError>;
    fn choose_after_failure(&mut self, reason: &str) -> Result<FailureChoice, AppError>;
    fn executing(&mut self, command: &CleanCommand);
    fn finished(&mut self, success: bool);
    fn notice(&mut self, message: &str);
}

/// How a run of the command loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Executed,
    Exited,
}

pub struct Application {
    session: ConversationSession,
    runner: Box<dyn CommandRunner>,
    ui: Box<dyn Interaction>,
    max_regenerations: usize,
}

impl Application {
    pub fn new(
        session: ConversationSession,
        runner: Box<dyn CommandRunner>,
        ui: Box<dyn Interaction>,
        max_regenerations: usize,
    ) -> Self {
        Self {
            session,
            runner,
            ui,
            max_regenerations,
        }
    }

    /// Generates a command for `request` and drives the execute/regenerate menu.
    ///
    /// Generation failures end the run with an error. Failed executions go back
    /// to the user, who can ask for a corrected command or return to the menu.
    pub async fn run(&mut self, request: &str) -> Result<Outcome, AppError> {
        let mut command = self.session.generate(request).await?;
        let mut regenerations = 0;

        loop {
            self.ui.present(request, &command);

            let next_request = match self.ui.choose()? {
                UserChoice::Execute => {
                    self.ui.executing(&command);
                    match self.runner.run(&command).await {
                        Ok(()) => {
                            self.ui.finished(true);
                            return Ok(Outcome::Executed);
                        }
                        Err(AppError::Execution(reason)) => {
                            self.ui.finished(false);
                            debug!(%command, %reason, "generated command failed");
                            match self.ui.choose_after_failure(&reason)? {
                                FailureChoice::RegenerateWithFailureContext => {
                                    failure_request(request, &command, &reason)
                                }
                                FailureChoice::ReturnToMenu => continue,
                            }
                        }
                        Err(e) => return Err(e),
                    }
                }
                UserChoice::Regenerate => alternative_request(request),
                UserChoice::Exit => return Ok(Outcome::Exited),
            };

            if regenerations >= self.max_regenerations {
                self.ui.notice(&format!(
                    "Reached the limit of {} regenerations for this run",
                    self.max_regenerations
                ));
                continue;
            }

            regenerations += 1;
            debug!(
                attempt = regenerations,
                limit = self.max_regenerations,
                "regenerating command"
            );
            command = self.session.generate(&next_request).await?;
            debug!(
                history = self.session.messages().len(),
                "regenerated command"
            );
        }
    }
}

/// Builds the system prompt, substituting `{os}` in a custom template.
pub fn system_prompt(template: Option<&str>, os: &str) -> String {
    template
        .unwrap_or(SYSTEM_PROMPT_FOR_SHELL)
        .replace("{os}", os)
}

fn alternative_request(request: &str) -> String {
    format!("{} {}", request, ALTERNATIVE_ANNOTATION)
}

fn failure_request(request: &str, command: &str, reason: &str) -> String {
    format!(
        "{} (the previous command `{}` failed: {}. Please provide a corrected command)",
        request, command, reason
    )
}

const SYSTEM_PROMPT_FOR_SHELL: &str = "You are a command line expert for {os}. Follow these rules strictly:
1. Return only plain command text that can be executed directly in the terminal
2. Never include explanations, code block markers or comments
3. Wrap paths containing spaces in double quotes
4. Join multi-step operations with &&
5. Prefer relative paths
6. Keep the command short and efficient";

const ALTERNATIVE_ANNOTATION: &str = "(please provide an alternative approach)";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::providers::Message;
    use crate::stream::Sanitizer;
    use crate::testing::{ScriptedProvider, ScriptedRunner, ScriptedUi, UiEvent};
    use std::sync::{Arc, Mutex};

    struct Harness {
        app: Application,
        requests: Arc<Mutex<Vec<Vec<Message>>>>,
        ran: Arc<Mutex<Vec<String>>>,
        events: Arc<Mutex<Vec<UiEvent>>>,
    }

    fn harness(
        provider: ScriptedProvider,
        runner: ScriptedRunner,
        ui: ScriptedUi,
        max_regenerations: usize,
    ) -> Harness {
        let requests = provider.requests();
        let ran = runner.ran();
        let events = ui.events();
        let sanitizer = Sanitizer::new(&AppConfig::default().shell_labels).unwrap();
        let session = ConversationSession::new(Box::new(provider), sanitizer, "sys");
        Harness {
            app: Application::new(session, Box::new(runner), Box::new(ui), max_regenerations),
            requests,
            ran,
            events,
        }
    }

    fn last_user_turn(requests: &[Vec<Message>]) -> String {
        requests
            .last()
            .and_then(|payload| payload.last())
            .map(|m| m.content.clone())
            .unwrap()
    }

    #[tokio::test]
    async fn execute_runs_presented_command() {
        let mut h = harness(
            ScriptedProvider::new().reply(&["```bash\nls -la\n```"]),
            ScriptedRunner::new(),
            ScriptedUi::new(&[UserChoice::Execute], &[]),
            5,
        );

        let outcome = h.app.run("list files").await.unwrap();

        assert_eq!(outcome, Outcome::Executed);
        assert_eq!(*h.ran.lock().unwrap(), vec!["ls -la".to_string()]);
        assert_eq!(
            *h.events.lock().unwrap(),
            vec![
                UiEvent::Presented("ls -la".to_string()),
                UiEvent::Executing("ls -la".to_string()),
                UiEvent::Finished(true),
            ]
        );
    }

    #[tokio::test]
    async fn exit_runs_nothing() {
        let mut h = harness(
            ScriptedProvider::new().reply(&["rm -rf build"]),
            ScriptedRunner::new(),
            ScriptedUi::new(&[UserChoice::Exit], &[]),
            5,
        );

        assert_eq!(h.app.run("clean").await.unwrap(), Outcome::Exited);
        assert!(h.ran.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn regenerate_asks_for_alternative() {
        let mut h = harness(
            ScriptedProvider::new().reply(&["ls"]).reply(&["find . -maxdepth 1"]),
            ScriptedRunner::new(),
            ScriptedUi::new(&[UserChoice::Regenerate, UserChoice::Execute], &[]),
            5,
        );

        h.app.run("list files").await.unwrap();

        let requests = h.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            last_user_turn(&requests),
            "list files (please provide an alternative approach)"
        );
        assert_eq!(*h.ran.lock().unwrap(), vec!["find . -maxdepth 1".to_string()]);
    }

    #[tokio::test]
    async fn failed_execution_feeds_reason_back() {
        let mut h = harness(
            ScriptedProvider::new()
                .reply(&["lsx -la"])
                .reply(&["ls -la"]),
            ScriptedRunner::new().failing("lsx -la", "command exited with status 127"),
            ScriptedUi::new(
                &[UserChoice::Execute, UserChoice::Execute],
                &[FailureChoice::RegenerateWithFailureContext],
            ),
            5,
        );

        let outcome = h.app.run("list files").await.unwrap();
        assert_eq!(outcome, Outcome::Executed);

        let requests = h.requests.lock().unwrap();
        let retry = last_user_turn(&requests);
        assert!(retry.starts_with("list files"));
        assert!(retry.contains("lsx -la"));
        assert!(retry.contains("command exited with status 127"));

        assert_eq!(
            *h.ran.lock().unwrap(),
            vec!["lsx -la".to_string(), "ls -la".to_string()]
        );
        assert!(
            h.events
                .lock()
                .unwrap()
                .contains(&UiEvent::FailureOffered(
                    "command exited with status 127".to_string()
                ))
        );
    }

    #[tokio::test]
    async fn return_to_menu_represents_same_command() {
        let mut h = harness(
            ScriptedProvider::new().reply(&["false"]),
            ScriptedRunner::new().failing("false", "command exited with status 1"),
            ScriptedUi::new(
                &[UserChoice::Execute, UserChoice::Exit],
                &[FailureChoice::ReturnToMenu],
            ),
            5,
        );

        assert_eq!(h.app.run("fail").await.unwrap(), Outcome::Exited);
        assert_eq!(h.requests.lock().unwrap().len(), 1);

        let presented = h
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, UiEvent::Presented(c) if c == "false"))
            .count();
        assert_eq!(presented, 2);
    }

    #[tokio::test]
    async fn regenerations_are_capped() {
        let mut h = harness(
            ScriptedProvider::new()
                .reply(&["one"])
                .reply(&["two"])
                .reply(&["three"]),
            ScriptedRunner::new(),
            ScriptedUi::new(
                &[
                    UserChoice::Regenerate,
                    UserChoice::Regenerate,
                    UserChoice::Regenerate,
                    UserChoice::Exit,
                ],
                &[],
            ),
            2,
        );

        assert_eq!(h.app.run("count").await.unwrap(), Outcome::Exited);
        assert_eq!(h.requests.lock().unwrap().len(), 3);

        let events = h.events.lock().unwrap();
        assert!(events.iter().any(|e| matches!(e, UiEvent::Notice(_))));
        assert_eq!(events.last(), Some(&UiEvent::Presented("three".to_string())));
    }

    #[tokio::test]
    async fn generation_failure_is_fatal() {
        let mut h = harness(
            ScriptedProvider::new()
                .reply(&["ls"])
                .fail(AppError::Network("timed out".to_string())),
            ScriptedRunner::new(),
            ScriptedUi::new(&[UserChoice::Regenerate], &[]),
            5,
        );

        let err = h.app.run("list files").await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
        assert!(h.ran.lock().unwrap().is_empty());
    }

    #[test]
    fn custom_template_gets_os() {
        assert_eq!(system_prompt(Some("Shell for {os}."), "Linux Arch"), "Shell for Linux Arch.");
        assert!(system_prompt(None, "Windows 11").contains("expert for Windows 11"));
    }
}
