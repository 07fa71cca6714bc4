use crate::core::error::AppError;
use crate::system::ShellType;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Runs a generated command and reports whether it succeeded.
#[async_trait]
pub trait CommandRunner {
    async fn run(&self, command: &str) -> Result<(), AppError>;
}

/// Runs commands through the host interpreter with inherited stdio.
pub struct ShellRunner {
    shell_type: ShellType,
}

impl ShellRunner {
    pub fn new(shell_type: ShellType) -> Self {
        Self { shell_type }
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str) -> Result<(), AppError> {
        debug!(
            shell = self.shell_type.program(),
            command, "executing generated command"
        );

        let status = Command::new(self.shell_type.program())
            .arg(self.shell_type.command_flag())
            .arg(command)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| AppError::Execution(format!("failed to launch command: {}", e)))?;

        if status.success() {
            Ok(())
        } else {
            let reason = match status.code() {
                Some(code) => format!("command exited with status {}", code),
                None => "command was terminated by a signal".to_string(),
            };
            debug!(command, %reason, "generated command failed");
            Err(AppError::Execution(reason))
        }
    }
}
