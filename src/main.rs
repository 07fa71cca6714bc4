use clap::{CommandFactory, Parser};
use std::process::ExitCode;
use tracing::{debug, error, warn};

mod app;
mod cli;
mod config;
mod core;
mod display;
mod logging;
mod providers;
mod session;
mod stream;
mod system;
#[cfg(test)]
mod testing;

use crate::app::{Application, system_prompt};
use crate::cli::Args;
use crate::config::{Config, LoadOutcome};
use crate::core::error::AppError;
use crate::core::executor::ShellRunner;
use crate::display::TerminalUi;
use crate::providers::openai::OpenAIProvider;
use crate::session::ConversationSession;
use crate::stream::Sanitizer;
use crate::system::SystemInfo;

async fn run(config: &Config, request: &str) -> Result<(), AppError> {
    let system_info = SystemInfo::new();
    debug!(
        os = %system_info.os_info,
        shell = system_info.shell_type.program(),
        "detected system"
    );

    let provider = OpenAIProvider::new(&config.api)?;
    let sanitizer = Sanitizer::new(&config.app.shell_labels)?;
    let prompt = system_prompt(config.app.system_prompt.as_deref(), &system_info.os_info);
    let session = ConversationSession::new(Box::new(provider), sanitizer, prompt);

    let mut application = Application::new(
        session,
        Box::new(ShellRunner::new(system_info.shell_type)),
        Box::new(TerminalUi),
        config.app.max_regenerations,
    );

    let outcome = application.run(request).await?;
    debug!(?outcome, "finished");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match Config::load() {
        Ok(LoadOutcome::Existing(config)) => config,
        Ok(LoadOutcome::Created(_, path)) => {
            logging::init(args.debug);
            display::display_config_created(&path);
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            logging::init(args.debug);
            error!("{}", e);
            error!("Fix or remove {} and try again", Config::config_path().display());
            return ExitCode::FAILURE;
        }
    };

    if args.debug {
        config.app.debug_mode = true;
    }
    if let Some(model) = args.model.clone() {
        config.api.model = model;
    }

    logging::init(config.app.debug_mode);
    debug!(url = %config.api.url, model = %config.api.model, "loaded configuration");

    let Some(request) = args.request() else {
        let _ = Args::command().print_help();
        return ExitCode::SUCCESS;
    };

    if config.has_placeholder_key() {
        warn!(
            "No API key configured, set api.key in {}",
            Config::config_path().display()
        );
    }

    match run(&config, &request).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!(
                request = %request,
                model = %config.api.model,
                debug_mode = config.app.debug_mode,
                "run failed"
            );
            error!("{}", e);
            if e.is_transport() {
                error!(
                    "Check api.url and api.key in {}",
                    Config::config_path().display()
                );
            }
            ExitCode::FAILURE
        }
    }
}
