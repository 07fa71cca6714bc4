use crate::app::Interaction;
use crate::core::error::AppError;
use crate::stream::CleanCommand;
use console::{measure_text_width, style};
use std::io::{self, Write};
use std::path::Path;

/// Main menu answer after a command has been shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserChoice {
    Execute,
    Regenerate,
    Exit,
}

/// Answer after a generated command failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureChoice {
    RegenerateWithFailureContext,
    ReturnToMenu,
}

fn panel_width() -> usize {
    let terminal_width = console::Term::stdout().size().1 as usize;
    std::cmp::min(terminal_width.saturating_sub(4), 100).max(50)
}

/// Splits `text` into lines no wider than `max_width` columns, preferring spaces.
fn wrap_line(text: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split(' ') {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if measure_text_width(&candidate) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        // A single word wider than the panel is cut at the column limit.
        let mut chunk = String::new();
        for ch in word.chars() {
            chunk.push(ch);
            if measure_text_width(&chunk) > max_width {
                chunk.pop();
                lines.push(std::mem::take(&mut chunk));
                chunk.push(ch);
            }
        }
        current = chunk;
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Display the generated command in a box titled with the user request
pub fn display_command(request: &str, command: &str) {
    let width = panel_width();
    let inner = width.saturating_sub(4);

    let top_border = "┌".to_string() + &"─".repeat(width - 2) + "┐";
    let separator = "├".to_string() + &"─".repeat(width - 2) + "┤";
    let bottom_border = "└".to_string() + &"─".repeat(width - 2) + "┘";

    println!("\n{}", style(&top_border).dim().green());
    for line in wrap_line(request, inner) {
        let padding = inner.saturating_sub(measure_text_width(&line));
        println!("│ {}{} │", style(&line).bold().yellow(), " ".repeat(padding));
    }
    println!("{}", style(&separator).dim().green());

    let body_width = inner.saturating_sub(2);
    for (i, line) in command
        .lines()
        .flat_map(|line| wrap_line(line, body_width))
        .enumerate()
    {
        let prompt = if i == 0 { "$ " } else { "  " };
        let padding = body_width.saturating_sub(measure_text_width(&line));
        println!(
            "│ {}{}{} │",
            style(prompt).bold().green(),
            style(&line).bold().white(),
            " ".repeat(padding)
        );
    }
    println!("{}", style(&bottom_border).dim().green());
}

fn read_trimmed_line() -> Result<String, AppError> {
    io::stdout().flush()?;
    let mut input = String::new();
    let read = io::stdin().read_line(&mut input)?;
    if read == 0 {
        return Err(AppError::Input("standard input closed".to_string()));
    }
    Ok(input.trim().to_string())
}

fn parse_choice(input: &str) -> Option<UserChoice> {
    match input.to_ascii_lowercase().as_str() {
        "1" | "e" | "execute" => Some(UserChoice::Execute),
        "2" | "r" | "regenerate" => Some(UserChoice::Regenerate),
        "3" | "q" | "exit" | "quit" => Some(UserChoice::Exit),
        _ => None,
    }
}

fn parse_failure_choice(input: &str) -> Option<FailureChoice> {
    match input.to_ascii_lowercase().as_str() {
        "1" | "r" | "regenerate" => Some(FailureChoice::RegenerateWithFailureContext),
        "2" | "m" | "menu" => Some(FailureChoice::ReturnToMenu),
        _ => None,
    }
}

fn display_invalid_option() {
    println!("{}", style("Invalid option, try again").red());
}

/// Ask what to do with the command; re-prompts until the answer is valid
pub fn prompt_choice() -> Result<UserChoice, AppError> {
    println!("\n{}", style("Choose an action:").bold().cyan());
    println!("  1. Execute this command");
    println!("  2. Suggest a different command");
    println!("  3. Exit");

    loop {
        print!("{} ", style("Enter an option (1-3):").bold());
        match parse_choice(&read_trimmed_line()?) {
            Some(choice) => return Ok(choice),
            None => display_invalid_option(),
        }
    }
}

/// Ask how to recover from a failed command
pub fn prompt_failure_choice(reason: &str) -> Result<FailureChoice, AppError> {
    println!(
        "\n{} {}",
        style("Command failed:").bold().red(),
        style(reason).red()
    );
    println!("  1. Ask for a corrected command");
    println!("  2. Back to the menu");

    loop {
        print!("{} ", style("Enter an option (1-2):").bold());
        match parse_failure_choice(&read_trimmed_line()?) {
            Some(choice) => return Ok(choice),
            None => display_invalid_option(),
        }
    }
}

/// Display command execution banner
pub fn display_execution_banner(command: &str) {
    let width = panel_width();
    println!(
        "\n{} {}",
        style("⚡ EXECUTING:").bold().green(),
        style(command).bold().yellow()
    );
    println!("{}", style("─".repeat(width)).dim().cyan());
}

/// Display command execution status
pub fn display_execution_status(success: bool) {
    let width = panel_width();
    let status_icon = if success {
        style("✅ COMPLETED").bold().green()
    } else {
        style("❌ FAILED").bold().red()
    };

    println!("{}", style("─".repeat(width)).dim().cyan());
    println!("{}", status_icon);
}

pub fn display_notice(message: &str) {
    println!("{} {}", style("ℹ").bold().blue(), style(message).blue());
}

/// Tell the user a default configuration was written and needs an API key
pub fn display_config_created(path: &Path) {
    println!(
        "{} {}",
        style("Created default configuration at").bold().yellow(),
        style(path.display()).bold().white()
    );
    println!("Set your API key in that file and run the command again.");
}

/// Menu-driven terminal front end
pub struct TerminalUi;

impl Interaction for TerminalUi {
    fn present(&mut self, request: &str, command: &CleanCommand) {
        display_command(request, command);
    }

    fn choose(&mut self) -> Result<UserChoice, AppError> {
        prompt_choice()
    }

    fn choose_after_failure(&mut self, reason: &str) -> Result<FailureChoice, AppError> {
        prompt_failure_choice(reason)
    }

    fn executing(&mut self, command: &CleanCommand) {
        display_execution_banner(command);
    }

    fn finished(&mut self, success: bool) {
        display_execution_status(success);
    }

    fn notice(&mut self, message: &str) {
        display_notice(message);
    }
}
