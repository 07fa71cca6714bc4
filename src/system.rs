use std::fs;
use std::path::MAIN_SEPARATOR;

/// Command interpreter used to run generated commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellType {
    Cmd,      // Windows Command Prompt
    UnixLike, // POSIX sh
}

impl ShellType {
    /// Picks the interpreter from the host path separator convention.
    pub fn detect() -> Self {
        Self::from_separator(MAIN_SEPARATOR)
    }

    fn from_separator(separator: char) -> Self {
        if separator == '\\' {
            ShellType::Cmd
        } else {
            ShellType::UnixLike
        }
    }

    pub fn program(&self) -> &'static str {
        match self {
            ShellType::Cmd => "cmd",
            ShellType::UnixLike => "sh",
        }
    }

    pub fn command_flag(&self) -> &'static str {
        match self {
            ShellType::Cmd => "/C",
            ShellType::UnixLike => "-c",
        }
    }
}

/// Holds information about the current system environment
#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub os_info: String,
    pub shell_type: ShellType,
}

impl SystemInfo {
    /// Detects the current system environment and returns a `SystemInfo` struct.
    pub fn new() -> Self {
        SystemInfo {
            os_info: detect_os(),
            shell_type: ShellType::detect(),
        }
    }
}

fn detect_os() -> String {
    let info = os_info::get();

    if cfg!(target_os = "linux") {
        if let Some(distro) = fs::read_to_string("/etc/os-release")
            .ok()
            .and_then(|contents| distro_name(&contents))
        {
            return format!("Linux {}", distro);
        }
    }

    format!("{} {} {}", info.os_type(), info.version(), info.bitness())
}

/// Extracts the `NAME=` value from os-release contents.
fn distro_name(os_release: &str) -> Option<String> {
    os_release
        .lines()
        .find_map(|line| line.strip_prefix("NAME="))
        .map(|name| name.trim().trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}
