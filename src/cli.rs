use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Turn a task description into a shell command",
    long_about = None
)]
#[command(after_help = "EXAMPLES:\n    aicmd list all files larger than 100MB\n    aicmd -d compress the logs directory")]
pub struct Args {
    /// Natural language description of the task
    #[arg(trailing_var_arg = true)]
    pub query: Vec<String>,

    /// Enable debug logging for this run
    #[arg(short, long)]
    pub debug: bool,

    /// Model to use for this run, overriding the configuration
    #[arg(short, long)]
    pub model: Option<String>,
}

impl Args {
    /// The request text, or `None` when no words were given.
    pub fn request(&self) -> Option<String> {
        let request = self.query.join(" ");
        let request = request.trim();
        (!request.is_empty()).then(|| request.to_string())
    }
}
