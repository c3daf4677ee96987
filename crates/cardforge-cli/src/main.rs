use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use cardforge_cli::registry::{RegistryError, init_logging};
use cardforge_cli::workspace::{WorkspaceError, WorkspacePaths, load_or_create_settings};
use cardforge_cli::{Bot, Reply};
use cardforge_core::CardError;

#[derive(Debug, Error)]
enum CliError {
    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("dataset error: {0}")]
    Dataset(#[from] CardError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "cardforge", version, about = "Test card generator bot")]
struct Cli {
    /// Workspace directory holding config, data, output, and logs.
    #[arg(long, global = true, default_value = ".cardforge")]
    root: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read commands from stdin, one per line, and print the replies.
    Chat(ChatArgs),
    /// Handle a single command.
    Exec(ExecArgs),
}

#[derive(Args, Debug)]
struct ChatArgs {
    /// Id of the user sending the commands.
    #[arg(long)]
    user: String,
}

#[derive(Args, Debug)]
struct ExecArgs {
    /// Id of the user sending the command.
    #[arg(long)]
    user: String,
    /// Print replies as JSON lines.
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Command and arguments, e.g. `/gen 400000 5`.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    input: Vec<String>,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    let paths = WorkspacePaths::new(cli.root);
    paths.ensure_dirs()?;
    let settings = load_or_create_settings(&paths)?;
    init_logging(&paths.log_path())?;

    let mut bot = Bot::new(paths, settings);
    let catalog = bot.catalog().catalog()?;
    tracing::info!(event = "bot_started", bins = catalog.len());

    match cli.command {
        Command::Chat(args) => run_chat(&mut bot, &args.user),
        Command::Exec(args) => run_exec(&mut bot, args),
    }
}

fn run_chat(bot: &mut Bot, user: &str) -> Result<(), CliError> {
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "/exit" {
            break;
        }
        for reply in bot.handle(user, input) {
            print_reply(&mut stdout, &reply)?;
        }
        stdout.flush()?;
    }
    Ok(())
}

fn run_exec(bot: &mut Bot, args: ExecArgs) -> Result<(), CliError> {
    let input = args.input.join(" ");
    let mut stdout = io::stdout().lock();
    for reply in bot.handle(&args.user, &input) {
        if args.json {
            serde_json::to_writer(&mut stdout, &reply)?;
            writeln!(stdout)?;
        } else {
            print_reply(&mut stdout, &reply)?;
        }
    }
    stdout.flush()?;
    Ok(())
}

fn print_reply(out: &mut impl Write, reply: &Reply) -> io::Result<()> {
    match reply {
        Reply::Text { text } => writeln!(out, "{text}"),
        Reply::Document { path, caption } => {
            writeln!(out, "[document] {} ({caption})", path.display())
        }
        Reply::Media { path, caption } => {
            writeln!(out, "[media] {}\n{caption}", path.display())
        }
    }
}
