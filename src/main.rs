use std::io::{IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

use cmdseq::CommandParser;
use cmdseq::categorize::Categories;
use cmdseq::config::Config;
use cmdseq::{logging, report};

#[derive(Parser)]
#[command(name = "cmdseq")]
#[command(about = "Print the ordered sequence of commands a shell invocation runs")]
#[command(version)]
struct Cli {
    /// Keep only the first occurrence of each command
    #[arg(short = 'u', long = "unique")]
    unique: bool,

    /// Config overlay merged over the defaults (and ~/.config/cmdseq/config.toml)
    #[arg(long = "config", value_name = "PATH")]
    config: Option<String>,

    /// Print a usage report for a tool-usage CSV export
    #[arg(long = "csv", value_name = "PATH", conflicts_with = "commands")]
    csv: Option<PathBuf>,

    /// Print the effective configuration as TOML
    #[arg(long = "dump-config")]
    dump_config: bool,

    /// Append each parse to ~/.local/share/cmdseq/parses.log
    #[arg(long = "record")]
    record: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Commands to parse; each prints one JSON array. Reads stdin when absent.
    #[arg(value_name = "COMMAND")]
    commands: Vec<String>,
}

/// Agent hook payload: `{"tool_name": "Bash", "tool_input": {"command": "..."}}`.
#[derive(Deserialize)]
struct HookInput {
    tool_name: Option<String>,
    tool_input: Option<ToolInput>,
}

#[derive(Deserialize)]
struct ToolInput {
    command: Option<String>,
}

/// The command carried by stdin: a hook payload's command, or the raw text.
/// `None` when a hook payload is for another tool or carries no command.
fn stdin_command(input: &str) -> Option<String> {
    match serde_json::from_str::<HookInput>(input) {
        Ok(hook) => {
            if hook.tool_name.as_deref() != Some("Bash") {
                return None;
            }
            hook.tool_input
                .and_then(|t| t.command)
                .filter(|c| !c.is_empty())
        }
        Err(_) => Some(input.to_string()),
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = Config::load();
    if let Some(path) = &cli.config
        && let Err(e) = config.merge_file(path)
    {
        eprintln!("cmdseq: {e}");
        std::process::exit(2);
    }

    if cli.dump_config {
        match config.to_toml() {
            Ok(toml) => print!("{toml}"),
            Err(e) => {
                eprintln!("cmdseq: cannot render config: {e}");
                std::process::exit(2);
            }
        }
        return;
    }

    let parser = CommandParser::from_config(&config);

    if let Some(path) = &cli.csv {
        let records = match report::load_commands(path) {
            Ok(records) => records,
            Err(e) => {
                eprintln!("cmdseq: {e}");
                std::process::exit(1);
            }
        };
        let categories = Categories::from_config(&config.categories);
        let usage = report::analyze(&parser, &categories, &records);
        println!("{}", serde_json::to_string_pretty(&usage).unwrap());
        return;
    }

    let commands = if cli.commands.is_empty() {
        if std::io::stdin().is_terminal() {
            eprintln!("cmdseq: no command given. Pass COMMAND arguments or pipe via stdin.");
            std::process::exit(1);
        }
        let mut input = String::new();
        if std::io::stdin().read_to_string(&mut input).is_err() {
            eprintln!("cmdseq: failed to read stdin");
            std::process::exit(1);
        }
        match stdin_command(&input) {
            Some(command) => vec![command],
            None => return,
        }
    } else {
        cli.commands
    };

    for command in &commands {
        let sequence = parser.parse(command, !cli.unique);
        if cli.record {
            logging::log_record(command, &sequence);
        }
        println!("{}", serde_json::to_string(&sequence).unwrap());
    }
}
