pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "fashiondesk",
    about = "FashionDesk operator CLI",
    long_about = "Inspect configuration, check readiness, manage the order snapshot, \
                  and invoke customer service tools.",
    after_help = "Examples:\n  \
                  fashiondesk doctor --json\n  \
                  fashiondesk seed --path data/orders.json\n  \
                  fashiondesk call update_order_address order_id=123 \
                  new_address=\"5 Guomao Road, Beijing\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, SOP files, the order snapshot, and Ollama reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Write the seed orders to a snapshot file")]
    Seed {
        #[arg(long, help = "Snapshot path (defaults to store.snapshot_path)")]
        path: Option<PathBuf>,
        #[arg(long, help = "Overwrite an existing snapshot")]
        force: bool,
    },
    #[command(about = "Print every order in the configured store")]
    Orders,
    #[command(about = "List customer service tools with their argument schemas")]
    Tools {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Invoke a customer service tool against the configured store")]
    Call {
        #[arg(help = "Tool name, for example get_order_info")]
        tool: String,
        #[arg(value_name = "KEY=VALUE", help = "Tool arguments")]
        args: Vec<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Seed { path, force } => commands::seed::run(path, force),
        Command::Orders => commands::orders::run(),
        Command::Tools { json } => {
            commands::CommandResult { exit_code: 0, output: commands::tools::run(json) }
        }
        Command::Call { tool, args } => commands::call::run(&tool, &args),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
