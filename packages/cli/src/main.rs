mod commands;

use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use commands::{init, parse, replay, InitArgs, ParseArgs, ReplayArgs};
use tracing_subscriber::EnvFilter;

/// Embedtweet CLI - tweet embedding for rich-text editors
#[derive(Parser, Debug)]
#[command(name = "embedtweet")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default embedtweet.config.json
    Init(InitArgs),

    /// Extract the tweet id from embed markup
    Parse(ParseArgs),

    /// Run a scripted editing session and print the resulting document
    Replay(ReplayArgs),
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match std::env::current_dir() {
        Ok(cwd) => match cli.command {
            Command::Init(args) => init(args, &cwd),
            Command::Parse(args) => parse(args),
            Command::Replay(args) => replay(args, &cwd).await,
        },
        Err(err) => Err(anyhow::anyhow!("Cannot get current directory: {err}")),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
