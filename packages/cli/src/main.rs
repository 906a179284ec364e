mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    check, embed, init, inspect, normalize, CheckArgs, EmbedArgs, InitArgs, InspectArgs,
    NormalizeArgs,
};
use tracing::Level;

/// ecnn CLI - Article markup tools
#[derive(Parser, Debug)]
#[command(name = "ecnn")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log more (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write an ecnn.config.json
    Init(InitArgs),

    /// Rewrite markup in canonical form
    Normalize(NormalizeArgs),

    /// Print the document tree read from markup
    Inspect(InspectArgs),

    /// Report repairs and unstable round trips
    Check(CheckArgs),

    /// Check a video or post link
    Embed(EmbedArgs),
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Normalize(args) => normalize(args, &cwd),
        Command::Inspect(args) => inspect(args, &cwd),
        Command::Check(args) => check(args, &cwd),
        Command::Embed(args) => embed(args),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
