//! Tessera CLI - Inspect and convert scene documents

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{check, export, info, tree};

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Work with Tessera scene documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Scene settings file (TOML)
    #[arg(long, global = true)]
    settings: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the node hierarchy with world bounds
    Tree {
        /// Path to scene document (.toml or .json)
        scene: String,

        /// Include hidden nodes
        #[arg(long)]
        all: bool,
    },

    /// Load a document and check graph and hierarchy integrity
    Check {
        /// Path to scene document
        scene: String,
    },

    /// Re-export a document in the requested format
    Export {
        /// Path to scene document
        scene: String,

        /// Output format (json or toml)
        #[arg(long, default_value = "toml", value_parser = parse_format)]
        format: String,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show node counts per kind
    Info {
        /// Path to scene document
        scene: String,
    },
}

fn parse_format(s: &str) -> Result<String, String> {
    match s {
        "json" | "toml" => Ok(s.to_string()),
        _ => Err(format!("unknown format '{}'; valid values: json, toml", s)),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let settings = cli.settings.as_deref();

    match cli.command {
        Commands::Tree { scene, all } => tree::run(&scene, settings, all),
        Commands::Check { scene } => check::run(&scene, settings),
        Commands::Export {
            scene,
            format,
            output,
        } => export::run(&scene, settings, &format, output.as_deref()),
        Commands::Info { scene } => info::run(&scene, settings),
    }
}
