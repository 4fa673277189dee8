//! confmaster CLI - Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{InputFormat, OutputFormat};

#[derive(Parser)]
#[command(name = "confmaster")]
#[command(version)]
#[command(about = "Compose, resolve and format layered configs", long_about = None)]
struct Cli {
    /// Input format (defaults to the file extension: .yml/.yaml is YAML, anything else JSON)
    #[arg(long, global = true, value_enum)]
    from: Option<InputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a config and write it out
    Format {
        /// Config file
        input: String,

        /// Fallback config file, lowest priority last
        #[arg(short = 'f', long)]
        fallback: Vec<String>,

        /// Application that references can point at ([NAMESPACE/]KEY=VALUE,...@FILE)
        #[arg(short = 'a', long)]
        app: Vec<String>,

        /// Output format
        #[arg(short = 't', long, value_enum, default_value = "json")]
        to: OutputFormat,

        /// Spaces per level for JSON output (0 is compact)
        #[arg(long, default_value_t = 0)]
        indent: usize,
    },

    /// Print the value at a path
    Get {
        /// Config file
        input: String,

        /// Dotted path such as servers[0].port
        path: String,
    },

    /// Print every leaf as PATH=JSON
    Flatten {
        /// Config file
        input: String,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "confmaster=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Format {
            input,
            fallback,
            app,
            to,
            indent,
        } => commands::format::execute(commands::format::FormatArgs {
            input,
            fallbacks: fallback,
            apps: app,
            from: cli.from,
            to,
            indent,
        }),
        Commands::Get { input, path } => commands::get::execute(&input, cli.from, &path),
        Commands::Flatten { input } => commands::flatten::execute(&input, cli.from),
    }
}
