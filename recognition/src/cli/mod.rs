pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "recognition")]
#[command(author, version, about = "Classify maintenance descriptions against a rule file", long_about = None)]
pub struct Cli {
    /// Path to the rule file (JSON, both dimensions)
    #[arg(short, long, global = true)]
    pub rules: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Analyze a single description
    Analyze {
        /// Description text (words are joined with spaces)
        #[arg(required = true)]
        description: Vec<String>,

        /// Record id echoed into the result
        #[arg(long)]
        source_id: Option<i64>,

        /// Override the confidence threshold
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Analyze descriptions from a file, one per line
    Batch {
        /// Input file, or "-" for stdin
        input: String,

        /// Append aggregated category usage across the batch
        #[arg(long)]
        summary: bool,
    },

    /// Validate a rule file and report what the engine keeps
    Check,
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<(), String> {
    let rules_path = cli
        .rules
        .ok_or_else(|| "No rule file. Use --rules <file.json> to specify one.".to_owned())?;

    match cli.command {
        Commands::Analyze {
            description,
            source_id,
            threshold,
        } => commands::analyze::run(
            &rules_path,
            &description.join(" "),
            source_id,
            threshold,
            cli.format,
        ),
        Commands::Batch { input, summary } => {
            commands::batch::run(&rules_path, &input, summary, cli.format)
        }
        Commands::Check => commands::check::run(&rules_path, cli.format),
    }
}
