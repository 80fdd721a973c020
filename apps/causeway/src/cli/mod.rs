//! # Causeway CLI Module
//!
//! Command-line surface over `causeway-core`.
//!
//! ## Available Commands
//!
//! - `data import` - Delimited text to a typed dataset (JSON)
//! - `data export` - Typed dataset back to delimited text
//! - `graph convert` - Between text, endpoint matrix, JSON, snapshot, DOT, lavaan and XML
//! - `knowledge check` - Parse a knowledge file and compare it with a dataset
//! - `knowledge show` - Print a knowledge file in normalized form
//! - `config` - Show the resolved configuration

mod commands;

use crate::config::{CausewayConfig, CliOverrides};
use causeway_core::{CausewayError, TierOrdering};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Causeway - causal-search interchange
///
/// Moves tabular data, graphs and background knowledge between host
/// formats and the representations a causal-search engine consumes.
#[derive(Parser, Debug)]
#[command(name = "causeway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Path to a causeway.toml (defaults to ./causeway.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Treat integer columns as continuous
    #[arg(long, global = true)]
    pub int_as_continuous: bool,

    /// Direction in which knowledge tiers may cause one another
    #[arg(long, global = true, value_enum)]
    pub tier_ordering: Option<OrderingArg>,

    /// Comment marker for knowledge files
    #[arg(long, global = true)]
    pub comment_marker: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Tabular data conversion
    Data {
        #[command(subcommand)]
        action: DataCommand,
    },

    /// Graph conversion
    Graph {
        #[command(subcommand)]
        action: GraphCommand,
    },

    /// Knowledge file tools
    Knowledge {
        #[command(subcommand)]
        action: KnowledgeCommand,
    },

    /// Show the resolved configuration
    Config,
}

#[derive(Subcommand, Debug)]
pub enum DataCommand {
    /// Import delimited text into a typed dataset
    Import {
        /// Delimited input file with a header row
        #[arg(short, long)]
        input: PathBuf,

        /// Field delimiter
        #[arg(short, long, default_value = ",")]
        delimiter: char,

        /// Write the typed dataset as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export a typed dataset (JSON) to delimited text
    Export {
        /// Typed dataset JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (stdout when absent)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Field delimiter
        #[arg(short, long, default_value = ",")]
        delimiter: char,

        /// Write category values instead of integer codes
        #[arg(long)]
        decoded: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum GraphCommand {
    /// Convert a graph between formats
    Convert {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, value_enum)]
        from: GraphFormat,

        /// Output file (stdout when absent; required for snapshots)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum)]
        to: GraphFormat,

        /// Field delimiter for endpoint matrices
        #[arg(short, long, default_value = ",")]
        delimiter: char,
    },
}

#[derive(Subcommand, Debug)]
pub enum KnowledgeCommand {
    /// Parse a knowledge file, optionally checking it against a dataset
    Check {
        /// Knowledge file
        #[arg(short, long)]
        knowledge: PathBuf,

        /// Delimited data file whose header names the variables
        #[arg(long)]
        data: Option<PathBuf>,

        /// Field delimiter for the data file
        #[arg(short, long, default_value = ",")]
        delimiter: char,
    },

    /// Print a knowledge file in normalized form
    Show {
        /// Knowledge file
        #[arg(short, long)]
        knowledge: PathBuf,
    },
}

/// Graph file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    /// "Graph Nodes / Graph Edges" text
    Text,
    /// Delimited endpoint matrix with a header row of node names
    Matrix,
    /// Graphviz DOT (write only)
    Dot,
    /// lavaan model syntax (write only)
    Lavaan,
    /// Graph XML (write only)
    Xml,
    /// Binary graph snapshot
    Snapshot,
    /// JSON node and edge lists
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderingArg {
    Forward,
    Backward,
}

impl From<OrderingArg> for TierOrdering {
    fn from(arg: OrderingArg) -> Self {
        match arg {
            OrderingArg::Forward => TierOrdering::Forward,
            OrderingArg::Backward => TierOrdering::Backward,
        }
    }
}

impl Cli {
    /// Flag-level configuration overrides.
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            int_as_continuous: self.int_as_continuous.then_some(true),
            tier_ordering: self.tier_ordering.map(TierOrdering::from),
            comment_marker: self.comment_marker.clone(),
        }
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), CausewayError> {
    let root = std::env::current_dir()
        .map_err(|e| CausewayError::IoError(format!("Cannot read working directory: {}", e)))?;
    let config = CausewayConfig::load(
        cli.config.as_deref(),
        &root,
        |key| std::env::var(key).ok(),
        &cli.overrides(),
    )?;
    let output = Output {
        json_mode: cli.json_mode,
        quiet: cli.quiet,
    };

    match cli.command {
        Some(Commands::Data { action }) => {
            let session = open_session(&config)?;
            match action {
                DataCommand::Import {
                    input,
                    delimiter,
                    output: target,
                } => cmd_data_import(&session, output, &input, delimiter, target.as_deref()),
                DataCommand::Export {
                    input,
                    output: target,
                    delimiter,
                    decoded,
                } => cmd_data_export(&session, &input, target.as_deref(), delimiter, decoded),
            }
        }
        Some(Commands::Graph {
            action:
                GraphCommand::Convert {
                    input,
                    from,
                    output: target,
                    to,
                    delimiter,
                },
        }) => {
            let session = open_session(&config)?;
            let request = Conversion {
                input: &input,
                from,
                output: target.as_deref(),
                to,
                delimiter,
            };
            cmd_graph_convert(&session, output, &request)
        }
        Some(Commands::Knowledge { action }) => {
            let session = open_session(&config)?;
            match action {
                KnowledgeCommand::Check {
                    knowledge,
                    data,
                    delimiter,
                } => cmd_knowledge_check(&session, output, &knowledge, data.as_deref(), delimiter),
                KnowledgeCommand::Show { knowledge } => {
                    cmd_knowledge_show(&session, output, &knowledge)
                }
            }
        }
        // No subcommand - show configuration by default
        Some(Commands::Config) | None => cmd_config(&config, output),
    }
}
