//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// calldigest - Structured summaries of call-center transcripts
#[derive(Parser, Debug)]
#[command(name = "calldigest")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize a call from a transcription-completed event
    Handle {
        /// Event JSON file (reads stdin when omitted or "-")
        event: Option<PathBuf>,
    },

    /// Show stored summaries for a contact
    Show {
        /// Contact ID
        contact_id: String,

        /// Print the stored items as JSON
        #[arg(long)]
        json: bool,
    },

    /// List recently stored summaries
    List {
        /// Maximum number of summaries to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}
