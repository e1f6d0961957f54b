use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Inspect EPUB, PDF and plain-text ebooks
#[derive(Parser, Debug)]
#[command(name = "bookparse", version, about)]
pub struct Cli {
    /// Log parser decisions (overridden by RUST_LOG)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// JSON file overriding the parsing heuristics
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the detected format tag
    Detect { input: PathBuf },

    /// Check that the file parses as its detected format
    Validate { input: PathBuf },

    /// Print title, author, language and other metadata
    Metadata {
        input: PathBuf,

        /// Emit JSON instead of a readable summary
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the table of contents as JSON
    Toc { input: PathBuf },

    /// Print content, optionally from a chapter position
    Content {
        input: PathBuf,

        /// Position token taken from a chapter's href
        #[arg(short, long)]
        position: Option<String>,
    },

    /// Extract the cover image
    Cover {
        input: PathBuf,

        /// Directory for the image. Defaults to the current directory.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List formats with their display names and capabilities
    Formats,
}
