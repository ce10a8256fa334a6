//! Command-line argument definitions for the Merrow CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, the id of the generated graphic and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Merrow diagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input diagram definition
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the output SVG file
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Id of the generated `<svg>` element
    #[arg(long, default_value = "graph")]
    pub id: String,

    /// Document URL fragment references are resolved against
    /// (defaults to the output file)
    #[arg(long)]
    pub base_url: Option<String>,
}
