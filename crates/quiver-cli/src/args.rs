//! Command-line arguments of the `quiver` binary.

use clap::Parser;

/// Render a Quiver diagram document to SVG
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input diagram document (TOML)
    #[arg(help = "Path to the input document")]
    pub input: String,

    /// Where to write the SVG
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// Configuration file; overrides the search for quiver/config.toml
    #[arg(short, long)]
    pub config: Option<String>,

    /// Write the loaded document back out with rerouted connector endpoints
    #[arg(long, value_name = "PATH")]
    pub normalize: Option<String>,

    /// Fail instead of warning when records had to be dropped while loading
    #[arg(long)]
    pub strict: bool,

    /// One of off, error, warn, info, debug or trace
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
