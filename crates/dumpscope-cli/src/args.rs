use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::types::{KindArg, LogLevel, OutputFormat, TabArg};

#[derive(Parser)]
#[command(name = "dumpscope")]
#[command(
    about = "Summarize thread dumps, heap dumps, server logs and query logs",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    #[arg(long, default_value = "plain", global = true)]
    pub format: OutputFormat,

    #[arg(long, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    /// Config file (defaults to $DUMPSCOPE_CONFIG, then the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List dashboard tabs in display order
    Tabs,

    /// Ingest files and render one tab
    View(ViewArgs),

    /// Check files against the record rules without rendering a view
    Validate {
        /// Files or directories to check
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Treat every record as this source kind
        #[arg(long)]
        kind: Option<KindArg>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ViewArgs {
    /// Files or directories to ingest
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    #[arg(long, default_value = "overview")]
    pub tab: TabArg,

    /// Case-insensitive text to look for in record fields
    #[arg(long)]
    pub search: Option<String>,

    /// Keep only these categories (thread state, heap region, log level, SQL verb)
    #[arg(long = "category", value_name = "CATEGORY")]
    pub categories: Vec<String>,

    /// Inclusive lower bound, RFC 3339
    #[arg(long)]
    pub since: Option<String>,

    /// Exclusive upper bound, RFC 3339
    #[arg(long)]
    pub until: Option<String>,

    /// Length of top-N lists
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub top: Option<u32>,

    /// Trend bucket width in seconds for the selected tab
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=31_536_000))]
    pub bucket: Option<u64>,

    /// Treat every record as this source kind
    #[arg(long)]
    pub kind: Option<KindArg>,
}
