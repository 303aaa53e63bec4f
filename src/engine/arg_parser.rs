use clap::Parser;
use std::path::PathBuf;

use crate::types::{DuplicatePolicy, PayloadFormat};

struct DefaultArgs;

impl DefaultArgs {
    pub const DIR: &'static str = ".";
}

/// Fetch payload files in parallel, decode them into keyed records, and print the collection as JSON.
#[derive(Clone, Parser)]
#[command(name = "fanpipe")]
#[command(about = "Fan payload files out to a worker pool and aggregate their records by key.")]
pub struct Cli {
    /// Directory holding the payload files. Default: current directory.
    #[arg(value_name = "DIR", default_value = DefaultArgs::DIR)]
    pub dir: PathBuf,

    /// Worker threads. Default: derived from available threads and the FD limit.
    #[arg(long, short = 'w', value_parser = clap::value_parser!(usize))]
    pub workers: Option<usize>,

    /// Work queue bound. Dispatch blocks once this many items are waiting.
    #[arg(long, short = 'q', value_parser = clap::value_parser!(usize))]
    pub queue_capacity: Option<usize>,

    /// Record field used as the collection key (case-insensitive; dotted for nested fields).
    #[arg(long, short = 'k')]
    pub key_field: Option<String>,

    /// Only pick up files with these extensions. Can specify multiple: --ext json ndjson
    #[arg(long = "ext", num_args = 1..)]
    pub extensions: Vec<String>,

    /// Exclude patterns (glob syntax). Can specify multiple: -e pattern1 pattern2
    #[arg(long, short = 'e', num_args = 1..)]
    pub exclude: Vec<String>,

    /// Follow symbolic links while listing DIR.
    #[arg(long, short = 'f', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub follow_links: Option<bool>,

    /// Payload layout.
    #[arg(long, value_enum)]
    pub format: Option<PayloadFormat>,

    /// What to do when two records share a key.
    #[arg(long, value_enum)]
    pub on_duplicate: Option<DuplicatePolicy>,

    /// Write the collection to this file instead of stdout.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Cancel the run as soon as this file exists.
    #[arg(long)]
    pub stop_file: Option<PathBuf>,

    /// Verbose output: debug logs, progress bar, skipped list.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}
