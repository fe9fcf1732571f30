use clap::Parser;
use std::path::PathBuf;

use crate::utils::config::{DEFAULT_THREADS, PagingConsts};

/// Concurrent bulk mailbox search and export.
#[derive(Clone, Parser)]
#[command(name = "mailsweep")]
#[command(about = "Search many mailboxes concurrently and export matching messages as JSON lines.")]
pub struct Cli {
    /// Search one identity (a complete address).
    #[arg(long, conflicts_with_all = ["infile", "all"])]
    pub user: Option<String>,

    /// File of identities to search, one address per line.
    #[arg(long, conflicts_with = "all")]
    pub infile: Option<PathBuf>,

    /// Search every identity in the configured directory domain.
    #[arg(long)]
    pub all: bool,

    /// Query string forwarded to the remote search endpoint.
    #[arg(long, short, default_value = "")]
    pub query: String,

    /// Worker threads per shard group.
    #[arg(long, default_value_t = DEFAULT_THREADS)]
    pub threads: usize,

    /// Shard groups. Default: number of cores.
    #[arg(long)]
    pub procs: Option<usize>,

    /// Results per page request (the service maximum is 500).
    #[arg(long, default_value_t = PagingConsts::DEFAULT_PAGE_SIZE)]
    pub results: u32,

    /// Output file for matched records. Default embeds a UTC timestamp.
    #[arg(long, short)]
    pub outfile: Option<PathBuf>,

    /// Error log file.
    #[arg(long, default_value = "error_log.jsonl")]
    pub errfile: PathBuf,

    /// Settings file with the remote endpoint and token. Default: ./mailsweep.toml
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbose output.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
