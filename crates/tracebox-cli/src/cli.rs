use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracebox_server::config::DEFAULT_STORAGE_ROOT;

#[derive(Parser)]
#[command(
    name = "tracebox",
    about = "tracebox: upload, store, and serve trace files",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the trace upload/download HTTP service
    Serve(ServeArgs),
    /// Create and verify the storage root
    Init(RootArgs),
    /// Store a local file and print its identifier
    Put(PutArgs),
    /// Show where a stored trace lives
    Resolve(ResolveArgs),
    /// Print a freshly generated identifier
    NewId,
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML config file; flags and env vars override its values
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long, env = "TRACEBOX_BIND")]
    pub bind: Option<SocketAddr>,
    #[arg(long, env = "TRACEBOX_ROOT")]
    pub root: Option<PathBuf>,
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,
}

#[derive(Args)]
pub struct RootArgs {
    #[arg(long, env = "TRACEBOX_ROOT", default_value = DEFAULT_STORAGE_ROOT)]
    pub root: PathBuf,
}

#[derive(Args)]
pub struct PutArgs {
    pub file: PathBuf,
    #[command(flatten)]
    pub root: RootArgs,
}

#[derive(Args)]
pub struct ResolveArgs {
    pub id: String,
    #[command(flatten)]
    pub root: RootArgs,
}
