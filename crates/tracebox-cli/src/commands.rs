use anyhow::Context;
use colored::Colorize;
use serde_json::json;
use tracebox_server::{ServerConfig, TraceServer};
use tracebox_store::{TraceId, TraceStore};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Init(args) => cmd_init(args, &format),
        Command::Put(args) => cmd_put(args, &format),
        Command::Resolve(args) => cmd_resolve(args, &format),
        Command::NewId => cmd_new_id(&format),
    }
}

/// Layer config sources: defaults < TOML file < env/flags.
pub fn server_config(args: &ServeArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(root) = &args.root {
        config.storage_root = root.clone();
    }
    if let Some(limit) = args.max_upload_bytes {
        config.max_upload_bytes = Some(limit);
    }
    Ok(config)
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to start tokio runtime")
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = server_config(&args)?;
    let server = TraceServer::new(config)?;
    runtime()?.block_on(server.serve())?;
    Ok(())
}

fn cmd_init(args: RootArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let store = TraceStore::open(&args.root)?;
    let path = store.root().path().display().to_string();
    match format {
        OutputFormat::Text => {
            println!("{} Storage root ready at {}", "✓".green().bold(), path.bold())
        }
        OutputFormat::Json => println!("{}", json!({ "root": path })),
    }
    Ok(())
}

fn cmd_put(args: PutArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let store = TraceStore::open(&args.root.root)?;
    tracing::debug!(file = %args.file.display(), "storing local file");
    let stored = runtime()?.block_on(async {
        let mut file = tokio::fs::File::open(&args.file)
            .await
            .with_context(|| format!("cannot open {}", args.file.display()))?;
        anyhow::Ok(store.write(&mut file).await?)
    })?;
    match format {
        OutputFormat::Text => {
            println!(
                "{} Stored {} ({} bytes)",
                "✓".green().bold(),
                args.file.display(),
                stored.size
            );
            println!("  Id: {}", stored.id.to_string().yellow());
            println!("  Path: {}", stored.path.display());
        }
        OutputFormat::Json => println!(
            "{}",
            json!({ "id": stored.id, "path": stored.path, "size": stored.size })
        ),
    }
    Ok(())
}

fn cmd_resolve(args: ResolveArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let store = TraceStore::open(&args.root.root)?;
    let resolved = runtime()?
        .block_on(store.resolve(&args.id))
        .with_context(|| format!("trace not found: {}", args.id))?;
    match format {
        OutputFormat::Text => {
            println!("{} {}", "Trace".bold(), resolved.id.to_string().yellow());
            println!("  Path: {}", resolved.path.display());
            println!("  Download name: {}", resolved.download_name);
        }
        OutputFormat::Json => println!(
            "{}",
            json!({
                "id": resolved.id,
                "path": resolved.path,
                "download_name": resolved.download_name,
            })
        ),
    }
    Ok(())
}

fn cmd_new_id(format: &OutputFormat) -> anyhow::Result<()> {
    let id = TraceId::generate();
    match format {
        OutputFormat::Text => println!("{id}"),
        OutputFormat::Json => println!("{}", json!({ "id": id })),
    }
    Ok(())
}
