//! Cache command handlers.

use anyhow::Result;
use indicatif::HumanBytes;
use tracing::info;

use crate::bootstrap::CliContext;
use crate::commands::CacheCommand;
use crate::error::CliError;
use crate::utils::input::prompt_confirmation;

/// Execute a cache subcommand.
pub async fn execute(ctx: &CliContext, command: CacheCommand) -> Result<()> {
    match command {
        CacheCommand::Stats => stats(ctx).await,
        CacheCommand::List => list(ctx).await,
        CacheCommand::Remove { url } => remove(ctx, &url).await,
        CacheCommand::Clear { force } => clear(ctx, force).await,
    }
}

async fn stats(ctx: &CliContext) -> Result<()> {
    let stats = ctx.store.stats().await.map_err(CliError::from)?;
    println!("entries: {}", stats.count);
    println!("size:    {}", HumanBytes(stats.total_bytes));
    println!("db:      {}", ctx.db_path.display());
    Ok(())
}

async fn list(ctx: &CliContext) -> Result<()> {
    let keys = ctx.store.list_keys().await.map_err(CliError::from)?;
    if keys.is_empty() {
        println!("Cache is empty.");
        return Ok(());
    }
    for key in keys {
        println!("{key}");
    }
    Ok(())
}

async fn remove(ctx: &CliContext, url: &str) -> Result<()> {
    if !ctx.store.has(url).await {
        return Err(CliError::NotCached(url.to_string()).into());
    }
    ctx.store.remove(url).await.map_err(CliError::from)?;
    info!(url = %url, "Removed cache entry");
    println!("Removed {url}");
    Ok(())
}

async fn clear(ctx: &CliContext, force: bool) -> Result<()> {
    let stats = ctx.store.stats().await.map_err(CliError::from)?;
    if stats.count == 0 {
        println!("Cache is already empty.");
        return Ok(());
    }

    if !force {
        let prompt = format!(
            "Remove {} cached entries ({})?",
            stats.count,
            HumanBytes(stats.total_bytes)
        );
        if !prompt_confirmation(&prompt)? {
            println!("Aborted.");
            return Ok(());
        }
    }

    ctx.store.clear().await.map_err(CliError::from)?;
    info!(entries = stats.count, "Cleared cache");
    println!("Cleared {} entries.", stats.count);
    Ok(())
}
