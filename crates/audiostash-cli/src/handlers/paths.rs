//! Paths command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use audiostash_core::data_root;

/// Print the resolved data directory and cache database path.
pub fn execute(ctx: &CliContext) -> Result<()> {
    let root = data_root()?;
    println!("data_root = {}", root.display());
    println!("database  = {}", ctx.db_path.display());
    Ok(())
}
