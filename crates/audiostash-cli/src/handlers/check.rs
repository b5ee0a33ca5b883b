//! Check command handler: can each source play right now?

use anyhow::Result;

use audiostash_core::Playability;

use crate::bootstrap::CliContext;
use crate::presentation::playability_label;
use crate::utils::source::parse_source;

/// Execute the check command.
///
/// Never downloads and never issues handles.
pub async fn execute(ctx: &CliContext, sources: &[String]) -> Result<()> {
    for source in sources {
        let playability = ctx.resolver.can_play(&parse_source(source, false)).await;
        match &playability {
            Playability::Unavailable { reason } => {
                println!("{:<15} {source} ({reason})", playability_label(&playability));
            }
            Playability::Ready | Playability::NeedsDownload { .. } => {
                println!("{:<15} {source}", playability_label(&playability));
            }
        }
    }
    Ok(())
}
