use clap::Subcommand;
use wakeup_core::storage::AlarmStore;

use super::{CmdResult, Context};

#[derive(Subcommand)]
pub enum DataAction {
    /// Delete the alarm, all stats and the penalty settings
    Clear {
        /// Required; there is no undo
        #[arg(long)]
        yes: bool,
    },
}

pub async fn run(action: DataAction, ctx: &Context) -> CmdResult {
    match action {
        DataAction::Clear { yes } => {
            if !yes {
                return Err("refusing to clear data without --yes".into());
            }
            ctx.store()?.clear_all().await?;
            println!("{{\"type\": \"data_cleared\"}}");
        }
    }
    Ok(())
}
