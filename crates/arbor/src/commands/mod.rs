//! Command dispatch: bridges CLI args -> synchronizer intents -> output formatting.

pub mod config_cmd;
pub mod tree;
pub mod util;

use arbor_core::TreeSynchronizer;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a tree-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    sync: &TreeSynchronizer,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Show => tree::show(sync, global).await,
        Command::Add(args) => tree::add(sync, args, global).await,
        Command::Rename(args) => tree::rename(sync, args, global).await,
        Command::Delete(args) => tree::delete(sync, args, global).await,
        Command::Watch(args) => tree::watch(sync, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
