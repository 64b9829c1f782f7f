//! Tree command handlers.
//!
//! Every handler loads the snapshot first: the synchronizer refuses edits
//! until it has one, and the loaded tree drives the delete prompt.

use std::time::Duration;

use chrono::Local;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use arbor_core::{CancellationToken, NodeId, SyncEvent, Tree, TreeSynchronizer};

use crate::cli::{AddArgs, DeleteArgs, GlobalOpts, RenameArgs, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::util;

fn print_tree(tree: &Tree, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color_mode());
    let out = output::render_tree(&global.output_format(), tree, color)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn status(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("{message}");
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn show(sync: &TreeSynchronizer, global: &GlobalOpts) -> Result<(), CliError> {
    let tree = sync.load().await?;
    print_tree(&tree, global)
}

pub async fn add(
    sync: &TreeSynchronizer,
    args: AddArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let before = sync.load().await?;
    let after = sync
        .request_add(args.parent.map(NodeId::from), args.name.clone())
        .await?;

    // The service does not echo the new id; find it in the reload.
    let added = after
        .walk()
        .find(|e| e.node.name == args.name && !before.contains(&e.node.id));
    match added {
        Some(entry) => status(global, &format!("Added '{}' ({})", args.name, entry.node.id)),
        None => status(global, &format!("Added '{}'", args.name)),
    }

    print_tree(&after, global)
}

pub async fn rename(
    sync: &TreeSynchronizer,
    args: RenameArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    sync.load().await?;
    let tree = sync.request_rename(args.id.as_str(), args.name.clone()).await?;
    status(global, &format!("Renamed {} to '{}'", args.id, args.name));
    print_tree(&tree, global)
}

pub async fn delete(
    sync: &TreeSynchronizer,
    args: DeleteArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let tree = sync.load().await?;
    let id = NodeId::from(args.id);

    // Unknown ids and the root skip the prompt; the synchronizer rejects them.
    if let Some(node) = tree.find(&id) {
        let below = node.subtree().count() - 1;
        let prompt = if below == 0 {
            format!("Delete '{}' ({id})?", node.name)
        } else {
            format!("Delete '{}' ({id}) and {below} node(s) below it?", node.name)
        };
        if !util::confirm(&prompt, "delete", global.yes)? {
            return Ok(());
        }
    }

    let after = sync.request_delete(id.clone()).await?;
    status(global, &format!("Deleted {id}"));
    print_tree(&after, global)
}

/// Print the tree, then reprint whenever a background reload brings a
/// different one. Runs until Ctrl-C.
pub async fn watch(
    sync: &TreeSynchronizer,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut last = sync.load().await?;
    print_tree(&last, global)?;

    let mut snapshots = sync.snapshots();
    let mut events = sync.subscribe();
    let cancel = CancellationToken::new();
    let refresher = sync.spawn_refresh(Duration::from_secs(args.interval), cancel.clone());

    let result = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),
            changed = snapshots.changed() => {
                let Some(tree) = changed else { break Ok(()) };
                if *tree != *last {
                    status(global, &format!("── {} ──", Local::now().format("%H:%M:%S")));
                    if let Err(e) = print_tree(&tree, global) {
                        break Err(e);
                    }
                    last = tree;
                }
            }
            event = events.recv() => match event {
                Ok(SyncEvent::Failed { stage, error, .. }) => {
                    status(global, &format!("reload failed ({stage}): {error}"));
                }
                Ok(SyncEvent::SnapshotReplaced { .. }) => {}
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "event subscriber lagged"),
                Err(RecvError::Closed) => break Ok(()),
            },
        }
    };

    cancel.cancel();
    let _ = refresher.await;
    result
}
