// ── Mutation intents ──
//
// Every write against the tree is expressed as a `MutationIntent`. The
// node being edited (or added under) travels inside the intent and is
// dropped once the intent completes; it is never part of the snapshot.

use std::fmt;

use crate::model::NodeId;

/// A collaborator's request to change the tree, before dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationIntent {
    /// Create `name` under `parent`, or under the root when `parent` is `None`.
    Add {
        parent: Option<NodeId>,
        name: String,
    },
    Rename {
        id: NodeId,
        name: String,
    },
    /// Delete a node and (server-side) its whole subtree.
    Delete {
        id: NodeId,
    },
}

impl MutationIntent {
    pub fn add(parent: Option<NodeId>, name: impl Into<String>) -> Self {
        Self::Add {
            parent,
            name: name.into(),
        }
    }

    pub fn rename(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self::Rename {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn delete(id: impl Into<NodeId>) -> Self {
        Self::Delete { id: id.into() }
    }

    /// Short operation name for logs.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Rename { .. } => "rename",
            Self::Delete { .. } => "delete",
        }
    }
}

impl fmt::Display for MutationIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add {
                parent: Some(parent),
                name,
            } => write!(f, "add {name:?} under {parent}"),
            Self::Add { parent: None, name } => write!(f, "add {name:?} under root"),
            Self::Rename { id, name } => write!(f, "rename {id} to {name:?}"),
            Self::Delete { id } => write!(f, "delete {id}"),
        }
    }
}

/// An intent after validation against the snapshot: the add parent is
/// resolved to a concrete id, and every target is known to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RemoteMutation {
    Create { parent: NodeId, name: String },
    Rename { id: NodeId, name: String },
    Delete { id: NodeId },
}
