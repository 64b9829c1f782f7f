// ── Domain model ──
//
// Snapshot types shared by the synchronizer and its consumers.

mod node_id;
mod tree;

pub use node_id::NodeId;
pub use tree::{Tree, TreeEntry, TreeNode, Walk};
