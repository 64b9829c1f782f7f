// ── API-to-domain type conversions ──
//
// Bridges raw `arbor_api` wire models into canonical snapshot types.
// The response is already validated (root id present) by the client.

use arbor_api::{NodeResponse, TreeResponse};

use crate::model::{NodeId, Tree, TreeNode};

impl From<NodeResponse> for TreeNode {
    fn from(n: NodeResponse) -> Self {
        TreeNode {
            id: NodeId::from(n.id),
            name: n.name,
            children: n.children.into_iter().map(TreeNode::from).collect(),
        }
    }
}

impl From<TreeResponse> for Tree {
    fn from(t: TreeResponse) -> Self {
        Tree {
            root_id: NodeId::from(t.id),
            children: t.children.into_iter().map(TreeNode::from).collect(),
        }
    }
}
