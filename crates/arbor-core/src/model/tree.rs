// ── Tree snapshot ──
//
// A `Tree` is one complete, immutable copy of the remote tree. Snapshots
// are shared as `Arc<Tree>` and replaced wholesale; nothing here mutates
// a node after construction.

use serde::{Deserialize, Serialize};

use super::NodeId;

/// A named node and its ordered children (server order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// This node followed by every descendant, depth-first, parents first.
    pub fn subtree(&self) -> impl Iterator<Item = &TreeNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

/// The authoritative snapshot: root id plus the root's children.
///
/// The root has no name on the wire, so it has none here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    pub root_id: NodeId,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

/// One step of a [`Tree::walk`].
#[derive(Debug, Clone, Copy)]
pub struct TreeEntry<'a> {
    pub node: &'a TreeNode,
    /// 0 for direct children of the root.
    pub depth: usize,
    /// Parent id; the root id for top-level nodes.
    pub parent: &'a NodeId,
}

impl Tree {
    pub fn new(root_id: impl Into<NodeId>, children: Vec<TreeNode>) -> Self {
        Self {
            root_id: root_id.into(),
            children,
        }
    }

    /// Depth-first, parent-before-children traversal in server order.
    pub fn walk(&self) -> Walk<'_> {
        let root = &self.root_id;
        Walk {
            stack: self
                .children
                .iter()
                .rev()
                .map(|node| TreeEntry {
                    node,
                    depth: 0,
                    parent: root,
                })
                .collect(),
        }
    }

    pub fn find(&self, id: &NodeId) -> Option<&TreeNode> {
        self.walk().map(|entry| entry.node).find(|node| node.id == *id)
    }

    /// Returns `true` if `id` names a non-root node of this snapshot.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.find(id).is_some()
    }

    pub fn is_root(&self, id: &NodeId) -> bool {
        self.root_id == *id
    }

    /// Parent of `id`, or `None` when `id` is not a node of this snapshot.
    pub fn parent_of(&self, id: &NodeId) -> Option<&NodeId> {
        self.walk()
            .find(|entry| entry.node.id == *id)
            .map(|entry| entry.parent)
    }

    /// `id` and the ids of all its descendants. Empty when `id` is absent.
    pub fn subtree_ids(&self, id: &NodeId) -> Vec<NodeId> {
        self.find(id)
            .map(|node| node.subtree().map(|n| n.id.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of nodes, not counting the root.
    pub fn len(&self) -> usize {
        self.walk().count()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Iterator returned by [`Tree::walk`].
pub struct Walk<'a> {
    stack: Vec<TreeEntry<'a>>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = TreeEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.stack.pop()?;
        let current: &'a TreeNode = entry.node;
        let depth = entry.depth + 1;
        let parent = &current.id;
        self.stack
            .extend(current.children.iter().rev().map(|node| TreeEntry {
                node,
                depth,
                parent,
            }));
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample() -> Tree {
        Tree::new(
            "r1",
            vec![
                TreeNode::new(
                    "n1",
                    "Documents",
                    vec![
                        TreeNode::new("n2", "Invoices", vec![TreeNode::new("n3", "2024", vec![])]),
                        TreeNode::new("n4", "Letters", vec![]),
                    ],
                ),
                TreeNode::new("n5", "Photos", vec![]),
            ],
        )
    }

    #[test]
    fn walk_is_preorder_in_server_order() {
        let tree = sample();
        let visited: Vec<(&str, usize, &str)> = tree
            .walk()
            .map(|e| (e.node.id.as_str(), e.depth, e.parent.as_str()))
            .collect();

        assert_eq!(
            visited,
            vec![
                ("n1", 0, "r1"),
                ("n2", 1, "n1"),
                ("n3", 2, "n2"),
                ("n4", 1, "n1"),
                ("n5", 0, "r1"),
            ]
        );
    }

    #[test]
    fn find_and_contains() {
        let tree = sample();
        assert_eq!(tree.find(&"n3".into()).map(|n| n.name.as_str()), Some("2024"));
        assert!(tree.contains(&"n5".into()));
        assert!(!tree.contains(&"r1".into()));
        assert!(tree.is_root(&"r1".into()));
        assert!(!tree.contains(&"missing".into()));
    }

    #[test]
    fn parent_of_reports_root_for_top_level() {
        let tree = sample();
        assert_eq!(tree.parent_of(&"n1".into()), Some(&NodeId::from("r1")));
        assert_eq!(tree.parent_of(&"n4".into()), Some(&NodeId::from("n1")));
        assert_eq!(tree.parent_of(&"r1".into()), None);
    }

    #[test]
    fn subtree_ids_include_the_node_itself() {
        let tree = sample();
        let ids: Vec<String> = tree
            .subtree_ids(&"n1".into())
            .into_iter()
            .map(|id| id.to_string())
            .collect();
        assert_eq!(ids, vec!["n1", "n2", "n3", "n4"]);
        assert!(tree.subtree_ids(&"missing".into()).is_empty());
    }

    #[test]
    fn len_excludes_root() {
        assert_eq!(sample().len(), 5);
        let empty = Tree::new("r1", vec![]);
        assert_eq!(empty.len(), 0);
        assert!(empty.is_empty());
    }
}
