//! Subtree search and enable propagation.

use super::{DeclGraph, DeclNode, NodeId};

/// Verdict of a [`DeclGraph::find_children`] predicate for one node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit
{
    /// Collect the node; its subtree is not searched
    Include,
    /// Skip the node but search its children
    Descend,
    /// Skip the node and its subtree
    Prune,
    /// Stop the whole search, keeping what was collected so far
    Abort,
}

impl DeclGraph
{
    /// Depth-first, declaration-order search below `parent` (the roots when `None`)
    pub fn find_children<F>(&self, parent: Option<NodeId>, mut visit: F) -> Vec<NodeId>
    where
        F: FnMut(&DeclNode) -> Visit,
    {
        let start = parent.map_or(self.roots.as_slice(), |p| self.node(p).children.as_slice());
        let mut found = Vec::new();
        let mut stack = vec![start.iter()];
        while let Some(level) = stack.last_mut() {
            let Some(&id) = level.next() else {
                stack.pop();
                continue;
            };
            let node = self.node(id);
            match visit(node) {
                Visit::Include => found.push(id),
                Visit::Descend => stack.push(node.children.iter()),
                Visit::Prune => {}
                Visit::Abort => break,
            }
        }
        found
    }

    /// Direct children of `parent` matching `kind`
    #[must_use]
    pub fn children_of_kind(&self, parent: NodeId, kind: crate::types::CursorKind) -> Vec<NodeId>
    {
        self.find_children(Some(parent), |node| if node.kind == kind { Visit::Include } else { Visit::Prune })
    }

    /// Set a node's enabled flag
    ///
    /// Enabling always enables every ancestor. With `recursive` the same
    /// value is applied to the whole subtree.
    pub fn set_enabled(&mut self, id: NodeId, value: bool, recursive: bool)
    {
        self.nodes[id.0].enabled = value;
        if value {
            let mut current = self.nodes[id.0].parent;
            while let Some(parent) = current {
                self.nodes[parent.0].enabled = true;
                current = self.nodes[parent.0].parent;
            }
        }
        if recursive {
            let mut stack = self.nodes[id.0].children.clone();
            while let Some(child) = stack.pop() {
                self.nodes[child.0].enabled = value;
                stack.extend_from_slice(&self.nodes[child.0].children);
            }
        }
    }

    /// Set every node's enabled flag
    pub fn set_all_enabled(&mut self, value: bool)
    {
        for node in &mut self.nodes {
            node.enabled = value;
        }
    }

    /// Enable only the declarations of one source file (and their ancestors)
    pub fn enable_file(&mut self, file: i64)
    {
        self.set_all_enabled(false);
        let in_file: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|node| node.source_file == file && node.merged_into.is_none())
            .map(|node| node.id)
            .collect();
        for id in in_file {
            self.set_enabled(id, true, false);
        }
    }
}
