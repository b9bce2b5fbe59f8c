//! Source-offset lookup over a sorted snapshot of the declarations.

use super::{DeclGraph, NodeId};

impl DeclGraph
{
    pub(super) fn index_offsets(&mut self)
    {
        // Merged namespaces have no children left to cover
        let mut order: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|node| node.merged_into.is_none())
            .map(|node| node.id)
            .collect();
        order.sort_by_key(|id| {
            let node = &self.nodes[id.0];
            (node.source_file, node.start_offset, id.0)
        });
        self.by_offset = order;
    }

    /// Innermost declaration at `offset` in `file`
    ///
    /// Finds the node with the greatest start at or before `offset`. When
    /// that node ends before `offset`, the nearest ancestor in the same file
    /// that covers it is preferred; with none, the preceding node is still
    /// returned. `None` only when no node of `file` starts at or before
    /// `offset`.
    #[must_use]
    pub fn node_for_offset(&self, file: i64, offset: u32) -> Option<NodeId>
    {
        let end = self.by_offset.partition_point(|id| {
            let node = &self.nodes[id.0];
            (node.source_file, node.start_offset) <= (file, offset)
        });
        let candidate = *self.by_offset[..end].last()?;
        if self.node(candidate).source_file != file {
            return None;
        }

        let mut current = Some(candidate);
        while let Some(id) = current {
            let node = self.node(id);
            if node.source_file != file {
                break;
            }
            if node.covers(offset) {
                return Some(id);
            }
            current = node.parent;
        }
        Some(candidate)
    }
}
