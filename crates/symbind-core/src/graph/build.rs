//! Graph construction from decoded tables.
//!
//! Runs in dependency order: type nodes, then all declaration nodes, then
//! parent/child edges, then cross references. Every index is checked on the
//! way so a dangling reference fails the whole build.

use std::collections::HashMap;

use smallvec::SmallVec;
use tracing::debug;

use super::{DeclGraph, DeclNode, NodeId, TokenId, TypeId, TypeNode};
use crate::error::{LoadError, LoadResult};
use crate::types::records::{DeclarationRecord, SymbolTables};
use crate::types::CursorKind;

/// Resolve a stored index: negative means null, anything else must be in range
fn resolve(
    raw: i64,
    len: usize,
    table: &'static str,
    index: usize,
    field: &'static str,
) -> LoadResult<Option<usize>>
{
    if raw < 0 {
        return Ok(None);
    }
    match usize::try_from(raw) {
        Ok(target) if target < len => Ok(Some(target)),
        _ => Err(LoadError::DanglingReference {
            table,
            index,
            field,
            target: raw,
        }),
    }
}

impl DeclGraph
{
    /// Build the graph, merge duplicate namespaces and index offsets
    pub fn build(tables: SymbolTables) -> LoadResult<Self>
    {
        let SymbolTables {
            filenames,
            tokens,
            types: type_records,
            declarations,
        } = tables;
        let token_count = tokens.len();

        let mut types = Vec::with_capacity(type_records.len());
        for (index, record) in type_records.iter().enumerate() {
            let token = resolve(record.token, token_count, "types", index, "token")?.map(TokenId);
            let mut children = SmallVec::with_capacity(record.children.len());
            for child in &record.children {
                if let Some(child) = resolve(*child, type_records.len(), "types", index, "children")? {
                    children.push(TypeId(child));
                }
            }
            types.push(TypeNode {
                key: record.key,
                hash: record.hash,
                kind: record.type_kind(),
                token,
                children,
                is_const: record.is_const,
            });
        }

        // Pass 1: allocate every node before any edge is followed
        let mut nodes = Vec::with_capacity(declarations.len());
        for (index, record) in declarations.iter().enumerate() {
            nodes.push(allocate(index, record, token_count, types.len())?);
        }

        // Pass 2: parent/child edges in table order
        let mut roots = Vec::new();
        for (index, record) in declarations.iter().enumerate() {
            match resolve(record.parent, nodes.len(), "declarations", index, "parent")? {
                Some(parent) if parent == index => return Err(LoadError::ParentCycle { index }),
                Some(parent) => {
                    nodes[index].parent = Some(NodeId(parent));
                    nodes[parent].children.push(NodeId(index));
                }
                None => roots.push(NodeId(index)),
            }
        }
        check_acyclic(&nodes)?;

        // Pass 3: forward and backward cross references
        for (index, record) in declarations.iter().enumerate() {
            nodes[index].referenced =
                resolve(record.referenced, nodes.len(), "declarations", index, "referenced")?.map(NodeId);
        }

        let mut graph = Self {
            filenames,
            tokens: tokens.into_iter().map(|t| t.text).collect(),
            types,
            nodes,
            roots,
            ..Self::default()
        };
        graph.merge_namespaces();
        graph.index_offsets();

        debug!(
            "Built declaration graph: {} nodes, {} roots, {} types",
            graph.nodes.len(),
            graph.roots.len(),
            graph.types.len()
        );
        Ok(graph)
    }

    /// Fold same-named sibling namespaces into their first occurrence
    ///
    /// Applied to the roots and then to every surviving node's children, so
    /// namespaces reopened at any depth end up as one node.
    fn merge_namespaces(&mut self)
    {
        let roots = std::mem::take(&mut self.roots);
        self.roots = self.merge_siblings(roots);

        let mut stack = self.roots.clone();
        while let Some(id) = stack.pop() {
            let children = std::mem::take(&mut self.nodes[id.0].children);
            let merged = self.merge_siblings(children);
            stack.extend(merged.iter().copied());
            self.nodes[id.0].children = merged;
        }
    }

    fn merge_siblings(&mut self, siblings: Vec<NodeId>) -> Vec<NodeId>
    {
        let mut first_by_name: HashMap<String, NodeId> = HashMap::new();
        let mut kept = Vec::with_capacity(siblings.len());
        for id in siblings {
            if self.nodes[id.0].kind != CursorKind::Namespace {
                kept.push(id);
                continue;
            }
            let name = self.token_text(self.nodes[id.0].token).to_owned();
            if let Some(&target) = first_by_name.get(&name) {
                let moved = std::mem::take(&mut self.nodes[id.0].children);
                for child in &moved {
                    self.nodes[child.0].parent = Some(target);
                }
                self.nodes[target.0].children.extend(moved);
                self.nodes[id.0].merged_into = Some(target);
            } else {
                first_by_name.insert(name, id);
                kept.push(id);
            }
        }
        kept
    }
}

fn allocate(index: usize, record: &DeclarationRecord, token_count: usize, type_count: usize) -> LoadResult<DeclNode>
{
    Ok(DeclNode {
        id: NodeId(index),
        key: record.key,
        kind: record.cursor_kind(),
        token: resolve(record.token, token_count, "declarations", index, "token")?.map(TokenId),
        type_id: resolve(record.type_index, type_count, "declarations", index, "type")?.map(TypeId),
        parent: None,
        referenced: None,
        children: Vec::new(),
        access: record.access(),
        storage: record.storage_class(),
        is_abstract: record.is_abstract(),
        is_deleted: record.is_deleted(),
        compiling_file: record.compiling_file,
        source_file: record.source_file,
        line: record.line,
        column: record.column,
        start_offset: record.start_offset,
        end_offset: record.end_offset,
        merged_into: None,
        enabled: false,
    })
}

/// Every parent chain must end at a root
fn check_acyclic(nodes: &[DeclNode]) -> LoadResult<()>
{
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark
    {
        Unvisited,
        OnPath,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; nodes.len()];
    let mut path = Vec::new();
    for start in 0..nodes.len() {
        let mut current = Some(start);
        while let Some(index) = current {
            match marks[index] {
                Mark::Done => break,
                Mark::OnPath => return Err(LoadError::ParentCycle { index }),
                Mark::Unvisited => {
                    marks[index] = Mark::OnPath;
                    path.push(index);
                    current = nodes[index].parent.map(|p| p.0);
                }
            }
        }
        for index in path.drain(..) {
            marks[index] = Mark::Done;
        }
    }
    Ok(())
}
