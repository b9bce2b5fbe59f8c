//! Registry of the classes, structs and enums a generation run wraps.

use std::collections::HashMap;

use crate::graph::{DeclGraph, NodeId};
use crate::types::{CursorKind, TypeKind};

/// How a registered type crosses the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrappedKind
{
    /// Opaque handle with a wrapper class
    Class,
    /// Flat named-integer enumeration
    Enum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrappedEntry
{
    pub kind: WrappedKind,
    pub node: NodeId,
}

/// Canonical type name to wrapped type
///
/// Built once per generation run (Phase 1) and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct WrappedRegistry
{
    entries: HashMap<String, WrappedEntry>,
}

impl WrappedRegistry
{
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Walk the graph and register every class, struct and enum `accept` allows
    ///
    /// Namespaces extend the name prefix; linkage specs and unexposed
    /// declarations are walked without adding a segment. The first
    /// registration of a name wins.
    pub fn collect<F>(graph: &DeclGraph, mut accept: F) -> Self
    where
        F: FnMut(NodeId) -> bool,
    {
        let mut registry = Self::new();
        let mut stack: Vec<(NodeId, String)> = graph.roots().iter().rev().map(|id| (*id, String::new())).collect();

        while let Some((id, prefix)) = stack.pop() {
            let node = graph.node(id);
            let type_kind = node.type_id.map(|ty| graph.type_node(ty).kind);
            let scope_prefix = match node.kind {
                CursorKind::ClassDecl | CursorKind::StructDecl if type_kind == Some(TypeKind::Record) => {
                    let name = format!("{prefix}{}", graph.name(id));
                    if accept(id) {
                        registry.insert(name.clone(), WrappedKind::Class, id);
                    }
                    Some(format!("{name}::"))
                }
                CursorKind::EnumDecl if type_kind == Some(TypeKind::Enum) => {
                    if accept(id) {
                        registry.insert(format!("{prefix}{}", graph.name(id)), WrappedKind::Enum, id);
                    }
                    None
                }
                CursorKind::Namespace => {
                    let name = graph.name(id);
                    Some(if name.is_empty() { prefix.clone() } else { format!("{prefix}{name}::") })
                }
                kind if kind.is_transparent_context() => Some(prefix.clone()),
                _ => None,
            };
            if let Some(scope_prefix) = scope_prefix {
                for child in node.children.iter().rev() {
                    stack.push((*child, scope_prefix.clone()));
                }
            }
        }
        registry
    }

    pub fn insert(&mut self, name: String, kind: WrappedKind, node: NodeId)
    {
        self.entries.entry(name).or_insert(WrappedEntry { kind, node });
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&WrappedEntry>
    {
        self.entries.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool
    {
        self.entries.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize
    {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WrappedEntry)>
    {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }
}
