//! # Declaration Graph
//!
//! Arena of declaration and type nodes built from a decoded symbol dump.
//!
//! Nodes live in vectors and refer to each other through [`NodeId`] and
//! [`TypeId`] indices. Construction validates every index once, so lookups
//! afterwards never fail for ids handed out by the same graph.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use symbind_core::graph::{DeclGraph, Visit};
//! use symbind_core::types::CursorKind;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>>
//! {
//!     let tables = symbind_core::store::load(Path::new("symbols.db"))?;
//!     let graph = DeclGraph::build(tables)?;
//!
//!     let classes = graph.find_children(None, |node| match node.kind {
//!         CursorKind::ClassDecl => Visit::Include,
//!         CursorKind::Namespace => Visit::Descend,
//!         _ => Visit::Prune,
//!     });
//!     for id in classes {
//!         println!("{}", graph.name(id));
//!     }
//!     Ok(())
//! }
//! ```

mod build;
mod offsets;
pub mod template;
mod walk;

use std::collections::HashMap;

use once_cell::sync::OnceCell;
use smallvec::SmallVec;

pub use self::template::{TemplateFamily, TemplateUse, TypeSite};
pub use self::walk::Visit;
use crate::types::{AccessSpecifier, CursorKind, StorageClass, TypeKind};

/// Index of a declaration node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

/// Index of a type node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub(crate) usize);

/// Index of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId(pub(crate) usize);

impl NodeId
{
    /// Position in the declaration table
    #[must_use]
    pub const fn index(self) -> usize
    {
        self.0
    }
}

impl TypeId
{
    /// Position in the type table
    #[must_use]
    pub const fn index(self) -> usize
    {
        self.0
    }
}

/// One layer of a type chain
#[derive(Debug, Clone)]
pub struct TypeNode
{
    pub key: i64,
    pub hash: i64,
    pub kind: TypeKind,
    pub token: Option<TokenId>,
    pub children: SmallVec<[TypeId; 2]>,
    pub is_const: bool,
}

impl TypeNode
{
    /// The layer this one wraps (pointee, referent, aliased type, ...)
    #[must_use]
    pub fn next(&self) -> Option<TypeId>
    {
        self.children.first().copied()
    }
}

/// A declaration or reference cursor with its resolved edges
#[derive(Debug, Clone)]
pub struct DeclNode
{
    pub id: NodeId,
    pub key: i64,
    pub kind: CursorKind,
    pub token: Option<TokenId>,
    pub type_id: Option<TypeId>,
    pub parent: Option<NodeId>,
    pub referenced: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub access: AccessSpecifier,
    pub storage: StorageClass,
    pub is_abstract: bool,
    pub is_deleted: bool,
    pub compiling_file: i64,
    pub source_file: i64,
    pub line: u32,
    pub column: u32,
    pub start_offset: u32,
    pub end_offset: u32,
    /// Set on duplicate namespaces whose children moved to the first instance
    pub merged_into: Option<NodeId>,
    pub enabled: bool,
}

impl DeclNode
{
    /// Whether `offset` lies in `[start_offset, end_offset)`
    #[must_use]
    pub const fn covers(&self, offset: u32) -> bool
    {
        self.start_offset <= offset && offset < self.end_offset
    }

    #[must_use]
    pub fn is_public(&self) -> bool
    {
        self.access == AccessSpecifier::Public
    }
}

/// Maps 1-based file indices to paths and back
pub trait SourceFileLookup
{
    /// Path of the file with the given 1-based index
    fn file_name(&self, index: i64) -> Option<&str>;

    /// 1-based index of a path, compared case-insensitively
    fn source_file_index(&self, path: &str) -> Option<i64>;
}

/// The declaration graph of one loaded dump
#[derive(Debug, Default)]
pub struct DeclGraph
{
    filenames: Vec<String>,
    tokens: Vec<String>,
    types: Vec<TypeNode>,
    nodes: Vec<DeclNode>,
    roots: Vec<NodeId>,
    /// Node ids sorted by `(source_file, start_offset)`
    by_offset: Vec<NodeId>,
    type_refs: OnceCell<HashMap<TypeId, Vec<NodeId>>>,
}

impl DeclGraph
{
    /// An empty graph, as left behind when no symbol data is loaded
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize
    {
        self.nodes.len()
    }

    #[must_use]
    pub fn type_count(&self) -> usize
    {
        self.types.len()
    }

    #[must_use]
    pub fn token_count(&self) -> usize
    {
        self.tokens.len()
    }

    #[must_use]
    pub fn filenames(&self) -> &[String]
    {
        &self.filenames
    }

    /// Top-level declarations in table order, after namespace merging
    #[must_use]
    pub fn roots(&self) -> &[NodeId]
    {
        &self.roots
    }

    pub fn nodes(&self) -> impl Iterator<Item = &DeclNode>
    {
        self.nodes.iter()
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &DeclNode
    {
        &self.nodes[id.0]
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&DeclNode>
    {
        self.nodes.get(index)
    }

    #[must_use]
    pub fn type_node(&self, id: TypeId) -> &TypeNode
    {
        &self.types[id.0]
    }

    /// Type node by its position in the type table
    #[must_use]
    pub fn type_at(&self, index: usize) -> Option<TypeId>
    {
        (index < self.types.len()).then_some(TypeId(index))
    }

    /// Type node by its stored key
    #[must_use]
    pub fn find_type_by_key(&self, key: i64) -> Option<TypeId>
    {
        self.types.iter().position(|ty| ty.key == key).map(TypeId)
    }

    /// Declaration by its stored key
    #[must_use]
    pub fn find_by_key(&self, key: i64) -> Option<NodeId>
    {
        self.nodes.iter().find(|node| node.key == key).map(|node| node.id)
    }

    #[must_use]
    pub fn token_text(&self, token: Option<TokenId>) -> &str
    {
        token.map_or("", |t| self.tokens[t.0].as_str())
    }

    /// Identifier of a declaration, empty when it has none
    #[must_use]
    pub fn name(&self, id: NodeId) -> &str
    {
        self.token_text(self.node(id).token)
    }

    /// Spelling of a type layer
    #[must_use]
    pub fn type_text(&self, id: TypeId) -> &str
    {
        self.token_text(self.type_node(id).token)
    }

    /// Ancestors from the direct parent up to the root
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_
    {
        std::iter::successors(self.node(id).parent, move |p| self.node(*p).parent)
    }

    /// Children currently enabled for display
    pub fn visible_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_
    {
        self.node(id)
            .children
            .iter()
            .copied()
            .filter(move |c| self.node(*c).enabled)
    }

    /// Roots currently enabled for display
    pub fn visible_roots(&self) -> impl Iterator<Item = NodeId> + '_
    {
        self.roots.iter().copied().filter(move |r| self.node(*r).enabled)
    }

    /// Declarations whose identifier contains `needle`
    ///
    /// Namespaces merged into an earlier sibling are reported once.
    #[must_use]
    pub fn query_tokens(&self, needle: &str) -> Vec<NodeId>
    {
        self.nodes
            .iter()
            .filter(|node| node.merged_into.is_none())
            .filter(|node| node.token.is_some() && self.token_text(node.token).contains(needle))
            .map(|node| node.id)
            .collect()
    }

    /// Declarations whose type chain passes through `ty`
    pub fn type_references(&self, ty: TypeId) -> &[NodeId]
    {
        let index = self.type_refs.get_or_init(|| self.build_type_references());
        index.get(&ty).map_or(&[], Vec::as_slice)
    }

    fn build_type_references(&self) -> HashMap<TypeId, Vec<NodeId>>
    {
        let mut index: HashMap<TypeId, Vec<NodeId>> = HashMap::new();
        for node in &self.nodes {
            let mut layer = node.type_id;
            // Chains are short; the bound only stops malformed cycles
            for _ in 0..=self.types.len().min(64) {
                let Some(ty) = layer else { break };
                let refs = index.entry(ty).or_default();
                if refs.last() != Some(&node.id) {
                    refs.push(node.id);
                }
                layer = self.type_node(ty).next();
            }
        }
        index
    }

    /// Number of declarations per cursor kind, most frequent first
    #[must_use]
    pub fn cursor_kind_counts(&self) -> Vec<(CursorKind, usize)>
    {
        let mut counts: HashMap<CursorKind, usize> = HashMap::new();
        for node in self.nodes.iter().filter(|node| node.merged_into.is_none()) {
            *counts.entry(node.kind).or_insert(0) += 1;
        }
        let mut counts: Vec<_> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.raw().cmp(&b.0.raw())));
        counts
    }

    /// Whether a node's source file ends with one of `suffixes`, ignoring case
    #[must_use]
    pub fn is_in_file_with_suffix(&self, id: NodeId, suffixes: &[String]) -> bool
    {
        let Some(path) = self.file_name(self.node(id).source_file) else {
            return false;
        };
        let path = path.to_ascii_lowercase();
        suffixes.iter().any(|suffix| path.ends_with(&suffix.to_ascii_lowercase()))
    }
}

impl SourceFileLookup for DeclGraph
{
    fn file_name(&self, index: i64) -> Option<&str>
    {
        let slot = usize::try_from(index).ok()?.checked_sub(1)?;
        self.filenames.get(slot).map(String::as_str)
    }

    fn source_file_index(&self, path: &str) -> Option<i64>
    {
        self.filenames
            .iter()
            .position(|name| name.eq_ignore_ascii_case(path))
            .and_then(|slot| i64::try_from(slot + 1).ok())
    }
}
