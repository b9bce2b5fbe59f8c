//! # Template Arguments
//!
//! A clang type node for `std::vector<Bar>` is flat: the arguments are only
//! visible through the reference cursors (`NamespaceRef`, `TemplateRef`,
//! `TypeRef`) that spell the type at its use site. [`TypeSite::resolve`]
//! reads those cursors once and produces a small tree, so classification
//! never has to look at sibling declarations.

use super::{DeclGraph, NodeId, TypeId};
use crate::types::CursorKind;

/// Template names the binding knows how to carry across the boundary
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateFamily
{
    /// `std::shared_ptr`
    SharedPtr,
    /// `std::vector`
    Sequence,
    /// Anything else, by unqualified name
    Other(String),
}

impl TemplateFamily
{
    #[must_use]
    pub fn from_name(name: &str) -> Self
    {
        let unqualified = name.rsplit("::").next().unwrap_or(name).trim();
        match unqualified {
            "shared_ptr" => Self::SharedPtr,
            "vector" => Self::Sequence,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// A template instantiation at a use site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateUse
{
    pub family: TemplateFamily,
    pub arguments: Vec<TypeSite>,
}

/// A type as written at one use site
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeSite
{
    pub ty: Option<TypeId>,
    pub template: Option<TemplateUse>,
}

impl TypeSite
{
    /// A site with no template information
    #[must_use]
    pub const fn plain(ty: Option<TypeId>) -> Self
    {
        Self { ty, template: None }
    }

    /// Resolve a site from the children of the declaration that uses `ty`
    ///
    /// Only the leading run of type-spelling references is considered;
    /// parameters and bodies that follow belong to something else.
    #[must_use]
    pub fn resolve(graph: &DeclGraph, ty: Option<TypeId>, children: &[NodeId]) -> Self
    {
        let spelling_len = children
            .iter()
            .position(|id| !graph.node(*id).kind.is_type_spelling())
            .unwrap_or(children.len());
        resolve_span(graph, ty, &children[..spelling_len])
    }

    /// The site of a parameter or variable declaration
    #[must_use]
    pub fn of_declaration(graph: &DeclGraph, id: NodeId) -> Self
    {
        let node = graph.node(id);
        Self::resolve(graph, node.type_id, &node.children)
    }

    /// The return-type site of a function or method declaration
    #[must_use]
    pub fn of_return(graph: &DeclGraph, id: NodeId) -> Self
    {
        let node = graph.node(id);
        let ret = node.type_id.and_then(|ty| graph.type_node(ty).next());
        Self::resolve(graph, ret, &node.children)
    }
}

fn resolve_span(graph: &DeclGraph, ty: Option<TypeId>, refs: &[NodeId]) -> TypeSite
{
    let Some(at) = refs.iter().position(|id| graph.node(*id).kind == CursorKind::TemplateRef) else {
        return TypeSite::plain(ty);
    };
    let family = TemplateFamily::from_name(graph.name(refs[at]));
    let rest = &refs[at + 1..];

    let arguments = match family {
        TemplateFamily::SharedPtr => match rest.iter().position(|id| graph.node(*id).kind == CursorKind::TemplateRef) {
            // The pointee is itself an instantiation with no type node of its own
            Some(nested) => vec![resolve_span(graph, None, &rest[nested..])],
            // Qualifying TypeRefs come first; the last one names the pointee
            None => rest
                .iter()
                .rev()
                .find(|id| graph.node(**id).kind == CursorKind::TypeRef)
                .map(|id| TypeSite::plain(graph.node(*id).type_id))
                .into_iter()
                .collect(),
        },
        TemplateFamily::Sequence => rest
            .iter()
            .position(|id| graph.node(*id).kind != CursorKind::NamespaceRef)
            .map(|first| resolve_span(graph, graph.node(rest[first]).type_id, &rest[first..]))
            .into_iter()
            .collect(),
        TemplateFamily::Other(_) => Vec::new(),
    };

    TypeSite {
        ty,
        template: Some(TemplateUse { family, arguments }),
    }
}
