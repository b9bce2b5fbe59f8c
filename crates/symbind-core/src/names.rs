//! # Names
//!
//! Canonical C++ names for declarations and unique export symbols for the
//! functions a generation run emits.

use std::collections::HashSet;

use crate::error::ClassificationError;
use crate::graph::{DeclGraph, NodeId};

/// `a::b::Foo` for a node or for the scope it sits in
///
/// Collects namespace, class and struct segments walking up the parents.
/// Linkage specs and unexposed declarations are passed through; any other
/// enclosing kind (a function body, say) ends the walk. A node that is not
/// itself a scope starts from its parent. Anonymous segments are dropped.
#[must_use]
pub fn canonical_name(graph: &DeclGraph, id: NodeId) -> String
{
    let mut segments = Vec::new();
    let mut current = Some(id);
    if !graph.node(id).kind.is_scope() {
        current = graph.node(id).parent;
    }
    while let Some(node_id) = current {
        let node = graph.node(node_id);
        if node.kind.is_scope() {
            let name = graph.name(node_id);
            if !name.is_empty() {
                segments.push(name);
            }
        } else if !node.kind.is_transparent_context() {
            break;
        }
        current = node.parent;
    }
    segments.reverse();
    segments.join("::")
}

/// Canonical name of the declaration itself, scope or not
#[must_use]
pub fn qualified_name(graph: &DeclGraph, id: NodeId) -> String
{
    if graph.node(id).kind.is_scope() {
        return canonical_name(graph, id);
    }
    let scope = canonical_name(graph, id);
    let name = graph.name(id);
    if scope.is_empty() {
        name.to_owned()
    } else {
        format!("{scope}::{name}")
    }
}

/// `a::b::Foo` to `a_b_Foo`, for use inside C symbols
#[must_use]
pub fn flatten(name: &str) -> String
{
    name.replace("::", "_")
}

/// What an operator overload turns into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorName
{
    /// `operator[]`, bound as a managed indexer
    Indexer,
    /// A fixed mnemonic usable as an identifier
    Mnemonic(&'static str),
    /// Not bound at all
    Unbindable,
}

/// Classify `name` as an operator, `None` for ordinary identifiers
#[must_use]
pub fn operator_name(name: &str) -> Option<OperatorName>
{
    let rest = name.strip_prefix("operator")?;
    let first = rest.chars().next()?;
    if first.is_ascii_alphanumeric() || first == '_' {
        return None;
    }
    Some(match rest.trim() {
        "[]" => OperatorName::Indexer,
        "<" => OperatorName::Mnemonic("oplt"),
        ">" => OperatorName::Mnemonic("opgt"),
        "==" => OperatorName::Mnemonic("opeq"),
        "!=" => OperatorName::Mnemonic("opneq"),
        "+" => OperatorName::Mnemonic("opadd"),
        "-" => OperatorName::Mnemonic("opsub"),
        "*" => OperatorName::Mnemonic("opmul"),
        "/" => OperatorName::Mnemonic("opdiv"),
        "%" => OperatorName::Mnemonic("opmod"),
        "=" => OperatorName::Mnemonic("opassign"),
        "()" => OperatorName::Mnemonic("opcall"),
        "<<" => OperatorName::Mnemonic("opshl"),
        ">>" => OperatorName::Mnemonic("opshr"),
        "+=" => OperatorName::Mnemonic("opaddassign"),
        "-=" => OperatorName::Mnemonic("opsubassign"),
        _ => OperatorName::Unbindable,
    })
}

/// `operator<`, `operator>`, `operator==` and `operator!=`
#[must_use]
pub fn is_comparison_operator(name: &str) -> bool
{
    matches!(
        operator_name(name),
        Some(OperatorName::Mnemonic("oplt" | "opgt" | "opeq" | "opneq"))
    )
}

/// Identifier a member is exported under, before collision handling
pub fn export_base_name(member: &str) -> Result<String, ClassificationError>
{
    match operator_name(member) {
        None => Ok(member.to_owned()),
        Some(OperatorName::Indexer) => Ok("oparray".to_owned()),
        Some(OperatorName::Mnemonic(mnemonic)) => Ok(mnemonic.to_owned()),
        Some(OperatorName::Unbindable) => Err(ClassificationError::OperatorNotBindable {
            name: member.to_owned(),
        }),
    }
}

const MANAGED_KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked", "class", "const",
    "continue", "decimal", "default", "delegate", "do", "double", "else", "enum", "event", "explicit", "extern",
    "false", "finally", "fixed", "float", "for", "foreach", "goto", "if", "implicit", "in", "int", "interface",
    "internal", "is", "lock", "long", "namespace", "new", "null", "object", "operator", "out", "override",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short", "sizeof",
    "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true", "try", "typeof", "uint",
    "ulong", "unchecked", "unsafe", "ushort", "using", "virtual", "void", "volatile", "while",
];

/// Parameter name usable in managed signatures
#[must_use]
pub fn managed_identifier(name: &str) -> String
{
    if MANAGED_KEYWORDS.contains(&name) {
        format!("@{name}")
    } else {
        name.to_owned()
    }
}

/// Export symbols handed out during one generation run
///
/// Names are unique per scope, and the flat symbol they form with the
/// scope prefix is unique across the whole run.
#[derive(Debug, Default)]
pub struct ExportNames
{
    used: HashSet<(String, String)>,
    symbols: HashSet<String>,
}

impl ExportNames
{
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    fn is_taken(&self, scope: &str, name: &str) -> bool
    {
        self.used.contains(&(scope.to_owned(), name.to_owned()))
            || self.symbols.contains(&format!("{}{name}", flatten(scope)))
    }

    /// Reserve a unique export name for `member` within `scope`
    ///
    /// The first use of a name gets it unchanged; later ones get `name0`,
    /// `name1`, ... in call order.
    pub fn resolve(&mut self, scope: &str, member: &str) -> Result<String, ClassificationError>
    {
        let base = export_base_name(member)?;
        let mut candidate = base.clone();
        let mut suffix = 0usize;
        while self.is_taken(scope, &candidate) {
            candidate = format!("{base}{suffix}");
            suffix += 1;
        }
        self.reserve(scope, &candidate);
        Ok(candidate)
    }

    /// Mark a name as taken without resolving it
    pub fn reserve(&mut self, scope: &str, name: &str) -> bool
    {
        let symbol = format!("{}{name}", flatten(scope));
        let fresh = self.used.insert((scope.to_owned(), name.to_owned()));
        self.symbols.insert(symbol) && fresh
    }

    #[must_use]
    pub fn len(&self) -> usize
    {
        self.used.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.used.is_empty()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_overloads_get_numbered_suffixes()
    {
        let mut names = ExportNames::new();
        assert_eq!(names.resolve("Foo", "Compute").unwrap(), "Compute");
        assert_eq!(names.resolve("Foo", "Compute").unwrap(), "Compute0");
        assert_eq!(names.resolve("Foo", "Compute").unwrap(), "Compute1");
        assert_eq!(names.resolve("Bar", "Compute").unwrap(), "Compute");
    }

    #[test]
    fn test_suffix_skips_names_already_taken()
    {
        let mut names = ExportNames::new();
        names.resolve("Foo", "Compute0").unwrap();
        names.resolve("Foo", "Compute").unwrap();
        assert_eq!(names.resolve("Foo", "Compute").unwrap(), "Compute1");
    }

    #[test]
    fn test_flat_symbols_are_unique_across_scopes()
    {
        let mut names = ExportNames::new();
        assert!(names.reserve("Foo", "_Release"));
        assert_eq!(names.resolve("", "Foo_Release").unwrap(), "Foo_Release0");
        assert_eq!(names.resolve("a", "bc").unwrap(), "bc");
        assert_eq!(names.resolve("ab", "c").unwrap(), "c0");
        assert!(!names.reserve("Foo", "_Release"));
    }

    #[test]
    fn test_operator_mnemonics()
    {
        assert_eq!(export_base_name("operator[]").unwrap(), "oparray");
        assert_eq!(export_base_name("operator==").unwrap(), "opeq");
        assert_eq!(export_base_name("operator!=").unwrap(), "opneq");
        assert_eq!(export_base_name("operator<").unwrap(), "oplt");
        assert_eq!(export_base_name("operator<<").unwrap(), "opshl");
        assert!(export_base_name("operator<=").is_err());
        assert!(export_base_name("operator>=").is_err());
        assert!(export_base_name("operator new").is_err());
    }

    #[test]
    fn test_identifiers_starting_with_operator_are_not_operators()
    {
        assert_eq!(operator_name("operatorCount"), None);
        assert_eq!(operator_name("operator_id"), None);
        assert_eq!(export_base_name("operators").unwrap(), "operators");
    }

    #[test]
    fn test_managed_keywords_are_escaped()
    {
        assert_eq!(managed_identifier("ref"), "@ref");
        assert_eq!(managed_identifier("object"), "@object");
        assert_eq!(managed_identifier("count"), "count");
    }

    #[test]
    fn test_comparison_operators()
    {
        assert!(is_comparison_operator("operator=="));
        assert!(is_comparison_operator("operator<"));
        assert!(!is_comparison_operator("operator+"));
        assert!(!is_comparison_operator("less"));
    }

    #[test]
    fn test_flatten()
    {
        assert_eq!(flatten("a::b::Foo"), "a_b_Foo");
        assert_eq!(flatten("Foo"), "Foo");
    }
}
