//! # Binding Emitters
//!
//! Three text generators driven in lockstep by the traversal:
//!
//! - [`NativeEmitter`]: C++ export shim with `extern "C"` entry points
//! - [`ImportEmitter`]: managed foreign-import declarations for those entry points
//! - [`WrapperEmitter`]: managed classes that call the imports
//!
//! Every emitter renders parameters and returns from the same [`AbiPlan`],
//! so a function appears with one shape in all three outputs or not at all.
//!
//! ## Dispatch
//!
//! The driver does not care which artifact it is producing. Scope changes,
//! enums and functions are announced once and each emitter picks what it
//! needs; the defaults ignore events an artifact has no use for.

mod import;
mod native;
mod wrapper;

use std::fs;
use std::io;
use std::path::Path;

pub use self::import::ImportEmitter;
pub use self::native::NativeEmitter;
pub use self::wrapper::WrapperEmitter;
use crate::abi::{AbiPlan, ContainerPlan};

/// First line of every generated file
pub const GENERATED_BANNER: &str = "// Generated by symbind. Do not edit.";

/// A bound parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundParameter
{
    /// Name in the native shim
    pub name: String,
    /// Name in managed signatures, escaped when it is a managed keyword
    pub managed_name: String,
    pub plan: AbiPlan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind
{
    /// Constructor with its index among the class's emitted constructors
    Constructor
    {
        index: usize,
    },
    Method
    {
        is_static: bool,
    },
    /// Free function in a namespace
    Free,
}

/// A function every emitter writes one entry for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundFunction
{
    pub kind: FunctionKind,
    /// Canonical name of the enclosing class or namespace
    pub scope: String,
    /// C++ identifier
    pub name: String,
    /// Member name in the wrapper
    pub managed_name: String,
    /// Export symbol of the native shim
    pub symbol: String,
    pub parameters: Vec<BoundParameter>,
    pub returns: AbiPlan,
    /// Rendered as a managed indexer (`operator[]`)
    pub is_indexer: bool,
}

impl BoundFunction
{
    /// Instance members take the handle of `this` first
    #[must_use]
    pub const fn takes_this(&self) -> bool
    {
        matches!(self.kind, FunctionKind::Method { is_static: false })
    }

    /// Qualified C++ name used in native calls
    #[must_use]
    pub fn qualified_name(&self) -> String
    {
        if self.scope.is_empty() {
            format!("::{}", self.name)
        } else {
            format!("{}::{}", self.scope, self.name)
        }
    }
}

/// A wrapped class scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassScope
{
    pub canonical: String,
    /// Unqualified name
    pub name: String,
    pub handle_type: String,
    pub release_symbol: String,
}

/// A flat enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef
{
    pub canonical: String,
    pub name: String,
    pub values: Vec<(String, i64)>,
}

/// Receives the traversal's events and renders one artifact
pub trait BindingEmitter
{
    /// A namespace scope opens
    fn push_namespace(&mut self, _name: &str) {}

    /// A class scope opens
    fn push_class(&mut self, _class: &ClassScope) {}

    /// The innermost namespace or class scope closes
    fn pop_scope(&mut self) {}

    fn add_enum(&mut self, _definition: &EnumDef) {}

    /// A source file whose declarations the output uses
    fn add_include(&mut self, _path: &str) {}

    /// A container type some signature uses; called once per occurrence
    fn add_container(&mut self, _container: &ContainerPlan) {}

    fn emit_function(&mut self, function: &BoundFunction);

    /// Everything before the body
    fn header(&self) -> String;

    /// Generated declarations, in emission order
    fn body(&self) -> &str;

    /// Everything after the body
    fn footer(&self) -> String;

    fn render(&self) -> String
    {
        let mut out = self.header();
        out.push_str(self.body());
        out.push_str(&self.footer());
        out
    }

    fn write(&self, path: &Path) -> io::Result<()>
    {
        fs::write(path, self.render())
    }
}

/// `type name`, keeping pointer stars next to the name
pub(crate) fn declare(ty: &str, name: &str) -> String
{
    if ty.ends_with('*') {
        format!("{ty}{name}")
    } else {
        format!("{ty} {name}")
    }
}

pub(crate) fn indent(level: usize) -> String
{
    "    ".repeat(level)
}
