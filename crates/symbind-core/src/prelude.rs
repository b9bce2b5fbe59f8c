//! Common module for library exports

pub use crate::abi::{AbiPlan, HandleForm, Ownership, Wire};
pub use crate::classify::{Category, Classifier, EType, Position, StringKind, WrappedRegistry};
pub use crate::diagnostics::{DiagnosticSink, MemorySink, TracingSink};
pub use crate::driver::{collect_registry, generate, GenerationOutput, GenerationReport, GenerationSession};
pub use crate::emit::BindingEmitter;
pub use crate::error::{ClassificationError, LoadError, LoadResult, Result, SymbindError};
pub use crate::graph::{DeclGraph, DeclNode, NodeId, SourceFileLookup, TypeId, TypeSite, Visit};
pub use crate::options::GeneratorOptions;
pub use crate::types::{CursorKind, SymbolTables, TypeKind};
pub use crate::workspace::{LoadStatus, Workspace};
