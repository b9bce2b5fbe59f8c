//! # symbind-core
//!
//! Reads a compressed dump of a parsed C++ translation unit and generates
//! bindings for the API it declares.
//!
//! This crate provides:
//! - The symbol dump decoder and encoder ([`store`])
//! - An arena-backed declaration graph with offset lookup and queries ([`graph`])
//! - Type classification against a registry of wrapped types ([`classify`])
//! - One ABI plan per supported type, shared by every emitter ([`abi`])
//! - Native export, foreign-import and wrapper emitters ([`emit`])
//! - The two-phase generation driver ([`driver`]) and a loaded-dump [`Workspace`]
//!
//! ## Pipeline
//!
//! ```text
//! dump file -> SymbolTables -> DeclGraph -> WrappedRegistry -> EType -> AbiPlan -> emitters
//! ```
//!
//! Everything is single-threaded and synchronous. The only I/O is reading
//! the dump and writing the generated files.

pub mod abi;
pub mod classify;
pub mod diagnostics;
pub mod driver;
pub mod emit;
pub mod error;
pub mod graph;
pub mod names;
pub mod options;
pub mod prelude;
pub mod store;
pub mod types;
pub mod workspace;

pub use classify::{Category, EType, Position};
pub use diagnostics::{DiagnosticSink, MemorySink, TracingSink};
pub use driver::{generate, GenerationOutput, GenerationReport};
// Re-export commonly used types
pub use error::{ClassificationError, LoadError, Result, SymbindError};
pub use graph::{DeclGraph, NodeId};
pub use options::GeneratorOptions;
pub use workspace::{LoadStatus, Workspace};
