//! # Types
//!
//! Raw table records and the clang kind enums they carry.

pub mod kinds;
pub mod records;

pub use kinds::{AccessSpecifier, CursorKind, StorageClass, TypeKind};
pub use records::{DeclarationRecord, SymbolTables, Token, TypeRecord};
