//! # Table Records
//!
//! The four tables of a symbol dump, exactly as they are stored.
//!
//! Records keep the raw integers of the file (indices with `-1` for null,
//! packed flags, kind numbers) so a decode followed by an encode reproduces
//! the same bytes. Interpretation happens when the declaration graph is
//! built from them.

use super::kinds::{AccessSpecifier, CursorKind, StorageClass, TypeKind};

/// Index value meaning "no reference"
pub const NULL_INDEX: i64 = -1;

const ACCESS_MASK: i32 = 0b11;
const ABSTRACT_BIT: i32 = 1 << 2;
const STORAGE_SHIFT: i32 = 3;
const STORAGE_MASK: i32 = 0b111;
const DELETED_BIT: i32 = 1 << 6;

/// An interned identifier or type spelling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token
{
    pub key: u64,
    pub text: String,
}

/// One node of a type chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRecord
{
    pub key: i64,
    pub hash: i64,
    /// Indices into the type table; the first entry is the next layer
    pub children: Vec<i64>,
    pub token: i64,
    pub kind: i32,
    pub is_const: bool,
}

impl TypeRecord
{
    #[must_use]
    pub fn type_kind(&self) -> TypeKind
    {
        TypeKind::from_raw(self.kind)
    }
}

/// One declaration or reference cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationRecord
{
    pub key: i64,
    pub compiling_file: i64,
    pub parent: i64,
    pub referenced: i64,
    pub kind: i32,
    pub flags: i32,
    pub type_index: i64,
    pub token: i64,
    pub line: u32,
    pub column: u32,
    pub start_offset: u32,
    pub end_offset: u32,
    pub source_file: i64,
}

impl DeclarationRecord
{
    #[must_use]
    pub fn cursor_kind(&self) -> CursorKind
    {
        CursorKind::from_raw(self.kind)
    }

    #[must_use]
    pub fn access(&self) -> AccessSpecifier
    {
        AccessSpecifier::from_raw(self.flags & ACCESS_MASK)
    }

    #[must_use]
    pub fn is_abstract(&self) -> bool
    {
        self.flags & ABSTRACT_BIT != 0
    }

    #[must_use]
    pub fn storage_class(&self) -> StorageClass
    {
        StorageClass::from_raw((self.flags >> STORAGE_SHIFT) & STORAGE_MASK)
    }

    #[must_use]
    pub fn is_deleted(&self) -> bool
    {
        self.flags & DELETED_BIT != 0
    }

    /// Pack declaration attributes into the on-disk flags word
    #[must_use]
    pub fn pack_flags(access: AccessSpecifier, is_abstract: bool, storage: StorageClass, is_deleted: bool) -> i32
    {
        let mut flags = access.raw() & ACCESS_MASK;
        if is_abstract {
            flags |= ABSTRACT_BIT;
        }
        flags |= (storage.raw() & STORAGE_MASK) << STORAGE_SHIFT;
        if is_deleted {
            flags |= DELETED_BIT;
        }
        flags
    }
}

/// The decoded contents of a symbol dump
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTables
{
    pub filenames: Vec<String>,
    pub tokens: Vec<Token>,
    pub types: Vec<TypeRecord>,
    pub declarations: Vec<DeclarationRecord>,
}

impl SymbolTables
{
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.filenames.is_empty() && self.tokens.is_empty() && self.types.is_empty() && self.declarations.is_empty()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_flags_unpack()
    {
        let flags = DeclarationRecord::pack_flags(AccessSpecifier::Protected, true, StorageClass::Static, true);
        let record = DeclarationRecord {
            key: 0,
            compiling_file: 0,
            parent: NULL_INDEX,
            referenced: NULL_INDEX,
            kind: CursorKind::CxxMethod.raw(),
            flags,
            type_index: NULL_INDEX,
            token: NULL_INDEX,
            line: 0,
            column: 0,
            start_offset: 0,
            end_offset: 0,
            source_file: 0,
        };
        assert_eq!(record.access(), AccessSpecifier::Protected);
        assert!(record.is_abstract());
        assert_eq!(record.storage_class(), StorageClass::Static);
        assert!(record.is_deleted());
        assert_eq!(record.cursor_kind(), CursorKind::CxxMethod);
    }

    #[test]
    fn test_flags_without_optional_bits()
    {
        let flags = DeclarationRecord::pack_flags(AccessSpecifier::Public, false, StorageClass::None, false);
        assert_eq!(flags, 1 | (1 << 3));
    }
}
