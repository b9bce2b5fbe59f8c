//! Builds symbol tables in memory, the way the dump producer lays them out.
#![allow(dead_code)]

use std::collections::HashMap;

use symbind_core::graph::DeclGraph;
use symbind_core::types::records::NULL_INDEX;
use symbind_core::types::{
    AccessSpecifier, CursorKind, DeclarationRecord, StorageClass, SymbolTables, Token, TypeKind, TypeRecord,
};

pub const HEADER: &str = "/work/src/api/Foo.h";

#[derive(Default)]
pub struct DumpBuilder
{
    tables: SymbolTables,
    tokens: HashMap<String, i64>,
    file: i64,
    /// Next free source offset
    cursor: u32,
}

impl DumpBuilder
{
    /// A builder whose declarations go to [`HEADER`]
    pub fn new() -> Self
    {
        let mut builder = Self::default();
        builder.file = builder.file(HEADER);
        builder
    }

    /// Register a file and make it the current one; returns its 1-based index
    pub fn file(&mut self, path: &str) -> i64
    {
        self.tables.filenames.push(path.to_owned());
        self.file = self.tables.filenames.len() as i64;
        self.file
    }

    pub fn use_file(&mut self, file: i64)
    {
        self.file = file;
    }

    pub fn token(&mut self, text: &str) -> i64
    {
        if let Some(index) = self.tokens.get(text) {
            return *index;
        }
        let index = self.tables.tokens.len() as i64;
        self.tables.tokens.push(Token {
            key: 7000 + index as u64,
            text: text.to_owned(),
        });
        self.tokens.insert(text.to_owned(), index);
        index
    }

    pub fn ty_with(&mut self, kind: TypeKind, spelling: &str, children: &[i64], is_const: bool) -> i64
    {
        let token = self.token(spelling);
        let index = self.tables.types.len() as i64;
        self.tables.types.push(TypeRecord {
            key: 100 + index,
            hash: 0x5eed + index,
            children: children.to_vec(),
            token,
            kind: kind.raw(),
            is_const,
        });
        index
    }

    pub fn ty(&mut self, kind: TypeKind, spelling: &str) -> i64
    {
        self.ty_with(kind, spelling, &[], false)
    }

    pub fn pointer(&mut self, spelling: &str, to: i64) -> i64
    {
        self.ty_with(TypeKind::Pointer, spelling, &[to], false)
    }

    pub fn reference(&mut self, spelling: &str, to: i64) -> i64
    {
        self.ty_with(TypeKind::LValueReference, spelling, &[to], false)
    }

    pub fn const_record(&mut self, spelling: &str) -> i64
    {
        self.ty_with(TypeKind::Record, spelling, &[], true)
    }

    pub fn function_type(&mut self, spelling: &str, ret: i64, params: &[i64]) -> i64
    {
        let mut children = vec![ret];
        children.extend_from_slice(params);
        self.ty_with(TypeKind::FunctionProto, spelling, &children, false)
    }

    /// Add a declaration spanning the next 10 offsets of the current file
    pub fn decl(&mut self, kind: CursorKind, name: &str, parent: Option<i64>, ty: Option<i64>) -> i64
    {
        let token = if name.is_empty() { NULL_INDEX } else { self.token(name) };
        let index = self.tables.declarations.len() as i64;
        let start = self.cursor;
        self.cursor += 10;
        self.tables.declarations.push(DeclarationRecord {
            key: 9000 + index,
            compiling_file: 1,
            parent: parent.unwrap_or(NULL_INDEX),
            referenced: NULL_INDEX,
            kind: kind.raw(),
            flags: DeclarationRecord::pack_flags(AccessSpecifier::Public, false, StorageClass::None, false),
            type_index: ty.unwrap_or(NULL_INDEX),
            token,
            line: index as u32 + 1,
            column: 1,
            start_offset: start,
            end_offset: start + 10,
            source_file: self.file,
        });
        index
    }

    pub fn record(&mut self, index: i64) -> &mut DeclarationRecord
    {
        &mut self.tables.declarations[index as usize]
    }

    pub fn span(&mut self, index: i64, start: u32, end: u32)
    {
        let record = self.record(index);
        record.start_offset = start;
        record.end_offset = end;
    }

    pub fn set_flags(
        &mut self,
        index: i64,
        access: AccessSpecifier,
        is_abstract: bool,
        storage: StorageClass,
        is_deleted: bool,
    )
    {
        self.record(index).flags = DeclarationRecord::pack_flags(access, is_abstract, storage, is_deleted);
    }

    pub fn namespace(&mut self, name: &str, parent: Option<i64>) -> i64
    {
        self.decl(CursorKind::Namespace, name, parent, None)
    }

    /// A class with a record type spelled `qualified`; returns (declaration, type)
    pub fn class(&mut self, qualified: &str, parent: Option<i64>) -> (i64, i64)
    {
        let ty = self.ty(TypeKind::Record, qualified);
        let name = qualified.rsplit("::").next().unwrap_or(qualified);
        let decl = self.decl(CursorKind::ClassDecl, name, parent, Some(ty));
        (decl, ty)
    }

    pub fn enumeration(&mut self, qualified: &str, parent: Option<i64>, values: &[&str]) -> (i64, i64)
    {
        let ty = self.ty(TypeKind::Enum, qualified);
        let name = qualified.rsplit("::").next().unwrap_or(qualified);
        let decl = self.decl(CursorKind::EnumDecl, name, parent, Some(ty));
        for value in values {
            self.decl(CursorKind::EnumConstantDecl, value, Some(decl), Some(ty));
        }
        (decl, ty)
    }

    pub fn params(&mut self, owner: i64, params: &[(&str, i64)]) -> Vec<i64>
    {
        params
            .iter()
            .map(|(name, ty)| self.decl(CursorKind::ParmDecl, name, Some(owner), Some(*ty)))
            .collect()
    }

    /// A function-like declaration without its parameter declarations
    ///
    /// Reference cursors spelling a templated return type go in before
    /// [`DumpBuilder::params`] is called.
    pub fn callable(&mut self, kind: CursorKind, parent: Option<i64>, name: &str, ret: i64, params: &[i64]) -> i64
    {
        let fn_ty = self.function_type(&format!("{name}()"), ret, params);
        self.decl(kind, name, parent, Some(fn_ty))
    }

    pub fn method(&mut self, class: i64, name: &str, ret: i64, params: &[(&str, i64)]) -> i64
    {
        let types: Vec<i64> = params.iter().map(|(_, ty)| *ty).collect();
        let method = self.callable(CursorKind::CxxMethod, Some(class), name, ret, &types);
        self.params(method, params);
        method
    }

    pub fn constructor(&mut self, class: i64, name: &str, params: &[(&str, i64)]) -> i64
    {
        let void = self.ty(TypeKind::Void, "void");
        let types: Vec<i64> = params.iter().map(|(_, ty)| *ty).collect();
        let ctor = self.callable(CursorKind::Constructor, Some(class), name, void, &types);
        self.params(ctor, params);
        ctor
    }

    pub fn function(&mut self, parent: Option<i64>, name: &str, ret: i64, params: &[(&str, i64)]) -> i64
    {
        let types: Vec<i64> = params.iter().map(|(_, ty)| *ty).collect();
        let function = self.callable(CursorKind::FunctionDecl, parent, name, ret, &types);
        self.params(function, params);
        function
    }

    pub fn tables(&self) -> &SymbolTables
    {
        &self.tables
    }

    pub fn finish(self) -> SymbolTables
    {
        self.tables
    }

    pub fn graph(self) -> DeclGraph
    {
        DeclGraph::build(self.tables).expect("fixture graph must build")
    }
}

/// Spelling references for `std::vector<elem>` in front of a declaration's other children
pub fn vector_refs(builder: &mut DumpBuilder, owner: i64, element: i64)
{
    builder.decl(CursorKind::NamespaceRef, "std", Some(owner), None);
    builder.decl(CursorKind::TemplateRef, "vector", Some(owner), None);
    builder.decl(CursorKind::TypeRef, "", Some(owner), Some(element));
}
