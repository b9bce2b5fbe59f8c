//! # Clang Kinds
//!
//! Cursor, type, access and storage kinds as libclang numbers them.
//!
//! The symbol dump stores these as raw `i32` values. Values that are not
//! named here survive decoding through the `Other` variant so a dump
//! produced by a newer libclang still loads.

macro_rules! raw_kind {
    (
        $(#[$meta:meta])*
        pub enum $name:ident
        {
            $( $variant:ident = $value:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name
        {
            $( $variant, )*
            /// A value this crate has no name for
            Other(i32),
        }

        impl $name
        {
            /// Decode a raw libclang value
            #[must_use]
            pub const fn from_raw(raw: i32) -> Self
            {
                match raw {
                    $( $value => Self::$variant, )*
                    other => Self::Other(other),
                }
            }

            /// The raw libclang value
            #[must_use]
            pub const fn raw(self) -> i32
            {
                match self {
                    $( Self::$variant => $value, )*
                    Self::Other(other) => other,
                }
            }
        }

        impl From<i32> for $name
        {
            fn from(raw: i32) -> Self
            {
                Self::from_raw(raw)
            }
        }

        impl std::fmt::Display for $name
        {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
            {
                match self {
                    $( Self::$variant => f.write_str(stringify!($variant)), )*
                    Self::Other(other) => write!(f, "Other({other})"),
                }
            }
        }
    };
}

raw_kind! {
    /// Kind of a declaration node (`CXCursorKind`)
    pub enum CursorKind
    {
        UnexposedDecl = 1,
        StructDecl = 2,
        UnionDecl = 3,
        ClassDecl = 4,
        EnumDecl = 5,
        FieldDecl = 6,
        EnumConstantDecl = 7,
        FunctionDecl = 8,
        VarDecl = 9,
        ParmDecl = 10,
        TypedefDecl = 20,
        CxxMethod = 21,
        Namespace = 22,
        LinkageSpec = 23,
        Constructor = 24,
        Destructor = 25,
        ConversionFunction = 26,
        TemplateTypeParameter = 27,
        NonTypeTemplateParameter = 28,
        TemplateTemplateParameter = 29,
        FunctionTemplate = 30,
        ClassTemplate = 31,
        ClassTemplatePartialSpecialization = 32,
        NamespaceAlias = 33,
        UsingDirective = 34,
        UsingDeclaration = 35,
        TypeAliasDecl = 36,
        CxxAccessSpecifier = 39,
        TypeRef = 43,
        CxxBaseSpecifier = 44,
        TemplateRef = 45,
        NamespaceRef = 46,
        MemberRef = 47,
        OverloadedDeclRef = 49,
        VariableRef = 50,
        UnexposedExpr = 100,
        DeclRefExpr = 101,
        MemberRefExpr = 102,
        CallExpr = 103,
        CompoundStmt = 202,
        ReturnStmt = 214,
        TranslationUnit = 350,
    }
}

raw_kind! {
    /// Kind of a type node (`CXTypeKind`)
    pub enum TypeKind
    {
        Invalid = 0,
        Unexposed = 1,
        Void = 2,
        Bool = 3,
        CharU = 4,
        UChar = 5,
        Char16 = 6,
        Char32 = 7,
        UShort = 8,
        UInt = 9,
        ULong = 10,
        ULongLong = 11,
        UInt128 = 12,
        CharS = 13,
        SChar = 14,
        WChar = 15,
        Short = 16,
        Int = 17,
        Long = 18,
        LongLong = 19,
        Int128 = 20,
        Float = 21,
        Double = 22,
        LongDouble = 23,
        NullPtr = 24,
        Pointer = 101,
        BlockPointer = 102,
        LValueReference = 103,
        RValueReference = 104,
        Record = 105,
        Enum = 106,
        Typedef = 107,
        FunctionNoProto = 110,
        FunctionProto = 111,
        ConstantArray = 112,
        Vector = 113,
        IncompleteArray = 114,
        VariableArray = 115,
        DependentSizedArray = 116,
        MemberPointer = 117,
        Auto = 118,
        Elaborated = 119,
    }
}

raw_kind! {
    /// C++ access specifier (`CX_CXXAccessSpecifier`)
    pub enum AccessSpecifier
    {
        Invalid = 0,
        Public = 1,
        Protected = 2,
        Private = 3,
    }
}

raw_kind! {
    /// Storage class (`CX_StorageClass`)
    pub enum StorageClass
    {
        Invalid = 0,
        None = 1,
        Extern = 2,
        Static = 3,
        PrivateExtern = 4,
        OpenClWorkGroupLocal = 5,
        Auto = 6,
        Register = 7,
    }
}

impl CursorKind
{
    /// Kinds that contribute a segment to a canonical name
    #[must_use]
    pub const fn is_scope(self) -> bool
    {
        matches!(self, Self::Namespace | Self::ClassDecl | Self::StructDecl)
    }

    /// Declaration contexts a canonical-name walk passes through
    #[must_use]
    pub const fn is_transparent_context(self) -> bool
    {
        matches!(self, Self::LinkageSpec | Self::UnexposedDecl)
    }

    /// Reference kinds that spell out a type at a use site
    #[must_use]
    pub const fn is_type_spelling(self) -> bool
    {
        matches!(self, Self::TypeRef | Self::TemplateRef | Self::NamespaceRef)
    }
}

impl TypeKind
{
    /// Built-in scalars the binding passes by value
    #[must_use]
    pub const fn is_primitive(self) -> bool
    {
        matches!(
            self,
            Self::Float
                | Self::Double
                | Self::Int
                | Self::UInt
                | Self::Bool
                | Self::CharS
                | Self::CharU
                | Self::SChar
                | Self::UChar
                | Self::Short
                | Self::UShort
                | Self::Long
                | Self::ULong
                | Self::LongLong
                | Self::ULongLong
        )
    }

    /// Layers that add one level of indirection
    #[must_use]
    pub const fn is_indirection(self) -> bool
    {
        matches!(
            self,
            Self::Pointer | Self::LValueReference | Self::ConstantArray | Self::IncompleteArray | Self::VariableArray
        )
    }

    #[must_use]
    pub const fn is_reference(self) -> bool
    {
        matches!(self, Self::LValueReference)
    }
}
