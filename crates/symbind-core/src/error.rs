//! # Error Types
//!
//! Error handling for loading symbol dumps and generating bindings.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.
//!
//! ## Error Categories
//!
//! 1. **Load errors** ([`LoadError`]): the dump is missing, corrupt or refers
//!    outside its own tables. These abort the whole load.
//! 2. **Classification errors** ([`ClassificationError`]): a type cannot cross
//!    the binding boundary. These are soft: the member using the type is
//!    skipped and generation continues.
//! 3. **I/O errors**: writing the generated artifacts.

use std::path::PathBuf;

use thiserror::Error;

/// A symbol dump could not be decoded into a declaration graph
#[derive(Error, Debug)]
pub enum LoadError
{
    /// The dump file does not exist
    ///
    /// The workspace turns this into an empty graph rather than a failure.
    #[error("Symbol dump not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Reading the dump file failed
    #[error("Failed to read {}: {source}", path.display())]
    Read
    {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The zlib stream is corrupt
    #[error("Failed to decompress symbol dump: {0}")]
    Decompress(#[source] std::io::Error),

    /// Compressing a dump failed
    #[error("Failed to compress symbol dump: {0}")]
    Compress(#[source] std::io::Error),

    /// Writing a dump file failed
    #[error("Failed to write {}: {source}", path.display())]
    Write
    {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tables encode to more bytes than the u32 size prefix can announce
    #[error("Encoded payload of {len} bytes does not fit the size prefix")]
    PayloadTooLarge
    {
        len: usize,
    },

    /// The decompressed payload is not the size the header announced
    #[error("Decompressed size mismatch: header says {expected} bytes, stream has {actual}")]
    SizeMismatch
    {
        expected: u64,
        actual: u64,
    },

    /// The payload ended in the middle of a value
    #[error("Truncated {table} table at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated
    {
        table: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A record count that cannot fit in the remaining payload
    #[error("Record count {count} in {table} table exceeds the remaining payload")]
    CountOverflow
    {
        table: &'static str,
        count: u64,
    },

    /// A string that is not valid UTF-8
    #[error("Invalid UTF-8 string in {table} table at offset {offset}")]
    InvalidUtf8
    {
        table: &'static str,
        offset: usize,
    },

    /// A string too long for its u16 length prefix
    #[error("String of {len} bytes exceeds the 65535 byte limit")]
    StringTooLong
    {
        len: usize,
    },

    /// A record refers to an index outside its target table
    #[error("{table}[{index}].{field} refers to {target}, which is out of range")]
    DanglingReference
    {
        table: &'static str,
        index: usize,
        field: &'static str,
        target: i64,
    },

    /// Following parent links from a declaration never reaches a root
    #[error("Declaration {index} is part of a parent cycle")]
    ParentCycle
    {
        index: usize,
    },
}

/// A type or member that cannot cross the binding boundary
///
/// Each variant carries the spelling of the offending type so diagnostics
/// can be deduplicated by it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClassificationError
{
    /// No category applies to the type
    #[error("Unsupported type: {spelling}")]
    Unsupported
    {
        spelling: String,
    },

    /// The type chain nests deeper than the classifier follows
    #[error("Type nesting too deep: {spelling}")]
    DepthOverflow
    {
        spelling: String,
    },

    /// A pointer or reference to a scalar or enumeration
    #[error("Indirect scalar is not bindable: {spelling}")]
    ScalarIndirection
    {
        spelling: String,
    },

    /// More than one handle level (`Foo**`, `Foo*&`, ...)
    #[error("Multi-level indirection is not bindable: {spelling}")]
    MultiLevelIndirection
    {
        spelling: String,
    },

    /// A container taken by value as a parameter
    #[error("Container passed by value is not bindable: {spelling}")]
    ContainerByValue
    {
        spelling: String,
    },

    /// A container whose element type has no handle form
    #[error("Container element is not bindable: {spelling}")]
    UnsupportedElement
    {
        spelling: String,
    },

    /// An rvalue reference
    #[error("Rvalue reference is not bindable: {spelling}")]
    RValueReference
    {
        spelling: String,
    },

    /// A non-const reference to a string or `shared_ptr` parameter
    #[error("Non-const reference to a converted argument is not bindable: {spelling}")]
    MutableReference
    {
        spelling: String,
    },

    /// The derived ABI plan disagrees with itself across emitters
    #[error("ABI plan mismatch for {spelling}: {detail}")]
    AbiMismatch
    {
        spelling: String,
        detail: String,
    },

    /// An operator overload with no export mnemonic
    #[error("Operator has no export name: {name}")]
    OperatorNotBindable
    {
        name: String,
    },

    /// Two overloads that collapse to one managed signature
    #[error("Duplicate managed signature: {signature}")]
    DuplicateSignature
    {
        signature: String,
    },
}

impl ClassificationError
{
    /// Spelling of the type or member the error is about
    #[must_use]
    pub fn subject(&self) -> &str
    {
        match self {
            Self::Unsupported { spelling }
            | Self::DepthOverflow { spelling }
            | Self::ScalarIndirection { spelling }
            | Self::MultiLevelIndirection { spelling }
            | Self::ContainerByValue { spelling }
            | Self::UnsupportedElement { spelling }
            | Self::RValueReference { spelling }
            | Self::MutableReference { spelling }
            | Self::AbiMismatch { spelling, .. } => spelling,
            Self::OperatorNotBindable { name } => name,
            Self::DuplicateSignature { signature } => signature,
        }
    }

    /// Whether this error names a type rather than a member
    #[must_use]
    pub const fn is_type_error(&self) -> bool
    {
        !matches!(self, Self::OperatorNotBindable { .. } | Self::DuplicateSignature { .. })
    }
}

/// Main error type for symbind operations
#[derive(Error, Debug)]
pub enum SymbindError
{
    /// Loading a symbol dump failed
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A type could not be classified
    #[error(transparent)]
    Classification(#[from] ClassificationError),

    /// Invalid argument passed to a symbind function
    ///
    /// Examples:
    /// - A node index from another graph
    /// - Generating without a loaded dump
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error (writing generated files, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, SymbindError>`
///
/// ```rust
/// use symbind_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, SymbindError>;

/// Result of decoding or building a graph
pub type LoadResult<T> = std::result::Result<T, LoadError>;
