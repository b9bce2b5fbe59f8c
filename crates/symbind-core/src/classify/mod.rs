//! # Type Classification
//!
//! Walks a type chain from its outermost layer to the leaf and decides how
//! the type crosses the binding boundary.
//!
//! ## Categories
//!
//! | category        | examples                               | crosses as                |
//! |-----------------|----------------------------------------|---------------------------|
//! | `Primitive`     | `int`, `float`, `bool`                 | the scalar itself         |
//! | `String`        | `const char*`, `std::string`           | a C string                |
//! | `WrappedObject` | `Foo*`, `const Foo&`, `shared_ptr<Foo>`| opaque handle             |
//! | `WrappedEnum`   | `Color`                                | `int`                     |
//! | `Container`     | `std::vector<Bar>&`                    | opaque handle + accessors |
//! | `Void`          | `void` (returns only)                  | nothing                   |
//!
//! Classification is a pure function of the type site, the registry and the
//! position (parameter or return): calling it twice yields the same result.

mod classifier;
pub mod registry;

pub use self::classifier::{Classifier, MAX_TYPE_DEPTH};
pub use self::registry::{WrappedEntry, WrappedKind, WrappedRegistry};
use crate::abi::AbiPlan;
use crate::error::ClassificationError;
use crate::types::TypeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category
{
    Unsupported,
    Primitive,
    String,
    WrappedObject,
    WrappedEnum,
    Container,
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKind
{
    /// `char*` / `const char*`
    RawPtr,
    /// `std::string` by value or reference
    StdString,
}

/// Where a classified type appears
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position
{
    Parameter,
    Return,
    /// Element of a container
    Element,
}

/// Classification of one type at one use site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EType
{
    pub category: Category,
    pub position: Position,
    /// Spelling of the outermost type layer
    pub spelling: String,
    /// The type rebuilt as C++ source, layer by layer
    pub cpp: String,
    pub root_kind: TypeKind,
    /// Kind of the innermost layer reached
    pub base_kind: TypeKind,
    /// Pointer, reference and array layers, plus one for a promoted value
    pub pointer_depth: u8,
    /// Dereferences needed to get from the ABI form to the C++ value
    pub deref_count: u8,
    pub is_const: bool,
    /// A by-value object carried as a handle
    pub value_as_ptr: bool,
    pub shared_ptr: bool,
    pub rvalue: bool,
    /// An lvalue reference to a non-const layer
    pub mutable_reference: bool,
    pub overflowed: bool,
    pub string_kind: Option<StringKind>,
    /// Record, enum or container type without qualifiers
    pub base_type: String,
    pub element: Option<Box<EType>>,
    pub error: Option<ClassificationError>,
    pub plan: Option<AbiPlan>,
}

impl EType
{
    pub(crate) fn new(spelling: String, root_kind: TypeKind, position: Position) -> Self
    {
        Self {
            category: Category::Unsupported,
            position,
            spelling,
            cpp: String::new(),
            root_kind,
            base_kind: root_kind,
            pointer_depth: 0,
            deref_count: 0,
            is_const: false,
            value_as_ptr: false,
            shared_ptr: false,
            rvalue: false,
            mutable_reference: false,
            overflowed: false,
            string_kind: None,
            base_type: String::new(),
            element: None,
            error: None,
            plan: None,
        }
    }

    #[must_use]
    pub const fn is_ptr(&self) -> bool
    {
        self.pointer_depth > 0
    }

    /// Whether the type can appear in a bound signature
    #[must_use]
    pub const fn is_supported(&self) -> bool
    {
        self.error.is_none() && self.plan.is_some()
    }

    /// The ABI plan, or why there is none
    pub fn support(&self) -> Result<&AbiPlan, ClassificationError>
    {
        match (&self.plan, &self.error) {
            (Some(plan), None) => Ok(plan),
            (_, Some(err)) => Err(err.clone()),
            (None, None) => Err(ClassificationError::Unsupported {
                spelling: self.display_spelling().to_owned(),
            }),
        }
    }

    /// Spelling used in diagnostics
    #[must_use]
    pub fn display_spelling(&self) -> &str
    {
        if self.spelling.is_empty() {
            &self.cpp
        } else {
            &self.spelling
        }
    }

    /// Native export, foreign import and wrapper renderings of the type
    #[must_use]
    pub fn rendered(&self) -> Option<(&str, &str, &str)>
    {
        self.plan
            .as_ref()
            .map(|plan| (plan.native_type.as_str(), plan.import_type.as_str(), plan.wrapper_type.as_str()))
    }
}
