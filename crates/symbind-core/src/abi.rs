//! # ABI Plan
//!
//! One description of how a classified type crosses the boundary, shared by
//! all three emitters.
//!
//! The plan fixes the wire representation, the ownership rule and the
//! indirection count once. The native export shim, the foreign-import
//! declarations and the managed wrapper all render from it, so they cannot
//! disagree about whether a value is a handle or how many dereferences the
//! native side performs. [`AbiPlan::verify`] cross-checks the renderings.

use crate::classify::{Category, EType, Position, StringKind};
use crate::error::ClassificationError;
use crate::types::TypeKind;

/// Name of the managed class holding the foreign-import declarations
pub const IMPORT_CLASS: &str = "NativeLib";

/// Export that frees strings the native side allocated
pub const FREE_STRING_SYMBOL: &str = "FreeString";

/// Scalar types passed by value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar
{
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl Scalar
{
    #[must_use]
    pub const fn from_kind(kind: TypeKind) -> Option<Self>
    {
        Some(match kind {
            TypeKind::Bool => Self::Bool,
            TypeKind::CharS | TypeKind::SChar => Self::I8,
            TypeKind::CharU | TypeKind::UChar => Self::U8,
            TypeKind::Short => Self::I16,
            TypeKind::UShort => Self::U16,
            // `long` is 32 bits under the LLP64 model of the export attribute
            TypeKind::Int | TypeKind::Long => Self::I32,
            TypeKind::UInt | TypeKind::ULong => Self::U32,
            TypeKind::LongLong => Self::I64,
            TypeKind::ULongLong => Self::U64,
            TypeKind::Float => Self::F32,
            TypeKind::Double => Self::F64,
            _ => return None,
        })
    }

    /// Managed spelling
    #[must_use]
    pub const fn managed(self) -> &'static str
    {
        match self {
            Self::Bool => "bool",
            Self::I8 => "sbyte",
            Self::U8 => "byte",
            Self::I16 => "short",
            Self::U16 => "ushort",
            Self::I32 => "int",
            Self::U32 => "uint",
            Self::I64 => "long",
            Self::U64 => "ulong",
            Self::F32 => "float",
            Self::F64 => "double",
        }
    }
}

/// What actually travels across the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wire
{
    Void,
    Scalar(Scalar),
    /// An enumeration as `int`
    Enum,
    /// A NUL-terminated byte string
    CString(StringKind),
    /// An address-sized opaque handle
    Handle,
}

/// How the C++ side holds a handle's target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleForm
{
    Pointer,
    Reference,
    /// A by-value object, carried as a handle to a copy
    Value,
    Shared,
}

/// Who releases what the boundary hands over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership
{
    /// Scalars; nothing to release
    Copied,
    /// The receiver reads but never frees
    Borrowed,
    /// The receiver frees exactly once
    Transferred,
}

/// Accessor exports for one container type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerPlan
{
    /// Prefix of the accessor export symbols
    pub tag: String,
    pub handle_type: String,
    /// Native return type of the element accessor
    pub element_native_type: String,
    /// Body expression of the element accessor over `v` and `i`
    pub element_access: String,
    pub element_wrapper: String,
    /// Managed lambda turning an accessor result into an element
    pub element_make: String,
}

impl ContainerPlan
{
    #[must_use]
    pub fn size_symbol(&self) -> String
    {
        format!("{}_Size", self.tag)
    }

    #[must_use]
    pub fn at_symbol(&self) -> String
    {
        format!("{}_At", self.tag)
    }

    #[must_use]
    pub fn release_symbol(&self) -> String
    {
        format!("{}_Release", self.tag)
    }
}

/// Managed argument expression with the statements around the call
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WrapperArgument
{
    pub prologue: Vec<String>,
    pub expression: String,
    pub epilogue: Vec<String>,
}

/// Cross-boundary description of one classified type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AbiPlan
{
    pub wire: Wire,
    pub form: Option<HandleForm>,
    pub ownership: Ownership,
    /// Dereferences the native shim applies to reach the C++ value
    pub indirection: u8,
    pub native_type: String,
    pub import_type: String,
    pub wrapper_type: String,
    pub handle_type: Option<String>,
    /// Type constructed for [`HandleForm::Value`] returns
    pub value_type: String,
    pub raw_const: bool,
    pub container: Option<ContainerPlan>,
}

/// Managed spelling of a C++ qualified name
#[must_use]
pub fn managed_name(cpp: &str) -> String
{
    cpp.replace("::", ".")
}

/// Identifier-safe form of a C++ type spelling
#[must_use]
pub fn symbol_fragment(cpp: &str) -> String
{
    let mut out = String::with_capacity(cpp.len());
    for c in cpp.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

fn handle_form(ety: &EType) -> HandleForm
{
    if ety.shared_ptr {
        HandleForm::Shared
    } else if ety.value_as_ptr {
        HandleForm::Value
    } else if ety.deref_count > 0 {
        HandleForm::Reference
    } else {
        HandleForm::Pointer
    }
}

impl AbiPlan
{
    /// Derive the plan for a supported classification
    pub fn derive(ety: &EType) -> Result<Self, ClassificationError>
    {
        let unsupported = || ClassificationError::Unsupported {
            spelling: ety.display_spelling().to_owned(),
        };
        let returning = ety.position != Position::Parameter;

        let plan = match ety.category {
            Category::Unsupported => return Err(unsupported()),
            Category::Void => Self::simple(Wire::Void, "void", "void", "void"),
            Category::Primitive => {
                let scalar = Scalar::from_kind(ety.base_kind).ok_or_else(unsupported)?;
                Self::simple(Wire::Scalar(scalar), &ety.base_type, scalar.managed(), scalar.managed())
            }
            Category::WrappedEnum => Self::simple(Wire::Enum, &ety.base_type, "int", &managed_name(&ety.base_type)),
            Category::String => {
                let kind = ety.string_kind.ok_or_else(unsupported)?;
                let owned = returning && kind == StringKind::StdString;
                let mut plan = Self::simple(
                    Wire::CString(kind),
                    if owned { "char *" } else { "const char *" },
                    "IntPtr",
                    "string",
                );
                plan.ownership = if owned { Ownership::Transferred } else { Ownership::Borrowed };
                plan.raw_const = ety.is_const;
                plan
            }
            Category::WrappedObject => {
                let handle = format!("CPtr<{}>", ety.base_type);
                Self::handle(ety, handle, managed_name(&ety.base_type), ety.base_type.clone(), None)
            }
            Category::Container => {
                let element = ety.element.as_deref().ok_or_else(unsupported)?;
                let handle = format!("CVec<{}>", element.cpp);
                let container = container_plan(element, &handle).ok_or_else(unsupported)?;
                let wrapper = format!("ApiList<{}>", container.element_wrapper);
                Self::handle(ety, handle, wrapper, ety.base_type.clone(), Some(container))
            }
        };
        plan.verify(ety.display_spelling())?;
        Ok(plan)
    }

    fn simple(wire: Wire, native: &str, import: &str, wrapper: &str) -> Self
    {
        Self {
            wire,
            form: None,
            ownership: Ownership::Copied,
            indirection: 0,
            native_type: native.to_owned(),
            import_type: import.to_owned(),
            wrapper_type: wrapper.to_owned(),
            handle_type: None,
            value_type: String::new(),
            raw_const: false,
            container: None,
        }
    }

    fn handle(
        ety: &EType,
        handle: String,
        wrapper: String,
        value_type: String,
        container: Option<ContainerPlan>,
    ) -> Self
    {
        let form = handle_form(ety);
        Self {
            wire: Wire::Handle,
            form: Some(form),
            ownership: Ownership::Transferred,
            indirection: u8::from(matches!(form, HandleForm::Reference | HandleForm::Value)),
            native_type: format!("{handle} *"),
            import_type: "IntPtr".to_owned(),
            wrapper_type: wrapper,
            handle_type: Some(handle),
            value_type,
            raw_const: false,
            container,
        }
    }

    /// Result of a constructor shim: a new owned handle to `class`
    #[must_use]
    pub fn constructed(class: &str) -> Self
    {
        let handle = format!("CPtr<{class}>");
        Self {
            wire: Wire::Handle,
            form: Some(HandleForm::Value),
            ownership: Ownership::Transferred,
            indirection: 1,
            native_type: format!("{handle} *"),
            import_type: "IntPtr".to_owned(),
            wrapper_type: managed_name(class),
            handle_type: Some(handle),
            value_type: class.to_owned(),
            raw_const: false,
            container: None,
        }
    }

    #[must_use]
    pub const fn is_void(&self) -> bool
    {
        matches!(self.wire, Wire::Void)
    }

    /// Expression forwarding ABI parameter `name` into the C++ call
    #[must_use]
    pub fn native_argument(&self, name: &str) -> String
    {
        match (self.wire, self.form) {
            (Wire::CString(StringKind::StdString), _) => format!("std::string({name})"),
            (Wire::CString(StringKind::RawPtr), _) if !self.raw_const => format!("const_cast<char *>({name})"),
            (Wire::Handle, Some(HandleForm::Pointer)) => format!("{name}->get()"),
            (Wire::Handle, Some(HandleForm::Reference | HandleForm::Value)) => format!("*{name}->get()"),
            (Wire::Handle, Some(HandleForm::Shared)) => format!("{name}->shared()"),
            _ => name.to_owned(),
        }
    }

    /// Statements returning the result of `call` from the export shim
    #[must_use]
    pub fn native_return(&self, call: &str) -> Vec<String>
    {
        match (self.wire, self.form) {
            (Wire::Void, _) => vec![format!("{call};")],
            (Wire::CString(StringKind::StdString), _) => vec![
                format!("std::string strtmp = {call};"),
                "char *retstr = new char[strtmp.size() + 1];".to_owned(),
                "memcpy(retstr, strtmp.c_str(), strtmp.size() + 1);".to_owned(),
                "return retstr;".to_owned(),
            ],
            (Wire::Handle, Some(form)) => {
                let handle = self.handle_type.as_deref().unwrap_or_default();
                let make = match form {
                    HandleForm::Pointer => format!("Borrow({call})"),
                    HandleForm::Reference => format!("Borrow(&{call})"),
                    HandleForm::Value => format!("Own(new {}({call}))", self.value_type),
                    HandleForm::Shared => format!("Share({call})"),
                };
                vec![format!("return {handle}::{make};")]
            }
            _ => vec![format!("return {call};")],
        }
    }

    /// Marshalling attribute a foreign-import parameter needs
    #[must_use]
    pub const fn import_attribute(&self) -> Option<&'static str>
    {
        match self.wire {
            Wire::Scalar(Scalar::Bool) => Some("[MarshalAs(UnmanagedType.I1)]"),
            _ => None,
        }
    }

    /// Marshalling attribute a foreign-import return needs
    #[must_use]
    pub const fn import_return_attribute(&self) -> Option<&'static str>
    {
        match self.wire {
            Wire::Scalar(Scalar::Bool) => Some("[return: MarshalAs(UnmanagedType.I1)]"),
            _ => None,
        }
    }

    /// Managed argument for wrapper parameter `name`, using `temp` for scratch
    #[must_use]
    pub fn wrapper_argument(&self, name: &str, temp: &str) -> WrapperArgument
    {
        match self.wire {
            Wire::Enum => WrapperArgument {
                expression: format!("(int){name}"),
                ..WrapperArgument::default()
            },
            Wire::CString(_) => WrapperArgument {
                prologue: vec![format!("IntPtr {temp} = Marshal.StringToHGlobalAnsi({name});")],
                expression: temp.to_owned(),
                epilogue: vec![format!("Marshal.FreeHGlobal({temp});")],
            },
            Wire::Handle if self.container.is_some() => WrapperArgument {
                expression: format!("{name}.Handle"),
                ..WrapperArgument::default()
            },
            Wire::Handle => WrapperArgument {
                expression: format!("{name}.pthis"),
                ..WrapperArgument::default()
            },
            Wire::Void | Wire::Scalar(_) => WrapperArgument {
                expression: name.to_owned(),
                ..WrapperArgument::default()
            },
        }
    }

    /// Managed statements returning the result of foreign call `call`
    #[must_use]
    pub fn wrapper_return(&self, call: &str) -> Vec<String>
    {
        match self.wire {
            Wire::Void => vec![format!("{call};")],
            Wire::Scalar(_) => vec![format!("return {call};")],
            Wire::Enum => vec![format!("return ({}){call};", self.wrapper_type)],
            Wire::CString(_) if self.ownership == Ownership::Transferred => vec![
                format!("IntPtr strtmp = {call};"),
                "try".to_owned(),
                "{".to_owned(),
                "    return Marshal.PtrToStringAnsi(strtmp);".to_owned(),
                "}".to_owned(),
                "finally".to_owned(),
                "{".to_owned(),
                format!("    {IMPORT_CLASS}.{FREE_STRING_SYMBOL}(strtmp);"),
                "}".to_owned(),
            ],
            Wire::CString(_) => vec![format!("return Marshal.PtrToStringAnsi({call});")],
            Wire::Handle => match &self.container {
                Some(container) => vec![format!(
                    "return new {}({call}, {IMPORT_CLASS}.{}, {IMPORT_CLASS}.{}, {IMPORT_CLASS}.{}, {});",
                    self.wrapper_type,
                    container.size_symbol(),
                    container.at_symbol(),
                    container.release_symbol(),
                    container.element_make
                )],
                None => vec![format!("return new {}({call});", self.wrapper_type)],
            },
        }
    }

    /// Check that the three renderings agree on representation and indirection
    pub fn verify(&self, spelling: &str) -> Result<(), ClassificationError>
    {
        let mismatch = |detail: String| {
            Err(ClassificationError::AbiMismatch {
                spelling: spelling.to_owned(),
                detail,
            })
        };

        let probe = self.native_argument("x");
        let native_derefs = probe.chars().take_while(|c| *c == '*').count();
        if native_derefs != usize::from(self.indirection) {
            return mismatch(format!(
                "native shim dereferences {native_derefs} times, plan says {}",
                self.indirection
            ));
        }

        match self.wire {
            Wire::Handle => {
                let Some(handle) = self.handle_type.as_deref() else {
                    return mismatch("handle without a handle type".to_owned());
                };
                if self.native_type != format!("{handle} *") {
                    return mismatch(format!("native type {} is not a {handle} pointer", self.native_type));
                }
                if self.import_type != "IntPtr" {
                    return mismatch(format!("import type {} is not address-sized", self.import_type));
                }
                let wrapper_arg = self.wrapper_argument("x", "t").expression;
                if !(wrapper_arg.ends_with(".pthis") || wrapper_arg.ends_with(".Handle")) {
                    return mismatch(format!("wrapper passes {wrapper_arg} instead of a handle"));
                }
                if let Some(container) = &self.container {
                    if !container.element_native_type.ends_with('*') {
                        return mismatch(format!(
                            "element accessor returns {} instead of a pointer",
                            container.element_native_type
                        ));
                    }
                }
            }
            Wire::CString(_) => {
                if !self.native_type.ends_with("char *") || self.import_type != "IntPtr" || self.wrapper_type != "string"
                {
                    return mismatch(format!(
                        "string rendered as {} / {} / {}",
                        self.native_type, self.import_type, self.wrapper_type
                    ));
                }
            }
            Wire::Scalar(_) | Wire::Enum => {
                if self.native_type.contains('*') || self.import_type == "IntPtr" {
                    return mismatch(format!(
                        "scalar rendered as {} / {}",
                        self.native_type, self.import_type
                    ));
                }
            }
            Wire::Void => {
                if self.native_type != "void" || self.import_type != "void" {
                    return mismatch("void rendered as a value".to_owned());
                }
            }
        }
        Ok(())
    }
}

fn container_plan(element: &EType, handle: &str) -> Option<ContainerPlan>
{
    let item = "(*v->get())[i]";
    let mut tag = format!("CVec_{}", symbol_fragment(&element.cpp));
    if element.category == Category::WrappedObject && handle_form(element) == HandleForm::Pointer {
        tag.push_str("_Ptr");
    }
    let (element_native_type, element_access, element_wrapper, element_make) = match element.category {
        Category::String => {
            let access = match element.string_kind? {
                StringKind::StdString => format!("{item}.c_str()"),
                StringKind::RawPtr => item.to_owned(),
            };
            (
                "const char *".to_owned(),
                access,
                "string".to_owned(),
                "h => Marshal.PtrToStringAnsi(h)".to_owned(),
            )
        }
        Category::WrappedObject => {
            let element_handle = format!("CPtr<{}>", element.base_type);
            let access = match handle_form(element) {
                HandleForm::Value | HandleForm::Reference => format!("{element_handle}::Borrow(&{item})"),
                HandleForm::Pointer => format!("{element_handle}::Borrow({item})"),
                HandleForm::Shared => format!("{element_handle}::Share({item})"),
            };
            let wrapper = managed_name(&element.base_type);
            let make = format!("h => new {wrapper}(h)");
            (format!("{element_handle} *"), access, wrapper, make)
        }
        _ => return None,
    };
    Some(ContainerPlan {
        tag,
        handle_type: handle.to_owned(),
        element_native_type,
        element_access,
        element_wrapper,
        element_make,
    })
}
