use tracing::trace;

use super::{Category, EType, Position, StringKind, WrappedKind, WrappedRegistry};
use crate::abi::AbiPlan;
use crate::error::ClassificationError;
use crate::graph::{DeclGraph, TemplateFamily, TemplateUse, TypeId, TypeSite};
use crate::types::TypeKind;

/// Deepest type chain the classifier follows before giving up
pub const MAX_TYPE_DEPTH: usize = 20;

const STD_STRING_SPELLINGS: &[&str] = &["std::string", "string", "std::__cxx11::string", "std::basic_string<char>"];

fn strip_const(text: &str) -> &str
{
    text.trim().strip_prefix("const ").unwrap_or(text).trim()
}

fn qualified(is_const: bool, text: &str) -> String
{
    if is_const {
        format!("const {text}")
    } else {
        text.to_owned()
    }
}

fn is_std_string(kind: TypeKind, base: &str) -> bool
{
    matches!(
        kind,
        TypeKind::Typedef | TypeKind::Elaborated | TypeKind::Record | TypeKind::Unexposed
    ) && STD_STRING_SPELLINGS.contains(&base)
}

/// Layers that stand for a template instantiation spelled by the site
fn is_template_layer(kind: TypeKind, base: &str) -> bool
{
    match kind {
        TypeKind::Unexposed | TypeKind::Invalid => true,
        TypeKind::Record | TypeKind::Elaborated => base.contains('<'),
        _ => false,
    }
}

/// Constness and pointer count of the first template argument in `spelling`
///
/// Layers inside a nested argument list belong to that list and are not
/// counted.
fn argument_layers(spelling: &str) -> Option<(bool, u8)>
{
    let open = spelling.find('<')? + 1;
    let mut nesting = 0usize;
    let mut end = None;
    for (at, c) in spelling[open..].char_indices() {
        match c {
            '<' => nesting += 1,
            '>' | ',' if nesting == 0 => {
                end = Some(open + at);
                break;
            }
            '>' => nesting -= 1,
            _ => {}
        }
    }
    let argument = &spelling[open..end?];
    let outer = argument.rfind('>').map_or(argument, |close| &argument[close + 1..]);
    let stars = u8::try_from(outer.matches('*').count()).unwrap_or(u8::MAX);
    let head = argument.split(&['<', '*'][..]).next().unwrap_or_default();
    let is_const = head.split_whitespace().any(|word| word == "const");
    Some((is_const, stars))
}

/// Classifies type sites against one registry
pub struct Classifier<'a>
{
    graph: &'a DeclGraph,
    registry: &'a WrappedRegistry,
}

impl<'a> Classifier<'a>
{
    #[must_use]
    pub const fn new(graph: &'a DeclGraph, registry: &'a WrappedRegistry) -> Self
    {
        Self { graph, registry }
    }

    #[must_use]
    pub fn classify(&self, site: &TypeSite, position: Position) -> EType
    {
        self.classify_at(site, position, 0)
    }

    fn classify_at(&self, site: &TypeSite, position: Position, depth: usize) -> EType
    {
        let (spelling, root_kind) = site.ty.map_or((String::new(), TypeKind::Invalid), |ty| {
            (self.graph.type_text(ty).to_owned(), self.graph.type_node(ty).kind)
        });
        let mut ety = EType::new(spelling, root_kind, position);
        ety.cpp = self.walk(&mut ety, site, site.ty, depth);
        Self::finish(&mut ety);
        trace!(
            "Classified {} as {:?} (depth {}, deref {})",
            ety.display_spelling(),
            ety.category,
            ety.pointer_depth,
            ety.deref_count
        );
        ety
    }

    /// Visit one layer and return its C++ spelling
    fn walk(&self, ety: &mut EType, site: &TypeSite, ty: Option<TypeId>, depth: usize) -> String
    {
        if depth > MAX_TYPE_DEPTH {
            ety.overflowed = true;
            return String::new();
        }

        let node = ty.map(|ty| self.graph.type_node(ty));
        let kind = node.map_or(TypeKind::Invalid, |n| n.kind);
        let text = ty.map_or("", |ty| self.graph.type_text(ty));
        let is_const = node.is_some_and(|n| n.is_const) || text.trim_start().starts_with("const ");
        let base = strip_const(text);
        ety.base_kind = kind;

        if is_std_string(kind, base) {
            ety.category = Category::String;
            ety.string_kind = Some(StringKind::StdString);
            ety.base_type = "std::string".to_owned();
            ety.is_const = is_const;
            return qualified(is_const, "std::string");
        }

        if let Some(template) = site.template.as_ref() {
            if !ety.shared_ptr && is_template_layer(kind, base) {
                return self.walk_template(ety, template, is_const, base, depth);
            }
        }

        let Some(next) = node.and_then(|n| n.next()) else {
            return self.leaf(ety, kind, base, is_const);
        };

        match kind {
            // Function types are opaque; the category stays unsupported
            TypeKind::FunctionProto | TypeKind::FunctionNoProto => text.to_owned(),
            TypeKind::RValueReference => {
                ety.rvalue = true;
                let inner = self.walk(ety, site, Some(next), depth + 1);
                format!("{inner} &&")
            }
            kind if kind.is_indirection() => {
                ety.pointer_depth = ety.pointer_depth.saturating_add(1);
                let inner = self.walk(ety, site, Some(next), depth + 1);
                if kind.is_reference() {
                    ety.deref_count = ety.deref_count.saturating_add(1);
                    if !inner.starts_with("const ") {
                        ety.mutable_reference = true;
                    }
                    format!("{inner} &")
                } else if node.is_some_and(|n| n.is_const) {
                    format!("{inner} *const")
                } else {
                    format!("{inner} *")
                }
            }
            // Typedefs, elaborated names and other sugar
            _ => {
                let inner = self.walk(ety, site, Some(next), depth + 1);
                if is_const && !inner.starts_with("const ") {
                    format!("const {inner}")
                } else {
                    inner
                }
            }
        }
    }

    fn walk_template(&self, ety: &mut EType, template: &TemplateUse, is_const: bool, base: &str, depth: usize) -> String
    {
        match &template.family {
            TemplateFamily::SharedPtr => {
                ety.shared_ptr = true;
                let Some(argument) = template.arguments.first() else {
                    return qualified(is_const, base);
                };
                let inner = self.walk(ety, argument, argument.ty, depth + 1);
                qualified(is_const, &format!("std::shared_ptr<{}>", strip_const(&inner)))
            }
            TemplateFamily::Sequence => {
                let Some(argument) = template.arguments.first() else {
                    return qualified(is_const, base);
                };
                let mut element = self.classify_at(argument, Position::Element, depth + 1);
                if let Some((arg_const, stars)) = argument_layers(base) {
                    Self::apply_argument_layers(&mut element, arg_const, stars);
                }
                if element.overflowed {
                    ety.overflowed = true;
                }
                ety.category = Category::Container;
                ety.is_const = is_const;
                ety.base_type = format!("std::vector<{}>", element.cpp);
                ety.element = Some(Box::new(element));
                qualified(is_const, &ety.base_type)
            }
            TemplateFamily::Other(_) => qualified(is_const, base),
        }
    }

    /// Element types come from a bare type reference; pointer layers are
    /// only visible in the container's spelling
    fn apply_argument_layers(element: &mut EType, is_const: bool, stars: u8)
    {
        let explicit = element.pointer_depth.saturating_sub(u8::from(element.value_as_ptr));
        if stars <= explicit {
            return;
        }
        element.plan = None;
        if element.category == Category::WrappedObject && !element.shared_ptr && explicit == 0 && stars == 1 {
            element.value_as_ptr = false;
            element.pointer_depth = 1;
            element.deref_count = 0;
            element.is_const = is_const;
            element.cpp = qualified(is_const, &format!("{} *", element.base_type));
            element.error = None;
            Self::finish(element);
        } else {
            let missing = usize::from(stars - explicit);
            element.cpp = format!("{} {}", qualified(is_const, strip_const(&element.cpp)), "*".repeat(missing));
            element.error = Some(ClassificationError::UnsupportedElement {
                spelling: element.cpp.clone(),
            });
        }
    }

    fn leaf(&self, ety: &mut EType, kind: TypeKind, base: &str, is_const: bool) -> String
    {
        ety.is_const = is_const;
        match kind {
            TypeKind::Void if ety.pointer_depth == 0 => ety.category = Category::Void,
            TypeKind::CharS | TypeKind::CharU if ety.pointer_depth == 1 => {
                ety.category = Category::String;
                ety.string_kind = Some(StringKind::RawPtr);
                ety.base_type = "char".to_owned();
            }
            // Depth is checked later so `int *` reports as an indirect scalar
            kind if kind.is_primitive() => {
                ety.category = Category::Primitive;
                ety.base_type = base.to_owned();
            }
            TypeKind::Record => {
                ety.base_type = base.to_owned();
                if ety.pointer_depth == 0 {
                    // Objects passed by value travel as a handle to a copy
                    ety.value_as_ptr = true;
                    ety.pointer_depth = 1;
                    ety.deref_count = ety.deref_count.saturating_add(1);
                }
            }
            _ => {}
        }

        if ety.category == Category::Unsupported {
            if let Some(entry) = self.registry.get(base) {
                ety.base_type = base.to_owned();
                ety.category = match entry.kind {
                    WrappedKind::Enum => Category::WrappedEnum,
                    WrappedKind::Class => Category::WrappedObject,
                };
            }
        }
        qualified(is_const, base)
    }

    fn finish(ety: &mut EType)
    {
        if ety.overflowed {
            ety.category = Category::Unsupported;
            ety.error = Some(ClassificationError::DepthOverflow {
                spelling: ety.display_spelling().to_owned(),
            });
            return;
        }

        // A container returned by value is handed out as an owned copy
        if ety.category == Category::Container && ety.pointer_depth == 0 && ety.position == Position::Return {
            ety.value_as_ptr = true;
            ety.pointer_depth = 1;
            ety.deref_count = 1;
        }

        if let Err(err) = check_support(ety) {
            ety.error = Some(err);
            return;
        }
        match AbiPlan::derive(ety) {
            Ok(plan) => ety.plan = Some(plan),
            Err(err) => ety.error = Some(err),
        }
    }
}

/// The `IsSupported` rules, as an error when they fail
fn check_support(ety: &EType) -> Result<(), ClassificationError>
{
    let spelling = || ety.display_spelling().to_owned();
    let depth = ety.pointer_depth;
    let deref = ety.deref_count;

    if ety.rvalue {
        return Err(ClassificationError::RValueReference { spelling: spelling() });
    }
    // The shim passes a converted temporary, which only binds to a const reference
    if ety.position == Position::Parameter
        && ety.mutable_reference
        && (ety.shared_ptr || ety.string_kind == Some(StringKind::StdString))
    {
        return Err(ClassificationError::MutableReference { spelling: spelling() });
    }

    match ety.category {
        Category::Unsupported => Err(ClassificationError::Unsupported { spelling: spelling() }),
        Category::Void if ety.position == Position::Return => Ok(()),
        Category::Void => Err(ClassificationError::Unsupported { spelling: spelling() }),
        Category::Primitive | Category::WrappedEnum if depth > 0 => {
            Err(ClassificationError::ScalarIndirection { spelling: spelling() })
        }
        Category::Primitive | Category::WrappedEnum => Ok(()),
        Category::String => {
            let bindable = match ety.string_kind {
                Some(StringKind::StdString) => depth == 0 || (depth == 1 && deref == 1),
                Some(StringKind::RawPtr) => depth == 1 && deref == 0,
                None => false,
            };
            if bindable {
                Ok(())
            } else {
                Err(ClassificationError::MultiLevelIndirection { spelling: spelling() })
            }
        }
        Category::WrappedObject => {
            if depth != 1 || (ety.shared_ptr && deref != 1) {
                Err(ClassificationError::MultiLevelIndirection { spelling: spelling() })
            } else {
                Ok(())
            }
        }
        Category::Container => {
            if ety.position == Position::Element {
                return Err(ClassificationError::UnsupportedElement { spelling: spelling() });
            }
            if depth == 0 {
                return Err(ClassificationError::ContainerByValue { spelling: spelling() });
            }
            if depth > 1 || ety.shared_ptr {
                return Err(ClassificationError::MultiLevelIndirection { spelling: spelling() });
            }
            match ety.element.as_deref() {
                Some(element)
                    if element.is_supported()
                        && matches!(element.category, Category::WrappedObject | Category::String) =>
                {
                    Ok(())
                }
                _ => Err(ClassificationError::UnsupportedElement { spelling: spelling() }),
            }
        }
    }
}
