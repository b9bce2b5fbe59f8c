mod common;

use common::{vector_refs, DumpBuilder};
use pretty_assertions::assert_eq;
use symbind_core::abi::{HandleForm, Ownership, Wire};
use symbind_core::classify::{Category, Classifier, EType, Position, StringKind, MAX_TYPE_DEPTH};
use symbind_core::driver::collect_registry;
use symbind_core::graph::{DeclGraph, NodeId, TypeSite};
use symbind_core::types::{CursorKind, TypeKind};
use symbind_core::{ClassificationError, GeneratorOptions};

/// A dump with a wrapped class `Bar` and enum `Mode`, plus a host class
/// whose methods carry the types under test
struct Fixture
{
    dump: DumpBuilder,
    host: i64,
    bar: i64,
}

impl Fixture
{
    fn new() -> Self
    {
        let mut dump = DumpBuilder::new();
        let void = dump.ty(TypeKind::Void, "void");
        let (bar_decl, bar) = dump.class("Bar", None);
        dump.method(bar_decl, "Touch", void, &[]);
        dump.enumeration("Mode", None, &["Fast", "Slow"]);
        let (host, _) = dump.class("Host", None);
        Self { dump, host, bar }
    }

    /// Add `Host::name(value: ty)` and return the parameter declaration
    fn parameter(&mut self, name: &str, ty: i64) -> i64
    {
        let void = self.dump.ty(TypeKind::Void, "void");
        let method = self.dump.method(self.host, name, void, &[("value", ty)]);
        method + 1
    }

    fn ty(&mut self, kind: TypeKind, spelling: &str) -> i64
    {
        self.dump.ty(kind, spelling)
    }
}

fn node(graph: &DeclGraph, index: i64) -> NodeId
{
    graph.find_by_key(9000 + index).unwrap()
}

fn classify_parameter(graph: &DeclGraph, parm: i64) -> EType
{
    let registry = collect_registry(graph, &GeneratorOptions::default());
    let site = TypeSite::of_declaration(graph, node(graph, parm));
    Classifier::new(graph, &registry).classify(&site, Position::Parameter)
}

fn classify_return(graph: &DeclGraph, method: i64) -> EType
{
    let registry = collect_registry(graph, &GeneratorOptions::default());
    let site = TypeSite::of_return(graph, node(graph, method));
    Classifier::new(graph, &registry).classify(&site, Position::Return)
}

#[test]
fn test_classification_is_deterministic()
{
    let mut fx = Fixture::new();
    let bar = fx.bar;
    let reference = fx.dump.reference("Bar &", bar);
    let parm = fx.parameter("Use", reference);
    let graph = fx.dump.graph();

    let registry = collect_registry(&graph, &GeneratorOptions::default());
    let classifier = Classifier::new(&graph, &registry);
    let site = TypeSite::of_declaration(&graph, node(&graph, parm));
    assert_eq!(
        classifier.classify(&site, Position::Parameter),
        classifier.classify(&site, Position::Parameter)
    );
}

#[test]
fn test_const_reference_to_wrapped_class()
{
    let mut fx = Fixture::new();
    let const_bar = fx.dump.ty_with(TypeKind::Record, "const Bar", &[], true);
    let reference = fx.dump.reference("const Bar &", const_bar);
    let parm = fx.parameter("Use", reference);
    let graph = fx.dump.graph();

    let ety = classify_parameter(&graph, parm);
    assert_eq!(ety.category, Category::WrappedObject);
    assert_eq!(ety.pointer_depth, 1);
    assert_eq!(ety.deref_count, 1);
    assert!(ety.is_const);
    assert!(!ety.value_as_ptr);
    assert_eq!(ety.base_type, "Bar");
    assert_eq!(ety.cpp, "const Bar &");

    let plan = ety.support().unwrap();
    assert_eq!(plan.form, Some(HandleForm::Reference));
    assert_eq!(plan.indirection, 1);
    assert_eq!(plan.native_argument("x"), "*x->get()");
    assert_eq!(ety.rendered(), Some(("CPtr<Bar> *", "IntPtr", "Bar")));
}

#[test]
fn test_record_by_value_is_promoted_to_a_handle()
{
    let mut fx = Fixture::new();
    let bar = fx.bar;
    let parm = fx.parameter("Take", bar);
    let graph = fx.dump.graph();

    let ety = classify_parameter(&graph, parm);
    assert_eq!(ety.category, Category::WrappedObject);
    assert!(ety.value_as_ptr);
    assert_eq!((ety.pointer_depth, ety.deref_count), (1, 1));
    assert_eq!(ety.support().unwrap().form, Some(HandleForm::Value));
}

#[test]
fn test_pointer_to_wrapped_class()
{
    let mut fx = Fixture::new();
    let bar = fx.bar;
    let pointer = fx.dump.pointer("Bar *", bar);
    let double = fx.dump.pointer("Bar **", pointer);
    let single_parm = fx.parameter("One", pointer);
    let double_parm = fx.parameter("Two", double);
    let graph = fx.dump.graph();

    let ety = classify_parameter(&graph, single_parm);
    let plan = ety.support().unwrap();
    assert_eq!(plan.form, Some(HandleForm::Pointer));
    assert_eq!(plan.indirection, 0);
    assert_eq!(plan.native_argument("p"), "p->get()");

    let ety = classify_parameter(&graph, double_parm);
    assert!(matches!(
        ety.support(),
        Err(ClassificationError::MultiLevelIndirection { spelling }) if spelling == "Bar **"
    ));
}

#[test]
fn test_shared_ptr_argument_is_the_last_type_reference()
{
    let mut fx = Fixture::new();
    let bar = fx.bar;
    let noise = fx.ty(TypeKind::Record, "Deleter");
    let shared = fx.ty(TypeKind::Record, "std::shared_ptr<Bar>");
    let parm = fx.parameter("Share", shared);
    fx.dump.decl(CursorKind::NamespaceRef, "std", Some(parm), None);
    fx.dump.decl(CursorKind::TemplateRef, "shared_ptr", Some(parm), None);
    fx.dump.decl(CursorKind::TypeRef, "", Some(parm), Some(noise));
    fx.dump.decl(CursorKind::TypeRef, "", Some(parm), Some(bar));
    let graph = fx.dump.graph();

    let ety = classify_parameter(&graph, parm);
    assert!(ety.shared_ptr);
    assert_eq!(ety.category, Category::WrappedObject);
    assert_eq!(ety.base_type, "Bar");
    assert_eq!(ety.cpp, "std::shared_ptr<Bar>");

    let plan = ety.support().unwrap();
    assert_eq!(plan.form, Some(HandleForm::Shared));
    assert_eq!(plan.native_argument("p"), "p->shared()");
    assert_eq!(plan.native_return("make()"), vec!["return CPtr<Bar>::Share(make());".to_owned()]);
}

#[test]
fn test_vector_by_value_parameter_is_rejected()
{
    let mut fx = Fixture::new();
    let bar = fx.bar;
    let vector = fx.ty(TypeKind::Record, "std::vector<Bar>");
    let parm = fx.parameter("Fill", vector);
    vector_refs(&mut fx.dump, parm, bar);
    let graph = fx.dump.graph();

    let ety = classify_parameter(&graph, parm);
    assert_eq!(ety.category, Category::Container);
    assert!(matches!(ety.support(), Err(ClassificationError::ContainerByValue { .. })));
}

#[test]
fn test_vector_reference_parameter_is_a_container_handle()
{
    let mut fx = Fixture::new();
    let bar = fx.bar;
    let vector = fx.dump.ty_with(TypeKind::Record, "const std::vector<Bar>", &[], true);
    let reference = fx.dump.reference("const std::vector<Bar> &", vector);
    let parm = fx.parameter("Read", reference);
    vector_refs(&mut fx.dump, parm, bar);
    let graph = fx.dump.graph();

    let ety = classify_parameter(&graph, parm);
    assert_eq!(ety.category, Category::Container);
    assert_eq!(ety.element.as_ref().unwrap().category, Category::WrappedObject);
    assert_eq!(ety.cpp, "const std::vector<Bar> &");

    let plan = ety.support().unwrap();
    assert_eq!(plan.handle_type.as_deref(), Some("CVec<Bar>"));
    assert_eq!(plan.wrapper_type, "ApiList<Bar>");
    let container = plan.container.as_ref().unwrap();
    assert_eq!(container.size_symbol(), "CVec_Bar_Size");
    assert_eq!(container.element_access, "CPtr<Bar>::Borrow(&(*v->get())[i])");
}

#[test]
fn test_vector_returned_by_value_is_owned()
{
    let mut fx = Fixture::new();
    let bar = fx.bar;
    let host = fx.host;
    let vector = fx.ty(TypeKind::Record, "std::vector<Bar>");
    let method = fx.dump.callable(CursorKind::CxxMethod, Some(host), "All", vector, &[]);
    vector_refs(&mut fx.dump, method, bar);
    let graph = fx.dump.graph();

    let ety = classify_return(&graph, method);
    assert!(ety.value_as_ptr);
    let plan = ety.support().unwrap();
    assert_eq!(plan.form, Some(HandleForm::Value));
    assert_eq!(
        plan.native_return("pthis->get()->All()"),
        vec!["return CVec<Bar>::Own(new std::vector<Bar>(pthis->get()->All()));".to_owned()]
    );
}

#[test]
fn test_vector_of_scalars_is_not_bindable()
{
    let mut fx = Fixture::new();
    let int = fx.ty(TypeKind::Int, "int");
    let vector = fx.ty(TypeKind::Record, "std::vector<int>");
    let reference = fx.dump.reference("std::vector<int> &", vector);
    let parm = fx.parameter("Numbers", reference);
    vector_refs(&mut fx.dump, parm, int);
    let graph = fx.dump.graph();

    let ety = classify_parameter(&graph, parm);
    assert!(matches!(ety.support(), Err(ClassificationError::UnsupportedElement { .. })));
}

#[test]
fn test_rvalue_reference_is_rejected()
{
    let mut fx = Fixture::new();
    let bar = fx.bar;
    let rvalue = fx.dump.ty_with(TypeKind::RValueReference, "Bar &&", &[bar], false);
    let parm = fx.parameter("Move", rvalue);
    let graph = fx.dump.graph();

    let ety = classify_parameter(&graph, parm);
    assert!(ety.rvalue);
    assert!(matches!(
        ety.support(),
        Err(ClassificationError::RValueReference { spelling }) if spelling == "Bar &&"
    ));
}

#[test]
fn test_strings()
{
    let mut fx = Fixture::new();
    let host = fx.host;
    let chars = fx.dump.ty_with(TypeKind::CharS, "const char", &[], true);
    let c_string = fx.dump.pointer("const char *", chars);
    let std_string = fx.ty(TypeKind::Elaborated, "std::string");
    let raw_parm = fx.parameter("Raw", c_string);
    let std_parm = fx.parameter("Std", std_string);
    let getter = fx.dump.method(host, "Name", std_string, &[]);
    let graph = fx.dump.graph();

    let raw = classify_parameter(&graph, raw_parm);
    assert_eq!(raw.category, Category::String);
    assert_eq!(raw.string_kind, Some(StringKind::RawPtr));
    assert_eq!(raw.support().unwrap().native_argument("s"), "s");

    let by_value = classify_parameter(&graph, std_parm);
    let plan = by_value.support().unwrap();
    assert_eq!(plan.wire, Wire::CString(StringKind::StdString));
    assert_eq!(plan.ownership, Ownership::Borrowed);
    assert_eq!(plan.native_argument("s"), "std::string(s)");

    let returned = classify_return(&graph, getter);
    let plan = returned.support().unwrap();
    assert_eq!(plan.ownership, Ownership::Transferred);
    assert_eq!(plan.native_type, "char *");
    assert_eq!(plan.native_return("get()")[0], "std::string strtmp = get();");
}

#[test]
fn test_scalars_and_enums()
{
    let mut fx = Fixture::new();
    let double = fx.ty(TypeKind::Double, "double");
    let int = fx.ty(TypeKind::Int, "int");
    let int_ptr = fx.dump.pointer("int *", int);
    let mode = fx.ty(TypeKind::Enum, "Mode");
    let double_parm = fx.parameter("Scale", double);
    let ptr_parm = fx.parameter("Out", int_ptr);
    let mode_parm = fx.parameter("Switch", mode);
    let graph = fx.dump.graph();

    let ety = classify_parameter(&graph, double_parm);
    assert_eq!(ety.category, Category::Primitive);
    assert_eq!(ety.rendered(), Some(("double", "double", "double")));

    let ety = classify_parameter(&graph, ptr_parm);
    assert!(matches!(ety.support(), Err(ClassificationError::ScalarIndirection { .. })));

    let ety = classify_parameter(&graph, mode_parm);
    assert_eq!(ety.category, Category::WrappedEnum);
    assert_eq!(ety.rendered(), Some(("Mode", "int", "Mode")));
    assert_eq!(ety.support().unwrap().wrapper_argument("m", "t").expression, "(int)m");
}

#[test]
fn test_void_only_as_a_return()
{
    let mut fx = Fixture::new();
    let host = fx.host;
    let void = fx.ty(TypeKind::Void, "void");
    let parm = fx.parameter("Nothing", void);
    let method = fx.dump.method(host, "Run", void, &[]);
    let graph = fx.dump.graph();

    assert!(classify_parameter(&graph, parm).support().is_err());
    let returned = classify_return(&graph, method);
    assert_eq!(returned.category, Category::Void);
    assert!(returned.support().unwrap().is_void());
}

#[test]
fn test_unknown_records_are_unsupported()
{
    let mut fx = Fixture::new();
    let stranger = fx.ty(TypeKind::Record, "Stranger");
    let parm = fx.parameter("Meet", stranger);
    let graph = fx.dump.graph();

    let ety = classify_parameter(&graph, parm);
    assert_eq!(ety.category, Category::Unsupported);
    assert_eq!(
        ety.support().unwrap_err().to_string(),
        "Unsupported type: Stranger"
    );
}

#[test]
fn test_deep_typedef_chains_overflow()
{
    let mut fx = Fixture::new();
    let mut layer = fx.ty(TypeKind::Int, "int");
    for depth in 0..=MAX_TYPE_DEPTH + 1 {
        layer = fx.dump.ty_with(TypeKind::Typedef, &format!("alias{depth}"), &[layer], false);
    }
    let parm = fx.parameter("Deep", layer);
    let graph = fx.dump.graph();

    let ety = classify_parameter(&graph, parm);
    assert!(ety.overflowed);
    assert!(matches!(ety.support(), Err(ClassificationError::DepthOverflow { .. })));
}

#[test]
fn test_vector_of_pointers_keeps_the_element_pointer()
{
    let mut fx = Fixture::new();
    let bar = fx.bar;
    let host = fx.host;
    let vector = fx.ty(TypeKind::Record, "std::vector<Bar *>");
    let const_vector = fx.ty(TypeKind::Record, "std::vector<const Bar *>");
    let all = fx.dump.callable(CursorKind::CxxMethod, Some(host), "All", vector, &[]);
    vector_refs(&mut fx.dump, all, bar);
    let view = fx.dump.callable(CursorKind::CxxMethod, Some(host), "View", const_vector, &[]);
    vector_refs(&mut fx.dump, view, bar);
    let graph = fx.dump.graph();

    let ety = classify_return(&graph, all);
    let element = ety.element.as_deref().unwrap();
    assert_eq!(element.cpp, "Bar *");
    assert_eq!(element.pointer_depth, 1);
    assert!(!element.value_as_ptr);
    assert_eq!(ety.base_type, "std::vector<Bar *>");

    let plan = ety.support().unwrap();
    assert_eq!(plan.handle_type.as_deref(), Some("CVec<Bar *>"));
    assert_eq!(
        plan.native_return("pthis->get()->All()"),
        vec!["return CVec<Bar *>::Own(new std::vector<Bar *>(pthis->get()->All()));".to_owned()]
    );
    let container = plan.container.as_ref().unwrap();
    assert_eq!(container.tag, "CVec_Bar_Ptr");
    assert_eq!(container.element_access, "CPtr<Bar>::Borrow((*v->get())[i])");

    let ety = classify_return(&graph, view);
    let element = ety.element.as_deref().unwrap();
    assert!(element.is_const);
    let plan = ety.support().unwrap();
    assert_eq!(plan.handle_type.as_deref(), Some("CVec<const Bar *>"));
    assert_eq!(plan.container.as_ref().unwrap().tag, "CVec_const_Bar_Ptr");
}

#[test]
fn test_vector_of_double_pointers_is_not_bindable()
{
    let mut fx = Fixture::new();
    let bar = fx.bar;
    let host = fx.host;
    let vector = fx.ty(TypeKind::Record, "std::vector<Bar **>");
    let method = fx.dump.callable(CursorKind::CxxMethod, Some(host), "Grid", vector, &[]);
    vector_refs(&mut fx.dump, method, bar);
    let graph = fx.dump.graph();

    let ety = classify_return(&graph, method);
    assert_eq!(ety.element.as_deref().unwrap().cpp, "Bar **");
    assert!(matches!(ety.support(), Err(ClassificationError::UnsupportedElement { .. })));
}

#[test]
fn test_mutable_string_reference_parameter_is_rejected()
{
    let mut fx = Fixture::new();
    let std_string = fx.ty(TypeKind::Elaborated, "std::string");
    let reference = fx.dump.reference("std::string &", std_string);
    let const_string = fx.dump.ty_with(TypeKind::Elaborated, "const std::string", &[], true);
    let const_reference = fx.dump.reference("const std::string &", const_string);
    let mutable_parm = fx.parameter("Rename", reference);
    let const_parm = fx.parameter("Label", const_reference);
    let graph = fx.dump.graph();

    let ety = classify_parameter(&graph, mutable_parm);
    assert!(ety.mutable_reference);
    assert!(matches!(
        ety.support(),
        Err(ClassificationError::MutableReference { spelling }) if spelling == "std::string &"
    ));

    let ety = classify_parameter(&graph, const_parm);
    assert!(!ety.mutable_reference);
    assert_eq!(ety.support().unwrap().native_argument("s"), "std::string(s)");
}

#[test]
fn test_mutable_shared_ptr_reference_parameter_is_rejected()
{
    let mut fx = Fixture::new();
    let bar = fx.bar;
    let shared = fx.ty(TypeKind::Record, "std::shared_ptr<Bar>");
    let reference = fx.dump.reference("std::shared_ptr<Bar> &", shared);
    let const_shared = fx.dump.ty_with(TypeKind::Record, "const std::shared_ptr<Bar>", &[], true);
    let const_reference = fx.dump.reference("const std::shared_ptr<Bar> &", const_shared);
    let mutable_parm = fx.parameter("Swap", reference);
    fx.dump.decl(CursorKind::NamespaceRef, "std", Some(mutable_parm), None);
    fx.dump.decl(CursorKind::TemplateRef, "shared_ptr", Some(mutable_parm), None);
    fx.dump.decl(CursorKind::TypeRef, "", Some(mutable_parm), Some(bar));
    let const_parm = fx.parameter("Keep", const_reference);
    fx.dump.decl(CursorKind::NamespaceRef, "std", Some(const_parm), None);
    fx.dump.decl(CursorKind::TemplateRef, "shared_ptr", Some(const_parm), None);
    fx.dump.decl(CursorKind::TypeRef, "", Some(const_parm), Some(bar));
    let graph = fx.dump.graph();

    let ety = classify_parameter(&graph, mutable_parm);
    assert!(ety.shared_ptr);
    assert!(matches!(ety.support(), Err(ClassificationError::MutableReference { .. })));

    let ety = classify_parameter(&graph, const_parm);
    assert!(ety.shared_ptr);
    assert_eq!(ety.support().unwrap().form, Some(HandleForm::Shared));
}

#[test]
fn test_mutable_reference_to_wrapped_class_is_still_bindable()
{
    let mut fx = Fixture::new();
    let bar = fx.bar;
    let reference = fx.dump.reference("Bar &", bar);
    let parm = fx.parameter("Edit", reference);
    let graph = fx.dump.graph();

    let ety = classify_parameter(&graph, parm);
    assert!(ety.mutable_reference);
    assert_eq!(ety.support().unwrap().form, Some(HandleForm::Reference));
}

#[test]
fn test_function_pointer_parameter_is_unsupported()
{
    let mut fx = Fixture::new();
    let void = fx.ty(TypeKind::Void, "void");
    let int = fx.ty(TypeKind::Int, "int");
    let callback = fx.dump.function_type("void (int)", void, &[int]);
    let pointer = fx.dump.pointer("void (*)(int)", callback);
    let parm = fx.parameter("OnEvent", pointer);
    let graph = fx.dump.graph();

    let ety = classify_parameter(&graph, parm);
    assert_eq!(ety.category, Category::Unsupported);
    assert_eq!(ety.cpp, "void (int) *");
    assert_eq!(ety.support().unwrap_err().to_string(), "Unsupported type: void (*)(int)");
}

#[test]
fn test_arrays_decay_to_pointers()
{
    let mut fx = Fixture::new();
    let bar = fx.bar;
    let chars = fx.ty(TypeKind::CharS, "char");
    let buffer = fx.dump.ty_with(TypeKind::ConstantArray, "char [16]", &[chars], false);
    let items = fx.dump.ty_with(TypeKind::ConstantArray, "Bar [4]", &[bar], false);
    let buffer_parm = fx.parameter("Read", buffer);
    let items_parm = fx.parameter("Load", items);
    let graph = fx.dump.graph();

    let ety = classify_parameter(&graph, buffer_parm);
    assert_eq!(ety.category, Category::String);
    assert_eq!(ety.string_kind, Some(StringKind::RawPtr));
    assert_eq!(ety.pointer_depth, 1);
    assert_eq!(ety.support().unwrap().native_type, "const char *");

    let ety = classify_parameter(&graph, items_parm);
    assert_eq!(ety.category, Category::WrappedObject);
    assert!(!ety.value_as_ptr);
    let plan = ety.support().unwrap();
    assert_eq!(plan.form, Some(HandleForm::Pointer));
    assert_eq!(ety.rendered(), Some(("CPtr<Bar> *", "IntPtr", "Bar")));
    assert_eq!(plan.native_argument("items"), "items->get()");
}

#[test]
fn test_shared_ptr_to_an_instantiation_is_unsupported()
{
    let mut fx = Fixture::new();
    let bar = fx.bar;
    let holder = fx.ty(TypeKind::Record, "std::shared_ptr<Holder<Bar>>");
    let nested = fx.ty(TypeKind::Record, "std::shared_ptr<std::shared_ptr<Bar>>");
    let holder_parm = fx.parameter("Hold", holder);
    fx.dump.decl(CursorKind::NamespaceRef, "std", Some(holder_parm), None);
    fx.dump.decl(CursorKind::TemplateRef, "shared_ptr", Some(holder_parm), None);
    fx.dump.decl(CursorKind::TemplateRef, "Holder", Some(holder_parm), None);
    fx.dump.decl(CursorKind::TypeRef, "", Some(holder_parm), Some(bar));
    let nested_parm = fx.parameter("Twice", nested);
    fx.dump.decl(CursorKind::NamespaceRef, "std", Some(nested_parm), None);
    fx.dump.decl(CursorKind::TemplateRef, "shared_ptr", Some(nested_parm), None);
    fx.dump.decl(CursorKind::NamespaceRef, "std", Some(nested_parm), None);
    fx.dump.decl(CursorKind::TemplateRef, "shared_ptr", Some(nested_parm), None);
    fx.dump.decl(CursorKind::TypeRef, "", Some(nested_parm), Some(bar));
    let graph = fx.dump.graph();

    for parm in [holder_parm, nested_parm] {
        let ety = classify_parameter(&graph, parm);
        assert!(ety.shared_ptr);
        assert_eq!(ety.category, Category::Unsupported);
        assert!(matches!(ety.support(), Err(ClassificationError::Unsupported { .. })));
    }
}
