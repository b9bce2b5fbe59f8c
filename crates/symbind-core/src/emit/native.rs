//! C++ export shim.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use super::{declare, BindingEmitter, BoundFunction, ClassScope, FunctionKind, GENERATED_BANNER};
use crate::abi::{ContainerPlan, FREE_STRING_SYMBOL};
use crate::options::GeneratorOptions;

const HANDLE_TEMPLATES: &str = r"template<typename T> class CPtr
{
public:
    static CPtr<T> *Borrow(T *p) { return new CPtr<T>(p, nullptr); }
    static CPtr<T> *Borrow(const T *p) { return new CPtr<T>(const_cast<T *>(p), nullptr); }
    static CPtr<T> *Own(T *p) { return new CPtr<T>(nullptr, std::shared_ptr<T>(p)); }
    static CPtr<T> *Share(const std::shared_ptr<T> &sp) { return new CPtr<T>(nullptr, sp); }

    T *get() { return ptr != nullptr ? ptr : sptr.get(); }
    std::shared_ptr<T> shared() { return sptr != nullptr ? sptr : std::shared_ptr<T>(ptr, [](T *) {}); }

private:
    CPtr(T *p, std::shared_ptr<T> sp) : ptr(p), sptr(std::move(sp)) {}

    T *ptr;
    std::shared_ptr<T> sptr;
};

template<typename T> class CVec
{
public:
    static CVec<T> *Borrow(std::vector<T> *v) { return new CVec<T>(v, nullptr); }
    static CVec<T> *Borrow(const std::vector<T> *v) { return new CVec<T>(const_cast<std::vector<T> *>(v), nullptr); }
    static CVec<T> *Own(std::vector<T> *v) { return new CVec<T>(nullptr, std::unique_ptr<std::vector<T>>(v)); }

    std::vector<T> *get() { return ptr != nullptr ? ptr : owned.get(); }

private:
    CVec(std::vector<T> *v, std::unique_ptr<std::vector<T>> o) : ptr(v), owned(std::move(o)) {}

    std::vector<T> *ptr;
    std::unique_ptr<std::vector<T>> owned;
};
";

/// Writes `extern "C"` entry points forwarding into the C++ API
pub struct NativeEmitter
{
    options: GeneratorOptions,
    includes: BTreeSet<String>,
    containers: BTreeMap<String, ContainerPlan>,
    body: String,
}

impl NativeEmitter
{
    #[must_use]
    pub fn new(options: &GeneratorOptions) -> Self
    {
        Self {
            options: options.clone(),
            includes: BTreeSet::new(),
            containers: BTreeMap::new(),
            body: String::new(),
        }
    }

    fn export(&self) -> &str
    {
        &self.options.export_macro
    }

    fn call_expression(function: &BoundFunction) -> String
    {
        let arguments: Vec<String> = function
            .parameters
            .iter()
            .map(|p| p.plan.native_argument(&p.name))
            .collect();
        let arguments = arguments.join(", ");
        match function.kind {
            FunctionKind::Method { is_static: false } => format!("pthis->get()->{}({arguments})", function.name),
            FunctionKind::Constructor { .. } => format!("new {}({arguments})", function.scope),
            FunctionKind::Method { is_static: true } | FunctionKind::Free => {
                format!("{}({arguments})", function.qualified_name())
            }
        }
    }

    fn render_container(&self, container: &ContainerPlan) -> String
    {
        let export = self.export();
        let handle = &container.handle_type;
        let mut out = String::new();
        let _ = writeln!(out, "{export} int {}({handle} *v)", container.size_symbol());
        let _ = writeln!(out, "{{\n    return static_cast<int>(v->get()->size());\n}}\n");
        let _ = writeln!(
            out,
            "{export} {}({handle} *v, int i)",
            declare(&container.element_native_type, &container.at_symbol())
        );
        let _ = writeln!(out, "{{\n    return {};\n}}\n", container.element_access);
        let _ = writeln!(out, "{export} void {}({handle} *v)", container.release_symbol());
        let _ = writeln!(out, "{{\n    delete v;\n}}\n");
        out
    }
}

impl BindingEmitter for NativeEmitter
{
    fn push_class(&mut self, class: &ClassScope)
    {
        let export = self.export().to_owned();
        let _ = writeln!(self.body, "// {}", class.canonical);
        let _ = writeln!(
            self.body,
            "{export} void {}({})",
            class.release_symbol,
            declare(&format!("{} *", class.handle_type), "pthis")
        );
        let _ = writeln!(self.body, "{{\n    delete pthis;\n}}\n");
    }

    fn add_include(&mut self, path: &str)
    {
        self.includes.insert(self.options.include_path(path));
    }

    fn add_container(&mut self, container: &ContainerPlan)
    {
        self.containers
            .entry(container.tag.clone())
            .or_insert_with(|| container.clone());
    }

    fn emit_function(&mut self, function: &BoundFunction)
    {
        let mut parameters = Vec::with_capacity(function.parameters.len() + 1);
        if function.takes_this() {
            parameters.push(format!("CPtr<{}> *pthis", function.scope));
        }
        for parameter in &function.parameters {
            parameters.push(declare(&parameter.plan.native_type, &parameter.name));
        }

        let call = Self::call_expression(function);
        let statements = match function.kind {
            FunctionKind::Constructor { .. } => vec![format!("return CPtr<{}>::Own({call});", function.scope)],
            _ => function.returns.native_return(&call),
        };

        let export = self.export().to_owned();
        let _ = writeln!(self.body, "// {}", function.qualified_name());
        let _ = writeln!(
            self.body,
            "{export} {}({})",
            declare(&function.returns.native_type, &function.symbol),
            parameters.join(", ")
        );
        self.body.push_str("{\n");
        for statement in statements {
            let _ = writeln!(self.body, "    {statement}");
        }
        self.body.push_str("}\n\n");
    }

    fn header(&self) -> String
    {
        let mut out = String::new();
        let _ = writeln!(out, "{GENERATED_BANNER}");
        for include in &self.options.prelude_includes {
            let _ = writeln!(out, "#include \"{include}\"");
        }
        for include in &self.includes {
            let _ = writeln!(out, "#include \"{include}\"");
        }
        out.push_str("#include <cstring>\n#include <memory>\n#include <string>\n#include <vector>\n\n");
        out.push_str(HANDLE_TEMPLATES);
        let _ = writeln!(out, "\n#define {} {}\n", self.options.export_macro, self.options.export_attribute);
        let _ = writeln!(
            out,
            "{} void {FREE_STRING_SYMBOL}(char *s)\n{{\n    delete[] s;\n}}\n",
            self.options.export_macro
        );
        out
    }

    fn body(&self) -> &str
    {
        &self.body
    }

    fn footer(&self) -> String
    {
        self.containers
            .values()
            .map(|container| self.render_container(container))
            .collect()
    }
}
