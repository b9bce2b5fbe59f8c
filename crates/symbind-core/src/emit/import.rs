//! Managed foreign-import declarations.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use super::{indent, BindingEmitter, BoundFunction, ClassScope, GENERATED_BANNER};
use crate::abi::{ContainerPlan, FREE_STRING_SYMBOL, IMPORT_CLASS};
use crate::options::GeneratorOptions;

const MEMBER_LEVEL: usize = 2;

/// Writes one `DllImport` declaration per native export
pub struct ImportEmitter
{
    options: GeneratorOptions,
    containers: BTreeMap<String, ContainerPlan>,
    body: String,
}

impl ImportEmitter
{
    #[must_use]
    pub fn new(options: &GeneratorOptions) -> Self
    {
        Self {
            options: options.clone(),
            containers: BTreeMap::new(),
            body: String::new(),
        }
    }

    fn declaration(out: &mut String, return_attribute: Option<&str>, returns: &str, symbol: &str, parameters: &[String])
    {
        let pad = indent(MEMBER_LEVEL);
        let _ = writeln!(out, "{pad}[DllImport(libstr)]");
        if let Some(attribute) = return_attribute {
            let _ = writeln!(out, "{pad}{attribute}");
        }
        let _ = writeln!(
            out,
            "{pad}public static extern {returns} {symbol}({});\n",
            parameters.join(", ")
        );
    }
}

impl BindingEmitter for ImportEmitter
{
    fn push_class(&mut self, class: &ClassScope)
    {
        Self::declaration(
            &mut self.body,
            None,
            "void",
            &class.release_symbol,
            &["IntPtr pthis".to_owned()],
        );
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
            parameters.push("IntPtr pthis".to_owned());
        }
        for parameter in &function.parameters {
            let declared = format!("{} {}", parameter.plan.import_type, parameter.managed_name);
            parameters.push(match parameter.plan.import_attribute() {
                Some(attribute) => format!("{attribute} {declared}"),
                None => declared,
            });
        }
        Self::declaration(
            &mut self.body,
            function.returns.import_return_attribute(),
            &function.returns.import_type,
            &function.symbol,
            &parameters,
        );
    }

    fn header(&self) -> String
    {
        let mut out = String::new();
        let _ = writeln!(out, "{GENERATED_BANNER}");
        out.push_str("using System;\nusing System.Runtime.InteropServices;\n\n");
        let _ = writeln!(out, "namespace {}\n{{", self.options.managed_namespace);
        let _ = writeln!(out, "{}static class {IMPORT_CLASS}\n{}{{", indent(1), indent(1));
        let _ = writeln!(out, "{}const string libstr = @\"{}\";\n", indent(MEMBER_LEVEL), self.options.library);
        Self::declaration(&mut out, None, "void", FREE_STRING_SYMBOL, &["IntPtr s".to_owned()]);
        out
    }

    fn body(&self) -> &str
    {
        &self.body
    }

    fn footer(&self) -> String
    {
        let mut out = String::new();
        for container in self.containers.values() {
            Self::declaration(&mut out, None, "int", &container.size_symbol(), &["IntPtr v".to_owned()]);
            Self::declaration(
                &mut out,
                None,
                "IntPtr",
                &container.at_symbol(),
                &["IntPtr v".to_owned(), "int i".to_owned()],
            );
            Self::declaration(&mut out, None, "void", &container.release_symbol(), &["IntPtr v".to_owned()]);
        }
        let _ = writeln!(out, "{}}}\n}}", indent(1));
        out
    }
}
