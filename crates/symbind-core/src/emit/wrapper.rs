//! Managed wrapper classes.
//!
//! Namespaces become static partial classes so free functions have a home,
//! wrapped C++ classes become disposable classes around a native handle and
//! container handles are exposed through a generic read-only list.

use std::fmt::Write as _;

use super::{indent, BindingEmitter, BoundFunction, ClassScope, EnumDef, FunctionKind, GENERATED_BANNER};
use crate::abi::{ContainerPlan, IMPORT_CLASS};
use crate::names::is_comparison_operator;
use crate::options::GeneratorOptions;

const LIST_CLASS: &str = r"public class ApiList<T> : IReadOnlyList<T>, IDisposable
{
    private IntPtr handle;
    private readonly Func<IntPtr, int> size;
    private readonly Func<IntPtr, int, IntPtr> at;
    private readonly Action<IntPtr> release;
    private readonly Func<IntPtr, T> make;

    public ApiList(IntPtr handle, Func<IntPtr, int> size, Func<IntPtr, int, IntPtr> at, Action<IntPtr> release, Func<IntPtr, T> make)
    {
        this.handle = handle;
        this.size = size;
        this.at = at;
        this.release = release;
        this.make = make;
    }

    public IntPtr Handle => handle;

    public int Count => size(handle);

    public T this[int index] => make(at(handle, index));

    public IEnumerator<T> GetEnumerator()
    {
        for (int i = 0; i < Count; i++)
        {
            yield return this[i];
        }
    }

    IEnumerator IEnumerable.GetEnumerator() => GetEnumerator();

    public void Dispose()
    {
        if (handle != IntPtr.Zero)
        {
            release(handle);
            handle = IntPtr.Zero;
        }
    }
}
";

/// Writes managed classes calling the foreign imports
pub struct WrapperEmitter
{
    options: GeneratorOptions,
    /// Open namespace and class scopes
    depth: usize,
    uses_containers: bool,
    body: String,
    /// Free functions declared at global scope
    root_functions: String,
}

impl WrapperEmitter
{
    #[must_use]
    pub fn new(options: &GeneratorOptions) -> Self
    {
        Self {
            options: options.clone(),
            depth: 0,
            uses_containers: false,
            body: String::new(),
            root_functions: String::new(),
        }
    }

    /// Indentation of members in the current scope
    const fn level(&self) -> usize
    {
        self.depth + 1
    }

    fn open(&mut self, declaration: &str)
    {
        let pad = indent(self.level());
        let _ = writeln!(self.body, "{pad}{declaration}\n{pad}{{");
        self.depth += 1;
    }

    /// Body statements of a wrapper member, one string per line
    fn statements(function: &BoundFunction) -> Vec<String>
    {
        let mut prologue = Vec::new();
        let mut epilogue = Vec::new();
        let mut arguments = Vec::with_capacity(function.parameters.len() + 1);
        if function.takes_this() {
            arguments.push("pthis".to_owned());
        }
        for (index, parameter) in function.parameters.iter().enumerate() {
            let argument = parameter
                .plan
                .wrapper_argument(&parameter.managed_name, &format!("__arg{index}"));
            prologue.extend(argument.prologue);
            arguments.push(argument.expression);
            epilogue.extend(argument.epilogue);
        }

        let call = format!("{IMPORT_CLASS}.{}({})", function.symbol, arguments.join(", "));
        let result = match function.kind {
            FunctionKind::Constructor { .. } => vec![format!("pthis = {call};")],
            _ => function.returns.wrapper_return(&call),
        };

        let mut lines = prologue;
        if epilogue.is_empty() {
            lines.extend(result);
        } else {
            lines.push("try".to_owned());
            lines.push("{".to_owned());
            lines.extend(result.into_iter().map(|line| format!("    {line}")));
            lines.push("}".to_owned());
            lines.push("finally".to_owned());
            lines.push("{".to_owned());
            lines.extend(epilogue.into_iter().map(|line| format!("    {line}")));
            lines.push("}".to_owned());
        }
        lines
    }

    fn signature(function: &BoundFunction) -> String
    {
        let parameters: Vec<String> = function
            .parameters
            .iter()
            .map(|p| format!("{} {}", p.plan.wrapper_type, p.managed_name))
            .collect();
        let parameters = parameters.join(", ");
        let returns = &function.returns.wrapper_type;
        match function.kind {
            FunctionKind::Constructor { .. } => format!("public {}({parameters})", function.managed_name),
            _ if function.is_indexer => format!("public {returns} this[{parameters}]"),
            FunctionKind::Method { is_static: false } => {
                format!("public {returns} {}({parameters})", function.managed_name)
            }
            FunctionKind::Method { is_static: true } | FunctionKind::Free => {
                format!("public static {returns} {}({parameters})", function.managed_name)
            }
        }
    }

    fn render_member(function: &BoundFunction, level: usize) -> String
    {
        let mut out = String::new();
        let pad = indent(level);
        let _ = writeln!(out, "{pad}{}\n{pad}{{", Self::signature(function));
        let body_pad = if function.is_indexer {
            let _ = writeln!(out, "{pad}    get\n{pad}    {{");
            indent(level + 2)
        } else {
            indent(level + 1)
        };
        for line in Self::statements(function) {
            let _ = writeln!(out, "{body_pad}{line}");
        }
        if function.is_indexer {
            let _ = writeln!(out, "{pad}    }}");
        }
        let _ = writeln!(out, "{pad}}}\n");
        out
    }
}

impl BindingEmitter for WrapperEmitter
{
    fn push_namespace(&mut self, name: &str)
    {
        self.open(&format!("public static partial class {name}"));
    }

    fn push_class(&mut self, class: &ClassScope)
    {
        self.open(&format!("public partial class {} : IDisposable", class.name));
        let pad = indent(self.level());
        let _ = writeln!(self.body, "{pad}public IntPtr pthis;\n");
        let _ = writeln!(
            self.body,
            "{pad}public {}(IntPtr pthis)\n{pad}{{\n{pad}    this.pthis = pthis;\n{pad}}}\n",
            class.name
        );
        let _ = writeln!(self.body, "{pad}public void Dispose()\n{pad}{{");
        let _ = writeln!(self.body, "{pad}    if (pthis != IntPtr.Zero)\n{pad}    {{");
        let _ = writeln!(self.body, "{pad}        {IMPORT_CLASS}.{}(pthis);", class.release_symbol);
        let _ = writeln!(self.body, "{pad}        pthis = IntPtr.Zero;\n{pad}    }}\n{pad}}}\n");
    }

    fn pop_scope(&mut self)
    {
        if self.depth == 0 {
            return;
        }
        self.depth -= 1;
        let _ = writeln!(self.body, "{}}}\n", indent(self.level()));
    }

    fn add_enum(&mut self, definition: &EnumDef)
    {
        let pad = indent(self.level());
        let _ = writeln!(self.body, "{pad}public enum {}\n{pad}{{", definition.name);
        for (name, value) in &definition.values {
            let _ = writeln!(self.body, "{pad}    {name} = {value},");
        }
        let _ = writeln!(self.body, "{pad}}}\n");
    }

    fn add_container(&mut self, _container: &ContainerPlan)
    {
        self.uses_containers = true;
    }

    fn emit_function(&mut self, function: &BoundFunction)
    {
        // No managed counterpart; the native export still exists
        if is_comparison_operator(&function.name) {
            return;
        }
        if function.kind == FunctionKind::Free && function.scope.is_empty() {
            let member = Self::render_member(function, 2);
            self.root_functions.push_str(&member);
        } else {
            let member = Self::render_member(function, self.level());
            self.body.push_str(&member);
        }
    }

    fn header(&self) -> String
    {
        let mut out = String::new();
        let _ = writeln!(out, "{GENERATED_BANNER}");
        out.push_str("using System;\nusing System.Collections;\nusing System.Collections.Generic;\n");
        out.push_str("using System.Runtime.InteropServices;\n\n");
        let _ = writeln!(out, "namespace {}\n{{", self.options.managed_namespace);
        if self.uses_containers {
            for line in LIST_CLASS.lines() {
                if line.is_empty() {
                    out.push('\n');
                } else {
                    let _ = writeln!(out, "{}{line}", indent(1));
                }
            }
            out.push('\n');
        }
        out
    }

    fn body(&self) -> &str
    {
        &self.body
    }

    fn footer(&self) -> String
    {
        let mut out = String::new();
        if !self.root_functions.is_empty() {
            let pad = indent(1);
            let _ = writeln!(out, "{pad}public static partial class {}\n{pad}{{", self.options.root_class);
            out.push_str(&self.root_functions);
            let _ = writeln!(out, "{pad}}}");
        }
        out.push_str("}\n");
        out
    }
}
