//! # Generation Driver
//!
//! Two walks over the declaration graph.
//!
//! ## Phase 1: collect
//!
//! [`collect_registry`] records every eligible class, struct and enum under
//! its canonical name, so signatures can refer to types declared later.
//!
//! ## Phase 2: wrap
//!
//! [`GenerationSession::run`] walks again in declaration order and feeds the
//! three emitters in lockstep. A member is emitted only when its return and
//! every parameter classify as supported; everything else is recorded in the
//! report and skipped.
//!
//! All mutable state of a run (registry, export names, managed signatures,
//! the report) lives in the session, so two runs never see each other.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use tracing::{debug, info};

use crate::abi::{AbiPlan, FREE_STRING_SYMBOL};
use crate::classify::{Classifier, Position, WrappedKind, WrappedRegistry};
use crate::diagnostics::DiagnosticSink;
use crate::emit::{
    BindingEmitter, BoundFunction, BoundParameter, ClassScope, EnumDef, FunctionKind, ImportEmitter, NativeEmitter,
    WrapperEmitter,
};
use crate::error::{ClassificationError, Result};
use crate::graph::{DeclGraph, NodeId, SourceFileLookup, TypeSite, Visit};
use crate::names::{
    canonical_name, flatten, managed_identifier, operator_name, qualified_name, ExportNames, OperatorName,
};
use crate::options::GeneratorOptions;
use crate::types::{AccessSpecifier, CursorKind, StorageClass};

/// A member left out of the bindings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedMember
{
    /// Qualified C++ name
    pub member: String,
    pub reason: ClassificationError,
}

/// What a generation run did
#[derive(Debug, Clone, Default)]
pub struct GenerationReport
{
    /// Distinct unsupported-type diagnostics
    pub unsupported: BTreeSet<String>,
    pub skipped: Vec<SkippedMember>,
    /// Declarations that produced output
    pub emitted: Vec<NodeId>,
    /// Export symbols, in emission order
    pub symbols: Vec<String>,
}

impl GenerationReport
{
    /// Write the report line by line and signal the end of the run
    pub fn write_to(&self, sink: &mut dyn DiagnosticSink)
    {
        sink.write_line(&format!(
            "Generated {} exports, skipped {} members",
            self.symbols.len(),
            self.skipped.len()
        ));
        for line in &self.unsupported {
            sink.write_line(line);
        }
        for skipped in self.skipped.iter().filter(|s| !s.reason.is_type_error()) {
            sink.write_line(&format!("Skipped {}: {}", skipped.member, skipped.reason));
        }
        sink.flush();
    }
}

/// The three rendered artifacts of a run
pub struct GenerationOutput
{
    pub native: NativeEmitter,
    pub import: ImportEmitter,
    pub wrapper: WrapperEmitter,
    pub report: GenerationReport,
}

impl GenerationOutput
{
    /// Write the native shim, the import declarations and the wrapper
    pub fn write(&self, native: &Path, import: &Path, wrapper: &Path) -> Result<()>
    {
        self.native.write(native)?;
        self.import.write(import)?;
        self.wrapper.write(wrapper)?;
        info!(
            native = %native.display(),
            import = %import.display(),
            wrapper = %wrapper.display(),
            "Wrote bindings"
        );
        Ok(())
    }
}

fn in_excluded_namespace(graph: &DeclGraph, options: &GeneratorOptions, id: NodeId) -> bool
{
    let canonical = canonical_name(graph, id);
    let top = canonical.split("::").next().unwrap_or_default();
    options.excluded_namespaces.iter().any(|ns| ns == top)
}

fn in_source_roots(graph: &DeclGraph, options: &GeneratorOptions, id: NodeId) -> bool
{
    graph
        .file_name(graph.node(id).source_file)
        .map_or(options.source_roots.is_empty(), |path| options.in_source_roots(path))
}

/// Whether a class, struct or enum declaration may be wrapped
///
/// Public (or top-level), with a body, declared outside implementation
/// files, inside the source roots and outside excluded namespaces.
#[must_use]
pub fn accepts_type(graph: &DeclGraph, options: &GeneratorOptions, id: NodeId) -> bool
{
    let node = graph.node(id);
    matches!(node.access, AccessSpecifier::Public | AccessSpecifier::Invalid)
        && !node.children.is_empty()
        && !graph.is_in_file_with_suffix(id, &options.implementation_suffixes)
        && in_source_roots(graph, options, id)
        && !in_excluded_namespace(graph, options, id)
}

/// Phase 1: the registry of types a run with `options` wraps
#[must_use]
pub fn collect_registry(graph: &DeclGraph, options: &GeneratorOptions) -> WrappedRegistry
{
    let registry = WrappedRegistry::collect(graph, |id| accepts_type(graph, options, id));
    debug!(types = registry.len(), "Collected wrapped types");
    registry
}

/// Phase 1 and Phase 2 with a fresh registry
#[must_use]
pub fn generate(graph: &DeclGraph, options: &GeneratorOptions) -> GenerationOutput
{
    let registry = collect_registry(graph, options);
    GenerationSession::new(graph, options, &registry).run()
}

/// State of one Phase 2 walk
pub struct GenerationSession<'a>
{
    graph: &'a DeclGraph,
    options: &'a GeneratorOptions,
    registry: &'a WrappedRegistry,
    classifier: Classifier<'a>,
    names: ExportNames,
    signatures: HashSet<String>,
    native: NativeEmitter,
    import: ImportEmitter,
    wrapper: WrapperEmitter,
    report: GenerationReport,
}

impl<'a> GenerationSession<'a>
{
    #[must_use]
    pub fn new(graph: &'a DeclGraph, options: &'a GeneratorOptions, registry: &'a WrappedRegistry) -> Self
    {
        let mut names = ExportNames::new();
        names.reserve("", FREE_STRING_SYMBOL);
        // Release exports keep their fixed names whatever is declared first
        for (class, entry) in registry.iter() {
            if entry.kind == WrappedKind::Class {
                names.reserve(class, "_Release");
            }
        }
        Self {
            graph,
            options,
            registry,
            classifier: Classifier::new(graph, registry),
            names,
            signatures: HashSet::new(),
            native: NativeEmitter::new(options),
            import: ImportEmitter::new(options),
            wrapper: WrapperEmitter::new(options),
            report: GenerationReport::default(),
        }
    }

    /// Walk the whole graph and hand back the rendered artifacts
    #[must_use]
    pub fn run(mut self) -> GenerationOutput
    {
        info!(nodes = self.graph.len(), types = self.registry.len(), "Generating bindings");
        let graph = self.graph;
        for &root in graph.roots() {
            self.wrap_node(root);
        }
        info!(
            exports = self.report.symbols.len(),
            skipped = self.report.skipped.len(),
            unsupported = self.report.unsupported.len(),
            "Generation finished"
        );
        GenerationOutput {
            native: self.native,
            import: self.import,
            wrapper: self.wrapper,
            report: self.report,
        }
    }

    fn broadcast(&mut self, mut event: impl FnMut(&mut dyn BindingEmitter))
    {
        event(&mut self.native);
        event(&mut self.import);
        event(&mut self.wrapper);
    }

    fn skip(&mut self, member: String, reason: ClassificationError)
    {
        debug!(member = %member, reason = %reason, "Skipping member");
        if reason.is_type_error() {
            self.report.unsupported.insert(reason.to_string());
        }
        self.report.skipped.push(SkippedMember { member, reason });
    }

    fn add_include(&mut self, id: NodeId)
    {
        if let Some(path) = self.graph.file_name(self.graph.node(id).source_file) {
            let path = path.to_owned();
            self.broadcast(|emitter| emitter.add_include(&path));
        }
    }

    fn is_registered(&self, id: NodeId, kind: WrappedKind) -> bool
    {
        self.registry
            .get(&qualified_name(self.graph, id))
            .is_some_and(|entry| entry.kind == kind && entry.node == id)
    }

    fn accepts_function(&self, id: NodeId) -> bool
    {
        let node = self.graph.node(id);
        !node.is_deleted
            && node.storage != StorageClass::Static
            && !self.graph.name(id).is_empty()
            && !self.graph.is_in_file_with_suffix(id, &self.options.implementation_suffixes)
            && in_source_roots(self.graph, self.options, id)
    }

    /// Whether anything below a namespace can produce output
    fn has_bindable(&self, namespace: NodeId) -> bool
    {
        let found = self.graph.find_children(Some(namespace), |node| match node.kind {
            CursorKind::Namespace | CursorKind::LinkageSpec | CursorKind::UnexposedDecl => Visit::Descend,
            CursorKind::ClassDecl | CursorKind::StructDecl if self.is_registered(node.id, WrappedKind::Class) => {
                Visit::Include
            }
            CursorKind::EnumDecl if self.is_registered(node.id, WrappedKind::Enum) => Visit::Include,
            CursorKind::FunctionDecl if self.accepts_function(node.id) => Visit::Include,
            _ => Visit::Prune,
        });
        !found.is_empty()
    }

    fn wrap_node(&mut self, id: NodeId)
    {
        let graph = self.graph;
        let node = graph.node(id);
        match node.kind {
            CursorKind::Namespace => {
                if in_excluded_namespace(graph, self.options, id) || !self.has_bindable(id) {
                    return;
                }
                let name = graph.name(id);
                let named = !name.is_empty();
                if named {
                    self.broadcast(|emitter| emitter.push_namespace(name));
                }
                for &child in &node.children {
                    self.wrap_node(child);
                }
                if named {
                    self.broadcast(|emitter| emitter.pop_scope());
                }
            }
            CursorKind::LinkageSpec | CursorKind::UnexposedDecl => {
                for &child in &node.children {
                    self.wrap_node(child);
                }
            }
            CursorKind::ClassDecl | CursorKind::StructDecl => self.wrap_class(id),
            CursorKind::EnumDecl => self.wrap_enum(id),
            CursorKind::FunctionDecl if self.accepts_function(id) => self.wrap_free_function(id),
            _ => {}
        }
    }

    fn wrap_class(&mut self, id: NodeId)
    {
        if !self.is_registered(id, WrappedKind::Class) {
            return;
        }
        let graph = self.graph;
        let node = graph.node(id);
        let canonical = canonical_name(graph, id);
        let class = ClassScope {
            canonical: canonical.clone(),
            name: graph.name(id).to_owned(),
            handle_type: format!("CPtr<{canonical}>"),
            release_symbol: format!("{}_Release", flatten(&canonical)),
        };
        debug!(class = %canonical, "Wrapping class");

        self.add_include(id);
        self.broadcast(|emitter| emitter.push_class(&class));
        self.report.emitted.push(id);
        self.report.symbols.push(class.release_symbol.clone());

        let mut constructors = 0usize;
        for &child in &node.children {
            let member = graph.node(child);
            let bindable = member.is_public() && !member.is_deleted && member.source_file == node.source_file;
            match member.kind {
                CursorKind::Constructor if bindable && !node.is_abstract => {
                    if self.wrap_constructor(&class, child, constructors) {
                        constructors += 1;
                    }
                }
                CursorKind::CxxMethod if bindable => {
                    let is_static = member.storage == StorageClass::Static;
                    self.wrap_callable(&canonical, child, FunctionKind::Method { is_static });
                }
                CursorKind::ClassDecl | CursorKind::StructDecl => self.wrap_class(child),
                CursorKind::EnumDecl => self.wrap_enum(child),
                _ => {}
            }
        }

        self.broadcast(|emitter| emitter.pop_scope());
    }

    fn wrap_enum(&mut self, id: NodeId)
    {
        if !self.is_registered(id, WrappedKind::Enum) {
            return;
        }
        let graph = self.graph;
        let values = graph
            .children_of_kind(id, CursorKind::EnumConstantDecl)
            .into_iter()
            .zip(0i64..)
            .map(|(constant, value)| (graph.name(constant).to_owned(), value))
            .collect();
        let definition = EnumDef {
            canonical: qualified_name(graph, id),
            name: graph.name(id).to_owned(),
            values,
        };
        self.add_include(id);
        self.broadcast(|emitter| emitter.add_enum(&definition));
        self.report.emitted.push(id);
    }

    fn wrap_free_function(&mut self, id: NodeId)
    {
        let scope = canonical_name(self.graph, id);
        if self.wrap_callable(&scope, id, FunctionKind::Free) {
            self.add_include(id);
        }
    }

    /// Classify the parameters of a function declaration
    fn parameters(&self, function: NodeId) -> std::result::Result<Vec<BoundParameter>, ClassificationError>
    {
        let graph = self.graph;
        let declared = graph.find_children(Some(function), |node| match node.kind {
            CursorKind::ParmDecl => Visit::Include,
            CursorKind::CompoundStmt => Visit::Prune,
            _ => Visit::Descend,
        });

        let mut generated = 0usize;
        let mut parameters = Vec::with_capacity(declared.len());
        for id in declared {
            let ety = self
                .classifier
                .classify(&TypeSite::of_declaration(graph, id), Position::Parameter);
            let plan = ety.support()?.clone();
            let declared_name = graph.name(id);
            let (name, managed_name) = if declared_name.is_empty() || declared_name == "params" {
                let name = format!("tmp{generated}");
                generated += 1;
                (name.clone(), name)
            } else {
                (declared_name.to_owned(), managed_identifier(declared_name))
            };
            parameters.push(BoundParameter {
                name,
                managed_name,
                plan,
            });
        }
        Ok(parameters)
    }

    /// `scope::member(T1,T2)` over wrapper types; one emission per key
    fn claim_signature(&mut self, scope: &str, member: &str, parameters: &[BoundParameter]) -> bool
    {
        let types: Vec<&str> = parameters.iter().map(|p| p.plan.wrapper_type.as_str()).collect();
        self.signatures.insert(format!("{scope}::{member}({})", types.join(",")))
    }

    fn wrap_constructor(&mut self, class: &ClassScope, id: NodeId, index: usize) -> bool
    {
        let member = format!("{}::{}", class.canonical, class.name);
        let parameters = match self.parameters(id) {
            Ok(parameters) => parameters,
            Err(reason) => {
                self.skip(member, reason);
                return false;
            }
        };
        if !self.claim_signature(&class.canonical, ".ctor", &parameters) {
            let signature = format!("{member}/{}", parameters.len());
            self.skip(member, ClassificationError::DuplicateSignature { signature });
            return false;
        }

        self.names.reserve(&class.canonical, &format!("_Ctor{index}"));
        let function = BoundFunction {
            kind: FunctionKind::Constructor { index },
            scope: class.canonical.clone(),
            name: class.name.clone(),
            managed_name: class.name.clone(),
            symbol: format!("{}_Ctor{index}", flatten(&class.canonical)),
            parameters,
            returns: AbiPlan::constructed(&class.canonical),
            is_indexer: false,
        };
        self.emit(function, id);
        true
    }

    /// Methods and free functions
    fn wrap_callable(&mut self, scope: &str, id: NodeId, kind: FunctionKind) -> bool
    {
        let graph = self.graph;
        let name = graph.name(id).to_owned();
        let member = if scope.is_empty() { name.clone() } else { format!("{scope}::{name}") };

        let operator = operator_name(&name);
        if operator == Some(OperatorName::Unbindable) {
            self.skip(member, ClassificationError::OperatorNotBindable { name });
            return false;
        }

        let returns = self
            .classifier
            .classify(&TypeSite::of_return(graph, id), Position::Return);
        let prepared = returns
            .support()
            .cloned()
            .and_then(|plan| self.parameters(id).map(|parameters| (plan, parameters)));
        let (returns, parameters) = match prepared {
            Ok(prepared) => prepared,
            Err(reason) => {
                self.skip(member, reason);
                return false;
            }
        };

        let is_indexer = operator == Some(OperatorName::Indexer)
            && kind == (FunctionKind::Method { is_static: false })
            && parameters.len() == 1
            && !returns.is_void();
        let managed_name = match operator {
            Some(OperatorName::Mnemonic(mnemonic)) => mnemonic.to_owned(),
            Some(OperatorName::Indexer) => "oparray".to_owned(),
            _ => name.clone(),
        };
        let dedup_name = if is_indexer { "this[]" } else { managed_name.as_str() };
        if !self.claim_signature(scope, dedup_name, &parameters) {
            let signature = format!("{member}/{}", parameters.len());
            self.skip(member, ClassificationError::DuplicateSignature { signature });
            return false;
        }

        let suffix = match self.names.resolve(scope, &name) {
            Ok(suffix) => suffix,
            Err(reason) => {
                self.skip(member, reason);
                return false;
            }
        };
        let function = BoundFunction {
            kind,
            scope: scope.to_owned(),
            name,
            managed_name,
            symbol: format!("{}{suffix}", flatten(scope)),
            parameters,
            returns,
            is_indexer,
        };
        self.emit(function, id);
        true
    }

    fn emit(&mut self, function: BoundFunction, id: NodeId)
    {
        let containers: Vec<_> = function
            .parameters
            .iter()
            .map(|p| &p.plan)
            .chain(std::iter::once(&function.returns))
            .filter_map(|plan| plan.container.clone())
            .collect();
        for container in &containers {
            self.broadcast(|emitter| emitter.add_container(container));
        }
        self.broadcast(|emitter| emitter.emit_function(&function));
        self.report.symbols.push(function.symbol);
        self.report.emitted.push(id);
    }
}
