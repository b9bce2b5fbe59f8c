//! # Workspace
//!
//! A loaded symbol dump: the declaration graph plus the registry of wrapped
//! types, built on first use.
//!
//! Loading a new dump replaces everything; nothing from an earlier dump
//! survives, even when the new load fails.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::classify::WrappedRegistry;
use crate::diagnostics::DiagnosticSink;
use crate::driver::{collect_registry, GenerationOutput, GenerationSession};
use crate::error::{LoadError, Result, SymbindError};
use crate::graph::{DeclGraph, NodeId, SourceFileLookup};
use crate::options::GeneratorOptions;
use crate::store;
use crate::types::SymbolTables;

/// Diagnostic written when there is no dump to load
pub const NO_SYMBOL_DATA: &str = "no symbol data loaded";

/// Outcome of [`Workspace::load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus
{
    Loaded
    {
        files: usize,
        tokens: usize,
        types: usize,
        declarations: usize,
    },
    /// The dump file does not exist; the workspace is empty
    NoSymbolData,
}

#[derive(Debug, Default)]
pub struct Workspace
{
    graph: DeclGraph,
    source: Option<PathBuf>,
    /// Registry and the options it was collected with
    registry: OnceCell<(GeneratorOptions, WrappedRegistry)>,
}

impl Workspace
{
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// A workspace over tables already in memory
    pub fn from_tables(tables: SymbolTables) -> Result<Self>
    {
        Ok(Self {
            graph: DeclGraph::build(tables)?,
            ..Self::default()
        })
    }

    /// Replace the workspace contents with the dump at `path`
    ///
    /// A missing file is reported to `sink` and leaves the workspace empty.
    /// Any other failure is returned, also leaving it empty.
    pub fn load(&mut self, path: &Path, sink: &mut dyn DiagnosticSink) -> Result<LoadStatus>
    {
        self.clear();
        let tables = match store::load(path) {
            Ok(tables) => tables,
            Err(LoadError::NotFound(_)) => {
                sink.write_line(NO_SYMBOL_DATA);
                return Ok(LoadStatus::NoSymbolData);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load symbol dump");
                sink.write_line(&format!("Failed to load {}: {e}", path.display()));
                return Err(e.into());
            }
        };

        let graph = match DeclGraph::build(tables) {
            Ok(graph) => graph,
            Err(e) => {
                sink.write_line(&format!("Failed to load {}: {e}", path.display()));
                return Err(e.into());
            }
        };
        let status = LoadStatus::Loaded {
            files: graph.filenames().len(),
            tokens: graph.token_count(),
            types: graph.type_count(),
            declarations: graph.len(),
        };
        info!(path = %path.display(), declarations = graph.len(), "Loaded symbol dump");
        self.graph = graph;
        self.source = Some(path.to_path_buf());
        Ok(status)
    }

    fn clear(&mut self)
    {
        self.graph = DeclGraph::new();
        self.source = None;
        self.registry = OnceCell::new();
    }

    #[must_use]
    pub const fn graph(&self) -> &DeclGraph
    {
        &self.graph
    }

    /// Mutable access for enable/select bookkeeping
    pub fn graph_mut(&mut self) -> &mut DeclGraph
    {
        &mut self.graph
    }

    /// Path of the loaded dump
    #[must_use]
    pub fn source(&self) -> Option<&Path>
    {
        self.source.as_deref()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool
    {
        !self.graph.is_empty()
    }

    /// Registry of wrapped types for `options`
    ///
    /// The first registry built is kept; options that differ from the ones
    /// it was built with get a fresh one.
    pub fn registry(&self, options: &GeneratorOptions) -> Cow<'_, WrappedRegistry>
    {
        let (built_with, registry) = self
            .registry
            .get_or_init(|| (options.clone(), collect_registry(&self.graph, options)));
        if built_with == options {
            Cow::Borrowed(registry)
        } else {
            Cow::Owned(collect_registry(&self.graph, options))
        }
    }

    /// Declaration covering `offset` in the file at `path`
    #[must_use]
    pub fn node_at(&self, path: &str, offset: u32) -> Option<NodeId>
    {
        let file = self.graph.source_file_index(path)?;
        self.graph.node_for_offset(file, offset)
    }

    /// Run both generation phases and report to `sink`
    ///
    /// Every declaration that produced output is enabled afterwards.
    pub fn generate(&mut self, options: &GeneratorOptions, sink: &mut dyn DiagnosticSink) -> Result<GenerationOutput>
    {
        if !self.is_loaded() {
            sink.write_line(NO_SYMBOL_DATA);
            sink.flush();
            return Err(SymbindError::InvalidArgument(NO_SYMBOL_DATA.to_owned()));
        }

        let output = {
            let registry = self.registry(options);
            GenerationSession::new(&self.graph, options, &registry).run()
        };
        output.report.write_to(sink);
        for id in &output.report.emitted {
            self.graph.set_enabled(*id, true, false);
        }
        Ok(output)
    }
}
