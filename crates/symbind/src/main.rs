use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use symbind_core::diagnostics::{DiagnosticSink, TracingSink};
use symbind_core::graph::{DeclGraph, NodeId, SourceFileLookup};
use symbind_core::names::qualified_name;
use symbind_core::workspace::NO_SYMBOL_DATA;
use symbind_core::{GeneratorOptions, LoadStatus, Workspace};
use symbind_utils::{info, init_logging, init_logging_to, load_config, LogFormat, LogLevel, LoggingConfig, LoggingGuard};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Generate C export shims and managed bindings from a clang symbol dump.
#[derive(Parser, Debug)]
#[command(name = "symbind")]
#[command(version)]
#[command(about = "Generate C export shims and managed bindings from a clang symbol dump", long_about = None)]
struct Cli
{
    /// Configuration file (default: $SYMBIND_CONFIG, then ./symbind.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log level: error, warn, info, debug or trace
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Log format: pretty, compact or json
    #[arg(long, global = true)]
    log_format: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Show table sizes and the declaration kind histogram
    Info
    {
        /// Symbol dump to load
        dump: PathBuf,
    },
    /// List declarations whose name contains some text
    Query
    {
        dump: PathBuf,
        /// Text to search for in declaration names
        text: String,
    },
    /// Show the declaration at a byte offset of a source file
    At
    {
        dump: PathBuf,
        /// Source file path as recorded in the dump
        file: String,
        offset: u32,
    },
    /// List declarations whose type chain contains a type node
    Refs
    {
        dump: PathBuf,
        /// Stored key of the type node
        key: i64,
    },
    /// Write the native shim, import declarations and wrapper
    Generate
    {
        dump: PathBuf,
        /// Output directory (overrides `[output] dir`)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
}

/// `[output]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct OutputConfig
{
    dir: PathBuf,
    native: String,
    import: String,
    wrapper: String,
}

impl Default for OutputConfig
{
    fn default() -> Self
    {
        Self {
            dir: PathBuf::from("."),
            native: "exports.cpp".to_owned(),
            import: "NativeLib.cs".to_owned(),
            wrapper: "Api.cs".to_owned(),
        }
    }
}

/// Contents of `symbind.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SymbindConfig
{
    generator: GeneratorOptions,
    logging: LoggingConfig,
    output: OutputConfig,
}

/// Prints diagnostics to stdout
struct ConsoleSink;

impl DiagnosticSink for ConsoleSink
{
    fn write_line(&mut self, line: &str)
    {
        println!("{line}");
    }
}

fn main()
{
    let cli = Cli::parse();

    let config: SymbindConfig = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let _guard = match start_logging(&cli, &config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli, &config) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Command-line flags win over the `[logging]` table, which wins over the environment
fn start_logging(cli: &Cli, config: &LoggingConfig) -> CliResult<LoggingGuard>
{
    let level = cli.log_level.as_deref().or(config.level.as_deref());
    let format = cli.log_format.as_deref().or(config.format.as_deref());
    if level.is_none() && format.is_none() && config.file.is_none() {
        return Ok(init_logging()?);
    }
    let level: LogLevel = level.map(str::parse::<LogLevel>).transpose()?.unwrap_or_default();
    let format: LogFormat = format.map(str::parse::<LogFormat>).transpose()?.unwrap_or_default();
    Ok(init_logging_to(level, format, config.file.as_deref())?)
}

fn open(dump: &Path) -> CliResult<Workspace>
{
    let mut workspace = Workspace::new();
    match workspace.load(dump, &mut TracingSink)? {
        LoadStatus::Loaded { .. } => Ok(workspace),
        LoadStatus::NoSymbolData => Err(format!("{}: {NO_SYMBOL_DATA}", dump.display()).into()),
    }
}

fn describe(graph: &DeclGraph, id: NodeId) -> String
{
    let node = graph.node(id);
    let file = graph.file_name(node.source_file).unwrap_or("<unknown>");
    format!(
        "#{:<7} {:<20} {:<40} {file}:{}:{}",
        id.index(),
        node.kind.to_string(),
        qualified_name(graph, id),
        node.line,
        node.column
    )
}

fn run_command(cli: Cli, config: &SymbindConfig) -> CliResult<()>
{
    match cli.command {
        Commands::Info { dump } => {
            let workspace = open(&dump)?;
            let graph = workspace.graph();
            println!("Files:        {}", graph.filenames().len());
            println!("Tokens:       {}", graph.token_count());
            println!("Types:        {}", graph.type_count());
            println!("Declarations: {}", graph.len());
            println!();
            for (kind, count) in graph.cursor_kind_counts() {
                println!("{:>8}  {kind}", count);
            }
            Ok(())
        }
        Commands::Query { dump, text } => {
            let workspace = open(&dump)?;
            let graph = workspace.graph();
            let found = graph.query_tokens(&text);
            for id in &found {
                println!("{}", describe(graph, *id));
            }
            info!("{} declarations match {text:?}", found.len());
            Ok(())
        }
        Commands::At { dump, file, offset } => {
            let workspace = open(&dump)?;
            let graph = workspace.graph();
            let Some(id) = workspace.node_at(&file, offset) else {
                return Err(format!("No declaration at {file}:{offset}").into());
            };
            println!("{}", describe(graph, id));
            for ancestor in graph.ancestors(id) {
                println!("  in {}", describe(graph, ancestor));
            }
            Ok(())
        }
        Commands::Refs { dump, key } => {
            let workspace = open(&dump)?;
            let graph = workspace.graph();
            let Some(ty) = graph.find_type_by_key(key) else {
                return Err(format!("No type node with key {key}").into());
            };
            println!("Type {key}: {}", graph.type_text(ty));
            for id in graph.type_references(ty) {
                println!("{}", describe(graph, *id));
            }
            Ok(())
        }
        Commands::Generate { dump, out_dir } => {
            let mut workspace = open(&dump)?;
            let output = workspace.generate(&config.generator, &mut ConsoleSink)?;
            let dir = out_dir.unwrap_or_else(|| config.output.dir.clone());
            std::fs::create_dir_all(&dir)?;
            output.write(
                &dir.join(&config.output.native),
                &dir.join(&config.output.import),
                &dir.join(&config.output.wrapper),
            )?;
            println!("Wrote bindings to {}", dir.display());
            Ok(())
        }
    }
}
