//! # Diagnostics
//!
//! Line-oriented report channel for progress, errors and unsupported types.
//!
//! The core writes to a [`DiagnosticSink`] and signals [`DiagnosticSink::flush`]
//! once at the end of a run. Where the lines end up is the caller's business.

use tracing::info;

/// Receives diagnostic lines from a generation run
pub trait DiagnosticSink
{
    fn write_line(&mut self, line: &str);

    /// End of a run
    fn flush(&mut self) {}
}

/// Forwards every line to the `tracing` subscriber at INFO level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink
{
    fn write_line(&mut self, line: &str)
    {
        info!(target: "symbind::diagnostics", "{line}");
    }
}

/// Keeps every line in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySink
{
    lines: Vec<String>,
    flushed: bool,
}

impl MemorySink
{
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    #[must_use]
    pub fn lines(&self) -> &[String]
    {
        &self.lines
    }

    #[must_use]
    pub const fn is_flushed(&self) -> bool
    {
        self.flushed
    }

    #[must_use]
    pub fn contains(&self, needle: &str) -> bool
    {
        self.lines.iter().any(|line| line.contains(needle))
    }
}

impl DiagnosticSink for MemorySink
{
    fn write_line(&mut self, line: &str)
    {
        self.lines.push(line.to_owned());
        self.flushed = false;
    }

    fn flush(&mut self)
    {
        self.flushed = true;
    }
}
