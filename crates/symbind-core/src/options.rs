//! # Generator Options
//!
//! Knobs for the emitters and the traversal filters. Deserializable so the
//! command line can read them from the `[generator]` table of `symbind.toml`.

use serde::Deserialize;

/// Options of one generation run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions
{
    /// Library name the foreign-import declarations load
    pub library: String,
    /// Namespace of the foreign-import and wrapper files
    pub managed_namespace: String,
    /// Static class holding free functions declared at global scope
    pub root_class: String,
    /// Macro placed in front of every export
    pub export_macro: String,
    /// What the export macro expands to
    pub export_attribute: String,
    /// Headers included before the collected source files
    pub prelude_includes: Vec<String>,
    /// Source files with these suffixes hold implementation-only types
    pub implementation_suffixes: Vec<String>,
    /// When non-empty, only declarations under these path prefixes are wrapped
    pub source_roots: Vec<String>,
    /// Top-level namespaces never wrapped
    pub excluded_namespaces: Vec<String>,
    /// Include paths under this prefix are written relative to it
    pub include_base: Option<String>,
}

impl Default for GeneratorOptions
{
    fn default() -> Self
    {
        Self {
            library: "native.dll".to_owned(),
            managed_namespace: "Bindings".to_owned(),
            root_class: "Globals".to_owned(),
            export_macro: "CAPI".to_owned(),
            export_attribute: "extern \"C\" __declspec(dllexport)".to_owned(),
            prelude_includes: vec!["StdIncludes.h".to_owned()],
            implementation_suffixes: vec![".cpp".to_owned()],
            source_roots: Vec::new(),
            excluded_namespaces: vec!["std".to_owned(), "__gnu_cxx".to_owned()],
            include_base: None,
        }
    }
}

impl GeneratorOptions
{
    /// Whether `path` is inside one of the configured source roots
    #[must_use]
    pub fn in_source_roots(&self, path: &str) -> bool
    {
        if self.source_roots.is_empty() {
            return true;
        }
        let path = path.to_ascii_lowercase().replace('\\', "/");
        self.source_roots
            .iter()
            .any(|root| path.starts_with(&root.to_ascii_lowercase().replace('\\', "/")))
    }

    /// Path as it should appear in an `#include`
    #[must_use]
    pub fn include_path(&self, path: &str) -> String
    {
        let normalized = path.replace('\\', "/");
        if let Some(base) = &self.include_base {
            let base = base.replace('\\', "/");
            let base = base.trim_end_matches('/');
            if let (Some(head), Some(tail)) = (normalized.get(..base.len()), normalized.get(base.len()..)) {
                if !tail.is_empty() && head.eq_ignore_ascii_case(base) {
                    return tail.trim_start_matches('/').to_owned();
                }
            }
        }
        normalized
    }
}
