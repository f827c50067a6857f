//! Compile-time configuration, following the published `grass` crate's
//! own `grass::Options` builder shape (`#[derive(Debug, Clone)]` plus
//! `with_*` setters returning `Self`) rather than a struct-literal-only
//! config type.

use std::path::PathBuf;

/// Output formatting the emitter is asked to produce. Only
/// [`OutputStyle::Nested`] has a concrete writer in this crate
/// (`emitter::NestedPrinter`); the others are accepted so the enum
/// matches the full set of styles a host is allowed to request, and
/// fall back to nested formatting (recorded in DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStyle {
    Expanded,
    Compressed,
    Nested,
    Compact,
}

impl Default for OutputStyle {
    fn default() -> Self {
        OutputStyle::Nested
    }
}

/// Builder-style compile configuration. Every setter consumes and
/// returns `Self`, so a call site can chain `Options::default()
/// .with_precision(3).with_quiet(true)` directly into
/// [`crate::StyleSheet::compile`].
#[derive(Debug, Clone)]
pub struct Options {
    pub(crate) style: OutputStyle,
    pub(crate) precision: usize,
    pub(crate) load_paths: Vec<PathBuf>,
    pub(crate) is_indented_syntax_src: bool,
    pub(crate) quiet: bool,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(mut self, style: OutputStyle) -> Self {
        self.style = style;
        self
    }

    /// Number of decimal digits to keep when formatting a number that
    /// doesn't terminate exactly (`value::format_rational`'s truncation
    /// point).
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_load_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.load_paths.push(path.into());
        self
    }

    /// Marks the source as using the indented (Sass, not SCSS) syntax.
    /// Accepted for interface completeness; this crate's parser only
    /// implements the brace-delimited grammar, so setting this has no
    /// effect beyond being queryable by callers who branch on it
    /// themselves.
    pub fn with_indented_syntax(mut self, is_indented: bool) -> Self {
        self.is_indented_syntax_src = is_indented;
        self
    }

    /// Suppresses `@warn`/`@debug` output through the `log` crate
    /// (they're still collected in the returned diagnostics, if a
    /// future host wants them) — useful for test harnesses that don't
    /// want warnings polluting captured output.
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn style(&self) -> OutputStyle {
        self.style
    }

    pub fn precision(&self) -> usize {
        self.precision
    }
}

impl Default for Options {
    fn default() -> Self {
        Options {
            style: OutputStyle::default(),
            precision: 5,
            load_paths: Vec::new(),
            is_indented_syntax_src: false,
            quiet: false,
        }
    }
}
