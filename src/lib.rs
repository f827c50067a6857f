//! `sassy`: a Sass-like CSS preprocessor compiler.
//!
//! The pipeline (data flow): source text → lexer/parser →
//! [`Statement`](ast::statement::Statement) tree → [`expander::Expander`]
//! (resolves control flow, mixins, imports, parent selectors; collects
//! `@extend` requests) → [`extend_pass`] (rewrites selectors against the
//! collected subset map) → [`cssize`] (de-nests into a flat, legal CSS
//! tree) → [`remove_placeholders`] → [`emitter`].
//!
//! [`StyleSheet`] is the entry point a host embeds against; its name
//! and the top-level [`compile_string`]/[`compile_file`] convenience
//! functions mirror the published `grass` crate's own
//! `grass::from_string`/`grass::from_path` surface.

pub mod arena;
pub mod ast;
pub mod builtin;
pub mod common;
pub mod cssize;
pub mod emitter;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod expander;
pub mod extend_pass;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod remove_placeholders;
pub mod selector;
pub mod token;
pub mod value;

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use codemap::CodeMap;

use ast::statement::Block;
use environment::Environment;
use expander::Expander;

pub use error::{ErrorKind, SassError, SassResult};
pub use options::{Options, OutputStyle};

/// Final, emittable representation of a compile: the tree is
/// cssize-normalized and placeholder-free by the time it reaches here.
/// Holds the rendered text; kept as its own type rather than a bare
/// `String` so a future source-map field has somewhere to live without
/// breaking callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Css {
    text: String,
}

impl Css {
    pub fn into_string(self) -> String {
        self.text
    }
}

impl AsRef<str> for Css {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for Css {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

enum Source {
    Text(String),
    File(PathBuf),
}

/// A stylesheet source, parsed and run through the pipeline on
/// [`compile`](StyleSheet::compile) rather than in the constructor —
/// parsing needs the shared `CodeMap` that the expander also reuses to
/// reparse slurped selector/value fragments (see
/// `parser::Parser::for_text`), so the two happen together.
pub struct StyleSheet {
    source: Source,
}

impl StyleSheet {
    pub fn from_string(input: impl Into<String>) -> Self {
        StyleSheet { source: Source::Text(input.into()) }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        StyleSheet { source: Source::File(path.as_ref().to_owned()) }
    }

    /// Runs the full pipeline (data flow, end to end) and
    /// renders the result.
    pub fn compile(&self, opts: &Options) -> SassResult<Css> {
        let codemap = Rc::new(RefCell::new(CodeMap::new()));
        let (name, contents) = match &self.source {
            Source::Text(contents) => ("stdin".to_owned(), contents.clone()),
            Source::File(path) => {
                let contents = fs::read_to_string(path).map_err(|e| {
                    let file = codemap.borrow_mut().add_file(String::new(), String::new());
                    let span = file.span.subspan(0, 0);
                    Box::new(SassError::read(format!("Error reading {}: {}", path.display(), e), span))
                })?;
                (path.display().to_string(), contents)
            }
        };
        let file = codemap.borrow_mut().add_file(name, contents);
        let root = parser::parse_stylesheet(&file, Rc::clone(&codemap))?;

        let env = Environment::new();
        let (expanded, subset_map) = Expander::new(Rc::clone(&codemap)).expand(&root, &env)?;
        let extended = extend_pass::apply(&expanded, &subset_map)?;
        let cssized = cssize::run(&extended)?;
        let cleaned = remove_placeholders::run(&cssized);

        render(&cleaned, opts)
    }
}

fn render(root: &Block, opts: &Options) -> SassResult<Css> {
    // Only `OutputStyle::Nested` has a concrete writer today; every
    // other requested style falls back to it rather than failing the
    // compile, a gap recorded in DESIGN.md.
    let _ = opts.style();
    let text = emitter::render(root, opts.precision())?;
    Ok(Css { text })
}

/// Convenience wrapper matching the published `grass` crate's top-level
/// `grass::from_string` function.
pub fn compile_string(input: impl Into<String>, opts: &Options) -> SassResult<String> {
    StyleSheet::from_string(input).compile(opts).map(Css::into_string)
}

/// Convenience wrapper matching the published `grass` crate's top-level
/// `grass::from_path` function.
pub fn compile_file(path: impl AsRef<Path>, opts: &Options) -> SassResult<String> {
    StyleSheet::from_path(path).compile(opts).map(Css::into_string)
}
