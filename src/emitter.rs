//! CSS text emitter: consumes the cssize-normalized,
//! placeholder-free tree and produces a text buffer. `CssWriter` is a
//! seam so a host can own output-style choice instead of this crate
//! hard-coding one; `NestedPrinter` is the one concrete writer this
//! crate ships (nested style only).
//!
//! Re-derived against this crate's own `Statement` shape (not ported
//! from any single reference file), plus `value::to_css_string` for
//! the leaf formatting of
//! every value already built during evaluation.

use crate::ast::expression::Expression;
use crate::ast::statement::{Block, Statement};
use crate::error::SassResult;
use crate::selector::SelectorOrSchema;
use crate::value;

use codemap::Span;

/// A writer that turns a cssize-normalized [`Block`] into CSS text.
/// Implemented once here ([`NestedPrinter`]); a future compressed or
/// expanded writer would implement the same trait rather than
/// branching inside one giant printer.
pub trait CssWriter {
    fn write_stylesheet(&mut self, root: &Block) -> SassResult<String>;
}

/// Two-space-per-level nested formatting, the conventional default
/// Sass output style: every rule's declarations sit one level deeper
/// than its own selector, and top-level rules are separated by a blank
/// line (the emitter-side approximation of cssize's `group_end` flag —
/// see `cssize`'s module docs for why the flag itself isn't threaded
/// through the tree).
pub struct NestedPrinter {
    /// Accepted from [`crate::options::Options`] for interface
    /// completeness; `value::format_rational`'s truncation point is
    /// fixed today rather than threaded through per-writer (documented
    /// in DESIGN.md).
    #[allow(dead_code)]
    precision: usize,
    buf: String,
}

impl NestedPrinter {
    pub fn new(precision: usize) -> Self {
        NestedPrinter { precision, buf: String::new() }
    }

    fn indent(&mut self, level: usize) {
        for _ in 0..level {
            self.buf.push_str("  ");
        }
    }

    fn write_top_level(&mut self, stmts: &[Statement]) -> SassResult<()> {
        let mut first = true;
        for stmt in stmts {
            if is_invisible(stmt) {
                continue;
            }
            if !first {
                self.buf.push('\n');
            }
            first = false;
            self.write_stmt(stmt, 0)?;
        }
        Ok(())
    }

    fn write_block_children(&mut self, stmts: &[Statement], level: usize) -> SassResult<()> {
        for stmt in stmts {
            if is_invisible(stmt) {
                continue;
            }
            self.write_stmt(stmt, level)?;
        }
        Ok(())
    }

    fn write_stmt(&mut self, stmt: &Statement, level: usize) -> SassResult<()> {
        match stmt {
            Statement::Ruleset { selector, block, span } => self.write_ruleset(selector, block, *span, level),
            Statement::MediaRule { queries, block, span } => {
                let text = value::to_css_string(queries, *span)?;
                self.write_at_rule("media", &text, block, level)
            }
            Statement::SupportsRule { condition, block, span } => {
                let text = value::to_css_string(condition, *span)?;
                self.write_at_rule("supports", &text, block, level)
            }
            Statement::Directive { keyword, selector, value: dvalue, block, span } => {
                self.write_directive(keyword, selector.as_ref(), dvalue.as_ref(), block.as_ref(), *span, level)
            }
            Statement::KeyframeRule { name, block, span } => {
                self.indent(level);
                self.buf.push_str("@keyframes ");
                self.buf.push_str(name);
                self.buf.push_str(" {\n");
                self.write_block_children(&block.children, level + 1)?;
                self.indent(level);
                self.buf.push_str("}\n");
                let _ = span;
                Ok(())
            }
            Statement::Declaration { property, value: dval, is_important, is_custom_property, span, .. } => {
                self.write_declaration(property, dval.as_ref(), *is_important, *is_custom_property, *span, level)
            }
            Statement::Comment { text, span, .. } => {
                self.indent(level);
                self.buf.push_str(text);
                self.buf.push('\n');
                let _ = span;
                Ok(())
            }
            // Anything else (Bubble, Trace, control-flow nodes) never
            // survives to the emitter — the pipeline consumes them
            // before this stage runs.
            _ => Ok(()),
        }
    }

    fn write_ruleset(&mut self, selector: &SelectorOrSchema, block: &Block, _span: Span, level: usize) -> SassResult<()> {
        let list = match selector {
            SelectorOrSchema::List(l) => l,
            SelectorOrSchema::Schema(_) => unreachable!("selectors are fully resolved before the emitter runs"),
        };
        if block.children.iter().all(is_invisible) {
            return Ok(());
        }
        self.indent(level);
        self.buf.push_str(&list.to_string());
        self.buf.push_str(" {\n");
        self.write_block_children(&block.children, level + 1)?;
        self.indent(level);
        self.buf.push_str("}\n");
        Ok(())
    }

    fn write_at_rule(&mut self, keyword: &str, prelude: &str, block: &Block, level: usize) -> SassResult<()> {
        if block.children.iter().all(is_invisible) {
            return Ok(());
        }
        self.indent(level);
        self.buf.push('@');
        self.buf.push_str(keyword);
        if !prelude.is_empty() {
            self.buf.push(' ');
            self.buf.push_str(prelude);
        }
        self.buf.push_str(" {\n");
        self.write_block_children(&block.children, level + 1)?;
        self.indent(level);
        self.buf.push_str("}\n");
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn write_directive(
        &mut self,
        keyword: &str,
        selector: Option<&SelectorOrSchema>,
        value: Option<&Expression>,
        block: Option<&Block>,
        span: Span,
        level: usize,
    ) -> SassResult<()> {
        self.indent(level);
        self.buf.push('@');
        self.buf.push_str(keyword);
        if let Some(sel) = selector {
            self.buf.push(' ');
            match sel {
                SelectorOrSchema::List(l) => self.buf.push_str(&l.to_string()),
                SelectorOrSchema::Schema(_) => unreachable!("selectors are fully resolved before the emitter runs"),
            }
        }
        if let Some(v) = value {
            self.buf.push(' ');
            self.buf.push_str(&value::to_css_string(v, span)?);
        }
        match block {
            Some(b) => {
                self.buf.push_str(" {\n");
                self.write_block_children(&b.children, level + 1)?;
                self.indent(level);
                self.buf.push_str("}\n");
            }
            None => self.buf.push_str(";\n"),
        }
        Ok(())
    }

    fn write_declaration(
        &mut self,
        property: &Expression,
        value: Option<&Expression>,
        is_important: bool,
        is_custom_property: bool,
        span: Span,
        level: usize,
    ) -> SassResult<()> {
        let value = match value {
            Some(v) => v,
            None => return Ok(()),
        };
        if !is_custom_property && matches!(value, Expression::Null) {
            return Ok(());
        }
        let prop_text = crate::value::unquoted_text(property, span);
        let value_text = value::to_css_string(value, span)?;
        if value_text.is_empty() && !is_custom_property {
            return Ok(());
        }
        self.indent(level);
        self.buf.push_str(&prop_text);
        self.buf.push_str(": ");
        self.buf.push_str(&value_text);
        if is_important {
            self.buf.push_str(" !important");
        }
        self.buf.push_str(";\n");
        Ok(())
    }
}

impl CssWriter for NestedPrinter {
    fn write_stylesheet(&mut self, root: &Block) -> SassResult<String> {
        self.write_top_level(&root.children)?;
        Ok(std::mem::take(&mut self.buf))
    }
}

/// A ruleset/at-rule with no visible output (every declaration
/// resolved to `null`, every nested rule itself invisible) is elided
/// rather than emitted as an empty `{ }` ("free to elide
/// invisible items").
fn is_invisible(stmt: &Statement) -> bool {
    match stmt {
        Statement::Declaration { value: None, .. } => true,
        Statement::Declaration { value: Some(Expression::Null), is_custom_property: false, .. } => true,
        Statement::Ruleset { block, .. }
        | Statement::MediaRule { block, .. }
        | Statement::SupportsRule { block, .. } => block.children.iter().all(is_invisible),
        _ => false,
    }
}

/// Entry point used by `StyleSheet::compile`: picks the writer for
/// `opts.style()` (today only [`NestedPrinter`] exists; every other
/// style falls back to it, recorded in DESIGN.md) and renders `root`.
pub fn render(root: &Block, precision: usize) -> SassResult<String> {
    let mut printer = NestedPrinter::new(precision);
    printer.write_stylesheet(root)
}
