//! Error type shared by every pass: every fallible call site constructs
//! one with `("message", span).into()` via the `From` impls below,
//! rather than building `SassError` fields out by hand.

use std::fmt;

use codemap::Span;

/// The kind of failure: a file that couldn't be read, source that
/// didn't parse, or a failure raised while expanding/evaluating an
/// otherwise well-formed program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Read,
    Syntax,
    Evaluation,
}

/// A single backtrace frame, pushed on mixin/function/import entry and
/// popped on return, so an error raised deep inside a call chain
/// carries the full chain of call sites back to the top-level driver.
#[derive(Debug, Clone)]
pub struct Frame {
    pub span: Span,
    pub caller_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SassError {
    pub kind: ErrorKind,
    pub span: Span,
    pub message: String,
    pub backtrace: Vec<Frame>,
}

impl SassError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        SassError {
            kind,
            span,
            message: message.into(),
            backtrace: Vec::new(),
        }
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Syntax, message, span)
    }

    pub fn eval(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Evaluation, message, span)
    }

    pub fn read(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Read, message, span)
    }

    /// Push a backtrace frame naming the call site currently being
    /// unwound through (mixin, function, or import boundary).
    pub fn with_frame(mut self, span: Span, caller_name: Option<String>) -> Self {
        self.backtrace.push(Frame { span, caller_name });
        self
    }
}

impl fmt::Display for SassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.message)
    }
}

impl std::error::Error for SassError {}

pub type SassResult<T> = Result<T, Box<SassError>>;

impl From<(&str, Span)> for Box<SassError> {
    fn from((message, span): (&str, Span)) -> Self {
        Box::new(SassError::eval(message, span))
    }
}

impl From<(String, Span)> for Box<SassError> {
    fn from((message, span): (String, Span)) -> Self {
        Box::new(SassError::eval(message, span))
    }
}
