//! Source location tracking.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use miette::{NamedSource, SourceSpan};

/// A span in the source code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub file: PathBuf,
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
    pub start_byte: usize,
    pub end_byte: usize,
}

impl Span {
    pub fn new(
        file: PathBuf,
        (start_line, start_col): (usize, usize),
        (end_line, end_col): (usize, usize),
        (start_byte, end_byte): (usize, usize),
    ) -> Self {
        Self {
            file,
            start_line,
            start_col,
            end_line,
            end_col,
            start_byte,
            end_byte,
        }
    }

    /// Byte range usable as a miette label.
    pub fn source_span(&self) -> SourceSpan {
        (self.start_byte, self.end_byte.saturating_sub(self.start_byte)).into()
    }
}

/// A span together with the text of the file it points into.
///
/// Every declaration-bound diagnostic is built from one of these so the
/// report can underline the offending class, field, method or decorator.
#[derive(Debug, Clone)]
pub struct SourceLocation {
    pub source: Arc<str>,
    pub span: Span,
}

impl SourceLocation {
    pub fn new(source: Arc<str>, span: Span) -> Self {
        Self { source, span }
    }

    pub fn file(&self) -> &Path {
        &self.span.file
    }

    /// 1-based line number, as shown to users.
    pub fn line(&self) -> usize {
        self.span.start_line + 1
    }

    pub fn named_source(&self) -> NamedSource<Arc<str>> {
        NamedSource::new(self.span.file.display().to_string(), Arc::clone(&self.source))
    }

    pub fn source_span(&self) -> SourceSpan {
        self.span.source_span()
    }
}
