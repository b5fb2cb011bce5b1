//! Completion providers for shellcomp
//!
//! A provider is the per-command (or per-flag) callback that proposes
//! candidates for a positional argument or a flag value. It sees the
//! positional arguments already typed and the partial word, and returns
//! candidates plus a directive. Providers are read-only and shared.

use crate::completions::{filter_by_prefix, Candidate, Completions};
use crate::directive::Directive;
use std::fmt;
use std::sync::Arc;

/// Proposes candidates for a positional argument or a flag value
pub trait CompletionProvider: Send + Sync + fmt::Debug {
    fn complete(&self, args: &[String], to_complete: &str) -> Completions;
}

impl<P: CompletionProvider + ?Sized> CompletionProvider for Arc<P> {
    fn complete(&self, args: &[String], to_complete: &str) -> Completions {
        (**self).complete(args, to_complete)
    }
}

/// A fixed candidate list with a fixed directive
#[derive(Debug, Clone)]
pub struct StaticCandidates {
    candidates: Vec<Candidate>,
    directive: Directive,
    filter_prefix: bool,
}

impl StaticCandidates {
    /// Only candidates starting with the partial word are returned.
    pub fn filtered(candidates: Vec<Candidate>, directive: Directive) -> Self {
        Self {
            candidates,
            directive,
            filter_prefix: true,
        }
    }

    /// Every candidate is returned; the shell does the matching.
    pub fn unfiltered(candidates: Vec<Candidate>, directive: Directive) -> Self {
        Self {
            candidates,
            directive,
            filter_prefix: false,
        }
    }
}

impl CompletionProvider for StaticCandidates {
    fn complete(&self, _args: &[String], to_complete: &str) -> Completions {
        let candidates = if self.filter_prefix {
            filter_by_prefix(self.candidates.iter().cloned(), to_complete)
        } else {
            self.candidates.clone()
        };
        Completions::new(candidates, self.directive)
    }
}

/// Directory-only completion, optionally rooted below a subdirectory
#[derive(Debug, Clone, Default)]
pub struct DirectoryFilter {
    root: Option<String>,
}

impl DirectoryFilter {
    pub fn current() -> Self {
        Self { root: None }
    }

    pub fn below(root: impl Into<String>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }
}

impl CompletionProvider for DirectoryFilter {
    fn complete(&self, _args: &[String], _to_complete: &str) -> Completions {
        let candidates = self.root.iter().map(Candidate::new).collect();
        Completions::new(candidates, Directive::FILTER_DIRS)
    }
}

/// File completion limited to the given extensions (no leading dot)
#[derive(Debug, Clone)]
pub struct FileExtensionFilter {
    extensions: Vec<String>,
}

impl FileExtensionFilter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }
}

impl CompletionProvider for FileExtensionFilter {
    fn complete(&self, _args: &[String], _to_complete: &str) -> Completions {
        let candidates = self.extensions.iter().map(Candidate::new).collect();
        Completions::new(candidates, Directive::FILTER_FILE_EXT)
    }
}

/// Always fails: the shell shows nothing and does not fall back to files
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorProvider;

impl CompletionProvider for ErrorProvider {
    fn complete(&self, _args: &[String], _to_complete: &str) -> Completions {
        Completions::error()
    }
}

/// No candidates and no file fallback
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFileCompletion;

impl CompletionProvider for NoFileCompletion {
    fn complete(&self, _args: &[String], _to_complete: &str) -> Completions {
        Completions::empty(Directive::NO_FILE_COMP)
    }
}

/// Delegates for the first positional argument only.
///
/// Later positions get no candidates and no file fallback.
#[derive(Debug, Clone)]
pub struct FirstArgOnly<P> {
    inner: P,
}

impl<P: CompletionProvider> FirstArgOnly<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P: CompletionProvider> CompletionProvider for FirstArgOnly<P> {
    fn complete(&self, args: &[String], to_complete: &str) -> Completions {
        if args.is_empty() {
            self.inner.complete(args, to_complete)
        } else {
            Completions::empty(Directive::NO_FILE_COMP)
        }
    }
}
