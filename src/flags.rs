//! Flag declarations and flag-token parsing for shellcomp

use crate::completions::{Candidate, Completions};
use crate::directive::Directive;
use crate::providers::CompletionProvider;
use std::fmt;
use std::sync::Arc;

/// A flag declared on a command node
#[derive(Clone)]
pub struct FlagSpec {
    /// Long name, written `--name` on the command line
    pub long: String,
    /// Optional single-character name, written `-x`
    pub short: Option<char>,
    pub takes_value: bool,
    pub description: Option<String>,
    /// Visible on every descendant of the declaring node
    pub persistent: bool,
    /// Never offered as a flag-name candidate
    pub hidden: bool,
    /// Offered again even after it already appears on the command line
    pub repeatable: bool,
    /// Restrict value completion to directories below this path
    pub dir_hint: Option<String>,
    /// Restrict value completion to files with these extensions
    pub file_extensions: Vec<String>,
    pub provider: Option<Arc<dyn CompletionProvider>>,
}

impl FlagSpec {
    /// A boolean flag with the given long name.
    pub fn new(long: impl Into<String>) -> Self {
        Self {
            long: long.into(),
            short: None,
            takes_value: false,
            description: None,
            persistent: false,
            hidden: false,
            repeatable: false,
            dir_hint: None,
            file_extensions: vec![],
            provider: None,
        }
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn takes_value(mut self) -> Self {
        self.takes_value = true;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    /// Complete values as directories below `dir`. Implies a value.
    pub fn dir_hint(mut self, dir: impl Into<String>) -> Self {
        self.takes_value = true;
        self.dir_hint = Some(dir.into());
        self
    }

    /// Complete values as files with one of `extensions`. Implies a value.
    pub fn file_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.takes_value = true;
        self.file_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a value provider. Implies a value.
    pub fn provider<P: CompletionProvider + 'static>(mut self, provider: P) -> Self {
        self.takes_value = true;
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Complete a value for this flag.
    ///
    /// A provider wins over a directory hint, which wins over an extension
    /// filter. With none of them the shell falls back to file completion.
    pub fn complete_value(&self, args: &[String], to_complete: &str) -> Completions {
        if let Some(provider) = &self.provider {
            return provider.complete(args, to_complete);
        }
        if let Some(dir) = &self.dir_hint {
            // an empty hint means the current directory
            let root = if dir.is_empty() { vec![] } else { vec![Candidate::new(dir)] };
            return Completions::new(root, Directive::FILTER_DIRS);
        }
        if !self.file_extensions.is_empty() {
            let extensions = self.file_extensions.iter().map(Candidate::new).collect();
            return Completions::new(extensions, Directive::FILTER_FILE_EXT);
        }
        Completions::default()
    }
}

impl fmt::Debug for FlagSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagSpec")
            .field("long", &self.long)
            .field("short", &self.short)
            .field("takes_value", &self.takes_value)
            .field("persistent", &self.persistent)
            .field("hidden", &self.hidden)
            .field("repeatable", &self.repeatable)
            .field("dir_hint", &self.dir_hint)
            .field("file_extensions", &self.file_extensions)
            .field("provider", &self.provider.is_some())
            .finish()
    }
}

/// A command-line word recognized as a flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagToken<'a> {
    /// `--name` or `--name=value`
    Long { name: &'a str, value: Option<&'a str> },
    /// `-x`, a cluster like `-xyz`, or `-x=value`
    Short { cluster: &'a str, value: Option<&'a str> },
}

impl<'a> FlagToken<'a> {
    /// Recognize a flag word. `-`, `--` and non-dash words are not flags.
    pub fn parse(word: &'a str) -> Option<Self> {
        if word == "--" {
            return None;
        }
        if let Some(rest) = word.strip_prefix("--") {
            let (name, value) = split_value(rest);
            return Some(FlagToken::Long { name, value });
        }
        let rest = word.strip_prefix('-')?;
        if rest.is_empty() {
            return None;
        }
        let (cluster, value) = split_value(rest);
        Some(FlagToken::Short { cluster, value })
    }
}

fn split_value(rest: &str) -> (&str, Option<&str>) {
    match rest.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (rest, None),
    }
}
