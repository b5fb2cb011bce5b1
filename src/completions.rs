//! Completion resolution for shellcomp
//!
//! Given the words typed so far and the word under the cursor, walks the
//! command tree, decides which context is being completed (flag value, flag
//! name, subcommand or positional argument), asks the right provider and
//! merges the resulting directives.

use crate::command_tree::{CommandTree, NodeId, TargetResolution};
use crate::directive::Directive;
use crate::error::{CompletionError, Result};
use crate::flags::FlagSpec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A single proposed completion
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// The literal text the shell inserts
    pub value: String,
    /// Human-readable annotation, for shells that render one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Candidate {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            description: None,
        }
    }

    pub fn with_description(value: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            description: Some(description.into()),
        }
    }

    /// Build a candidate from the `value<TAB>description` shorthand.
    pub fn parse(line: &str) -> Self {
        match line.split_once('\t') {
            Some((value, description)) => Self::with_description(value, description),
            None => Self::new(line),
        }
    }

    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.value.as_bytes().starts_with(prefix.as_bytes())
    }
}

/// An ordered candidate list plus the directive that goes with it
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completions {
    pub candidates: Vec<Candidate>,
    pub directive: Directive,
}

impl Completions {
    pub fn new(candidates: Vec<Candidate>, directive: Directive) -> Self {
        if directive.is_error() {
            return Self::error();
        }
        Self {
            candidates,
            directive,
        }
    }

    pub fn empty(directive: Directive) -> Self {
        Self::new(vec![], directive)
    }

    /// The error result: no candidates, no fallback.
    pub fn error() -> Self {
        Self {
            candidates: vec![],
            directive: Directive::ERROR,
        }
    }

    pub fn is_error(&self) -> bool {
        self.directive.is_error()
    }

    /// Append another source's results. An error on either side wins and
    /// discards every candidate gathered so far.
    pub fn merge(&mut self, other: Completions) {
        if self.is_error() || other.is_error() {
            *self = Self::error();
            return;
        }
        self.candidates.extend(other.candidates);
        self.directive |= other.directive;
    }

    pub fn values(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.value.as_str()).collect()
    }
}

/// Keep the candidates whose value starts with `prefix`, byte for byte.
pub fn filter_by_prefix<I>(candidates: I, prefix: &str) -> Vec<Candidate>
where
    I: IntoIterator<Item = Candidate>,
{
    candidates
        .into_iter()
        .filter(|c| c.matches_prefix(prefix))
        .collect()
}

/// The completion engine, borrowing an immutable command tree
pub struct CompletionEngine<'a> {
    tree: &'a CommandTree,
}

impl<'a> CompletionEngine<'a> {
    pub fn new(tree: &'a CommandTree) -> Self {
        Self { tree }
    }

    /// Resolve completions, turning resolution failures into the error directive.
    pub fn resolve(&self, words: &[String], to_complete: &str) -> Completions {
        match self.try_resolve(words, to_complete) {
            Ok(completions) => completions,
            Err(err) => {
                warn!("{}", err);
                Completions::error()
            }
        }
    }

    /// Resolve completions for `to_complete`, given the words typed before it
    /// (program name excluded).
    pub fn try_resolve(&self, words: &[String], to_complete: &str) -> Result<Completions> {
        let target = self.tree.resolve_target(words);
        debug!(
            command = %self.tree.path(target.node).join(" "),
            args = ?target.args,
            to_complete,
            "resolved target"
        );

        let completions = if target.flags_frozen {
            // After `--`, or once a non-interspersed command saw an argument,
            // even words starting with '-' are positional.
            self.complete_positional(&target, to_complete)
        } else if let Some(pending) = &target.pending_flag {
            let flag = self.tree.find_flag(target.node, pending).ok_or_else(|| {
                CompletionError::Resolution(format!("unknown flag '--{}'", pending))
            })?;
            debug!(flag = %flag.long, "completing flag value");
            flag.complete_value(&target.args, to_complete)
        } else if to_complete.starts_with('-') && to_complete.contains('=') {
            self.complete_inline_value(&target, to_complete)?
        } else if to_complete.starts_with('-') {
            self.complete_flag_names(&target, to_complete)
        } else {
            self.complete_positional(&target, to_complete)
        };

        debug!(directive = %completions.directive, count = completions.candidates.len(), "completion done");
        Ok(completions)
    }

    /// `--flag=<part>` or `-f=<part>`: candidates are returned without the flag
    /// part, the shell scripts put it back where their word model needs it.
    fn complete_inline_value(&self, target: &TargetResolution, to_complete: &str) -> Result<Completions> {
        let (flag_part, value) = to_complete
            .split_once('=')
            .unwrap_or((to_complete, ""));

        let flag = if let Some(long) = flag_part.strip_prefix("--") {
            self.tree.find_flag(target.node, long)
        } else {
            let mut chars = flag_part[1..].chars();
            match (chars.next(), chars.next()) {
                (Some(short), None) => self.tree.find_short_flag(target.node, short),
                _ => None,
            }
        };

        let flag = flag.ok_or_else(|| {
            CompletionError::Resolution(format!("unknown flag '{}'", flag_part))
        })?;
        if !flag.takes_value {
            return Err(CompletionError::Resolution(format!(
                "flag '--{}' does not take a value",
                flag.long
            )));
        }

        debug!(flag = %flag.long, value, "completing inline flag value");
        Ok(flag.complete_value(&target.args, value))
    }

    fn complete_flag_names(&self, target: &TargetResolution, to_complete: &str) -> Completions {
        let visible = self.tree.visible_flags(target.node);
        let mut candidates = vec![];

        for flag in &visible {
            if flag.hidden {
                continue;
            }
            if !flag.repeatable && target.seen_flags.iter().any(|seen| seen == &flag.long) {
                continue;
            }

            let long = format!("--{}", flag.long);
            if long.starts_with(to_complete) {
                candidates.push(flag_candidate(long, flag));
            }

            if let Some(short) = flag.short {
                let unambiguous = visible.iter().filter(|f| f.short == Some(short)).count() == 1;
                let short = format!("-{}", short);
                if unambiguous && short.starts_with(to_complete) {
                    candidates.push(flag_candidate(short, flag));
                }
            }
        }

        Completions::new(candidates, Directive::NO_FILE_COMP)
    }

    fn complete_positional(&self, target: &TargetResolution, to_complete: &str) -> Completions {
        let node = self.tree.node(target.node);
        let mut completions = Completions::default();

        if target.args.is_empty() {
            completions.merge(self.complete_children(target.node, to_complete));
        }

        if !node.valid_args.is_empty() {
            if target.args.is_empty() {
                completions.candidates.extend(filter_by_prefix(
                    node.valid_args.iter().map(Candidate::new),
                    to_complete,
                ));
                if completions.candidates.is_empty() {
                    completions.candidates.extend(filter_by_prefix(
                        node.arg_aliases.iter().map(|(alias, _)| Candidate::new(alias)),
                        to_complete,
                    ));
                }
            }
            // Declared values are the whole story: the provider is not consulted.
            completions.directive |= Directive::NO_FILE_COMP;
            return completions;
        }

        if let Some(provider) = &node.provider {
            let provided = provider.complete(&target.args, to_complete);
            if provided.is_error() {
                debug!("provider reported an error");
            }
            completions.merge(provided);
        }

        completions
    }

    fn complete_children(&self, id: NodeId, to_complete: &str) -> Completions {
        let mut completions = Completions::default();

        for child in self.tree.children(id) {
            let child = self.tree.node(child);
            if child.hidden {
                continue;
            }
            completions.directive |= Directive::NO_FILE_COMP;

            for name in std::iter::once(&child.name).chain(child.aliases.iter()) {
                if name.starts_with(to_complete) {
                    completions.candidates.push(match &child.about {
                        Some(about) => Candidate::with_description(name, about),
                        None => Candidate::new(name),
                    });
                }
            }
        }

        completions
    }
}

fn flag_candidate(name: String, flag: &FlagSpec) -> Candidate {
    match &flag.description {
        Some(description) => Candidate::with_description(name, description),
        None => Candidate::new(name),
    }
}
