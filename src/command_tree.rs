//! Command tree model for shellcomp
//!
//! Programs describe themselves with the [`Command`] builder. A finished
//! description is validated and flattened into an immutable [`CommandTree`]
//! arena, which the resolver walks to find the node a command line targets.

use crate::error::{CompletionError, Result};
use crate::flags::{FlagSpec, FlagToken};
use crate::providers::CompletionProvider;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Index of a node inside a [`CommandTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Builder describing one command and its subcommands
#[derive(Clone)]
pub struct Command {
    name: String,
    aliases: Vec<String>,
    about: Option<String>,
    hidden: bool,
    interspersed: bool,
    min_args: Option<usize>,
    max_args: Option<usize>,
    flags: Vec<FlagSpec>,
    valid_args: Vec<String>,
    arg_aliases: Vec<(String, String)>,
    provider: Option<Arc<dyn CompletionProvider>>,
    subcommands: Vec<Command>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: vec![],
            about: None,
            hidden: false,
            interspersed: true,
            min_args: None,
            max_args: None,
            flags: vec![],
            valid_args: vec![],
            arg_aliases: vec![],
            provider: None,
            subcommands: vec![],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    /// Excluded from subcommand candidates but still reachable by name.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// When false, flag recognition stops at the first positional argument.
    pub fn interspersed(mut self, interspersed: bool) -> Self {
        self.interspersed = interspersed;
        self
    }

    pub fn args_range(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_args = min;
        self.max_args = max;
        self
    }

    pub fn flag(mut self, flag: FlagSpec) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn subcommand(mut self, command: Command) -> Self {
        self.subcommands.push(command);
        self
    }

    pub fn valid_arg(mut self, value: impl Into<String>) -> Self {
        self.valid_args.push(value.into());
        self
    }

    pub fn valid_args<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_args.extend(values.into_iter().map(Into::into));
        self
    }

    /// Accept `alias` as another spelling of the declared value `canonical`.
    pub fn arg_alias(mut self, alias: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.arg_aliases.push((alias.into(), canonical.into()));
        self
    }

    pub fn provider<P: CompletionProvider + 'static>(mut self, provider: P) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Find the descendant at `path` (names only, root excluded).
    pub fn find_mut(&mut self, path: &[&str]) -> Option<&mut Command> {
        let mut current = self;
        for name in path {
            current = current.subcommands.iter_mut().find(|c| c.name == *name)?;
        }
        Some(current)
    }

    /// Attach a positional provider to the descendant at `path`.
    pub fn with_provider<P: CompletionProvider + 'static>(
        mut self,
        path: &[&str],
        provider: P,
    ) -> Result<Self> {
        let target = self.find_mut(path).ok_or_else(|| missing_command(path))?;
        target.provider = Some(Arc::new(provider));
        Ok(self)
    }

    /// Attach a value provider to flag `--long` declared at `path`.
    pub fn with_flag_provider<P: CompletionProvider + 'static>(
        mut self,
        path: &[&str],
        long: &str,
        provider: P,
    ) -> Result<Self> {
        let flag = self.find_flag_mut(path, long)?;
        flag.takes_value = true;
        flag.provider = Some(Arc::new(provider));
        Ok(self)
    }

    /// Restrict values of flag `--long` declared at `path` to directories below `dir`.
    pub fn with_flag_dir_hint(mut self, path: &[&str], long: &str, dir: &str) -> Result<Self> {
        let flag = self.find_flag_mut(path, long)?;
        flag.takes_value = true;
        flag.dir_hint = Some(dir.to_string());
        Ok(self)
    }

    fn find_flag_mut(&mut self, path: &[&str], long: &str) -> Result<&mut FlagSpec> {
        let target = self.find_mut(path).ok_or_else(|| missing_command(path))?;
        target
            .flags
            .iter_mut()
            .find(|f| f.long == long)
            .ok_or_else(|| CompletionError::Tree(format!("no flag '--{}' at '{}'", long, path.join(" "))))
    }
}

fn missing_command(path: &[&str]) -> CompletionError {
    CompletionError::Tree(format!("no command at path '{}'", path.join(" ")))
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("flags", &self.flags)
            .field("subcommands", &self.subcommands)
            .finish_non_exhaustive()
    }
}

/// A validated node of the command tree
pub struct CommandNode {
    pub name: String,
    pub aliases: Vec<String>,
    pub about: Option<String>,
    pub hidden: bool,
    pub interspersed: bool,
    pub min_args: Option<usize>,
    pub max_args: Option<usize>,
    pub flags: Vec<FlagSpec>,
    pub valid_args: Vec<String>,
    pub arg_aliases: Vec<(String, String)>,
    pub provider: Option<Arc<dyn CompletionProvider>>,
    pub parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl CommandNode {
    /// Map a positional word to its declared value, following argument aliases.
    pub fn canonical_arg<'a>(&'a self, word: &'a str) -> Option<&'a str> {
        if self.valid_args.iter().any(|v| v == word) {
            return Some(word);
        }
        self.arg_aliases
            .iter()
            .find(|(alias, _)| alias == word)
            .map(|(_, canonical)| canonical.as_str())
    }

    pub fn accepts_more_args(&self, given: usize) -> bool {
        self.max_args.map_or(true, |max| given < max)
    }

    fn matches(&self, word: &str) -> bool {
        self.name == word || self.aliases.iter().any(|a| a == word)
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

/// Where a command line lands in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResolution {
    pub node: NodeId,
    /// Number of words consumed up to and including the last subcommand name
    pub consumed: usize,
    /// Positional arguments seen after the target node was reached
    pub args: Vec<String>,
    /// Long names of the flags present on the command line
    pub seen_flags: Vec<String>,
    /// Whether `--` terminated flag recognition
    pub dash_dash: bool,
    /// No word may be read as a flag any more
    pub flags_frozen: bool,
    /// A value-taking flag that is the last word, so the word under the cursor is its value
    pub pending_flag: Option<String>,
}

/// Immutable, validated command tree
#[derive(Debug)]
pub struct CommandTree {
    nodes: Vec<CommandNode>,
}

fn name_pattern() -> &'static Regex {
    static NAME: OnceLock<Regex> = OnceLock::new();
    NAME.get_or_init(|| Regex::new(r"^[^\s\-][^\s]*$").expect("name pattern is valid"))
}

fn flag_pattern() -> &'static Regex {
    static FLAG: OnceLock<Regex> = OnceLock::new();
    FLAG.get_or_init(|| Regex::new(r"^[^\s\-=][^\s=]*$").expect("flag pattern is valid"))
}

impl CommandTree {
    /// Validate `root` and flatten it into a tree.
    pub fn new(root: Command) -> Result<Self> {
        let mut tree = Self { nodes: vec![] };
        tree.insert(root, None)?;
        Ok(tree)
    }

    fn insert(&mut self, command: Command, parent: Option<NodeId>) -> Result<NodeId> {
        validate_command(&command)?;

        let id = NodeId(self.nodes.len());
        let Command {
            name,
            aliases,
            about,
            hidden,
            interspersed,
            min_args,
            max_args,
            flags,
            valid_args,
            arg_aliases,
            provider,
            subcommands,
        } = command;

        self.nodes.push(CommandNode {
            name,
            aliases,
            about,
            hidden,
            interspersed,
            min_args,
            max_args,
            flags,
            valid_args,
            arg_aliases,
            provider,
            parent,
            children: vec![],
        });

        for sub in subcommands {
            let child = self.insert(sub, Some(id))?;
            self.nodes[id.0].children.push(child);
        }
        Ok(id)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The program name.
    pub fn name(&self) -> &str {
        &self.nodes[0].name
    }

    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children in registration order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0].children.iter().copied()
    }

    /// The child named (or aliased) exactly `word`.
    pub fn child_by_word(&self, id: NodeId, word: &str) -> Option<NodeId> {
        self.children(id).find(|child| self.node(*child).matches(word))
    }

    /// Names from the root down to `id`, program name included.
    pub fn path(&self, id: NodeId) -> Vec<&str> {
        let mut path = vec![];
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id);
            path.push(node.name.as_str());
            current = node.parent;
        }
        path.reverse();
        path
    }

    /// Node at a path of names below the root.
    pub fn find(&self, path: &[&str]) -> Option<NodeId> {
        let mut current = self.root();
        for name in path {
            current = self.children(current).find(|c| self.node(*c).name == *name)?;
        }
        Some(current)
    }

    /// The node's own flags, then the persistent flags of its ancestors.
    /// A nearer declaration shadows a farther one with the same long name.
    pub fn visible_flags(&self, id: NodeId) -> Vec<&FlagSpec> {
        let mut visible: Vec<&FlagSpec> = self.node(id).flags.iter().collect();
        let mut current = self.node(id).parent;
        while let Some(ancestor) = current {
            let node = self.node(ancestor);
            for flag in node.flags.iter().filter(|f| f.persistent) {
                if !visible.iter().any(|v| v.long == flag.long) {
                    visible.push(flag);
                }
            }
            current = node.parent;
        }
        visible
    }

    pub fn find_flag(&self, id: NodeId, long: &str) -> Option<&FlagSpec> {
        self.visible_flags(id).into_iter().find(|f| f.long == long)
    }

    pub fn find_short_flag(&self, id: NodeId, short: char) -> Option<&FlagSpec> {
        self.visible_flags(id).into_iter().find(|f| f.short == Some(short))
    }

    /// Walk `words` (program name excluded) to the node they target.
    ///
    /// Only a word that exactly matches a child's name or alias descends, and
    /// only before any positional argument was seen. Flag values are skipped.
    /// Unknown flags are assumed to take no value.
    pub fn resolve_target(&self, words: &[String]) -> TargetResolution {
        let mut target = TargetResolution {
            node: self.root(),
            consumed: 0,
            args: vec![],
            seen_flags: vec![],
            dash_dash: false,
            flags_frozen: false,
            pending_flag: None,
        };

        let mut i = 0;
        while i < words.len() {
            let word = words[i].as_str();
            i += 1;

            if target.flags_frozen {
                target.args.push(word.to_string());
                continue;
            }
            if word == "--" {
                target.dash_dash = true;
                target.flags_frozen = true;
                continue;
            }

            if let Some(token) = FlagToken::parse(word) {
                if let Some(long) = self.flag_needing_value(target.node, token, &mut target.seen_flags) {
                    if i < words.len() {
                        i += 1;
                    } else {
                        target.pending_flag = Some(long);
                    }
                }
                continue;
            }

            if target.args.is_empty() {
                if let Some(child) = self.child_by_word(target.node, word) {
                    target.node = child;
                    target.consumed = i;
                    continue;
                }
            }

            target.args.push(word.to_string());
            if !self.node(target.node).interspersed {
                target.flags_frozen = true;
            }
        }

        target
    }

    /// Record the flags named by `token` and return the long name of the one
    /// whose value is the next word, if any.
    fn flag_needing_value(
        &self,
        id: NodeId,
        token: FlagToken<'_>,
        seen: &mut Vec<String>,
    ) -> Option<String> {
        match token {
            FlagToken::Long { name, value } => {
                let flag = self.find_flag(id, name)?;
                seen.push(flag.long.clone());
                (flag.takes_value && value.is_none()).then(|| flag.long.clone())
            }
            FlagToken::Short { cluster, value } => {
                for (offset, short) in cluster.char_indices() {
                    let flag = self.find_short_flag(id, short)?;
                    seen.push(flag.long.clone());
                    if flag.takes_value {
                        // the rest of the cluster, or an `=value`, is the value
                        let attached = offset + short.len_utf8() < cluster.len();
                        return (!attached && value.is_none()).then(|| flag.long.clone());
                    }
                }
                None
            }
        }
    }
}

fn validate_command(command: &Command) -> Result<()> {
    if !name_pattern().is_match(&command.name) {
        return Err(CompletionError::Tree(format!(
            "invalid command name '{}'",
            command.name
        )));
    }
    for alias in &command.aliases {
        if !name_pattern().is_match(alias) {
            return Err(CompletionError::Tree(format!(
                "invalid alias '{}' for command '{}'",
                alias, command.name
            )));
        }
    }

    let mut sibling_names = HashSet::new();
    for sub in &command.subcommands {
        for name in std::iter::once(&sub.name).chain(sub.aliases.iter()) {
            if !sibling_names.insert(name.as_str()) {
                return Err(CompletionError::Tree(format!(
                    "'{}' is used twice below '{}'",
                    name, command.name
                )));
            }
        }
    }

    let mut longs = HashSet::new();
    let mut shorts = HashSet::new();
    for flag in &command.flags {
        if !flag_pattern().is_match(&flag.long) {
            return Err(CompletionError::Tree(format!(
                "invalid flag name '{}' on '{}'",
                flag.long, command.name
            )));
        }
        if !longs.insert(flag.long.as_str()) {
            return Err(CompletionError::Tree(format!(
                "flag '--{}' declared twice on '{}'",
                flag.long, command.name
            )));
        }
        if let Some(short) = flag.short {
            if short == '-' || short == '=' || short.is_whitespace() {
                return Err(CompletionError::Tree(format!(
                    "invalid short flag '{}' on '{}'",
                    short, command.name
                )));
            }
            if !shorts.insert(short) {
                return Err(CompletionError::Tree(format!(
                    "short flag '-{}' declared twice on '{}'",
                    short, command.name
                )));
            }
        }
    }

    Ok(())
}
