//! Declarative command trees for shellcomp
//!
//! A tree can be described in YAML or JSON instead of Rust code. Providers
//! are limited to what a static file can express: value lists, directory
//! hints and extension filters.

use crate::command_tree::{Command, CommandTree};
use crate::completions::Candidate;
use crate::directive::Directive;
use crate::error::{CompletionError, Result};
use crate::flags::FlagSpec;
use crate::providers::{FirstArgOnly, StaticCandidates};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

fn default_true() -> bool {
    true
}

/// A command in a declarative tree
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CommandSpec {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default = "default_true")]
    pub interspersed: bool,
    #[serde(default)]
    pub min_args: Option<usize>,
    #[serde(default)]
    pub max_args: Option<usize>,
    #[serde(default)]
    pub valid_args: Vec<String>,
    #[serde(default)]
    pub arg_aliases: Vec<ArgAliasSpec>,
    #[serde(default)]
    pub completions: Option<CompletionsSpec>,
    #[serde(default)]
    pub flags: Vec<FlagDef>,
    #[serde(default)]
    pub subcommands: Vec<CommandSpec>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ArgAliasSpec {
    pub alias: String,
    pub canonical: String,
}

/// A static candidate, either `value` / `value<TAB>description` or a map
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ValueSpec {
    Plain(String),
    Described { value: String, description: String },
}

impl ValueSpec {
    fn to_candidate(&self) -> Candidate {
        match self {
            ValueSpec::Plain(line) => Candidate::parse(line),
            ValueSpec::Described { value, description } => {
                Candidate::with_description(value, description)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveName {
    Error,
    NoSpace,
    NoFileComp,
    FilterFileExt,
    FilterDirs,
}

impl From<DirectiveName> for Directive {
    fn from(name: DirectiveName) -> Self {
        match name {
            DirectiveName::Error => Directive::ERROR,
            DirectiveName::NoSpace => Directive::NO_SPACE,
            DirectiveName::NoFileComp => Directive::NO_FILE_COMP,
            DirectiveName::FilterFileExt => Directive::FILTER_FILE_EXT,
            DirectiveName::FilterDirs => Directive::FILTER_DIRS,
        }
    }
}

/// A static provider
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompletionsSpec {
    #[serde(default)]
    pub values: Vec<ValueSpec>,
    #[serde(default = "default_true")]
    pub filter_prefix: bool,
    #[serde(default)]
    pub directive: Vec<DirectiveName>,
    /// Answer for the first positional argument only
    #[serde(default)]
    pub first_arg_only: bool,
}

impl CompletionsSpec {
    fn directive(&self) -> Directive {
        self.directive
            .iter()
            .fold(Directive::DEFAULT, |acc, name| acc | Directive::from(*name))
    }

    fn to_provider(&self) -> StaticCandidates {
        let candidates = self.values.iter().map(ValueSpec::to_candidate).collect();
        if self.filter_prefix {
            StaticCandidates::filtered(candidates, self.directive())
        } else {
            StaticCandidates::unfiltered(candidates, self.directive())
        }
    }
}

/// A flag in a declarative tree
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FlagDef {
    pub long: String,
    #[serde(default)]
    pub short: Option<char>,
    #[serde(default)]
    pub takes_value: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub persistent: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub repeatable: bool,
    #[serde(default)]
    pub dir_hint: Option<String>,
    #[serde(default)]
    pub file_extensions: Vec<String>,
    #[serde(default)]
    pub completions: Option<CompletionsSpec>,
}

impl FlagDef {
    fn into_flag(self) -> FlagSpec {
        let mut flag = FlagSpec::new(self.long);
        if let Some(short) = self.short {
            flag = flag.short(short);
        }
        if self.takes_value {
            flag = flag.takes_value();
        }
        if let Some(description) = self.description {
            flag = flag.description(description);
        }
        if self.persistent {
            flag = flag.persistent();
        }
        if self.hidden {
            flag = flag.hidden();
        }
        if self.repeatable {
            flag = flag.repeatable();
        }
        if let Some(dir) = self.dir_hint {
            flag = flag.dir_hint(dir);
        }
        if !self.file_extensions.is_empty() {
            flag = flag.file_extensions(self.file_extensions);
        }
        if let Some(completions) = &self.completions {
            flag = flag.provider(completions.to_provider());
        }
        flag
    }
}

impl CommandSpec {
    /// Convert into the builder form.
    pub fn into_command(self) -> Command {
        let mut command = Command::new(self.name)
            .interspersed(self.interspersed)
            .args_range(self.min_args, self.max_args)
            .valid_args(self.valid_args);

        for alias in self.aliases {
            command = command.alias(alias);
        }
        if let Some(about) = self.about {
            command = command.about(about);
        }
        if self.hidden {
            command = command.hidden();
        }
        for ArgAliasSpec { alias, canonical } in self.arg_aliases {
            command = command.arg_alias(alias, canonical);
        }
        if let Some(completions) = &self.completions {
            let provider = completions.to_provider();
            command = if completions.first_arg_only {
                command.provider(FirstArgOnly::new(provider))
            } else {
                command.provider(provider)
            };
        }
        for flag in self.flags {
            command = command.flag(flag.into_flag());
        }
        for sub in self.subcommands {
            command = command.subcommand(sub.into_command());
        }
        command
    }
}

/// Build a tree from a YAML document.
pub fn load_yaml(content: &str) -> Result<CommandTree> {
    let spec: CommandSpec = serde_yaml::from_str(content)?;
    CommandTree::new(spec.into_command())
}

/// Build a tree from a JSON document.
pub fn load_json(content: &str) -> Result<CommandTree> {
    let spec: CommandSpec = serde_json::from_str(content)?;
    CommandTree::new(spec.into_command())
}

/// Build a tree from a `.yaml`, `.yml` or `.json` file.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<CommandTree> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading command tree");
    let content = std::fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => load_yaml(&content),
        Some("json") => load_json(&content),
        _ => Err(CompletionError::Spec(format!(
            "unknown spec format for '{}' (expected .yaml, .yml or .json)",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completions::CompletionEngine;
    use std::fs;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
name: deploy
flags:
  - long: env
    short: e
    description: target environment
    persistent: true
    completions:
      values: ["staging", "production"]
      directive: [no_file_comp]
  - long: manifest
    file_extensions: [yaml, yml]
subcommands:
  - name: rollout
    aliases: [ro]
    about: roll out a release
    completions:
      values:
        - "v1\tfirst release"
        - value: v2
          description: second release
      directive: [no_space, no_file_comp]
  - name: color
    valid_args: [red, green]
    arg_aliases:
      - alias: verde
        canonical: green
  - name: exec
    interspersed: false
"#;

    fn words(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_load_yaml() {
        let tree = load_yaml(SAMPLE).unwrap();
        let engine = CompletionEngine::new(&tree);

        let subcommands = engine.resolve(&[], "");
        assert_eq!(subcommands.values(), vec!["rollout", "ro", "color", "exec"]);

        let rollout = engine.resolve(&words(&["ro"]), "v");
        assert_eq!(
            rollout.candidates,
            vec![
                Candidate::with_description("v1", "first release"),
                Candidate::with_description("v2", "second release"),
            ]
        );
        assert_eq!(rollout.directive.bits(), 6);

        let env = engine.resolve(&words(&["rollout", "-e"]), "s");
        assert_eq!(env.values(), vec!["staging"]);

        let manifest = engine.resolve(&words(&["--manifest"]), "");
        assert_eq!(manifest.values(), vec!["yaml", "yml"]);
        assert_eq!(manifest.directive, Directive::FILTER_FILE_EXT);

        let alias = engine.resolve(&words(&["color"]), "v");
        assert_eq!(alias.values(), vec!["verde"]);

        let exec = tree.find(&["exec"]).unwrap();
        assert!(!tree.node(exec).interspersed);
    }

    #[test]
    fn test_load_json() {
        let tree = load_json(r#"{"name": "tool", "subcommands": [{"name": "run", "hidden": true}]}"#).unwrap();
        assert_eq!(tree.name(), "tool");
        assert!(tree.node(tree.find(&["run"]).unwrap()).hidden);
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(load_yaml("name: [unclosed"), Err(CompletionError::Spec(_))));
        assert!(matches!(load_json("{}"), Err(CompletionError::Spec(_))));
        // parses, but the tree is invalid
        assert!(matches!(load_yaml("name: has space"), Err(CompletionError::Tree(_))));
        assert!(matches!(
            load_yaml("name: x\ncompletions:\n  directive: [bogus]"),
            Err(CompletionError::Spec(_))
        ));
    }

    #[test]
    fn test_load_file_by_extension() {
        let dir = tempdir().unwrap();

        let yaml = dir.path().join("deploy.yaml");
        fs::write(&yaml, SAMPLE).unwrap();
        assert_eq!(load_file(&yaml).unwrap().name(), "deploy");

        let json = dir.path().join("tool.json");
        fs::write(&json, r#"{"name": "tool"}"#).unwrap();
        assert_eq!(load_file(&json).unwrap().name(), "tool");

        let toml = dir.path().join("tool.toml");
        fs::write(&toml, "name = 'tool'").unwrap();
        assert!(matches!(load_file(&toml), Err(CompletionError::Spec(_))));

        assert!(matches!(load_file(dir.path().join("missing.yaml")), Err(CompletionError::Io(_))));
    }
}
