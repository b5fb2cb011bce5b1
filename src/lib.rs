//! shellcomp - command-line completion engine
//!
//! A program describes its commands once; shellcomp resolves completions for
//! the words typed so far and emits the scripts that wire bash, zsh, fish and
//! PowerShell to the program's hidden `__complete` entry point.
//!
//! Modules:
//! - directive: Rendering hints sent to the shell with each candidate list
//! - command_tree: Commands, aliases and flags, and target resolution
//! - flags: Flag declarations and flag-token parsing
//! - providers: Candidate providers for arguments and flag values
//! - completions: Candidates and the completion resolver
//! - protocol: The `__complete` line protocol
//! - shell_scripts: Completion script generators per shell
//! - spec_loader: Command trees from YAML or JSON
//! - clap_adapter: Command trees from clap definitions
//! - logging: tracing subscriber setup
//! - error: Error types

pub mod directive;
pub mod error;
pub mod flags;
pub mod providers;
pub mod command_tree;
pub mod completions;
pub mod protocol;
pub mod shell_scripts;
pub mod spec_loader;
pub mod clap_adapter;
pub mod logging;

// Re-export key types for convenience
pub use directive::Directive;

pub use error::CompletionError;

pub use flags::{FlagSpec, FlagToken};

pub use providers::{
    CompletionProvider, DirectoryFilter, ErrorProvider, FileExtensionFilter, FirstArgOnly,
    NoFileCompletion, StaticCandidates,
};

pub use command_tree::{Command, CommandNode, CommandTree, NodeId, TargetResolution};

pub use completions::{filter_by_prefix, Candidate, CompletionEngine, Completions};

pub use protocol::{CompletionRequest, COMPLETE_COMMAND, COMPLETE_NO_DESC_COMMAND};

pub use shell_scripts::{ScriptGenerator, ScriptOptions, ShellType};

pub use spec_loader::{load_file, load_json, load_yaml, CommandSpec};
