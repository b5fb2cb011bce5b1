//! Building command trees from clap definitions
//!
//! Programs that already describe their interface with clap get a command
//! tree for free; providers and hints that clap cannot express are attached
//! afterwards with the path-addressed setters on [`Command`].

use crate::command_tree::Command;
use crate::completions::Candidate;
use crate::directive::Directive;
use crate::flags::FlagSpec;
use crate::providers::{DirectoryFilter, StaticCandidates};
use clap::{Arg, ArgAction, ValueHint};
use tracing::debug;

impl Command {
    /// Mirror a clap command, its arguments and its subcommands.
    ///
    /// The command is built first, on a copy, so the generated `help`
    /// subcommand and `-h/--help` flags are part of the tree.
    pub fn from_clap(cmd: &clap::Command) -> Command {
        let mut built = cmd.clone();
        built.build();
        mirror(&built)
    }
}

fn mirror(cmd: &clap::Command) -> Command {
    let mut command = Command::new(cmd.get_name());

    for alias in cmd.get_all_aliases() {
        command = command.alias(alias);
    }
    if let Some(about) = cmd.get_about() {
        command = command.about(about.to_string());
    }
    if cmd.is_hide_set() {
        command = command.hidden();
    }

    for arg in cmd.get_arguments() {
        if arg.is_positional() {
            command = with_positional(command, arg);
        } else if let Some(flag) = flag_from_arg(arg) {
            command = command.flag(flag);
        } else {
            debug!(arg = %arg.get_id(), "skipping argument without a long name");
        }
    }

    for sub in cmd.get_subcommands() {
        command = command.subcommand(mirror(sub));
    }
    command
}

fn with_positional(mut command: Command, arg: &Arg) -> Command {
    for value in arg.get_possible_values() {
        if !value.is_hide_set() {
            command = command.valid_arg(value.get_name());
        }
    }
    if arg.is_trailing_var_arg_set() {
        command = command.interspersed(false);
    }
    if matches!(arg.get_value_hint(), ValueHint::DirPath) {
        command = command.provider(DirectoryFilter::current());
    }
    command
}

fn flag_from_arg(arg: &Arg) -> Option<FlagSpec> {
    let mut flag = FlagSpec::new(arg.get_long()?);

    if let Some(short) = arg.get_short() {
        flag = flag.short(short);
    }
    if arg.get_action().takes_values() {
        flag = flag.takes_value();
    }
    if let Some(help) = arg.get_help() {
        flag = flag.description(help.to_string());
    }
    if arg.is_global_set() {
        flag = flag.persistent();
    }
    if arg.is_hide_set() {
        flag = flag.hidden();
    }
    if matches!(arg.get_action(), ArgAction::Append | ArgAction::Count) {
        flag = flag.repeatable();
    }

    let values: Vec<Candidate> = arg
        .get_possible_values()
        .iter()
        .filter(|value| !value.is_hide_set())
        .map(|value| match value.get_help() {
            Some(help) => Candidate::with_description(value.get_name(), help.to_string()),
            None => Candidate::new(value.get_name()),
        })
        .collect();

    if !values.is_empty() {
        flag = flag.provider(StaticCandidates::filtered(values, Directive::NO_FILE_COMP));
    } else if matches!(arg.get_value_hint(), ValueHint::DirPath) {
        flag = flag.provider(DirectoryFilter::current());
    }

    Some(flag)
}

#[cfg(test)]
mod tests {
    use crate::command_tree::{Command, CommandTree};
    use crate::completions::CompletionEngine;
    use crate::directive::Directive;
    use clap::{Arg, ArgAction, ValueHint};

    fn words(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn clap_app() -> clap::Command {
        clap::Command::new("tool")
            .arg(
                Arg::new("verbose")
                    .long("verbose")
                    .short('v')
                    .action(ArgAction::Count)
                    .global(true)
                    .help("more output"),
            )
            .arg(
                Arg::new("format")
                    .long("format")
                    .value_parser(["json", "yaml"])
                    .help("output format"),
            )
            .arg(Arg::new("internal").long("internal").hide(true).action(ArgAction::SetTrue))
            .subcommand(
                clap::Command::new("build")
                    .visible_alias("b")
                    .about("build the project")
                    .arg(Arg::new("out").long("out").value_hint(ValueHint::DirPath))
                    .arg(Arg::new("target").value_parser(["debug", "release"])),
            )
            .subcommand(
                clap::Command::new("exec")
                    .arg(Arg::new("cmd").num_args(1..).trailing_var_arg(true)),
            )
    }

    #[test]
    fn test_structure() {
        let tree = CommandTree::new(Command::from_clap(&clap_app())).unwrap();
        let engine = CompletionEngine::new(&tree);

        let root = engine.resolve(&[], "");
        assert_eq!(root.values(), vec!["build", "b", "exec", "help"]);
        assert_eq!(root.candidates[0].description.as_deref(), Some("build the project"));

        let exec = tree.find(&["exec"]).unwrap();
        assert!(!tree.node(exec).interspersed);
    }

    #[test]
    fn test_flags() {
        let tree = CommandTree::new(Command::from_clap(&clap_app())).unwrap();
        let engine = CompletionEngine::new(&tree);

        let flags = engine.resolve(&[], "--");
        assert_eq!(flags.values(), vec!["--verbose", "--format", "--help"]);

        // global and counted: inherited and offered again
        let inherited = engine.resolve(&words(&["build", "-v"]), "--v");
        assert_eq!(inherited.values(), vec!["--verbose"]);

        let formats = engine.resolve(&words(&["--format"]), "");
        assert_eq!(formats.values(), vec!["json", "yaml"]);
        assert_eq!(formats.directive, Directive::NO_FILE_COMP);

        let out = engine.resolve(&words(&["build", "--out"]), "");
        assert_eq!(out.directive, Directive::FILTER_DIRS);
        assert!(out.candidates.is_empty());
    }

    #[test]
    fn test_generated_help() {
        let tree = CommandTree::new(Command::from_clap(&clap_app())).unwrap();
        let engine = CompletionEngine::new(&tree);

        let help = engine.resolve(&words(&["build"]), "-");
        assert!(help.values().contains(&"--help"));
        assert!(help.values().contains(&"-h"));

        let root = engine.resolve(&[], "he");
        assert_eq!(root.values(), vec!["help"]);
        assert!(root.candidates[0].description.is_some());
    }

    #[test]
    fn test_positional_possible_values() {
        let tree = CommandTree::new(Command::from_clap(&clap_app())).unwrap();
        let result = CompletionEngine::new(&tree).resolve(&words(&["b"]), "r");
        assert_eq!(result.values(), vec!["release"]);
        assert_eq!(result.directive, Directive::NO_FILE_COMP);
    }
}
