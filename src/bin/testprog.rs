/*!
 * testprog - completion fixture program
 *
 * Exercises every completion directive through the hidden `__complete`
 * entry point, and prints its own completion scripts with
 * `testprog completion <shell>`.
 */

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, CommandFactory, FromArgMatches, Parser, Subcommand};
use shellcomp::logging::init_logging;
use shellcomp::protocol::{self, CompletionRequest};
use shellcomp::providers::{
    DirectoryFilter, FileExtensionFilter, FirstArgOnly, NoFileCompletion, StaticCandidates,
};
use shellcomp::shell_scripts::{self, ScriptOptions, ShellType};
use shellcomp::{Candidate, Command, CommandTree, Directive};

const COMPLETIONS: [&str; 4] = ["bear\tan animal", "bearpaw\ta dessert", "dog", "unicorn\tmythical"];
const SPECIAL_CHAR_COMPS: [&str; 7] = ["at@", "equal=", "slash/", "colon:", "period.", "comma,", "letter"];
const SPACE_COMPS: [&str; 2] = ["with space", "desc for with space\tDescription for comp with space"];

#[derive(Parser)]
#[command(name = "testprog")]
struct Cli {
    /// test custom comp for flags
    #[arg(long = "customComp")]
    custom_comp: Option<String>,

    /// theme to use (located in /dir/THEMENAME/)
    #[arg(long)]
    theme: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the completion script for a shell
    Completion(CompletionArgs),

    /// completions filtered on prefix
    #[command(subcommand)]
    Prefix(PrefixCommands),

    /// completions NOT filtered on prefix
    #[command(subcommand)]
    Noprefix(NoPrefixCommands),

    /// Directive: fileext
    Fileext(Positionals),

    /// Directive: subdir
    Dir(Positionals),

    /// Directive: subdir
    Subdir(Positionals),

    /// Directive: error
    Error(Positionals),

    /// Wants argument --arg
    Dasharg {
        /// a flag
        #[arg(long)]
        flag: bool,

        args: Vec<String>,
    },

    /// Outputs a thousand completions
    Manycomps(Positionals),

    /// Completions that contain a space
    Space(Positionals),
}

#[derive(Args)]
struct CompletionArgs {
    /// disable completion descriptions
    #[arg(long = "no-descriptions", global = true)]
    no_descriptions: bool,

    // defaults to the shell named by $SHELL
    #[command(subcommand)]
    shell: Option<ShellCommands>,
}

#[derive(Subcommand)]
enum ShellCommands {
    /// Generate the autocompletion script for bash
    Bash,
    /// Generate the autocompletion script for bash, with descriptions
    Bash2,
    /// Generate the autocompletion script for zsh
    Zsh,
    /// Generate the autocompletion script for fish
    Fish,
    /// Generate the autocompletion script for powershell
    Powershell,
}

#[derive(Subcommand)]
enum PrefixCommands {
    /// Directive: no space
    Nospace(Positionals),
    /// Directive: no space, with comp ending with special char @=/:.,
    Nospacechar(Positionals),
    /// Directive: nofilecomp
    Nofile(Positionals),
    /// Directive: nospace and nofilecomp
    Nofilenospace(Positionals),
    /// Directive: default
    Default(Positionals),
}

#[derive(Subcommand)]
enum NoPrefixCommands {
    /// Directive: no space
    Nospace(Positionals),
    /// Directive: nofilecomp
    Nofile(Positionals),
    /// Directive: nospace and nofilecomp
    Nofilenospace(Positionals),
    /// Directive: default
    Default(Positionals),
}

#[derive(Args)]
struct Positionals {
    args: Vec<String>,
}

fn candidates(lines: &[&str]) -> Vec<Candidate> {
    lines.iter().map(|line| Candidate::parse(line)).collect()
}

/// The clap definition. As with cobra, only the root has a `help` subcommand.
fn cli_command() -> clap::Command {
    Cli::command()
        .mut_subcommand("completion", |c| c.disable_help_subcommand(true))
        .mut_subcommand("prefix", |c| c.disable_help_subcommand(true))
        .mut_subcommand("noprefix", |c| c.disable_help_subcommand(true))
}

/// The command tree, derived from the clap definition plus completion providers.
fn build_tree() -> Result<CommandTree> {
    let animals = candidates(&COMPLETIONS);
    let nospace = Directive::NO_SPACE;
    let nofile = Directive::NO_FILE_COMP;

    let mut root = Command::from_clap(&cli_command())
        .with_flag_provider(
            &[],
            "customComp",
            StaticCandidates::unfiltered(
                candidates(&["firstComp\tthe first value", "secondComp\tthe second value", "forthComp"]),
                nofile,
            ),
        )?
        .with_flag_dir_hint(&[], "theme", "dir")?;

    for shell in ShellType::ALL {
        root = root.with_provider(&["completion", shell.name()], NoFileCompletion)?;
    }
    root = root.with_provider(&["completion", "bash2"], NoFileCompletion)?;

    let many: Vec<Candidate> = (0..1000)
        .map(|i| Candidate::with_description(format!("{}-comp", i), format!("This is comp {}", i)))
        .collect();

    let root = root
        .with_provider(&["prefix", "nospace"], StaticCandidates::filtered(animals.clone(), nospace))?
        .with_provider(
            &["prefix", "nospacechar"],
            StaticCandidates::filtered(candidates(&SPECIAL_CHAR_COMPS), nospace),
        )?
        .with_provider(&["prefix", "nofile"], StaticCandidates::filtered(animals.clone(), nofile))?
        .with_provider(
            &["prefix", "nofilenospace"],
            StaticCandidates::filtered(animals.clone(), nofile | nospace),
        )?
        .with_provider(
            &["prefix", "default"],
            StaticCandidates::filtered(animals.clone(), Directive::DEFAULT),
        )?
        .with_provider(&["noprefix", "nospace"], StaticCandidates::unfiltered(animals.clone(), nospace))?
        .with_provider(&["noprefix", "nofile"], StaticCandidates::unfiltered(animals.clone(), nofile))?
        .with_provider(
            &["noprefix", "nofilenospace"],
            StaticCandidates::unfiltered(animals.clone(), nofile | nospace),
        )?
        .with_provider(
            &["noprefix", "default"],
            StaticCandidates::unfiltered(animals.clone(), Directive::DEFAULT),
        )?
        .with_provider(&["fileext"], FileExtensionFilter::new(["yaml", "json"]))?
        .with_provider(&["dir"], DirectoryFilter::current())?
        .with_provider(&["subdir"], DirectoryFilter::below("dir"))?
        .with_provider(&["error"], StaticCandidates::unfiltered(animals, Directive::ERROR))?
        .with_provider(
            &["dasharg"],
            StaticCandidates::unfiltered(candidates(&["--arg\tan arg starting with dashes"]), Directive::DEFAULT),
        )?
        .with_provider(&["manycomps"], StaticCandidates::unfiltered(many, Directive::DEFAULT))?
        .with_provider(
            &["space"],
            FirstArgOnly::new(StaticCandidates::unfiltered(candidates(&SPACE_COMPS), nofile)),
        )?;

    Ok(CommandTree::new(root)?)
}

fn run() -> Result<()> {
    let tree = build_tree().context("failed to build the command tree")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Some(request) = CompletionRequest::from_args(args) {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        protocol::serve(&tree, &request, &mut out).context("failed to write completions")?;
        return Ok(());
    }

    let cli = Cli::from_arg_matches(&cli_command().get_matches()).unwrap_or_else(|e| e.exit());
    match cli.command {
        None => println!("rootCmd called"),
        Some(Commands::Completion(completion)) => {
            let mut descriptions = !completion.no_descriptions;
            let shell = match completion.shell {
                // the legacy bash script never shows descriptions
                Some(ShellCommands::Bash) => {
                    descriptions = false;
                    ShellType::Bash
                }
                Some(ShellCommands::Bash2) => ShellType::Bash,
                Some(ShellCommands::Zsh) => ShellType::Zsh,
                Some(ShellCommands::Fish) => ShellType::Fish,
                Some(ShellCommands::Powershell) => ShellType::PowerShell,
                None => {
                    let login_shell = std::env::var("SHELL").unwrap_or_default();
                    ShellType::detect(&login_shell).with_context(|| {
                        format!("cannot detect a supported shell from SHELL={:?}", login_shell)
                    })?
                }
            };
            let options = ScriptOptions { descriptions };
            let stdout = io::stdout();
            let mut out = stdout.lock();
            shell_scripts::generate(shell, &tree, &options, &mut out)
                .with_context(|| format!("failed to generate the {} script", shell))?;
            out.flush()?;
        }
        Some(Commands::Space(positionals)) => {
            if let Some(first) = positionals.args.first() {
                // a shell that inserts the described candidate passes its value
                let accepted = ["with space", "with space and desc", "desc for with space"];
                if !accepted.contains(&first.as_str()) {
                    bail!("Got wrong arg");
                }
            }
        }
        Some(_) => {}
    }
    Ok(())
}

fn main() -> ExitCode {
    if let Err(e) = init_logging() {
        eprintln!("{}", e);
    }

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
