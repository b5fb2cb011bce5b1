//! Shell completion scripts for shellcomp
//!
//! Each generator emits a script that, once sourced by its shell, calls the
//! program's hidden `__complete` entry point on every completion request and
//! renders the answer according to the returned directive.

mod bash;
mod fish;
mod powershell;
mod zsh;

pub use bash::BashGenerator;
pub use fish::FishGenerator;
pub use powershell::PowerShellGenerator;
pub use zsh::ZshGenerator;

use crate::command_tree::CommandTree;
use crate::directive::Directive;
use crate::error::{CompletionError, Result};
use crate::protocol::{COMPLETE_COMMAND, COMPLETE_NO_DESC_COMMAND};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Supported shell types
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

impl ShellType {
    pub const ALL: [ShellType; 4] = [
        ShellType::Bash,
        ShellType::Zsh,
        ShellType::Fish,
        ShellType::PowerShell,
    ];

    /// The shell a path such as `$SHELL` points at: `/usr/bin/zsh`,
    /// `-bash` for a login shell, `pwsh.exe`.
    pub fn detect(shell_path: &str) -> Option<Self> {
        let program = Path::new(shell_path).file_stem()?.to_str()?;
        program.trim_start_matches('-').to_ascii_lowercase().parse().ok()
    }

    pub fn name(self) -> &'static str {
        match self {
            ShellType::Bash => "bash",
            ShellType::Zsh => "zsh",
            ShellType::Fish => "fish",
            ShellType::PowerShell => "powershell",
        }
    }
}

impl fmt::Display for ShellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShellType {
    type Err = CompletionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bash" => Ok(ShellType::Bash),
            "zsh" => Ok(ShellType::Zsh),
            "fish" => Ok(ShellType::Fish),
            "powershell" | "pwsh" => Ok(ShellType::PowerShell),
            other => Err(CompletionError::UnsupportedShell(other.to_string())),
        }
    }
}

/// Options shared by every generator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptOptions {
    /// Ask the program for descriptions and render them
    pub descriptions: bool,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self { descriptions: true }
    }
}

/// Produces the completion script for one shell
pub trait ScriptGenerator {
    fn shell(&self) -> ShellType;

    fn generate(&self, tree: &CommandTree, options: &ScriptOptions) -> String;
}

/// The generator for `shell`.
pub fn generator_for(shell: ShellType) -> Box<dyn ScriptGenerator> {
    match shell {
        ShellType::Bash => Box::new(BashGenerator),
        ShellType::Zsh => Box::new(ZshGenerator),
        ShellType::Fish => Box::new(FishGenerator),
        ShellType::PowerShell => Box::new(PowerShellGenerator),
    }
}

/// Write the completion script for `shell` to `out`.
pub fn generate<W: Write>(
    shell: ShellType,
    tree: &CommandTree,
    options: &ScriptOptions,
    out: &mut W,
) -> Result<()> {
    debug!(%shell, program = tree.name(), descriptions = options.descriptions, "generating completion script");
    let script = generator_for(shell).generate(tree, options);
    out.write_all(script.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Identifier-safe form of a program name, used for shell function names.
pub(crate) fn function_name(program: &str) -> String {
    program
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Substitute the `{{placeholder}}` variables of a script template.
pub(crate) fn render(template: &str, tree: &CommandTree, options: &ScriptOptions) -> String {
    let marker = if options.descriptions {
        COMPLETE_COMMAND
    } else {
        COMPLETE_NO_DESC_COMMAND
    };

    let vars = [
        ("{{name}}", tree.name().to_string()),
        ("{{fname}}", function_name(tree.name())),
        ("{{marker}}", marker.to_string()),
        ("{{error}}", Directive::ERROR.bits().to_string()),
        ("{{nospace}}", Directive::NO_SPACE.bits().to_string()),
        ("{{nofile}}", Directive::NO_FILE_COMP.bits().to_string()),
        ("{{filterext}}", Directive::FILTER_FILE_EXT.bits().to_string()),
        ("{{filterdirs}}", Directive::FILTER_DIRS.bits().to_string()),
    ];

    let mut script = template.to_string();
    for (placeholder, value) in &vars {
        script = script.replace(placeholder, value);
    }
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_tree::Command;

    fn tree(name: &str) -> CommandTree {
        CommandTree::new(Command::new(name)).unwrap()
    }

    #[test]
    fn test_shell_detection() {
        assert_eq!(ShellType::detect("/bin/bash"), Some(ShellType::Bash));
        assert_eq!(ShellType::detect("/usr/bin/zsh"), Some(ShellType::Zsh));
        assert_eq!(ShellType::detect("/usr/bin/fish"), Some(ShellType::Fish));
        assert_eq!(ShellType::detect("pwsh"), Some(ShellType::PowerShell));
        assert_eq!(ShellType::detect("pwsh.exe"), Some(ShellType::PowerShell));
        assert_eq!(ShellType::detect("-bash"), Some(ShellType::Bash));
        assert_eq!(ShellType::detect("/bin/sh"), None);
        assert_eq!(ShellType::detect("/opt/bashful/bin/tcsh"), None);
        assert_eq!(ShellType::detect(""), None);
    }

    #[test]
    fn test_shell_from_str() {
        for shell in ShellType::ALL {
            assert_eq!(shell.name().parse::<ShellType>().unwrap(), shell);
        }
        assert_eq!("pwsh".parse::<ShellType>().unwrap(), ShellType::PowerShell);

        let err = "tcsh".parse::<ShellType>().unwrap_err();
        assert!(matches!(err, CompletionError::UnsupportedShell(ref s) if s == "tcsh"));
        assert!(err.to_string().contains("bash, zsh, fish, powershell"));
    }

    #[test]
    fn test_function_name() {
        assert_eq!(function_name("testprog"), "testprog");
        assert_eq!(function_name("my-prog.v2:x"), "my_prog_v2_x");
    }

    #[test]
    fn test_every_script_names_program_and_marker() {
        let tree = tree("my-prog");
        for shell in ShellType::ALL {
            let generator = generator_for(shell);
            assert_eq!(generator.shell(), shell);

            let script = generator.generate(&tree, &ScriptOptions::default());
            assert!(!script.contains("{{"), "{} script has unrendered placeholders", shell);
            assert!(script.contains("my-prog"), "{} script lacks program name", shell);
            assert!(script.contains("__my_prog_debug"), "{} script lacks debug helper", shell);
            assert!(script.contains("BASH_COMP_DEBUG_FILE"));
            assert!(script.contains("__complete "), "{} script lacks marker", shell);
            assert!(!script.contains("__completeNoDesc"));

            let bare = generator.generate(&tree, &ScriptOptions { descriptions: false });
            assert!(bare.contains("__completeNoDesc"), "{} script lacks no-desc marker", shell);
        }
    }

    #[test]
    fn test_generate_writes_script() {
        let tree = tree("prog");
        let mut out = Vec::new();
        generate(ShellType::Fish, &tree, &ScriptOptions::default(), &mut out).unwrap();
        let script = String::from_utf8(out).unwrap();
        assert_eq!(script, FishGenerator.generate(&tree, &ScriptOptions::default()));
    }
}
