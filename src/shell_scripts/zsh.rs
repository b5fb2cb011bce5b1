//! Zsh completion script

use super::{render, ScriptGenerator, ScriptOptions, ShellType};
use crate::command_tree::CommandTree;

/// Generates a `#compdef` script, usable from `fpath` or with `source`
#[derive(Debug, Clone, Copy, Default)]
pub struct ZshGenerator;

impl ScriptGenerator for ZshGenerator {
    fn shell(&self) -> ShellType {
        ShellType::Zsh
    }

    fn generate(&self, tree: &CommandTree, options: &ScriptOptions) -> String {
        render(TEMPLATE, tree, options)
    }
}

const TEMPLATE: &str = r###"#compdef {{name}}
compdef _{{fname}} {{name}}

# zsh completion for {{name}}                               -*- shell-script -*-

__{{fname}}_debug()
{
    local file="$BASH_COMP_DEBUG_FILE"
    if [[ -n ${file} ]]; then
        echo "$*" >> "${file}"
    fi
}

_{{fname}}()
{
    local shellCompDirectiveError={{error}}
    local shellCompDirectiveNoSpace={{nospace}}
    local shellCompDirectiveNoFileComp={{nofile}}
    local shellCompDirectiveFilterFileExt={{filterext}}
    local shellCompDirectiveFilterDirs={{filterdirs}}

    local lastParam out directive comp flagPrefix
    local -a args request completions noSpace prefixOpt lines

    __{{fname}}_debug "\n========= starting completion logic =========="
    __{{fname}}_debug "CURRENT: ${CURRENT}, words[*]: ${words[*]}"

    # Complete at the cursor: ignore the words after it, and unquote the rest.
    args=("${(@Q)words[2,CURRENT]}")
    lastParam=${args[-1]}
    __{{fname}}_debug "lastParam: ${lastParam}"

    # --flag=value: the candidates only cover the value part
    if [[ ${lastParam} == -*=* ]]; then
        flagPrefix="${lastParam%%=*}="
        prefixOpt=(-P "${flagPrefix}")
        __{{fname}}_debug "flagPrefix: ${flagPrefix}"
    fi

    request=("${words[1]}" {{marker}} "${args[@]}")
    __{{fname}}_debug "About to call: ${request[*]}"
    out=$("${request[@]}" 2>/dev/null)
    if [ $? -ne 0 ]; then
        __{{fname}}_debug "Completion program failed; disabling completion"
        return 1
    fi

    directive=${out##*:}
    out=${out%:*}
    if [[ ${directive} != <-> ]]; then
        __{{fname}}_debug "No directive in output"
        return 1
    fi
    __{{fname}}_debug "directive: ${directive}"
    __{{fname}}_debug "completions: ${out}"

    if [ $((directive & shellCompDirectiveError)) -ne 0 ]; then
        __{{fname}}_debug "Received error directive; no completions"
        return 1
    fi

    lines=("${(@f)out}")
    local tab="$(printf '\t')"
    for comp in "${lines[@]}"; do
        [[ -z ${comp} ]] && continue
        # _describe splits value and description on ':'
        comp=${comp//:/\\:}
        comp=${comp//$tab/:}
        completions+=("${comp}")
    done

    if [ $((directive & shellCompDirectiveNoSpace)) -ne 0 ]; then
        __{{fname}}_debug "Activating nospace."
        noSpace=(-S '')
    fi

    if [ $((directive & shellCompDirectiveFilterFileExt)) -ne 0 ]; then
        local -a exts
        for comp in "${lines[@]}"; do
            [[ -n ${comp} ]] && exts+=("${comp}")
        done
        local glob="*.(${(j:|:)exts})"
        __{{fname}}_debug "File filtering glob: ${glob}"
        [[ -n ${flagPrefix} ]] && compset -P '*='
        _files -g "${glob}"
    elif [ $((directive & shellCompDirectiveFilterDirs)) -ne 0 ]; then
        local subdir=${lines[1]}
        local result
        if [[ -n ${subdir} ]]; then
            __{{fname}}_debug "Listing directories in ${subdir}"
            pushd "${subdir}" >/dev/null 2>&1 || return 1
        fi
        [[ -n ${flagPrefix} ]] && compset -P '*='
        _files -/
        result=$?
        if [[ -n ${subdir} ]]; then
            popd >/dev/null 2>&1
        fi
        return ${result}
    else
        if [ ${#completions[@]} -gt 0 ] && _describe "completions" completions "${prefixOpt[@]}" "${noSpace[@]}"; then
            __{{fname}}_debug "_describe found some completions"
            return 0
        fi

        if [ $((directive & shellCompDirectiveNoFileComp)) -ne 0 ]; then
            __{{fname}}_debug "No completions and file completion is disabled"
            return 1
        fi

        __{{fname}}_debug "Falling back to file completion"
        [[ -n ${flagPrefix} ]] && compset -P '*='
        _files
    fi
}

# don't run the completion function when being sourced
if [ "$funcstack[1]" = "_{{name}}" ]; then
    _{{fname}} "$@"
fi
"###;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_tree::Command;

    #[test]
    fn test_zsh_script_header() {
        let tree = CommandTree::new(Command::new("my-prog")).unwrap();
        let script = ZshGenerator.generate(&tree, &ScriptOptions::default());
        assert!(script.starts_with("#compdef my-prog\ncompdef _my_prog my-prog\n"));
        assert!(script.contains("if [ \"$funcstack[1]\" = \"_my-prog\" ]; then"));
        assert!(script.contains("noSpace=(-S '')"));
    }

    #[test]
    fn test_zsh_files_complete_the_value_part() {
        let tree = CommandTree::new(Command::new("testprog")).unwrap();
        let script = ZshGenerator.generate(&tree, &ScriptOptions::default());
        // every _files call moves `--flag=` out of the word first
        assert_eq!(script.matches("compset -P '*='\n        _files").count(), 3);
        assert!(!script.contains("_files -/ \"${prefixOpt[@]}\""));
        assert!(script.contains("_describe \"completions\" completions \"${prefixOpt[@]}\""));
    }

    #[test]
    fn test_zsh_empty_list_fallback() {
        let tree = CommandTree::new(Command::new("testprog")).unwrap();
        let script = ZshGenerator.generate(&tree, &ScriptOptions::default());
        let nofile = script
            .find("if [ $((directive & shellCompDirectiveNoFileComp)) -ne 0 ]; then")
            .unwrap();
        let fallback = script.find("        _files\n    fi").unwrap();
        assert!(nofile < fallback);
        // error returns before any candidate or file handling
        let error = script.find("Received error directive; no completions\"\n        return 1").unwrap();
        assert!(error < nofile);
    }
}
