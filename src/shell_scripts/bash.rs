//! Bash completion script

use super::{render, ScriptGenerator, ScriptOptions, ShellType};
use crate::command_tree::CommandTree;

/// Generates a script for `source <(prog completion bash)`
#[derive(Debug, Clone, Copy, Default)]
pub struct BashGenerator;

impl ScriptGenerator for BashGenerator {
    fn shell(&self) -> ShellType {
        ShellType::Bash
    }

    fn generate(&self, tree: &CommandTree, options: &ScriptOptions) -> String {
        render(TEMPLATE, tree, options)
    }
}

const TEMPLATE: &str = r###"# bash completion for {{name}}                              -*- shell-script -*-

__{{fname}}_debug()
{
    if [[ -n ${BASH_COMP_DEBUG_FILE-} ]]; then
        echo "$*" >> "${BASH_COMP_DEBUG_FILE}"
    fi
}

# Uses bash-completion when it is loaded, so that '=' and ':' stay inside words.
__{{fname}}_init_completion()
{
    COMPREPLY=()
    if declare -F _get_comp_words_by_ref >/dev/null 2>&1; then
        _get_comp_words_by_ref -n =: cur prev words cword
    else
        words=("${COMP_WORDS[@]}")
        cword=$COMP_CWORD
        cur=${COMP_WORDS[COMP_CWORD]}
        prev=${COMP_WORDS[COMP_CWORD-1]}
    fi
}

__{{fname}}_no_file_fallback()
{
    if [[ $(type -t compopt) == builtin ]]; then
        compopt +o default
    fi
}

# Sets 'out' and 'directive' in the caller.
__{{fname}}_get_completion_results()
{
    local program=${words[0]/#\~/$HOME}
    local -a request
    request=("${program}" {{marker}} "${words[@]:1:cword}")

    __{{fname}}_debug "About to call: ${request[*]}"
    out=$("${request[@]}" 2>/dev/null) || return 1

    directive=${out##*:}
    out=${out%:*}
    if [[ ! ${directive} =~ ^[0-9]+$ ]]; then
        __{{fname}}_debug "No directive in output"
        return 1
    fi
    __{{fname}}_debug "The completion directive is: ${directive}"
    __{{fname}}_debug "The completions are: ${out}"
}

__{{fname}}_filter_file_ext()
{
    local -a exts
    local ext pattern
    while IFS='' read -r ext; do
        [[ -n $ext ]] && exts+=("$ext")
    done <<< "${out}"
    pattern=$(IFS='|'; echo "${exts[*]}")
    __{{fname}}_debug "Filtering files on extensions: ${pattern}"

    if declare -F _filedir >/dev/null 2>&1; then
        _filedir "${pattern}"
        return
    fi

    local restore_extglob
    restore_extglob=$(shopt -p extglob)
    shopt -s extglob
    local IFS=$'\n'
    COMPREPLY=($(compgen -d -- "$cur") $(compgen -f -X "!*.@(${pattern})" -- "$cur"))
    eval "${restore_extglob}"
    if [[ $(type -t compopt) == builtin ]]; then
        compopt -o filenames
    fi
}

__{{fname}}_filter_dirs()
{
    local subdir=${out%%$'\n'*}
    if [[ -n $subdir ]]; then
        __{{fname}}_debug "Listing directories in ${subdir}"
        pushd "${subdir}" >/dev/null 2>&1 || return
    fi

    if declare -F _filedir >/dev/null 2>&1; then
        _filedir -d
    else
        local IFS=$'\n'
        COMPREPLY=($(compgen -d -- "$cur"))
        if [[ $(type -t compopt) == builtin ]]; then
            compopt -o filenames
        fi
    fi

    if [[ -n $subdir ]]; then
        popd >/dev/null 2>&1
    fi
}

__{{fname}}_standard_completions()
{
    local tab=$'\t' line value desc escaped
    local -a values descs
    local longest=0

    while IFS='' read -r line; do
        [[ -z $line ]] && continue
        value=${line%%"$tab"*}
        [[ $value == "$cur"* ]] || continue
        desc=
        if [[ $line == *"$tab"* ]]; then
            desc=${line#*"$tab"}
        fi
        printf -v escaped '%q' "$value"
        values+=("$escaped")
        descs+=("$desc")
        if ((${#escaped} > longest)); then
            longest=${#escaped}
        fi
    done <<< "${out}"

    # descriptions only when listing (COMP_TYPE 63); anything else inserts
    # the reply, which must then be the bare value
    if ((${#values[@]} <= 1)) || [[ ${COMP_TYPE-} != 63 ]]; then
        COMPREPLY=("${values[@]}")
        return
    fi

    local i
    for i in "${!values[@]}"; do
        if [[ -n ${descs[i]} ]]; then
            printf -v line '%-*s  (%s)' "$longest" "${values[i]}" "${descs[i]}"
            COMPREPLY+=("$line")
        else
            COMPREPLY+=("${values[i]}")
        fi
    done
}

__{{fname}}_process_completion_results()
{
    local shellCompDirectiveError={{error}}
    local shellCompDirectiveNoSpace={{nospace}}
    local shellCompDirectiveNoFileComp={{nofile}}
    local shellCompDirectiveFilterFileExt={{filterext}}
    local shellCompDirectiveFilterDirs={{filterdirs}}

    if (((directive & shellCompDirectiveError) != 0)); then
        __{{fname}}_debug "Received error directive; no completions"
        __{{fname}}_no_file_fallback
        return
    fi

    if (((directive & shellCompDirectiveNoSpace) != 0)); then
        if [[ $(type -t compopt) == builtin ]]; then
            compopt -o nospace
        fi
    fi
    if (((directive & shellCompDirectiveNoFileComp) != 0)); then
        __{{fname}}_no_file_fallback
    fi

    if (((directive & shellCompDirectiveFilterFileExt) != 0)); then
        __{{fname}}_filter_file_ext
    elif (((directive & shellCompDirectiveFilterDirs) != 0)); then
        __{{fname}}_filter_dirs
    else
        __{{fname}}_standard_completions
    fi
}

__start_{{fname}}()
{
    local cur prev words cword
    local out directive

    __{{fname}}_init_completion

    __{{fname}}_debug
    __{{fname}}_debug "========= starting completion logic =========="
    __{{fname}}_debug "cur is ${cur}, words[*] is ${words[*]}, #words[@] is ${#words[@]}, cword is ${cword}"

    if ! __{{fname}}_get_completion_results; then
        __{{fname}}_debug "Completion program failed; disabling completion"
        __{{fname}}_no_file_fallback
        return
    fi

    # bash only replaces the part after '=' of a --flag=value word, for
    # candidates and file or directory listings alike
    if [[ ${cur} == -*=* ]]; then
        cur=${cur#*=}
    fi

    __{{fname}}_process_completion_results
}

if [[ $(type -t compopt) = "builtin" ]]; then
    complete -o default -F __start_{{fname}} {{name}}
else
    complete -o default -o nospace -F __start_{{fname}} {{name}}
fi

# ex: ts=4 sw=4 et filetype=sh
"###;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_tree::Command;

    #[test]
    fn test_bash_script_registration() {
        let tree = CommandTree::new(Command::new("testprog")).unwrap();
        let script = BashGenerator.generate(&tree, &ScriptOptions::default());
        assert!(script.contains("complete -o default -F __start_testprog testprog"));
        assert!(script.contains("request=(\"${program}\" __complete \"${words[@]:1:cword}\")"));
        assert!(script.contains("local shellCompDirectiveFilterDirs=16"));
        assert!(script.contains("printf -v escaped '%q'"));
    }

    #[test]
    fn test_bash_value_word_set_before_dispatch() {
        let tree = CommandTree::new(Command::new("testprog")).unwrap();
        let script = BashGenerator.generate(&tree, &ScriptOptions::default());
        let strip = script.find("cur=${cur#*=}").unwrap();
        let dispatch = script.find("    __testprog_process_completion_results\n}").unwrap();
        assert!(strip < dispatch);
        assert_eq!(script.matches("cur=${cur#*=}").count(), 1);
        assert!(script.contains("[[ ${COMP_TYPE-} != 63 ]]"));
    }

    #[test]
    fn test_bash_empty_list_fallback() {
        let tree = CommandTree::new(Command::new("testprog")).unwrap();
        let script = BashGenerator.generate(&tree, &ScriptOptions::default());
        // `-o default` gives file completion for an empty reply; only
        // NoFileComp and Error remove it, NoSpace does not
        assert_eq!(script.matches("__testprog_no_file_fallback\n").count(), 3);
        assert!(script.contains(
            "if (((directive & shellCompDirectiveNoFileComp) != 0)); then\n        __testprog_no_file_fallback"
        ));
        assert!(script.contains(
            "if (((directive & shellCompDirectiveError) != 0)); then\n        __testprog_debug \"Received error directive; no completions\"\n        __testprog_no_file_fallback"
        ));
    }
}
