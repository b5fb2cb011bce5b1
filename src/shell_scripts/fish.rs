//! Fish completion script

use super::{render, ScriptGenerator, ScriptOptions, ShellType};
use crate::command_tree::CommandTree;

/// Generates a script for `prog completion fish | source`
#[derive(Debug, Clone, Copy, Default)]
pub struct FishGenerator;

impl ScriptGenerator for FishGenerator {
    fn shell(&self) -> ShellType {
        ShellType::Fish
    }

    fn generate(&self, tree: &CommandTree, options: &ScriptOptions) -> String {
        render(TEMPLATE, tree, options)
    }
}

const TEMPLATE: &str = r###"# fish completion for {{name}}                              -*- shell-script -*-

function __{{fname}}_debug
    set -l file "$BASH_COMP_DEBUG_FILE"
    if test -n "$file"
        echo "$argv" >> $file
    end
end

function __{{fname}}_perform_completion
    __{{fname}}_debug "Starting __{{fname}}_perform_completion"

    # Every word before the cursor, unescaped, and the raw word under it
    set -l tokens (commandline -opc)
    set -l lastArg (string unescape -- (commandline -ct))

    __{{fname}}_debug "tokens: $tokens"
    __{{fname}}_debug "last arg: $lastArg"

    set -l results ($tokens[1] {{marker}} $tokens[2..-1] "$lastArg" 2>/dev/null)
    if test $status -ne 0
        __{{fname}}_debug "Completion program failed"
        return 1
    end

    for line in $results
        echo $line
    end
end

function __{{fname}}_prepare_completions
    __{{fname}}_debug ""
    __{{fname}}_debug "========= starting completion logic =========="

    # Start fresh
    set --erase __{{fname}}_comp_results

    set -l results (__{{fname}}_perform_completion)
    if test $status -ne 0; or test (count $results) -eq 0
        __{{fname}}_debug "No output from the program; disabling completion"
        return 0
    end

    set -l directiveLine $results[-1]
    if not string match -qr -- '^:[0-9]+$' "$directiveLine"
        __{{fname}}_debug "No directive in output; disabling completion"
        return 0
    end
    set -l directive (string sub --start 2 -- $directiveLine)
    set -l comps $results[1..-2]

    __{{fname}}_debug "Completions are: $comps"
    __{{fname}}_debug "Directive is: $directive"

    set -l shellCompDirectiveError {{error}}
    set -l shellCompDirectiveNoSpace {{nospace}}
    set -l shellCompDirectiveNoFileComp {{nofile}}
    set -l shellCompDirectiveFilterFileExt {{filterext}}
    set -l shellCompDirectiveFilterDirs {{filterdirs}}

    set -l compErr (math (math --scale 0 $directive / $shellCompDirectiveError) % 2)
    set -l nospace (math (math --scale 0 $directive / $shellCompDirectiveNoSpace) % 2)
    set -l nofiles (math (math --scale 0 $directive / $shellCompDirectiveNoFileComp) % 2)
    set -l filefilter (math (math --scale 0 $directive / $shellCompDirectiveFilterFileExt) % 2)
    set -l dirfilter (math (math --scale 0 $directive / $shellCompDirectiveFilterDirs) % 2)

    if test $compErr -eq 1
        __{{fname}}_debug "Received error directive; no completions"
        return 0
    end

    set -l token (string unescape -- (commandline -ct))

    # --flag=value: complete the value, then put the flag back in front
    set -l flagPrefix (string match -r -- '^-[^=]*=' "$token")
    set -l valueToken (string replace -r -- '^-[^=]*=' '' "$token")

    if test $filefilter -eq 1
        set -l exts (string join '|' -- $comps)
        __{{fname}}_debug "Filtering files on extensions: $exts"
        for path in $valueToken*
            if test -d "$path"
                set --global --append __{{fname}}_comp_results "$flagPrefix$path/"
            else if string match -qr -- "\.($exts)\$" "$path"
                set --global --append __{{fname}}_comp_results "$flagPrefix$path"
            end
        end
        return 0
    end

    if test $dirfilter -eq 1
        set -l subdir $comps[1]
        if test -n "$subdir"
            __{{fname}}_debug "Listing directories in $subdir"
            pushd "$subdir" 2>/dev/null; or return 0
        end
        for path in $valueToken*/
            set --global --append __{{fname}}_comp_results "$flagPrefix$path"
        end
        if test -n "$subdir"
            popd
        end
        return 0
    end

    set -l prefix (string escape --style=regex -- "$valueToken")

    for comp in $comps
        if test -z "$comp"
            continue
        end
        set -l value (string split -m 1 -- \t "$comp")[1]
        if string match -qr -- "^$prefix" "$value"
            set --global --append __{{fname}}_comp_results "$flagPrefix$comp"
        end
    end

    set -l numComps (count $__{{fname}}_comp_results)
    __{{fname}}_debug "Matching completions: $numComps"

    if test $numComps -eq 1; and test $nospace -ne 0
        # A second, longer candidate makes fish insert the common prefix
        # without a trailing space.
        set -l only (string split -m 1 -- \t "$__{{fname}}_comp_results[1]")[1]
        __{{fname}}_debug "Adding second completion to honour nospace"
        set --global __{{fname}}_comp_results $only $only.
    end

    if test $numComps -eq 0; and test $nofiles -eq 0
        __{{fname}}_debug "Requesting file completion"
        return 1
    end

    return 0
end

# Drop any completions registered earlier: the program answers all of them.
complete -c {{name}} -e

complete -c {{name}} -n '__{{fname}}_prepare_completions' -f -a '$__{{fname}}_comp_results'
"###;
