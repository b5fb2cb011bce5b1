//! PowerShell completion script

use super::{render, ScriptGenerator, ScriptOptions, ShellType};
use crate::command_tree::CommandTree;

/// Generates a native-command argument completer
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerShellGenerator;

impl ScriptGenerator for PowerShellGenerator {
    fn shell(&self) -> ShellType {
        ShellType::PowerShell
    }

    fn generate(&self, tree: &CommandTree, options: &ScriptOptions) -> String {
        render(TEMPLATE, tree, options)
    }
}

const TEMPLATE: &str = r###"# powershell completion for {{name}}                        -*- shell-script -*-

function __{{fname}}_debug {
    if ($env:BASH_COMP_DEBUG_FILE) {
        "$args" | Out-File -Append -FilePath "$env:BASH_COMP_DEBUG_FILE"
    }
}

filter __{{fname}}_escapeStringWithSpecialChars {
    $_ -replace '\s|#|@|\$|;|,|''|\{|\}|\(|\)|"|`|\||<|>|&','`$&'
}

function __{{fname}}_completePaths {
    param(
        [string]$Word,
        [string]$Root = "",
        [string]$Prefix = "",
        [string[]]$Extensions = @(),
        [switch]$DirectoriesOnly
    )

    $Index = $Word.LastIndexOfAny([char[]]@('/', '\'))
    $Parent = if ($Index -ge 0) { $Word.Substring(0, $Index + 1) } else { "" }
    $Leaf = $Word.Substring($Index + 1)
    $SearchDir = if ($Parent) { $Parent } else { "." }
    if ($Root) { $SearchDir = Join-Path $Root $SearchDir }
    $LeafPattern = [WildcardPattern]::Escape($Leaf) + "*"

    Get-ChildItem -LiteralPath $SearchDir -ErrorAction SilentlyContinue |
        Where-Object { $_.Name -like $LeafPattern } |
        Where-Object {
            $_.PSIsContainer -or
            (-not $DirectoriesOnly -and ($Extensions.Count -eq 0 -or $Extensions -contains $_.Extension.TrimStart('.')))
        } |
        ForEach-Object {
            $Path = $Parent + $_.Name
            if ($_.PSIsContainer) { $Path += [System.IO.Path]::DirectorySeparatorChar }
            [System.Management.Automation.CompletionResult]::new($Prefix + ($Path | __{{fname}}_escapeStringWithSpecialChars), $Path, 'ProviderItem', $Path)
        }
}

[scriptblock]${__{{fname}}CompleterBlock} = {
    param(
        $WordToComplete,
        $CommandAst,
        $CursorPosition
    )

    $ShellCompDirectiveError={{error}}
    $ShellCompDirectiveNoSpace={{nospace}}
    $ShellCompDirectiveNoFileComp={{nofile}}
    $ShellCompDirectiveFilterFileExt={{filterext}}
    $ShellCompDirectiveFilterDirs={{filterdirs}}

    __{{fname}}_debug ""
    __{{fname}}_debug "========= starting completion logic =========="
    __{{fname}}_debug "WordToComplete: $WordToComplete Command: $CommandAst CursorPosition: $CursorPosition"

    # Only the words before the cursor count; the one under it is cut at the cursor.
    $Elements = @($CommandAst.CommandElements | Where-Object { $_.Extent.StartOffset -lt $CursorPosition })
    $Program = $Elements[0].Extent.Text
    $Arguments = [System.Collections.Generic.List[string]]::new()
    foreach ($Element in ($Elements | Select-Object -Skip 1)) {
        if ($Element.Extent.EndOffset -gt $CursorPosition) {
            $Arguments.Add($Element.Extent.Text.Substring(0, $CursorPosition - $Element.Extent.StartOffset))
        } elseif ($Element -is [System.Management.Automation.Language.StringConstantExpressionAst]) {
            $Arguments.Add($Element.Value)
        } else {
            $Arguments.Add($Element.Extent.Text)
        }
    }

    $LegacyArgumentPassing = ($PSVersionTable.PSVersion -lt [version]'7.3.0') -or ($PSNativeCommandArgumentPassing -eq 'Legacy')
    if ($Elements.Count -eq 1 -or $Elements[-1].Extent.EndOffset -lt $CursorPosition) {
        # The cursor follows a space: complete an empty word.
        $WordToComplete = ""
        if ($LegacyArgumentPassing) { $Arguments.Add('""') } else { $Arguments.Add("") }
    } else {
        $WordToComplete = $Arguments[$Arguments.Count - 1]
    }

    __{{fname}}_debug "Calling $Program {{marker}} $Arguments"
    try {
        $Out = @(& $Program {{marker}} @Arguments 2>$null)
    } catch {
        __{{fname}}_debug "Completion program failed: $_"
        return ""
    }
    if ($LASTEXITCODE -ne 0 -or $Out.Count -eq 0) {
        __{{fname}}_debug "Completion program failed; disabling completion"
        # An empty string keeps PowerShell from completing paths.
        return ""
    }

    $DirectiveLine = $Out[-1]
    if ($DirectiveLine -notmatch '^:(\d+)$') {
        __{{fname}}_debug "No directive in output; disabling completion"
        return ""
    }
    [int]$Directive = $Matches[1]
    $Out = @($Out | Select-Object -SkipLast 1)
    __{{fname}}_debug "The completion directive is: $Directive"
    __{{fname}}_debug "The completions are: $Out"

    if (($Directive -band $ShellCompDirectiveError) -ne 0) {
        __{{fname}}_debug "Received error directive; no completions"
        return ""
    }

    # --flag=value: the candidates only cover the value part
    $IsEqualFlag = ($WordToComplete -like "-*=*")
    $FlagPrefix = ""
    if ($IsEqualFlag) {
        $Flag, $WordToComplete = $WordToComplete.Split("=", 2)
        $FlagPrefix = $Flag + "="
    }

    if (($Directive -band $ShellCompDirectiveFilterFileExt) -ne 0) {
        $Extensions = @($Out | Where-Object { $_ -ne "" })
        __{{fname}}_debug "Filtering files on extensions: $Extensions"
        return __{{fname}}_completePaths -Word $WordToComplete -Prefix $FlagPrefix -Extensions $Extensions
    }

    if (($Directive -band $ShellCompDirectiveFilterDirs) -ne 0) {
        $Root = if ($Out.Count -gt 0) { $Out[0] } else { "" }
        __{{fname}}_debug "Listing directories in '$Root'"
        return __{{fname}}_completePaths -Word $WordToComplete -Prefix $FlagPrefix -Root $Root -DirectoriesOnly
    }

    $Longest = 0
    [Array]$Values = $Out | Where-Object { $_ -ne "" } | ForEach-Object {
        $Name, $Description = $_.Split("`t", 2)
        if (-not $Description) { $Description = " " }
        @{ Name = "$Name"; Description = "$Description" }
    } | Where-Object { $_.Name -clike ([WildcardPattern]::Escape($WordToComplete) + "*") }

    foreach ($Value in $Values) {
        if ($Longest -lt $Value.Name.Length) { $Longest = $Value.Name.Length }
    }

    if (-not $Values -or $Values.Count -eq 0) {
        if (($Directive -band $ShellCompDirectiveNoFileComp) -ne 0) {
            __{{fname}}_debug "No completions and file completion is disabled"
            return ""
        }
        __{{fname}}_debug "No completions; falling back to path completion"
        return
    }

    $Space = " "
    if (($Directive -band $ShellCompDirectiveNoSpace) -ne 0) {
        __{{fname}}_debug "Activating nospace"
        $Space = ""
    }

    if ($IsEqualFlag) {
        foreach ($Value in $Values) { $Value.Name = $FlagPrefix + $Value.Name }
    }

    $Mode = (Get-PSReadLineKeyHandler -ErrorAction SilentlyContinue | Where-Object { $_.Key -eq "Tab" }).Function
    __{{fname}}_debug "Tab mode: $Mode"

    $Values | ForEach-Object {
        $Comp = $_
        if ($Mode -eq "Complete" -and $Values.Count -gt 1) {
            # bash-like listing: pad names so the descriptions line up
            $Padded = $Comp.Name.PadRight($Longest)
            if ($Comp.Description -eq " ") { $Listed = $Padded } else { $Listed = "$Padded  ($($Comp.Description))" }
            [System.Management.Automation.CompletionResult]::new($Listed, $Listed, 'ParameterValue', $Comp.Description)
        } else {
            $CompletionText = ($Comp.Name | __{{fname}}_escapeStringWithSpecialChars) + $Space
            [System.Management.Automation.CompletionResult]::new($CompletionText, $Comp.Name, 'ParameterValue', $Comp.Description)
        }
    }
}

Register-ArgumentCompleter -Native -CommandName '{{name}}' -ScriptBlock ${__{{fname}}CompleterBlock}
"###;
