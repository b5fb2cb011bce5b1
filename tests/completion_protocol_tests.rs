// shellcomp/tests/completion_protocol_tests.rs
// End-to-end tests of the __complete entry point of the testprog fixture

use assert_cmd::Command;
use insta::assert_json_snapshot;
use shellcomp::protocol::decode;

fn testprog() -> Command {
    let mut cmd = Command::cargo_bin("testprog").expect("testprog binary must be built");
    cmd.env_remove("BASH_COMP_DEBUG_FILE");
    cmd
}

/// Run `testprog __complete <args>` and return stdout.
fn complete(args: &[&str]) -> String {
    let output = testprog()
        .arg("__complete")
        .args(args)
        .assert()
        .success()
        .get_output()
        .clone();
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn subcommands_of_prefix() {
    let completions = decode(&complete(&["prefix", ""])).unwrap();
    assert_json_snapshot!(completions, @r###"
    {
      "candidates": [
        {
          "value": "nospace",
          "description": "Directive: no space"
        },
        {
          "value": "nospacechar",
          "description": "Directive: no space, with comp ending with special char @=/:.,"
        },
        {
          "value": "nofile",
          "description": "Directive: nofilecomp"
        },
        {
          "value": "nofilenospace",
          "description": "Directive: nospace and nofilecomp"
        },
        {
          "value": "default",
          "description": "Directive: default"
        }
      ],
      "directive": 4
    }
    "###);
}

#[test]
fn root_flag_names() {
    let completions = decode(&complete(&["-"])).unwrap();
    assert_eq!(completions.values(), vec!["--customComp", "--theme", "--help", "-h"]);
    assert_eq!(completions.directive.bits(), 4);
    assert_json_snapshot!(completions.candidates[..2], @r###"
    [
      {
        "value": "--customComp",
        "description": "test custom comp for flags"
      },
      {
        "value": "--theme",
        "description": "theme to use (located in /dir/THEMENAME/)"
      }
    ]
    "###);
}

#[test]
fn generated_help_is_offered() {
    let root = decode(&complete(&["he"])).unwrap();
    assert_eq!(root.values(), vec!["help"]);

    let flags = decode(&complete(&["prefix", "-"])).unwrap();
    assert_eq!(flags.values(), vec!["--help", "-h"]);
    assert_eq!(flags.directive.bits(), 4);

    testprog().arg("help").assert().success();
    testprog().args(["prefix", "--help"]).assert().success();
}

#[test]
fn root_subcommands_in_registration_order() {
    let completions = decode(&complete(&[""])).unwrap();
    assert_eq!(
        completions.values(),
        vec![
            "completion", "prefix", "noprefix", "fileext", "dir", "subdir", "error", "dasharg",
            "manycomps", "space", "help"
        ]
    );
    assert_eq!(completions.directive.bits(), 4);

    assert_eq!(complete(&["pre"]), "prefix\tcompletions filtered on prefix\n:4\n");
}

#[test]
fn marker_without_words_completes_empty_word() {
    assert_eq!(complete(&[]), complete(&[""]));
}

#[test]
fn prefix_filtered_directives() {
    assert_eq!(complete(&["prefix", "nospace", "b"]), "bear\tan animal\nbearpaw\ta dessert\n:2\n");
    assert_eq!(complete(&["prefix", "nofile", "u"]), "unicorn\tmythical\n:4\n");
    assert_eq!(
        complete(&["prefix", "nofilenospace", "d"]),
        "dog\n:6\n"
    );
    assert_eq!(complete(&["prefix", "default", "x"]), ":0\n");
    assert_eq!(
        complete(&["prefix", "nospacechar", ""]),
        "at@\nequal=\nslash/\ncolon:\nperiod.\ncomma,\nletter\n:2\n"
    );
}

#[test]
fn no_descriptions_marker() {
    let output = testprog()
        .args(["__completeNoDesc", "prefix", "nospace", "b"])
        .assert()
        .success()
        .get_output()
        .clone();
    assert_eq!(String::from_utf8_lossy(&output.stdout), "bear\nbearpaw\n:2\n");
}

#[test]
fn unfiltered_providers_return_everything() {
    let all = "bear\tan animal\nbearpaw\ta dessert\ndog\nunicorn\tmythical\n";
    assert_eq!(complete(&["noprefix", "nospace", "b"]), format!("{}:2\n", all));
    assert_eq!(complete(&["noprefix", "nofile", "zzz"]), format!("{}:4\n", all));
    assert_eq!(complete(&["noprefix", "nofilenospace", ""]), format!("{}:6\n", all));
    assert_eq!(complete(&["noprefix", "default", "d"]), format!("{}:0\n", all));
}

#[test]
fn filter_directives() {
    assert_eq!(complete(&["fileext", ""]), "yaml\njson\n:8\n");
    assert_eq!(complete(&["dir", ""]), ":16\n");
    assert_eq!(complete(&["subdir", ""]), "dir\n:16\n");
}

#[test]
fn flag_values() {
    let custom = "firstComp\tthe first value\nsecondComp\tthe second value\nforthComp\n:4\n";
    assert_eq!(complete(&["--customComp", ""]), custom);
    // inline values come back without the flag part
    assert_eq!(complete(&["--customComp="]), custom);
    assert_eq!(complete(&["--theme", ""]), "dir\n:16\n");
    assert_eq!(complete(&["--theme", "dir", "prefix", "nospace", "d"]), "dog\n:2\n");
}

#[test]
fn error_directive_drops_candidates() {
    assert_eq!(complete(&["error", ""]), ":1\n");
    assert_eq!(complete(&["--unknown=x"]), ":1\n");
}

#[test]
fn dash_arguments_after_double_dash() {
    assert_eq!(complete(&["dasharg", "--", "--a"]), "--arg\tan arg starting with dashes\n:0\n");
    assert_eq!(complete(&["dasharg", "--f"]), "--flag\ta flag\n:4\n");
    assert_eq!(complete(&["dasharg", "--flag", "--f"]), ":4\n");
}

#[test]
fn completion_command() {
    assert_eq!(
        complete(&["completion", ""]),
        "bash\tGenerate the autocompletion script for bash\n\
         bash2\tGenerate the autocompletion script for bash, with descriptions\n\
         zsh\tGenerate the autocompletion script for zsh\n\
         fish\tGenerate the autocompletion script for fish\n\
         powershell\tGenerate the autocompletion script for powershell\n:4\n"
    );
    assert_eq!(complete(&["completion", "bash", ""]), ":4\n");
    assert_eq!(complete(&["completion", "bash2", ""]), ":4\n");
    assert_eq!(
        complete(&["completion", "bash", "--no"]),
        "--no-descriptions\tdisable completion descriptions\n:4\n"
    );
}

#[test]
fn subcommands_match_exactly() {
    // "nosp" is an argument of `prefix`, not the nospace command
    assert_eq!(complete(&["prefix", "nosp", ""]), ":0\n");
}

#[test]
fn many_completions_keep_order() {
    let output = complete(&["manycomps", ""]);
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 1001);
    assert_eq!(lines[0], "0-comp\tThis is comp 0");
    assert_eq!(lines[999], "999-comp\tThis is comp 999");
    assert_eq!(lines[1000], ":0");
}

#[test]
fn space_candidates_first_argument_only() {
    assert_eq!(
        complete(&["space", ""]),
        "with space\ndesc for with space\tDescription for comp with space\n:4\n"
    );
    assert_eq!(complete(&["space", "with space", ""]), ":4\n");
}

#[test]
fn regular_invocations() {
    testprog().assert().success().stdout("rootCmd called\n");
    testprog().args(["space", "with space"]).assert().success();
    testprog().args(["space", "with space and desc"]).assert().success();
    testprog().args(["space", "desc for with space"]).assert().success();

    let output = testprog().args(["space", "wrong"]).assert().failure().get_output().clone();
    assert!(String::from_utf8_lossy(&output.stderr).contains("Got wrong arg"));
}

fn script(args: &[&str]) -> String {
    let output = testprog().args(args).assert().success().get_output().clone();
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn completion_scripts() {
    let cases = [
        ("bash2", "complete -o default -F __start_testprog testprog"),
        ("zsh", "#compdef testprog"),
        ("fish", "complete -c testprog -n '__testprog_prepare_completions'"),
        ("powershell", "Register-ArgumentCompleter -Native -CommandName 'testprog'"),
    ];
    for (shell, expected) in cases {
        let text = script(&["completion", shell]);
        assert!(text.contains(expected), "{} script lacks {:?}", shell, expected);
        assert!(text.contains("__complete "));
        assert!(!text.contains("__completeNoDesc"));

        let bare = script(&["completion", shell, "--no-descriptions"]);
        assert!(bare.contains("__completeNoDesc"), "{} ignores --no-descriptions", shell);
    }

    testprog().args(["completion", "tcsh"]).assert().failure();
}

#[test]
fn legacy_bash_script_has_no_descriptions() {
    let legacy = script(&["completion", "bash"]);
    assert!(legacy.contains("complete -o default -F __start_testprog testprog"));
    assert!(legacy.contains("__completeNoDesc"));
}

#[test]
fn completion_shell_defaults_to_login_shell() {
    let output = testprog()
        .arg("completion")
        .env("SHELL", "/usr/bin/fish")
        .assert()
        .success()
        .get_output()
        .clone();
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("# fish completion for testprog"));

    let output = testprog()
        .arg("completion")
        .env("SHELL", "/bin/sh")
        .assert()
        .failure()
        .get_output()
        .clone();
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot detect a supported shell"));
}
