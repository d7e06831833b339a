//! Tests for return inference

use crate::interpreter::rewrite;
use std::borrow::Cow;

fn assert_unchanged(script: &str) {
    let out = rewrite(script);
    assert!(
        matches!(out, Cow::Borrowed(_)),
        "expected {script:?} unchanged, got {out:?}"
    );
    assert_eq!(out, script);
}

/* ===================== Rewritten ===================== */

#[test]
fn test_single_expression() {
    assert_eq!(rewrite("2 + 2"), "return 2 + 2");
}

#[test]
fn test_last_line_only() {
    assert_eq!(rewrite("x = 1\nx + 2"), "x = 1\nreturn x + 2");
}

#[test]
fn test_skips_trailing_comment_and_blank_lines() {
    assert_eq!(rewrite("1+1\n-- note\n"), "return 1+1\n-- note\n");
    assert_eq!(rewrite("a()\n\n   \n-- x\n-- y"), "return a()\n\n   \n-- x\n-- y");
}

#[test]
fn test_preserves_indentation() {
    assert_eq!(rewrite("x = 1\n    x"), "x = 1\n    return x");
}

#[test]
fn test_skips_trailing_long_comment() {
    let script = "value\n--[[\nprint('not code')\n]]";
    assert_eq!(rewrite(script), "return value\n--[[\nprint('not code')\n]]");
}

#[test]
fn test_skips_trailing_leveled_long_comment() {
    let script = "value\n--[==[\n]]\nstill comment\n]==]\n";
    assert_eq!(rewrite(script), "return value\n--[==[\n]]\nstill comment\n]==]\n");
}

#[test]
fn test_brackets_in_short_strings_are_ignored() {
    let script = "s = \"[[\"\nlen(s)";
    assert_eq!(rewrite(script), "s = \"[[\"\nreturn len(s)");
}

#[test]
fn test_identifier_with_keyword_prefix() {
    assert_eq!(rewrite("ending"), "return ending");
    assert_eq!(rewrite("repeated"), "return repeated");
    assert_eq!(rewrite("local_value"), "return local_value");
}

/* ===================== Unchanged ===================== */

#[test]
fn test_already_returning() {
    assert_unchanged("return 1");
    assert_unchanged("x = 1\nreturn");
    assert_unchanged("x = 1\n  return x -- done\n\n");
}

#[test]
fn test_statements_are_not_rewritten() {
    for script in [
        "local x = 1",
        "if true then",
        "for i=1,3 do",
        "while x do",
        "repeat",
        "function f() end",
        "end",
        "else",
        "until true",
        "x = 0\nrepeat x = x + 1\nuntil x > 3",
        "elseif y then",
        "do",
        "break",
        "goto continue",
    ] {
        assert_unchanged(script);
    }
}

#[test]
fn test_blank_and_comment_only_scripts() {
    assert_unchanged("");
    assert_unchanged("\n\n  \n");
    assert_unchanged("-- just a note");
    assert_unchanged("-- a\n-- b\n");
    assert_unchanged("--[[\nblock\n]]");
}

#[test]
fn test_line_inside_long_string() {
    assert_unchanged("print([[first\nsecond]])");
    assert_unchanged("t = [==[\nx\n]==]");
}

#[test]
fn test_idempotent() {
    let once = rewrite("a = 2\na * 3").into_owned();
    assert_eq!(rewrite(&once), once);
}
