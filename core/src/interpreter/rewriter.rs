//! REPL-style result inference
//!
//! Rewrites a script so that its trailing expression becomes a `return`,
//! letting `x + 2` on the last line act as the script's value. The rewrite is
//! purely textual and never fails; when the result does not parse, the
//! coordinator falls back to the untouched script.

use std::borrow::Cow;

/// First words that open or close a block, or otherwise introduce a
/// statement that can never be turned into a value expression.
const STATEMENT_KEYWORDS: &[&str] = &[
    "local", "if", "for", "while", "repeat", "function", "do", "goto", "break", "end", "else",
    "elseif", "until",
];

/* ===================== Public API ===================== */

/// Produce the candidate script with an inferred `return`.
///
/// Returns the input unchanged (borrowed) when no line is eligible.
pub fn rewrite(script: &str) -> Cow<'_, str> {
    let lines: Vec<&str> = script.split('\n').collect();
    let starts = line_start_states(&lines);

    let Some(idx) = (0..lines.len())
        .rev()
        .find(|&i| !is_transparent(lines[i], starts[i]))
    else {
        return Cow::Borrowed(script);
    };

    if starts[idx] == LexState::LongString {
        return Cow::Borrowed(script);
    }

    let line = lines[idx];
    let trimmed = line.trim();
    let word = first_word(trimmed);
    if word == "return" || STATEMENT_KEYWORDS.contains(&word) {
        return Cow::Borrowed(script);
    }

    let body = line.trim_start();
    let indent = &line[..line.len() - body.len()];
    let replaced = format!("{indent}return {body}");

    let mut out = String::with_capacity(script.len() + "return ".len());
    for (i, l) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(if i == idx { &replaced } else { l });
    }
    Cow::Owned(out)
}

/* ===================== Line Classification ===================== */

/// Lexical context a line begins in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Code,
    LongString,
    LongComment,
}

/// Blank lines, `--` comments and lines inside a long comment are skipped
/// when looking for the last statement.
fn is_transparent(line: &str, start: LexState) -> bool {
    if start == LexState::LongComment {
        return true;
    }
    let trimmed = line.trim();
    start == LexState::Code && (trimmed.is_empty() || trimmed.starts_with("--"))
}

fn first_word(trimmed: &str) -> &str {
    let end = trimmed
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}

/* ===================== Long Bracket Scanner ===================== */

/// Compute the lexical state at the start of every line.
///
/// Only long brackets (`[[ ]]`, `[==[ ]==]`) span lines in Lua, so the scanner
/// tracks those and skips short strings and line comments just enough to not
/// mistake their contents for brackets.
fn line_start_states(lines: &[&str]) -> Vec<LexState> {
    let mut states = Vec::with_capacity(lines.len());
    let mut state = LexState::Code;
    let mut level = 0usize;

    for line in lines {
        states.push(state);
        let bytes = line.as_bytes();
        let mut i = 0;

        while i < bytes.len() {
            match state {
                LexState::Code => match bytes[i] {
                    b'-' if bytes.get(i + 1) == Some(&b'-') => {
                        if let Some(open) = long_open(bytes, i + 2) {
                            state = LexState::LongComment;
                            level = open;
                            i += 2 + open + 2;
                        } else {
                            break;
                        }
                    }
                    b'[' => {
                        if let Some(open) = long_open(bytes, i) {
                            state = LexState::LongString;
                            level = open;
                            i += open + 2;
                        } else {
                            i += 1;
                        }
                    }
                    quote @ (b'"' | b'\'') => {
                        i += 1;
                        while i < bytes.len() && bytes[i] != quote {
                            i += if bytes[i] == b'\\' { 2 } else { 1 };
                        }
                        i += 1;
                    }
                    _ => i += 1,
                },
                LexState::LongString | LexState::LongComment => {
                    if bytes[i] == b']' && long_close(bytes, i, level) {
                        state = LexState::Code;
                        i += level + 2;
                    } else {
                        i += 1;
                    }
                }
            }
        }
    }

    states
}

/// If a long bracket opens at `i`, return its level (number of `=`).
fn long_open(bytes: &[u8], i: usize) -> Option<usize> {
    if bytes.get(i) != Some(&b'[') {
        return None;
    }
    let level = bytes[i + 1..].iter().take_while(|&&b| b == b'=').count();
    (bytes.get(i + 1 + level) == Some(&b'[')).then_some(level)
}

fn long_close(bytes: &[u8], i: usize, level: usize) -> bool {
    let eq = bytes[i + 1..].iter().take_while(|&&b| b == b'=').count();
    eq == level && bytes.get(i + 1 + level) == Some(&b']')
}
