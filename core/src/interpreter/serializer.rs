//! Display rendering of runtime values
//!
//! `render` produces the one-line form used for execution results;
//! `render_pretty` produces the indented dump behind the `spew` module.

use super::values::{Composite, Val};

/* ===================== Result Rendering ===================== */

/// Render a value as a single line.
///
/// Composites list their array part first (values only, in index order) and
/// then their map part as `key = value`, all inside braces.
pub fn render(value: &Val) -> String {
    match value {
        Val::Nil => "nil".to_string(),
        Val::Bool(b) => b.to_string(),
        Val::Int(i) => i.to_string(),
        Val::Num(n) => format_number(*n),
        Val::Str(s) => s.clone(),
        Val::Opaque(text) => text.clone(),
        Val::Composite(c) => render_composite(c),
    }
}

fn render_composite(c: &Composite) -> String {
    let parts: Vec<String> = c
        .array
        .iter()
        .map(render)
        .chain(
            c.map
                .iter()
                .map(|(k, v)| format!("{} = {}", render(k), render(v))),
        )
        .collect();
    format!("{{{}}}", parts.join(", "))
}

/* ===================== Pretty Rendering ===================== */

const INDENT: &str = "  ";

/// Render a value as an indented multi-line dump.
///
/// Strings are quoted so that `"1"` and `1` stay distinguishable.
pub fn render_pretty(value: &Val) -> String {
    let mut out = String::new();
    write_pretty(&mut out, value, 0);
    out
}

fn write_pretty(out: &mut String, value: &Val, depth: usize) {
    let Val::Composite(c) = value else {
        out.push_str(&pretty_scalar(value));
        return;
    };

    if c.is_empty() {
        out.push_str("{}");
        return;
    }

    out.push_str("{\n");
    for item in &c.array {
        out.push_str(&INDENT.repeat(depth + 1));
        write_pretty(out, item, depth + 1);
        out.push_str(",\n");
    }
    for (key, item) in &c.map {
        out.push_str(&INDENT.repeat(depth + 1));
        out.push_str(&pretty_key(key));
        out.push_str(" = ");
        write_pretty(out, item, depth + 1);
        out.push_str(",\n");
    }
    out.push_str(&INDENT.repeat(depth));
    out.push('}');
}

fn pretty_scalar(value: &Val) -> String {
    match value {
        Val::Str(s) => format!("{s:?}"),
        other => render(other),
    }
}

/// Identifier-like string keys are written bare, everything else bracketed.
fn pretty_key(key: &Val) -> String {
    match key {
        Val::Str(s) if is_identifier(s) => s.clone(),
        other => format!("[{}]", pretty_scalar(other)),
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/* ===================== Number Formatting ===================== */

/// Format a float the way Lua 5.4's `tostring` does: `%.14g`, with `.0`
/// appended when the result would read as an integer.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return if n.is_sign_negative() { "-nan" } else { "nan" }.to_string();
    }
    if n.is_infinite() {
        return if n < 0.0 { "-inf" } else { "inf" }.to_string();
    }

    let mut s = format_g14(n);
    if s.bytes().all(|b| b == b'-' || b.is_ascii_digit()) {
        s.push_str(".0");
    }
    s
}

/// C's `%.14g` for finite values.
fn format_g14(n: f64) -> String {
    const PRECISION: i32 = 14;

    if n == 0.0 {
        return if n.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let sci = format!("{:.*e}", (PRECISION - 1) as usize, n);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    if (-4..PRECISION).contains(&exp) {
        let fixed = format!("{:.*}", (PRECISION - 1 - exp) as usize, n);
        trim_fraction(&fixed).to_string()
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
