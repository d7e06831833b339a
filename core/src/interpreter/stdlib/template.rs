//! Field substitution templates
//!
//! Supports the data-access subset of Go's text/template: `{{.}}`,
//! `{{.Name}}`, `{{.Spec.Replicas}}`, and the `{{-` / `-}}` whitespace trim
//! markers. Missing fields render as `<no value>`.

use super::ModuleError;
use crate::interpreter::serializer::render;
use crate::interpreter::values::{from_lua, Val};
use mlua::{Lua, Table, Value};

const NO_VALUE: &str = "<no value>";

pub fn load(lua: &Lua) -> mlua::Result<Table> {
    let module = lua.create_table()?;
    module.set(
        "render",
        lua.create_function(|_, (template, data): (String, Value)| {
            let data = from_lua(&data)?;
            Ok(render_template(&template, &data)?)
        })?,
    )?;
    Ok(module)
}

pub fn render_template(template: &str, data: &Val) -> Result<String, ModuleError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        let close = after_open
            .find("}}")
            .ok_or_else(|| ModuleError::Template("unclosed action".to_string()))?;
        let mut action = &after_open[..close];
        rest = &after_open[close + 2..];

        if let Some(trimmed) = action.strip_prefix("- ") {
            action = trimmed;
            out.truncate(out.trim_end().len());
        }
        let trim_right = action.ends_with(" -");
        if trim_right {
            action = &action[..action.len() - 2];
        }

        out.push_str(&evaluate(action.trim(), data)?);

        if trim_right {
            rest = rest.trim_start();
        }
    }

    out.push_str(rest);
    Ok(out)
}

fn evaluate(action: &str, data: &Val) -> Result<String, ModuleError> {
    if action == "." {
        return Ok(render(data));
    }
    let Some(path) = action.strip_prefix('.') else {
        return Err(ModuleError::Template(format!(
            "unsupported action '{{{{{action}}}}}'"
        )));
    };

    let mut current = data;
    for field in path.split('.') {
        match lookup(current, field) {
            Some(next) => current = next,
            None => return Ok(NO_VALUE.to_string()),
        }
    }
    Ok(render(current))
}

fn lookup<'a>(value: &'a Val, field: &str) -> Option<&'a Val> {
    let Val::Composite(c) = value else {
        return None;
    };
    c.map
        .iter()
        .find(|(k, _)| matches!(k, Val::Str(s) if s == field))
        .map(|(_, v)| v)
}
