//! Structured-data codecs: `json` and `yaml`

use super::ModuleError;
use mlua::{Lua, LuaSerdeExt, SerializeOptions, Table, Value};

/// Decoded `null` becomes `nil` rather than a sentinel userdata.
fn decode_options() -> SerializeOptions {
    SerializeOptions::new()
        .serialize_none_to_null(false)
        .serialize_unit_to_null(false)
}

pub fn load_json(lua: &Lua) -> mlua::Result<Table> {
    let module = lua.create_table()?;

    module.set(
        "parse",
        lua.create_function(|lua, text: String| {
            let value: serde_json::Value =
                serde_json::from_str(&text).map_err(ModuleError::from)?;
            lua.to_value_with(&value, decode_options())
        })?,
    )?;

    module.set(
        "stringify",
        lua.create_function(|lua, value: Value| {
            let value: serde_json::Value = lua.from_value(value)?;
            Ok(serde_json::to_string(&value).map_err(ModuleError::from)?)
        })?,
    )?;

    Ok(module)
}

pub fn load_yaml(lua: &Lua) -> mlua::Result<Table> {
    let module = lua.create_table()?;

    module.set(
        "parse",
        lua.create_function(|lua, text: String| {
            let value: serde_yaml::Value =
                serde_yaml::from_str(&text).map_err(ModuleError::from)?;
            lua.to_value_with(&value, decode_options())
        })?,
    )?;

    module.set(
        "stringify",
        lua.create_function(|lua, value: Value| {
            let value: serde_yaml::Value = lua.from_value(value)?;
            Ok(serde_yaml::to_string(&value).map_err(ModuleError::from)?)
        })?,
    )?;

    Ok(module)
}
