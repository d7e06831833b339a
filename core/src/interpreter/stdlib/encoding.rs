//! Byte encodings: `base64` and `hex`

use super::{bytes_of, ModuleError};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use mlua::{Lua, Table};

pub fn load_base64(lua: &Lua) -> mlua::Result<Table> {
    let module = lua.create_table()?;

    module.set(
        "encode",
        lua.create_function(|_, input: mlua::String| Ok(STANDARD.encode(bytes_of(&input))))?,
    )?;
    module.set(
        "decode",
        lua.create_function(|lua, input: String| {
            let decoded = STANDARD
                .decode(input.trim())
                .map_err(ModuleError::from)?;
            lua.create_string(&decoded)
        })?,
    )?;
    module.set(
        "url_encode",
        lua.create_function(|_, input: mlua::String| {
            Ok(URL_SAFE_NO_PAD.encode(bytes_of(&input)))
        })?,
    )?;
    module.set(
        "url_decode",
        lua.create_function(|lua, input: String| {
            let decoded = URL_SAFE_NO_PAD
                .decode(input.trim().trim_end_matches('='))
                .map_err(ModuleError::from)?;
            lua.create_string(&decoded)
        })?,
    )?;

    Ok(module)
}

pub fn load_hex(lua: &Lua) -> mlua::Result<Table> {
    let module = lua.create_table()?;

    module.set(
        "encode",
        lua.create_function(|_, input: mlua::String| Ok(hex_encode(&bytes_of(&input))))?,
    )?;
    module.set(
        "decode",
        lua.create_function(|lua, input: String| {
            let decoded = hex_decode(input.trim())?;
            lua.create_string(&decoded)
        })?,
    )?;

    Ok(module)
}

pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_decode(text: &str) -> Result<Vec<u8>, ModuleError> {
    if text.len() % 2 != 0 {
        return Err(ModuleError::Hex("odd number of digits".to_string()));
    }
    (0..text.len())
        .step_by(2)
        .map(|i| {
            text.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| ModuleError::Hex(format!("invalid digit pair at offset {i}")))
        })
        .collect()
}
