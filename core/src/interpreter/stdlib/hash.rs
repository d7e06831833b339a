//! Digests, returned as lowercase hex

use super::bytes_of;
use mlua::{Lua, Table};
use sha2::{Digest, Sha256, Sha512};

pub fn load(lua: &Lua) -> mlua::Result<Table> {
    let module = lua.create_table()?;

    module.set(
        "md5",
        lua.create_function(|_, input: mlua::String| {
            Ok(format!("{:x}", md5::compute(bytes_of(&input))))
        })?,
    )?;
    module.set(
        "sha256",
        lua.create_function(|_, input: mlua::String| {
            let mut hasher = Sha256::new();
            hasher.update(bytes_of(&input));
            Ok(format!("{:x}", hasher.finalize()))
        })?,
    )?;
    module.set(
        "sha512",
        lua.create_function(|_, input: mlua::String| {
            let mut hasher = Sha512::new();
            hasher.update(bytes_of(&input));
            Ok(format!("{:x}", hasher.finalize()))
        })?,
    )?;

    Ok(module)
}
