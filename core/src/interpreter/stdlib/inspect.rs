//! Introspection and output: `spew` and `log`

use crate::interpreter::output::OutputSink;
use crate::interpreter::serializer::render_pretty;
use crate::interpreter::values::from_lua;
use mlua::{Lua, Table, Value};

pub fn load_spew(lua: &Lua) -> mlua::Result<Table> {
    let module = lua.create_table()?;
    module.set(
        "dump",
        lua.create_function(|_, value: Value| Ok(render_pretty(&from_lua(&value)?)))?,
    )?;
    Ok(module)
}

/// `log.write(msg)` appends one entry to the execution's output, next to
/// whatever `print` produced.
pub fn load_log(lua: &Lua, sink: OutputSink) -> mlua::Result<Table> {
    let module = lua.create_table()?;
    module.set(
        "write",
        lua.create_function(move |_, message: String| {
            sink.write(message);
            Ok(())
        })?,
    )?;
    Ok(module)
}
