//! Isolated interpreter instance
//!
//! A `Sandbox` owns one `mlua::Lua` state for exactly one execution attempt.
//! It is built with:
//! - a restricted standard library (no `io`, no `debug`, a trimmed `os`)
//! - request variables bound as string globals
//! - `print` routed into the attempt's [`OutputSink`]
//! - capability modules registered in `package.preload`

use super::output::OutputSink;
use super::stdlib::{self, Capability};
use super::values::{from_lua, Val};
use mlua::{Function, Lua, LuaOptions, MultiValue, StdLib, Table, Value, Variadic};
use std::collections::HashMap;

/// `os` functions that neither touch the filesystem nor the process.
const OS_ALLOWED: &[&str] = &["time", "clock", "date", "difftime"];

/// Globals removed after the standard library is opened.
const GLOBALS_REMOVED: &[&str] = &["dofile", "loadfile"];

/// How sandboxes are built.
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxOptions {
    /// Chunk name shown in error messages (`[string "script"]:3: ...`).
    pub chunk_name: String,
    pub capabilities: Vec<Capability>,
}

impl Default for SandboxOptions {
    fn default() -> Self {
        Self {
            chunk_name: "script".to_string(),
            capabilities: Capability::ALL.to_vec(),
        }
    }
}

pub struct Sandbox {
    lua: Lua,
    chunk_name: String,
}

impl Sandbox {
    /// Build a fresh instance bound to `sink` and `variables`.
    pub fn new(
        options: &SandboxOptions,
        variables: &HashMap<String, String>,
        sink: OutputSink,
    ) -> mlua::Result<Self> {
        let libs = StdLib::TABLE
            | StdLib::STRING
            | StdLib::MATH
            | StdLib::UTF8
            | StdLib::COROUTINE
            | StdLib::PACKAGE
            | StdLib::OS;
        let lua = Lua::new_with(libs, LuaOptions::default())?;

        restrict_globals(&lua)?;
        install_print(&lua, sink.clone())?;
        stdlib::install(&lua, &options.capabilities, &sink)?;

        let globals = lua.globals();
        for (name, value) in variables {
            globals.set(name.as_str(), value.as_str())?;
        }

        Ok(Self {
            lua,
            chunk_name: options.chunk_name.clone(),
        })
    }

    /// Run `source` and return its first returned value (`Nil` if none).
    pub fn run(&self, source: &str) -> mlua::Result<Val> {
        let returned: MultiValue = self
            .lua
            .load(source)
            .set_name(self.chunk_name.as_str())
            .call(())?;

        match returned.into_iter().next() {
            Some(value) => from_lua(&value),
            None => Ok(Val::Nil),
        }
    }
}

/* ===================== Environment Setup ===================== */

fn restrict_globals(lua: &Lua) -> mlua::Result<()> {
    let globals = lua.globals();

    for name in GLOBALS_REMOVED {
        globals.set(*name, Value::Nil)?;
    }

    let os: Table = globals.get("os")?;
    let restricted = lua.create_table()?;
    for name in OS_ALLOWED {
        restricted.set(*name, os.get::<Value>(*name)?)?;
    }
    globals.set("os", restricted)?;

    // Only preloaded modules are reachable through `require`.
    let package: Table = globals.get("package")?;
    package.set("path", "")?;
    package.set("cpath", "")?;
    package.set("loadlib", Value::Nil)?;

    Ok(())
}

/// Replace `print` with one that records into `sink`, honoring `__tostring`.
fn install_print(lua: &Lua, sink: OutputSink) -> mlua::Result<()> {
    let print = lua.create_function(move |lua, args: Variadic<Value>| {
        let tostring: Function = lua.globals().get("tostring")?;
        let mut parts = Vec::with_capacity(args.len());
        for arg in args.iter() {
            let text: mlua::String = tostring.call(arg.clone())?;
            parts.push(text.to_string_lossy().to_string());
        }
        sink.record(parts);
        Ok(())
    })?;
    lua.globals().set("print", print)
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashmap;

    fn sandbox(sink: &OutputSink) -> Sandbox {
        Sandbox::new(&SandboxOptions::default(), &HashMap::new(), sink.clone()).unwrap()
    }

    #[test]
    fn test_first_returned_value() {
        let sink = OutputSink::new();
        let value = sandbox(&sink).run("return 1, 2").unwrap();
        assert_eq!(value, Val::Int(1));
    }

    #[test]
    fn test_no_return_is_nil() {
        let sink = OutputSink::new();
        assert_eq!(sandbox(&sink).run("local x = 1").unwrap(), Val::Nil);
    }

    #[test]
    fn test_variables_are_string_globals() {
        let sink = OutputSink::new();
        let vars = hashmap! { "count".to_string() => "3".to_string() };
        let sb = Sandbox::new(&SandboxOptions::default(), &vars, sink).unwrap();
        assert_eq!(sb.run("return type(count)").unwrap(), Val::str("string"));
        assert_eq!(sb.run("return tonumber(count) + 1").unwrap(), Val::Int(4));
    }

    #[test]
    fn test_print_uses_tostring() {
        let sink = OutputSink::new();
        sandbox(&sink)
            .run(r#"print(nil, true, 1.5, setmetatable({}, {__tostring = function() return "obj" end}))"#)
            .unwrap();
        assert_eq!(sink.snapshot(), vec!["nil\ttrue\t1.5\tobj"]);
    }

    #[test]
    fn test_dangerous_globals_removed() {
        let sink = OutputSink::new();
        let sb = sandbox(&sink);
        assert_eq!(sb.run("return io").unwrap(), Val::Nil);
        assert_eq!(sb.run("return debug").unwrap(), Val::Nil);
        assert_eq!(sb.run("return dofile").unwrap(), Val::Nil);
        assert_eq!(sb.run("return os.execute").unwrap(), Val::Nil);
        assert_eq!(sb.run("return os.getenv").unwrap(), Val::Nil);
        assert_eq!(sb.run("return type(os.time())").unwrap(), Val::str("number"));
    }

    #[test]
    fn test_require_only_reaches_preloaded_modules() {
        let sink = OutputSink::new();
        let sb = sandbox(&sink);
        assert_eq!(sb.run(r#"return type(require("json"))"#).unwrap(), Val::str("table"));
        assert!(sb.run(r#"require("socket")"#).is_err());
    }

    #[test]
    fn test_disabled_capability_is_not_requirable() {
        let options = SandboxOptions {
            capabilities: vec![Capability::Hash],
            ..SandboxOptions::default()
        };
        let sb = Sandbox::new(&options, &HashMap::new(), OutputSink::new()).unwrap();
        assert!(sb.run(r#"return require("hash").md5("")"#).is_ok());
        assert!(sb.run(r#"return require("json")"#).is_err());
    }

    #[test]
    fn test_errors_name_the_chunk() {
        let sink = OutputSink::new();
        let err = sandbox(&sink).run("error('boom')").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("boom"), "{message}");
        assert!(message.contains("script"), "{message}");
    }
}
