//! Capability modules
//!
//! Host libraries scripts can `require`. Each is registered as a loader in
//! `package.preload`, so a module only materializes when a script asks for
//! it. Which modules are available is a deployment choice made by name in
//! the sandbox configuration.

pub mod codec;
pub mod encoding;
pub mod hash;
pub mod inspect;
pub mod kubernetes;
pub mod template;
pub mod time;

use super::output::OutputSink;
use mlua::{Lua, MultiValue, Table};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/* ===================== Capability Identifiers ===================== */

/// A `require`-able host module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Json,
    Yaml,
    Base64,
    Hex,
    Hash,
    Time,
    Template,
    Kubernetes,
    Spew,
    Log,
}

impl Capability {
    pub const ALL: [Capability; 10] = [
        Capability::Json,
        Capability::Yaml,
        Capability::Base64,
        Capability::Hex,
        Capability::Hash,
        Capability::Time,
        Capability::Template,
        Capability::Kubernetes,
        Capability::Spew,
        Capability::Log,
    ];

    /// Name scripts pass to `require`.
    pub fn name(self) -> &'static str {
        match self {
            Capability::Json => "json",
            Capability::Yaml => "yaml",
            Capability::Base64 => "base64",
            Capability::Hex => "hex",
            Capability::Hash => "hash",
            Capability::Time => "time",
            Capability::Template => "template",
            Capability::Kubernetes => "kubernetes",
            Capability::Spew => "spew",
            Capability::Log => "log",
        }
    }

    /// Build the module table.
    fn load(self, lua: &Lua, sink: &OutputSink) -> mlua::Result<Table> {
        match self {
            Capability::Json => codec::load_json(lua),
            Capability::Yaml => codec::load_yaml(lua),
            Capability::Base64 => encoding::load_base64(lua),
            Capability::Hex => encoding::load_hex(lua),
            Capability::Hash => hash::load(lua),
            Capability::Time => time::load(lua),
            Capability::Template => template::load(lua),
            Capability::Kubernetes => kubernetes::load(lua),
            Capability::Spew => inspect::load_spew(lua),
            Capability::Log => inspect::load_log(lua, sink.clone()),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Capability {
    type Err = CapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| CapabilityError::Unknown(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CapabilityError {
    #[error("unknown capability module '{0}'")]
    Unknown(String),
}

/// Resolve configured module names, rejecting unknown ones.
pub fn resolve<S: AsRef<str>>(names: &[S]) -> Result<Vec<Capability>, CapabilityError> {
    let mut resolved = Vec::with_capacity(names.len());
    for name in names {
        let capability: Capability = name.as_ref().parse()?;
        if !resolved.contains(&capability) {
            resolved.push(capability);
        }
    }
    Ok(resolved)
}

/* ===================== Installation ===================== */

/// Register a `package.preload` loader for each capability.
pub fn install(lua: &Lua, capabilities: &[Capability], sink: &OutputSink) -> mlua::Result<()> {
    let package: Table = lua.globals().get("package")?;
    let preload: Table = package.get("preload")?;

    for &capability in capabilities {
        let sink = sink.clone();
        let loader = lua.create_function(move |lua, _: MultiValue| capability.load(lua, &sink))?;
        preload.set(capability.name(), loader)?;
    }

    Ok(())
}

/* ===================== Module Errors ===================== */

/// Failures raised by capability functions.
///
/// They reach the script as Lua errors and, if uncaught, become the
/// execution's error message.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("hex: {0}")]
    Hex(String),

    #[error("time: {0}")]
    Time(String),

    #[error("template: {0}")]
    Template(String),

    #[error("invalid quantity '{0}'")]
    Quantity(String),
}

impl From<ModuleError> for mlua::Error {
    fn from(err: ModuleError) -> Self {
        mlua::Error::external(err)
    }
}

/// Raw bytes of a Lua string, which need not be UTF-8.
pub(crate) fn bytes_of(s: &mlua::String) -> Vec<u8> {
    s.as_bytes().to_vec()
}
