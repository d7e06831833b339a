//! Configuration
//!
//! Layered, lowest precedence first:
//! 1. Built-in defaults
//! 2. TOML file: `LUABOX_CONFIG_PATH`, else `luabox.toml` in the working
//!    directory if present
//! 3. Environment: `LUABOX_<SECTION>__<KEY>`, e.g.
//!    `LUABOX_EXECUTOR__MAX_CONCURRENCY=4` or `LUABOX_SANDBOX__MODULES=json,hash`
//!
//! A `.env` file is loaded into the environment first.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::interpreter::stdlib::{self, Capability};
use crate::interpreter::SandboxOptions;

pub const ENV_PREFIX: &str = "LUABOX";
pub const CONFIG_PATH_ENV: &str = "LUABOX_CONFIG_PATH";
pub const DEFAULT_CONFIG_FILE: &str = "luabox.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub executor: ExecutorConfig,
    pub sandbox: SandboxConfig,
    pub log: LogConfig,
}

/// Host-side limits applied by the runner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Executions allowed in flight at once.
    pub max_concurrency: usize,

    /// Milliseconds before the runner stops waiting for a script; 0 disables.
    pub timeout_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            timeout_ms: 15_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SandboxConfig {
    pub chunk_name: String,

    /// Capability modules scripts may `require`.
    pub modules: Vec<String>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            chunk_name: "script".to_string(),
            modules: Capability::ALL.iter().map(|c| c.name().to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Load from the default file location and the process environment.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let path = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Some(PathBuf::from(path)),
            Err(_) => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            }
        };

        Self::from_sources(path.as_deref(), environment())
    }

    /// Build from an optional file and an environment source.
    pub fn from_sources(file: Option<&Path>, env: ::config::Environment) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Toml)
                    .required(true),
            );
        }

        let config: Config = builder
            .add_source(env)
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.executor.max_concurrency > 0,
            "executor.max_concurrency must be at least 1"
        );
        ensure!(
            !self.sandbox.chunk_name.is_empty(),
            "sandbox.chunk_name must not be empty"
        );
        stdlib::resolve(&self.sandbox.modules).context("Invalid sandbox.modules")?;
        Ok(())
    }

    /// Sandbox options derived from the `[sandbox]` section.
    pub fn sandbox_options(&self) -> Result<SandboxOptions> {
        Ok(SandboxOptions {
            chunk_name: self.sandbox.chunk_name.clone(),
            capabilities: stdlib::resolve(&self.sandbox.modules)?,
        })
    }

    /// Effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration")
    }
}

/// Environment source using the `LUABOX_` prefix.
pub fn environment() -> ::config::Environment {
    ::config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("sandbox.modules")
        .try_parsing(true)
}
