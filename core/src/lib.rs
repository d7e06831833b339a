pub mod cli;
pub mod config;
pub mod interpreter;
pub mod runner;
pub mod types;

// Re-export main types
pub use types::*;

pub use config::Config;
pub use interpreter::{execute, Coordinator, SandboxOptions};
pub use runner::Runner;
