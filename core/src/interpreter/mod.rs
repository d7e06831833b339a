//! # Interpreter - REPL-style Lua execution
//!
//! Everything around the Lua state that turns a snippet into a response:
//!
//! - `rewriter`: infers a `return` for the trailing expression
//! - `output`: per-execution capture of printed lines
//! - `values`: host-side value model (`Val`, `Composite`)
//! - `serializer`: renders values for display
//! - `sandbox`: one restricted `mlua::Lua` per attempt
//! - `stdlib`: `require`-able capability modules
//! - `coordinator`: drives a request through all of the above

pub mod coordinator;
pub mod output;
pub mod rewriter;
pub mod sandbox;
pub mod serializer;
pub mod stdlib;
pub mod values;

#[cfg(test)]
mod tests;

// Re-export commonly used items
pub use coordinator::{execute, Coordinator};
pub use output::OutputSink;
pub use rewriter::rewrite;
pub use sandbox::{Sandbox, SandboxOptions};
pub use serializer::{render, render_pretty};
pub use stdlib::Capability;
pub use values::{Composite, Val};
