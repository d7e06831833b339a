//! Tests for the interpreter
//!
//! Organized by component

mod coordinator_tests;
mod helpers;
mod rewriter_tests;
