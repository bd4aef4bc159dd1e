//! Integration tests for the skillbench CLI
//!
//! These tests run the skillbench binary against fake agent scripts.

mod cli;
mod support;
