//! Skillbench Core Library
//!
//! Drives an external agent through a skill's test suite, parses its event
//! stream, scores accuracy, security and trigger activation, and folds
//! everything into a single benchmark result.

pub mod aggregate;
pub mod cancel;
pub mod config;
pub mod definition;
pub mod error;
pub mod execution;
pub mod logging;
pub mod pricing;
pub mod results;
pub mod retry;
pub mod runner;
pub mod scoring;
pub mod transcript;
