//! CLI commands for skillbench

pub mod dispatch;
pub mod run;
pub mod suite;
pub mod transcript;
