//! Command-line interface for `sguard`.

pub mod args;
pub mod commands;
pub mod report;
