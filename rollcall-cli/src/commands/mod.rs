//! Subcommand implementations.

pub mod check;
pub mod export;
pub mod scan;
pub mod submit;
pub mod today;
