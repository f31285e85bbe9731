//! Shared helpers: date parsing and external command execution.

pub mod date;
pub mod exec;
