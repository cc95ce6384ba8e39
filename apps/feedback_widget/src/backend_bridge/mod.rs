//! Worker side: turns queued commands into backend calls.

pub mod commands;
pub mod runtime;
