//! Command-line interface for inspecting snapshot files.

pub mod commands;
