//! Utility modules for the archive builder.

pub mod exec;
pub mod fs;
pub mod text;
