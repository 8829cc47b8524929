//! Level data: the config schema and the shipped levels

pub mod builtin;
pub mod config;

pub use builtin::BUILTIN_LEVELS;
pub use config::*;
