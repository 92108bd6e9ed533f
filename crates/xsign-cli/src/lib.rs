/*
[INPUT]:  Public API exports for the xsign-cli crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod commands;
pub mod config;
pub mod prompt;

pub use config::{CommonArgs, FileSettings, Settings};
