//! Library components of the surveillance CLI.

pub mod config;
pub mod logging;
