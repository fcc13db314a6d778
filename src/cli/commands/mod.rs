//! CLI command implementations

pub mod cert;
pub mod completions;
pub mod config;
pub mod eval;
pub mod init;
pub mod rpt;
