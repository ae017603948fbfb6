//! Subcommands of the CLI.

pub mod init;
pub mod run;
