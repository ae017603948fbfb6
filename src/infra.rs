//! # Infrastructure Module / 基础设施模块
//!
//! Child-process execution and file system helpers.
//!
//! 子进程执行和文件系统辅助功能。

pub mod command;
pub mod fs;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
