//! # Harness Module / 运行器核心模块
//!
//! Configuration, workflow preparation, run planning, execution and result
//! validation.
//!
//! 配置、工作流准备、运行计划、执行以及结果验证。

pub mod config;
pub mod execution;
pub mod models;
pub mod planner;
pub mod validation;
pub mod workflow;

// Re-exports
pub use config::OswMatrix;
pub use execution::run_combination;
pub use models::CaseReport;
