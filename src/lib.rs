//! # OSW Matrix Runner Library / OSW Matrix Runner 库
//!
//! Regression harness for OpenStudio measures: expands a template workflow
//! over a matrix of building models (or prototype building types) and
//! thermal-bridging options, runs the simulation CLI for each combination in
//! parallel and validates the resulting `out.osw` documents.
//!
//! OpenStudio 度量的回归测试工具：将模板工作流在建筑模型（或原型建筑类型）
//! 与热桥选项组成的矩阵上展开，并行为每个组合运行模拟 CLI，并验证生成的 `out.osw` 文档。
//!
//! ## Modules / 模块
//!
//! - `harness` - Configuration, workflow preparation, planning, execution and validation
//! - `infra` - Child-process execution and file system helpers
//! - `reporting` - Console and HTML reports
//! - `cli` - Command-line interface and commands
//!
//! - `harness` - 配置、工作流准备、计划、执行和验证
//! - `infra` - 子进程执行和文件系统辅助功能
//! - `reporting` - 控制台和 HTML 报告
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod harness;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use harness::config;
pub use harness::execution;
pub use harness::models;
pub use harness::planner;
pub use harness::validation;
pub use harness::workflow;

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");

/// Picks the console language: an explicit choice if it is available,
/// otherwise the system locale, matching first the full tag ("zh-CN") and
/// then the language part ("en"), falling back to "en".
pub fn resolve_locale(explicit: Option<&str>) -> String {
    let requested = explicit
        .map(str::to_string)
        .or_else(sys_locale::get_locale)
        .unwrap_or_else(|| "en".to_string());
    let available = rust_i18n::available_locales!();

    if available.contains(&requested.as_str()) {
        return requested;
    }
    requested
        .split('-')
        .next()
        .filter(|lang| available.contains(lang))
        .unwrap_or("en")
        .to_string()
}
