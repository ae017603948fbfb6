//! # Reporting Module / 报告模块
//!
//! Console summaries and the optional HTML report.
//!
//! 控制台摘要和可选的 HTML 报告。

pub mod console;
pub mod html;

pub use console::{print_failure_details, print_summary};
pub use html::generate_html_report;
