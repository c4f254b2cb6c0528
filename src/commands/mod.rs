//! CLI 命令处理模块

pub mod collect;
pub mod output;
pub mod parser;

// Re-exports (used by main.rs)
pub use parser::*;
