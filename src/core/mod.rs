//! 核心采集流水线
//!
//! 进程树解析 -> 内存采样 -> 按根进程汇总

pub mod aggregate;
pub mod models;
pub mod process_tree;
pub mod sampler;
