//! # collect 子命令 CLI 定义
//!
//! 汇总计算目录中已保存的结果
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/collect.rs`

use clap::Args;
use std::path::PathBuf;

/// collect 子命令参数
#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Directory containing saved results
    pub calc_dir: PathBuf,

    /// Glob pattern(s) for result files (comma-separated)
    #[arg(long, default_value = "*.json")]
    pub pattern: String,

    /// Search subdirectories as well
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Write the summary to a CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Number of parallel jobs (0 = all CPUs)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,
}
