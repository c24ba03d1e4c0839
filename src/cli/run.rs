//! # run 子命令 CLI 定义
//!
//! 按 TOML 流水线配置提交一个阶段的计算
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/run.rs`

use super::client::ClientArgs;
use clap::Args;
use std::path::PathBuf;

/// run 子命令参数
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Pipeline stage file (TOML)
    pub config: PathBuf,

    /// Override the program named in the stage file
    #[arg(long)]
    pub program: Option<String>,

    /// Override the method named in the stage file
    #[arg(long)]
    pub method: Option<String>,

    /// Override the basis set named in the stage file
    #[arg(long)]
    pub basis: Option<String>,

    /// Override the directory results are written to
    #[arg(long)]
    pub calc_dir: Option<PathBuf>,

    /// Build and list the calculations without submitting them
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Submit and print the task id instead of waiting for results
    #[arg(long, default_value_t = false, conflicts_with = "dry_run")]
    pub no_wait: bool,

    #[command(flatten)]
    pub client: ClientArgs,
}
