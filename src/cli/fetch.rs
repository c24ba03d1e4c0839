//! # fetch 子命令 CLI 定义
//!
//! 等待已提交的任务并保存结果
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/fetch.rs`

use super::client::ClientArgs;
use clap::Args;
use std::path::PathBuf;

/// fetch 子命令参数
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Task id printed by `run --no-wait`
    pub task_id: String,

    /// Directory for results whose request carries no save path
    #[arg(long, default_value = "data/calcs")]
    pub calc_dir: PathBuf,

    #[command(flatten)]
    pub client: ClientArgs,
}
