//! # files 子命令 CLI 定义
//!
//! 把一个目录中的原生输入文件作为单个计算提交
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/files.rs`

use super::client::ClientArgs;
use clap::Args;
use std::path::PathBuf;

/// files 子命令参数
#[derive(Args, Debug)]
pub struct FilesArgs {
    /// Directory containing the native input files
    pub input_dir: PathBuf,

    /// Program that reads the files, e.g. terachem
    #[arg(long)]
    pub program: String,

    /// Command-line argument passed to the program (repeatable)
    #[arg(long = "cmdline-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub cmdline_args: Vec<String>,

    /// Where to save the result object (JSON)
    #[arg(long)]
    pub output: PathBuf,

    /// Also write the returned native output files to this directory
    #[arg(long)]
    pub files_dir: Option<PathBuf>,

    #[command(flatten)]
    pub client: ClientArgs,
}
