//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `run`: 按流水线配置提交一个阶段的计算
//! - `fetch`: 取回已提交任务的结果
//! - `files`: 提交一个原生输入文件目录
//! - `collect`: 汇总已保存的计算结果
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: client, run, fetch, files, collect

pub mod client;
pub mod collect;
pub mod fetch;
pub mod files;
pub mod run;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// qcpipe - 批量提交量子化学计算
#[derive(Parser, Debug)]
#[command(name = "qcpipe")]
#[command(version)]
#[command(about = "Batch submission of quantum chemistry calculations to ChemCloud", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Silence all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one pipeline stage described by a TOML file
    Run(run::RunArgs),

    /// Wait for a previously submitted task and save its results
    Fetch(fetch::FetchArgs),

    /// Submit a directory of native program input files
    Files(files::FilesArgs),

    /// Summarize saved results in a calculation directory
    Collect(collect::CollectArgs),
}
