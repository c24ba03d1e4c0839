//! # qcpipe - 批量量子化学计算提交工具
//!
//! 把结构文件批量组合成计算请求，提交到 ChemCloud，并把结果保存到确定的路径，
//! 供下一阶段读取。
//!
//! ## 子命令
//! - `run`     - 按 TOML 配置运行一个流水线阶段
//! - `fetch`   - 取回已提交任务的结果
//! - `files`   - 提交原生输入文件目录
//! - `collect` - 汇总已保存的结果
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── pipeline/  (加载、构建、提交、保存)
//!   │     ├── client/    (远程计算服务)
//!   │     ├── batch/     (文件收集与并行处理)
//!   │     ├── parsers/   (JSON / XYZ)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (输出、进度、日志)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod client;
mod commands;
mod error;
mod models;
mod parsers;
mod pipeline;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = utils::logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        utils::output::print_error(&e);
        std::process::exit(1);
    }

    if let Err(e) = commands::run(cli.command) {
        tracing::error!("{}", e);
        utils::output::print_error(&e);
        std::process::exit(1);
    }
}
