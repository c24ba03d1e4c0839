//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `pipeline/`, `client/`, `utils/`
//! - 子模块: run, fetch, files, collect

pub mod collect;
pub mod fetch;
pub mod files;
pub mod run;

use crate::cli::Commands;
use crate::error::Result;
use crate::pipeline::SavedOutput;
use crate::utils::output;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Run(args) => run::execute(args),
        Commands::Fetch(args) => fetch::execute(args),
        Commands::Files(args) => files::execute(args),
        Commands::Collect(args) => collect::execute(args),
    }
}

/// 逐条报告已保存的结果并打印汇总
fn report_saved(saved: &[SavedOutput]) {
    let mut failed = 0;
    for s in saved {
        if s.output.success {
            output::print_saved(&s.path);
        } else {
            failed += 1;
            output::print_warning(&format!("Calculation failed, saved to {}", s.path.display()));
        }
    }

    output::print_done(&format!(
        "Saved {} result(s), {} succeeded, {} failed",
        saved.len(),
        saved.len() - failed,
        failed
    ));
}
