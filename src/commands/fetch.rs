//! # fetch 命令实现
//!
//! 等待已提交的任务完成，并把结果保存到各自请求记录的路径。
//!
//! ## 依赖关系
//! - 使用 `cli/fetch.rs` 定义的参数
//! - 使用 `pipeline/submitter.rs`, `pipeline/writer.rs`

use super::report_saved;
use crate::cli::fetch::FetchArgs;
use crate::client::ChemCloudClient;
use crate::error::Result;
use crate::pipeline::{self, FutureOutput};
use crate::utils::{output, progress};

/// 执行 fetch 命令
pub fn execute(args: FetchArgs) -> Result<()> {
    output::print_header(&format!("Fetching task {}", args.task_id));

    let client = ChemCloudClient::new(args.client.settings())?;
    let future = FutureOutput::resume(&client, args.task_id.as_str(), args.client.poll_settings());

    let spinner = progress::create_spinner("Waiting for results...");
    let outputs = future.get();
    spinner.finish_and_clear();

    let saved = pipeline::save_all(outputs?, &args.calc_dir)?;
    report_saved(&saved);

    Ok(())
}
