//! # files 命令实现
//!
//! 把目录中的原生输入文件作为一个计算提交，保存结果对象，
//! 并可把返回的原生输出文件写入目录。
//!
//! ## 依赖关系
//! - 使用 `cli/files.rs` 定义的参数
//! - 使用 `pipeline/loader.rs`, `pipeline/submitter.rs`, `pipeline/writer.rs`

use crate::cli::files::FilesArgs;
use crate::client::{ChemCloudClient, SubmitOptions};
use crate::error::{QcpipeError, Result};
use crate::pipeline::{self, loader, writer};
use crate::utils::{output, progress};

/// 执行 files 命令
pub fn execute(args: FilesArgs) -> Result<()> {
    output::print_header(&format!("Native input: {}", args.input_dir.display()));

    let input = loader::file_input_from_directory(&args.input_dir, args.cmdline_args.clone())?;
    output::print_info(&format!(
        "{} file(s), arguments: {}",
        input.files.len(),
        args.cmdline_args.join(" ")
    ));

    let client = ChemCloudClient::new(args.client.settings())?;
    let options = SubmitOptions {
        collect_files: true,
        ..Default::default()
    };

    let spinner = progress::create_spinner("Submitting 1 calculation and waiting on results...");
    let outputs = pipeline::compute(
        &client,
        &args.program,
        &[input.into()],
        &options,
        args.client.poll_settings(),
    );
    spinner.finish_and_clear();

    let prog_output = outputs?
        .into_iter()
        .next()
        .ok_or(QcpipeError::ResultCountMismatch {
            submitted: 1,
            received: 0,
        })?;

    writer::save_output_to(&prog_output, &args.output)?;
    if prog_output.success {
        output::print_saved(&args.output);
    } else {
        output::print_warning(&format!(
            "Calculation failed, saved to {}",
            args.output.display()
        ));
        if let Some(traceback) = &prog_output.traceback {
            eprintln!("{}", traceback);
        }
    }

    if let Some(dir) = &args.files_dir {
        match &prog_output.results {
            Some(results) => {
                let count = writer::save_files(results, dir)?;
                output::print_success(&format!(
                    "Wrote {} native output file(s) to {}",
                    count,
                    dir.display()
                ));
            }
            None => output::print_warning("No output files were returned"),
        }
    }

    output::print_done("Calculation complete");
    Ok(())
}
