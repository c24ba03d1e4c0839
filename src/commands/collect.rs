//! # collect 命令实现
//!
//! 扫描计算目录中保存的结果，汇总为表格，可选写入 CSV。
//!
//! ## 功能
//! - glob 匹配结果文件，可递归
//! - 并行读取和解析
//! - 终端表格 + CSV 输出
//!
//! ## 依赖关系
//! - 使用 `cli/collect.rs` 定义的参数
//! - 使用 `batch/` 收集和并行处理
//! - 使用 `pipeline/loader.rs` 读取结果

use crate::batch::{BatchRunner, FileCollector, ProcessResult};
use crate::cli::collect::CollectArgs;
use crate::error::{QcpipeError, Result};
use crate::pipeline::loader;
use crate::utils::output;
use std::path::Path;
use tabled::{Table, Tabled};

/// 单个结果文件的摘要
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
    pub file: String,
    pub structure: String,
    pub program: String,
    pub calctype: String,
    pub success: bool,
    /// 最终能量 (Hartree)
    pub energy: Option<f64>,
    pub conformers: usize,
    /// 墙钟时间 (s)
    pub wall_time: Option<f64>,
}

/// 表格行
#[derive(Debug, Clone, Tabled)]
struct SummaryRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Structure")]
    structure: String,
    #[tabled(rename = "Program")]
    program: String,
    #[tabled(rename = "Calc type")]
    calctype: String,
    #[tabled(rename = "OK")]
    success: String,
    #[tabled(rename = "Energy (Eh)")]
    energy: String,
    #[tabled(rename = "Conformers")]
    conformers: String,
    #[tabled(rename = "Wall time (s)")]
    wall_time: String,
}

impl From<&ResultSummary> for SummaryRow {
    fn from(s: &ResultSummary) -> Self {
        SummaryRow {
            file: s.file.clone(),
            structure: s.structure.clone(),
            program: s.program.clone(),
            calctype: s.calctype.clone(),
            success: if s.success { "yes" } else { "no" }.to_string(),
            energy: s.energy.map(|e| format!("{:.8}", e)).unwrap_or_default(),
            conformers: if s.conformers > 0 {
                s.conformers.to_string()
            } else {
                String::new()
            },
            wall_time: s.wall_time.map(|t| format!("{:.1}", t)).unwrap_or_default(),
        }
    }
}

/// 读取一个结果文件并生成摘要
pub fn summarize(path: &Path) -> Result<ResultSummary> {
    let output = loader::load_output(path)?;

    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let structure = output
        .structure()
        .and_then(|s| s.name())
        .unwrap_or("-")
        .to_string();
    let calctype = output
        .input_data
        .calctype()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "files".to_string());

    Ok(ResultSummary {
        file,
        structure,
        program: output.provenance.program.clone().unwrap_or_default(),
        calctype,
        success: output.success,
        energy: output.energy(),
        conformers: output
            .results
            .as_ref()
            .map(|r| r.conformers.len())
            .unwrap_or(0),
        wall_time: output.provenance.wall_time,
    })
}

/// 执行 collect 命令
pub fn execute(args: CollectArgs) -> Result<()> {
    output::print_header("Collecting Saved Results");

    let files = FileCollector::new(&args.calc_dir)
        .with_pattern(&args.pattern)?
        .recursive(args.recursive)
        .collect()?;

    if files.is_empty() {
        output::print_warning(&format!(
            "No result files matching '{}' in {}",
            args.pattern,
            args.calc_dir.display()
        ));
        return Ok(());
    }

    let runner = BatchRunner::new(args.jobs);
    output::print_info(&format!(
        "Reading {} result file(s) with {} worker(s)...",
        files.len(),
        runner.jobs()
    ));

    let batch = runner.run(files, |path| {
        ProcessResult::from_result(path, summarize(path))
    })?;

    for (path, err) in &batch.failures {
        output::print_warning(&format!("Skipped {}: {}", path, err));
    }

    if batch.items.is_empty() {
        output::print_warning("No readable results found.");
        return Ok(());
    }

    let rows: Vec<SummaryRow> = batch.items.iter().map(SummaryRow::from).collect();
    println!("{}", Table::new(&rows));

    if let Some(csv_path) = &args.csv {
        write_csv(&batch.items, csv_path)?;
        output::print_success(&format!("Summary saved to '{}'", csv_path.display()));
    }

    let failed = batch.items.iter().filter(|s| !s.success).count();
    output::print_done(&format!(
        "{} file(s): {} result(s), {} failed calculation(s), {} unreadable",
        batch.total(),
        batch.items.len(),
        failed,
        batch.failures.len()
    ));

    Ok(())
}

/// 保存摘要到 CSV
fn write_csv(summaries: &[ResultSummary], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "file",
        "structure",
        "program",
        "calctype",
        "success",
        "energy_hartree",
        "conformers",
        "wall_time_s",
    ])?;

    for s in summaries {
        wtr.write_record([
            s.file.clone(),
            s.structure.clone(),
            s.program.clone(),
            s.calctype.clone(),
            s.success.to_string(),
            s.energy.map(|e| format!("{:.10}", e)).unwrap_or_default(),
            s.conformers.to_string(),
            s.wall_time.map(|t| t.to_string()).unwrap_or_default(),
        ])?;
    }

    wtr.flush().map_err(|e| QcpipeError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}
