//! # run 命令实现
//!
//! 按 TOML 配置运行一个流水线阶段。
//!
//! ## 功能
//! - 加载结构并构建请求
//! - `--dry-run` 只列出请求
//! - 提交后等待结果并保存；`--no-wait` 只打印任务 ID
//!
//! ## 依赖关系
//! - 使用 `cli/run.rs` 定义的参数
//! - 使用 `pipeline/`, `client/chemcloud.rs`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use super::report_saved;
use crate::cli::run::RunArgs;
use crate::client::ChemCloudClient;
use crate::error::Result;
use crate::models::{InputData, ProgramInput};
use crate::pipeline::{self, PipelineConfig};
use crate::utils::{output, progress};

use tabled::{Table, Tabled};
use tracing::debug;

/// 请求列表行
#[derive(Debug, Clone, Tabled)]
struct RequestRow {
    #[tabled(rename = "Structure")]
    structure: String,
    #[tabled(rename = "Formula")]
    formula: String,
    #[tabled(rename = "Method")]
    model: String,
    #[tabled(rename = "Calc type")]
    calctype: String,
    #[tabled(rename = "Solvent")]
    solvent: String,
    #[tabled(rename = "Keywords")]
    keywords: String,
    #[tabled(rename = "Output")]
    output: String,
}

impl RequestRow {
    fn new(input: &ProgramInput) -> Self {
        RequestRow {
            structure: input.structure.name().unwrap_or("-").to_string(),
            formula: input.structure.formula(),
            model: input.model.to_string(),
            calctype: input.calctype.to_string(),
            solvent: input.keywords.alpb().unwrap_or("-").to_string(),
            keywords: if input.keywords.is_empty() {
                "-".to_string()
            } else {
                serde_json::to_string(&input.keywords).unwrap_or_default()
            },
            output: InputData::from(input.clone())
                .save_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(by structure name)".to_string()),
        }
    }
}

/// 执行 run 命令
pub fn execute(args: RunArgs) -> Result<()> {
    let mut config = PipelineConfig::load(&args.config)?;
    if let Some(program) = args.program {
        config.program = program;
    }
    if let Some(method) = args.method {
        config.model.method = method;
    }
    if let Some(basis) = args.basis {
        config.model = config.model.with_basis(basis);
    }
    if let Some(calc_dir) = args.calc_dir {
        config.calc_dir = calc_dir;
    }
    debug!(?config, "pipeline stage");

    output::print_header(&format!("Pipeline stage: {}", args.config.display()));

    let requests = pipeline::prepare(&config)?;
    output::print_info(&format!(
        "{} calculation(s) with {} [{}]",
        requests.len(),
        config.program,
        config.model
    ));

    if args.dry_run {
        let rows: Vec<RequestRow> = requests.iter().map(RequestRow::new).collect();
        println!("{}", Table::new(&rows));
        output::print_skip("Dry run, nothing submitted");
        return Ok(());
    }

    let count = requests.len();
    let client = ChemCloudClient::new(args.client.settings())?;
    debug!(domain = client.domain(), "connecting");
    let future =
        pipeline::submit_stage(&client, &config, requests, args.client.poll_settings())?;
    output::print_success(&format!("Submitted task {}", future.task_id()));

    if args.no_wait {
        output::print_info(&format!(
            "Fetch the results later with: qcpipe fetch {} --calc-dir {}",
            future.task_id(),
            config.calc_dir.display()
        ));
        return Ok(());
    }

    let spinner = progress::create_spinner(&format!(
        "Waiting on {} calculation(s)...",
        count
    ));
    let outputs = future.get();
    spinner.finish_and_clear();

    let saved = pipeline::save_all(outputs?, &config.calc_dir)?;
    report_saved(&saved);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CalcType, Keywords, Model, Structure};
    use crate::pipeline::builder::RequestBuilder;

    #[test]
    fn test_request_row() {
        let structure = Structure::new(
            vec!["O".into(), "H".into(), "H".into()],
            vec![[0.0; 3], [0.0, 1.4, 1.1], [0.0, -1.4, 1.1]],
        )
        .with_name("water");
        let request = RequestBuilder::new("crest", "data/calcs", Model::new("gfnff"))
            .keywords(Keywords::default().with_alpb("h2o"))
            .build("water", structure, CalcType::Optimization);

        let row = RequestRow::new(&request);
        assert_eq!(row.structure, "water");
        assert_eq!(row.formula, "H2O");
        assert_eq!(row.model, "gfnff");
        assert_eq!(row.calctype, "optimization");
        assert_eq!(row.solvent, "h2o");
        assert_eq!(
            row.output,
            std::env::current_dir()
                .unwrap()
                .join("data/calcs/water-crest-optimization.json")
                .display()
                .to_string()
        );
    }

    #[test]
    fn test_request_row_without_keywords_or_path() {
        let structure = Structure::new(vec!["He".into()], vec![[0.0; 3]]).with_name("he");
        let request = RequestBuilder::new("terachem", "data/calcs", Model::new("b3lyp"))
            .record_save_path(false)
            .build("he", structure, CalcType::Energy);

        let row = RequestRow::new(&request);
        assert_eq!(row.keywords, "-");
        assert_eq!(row.solvent, "-");
        assert_eq!(row.output, "(by structure name)");
    }
}
