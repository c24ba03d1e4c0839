//! # 计算流水线
//!
//! 加载结构 → 构建请求 → 批量提交 → 保存结果。
//! 每个阶段的结果写到确定的路径，下一阶段从这些路径读取结构。
//!
//! ## 依赖关系
//! - 被 `commands/run.rs`, `commands/fetch.rs`, `commands/files.rs` 使用
//! - 使用 `client/` 提交计算

pub mod builder;
pub mod config;
pub mod loader;
pub mod submitter;
pub mod writer;

pub use config::PipelineConfig;
pub use submitter::{compute, FutureOutput, PollSettings};

use builder::expand;
use crate::client::ComputeBackend;
use crate::error::Result;
use crate::models::{InputData, ProgramInput, ProgramOutput};
use submitter::submit;

use std::path::{Path, PathBuf};
use tracing::info;

/// 已保存的输出
#[derive(Debug, Clone)]
pub struct SavedOutput {
    pub path: PathBuf,
    pub output: ProgramOutput,
}

/// 加载结构并构建本阶段的全部请求
pub fn prepare(config: &PipelineConfig) -> Result<Vec<ProgramInput>> {
    let structures = loader::load_structures(config)?;
    info!(
        structures = structures.len(),
        calc_types = config.calc_types.len(),
        "loaded structures"
    );
    Ok(expand(config, &structures))
}

/// 提交本阶段已构建的请求但不等待结果
pub fn submit_stage<'a, B: ComputeBackend + ?Sized>(
    backend: &'a B,
    config: &PipelineConfig,
    requests: Vec<ProgramInput>,
    poll: PollSettings,
) -> Result<FutureOutput<'a, B>> {
    let inputs: Vec<InputData> = requests.into_iter().map(Into::into).collect();
    submit(backend, &config.program, &inputs, &config.submit, poll)
}

/// 保存一批输出，未记录路径的输出写到 `fallback_dir`
pub fn save_all(outputs: Vec<ProgramOutput>, fallback_dir: &Path) -> Result<Vec<SavedOutput>> {
    let paths = writer::save_outputs(&outputs, fallback_dir)?;
    Ok(paths
        .into_iter()
        .zip(outputs)
        .map(|(path, output)| SavedOutput { path, output })
        .collect())
}
