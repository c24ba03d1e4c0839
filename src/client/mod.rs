//! # 远程计算客户端模块
//!
//! 定义远程计算服务的抽象 (`ComputeBackend`) 以及 ChemCloud 的 HTTP 实现。
//! 排队、并行、重试都由远程服务负责，本地只负责提交和轮询。
//!
//! ## 依赖关系
//! - 被 `pipeline/submitter.rs` 和 `commands/` 使用
//! - 使用 `models/calculation.rs`
//! - 子模块: chemcloud, mock (仅测试)

pub mod chemcloud;
#[cfg(test)]
pub mod mock;

pub use chemcloud::{ChemCloudClient, ChemCloudSettings};

use crate::error::Result;
use crate::models::{InputData, ProgramOutput};
use serde::Deserialize;

/// 远程任务状态
#[derive(Debug, Clone, PartialEq)]
pub enum TaskStatus {
    /// 排队中
    Pending,
    /// 运行中
    Running,
    /// 完成，附带全部输出（与提交顺序一致）
    Complete(Vec<ProgramOutput>),
    /// 整个任务失败
    Failed(String),
}

/// 随批次提交的收集选项
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitOptions {
    /// 收集程序标准输出
    #[serde(default = "default_true")]
    pub collect_stdout: bool,

    /// 收集程序生成的文件
    #[serde(default)]
    pub collect_files: bool,

    /// 收集波函数文件
    #[serde(default)]
    pub collect_wfns: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SubmitOptions {
    fn default() -> Self {
        SubmitOptions {
            collect_stdout: true,
            collect_files: false,
            collect_wfns: false,
        }
    }
}

/// 远程计算服务
pub trait ComputeBackend {
    /// 将一批输入作为一个任务提交，返回任务 ID
    fn submit(&self, program: &str, inputs: &[InputData], options: &SubmitOptions)
        -> Result<String>;

    /// 查询任务状态
    fn poll(&self, task_id: &str) -> Result<TaskStatus>;
}
