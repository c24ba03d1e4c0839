//! # 批量提交
//!
//! 把一批请求作为一个任务交给远程服务。`compute` 阻塞直到全部结果返回；
//! `submit` 返回 `FutureOutput`，稍后调用 `get()` 等待。
//! 远程失败直接返回错误，不做部分结果恢复。
//!
//! ## 依赖关系
//! - 被 `pipeline/mod.rs`, `commands/` 使用
//! - 使用 `client/` 中的 `ComputeBackend`

use crate::client::{ComputeBackend, SubmitOptions, TaskStatus};
use crate::error::{QcpipeError, Result};
use crate::models::{InputData, ProgramOutput};

use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// 轮询设置
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    /// 等待上限，`None` 表示一直等待
    pub timeout: Option<Duration>,
}

impl Default for PollSettings {
    fn default() -> Self {
        PollSettings {
            interval: Duration::from_secs(1),
            timeout: None,
        }
    }
}

/// 已提交、尚未取回的任务
pub struct FutureOutput<'a, B: ComputeBackend + ?Sized> {
    backend: &'a B,
    task_id: String,
    /// 提交的输入数量，已知时用于校验结果数量
    expected: Option<usize>,
    poll: PollSettings,
}

impl<'a, B: ComputeBackend + ?Sized> FutureOutput<'a, B> {
    /// 关联一个已存在的任务 ID
    pub fn resume(backend: &'a B, task_id: impl Into<String>, poll: PollSettings) -> Self {
        FutureOutput {
            backend,
            task_id: task_id.into(),
            expected: None,
            poll,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// 阻塞等待任务完成并返回全部输出
    pub fn get(self) -> Result<Vec<ProgramOutput>> {
        let started = Instant::now();

        loop {
            match self.backend.poll(&self.task_id)? {
                TaskStatus::Complete(outputs) => {
                    if let Some(expected) = self.expected {
                        if outputs.len() != expected {
                            return Err(QcpipeError::ResultCountMismatch {
                                submitted: expected,
                                received: outputs.len(),
                            });
                        }
                    }
                    info!(
                        task_id = self.task_id.as_str(),
                        count = outputs.len(),
                        "task complete"
                    );
                    return Ok(outputs);
                }
                TaskStatus::Failed(reason) => {
                    return Err(QcpipeError::TaskFailed {
                        task_id: self.task_id,
                        reason,
                    })
                }
                status => {
                    if let Some(timeout) = self.poll.timeout {
                        if started.elapsed() >= timeout {
                            return Err(QcpipeError::Timeout {
                                task_id: self.task_id,
                                seconds: timeout.as_secs(),
                            });
                        }
                    }
                    debug!(task_id = self.task_id.as_str(), ?status, "waiting");
                    thread::sleep(self.poll.interval);
                }
            }
        }
    }
}

/// 提交一批输入，立即返回 `FutureOutput`
pub fn submit<'a, B: ComputeBackend + ?Sized>(
    backend: &'a B,
    program: &str,
    inputs: &[InputData],
    options: &SubmitOptions,
    poll: PollSettings,
) -> Result<FutureOutput<'a, B>> {
    if inputs.is_empty() {
        return Err(QcpipeError::InvalidArgument(
            "No calculations to submit".to_string(),
        ));
    }

    let task_id = backend.submit(program, inputs, options)?;
    info!(
        task_id = task_id.as_str(),
        program,
        count = inputs.len(),
        "submitted batch"
    );

    Ok(FutureOutput {
        backend,
        task_id,
        expected: Some(inputs.len()),
        poll,
    })
}

/// 提交一批输入并阻塞直到结果返回
pub fn compute<B: ComputeBackend + ?Sized>(
    backend: &B,
    program: &str,
    inputs: &[InputData],
    options: &SubmitOptions,
    poll: PollSettings,
) -> Result<Vec<ProgramOutput>> {
    submit(backend, program, inputs, options, poll)?.get()
}
