//! # 统一错误处理模块
//!
//! 定义 qcpipe 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// qcpipe 统一错误类型
#[derive(Error, Debug)]
pub enum QcpipeError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Invalid JSON in {path}")]
    JsonError {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid pipeline configuration: {path}")]
    ConfigError {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid base64 content in file {name}")]
    Base64Error {
        name: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("Result '{path}' has no {field}")]
    MissingField { path: String, field: String },

    // ─────────────────────────────────────────────────────────────
    // 流水线阶段依赖
    // ─────────────────────────────────────────────────────────────
    #[error("Prerequisite result not found: {path}\nRun the '{calctype}' stage first")]
    PrerequisiteMissing { path: String, calctype: String },

    #[error("Prerequisite calculation failed: {path}")]
    PrerequisiteFailed { path: String },

    // ─────────────────────────────────────────────────────────────
    // 远程服务错误
    // ─────────────────────────────────────────────────────────────
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("HTTP request failed")]
    HttpError(#[from] reqwest::Error),

    #[error("Malformed ChemCloud response for {context}")]
    ResponseError {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("ChemCloud returned {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Task {task_id} failed: {reason}")]
    TaskFailed { task_id: String, reason: String },

    #[error("Timed out after {seconds}s waiting on task {task_id}")]
    Timeout { task_id: String, seconds: u64 },

    #[error("Submitted {submitted} calculations but received {received} results")]
    ResultCountMismatch { submitted: usize, received: usize },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("No matching files found with pattern: {pattern}")]
    NoFilesFound { pattern: String },

    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, QcpipeError>;
