//! # JSON 文档读写
//!
//! 结构、计算结果等对象的 JSON 文件读写。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs`, `pipeline/loader.rs`, `pipeline/writer.rs` 使用
//! - 使用 `serde_json`

use crate::error::{QcpipeError, Result};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// 读取并反序列化 JSON 文件
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(QcpipeError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| QcpipeError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    serde_json::from_str(&content).map_err(|e| QcpipeError::JsonError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 序列化为格式化 JSON 并写入文件，覆盖已有文件，自动创建父目录
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| QcpipeError::FileWriteError {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let content = serde_json::to_string_pretty(value).map_err(|e| QcpipeError::JsonError {
        path: path.display().to_string(),
        source: e,
    })?;

    fs::write(path, content).map_err(|e| QcpipeError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parent_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out.json");

        write_json(&path, &json!({"energy": -1.0})).unwrap();
        write_json(&path, &json!({"energy": -2.0})).unwrap();

        let back: Value = read_json(&path).unwrap();
        assert_eq!(back["energy"], -2.0);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_json::<Value>(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, QcpipeError::FileNotFound { .. }));
    }

    #[test]
    fn test_read_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        let err = read_json::<Value>(&path).unwrap_err();
        assert!(matches!(err, QcpipeError::JsonError { .. }));
    }
}
