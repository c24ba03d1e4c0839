//! # 解析器模块
//!
//! 提供分子结构文件 (JSON, XYZ) 和计算结果 JSON 的读写。
//!
//! ## 依赖关系
//! - 被 `pipeline/` 和 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: json, xyz

pub mod json;
pub mod xyz;

use crate::error::{QcpipeError, Result};
use crate::models::Structure;
use std::path::Path;

/// 从文件路径推断格式并解析结构
///
/// JSON 结构没有名称时，使用文件名（不含扩展名）作为结构名。
pub fn parse_structure_file(path: &Path) -> Result<Structure> {
    if !path.exists() {
        return Err(QcpipeError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "json" => {
            let structure: Structure = json::read_json(path)?;
            if structure.name().is_some() {
                return Ok(structure);
            }
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown");
            Ok(structure.with_name(stem))
        }
        "xyz" => xyz::parse_xyz_file(path),
        _ => Err(QcpipeError::UnsupportedFormat(format!(
            "Cannot determine structure format for: {}",
            path.display()
        ))),
    }
}
