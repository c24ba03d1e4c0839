//! # 结构加载
//!
//! 从磁盘读取输入结构，或从上一阶段保存的计算结果中取出最终结构。
//! 任何失败都直接返回错误，不做重试。
//!
//! ## 依赖关系
//! - 被 `pipeline/mod.rs`, `commands/files.rs` 使用
//! - 使用 `parsers/`, `batch/collector.rs`, `pipeline/builder.rs`

use super::builder::output_path;
use super::config::{PipelineConfig, StructureSource};
use crate::batch::FileCollector;
use crate::error::{QcpipeError, Result};
use crate::models::{
    encode_file_content, CalcType, FileInput, ProgramOutput, Structure, BASE64_PREFIX,
};
use crate::parsers::{self, json};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const STRUCTURE_EXTENSIONS: [&str; 2] = ["json", "xyz"];

/// 结构名：带 .json/.xyz 扩展名时取文件名主干
pub fn structure_stem(name: &str) -> &str {
    let path = Path::new(name);
    let has_structure_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| STRUCTURE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false);

    if has_structure_ext {
        path.file_stem().and_then(|s| s.to_str()).unwrap_or(name)
    } else {
        name
    }
}

/// 定位结构文件：带扩展名直接使用，否则依次尝试 `<name>.json`, `<name>.xyz`
pub fn resolve_structure_path(dir: &Path, name: &str) -> Result<PathBuf> {
    if structure_stem(name) != name {
        return Ok(dir.join(name));
    }

    STRUCTURE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", name, ext)))
        .find(|p| p.exists())
        .ok_or_else(|| QcpipeError::FileNotFound {
            path: dir.join(format!("{}.json", name)).display().to_string(),
        })
}

/// 读取结构文件 (JSON / XYZ)
pub fn load_structure(path: &Path) -> Result<Structure> {
    debug!(path = %path.display(), "loading structure");
    parsers::parse_structure_file(path)
}

/// 读取保存的计算结果
pub fn load_output(path: &Path) -> Result<ProgramOutput> {
    json::read_json(path)
}

/// 计算结果中的最终结构
pub fn structure_from_output(output: &ProgramOutput, path: &Path) -> Result<Structure> {
    output
        .final_structure()
        .cloned()
        .ok_or_else(|| QcpipeError::MissingField {
            path: path.display().to_string(),
            field: "final structure".to_string(),
        })
}

/// 从上一阶段的结果 `<calc_dir>/<name>-<program>-<calctype>.json` 读取结构
pub fn load_from_prior_result(
    calc_dir: &Path,
    name: &str,
    program: &str,
    calctype: CalcType,
) -> Result<Structure> {
    let path = output_path(calc_dir, name, program, calctype);

    let output = match load_output(&path) {
        Ok(output) => output,
        Err(QcpipeError::FileNotFound { path }) => {
            return Err(QcpipeError::PrerequisiteMissing {
                path,
                calctype: calctype.to_string(),
            })
        }
        Err(e) => return Err(e),
    };

    if !output.success {
        return Err(QcpipeError::PrerequisiteFailed {
            path: path.display().to_string(),
        });
    }

    structure_from_output(&output, &path)
}

/// 扫描目录，返回匹配文件的结构名（文件名主干）
pub fn discover_names(dir: &Path, pattern: &str) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(QcpipeError::DirectoryNotFound {
            path: dir.display().to_string(),
        });
    }

    let files = FileCollector::new(dir).with_pattern(pattern)?.collect()?;
    if files.is_empty() {
        return Err(QcpipeError::NoFilesFound {
            pattern: dir.join(pattern).display().to_string(),
        });
    }

    Ok(files
        .iter()
        .filter_map(|p| p.file_stem().and_then(|s| s.to_str()))
        .map(str::to_string)
        .collect())
}

/// 按配置加载全部输入结构，返回 (结构名, 结构)
pub fn load_structures(config: &PipelineConfig) -> Result<Vec<(String, Structure)>> {
    let names = if config.names.is_empty() {
        discover_names(&config.structure_dir, &config.pattern)?
    } else {
        config.names.clone()
    };

    names
        .iter()
        .map(|name| -> Result<(String, Structure)> {
            let stem = structure_stem(name).to_string();
            let structure = match &config.source {
                StructureSource::File => {
                    load_structure(&resolve_structure_path(&config.structure_dir, name)?)?
                }
                StructureSource::Result { calctype, .. } => {
                    let program = config.source_program().unwrap_or(&config.program);
                    load_from_prior_result(&config.calc_dir, &stem, program, *calctype)?
                }
            };
            Ok((stem, structure))
        })
        .collect()
}

/// 读取目录中的原生输入文件（不递归）
pub fn file_input_from_directory(dir: &Path, cmdline_args: Vec<String>) -> Result<FileInput> {
    if !dir.is_dir() {
        return Err(QcpipeError::DirectoryNotFound {
            path: dir.display().to_string(),
        });
    }

    let entries = fs::read_dir(dir).map_err(|e| QcpipeError::FileReadError {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut files = BTreeMap::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        let bytes = fs::read(&path).map_err(|e| QcpipeError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        let content = encode_file_content(bytes);
        if content.starts_with(BASE64_PREFIX) {
            debug!("{} is binary, sending it base64 encoded", path.display());
        }
        files.insert(name, content);
    }

    if files.is_empty() {
        return Err(QcpipeError::NoFilesFound {
            pattern: dir.join("*").display().to_string(),
        });
    }

    Ok(FileInput {
        files,
        cmdline_args,
        ..Default::default()
    })
}
