//! # XYZ 格式解析器
//!
//! 解析单帧 XYZ 文件，坐标从 Å 转换为 Bohr。
//!
//! ## XYZ 格式说明
//! ```text
//! 3                          # 原子数
//! charge=-1 multiplicity=1   # 注释行（可选的电荷/自旋多重度，允许 qcio_ 前缀）
//! O  0.000  0.000  0.000     # 元素符号 x y z (Å)
//! H  0.000  0.757  0.586
//! H  0.000 -0.757  0.586
//! ```
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{QcpipeError, Result};
use crate::models::{Structure, BOHR_TO_ANGSTROM};

use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

fn comment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(?:qcio_)?(charge|multiplicity)\s*=\s*(-?\d+)")
            .expect("static regex is valid")
    })
}

/// 解析 XYZ 文件，文件名（不含扩展名）作为结构名
pub fn parse_xyz_file(path: &Path) -> Result<Structure> {
    let content = fs::read_to_string(path).map_err(|e| QcpipeError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");

    parse_xyz_content(&content, name).map_err(|e| match e {
        QcpipeError::ParseError { format, reason, .. } => QcpipeError::ParseError {
            format,
            path: path.display().to_string(),
            reason,
        },
        other => other,
    })
}

/// 从字符串内容解析 XYZ 格式
pub fn parse_xyz_content(content: &str, name: &str) -> Result<Structure> {
    let parse_error = |reason: String| QcpipeError::ParseError {
        format: "xyz".to_string(),
        path: name.to_string(),
        reason,
    };

    let mut lines = content.lines();

    let natoms: usize = lines
        .next()
        .map(str::trim)
        .ok_or_else(|| parse_error("Empty file".to_string()))?
        .parse()
        .map_err(|_| parse_error("First line must be the atom count".to_string()))?;

    let comment = lines.next().unwrap_or("");

    let mut symbols = Vec::with_capacity(natoms);
    let mut geometry = Vec::with_capacity(natoms);

    for (i, line) in lines.take(natoms).enumerate() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(parse_error(format!("Invalid atom line {}", i + 3)));
        }

        let mut position = [0.0; 3];
        for (k, value) in parts[1..4].iter().enumerate() {
            let v: f64 = value
                .parse()
                .map_err(|_| parse_error(format!("Invalid coordinate at line {}", i + 3)))?;
            position[k] = v / BOHR_TO_ANGSTROM;
        }

        symbols.push(parts[0].to_string());
        geometry.push(position);
    }

    if symbols.len() != natoms {
        return Err(parse_error(format!(
            "Expected {} atoms, found {}",
            natoms,
            symbols.len()
        )));
    }

    let mut charge = 0;
    let mut multiplicity = 1;
    for cap in comment_pattern().captures_iter(comment) {
        let value: i32 = cap[2]
            .parse()
            .map_err(|_| parse_error(format!("Invalid {} value", &cap[1])))?;
        if cap[1].eq_ignore_ascii_case("charge") {
            charge = value;
        } else {
            multiplicity = u32::try_from(value)
                .map_err(|_| parse_error("Multiplicity must be positive".to_string()))?;
        }
    }

    Ok(Structure::new(symbols, geometry)
        .with_name(name)
        .with_charge(charge, multiplicity))
}
