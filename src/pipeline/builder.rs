//! # 计算请求构建
//!
//! 将结构、计算类型、方法和关键字组合成 `ProgramInput`，并把确定的输出路径
//! 以绝对路径写入 `extras.save_path`，之后在任何工作目录下都能保存结果。
//!
//! ## 依赖关系
//! - 被 `pipeline/mod.rs`, `pipeline/loader.rs` 使用
//! - 使用 `models/`, `pipeline/config.rs`

use super::config::PipelineConfig;
use crate::models::{CalcType, Keywords, Model, ProgramInput, Structure, SAVE_PATH_KEY};

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// 结果文件路径 `<calc_dir>/<name>-<program>-<calctype>.json`
pub fn output_path(calc_dir: &Path, name: &str, program: &str, calctype: CalcType) -> PathBuf {
    calc_dir.join(format!("{}-{}-{}.json", name, program, calctype))
}

/// 相对路径按当前工作目录补全；取不到工作目录时保持原样
fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}

/// 计算请求构建器
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    program: String,
    calc_dir: PathBuf,
    model: Model,
    keywords: Keywords,
    record_save_path: bool,
}

impl RequestBuilder {
    pub fn new(program: impl Into<String>, calc_dir: impl Into<PathBuf>, model: Model) -> Self {
        RequestBuilder {
            program: program.into(),
            calc_dir: calc_dir.into(),
            model,
            keywords: Keywords::default(),
            record_save_path: true,
        }
    }

    pub fn keywords(mut self, keywords: Keywords) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn record_save_path(mut self, record: bool) -> Self {
        self.record_save_path = record;
        self
    }

    /// 构建单个请求
    pub fn build(&self, name: &str, structure: Structure, calctype: CalcType) -> ProgramInput {
        let mut extras = Map::new();
        if self.record_save_path {
            let save_path = absolute(output_path(&self.calc_dir, name, &self.program, calctype));
            extras.insert(
                SAVE_PATH_KEY.to_string(),
                Value::String(save_path.to_string_lossy().into_owned()),
            );
        }

        ProgramInput {
            calctype,
            structure,
            model: self.model.clone(),
            keywords: self.keywords.clone(),
            extras,
            extra: Map::new(),
        }
    }
}

/// 结构 × 计算类型的全部组合（结构优先）
pub fn expand(config: &PipelineConfig, structures: &[(String, Structure)]) -> Vec<ProgramInput> {
    let mut requests = Vec::with_capacity(structures.len() * config.calc_types.len());

    for (name, structure) in structures {
        for &calctype in &config.calc_types {
            let builder = RequestBuilder::new(&config.program, &config.calc_dir, config.model.clone())
                .keywords(config.keywords_for(calctype))
                .record_save_path(config.record_save_path);
            requests.push(builder.build(name, structure.clone(), calctype));
        }
    }

    requests
}
