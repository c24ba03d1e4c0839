//! # 流水线配置
//!
//! 一次提交所需的全部参数，从 TOML 文件读取。
//!
//! ## 示例
//! ```toml
//! program = "crest"
//! calc_types = ["conformer_search"]
//! names = ["u2-anion"]
//! structure_dir = "data/structures"
//! calc_dir = "data/calcs"
//! solvent = "ch2cl2"
//!
//! [model]
//! method = "gfnff"
//!
//! [source]
//! type = "result"
//! calctype = "optimization"
//!
//! [keywords]
//! topo = false
//! preopt = false
//! ```
//!
//! ## 依赖关系
//! - 被 `pipeline/loader.rs`, `pipeline/builder.rs`, `commands/run.rs` 使用
//! - 使用 `toml` 反序列化

use crate::client::SubmitOptions;
use crate::error::{QcpipeError, Result};
use crate::models::{CalcType, Keywords, Model};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

fn default_structure_dir() -> PathBuf {
    PathBuf::from("data/structures")
}

fn default_calc_dir() -> PathBuf {
    PathBuf::from("data/calcs")
}

fn default_pattern() -> String {
    "*.json".to_string()
}

fn default_true() -> bool {
    true
}

/// 输入结构的来源
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StructureSource {
    /// 从 `structure_dir` 中读取 `<name>.json` / `<name>.xyz`
    #[default]
    File,
    /// 从上一阶段保存的结果中取最终结构
    Result {
        calctype: CalcType,
        /// 上一阶段使用的程序，缺省为本阶段的程序
        #[serde(default)]
        program: Option<String>,
    },
}

/// 流水线配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// 远程程序，例如 "crest", "terachem"
    pub program: String,

    pub calc_types: Vec<CalcType>,

    pub model: Model,

    #[serde(default = "default_structure_dir")]
    pub structure_dir: PathBuf,

    #[serde(default = "default_calc_dir")]
    pub calc_dir: PathBuf,

    /// 结构名；为空时按 `pattern` 扫描 `structure_dir`
    #[serde(default)]
    pub names: Vec<String>,

    #[serde(default = "default_pattern")]
    pub pattern: String,

    #[serde(default)]
    pub source: StructureSource,

    /// ALPB 隐式溶剂
    #[serde(default)]
    pub solvent: Option<String>,

    #[serde(default)]
    pub keywords: Keywords,

    /// 按计算类型覆盖的关键字，键为计算类型名
    #[serde(default)]
    pub keyword_overrides: BTreeMap<String, Keywords>,

    #[serde(default)]
    pub submit: SubmitOptions,

    /// 为 false 时请求不记录 `save_path`，结果按结构名保存为 `<calc_dir>/<name>.json`
    #[serde(default = "default_true")]
    pub record_save_path: bool,
}

impl PipelineConfig {
    /// 从 TOML 文件读取配置
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(QcpipeError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let contents = fs::read_to_string(path).map_err(|e| QcpipeError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;

        let config: PipelineConfig =
            toml::from_str(&contents).map_err(|e| QcpipeError::ConfigError {
                path: path.display().to_string(),
                source: e,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.program.trim().is_empty() {
            return Err(QcpipeError::InvalidArgument(
                "program must not be empty".to_string(),
            ));
        }
        if self.calc_types.is_empty() {
            return Err(QcpipeError::InvalidArgument(
                "calc_types must list at least one calculation type".to_string(),
            ));
        }
        for key in self.keyword_overrides.keys() {
            key.parse::<CalcType>().map_err(|e| {
                QcpipeError::InvalidArgument(format!("keyword_overrides: {}", e))
            })?;
        }
        Ok(())
    }

    /// 某一计算类型实际使用的关键字：基础关键字 + 溶剂 + 覆盖项
    pub fn keywords_for(&self, calctype: CalcType) -> Keywords {
        let mut keywords = self.keywords.clone();
        if let Some(solvent) = &self.solvent {
            keywords = keywords.with_alpb(solvent.as_str());
        }
        match self.keyword_overrides.get(calctype.as_str()) {
            Some(overrides) => keywords.merged(overrides),
            None => keywords,
        }
    }

    /// 读取上一阶段结果时使用的程序名
    pub fn source_program(&self) -> Option<&str> {
        match &self.source {
            StructureSource::File => None,
            StructureSource::Result { program, .. } => {
                Some(program.as_deref().unwrap_or(&self.program))
            }
        }
    }
}
