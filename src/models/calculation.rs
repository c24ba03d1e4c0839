//! # 计算请求与结果数据模型
//!
//! 与 ChemCloud 交换的输入 (`ProgramInput`, `FileInput`) 和输出
//! (`ProgramOutput`) 对象。所有对象都保留未识别字段，保存后再读取不会丢失信息。
//!
//! ## 依赖关系
//! - 被 `pipeline/`, `client/`, `commands/` 使用
//! - 使用 `models/structure.rs`, `models/keywords.rs`

use super::keywords::Keywords;
use super::structure::Structure;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

/// 请求元数据中记录输出路径的键
pub const SAVE_PATH_KEY: &str = "save_path";

/// 二进制文件内容的前缀
pub const BASE64_PREFIX: &str = "base64:";

/// 文件字节转为 JSON 字符串：UTF-8 文本原样保留，其余写成 `base64:<编码>`
pub fn encode_file_content(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => format!("{}{}", BASE64_PREFIX, STANDARD.encode(e.as_bytes())),
    }
}

/// 还原文件字节
pub fn decode_file_content(content: &str) -> Result<Vec<u8>, base64::DecodeError> {
    match content.strip_prefix(BASE64_PREFIX) {
        Some(encoded) => STANDARD.decode(encoded),
        None => Ok(content.as_bytes().to_vec()),
    }
}

/// 计算类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalcType {
    Energy,
    Gradient,
    Hessian,
    Optimization,
    TransitionState,
    ConformerSearch,
}

impl CalcType {
    pub const ALL: [CalcType; 6] = [
        CalcType::Energy,
        CalcType::Gradient,
        CalcType::Hessian,
        CalcType::Optimization,
        CalcType::TransitionState,
        CalcType::ConformerSearch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CalcType::Energy => "energy",
            CalcType::Gradient => "gradient",
            CalcType::Hessian => "hessian",
            CalcType::Optimization => "optimization",
            CalcType::TransitionState => "transition_state",
            CalcType::ConformerSearch => "conformer_search",
        }
    }
}

impl std::fmt::Display for CalcType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CalcType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CalcType::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown calculation type '{}'", s))
    }
}

/// 计算方法描述（方法 + 可选基组）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub method: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basis: Option<String>,
}

impl Model {
    #[cfg(test)]
    pub fn new(method: impl Into<String>) -> Self {
        Model {
            method: method.into(),
            basis: None,
        }
    }

    pub fn with_basis(mut self, basis: impl Into<String>) -> Self {
        self.basis = Some(basis.into());
        self
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.basis {
            Some(basis) => write!(f, "{}/{}", self.method, basis),
            None => write!(f, "{}", self.method),
        }
    }
}

/// 结构化计算请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramInput {
    pub calctype: CalcType,

    pub structure: Structure,

    pub model: Model,

    #[serde(default)]
    pub keywords: Keywords,

    /// 请求元数据，`save_path` 记录结果的保存位置
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extras: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 原生输入文件请求（直接提交程序自己的输入文件）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileInput {
    /// 文件名 -> 文件内容，二进制文件以 `base64:` 开头
    #[serde(default)]
    pub files: BTreeMap<String, String>,

    #[serde(default)]
    pub cmdline_args: Vec<String>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extras: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 输出中记录的原始输入
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InputData {
    Program(ProgramInput),
    Files(FileInput),
}

/// 带 `calctype` 或 `structure` 的对象按 `ProgramInput` 解析，其余按 `FileInput`。
/// `ProgramInput` 的解析错误直接返回，不会退化为 `FileInput`。
impl<'de> Deserialize<'de> for InputData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let is_program = value
            .as_object()
            .map(|map| map.contains_key("calctype") || map.contains_key("structure"))
            .ok_or_else(|| D::Error::custom("input_data must be an object"))?;

        if is_program {
            ProgramInput::deserialize(value)
                .map(InputData::Program)
                .map_err(D::Error::custom)
        } else {
            FileInput::deserialize(value)
                .map(InputData::Files)
                .map_err(D::Error::custom)
        }
    }
}

impl InputData {
    pub fn extras(&self) -> &Map<String, Value> {
        match self {
            InputData::Program(input) => &input.extras,
            InputData::Files(input) => &input.extras,
        }
    }

    /// `extras.save_path` 中记录的输出路径
    pub fn save_path(&self) -> Option<PathBuf> {
        self.extras()
            .get(SAVE_PATH_KEY)
            .and_then(Value::as_str)
            .map(PathBuf::from)
    }

    pub fn structure(&self) -> Option<&Structure> {
        match self {
            InputData::Program(input) => Some(&input.structure),
            InputData::Files(_) => None,
        }
    }

    pub fn calctype(&self) -> Option<CalcType> {
        match self {
            InputData::Program(input) => Some(input.calctype),
            InputData::Files(_) => None,
        }
    }
}

impl From<ProgramInput> for InputData {
    fn from(input: ProgramInput) -> Self {
        InputData::Program(input)
    }
}

impl From<FileInput> for InputData {
    fn from(input: FileInput) -> Self {
        InputData::Files(input)
    }
}

/// 程序运行信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_version: Option<String>,

    /// 墙钟时间 (s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_time: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 计算结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Results {
    /// 能量 (Hartree)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<Vec<[f64; 3]>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hessian: Option<Vec<Vec<f64>>>,

    /// 几何优化的每一步
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trajectory: Vec<ProgramOutput>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_structure: Option<Structure>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conformers: Vec<Structure>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conformer_energies: Vec<f64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rotamers: Vec<Structure>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rotamer_energies: Vec<f64>,

    /// 程序输出文件（文件名 -> 内容）
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub files: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Results {
    /// 最终结构：显式字段优先，否则取优化轨迹最后一步的输入结构
    pub fn final_structure(&self) -> Option<&Structure> {
        self.final_structure.as_ref().or_else(|| {
            self.trajectory
                .last()
                .and_then(|step| step.input_data.structure())
        })
    }

    /// 最终能量：显式能量优先，否则取轨迹最后一步的能量
    pub fn final_energy(&self) -> Option<f64> {
        self.energy.or_else(|| {
            self.trajectory
                .last()
                .and_then(|step| step.results.as_ref())
                .and_then(|r| r.energy)
        })
    }
}

/// 计算输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramOutput {
    pub input_data: InputData,

    pub success: bool,

    #[serde(default)]
    pub results: Option<Results>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,

    #[serde(default)]
    pub provenance: Provenance,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProgramOutput {
    pub fn save_path(&self) -> Option<PathBuf> {
        self.input_data.save_path()
    }

    /// 输入结构
    pub fn structure(&self) -> Option<&Structure> {
        self.input_data.structure()
    }

    pub fn final_structure(&self) -> Option<&Structure> {
        self.results.as_ref()?.final_structure()
    }

    pub fn energy(&self) -> Option<f64> {
        self.results.as_ref()?.final_energy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_input() -> ProgramInput {
        ProgramInput {
            calctype: CalcType::Optimization,
            structure: Structure::new(vec!["H".into(), "H".into()], vec![[0.0; 3], [0.0, 0.0, 1.4]])
                .with_name("h2"),
            model: Model::new("gfnff"),
            keywords: Keywords::default(),
            extras: Map::new(),
            extra: Map::new(),
        }
    }

    #[test]
    fn test_calctype_strings() {
        assert_eq!(CalcType::ConformerSearch.to_string(), "conformer_search");
        assert_eq!(
            "transition_state".parse::<CalcType>().unwrap(),
            CalcType::TransitionState
        );
        assert!("single_point".parse::<CalcType>().is_err());
        assert_eq!(
            serde_json::to_value(CalcType::Energy).unwrap(),
            json!("energy")
        );
    }

    #[test]
    fn test_model_display() {
        assert_eq!(Model::new("gfnff").to_string(), "gfnff");
        assert_eq!(
            Model::new("b3lyp").with_basis("6-31gss").to_string(),
            "b3lyp/6-31gss"
        );
    }

    #[test]
    fn test_input_data_untagged() {
        let program: InputData = serde_json::to_value(sample_input())
            .and_then(serde_json::from_value)
            .unwrap();
        assert!(matches!(program, InputData::Program(_)));

        let files: InputData = serde_json::from_value(json!({
            "files": {"tc.in": "run energy\n"},
            "cmdline_args": ["tc.in"]
        }))
        .unwrap();
        assert!(matches!(files, InputData::Files(_)));
        assert!(files.structure().is_none());
    }

    #[test]
    fn test_broken_program_input_is_an_error() {
        let mut value = serde_json::to_value(sample_input()).unwrap();
        value["structure"]["geometry"] = json!([0.0, 0.0, 0.0, 0.0, 0.0, 1.4]);
        assert!(serde_json::from_value::<InputData>(value).is_err());

        let output = json!({
            "input_data": {"calctype": "energy", "model": {"method": "gfnff"}},
            "success": true
        });
        assert!(serde_json::from_value::<ProgramOutput>(output).is_err());

        assert!(serde_json::from_value::<InputData>(json!("tc.in")).is_err());
    }

    #[test]
    fn test_save_path_from_extras() {
        let mut input = sample_input();
        input
            .extras
            .insert(SAVE_PATH_KEY.into(), json!("data/calcs/h2-crest-optimization.json"));
        let data = InputData::from(input);
        assert_eq!(
            data.save_path(),
            Some(PathBuf::from("data/calcs/h2-crest-optimization.json"))
        );
    }

    #[test]
    fn test_final_structure_from_trajectory() {
        let mut last_input = sample_input();
        last_input.structure.geometry[1] = [0.0, 0.0, 1.39];

        let step = |input: ProgramInput, energy: f64| ProgramOutput {
            input_data: input.into(),
            success: true,
            results: Some(Results {
                energy: Some(energy),
                ..Default::default()
            }),
            stdout: None,
            traceback: None,
            provenance: Provenance::default(),
            extra: Map::new(),
        };

        let results = Results {
            trajectory: vec![step(sample_input(), -1.0), step(last_input.clone(), -1.1)],
            ..Default::default()
        };

        assert_eq!(results.final_structure(), Some(&last_input.structure));
        assert_eq!(results.final_energy(), Some(-1.1));
    }

    #[test]
    fn test_explicit_final_structure_wins() {
        let explicit = Structure::new(vec!["He".into()], vec![[0.0; 3]]);
        let results = Results {
            final_structure: Some(explicit.clone()),
            ..Default::default()
        };
        assert_eq!(results.final_structure(), Some(&explicit));
    }

    #[test]
    fn test_failed_output_without_results() {
        let value = json!({
            "input_data": serde_json::to_value(sample_input()).unwrap(),
            "success": false,
            "results": null,
            "traceback": "SCF did not converge",
            "provenance": {"program": "crest"}
        });
        let output: ProgramOutput = serde_json::from_value(value).unwrap();
        assert!(!output.success);
        assert!(output.energy().is_none());
        assert!(output.final_structure().is_none());
        assert_eq!(output.provenance.program.as_deref(), Some("crest"));
    }
}
