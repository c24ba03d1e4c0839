//! # 分子结构数据模型
//!
//! 定义与 ChemCloud 交换的分子结构表示（qcio `Structure` 的 JSON 形式）。
//! 坐标单位为 Bohr；未识别的字段原样保留，保证读写往返不丢字段。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `pipeline/` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 1 Bohr 对应的 Å 数
pub const BOHR_TO_ANGSTROM: f64 = 0.529_177_210_92;

fn default_multiplicity() -> u32 {
    1
}

/// 结构标识信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identifiers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// 其他标识（smiles, formula 等），原样透传
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identifiers {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.extra.is_empty()
    }
}

/// 分子结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    /// 元素符号
    pub symbols: Vec<String>,

    /// 笛卡尔坐标 (Bohr)，每个原子一行
    pub geometry: Vec<[f64; 3]>,

    #[serde(default)]
    pub charge: i32,

    #[serde(default = "default_multiplicity")]
    pub multiplicity: u32,

    #[serde(default, skip_serializing_if = "Identifiers::is_empty")]
    pub identifiers: Identifiers,

    /// 成键信息 (atom_i, atom_j, bond_order)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connectivity: Vec<(usize, usize, f64)>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extras: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Structure {
    pub fn new(symbols: Vec<String>, geometry: Vec<[f64; 3]>) -> Self {
        Structure {
            symbols,
            geometry,
            charge: 0,
            multiplicity: 1,
            identifiers: Identifiers::default(),
            connectivity: Vec::new(),
            extras: Map::new(),
            extra: Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.identifiers.name = Some(name.into());
        self
    }

    pub fn with_charge(mut self, charge: i32, multiplicity: u32) -> Self {
        self.charge = charge;
        self.multiplicity = multiplicity;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.identifiers.name.as_deref()
    }

    #[cfg(test)]
    pub fn natoms(&self) -> usize {
        self.symbols.len()
    }

    /// 计算化学式（按元素符号排序）
    pub fn formula(&self) -> String {
        use std::collections::BTreeMap;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

        for symbol in &self.symbols {
            *counts.entry(symbol.as_str()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|(el, count)| {
                if count == 1 {
                    el.to_string()
                } else {
                    format!("{}{}", el, count)
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }
}
