//! # 程序关键字模型
//!
//! 远程程序的关键字配置。常用字段有类型（CREST 的 runtype/topo/preopt
//! 以及 ALPB 隐式溶剂块），其余字段放在 `extra` 中原样传给远程服务。
//! 本地不校验关键字语义，错误关键字只会表现为远程计算失败。
//!
//! ## 依赖关系
//! - 被 `models/calculation.rs`, `pipeline/config.rs`, `pipeline/builder.rs` 使用

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `calculation` 块（CREST 的计算层级设置）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationBlock {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub level: Vec<Map<String, Value>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 程序关键字
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Keywords {
    /// CREST 运行模式，例如 "nci"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtype: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topo: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preopt: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation: Option<CalculationBlock>,

    /// 未建模的关键字，原样透传
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Keywords {
    /// 添加 ALPB 隐式溶剂（`calculation.level = [{alpb = solvent}]`）
    pub fn with_alpb(mut self, solvent: impl Into<String>) -> Self {
        let mut level = Map::new();
        level.insert("alpb".to_string(), Value::String(solvent.into()));

        let block = self.calculation.get_or_insert_with(CalculationBlock::default);
        block.level.retain(|l| !l.contains_key("alpb"));
        block.level.push(level);
        self
    }

    /// 当前设置的 ALPB 溶剂
    pub fn alpb(&self) -> Option<&str> {
        self.calculation
            .as_ref()?
            .level
            .iter()
            .find_map(|l| l.get("alpb").and_then(Value::as_str))
    }

    pub fn is_empty(&self) -> bool {
        self.runtype.is_none()
            && self.topo.is_none()
            && self.preopt.is_none()
            && self.calculation.is_none()
            && self.extra.is_empty()
    }

    /// 用 `overrides` 覆盖当前关键字
    ///
    /// 有类型字段按 `Some` 覆盖；`extra` 中的嵌套表逐层合并。
    pub fn merged(mut self, overrides: &Keywords) -> Self {
        if overrides.runtype.is_some() {
            self.runtype = overrides.runtype.clone();
        }
        if overrides.topo.is_some() {
            self.topo = overrides.topo;
        }
        if overrides.preopt.is_some() {
            self.preopt = overrides.preopt;
        }
        if overrides.calculation.is_some() {
            self.calculation = overrides.calculation.clone();
        }
        for (key, value) in &overrides.extra {
            merge_value(self.extra.entry(key.clone()).or_insert(Value::Null), value);
        }
        self
    }
}

fn merge_value(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                merge_value(base.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}
