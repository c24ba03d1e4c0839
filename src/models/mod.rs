//! # 数据模型模块
//!
//! 定义分子结构、关键字、计算请求与计算结果的数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `pipeline/`, `client/` 和 `commands/` 使用
//! - 子模块: structure, keywords, calculation

pub mod calculation;
pub mod keywords;
pub mod structure;

pub use calculation::{
    decode_file_content, encode_file_content, CalcType, FileInput, InputData, Model,
    ProgramInput, ProgramOutput, Results, BASE64_PREFIX, SAVE_PATH_KEY,
};
#[cfg(test)]
pub use calculation::Provenance;
pub use keywords::Keywords;
pub use structure::{Structure, BOHR_TO_ANGSTROM};
