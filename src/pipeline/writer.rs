//! # 结果保存
//!
//! 把每个计算输出写到其请求 `extras.save_path` 记录的位置；请求未记录路径时
//! 写到 `<fallback_dir>/<结构名>.json`。已有文件直接覆盖。
//!
//! ## 依赖关系
//! - 被 `pipeline/mod.rs`, `commands/` 使用
//! - 使用 `parsers/json.rs`

use crate::error::{QcpipeError, Result};
use crate::models::{decode_file_content, ProgramOutput, Results};
use crate::parsers::json;

use serde_json::Value;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// 输出的保存路径
pub fn resolve_output_path(output: &ProgramOutput, fallback_dir: &Path) -> Result<PathBuf> {
    if let Some(path) = output.save_path() {
        return Ok(path);
    }

    output
        .structure()
        .and_then(|s| s.name())
        .map(|name| fallback_dir.join(format!("{}.json", name)))
        .ok_or_else(|| {
            QcpipeError::InvalidArgument(
                "Output has neither a save_path nor a named structure".to_string(),
            )
        })
}

/// 保存单个输出，返回写入的路径
pub fn save_output(output: &ProgramOutput, fallback_dir: &Path) -> Result<PathBuf> {
    let path = resolve_output_path(output, fallback_dir)?;
    save_output_to(output, &path)?;
    Ok(path)
}

/// 保存输出到指定路径
pub fn save_output_to(output: &ProgramOutput, path: &Path) -> Result<()> {
    if !output.success {
        warn!("saving failed calculation to {}", path.display());
    }
    debug!(path = %path.display(), "writing result");
    json::write_json(path, output)
}

/// 保存一批输出，每个输出写入各自的路径，与返回顺序无关
pub fn save_outputs(outputs: &[ProgramOutput], fallback_dir: &Path) -> Result<Vec<PathBuf>> {
    outputs
        .iter()
        .map(|output| save_output(output, fallback_dir))
        .collect()
}

/// 服务端给出的文件名只能是 `dir` 下的相对路径
fn checked_file_name(name: &str) -> Result<&Path> {
    let path = Path::new(name);
    let inside = !name.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if inside {
        Ok(path)
    } else {
        Err(QcpipeError::InvalidArgument(format!(
            "Refusing to write returned file '{}' outside the output directory",
            name
        )))
    }
}

/// 把程序返回的原生文件写入目录，返回写入的文件数
///
/// 以 `base64:` 开头的内容解码后按原始字节写入。
pub fn save_files(results: &Results, dir: &Path) -> Result<usize> {
    fs::create_dir_all(dir).map_err(|e| QcpipeError::FileWriteError {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut written = 0;
    for (name, content) in &results.files {
        let path = dir.join(checked_file_name(name)?);
        let bytes = match content {
            Value::String(s) => {
                decode_file_content(s).map_err(|e| QcpipeError::Base64Error {
                    name: name.clone(),
                    source: e,
                })?
            }
            other => other.to_string().into_bytes(),
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| QcpipeError::FileWriteError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        fs::write(&path, bytes).map_err(|e| QcpipeError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })?;
        written += 1;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CalcType, InputData, Model, ProgramInput, Provenance, Structure};
    use crate::pipeline::builder::RequestBuilder;
    use crate::pipeline::loader::load_output;
    use serde_json::{json, Map};
    use tempfile::TempDir;

    fn output_for(input: ProgramInput, energy: f64) -> ProgramOutput {
        ProgramOutput {
            input_data: input.into(),
            success: true,
            results: Some(Results {
                energy: Some(energy),
                ..Default::default()
            }),
            stdout: Some("normal termination".to_string()),
            traceback: None,
            provenance: Provenance {
                program: Some("crest".to_string()),
                wall_time: Some(1.25),
                ..Default::default()
            },
            extra: Map::new(),
        }
    }

    fn structure(name: &str) -> Structure {
        Structure::new(
            vec!["C".into(), "H".into()],
            vec![[0.1234567890123, -1.0, 2.5], [0.0, 0.0, 2.0583]],
        )
        .with_name(name)
    }

    #[test]
    fn test_outputs_land_on_declared_paths_in_any_order() {
        let dir = TempDir::new().unwrap();
        let calc_dir = dir.path().join("calcs");
        let builder = RequestBuilder::new("crest", &calc_dir, Model::new("gfnff"));

        let mut outputs: Vec<ProgramOutput> = ["a", "b", "c"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                output_for(
                    builder.build(name, structure(name), CalcType::Energy),
                    -(i as f64),
                )
            })
            .collect();
        outputs.reverse();

        let paths = save_outputs(&outputs, dir.path()).unwrap();
        assert_eq!(paths.len(), 3);
        assert_eq!(fs::read_dir(&calc_dir).unwrap().count(), 3);

        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            let path = calc_dir.join(format!("{}-crest-energy.json", name));
            let loaded = load_output(&path).unwrap();
            assert_eq!(loaded.energy(), Some(-(i as f64)));
            assert_eq!(loaded.structure().unwrap().name(), Some(*name));
        }
    }

    #[test]
    fn test_round_trip_is_exact() {
        let dir = TempDir::new().unwrap();
        let builder = RequestBuilder::new("crest", dir.path(), Model::new("gfnff"));
        let mut output = output_for(
            builder.build("u2-anion", structure("u2-anion"), CalcType::Energy),
            -42.123456789012345,
        );
        output
            .extra
            .insert("pstdout".to_string(), json!("not modelled"));

        let path = save_output(&output, dir.path()).unwrap();
        let loaded = load_output(&path).unwrap();

        assert_eq!(loaded, output);
        assert_eq!(loaded.energy(), Some(-42.123456789012345));
        assert_eq!(
            loaded.structure().unwrap().geometry,
            structure("u2-anion").geometry
        );
    }

    #[test]
    fn test_fallback_path_uses_structure_name() {
        let dir = TempDir::new().unwrap();
        let input = ProgramInput {
            calctype: CalcType::Energy,
            structure: structure("ts1"),
            model: Model::new("b3lyp").with_basis("6-31gss"),
            keywords: Default::default(),
            extras: Map::new(),
            extra: Map::new(),
        };
        let path = save_output(&output_for(input, -1.0), dir.path()).unwrap();
        assert_eq!(path, dir.path().join("ts1.json"));
        assert!(path.exists());
    }

    #[test]
    fn test_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let builder = RequestBuilder::new("crest", dir.path(), Model::new("gfnff"));
        let input = builder.build("m", structure("m"), CalcType::Energy);

        save_output(&output_for(input.clone(), -1.0), dir.path()).unwrap();
        let path = save_output(&output_for(input, -2.0), dir.path()).unwrap();
        assert_eq!(load_output(&path).unwrap().energy(), Some(-2.0));
    }

    #[test]
    fn test_unnamed_without_save_path_is_error() {
        let dir = TempDir::new().unwrap();
        let input = ProgramInput {
            calctype: CalcType::Energy,
            structure: Structure::new(vec!["H".into()], vec![[0.0; 3]]),
            model: Model::new("gfnff"),
            keywords: Default::default(),
            extras: Map::new(),
            extra: Map::new(),
        };
        assert!(save_output(&output_for(input, -1.0), dir.path()).is_err());
    }

    #[test]
    fn test_save_files() {
        let dir = TempDir::new().unwrap();
        let mut files = Map::new();
        files.insert("tc.out".to_string(), json!("FINAL ENERGY: -76.0\n"));
        files.insert("scr/c0".to_string(), json!("base64:/wAQgA=="));
        let results = Results {
            files,
            ..Default::default()
        };

        let out_dir = dir.path().join("native");
        assert_eq!(save_files(&results, &out_dir).unwrap(), 2);
        assert_eq!(
            fs::read_to_string(out_dir.join("tc.out")).unwrap(),
            "FINAL ENERGY: -76.0\n"
        );
        assert_eq!(
            fs::read(out_dir.join("scr/c0")).unwrap(),
            vec![0xff, 0x00, 0x10, 0x80]
        );
    }

    #[test]
    fn test_save_files_rejects_escaping_names() {
        let dir = TempDir::new().unwrap();
        let out_dir = dir.path().join("native");

        for name in ["../evil.sh", "scr/../../evil.sh", "/tmp/evil.sh", ""] {
            let mut files = Map::new();
            files.insert(name.to_string(), json!("echo pwned\n"));
            let results = Results {
                files,
                ..Default::default()
            };
            let err = save_files(&results, &out_dir).unwrap_err();
            assert!(matches!(err, QcpipeError::InvalidArgument(_)), "{}", name);
        }
        assert!(!dir.path().join("evil.sh").exists());
    }

    #[test]
    fn test_save_files_bad_base64() {
        let dir = TempDir::new().unwrap();
        let mut files = Map::new();
        files.insert("c0".to_string(), json!("base64:not base64!"));
        let results = Results {
            files,
            ..Default::default()
        };
        assert!(matches!(
            save_files(&results, dir.path()).unwrap_err(),
            QcpipeError::Base64Error { .. }
        ));
    }

    #[test]
    fn test_recorded_path_wins_over_fallback_dir() {
        let submitted_from = TempDir::new().unwrap();
        let fetched_from = TempDir::new().unwrap();
        let calc_dir = submitted_from.path().join("data/calcs");
        let input = RequestBuilder::new("crest", &calc_dir, Model::new("gfnff")).build(
            "u2-anion",
            structure("u2-anion"),
            CalcType::Energy,
        );

        let path = save_output(&output_for(input, -3.0), &fetched_from.path().join("data/calcs"))
            .unwrap();
        assert_eq!(path, calc_dir.join("u2-anion-crest-energy.json"));
        assert!(path.exists());
        assert!(!fetched_from.path().join("data").exists());
    }

    #[test]
    fn test_file_input_output_needs_explicit_path() {
        let dir = TempDir::new().unwrap();
        let output = ProgramOutput {
            input_data: InputData::Files(Default::default()),
            success: true,
            results: None,
            stdout: None,
            traceback: None,
            provenance: Provenance::default(),
            extra: Map::new(),
        };
        assert!(resolve_output_path(&output, dir.path()).is_err());

        let path = dir.path().join("terachem-native-output.json");
        save_output_to(&output, &path).unwrap();
        assert!(path.exists());
    }
}
