//! 测试用的内存计算后端

use super::{ComputeBackend, SubmitOptions, TaskStatus};
use crate::error::Result;
use crate::models::{
    CalcType, InputData, ProgramInput, ProgramOutput, Provenance, Results, Structure,
};

use serde_json::Map;
use std::cell::RefCell;

/// 模拟远程服务：记录提交内容，按计算类型生成确定的结果
#[derive(Debug, Default)]
pub struct MockBackend {
    /// 返回结果前先返回多少次 Pending
    pub pending_polls: usize,
    /// 以与提交相反的顺序返回结果
    pub reverse: bool,
    /// 整个任务失败
    pub fail_with: Option<String>,
    /// 每次提交的 (program, inputs)
    pub submissions: RefCell<Vec<(String, Vec<InputData>)>>,
    /// 已收到的轮询次数
    pub polls: RefCell<usize>,
}

impl MockBackend {
    pub fn poll_count(&self) -> usize {
        *self.polls.borrow()
    }
}

/// 优化后的结构：所有坐标缩放 0.99
pub fn optimized(structure: &Structure) -> Structure {
    let mut out = structure.clone();
    for p in &mut out.geometry {
        for x in p.iter_mut() {
            *x *= 0.99;
        }
    }
    out
}

fn program_output(program: &str, input: &InputData) -> ProgramOutput {
    let results = match input {
        InputData::Program(p) => Some(results_for(p)),
        InputData::Files(f) => {
            let mut files = Map::new();
            for name in f.files.keys() {
                files.insert(format!("{}.out", name), "done\n".into());
            }
            Some(Results {
                files,
                ..Default::default()
            })
        }
    };

    ProgramOutput {
        input_data: input.clone(),
        success: true,
        results,
        stdout: Some(format!("{} finished normally", program)),
        traceback: None,
        provenance: Provenance {
            program: Some(program.to_string()),
            ..Default::default()
        },
        extra: Map::new(),
    }
}

fn results_for(input: &ProgramInput) -> Results {
    let energy = -(input.structure.natoms() as f64) * 1.5;
    match input.calctype {
        CalcType::Optimization => {
            let mut last = input.clone();
            last.structure = optimized(&input.structure);
            last.calctype = CalcType::Gradient;
            let step = ProgramOutput {
                input_data: last.into(),
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
            Results {
                trajectory: vec![step],
                ..Default::default()
            }
        }
        CalcType::ConformerSearch => Results {
            conformers: vec![input.structure.clone(), optimized(&input.structure)],
            conformer_energies: vec![energy, energy + 0.001],
            ..Default::default()
        },
        _ => Results {
            energy: Some(energy),
            ..Default::default()
        },
    }
}

impl ComputeBackend for MockBackend {
    fn submit(
        &self,
        program: &str,
        inputs: &[InputData],
        _options: &SubmitOptions,
    ) -> Result<String> {
        let mut submissions = self.submissions.borrow_mut();
        submissions.push((program.to_string(), inputs.to_vec()));
        Ok(format!("task-{}", submissions.len()))
    }

    fn poll(&self, task_id: &str) -> Result<TaskStatus> {
        let mut polls = self.polls.borrow_mut();
        *polls += 1;
        if *polls <= self.pending_polls {
            return Ok(TaskStatus::Pending);
        }
        if let Some(reason) = &self.fail_with {
            return Ok(TaskStatus::Failed(reason.clone()));
        }

        let index: usize = task_id
            .trim_start_matches("task-")
            .parse()
            .unwrap_or(1);
        let submissions = self.submissions.borrow();
        let (program, inputs) = &submissions[index - 1];

        let mut outputs: Vec<ProgramOutput> = inputs
            .iter()
            .map(|input| program_output(program, input))
            .collect();
        if self.reverse {
            outputs.reverse();
        }
        Ok(TaskStatus::Complete(outputs))
    }
}
