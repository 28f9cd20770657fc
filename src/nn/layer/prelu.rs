/*
 * @Date         : 2026-02-06
 * @Description  : PReLU 层：斜率可学习的 LeakyReLU
 */

use crate::nn::{Graph, GraphError, Init, Module, Var, VarActivationOps};

/// `PReLU` 初始斜率（与 `PyTorch` 一致）
const INITIAL_SLOPE: f32 = 0.25;

/// PReLU 层
///
/// `num_parameters` 为 1 时所有通道共享一个斜率，否则须等于输入通道数。
#[derive(Debug)]
pub struct PRelu {
    weight: Var,
}

impl PRelu {
    pub fn new(graph: &Graph, num_parameters: usize, name: &str) -> Result<Self, GraphError> {
        let weight = graph.parameter(
            &[num_parameters],
            Init::Constant(INITIAL_SLOPE),
            &format!("{name}.weight"),
        )?;
        Ok(Self { weight })
    }

    pub fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        x.prelu(&self.weight)
    }

    pub const fn weight(&self) -> &Var {
        &self.weight
    }
}

impl Module for PRelu {
    fn parameters(&self) -> Vec<Var> {
        vec![self.weight.clone()]
    }
}
