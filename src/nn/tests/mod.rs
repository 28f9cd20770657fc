mod graph_backward;
mod layer_batch_norm;
mod node_activation;
mod node_loss;
mod node_shape;

use crate::nn::{Graph, Init, Var};
use crate::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// 创建指定值的参数节点（测试中用参数节点充当需要求导的输入）
pub(super) fn param_with(graph: &Graph, name: &str, data: &[f32], shape: &[usize]) -> Var {
    let p = graph.parameter(shape, Init::Zeros, name).unwrap();
    p.set_value(&Tensor::new(data, shape)).unwrap();
    p
}

/// 可复现的 [low, high) 均匀随机张量
pub(super) fn seeded_uniform(shape: &[usize], low: f32, high: f32, seed: u64) -> Tensor {
    let mut rng = StdRng::seed_from_u64(seed);
    Tensor::uniform_with_rng(low, high, shape, &mut rng)
}

/// 用中心差分校验 `loss_fn` 对 `param` 的解析梯度
///
/// `loss_fn` 每次调用都需要重新构建前向计算（动态图）。
pub(super) fn check_grad(param: &Var, loss_fn: impl Fn() -> Var, tol: f32) {
    const STEP: f32 = 1e-2;

    let base = param.value();
    param.zero_grad();
    loss_fn().backward().unwrap();
    let analytic = param.grad().expect("参数应当有梯度").to_vec();

    let data = base.to_vec();
    for i in 0..data.len() {
        let mut shifted = data.clone();
        shifted[i] = data[i] + STEP;
        param.set_value(&Tensor::new(&shifted, base.shape())).unwrap();
        let plus = loss_fn().item().unwrap();
        shifted[i] = data[i] - STEP;
        param.set_value(&Tensor::new(&shifted, base.shape())).unwrap();
        let minus = loss_fn().item().unwrap();

        let numeric = (plus - minus) / (2.0 * STEP);
        assert!(
            (analytic[i] - numeric).abs() <= tol * (1.0 + numeric.abs()),
            "参数“{}”第 {i} 个元素梯度不符：解析 {}，数值 {}",
            param.name(),
            analytic[i],
            numeric
        );
    }
    param.set_value(&base).unwrap();
    param.zero_grad();
}
