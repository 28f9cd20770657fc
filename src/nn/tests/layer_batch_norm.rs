use super::{check_grad, param_with, seeded_uniform};
use crate::assert_err;
use crate::nn::{BatchNorm2d, Graph, GraphError, Module, VarLossOps};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

#[test]
fn test_batch_norm_train_normalizes_per_channel() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let bn = BatchNorm2d::new(&graph, 2, "bn")?;
    // 通道 0: [1, 2, 3, 4]（两个样本各 2 个像素），通道 1: 常数 5
    let x = graph.input(&Tensor::new(
        &[1.0, 2.0, 5.0, 5.0, 3.0, 4.0, 5.0, 5.0],
        &[2, 2, 1, 2],
    ));
    let y = bn.forward(&x)?.value();
    let v = y.to_vec();

    let channel0 = [v[0], v[1], v[4], v[5]];
    let mean: f32 = channel0.iter().sum::<f32>() / 4.0;
    let var: f32 = channel0.iter().map(|c| (c - mean).powi(2)).sum::<f32>() / 4.0;
    assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-5);
    assert_abs_diff_eq!(var, 1.0, epsilon = 1e-3);
    // 常数通道归一化为 0
    for i in [2, 3, 6, 7] {
        assert_abs_diff_eq!(v[i], 0.0, epsilon = 1e-5);
    }
    Ok(())
}

#[test]
fn test_batch_norm_running_stats_update() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let bn = BatchNorm2d::new(&graph, 1, "bn")?;
    let x = graph.input(&Tensor::new(&[1.0, 2.0, 3.0, 4.0], &[1, 1, 2, 2]));
    bn.forward(&x)?;

    // mean = 2.5，无偏方差 = 5/3
    let running_mean = bn.running_mean().value().to_vec()[0];
    let running_var = bn.running_var().value().to_vec()[0];
    assert_abs_diff_eq!(running_mean, 0.1 * 2.5, epsilon = 1e-6);
    assert_abs_diff_eq!(running_var, 0.9 + 0.1 * 5.0 / 3.0, epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_batch_norm_eval_uses_running_stats() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let bn = BatchNorm2d::new(&graph, 1, "bn")?;
    bn.running_mean().set_value(&Tensor::new(&[1.0], &[1]))?;
    bn.running_var().set_value(&Tensor::new(&[4.0], &[1]))?;

    graph.eval();
    let x = graph.input(&Tensor::new(&[3.0, 5.0], &[1, 1, 1, 2]));
    let v = bn.forward(&x)?.value().to_vec();
    let denom = (4.0_f32 + 1e-5).sqrt();
    assert_abs_diff_eq!(v[0], 2.0 / denom, epsilon = 1e-6);
    assert_abs_diff_eq!(v[1], 4.0 / denom, epsilon = 1e-6);
    // 评估模式不更新滑动统计量
    assert_eq!(bn.running_mean().value().to_vec(), vec![1.0]);

    // 评估模式下单个值也可以归一化
    let single = graph.input(&Tensor::new(&[3.0], &[1, 1, 1, 1]));
    assert!(bn.forward(&single).is_ok());
    Ok(())
}

#[test]
fn test_batch_norm_train_requires_more_than_one_value() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let bn = BatchNorm2d::new(&graph, 1, "bn")?;
    let x = graph.input(&Tensor::new(&[3.0], &[1, 1, 1, 1]));
    assert_err!(bn.forward(&x), GraphError::InvalidOperation(_));
    Ok(())
}

#[test]
fn test_batch_norm_gradients_train_mode() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let bn = BatchNorm2d::new(&graph, 2, "bn")?;
    bn.parameters()[0].set_value(&Tensor::new(&[1.5, 0.5], &[2]))?;
    let x = param_with(&graph, "x", &seeded_uniform(&[3, 2, 2, 2], -1.0, 1.0, 1).to_vec(), &[3, 2, 2, 2]);
    let target = graph.input(&seeded_uniform(&[3, 2, 2, 2], -1.0, 1.0, 2));

    let loss_fn = || bn.forward(&x).unwrap().mse_loss(&target).unwrap();
    check_grad(&x, loss_fn, 2e-2);
    for p in bn.parameters() {
        check_grad(&p, loss_fn, 1e-2);
    }
    Ok(())
}

#[test]
fn test_batch_norm_gradients_eval_mode() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let bn = BatchNorm2d::new(&graph, 2, "bn")?;
    bn.running_var().set_value(&Tensor::new(&[0.5, 2.0], &[2]))?;
    graph.eval();
    let x = param_with(&graph, "x", &seeded_uniform(&[1, 2, 2, 2], -1.0, 1.0, 3).to_vec(), &[1, 2, 2, 2]);
    let target = graph.input(&seeded_uniform(&[1, 2, 2, 2], -1.0, 1.0, 4));

    check_grad(&x, || bn.forward(&x).unwrap().mse_loss(&target).unwrap(), 1e-2);
    Ok(())
}

#[test]
fn test_batch_norm_buffers_in_state_dict() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let bn = BatchNorm2d::new(&graph, 3, "bn")?;
    let names: Vec<String> = bn.state_dict().names().map(str::to_string).collect();
    assert_eq!(
        names,
        ["bn.bias", "bn.running_mean", "bn.running_var", "bn.weight"]
    );
    assert_eq!(bn.num_params(), 6);
    Ok(())
}
