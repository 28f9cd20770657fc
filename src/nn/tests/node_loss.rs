use super::{check_grad, param_with, seeded_uniform};
use crate::assert_err;
use crate::nn::{Graph, GraphError, VarLossOps};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

#[test]
fn test_mse_loss_value_and_grad() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let x = param_with(&graph, "x", &[1.0, 2.0, 3.0], &[3]);
    let target = graph.input(&Tensor::new(&[1.0, 0.0, 0.0], &[3]));
    let loss = x.mse_loss(&target)?;
    // (0 + 4 + 9) / 3
    assert_abs_diff_eq!(loss.item()?, 13.0 / 3.0, epsilon = 1e-6);

    check_grad(&x, || x.mse_loss(&target).unwrap(), 1e-2);

    // 目标也是参数时，两侧梯度互为相反数
    let t = param_with(&graph, "t", &[0.5, 0.5, 0.5], &[3]);
    x.mse_loss(&t)?.backward()?;
    let gx = x.grad().unwrap().to_vec();
    let gt = t.grad().unwrap().to_vec();
    for (a, b) in gx.iter().zip(&gt) {
        assert_abs_diff_eq!(*a, -*b, epsilon = 1e-6);
    }
    Ok(())
}

#[test]
fn test_mse_loss_shape_mismatch() {
    let graph = Graph::new_with_seed(0);
    let x = graph.input(&Tensor::zeros(&[2, 3]));
    let y = graph.input(&Tensor::zeros(&[3, 2]));
    assert_err!(x.mse_loss(&y), GraphError::ShapeMismatch { .. });
}

#[test]
fn test_bce_loss_values() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let p = graph.input(&Tensor::new(&[0.5, 0.5], &[2]));
    let t = graph.input(&Tensor::new(&[1.0, 0.0], &[2]));
    assert_abs_diff_eq!(p.bce_loss(&t)?.item()?, std::f32::consts::LN_2, epsilon = 1e-6);

    // log(0) 被截断为 -100
    let p = graph.input(&Tensor::new(&[0.0], &[1]));
    let t = graph.input(&Tensor::new(&[1.0], &[1]));
    assert_abs_diff_eq!(p.bce_loss(&t)?.item()?, 100.0, epsilon = 1e-4);

    // 软标签
    let p = graph.input(&Tensor::new(&[0.8], &[1]));
    let t = graph.input(&Tensor::new(&[0.9], &[1]));
    let expected = -(0.9 * 0.8_f32.ln() + 0.1 * 0.2_f32.ln());
    assert_abs_diff_eq!(p.bce_loss(&t)?.item()?, expected, epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_bce_loss_grad() {
    let graph = Graph::new_with_seed(0);
    let p = param_with(&graph, "p", &seeded_uniform(&[6], 0.2, 0.8, 1).to_vec(), &[6]);
    let t = graph.input(&seeded_uniform(&[6], 0.0, 1.1, 2));
    check_grad(&p, || p.bce_loss(&t).unwrap(), 1e-2);
}

#[test]
fn test_bce_loss_rejects_out_of_range_input() {
    let graph = Graph::new_with_seed(0);
    let p = graph.input(&Tensor::new(&[1.5], &[1]));
    let t = graph.input(&Tensor::new(&[1.0], &[1]));
    assert_err!(p.bce_loss(&t), GraphError::ComputationError(_));
}

#[test]
fn test_tv_loss_value() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    // [[0, 1], [2, 4]]：纵向差平方和 4 + 9 = 13，横向 1 + 4 = 5，count_h = count_w = 2
    let x = graph.input(&Tensor::new(&[0.0, 1.0, 2.0, 4.0], &[1, 1, 2, 2]));
    assert_abs_diff_eq!(x.tv_loss()?.item()?, 2.0 * (13.0 / 2.0 + 5.0 / 2.0), epsilon = 1e-5);

    // 单行图像没有纵向差，对应项为 0
    let row = graph.input(&Tensor::new(&[0.0, 3.0], &[1, 1, 1, 2]));
    assert_abs_diff_eq!(row.tv_loss()?.item()?, 2.0 * 9.0, epsilon = 1e-5);

    // 常数图像 TV 为 0
    let flat = graph.input(&Tensor::ones(&[2, 3, 4, 4]));
    assert_abs_diff_eq!(flat.tv_loss()?.item()?, 0.0);
    Ok(())
}

#[test]
fn test_tv_loss_grad() {
    let graph = Graph::new_with_seed(0);
    let x = param_with(&graph, "x", &seeded_uniform(&[2, 2, 3, 4], 0.0, 1.0, 3).to_vec(), &[2, 2, 3, 4]);
    check_grad(&x, || x.tv_loss().unwrap(), 1e-2);
}
