use super::{check_grad, param_with, seeded_uniform};
use crate::assert_err;
use crate::nn::{Graph, GraphError, VarActivationOps, VarLossOps};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

/// 远离 0 的输入（避免在折点处做差分）
fn away_from_zero(shape: &[usize], seed: u64) -> Vec<f32> {
    seeded_uniform(shape, -1.0, 1.0, seed)
        .to_vec()
        .into_iter()
        .map(|v| if v.abs() < 0.1 { v + 0.3_f32.copysign(v) } else { v })
        .collect()
}

#[test]
fn test_leaky_relu_forward_and_grad() {
    let graph = Graph::new_with_seed(0);
    let x = param_with(&graph, "x", &[-2.0, 0.5], &[2]);
    assert_eq!(x.leaky_relu(0.2).value(), Tensor::new(&[-0.4, 0.5], &[2]));

    let x = param_with(&graph, "x2", &away_from_zero(&[2, 3, 2, 2], 1), &[2, 3, 2, 2]);
    let target = graph.input(&seeded_uniform(&[2, 3, 2, 2], -1.0, 1.0, 2));
    check_grad(&x, || x.leaky_relu(0.2).mse_loss(&target).unwrap(), 1e-2);
}

#[test]
fn test_prelu_per_channel_grad() {
    let graph = Graph::new_with_seed(0);
    let x = param_with(&graph, "x", &away_from_zero(&[2, 3, 2, 2], 3), &[2, 3, 2, 2]);
    let w = param_with(&graph, "w", &[0.25, 0.1, -0.3], &[3]);
    let target = graph.input(&seeded_uniform(&[2, 3, 2, 2], -1.0, 1.0, 4));

    let loss_fn = || x.prelu(&w).unwrap().mse_loss(&target).unwrap();
    check_grad(&x, loss_fn, 1e-2);
    check_grad(&w, loss_fn, 1e-2);
}

#[test]
fn test_prelu_shared_weight() {
    let graph = Graph::new_with_seed(0);
    let x = param_with(&graph, "x", &[-1.0, 2.0, -4.0, 1.0], &[1, 2, 1, 2]);
    let w = param_with(&graph, "w", &[0.25], &[1]);
    let y = x.prelu(&w).unwrap();
    assert_eq!(y.value(), Tensor::new(&[-0.25, 2.0, -1.0, 1.0], &[1, 2, 1, 2]));

    let target = graph.input(&seeded_uniform(&[1, 2, 1, 2], -1.0, 1.0, 5));
    check_grad(&w, || x.prelu(&w).unwrap().mse_loss(&target).unwrap(), 1e-2);
}

#[test]
fn test_prelu_weight_length_mismatch() {
    let graph = Graph::new_with_seed(0);
    let x = graph.input(&Tensor::zeros(&[1, 3, 2, 2]));
    let w = param_with(&graph, "w", &[0.25, 0.25], &[2]);
    assert_err!(x.prelu(&w), GraphError::ShapeMismatch { expected, .. } if expected == &[3]);
}

#[test]
fn test_sigmoid_tanh_values() {
    let graph = Graph::new_with_seed(0);
    let x = graph.input(&Tensor::new(&[0.0, -200.0, 200.0], &[3]));

    let s = x.sigmoid().value().to_vec();
    assert_abs_diff_eq!(s[0], 0.5, epsilon = 1e-7);
    assert_abs_diff_eq!(s[1], 0.0, epsilon = 1e-7);
    assert_abs_diff_eq!(s[2], 1.0, epsilon = 1e-7);
    assert!(s.iter().all(|v| v.is_finite()));

    let t = x.tanh().value().to_vec();
    assert_abs_diff_eq!(t[0], 0.0, epsilon = 1e-7);
    assert_abs_diff_eq!(t[2], 1.0, epsilon = 1e-7);
}

#[test]
fn test_sigmoid_tanh_grad() {
    let graph = Graph::new_with_seed(0);
    let x = param_with(&graph, "x", &seeded_uniform(&[4, 3], -2.0, 2.0, 6).to_vec(), &[4, 3]);
    let target = graph.input(&seeded_uniform(&[4, 3], 0.0, 1.0, 7));

    check_grad(&x, || x.sigmoid().mse_loss(&target).unwrap(), 1e-2);
    check_grad(&x, || x.tanh().mse_loss(&target).unwrap(), 1e-2);
}
