/*
 * @Date         : 2026-02-07
 * @Description  : 反向传播、计算图保留/释放、no_grad 与 detach 的单元测试
 */

use super::param_with;
use crate::assert_err;
use crate::nn::{Graph, GraphError, Init, VarActivationOps, VarLossOps};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

#[test]
fn test_backward_requires_scalar_root() {
    let graph = Graph::new_with_seed(0);
    let w = param_with(&graph, "w", &[1.0, 2.0], &[2]);
    let y = &w * 2.0;
    assert_err!(y.backward(), GraphError::InvalidOperation(msg) if msg.contains("标量"));
}

#[test]
fn test_backward_without_parameters_fails() {
    let graph = Graph::new_with_seed(0);
    let x = graph.input(&Tensor::new(&[1.0], &[1]));
    let t = graph.input(&Tensor::new(&[0.0], &[1]));
    let loss = x.mse_loss(&t).unwrap();
    assert!(!loss.requires_grad());
    assert_err!(loss.backward(), GraphError::InvalidOperation(_));
}

#[test]
fn test_gradients_accumulate_until_zero_grad() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let w = param_with(&graph, "w", &[1.0], &[1]);
    let t = graph.input(&Tensor::new(&[0.0], &[1]));

    w.mse_loss(&t)?.backward()?;
    w.mse_loss(&t)?.backward()?;
    assert_abs_diff_eq!(w.grad().unwrap().to_vec()[0], 4.0);

    w.zero_grad();
    assert!(w.grad().is_none());
    Ok(())
}

#[test]
fn test_shared_node_gradient_sums_paths() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let w = param_with(&graph, "w", &[3.0], &[1]);
    let t = graph.input(&Tensor::new(&[0.0], &[1]));
    // y = w + w = 2w，loss = 4w² => d/dw = 8w
    let y = &w + &w;
    y.mse_loss(&t)?.backward()?;
    assert_abs_diff_eq!(w.grad().unwrap().to_vec()[0], 24.0, epsilon = 1e-5);
    Ok(())
}

#[test]
fn test_backward_releases_graph() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let w = param_with(&graph, "w", &[0.5], &[1]);
    let t = graph.input(&Tensor::new(&[1.0], &[1]));
    let loss = w.sigmoid().mse_loss(&t)?;

    loss.backward()?;
    let grad_before = w.grad().unwrap();
    assert_err!(loss.backward(), GraphError::GraphReleased(_));
    // 失败的反向传播不会留下部分累加的梯度
    assert_eq!(w.grad().unwrap(), grad_before);
    Ok(())
}

#[test]
fn test_retained_graph_can_be_consumed_once_more() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let w = param_with(&graph, "w", &[0.5], &[1]);
    let t = graph.input(&Tensor::new(&[1.0], &[1]));

    // 共享的上游（类似生成器输出），被两个损失先后使用
    let shared = w.tanh();
    let first = shared.mse_loss(&t)?;
    first.backward_retain_graph()?;
    let g1 = w.grad().unwrap().to_vec()[0];

    let second = (&shared * 2.0).mse_loss(&t)?;
    second.backward()?;
    let g_total = w.grad().unwrap().to_vec()[0];
    assert!(g_total != g1);

    // 第二次反向传播已消耗共享部分
    let third = shared.mse_loss(&t)?;
    assert_err!(third.backward(), GraphError::GraphReleased(_));
    Ok(())
}

#[test]
fn test_no_grad_and_detach() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let w = param_with(&graph, "w", &[0.5], &[1]);
    let t = graph.input(&Tensor::new(&[1.0], &[1]));

    let y = graph.no_grad(|| w.tanh());
    assert!(!y.requires_grad());
    assert!(graph.is_grad_enabled());

    let detached = w.tanh().detach();
    assert!(!detached.requires_grad());
    assert_eq!(detached.value(), w.tanh().value());

    // detach 截断：只有 w 直接参与的部分产生梯度
    let loss = (&detached + &w).mse_loss(&t)?;
    loss.backward()?;
    let expected = 2.0 * (0.5_f32.tanh() + 0.5 - 1.0);
    assert_abs_diff_eq!(w.grad().unwrap().to_vec()[0], expected, epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_parameter_rules() {
    let graph = Graph::new_with_seed(0);
    let w = graph.parameter(&[2, 2], Init::Ones, "w").unwrap();
    assert!(w.is_parameter());
    assert_err!(graph.parameter(&[1], Init::Zeros, "w"), GraphError::DuplicateName("w"));
    assert_err!(
        w.set_value(&Tensor::zeros(&[3])),
        GraphError::ShapeMismatch { expected, .. } if expected == &[2, 2]
    );

    let op = &w * 2.0;
    assert_err!(op.set_value(&Tensor::zeros(&[2, 2])), GraphError::InvalidOperation(_));
}

#[test]
fn test_seeded_init_is_reproducible() {
    let init = Init::Uniform {
        low: -0.1,
        high: 0.1,
    };
    let a = Graph::new_with_seed(7).parameter(&[4], init.clone(), "w").unwrap();
    let b = Graph::new_with_seed(7).parameter(&[4], init, "w").unwrap();
    assert_eq!(a.value(), b.value());
}

#[test]
fn test_train_eval_mode() {
    let graph = Graph::new_with_seed(0);
    assert!(graph.is_train_mode());
    graph.eval();
    assert!(!graph.is_train_mode());
    graph.train();
    assert!(graph.is_train_mode());
}
