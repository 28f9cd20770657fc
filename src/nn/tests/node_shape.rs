use super::{check_grad, param_with, seeded_uniform};
use crate::assert_err;
use crate::nn::{Graph, GraphError, VarLossOps, VarShapeOps};
use crate::tensor::Tensor;

#[test]
fn test_pixel_shuffle_layout() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let x = graph.input(&Tensor::new(&[0.0, 1.0, 2.0, 3.0], &[1, 4, 1, 1]));
    let y = x.pixel_shuffle(2)?;
    assert_eq!(y.value(), Tensor::new(&[0.0, 1.0, 2.0, 3.0], &[1, 1, 2, 2]));

    // 输出 (c, h*r+i, w*r+j) 取自输入通道 c*r*r + i*r + j 的 (h, w)
    let data: Vec<f32> = (0..32).map(|v| v as f32).collect();
    let x = graph.input(&Tensor::new(&data, &[1, 8, 2, 2]));
    let y = x.pixel_shuffle(2)?.value();
    assert_eq!(y.shape(), &[1, 2, 4, 4]);
    let expected = x.value().view()[[0, 6, 1, 1]];
    assert_eq!(y.view()[[0, 1, 3, 2]], expected);
    Ok(())
}

#[test]
fn test_pixel_shuffle_grad() {
    let graph = Graph::new_with_seed(0);
    let x = param_with(&graph, "x", &seeded_uniform(&[2, 8, 2, 3], -1.0, 1.0, 1).to_vec(), &[2, 8, 2, 3]);
    let target = graph.input(&seeded_uniform(&[2, 2, 4, 6], -1.0, 1.0, 2));
    check_grad(&x, || x.pixel_shuffle(2).unwrap().mse_loss(&target).unwrap(), 1e-2);
}

#[test]
fn test_pixel_shuffle_invalid_channels() {
    let graph = Graph::new_with_seed(0);
    let x = graph.input(&Tensor::zeros(&[1, 6, 2, 2]));
    assert_err!(x.pixel_shuffle(2), GraphError::ShapeMismatch { .. });
}

#[test]
fn test_global_avg_pool() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let x = graph.input(&Tensor::new(
        &[1.0, 2.0, 3.0, 4.0, 10.0, 10.0, 10.0, 10.0],
        &[1, 2, 2, 2],
    ));
    let y = x.global_avg_pool()?;
    assert_eq!(y.value(), Tensor::new(&[2.5, 10.0], &[1, 2, 1, 1]));

    let x = param_with(&graph, "x", &seeded_uniform(&[2, 3, 3, 2], -1.0, 1.0, 3).to_vec(), &[2, 3, 3, 2]);
    let target = graph.input(&seeded_uniform(&[2, 3, 1, 1], -1.0, 1.0, 4));
    check_grad(&x, || x.global_avg_pool().unwrap().mse_loss(&target).unwrap(), 1e-2);
    Ok(())
}

#[test]
fn test_reshape() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let x = param_with(&graph, "x", &seeded_uniform(&[2, 1, 1, 1], -1.0, 1.0, 5).to_vec(), &[2, 1, 1, 1]);
    assert_eq!(x.reshape(&[2])?.shape(), vec![2]);
    assert_err!(x.reshape(&[3]), GraphError::ShapeMismatch { .. });

    let target = graph.input(&Tensor::new(&[0.3, -0.2], &[2]));
    check_grad(&x, || x.reshape(&[2]).unwrap().mse_loss(&target).unwrap(), 1e-2);
    Ok(())
}
