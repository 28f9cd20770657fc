use super::TINY_G;
use crate::model::{Generator, GeneratorConfig};
use crate::nn::{Graph, GraphError, Module, VarLossOps};
use crate::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn test_generator_default_param_count() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let generator = Generator::new(&graph, GeneratorConfig::default())?;
    assert_eq!(generator.num_params(), 734_219);
    Ok(())
}

#[test]
fn test_generator_output_shape_and_range() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let generator = Generator::new(&graph, TINY_G)?;
    let mut rng = StdRng::seed_from_u64(1);
    let lr = graph.input(&Tensor::uniform_with_rng(0.0, 1.0, &[2, 3, 3, 5], &mut rng));

    let sr = generator.forward(&lr)?;
    assert_eq!(sr.shape(), vec![2, 3, 12, 20]);
    sr.with_value(|v| assert!(v.view().iter().all(|&p| (0.0..=1.0).contains(&p))));
    Ok(())
}

#[test]
fn test_generator_state_names() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let generator = Generator::new(&graph, TINY_G)?;
    let state = generator.state_dict();
    assert!(state.names().all(|n| n.starts_with("generator.")));
    assert!(state.get("generator.residual2.bn2.running_var").is_some());
    assert!(state.get("generator.upsample2.prelu.weight").is_some());
    assert!(state.get("generator.residual3.conv1.weight").is_none());
    // 参数 + 每个 BN 的两个缓冲区（2 个残差块各 2 个 BN，外加 trunk BN）
    assert_eq!(state.len(), generator.parameters().len() + 2 * 5);
    Ok(())
}

#[test]
fn test_generator_backward_reaches_every_parameter() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let generator = Generator::new(&graph, TINY_G)?;
    let mut rng = StdRng::seed_from_u64(2);
    let lr = graph.input(&Tensor::uniform_with_rng(0.0, 1.0, &[2, 3, 2, 2], &mut rng));
    let hr = graph.input(&Tensor::uniform_with_rng(0.0, 1.0, &[2, 3, 8, 8], &mut rng));

    generator.forward(&lr)?.mse_loss(&hr)?.backward()?;
    for p in generator.parameters() {
        let grad = p.grad().unwrap_or_else(|| panic!("{} 没有梯度", p.name()));
        assert!(grad.is_finite());
    }
    Ok(())
}

#[test]
fn test_generator_eval_mode_is_deterministic() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(0);
    let generator = Generator::new(&graph, TINY_G)?;
    let mut rng = StdRng::seed_from_u64(3);
    let lr = Tensor::uniform_with_rng(0.0, 1.0, &[1, 3, 2, 2], &mut rng);

    graph.eval();
    let before = generator.state_dict();
    let a = graph.no_grad(|| generator.forward(&graph.input(&lr)))?;
    let b = graph.no_grad(|| generator.forward(&graph.input(&lr)))?;
    assert_eq!(a.value(), b.value());
    assert!(!a.requires_grad());
    // 评估模式不更新 BN 滑动统计量
    assert_eq!(generator.state_dict(), before);
    Ok(())
}
