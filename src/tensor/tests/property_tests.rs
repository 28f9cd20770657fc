use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::tensor::Tensor;

#[test]
fn test_reductions() {
    let t = Tensor::new(&[1.0, -2.0, 3.0, 6.0], &[2, 2]);
    assert_eq!(t.sum(), 8.0);
    assert_eq!(t.mean(), 2.0);
    assert_eq!(t.max(), Some(6.0));
    assert_eq!(Tensor::zeros(&[0]).max(), None);
    assert_eq!(Tensor::zeros(&[0]).mean(), 0.0);
}

#[test]
fn test_number_only_for_scalars() {
    assert_eq!(Tensor::scalar(3.5).number(), Some(3.5));
    assert_eq!(Tensor::new(&[3.5], &[1, 1]).number(), Some(3.5));
    assert_eq!(Tensor::new(&[1.0, 2.0], &[2]).number(), None);
}

#[test]
fn test_uniform_within_range_and_seeded() {
    let mut rng = StdRng::seed_from_u64(7);
    let t = Tensor::uniform_with_rng(0.85, 1.1, &[1000], &mut rng);
    assert!(t.to_vec().iter().all(|&x| (0.85..1.1).contains(&x)));

    let mut rng_a = StdRng::seed_from_u64(1);
    let mut rng_b = StdRng::seed_from_u64(1);
    assert_eq!(
        Tensor::normal_with_rng(0.0, 1.0, &[16], &mut rng_a),
        Tensor::normal_with_rng(0.0, 1.0, &[16], &mut rng_b)
    );
}

#[test]
fn test_normal_statistics() {
    let mut rng = StdRng::seed_from_u64(3);
    let t = Tensor::normal_with_rng(1.0, 2.0, &[20001], &mut rng);
    assert_eq!(t.size(), 20001);
    assert!((t.mean() - 1.0).abs() < 0.1);
    let var = t.map(|x| (x - t.mean()).powi(2)).mean();
    assert!((var.sqrt() - 2.0).abs() < 0.1);
}
