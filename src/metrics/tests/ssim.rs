use crate::assert_err;
use crate::errors::TensorError;
use crate::metrics::ssim;
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn random_image(shape: &[usize], seed: u64) -> Tensor {
    let mut rng = StdRng::seed_from_u64(seed);
    Tensor::uniform_with_rng(0.0, 1.0, shape, &mut rng)
}

#[test]
fn test_ssim_of_identical_images_is_one() {
    let img = random_image(&[2, 3, 16, 16], 1);
    assert_abs_diff_eq!(ssim(&img, &img).unwrap(), 1.0, epsilon = 1e-4);
}

#[test]
fn test_ssim_drops_with_noise() {
    let clean = random_image(&[1, 3, 16, 16], 2);
    let noise = random_image(&[1, 3, 16, 16], 3);
    let slightly = &clean * 0.9 + &noise * 0.1;
    let heavily = &clean * 0.3 + &noise * 0.7;

    let s_slight = ssim(&clean, &slightly).unwrap();
    let s_heavy = ssim(&clean, &heavily).unwrap();
    assert!(s_slight < 1.0);
    assert!(s_heavy < s_slight);
    // 对称
    assert_abs_diff_eq!(s_heavy, ssim(&heavily, &clean).unwrap(), epsilon = 1e-5);
}

#[test]
fn test_ssim_accepts_single_image() {
    let a = random_image(&[3, 12, 12], 4);
    let b = random_image(&[3, 12, 12], 5);
    let single = ssim(&a, &b).unwrap();
    let batched = ssim(&a.reshape(&[1, 3, 12, 12]), &b.reshape(&[1, 3, 12, 12])).unwrap();
    assert_abs_diff_eq!(single, batched);
}

#[test]
fn test_ssim_batch_is_mean_of_samples() {
    let a = random_image(&[2, 3, 8, 8], 6);
    let b = random_image(&[2, 3, 8, 8], 7);
    let s0 = ssim(&a.select(0), &b.select(0)).unwrap();
    let s1 = ssim(&a.select(1), &b.select(1)).unwrap();
    assert_abs_diff_eq!(ssim(&a, &b).unwrap(), (s0 + s1) / 2.0, epsilon = 1e-5);
}

#[test]
fn test_ssim_rejects_bad_input() {
    let a = Tensor::zeros(&[3, 8]);
    assert_err!(ssim(&a, &a), TensorError::DimensionMismatch { .. });
    assert_err!(
        ssim(&Tensor::zeros(&[3, 8, 8]), &Tensor::zeros(&[3, 8, 9])),
        TensorError::OperatorError { .. }
    );
}
