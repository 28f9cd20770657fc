use super::write_gradient;
use crate::assert_err;
use crate::data::DataError;
use crate::data::transforms::{
    DISPLAY_SIZE, center_crop, display_transform, open_rgb, valid_crop_size,
};
use crate::tensor::Tensor;

#[test]
fn test_valid_crop_size() {
    assert_eq!(valid_crop_size(64, 4), 64);
    assert_eq!(valid_crop_size(66, 4), 64);
    assert_eq!(valid_crop_size(3, 4), 0);
}

#[test]
fn test_center_crop_offsets() {
    let dir = tempfile::tempdir().unwrap();
    write_gradient(dir.path(), "img.png", 10, 6);
    let path = dir.path().join("img.png");
    let img = open_rgb(&path).unwrap();

    let crop = center_crop(&img, 4, &path).unwrap();
    let full = Tensor::from_image(&img);
    let cropped = Tensor::from_image(&crop);
    // 左上角偏移 ((10-4)/2, (6-4)/2) = (3, 1)
    assert_eq!(cropped.view()[[0, 0, 0]], full.view()[[0, 1, 3]]);

    assert_err!(center_crop(&img, 8, &path), DataError::ImageTooSmall { .. });
}

#[test]
fn test_display_transform_shape() {
    let wide = Tensor::full(&[3, 8, 16], 0.5);
    let out = display_transform(&wide).unwrap();
    let size = DISPLAY_SIZE as usize;
    assert_eq!(out.shape(), &[3, size, size]);

    let batched = Tensor::full(&[1, 3, 12, 12], 0.25);
    assert_eq!(display_transform(&batched).unwrap().shape(), &[3, size, size]);

    assert!(display_transform(&Tensor::zeros(&[2, 3, 4, 4])).is_err());
}
