use crate::assert_err;
use crate::train::{TrainConfig, TrainError};
use std::path::PathBuf;

#[test]
fn test_default_config() {
    let config = TrainConfig::default();
    assert_eq!(config.crop_size, 64);
    assert_eq!(config.num_epochs, 100);
    assert_eq!(config.batch_size, 64);
    assert_eq!(config.check_point, -1);
    assert_eq!(config.train_set, PathBuf::from("data/train"));
    assert_eq!(config.dev_set, PathBuf::from("data/dev"));
    assert_eq!(config.vis_image_cap, 60);
    assert!(config.is_fresh_start());
    assert!(config.validate().is_ok());
}

#[test]
fn test_epoch_range() {
    let fresh = TrainConfig {
        num_epochs: 3,
        ..TrainConfig::default()
    };
    assert_eq!(fresh.epochs(), 1..=3);

    let resumed = TrainConfig {
        num_epochs: 3,
        check_point: 10,
        ..TrainConfig::default()
    };
    assert!(!resumed.is_fresh_start());
    assert_eq!(resumed.start_epoch(), 10);
    assert_eq!(resumed.epochs(), 11..=13);

    let from_zero = TrainConfig {
        num_epochs: 2,
        check_point: 0,
        ..TrainConfig::default()
    };
    assert!(!from_zero.is_fresh_start());
    assert_eq!(from_zero.epochs(), 1..=2);
}

#[test]
fn test_validate_rejects_bad_values() {
    let bad = [
        TrainConfig {
            batch_size: 0,
            ..TrainConfig::default()
        },
        TrainConfig {
            crop_size: 3,
            ..TrainConfig::default()
        },
        TrainConfig {
            check_point: -2,
            ..TrainConfig::default()
        },
        TrainConfig {
            real_label_range: (1.1, 0.85),
            ..TrainConfig::default()
        },
        TrainConfig {
            upscale_factor: 2,
            ..TrainConfig::default()
        },
    ];
    for config in bad {
        assert_err!(config.validate(), TrainError::InvalidConfig(_));
    }
}

#[test]
fn test_rooted_at_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let config = TrainConfig::default().rooted_at(dir.path());
    assert_eq!(config.checkpoint_dir, dir.path().join("cp"));
    assert_eq!(config.train_set, dir.path().join("data/train"));

    let path = config.save().unwrap();
    assert_eq!(path, dir.path().join("cp/config.json"));
    let loaded: TrainConfig =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(loaded, config);
}
