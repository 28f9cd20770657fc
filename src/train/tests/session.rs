use super::tiny_workspace;
use crate::nn::Module;
use crate::train::{CheckpointTag, Component, MemoryMetricsSink, TrainingSession};

#[test]
fn test_validation_pass() {
    let root = tempfile::tempdir().unwrap();
    let config = tiny_workspace(root.path(), 4, 2);
    let mut session = TrainingSession::new(config.clone(), MemoryMetricsSink::new())
        .unwrap()
        .with_progress(false);
    assert!(config.checkpoint_dir.join("config.json").is_file());

    let report = session.validate(1).unwrap();
    assert_eq!(report.samples, 2);
    assert_eq!(
        report.images,
        vec![
            config.vis_dir.join("epoch_1_index_1.png"),
            config.vis_dir.join("epoch_1_index_2.png"),
        ]
    );
    assert!(report.psnr > 0.0 && report.psnr <= config.psnr_cap_db);
    assert!(report.ssim > -1.0 && report.ssim <= 1.0);
    assert!(session.graph().is_train_mode());
    assert!(session.graph().is_grad_enabled());

    assert_eq!(session.sink().series("psnr"), vec![(1, report.psnr)]);
    assert_eq!(session.sink().series("ssim"), vec![(1, report.ssim)]);
}

#[test]
fn test_pretrain_saves_then_is_reused() {
    let root = tempfile::tempdir().unwrap();
    let config = tiny_workspace(root.path(), 4, 2);

    let mut first = TrainingSession::new(config.clone(), MemoryMetricsSink::new())
        .unwrap()
        .with_progress(false);
    let initial = first.generator().state_dict();
    first.pretrain().unwrap();
    let pretrained = first.generator().state_dict();
    assert_ne!(pretrained, initial);
    assert!(first.checkpoints().exists(Component::NetG, CheckpointTag::Pre));
    assert_eq!(first.sink().series("pretrain_g_loss").len(), config.pretrain_epochs);

    // 已有预训练检查点：直接加载，不再训练
    let mut second = TrainingSession::new(config, MemoryMetricsSink::new())
        .unwrap()
        .with_progress(false);
    assert_eq!(second.generator().state_dict(), initial);
    second.pretrain().unwrap();
    assert_eq!(second.generator().state_dict(), pretrained);
    assert!(second.sink().series("pretrain_g_loss").is_empty());
}

#[test]
fn test_pretrain_and_adversarial_epochs_see_different_batches() {
    use crate::train::pretrain::pretrain_epoch_key;

    let root = tempfile::tempdir().unwrap();
    let config = tiny_workspace(root.path(), 4, 2);
    let session = TrainingSession::new(config, MemoryMetricsSink::new()).unwrap();

    let collect = |key: u64| -> Vec<_> {
        session
            .train_loader
            .iter(key)
            .map(|batch| batch.unwrap().hr)
            .collect()
    };
    for epoch in 1..=3 {
        assert_ne!(pretrain_epoch_key(epoch), epoch as u64);
        // 同一个轮次键可复现
        assert_eq!(collect(pretrain_epoch_key(epoch)), collect(pretrain_epoch_key(epoch)));
        assert_ne!(collect(pretrain_epoch_key(epoch)), collect(epoch as u64));
    }
}
