use crate::train::{EpochMetrics, JsonlMetricsSink, MemoryMetricsSink, MetricRecord, MetricsSink};
use approx::assert_abs_diff_eq;

#[test]
fn test_epoch_average_is_sum_over_batches() {
    let mut cache = EpochMetrics::new();
    for loss in [0.5, 1.5, 2.5, 3.5] {
        cache.add("g_loss", loss);
        cache.add("d_loss", loss * 2.0);
    }
    assert_abs_diff_eq!(cache.sum("g_loss").unwrap(), 8.0);
    assert!(cache.sum("tv_loss").is_none());

    let averages = cache.averages(4);
    assert_eq!(averages.len(), 2);
    for (name, value) in averages {
        let expected = if name == "g_loss" { 2.0 } else { 4.0 };
        assert_abs_diff_eq!(value, expected);
    }
    assert!(cache.averages(0).is_empty());
}

#[test]
fn test_jsonl_sink_appends_records() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut sink = JsonlMetricsSink::create(&dir.path().join("log")).unwrap();
        sink.log_value("psnr", 21.5, 1).unwrap();
        sink.log_value("ssim", 0.75, 1).unwrap();
    }
    {
        // 重新打开时追加
        let mut sink = JsonlMetricsSink::create(&dir.path().join("log")).unwrap();
        sink.log_value("psnr", 22.0, 2).unwrap();
    }

    let text = std::fs::read_to_string(dir.path().join("log/metrics.jsonl")).unwrap();
    let records: Vec<MetricRecord> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 3);
    assert_eq!(
        records[2],
        MetricRecord {
            name: "psnr".into(),
            value: 22.0,
            step: 2,
        }
    );
}

#[test]
fn test_memory_sink_series() {
    let mut sink = MemoryMetricsSink::new();
    sink.log_value("g_loss", 1.0, 1).unwrap();
    sink.log_value("d_loss", 2.0, 1).unwrap();
    sink.log_value("g_loss", 0.5, 2).unwrap();
    assert_eq!(sink.series("g_loss"), vec![(1, 1.0), (2, 0.5)]);
    assert!(sink.series("psnr").is_empty());
}
