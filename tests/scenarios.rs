use ibcounters::{Collector, Counter, Error, ManualClock, COUNTERS};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const INTERVAL: Duration = Duration::from_millis(500);

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn initialize(root: &Path) -> (Collector, ManualClock) {
    let clock = ManualClock::default();
    let collector = Collector::initialize(root, INTERVAL, Arc::new(clock.clone())).unwrap();
    (collector, clock)
}

#[test]
fn count_counter_reports_raw_value() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "mlx5_0/ports/1/counters/port_rcv_errors",
        "42\n",
    );

    let (mut collector, _) = initialize(dir.path());
    assert_eq!(collector.metric_count(), COUNTERS);

    let idx = Counter::RxErrors.index();
    assert_eq!(collector.metric_name(idx).unwrap(), "mlx5_0_p1_RxErrs");
    assert_eq!(collector.metric_value(idx).unwrap(), Some(42.0));
}

#[test]
fn rate_counter_reports_per_second_change() {
    let dir = tempfile::tempdir().unwrap();
    let file = "mlx5_0/ports/1/counters/port_xmit_packets";
    write(dir.path(), file, "1000\n");

    let (mut collector, clock) = initialize(dir.path());
    let idx = Counter::TxPackets.index();

    // one reading is only a baseline
    assert_eq!(collector.metric_value(idx).unwrap(), None);

    write(dir.path(), file, "1300\n");
    clock.advance(Duration::from_secs(1));

    assert_eq!(collector.metric_value(idx).unwrap(), Some(300.0));
}

#[test]
fn queries_within_interval_reuse_cached_values() {
    let dir = tempfile::tempdir().unwrap();
    let file = "mlx5_0/ports/1/counters/port_xmit_packets";
    write(dir.path(), file, "1000\n");

    let (mut collector, clock) = initialize(dir.path());
    let idx = Counter::TxPackets.index();

    write(dir.path(), file, "2000\n");
    clock.advance(Duration::from_secs(1));
    assert_eq!(collector.metric_value(idx).unwrap(), Some(1000.0));

    write(dir.path(), file, "9000\n");
    for _ in 0..4 {
        clock.advance(Duration::from_millis(100));
        assert_eq!(collector.metric_value(idx).unwrap(), Some(1000.0));
    }

    clock.advance(Duration::from_millis(100));
    // 7000 over the 0.5s since the last read
    assert_eq!(collector.metric_value(idx).unwrap(), Some(14000.0));
}

#[test]
fn deleted_counter_becomes_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let file = "mlx5_0/ports/1/counters/symbol_error";
    write(dir.path(), file, "3\n");

    let (mut collector, clock) = initialize(dir.path());
    let idx = Counter::SymbolErrors.index();

    assert_eq!(collector.metric_value(idx).unwrap(), Some(3.0));

    std::fs::remove_file(dir.path().join(file)).unwrap();
    clock.advance(INTERVAL);

    assert_eq!(collector.metric_value(idx).unwrap(), None);

    // and comes back once the file does
    write(dir.path(), file, "4\n");
    assert_eq!(collector.metric_value(idx).unwrap(), Some(4.0));
}

#[test]
fn one_bad_counter_does_not_block_others() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "mlx5_0/ports/1/counters/symbol_error", "bogus\n");
    write(dir.path(), "mlx5_0/ports/1/counters/port_rcv_errors", "5\n");

    let (mut collector, _) = initialize(dir.path());

    assert_eq!(
        collector
            .metric_value(Counter::SymbolErrors.index())
            .unwrap(),
        None
    );
    assert_eq!(
        collector.metric_value(Counter::RxErrors.index()).unwrap(),
        Some(5.0)
    );
}

#[test]
fn mlx4_reads_extended_counters() {
    let dir = tempfile::tempdir().unwrap();
    let file = "mlx4_0/ports/1/counters_ext/port_rcv_data_64";
    write(dir.path(), file, "0\n");

    let (mut collector, clock) = initialize(dir.path());
    let idx = Counter::RxWords.index();

    write(dir.path(), file, "4096\n");
    clock.advance(Duration::from_secs(2));

    assert_eq!(collector.metric_name(idx).unwrap(), "mlx4_0_p1_RxWords");
    assert_eq!(collector.metric_value(idx).unwrap(), Some(2048.0));
}

#[test]
fn unknown_devices_and_bad_ports_are_excluded() {
    let dir = tempfile::tempdir().unwrap();
    for port in ["0", "abc", "2"] {
        std::fs::create_dir_all(dir.path().join("mlx5_0/ports").join(port)).unwrap();
    }
    std::fs::create_dir_all(dir.path().join("hfi1_0/ports/1")).unwrap();

    let (collector, _) = initialize(dir.path());

    assert_eq!(collector.metric_count(), COUNTERS);
    assert_eq!(collector.metric_name(0).unwrap(), "mlx5_0_p2_TxPkt");
}

#[test]
fn missing_root_fails_initialization() {
    let dir = tempfile::tempdir().unwrap();
    let result = Collector::initialize(
        &dir.path().join("missing"),
        INTERVAL,
        Arc::new(ManualClock::default()),
    );

    assert!(matches!(result, Err(Error::Discovery { .. })));
}

#[test]
fn empty_root_reports_no_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let (mut collector, _) = initialize(dir.path());

    assert_eq!(collector.metric_count(), 0);
    assert!(collector.snapshot().is_empty());
    assert!(matches!(
        collector.metric_value(0),
        Err(Error::MetricIndex { index: 0, count: 0 })
    ));
}
