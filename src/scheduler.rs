use std::sync::Arc;
use std::time::Duration;

use tracing::{trace, warn};

use crate::clock::Clock;
use crate::port::PortRecord;

/// Default minimum time between two reads of the same counter file.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// Shortest accepted refresh interval. Rates are never computed over a
/// shorter time delta.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Drives refresh passes over ports, bounding how often the underlying
/// counter files are read no matter how often values are requested.
#[derive(Clone)]
pub struct RefreshScheduler {
    interval: Duration,
    clock: Arc<dyn Clock>,
}

impl RefreshScheduler {
    /// An `interval` below [`MIN_INTERVAL`] is raised to it.
    pub fn new(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        let interval = if interval < MIN_INTERVAL {
            warn!(
                "refresh interval {} is below the minimum, using {}",
                humantime::format_duration(interval),
                humantime::format_duration(MIN_INTERVAL)
            );
            MIN_INTERVAL
        } else {
            interval
        };

        Self { interval, clock }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Refresh one port with a freshly sampled timestamp.
    pub fn refresh_port(&self, port: &mut PortRecord) -> usize {
        port.refresh(self.clock.now(), self.interval)
    }

    /// Refresh every port, in order. Each port samples its own timestamp.
    pub fn refresh_all(&self, ports: &mut [PortRecord]) -> usize {
        let reads = ports.iter_mut().map(|p| self.refresh_port(p)).sum();

        trace!("refresh pass over {} ports read {reads} counters", ports.len());

        reads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Counter, COUNTERS};
    use crate::clock::ManualClock;
    use crate::driver::Driver;

    fn port(dir: &std::path::Path) -> PortRecord {
        PortRecord::new("mlx5_0".into(), 1, Driver::Mlx5, dir.to_path_buf())
    }

    fn populate(dir: &std::path::Path, value: u64) {
        let counters = dir.join("counters");
        std::fs::create_dir_all(&counters).unwrap();
        for definition in Driver::Mlx5.catalog() {
            std::fs::write(dir.join(definition.path), format!("{value}\n")).unwrap();
        }
    }

    #[test]
    fn repeated_passes_within_interval_do_not_read() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path(), 10);

        let clock = ManualClock::default();
        let scheduler = RefreshScheduler::new(DEFAULT_INTERVAL, Arc::new(clock.clone()));
        let mut ports = vec![port(dir.path())];

        assert_eq!(scheduler.refresh_all(&mut ports), COUNTERS);

        for _ in 0..10 {
            clock.advance(Duration::from_millis(10));
            assert_eq!(scheduler.refresh_all(&mut ports), 0);
        }

        clock.advance(DEFAULT_INTERVAL);
        assert_eq!(scheduler.refresh_all(&mut ports), COUNTERS);
    }

    #[test]
    fn interval_is_floored() {
        let clock = Arc::new(ManualClock::default());

        let scheduler = RefreshScheduler::new(Duration::ZERO, clock.clone());
        assert_eq!(scheduler.interval(), MIN_INTERVAL);

        let scheduler = RefreshScheduler::new(Duration::from_micros(10), clock.clone());
        assert_eq!(scheduler.interval(), MIN_INTERVAL);

        let scheduler = RefreshScheduler::new(Duration::from_secs(2), clock);
        assert_eq!(scheduler.interval(), Duration::from_secs(2));
    }

    #[test]
    fn rates_follow_the_clock() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path(), 1000);

        let clock = ManualClock::default();
        let scheduler = RefreshScheduler::new(DEFAULT_INTERVAL, Arc::new(clock.clone()));
        let mut ports = vec![port(dir.path())];

        scheduler.refresh_all(&mut ports);

        populate(dir.path(), 1300);
        clock.advance(Duration::from_secs(1));
        scheduler.refresh_all(&mut ports);

        let rx = ports[0].field(Counter::RxPackets.index()).unwrap();
        assert_eq!(rx.value(), Some(300.0));

        let errors = ports[0].field(Counter::RxErrors.index()).unwrap();
        assert_eq!(errors.value(), Some(1300.0));
    }
}
