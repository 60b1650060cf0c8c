//! Metric-index interface over the port registry.
//!
//! Metrics are numbered port by port in discovery order and, within a port,
//! in catalog order, so metric `i` is counter `i % COUNTERS` of port
//! `i / COUNTERS`. Every value query runs a throttled refresh pass first.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::catalog::{CounterDefinition, CounterKind, COUNTERS, GROUP};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::field::CounterField;
use crate::port::PortRecord;
use crate::registry::PortRegistry;
use crate::scheduler::RefreshScheduler;

/// Descriptive metadata for one metric.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricInfo {
    pub name: String,
    pub device: String,
    pub port: u32,
    pub kind: CounterKind,
    pub units: &'static str,
    pub description: &'static str,
    pub group: &'static str,
    pub precision: usize,
}

impl MetricInfo {
    fn new(port: &PortRecord, definition: &CounterDefinition) -> Self {
        Self {
            name: definition.metric_name(port.device(), port.port()),
            device: port.device().to_string(),
            port: port.port(),
            kind: definition.kind,
            units: definition.units,
            description: definition.description,
            group: GROUP,
            precision: definition.precision,
        }
    }

    /// Format a value with this metric's display precision.
    pub fn format(&self, value: f64) -> String {
        format!("{:.*}", self.precision, value)
    }
}

/// A metric together with its value, if one is available.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sample {
    #[serde(flatten)]
    pub info: MetricInfo,
    pub value: Option<f64>,
}

pub struct Collector {
    registry: PortRegistry,
    scheduler: RefreshScheduler,
}

impl Collector {
    /// Discover ports using the configured root and refresh interval.
    pub fn new(config: &Config) -> Result<Self> {
        Self::initialize(
            config.general().root(),
            config.general().interval(),
            Arc::new(SystemClock),
        )
    }

    /// Discover ports under `root` and run an initial refresh pass, so that
    /// counts are available and rates are baselined right away.
    pub fn initialize(root: &Path, interval: Duration, clock: Arc<dyn Clock>) -> Result<Self> {
        let registry = PortRegistry::discover(root)?;
        let scheduler = RefreshScheduler::new(interval, clock);

        let mut collector = Self {
            registry,
            scheduler,
        };

        collector.refresh();

        debug!(
            "collector initialized with {} metrics",
            collector.metric_count()
        );

        Ok(collector)
    }

    pub fn registry(&self) -> &PortRegistry {
        &self.registry
    }

    pub fn interval(&self) -> Duration {
        self.scheduler.interval()
    }

    /// Number of scalar metrics reported: ports times counters per port.
    pub fn metric_count(&self) -> usize {
        self.registry.metric_count()
    }

    pub fn metric_name(&self, index: usize) -> Result<String> {
        let (port, definition, _) = self.locate(index)?;
        Ok(definition.metric_name(port.device(), port.port()))
    }

    pub fn metric_info(&self, index: usize) -> Result<MetricInfo> {
        let (port, definition, _) = self.locate(index)?;
        Ok(MetricInfo::new(port, definition))
    }

    /// Refresh, then return the metric's value if it is available.
    pub fn metric_value(&mut self, index: usize) -> Result<Option<f64>> {
        self.locate(index)?;
        self.refresh();

        let (_, _, field) = self.locate(index)?;
        Ok(field.value())
    }

    /// Refresh once, then return every metric in index order.
    pub fn snapshot(&mut self) -> Vec<Sample> {
        self.refresh();

        self.registry
            .ports()
            .iter()
            .flat_map(|port| {
                port.counters().map(move |(definition, field)| Sample {
                    info: MetricInfo::new(port, definition),
                    value: field.value(),
                })
            })
            .collect()
    }

    /// Run a throttled refresh pass over every port. Returns the number of
    /// counter files read.
    pub fn refresh(&mut self) -> usize {
        self.registry.refresh(&self.scheduler)
    }

    /// Forget all state and discover ports again. Returns the new metric
    /// count.
    pub fn rescan(&mut self) -> Result<usize> {
        let count = self.registry.rescan()?;
        self.refresh();
        Ok(count)
    }

    /// Release all ports. Further queries see zero metrics.
    pub fn shutdown(&mut self) {
        self.registry.teardown();
    }

    fn locate(
        &self,
        index: usize,
    ) -> Result<(&PortRecord, &'static CounterDefinition, &CounterField)> {
        let port = self
            .registry
            .ports()
            .get(index / COUNTERS)
            .ok_or_else(|| Error::MetricIndex {
                index,
                count: self.metric_count(),
            })?;

        let slot = index % COUNTERS;

        Ok((port, &port.catalog()[slot], &port.fields()[slot]))
    }
}
