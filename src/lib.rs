//! Discovers InfiniBand device ports under the kernel's stats tree and turns
//! their raw counters into count and rate metrics.
//!
//! A [`Collector`] owns a [`PortRegistry`] built once at startup. Each value
//! query runs a refresh pass in which every counter advances its own state
//! machine, with file reads throttled to the configured minimum interval.

pub mod catalog;
pub mod clock;
pub mod collector;
pub mod config;
pub mod driver;
mod error;
pub mod exposition;
pub mod field;
pub mod port;
pub mod registry;
pub mod scheduler;

pub use crate::catalog::{Counter, CounterDefinition, CounterKind, COUNTERS};
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::collector::{Collector, MetricInfo, Sample};
pub use crate::config::Config;
pub use crate::driver::Driver;
pub use crate::error::{Error, Result};
pub use crate::field::{CounterField, FieldState};
pub use crate::port::PortRecord;
pub use crate::registry::{PortRegistry, DEFAULT_ROOT};
pub use crate::scheduler::{RefreshScheduler, DEFAULT_INTERVAL, MIN_INTERVAL};
