use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::catalog::{Catalog, CounterDefinition, COUNTERS};
use crate::driver::Driver;
use crate::field::CounterField;

/// State for one discovered device/port pair.
#[derive(Debug)]
pub struct PortRecord {
    device: String,
    port: u32,
    driver: Driver,
    dir: PathBuf,
    fields: [CounterField; COUNTERS],
}

impl PortRecord {
    /// Create a record for the port directory `dir`. All fields start out
    /// `Unknown`.
    pub(crate) fn new(device: String, port: u32, driver: Driver, dir: PathBuf) -> Self {
        Self {
            device,
            port,
            driver,
            dir,
            fields: [CounterField::default(); COUNTERS],
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn port(&self) -> u32 {
        self.port
    }

    pub fn driver(&self) -> Driver {
        self.driver
    }

    /// Directory the counter paths are relative to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn catalog(&self) -> &'static Catalog {
        self.driver.catalog()
    }

    pub fn fields(&self) -> &[CounterField; COUNTERS] {
        &self.fields
    }

    pub fn field(&self, idx: usize) -> Option<&CounterField> {
        self.fields.get(idx)
    }

    /// Counter definitions paired with their current state, in catalog order.
    pub fn counters(&self) -> impl Iterator<Item = (&'static CounterDefinition, &CounterField)> {
        self.catalog().iter().zip(self.fields.iter())
    }

    /// Refresh every field in catalog order using a single timestamp.
    /// Returns the number of counter files that were read.
    pub fn refresh(&mut self, now: Instant, interval: Duration) -> usize {
        let catalog = self.driver.catalog();
        let mut reads = 0;

        for (definition, field) in catalog.iter().zip(self.fields.iter_mut()) {
            if field.refresh(definition, &self.dir, now, interval) {
                reads += 1;
            }
        }

        reads
    }
}
