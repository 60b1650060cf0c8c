//! Discovery and ownership of device/port records.
//!
//! The stats root holds one directory per device, and each device holds a
//! `ports` directory with one numbered directory per port:
//!
//! ```text
//! /sys/class/infiniband/mlx5_0/ports/1/counters/port_rcv_data
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::catalog::COUNTERS;
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::port::PortRecord;
use crate::scheduler::RefreshScheduler;

/// Default location of the InfiniBand stats tree.
pub const DEFAULT_ROOT: &str = "/sys/class/infiniband";

/// Owns every [`PortRecord`] discovered under a stats root. Records are kept
/// in discovery order, which is sorted by device name and then port number.
#[derive(Debug, Default)]
pub struct PortRegistry {
    root: PathBuf,
    ports: Vec<PortRecord>,
}

impl PortRegistry {
    /// Walk `root` and build a record for every recognized device/port pair.
    ///
    /// Fails only if `root` itself cannot be read. Devices with no matching
    /// driver or no readable `ports` directory are skipped.
    pub fn discover(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let mut ports = Vec::new();

        for device in list_dirs(&root)? {
            let Some(name) = device.file_name().to_str().map(str::to_string) else {
                debug!("skipping device with non-utf8 name: {:?}", device.path());
                continue;
            };

            let Some(driver) = Driver::resolve(&name) else {
                debug!("unknown driver for device '{name}'");
                continue;
            };

            let ports_dir = device.path().join("ports");

            let entries = match list_dirs(&ports_dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("skipping device '{name}': {e}");
                    continue;
                }
            };

            for entry in entries {
                let Some(port) = entry.file_name().to_str().and_then(parse_port) else {
                    debug!("skipping non-port entry {:?}", entry.path());
                    continue;
                };

                debug!("found {driver} device '{name}' port {port}");

                ports.push(PortRecord::new(
                    name.clone(),
                    port,
                    driver,
                    entry.path().to_path_buf(),
                ));
            }
        }

        ports.sort_by(|a, b| a.device().cmp(b.device()).then(a.port().cmp(&b.port())));

        info!(
            "discovered {} InfiniBand ports under {}",
            ports.len(),
            root.display()
        );

        Ok(Self { root, ports })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ports(&self) -> &[PortRecord] {
        &self.ports
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Total number of scalar metrics: ports times counters per port.
    pub fn metric_count(&self) -> usize {
        self.ports.len() * COUNTERS
    }

    /// Refresh every port in discovery order.
    pub fn refresh(&mut self, scheduler: &RefreshScheduler) -> usize {
        scheduler.refresh_all(&mut self.ports)
    }

    /// Release every record. Calling this on an empty registry is a no-op.
    pub fn teardown(&mut self) {
        if !self.ports.is_empty() {
            debug!("releasing {} port records", self.ports.len());
        }
        self.ports.clear();
    }

    /// Tear down and discover again under the same root.
    pub fn rescan(&mut self) -> Result<usize> {
        self.teardown();
        *self = Self::discover(&self.root)?;
        Ok(self.metric_count())
    }
}

/// Immediate subdirectories of `path`, following symlinks. An error is
/// returned only if `path` itself cannot be read.
fn list_dirs(path: &Path) -> Result<Vec<DirEntry>> {
    let mut dirs = Vec::new();

    let walker = WalkDir::new(path)
        .follow_links(true)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter();

    for entry in walker.filter_entry(|e| !is_hidden(e)) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(Error::Discovery {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
            Err(e) => {
                debug!("skipping unreadable entry: {e}");
                continue;
            }
        };

        if entry.depth() == 0 {
            if !entry.file_type().is_dir() {
                return Err(Error::NotADirectory {
                    path: path.to_path_buf(),
                });
            }
            continue;
        }

        if entry.file_type().is_dir() {
            dirs.push(entry);
        }
    }

    Ok(dirs)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

/// Port directories are named by a positive decimal integer.
fn parse_port(name: &str) -> Option<u32> {
    match name.parse::<u32>() {
        Ok(port) if port > 0 => Some(port),
        _ => None,
    }
}
