use crate::error::{Error, Result};

use serde::Deserialize;

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod general;
mod log;

pub use general::General;
pub use log::{Level, Log};

fn root() -> String {
    crate::registry::DEFAULT_ROOT.into()
}

fn interval() -> String {
    "500ms".into()
}

fn listen() -> String {
    "0.0.0.0:4244".into()
}

#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    general: General,
    #[serde(default)]
    log: Log,
}

impl Config {
    pub fn load(path: &dyn AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("unable to open {}: {e}", path.display())))?;

        content.parse()
    }

    /// Validate every section.
    pub fn check(&self) -> Result<()> {
        self.general.check()
    }

    pub fn general(&self) -> &General {
        &self.general
    }

    pub fn general_mut(&mut self) -> &mut General {
        &mut self.general
    }

    pub fn log(&self) -> &Log {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut Log {
        &mut self.log
    }
}

impl std::str::FromStr for Config {
    type Err = Error;

    fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {e}")))?;

        config.check()?;

        Ok(config)
    }
}
