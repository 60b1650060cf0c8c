use super::*;

use crate::scheduler::MIN_INTERVAL;

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct General {
    // directory holding one subdirectory per InfiniBand device
    #[serde(default = "root")]
    root: String,

    // counter files are never read more often than this, regardless of how
    // often values are requested
    #[serde(default = "interval")]
    interval: String,

    #[serde(default = "listen")]
    listen: String,
}

impl Default for General {
    fn default() -> Self {
        Self {
            root: root(),
            interval: interval(),
            listen: listen(),
        }
    }
}

impl General {
    pub fn check(&self) -> Result<()> {
        let interval = parse_interval(&self.interval)?;

        if interval < MIN_INTERVAL {
            return Err(Error::Config(format!(
                "interval is too short. Minimum interval is: {}",
                humantime::format_duration(MIN_INTERVAL)
            )));
        }

        self.listen()?;

        Ok(())
    }

    pub fn root(&self) -> &Path {
        Path::new(&self.root)
    }

    pub fn set_root(&mut self, root: PathBuf) {
        self.root = root.to_string_lossy().into_owned();
    }

    /// Minimum refresh interval. Falls back to the default if the configured
    /// value does not parse, which `check` rules out.
    pub fn interval(&self) -> Duration {
        parse_interval(&self.interval).unwrap_or(crate::scheduler::DEFAULT_INTERVAL)
    }

    pub fn set_interval(&mut self, interval: String) {
        self.interval = interval;
    }

    pub fn listen(&self) -> Result<SocketAddr> {
        self.listen
            .to_socket_addrs()
            .map_err(|e| Error::Config(format!("bad listen address: {e}")))?
            .next()
            .ok_or_else(|| Error::Config("could not resolve socket addr".into()))
    }

    pub fn set_listen(&mut self, listen: String) {
        self.listen = listen;
    }
}

fn parse_interval(value: &str) -> Result<Duration> {
    value
        .parse::<humantime::Duration>()
        .map(Into::into)
        .map_err(|e| Error::Config(format!("interval couldn't be parsed: {e}")))
}
