//! Per-counter state machine.
//!
//! A field starts out `Unknown`. A successful read baselines it: a count is
//! reportable immediately (`Valued`) while a rate waits for a second reading
//! (`Inited`). Later reads are throttled by the minimum refresh interval. Any
//! failed read drops the field back to `Unknown`, discarding the baseline, so
//! no rate is ever computed across a gap in readings.

use std::path::Path;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, trace};

use crate::catalog::CounterDefinition;
use crate::error::ReadError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldState {
    #[default]
    Unknown,
    Inited,
    Valued,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CounterField {
    state: FieldState,
    current: f64,
    last_value: f64,
    last_read: Option<Instant>,
}

impl CounterField {
    pub fn state(&self) -> FieldState {
        self.state
    }

    /// The reportable value, present only once the field is `Valued`.
    pub fn value(&self) -> Option<f64> {
        match self.state {
            FieldState::Valued => Some(self.current),
            _ => None,
        }
    }

    /// Time of the most recent successful read.
    pub fn last_read(&self) -> Option<Instant> {
        self.last_read
    }

    /// Advance this field using the counter file at `definition.path` under
    /// `port_dir`. Returns `true` if the file was read (successfully or not).
    pub fn refresh(
        &mut self,
        definition: &CounterDefinition,
        port_dir: &Path,
        now: Instant,
        interval: Duration,
    ) -> bool {
        let elapsed = match (self.state, self.last_read) {
            (FieldState::Inited | FieldState::Valued, Some(last)) => {
                let elapsed = now.saturating_duration_since(last);
                if elapsed.is_zero() || elapsed < interval {
                    return false;
                }
                Some(elapsed.as_secs_f64())
            }
            _ => None,
        };

        let path = port_dir.join(definition.path);

        let value = match read_counter(&path) {
            Ok(value) => value,
            Err(e) => {
                if self.state != FieldState::Unknown {
                    debug!("counter {} became unavailable: {e}", path.display());
                } else {
                    trace!("counter {} unavailable: {e}", path.display());
                }
                self.reset();
                return true;
            }
        };

        trace!("read counter {} => {value}", path.display());

        match elapsed {
            None => match definition.kind.baseline(value) {
                Some(current) => {
                    self.current = current;
                    self.state = FieldState::Valued;
                }
                None => self.state = FieldState::Inited,
            },
            Some(elapsed) => {
                self.current = definition.kind.advance(self.last_value, value, elapsed);
                self.state = FieldState::Valued;
            }
        }

        self.last_value = value;
        self.last_read = Some(now);

        true
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Read a counter file holding a single decimal value.
pub(crate) fn read_counter(path: &Path) -> Result<f64, ReadError> {
    let raw = std::fs::read_to_string(path)?;

    let token = raw.split_whitespace().next().unwrap_or("");

    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ReadError::Parse(token.to_string())),
    }
}
