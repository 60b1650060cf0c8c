//! Static counter definitions for each recognized driver.
//!
//! Every catalog has exactly [`COUNTERS`] slots and the slot order is shared
//! across drivers, so a counter index names the same logical counter no
//! matter which driver a port is bound to. The paths are relative to the
//! port directory, e.g. `/sys/class/infiniband/mlx5_0/ports/1`.

use serde::Serialize;

/// Number of counters tracked for every port.
pub const COUNTERS: usize = 11;

/// Metric group reported alongside every counter.
pub const GROUP: &str = "infiniband";

/// A catalog is one definition per counter slot.
pub type Catalog = [CounterDefinition; COUNTERS];

/// How a raw reading becomes a reportable value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterKind {
    /// The raw cumulative value is reported as-is.
    Count,
    /// The change between two readings divided by the elapsed seconds.
    Rate,
}

impl CounterKind {
    /// Value that becomes reportable right after a counter is baselined, if
    /// any. A count needs no baseline so the first reading is its value.
    pub fn baseline(self, value: f64) -> Option<f64> {
        match self {
            Self::Count => Some(value),
            Self::Rate => None,
        }
    }

    /// Value computed from the previous reading, the fresh reading, and the
    /// seconds between them. Counter wraps and resets are not special-cased:
    /// a rate across a reset comes out negative.
    pub fn advance(self, previous: f64, value: f64, elapsed: f64) -> f64 {
        match self {
            Self::Count => value,
            Self::Rate => (value - previous) / elapsed,
        }
    }
}

/// Logical identity of a counter slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Counter {
    TxPackets = 0,
    TxWords,
    TxErrors,
    TxMulticast,
    RxPackets,
    RxWords,
    RxErrors,
    RxMulticast,
    BufferOverrunErrors,
    SymbolErrors,
    TxDropped,
}

impl Counter {
    pub const ALL: [Counter; COUNTERS] = [
        Counter::TxPackets,
        Counter::TxWords,
        Counter::TxErrors,
        Counter::TxMulticast,
        Counter::RxPackets,
        Counter::RxWords,
        Counter::RxErrors,
        Counter::RxMulticast,
        Counter::BufferOverrunErrors,
        Counter::SymbolErrors,
        Counter::TxDropped,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CounterDefinition {
    /// File holding the raw value, relative to the port directory.
    pub path: &'static str,
    /// Suffix of the metric name, see [`CounterDefinition::metric_name`].
    pub name: &'static str,
    pub kind: CounterKind,
    pub units: &'static str,
    /// Digits after the decimal point when the value is displayed.
    pub precision: usize,
    pub description: &'static str,
}

impl CounterDefinition {
    const fn new(
        path: &'static str,
        name: &'static str,
        kind: CounterKind,
        units: &'static str,
        description: &'static str,
    ) -> Self {
        let precision = match kind {
            CounterKind::Count => 0,
            CounterKind::Rate => 3,
        };

        Self {
            path,
            name,
            kind,
            units,
            precision,
            description,
        }
    }

    /// Name of this counter's metric for a given device and port, such as
    /// `mlx5_0_p1_TxPkt`.
    pub fn metric_name(&self, device: &str, port: u32) -> String {
        format!("{device}_p{port}_{}", self.name)
    }
}

use CounterKind::{Count, Rate};

const TX_ERRORS: CounterDefinition = CounterDefinition::new(
    "counters/port_xmit_constraint_errors",
    "TxErrs",
    Count,
    "",
    "Transmit error count",
);

const RX_ERRORS: CounterDefinition = CounterDefinition::new(
    "counters/port_rcv_errors",
    "RxErrs",
    Count,
    "",
    "Receive error count",
);

const BUFFER_OVERRUN_ERRORS: CounterDefinition = CounterDefinition::new(
    "counters/excessive_buffer_overrun_errors",
    "BufferOverrunErr",
    Count,
    "",
    "Buffer overrun error count",
);

const SYMBOL_ERRORS: CounterDefinition = CounterDefinition::new(
    "counters/symbol_error",
    "IBSymbolErr",
    Count,
    "",
    "Symbol error count",
);

const TX_DROPPED: CounterDefinition = CounterDefinition::new(
    "counters/port_xmit_discards",
    "TxDropped",
    Count,
    "",
    "Dropped transmit count",
);

/// ConnectX-3 and older expose 64-bit traffic counters under `counters_ext`.
pub static MLX4: Catalog = [
    CounterDefinition::new(
        "counters_ext/port_xmit_packets_64",
        "TxPkt",
        Rate,
        "pkt/s",
        "Packets transmitted (in packets per second)",
    ),
    CounterDefinition::new(
        "counters_ext/port_xmit_data_64",
        "TxWords",
        Rate,
        "word/s",
        "Words transmitted (in words per second)",
    ),
    TX_ERRORS,
    CounterDefinition::new(
        "counters_ext/port_multicast_xmit_packets",
        "TxMulticast",
        Rate,
        "pkt/s",
        "Multicast packets transmitted (in packets per second)",
    ),
    CounterDefinition::new(
        "counters_ext/port_rcv_packets_64",
        "RxPkt",
        Rate,
        "pkt/s",
        "Packets received (in packets per second)",
    ),
    CounterDefinition::new(
        "counters_ext/port_rcv_data_64",
        "RxWords",
        Rate,
        "word/s",
        "Words received (in words per second)",
    ),
    RX_ERRORS,
    CounterDefinition::new(
        "counters_ext/port_multicast_rcv_packets",
        "RxMulticast",
        Rate,
        "pkt/s",
        "Multicast packets received (in packets per second)",
    ),
    BUFFER_OVERRUN_ERRORS,
    SYMBOL_ERRORS,
    TX_DROPPED,
];

pub static MLX5: Catalog = [
    CounterDefinition::new(
        "counters/port_xmit_packets",
        "TxPkt",
        Rate,
        "pkt/s",
        "Packets transmitted (in packets per second)",
    ),
    CounterDefinition::new(
        "counters/port_xmit_data",
        "TxWords",
        Rate,
        "word/s",
        "Words transmitted (in words per second)",
    ),
    TX_ERRORS,
    CounterDefinition::new(
        "counters/multicast_xmit_packets",
        "TxMulticast",
        Rate,
        "pkt/s",
        "Multicast packets transmitted (in packets per second)",
    ),
    CounterDefinition::new(
        "counters/port_rcv_packets",
        "RxPkt",
        Rate,
        "pkt/s",
        "Packets received (in packets per second)",
    ),
    CounterDefinition::new(
        "counters/port_rcv_data",
        "RxWords",
        Rate,
        "word/s",
        "Words received (in words per second)",
    ),
    RX_ERRORS,
    CounterDefinition::new(
        "counters/multicast_rcv_packets",
        "RxMulticast",
        Rate,
        "pkt/s",
        "Multicast packets received (in packets per second)",
    ),
    BUFFER_OVERRUN_ERRORS,
    SYMBOL_ERRORS,
    TX_DROPPED,
];
