use serde::{Deserialize, Serialize};
use std::io;
use std::net::IpAddr;
use std::ops::RangeInclusive;
use std::time::Duration;
use time::OffsetDateTime;

use crate::error::ScanError;

/// Inclusive TCP port range. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    start: u16,
    end: u16,
}

impl PortRange {
    pub fn new(start: u16, end: u16) -> Result<Self, ScanError> {
        if start > end {
            return Err(ScanError::InvalidArgument(format!(
                "invalid port range {start}-{end} (start > end)"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single(port: u16) -> Self {
        Self { start: port, end: port }
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn end(&self) -> u16 {
        self.end
    }

    /// Number of ports in the range. The full space holds 65536, hence `u32`.
    pub fn len(&self) -> u32 {
        u32::from(self.end) - u32::from(self.start) + 1
    }

    pub fn iter(&self) -> RangeInclusive<u16> {
        self.start..=self.end
    }
}

/// Outcome of probing one port.
#[derive(Debug)]
pub enum ProbeResult {
    Open { port: u16, banner: String },
    Closed { port: u16 },
    /// Host-level socket failure; aborts the run.
    Error { port: u16, cause: io::Error },
}

/// One discovered open port.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OpenPort {
    pub port: u16,
    pub banner: String,
    #[serde(with = "time::serde::rfc3339")]
    pub discovered_at: OffsetDateTime,
}

/// Aggregate of a completed run. `open_ports` is in discovery order.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScanReport {
    pub target: IpAddr,
    pub start_port: u16,
    pub end_port: u16,
    pub ports_scanned: u64,
    pub open_count: u64,
    pub open_ports: Vec<OpenPort>,
    pub elapsed_ms: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    pub state: ScanState,
}

impl ScanReport {
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    /// Open ports sorted by number, for callers that want stable ordering.
    pub fn sorted_ports(&self) -> Vec<u16> {
        let mut ports: Vec<u16> = self.open_ports.iter().map(|p| p.port).collect();
        ports.sort_unstable();
        ports
    }
}

/// Lifecycle of a run: `Idle -> Running -> {Completed, Aborted}`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    Idle,
    Running,
    Completed,
    Aborted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_range_len_does_not_overflow() {
        let r = PortRange::new(0, 65535).unwrap();
        assert_eq!(r.len(), 65536);
        assert_eq!(r.iter().count(), 65536);
    }

    #[test]
    fn inverted_range_rejected() {
        assert!(PortRange::new(81, 80).is_err());
    }

    #[test]
    fn single_port_range() {
        let r = PortRange::single(22);
        assert_eq!(r.len(), 1);
        assert_eq!(r.iter().collect::<Vec<_>>(), vec![22]);
    }
}
