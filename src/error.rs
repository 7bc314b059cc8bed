//! Error types for the scanner.
//!
//! Per-port conditions (refused, reset, timed out) never surface here; they are
//! absorbed by the probe as a closed port. `ScanError` only carries failures that
//! end a run or prevent one from starting.

use crate::types::ScanState;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("cannot resolve hostname: {host}")]
    HostUnresolvable {
        host: String,
        #[source]
        source: Option<io::Error>,
    },

    #[error("socket failure while probing port {port}: {source}")]
    HostLevel {
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("scan cancelled")]
    Cancelled,

    #[error("probe task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ScanError {
    /// Where the run stood when this error ended it. Argument and resolution
    /// failures happen before any probe is launched.
    pub fn run_state(&self) -> ScanState {
        match self {
            ScanError::InvalidArgument(_) | ScanError::HostUnresolvable { .. } => ScanState::Idle,
            ScanError::HostLevel { .. } | ScanError::Cancelled | ScanError::Task(_) => {
                ScanState::Aborted
            }
        }
    }
}

/// Whether a connect error points at the local network stack rather than the port.
///
/// These repeat for every port of the run, so probing further is pointless.
pub fn is_host_level(err: &io::Error) -> bool {
    match err.kind() {
        io::ErrorKind::NetworkUnreachable
        | io::ErrorKind::AddrNotAvailable
        | io::ErrorKind::Unsupported => return true,
        _ => {}
    }
    is_resource_exhaustion(err)
}

#[cfg(unix)]
fn is_resource_exhaustion(err: &io::Error) -> bool {
    matches!(
        err.raw_os_error(),
        Some(libc::EMFILE) | Some(libc::ENFILE) | Some(libc::ENOBUFS)
    )
}

#[cfg(not(unix))]
fn is_resource_exhaustion(_err: &io::Error) -> bool {
    false
}
