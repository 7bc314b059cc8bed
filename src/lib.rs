//! Library crate for portprobe: single-host TCP connect scanning with banner grabbing.
pub mod error;
pub mod output;
pub mod ports;
pub mod probe;
pub mod resolve;
pub mod scanner;
pub mod types;

pub use error::ScanError;
pub use types::{OpenPort, PortRange, ProbeResult, ScanReport};
