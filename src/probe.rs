use crate::error::is_host_level;
use crate::types::ProbeResult;
use log::{debug, trace};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time;

/// Payload written to every open port to coax a reply out of HTTP-ish services.
pub const PROBE_PAYLOAD: &[u8] = b"HEAD / HTTP/1.0\r\n\r\n";
pub const BANNER_TIMEOUT_MARKER: &str = "No Banner (Timeout)";
pub const UNKNOWN_SERVICE_MARKER: &str = "Unknown Service";
const BANNER_READ_LIMIT: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOptions {
    pub connect_timeout: Duration,
    pub banner_timeout: Duration,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(500),
            banner_timeout: Duration::from_millis(1000),
        }
    }
}

/// Probe a single port: bounded connect, then a best-effort banner grab.
///
/// - Refused, reset and timed-out connects are reported as `Closed`.
/// - Only errors classified by [`is_host_level`] become `ProbeResult::Error`.
/// - The stream is owned here and dropped on every path, including when the
///   returned future is dropped mid-flight.
pub async fn probe(target: IpAddr, port: u16, opts: &ProbeOptions) -> ProbeResult {
    let addr = SocketAddr::new(target, port);
    let mut stream = match time::timeout(opts.connect_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) if is_host_level(&e) => {
            debug!("{addr}: host-level connect failure: {e}");
            return ProbeResult::Error { port, cause: e };
        }
        Ok(Err(e)) => {
            trace!("{addr}: closed ({e})");
            return ProbeResult::Closed { port };
        }
        Err(_) => {
            trace!("{addr}: connect timed out");
            return ProbeResult::Closed { port };
        }
    };

    let banner = grab_banner(&mut stream, opts.banner_timeout).await;
    debug!("{addr}: open, banner {banner:?}");
    ProbeResult::Open { port, banner }
}

/// Send the probe payload and read up to 1 KiB, mapping failures to placeholder text.
async fn grab_banner(stream: &mut TcpStream, banner_timeout: Duration) -> String {
    if let Err(e) = stream.write_all(PROBE_PAYLOAD).await {
        trace!("probe write failed: {e}");
    }

    let mut buf = vec![0u8; BANNER_READ_LIMIT];
    match time::timeout(banner_timeout, stream.read(&mut buf)).await {
        Ok(Ok(n)) => extract_banner(&buf[..n]).unwrap_or_else(|| UNKNOWN_SERVICE_MARKER.to_string()),
        Ok(Err(e)) => {
            trace!("banner read failed: {e}");
            UNKNOWN_SERVICE_MARKER.to_string()
        }
        Err(_) => BANNER_TIMEOUT_MARKER.to_string(),
    }
}

/// First non-empty line of a lossily decoded reply, trimmed. `None` if nothing usable.
pub fn extract_banner(raw: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    let line = text.trim().lines().next()?.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}
