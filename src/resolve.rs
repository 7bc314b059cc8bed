use crate::error::ScanError;
use log::debug;
use std::net::IpAddr;
use tokio::net::lookup_host;

/// Resolve a target argument to the single address that will be scanned.
///
/// IP literals are returned as-is. Hostnames go through the system resolver and
/// the first IPv4 answer wins; the first IPv6 answer is used only when no IPv4
/// address exists.
pub async fn resolve_target(target: &str) -> Result<IpAddr, ScanError> {
    let target = target.trim();
    if let Ok(ip) = target.parse::<IpAddr>() {
        return Ok(ip);
    }
    if target.is_empty() {
        return Err(ScanError::HostUnresolvable {
            host: target.to_string(),
            source: None,
        });
    }

    let addrs: Vec<IpAddr> = lookup_host((target, 0))
        .await
        .map_err(|e| ScanError::HostUnresolvable {
            host: target.to_string(),
            source: Some(e),
        })?
        .map(|sa| sa.ip())
        .collect();
    debug!("{target} resolved to {addrs:?}");

    pick_address(&addrs).ok_or_else(|| ScanError::HostUnresolvable {
        host: target.to_string(),
        source: None,
    })
}

fn pick_address(addrs: &[IpAddr]) -> Option<IpAddr> {
    addrs
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn prefers_ipv4() {
        let v6 = IpAddr::V6(Ipv6Addr::LOCALHOST);
        let v4 = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(pick_address(&[v6, v4]), Some(v4));
        assert_eq!(pick_address(&[v6]), Some(v6));
        assert_eq!(pick_address(&[]), None);
    }

    #[tokio::test]
    async fn literal_needs_no_lookup() {
        let ip = resolve_target("192.0.2.7").await.unwrap();
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::new(192, 0, 2, 7)));
    }
}
