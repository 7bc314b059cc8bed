//! Lowers the process file-descriptor limit, so it lives in its own test binary.
#![cfg(unix)]

use portprobe::scanner::{scan_range, ScanConfig};
use portprobe::types::ScanState;
use portprobe::{PortRange, ScanError};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn limit_open_files(max: libc::rlim_t) {
    let mut lim = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: plain syscalls on a stack-allocated struct.
    unsafe {
        assert_eq!(libc::getrlimit(libc::RLIMIT_NOFILE, &mut lim), 0);
        lim.rlim_cur = max.min(lim.rlim_max);
        assert_eq!(libc::setrlimit(libc::RLIMIT_NOFILE, &lim), 0);
    }
}

#[tokio::test]
async fn fd_exhaustion_aborts_the_run() {
    limit_open_files(40);

    let res = tokio::time::timeout(
        Duration::from_secs(30),
        scan_range(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            PortRange::new(1, 5000).unwrap(),
            &ScanConfig::default(),
            CancellationToken::new(),
            |_| {},
        ),
    )
    .await
    .expect("aborted scan must still return");

    match res {
        Err(err @ ScanError::HostLevel { .. }) => {
            assert_eq!(err.run_state(), ScanState::Aborted);
            if let ScanError::HostLevel { source, .. } = &err {
                assert_eq!(source.raw_os_error(), Some(libc::EMFILE));
            }
        }
        other => panic!("expected host-level abort, got {other:?}"),
    }
}
