use crate::error::ScanError;
use crate::probe::{probe, ProbeOptions};
use crate::types::{OpenPort, PortRange, ProbeResult, ScanReport, ScanState};
use log::{debug, info, warn};
use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_CONCURRENCY: usize = 512;
pub const MAX_CONCURRENCY: usize = 5_000;
const RESULT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Max in-flight probes. Clamped to `1..=MAX_CONCURRENCY`.
    pub concurrency: usize,
    pub probe: ProbeOptions,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            probe: ProbeOptions::default(),
        }
    }
}

/// Scan every port in `range` on `target` and return the aggregate report.
pub async fn scan(
    target: IpAddr,
    range: PortRange,
    config: &ScanConfig,
) -> Result<ScanReport, ScanError> {
    scan_range(target, range, config, CancellationToken::new(), |_| {}).await
}

/// Scan with an external cancellation token and a hook called as each open port is found.
pub async fn scan_range<F>(
    target: IpAddr,
    range: PortRange,
    config: &ScanConfig,
    cancel: CancellationToken,
    on_open: F,
) -> Result<ScanReport, ScanError>
where
    F: FnMut(&OpenPort),
{
    scan_range_with(target, range, config, cancel, on_open, |ip, port, opts| async move {
        probe(ip, port, &opts).await
    })
    .await
}

/// Same as [`scan_range`], with the per-port check supplied by the caller.
///
/// - One `prober` task per port, at most `config.concurrency` in flight (`Semaphore`).
/// - Tasks send their `ProbeResult` over a channel; this function is the only
///   writer of the open-port list, so no lock is needed.
/// - The first `ProbeResult::Error` cancels the remaining tasks. Results still
///   queued behind it are drained and dropped, so `on_open` never fires after
///   the abort. Every task is joined before returning, on both paths.
pub async fn scan_range_with<F, P, Fut>(
    target: IpAddr,
    range: PortRange,
    config: &ScanConfig,
    cancel: CancellationToken,
    mut on_open: F,
    prober: P,
) -> Result<ScanReport, ScanError>
where
    F: FnMut(&OpenPort),
    P: Fn(IpAddr, u16, ProbeOptions) -> Fut + Send + 'static,
    Fut: Future<Output = ProbeResult> + Send + 'static,
{
    let started = Instant::now();
    let started_at = OffsetDateTime::now_utc();
    info!(
        "scanning {target} ports {}-{} ({} ports, concurrency {})",
        range.start(),
        range.end(),
        range.len(),
        config.concurrency
    );

    // Child token: aborting this run must not cancel the caller's token.
    let run_cancel = cancel.child_token();
    let (tx, mut rx) = mpsc::channel::<ProbeResult>(RESULT_CHANNEL_CAPACITY);
    let launcher = tokio::spawn(launch_probes(
        target,
        range,
        config.concurrency,
        config.probe,
        run_cancel.clone(),
        tx,
        prober,
    ));
    log_transition(ScanState::Idle, ScanState::Running);

    let mut open_ports: Vec<OpenPort> = Vec::new();
    let mut scanned: u64 = 0;
    let mut fatal: Option<ScanError> = None;

    while let Some(result) = rx.recv().await {
        if fatal.is_some() {
            continue;
        }
        scanned += 1;
        match result {
            ProbeResult::Open { port, banner } => {
                let entry = OpenPort {
                    port,
                    banner,
                    discovered_at: OffsetDateTime::now_utc(),
                };
                on_open(&entry);
                open_ports.push(entry);
            }
            ProbeResult::Closed { .. } => {}
            ProbeResult::Error { port, cause } => {
                warn!("aborting scan of {target}: port {port}: {cause}");
                fatal = Some(ScanError::HostLevel {
                    port,
                    source: cause,
                });
                run_cancel.cancel();
            }
        }
    }

    // Barrier: the channel is closed, now wait for the launcher to join every task.
    let joined = launcher.await;

    let outcome = match fatal {
        Some(err) => Err(err),
        None => joined.map_err(ScanError::from).and_then(|r| r),
    }
    .and_then(|()| {
        if scanned < u64::from(range.len()) && cancel.is_cancelled() {
            Err(ScanError::Cancelled)
        } else {
            Ok(())
        }
    });
    if let Err(err) = outcome {
        log_transition(ScanState::Running, err.run_state());
        return Err(err);
    }

    let elapsed = started.elapsed();
    log_transition(ScanState::Running, ScanState::Completed);
    info!(
        "scan of {target} finished: {} open of {scanned} in {:.2?}",
        open_ports.len(),
        elapsed
    );

    Ok(ScanReport {
        target,
        start_port: range.start(),
        end_port: range.end(),
        ports_scanned: scanned,
        open_count: open_ports.len() as u64,
        open_ports,
        elapsed_ms: elapsed.as_millis() as u64,
        started_at,
        state: ScanState::Completed,
    })
}

/// Spawn one task per port as semaphore permits free up, then join them all.
async fn launch_probes<P, Fut>(
    target: IpAddr,
    range: PortRange,
    concurrency: usize,
    opts: ProbeOptions,
    cancel: CancellationToken,
    tx: mpsc::Sender<ProbeResult>,
    prober: P,
) -> Result<(), ScanError>
where
    P: Fn(IpAddr, u16, ProbeOptions) -> Fut + Send + 'static,
    Fut: Future<Output = ProbeResult> + Send + 'static,
{
    let sem = Arc::new(Semaphore::new(concurrency.clamp(1, MAX_CONCURRENCY)));
    let mut set = JoinSet::new();
    let mut first_err: Option<tokio::task::JoinError> = None;

    for port in range.iter() {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = sem.clone().acquire_owned() => match permit {
                Ok(p) => p,
                Err(_) => break,
            },
        };
        let tx = tx.clone();
        let cancel = cancel.clone();
        let check = prober(target, port, opts);

        set.spawn(async move {
            let _permit = permit; // held until the check finishes

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                result = check => result,
            };
            // Receiver only goes away once the run is over.
            let _ = tx.send(result).await;
        });

        // Reap finished tasks so the set does not grow with the range.
        while let Some(res) = set.try_join_next() {
            if let Err(e) = res {
                first_err.get_or_insert(e);
            }
        }
    }
    drop(tx);

    while let Some(res) = set.join_next().await {
        if let Err(e) = res {
            first_err.get_or_insert(e);
        }
    }

    match first_err {
        Some(e) => Err(ScanError::Task(e)),
        None => Ok(()),
    }
}

fn log_transition(from: ScanState, to: ScanState) {
    debug!("scan state {from:?} -> {to:?}");
}
