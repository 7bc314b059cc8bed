use std::path::PathBuf;
use std::time::Duration;

use portprobe::output;
use portprobe::ports::parse_port_range;
use portprobe::probe::ProbeOptions;
use portprobe::resolve::resolve_target;
use portprobe::scanner::{self, ScanConfig, DEFAULT_CONCURRENCY};

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;

/// portprobe: concurrent TCP port scanner for a single host, with banner grabbing.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "portprobe",
    version,
    about = "Concurrent TCP port scanner for a single host, with banner grabbing.",
    long_about = None
)]
struct Cli {
    /// Target IP address or hostname.
    target: String,

    /// First port of the range (0-65535).
    #[arg(allow_negative_numbers = true)]
    start_port: String,

    /// Last port of the range, inclusive (0-65535).
    #[arg(allow_negative_numbers = true)]
    end_port: String,

    /// Max concurrent TCP connect attempts.
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Socket connect timeout in milliseconds.
    #[arg(long = "timeout-ms", default_value_t = 500)]
    timeout_ms: u64,

    /// Banner read timeout in milliseconds.
    #[arg(long = "banner-timeout-ms", default_value_t = 1000)]
    banner_timeout_ms: u64,

    /// Write the report as pretty JSON to this path (optional).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long = "no-color", default_value_t = false)]
    no_color: bool,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli).await {
        output::print_error(format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let range = parse_port_range(&cli.start_port, &cli.end_port)?;
    let target = resolve_target(&cli.target)
        .await
        .with_context(|| format!("please check the address {:?}", cli.target))?;

    let config = ScanConfig {
        concurrency: cli.concurrency,
        probe: ProbeOptions {
            connect_timeout: Duration::from_millis(cli.timeout_ms),
            banner_timeout: Duration::from_millis(cli.banner_timeout_ms),
        },
    };

    // Ctrl-C cancels the scan; in-flight sockets are closed before the run returns.
    let cancel = CancellationToken::new();
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_ctrlc.cancel();
        }
    });

    output::print_scan_header(target, range);
    let report = scanner::scan_range(target, range, &config, cancel, output::print_open_port)
        .await
        .with_context(|| format!("scan of {target} aborted"))?;
    output::print_summary(&report);

    if let Some(path) = cli.output.as_deref() {
        output::write_report_json(path, &report)?;
        println!("Wrote JSON report to {}", path.display());
    }
    Ok(())
}
