//! Console and file rendering of scan events and reports.
use crate::types::{OpenPort, PortRange, ScanReport};
use anyhow::{Context, Result};
use colored::*;
use std::fs::File;
use std::net::IpAddr;
use std::path::Path;

pub fn print_scan_header(target: IpAddr, range: PortRange) {
    println!(
        "\n{} {} {}",
        "--- Starting scan on target:".cyan(),
        target.to_string().cyan().bold(),
        "---".cyan()
    );
    println!("Scanning ports {} through {}...", range.start(), range.end());
}

/// One line per open port, printed as soon as the port is found.
pub fn print_open_port(open: &OpenPort) {
    println!("{}", format_open_port(open));
}

pub fn format_open_port(open: &OpenPort) -> String {
    format!(
        "{} {}",
        format!("[+] Port {:<5} is OPEN.", open.port).green(),
        open.banner.bold()
    )
}

pub fn print_summary(report: &ScanReport) {
    println!("\n{}", "--- Scan Finished ---".yellow());
    println!(
        "{} {}",
        "Total open ports found:".yellow(),
        report.open_count.to_string().yellow().bold()
    );
    println!(
        "{} {:.2?}",
        "Time taken:".yellow(),
        report.elapsed()
    );
    println!("{}", "-".repeat(30).yellow());
}

pub fn print_error(msg: impl std::fmt::Display) {
    eprintln!("{} {}", "[ERROR]".red().bold(), msg.to_string().red());
}

pub fn write_report_json(path: &Path, report: &ScanReport) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create output file: {}", path.display()))?;
    serde_json::to_writer_pretty(file, report)
        .with_context(|| format!("failed to write JSON to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScanState;
    use std::net::Ipv4Addr;
    use time::OffsetDateTime;

    fn sample_report() -> ScanReport {
        ScanReport {
            target: IpAddr::V4(Ipv4Addr::LOCALHOST),
            start_port: 80,
            end_port: 81,
            ports_scanned: 2,
            open_count: 1,
            open_ports: vec![OpenPort {
                port: 80,
                banner: "HTTP/1.1 200 OK".into(),
                discovered_at: OffsetDateTime::UNIX_EPOCH,
            }],
            elapsed_ms: 1234,
            started_at: OffsetDateTime::UNIX_EPOCH,
            state: ScanState::Completed,
        }
    }

    #[test]
    fn open_port_line_has_port_and_banner() {
        colored::control::set_override(false);
        let r = sample_report();
        let line = format_open_port(&r.open_ports[0]);
        assert_eq!(line, "[+] Port 80    is OPEN. HTTP/1.1 200 OK");
    }

    #[test]
    fn json_report_written() {
        let path = std::env::temp_dir().join(format!("portprobe-{}.json", std::process::id()));
        write_report_json(&path, &sample_report()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let back: ScanReport = serde_json::from_str(&text).unwrap();
        assert_eq!(back.open_count, 1);
        assert_eq!(back.open_ports[0].banner, "HTTP/1.1 200 OK");
        assert_eq!(back.open_ports[0].discovered_at, OffsetDateTime::UNIX_EPOCH);
        assert_eq!(back.state, ScanState::Completed);

        let raw: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(raw["started_at"], "1970-01-01T00:00:00Z");
        assert_eq!(raw["state"], "completed");
        let _ = std::fs::remove_file(&path);
    }
}
