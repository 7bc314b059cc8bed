use crate::error::ScanError;
use crate::types::PortRange;

/// Parse the start/end port arguments into a validated inclusive range.
///
/// Rules:
/// - both values must be integers (surrounding whitespace is ignored)
/// - both must lie in `0..=65535`
/// - `start <= end`
pub fn parse_port_range(start: &str, end: &str) -> Result<PortRange, ScanError> {
    let start = parse_port_str(start)?;
    let end = parse_port_str(end)?;
    PortRange::new(start, end)
}

fn parse_port_str(s: &str) -> Result<u16, ScanError> {
    let s = s.trim();
    let val: i64 = s
        .parse()
        .map_err(|_| ScanError::InvalidArgument(format!("port must be an integer: {s:?}")))?;
    u16::try_from(val).map_err(|_| {
        ScanError::InvalidArgument(format!("port out of range (0-65535): {val}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bounds_inclusive() {
        let r = parse_port_range("0", "65535").unwrap();
        assert_eq!((r.start(), r.end()), (0, 65535));
    }

    #[test]
    fn whitespace_tolerated() {
        let r = parse_port_range(" 80 ", "81\n").unwrap();
        assert_eq!((r.start(), r.end()), (80, 81));
    }

    #[test]
    fn non_integer_rejected() {
        assert!(matches!(
            parse_port_range("http", "81"),
            Err(ScanError::InvalidArgument(_))
        ));
        assert!(parse_port_range("80", "8.5").is_err());
    }

    #[test]
    fn out_of_range_rejected() {
        assert!(parse_port_range("-1", "10").is_err());
        assert!(parse_port_range("1", "65536").is_err());
    }

    #[test]
    fn inverted_rejected() {
        assert!(parse_port_range("443", "80").is_err());
    }
}
