//! Address parsing for input lines.

use std::net::IpAddr;

/// Result of parsing one trimmed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedAddress {
    Valid(IpAddr),
    /// The original text, verbatim.
    Invalid(String),
}

/// Parse a trimmed line as an IPv4 or IPv6 address.
///
/// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) are folded to their IPv4
/// form, so they are classified and printed as plain IPv4.
///
/// # Examples
/// ```
/// use cdnfilter::pipeline::{parse_line, ParsedAddress};
/// assert_eq!(parse_line("::ffff:192.0.2.1"), ParsedAddress::Valid("192.0.2.1".parse().unwrap()));
/// assert_eq!(parse_line("nope"), ParsedAddress::Invalid("nope".to_string()));
/// ```
pub fn parse_line(line: &str) -> ParsedAddress {
    match line.parse::<IpAddr>() {
        Ok(ip) => ParsedAddress::Valid(ip.to_canonical()),
        Err(_) => ParsedAddress::Invalid(line.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_parse_ipv4() {
        assert_eq!(
            parse_line("8.8.8.8"),
            ParsedAddress::Valid(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)))
        );
    }

    #[test]
    fn test_parse_ipv6() {
        assert_eq!(
            parse_line("2001:db8::1"),
            ParsedAddress::Valid(IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1)))
        );
    }

    #[test]
    fn test_parse_ipv4_mapped_folds_to_v4() {
        assert_eq!(
            parse_line("::ffff:203.0.113.5"),
            ParsedAddress::Valid(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 5)))
        );
    }

    #[test]
    fn test_parse_ipv4_compatible_stays_v6() {
        // Only the mapped form is folded.
        assert!(matches!(
            parse_line("::1"),
            ParsedAddress::Valid(IpAddr::V6(_))
        ));
    }

    #[test]
    fn test_parse_invalid_keeps_text() {
        for text in ["not-an-ip", "", "1.2.3", "256.0.0.1", "10.0.0.0/8", "fe80::1%eth0"] {
            assert_eq!(parse_line(text), ParsedAddress::Invalid(text.to_string()));
        }
    }

    #[test]
    fn test_parse_rejects_leading_zeros() {
        assert_eq!(
            parse_line("010.0.0.1"),
            ParsedAddress::Invalid("010.0.0.1".to_string())
        );
    }
}
