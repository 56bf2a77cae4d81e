//! Address classification helpers.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Returned whenever no trustworthy origin can be determined.
pub const UNKNOWN_ORIGIN: &str = "0.0.0.0";

/// Check if an address is private, internal or otherwise not a routable client.
///
/// Covers RFC 1918, loopback, link-local, unspecified, IPv6 unique-local and
/// link-local, and IPv4-mapped forms of those. The empty string and anything
/// that does not parse as an address are treated as private: they are never a
/// better answer than a real public address.
pub fn is_private_ip(candidate: &str) -> bool {
    match candidate.trim().parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => is_private_v4(v4),
        Ok(IpAddr::V6(v6)) => match v6.to_ipv4_mapped() {
            Some(v4) => is_private_v4(v4),
            None => is_private_v6(v6),
        },
        Err(_) => true,
    }
}

fn is_private_v4(addr: Ipv4Addr) -> bool {
    addr.is_private() || addr.is_loopback() || addr.is_link_local() || addr.is_unspecified()
}

fn is_private_v6(addr: Ipv6Addr) -> bool {
    let first = addr.segments()[0];
    addr.is_loopback()
        || addr.is_unspecified()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
}

/// Syntactic check applied before an origin is handed to callers.
///
/// Accepts a dotted quad whose four octets are 1-3 decimal digits in 0-255, or
/// a non-empty run of hex digits and colons. The IPv6 half is deliberately
/// loose: it only keeps separators and control characters out.
pub fn is_valid_ip_format(candidate: &str) -> bool {
    is_dotted_quad(candidate) || is_ipv6_charset(candidate)
}

fn is_dotted_quad(candidate: &str) -> bool {
    let octets: Vec<&str> = candidate.split('.').collect();
    octets.len() == 4
        && octets.iter().all(|octet| {
            (1..=3).contains(&octet.len())
                && octet.bytes().all(|b| b.is_ascii_digit())
                && octet.parse::<u16>().is_ok_and(|value| value <= 255)
        })
}

fn is_ipv6_charset(candidate: &str) -> bool {
    !candidate.is_empty() && candidate.bytes().all(|b| b.is_ascii_hexdigit() || b == b':')
}
