//! IP utility functions for segment derivation and prefix matching

use std::net::IpAddr;

use ipnet::IpNet;

/// Parse `a.b.c.d/nn` (or an IPv6 prefix); a bare address becomes a host prefix
pub fn parse_prefix_or_addr(value: &str) -> Option<IpNet> {
    let value = value.trim();
    if let Ok(net) = value.parse::<IpNet>() {
        return Some(net);
    }
    value.parse::<IpAddr>().ok().map(IpNet::from)
}

/// Subnet (network address + prefix length) of an interface address
///
/// `"172.16.0.1/30"` gives `"172.16.0.0/30"`; a bare address is its own
/// host subnet (`/32` or `/128`).
pub fn segment_of(ip_cidr: &str) -> Option<String> {
    parse_prefix_or_addr(ip_cidr).map(|net| net.trunc().to_string())
}

/// First address in `ip_addresses` that yields a subnet
pub fn first_segment(ip_addresses: &[String]) -> Option<String> {
    ip_addresses.iter().find_map(|ip| segment_of(ip))
}

/// Whether `inner` (prefix or address) lies inside `outer`
pub fn prefix_contains(outer: &IpNet, inner: &IpNet) -> bool {
    outer.contains(inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_of() {
        assert_eq!(segment_of("172.16.0.1/30").as_deref(), Some("172.16.0.0/30"));
        assert_eq!(segment_of("192.168.10.77/24").as_deref(), Some("192.168.10.0/24"));
        assert_eq!(segment_of("2001:db8::1/64").as_deref(), Some("2001:db8::/64"));
        assert_eq!(segment_of("10.0.0.1").as_deref(), Some("10.0.0.1/32"));
        assert_eq!(segment_of("2001:db8::1").as_deref(), Some("2001:db8::1/128"));
        assert_eq!(segment_of("junk"), None);
    }

    #[test]
    fn test_first_segment_skips_unparsable() {
        let ips = vec!["bad".to_string(), "10.1.2.3/16".to_string()];
        assert_eq!(first_segment(&ips).as_deref(), Some("10.1.0.0/16"));
        assert_eq!(first_segment(&[]), None);
    }

    #[test]
    fn test_parse_prefix_or_addr() {
        assert_eq!(
            parse_prefix_or_addr("10.0.0.5").unwrap().to_string(),
            "10.0.0.5/32"
        );
        assert_eq!(
            parse_prefix_or_addr(" 10.1.0.0/16 ").unwrap().to_string(),
            "10.1.0.0/16"
        );
        assert!(parse_prefix_or_addr("10.0.0.300").is_none());
        assert_eq!(parse_prefix_or_addr("::1").unwrap().to_string(), "::1/128");
    }

    #[test]
    fn test_prefix_contains() {
        let outer = parse_prefix_or_addr("10.0.0.0/8").unwrap();
        let inner = parse_prefix_or_addr("10.1.0.0/16").unwrap();
        let host = parse_prefix_or_addr("10.200.3.4").unwrap();
        let other = parse_prefix_or_addr("192.168.0.0/16").unwrap();
        assert!(prefix_contains(&outer, &inner));
        assert!(prefix_contains(&outer, &host));
        assert!(!prefix_contains(&inner, &outer));
        assert!(!prefix_contains(&outer, &other));
    }
}
