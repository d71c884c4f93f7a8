//! Canonical rendering of IP address strings.
//!
//! The provider's IPv4 lists arrive in plain dotted-quad form, but its
//! IPv6 lists mix uppercase hex, leading zeros and uncompressed zero
//! runs. Two spellings of the same network would survive deduplication
//! and inflate rules, so every IPv6 address is re-rendered in shortest
//! RFC 5952 form before it enters the cache.

use std::net::IpAddr;

use crate::error::Error;

/// Re-render an IP literal in canonical form.
///
/// A CIDR suffix (`/<prefix>`) is split off, the address portion is
/// normalized and the original suffix is re-appended untouched. Anything
/// that does not parse as an IP address is an error: an address dropped
/// here would be a range left unblocked.
///
/// # Examples
///
/// ```
/// use countryblock::normalize::normalize;
///
/// assert_eq!(
///     normalize("2001:0db8:0000:0000:0000:0000:0000:0001").unwrap(),
///     "2001:db8::1"
/// );
/// assert_eq!(normalize("2001:db8:0:0:0:0:0:1/64").unwrap(), "2001:db8::1/64");
/// assert_eq!(normalize("1.2.3.0/24").unwrap(), "1.2.3.0/24");
/// ```
pub fn normalize(address: &str) -> Result<String, Error> {
    match address.split_once('/') {
        Some((addr, suffix)) => {
            let ip: IpAddr = addr
                .parse()
                .map_err(|_| Error::InvalidAddress(address.to_string()))?;
            Ok(format!("{}/{}", ip, suffix))
        }
        None => {
            let ip: IpAddr = address
                .parse()
                .map_err(|_| Error::InvalidAddress(address.to_string()))?;
            Ok(ip.to_string())
        }
    }
}

/// Normalize a whole list, preserving order. Fails on the first invalid
/// entry rather than skipping it.
pub fn normalize_all(addresses: &[String]) -> Result<Vec<String>, Error> {
    addresses.iter().map(|addr| normalize(addr)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv6_longhand_compressed() {
        assert_eq!(
            normalize("2001:0db8:0000:0000:0000:0000:0000:0001").unwrap(),
            "2001:db8::1"
        );
    }

    #[test]
    fn test_ipv6_cidr_suffix_untouched() {
        assert_eq!(normalize("2001:db8:0:0:0:0:0:1/64").unwrap(), "2001:db8::1/64");
    }

    #[test]
    fn test_ipv6_uppercase_lowered() {
        assert_eq!(normalize("2001:DB8::A").unwrap(), "2001:db8::a");
    }

    #[test]
    fn test_ipv4_passthrough() {
        assert_eq!(normalize("1.2.3.4").unwrap(), "1.2.3.4");
        assert_eq!(normalize("1.2.3.0/24").unwrap(), "1.2.3.0/24");
    }

    #[test]
    fn test_unspecified_and_loopback() {
        assert_eq!(normalize("0:0:0:0:0:0:0:0").unwrap(), "::");
        assert_eq!(normalize("0:0:0:0:0:0:0:1").unwrap(), "::1");
    }

    #[test]
    fn test_invalid_address_rejected() {
        assert!(matches!(normalize("not-an-ip"), Err(Error::InvalidAddress(_))));
        assert!(matches!(normalize(""), Err(Error::InvalidAddress(_))));
        assert!(matches!(normalize("/24"), Err(Error::InvalidAddress(_))));
        assert!(matches!(normalize("1.2.3.4.5"), Err(Error::InvalidAddress(_))));
    }

    #[test]
    fn test_invalid_address_inside_cidr_rejected() {
        assert!(matches!(normalize("zz::1/64"), Err(Error::InvalidAddress(_))));
    }

    #[test]
    fn test_normalize_all_preserves_order() {
        let input = vec![
            "2001:0db8::2".to_string(),
            "2001:0db8::1".to_string(),
        ];
        let output = normalize_all(&input).unwrap();
        assert_eq!(output, vec!["2001:db8::2", "2001:db8::1"]);
    }

    #[test]
    fn test_normalize_all_fails_on_first_invalid() {
        let input = vec!["2001:db8::1".to_string(), "bogus".to_string()];
        assert!(normalize_all(&input).is_err());
    }
}
