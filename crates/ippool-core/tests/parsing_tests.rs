//! Address parsing and canonical formatting

#![allow(clippy::unwrap_used)]

use ippool_core::{Address, IpPoolError};
use proptest::prelude::*;

#[test]
fn test_parse_plain_and_prefixed_addresses() {
    let ip: Address = "127.0.0.1".parse().unwrap();
    assert_eq!(ip.prefix_len(), None);
    assert_eq!(ip.to_string(), "127.0.0.1");

    let ip: Address = "127.0.0.1/0".parse().unwrap();
    assert_eq!(ip.prefix_len(), Some(0));
    assert_eq!(ip.to_string(), "0.0.0.0/0");

    let ip: Address = "127.0.1.1/24".parse().unwrap();
    assert_eq!(ip.prefix_len(), Some(24));
    assert_eq!(ip.to_string(), "127.0.1.0/24");

    let ip: Address = "127.1.1.1/16".parse().unwrap();
    assert_eq!(ip.prefix_len(), Some(16));
    assert_eq!(ip.to_string(), "127.1.0.0/16");
}

#[test]
fn test_format_errors_name_the_input() {
    let err = "10.0.0/8".parse::<Address>().unwrap_err();
    assert!(matches!(&err, IpPoolError::Format { input, .. } if input == "10.0.0/8"));
    assert!(err.is_business());
}

#[test]
fn test_ipv4_conversion() {
    let ip = Address::from(std::net::Ipv4Addr::new(192, 168, 1, 20));
    assert_eq!(ip.to_string(), "192.168.1.20");
    assert_eq!(ip.ip(), std::net::Ipv4Addr::new(192, 168, 1, 20));
}

proptest! {
    /// Canonical strings parse back to an equal block for every prefix length
    #[test]
    fn prop_canonical_string_round_trip(value in any::<u32>(), prefix in 0u32..=32) {
        let block = Address::with_prefix(value, prefix).unwrap();
        let parsed: Address = block.to_string().parse().unwrap();
        prop_assert_eq!(parsed, block);
        prop_assert_eq!(parsed.prefix_len(), block.prefix_len());
        prop_assert_eq!(parsed.to_string(), block.to_string());
    }

    /// Parsing clears exactly the bits beyond the prefix
    #[test]
    fn prop_parse_masks_host_bits(value in any::<u32>(), prefix in 0u8..=32) {
        let [a, b, c, d] = value.to_be_bytes();
        let parsed: Address = format!("{a}.{b}.{c}.{d}/{prefix}").parse().unwrap();
        let host_bits = 32 - u32::from(prefix);
        prop_assert_eq!(parsed.value().checked_shl(32 - host_bits).unwrap_or(0), 0);
        prop_assert_eq!(
            parsed.value(),
            value.checked_shr(host_bits).unwrap_or(0).checked_shl(host_bits).unwrap_or(0)
        );
    }
}
