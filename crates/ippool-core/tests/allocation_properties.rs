//! Allocation Property Tests
//!
//! Random allocation sequences must keep reservations disjoint, hand out first-fit
//! blocks in increasing address order, exhaust at exactly the expected count and
//! survive a state round trip unchanged.

#![allow(clippy::unwrap_used)]

use ippool_core::{Address, BlockRequest, CidrAllocator};
use proptest::prelude::*;

/// Pool prefixes kept small enough that exhaustive checks stay fast
fn arb_pool() -> impl Strategy<Value = Address> {
    (any::<u32>(), 20u32..=30).prop_map(|(value, prefix)| Address::with_prefix(value, prefix).unwrap())
}

fn arb_request(pool: Address) -> impl Strategy<Value = BlockRequest> {
    let free = 32 - u32::from(pool.prefix_len().unwrap_or(32));
    prop_oneof![
        (0..=free).prop_map(|size| BlockRequest::Size(size as u8)),
        (any::<u32>(), 0..=free).prop_map(move |(offset, size)| {
            let prefix = 32 - size;
            let value = pool.value() | (offset & ((1u64 << free) - 1) as u32);
            BlockRequest::Address(Address::with_prefix(value, prefix).unwrap())
        }),
    ]
}

fn overlaps(a: &Address, b: &Address) -> bool {
    a.contains(b) || b.contains(a)
}

proptest! {
    /// Every successful reservation is disjoint from every other one
    #[test]
    fn prop_reservations_never_overlap(
        (pool, requests) in arb_pool().prop_flat_map(|pool| {
            (Just(pool), prop::collection::vec(arb_request(pool), 1..40))
        })
    ) {
        let mut cidr = CidrAllocator::new(pool).unwrap();
        for (i, request) in requests.into_iter().enumerate() {
            let _ = cidr.allocate(&format!("k{i}"), request);
        }
        let blocks: Vec<Address> = cidr.reservations().into_iter().map(|(_, b)| b).collect();
        for (i, a) in blocks.iter().enumerate() {
            prop_assert!(pool.contains(a));
            for b in &blocks[i + 1..] {
                prop_assert!(!overlaps(a, b), "{} overlaps {}", a, b);
            }
        }
    }

    /// Sequential same-size requests come back in increasing address order
    #[test]
    fn prop_first_fit_is_increasing(pool in arb_pool(), size in 0u8..=1) {
        let mut cidr = CidrAllocator::new(pool).unwrap();
        let first = cidr.allocate_by_size("first", size).unwrap();
        let second = cidr.allocate_by_size("second", size).unwrap();
        prop_assert!(first < second);
        prop_assert!(!overlaps(&first, &second));
    }

    /// Exactly 2^(free - size) blocks fit before the pool is exhausted
    #[test]
    fn prop_exhaustion_count(free in 0u8..=8, size_seed in any::<u8>()) {
        let size = size_seed % (free + 1);
        let pool = Address::with_prefix(0x0A00_0000, u32::from(32 - free)).unwrap();
        let mut cidr = CidrAllocator::new(pool).unwrap();
        let expected = 1usize << (free - size);
        let mut previous: Option<Address> = None;
        for i in 0..expected {
            let block = cidr.allocate_by_size(&format!("k{i}"), size).unwrap();
            if let Some(prev) = previous {
                prop_assert!(prev < block);
            }
            previous = Some(block);
        }
        let err = cidr.allocate_by_size("overflow", size).unwrap_err();
        prop_assert_eq!(err.to_string(), "couldn't find a suitable CIDR block");
    }

    /// Rebuilding from a snapshot yields the same snapshot
    #[test]
    fn prop_state_round_trip(
        (pool, requests) in arb_pool().prop_flat_map(|pool| {
            (Just(pool), prop::collection::vec(arb_request(pool), 0..30))
        })
    ) {
        let mut cidr = CidrAllocator::new(pool).unwrap();
        for (i, request) in requests.into_iter().enumerate() {
            let _ = cidr.allocate(&format!("Key{i}"), request);
        }
        let state = cidr.to_state();
        let rebuilt = CidrAllocator::from_state(&state).unwrap();
        prop_assert_eq!(rebuilt.to_state(), state);
    }
}
