// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use yare::parameterized;

fn key(t: f64, rank: u32) -> PriorityKey {
    PriorityKey::new(t, Rank(rank))
}

#[parameterized(
    earlier_timestamp_wins = { key(1.0, 5), key(2.0, 0), true },
    later_timestamp_loses = { key(2.0, 0), key(1.0, 5), false },
    tie_smaller_rank_wins = { key(3.0, 1), key(3.0, 2), true },
    tie_larger_rank_loses = { key(3.0, 2), key(3.0, 1), false },
    identical_key_does_not_precede = { key(3.0, 1), key(3.0, 1), false },
    negative_zero_before_zero = { key(-0.0, 1), key(0.0, 0), true },
)]
fn priority_comparison(a: PriorityKey, b: PriorityKey, a_first: bool) {
    assert_eq!(a < b, a_first);
}

#[test]
fn two_peers_equal_timestamps_rank_zero_wins() {
    let name = ResourceName::default();
    let r0 = Request::new(0.25, Rank(0), name.clone());
    let r1 = Request::new(0.25, Rank(1), name);

    assert!(r0.precedes(&r1));
    assert!(!r1.precedes(&r0));
}

#[test]
fn admission_order_of_three_peer_scenario() {
    let order = admission_order([key(5.0, 0), key(3.0, 1), key(3.0, 2)]);
    let ranks: Vec<u32> = order.iter().map(|k| k.rank.0).collect();
    assert_eq!(ranks, vec![1, 2, 0]);
}

#[test]
fn others_wraps_around_own_rank() {
    let others: Vec<u32> = Rank(2).others(4).map(|r| r.0).collect();
    assert_eq!(others, vec![3, 0, 1]);
}

#[test]
fn others_is_empty_for_single_peer() {
    assert_eq!(Rank(0).others(1).count(), 0);
}

#[test]
fn resource_name_accepts_eighty_bytes() {
    let name = "x".repeat(MAX_RESOURCE_NAME);
    assert!(ResourceName::new(name).is_ok());
}

#[test]
fn resource_name_rejects_eighty_one_bytes() {
    let name = "x".repeat(MAX_RESOURCE_NAME + 1);
    assert_eq!(
        ResourceName::new(name),
        Err(NameError::TooLong { len: 81 })
    );
}

#[test]
fn resource_name_rejects_nul() {
    assert_eq!(ResourceName::new("a\0b"), Err(NameError::ContainsNul));
}

#[test]
fn resource_name_deserialize_is_validated() {
    let long = format!("\"{}\"", "y".repeat(100));
    assert!(serde_json::from_str::<ResourceName>(&long).is_err());
    let ok: ResourceName = serde_json::from_str("\"printer\"").unwrap();
    assert_eq!(ok.as_str(), "printer");
}

#[test]
fn nan_timestamps_still_totally_ordered() {
    let a = key(f64::NAN, 0);
    let b = key(1.0, 1);
    // Exactly one of the two precedes the other
    assert!((a < b) ^ (b < a));
}

fn arb_key() -> impl Strategy<Value = PriorityKey> {
    (any::<f64>(), 0u32..16).prop_map(|(t, r)| key(t, r))
}

proptest! {
    #[test]
    fn distinct_keys_are_strictly_ordered(a in arb_key(), b in arb_key()) {
        prop_assume!(a != b);
        prop_assert!((a < b) ^ (b < a));
    }

    #[test]
    fn priority_order_is_transitive(a in arb_key(), b in arb_key(), c in arb_key()) {
        if a < b && b < c {
            prop_assert!(a < c);
        }
    }

    #[test]
    fn tie_is_always_broken_by_rank(t in any::<f64>(), r1 in 0u32..64, r2 in 0u32..64) {
        prop_assume!(r1 != r2);
        let first = key(t, r1.min(r2));
        let second = key(t, r1.max(r2));
        prop_assert!(first < second);
    }
}
