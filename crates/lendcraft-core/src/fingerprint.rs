//! Content-addressed event identifiers.
//!
//! The id of an event is a pure function of its content. Two devices that
//! record the same fact produce the same id without talking to each other,
//! which is what makes merging logs a plain set union.
//!
//! The hash is not cryptographic. It only needs to be deterministic across
//! implementations and well distributed: two 32-bit multiply/xor lanes over
//! the UTF-8 bytes of `lender|borrower|card|timestamp|kind`, cross-mixed at
//! the end and rendered as 16 lowercase hex digits.

use crate::fact::{EventId, KindTag};

const SEED_1: u32 = 0xdead_beef;
const SEED_2: u32 = 0x41c6_ce57;

const LANE_1: u32 = 2_654_435_761;
const LANE_2: u32 = 1_597_334_677;

const AVALANCHE_1: u32 = 2_246_822_507;
const AVALANCHE_2: u32 = 3_266_489_909;

/// Compute the id of an event from its content fields.
pub fn fingerprint(
  lender_name: &str,
  borrower_name: &str,
  card_name: &str,
  timestamp: i64,
  kind: KindTag,
) -> EventId {
  let input =
    format!("{lender_name}|{borrower_name}|{card_name}|{timestamp}|{kind}");
  EventId::new(hex::encode(hash64(input.as_bytes())))
}

/// The two-lane hash, big-endian `lane2 ‖ lane1`.
pub fn hash64(bytes: &[u8]) -> [u8; 8] {
  let mut h1 = SEED_1;
  let mut h2 = SEED_2;

  for &b in bytes {
    h1 = (h1 ^ u32::from(b)).wrapping_mul(LANE_1);
    h2 = (h2 ^ u32::from(b)).wrapping_mul(LANE_2);
  }

  h1 = (h1 ^ (h1 >> 16)).wrapping_mul(AVALANCHE_1);
  h1 ^= (h2 ^ (h2 >> 13)).wrapping_mul(AVALANCHE_2);
  h2 = (h2 ^ (h2 >> 16)).wrapping_mul(AVALANCHE_1);
  h2 ^= (h1 ^ (h1 >> 13)).wrapping_mul(AVALANCHE_2);

  let mut out = [0u8; 8];
  out[..4].copy_from_slice(&h2.to_be_bytes());
  out[4..].copy_from_slice(&h1.to_be_bytes());
  out
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;

  // Reference values; any other implementation of the scheme must agree.
  #[test]
  fn known_vectors() {
    assert_eq!(
      fingerprint("Alice", "Bo", "Lightning Bolt", 1000, KindTag::Lend).as_str(),
      "294c76511920168a"
    );
    assert_eq!(
      fingerprint("Alice", "Bo", "Lightning Bolt", 1001, KindTag::Lend).as_str(),
      "d5c91e071238871f"
    );
    assert_eq!(
      fingerprint("Ålice", "Bo", "Sol Ring", 0, KindTag::Return).as_str(),
      "1d228a398b88a3da"
    );
    assert_eq!(hex::encode(hash64(b"")), "488bdcb81aee8d83");
  }

  #[test]
  fn kind_changes_the_id() {
    let lend = fingerprint("A", "B", "Sol Ring", 1, KindTag::Lend);
    let ret = fingerprint("A", "B", "Sol Ring", 1, KindTag::Return);
    assert_ne!(lend, ret);
  }

  #[test]
  fn names_are_case_sensitive() {
    let a = fingerprint("Alice", "Bo", "Sol Ring", 1, KindTag::Lend);
    let b = fingerprint("alice", "Bo", "Sol Ring", 1, KindTag::Lend);
    assert_ne!(a, b);
  }

  proptest! {
    #[test]
    fn deterministic(
      lender in ".{1,16}",
      borrower in ".{1,16}",
      card in ".{1,32}",
      ts in any::<i64>(),
    ) {
      let a = fingerprint(&lender, &borrower, &card, ts, KindTag::Lend);
      let b = fingerprint(&lender, &borrower, &card, ts, KindTag::Lend);
      prop_assert_eq!(a.as_str().len(), 16);
      prop_assert_eq!(a, b);
    }
  }
}
