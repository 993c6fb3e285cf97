//! Derangement computation over a participant list.
//!
//! The assignment is a deterministic shuffle followed by circular adjacency:
//! each participant gives to the next one in the shuffled order, wrapping at
//! the end. That structure covers every participant exactly once as giver and
//! once as receiver, and with two or more distinct participants it cannot map
//! anyone onto themselves.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use user_vault::UserId;

/// Maximum shuffle attempts before an assignment is abandoned.
pub(crate) const MAX_ATTEMPTS: u64 = 10;

/// A single giver-to-receiver assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    /// The participant giving a gift.
    pub giver: UserId,
    /// The participant receiving it.
    pub receiver: UserId,
}

/// Computes a cycle-structured assignment over `participants`.
///
/// The shuffle is fully determined by `seed`, so recomputing with the same
/// participants and seed yields the same pairs. Each retry derives its own
/// seed from the attempt number, so the bounded self-assignment retry
/// actually explores new shuffles while the whole sequence stays
/// deterministic. Returns `None` only if a self-assignment survives every
/// attempt, which circular adjacency over two or more distinct participants
/// cannot produce.
pub(crate) fn derange(participants: &[UserId], seed: u64) -> Option<Vec<Pair>> {
    for attempt in 0..MAX_ATTEMPTS {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(attempt));
        let mut order = participants.to_vec();
        order.shuffle(&mut rng);

        let pairs = ring_pairs(&order);
        if pairs.iter().all(|pair| pair.giver != pair.receiver) {
            return Some(pairs);
        }
    }
    None
}

/// Pairs each element with its successor in ring order.
fn ring_pairs(order: &[UserId]) -> Vec<Pair> {
    order
        .iter()
        .zip(order.iter().cycle().skip(1))
        .map(|(&giver, &receiver)| Pair { giver, receiver })
        .collect()
}
