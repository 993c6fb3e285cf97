//! The Secret Santa engine.
//!
//! The engine keeps no state of its own: participation and cached pairs live
//! as attributes on user records, and every operation goes through the
//! [`UserStore`], which stays the sole persistence authority.

use tracing::{error, info, warn};
use user_vault::{StoreError, UserId, UserStore};

use crate::config::SantaConfig;
use crate::pairing::{self, Pair};

/// Result of a per-user pair lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairLookup {
    /// Receiver assigned to the queried giver, when one exists.
    pub receiver: Option<UserId>,
    /// Display names of everyone currently participating.
    pub participants: Vec<String>,
}

/// A Secret Santa exchange over the records of a [`UserStore`].
///
/// "Not found" and "not enough participants" are ordinary return values
/// throughout; the only hard failures are storage errors bubbling up from
/// record flushes.
#[derive(Debug, Clone, Default)]
pub struct SecretSanta {
    config: SantaConfig,
}

impl SecretSanta {
    /// Builds an engine with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an engine with the given configuration.
    #[must_use]
    pub fn with_config(config: SantaConfig) -> Self {
        Self { config }
    }

    /// The engine's configuration.
    #[must_use]
    pub fn config(&self) -> &SantaConfig {
        &self.config
    }

    /// Adds a user to the exchange.
    ///
    /// Returns `Ok(false)` when no record exists for `id`. Joining clears any
    /// previously cached pair so a rejoin never shows a stale assignment;
    /// joining while already participating is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the record flush fails.
    pub fn join(&self, store: &mut UserStore, id: UserId) -> Result<bool, StoreError> {
        if store.get(id).is_none() {
            warn!(id, "unknown user cannot join the exchange");
            return Ok(false);
        }
        store.set_field(id, self.config.participant_key.as_str(), true)?;
        store.delete_field(id, &self.config.pair_key)?;
        info!(id, "user joined the exchange");
        Ok(true)
    }

    /// Removes a user from the exchange.
    ///
    /// Returns `Ok(false)` when no record exists for `id`. Leaving clears the
    /// cached pair as well as the participation flag.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the record flush fails.
    pub fn leave(&self, store: &mut UserStore, id: UserId) -> Result<bool, StoreError> {
        if store.get(id).is_none() {
            warn!(id, "unknown user cannot leave the exchange");
            return Ok(false);
        }
        store.set_field(id, self.config.participant_key.as_str(), false)?;
        store.delete_field(id, &self.config.pair_key)?;
        info!(id, "user left the exchange");
        Ok(true)
    }

    /// IDs of all current participants, in ascending order.
    #[must_use]
    pub fn participants(&self, store: &UserStore) -> Vec<UserId> {
        store
            .ids()
            .iter()
            .copied()
            .filter(|&id| store.flag(id, &self.config.participant_key))
            .collect()
    }

    /// Display names of all current participants, in ascending-ID order.
    #[must_use]
    pub fn participant_names(&self, store: &UserStore) -> Vec<String> {
        self.participants(store)
            .iter()
            .filter_map(|&id| store.username(id).map(ToOwned::to_owned))
            .collect()
    }

    /// Computes and persists the full pair assignment.
    ///
    /// With fewer than two participants there is nothing to assign and the
    /// result is empty; that is a valid state, not an error. Otherwise the
    /// participant list is shuffled deterministically under the configured
    /// seeding policy and paired by circular adjacency, and each receiver is
    /// cached on the giver's record under the configured pair key.
    ///
    /// An assignment that still contains a self-pairing after the bounded
    /// retries is logged and reported as empty; callers see the same shape
    /// as "not enough participants".
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when caching a pair on a record fails.
    pub fn assign_pairs(&self, store: &mut UserStore) -> Result<Vec<Pair>, StoreError> {
        let participants = self.participants(store);
        if participants.len() < 2 {
            warn!(count = participants.len(), "not enough participants to assign pairs");
            return Ok(Vec::new());
        }

        let seed = self.config.seed.epoch_seed();
        let Some(pairs) = pairing::derange(&participants, seed) else {
            error!(
                seed,
                attempts = pairing::MAX_ATTEMPTS,
                "self-assignment survived every shuffle attempt"
            );
            return Ok(Vec::new());
        };

        for pair in &pairs {
            store.set_field(pair.giver, self.config.pair_key.as_str(), pair.receiver)?;
        }

        info!(count = pairs.len(), seed, "assigned pairs");
        Ok(pairs)
    }

    /// Looks up the receiver assigned to `id`, plus the participant names.
    ///
    /// The assignment is recomputed on every call so the answer reflects
    /// anyone who joined since the last computation; under the calendar-year
    /// policy the recomputation is idempotent within a season, so repeated
    /// queries stay stable. An unknown `id` yields no receiver and an empty
    /// name list. A known non-participant gets the current names but no
    /// receiver.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when recomputing the assignment fails to flush.
    pub fn get_pair(&self, store: &mut UserStore, id: UserId) -> Result<PairLookup, StoreError> {
        if store.get(id).is_none() {
            warn!(id, "unknown user asked for their pair");
            return Ok(PairLookup {
                receiver: None,
                participants: Vec::new(),
            });
        }

        let pairs = self.assign_pairs(store)?;
        let receiver = pairs
            .iter()
            .find(|pair| pair.giver == id)
            .map(|pair| pair.receiver);

        Ok(PairLookup {
            receiver,
            participants: self.participant_names(store),
        })
    }

    /// Clears participation and cached pairs for every known record.
    ///
    /// Runs over all records regardless of current participation, so stale
    /// pair fields left by earlier seasons are swept too.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when a record flush fails.
    pub fn reset(&self, store: &mut UserStore) -> Result<(), StoreError> {
        let ids = store.ids().to_vec();
        for id in ids {
            store.set_field(id, self.config.participant_key.as_str(), false)?;
            store.delete_field(id, &self.config.pair_key)?;
        }
        info!("exchange reset");
        Ok(())
    }
}
