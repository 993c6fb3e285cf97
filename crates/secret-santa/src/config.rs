//! Engine configuration.
//!
//! The engine stores its state on user records under configurable attribute
//! keys, so one vault can host differently-keyed exchanges (for example a
//! second round keyed `"advent"`). The config is serde-deserializable with
//! per-field defaults so an embedding bot can place it in its own config
//! file.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Seeding policy for pair assignment.
///
/// The assignment shuffle always runs on an explicit, locally-scoped
/// generator seeded from this policy; there is no ambient RNG state to
/// mutate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeedPolicy {
    /// Seed from the current calendar year.
    ///
    /// Recomputing an assignment is then idempotent for as long as the
    /// participant set and the year both hold still, which is what makes
    /// repeated "who am I gifting?" queries stable across a season.
    #[default]
    CalendarYear,
    /// Seed from a fixed value supplied by the embedder.
    Fixed(u64),
}

impl SeedPolicy {
    /// Resolves the seed for the current epoch.
    pub(crate) fn epoch_seed(self) -> u64 {
        match self {
            // Years before 1 CE fold to 0; nobody is exchanging gifts there.
            Self::CalendarYear => u64::try_from(Utc::now().year()).unwrap_or_default(),
            Self::Fixed(seed) => seed,
        }
    }
}

/// Configuration for a [`SecretSanta`](crate::SecretSanta) engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SantaConfig {
    /// Attribute key holding the participation flag.
    #[serde(default = "default_participant_key")]
    pub participant_key: String,
    /// Attribute key caching the last computed receiver on the giver.
    #[serde(default = "default_pair_key")]
    pub pair_key: String,
    /// Seeding policy for the assignment shuffle.
    #[serde(default)]
    pub seed: SeedPolicy,
}

fn default_participant_key() -> String {
    "santa".to_owned()
}

fn default_pair_key() -> String {
    "santa_pair".to_owned()
}

impl Default for SantaConfig {
    fn default() -> Self {
        Self {
            participant_key: default_participant_key(),
            pair_key: default_pair_key(),
            seed: SeedPolicy::default(),
        }
    }
}
