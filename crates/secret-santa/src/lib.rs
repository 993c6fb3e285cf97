//! Deterministic Secret Santa pairing over [`user_vault`] records.
//!
//! Participation is a boolean attribute on each user record; the assignment
//! is a seeded shuffle paired by circular adjacency, so everyone gives and
//! receives exactly once and nobody draws themselves. Under the default
//! calendar-year seeding the assignment is reproducible for a whole season:
//! asking twice gives the same answer until someone joins or leaves.
//!
//! # Example
//!
//! ```
//! use secret_santa::{SantaConfig, SecretSanta, SeedPolicy};
//! use user_vault::UserStore;
//!
//! let dir = tempfile::tempdir().expect("temp dir");
//! let root = camino::Utf8Path::from_path(dir.path()).expect("utf8 path");
//! let mut store = UserStore::open(root).expect("store opens");
//! for (id, name) in [(1, "Ann"), (2, "Bob"), (3, "Cid")] {
//!     store.create(id, name).expect("create");
//! }
//!
//! let santa = SecretSanta::with_config(SantaConfig {
//!     seed: SeedPolicy::Fixed(2024),
//!     ..SantaConfig::default()
//! });
//! for id in [1, 2, 3] {
//!     assert!(santa.join(&mut store, id).expect("join"));
//! }
//!
//! let pairs = santa.assign_pairs(&mut store).expect("assign");
//! assert_eq!(pairs.len(), 3);
//! ```

mod config;
mod engine;
mod pairing;

pub use config::{SantaConfig, SeedPolicy};
pub use engine::{PairLookup, SecretSanta};
pub use pairing::Pair;
