//! Durable per-user attribute records for a small group chat bot.
//!
//! Each user is a flat JSON file named after their numeric ID, mirrored by an
//! in-memory cache that is flushed synchronously on every mutation. Records
//! are schemaless beyond a creation-time default set, so bot features can
//! attach their own keys without migrations.
//!
//! # Example
//!
//! ```
//! use user_vault::{AttrValue, UserStore};
//!
//! let dir = tempfile::tempdir().expect("temp dir");
//! let root = camino::Utf8Path::from_path(dir.path()).expect("utf8 path");
//!
//! let mut store = UserStore::open(root).expect("store opens");
//! store.create(7, "Ann").expect("create");
//! store.set_field(7, "gems", AttrValue::Int(3)).expect("set");
//!
//! assert_eq!(store.ids(), &[7]);
//! assert_eq!(store.field(7, "gems"), Some(&AttrValue::Int(3)));
//! ```

mod atomic_io;
mod error;
mod record;
mod store;

pub use error::StoreError;
pub use record::{AttrValue, UserId, UserRecord};
pub use store::UserStore;
