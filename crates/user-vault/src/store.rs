//! The user store: a write-through cache over one JSON file per record.
//!
//! Every mutation flushes synchronously before returning, so memory and disk
//! never diverge by more than the single in-flight operation. Record counts
//! are small (tens to low hundreds) and writes are rare, which makes the
//! flush-per-mutation trade acceptable in exchange for crash safety.
//!
//! The store assumes a single mutating caller at a time; embedders serving
//! concurrent requests must serialize mutations (for example behind a mutex)
//! before sharing a store.

use std::collections::BTreeMap;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs::Dir;
use tracing::debug;

use crate::atomic_io;
use crate::error::StoreError;
use crate::record::{AttrValue, UserId, UserRecord};

/// File extension used for persisted records.
const RECORD_SUFFIX: &str = ".json";

/// Durable keyed storage of user records with an in-memory cache.
///
/// Records live as `<id>.json` files under a single directory; the stringified
/// ID is the file name and the attribute object is the body. [`open`] loads
/// everything eagerly and refuses to start over a corrupt record.
///
/// [`open`]: UserStore::open
#[derive(Debug)]
pub struct UserStore {
    dir: Dir,
    root: Utf8PathBuf,
    records: BTreeMap<UserId, UserRecord>,
    sorted_ids: Vec<UserId>,
}

impl UserStore {
    /// Opens the store rooted at `root`, creating the directory if needed,
    /// and loads every persisted record into the cache.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ReadError`] when the directory cannot be created
    /// or listed, and [`StoreError::CorruptRecord`] when any record file has
    /// a non-integer stem or an unparsable body; the store never partially
    /// loads.
    pub fn open(root: impl AsRef<Utf8Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(root.as_std_path()).map_err(|err| StoreError::ReadError {
            path: root.clone(),
            message: err.to_string(),
        })?;
        let dir = Dir::open_ambient_dir(root.as_std_path(), cap_std::ambient_authority()).map_err(
            |err| StoreError::ReadError {
                path: root.clone(),
                message: err.to_string(),
            },
        )?;

        let mut store = Self {
            dir,
            root,
            records: BTreeMap::new(),
            sorted_ids: Vec::new(),
        };
        store.load_all()?;
        Ok(store)
    }

    /// Directory the records live in.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Number of records currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Creates a new record with the default attribute set.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateId`] when the ID is already taken
    /// (existing state is left untouched) and [`StoreError::WriteError`] when
    /// the record cannot be flushed.
    pub fn create(&mut self, id: UserId, username: &str) -> Result<&UserRecord, StoreError> {
        self.create_with(id, username, std::iter::empty())
    }

    /// Creates a new record, merging `extras` over the defaults.
    ///
    /// # Errors
    ///
    /// Same as [`create`](UserStore::create).
    pub fn create_with(
        &mut self,
        id: UserId,
        username: &str,
        extras: impl IntoIterator<Item = (String, AttrValue)>,
    ) -> Result<&UserRecord, StoreError> {
        if self.records.contains_key(&id) {
            return Err(StoreError::DuplicateId { id });
        }

        let mut record = UserRecord::new(username);
        for (key, value) in extras {
            record.set(key, value);
        }

        // Disk first: a failed flush must not leave a cache-only record.
        self.write_record(id, &record)?;
        self.records.insert(id, record);
        self.rebuild_index();
        debug!(id, username, "created user record");

        self.records.get(&id).ok_or(StoreError::NotFound { id })
    }

    /// Looks up a record. Absence is not an error.
    #[must_use]
    pub fn get(&self, id: UserId) -> Option<&UserRecord> {
        self.records.get(&id)
    }

    /// Reads a single attribute; `None` when the record or key is absent.
    #[must_use]
    pub fn field(&self, id: UserId, key: &str) -> Option<&AttrValue> {
        self.records.get(&id).and_then(|record| record.get(key))
    }

    /// Reads a boolean attribute; absent records and keys read as `false`.
    #[must_use]
    pub fn flag(&self, id: UserId, key: &str) -> bool {
        self.records
            .get(&id)
            .is_some_and(|record| record.flag(key))
    }

    /// The display name of a user, when the record and attribute exist.
    #[must_use]
    pub fn username(&self, id: UserId) -> Option<&str> {
        self.records.get(&id).and_then(UserRecord::username)
    }

    /// Sets a single attribute and flushes the record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an absent ID and
    /// [`StoreError::WriteError`] when the flush fails.
    pub fn set_field(
        &mut self,
        id: UserId,
        key: impl Into<String>,
        value: impl Into<AttrValue>,
    ) -> Result<(), StoreError> {
        let record = self.records.get_mut(&id).ok_or(StoreError::NotFound { id })?;
        record.set(key, value);
        self.flush(id)
    }

    /// Removes a single attribute and flushes the record.
    ///
    /// Removing a key that was never set is a no-op and does not touch disk.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an absent ID and
    /// [`StoreError::WriteError`] when the flush fails.
    pub fn delete_field(&mut self, id: UserId, key: &str) -> Result<(), StoreError> {
        let record = self.records.get_mut(&id).ok_or(StoreError::NotFound { id })?;
        if record.remove(key).is_none() {
            return Ok(());
        }
        self.flush(id)
    }

    /// Deletes a record from the cache and from disk.
    ///
    /// Returns whether the record existed; deleting an absent ID has no
    /// effect.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WriteError`] when the record file exists but
    /// cannot be removed.
    pub fn delete(&mut self, id: UserId) -> Result<bool, StoreError> {
        if self.records.remove(&id).is_none() {
            return Ok(false);
        }

        match self.dir.remove_file(record_file_name(id)) {
            Ok(()) => {}
            // The cache entry was authoritative; a missing file is already
            // the state we want.
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(StoreError::WriteError {
                    path: self.record_path(id),
                    message: err.to_string(),
                });
            }
        }

        self.rebuild_index();
        debug!(id, "deleted user record");
        Ok(true)
    }

    /// All record IDs in ascending order.
    ///
    /// The ordering is stable between mutations, which makes it usable as a
    /// positional index for display purposes; see
    /// [`position_of`](UserStore::position_of).
    #[must_use]
    pub fn ids(&self) -> &[UserId] {
        &self.sorted_ids
    }

    /// Position of an ID within the ascending [`ids`](UserStore::ids) order.
    #[must_use]
    pub fn position_of(&self, id: UserId) -> Option<usize> {
        self.sorted_ids.binary_search(&id).ok()
    }

    /// All display names, in ascending-ID order.
    ///
    /// Records without a `username` attribute are skipped.
    #[must_use]
    pub fn usernames(&self) -> Vec<String> {
        self.sorted_ids
            .iter()
            .filter_map(|&id| self.username(id).map(ToOwned::to_owned))
            .collect()
    }

    /// Whether the user carries the admin flag.
    ///
    /// This is the pure query privileged command handlers gate on.
    #[must_use]
    pub fn is_admin(&self, id: UserId) -> bool {
        self.flag(id, "admin")
    }

    /// IDs of every admin user, in ascending order.
    #[must_use]
    pub fn admin_ids(&self) -> Vec<UserId> {
        self.sorted_ids
            .iter()
            .copied()
            .filter(|&id| self.is_admin(id))
            .collect()
    }

    /// Replaces the cache with the directory contents.
    fn load_all(&mut self) -> Result<(), StoreError> {
        self.records.clear();

        let entries = self.dir.entries().map_err(|err| StoreError::ReadError {
            path: self.root.clone(),
            message: err.to_string(),
        })?;

        for next_entry in entries {
            let entry = next_entry.map_err(|err| StoreError::ReadError {
                path: self.root.clone(),
                message: err.to_string(),
            })?;
            let raw_name = entry.file_name();
            let Some(file_name) = raw_name.to_str() else {
                continue;
            };
            let Some(stem) = file_name.strip_suffix(RECORD_SUFFIX) else {
                continue;
            };
            // Hidden leftovers from interrupted atomic writes are not records.
            if stem.starts_with('.') {
                continue;
            }

            let id: UserId = stem.parse().map_err(|_| StoreError::CorruptRecord {
                path: self.root.join(file_name),
                message: "file name is not a user id".to_owned(),
            })?;

            let contents =
                self.dir
                    .read_to_string(file_name)
                    .map_err(|err| StoreError::ReadError {
                        path: self.root.join(file_name),
                        message: err.to_string(),
                    })?;
            let record: UserRecord =
                serde_json::from_str(&contents).map_err(|err| StoreError::CorruptRecord {
                    path: self.root.join(file_name),
                    message: err.to_string(),
                })?;

            self.records.insert(id, record);
        }

        self.rebuild_index();
        debug!(count = self.records.len(), dir = %self.root, "loaded user records");
        Ok(())
    }

    /// Flushes the cached record for `id` to its file.
    fn flush(&self, id: UserId) -> Result<(), StoreError> {
        let record = self.records.get(&id).ok_or(StoreError::NotFound { id })?;
        self.write_record(id, record)
    }

    fn write_record(&self, id: UserId, record: &UserRecord) -> Result<(), StoreError> {
        let mut body =
            serde_json::to_string_pretty(record).map_err(|err| StoreError::WriteError {
                path: self.record_path(id),
                message: err.to_string(),
            })?;
        body.push('\n');

        atomic_io::write_atomic(&self.dir, &record_file_name(id), &body).map_err(|err| {
            StoreError::WriteError {
                path: self.record_path(id),
                message: err.to_string(),
            }
        })
    }

    /// Recomputes the sorted positional index; called on every ID-set change.
    fn rebuild_index(&mut self) {
        self.sorted_ids = self.records.keys().copied().collect();
    }

    fn record_path(&self, id: UserId) -> Utf8PathBuf {
        self.root.join(record_file_name(id))
    }
}

fn record_file_name(id: UserId) -> String {
    format!("{id}{RECORD_SUFFIX}")
}
