//! User record and attribute value types.
//!
//! A record is an ordered string-keyed mapping of dynamically-typed values.
//! No schema is enforced beyond the defaults applied at creation time, so
//! callers are free to attach additional keys (`nickname`, `gold`, …) as a
//! deployment grows.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

/// Unique identifier of a user record.
///
/// Chat platforms hand out signed 64-bit IDs, so that is what the store keys
/// on. IDs are immutable once a record is created.
pub type UserId = i64;

/// Attribute key for the display name set at creation.
const USERNAME: &str = "username";

/// Attribute key for the nullable timestamp of the user's last tile placement.
const LAST_PLACE_TIME: &str = "last_place_time";

/// Emoji assigned round-robin-by-chance to newly created users.
const DEFAULT_EMOJI: &[&str] = &[
    "⬜️", "🟥", "🟧", "🟨", "🟩", "🟪", "⚪", "🟠", "🟡", "🟢", "🔵", "🟣",
    "🐶", "🐱", "🦊", "🐭", "🐹", "🐰", "🐻", "🐼", "🐯", "🦁", "🐬", "🐧",
    "🦖", "🍀", "⚡️", "🔥", "⭐️", "☀️", "🍎", "🍓", "🍒", "🍉", "🍕", "🍣",
    "⚽️", "🏀", "🥎", "💎", "💻", "🚀", "🍪", "🛑", "❇️",
];

/// A dynamically-typed attribute value.
///
/// Records support exactly these scalar shapes. The enum serializes untagged,
/// so record files read as plain JSON (`"Ann"`, `3`, `2.5`, `true`, `null`)
/// and every variant round-trips exactly: integral numbers stay [`Int`],
/// non-integral numbers stay [`Float`].
///
/// [`Int`]: AttrValue::Int
/// [`Float`]: AttrValue::Float
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// An explicitly null value.
    Null,
    /// A boolean flag.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// A UTF-8 string.
    Text(String),
}

impl AttrValue {
    /// Returns `true` for [`AttrValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the boolean payload, if this is a [`AttrValue::Bool`].
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is an [`AttrValue::Int`].
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the float payload, if this is an [`AttrValue::Float`].
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the string payload, if this is an [`AttrValue::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A single user's attribute record.
///
/// Creation applies the documented defaults; everything afterwards is
/// caller-driven key-by-key mutation through [`crate::UserStore`]. The map is
/// ordered so persisted records keep a stable key order across rewrites.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRecord {
    attrs: BTreeMap<String, AttrValue>,
}

impl UserRecord {
    /// Builds a record with the default attribute set.
    ///
    /// Defaults: `username` (the given name), `emoji` (randomly picked),
    /// `gems` 0, `tiles_count` 0, `admin` false, `santa` false,
    /// `canvas` `"default.csv"`, `last_place_time` null.
    #[must_use]
    pub fn new(username: &str) -> Self {
        let mut attrs = BTreeMap::new();
        attrs.insert(USERNAME.to_owned(), AttrValue::from(username));
        attrs.insert("emoji".to_owned(), AttrValue::from(random_emoji()));
        attrs.insert("gems".to_owned(), AttrValue::Int(0));
        attrs.insert("tiles_count".to_owned(), AttrValue::Int(0));
        attrs.insert("admin".to_owned(), AttrValue::Bool(false));
        attrs.insert("santa".to_owned(), AttrValue::Bool(false));
        attrs.insert("canvas".to_owned(), AttrValue::from("default.csv"));
        attrs.insert(LAST_PLACE_TIME.to_owned(), AttrValue::Null);
        Self { attrs }
    }

    /// Looks up an attribute by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    /// Sets an attribute, inserting or replacing.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.attrs.insert(key.into(), value.into());
    }

    /// Removes an attribute, returning the previous value if it was set.
    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.attrs.remove(key)
    }

    /// Returns `true` when the key is present (including explicit null).
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.attrs.contains_key(key)
    }

    /// The display name this record was created with.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.get(USERNAME).and_then(AttrValue::as_text)
    }

    /// The emoji assigned to this user.
    #[must_use]
    pub fn emoji(&self) -> Option<&str> {
        self.get("emoji").and_then(AttrValue::as_text)
    }

    /// Reads a boolean attribute, treating absent or non-boolean as `false`.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(AttrValue::as_bool).unwrap_or(false)
    }

    /// Reads an integer attribute, `None` when absent or not an integer.
    #[must_use]
    pub fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(AttrValue::as_int)
    }

    /// The user's last tile placement, when one has been recorded.
    ///
    /// The attribute is null at creation and set by callers as RFC 3339 text;
    /// anything unparsable reads as `None`.
    #[must_use]
    pub fn last_place_time(&self) -> Option<DateTime<Utc>> {
        let text = self.get(LAST_PLACE_TIME).and_then(AttrValue::as_text)?;
        DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|stamp| stamp.with_timezone(&Utc))
    }

    /// Iterates the attributes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.attrs.iter().map(|(key, value)| (key.as_str(), value))
    }
}

/// Picks a default emoji for a newly created user.
fn random_emoji() -> &'static str {
    DEFAULT_EMOJI
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or("⬜️")
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn new_record_carries_defaults() {
        let record = UserRecord::new("Ann");

        assert_eq!(record.username(), Some("Ann"));
        assert_eq!(record.int("gems"), Some(0));
        assert_eq!(record.int("tiles_count"), Some(0));
        assert!(!record.flag("admin"));
        assert!(!record.flag("santa"));
        assert_eq!(record.get("canvas"), Some(&AttrValue::from("default.csv")));
        assert_eq!(record.get(LAST_PLACE_TIME), Some(&AttrValue::Null));
    }

    #[test]
    fn new_record_emoji_comes_from_default_set() {
        let record = UserRecord::new("Ann");
        let emoji = record.emoji().expect("emoji is set");
        assert!(DEFAULT_EMOJI.contains(&emoji));
    }

    #[rstest]
    #[case::null(AttrValue::Null, "null")]
    #[case::bool(AttrValue::Bool(true), "true")]
    #[case::int(AttrValue::Int(-7), "-7")]
    #[case::float(AttrValue::Float(2.5), "2.5")]
    #[case::text(AttrValue::Text("snow".to_owned()), "\"snow\"")]
    fn attr_values_round_trip_untagged(#[case] value: AttrValue, #[case] json: &str) {
        let serialized = serde_json::to_string(&value).expect("serializes");
        assert_eq!(serialized, json);

        let parsed: AttrValue = serde_json::from_str(&serialized).expect("parses");
        assert_eq!(parsed, value);
    }

    #[test]
    fn integral_json_numbers_stay_integers() {
        let parsed: AttrValue = serde_json::from_str("7").expect("parses");
        assert_eq!(parsed, AttrValue::Int(7));
    }

    #[test]
    fn fractional_json_numbers_stay_floats() {
        let parsed: AttrValue = serde_json::from_str("5.0").expect("parses");
        assert_eq!(parsed, AttrValue::Float(5.0));
    }

    #[test]
    fn record_serializes_as_plain_object() {
        let mut record = UserRecord::default();
        record.set("nickname", "Nightjar");
        record.set("gold", 12);

        let json = serde_json::to_string(&record).expect("serializes");
        assert_eq!(json, r#"{"gold":12,"nickname":"Nightjar"}"#);

        let parsed: UserRecord = serde_json::from_str(&json).expect("parses");
        assert_eq!(parsed, record);
    }

    #[test]
    fn last_place_time_parses_rfc3339_text() {
        let mut record = UserRecord::new("Ann");
        record.set(LAST_PLACE_TIME, "2024-12-24T18:30:00Z");

        let stamp = record.last_place_time().expect("parses");
        assert_eq!(stamp.to_rfc3339(), "2024-12-24T18:30:00+00:00");
    }

    #[rstest]
    #[case::unset(AttrValue::Null)]
    #[case::not_a_timestamp(AttrValue::Text("yesterday".to_owned()))]
    #[case::wrong_type(AttrValue::Int(1_703_441_400))]
    fn last_place_time_degrades_to_none(#[case] value: AttrValue) {
        let mut record = UserRecord::new("Ann");
        record.set(LAST_PLACE_TIME, value);
        assert_eq!(record.last_place_time(), None);
    }

    #[test]
    fn flag_treats_non_boolean_values_as_false() {
        let mut record = UserRecord::new("Ann");
        record.set("santa", 1);
        assert!(!record.flag("santa"));
    }
}
