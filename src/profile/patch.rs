//! Partial-update types.
//!
//! A JSON body distinguishes three states per field: key missing, key set to
//! `null`, and key set to a value. [`Patch`] keeps all three apart so the
//! reconciler never has to guess which one an `Option` meant.

use chrono::NaiveDate;
use rusqlite::types::Value;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    /// Key not in the body: leave the stored value alone.
    #[default]
    Absent,
    /// Key present with `null`: clear the stored value.
    Null,
    /// Key present with a value: overwrite.
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    /// Would applying this patch to `current` change it?
    pub fn changes(&self, current: Option<&T>) -> bool
    where
        T: PartialEq,
    {
        match self {
            Patch::Absent => false,
            Patch::Null => current.is_some(),
            Patch::Value(v) => current != Some(v),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        }
    }
}

// Only called when the key is present; `#[serde(default)]` on the field
// supplies `Absent` otherwise.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}

// Pair with `skip_serializing_if = "Patch::is_absent"`.
impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Patch::Absent | Patch::Null => serializer.serialize_none(),
            Patch::Value(v) => serializer.serialize_some(v),
        }
    }
}

/// Body of `PUT /api/updateProfile`, exactly as the client sent it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub first_name: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub last_name: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub nickname: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub email: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub date_of_birth: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub profile_picture: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub is_anonymous: Patch<bool>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub password: Patch<String>,
}

impl ProfileUpdate {
    /// True when the body names no field at all. A key sent as `null` or
    /// `""` still counts, even where applying it is a no-op.
    pub fn is_empty(&self) -> bool {
        self.first_name.is_absent()
            && self.last_name.is_absent()
            && self.nickname.is_absent()
            && self.email.is_absent()
            && self.date_of_birth.is_absent()
            && self.profile_picture.is_absent()
            && self.is_anonymous.is_absent()
            && self.password.is_absent()
    }
}

/// Validated, storage-ready form of a [`ProfileUpdate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub first_name: Patch<String>,
    pub last_name: Patch<String>,
    pub nickname: Patch<String>,
    pub date_of_birth: Patch<NaiveDate>,
    pub profile_picture: Patch<String>,
    pub is_anonymous: Option<bool>,
    pub password_hash: Option<String>,
}

impl ProfileChanges {
    /// `(column, value)` pairs for every field to write, in a fixed order.
    pub fn assignments(&self) -> Vec<(&'static str, Value)> {
        fn text(patch: &Patch<String>) -> Option<Value> {
            match patch {
                Patch::Absent => None,
                Patch::Null => Some(Value::Null),
                Patch::Value(v) => Some(Value::Text(v.clone())),
            }
        }

        let date = match &self.date_of_birth {
            Patch::Absent => None,
            Patch::Null => Some(Value::Null),
            Patch::Value(d) => Some(Value::Text(d.format("%Y-%m-%d").to_string())),
        };

        [
            ("first_name", text(&self.first_name)),
            ("last_name", text(&self.last_name)),
            ("nickname", text(&self.nickname)),
            ("date_of_birth", date),
            ("profile_picture", text(&self.profile_picture)),
            (
                "is_anonymous",
                self.is_anonymous.map(|b| Value::Integer(b as i64)),
            ),
            (
                "password_hash",
                self.password_hash.clone().map(Value::Text),
            ),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.map(|v| (column, v)))
        .collect()
    }
}
