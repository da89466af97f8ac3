//! Serde helpers for stored fields that older writers set to an explicit
//! `null` instead of leaving them out.

use serde::{Deserialize, Deserializer};

/// `null` reads as the type's default, the same as a missing key.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// `null` reads as `true`; products are active unless marked otherwise.
pub fn or_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<bool>::deserialize(deserializer).map(|value| value.unwrap_or(true))
}
