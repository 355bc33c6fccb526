//! Device identifiers.
//!
//! Every device is identified by a canonical hyphenated UUID string
//! (`xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`). The same predicate,
//! [`is_valid_device_id`], is used when minting new identifiers, when
//! accepting identifiers from requests and when enumerating the data
//! directory at startup.
//!
//! Hex digits are case-insensitive on input, but a [`DeviceId`] always holds
//! the lowercase form, so one device never ends up under two keys or two
//! store directories.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ParseError;

/// Length of a canonical hyphenated UUID string.
pub const DEVICE_ID_LEN: usize = 36;

/// Returns `true` if `name` is a syntactically valid device identifier.
///
/// Only the hyphenated form is accepted; the simple, braced and URN forms
/// that [`Uuid::parse_str`] would otherwise allow are rejected. Either case
/// of hex digit passes; see [`DeviceId::parse`] for the canonical form.
///
/// # Examples
///
/// ```
/// use co2sense_types::is_valid_device_id;
///
/// assert!(is_valid_device_id("0f8fad5b-d9cb-469f-a165-70867728950e"));
/// assert!(!is_valid_device_id("0f8fad5bd9cb469fa16570867728950e"));
/// assert!(!is_valid_device_id("lost+found"));
/// ```
#[must_use]
pub fn is_valid_device_id(name: &str) -> bool {
    name.len() == DEVICE_ID_LEN && Uuid::parse_str(name).is_ok()
}

/// A validated device identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct DeviceId(String);

impl DeviceId {
    /// Parse and validate a device identifier, lowercasing it.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidDeviceId`] if `s` fails [`is_valid_device_id`].
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        if is_valid_device_id(s) {
            Ok(Self(s.to_ascii_lowercase()))
        } else {
            Err(ParseError::InvalidDeviceId(s.to_string()))
        }
    }

    /// Whether `s` is already in canonical (lowercase) form.
    #[must_use]
    pub fn is_canonical(s: &str) -> bool {
        is_valid_device_id(s) && !s.bytes().any(|b| b.is_ascii_uppercase())
    }

    /// Mint a fresh random (v4) identifier.
    #[must_use]
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DeviceId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = ParseError;

    fn try_from(mut value: String) -> Result<Self, Self::Error> {
        if is_valid_device_id(&value) {
            value.make_ascii_lowercase();
            Ok(Self(value))
        } else {
            Err(ParseError::InvalidDeviceId(value))
        }
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
