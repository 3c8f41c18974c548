//! Standardized field values with their raw origin

use serde::{Deserialize, Serialize};

/// Outcome of standardizing a single raw value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    /// The value was understood and normalized
    Valid,
    /// The value passed through unchanged because no rule recognized it
    Unrecognized,
    /// The value could not be interpreted; the standardized value is null
    Invalid,
    /// No raw value was supplied
    Missing,
}

/// A raw value paired with its standardized form
///
/// The raw value is never overwritten; the standardized value sits next to it
/// so every transformation stays auditable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StandardizedField<T> {
    /// The value exactly as supplied, if any
    pub raw: Option<String>,
    /// The normalized value, `None` when missing or uninterpretable
    pub value: Option<T>,
    /// Whether the standardized value differs textually from the raw value
    pub was_changed: bool,
    /// How the standardization went
    pub status: FieldStatus,
}

impl<T> StandardizedField<T> {
    /// A field for which no raw value was supplied
    #[must_use]
    pub const fn missing() -> Self {
        Self {
            raw: None,
            value: None,
            was_changed: false,
            status: FieldStatus::Missing,
        }
    }

    /// A raw value that could not be interpreted
    #[must_use]
    pub fn invalid(raw: &str) -> Self {
        Self {
            raw: Some(raw.to_string()),
            value: None,
            was_changed: false,
            status: FieldStatus::Invalid,
        }
    }

    /// Whether the value was understood
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.status == FieldStatus::Valid
    }

    /// Whether the value passed through without a matching rule
    #[must_use]
    pub fn is_unrecognized(&self) -> bool {
        self.status == FieldStatus::Unrecognized
    }

    /// Borrow the standardized value
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Convert the standardized value, keeping raw value and status
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StandardizedField<U> {
        StandardizedField {
            raw: self.raw,
            value: self.value.map(f),
            was_changed: self.was_changed,
            status: self.status,
        }
    }
}

impl<T: Copy> StandardizedField<T> {
    /// Copy out the standardized value
    #[must_use]
    pub fn get(&self) -> Option<T> {
        self.value
    }
}
