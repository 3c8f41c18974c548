//! Date parsing against an ordered list of accepted formats.

use chrono::NaiveDate;

use crate::models::{FieldStatus, StandardizedField};

/// Format used when a standardized date is rendered back to text
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses dates with the configured formats, first match wins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateStandardizer {
    formats: Vec<String>,
}

impl DateStandardizer {
    /// Create a standardizer trying `formats` in order
    #[must_use]
    pub fn new(formats: Vec<String>) -> Self {
        Self { formats }
    }

    /// Parse a date string with multiple format attempts
    #[must_use]
    pub fn parse(&self, s: &str) -> Option<NaiveDate> {
        let trimmed = s.trim();
        self.formats
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
    }

    /// Standardize an optional raw date; parse failures are flagged, never raised
    #[must_use]
    pub fn standardize(&self, raw: Option<&str>) -> StandardizedField<NaiveDate> {
        let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
            return StandardizedField::missing();
        };

        match self.parse(raw) {
            Some(date) => StandardizedField {
                raw: Some(raw.to_string()),
                value: Some(date),
                was_changed: date.format(CANONICAL_DATE_FORMAT).to_string() != raw,
                status: FieldStatus::Valid,
            },
            None => StandardizedField::invalid(raw),
        }
    }
}

impl Default for DateStandardizer {
    fn default() -> Self {
        Self::new(crate::config::StandardizationConfig::default().date_formats)
    }
}
