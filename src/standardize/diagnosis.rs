//! Syntactic normalization of ICD-10 diagnosis codes
//!
//! Only casing and stray characters are touched. Codes that differ in meaning,
//! such as `E11` and `E11.9`, stay distinct.

use crate::models::{FieldStatus, StandardizedField};

/// Drop every character outside `[A-Za-z0-9.]`, then uppercase
#[must_use]
pub fn normalize_code(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Whether a normalized code has ICD-10 shape: `A00`, `A00.0` up to `A00.0000`
#[must_use]
pub fn is_icd10_shape(code: &str) -> bool {
    let bytes = code.as_bytes();
    if bytes.len() < 3 {
        return false;
    }
    if !bytes[0].is_ascii_uppercase() || !bytes[1].is_ascii_digit() || !bytes[2].is_ascii_digit()
    {
        return false;
    }
    match &bytes[3..] {
        [] => true,
        [b'.', rest @ ..] => {
            (1..=4).contains(&rest.len()) && rest.iter().all(u8::is_ascii_alphanumeric)
        }
        _ => false,
    }
}

/// Three-character ICD-10 category of a normalized code (`E11.9` → `E11`)
#[must_use]
pub fn category(code: &str) -> Option<&str> {
    is_icd10_shape(code).then(|| &code[..3])
}

/// Standardize an optional raw diagnosis code
#[must_use]
pub fn standardize_code(raw: Option<&str>) -> StandardizedField<String> {
    let Some(raw) = raw else {
        return StandardizedField::missing();
    };

    let normalized = normalize_code(raw);
    if normalized.is_empty() {
        return StandardizedField {
            raw: Some(raw.to_string()),
            value: None,
            was_changed: false,
            status: FieldStatus::Missing,
        };
    }

    let status = if is_icd10_shape(&normalized) {
        FieldStatus::Valid
    } else {
        FieldStatus::Unrecognized
    };

    StandardizedField {
        raw: Some(raw.to_string()),
        was_changed: normalized != raw,
        value: Some(normalized),
        status,
    }
}
