//! Schema fingerprints
//!
//! Versions are compared by hashing their ordered field list, so two
//! versions with the same fields and headers in the same order share a
//! checksum regardless of their ids.

use sha2::{Digest, Sha256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::Field;

/// SHA256 fingerprint of a schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    /// Fingerprint an ordered field list.
    ///
    /// Each field contributes `name`, a unit separator, `header`, and a
    /// record separator, so ("ab", "c") and ("a", "bc") hash differently.
    pub fn of_fields(fields: &[Field]) -> Self {
        let mut hasher = Sha256::new();
        for Field { name, header } in fields {
            hasher.update(name.as_bytes());
            hasher.update([0x1f_u8]);
            hasher.update(header.as_bytes());
            hasher.update([0x1e_u8]);
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for listings
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Vec<Field> {
        pairs.iter().map(|(n, h)| Field::new(*n, *h)).collect()
    }

    #[test]
    fn test_checksum_consistency() {
        let a = Checksum::of_fields(&fields(&[("date", "Date"), ("mood", "Mood")]));
        let b = Checksum::of_fields(&fields(&[("date", "Date"), ("mood", "Mood")]));
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_checksum_is_order_sensitive() {
        let a = Checksum::of_fields(&fields(&[("date", "Date"), ("mood", "Mood")]));
        let b = Checksum::of_fields(&fields(&[("mood", "Mood"), ("date", "Date")]));
        assert_ne!(a, b);
    }

    #[test]
    fn test_checksum_separates_name_and_header() {
        let a = Checksum::of_fields(&fields(&[("ab", "c")]));
        let b = Checksum::of_fields(&fields(&[("a", "bc")]));
        assert_ne!(a, b);
    }

    #[test]
    fn test_short_form() {
        let c = Checksum::of_fields(&fields(&[("date", "Date")]));
        assert_eq!(c.short().len(), 12);
        assert!(c.as_str().starts_with(c.short()));
    }
}
