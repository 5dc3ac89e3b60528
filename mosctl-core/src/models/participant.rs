//! Participant identity validation
//!
//! Name and contact are free text in the store (`VARCHAR(255)`), so the
//! limits here mirror the column widths.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Maximum length for participant name and contact (column width)
const MAX_FIELD_LEN: usize = 255;

/// Loose e-mail shape: something@something.tld, no whitespace
static CONTACT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid contact regex")
});

/// Validated participant identity as entered on the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantIdentity {
    name: String,
    contact: String,
}

impl ParticipantIdentity {
    /// Create an identity, trimming surrounding whitespace.
    ///
    /// # Rules
    /// - Name and contact are required
    /// - Max 255 characters each
    /// - Contact must look like an e-mail address
    ///
    /// # Example
    /// ```
    /// use mosctl_core::models::ParticipantIdentity;
    ///
    /// assert!(ParticipantIdentity::new("Sari", "sari@example.org").is_ok());
    /// assert!(ParticipantIdentity::new("", "sari@example.org").is_err());
    /// assert!(ParticipantIdentity::new("Sari", "not-an-address").is_err());
    /// ```
    pub fn new(name: &str, contact: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        let contact = contact.trim();

        if name.is_empty() {
            return Err(ValidationError::Empty { field: "name" });
        }
        if contact.is_empty() {
            return Err(ValidationError::Empty { field: "email" });
        }
        if name.chars().count() > MAX_FIELD_LEN {
            return Err(ValidationError::TooLong {
                field: "name",
                max: MAX_FIELD_LEN,
            });
        }
        if contact.chars().count() > MAX_FIELD_LEN {
            return Err(ValidationError::TooLong {
                field: "email",
                max: MAX_FIELD_LEN,
            });
        }
        if !CONTACT_RE.is_match(contact) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                reason: "must be an e-mail address like name@example.org",
            });
        }

        Ok(Self {
            name: name.to_owned(),
            contact: contact.to_owned(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contact(&self) -> &str {
        &self.contact
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_whitespace() {
        let id = ParticipantIdentity::new("  Sari  ", " sari@example.org ").unwrap();
        assert_eq!(id.name(), "Sari");
        assert_eq!(id.contact(), "sari@example.org");
    }

    #[test]
    fn rejects_empty_name() {
        let err = ParticipantIdentity::new("   ", "a@b.co").unwrap_err();
        assert_eq!(err, ValidationError::Empty { field: "name" });
    }

    #[test]
    fn rejects_empty_contact() {
        let err = ParticipantIdentity::new("Sari", "").unwrap_err();
        assert_eq!(err, ValidationError::Empty { field: "email" });
    }

    #[test]
    fn rejects_malformed_contact() {
        for bad in ["sari", "sari@", "@example.org", "sari @example.org", "sari@example"] {
            let err = ParticipantIdentity::new("Sari", bad).unwrap_err();
            assert!(matches!(err, ValidationError::InvalidFormat { .. }), "{bad}");
        }
    }

    #[test]
    fn max_length() {
        let name_255 = "a".repeat(255);
        assert!(ParticipantIdentity::new(&name_255, "a@b.co").is_ok());

        let name_256 = "a".repeat(256);
        let err = ParticipantIdentity::new(&name_256, "a@b.co").unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { max: 255, .. }));
    }
}
