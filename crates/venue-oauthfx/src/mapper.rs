//! Status normalization for the OAuth2 FX venue
//!
//! This venue replies with terse uppercase codes rather than words, but
//! matching still follows the same case-insensitive, whitespace-trimmed
//! rule every venue's table uses.

use adapter_core::mapper::{Mapper, TableMapper};
use adapter_core::model::{CanonicalStatus, Instrument};

/// [`Mapper`] implementation for the OAuth2 FX venue
pub struct OauthFxMapper(TableMapper);

impl Default for OauthFxMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl OauthFxMapper {
    /// Build the mapper over this venue's documented status codes
    pub fn new() -> Self {
        Self(TableMapper::new(vec![
            ("NEW", CanonicalStatus::Pending),
            ("ACK", CanonicalStatus::Submitted),
            ("FIL", CanonicalStatus::Filled),
            ("CXL", CanonicalStatus::Cancelled),
            ("REJ", CanonicalStatus::Rejected),
            ("RFD", CanonicalStatus::Refunded),
        ]))
    }
}

impl Mapper for OauthFxMapper {
    fn normalize_status(&self, raw: &str) -> Option<CanonicalStatus> {
        self.0.normalize_status(raw)
    }

    fn normalize_instrument(&self, raw: &str) -> Instrument {
        self.0.normalize_instrument(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_documented_code() {
        let mapper = OauthFxMapper::new();
        for raw in ["NEW", "ACK", "FIL", "CXL", "REJ", "RFD"] {
            assert!(mapper.normalize_status(raw).is_some(), "expected {raw} to map");
        }
    }

    #[test]
    fn codes_are_case_insensitive_and_trimmed() {
        let mapper = OauthFxMapper::new();
        assert_eq!(mapper.normalize_status("fil"), Some(CanonicalStatus::Filled));
        assert_eq!(mapper.normalize_status("  Fil  "), Some(CanonicalStatus::Filled));
    }

    #[test]
    fn unrecognized_code_is_none() {
        let mapper = OauthFxMapper::new();
        assert_eq!(mapper.normalize_status("XXX"), None);
    }
}
