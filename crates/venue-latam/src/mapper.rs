//! Status and instrument normalization for the LATAM onramp/offramp venue
//!
//! This venue has accreted the richest status vocabulary of the three —
//! close to forty distinct raw strings across its quote, KYC, payment and
//! refund pipelines, in a mix of snake_case and camelCase depending on
//! which internal service last touched the order. Matching is
//! case-insensitive and whitespace-trimmed like every other venue's table.

use adapter_core::mapper::{Mapper, TableMapper};
use adapter_core::model::{CanonicalStatus, Instrument};

/// [`Mapper`] implementation for the LATAM venue
pub struct LatamMapper(TableMapper);

impl Default for LatamMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl LatamMapper {
    /// Build the mapper over this venue's documented status table
    pub fn new() -> Self {
        Self(TableMapper::new(vec![
            ("created", CanonicalStatus::Pending),
            ("pending", CanonicalStatus::Pending),
            ("awaiting_kyc", CanonicalStatus::Pending),
            ("kycPending", CanonicalStatus::Pending),
            ("processing", CanonicalStatus::Submitted),
            ("awaitingPayment", CanonicalStatus::Submitted),
            ("awaiting_payment", CanonicalStatus::Submitted),
            ("verifying", CanonicalStatus::Submitted),
            ("complianceReview", CanonicalStatus::Submitted),
            ("compliance_review", CanonicalStatus::Submitted),
            ("underReview", CanonicalStatus::Submitted),
            ("manualReview", CanonicalStatus::Submitted),
            ("submitted", CanonicalStatus::Submitted),
            ("paid", CanonicalStatus::Filled),
            ("completed", CanonicalStatus::Filled),
            ("settled", CanonicalStatus::Filled),
            ("finalized", CanonicalStatus::Filled),
            ("executed", CanonicalStatus::Filled),
            ("expired", CanonicalStatus::Cancelled),
            ("timeout", CanonicalStatus::Cancelled),
            ("timedOut", CanonicalStatus::Cancelled),
            ("quoteExpired", CanonicalStatus::Cancelled),
            ("userCancelled", CanonicalStatus::Cancelled),
            ("customerCancelled", CanonicalStatus::Cancelled),
            ("cancelled", CanonicalStatus::Cancelled),
            ("canceled", CanonicalStatus::Cancelled),
            ("failed", CanonicalStatus::Rejected),
            ("rejected", CanonicalStatus::Rejected),
            ("declined", CanonicalStatus::Rejected),
            ("paymentFailed", CanonicalStatus::Rejected),
            ("insufficientLiquidity", CanonicalStatus::Rejected),
            ("kycFailed", CanonicalStatus::Rejected),
            ("complianceRejected", CanonicalStatus::Rejected),
            ("blocked", CanonicalStatus::Rejected),
            ("fraudSuspected", CanonicalStatus::Rejected),
            ("refundFailed", CanonicalStatus::Rejected),
            ("refund", CanonicalStatus::Refunding),
            ("refundPending", CanonicalStatus::Refunding),
            ("refundProcessing", CanonicalStatus::Refunding),
            ("refunding", CanonicalStatus::Refunding),
            ("chargeback", CanonicalStatus::Refunding),
            ("reversed", CanonicalStatus::Refunding),
            ("refunded", CanonicalStatus::Refunded),
            ("refundComplete", CanonicalStatus::Refunded),
            ("refundCompleted", CanonicalStatus::Refunded),
        ]))
    }
}

impl Mapper for LatamMapper {
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
    fn kyc_and_processing_both_resolve() {
        let mapper = LatamMapper::new();
        assert_eq!(mapper.normalize_status("awaiting_kyc"), Some(CanonicalStatus::Pending));
        assert_eq!(mapper.normalize_status("processing"), Some(CanonicalStatus::Submitted));
    }

    #[test]
    fn casing_and_whitespace_are_ignored() {
        let mapper = LatamMapper::new();
        assert_eq!(mapper.normalize_status("COMPLETED"), Some(CanonicalStatus::Filled));
        assert_eq!(mapper.normalize_status("  completed  "), Some(CanonicalStatus::Filled));
        assert_eq!(mapper.normalize_status("UserCancelled"), Some(CanonicalStatus::Cancelled));
    }

    #[test]
    fn refund_failure_is_rejected_not_refunded() {
        let mapper = LatamMapper::new();
        assert_eq!(mapper.normalize_status("refundFailed"), Some(CanonicalStatus::Rejected));
        assert_eq!(mapper.normalize_status("refundComplete"), Some(CanonicalStatus::Refunded));
    }

    #[test]
    fn unrecognized_status_is_none() {
        let mapper = LatamMapper::new();
        assert_eq!(mapper.normalize_status("whatIsThis"), None);
    }

    #[test]
    fn terminality_matches_canonical_status() {
        let mapper = LatamMapper::new();
        for (raw, expected) in [
            ("completed", true),
            ("cancelled", true),
            ("rejected", true),
            ("refunded", true),
            ("processing", false),
            ("refunding", false),
            ("pending", false),
        ] {
            assert_eq!(mapper.is_terminal(raw), expected, "raw={raw}");
        }
    }
}
