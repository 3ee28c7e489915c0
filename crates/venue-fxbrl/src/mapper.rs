//! Status normalization for the BRL FX venue
//!
//! This venue mixes Portuguese and English terms and is inconsistent
//! about casing within the same term; the table below is matched
//! case-insensitively, so `Concluida`/`concluida`/`CONCLUIDA` all resolve
//! the same way.

use adapter_core::mapper::{Mapper, TableMapper};
use adapter_core::model::{CanonicalStatus, Instrument};

/// [`Mapper`] implementation for the BRL FX venue
pub struct FxBrlMapper(TableMapper);

impl Default for FxBrlMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl FxBrlMapper {
    /// Build the mapper over this venue's documented status table
    pub fn new() -> Self {
        Self(TableMapper::new(vec![
            ("Pendente", CanonicalStatus::Pending),
            ("Processando", CanonicalStatus::Submitted),
            ("Processing", CanonicalStatus::Submitted),
            ("Enviada", CanonicalStatus::Submitted),
            ("Concluida", CanonicalStatus::Filled),
            ("Completed", CanonicalStatus::Filled),
            ("Executado", CanonicalStatus::Filled),
            ("Finalizado", CanonicalStatus::Filled),
            ("Cancelada", CanonicalStatus::Cancelled),
            ("Cancelado", CanonicalStatus::Cancelled),
            ("Rejeitada", CanonicalStatus::Rejected),
            ("Rejeitado", CanonicalStatus::Rejected),
            ("Estornando", CanonicalStatus::Refunding),
            ("Estornada", CanonicalStatus::Refunded),
        ]))
    }
}

impl Mapper for FxBrlMapper {
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
    fn maps_every_documented_status() {
        let mapper = FxBrlMapper::new();
        for raw in [
            "Pendente", "Processando", "Processing", "Enviada", "Concluida", "Completed",
            "Executado", "Finalizado", "Cancelada", "Cancelado", "Rejeitada", "Rejeitado",
            "Estornando", "Estornada",
        ] {
            assert!(mapper.normalize_status(raw).is_some(), "expected {raw} to map");
        }
    }

    #[test]
    fn processing_is_submitted_not_pending() {
        let mapper = FxBrlMapper::new();
        assert_eq!(mapper.normalize_status("Processando"), Some(CanonicalStatus::Submitted));
        assert_eq!(mapper.normalize_status("processing"), Some(CanonicalStatus::Submitted));
    }

    #[test]
    fn casing_and_whitespace_are_ignored() {
        let mapper = FxBrlMapper::new();
        assert_eq!(mapper.normalize_status("concluida"), Some(CanonicalStatus::Filled));
        assert_eq!(mapper.normalize_status("CONCLUIDA"), Some(CanonicalStatus::Filled));
        assert_eq!(mapper.normalize_status("  Concluida "), Some(CanonicalStatus::Filled));
        assert_eq!(mapper.normalize_status("completed"), Some(CanonicalStatus::Filled));
    }

    #[test]
    fn unrecognized_status_is_none() {
        let mapper = FxBrlMapper::new();
        assert_eq!(mapper.normalize_status("o-que-e-isso"), None);
    }
}
