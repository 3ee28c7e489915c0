//! Per-venue status and instrument normalization contract

use crate::model::{CanonicalStatus, Instrument};

/// Translates a venue's raw vocabulary into the canonical data model. Each
/// venue crate provides exactly one `Mapper` impl, usually backed by a
/// static lookup table of the raw strings that venue actually returns.
pub trait Mapper: Send + Sync {
    /// Map a venue-specific raw status string onto [`CanonicalStatus`].
    /// Matching is case-insensitive and whitespace-trimmed: a venue may
    /// mix `Processando`/`processando`/`PROCESSANDO` and they all resolve
    /// the same way. An unrecognized string returns `None`; callers must
    /// **not** treat that as an error — per the canonicalization rules, an
    /// unknown raw status passes through unchanged and is simply never
    /// terminal, so the tracker keeps polling rather than failing.
    fn normalize_status(&self, raw: &str) -> Option<CanonicalStatus>;

    /// True if `raw` normalizes to a terminal [`CanonicalStatus`]. An
    /// unrecognized raw status is never terminal — see [`Self::normalize_status`].
    fn is_terminal(&self, raw: &str) -> bool {
        self.normalize_status(raw).map(CanonicalStatus::is_terminal).unwrap_or(false)
    }

    /// Canonicalize a venue's instrument symbol. The default implementation
    /// covers every venue seen so far (`:`/`_` separators, mixed casing);
    /// override only if a venue needs something stranger.
    fn normalize_instrument(&self, raw: &str) -> Instrument {
        Instrument::canonicalize(raw)
    }
}

/// Builds a `Mapper` from a fixed list of (raw, canonical) pairs, matched
/// case-insensitively and whitespace-trimmed, in the order given. This is
/// what every venue crate's concrete mapper is built from.
pub struct TableMapper {
    table: Vec<(&'static str, CanonicalStatus)>,
}

impl TableMapper {
    /// Construct from a static status table
    pub const fn new(table: Vec<(&'static str, CanonicalStatus)>) -> Self {
        Self { table }
    }
}

impl Mapper for TableMapper {
    fn normalize_status(&self, raw: &str) -> Option<CanonicalStatus> {
        let needle = raw.trim();
        self.table
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(needle))
            .map(|(_, status)| *status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instrument_canonicalization() {
        assert_eq!(Instrument::canonicalize("btc/usd").as_str(), "BTC/USD");
        assert_eq!(Instrument::canonicalize("btc:usd").as_str(), "BTC/USD");
        assert_eq!(Instrument::canonicalize("BTC_USD").as_str(), "BTC/USD");
    }

    #[test]
    fn table_mapper_looks_up_and_misses() {
        let mapper = TableMapper::new(vec![
            ("FILLED", CanonicalStatus::Filled),
            ("PENDING", CanonicalStatus::Pending),
        ]);
        assert_eq!(mapper.normalize_status("FILLED"), Some(CanonicalStatus::Filled));
        assert_eq!(mapper.normalize_status("unknown"), None);
    }

    #[test]
    fn table_mapper_is_case_insensitive_and_trims_whitespace() {
        let mapper = TableMapper::new(vec![("Concluida", CanonicalStatus::Filled)]);
        assert_eq!(mapper.normalize_status("concluida"), Some(CanonicalStatus::Filled));
        assert_eq!(mapper.normalize_status("CONCLUIDA"), Some(CanonicalStatus::Filled));
        assert_eq!(mapper.normalize_status("  Concluida  "), Some(CanonicalStatus::Filled));
    }

    #[test]
    fn unknown_status_is_never_terminal() {
        let mapper = TableMapper::new(vec![("FILLED", CanonicalStatus::Filled)]);
        assert!(!mapper.is_terminal("some-new-status-the-venue-invented"));
        assert!(mapper.is_terminal("filled"));
    }

    proptest::proptest! {
        #[test]
        fn canonicalization_is_idempotent(raw in "[a-zA-Z]{2,6}[/:_][a-zA-Z]{2,6}") {
            let once = Instrument::canonicalize(&raw);
            let twice = Instrument::canonicalize(once.as_str());
            proptest::prop_assert_eq!(once, twice);
        }
    }
}
