//! Tax rate normalization and gross price calculation.
//!
//! Catalogs express rates either as a fraction (`0.19`) or as a percentage
//! (`19`). Everything past this module works in percentages.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::TaxConfig;

/// Explicit rate redirects from the `tax.mapping` config table.
///
/// Keys keep their config spelling so a lookup can match the raw value
/// textually before falling back to numeric comparison.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaxOverrides {
    entries: Vec<(String, Decimal)>,
}

impl TaxOverrides {
    #[must_use]
    pub fn new(entries: Vec<(String, Decimal)>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the override for a rate, trying the raw spelling, then the raw
    /// numeric value, then the normalized percentage.
    #[must_use]
    pub fn lookup(&self, raw: Decimal, percent: Decimal) -> Option<Decimal> {
        let raw_text = raw.to_string();
        self.entries
            .iter()
            .find(|(key, _)| *key == raw_text)
            .or_else(|| self.find_numeric(raw))
            .or_else(|| self.find_numeric(percent))
            .map(|(_, rate)| *rate)
    }

    fn find_numeric(&self, wanted: Decimal) -> Option<&(String, Decimal)> {
        self.entries
            .iter()
            .find(|(key, _)| key.parse::<Decimal>().is_ok_and(|k| k == wanted))
    }
}

/// Convert a fraction (`<= 1`) to a percentage; larger values pass through.
#[must_use]
pub fn normalize_rate(rate: Decimal) -> Decimal {
    if rate <= Decimal::ONE {
        (rate * Decimal::ONE_HUNDRED).normalize()
    } else {
        rate
    }
}

/// Canonical form of a percentage used to key the remote tax table.
///
/// `19`, `19.0` and `19.000` all map to the same key.
#[must_use]
pub fn rate_key(percent: Decimal) -> Decimal {
    percent.round_dp(2).normalize()
}

/// Resolve the percentage to apply to a record.
///
/// A missing rate falls back to `tax.default_rate`. Configured overrides win
/// over the normalized value.
#[must_use]
pub fn resolve_rate(raw: Option<Decimal>, tax: &TaxConfig) -> Decimal {
    let Some(raw) = raw else {
        return normalize_rate(tax.default_rate);
    };
    let percent = normalize_rate(raw);
    tax.overrides.lookup(raw, percent).unwrap_or(percent)
}

/// Gross price for a net amount, rounded half away from zero to cents.
///
/// Accepts the rate as a fraction or a percentage, like [`normalize_rate`].
#[must_use]
pub fn calculate_gross(net: Decimal, rate: Decimal) -> Decimal {
    let percent = if rate > Decimal::ONE {
        rate
    } else {
        rate * Decimal::ONE_HUNDRED
    };
    gross_from_percent(net, percent)
}

/// Gross price for a rate already in percent form, as returned by
/// [`resolve_rate`]. Unlike [`calculate_gross`], `1` here means 1 %.
#[must_use]
pub fn gross_from_percent(net: Decimal, percent: Decimal) -> Decimal {
    (net * (Decimal::ONE + percent / Decimal::ONE_HUNDRED))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
