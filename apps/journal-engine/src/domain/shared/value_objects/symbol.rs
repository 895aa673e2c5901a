//! Symbol value object for instrument identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters the broker uses to separate currency pairs or sub-instruments.
const SEPARATORS: [char; 3] = ['_', '/', '-'];

/// A trading symbol as displayed in the journal.
///
/// Broker instrument names such as `EUR_USD` or `XAU/USD` are normalized by
/// stripping separators and uppercasing, so `EUR_USD` becomes `EURUSD`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new Symbol from a raw instrument name.
    #[must_use]
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(
            value
                .as_ref()
                .trim()
                .chars()
                .filter(|c| !SEPARATORS.contains(c))
                .collect::<String>()
                .to_uppercase(),
        )
    }

    /// Get the symbol string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("EUR_USD", "EURUSD" ; "underscore pair")]
    #[test_case("xau/usd", "XAUUSD" ; "slash and lowercase")]
    #[test_case("SPX500-USD", "SPX500USD" ; "dash")]
    #[test_case(" AAPL ", "AAPL" ; "trimmed")]
    fn normalizes_instrument_names(raw: &str, expected: &str) {
        assert_eq!(Symbol::new(raw).as_str(), expected);
    }

    #[test]
    fn display_matches_inner() {
        let symbol = Symbol::new("GBP_JPY");
        assert_eq!(format!("{symbol}"), "GBPJPY");
        assert_eq!(symbol.into_inner(), "GBPJPY");
    }
}
