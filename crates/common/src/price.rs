//! Price cell parsing and the minimum-price business rule

use crate::{Error, Result};

/// Parse a currency cell such as `"555 USD"` or `"$1,204.50"`.
///
/// Every character other than ASCII digits and `.` is dropped, then the
/// longest prefix of the remainder that is a number wins, so a trailing
/// sentence period (`"914.76."`) is ignored. No numeric prefix at all is a
/// [`Error::PriceParse`].
pub fn parse_price(text: &str) -> Result<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    (1..=cleaned.len())
        .rev()
        .find_map(|end| cleaned[..end].parse::<f64>().ok())
        .filter(|price| price.is_finite())
        .ok_or_else(|| Error::PriceParse(text.to_string()))
}

/// Minimum sanity threshold a confirmed price must exceed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePolicy {
    pub minimum: f64,
}

impl PricePolicy {
    pub fn new(minimum: f64) -> Self {
        Self { minimum }
    }

    /// Strictly-greater-than check
    pub fn check(&self, price: f64) -> Result<f64> {
        if price > self.minimum {
            Ok(price)
        } else {
            Err(Error::PriceOutOfRange {
                price,
                minimum: self.minimum,
            })
        }
    }
}

impl Default for PricePolicy {
    fn default() -> Self {
        Self { minimum: 100.0 }
    }
}
