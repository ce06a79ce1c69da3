use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::stock::StockStatus;

/// Normalized product data as produced by the Extractor and consumed by the
/// Ingestion Service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductShell {
    pub canonical_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub images: Vec<String>,
    pub variants: Vec<VariantShell>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Normalized variant data. `sku` is the preferred identity key; when absent,
/// ingestion falls back to `attributes` equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantShell {
    pub sku: Option<String>,
    pub attributes: Map<String, Value>,
    pub price: Option<PriceShell>,
    pub stock: Option<StockShell>,
}

/// A single price observation, in the currency it was captured in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceShell {
    pub amount: Decimal,
    pub currency: Currency,
}

/// ISO 4217 currency code, stored uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency(pub [u8; 3]);

impl Currency {
    pub fn parse(raw: &str) -> Option<Self> {
        let upper = raw.trim().to_ascii_uppercase();
        let bytes = upper.as_bytes();
        if bytes.len() == 3 && bytes.iter().all(u8::is_ascii_alphabetic) {
            Some(Currency([bytes[0], bytes[1], bytes[2]]))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

/// A single stock observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockShell {
    pub status: StockStatus,
    pub quantity: Option<u32>,
}

/// Timestamped wrapper used when a shell needs to carry when it was
/// observed (the Check Coordinator stamps this; the Extractor does not).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observed<T> {
    pub value: T,
    pub captured_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_parses_three_letter_code() {
        assert_eq!(Currency::parse("usd").unwrap().as_str(), "USD");
    }

    #[test]
    fn currency_rejects_wrong_length() {
        assert!(Currency::parse("us").is_none());
    }

    #[test]
    fn currency_rejects_non_alphabetic() {
        assert!(Currency::parse("U$D").is_none());
    }
}
