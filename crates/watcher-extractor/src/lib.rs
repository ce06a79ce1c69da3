//! The Extractor component: recovers product/variant/price/stock data
//! from raw page HTML using a priority-ordered set of strategies per
//! concern, degrading field-by-field rather than failing outright.

pub mod extractor;
pub mod jsonpass;
pub mod merge;
pub mod strategies;

pub use extractor::{extract, ExtractionReport};
