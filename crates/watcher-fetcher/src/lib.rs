//! The Fetcher component: obtains page HTML for a tracked URL, starting
//! with a plain HTTP GET and escalating at most once to a headless render
//! when the static response looks client-rendered.

pub mod client;
pub mod dynamic;
mod error;
pub mod fetcher;
pub mod rate_limit;
pub mod render;
pub mod types;

pub use client::StaticFetcher;
pub use dynamic::DynamicDetectionConfig;
pub use error::FetchError;
pub use fetcher::Fetcher;
pub use render::{ChromiumProcessRenderer, Renderer};
pub use types::{FetchMetadata, FetchMode, FetchResult, Timing};
