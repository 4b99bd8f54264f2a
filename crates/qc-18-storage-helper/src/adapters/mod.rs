//! # Adapters Layer (Hexagonal Architecture)
//!
//! Connection to the data source, built on the `NodeClient` outbound port.

mod fetcher;

pub use fetcher::Fetcher;
