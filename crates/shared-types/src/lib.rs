//! # Shared Types Crate
//!
//! Identity value types shared by the block indexer, the reconciliation
//! engine and the storage helper.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every identifier crossing a crate boundary
//!   is defined here.
//! - **Structural Equality**: identifiers have no behavior beyond equality;
//!   metadata participates in equality.
//! - **Wire Shape**: serde field names match the JSON the data source and
//!   the exempt-account files use.

pub mod entities;

pub use entities::*;
