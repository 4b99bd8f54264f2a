//! # Domain Module
//!
//! Core domain types for the Storage Helper.

pub mod asserter;
pub mod context;
pub mod errors;
pub mod value_objects;

pub use asserter::*;
pub use context::*;
pub use errors::*;
pub use value_objects::*;
