//! # Application Module
//!
//! Application services orchestrating the domain and outbound ports.

pub mod service;

pub use service::BlockStorageHelper;
