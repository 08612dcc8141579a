//! Common types and utilities shared across the dealer exposure components

pub mod config;
pub mod error;
pub mod types;

pub use config::*;
pub use error::*;
pub use types::*;
