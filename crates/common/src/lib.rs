//! Shared types and error plumbing used across all larkbot crates.

pub mod error;
pub mod types;

pub use error::{Error, FromMessage, Result};
