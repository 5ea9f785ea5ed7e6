//! # scriven-core
//!
//! Core types, traits, and abstractions for the Scriven knowledge base
//! and synthesis engine.
//!
//! This crate provides the foundational data structures and trait
//! definitions that other scriven crates depend on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod tags;
pub mod tokens;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use tags::{normalize_category, normalize_tag, normalize_tags, FAVORITE_TAG, UNCATEGORIZED};
pub use tokens::{estimate_tokens, likely_exceeds_limit, truncate_to_tokens};
pub use traits::*;
