//! # scriven-synthesis
//!
//! Content synthesis engine: prompt construction, provider
//! orchestration, and provenance-tracked generation over the Scriven
//! knowledge corpus.

pub mod engine;
pub mod prompts;

pub use engine::SynthesisEngine;
pub use prompts::{
    known_style, parse_generation, parse_suggestions, title_from_request, ParsedGeneration,
    KNOWN_STYLES,
};
