//! # scriven-extract
//!
//! Media extraction pipeline for the Scriven knowledge base.
//!
//! Turns uploaded bytes (PDF, image, plain text) into searchable text
//! plus derived structured data, with per-media-kind adapters, bounded
//! retry, and caller deadlines.

pub mod adapters;
pub mod derive;
pub mod pipeline;
pub mod registry;

pub use adapters::{ImageExtractor, PdfExtractor, TextExtractor};
pub use derive::{build_derivation_prompt, heuristic_derive, parse_derived, DataDeriver};
pub use pipeline::{ExtractionOutcome, ExtractionPipeline};
pub use registry::ExtractorRegistry;
