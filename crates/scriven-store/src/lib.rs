//! # scriven-store
//!
//! Content store and repository implementations for Scriven.
//!
//! Provides the concrete storage behind the `scriven-core` traits: a
//! quota-enforcing content store (filesystem and in-memory), knowledge
//! and generated document repositories, and activity sinks.

pub mod activity;
pub mod content;
pub mod documents;
pub mod generated;

pub use activity::{BufferingActivitySink, ChannelActivitySink};
pub use content::{
    compute_content_hash, generate_storage_path, FilesystemContentStore, MemoryContentStore,
};
pub use documents::MemoryDocumentRepository;
pub use generated::{content_hash, MemoryGeneratedRepository};
