//! # chagok-core
//!
//! Core types, traits, and abstractions for the CHAGOK evidence pipeline.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other chagok crates depend on: the case and evidence data model,
//! the evidence status state machine, the blob object-key grammar, and the
//! repository seams implemented by `chagok-db`.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod object_key;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use object_key::{
    build_object_key, file_extension, new_evidence_id, parse_object_key, sanitize_filename,
    ParsedObjectKey,
};
pub use traits::*;
