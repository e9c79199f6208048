//! # chagok-worker
//!
//! The event-driven AI worker. One invocation receives a batch of
//! object-created records, and for each record: resolves the evidence
//! record from the object key, routes by file extension to a parser
//! adapter, runs AI analysis, and commits the outcome through the result
//! writer. Delivery is at-least-once; commits are idempotent per content
//! hash, so redelivery is harmless.

pub mod adapters;
pub mod analyzer;
pub mod handler;
pub mod result_writer;
pub mod router;

pub use adapters::{EvidenceParser, ParsedEvidence, ParserRegistry};
pub use analyzer::EvidenceAnalyzer;
pub use handler::{HandlerSummary, UploadHandler};
pub use result_writer::ResultWriter;
pub use router::route_extension;
