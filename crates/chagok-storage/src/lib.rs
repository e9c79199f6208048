//! # chagok-storage
//!
//! Blob storage for evidence files: a [`BlobStore`] trait with filesystem
//! and in-memory implementations, HMAC-signed presigned upload/download
//! credentials, and parsing of storage object-created event notifications
//! that trigger the worker.

pub mod blob;
pub mod event;
pub mod presign;

pub use blob::{BlobStore, FilesystemBlobStore, MemoryBlobStore};
pub use event::{parse_upload_event, ObjectCreated, UploadEvent};
pub use presign::{PresignConfig, Presigner, PresignedUrl};
