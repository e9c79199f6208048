//! File-type routing by extension.

use chagok_core::{file_extension, Error, MediaType, Result};

/// Map a filename to the media type its parser adapter handles.
///
/// The extension table is exhaustive and closed; anything outside it is an
/// explicit `UnsupportedMediaType` error, never a silent default. Matching
/// is case-insensitive.
pub fn route_extension(filename: &str) -> Result<MediaType> {
    let ext = file_extension(filename)
        .ok_or_else(|| Error::UnsupportedMediaType(format!("no extension: {}", filename)))?;

    MediaType::from_extension(&ext)
        .ok_or_else(|| Error::UnsupportedMediaType(format!(".{}", ext)))
}
