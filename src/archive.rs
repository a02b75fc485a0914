//! Zip packing of export results

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};

/// Pack `(entry name, bytes)` pairs into an in-memory zip archive.
///
/// Entries are written in iteration order with deflate compression at the
/// maximum level.
pub fn pack<I>(entries: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (String, Vec<u8>)>,
{
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    for (name, bytes) in entries {
        writer
            .start_file(name.as_str(), options)
            .map_err(|e| Error::Archive(format!("failed to start entry '{}': {}", name, e)))?;
        writer
            .write_all(&bytes)
            .map_err(|e| Error::Archive(format!("failed to write entry '{}': {}", name, e)))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| Error::Archive(format!("failed to finalize archive: {}", e)))?;

    Ok(cursor.into_inner())
}
