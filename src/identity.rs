//! Content-addressed document identity.
//!
//! The document id is the SHA-256 of the file bytes, so the same PDF copied
//! under two names gets the same id while its `title` (the file stem) differs.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::Path;

/// Metadata key holding the human-readable title.
pub const TITLE_KEY: &str = "title";

/// Metadata key holding the content hash.
pub const DOCUMENT_ID_KEY: &str = "document_id";

/// SHA-256 of the file's bytes as 64 lowercase hex characters.
pub fn file_hash(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// File name without its extension, or `""` for a path without one.
pub fn title_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Base metadata for a source file: `title` and `document_id`.
pub fn document_metadata(path: &Path) -> io::Result<Map<String, Value>> {
    let mut meta = Map::new();
    meta.insert(TITLE_KEY.to_string(), Value::String(title_of(path)));
    meta.insert(DOCUMENT_ID_KEY.to_string(), Value::String(file_hash(path)?));
    Ok(meta)
}
