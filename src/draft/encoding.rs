//! Byte-safe transfer encoding for file content
//!
//! The backend cannot store arbitrary control characters or non-ASCII
//! text directly, so each slot travels as base64 of its UTF-8 bytes.

use crate::error::{IdeError, IdeResult};
use crate::session::protocol::{EncodedFiles, ProjectFiles};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Encode text for transfer
pub fn encode_text(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Reverse [`encode_text`]
pub fn decode_text(encoded: &str) -> IdeResult<String> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| IdeError::DraftDecode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| IdeError::DraftDecode(e.to_string()))
}

/// Encode both slots
pub fn encode_files(files: &ProjectFiles) -> EncodedFiles {
    EncodedFiles {
        script: encode_text(&files.script),
        markup: encode_text(&files.markup),
    }
}

/// Decode both slots
pub fn decode_files(files: &EncodedFiles) -> IdeResult<ProjectFiles> {
    Ok(ProjectFiles {
        script: decode_text(&files.script)?,
        markup: decode_text(&files.markup)?,
    })
}
