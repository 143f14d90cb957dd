//! Attachment ingestion: one local file per card, encoded as a
//! self-describing data URL kept verbatim on the card.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use std::fs;
use std::path::Path;

/// Hard cap on attachment size; larger files are refused so the persisted
/// board stays loadable.
pub const MAX_ATTACHMENT_BYTES: u64 = 1024 * 1024;

#[derive(thiserror::Error, Debug)]
pub enum AttachError {
    #[error("file is too large ({size} bytes); attachments must be 1 MiB or smaller")]
    TooLarge { size: u64 },
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// `data:<mime>;base64,<payload>`.
    pub data_url: String,
    pub mime: String,
    pub name: String,
}

/// Reads `path` and encodes it as a data URL. The size check runs against
/// file metadata before any content is read.
pub fn attach_file(path: &Path) -> Result<Attachment, AttachError> {
    let io_err = |source| AttachError::Io {
        path: path.display().to_string(),
        source,
    };
    let size = fs::metadata(path).map_err(io_err)?.len();
    if size > MAX_ATTACHMENT_BYTES {
        return Err(AttachError::TooLarge { size });
    }
    let bytes = fs::read(path).map_err(|source| AttachError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mime = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("attachment")
        .to_string();
    let data_url = format!("data:{};base64,{}", mime, B64.encode(&bytes));
    Ok(Attachment {
        data_url,
        mime,
        name,
    })
}
