use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use mirror_logging::mirror_debug;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::persist::{AtomicFileWriter, PersistError};

/// Public URL prefix under which stored images are served.
pub const PUBLIC_IMAGE_PREFIX: &str = "/static/images/";

const DIGEST_PREFIX_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("invalid data URI format")]
    Format,
    #[error("decoding base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("storing image: {0}")]
    Storage(#[from] PersistError),
}

/// Turns an inline `data:` URI into a reference the markup can point at.
pub trait AssetSink: Send + Sync {
    fn materialize(&self, data_uri: &str) -> Result<String, AssetError>;
}

/// Identity of a stored image: a digest prefix of the decoded bytes plus an
/// extension taken from the declared MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetFile {
    pub content_hash: [u8; DIGEST_PREFIX_LEN],
    pub extension: &'static str,
}

impl AssetFile {
    pub fn for_payload(bytes: &[u8], mime: &str) -> Self {
        Self {
            content_hash: content_hash(bytes),
            extension: extension_for_mime(mime),
        }
    }

    pub fn filename(&self) -> String {
        let mut name = String::with_capacity(DIGEST_PREFIX_LEN * 2 + self.extension.len());
        for byte in self.content_hash {
            let _ = write!(&mut name, "{byte:02x}");
        }
        name.push_str(self.extension);
        name
    }
}

/// First eight bytes of the SHA-256 digest.
pub fn content_hash(bytes: &[u8]) -> [u8; DIGEST_PREFIX_LEN] {
    let digest = Sha256::digest(bytes);
    let mut prefix = [0u8; DIGEST_PREFIX_LEN];
    prefix.copy_from_slice(&digest[..DIGEST_PREFIX_LEN]);
    prefix
}

/// Unknown or missing subtypes fall back to `.png`.
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => ".jpg",
        "image/gif" => ".gif",
        "image/svg+xml" => ".svg",
        _ => ".png",
    }
}

/// Splits `data:<mime>[;params],<payload>` into MIME type and payload.
///
/// The URI must contain exactly one comma.
pub fn parse_data_uri(data_uri: &str) -> Result<(&str, &str), AssetError> {
    let mut parts = data_uri.split(',');
    let (Some(header), Some(payload), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(AssetError::Format);
    };
    let media = header.split(';').next().unwrap_or(header);
    let mime = media.strip_prefix("data:").unwrap_or(media);
    Ok((mime, payload))
}

/// Content-addressed image directory.
///
/// The same bytes always land in the same file, so materializing a payload
/// twice is a no-op the second time.
#[derive(Debug, Clone)]
pub struct ImageStore {
    writer: AtomicFileWriter,
    public_prefix: String,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            writer: AtomicFileWriter::new(root.into()),
            public_prefix: PUBLIC_IMAGE_PREFIX.to_string(),
        }
    }

    pub fn with_public_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.public_prefix = prefix.into();
        self
    }

    pub fn root(&self) -> &Path {
        self.writer.dir()
    }

    fn store(&self, bytes: &[u8], mime: &str) -> Result<String, AssetError> {
        let filename = AssetFile::for_payload(bytes, mime).filename();
        let target = self.writer.path_for(&filename);
        if target.is_file() {
            mirror_debug!("Image {} already stored", filename);
        } else {
            self.writer.write(&filename, bytes)?;
            mirror_debug!("Stored image {} ({} bytes)", filename, bytes.len());
        }
        Ok(format!("{}{}", self.public_prefix, filename))
    }
}

impl AssetSink for ImageStore {
    fn materialize(&self, data_uri: &str) -> Result<String, AssetError> {
        let (mime, payload) = parse_data_uri(data_uri)?;
        let bytes = STANDARD.decode(payload)?;
        self.store(&bytes, mime)
    }
}
