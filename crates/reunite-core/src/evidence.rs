//! Evidence references and the upload policy for photos and videos.
//!
//! No binary data lives in the ledger. Files are written by an evidence store
//! which hands back an [`EvidenceRef`]; the ledger persists only that string.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const PHOTO_MAX_BYTES: usize = 10 * 1024 * 1024;
pub const VIDEO_MAX_BYTES: usize = 500 * 1024 * 1024;

/// A case may carry at most this many photos.
pub const MAX_CASE_PHOTOS: usize = 10;

/// The kind of evidence being uploaded; each has its own size ceiling and
/// type allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
  Photo,
  Video,
}

impl MediaKind {
  pub fn max_bytes(self) -> usize {
    match self {
      Self::Photo => PHOTO_MAX_BYTES,
      Self::Video => VIDEO_MAX_BYTES,
    }
  }

  fn allowed_extensions(self) -> &'static [&'static str] {
    match self {
      Self::Photo => &["jpg", "jpeg", "png"],
      Self::Video => &["mp4", "avi", "mov", "mkv"],
    }
  }

  fn media_type_allowed(self, media_type: &str) -> bool {
    let media_type = media_type.trim().to_ascii_lowercase();
    match self {
      Self::Photo => {
        matches!(media_type.as_str(), "image/jpeg" | "image/jpg" | "image/png")
      }
      Self::Video => media_type.starts_with("video/"),
    }
  }

  /// Extension used when the upload carried no usable filename.
  fn default_extension(self, media_type: &str) -> &'static str {
    match (self, media_type.trim().to_ascii_lowercase().as_str()) {
      (Self::Photo, "image/png") => "png",
      (Self::Photo, _) => "jpg",
      (Self::Video, "video/x-msvideo" | "video/avi") => "avi",
      (Self::Video, "video/quicktime") => "mov",
      (Self::Video, "video/x-matroska") => "mkv",
      (Self::Video, _) => "mp4",
    }
  }
}

/// A stable path or URL returned by the evidence store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidenceRef(String);

impl EvidenceRef {
  pub fn new(reference: impl Into<String>) -> Self { Self(reference.into()) }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn into_inner(self) -> String { self.0 }
}

impl fmt::Display for EvidenceRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Check an upload against the policy for `kind` and return the file
/// extension the stored file should carry.
///
/// The declared media type must be on the allow-list, and when a filename is
/// supplied its extension must be too.
pub fn validate_upload(
  kind: MediaKind,
  media_type: &str,
  file_name: Option<&str>,
  len: usize,
) -> Result<&'static str> {
  if len == 0 {
    return Err(Error::validation("uploaded file is empty"));
  }
  if len > kind.max_bytes() {
    return Err(Error::validation(format!(
      "uploaded file is {len} bytes; the limit is {} bytes",
      kind.max_bytes()
    )));
  }
  if !kind.media_type_allowed(media_type) {
    return Err(Error::validation(format!(
      "media type {media_type:?} is not allowed; expected {}",
      kind.allowed_extensions().join(", ")
    )));
  }

  let extension = file_name
    .and_then(|name| name.rsplit_once('.'))
    .map(|(_, ext)| ext.to_ascii_lowercase());

  match extension {
    Some(ext) => kind
      .allowed_extensions()
      .iter()
      .copied()
      .find(|allowed| *allowed == ext)
      .ok_or_else(|| {
        Error::validation(format!("file extension {ext:?} is not allowed"))
      }),
    None => Ok(kind.default_extension(media_type)),
  }
}
