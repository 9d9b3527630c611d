//! On-disk evidence store.
//!
//! Uploads are checked against the policy in [`reunite_core::evidence`],
//! written under `<root>/<folder>/<uuid>.<ext>` and fsynced before the caller
//! gets a reference back. References take the form
//! `/uploads/<folder>/<uuid>.<ext>`.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use reunite_core::{
  Error, Result,
  evidence::{EvidenceRef, MediaKind, validate_upload},
};
use tokio::{fs, io::AsyncWriteExt as _};
use tracing::{debug, warn};
use uuid::Uuid;

/// URL prefix every reference starts with.
pub const REFERENCE_PREFIX: &str = "/uploads/";

/// Where an upload is filed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Folder {
  Cases,
  Reports,
  Videos,
}

impl Folder {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Cases => "cases",
      Self::Reports => "reports",
      Self::Videos => "videos",
    }
  }
}

/// A file received from a client, not yet stored.
#[derive(Debug, Clone)]
pub struct Upload {
  pub file_name:  Option<String>,
  pub media_type: String,
  pub bytes:      Bytes,
}

impl Upload {
  /// Check the upload against the policy for `kind` and return the extension
  /// the stored file will carry.
  pub fn check(&self, kind: MediaKind) -> Result<&'static str> {
    validate_upload(kind, &self.media_type, self.file_name.as_deref(), self.bytes.len())
  }
}

#[derive(Debug, Clone)]
pub struct DiskEvidenceStore {
  root: PathBuf,
}

impl DiskEvidenceStore {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  pub fn root(&self) -> &Path { &self.root }

  /// Durably write `upload` and return its reference.
  pub async fn store(
    &self,
    folder: Folder,
    kind: MediaKind,
    upload: &Upload,
  ) -> Result<EvidenceRef> {
    let extension = upload.check(kind)?;
    let file_name = format!("{}.{extension}", Uuid::new_v4());

    let dir = self.root.join(folder.as_str());
    fs::create_dir_all(&dir).await.map_err(io_error)?;

    let path = dir.join(&file_name);
    let mut file = fs::File::create(&path).await.map_err(io_error)?;
    file.write_all(&upload.bytes).await.map_err(io_error)?;
    file.sync_all().await.map_err(io_error)?;

    let reference = EvidenceRef::new(format!(
      "{REFERENCE_PREFIX}{}/{file_name}",
      folder.as_str()
    ));
    debug!(%reference, bytes = upload.bytes.len(), "evidence written");
    Ok(reference)
  }

  /// Store several uploads; on any failure the files already written are
  /// removed before the error is returned.
  pub async fn store_all(
    &self,
    folder: Folder,
    kind: MediaKind,
    uploads: &[Upload],
  ) -> Result<Vec<EvidenceRef>> {
    let mut stored = Vec::with_capacity(uploads.len());
    for upload in uploads {
      match self.store(folder, kind, upload).await {
        Ok(reference) => stored.push(reference),
        Err(e) => {
          self.discard(&stored).await;
          return Err(e);
        }
      }
    }
    Ok(stored)
  }

  /// Clean up after the owning row failed to insert. Files are kept when the
  /// insert may still have committed, so a stored row never points at a
  /// missing file.
  pub async fn release(&self, references: &[EvidenceRef], cause: &Error) {
    if cause.may_have_committed() {
      warn!(
        files = references.len(),
        error = %cause,
        "insert outcome unknown; keeping evidence"
      );
      return;
    }
    self.discard(references).await;
  }

  /// Best-effort removal of files whose owning row was never written.
  pub async fn discard(&self, references: &[EvidenceRef]) {
    for reference in references {
      let Some(path) = self.path_of(reference) else {
        warn!(%reference, "not a local evidence reference; left in place");
        continue;
      };
      match fs::remove_file(&path).await {
        Ok(()) => debug!(%reference, "evidence discarded"),
        Err(e) => warn!(%reference, error = %e, "failed to discard evidence"),
      }
    }
  }

  /// Map a reference back to its file, rejecting anything that would escape
  /// the root.
  pub fn path_of(&self, reference: &EvidenceRef) -> Option<PathBuf> {
    let relative = reference.as_str().strip_prefix(REFERENCE_PREFIX)?;
    let mut parts = relative.split('/');
    let (folder, file) = (parts.next()?, parts.next()?);
    if parts.next().is_some()
      || [folder, file].iter().any(|p| p.is_empty() || *p == "." || *p == "..")
    {
      return None;
    }
    Some(self.root.join(folder).join(file))
  }
}

fn io_error(e: std::io::Error) -> Error {
  Error::StorageUnavailable(format!("evidence store: {e}"))
}
