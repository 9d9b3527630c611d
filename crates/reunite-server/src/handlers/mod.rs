//! Route handlers, one module per resource.

pub mod cases;
pub mod matches;
pub mod reports;
pub mod stats;
pub mod videos;

use std::collections::HashMap;

use axum::{Json, extract::Multipart};
use reunite_core::report::non_blank;
use serde_json::{Value, json};

use crate::{error::ApiError, evidence::Upload};

/// `GET /health`
pub async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

/// A fully-buffered multipart form. Parts with a filename are files; the rest
/// are text fields.
#[derive(Debug, Default)]
pub struct Form {
  text:  HashMap<String, String>,
  files: Vec<(String, Upload)>,
}

impl Form {
  pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
    let mut form = Self::default();

    while let Some(field) = multipart.next_field().await? {
      let name = field.name().unwrap_or_default().to_owned();

      match field.file_name().map(str::to_owned) {
        Some(file_name) => {
          let media_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_owned();
          let bytes = field.bytes().await?;
          form.files.push((name, Upload {
            file_name: Some(file_name).filter(|n| !n.is_empty()),
            media_type,
            bytes,
          }));
        }
        None => {
          let value = field.text().await?;
          form.text.insert(name, value);
        }
      }
    }

    Ok(form)
  }

  /// A text field, with blank values treated as absent.
  pub fn text(&self, name: &str) -> Option<String> {
    non_blank(self.text.get(name).cloned())
  }

  /// Remove and return every file submitted under `name`, in upload order.
  pub fn take_files(&mut self, name: &str) -> Vec<Upload> {
    let (taken, rest) = std::mem::take(&mut self.files)
      .into_iter()
      .partition::<Vec<_>, _>(|(field, _)| field == name);
    self.files = rest;
    taken.into_iter().map(|(_, upload)| upload).collect()
  }
}
