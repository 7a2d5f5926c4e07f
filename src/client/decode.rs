//! Content-type classification and payload decoding.
//!
//! The pipeline decides a [`ContentKind`] once from the response headers
//! and dispatches on it; nothing downstream re-inspects the header
//! string. Dataset-level record decoding (CSV rows, Parquet column
//! batches) belongs to loader collaborators, which receive the raw
//! [`DecodedBody`] payload.

use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use serde_json::Value;

/// Payload classification decided once from the `Content-Type` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// `application/json`
    Json,
    /// Any `text/*` type
    Text,
    /// Everything else
    Binary,
}

impl ContentKind {
    /// Classify from response headers; a missing or unreadable header
    /// falls through to [`ContentKind::Binary`].
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");
        Self::from_content_type(content_type)
    }

    /// Classify a bare `Content-Type` value, ignoring parameters such as
    /// `charset`.
    pub fn from_content_type(content_type: &str) -> Self {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        if mime == "application/json" {
            ContentKind::Json
        } else if mime.starts_with("text/") {
            ContentKind::Text
        } else {
            ContentKind::Binary
        }
    }
}

/// A response payload after content-type dispatch.
#[derive(Debug, Clone)]
pub enum DecodedBody {
    Json(Value),
    Text(String),
    Binary(Bytes),
}

impl DecodedBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            DecodedBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            DecodedBody::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            DecodedBody::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Payload size in bytes (serialized size for JSON values).
    pub fn len(&self) -> usize {
        match self {
            DecodedBody::Json(value) => value.to_string().len(),
            DecodedBody::Text(text) => text.len(),
            DecodedBody::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decode raw bytes according to their classified kind.
///
/// Text decoding is lossy over invalid UTF-8 rather than failing; only
/// malformed JSON produces an error.
pub fn decode(kind: ContentKind, body: Bytes) -> Result<DecodedBody, serde_json::Error> {
    match kind {
        ContentKind::Json => Ok(DecodedBody::Json(serde_json::from_slice(&body)?)),
        ContentKind::Text => Ok(DecodedBody::Text(
            String::from_utf8_lossy(&body).into_owned(),
        )),
        ContentKind::Binary => Ok(DecodedBody::Binary(body)),
    }
}

/// Declared dataset format supplied by loader collaborators alongside a
/// URL. The core only uses it as a hint; decode dispatch stays driven by
/// the response `Content-Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetFormat {
    Csv,
    Parquet,
    Other,
}

impl DatasetFormat {
    /// Detect a format from a path or URL extension.
    pub fn from_path(path: &str) -> Self {
        let without_query = path.split_once('?').map_or(path, |(before, _)| before);
        let trimmed = without_query
            .split_once('#')
            .map_or(without_query, |(before, _)| before);

        match trimmed.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
            Some("csv") => DatasetFormat::Csv,
            Some("parquet") => DatasetFormat::Parquet,
            _ => DatasetFormat::Other,
        }
    }

    /// The content kind a well-behaved host serves this format as.
    pub fn expected_kind(&self) -> ContentKind {
        match self {
            DatasetFormat::Csv => ContentKind::Text,
            DatasetFormat::Parquet | DatasetFormat::Other => ContentKind::Binary,
        }
    }
}
