//! Input loading: read a local file or download a URL, then classify it.
//!
//! The core pipeline consumes a base64 payload, raw PDF bytes, or plain text.
//! Callers with a path or URL in hand (the CLI, batch jobs) use
//! [`load_document`] to get the bytes into memory and learn which entry
//! point applies. Nothing touches the file system beyond the one read.

use crate::error::QuizError;
use crate::pipeline::decode::decode_document;
use std::path::PathBuf;
use tracing::{debug, info};

/// What kind of content a loaded input turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Raw PDF bytes (`%PDF` magic).
    Pdf,
    /// ASCII text that decodes as base64 to a PDF.
    Base64Pdf,
    /// Anything else that is valid UTF-8; quizzed on directly.
    Text,
}

/// A loaded input and its classification.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub bytes: Vec<u8>,
    pub kind: DocumentKind,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load a local path or HTTP(S) URL and classify the bytes.
pub async fn load_document(input: &str, timeout_secs: u64) -> Result<LoadedDocument, QuizError> {
    let bytes = if is_url(input) {
        download_url(input, timeout_secs).await?
    } else {
        read_local(input).await?
    };
    let kind = classify_bytes(&bytes).ok_or_else(|| QuizError::UnsupportedInput {
        input: input.to_string(),
        reason: "not a PDF and not UTF-8 text".into(),
    })?;
    debug!("Loaded {} bytes from {} as {:?}", bytes.len(), input, kind);
    Ok(LoadedDocument { bytes, kind })
}

/// Classify loaded bytes; `None` for binary data that is not a PDF.
pub fn classify_bytes(bytes: &[u8]) -> Option<DocumentKind> {
    if bytes.starts_with(b"%PDF") {
        return Some(DocumentKind::Pdf);
    }
    let text = std::str::from_utf8(bytes).ok()?;
    let looks_base64 = !text.trim().is_empty()
        && !text.trim().contains(' ')
        && decode_document(text).is_ok_and(|decoded| decoded.starts_with(b"%PDF"));
    if looks_base64 {
        Some(DocumentKind::Base64Pdf)
    } else {
        Some(DocumentKind::Text)
    }
}

async fn read_local(path_str: &str) -> Result<Vec<u8>, QuizError> {
    let path = PathBuf::from(path_str);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(QuizError::InputNotFound { path })
        }
        Err(e) => Err(QuizError::UnsupportedInput {
            input: path_str.to_string(),
            reason: e.to_string(),
        }),
    }
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, QuizError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| QuizError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| QuizError::DownloadFailed {
        url: url.to_string(),
        reason: if e.is_timeout() {
            format!("timed out after {}s", timeout_secs)
        } else {
            e.to_string()
        },
    })?;

    if !response.status().is_success() {
        return Err(QuizError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(|e| QuizError::DownloadFailed {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    Ok(bytes.to_vec())
}
