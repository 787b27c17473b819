//! Input resolution: turn a user-supplied path or URL into named bytes.
//!
//! The document kind is decided by file extension (`.srt`, `.vtt`, `.pdf`,
//! case-insensitive). Downloads whose URL carries no usable extension fall
//! back to the PDF magic bytes (`%PDF`), so links like `/download?id=42`
//! still work for PDFs.

use crate::error::DeckError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Srt,
    Vtt,
    Pdf,
}

impl DocumentKind {
    /// Detect the kind from a file name's extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "srt" => Some(DocumentKind::Srt),
            "vtt" => Some(DocumentKind::Vtt),
            "pdf" => Some(DocumentKind::Pdf),
            _ => None,
        }
    }

    /// `true` for SRT and VTT.
    pub fn is_subtitle(self) -> bool {
        matches!(self, DocumentKind::Srt | DocumentKind::Vtt)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentKind::Srt => "srt",
            DocumentKind::Vtt => "vtt",
            DocumentKind::Pdf => "pdf",
        })
    }
}

/// A document ready for normalization.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// File name (no directories), used in messages.
    pub name: String,
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    /// Wrap in-memory bytes, detecting the kind from `name`.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, DeckError> {
        let name = name.into();
        let kind = DocumentKind::from_file_name(&name)
            .ok_or_else(|| DeckError::UnsupportedFormat { name: name.clone() })?;
        Ok(Self { name, kind, bytes })
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// `true` when `input` could resolve to a PDF.
///
/// Local paths and URLs are judged by their file name. A URL whose last
/// segment has no recognised extension may still turn out to be a PDF once
/// downloaded, so it counts too.
pub fn may_be_pdf(input: &str) -> bool {
    let input = input.trim();
    if is_url(input) {
        !matches!(
            DocumentKind::from_file_name(&file_name_from_url(input)),
            Some(kind) if kind.is_subtitle()
        )
    } else {
        DocumentKind::from_file_name(input) == Some(DocumentKind::Pdf)
    }
}

/// Resolve the input string to a [`SourceDocument`].
///
/// If the input is a URL, download it. If it is a local path, validate the
/// extension before reading so unsupported files are rejected without I/O.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<SourceDocument, DeckError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(DeckError::InputMissing);
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input).await
    }
}

async fn resolve_local(path_str: &str) -> Result<SourceDocument, DeckError> {
    let path = PathBuf::from(path_str);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_str.to_string());

    let kind = DocumentKind::from_file_name(&name)
        .ok_or_else(|| DeckError::UnsupportedFormat { name: name.clone() })?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(DeckError::PermissionDenied { path });
        }
        Err(_) => return Err(DeckError::FileNotFound { path }),
    };

    debug!("Resolved local {} document: {} ({} bytes)", kind, path.display(), bytes.len());
    Ok(SourceDocument { name, kind, bytes })
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<SourceDocument, DeckError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DeckError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            DeckError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DeckError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(DeckError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            DeckError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DeckError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    let name = file_name_from_url(url);
    let kind = match DocumentKind::from_file_name(&name) {
        Some(kind) => kind,
        None if bytes.starts_with(b"%PDF") => DocumentKind::Pdf,
        None => return Err(DeckError::UnsupportedFormat { name }),
    };

    info!("Downloaded {} bytes ({})", bytes.len(), kind);
    Ok(SourceDocument {
        name,
        kind,
        bytes: bytes.to_vec(),
    })
}

/// Last non-empty path segment of the URL, or `"download"`.
fn file_name_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() {
                    return last.to_string();
                }
            }
        }
    }
    "download".to_string()
}
