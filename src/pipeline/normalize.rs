//! Document normalization: subtitle or PDF bytes to flat text plus ordered
//! context lines.
//!
//! ## Why two outputs?
//!
//! Tokenizing wants one flat string; context binding wants the document's
//! own line or sentence boundaries so each target word can be shown in the
//! sentence it actually appeared in. Both are derived once here and never
//! mutated afterwards.
//!
//! PDF extraction runs inside `spawn_blocking`: pdfium wraps a C++ library
//! with thread-local state that must not run on a Tokio worker thread.

use crate::error::DeckError;
use crate::pipeline::input::{DocumentKind, SourceDocument};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::{debug, info};

/// Text extracted from a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedDocument {
    /// The whole document as one string with line breaks collapsed.
    pub full_text: String,
    /// Subtitle lines or PDF sentences, in document order.
    pub context_lines: Vec<String>,
}

impl NormalizedDocument {
    pub fn new(full_text: impl Into<String>, context_lines: Vec<String>) -> Self {
        Self {
            full_text: full_text.into(),
            context_lines,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.full_text.trim().is_empty()
    }
}

/// Normalize a resolved document according to its kind.
pub async fn normalize(doc: SourceDocument) -> Result<NormalizedDocument, DeckError> {
    let name = doc.name.clone();
    let normalized = match doc.kind {
        DocumentKind::Srt | DocumentKind::Vtt => {
            normalize_subtitle(&decode_text(&doc.bytes))
        }
        DocumentKind::Pdf => normalize_pdf(doc.bytes).await.map_err(|e| match e {
            DeckError::DocumentParseFailure { detail, .. } => DeckError::DocumentParseFailure {
                name: name.clone(),
                detail,
            },
            other => other,
        })?,
    };

    if normalized.is_empty() {
        return Err(DeckError::DocumentParseFailure {
            name,
            detail: "no text content found".into(),
        });
    }

    info!(
        "Normalized '{}': {} chars, {} context lines",
        name,
        normalized.full_text.len(),
        normalized.context_lines.len()
    );
    Ok(normalized)
}

/// Lossy UTF-8 decode with the byte-order mark removed.
pub fn decode_text(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.strip_prefix('\u{feff}').unwrap_or(&text).to_string()
}

// ── Subtitles ────────────────────────────────────────────────────────────────

// Header block: `WEBVTT` through the first blank line.
static RE_VTT_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A\s*WEBVTT\b.*?(?:\r?\n[ \t]*\r?\n|\z)").unwrap());
// Whole NOTE blocks, up to the next blank line.
static RE_VTT_NOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?ms)^NOTE\b.*?(?:\r?\n[ \t]*\r?\n|\z)").unwrap());
static RE_CUE_INDEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\d+[\r\n]+").unwrap());
static RE_TIMESTAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\d:,.\-]+ --> [\d:,.\-]+.*").unwrap());
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static RE_LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n]+").unwrap());

/// Strip SRT/VTT structure and keep the spoken text.
///
/// Removes the `WEBVTT` header block and, in VTT files, whole `NOTE`
/// blocks; then numeric cue indices and timestamp lines (with any cue
/// settings). Markup tags such as `<i>` become a space. Context lines are
/// the non-blank trimmed lines; the full text is those lines joined with a
/// space.
pub fn normalize_subtitle(content: &str) -> NormalizedDocument {
    let s = match RE_VTT_HEADER.find(content) {
        Some(header) => RE_VTT_NOTE.replace_all(&content[header.end()..], ""),
        None => Cow::Borrowed(content),
    };
    let s = RE_CUE_INDEX.replace_all(&s, "");
    let s = RE_TIMESTAMP.replace_all(&s, "");
    let s = RE_TAG.replace_all(&s, " ");
    let s = RE_LINE_BREAKS.replace_all(&s, "\n");

    let lines: Vec<String> = s
        .trim()
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    let full_text = lines.join(" ");
    NormalizedDocument {
        full_text,
        context_lines: lines,
    }
}

// ── PDF ──────────────────────────────────────────────────────────────────────

static RE_SENTENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^.!?]+[.!?]*").unwrap());

/// Extract page text from PDF bytes and normalize it.
///
/// Binds pdfium through `pdfium-auto`, which honours `PDFIUM_LIB_PATH` and
/// otherwise downloads and caches the library on first use.
pub async fn normalize_pdf(bytes: Vec<u8>) -> Result<NormalizedDocument, DeckError> {
    let pages = tokio::task::spawn_blocking(move || extract_pages_blocking(&bytes))
        .await
        .map_err(|e| DeckError::Internal(format!("PDF extraction task panicked: {e}")))??;

    debug!("Extracted text from {} PDF pages", pages.len());
    Ok(normalize_pdf_pages(&pages))
}

fn extract_pages_blocking(bytes: &[u8]) -> Result<Vec<String>, DeckError> {
    let pdfium =
        pdfium_auto::bind_pdfium_silent().map_err(|e| DeckError::PdfiumBindingFailed(e.to_string()))?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| DeckError::DocumentParseFailure {
            name: "pdf".into(),
            detail: format!("{e:?}"),
        })?;

    let mut pages = Vec::with_capacity(document.pages().len() as usize);
    for (index, page) in document.pages().iter().enumerate() {
        let text = page.text().map_err(|e| DeckError::DocumentParseFailure {
            name: "pdf".into(),
            detail: format!("page {}: {e:?}", index + 1),
        })?;
        // One page per line; sentence splitting happens across pages.
        pages.push(RE_LINE_BREAKS.replace_all(&text.all(), " ").into_owned());
    }
    Ok(pages)
}

/// Join page texts and split them into sentence-like context lines.
///
/// Pages are joined with `\n`; lines are the runs matching
/// `[^.!?]+[.!?]*`, trimmed, empties dropped. The full text has line breaks
/// collapsed to single spaces.
pub fn normalize_pdf_pages(pages: &[String]) -> NormalizedDocument {
    let joined = pages.join("\n");

    let context_lines = RE_SENTENCE
        .find_iter(&joined)
        .map(|m| m.as_str().trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    let full_text = RE_LINE_BREAKS.replace_all(&joined, " ").trim().to_string();
    NormalizedDocument {
        full_text,
        context_lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRT: &str = "1\r\n00:00:01,000 --> 00:00:03,500\r\n<i>I absolutely love</i> this.\r\n\r\n2\r\n00:00:04,000 --> 00:00:06,000\r\nWhat an incredible journey!\r\n";

    const VTT: &str = "WEBVTT - Episode 1\n\nNOTE written by hand\n\n00:01.000 --> 00:04.000 align:start position:10%\nHello <b>world</b>\n\n00:05.000 --> 00:08.000\nSecond line\n";

    #[test]
    fn srt_cues_become_lines() {
        let doc = normalize_subtitle(SRT);
        assert_eq!(
            doc.context_lines,
            vec!["I absolutely love  this.", "What an incredible journey!"]
        );
        assert_eq!(
            doc.full_text,
            "I absolutely love  this. What an incredible journey!"
        );
    }

    #[test]
    fn vtt_header_notes_and_settings_removed() {
        let doc = normalize_subtitle(VTT);
        assert_eq!(doc.context_lines, vec!["Hello  world", "Second line"]);
        assert!(!doc.full_text.contains("WEBVTT"));
        assert!(!doc.full_text.contains("-->"));
        assert!(!doc.full_text.contains("NOTE"));
    }

    #[test]
    fn vtt_header_block_and_multiline_notes_removed() {
        let vtt = "WEBVTT\nKind: captions\nLanguage: en\n\nNOTE\nThis translation was done by Kyle\nso blame him.\n\n00:01.000 --> 00:04.000\nHello harbour\n";
        let doc = normalize_subtitle(vtt);
        assert_eq!(doc.context_lines, vec!["Hello harbour"]);
        assert_eq!(doc.full_text, "Hello harbour");
    }

    #[test]
    fn srt_line_starting_with_note_is_kept() {
        let srt = "1\n00:00:01,000 --> 00:00:02,000\nNOTE the harbour.\n";
        assert_eq!(normalize_subtitle(srt).context_lines, vec!["NOTE the harbour."]);
    }

    #[test]
    fn empty_subtitle_is_empty() {
        let doc = normalize_subtitle("WEBVTT\n\n");
        assert!(doc.is_empty());
        assert!(doc.context_lines.is_empty());
    }

    #[test]
    fn decode_strips_bom_and_tolerates_invalid_utf8() {
        let mut bytes = "\u{feff}Hi".as_bytes().to_vec();
        bytes.push(0xff);
        let text = decode_text(&bytes);
        assert!(text.starts_with("Hi"));
        assert!(text.ends_with('\u{fffd}'));
    }

    #[test]
    fn pdf_pages_split_into_sentences() {
        let pages = vec![
            "The harbour was calm. Ships waited".to_string(),
            "for the tide! Was it late?".to_string(),
        ];
        let doc = normalize_pdf_pages(&pages);
        assert_eq!(
            doc.context_lines,
            vec!["The harbour was calm.", "Ships waited\nfor the tide!", "Was it late?"]
        );
        assert_eq!(
            doc.full_text,
            "The harbour was calm. Ships waited for the tide! Was it late?"
        );
    }

    #[test]
    fn pdf_without_text_is_empty() {
        let doc = normalize_pdf_pages(&[String::new(), "   ".to_string()]);
        assert!(doc.is_empty());
        assert!(doc.context_lines.is_empty());
    }

    #[tokio::test]
    async fn normalize_rejects_textless_subtitle() {
        let src = SourceDocument::from_bytes("empty.srt", b"1\n00:00:01,000 --> 00:00:02,000\n".to_vec())
            .unwrap();
        let err = normalize(src).await.unwrap_err();
        assert!(matches!(err, DeckError::DocumentParseFailure { .. }));
    }
}
