//! Anki deck export.
//!
//! The deck is a two-column, semicolon-separated CSV: the word on the front,
//! an HTML fragment on the back. Anki imports it with "Allow HTML in fields"
//! and the semicolon separator.

use crate::error::DeckError;
use crate::output::Flashcard;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::info;

/// File name used when the caller gives none.
pub const DEFAULT_DECK_FILE_NAME: &str = "anki_deck.csv";

/// CSV header row.
pub const DECK_HEADER: &str = "Front;Back";

/// One deck row before CSV quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckRecord {
    pub front: String,
    pub back: String,
}

impl DeckRecord {
    /// `front;"back"` with CSV quoting applied.
    pub fn to_csv_row(&self) -> String {
        format!("{};{}", quote_front(&self.front), quote(&self.back))
    }
}

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn quote_front(field: &str) -> String {
    if field.contains([';', '"', '\r', '\n']) {
        quote(field)
    } else {
        field.to_string()
    }
}

/// Lay a flashcard out as a front/back record.
pub fn format_card(card: &Flashcard) -> DeckRecord {
    let ipa = card
        .ipa
        .as_deref()
        .map(|ipa| {
            format!(
                r#"<span style="color: #8E8E93; margin-left: 10px;">/{}/</span>"#,
                escape_html(ipa)
            )
        })
        .unwrap_or_default();

    let synonyms = if card.synonyms.is_empty() {
        String::new()
    } else {
        format!(
            r#"<div style="margin-top: 10px;">
                <strong style="color: #E5E5E7;">Synonyms:</strong> {}
            </div>"#,
            escape_html(&card.synonyms.join(", "))
        )
    };

    let back = format!(
        r#"
        <div style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; text-align: left; color: #E5E5E7;">
            <div style="font-weight: bold; font-size: 1.2em;">
                {pos}
                {ipa}
            </div>
            <hr style="margin: 10px 0; border-top: 1px solid #38383A; border-bottom: none;">
            <p style="font-size: 1.1em;">{definition}</p>
            <blockquote style="border-left: 4px solid #38383A; padding-left: 10px; margin: 10px 0; color: #8E8E93; font-style: italic;">
                "{example}"
            </blockquote>
            {synonyms}
        </div>
        "#,
        pos = escape_html(&card.part_of_speech),
        definition = escape_html(&card.definition),
        example = escape_html(&card.example_sentence),
    );

    DeckRecord {
        front: card.word.clone(),
        back: RE_WHITESPACE.replace_all(&back, " ").trim().to_string(),
    }
}

/// Render cards as a deck: header plus one CRLF-separated row per card,
/// no trailing line break.
pub fn export_csv(cards: &[Flashcard]) -> String {
    std::iter::once(DECK_HEADER.to_string())
        .chain(cards.iter().map(|c| format_card(c).to_csv_row()))
        .collect::<Vec<_>>()
        .join("\r\n")
}

/// Write the deck to `path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files, and
/// creates missing parent directories.
pub async fn write_deck(path: impl AsRef<Path>, cards: &[Flashcard]) -> Result<(), DeckError> {
    let path = path.as_ref();
    let write_err = |e| DeckError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("csv.tmp");
    tokio::fs::write(&tmp_path, export_csv(cards))
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    info!("Wrote {} cards to {}", cards.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(word: &str) -> Flashcard {
        Flashcard {
            word: word.into(),
            part_of_speech: "adjective".into(),
            ipa: Some("ˈvɪvɪd".into()),
            definition: "producing \"strong\" images in the mind".into(),
            example_sentence: "She had a vivid dream.".into(),
            synonyms: vec!["bright".into(), "intense".into()],
        }
    }

    #[test]
    fn n_cards_give_n_plus_one_lines() {
        let csv = export_csv(&[card("vivid"), card("zeal"), card("abandon")]);
        let lines: Vec<_> = csv.split("\r\n").collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Front;Back");
        assert!(lines[1].starts_with("vivid;\""));
        assert!(!csv.ends_with("\r\n"));
    }

    #[test]
    fn empty_deck_is_header_only() {
        assert_eq!(export_csv(&[]), "Front;Back");
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let row = format_card(&card("vivid")).to_csv_row();
        assert!(row.contains(r#"""strong"""#), "row: {row}");
        assert!(row.contains(r#"""She had a vivid dream."""#), "row: {row}");
        assert!(row.ends_with('"'));
    }

    #[test]
    fn back_is_single_line_html() {
        let rec = format_card(&card("vivid"));
        assert!(!rec.back.contains('\n'));
        assert!(!rec.back.contains("  "));
        assert!(rec.back.starts_with("<div"));
        assert!(rec.back.contains("/ˈvɪvɪd/"));
        assert!(rec.back.contains("Synonyms:</strong> bright, intense"));
    }

    #[test]
    fn optional_parts_are_omitted() {
        let mut c = card("vivid");
        c.ipa = None;
        c.synonyms.clear();
        let rec = format_card(&c);
        assert!(!rec.back.contains("Synonyms"));
        assert!(!rec.back.contains("margin-left: 10px"));
    }

    #[test]
    fn text_is_html_escaped() {
        let mut c = card("vivid");
        c.definition = "a <b>bold</b> & bright look".into();
        let rec = format_card(&c);
        assert!(rec.back.contains("a &lt;b&gt;bold&lt;/b&gt; &amp; bright look"));
    }

    #[test]
    fn front_quoted_only_when_needed() {
        assert_eq!(quote_front("vivid"), "vivid");
        assert_eq!(quote_front("a;b"), "\"a;b\"");
        assert_eq!(quote_front("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[tokio::test]
    async fn write_deck_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decks/nested").join(DEFAULT_DECK_FILE_NAME);
        write_deck(&path, &[card("vivid")]).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, export_csv(&[card("vivid")]));
        assert!(!path.with_extension("csv.tmp").exists());
    }
}
