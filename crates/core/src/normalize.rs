//! Lyric normalization for scraped song lyrics.
//!
//! Turns a raw lyric blob (stanzas separated by blank lines) into the stanza
//! list consumed by the layout engine: service boilerplate is excised, the
//! contributor header is dropped, section labels like `[Chorus]` are removed
//! and an empty title placeholder is put at index 0.

use regex::{Captures, Regex};
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

use crate::types::SongRequest;
use crate::Result;

/// Boilerplate injected by the lyrics service.
static BOILERPLATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(you might also like|embed|\d{2}embed)").unwrap());

/// A section label that sits on its own line, e.g. `[Chorus]\n`.
static SECTION_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[.*?\]\n").unwrap());

/// The phrase that is replaced by a line break instead of being dropped.
const MIGHT_ALSO_LIKE: &str = "you might also like";

/// Separator between stanzas in raw lyric text.
const STANZA_SEPARATOR: &str = "\n\n";

/// Normalize line endings and compose Unicode characters.
fn canonical_text(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .nfc()
        .collect()
}

/// Split text into stanzas and put the title placeholder in front.
///
/// Used for lyrics typed by the user, which get no boilerplate cleanup.
pub fn stanzas_from_manual_text(text: &str) -> Vec<String> {
    let text = canonical_text(text);
    let mut stanzas = vec![String::new()];
    stanzas.extend(
        text.trim()
            .split(STANZA_SEPARATOR)
            .map(str::to_string),
    );
    stanzas
}

/// Parse a batch list where each line is `title, singer`.
///
/// Lines without a comma become a title with an empty singer.
pub fn parse_batch_list(text: &str) -> Vec<SongRequest> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once(',') {
            Some((title, rest)) => {
                let singer = rest.split(',').next().unwrap_or_default();
                SongRequest::new(title.trim(), singer.trim())
            }
            None => SongRequest::new(line, ""),
        })
        .collect()
}

/// Check whether a stanza is nothing but a leftover section label.
fn is_section_label(stanza: &str) -> bool {
    let trimmed = stanza.trim();
    trimmed.starts_with('[') || trimmed.ends_with(']')
}

/// Lyric normalizer for scraped lyrics.
#[derive(Debug, Clone, Default)]
pub struct LyricNormalizer {
    /// Keep the original letter case when excising boilerplate.
    preserve_case: bool,
}

impl LyricNormalizer {
    /// Create a normalizer that lower-cases stanzas containing boilerplate.
    ///
    /// Slides are upper-cased at layout time, so the lost case never shows
    /// in a generated presentation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether boilerplate excision keeps the stanza's original case.
    pub fn with_preserve_case(mut self, preserve: bool) -> Self {
        self.preserve_case = preserve;
        self
    }

    /// Normalize a whole lyric blob into a stanza list.
    ///
    /// The result always starts with the empty title placeholder.
    pub fn normalize(&self, raw_text: &str) -> Result<Vec<String>> {
        let text = canonical_text(raw_text);
        let stanzas = text.split(STANZA_SEPARATOR).map(str::to_string).collect();
        self.clean_stanzas(stanzas)
    }

    /// Clean stanzas that were already split on blank lines.
    pub fn clean_stanzas(&self, mut stanzas: Vec<String>) -> Result<Vec<String>> {
        let mut i = 0;
        while i < stanzas.len() {
            if BOILERPLATE_REGEX.is_match(&stanzas[i]) {
                let blocks = self.split_excised(&stanzas[i], i);
                stanzas.splice(i..=i, blocks);
            }

            if i == 0 {
                stanzas[0] = strip_header(&stanzas[0]);
            }

            i += 1;
        }

        let mut cleaned = vec![String::new()];
        cleaned.extend(
            stanzas
                .iter()
                .map(|stanza| remove_section_tags(stanza))
                .filter(|stanza| !is_section_label(stanza))
                .filter(|stanza| !stanza.trim().is_empty()),
        );

        log::debug!("Normalized lyrics into {} stanzas", cleaned.len() - 1);
        Ok(cleaned)
    }

    /// Excise boilerplate from one stanza.
    pub fn excise_boilerplate(&self, stanza: &str) -> String {
        let replace = |caps: &Captures| {
            if caps[0].eq_ignore_ascii_case(MIGHT_ALSO_LIKE) {
                "\n"
            } else {
                ""
            }
        };

        if self.preserve_case {
            BOILERPLATE_REGEX.replace_all(stanza, replace).into_owned()
        } else {
            BOILERPLATE_REGEX
                .replace_all(&stanza.to_lowercase(), replace)
                .into_owned()
        }
    }

    /// Excise boilerplate and re-split the result, keeping the first two blocks.
    fn split_excised(&self, stanza: &str, index: usize) -> Vec<String> {
        let excised = self.excise_boilerplate(stanza);
        let mut blocks = excised.split(STANZA_SEPARATOR);

        let first = blocks.next().unwrap_or_default();
        let mut result = vec![first.trim_matches('\n').to_string()];

        if let Some(second) = blocks.next() {
            let second = second.trim_matches('\n');
            if !second.is_empty() {
                result.push(second.to_string());
            }
        }

        let dropped = blocks.filter(|b| !b.trim().is_empty()).count();
        if dropped > 0 {
            log::debug!("Dropped {} trailing blocks from stanza {}", dropped, index + 1);
        }

        result
    }
}

/// Drop the service header line (e.g. `3 Contributors`) from the first stanza.
pub fn strip_header(stanza: &str) -> String {
    if stanza.chars().any(|c| c.is_ascii_digit()) {
        if let Some((_, rest)) = stanza.split_once('\n') {
            return rest.to_string();
        }
    }
    stanza.to_string()
}

/// Remove section labels that are followed by a line break.
pub fn remove_section_tags(stanza: &str) -> String {
    SECTION_TAG_REGEX.replace_all(stanza, "").into_owned()
}
