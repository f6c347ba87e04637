//! File name sanitization for presentations and style presets.

use crate::{Error, Result};

/// Characters that are not allowed in generated file names.
pub const RESERVED_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|', '\t'];

/// Strip reserved characters and surrounding whitespace from a file name.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !RESERVED_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Reserved characters present in `name`, in order of first appearance.
fn offending_chars(name: &str) -> Vec<char> {
    let mut found = Vec::new();
    for c in name.chars() {
        if RESERVED_CHARS.contains(&c) && !found.contains(&c) {
            found.push(c);
        }
    }
    found
}

fn describe_chars(chars: &[char]) -> String {
    chars
        .iter()
        .map(|c| match c {
            '\t' => "\\t".to_string(),
            c => c.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the output file name for a song: `"{title} ({singer}).pptx"`.
///
/// The singer is lower-cased and trimmed, then the whole name is sanitized.
/// Fails when nothing usable is left of the title.
pub fn presentation_filename(title: &str, singer: &str) -> Result<String> {
    let raw = format!("{} ({}).pptx", title, singer.to_lowercase().trim());
    let stem = sanitize_filename(title);

    if stem.is_empty() {
        let offending = offending_chars(title);
        let reason = if offending.is_empty() {
            "the title is empty".to_string()
        } else {
            format!(
                "the title only contains reserved characters: {}",
                describe_chars(&offending)
            )
        };
        return Err(Error::Persistence { name: raw, reason });
    }

    let file_name = sanitize_filename(&raw);
    let offending = offending_chars(&raw);
    if !offending.is_empty() {
        log::debug!(
            "Removed reserved characters {} from '{}'",
            describe_chars(&offending),
            raw
        );
    }

    Ok(file_name)
}

/// Build the file name for a style preset.
///
/// Keeps an existing `.json` extension; any other extension is cut at the
/// first dot before `.json` is appended.
pub fn style_filename(name: &str) -> Result<String> {
    let sanitized = sanitize_filename(name);

    let stem = if let Some(stem) = sanitized.strip_suffix(".json") {
        stem.to_string()
    } else {
        sanitized
            .split('.')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string()
    };

    if stem.is_empty() {
        let offending = offending_chars(name);
        return Err(Error::Persistence {
            name: name.to_string(),
            reason: if offending.is_empty() {
                "the style name is empty".to_string()
            } else {
                format!("invalid characters: {}", describe_chars(&offending))
            },
        });
    }

    Ok(format!("{}.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presentation_filename() {
        assert_eq!(
            presentation_filename("Amazing Grace", "John Newton").unwrap(),
            "Amazing Grace (john newton).pptx"
        );
    }

    #[test]
    fn test_presentation_filename_trims_singer() {
        assert_eq!(
            presentation_filename("Holy", "  Reginald HEBER ").unwrap(),
            "Holy (reginald heber).pptx"
        );
    }

    #[test]
    fn test_presentation_filename_strips_reserved() {
        assert_eq!(
            presentation_filename("What? Now: \"Yes\"", "A/B|C").unwrap(),
            "What Now Yes (abc).pptx"
        );
        assert_eq!(
            presentation_filename("Tab\tSong", "").unwrap(),
            "TabSong ().pptx"
        );
    }

    #[test]
    fn test_presentation_filename_rejects_reserved_only_title() {
        match presentation_filename("?*?", "x") {
            Err(Error::Persistence { reason, .. }) => {
                assert!(reason.contains('?'));
                assert!(reason.contains('*'));
            }
            other => panic!("expected persistence error, got {:?}", other),
        }
    }

    #[test]
    fn test_style_filename() {
        assert_eq!(style_filename("dark stage").unwrap(), "dark stage.json");
        assert_eq!(style_filename("dark stage.json").unwrap(), "dark stage.json");
        assert_eq!(style_filename("dark.txt").unwrap(), "dark.json");
        assert_eq!(style_filename("a/b:c").unwrap(), "abc.json");
        assert!(style_filename("//").is_err());
    }
}
