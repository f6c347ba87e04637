//! Fuzzy matching of song titles and artists.

use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Share of the score that comes from the title when both artists are known.
const TITLE_WEIGHT: f64 = 0.75;

/// Split a title or artist into comparable words.
///
/// Accents and case are folded, apostrophes are dropped ("It's" is "its")
/// and version tags in brackets such as "(Live)" or "[Remastered]" are ignored.
pub fn comparison_words(text: &str) -> Vec<String> {
    let mut folded = String::with_capacity(text.len());
    let mut depth = 0usize;

    for c in text.nfkd().filter(|c| !is_combining_mark(*c)) {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            '\'' | '\u{2019}' => {}
            _ if depth > 0 => {}
            c if c.is_alphanumeric() => folded.extend(c.to_lowercase()),
            _ => folded.push(' '),
        }
    }

    folded.split_whitespace().map(str::to_string).collect()
}

/// Dice coefficient of the two word sets; extra words on either side count.
fn title_score(requested: &HashSet<String>, found: &HashSet<String>) -> f64 {
    if requested.is_empty() || found.is_empty() {
        return 0.0;
    }
    let shared = requested.intersection(found).count() as f64;
    2.0 * shared / (requested.len() + found.len()) as f64
}

/// Share of the requested artist words present in the found artist.
///
/// "Newton" fully matches "John Newton".
fn artist_score(requested: &HashSet<String>, found: &HashSet<String>) -> f64 {
    if requested.is_empty() {
        return 0.0;
    }
    requested.intersection(found).count() as f64 / requested.len() as f64
}

/// Score from 0.0 to 1.0 how well a found song matches the request.
///
/// Without an artist on either side only the title counts.
pub fn song_similarity(title: &str, artist: &str, found_title: &str, found_artist: &str) -> f64 {
    let words = |text: &str| comparison_words(text).into_iter().collect::<HashSet<_>>();

    let title = title_score(&words(title), &words(found_title));

    let requested_artist = words(artist);
    let found_artist = words(found_artist);
    if requested_artist.is_empty() || found_artist.is_empty() {
        return title;
    }

    TITLE_WEIGHT * title + (1.0 - TITLE_WEIGHT) * artist_score(&requested_artist, &found_artist)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_words() {
        assert_eq!(comparison_words("Amazing Grace!"), vec!["amazing", "grace"]);
        assert_eq!(comparison_words("  It's  Well "), vec!["its", "well"]);
        assert_eq!(comparison_words("Ressuscita-me"), vec!["ressuscita", "me"]);
        assert_eq!(comparison_words("Coração Igual ao Teu"), vec!["coracao", "igual", "ao", "teu"]);
        assert_eq!(comparison_words("Oceans (Live) [Remastered]"), vec!["oceans"]);
    }

    #[test]
    fn test_exact_match_ignores_case_and_punctuation() {
        assert_eq!(
            song_similarity("Amazing Grace", "John Newton", "amazing grace!", "JOHN NEWTON"),
            1.0
        );
        assert_eq!(song_similarity("Oceans", "", "Oceans (Live)", "Hillsong"), 1.0);
    }

    #[test]
    fn test_partial_artist_still_matches() {
        assert_eq!(
            song_similarity("Amazing Grace", "Newton", "Amazing Grace", "John Newton"),
            1.0
        );
        let score = song_similarity("Holy Holy Holy", "Heber", "Holy Holy Holy", "Someone Else");
        assert!((score - TITLE_WEIGHT).abs() < 1e-9);
    }

    #[test]
    fn test_title_outweighs_artist() {
        let right_song = song_similarity("Amazing Grace", "Chris Tomlin", "Amazing Grace", "John Newton");
        let right_artist = song_similarity("Amazing Grace", "John Newton", "Amazing Love", "John Newton");
        assert!(right_song > right_artist);
    }

    #[test]
    fn test_unrelated_songs_score_low() {
        assert!(song_similarity("Amazing Grace", "", "Holy Holy Holy", "Reginald Heber") < 0.5);
        assert_eq!(song_similarity("", "", "Holy", ""), 0.0);
    }
}
