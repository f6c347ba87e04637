//! Lyrics lookup: the search collaborator and a directory-backed implementation.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::images::ImageSource;
use crate::matching::song_similarity;
use crate::types::SongRequest;
use crate::Result;

/// Minimum similarity for a library entry to count as a match.
const DEFAULT_MIN_SIMILARITY: f64 = 0.5;

/// A song found by a lyrics source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub artist: String,
    /// Raw lyric text, stanzas separated by blank lines.
    pub lyrics: String,
    /// Cover art for the title slide.
    pub art: Option<ImageSource>,
}

/// Looks up lyrics by title and artist.
pub trait LyricsSource {
    /// Returns `Ok(None)` when nothing matches.
    fn search(&self, title: &str, artist: &str) -> Result<Option<SearchHit>>;
}

/// The found song differs from the one that was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchWarning {
    pub requested: SongRequest,
    pub found_title: String,
    pub found_artist: String,
}

impl MismatchWarning {
    /// Compare a hit with the request; any difference needs confirmation.
    pub fn check(request: &SongRequest, hit: &SearchHit) -> Option<Self> {
        if hit.title == request.title && hit.artist == request.singer {
            return None;
        }
        Some(Self {
            requested: request.clone(),
            found_title: hit.title.clone(),
            found_artist: hit.artist.clone(),
        })
    }
}

/// Decides whether to continue with a mismatched song.
pub trait MismatchResolver {
    fn confirm(&mut self, warning: &MismatchWarning) -> bool;
}

impl<F> MismatchResolver for F
where
    F: FnMut(&MismatchWarning) -> bool,
{
    fn confirm(&mut self, warning: &MismatchWarning) -> bool {
        self(warning)
    }
}

/// Resolver that accepts every mismatch.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptMismatches;

impl MismatchResolver for AcceptMismatches {
    fn confirm(&mut self, _warning: &MismatchWarning) -> bool {
        true
    }
}

/// Resolver that rejects every mismatch.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectMismatches;

impl MismatchResolver for RejectMismatches {
    fn confirm(&mut self, _warning: &MismatchWarning) -> bool {
        false
    }
}

/// Lyrics stored as `Title - Artist.txt` files in one directory.
///
/// An image with the same stem (`.png`, `.jpg`, `.jpeg`) is used as title art.
#[derive(Debug, Clone)]
pub struct LyricsLibrary {
    dir: PathBuf,
    min_similarity: f64,
}

impl LyricsLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            min_similarity: DEFAULT_MIN_SIMILARITY,
        }
    }

    /// Set the minimum similarity score for a match.
    pub fn with_min_similarity(mut self, score: f64) -> Self {
        self.min_similarity = score.clamp(0.0, 1.0);
        self
    }

    fn entries(&self) -> Result<Vec<(PathBuf, String, String)>> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for entry in read_dir {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let (title, artist) = match stem.split_once(" - ") {
                Some((title, artist)) => (title.trim().to_string(), artist.trim().to_string()),
                None => (stem.trim().to_string(), String::new()),
            };
            entries.push((path, title, artist));
        }
        entries.sort();
        Ok(entries)
    }

    fn art_for(path: &Path) -> Option<ImageSource> {
        ["png", "jpg", "jpeg"]
            .iter()
            .map(|ext| path.with_extension(ext))
            .find(|candidate| candidate.is_file())
            .map(ImageSource::File)
    }
}

impl LyricsSource for LyricsLibrary {
    fn search(&self, title: &str, artist: &str) -> Result<Option<SearchHit>> {
        let mut best: Option<(f64, PathBuf, String, String)> = None;

        for (path, found_title, found_artist) in self.entries()? {
            let score = song_similarity(title, artist, &found_title, &found_artist);
            if score >= self.min_similarity && best.as_ref().map_or(true, |b| score > b.0) {
                best = Some((score, path, found_title, found_artist));
            }
        }

        let Some((score, path, found_title, found_artist)) = best else {
            log::debug!("No library entry for '{}' by '{}'", title, artist);
            return Ok(None);
        };

        log::debug!(
            "Matched '{}' by '{}' to {} (score {:.2})",
            title,
            artist,
            path.display(),
            score
        );

        Ok(Some(SearchHit {
            lyrics: fs::read_to_string(&path)?,
            art: Self::art_for(&path),
            title: found_title,
            artist: found_artist,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn library() -> (TempDir, LyricsLibrary) {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Amazing Grace - John Newton.txt"),
            "Amazing grace\n\nI once was lost",
        )
        .unwrap();
        fs::write(dir.path().join("Holy Holy Holy - Reginald Heber.txt"), "Holy").unwrap();
        fs::write(dir.path().join("Holy Holy Holy - Reginald Heber.png"), b"png").unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();
        let library = LyricsLibrary::new(dir.path());
        (dir, library)
    }

    #[test]
    fn test_exact_match() {
        let (_dir, library) = library();
        let hit = library.search("Amazing Grace", "John Newton").unwrap().unwrap();
        assert_eq!(hit.title, "Amazing Grace");
        assert_eq!(hit.artist, "John Newton");
        assert_eq!(hit.lyrics, "Amazing grace\n\nI once was lost");
        assert_eq!(hit.art, None);
    }

    #[test]
    fn test_fuzzy_match_and_art() {
        let (dir, library) = library();
        let hit = library.search("holy holy holy", "heber").unwrap().unwrap();
        assert_eq!(hit.title, "Holy Holy Holy");
        assert_eq!(
            hit.art,
            Some(ImageSource::File(dir.path().join("Holy Holy Holy - Reginald Heber.png")))
        );
    }

    #[test]
    fn test_not_found() {
        let (_dir, library) = library();
        assert!(library.search("Blessed Assurance", "Fanny Crosby").unwrap().is_none());
    }

    #[test]
    fn test_missing_directory_finds_nothing() {
        let library = LyricsLibrary::new("/definitely/not/here");
        assert!(library.search("Anything", "").unwrap().is_none());
    }

    #[test]
    fn test_mismatch_warning() {
        let hit = SearchHit {
            title: "Amazing Grace".to_string(),
            artist: "John Newton".to_string(),
            lyrics: String::new(),
            art: None,
        };
        assert!(MismatchWarning::check(&SongRequest::new("Amazing Grace", "John Newton"), &hit).is_none());

        let warning = MismatchWarning::check(&SongRequest::new("amazing grace", "newton"), &hit).unwrap();
        assert_eq!(warning.found_title, "Amazing Grace");
        assert_eq!(warning.found_artist, "John Newton");
    }

    #[test]
    fn test_closure_resolver() {
        let warning = MismatchWarning {
            requested: SongRequest::new("a", "b"),
            found_title: "A".to_string(),
            found_artist: "B".to_string(),
        };
        let mut calls = 0;
        let mut resolver = |_: &MismatchWarning| {
            calls += 1;
            true
        };
        assert!(resolver.confirm(&warning));
        assert!(!RejectMismatches.confirm(&warning));
        assert!(AcceptMismatches.confirm(&warning));
        assert_eq!(calls, 1);
    }
}
