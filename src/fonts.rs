//! Best-effort font resolution for the rasterizer.
//!
//! Card text must not sample before fonts settle, but a missing or broken
//! font face is never fatal: resolution is bounded by a deadline and any
//! failure silently falls back to block glyphs, mirroring how a browser
//! substitutes a fallback face rather than erroring.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rusttype::Font;

// Conventional locations probed after the configured paths; the local
// ./fonts directory is checked first so a vendored face wins.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "fonts/DejaVuSans.ttf",
    "fonts/Arial.ttf",
    "fonts/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
];

/// A resolved (or deliberately empty) set of font faces.
pub struct FontBook {
    face: Option<Font<'static>>,
}

impl FontBook {
    /// Resolve a face from the configured paths, then well-known locations,
    /// giving up silently once `deadline` elapses. Never fails.
    pub fn resolve(paths: &[PathBuf], search_system: bool, deadline: Duration) -> FontBook {
        let started = Instant::now();
        let mut candidates: Vec<PathBuf> = paths.to_vec();
        if search_system {
            candidates.extend(SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from));
        }

        for path in candidates {
            if started.elapsed() > deadline {
                log::warn!("Font resolution deadline hit; using fallback glyphs");
                break;
            }
            if let Some(font) = load_face(&path) {
                log::debug!("Resolved card font from {}", path.display());
                return FontBook { face: Some(font) };
            }
        }
        FontBook { face: None }
    }

    /// A book with no faces; text rasterizes as fallback blocks. Used for
    /// deterministic rendering in tests and goldens.
    pub fn empty() -> FontBook {
        FontBook { face: None }
    }

    /// Whether a real face was resolved.
    pub fn ready(&self) -> bool {
        self.face.is_some()
    }

    pub fn face(&self) -> Option<&Font<'static>> {
        self.face.as_ref()
    }
}

fn load_face(path: &Path) -> Option<Font<'static>> {
    let bytes = std::fs::read(path).ok()?;
    Font::try_from_vec(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_book_is_not_ready() {
        let book = FontBook::empty();
        assert!(!book.ready());
        assert!(book.face().is_none());
    }

    #[test]
    fn unresolvable_paths_fall_back_silently() {
        let book = FontBook::resolve(
            &[PathBuf::from("/definitely/not/a/font.ttf")],
            false,
            Duration::from_millis(50),
        );
        assert!(!book.ready());
    }

    #[test]
    fn garbage_font_bytes_are_rejected_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        let book = FontBook::resolve(&[path], false, Duration::from_millis(50));
        assert!(!book.ready());
    }
}
