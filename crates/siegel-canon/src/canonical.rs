// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Volatile path scrubbing.
//
// Published documents embed their own publication coordinates in URLs:
// `/_publication/2024-01-15/...` archive segments and `/_date/2024-01-15`
// pinned-date segments.  Those change on every re-publication while the
// substantive content does not, so they are removed before hashing.

use once_cell::sync::Lazy;
use regex::Regex;

/// Publication archive segments: `_publication/YYYY-MM` with optional day
/// and hour parts, with or without a leading slash.
static PUBLICATION_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)/?_publication/\d{4}-\d{2}(?:-\d{2})?(?:-\d{2})?")
        .expect("publication path pattern")
});

/// Pinned-date segments: `_date/YYYY-MM-DD`.
static DATE_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/?_date/\d{4}-\d{2}-\d{2}").expect("date path pattern"));

/// Remove every volatile path segment from an extracted fragment.
pub fn scrub_volatile_paths(fragment: &str) -> String {
    let pass = PUBLICATION_PATH.replace_all(fragment, "");
    let pass = DATE_PATH.replace_all(&pass, "");
    pass.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publication_segment_is_removed() {
        assert_eq!(
            scrub_volatile_paths("<a href=\"/_publication/2024-01/x.html\">x</a>"),
            "<a href=\"/x.html\">x</a>"
        );
    }

    #[test]
    fn day_and_hour_parts_are_covered() {
        assert_eq!(scrub_volatile_paths("/_publication/2024-01-15/p"), "/p");
        assert_eq!(scrub_volatile_paths("/_publication/2024-01-15-08/p"), "/p");
    }

    #[test]
    fn date_segment_is_removed() {
        assert_eq!(
            scrub_volatile_paths("see <a href=\"/_date/2024-01-01/notes\">notes</a>"),
            "see <a href=\"/notes\">notes</a>"
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(scrub_volatile_paths("/_PUBLICATION/2024-12/x"), "/x");
        assert_eq!(scrub_volatile_paths("/_Date/2024-12-31/x"), "/x");
    }

    #[test]
    fn all_occurrences_are_removed() {
        let fragment = "/_publication/2024-01/a /_publication/2024-02/b /_date/2024-03-01/c";
        assert_eq!(scrub_volatile_paths(fragment), "/a /b /c");
    }

    #[test]
    fn leading_slash_is_optional() {
        assert_eq!(scrub_volatile_paths("x _publication/2024-01 y"), "x  y");
    }

    #[test]
    fn near_matches_are_left_alone() {
        assert_eq!(
            scrub_volatile_paths("/_publication/2024/x"),
            "/_publication/2024/x"
        );
        assert_eq!(
            scrub_volatile_paths("/publication/2024-01/x"),
            "/publication/2024-01/x"
        );
    }

    #[test]
    fn fragment_without_volatile_paths_is_unchanged() {
        let fragment = "<div class=\"tuf-authenticate\"><p>stable</p></div>";
        assert_eq!(scrub_volatile_paths(fragment), fragment);
    }
}
