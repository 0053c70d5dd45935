// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SHA-256 fingerprint digests.

use sha2::{Digest, Sha256};

use siegel_core::error::Result;
use siegel_core::types::{Document, Fingerprint};

use crate::canonical::scrub_volatile_paths;
use crate::extract::{ExtractedFragment, extract_fragment};

/// Compute the fingerprint of already-canonical bytes.
pub fn digest_bytes(data: &[u8]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest: [u8; 32] = hasher.finalize().into();
    Fingerprint::from(digest)
}

/// Run the full pipeline for one document: extract the authenticatable
/// region, scrub volatile paths, and digest the result.
///
/// `Ok(None)` means a markup document carries no marked region and is
/// excluded from verification rather than failing the batch.
pub fn fingerprint_document(document: &Document) -> Result<Option<Fingerprint>> {
    let Some(fragment) = extract_fragment(document)? else {
        return Ok(None);
    };
    let fingerprint = match fragment {
        ExtractedFragment::Markup(text) => digest_bytes(scrub_volatile_paths(&text).as_bytes()),
        ExtractedFragment::Binary(bytes) => digest_bytes(&bytes),
    };
    Ok(Some(fingerprint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use siegel_core::types::MediaType;

    /// SHA-256 of the empty input.
    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn digest_of_empty_input() {
        assert_eq!(digest_bytes(b"").as_str(), EMPTY_SHA256);
    }

    #[test]
    fn digest_of_known_input() {
        assert_eq!(
            digest_bytes(b"hello").as_str(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn markup_document_hashes_canonical_fragment() {
        let html = "<body><div class='tuf-authenticate'>report</div></body>";
        let document = Document::new("r.html", MediaType::Markup, html.as_bytes().to_vec());
        let fingerprint = fingerprint_document(&document)
            .expect("pipeline")
            .expect("marked region");
        assert_eq!(
            fingerprint,
            digest_bytes(b"<div class=\"tuf-authenticate\">report</div>")
        );
    }

    #[test]
    fn binary_document_hashes_raw_bytes() {
        let bytes = b"%PDF-1.7 minimal".to_vec();
        let document = Document::new("doc.pdf", MediaType::Binary, bytes.clone());
        let fingerprint = fingerprint_document(&document)
            .expect("pipeline")
            .expect("binary always hashes");
        assert_eq!(fingerprint, digest_bytes(&bytes));
    }

    #[test]
    fn publication_paths_do_not_affect_fingerprint() {
        let before = "<div class=\"tuf-authenticate\">\
                      <a href=\"/_publication/2024-01/doc.html\">doc</a></div>";
        let after = "<div class=\"tuf-authenticate\">\
                     <a href=\"/_publication/2025-06-30/doc.html\">doc</a></div>";
        let fp = |html: &str| {
            fingerprint_document(&Document::new(
                "d.html",
                MediaType::Markup,
                html.as_bytes().to_vec(),
            ))
            .expect("pipeline")
            .expect("marked region")
        };
        assert_eq!(fp(before), fp(after));
    }

    #[test]
    fn content_changes_change_the_fingerprint() {
        let fp = |html: &str| {
            fingerprint_document(&Document::new(
                "d.html",
                MediaType::Markup,
                html.as_bytes().to_vec(),
            ))
            .expect("pipeline")
            .expect("marked region")
        };
        assert_ne!(
            fp("<div class=\"tuf-authenticate\">v1</div>"),
            fp("<div class=\"tuf-authenticate\">v2</div>")
        );
    }

    #[test]
    fn markup_formatting_outside_tokens_changes_nothing() {
        let single = "<div class='tuf-authenticate'><b>x</b></div>";
        let double = "<div class=\"tuf-authenticate\"><b>x</b></div>";
        let fp = |html: &str| {
            fingerprint_document(&Document::new(
                "d.html",
                MediaType::Markup,
                html.as_bytes().to_vec(),
            ))
            .expect("pipeline")
        };
        assert_eq!(fp(single), fp(double));
    }

    #[test]
    fn unmarked_markup_yields_no_fingerprint() {
        let document = Document::new(
            "plain.html",
            MediaType::Markup,
            b"<p>no seal here</p>".to_vec(),
        );
        assert_eq!(fingerprint_document(&document).expect("pipeline"), None);
    }

    #[test]
    fn invalid_utf8_markup_fails_the_document() {
        let document = Document::new("bad.html", MediaType::Markup, vec![0xc3, 0x28]);
        assert!(fingerprint_document(&document).is_err());
    }
}
