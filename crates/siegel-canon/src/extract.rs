// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-document fragment extraction.

use tracing::debug;

use siegel_core::error::{Result, SiegelError};
use siegel_core::types::{Document, MediaType};

use crate::markup;

/// CSS class that marks the authenticatable region of a markup document.
pub const MARKER_CLASS: &str = "tuf-authenticate";

/// The content of a document that feeds the fingerprint digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedFragment {
    /// Canonical serialization of the marked element.
    Markup(String),
    /// Raw bytes, hashed verbatim.
    Binary(Vec<u8>),
}

/// Derive the content to fingerprint from a document.
///
/// Markup documents yield the canonically serialized first element carrying
/// [`MARKER_CLASS`], or `None` when no element is marked; an unmarked
/// document has nothing to verify and is not a failure. Binary documents
/// always yield their full raw bytes.
pub fn extract_fragment(document: &Document) -> Result<Option<ExtractedFragment>> {
    match document.media_type {
        MediaType::Markup => {
            let text = std::str::from_utf8(&document.bytes)
                .map_err(|e| SiegelError::InvalidMarkup(format!("{}: {e}", document.name)))?;
            match markup::extract_marked_element(text, MARKER_CLASS) {
                Some(element) => Ok(Some(ExtractedFragment::Markup(element))),
                None => {
                    debug!(name = %document.name, "no marked region");
                    Ok(None)
                }
            }
        }
        MediaType::Binary => Ok(Some(ExtractedFragment::Binary(document.bytes.clone()))),
    }
}
