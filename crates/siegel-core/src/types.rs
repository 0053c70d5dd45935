// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Siegel verification toolkit.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SiegelError};

/// Request path of the batch check endpoint, shared by client and server.
pub const CHECK_HASHES_PATH: &str = "/_api/check-hashes";

/// Supported input document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    /// HTML pages, fingerprinted over the canonicalized marked region.
    Markup,
    /// PDF and other byte-stable formats, fingerprinted verbatim.
    Binary,
}

impl MediaType {
    /// MIME type string for this media type.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Markup => "text/html",
            Self::Binary => "application/pdf",
        }
    }

    /// Parse a declared MIME type string.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "text/html" => Some(Self::Markup),
            "application/pdf" => Some(Self::Binary),
            _ => None,
        }
    }

    /// Infer media type from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "html" | "htm" => Some(Self::Markup),
            "pdf" => Some(Self::Binary),
            _ => None,
        }
    }
}

/// A document submitted for verification.
///
/// `name` identifies the document within a batch; the bytes are the raw
/// document content, immutable once read.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub media_type: MediaType,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(name: impl Into<String>, media_type: MediaType, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type,
            bytes,
        }
    }
}

/// SHA-256 digest of canonicalized document bytes, hex-encoded.
///
/// Always exactly 64 lowercase hexadecimal characters. Constructing one from
/// an untrusted string goes through [`Fingerprint::from_hex`], so a malformed
/// hash can never enter a request or the record store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Length in characters of a hex-encoded SHA-256 digest.
    pub const HEX_LEN: usize = 64;

    /// Validate and wrap a hex digest string.
    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() != Self::HEX_LEN {
            return Err(SiegelError::InvalidFingerprint(format!(
                "expected {} hex characters, got {}",
                Self::HEX_LEN,
                s.len()
            )));
        }
        if !s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
            return Err(SiegelError::InvalidFingerprint(format!(
                "not lowercase hex: {s}"
            )));
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<[u8; 32]> for Fingerprint {
    fn from(digest: [u8; 32]) -> Self {
        Self(hex::encode(digest))
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of checking one document's fingerprint against the record store.
///
/// The two wire booleans collapse into this closed enum, which has no
/// representation for "current but not authentic".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// The service holds no records for this document.
    Unverified,
    /// The fingerprint matches no recorded value.
    NotAuthentic,
    /// The fingerprint matches a superseded recorded value.
    AuthenticNotCurrent,
    /// The fingerprint matches the latest recorded value.
    AuthenticAndCurrent,
}

impl Verdict {
    /// Whether the fingerprint matched some recorded value.
    pub fn is_authentic(&self) -> bool {
        matches!(self, Self::AuthenticNotCurrent | Self::AuthenticAndCurrent)
    }

    /// Whether the fingerprint matched the latest recorded value.
    pub fn is_current(&self) -> bool {
        matches!(self, Self::AuthenticAndCurrent)
    }

    /// Build a verdict from the wire flag pair.
    ///
    /// The pair `authentic: false, current: true` has no enum representation
    /// and yields `None`.
    pub fn from_flags(authentic: bool, current: bool) -> Option<Self> {
        match (authentic, current) {
            (false, false) => Some(Self::NotAuthentic),
            (true, false) => Some(Self::AuthenticNotCurrent),
            (true, true) => Some(Self::AuthenticAndCurrent),
            (false, true) => None,
        }
    }

    /// Short human-readable label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unverified => "unverified",
            Self::NotAuthentic => "NOT AUTHENTIC",
            Self::AuthenticNotCurrent => "authentic (outdated)",
            Self::AuthenticAndCurrent => "authentic (current)",
        }
    }
}

/// Lifecycle state of the check service listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerStatus {
    Stopped,
    Starting,
    Running,
    Error,
}
