// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Siegel.

use thiserror::Error;

/// Top-level error type for all Siegel operations.
#[derive(Debug, Error)]
pub enum SiegelError {
    // -- Fingerprinting errors --
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("invalid markup: {0}")]
    InvalidMarkup(String),

    #[error("invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    // -- Verification errors --
    #[error("verification service unavailable: {0}")]
    VerificationUnavailable(String),

    #[error("malformed verification response: {0}")]
    MalformedResponse(String),

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("check server error: {0}")]
    Server(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SiegelError>;
