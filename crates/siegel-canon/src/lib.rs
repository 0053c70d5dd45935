// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Siegel — canonicalization and fingerprinting: locate the authenticatable
// region of a document, normalize it into a deterministic byte form, and
// digest it into a fingerprint.

pub mod canonical;
pub mod digest;
pub mod extract;
pub mod markup;

pub use canonical::scrub_volatile_paths;
pub use digest::{digest_bytes, fingerprint_document};
pub use extract::{ExtractedFragment, MARKER_CLASS, extract_fragment};
