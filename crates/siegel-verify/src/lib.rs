// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Siegel Verify — batch verification client, persistent fingerprint record
// store, and the reference check service.  This crate bridges between the
// canonical fingerprints produced by `siegel-canon` and the wire contract
// both sides of the check exchange speak.

pub mod client;
pub mod http;
pub mod service;
pub mod store;
pub mod wire;

pub use client::VerificationClient;
pub use http::CheckServer;
pub use service::VerificationService;
pub use store::{HashRecord, HashStore};
