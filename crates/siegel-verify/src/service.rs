// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Verdict resolution over the record store.

use tracing::{debug, instrument};

use siegel_core::error::Result;
use siegel_core::types::{Fingerprint, Verdict};

use crate::store::HashStore;
use crate::wire::{CheckResponse, HashSubmission, VerdictFlags};

/// Resolves submitted fingerprints to verdicts against the record store.
pub struct VerificationService {
    store: HashStore,
}

impl VerificationService {
    pub fn new(store: HashStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &HashStore {
        &self.store
    }

    /// Verdict for one document name and submitted fingerprint.
    ///
    /// Position in the non-revoked history decides the outcome: the newest
    /// record is current, an older one is authentic but superseded.  A name
    /// with records but no match is not authentic; a name never recorded at
    /// all is unverified.
    pub fn resolve(&self, name: &str, submitted: &Fingerprint) -> Result<Verdict> {
        let active = self.store.active_fingerprints(name)?;
        if active.is_empty() {
            return Ok(if self.store.has_records(name)? {
                Verdict::NotAuthentic
            } else {
                Verdict::Unverified
            });
        }
        Ok(match active.iter().position(|f| f == submitted) {
            Some(0) => Verdict::AuthenticAndCurrent,
            Some(_) => Verdict::AuthenticNotCurrent,
            None => Verdict::NotAuthentic,
        })
    }

    /// Resolve a batch of submissions into a response body.
    ///
    /// Names the store has never seen are omitted; every other submission
    /// maps to its flag pair.
    #[instrument(skip_all, fields(batch = submissions.len()))]
    pub fn check_batch(&self, submissions: &[HashSubmission]) -> Result<CheckResponse> {
        let mut response = CheckResponse::new();
        for submission in submissions {
            let verdict = match Fingerprint::from_hex(&submission.file_hash) {
                Ok(fingerprint) => self.resolve(&submission.file_name, &fingerprint)?,
                // a malformed hash can never match a record
                Err(_) => {
                    if self.store.has_records(&submission.file_name)? {
                        Verdict::NotAuthentic
                    } else {
                        Verdict::Unverified
                    }
                }
            };
            if verdict == Verdict::Unverified {
                debug!(name = %submission.file_name, "no records; omitted from response");
                continue;
            }
            response.insert(
                submission.file_name.clone(),
                VerdictFlags {
                    authentic: verdict.is_authentic(),
                    current: verdict.is_current(),
                },
            );
        }
        Ok(response)
    }
}
