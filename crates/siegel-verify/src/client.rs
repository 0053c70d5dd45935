// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch verification client.
//
// Fingerprints a set of local documents and checks them against a remote
// record service in a single POST.  Transport failures and non-success
// statuses surface as `VerificationUnavailable`; a reply that cannot be
// interpreted surfaces as `MalformedResponse`.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tracing::{debug, instrument, warn};

use siegel_canon::fingerprint_document;
use siegel_core::config::AppConfig;
use siegel_core::error::{Result, SiegelError};
use siegel_core::types::{CHECK_HASHES_PATH, Document, Verdict};

use crate::wire::{CheckResponse, HashSubmission};

/// HTTP client for the check-hashes endpoint of a record service.
pub struct VerificationClient {
    http: reqwest::Client,
    base_url: String,
}

impl VerificationClient {
    /// Build a client for the service at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SiegelError::VerificationUnavailable(format!("client setup: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.endpoint.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Fingerprint `documents` and check them in one batch.
    ///
    /// Duplicate names after the first are skipped, as are documents that
    /// produce no fingerprint (no marked region, unreadable markup); skipped
    /// documents are absent from the returned map.
    #[instrument(skip_all, fields(documents = documents.len()))]
    pub async fn verify(&self, documents: &[Document]) -> Result<HashMap<String, Verdict>> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut submissions = Vec::with_capacity(documents.len());
        for document in documents {
            if !seen.insert(document.name.as_str()) {
                warn!(name = %document.name, "duplicate document name; skipped");
                continue;
            }
            match fingerprint_document(document) {
                Ok(Some(fingerprint)) => submissions.push(HashSubmission {
                    file_name: document.name.clone(),
                    file_hash: fingerprint.to_string(),
                }),
                Ok(None) => debug!(name = %document.name, "nothing to verify; skipped"),
                Err(e) => {
                    warn!(name = %document.name, error = %e, "fingerprinting failed; skipped");
                }
            }
        }
        self.check_hashes(&submissions).await
    }

    /// Check already-computed submissions against the service.
    ///
    /// Every submitted name gets a verdict: names the service does not know
    /// come back as [`Verdict::Unverified`].  An empty batch resolves to an
    /// empty map without touching the network.
    pub async fn check_hashes(
        &self,
        submissions: &[HashSubmission],
    ) -> Result<HashMap<String, Verdict>> {
        if submissions.is_empty() {
            return Ok(HashMap::new());
        }
        let response = self.submit(submissions).await?;

        let mut verdicts = HashMap::with_capacity(submissions.len());
        for submission in submissions {
            let verdict = match response.get(&submission.file_name) {
                None => Verdict::Unverified,
                Some(flags) => {
                    Verdict::from_flags(flags.authentic, flags.current).ok_or_else(|| {
                        SiegelError::MalformedResponse(format!(
                            "{}: current flag set without authentic",
                            submission.file_name
                        ))
                    })?
                }
            };
            verdicts.insert(submission.file_name.clone(), verdict);
        }
        Ok(verdicts)
    }

    /// One POST to the check endpoint.
    async fn submit(&self, submissions: &[HashSubmission]) -> Result<CheckResponse> {
        let url = format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            CHECK_HASHES_PATH
        );
        debug!(url = %url, count = submissions.len(), "submitting hash batch");

        let response = self
            .http
            .post(&url)
            .json(&submissions)
            .send()
            .await
            .map_err(|e| SiegelError::VerificationUnavailable(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SiegelError::VerificationUnavailable(format!(
                "{url} returned HTTP {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SiegelError::VerificationUnavailable(format!("{url}: {e}")))?;
        serde_json::from_str(&body)
            .map_err(|e| SiegelError::MalformedResponse(format!("check response: {e}")))
    }
}
