// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wire types for the hash check endpoint.
//
// The request is a JSON array of `{fileName, fileHash}` submissions; the
// response maps each known document name to its flag pair.  Names absent
// from the response are unknown to the service.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One document's name and fingerprint as submitted for checking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashSubmission {
    pub file_name: String,
    pub file_hash: String,
}

/// Flag pair returned per document. Extra fields in a response entry are
/// ignored on deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictFlags {
    pub authentic: bool,
    pub current: bool,
}

/// Response body: document name to flag pair.
pub type CheckResponse = HashMap<String, VerdictFlags>;

/// Request body accepted by the check endpoint. Clients send a batch array;
/// a single bare submission is accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CheckRequest {
    Batch(Vec<HashSubmission>),
    Single(HashSubmission),
}

impl CheckRequest {
    pub fn into_submissions(self) -> Vec<HashSubmission> {
        match self {
            Self::Batch(batch) => batch,
            Self::Single(single) => vec![single],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submissions_serialize_with_wire_field_names() {
        let submission = HashSubmission {
            file_name: "page.html".into(),
            file_hash: "ab".repeat(32),
        };
        let json = serde_json::to_value([submission]).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!([{ "fileName": "page.html", "fileHash": "ab".repeat(32) }])
        );
    }

    #[test]
    fn response_tolerates_extra_fields() {
        let body = r#"{"a.html": {"authentic": true, "current": false, "recordedAt": "2024-01-01"}}"#;
        let response: CheckResponse = serde_json::from_str(body).expect("parse");
        assert_eq!(
            response["a.html"],
            VerdictFlags {
                authentic: true,
                current: false
            }
        );
    }

    #[test]
    fn batch_body_is_accepted() {
        let body = r#"[{"fileName": "a", "fileHash": "00"}, {"fileName": "b", "fileHash": "11"}]"#;
        let request: CheckRequest = serde_json::from_str(body).expect("parse");
        assert_eq!(request.into_submissions().len(), 2);
    }

    #[test]
    fn single_submission_body_is_accepted() {
        let body = r#"{"fileName": "a.html", "fileHash": "00"}"#;
        let request: CheckRequest = serde_json::from_str(body).expect("parse");
        assert_eq!(
            request.into_submissions(),
            vec![HashSubmission {
                file_name: "a.html".into(),
                file_hash: "00".into()
            }]
        );
    }
}
