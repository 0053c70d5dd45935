// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use serde::{Deserialize, Serialize};

/// Default base URL clients use to reach the verification service.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";
/// Default timeout for a batch check call, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default TCP port for the check service.
pub const DEFAULT_PORT: u16 = 8000;
/// Default path of the hash record database.
pub const DEFAULT_DB_PATH: &str = "siegel.db";

/// Persistent application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the verification service.
    pub endpoint: String,
    /// Timeout for a batch check call, in seconds.
    pub request_timeout_secs: u64,
    /// Port for the check server (0 = OS-assigned).
    pub server_port: u16,
    /// Path to the hash record database.
    pub database_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            server_port: DEFAULT_PORT,
            database_path: DEFAULT_DB_PATH.into(),
        }
    }
}
