// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Siegel — Content Integrity Verification
//
// Command line entry point. Fingerprints documents, checks batches against a
// running record service, and maintains a local record store used by the
// bundled check server.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use siegel_canon::{MARKER_CLASS, fingerprint_document};
use siegel_core::config::{AppConfig, DEFAULT_DB_PATH, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS};
use siegel_core::error::{Result, SiegelError};
use siegel_core::types::{Document, Fingerprint, MediaType, Verdict};
use siegel_verify::{CheckServer, HashStore, VerificationClient, VerificationService};

#[derive(Parser, Debug)]
#[command(name = "siegel", version, about = "Siegel content integrity toolkit")]
struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the canonical fingerprint of a document.
    Fingerprint {
        file: PathBuf,
    },
    /// Fingerprint documents and verify them against a record service.
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, default_value = DEFAULT_ENDPOINT, help = "Base URL of the record service")]
        endpoint: String,
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, value_name = "SECS", help = "Request timeout in seconds")]
        timeout: u64,
    },
    /// Run the check service over a local record store.
    Serve {
        #[arg(long, help = "Listen port (0 = OS-assigned)")]
        port: Option<u16>,
        #[arg(long, default_value = DEFAULT_DB_PATH, value_name = "PATH")]
        db: PathBuf,
    },
    /// Record a fingerprint as the new current version of a document.
    Record {
        name: String,
        #[arg(long, value_name = "PATH", conflicts_with = "hash", required_unless_present = "hash")]
        file: Option<PathBuf>,
        #[arg(long, value_name = "HEX")]
        hash: Option<String>,
        #[arg(long, default_value = DEFAULT_DB_PATH, value_name = "PATH")]
        db: PathBuf,
    },
    /// Revoke recorded fingerprints for a document.
    Revoke {
        name: String,
        #[arg(long, value_name = "HEX", help = "Revoke only this fingerprint")]
        hash: Option<String>,
        #[arg(long, default_value = DEFAULT_DB_PATH, value_name = "PATH")]
        db: PathBuf,
    },
    /// Show the record history for a document, newest first.
    History {
        name: String,
        #[arg(long, default_value = DEFAULT_DB_PATH, value_name = "PATH")]
        db: PathBuf,
    },
}

/// One line of `check` output.
#[derive(Serialize)]
struct CheckReport<'a> {
    name: &'a str,
    verdict: Option<Verdict>,
    authentic: bool,
    current: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Fingerprint { file } => fingerprint_command(&file, cli.json),
        Commands::Check {
            files,
            endpoint,
            timeout,
        } => check_command(&files, endpoint, timeout, cli.json).await,
        Commands::Serve { port, db } => serve_command(port, &db).await,
        Commands::Record {
            name,
            file,
            hash,
            db,
        } => record_command(&name, file, hash, &db, cli.json),
        Commands::Revoke { name, hash, db } => revoke_command(&name, hash.as_deref(), &db, cli.json),
        Commands::History { name, db } => history_command(&name, &db, cli.json),
    }
}

/// Document name for a path: the file name, matching the names the record
/// service keys on.
fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read a document from disk, inferring its media type from the extension.
fn load_document(path: &Path) -> Result<Document> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let media_type = MediaType::from_extension(ext).ok_or_else(|| {
        SiegelError::UnsupportedMediaType(format!(
            "{}: expected .html, .htm, or .pdf",
            path.display()
        ))
    })?;
    let bytes = std::fs::read(path)?;
    Ok(Document::new(document_name(path), media_type, bytes))
}

fn fingerprint_command(file: &Path, json: bool) -> Result<ExitCode> {
    let document = load_document(file)?;
    match fingerprint_document(&document)? {
        Some(fingerprint) => {
            if json {
                let out = json!({ "name": document.name, "fingerprint": fingerprint });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{fingerprint}");
            }
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!(
                "{}: no region marked with class \"{MARKER_CLASS}\"",
                document.name
            );
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn check_command(
    files: &[PathBuf],
    endpoint: String,
    timeout: u64,
    json: bool,
) -> Result<ExitCode> {
    // a file that cannot be read is reported and skipped; the rest of the
    // batch still goes out
    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        match load_document(path) {
            Ok(document) => documents.push(document),
            Err(e) => tracing::warn!(name = %document_name(path), error = %e, "file skipped"),
        }
    }

    let config = AppConfig {
        endpoint,
        request_timeout_secs: timeout,
        ..AppConfig::default()
    };
    let client = VerificationClient::from_config(&config)?;
    let verdicts = client.verify(&documents).await?;
    tracing::info!(
        documents = documents.len(),
        verdicts = verdicts.len(),
        "batch check complete"
    );

    let reports: Vec<CheckReport<'_>> = documents
        .iter()
        .map(|document| {
            let verdict = verdicts.get(&document.name).copied();
            CheckReport {
                name: &document.name,
                verdict,
                authentic: verdict.is_some_and(|v| v.is_authentic()),
                current: verdict.is_some_and(|v| v.is_current()),
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            match report.verdict {
                Some(verdict) => println!("{}: {}", report.name, verdict.label()),
                None => println!("{}: skipped (nothing to verify)", report.name),
            }
        }
    }

    let failed = reports
        .iter()
        .any(|report| report.verdict == Some(Verdict::NotAuthentic));
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn serve_command(port: Option<u16>, db: &Path) -> Result<ExitCode> {
    let store = HashStore::open(db)?;
    let service = Arc::new(Mutex::new(VerificationService::new(store)));
    let mut server = CheckServer::new(port);
    server.start(service).await?;
    tracing::info!(port = server.port(), db = %db.display(), "check service running");
    println!(
        "check service listening on 0.0.0.0:{} (records in {})",
        server.port(),
        db.display()
    );
    tokio::signal::ctrl_c().await?;
    server.stop().await?;
    Ok(ExitCode::SUCCESS)
}

fn record_command(
    name: &str,
    file: Option<PathBuf>,
    hash: Option<String>,
    db: &Path,
    json: bool,
) -> Result<ExitCode> {
    let fingerprint = match (file, hash) {
        (Some(path), None) => {
            let document = load_document(&path)?;
            match fingerprint_document(&document)? {
                Some(fingerprint) => fingerprint,
                None => {
                    eprintln!(
                        "{}: no region marked with class \"{MARKER_CLASS}\"",
                        document.name
                    );
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        (None, Some(hex)) => Fingerprint::from_hex(&hex)?,
        // clap enforces exactly one of --file and --hash
        _ => {
            return Err(SiegelError::InvalidFingerprint(
                "one of --file or --hash is required".into(),
            ));
        }
    };

    let store = HashStore::open(db)?;
    store.record(name, &fingerprint)?;
    if json {
        let out = json!({ "name": name, "fingerprint": fingerprint });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("recorded {name} {fingerprint}");
    }
    Ok(ExitCode::SUCCESS)
}

fn revoke_command(name: &str, hash: Option<&str>, db: &Path, json: bool) -> Result<ExitCode> {
    let fingerprint = hash.map(Fingerprint::from_hex).transpose()?;
    let store = HashStore::open(db)?;
    let revoked = store.revoke(name, fingerprint.as_ref())?;
    if json {
        let out = json!({ "name": name, "revoked": revoked });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("revoked {revoked} record(s) for {name}");
    }
    Ok(ExitCode::SUCCESS)
}

fn history_command(name: &str, db: &Path, json: bool) -> Result<ExitCode> {
    let store = HashStore::open(db)?;
    let records = store.history(name)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(ExitCode::SUCCESS);
    }
    if records.is_empty() {
        println!("no records for {name}");
        return Ok(ExitCode::SUCCESS);
    }
    // newest first; the first non-revoked record is the current fingerprint
    let current_id = records.iter().find(|r| !r.revoked).map(|r| r.id);
    for record in &records {
        let status = if record.revoked {
            "revoked"
        } else if Some(record.id) == current_id {
            "current"
        } else {
            "superseded"
        };
        println!(
            "{}  {}  {}",
            record.recorded_at.to_rfc3339(),
            record.fingerprint,
            status
        );
    }
    Ok(ExitCode::SUCCESS)
}
