//! BMO decision ledger CLI.
//!
//! Anchors governance decisions, appends audit events to their hash chain,
//! and verifies stored chains. Each ledger file holds one decision and its
//! events as JSON.
//!
//! Usage:
//!   bmo-ledger hash --payload '{"option":"A","motif":"approved"}'
//!   bmo-ledger create --ledger arbitrage-42.json --decided-by "Direction BMO" --payload '{"option":"A"}'
//!   bmo-ledger append --ledger arbitrage-42.json --action commented --actor "A. DIALLO" --details ok
//!   bmo-ledger verify --ledger arbitrage-42.json
//!   bmo-ledger demo

mod ledger_file;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use bmo_audit::{ChainBuilder, InMemoryAuditStore, ShaDigester};
use bmo_config::LedgerConfig;
use bmo_contracts::{
    digest::DigestAlgorithm,
    document::LedgerDocument,
    error::{BmoError, BmoResult},
    event::EventFields,
    verify::IntegrityReport,
};
use bmo_core::{traits::ChainHasher, DecisionLedger};
use bmo_verify::{ForwardChainVerifier, SchemaValidator};

use crate::ledger_file::LedgerFile;

/// Exit status when a ledger fails its integrity check.
const EXIT_TAMPERED: i32 = 2;

// ── CLI definition ────────────────────────────────────────────────────────────

/// BMO — hash-chained audit trail for governance decisions.
#[derive(Parser)]
#[command(
    name = "bmo-ledger",
    about = "Anchor, extend and verify BMO decision audit chains",
    long_about = "Each decision is anchored by the digest of its payload; every later action\n\
                  on it is chained to its predecessor so edits, reordering and interior\n\
                  deletions are detectable."
)]
struct Cli {
    /// TOML configuration file (digest preference, payload depth limit).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the anchor hash of a JSON decision payload.
    Hash {
        #[arg(long)]
        payload: String,
    },
    /// Anchor a new decision and write it to a ledger file.
    Create {
        #[arg(long)]
        ledger: PathBuf,
        #[arg(long)]
        decided_by: String,
        #[arg(long)]
        payload: String,
    },
    /// Append one audit event to a ledger file.
    Append {
        #[arg(long)]
        ledger: PathBuf,
        #[arg(long)]
        action: String,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        details: Option<String>,
    },
    /// Verify a ledger file and print its integrity report.
    Verify {
        #[arg(long)]
        ledger: PathBuf,
    },
    /// Run the reference scenario: anchor, two events, verify, tamper, verify.
    Demo,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = LedgerConfig::load(cli.config.as_deref()).and_then(|config| match cli.command {
        Command::Hash { payload } => run_hash(&config, &payload),
        Command::Create { ledger, decided_by, payload } => {
            run_create(&config, &ledger, decided_by, &payload)
        }
        Command::Append { ledger, action, actor, details } => {
            let mut fields = EventFields::new(action, actor);
            fields.details = details;
            run_append(&config, &ledger, fields)
        }
        Command::Verify { ledger } => run_verify(&config, &ledger),
        Command::Demo => run_demo(&config),
    });

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(EXIT_TAMPERED),
        Err(e) => {
            eprintln!("bmo-ledger error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Wiring ────────────────────────────────────────────────────────────────────

/// Build the chain hasher for `algorithm`, or for the configured preference
/// when `algorithm` is `None`.
fn build_hasher(config: &LedgerConfig, algorithm: Option<DigestAlgorithm>) -> BmoResult<Arc<ChainBuilder>> {
    let digester = match algorithm {
        Some(a) => ShaDigester::new(a)?,
        None => ShaDigester::from_preference(config.hashing.algorithm)?,
    };
    Ok(Arc::new(
        ChainBuilder::new(Arc::new(digester)).with_max_depth(config.serializer.max_depth),
    ))
}

fn build_ledger(hasher: Arc<ChainBuilder>, store: InMemoryAuditStore) -> BmoResult<DecisionLedger> {
    Ok(DecisionLedger::new(
        hasher.clone(),
        Box::new(store),
        Box::new(ForwardChainVerifier::new(hasher)),
    )
    .with_validator(Box::new(SchemaValidator::new()?)))
}

/// Open an existing ledger file with the algorithm its decision was hashed
/// with, so files stay verifiable whatever the current preference is.
fn open_ledger(config: &LedgerConfig, file: &LedgerFile) -> BmoResult<(DecisionLedger, LedgerDocument)> {
    let document = file.read()?;
    let hasher = build_hasher(config, Some(document.decision.algorithm))?;
    let store = InMemoryAuditStore::from_document(document.clone())?;
    Ok((build_ledger(hasher, store)?, document))
}

fn parse_payload(raw: &str) -> BmoResult<Value> {
    serde_json::from_str(raw).map_err(|e| BmoError::InvalidInput {
        reason: format!("payload is not valid JSON: {e}"),
    })
}

fn print_report(report: &IntegrityReport) -> BmoResult<()> {
    let text = serde_json::to_string_pretty(report).map_err(|e| BmoError::Serialization {
        reason: format!("failed to encode integrity report: {e}"),
    })?;
    println!("{text}");
    Ok(())
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn run_hash(config: &LedgerConfig, raw_payload: &str) -> BmoResult<bool> {
    let hasher = build_hasher(config, None)?;
    let hash = hasher.hash_decision(&parse_payload(raw_payload)?)?;
    println!("{} {}", hasher.algorithm(), hash);
    Ok(true)
}

fn run_create(config: &LedgerConfig, path: &Path, decided_by: String, raw_payload: &str) -> BmoResult<bool> {
    let file = LedgerFile::new(path);
    if file.path().exists() {
        return Err(BmoError::StoreFailed {
            reason: format!("ledger '{}' already exists", path.display()),
        });
    }

    let hasher = build_hasher(config, None)?;
    let ledger = build_ledger(hasher, InMemoryAuditStore::new())?;
    let decision = ledger.record_decision(decided_by, parse_payload(raw_payload)?)?;

    file.create(&ledger.export(&decision.id)?)?;
    println!("decision {} anchored: {}", decision.id, decision.hash);
    Ok(true)
}

/// Append under the ledger's file lock. The commit re-checks the on-disk tail
/// so a writer that bypassed the lock cannot be overwritten.
fn run_append(config: &LedgerConfig, path: &Path, fields: EventFields) -> BmoResult<bool> {
    let file = LedgerFile::new(path);
    let lock = file.lock()?;

    let (ledger, document) = open_ledger(config, &file)?;
    let event = ledger.append_event(&document.decision.id, fields)?;

    file.commit(&lock, document.tail_hash(), &ledger.export(&document.decision.id)?)?;
    drop(lock);
    println!("event {} appended: {}", event.sequence, event.chain_hash);
    Ok(true)
}

fn run_verify(config: &LedgerConfig, path: &Path) -> BmoResult<bool> {
    let (ledger, document) = open_ledger(config, &LedgerFile::new(path))?;
    let report = ledger.verify_decision(&document.decision.id)?;
    print_report(&report)?;
    Ok(report.is_intact())
}

fn run_demo(config: &LedgerConfig) -> BmoResult<bool> {
    println!();
    println!("BMO — Bureau du Maître d'Ouvrage");
    println!("Decision audit chain demo");
    println!("================================");
    println!();

    let hasher = build_hasher(config, None)?;
    let store = InMemoryAuditStore::new();
    let ledger = build_ledger(hasher.clone(), store)?;

    let decision = ledger.record_decision(
        "Direction BMO",
        serde_json::json!({ "option": "A", "motif": "approved" }),
    )?;
    println!("[1] anchor ({})    {}", hasher.algorithm(), decision.hash);

    let event1 = ledger.append_event(
        &decision.id,
        EventFields::new("commented", "A. DIALLO").with_details("ok"),
    )?;
    println!("[2] commented        {}", event1.chain_hash);

    let event2 = ledger.append_event(&decision.id, EventFields::new("resolved", "M. KANE"))?;
    println!("[3] resolved         {}", event2.chain_hash);

    let report = ledger.verify_decision(&decision.id)?;
    println!("[4] verification     valid={} broken_at={:?}", report.chain.valid, report.chain.broken_at);

    // Rewrite the first event's actor without recomputing its link.
    let mut document = ledger.export(&decision.id)?;
    document.events[0].fields.actor_name = "X. FAKE".to_string();
    let tampered = build_ledger(hasher, InMemoryAuditStore::from_document(document)?)?;

    let tampered_report = tampered.verify_decision(&decision.id)?;
    println!(
        "[5] after tampering  valid={} broken_at={:?}",
        tampered_report.chain.valid, tampered_report.chain.broken_at
    );
    println!();

    Ok(report.is_intact() && tampered_report.chain.broken_at == Some(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bmo_config::HashingConfig;
    use bmo_contracts::digest::AlgorithmPreference;

    const PAYLOAD: &str = r#"{"option":"A","motif":"approved"}"#;

    fn sha256_config() -> LedgerConfig {
        LedgerConfig {
            hashing: HashingConfig { algorithm: AlgorithmPreference::Sha256 },
            ..LedgerConfig::default()
        }
    }

    fn create(config: &LedgerConfig, path: &Path) {
        assert!(run_create(config, path, "Direction BMO".to_string(), PAYLOAD).unwrap());
    }

    fn append(config: &LedgerConfig, path: &Path, action: &str, actor: &str) {
        assert!(run_append(config, path, EventFields::new(action, actor)).unwrap());
    }

    #[test]
    fn test_create_append_verify() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arbitrage-42.json");
        let config = LedgerConfig::default();

        create(&config, &path);
        assert!(run_append(&config, &path, EventFields::new("commented", "A. DIALLO").with_details("ok")).unwrap());
        append(&config, &path, "resolved", "M. KANE");

        let document = LedgerFile::new(&path).read().unwrap();
        assert_eq!(document.events.len(), 2);
        assert_eq!(document.events[0].fields.details.as_deref(), Some("ok"));
        assert_eq!(document.events[1].sequence, 1);
        assert!(run_verify(&config, &path).unwrap());
    }

    #[test]
    fn test_create_refuses_existing_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let config = LedgerConfig::default();

        create(&config, &path);
        let before = LedgerFile::new(&path).read().unwrap();

        let result = run_create(&config, &path, "Someone else".to_string(), r#"{"option":"B"}"#);
        assert!(matches!(result, Err(BmoError::StoreFailed { .. })));

        let after = LedgerFile::new(&path).read().unwrap();
        assert_eq!(after.decision.id, before.decision.id);
        assert_eq!(after.decision.hash, before.decision.hash);
    }

    #[test]
    fn test_ledger_file_create_does_not_clobber() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        create(&LedgerConfig::default(), &path);

        let file = LedgerFile::new(&path);
        let document = file.read().unwrap();
        let result = file.create(&document);
        assert!(matches!(result, Err(BmoError::StoreFailed { .. })));
    }

    #[test]
    fn test_verify_reports_tampered_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let config = LedgerConfig::default();

        create(&config, &path);
        append(&config, &path, "commented", "A. DIALLO");
        append(&config, &path, "resolved", "M. KANE");

        let mut raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        raw["events"][0]["actorName"] = Value::from("X. FAKE");
        std::fs::write(&path, serde_json::to_string_pretty(&raw).unwrap()).unwrap();

        assert!(!run_verify(&config, &path).unwrap());
    }

    #[test]
    fn test_verify_reports_edited_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let config = LedgerConfig::default();
        create(&config, &path);

        let mut raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        raw["decision"]["payload"]["option"] = Value::from("B");
        std::fs::write(&path, serde_json::to_string_pretty(&raw).unwrap()).unwrap();

        assert!(!run_verify(&config, &path).unwrap());
    }

    #[test]
    fn test_reopens_with_recorded_algorithm() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        create(&sha256_config(), &path);

        // The active preference no longer matches the file.
        let config = LedgerConfig::default();
        append(&config, &path, "commented", "A. DIALLO");
        assert!(run_verify(&config, &path).unwrap());

        let document = LedgerFile::new(&path).read().unwrap();
        assert_eq!(document.decision.algorithm, DigestAlgorithm::Sha256);
        let hasher = build_hasher(&config, Some(DigestAlgorithm::Sha256)).unwrap();
        assert_eq!(
            document.events[0].chain_hash,
            hasher.hash_chain(&document.decision.hash, &document.events[0].fields)
        );
    }

    #[test]
    fn test_concurrent_appends_keep_every_event() {
        const WRITERS: usize = 4;
        const APPENDS: usize = 5;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let config = LedgerConfig::default();
        create(&config, &path);

        std::thread::scope(|scope| {
            for writer in 0..WRITERS {
                let (config, path) = (&config, &path);
                scope.spawn(move || {
                    for i in 0..APPENDS {
                        let fields = EventFields::new("commented", format!("writer-{writer}")).with_details(i.to_string());
                        assert!(run_append(config, path, fields).unwrap());
                    }
                });
            }
        });

        let document = LedgerFile::new(&path).read().unwrap();
        assert_eq!(document.events.len(), WRITERS * APPENDS);
        for (i, event) in document.events.iter().enumerate() {
            assert_eq!(event.sequence, i as u64);
        }
        assert!(run_verify(&config, &path).unwrap());
    }

    #[test]
    fn test_stale_commit_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let config = LedgerConfig::default();
        create(&config, &path);

        // Two writers read the same tail; the second commits after the first.
        let file = LedgerFile::new(&path);
        let (first, stale) = open_ledger(&config, &file).unwrap();
        let (second, _) = open_ledger(&config, &file).unwrap();
        let id = stale.decision.id;

        first.append_event(&id, EventFields::new("commented", "A. DIALLO")).unwrap();
        second.append_event(&id, EventFields::new("resolved", "M. KANE")).unwrap();

        let lock = file.lock().unwrap();
        file.commit(&lock, stale.tail_hash(), &first.export(&id).unwrap()).unwrap();
        let result = file.commit(&lock, stale.tail_hash(), &second.export(&id).unwrap());
        drop(lock);

        match result {
            Err(BmoError::ChainConflict { expected, actual, .. }) => {
                assert_eq!(expected, stale.tail_hash());
                assert_ne!(actual, expected);
            }
            other => panic!("expected ChainConflict, got {other:?}"),
        }

        let document = file.read().unwrap();
        assert_eq!(document.events.len(), 1);
        assert_eq!(document.events[0].fields.actor_name, "A. DIALLO");
        assert!(run_verify(&config, &path).unwrap());
    }

    #[test]
    fn test_writes_leave_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let config = LedgerConfig::default();
        create(&config, &path);
        append(&config, &path, "commented", "A. DIALLO");

        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["ledger.json".to_string(), "ledger.json.lock".to_string()]);
    }

    #[test]
    fn test_parse_payload_rejects_bad_json() {
        assert!(matches!(parse_payload("{not json"), Err(BmoError::InvalidInput { .. })));
    }
}
