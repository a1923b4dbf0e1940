//! Directory-driven sync.
//!
//! Input layout mirrors the gateway's key space:
//! ```text
//! <input>/routes/{id}.json
//! <input>/upstreams/{id}.json
//! <input>/services/{id}.json
//! ```
//! Every document is parsed, resolved against the discoverer when its
//! upstream names a service, and written to the same relative path under
//! the output directory.

use anyhow::Context;
use seed_core::config::SyncConfig;
use seed_core::{Discoverer, Entity, EntityKind, Nodes, SeedError};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of a directory sync.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Documents whose nodes were resolved and injected.
    pub synced: usize,
    /// Documents written unchanged in meaning (no discovery, or pinned nodes).
    pub skipped: usize,
    pub failed: usize,
}

/// What happened to a single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Synced,
    Skipped,
}

/// Run one document through parse → discover → inject → marshal.
pub fn sync_document(
    raw: &[u8],
    kind: EntityKind,
    discoverer: &dyn Discoverer,
    policy: &SyncConfig,
) -> Result<(Vec<u8>, Outcome), SeedError> {
    let mut entity = Entity::parse(raw, kind)?;
    let id = entity.id().unwrap_or_default().to_owned();

    let outcome = if !entity.upstream().wants_discovery() {
        Outcome::Skipped
    } else if policy.respect_pinned_nodes && entity.has_nodes_attr() {
        debug!(%kind, %id, "nodes pinned in source, discovery skipped");
        Outcome::Skipped
    } else {
        let nodes = discoverer.discover(entity.upstream())?;
        entity.inject(Nodes::Resolved(nodes));
        Outcome::Synced
    };

    Ok((entity.marshal()?, outcome))
}

/// Sync every `*.json` file under `input` into `output`.
pub fn sync_dir(
    input: &Path,
    output: &Path,
    discoverer: &dyn Discoverer,
    policy: &SyncConfig,
) -> anyhow::Result<SyncReport> {
    let mut files = Vec::new();
    collect_json(input, &mut files)
        .with_context(|| format!("failed to scan {}", input.display()))?;
    files.sort();

    let mut report = SyncReport::default();
    for path in files {
        let rel = path.strip_prefix(input).unwrap_or(&path).to_path_buf();
        let key = rel.to_string_lossy().replace('\\', "/");
        let kind = EntityKind::from_key(&key);

        let result = std::fs::read(&path)
            .map_err(SeedError::from)
            .and_then(|raw| sync_document(&raw, kind, discoverer, policy))
            .and_then(|(bytes, outcome)| {
                write_atomic(&output.join(&rel), &bytes)?;
                Ok(outcome)
            });

        match result {
            Ok(outcome) => {
                match outcome {
                    Outcome::Synced => report.synced += 1,
                    Outcome::Skipped => report.skipped += 1,
                }
                debug!(key = %key, %kind, ?outcome, "document written");
            }
            Err(e) => {
                report.failed += 1;
                warn!(
                    key = %key,
                    %kind,
                    error_kind = e.kind(),
                    entity_id = e.entity_id().unwrap_or_default(),
                    error = %e,
                    "document sync failed"
                );
                if policy.fail_fast {
                    return Err(e).with_context(|| format!("sync aborted at {key}"));
                }
            }
        }
    }

    info!(
        synced = report.synced,
        skipped = report.skipped,
        failed = report.failed,
        "sync finished"
    );
    Ok(report)
}

fn collect_json(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        // Symlinked directories are not followed.
        if entry.file_type()?.is_dir() {
            collect_json(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            out.push(path);
        }
    }
    Ok(())
}

/// Write to a `.tmp` sibling, then rename over the final path, so a crash
/// mid-write never leaves a truncated document behind.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        if let Err(cleanup) = std::fs::remove_file(&tmp) {
            warn!(error = %cleanup, path = %tmp.display(), "failed to remove tmp file");
        }
        return Err(e);
    }
    Ok(())
}
