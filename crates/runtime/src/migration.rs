//! Batch migration with per-character progress events.
//!
//! Every character moves `pending → migrating → completed | error`. A
//! character that fails never stops the rest of the batch.

use serde::{Deserialize, Serialize};
use sheet_core::migration::{is_outdated, migrate_with_report, upgrade};
use sheet_core::{Character, MigrationConfig, MigrationReport};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::api::{Result, RuntimeError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum MigrationStatus {
    Pending,
    Migrating,
    Completed,
    Error(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationProgress {
    pub character_id: String,
    pub status: MigrationStatus,
}

/// Result for one character of a batch.
///
/// A report with failed fields is still returned: the fields that did map
/// are kept, and the status for that character is `error`.
#[derive(Debug)]
pub struct BatchOutcome {
    pub character_id: String,
    pub result: Result<MigrationReport>,
    /// The input document, kept only when the migration task itself failed.
    pub original: Option<Character>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.result.as_ref().is_ok_and(MigrationReport::is_clean)
    }

    /// The migrated character, when the migration ran at all.
    pub fn character(&self) -> Option<&Character> {
        self.result.as_ref().ok().map(|report| &report.character)
    }

    /// The document to persist: the migrated character, or the untouched
    /// input when the task failed.
    pub fn document(&self) -> Option<&Character> {
        self.character().or(self.original.as_ref())
    }
}

/// Next progress event, skipping over events dropped while the receiver lagged.
///
/// Returns `None` once the batch is dropped.
pub async fn next_progress(
    progress: &mut broadcast::Receiver<MigrationProgress>,
) -> Option<MigrationProgress> {
    loop {
        match progress.recv().await {
            Ok(event) => return Some(event),
            Err(RecvError::Lagged(skipped)) => {
                warn!("Dropped {} stale progress events", skipped);
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

pub struct MigrationBatch {
    progress: broadcast::Sender<MigrationProgress>,
}

impl MigrationBatch {
    pub fn new(config: &MigrationConfig) -> Self {
        let (progress, _) = broadcast::channel(config.progress_capacity.max(1));
        Self { progress }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MigrationProgress> {
        self.progress.subscribe()
    }

    fn emit(&self, character_id: &str, status: MigrationStatus) {
        // No subscribers is fine; progress is best-effort.
        let _ = self.progress.send(MigrationProgress {
            character_id: character_id.to_string(),
            status,
        });
    }

    /// Migrate and upgrade every character, in order.
    pub async fn run(&self, characters: Vec<Character>) -> Vec<BatchOutcome> {
        info!(characters = characters.len(), "starting migration batch");
        for character in &characters {
            self.emit(&character.id, MigrationStatus::Pending);
        }

        let mut outcomes = Vec::with_capacity(characters.len());
        for character in characters {
            let character_id = character.id.clone();
            self.emit(&character_id, MigrationStatus::Migrating);

            let input = character.clone();
            let result = tokio::task::spawn_blocking(move || migrate_one(character))
                .await
                .map_err(|source| RuntimeError::MigrationTask {
                    character_id: character_id.clone(),
                    source,
                });

            let status = match &result {
                Ok(report) if report.is_clean() => {
                    debug!(%character_id, migrated = report.migrated.len(), "character migrated");
                    MigrationStatus::Completed
                }
                Ok(report) => {
                    let err = RuntimeError::IncompleteMigration {
                        character_id: character_id.clone(),
                        count: report.failed.len(),
                    };
                    for failure in &report.failed {
                        warn!(%character_id, error = %failure, "legacy field not migrated");
                    }
                    MigrationStatus::Error(err.to_string())
                }
                Err(err) => {
                    warn!(%character_id, error = %err, "character migration failed");
                    MigrationStatus::Error(err.to_string())
                }
            };
            self.emit(&character_id, status);
            let original = result.is_err().then_some(input);
            outcomes.push(BatchOutcome {
                character_id,
                result,
                original,
            });
        }

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        info!(
            total = outcomes.len(),
            failed, "migration batch finished"
        );
        outcomes
    }
}

fn migrate_one(character: Character) -> MigrationReport {
    let mut report = migrate_with_report(&character);
    if is_outdated(&report.character) {
        report.character = upgrade(report.character);
    }
    report
}
