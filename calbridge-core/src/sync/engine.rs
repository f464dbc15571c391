//! One reconciliation pass between the two calendars.
//!
//! A pass runs four stages strictly in order:
//!
//! 1. copy untracked native Google events to iCloud
//! 2. copy untracked native iCloud events to Google
//! 3. remove from iCloud what was deleted on Google
//! 4. remove from Google what was deleted on iCloud
//!
//! A failure on a single event is recorded on its entry and the pass goes on.
//! A calendar that cannot be listed aborts the rest of the pass.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::date_range::DateRange;
use crate::error::{SyncError, SyncResult};
use crate::event::NewEvent;
use crate::notify::Notifier;
use crate::source::{DeleteOutcome, EventSource};
use crate::state::{SyncState, SyncStateStore, SyncedEntry};
use crate::sync::plan::{PropagationAction, Snapshot, plan_deletions, plan_propagation};
use crate::sync::summary::{SyncReport, SyncSummary};

pub const NOTIFICATION_TITLE: &str = "Calendar Sync";
pub const ERROR_NOTIFICATION_TITLE: &str = "Calendar Sync Error";

/// New snapshot computed by [`SyncEngine::reconcile`].
#[derive(Debug)]
pub struct Reconciliation {
    pub state: SyncState,
    pub summary: SyncSummary,
    /// Why the pass stopped early, if it did. Work done before that point is
    /// already reflected in `state`.
    pub failure: Option<SyncError>,
}

/// Working copy of one pass.
struct Pass {
    state: SyncState,
    summary: SyncSummary,
    now: DateTime<Utc>,
}

pub struct SyncEngine<'a> {
    google: &'a dyn EventSource,
    icloud: &'a dyn EventSource,
    store: SyncStateStore,
    notifier: &'a dyn Notifier,
}

impl<'a> SyncEngine<'a> {
    pub fn new(
        google: &'a dyn EventSource,
        icloud: &'a dyn EventSource,
        store: SyncStateStore,
        notifier: &'a dyn Notifier,
    ) -> Self {
        SyncEngine {
            google,
            icloud,
            store,
            notifier,
        }
    }

    pub fn store(&self) -> &SyncStateStore {
        &self.store
    }

    /// Run one full pass: load state, reconcile, save, notify.
    ///
    /// Calendar outages are reported in the returned [`SyncReport`]; only a
    /// state file that cannot be read or written is an `Err`.
    pub async fn sync(&self, now: DateTime<Utc>) -> SyncResult<SyncReport> {
        let previous = self.store.load()?;
        info!(entries = previous.entries.len(), "Starting sync");

        let Reconciliation {
            mut state,
            summary,
            failure,
        } = self.reconcile(&previous, now).await;

        state.version = previous.version + 1;
        let failure = failure.map(|e| format!("Sync failed: {e}"));
        match &failure {
            None => {
                state.last_sync = Some(now);
                state.last_error = None;
            }
            Some(message) => state.last_error = Some(message.clone()),
        }

        self.store.save(&state)?;

        match &failure {
            None => {
                info!(
                    added = summary.added(),
                    deleted = summary.deleted(),
                    errors = summary.errors(),
                    "{}",
                    summary.headline()
                );
                if let Some(body) = summary.message() {
                    self.notifier.notify(NOTIFICATION_TITLE, &body).await;
                }
            }
            Some(message) => {
                error!(
                    added = summary.added(),
                    deleted = summary.deleted(),
                    errors = summary.errors(),
                    "{message}"
                );
                if previous.last_error.as_deref() == Some(message.as_str()) {
                    debug!("Same error as the previous pass, not notifying");
                } else {
                    self.notifier.notify(ERROR_NOTIFICATION_TITLE, message).await;
                }
            }
        }

        Ok(SyncReport {
            summary,
            failure,
            state,
        })
    }

    /// Apply the four stages against both calendars and return the snapshot
    /// that should replace `previous`. `previous` itself is left untouched.
    pub async fn reconcile(&self, previous: &SyncState, now: DateTime<Utc>) -> Reconciliation {
        let mut pass = Pass {
            state: previous.clone(),
            summary: SyncSummary::default(),
            now,
        };

        let failure = self.run_stages(&mut pass).await.err();

        Reconciliation {
            state: pass.state,
            summary: pass.summary,
            failure,
        }
    }

    async fn run_stages(&self, pass: &mut Pass) -> SyncResult<()> {
        let window = DateRange::active(pass.now);

        let google = Snapshot::fetch(self.google, &window).await?;
        let icloud = Snapshot::fetch(self.icloud, &window).await?;

        self.propagate(&google, &icloud, self.icloud, pass).await;
        self.propagate(&icloud, &google, self.google, pass).await;

        self.delete_missing(&google, self.icloud, &window, pass).await?;
        self.delete_missing(&icloud, self.google, &window, pass).await?;

        Ok(())
    }

    /// Copy untracked native records of `source` into `target`.
    async fn propagate(
        &self,
        source: &Snapshot,
        existing: &Snapshot,
        target: &dyn EventSource,
        pass: &mut Pass,
    ) {
        let from = source.side();
        let to = target.side();
        let plan = plan_propagation(source, existing, &pass.state);

        for item in plan {
            let record = item.record;

            match item.action {
                PropagationAction::AlreadyExists => {
                    info!(key = %item.key, title = %record.title, "Already exists in {to}");
                    pass.state.entries.insert(
                        item.key,
                        SyncedEntry::synced(&record.title, from, record.start.clone(), pass.now),
                    );
                }
                PropagationAction::Create => {
                    let event = NewEvent::from_record(record, &item.key);

                    match target.create(&event).await {
                        Ok(id) => {
                            info!(key = %item.key, id = %id, title = %record.title, "Copied {from} → {to}");
                            pass.summary
                                .direction_mut(from)
                                .record_added(&record.title, &record.start);
                            pass.state.entries.insert(
                                item.key,
                                SyncedEntry::synced(&record.title, from, record.start.clone(), pass.now),
                            );
                        }
                        Err(e) => {
                            warn!(key = %item.key, title = %record.title, error = %e, "Failed to copy {from} → {to}");
                            pass.summary.direction_mut(from).errors += 1;
                            pass.state.entries.insert(
                                item.key,
                                SyncedEntry::failed(
                                    &record.title,
                                    from,
                                    record.start.clone(),
                                    pass.now,
                                    e.to_string(),
                                ),
                            );
                        }
                    }
                }
            }
        }
    }

    /// Remove from `target` the events that originated on `source` and are
    /// gone from it.
    async fn delete_missing(
        &self,
        source: &Snapshot,
        target: &dyn EventSource,
        window: &DateRange,
        pass: &mut Pass,
    ) -> SyncResult<()> {
        let from = source.side();
        let to = target.side();

        let doomed = plan_deletions(source, &pass.state, window);
        if doomed.is_empty() {
            return Ok(());
        }

        // The copy may start outside the scan window by now
        let search = Snapshot::fetch(target, &DateRange::search(pass.now)).await?;

        for key in doomed {
            let Some(entry) = pass.state.entries.get(&key).cloned() else {
                continue;
            };

            let copies: Vec<_> = search.get_all(&key).collect();
            if copies.is_empty() {
                info!(key = %key, title = %entry.title, "Already gone from {to}");
                pass.state.entries.remove(&key);
                continue;
            }

            // Every copy carrying this key goes, duplicates included
            let mut deleted = false;
            let mut failure = None;
            for record in copies {
                match target.delete(&record.raw_id).await {
                    Ok(DeleteOutcome::Deleted) => {
                        info!(key = %key, id = %record.raw_id, title = %entry.title, "Deleted from {to}");
                        deleted = true;
                    }
                    Ok(DeleteOutcome::NotFound) => {
                        info!(key = %key, id = %record.raw_id, title = %entry.title, "Already gone from {to}");
                    }
                    Err(e) => {
                        warn!(key = %key, id = %record.raw_id, title = %entry.title, error = %e, "Failed to delete from {to}");
                        failure = Some(e);
                    }
                }
            }

            match failure {
                None => {
                    if deleted {
                        pass.summary
                            .direction_mut(from)
                            .record_deleted(&entry.title, &entry.start);
                    }
                    pass.state.entries.remove(&key);
                }
                Some(e) => {
                    pass.summary.direction_mut(from).errors += 1;
                    pass.state.entries.insert(
                        key,
                        SyncedEntry {
                            sync_failed: true,
                            error: Some(e.to_string()),
                            ..entry
                        },
                    );
                }
            }
        }

        Ok(())
    }
}
