//! Debounced persistence of design changes.
//!
//! The pipeline is sans-IO: it decides *when* a write should happen and
//! hands out `SaveRequest`s; the host performs the write (see `submit`) and
//! reports the outcome with `complete`. Writes are tagged with increasing
//! tickets so that a slow, superseded write cannot overwrite the status of
//! a newer one.

use crate::debounce::Debouncer;
use crate::store::{DesignStore, StoreError};
use serde::{Deserialize, Serialize};
use sf_core::design::DesignPatch;
use sf_core::id::DesignId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SaveStatus {
    /// Nothing written yet.
    Idle,
    /// Edits buffered, waiting for the quiet period.
    Pending,
    /// A write is in flight.
    Saving,
    Saved,
    Failed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WriteTicket(u64);

impl WriteTicket {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for WriteTicket {
    fn from(n: u64) -> Self {
        WriteTicket(n)
    }
}

/// One write the host should perform against the design store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub ticket: WriteTicket,
    pub design_id: DesignId,
    pub patch: DesignPatch,
    /// Issued immediately by a record-level operation (page add, duplicate,
    /// delete, or move; rename; resize) rather than by the debounce timer.
    /// Such a patch always carries `current_page`.
    pub structural: bool,
}

pub struct AutosavePipeline {
    design_id: DesignId,
    buffer: Debouncer<()>,
    next_ticket: u64,
    /// Newest ticket handed out and not yet discarded.
    latest: Option<WriteTicket>,
    status: SaveStatus,
}

impl AutosavePipeline {
    pub fn new(design_id: DesignId, debounce_ms: f64) -> Self {
        Self {
            design_id,
            buffer: Debouncer::new(debounce_ms),
            next_ticket: 1,
            latest: None,
            status: SaveStatus::Idle,
        }
    }

    pub fn design_id(&self) -> &DesignId {
        &self.design_id
    }

    pub fn status(&self) -> &SaveStatus {
        &self.status
    }

    /// Whether edits are buffered and not yet handed out as a request.
    pub fn is_pending(&self) -> bool {
        self.buffer.is_pending()
    }

    /// Buffer an edit, restarting the quiet period.
    pub fn note_edit(&mut self, now: f64) {
        self.buffer.push(now, ());
        self.status = SaveStatus::Pending;
    }

    /// True once, when the buffered edits have been quiet long enough.
    pub fn due(&mut self, now: f64) -> bool {
        self.buffer.poll(now).is_some()
    }

    /// Hand out a write for `patch`.
    pub fn issue(&mut self, patch: DesignPatch, structural: bool) -> SaveRequest {
        let ticket = WriteTicket(self.next_ticket);
        self.next_ticket += 1;
        self.latest = Some(ticket);
        self.status = SaveStatus::Saving;
        log::debug!(
            "design {}: issuing write #{} (structural: {structural})",
            self.design_id,
            ticket.0
        );
        SaveRequest {
            ticket,
            design_id: self.design_id.clone(),
            patch,
            structural,
        }
    }

    /// Issue a write immediately. Any buffered debounced write is dropped,
    /// since `patch` carries the full page array and supersedes it.
    pub fn write_now(&mut self, patch: DesignPatch) -> SaveRequest {
        if self.buffer.cancel() {
            log::debug!("design {}: buffered write superseded", self.design_id);
        }
        self.issue(patch, true)
    }

    /// Record the outcome of a write. Returns whether the status changed;
    /// completions of superseded writes are ignored.
    pub fn complete(&mut self, ticket: WriteTicket, result: Result<(), StoreError>) -> bool {
        if self.latest != Some(ticket) {
            log::debug!(
                "design {}: ignoring completion of superseded write #{}",
                self.design_id,
                ticket.0
            );
            return false;
        }
        self.status = match result {
            Ok(()) if self.buffer.is_pending() => SaveStatus::Pending,
            Ok(()) => SaveStatus::Saved,
            Err(err) => {
                log::warn!("design {}: write #{} failed: {err}", self.design_id, ticket.0);
                SaveStatus::Failed {
                    message: err.to_string(),
                }
            }
        };
        true
    }

    /// Drop buffered edits without writing them; in-flight completions
    /// become stale. Returns whether a buffered write was dropped.
    pub fn discard(&mut self) -> bool {
        let dropped = self.buffer.cancel();
        self.latest = None;
        if dropped {
            log::debug!("design {}: discarded buffered write", self.design_id);
        }
        if self.status == SaveStatus::Pending {
            self.status = SaveStatus::Idle;
        }
        dropped
    }
}

/// Perform `request` against `store`.
pub async fn submit<D: DesignStore>(store: &D, request: &SaveRequest) -> Result<(), StoreError> {
    store.update(&request.design_id, &request.patch).await
}
