//! Autosave state machine
//!
//! Tracks whether the open document has unsaved edits and whether a save is
//! running. Saving itself is the session's job; this type only answers "should
//! a save start now?" and records how it ended.
//!
//! Dirtiness is tracked with generation counters rather than by comparing
//! timestamps, so two edits within the same clock tick are still told apart.
//! The timestamps are kept for display.
//!
//! ```text
//!   idle ──begin──▶ saving ──ok──▶ saved
//!                     │  ▲            │
//!                    err └──begin─────┘
//!                     ▼
//!                   error ──begin──▶ saving
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Save status shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
    Error(String),
}

/// Proof that a save was started; handed back to [`AutosaveState::finish_save`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveTicket {
    generation: u64,
}

#[derive(Debug, Clone)]
pub struct AutosaveState {
    status: SaveStatus,
    last_edited_at: Option<DateTime<Utc>>,
    last_saved_at: Option<DateTime<Utc>>,
    edit_generation: u64,
    saved_generation: u64,
}

impl Default for AutosaveState {
    fn default() -> Self {
        Self::new()
    }
}

impl AutosaveState {
    pub fn new() -> Self {
        Self {
            status: SaveStatus::Idle,
            last_edited_at: None,
            last_saved_at: None,
            edit_generation: 0,
            saved_generation: 0,
        }
    }

    /// State of a document just loaded from storage at `saved_at`
    pub fn loaded(saved_at: DateTime<Utc>) -> Self {
        Self {
            last_saved_at: Some(saved_at),
            ..Self::new()
        }
    }

    /// Record an edit
    pub fn mark_edited(&mut self, now: DateTime<Utc>) {
        self.edit_generation += 1;
        self.last_edited_at = Some(now);
    }

    /// Record a change that brought the outline back to its persisted state
    ///
    /// Clears dirtiness, except while a save is in flight: that save writes
    /// other content, so the outline must be saved again afterwards.
    pub fn mark_reverted(&mut self, now: DateTime<Utc>) {
        self.mark_edited(now);
        if !self.is_saving() {
            self.saved_generation = self.edit_generation;
        }
    }

    /// Edits exist that no finished save has covered
    pub fn is_dirty(&self) -> bool {
        self.edit_generation > self.saved_generation
    }

    pub fn is_saving(&self) -> bool {
        self.status == SaveStatus::Saving
    }

    /// Dirty and no save in flight
    pub fn should_save(&self) -> bool {
        self.is_dirty() && !self.is_saving()
    }

    /// Enter `saving`; `None` when a save is already in flight
    pub fn begin_save(&mut self) -> Option<SaveTicket> {
        if self.is_saving() {
            tracing::debug!("Save skipped: another save is in flight");
            return None;
        }
        self.status = SaveStatus::Saving;
        Some(SaveTicket {
            generation: self.edit_generation,
        })
    }

    /// Record the outcome of the save started with `ticket`
    ///
    /// Edits made while the save was running stay dirty.
    pub fn finish_save(&mut self, ticket: SaveTicket, outcome: Result<(), String>, now: DateTime<Utc>) {
        match outcome {
            Ok(()) => {
                self.saved_generation = self.saved_generation.max(ticket.generation);
                self.last_saved_at = Some(now);
                self.status = SaveStatus::Saved;
            }
            Err(message) => {
                self.status = SaveStatus::Error(message);
            }
        }
    }

    pub fn status(&self) -> &SaveStatus {
        &self.status
    }

    pub fn last_edited_at(&self) -> Option<DateTime<Utc>> {
        self.last_edited_at
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }
}
