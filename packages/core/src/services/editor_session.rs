//! Editor Session - One Open Document
//!
//! Owns the [`NodeStore`], [`HistoryManager`] and [`AutosaveState`] of a single
//! open document and is the only place UI-level edits enter the core.
//!
//! # Commit discipline
//!
//! Every public editing method runs its tree operation and then commits history
//! before returning, so one call is one undo step. Several mutations that must
//! undo together go through [`EditorSession::batch`]. A failed operation or
//! batch leaves the store and the history untouched.
//!
//! # Saving
//!
//! Saving is caller-triggered. [`EditorSession::autosave`] persists only when
//! autosave is enabled, the outline has unsaved edits and no save is in
//! flight. Callers that must not hold the session across the repository call
//! (a session behind a mutex, for instance) split a save into
//! [`EditorSession::prepare_save`] and [`EditorSession::complete_save`].
//! Undo and redo compare against the outline last persisted and skip the
//! write when they land on it.

use crate::db::DocumentStore;
use crate::export;
use crate::history::{CommitOutcome, HistoryManager, HistoryState};
use crate::models::{
    new_node_id, Document, DocumentMetadata, EditorSettings, ImageAttachment, SystemTimeProvider,
    TimeProvider,
};
use crate::operations::{OperationResult, Placement};
use crate::services::autosave::{AutosaveState, SaveStatus, SaveTicket};
use crate::services::error::{ReorganizeError, SessionError};
use crate::services::reorganize::{ReorganizeProposal, ReorganizeService};
use crate::tree::NodeStore;
use std::sync::Arc;

/// A document snapshot taken for saving, together with its autosave ticket
#[derive(Debug, Clone)]
pub struct PendingSave {
    pub ticket: SaveTicket,
    pub document: Document,
}

pub struct EditorSession {
    document_id: String,
    store: NodeStore,
    history: HistoryManager,
    autosave: AutosaveState,
    /// Outline as last written to (or read from) the repository
    persisted: Option<HistoryState>,
    /// Outline captured by the save currently in flight
    saving: Option<HistoryState>,
    metadata: DocumentMetadata,
    settings: EditorSettings,
    repository: Arc<dyn DocumentStore>,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("document_id", &self.document_id)
            .field("nodes", &self.store.len())
            .field("status", self.autosave.status())
            .finish()
    }
}

impl EditorSession {
    /// Start a new, unsaved document
    pub fn new(title: impl Into<String>, repository: Arc<dyn DocumentStore>) -> Self {
        Self::with_clock(title, repository, Arc::new(SystemTimeProvider))
    }

    pub fn with_clock(
        title: impl Into<String>,
        repository: Arc<dyn DocumentStore>,
        clock: Arc<dyn TimeProvider>,
    ) -> Self {
        let metadata = DocumentMetadata::new(clock.now());
        let store = NodeStore::with_clock(title, clock);
        let mut history = HistoryManager::new();
        history.reset(&store);

        Self {
            document_id: new_node_id(),
            store,
            history,
            autosave: AutosaveState::new(),
            persisted: None,
            saving: None,
            metadata,
            settings: EditorSettings::default(),
            repository,
        }
    }

    /// Load a stored document and open it
    pub async fn open(id: &str, repository: Arc<dyn DocumentStore>) -> Result<Self, SessionError> {
        Self::open_with_clock(id, repository, Arc::new(SystemTimeProvider)).await
    }

    pub async fn open_with_clock(
        id: &str,
        repository: Arc<dyn DocumentStore>,
        clock: Arc<dyn TimeProvider>,
    ) -> Result<Self, SessionError> {
        let document = repository
            .load(id)
            .await
            .map_err(|e| SessionError::storage(&e))?
            .ok_or_else(|| SessionError::document_not_found(id))?;
        Self::from_document(document, repository, clock)
    }

    /// Open an already loaded document
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidTree`] when the nested tree cannot be flattened
    /// into a consistent store.
    pub fn from_document(
        document: Document,
        repository: Arc<dyn DocumentStore>,
        clock: Arc<dyn TimeProvider>,
    ) -> Result<Self, SessionError> {
        let store = NodeStore::from_document(&document, clock)?;
        store.check_integrity()?;
        let mut history = HistoryManager::new();
        history.reset(&store);
        let persisted = store.snapshot();

        tracing::info!(
            "Opened document '{}' ({} nodes, version {})",
            document.id,
            store.len(),
            document.metadata.version
        );

        Ok(Self {
            document_id: document.id,
            store,
            history,
            autosave: AutosaveState::loaded(document.metadata.updated_at),
            persisted: Some(persisted),
            saving: None,
            metadata: document.metadata,
            settings: EditorSettings::default(),
            repository,
        })
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn autosave_state(&self) -> &AutosaveState {
        &self.autosave
    }

    pub fn save_status(&self) -> &SaveStatus {
        self.autosave.status()
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: EditorSettings) {
        self.settings = settings;
    }

    pub fn title(&self) -> &str {
        self.store.title()
    }

    pub fn root_id(&self) -> &str {
        self.store.root_id()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Run several mutations as one undo step
    ///
    /// If `edit` fails, every mutation it already made is rolled back.
    pub fn batch<T>(
        &mut self,
        edit: impl FnOnce(&mut NodeStore) -> OperationResult<T>,
    ) -> Result<T, SessionError> {
        let before = self.store.snapshot();
        match edit(&mut self.store) {
            Ok(value) => {
                self.commit();
                Ok(value)
            }
            Err(e) => {
                if !self.store.matches(&before) {
                    self.store.restore(&before);
                }
                Err(e.into())
            }
        }
    }

    fn commit(&mut self) {
        if self.history.commit(&self.store) == CommitOutcome::Recorded {
            self.autosave.mark_edited(self.store.clock().now());
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.store.set_title(title);
        self.commit();
    }

    pub fn add_child(&mut self, parent_id: &str) -> Result<String, SessionError> {
        self.batch(|store| store.add_child(parent_id))
    }

    pub fn add_sibling(&mut self, node_id: &str) -> Result<String, SessionError> {
        self.batch(|store| store.add_sibling(node_id))
    }

    pub fn delete_node(&mut self, node_id: &str) -> Result<usize, SessionError> {
        self.batch(|store| store.delete_node(node_id))
    }

    pub fn indent(&mut self, node_id: &str) -> Result<(), SessionError> {
        self.batch(|store| store.indent(node_id))
    }

    pub fn outdent(&mut self, node_id: &str) -> Result<(), SessionError> {
        self.batch(|store| store.outdent(node_id))
    }

    pub fn move_up(&mut self, node_id: &str) -> Result<(), SessionError> {
        self.batch(|store| store.move_up(node_id))
    }

    pub fn move_down(&mut self, node_id: &str) -> Result<(), SessionError> {
        self.batch(|store| store.move_down(node_id))
    }

    /// Drag-and-drop move of `active_id` relative to `over_id`
    pub fn move_node(
        &mut self,
        active_id: &str,
        over_id: &str,
        placement: Placement,
    ) -> Result<(), SessionError> {
        self.batch(|store| store.move_node(active_id, over_id, placement))
    }

    pub fn update_content(
        &mut self,
        node_id: &str,
        content: impl Into<String>,
    ) -> Result<bool, SessionError> {
        self.batch(|store| store.update_content(node_id, content))
    }

    pub fn toggle_collapsed(&mut self, node_id: &str) -> Result<bool, SessionError> {
        self.batch(|store| store.toggle_collapsed(node_id))
    }

    pub fn set_collapsed(&mut self, node_id: &str, collapsed: bool) -> Result<bool, SessionError> {
        self.batch(|store| store.set_collapsed(node_id, collapsed))
    }

    pub fn expand_all(&mut self) -> usize {
        let changed = self.store.expand_all();
        self.commit();
        changed
    }

    pub fn collapse_all(&mut self) -> usize {
        let changed = self.store.collapse_all();
        self.commit();
        changed
    }

    pub fn add_tag(&mut self, node_id: &str, tag: &str) -> Result<bool, SessionError> {
        self.batch(|store| store.add_tag(node_id, tag))
    }

    pub fn remove_tag(&mut self, node_id: &str, tag: &str) -> Result<bool, SessionError> {
        self.batch(|store| store.remove_tag(node_id, tag))
    }

    pub fn sync_hashtags(&mut self, node_id: &str) -> Result<usize, SessionError> {
        self.batch(|store| store.sync_hashtags(node_id))
    }

    pub fn add_image(
        &mut self,
        node_id: &str,
        image: ImageAttachment,
    ) -> Result<bool, SessionError> {
        self.batch(|store| store.add_image(node_id, image))
    }

    pub fn remove_image(&mut self, node_id: &str, image_id: &str) -> Result<bool, SessionError> {
        self.batch(|store| store.remove_image(node_id, image_id))
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Step back one edit, then give autosave a chance to persist
    ///
    /// Nothing is written when the step lands on the outline as last persisted.
    /// A failed autosave does not fail the undo; it shows in [`Self::save_status`].
    pub async fn undo(&mut self) -> bool {
        if !self.history.undo(&mut self.store) {
            return false;
        }
        self.autosave_after_history().await;
        true
    }

    pub async fn redo(&mut self) -> bool {
        if !self.history.redo(&mut self.store) {
            return false;
        }
        self.autosave_after_history().await;
        true
    }

    /// Whether the outline equals what the repository last stored
    pub fn matches_persisted(&self) -> bool {
        self.persisted
            .as_ref()
            .is_some_and(|state| self.store.matches(state))
    }

    async fn autosave_after_history(&mut self) {
        let now = self.store.clock().now();
        if self.matches_persisted() {
            self.autosave.mark_reverted(now);
            return;
        }
        self.autosave.mark_edited(now);
        if let Err(e) = self.autosave().await {
            tracing::warn!("Autosave after history step failed: {}", e);
        }
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Current outline as a document, without saving it
    pub fn document(&self) -> Result<Document, SessionError> {
        Ok(self
            .store
            .to_document(self.document_id.clone(), self.metadata.clone())?)
    }

    /// Enter the saving state and snapshot the document to write
    ///
    /// # Errors
    ///
    /// [`SessionError::SaveInProgress`] when an earlier save has not completed.
    pub fn prepare_save(&mut self) -> Result<PendingSave, SessionError> {
        let ticket = self
            .autosave
            .begin_save()
            .ok_or(SessionError::SaveInProgress)?;

        let mut metadata = self.metadata.clone();
        metadata.updated_at = self.store.clock().now();
        match self.store.to_document(self.document_id.clone(), metadata) {
            Ok(document) => {
                self.saving = Some(self.store.snapshot());
                Ok(PendingSave { ticket, document })
            }
            Err(e) => {
                self.autosave
                    .finish_save(ticket, Err(e.to_string()), self.store.clock().now());
                Err(e.into())
            }
        }
    }

    /// Record the repository's answer to a save started with [`Self::prepare_save`]
    pub fn complete_save(
        &mut self,
        ticket: SaveTicket,
        result: anyhow::Result<Document>,
    ) -> Result<Document, SessionError> {
        let now = self.store.clock().now();
        let written = self.saving.take();
        match result {
            Ok(saved) => {
                if let Some(state) = written {
                    self.persisted = Some(state);
                }
                self.metadata = saved.metadata.clone();
                self.autosave.finish_save(ticket, Ok(()), now);
                Ok(saved)
            }
            Err(e) => {
                let err = SessionError::storage(&e);
                tracing::warn!("Failed to save document '{}': {:#}", self.document_id, e);
                self.autosave.finish_save(ticket, Err(err.to_string()), now);
                Err(err)
            }
        }
    }

    /// Save unconditionally
    pub async fn save(&mut self) -> Result<Document, SessionError> {
        let pending = self.prepare_save()?;
        let result = self.repository.save(pending.document).await;
        self.complete_save(pending.ticket, result)
    }

    /// Save if autosave is enabled and there are unsaved edits
    ///
    /// Returns whether a save ran.
    pub async fn autosave(&mut self) -> Result<bool, SessionError> {
        if !self.settings.autosave || !self.autosave.should_save() {
            return Ok(false);
        }
        self.save().await?;
        Ok(true)
    }

    // ========================================================================
    // Reorganize
    // ========================================================================

    /// Ask `service` for a reorganization of the subtree under `target_id`
    pub async fn propose_reorganization(
        &self,
        service: &ReorganizeService,
        target_id: &str,
    ) -> Result<ReorganizeProposal, SessionError> {
        Ok(service.propose(&self.store, target_id).await?)
    }

    /// Accept a proposal: the target takes the proposed content and children
    ///
    /// One undo step. Returns the ids of the new children.
    pub fn apply_reorganization(
        &mut self,
        proposal: &ReorganizeProposal,
    ) -> Result<Vec<String>, SessionError> {
        let target_id = proposal.target_id.as_str();
        if !self.store.contains(target_id) {
            return Err(ReorganizeError::target_not_found(target_id).into());
        }
        let ids = self.batch(|store| {
            store.update_content(target_id, proposal.proposed.content.clone())?;
            store.replace_children(target_id, &proposal.proposed.children)
        })?;
        tracing::info!(
            "Applied reorganization of '{}' ({} changes)",
            target_id,
            proposal.diff.len()
        );
        Ok(ids)
    }

    // ========================================================================
    // Export
    // ========================================================================

    pub fn export_json(&self) -> Result<String, SessionError> {
        Ok(export::export_json(&self.document()?, &self.settings)?)
    }

    pub fn export_html(&self) -> Result<String, SessionError> {
        Ok(export::export_html(&self.document()?, &self.settings))
    }
}

#[cfg(test)]
#[path = "editor_session_test.rs"]
mod editor_session_test;
