//! Business Services
//!
//! This module contains the orchestration layer above the tree core:
//!
//! - `EditorSession` - One open document: store, history, autosave and repository
//! - `AutosaveState` - Save status and dirty tracking
//! - `ReorganizeService` - AI reorganize round-trip producing reviewable proposals
//!
//! Services coordinate between the tree core and the database layer,
//! implementing commit and save rules on top of the pure tree operations.

pub mod autosave;
pub mod editor_session;
pub mod error;
pub mod reorganize;

pub use autosave::{AutosaveState, SaveStatus, SaveTicket};
pub use editor_session::{EditorSession, PendingSave};
pub use error::{ReorganizeError, SessionError};
pub use reorganize::{ReorganizeProposal, ReorganizeResponse, ReorganizeService, Reorganizer};
