//! # dbrefactor-core
//!
//! Planned schema operations and the bookkeeping that decides which of them still have
//! to be sent to the refactoring backend.
//!
//! An [`AppliedSet`] records the [`Fingerprint`]s of operations already applied under a
//! root key. Before every preview or apply the caller asks [`pending`] for the subset
//! still to run; after the backend confirms an apply it calls [`mark_applied`].

pub mod applied;
pub mod draft;
pub mod error;
pub mod fingerprint;
pub mod id;
pub mod operation;
pub mod plan;
pub mod reconcile;
pub mod schema;
pub mod suggest;

pub use applied::AppliedSet;
pub use draft::OperationDraft;
pub use error::{CoreError, ErrorCategory, Result};
pub use fingerprint::{Fingerprint, fingerprint, fingerprint_value};
pub use id::generate_id;
pub use operation::{CompatArea, Operation, OperationKind, ReferentialAction};
pub use plan::{Plan, PlanEntry};
pub use reconcile::{OperationStatus, has_destructive_ops, mark_applied, pending, status};
pub use schema::{ColumnInfo, ForeignKeyInfo, IndexInfo, TableInfo, normalize_schema};
pub use suggest::{SuggestionResponse, apply_suggested_order, render_prompt};
