//! Menu Editor - client-side staging for restaurant menu edits
//!
//! Edits to a restaurant's categories, dishes and metadata are staged in an
//! in-memory overlay, rendered through a merged view, and committed to the
//! backend in one ordered pass.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use menu_editor::{ClientConfig, EditSession, EditorConfig};
//! use shared::models::Category;
//! use shared::staged::ActionKind;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = ClientConfig::from_env().build_backend()?;
//! let session = EditSession::new(Arc::new(backend), EditorConfig::from_env());
//! session.load(42).await?;
//!
//! let salads = Category::draft(42, "Salads");
//! session.stage_category(salads.id, ActionKind::Create, salads)?;
//!
//! let report = session.commit().await?;
//! for failure in report.failures() {
//!     eprintln!("{} {}: {}", failure.kind, failure.id, failure.status);
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod commit;
pub mod config;
pub mod error;
pub mod projector;
pub mod session;
pub mod slug;
pub mod staging;
pub mod validation;

pub use backend::{EntityKind, HttpBackend, MemoryBackend, MenuBackend, SlugRegistry};
pub use commit::{CommitCoordinator, CommitPlan, CommitReport, EntityOutcome, IdRemap, OutcomeStatus};
pub use config::{ClientConfig, EditorConfig};
pub use error::{EditorError, EditorResult, PersistError};
pub use session::EditSession;
pub use slug::SlugAllocator;
pub use staging::{Overlay, StageOutcome, StagingCache};
