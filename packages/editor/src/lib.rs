//! # Embedtweet Editor
//!
//! Tweet embedding for a rich-text editor: blocks in the document, their
//! click handlers, and the popups used to insert, edit and preview them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: raw embed markup → Tweet            │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: EditSession                         │
//! │  - Binder: insert/delete blocks, handlers   │
//! │  - UndoStack: one step per insert/delete    │
//! │  - SurfaceController: popup state machine   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ TweetRenderer: async preview body           │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Document is source of truth**: bindings and selections are derived
//!    and can be rebuilt from it at any time
//! 2. **Node identity matters**: undo and redo restore fresh node instances,
//!    so handlers are rebound after every history step
//! 3. **One event at a time**: the preview render is the only async step and
//!    re-enters the session as an ordinary event
//!
//! ## Usage
//!
//! ```rust,ignore
//! use embedtweet_editor::{Document, EditSession, EmbedConfig};
//!
//! let mut session = EditSession::new("editor-1", Document::new(), EmbedConfig::default(), renderer);
//!
//! session.show_embed_popup();
//! session.update_embed_input(raw_embed);
//! let block = session.submit_embed();
//!
//! session.click_block(&block.unwrap().id);
//! session.preview_tweet();
//! session.next_completion().await;
//! ```

mod binder;
pub mod commands;
mod config;
mod document;
mod errors;
mod id_generator;
mod mutations;
mod preview;
mod session;
mod surface;
mod undo_stack;

pub use binder::{Binder, BlockRef, ClickResponse};
pub use commands::{CommandSpec, PopupButton};
pub use config::{EmbedConfig, DEFAULT_CONFIG_NAME};
pub use document::{Document, EmbeddedBlock, Node, NodeContent, NodeInstance, EMBED_CLASS, TWEET_ID_ATTR};
pub use errors::EditorError;
pub use id_generator::BlockIdGenerator;
pub use mutations::{Mutation, MutationError, MutationResult};
pub use preview::{Alignment, ModalOptions, PreviewModal, RenderError, RenderOptions, TweetRenderer};
pub use session::{CommandOutcome, EditSession, SessionEvent, SessionOutcome};
pub use surface::{ActiveSelection, PendingPreview, PreviewTicket, SurfaceChange, SurfaceController, SurfaceState};
pub use undo_stack::{MutationBatch, UndoStack};

// Re-export common types for convenience
pub use embedtweet_common::{BlockId, DetachedViewport, Placement, PopupDirection, Rect, ToolbarPosition, Viewport};
pub use embedtweet_parser::{Tweet, TweetId};
