//! # Popup Surface Controller
//!
//! State machine deciding which overlay is visible. There are three
//! surfaces, and at most one is visible at any instant:
//!
//! ```text
//!             open-embed                        click block
//!   ┌──────────────────────────┐       ┌──────────────────────────┐
//!   ▼                          │       ▼                          │
//! EmbedInput ──close/insert──▶ Closed ◀──close/delete── EditActions
//!                              ▲   ▲                        │
//!                       dismiss│   └──── preview (hidden) ──┘
//!                              │              │ render resolves
//!                           Preview ◀─────────┘
//! ```
//!
//! Opening any surface hides the visible one first. Every hide/show is
//! recorded as a [`SurfaceChange`] so the host can mirror them in order.
//!
//! Preview is deferred: edit-actions closes as soon as preview is requested,
//! and the preview surface appears only once the render settles. A render
//! that never settles leaves the controller closed with the request pending;
//! nothing cancels it.

use crate::binder::BlockRef;
use crate::preview::{ModalOptions, PreviewModal, RenderError};
use embedtweet_common::{Placement, Rect, ToolbarPosition};
use tracing::debug;

/// Which surface is visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceState {
    Closed,
    EmbedInput,
    EditActions,
    Preview,
}

/// Visibility change the host applies to its overlays
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceChange {
    Hidden(SurfaceState),
    Shown {
        surface: SurfaceState,
        placement: Option<Placement>,
    },
}

/// The block bound to the open edit-actions or preview surface
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSelection {
    pub block: BlockRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreviewTicket(u64);

/// A preview render that has been requested but has not settled
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPreview {
    pub ticket: PreviewTicket,
    pub block: BlockRef,
}

#[derive(Debug)]
pub struct SurfaceController {
    state: SurfaceState,
    placement: Option<Placement>,
    selection: Option<ActiveSelection>,
    embed_input: String,
    modal: PreviewModal,
    pending: Vec<PendingPreview>,
    next_ticket: u64,
    last_preview_error: Option<RenderError>,
    toolbar: ToolbarPosition,
    offset: f64,
    changes: Vec<SurfaceChange>,
}

impl SurfaceController {
    pub fn new(toolbar: ToolbarPosition, offset: f64) -> Self {
        Self {
            state: SurfaceState::Closed,
            placement: None,
            selection: None,
            embed_input: String::new(),
            modal: PreviewModal::new(ModalOptions::default()),
            pending: Vec::new(),
            next_ticket: 0,
            last_preview_error: None,
            toolbar,
            offset,
            changes: Vec::new(),
        }
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }

    pub fn selection(&self) -> Option<&ActiveSelection> {
        self.selection.as_ref()
    }

    pub fn embed_input(&self) -> &str {
        &self.embed_input
    }

    pub fn modal(&self) -> &PreviewModal {
        &self.modal
    }

    /// True while at least one preview render has not settled
    pub fn is_awaiting_preview(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn last_preview_error(&self) -> Option<&RenderError> {
        self.last_preview_error.as_ref()
    }

    /// Drain the visibility changes recorded since the last call
    pub fn take_changes(&mut self) -> Vec<SurfaceChange> {
        std::mem::take(&mut self.changes)
    }

    pub fn open_embed_input(&mut self, anchor: Rect) {
        self.hide_current();
        self.embed_input.clear();
        self.show(SurfaceState::EmbedInput, Some(anchor));
    }

    /// Replace the text typed into the embed input. Ignored when the input
    /// is not open.
    pub fn update_embed_input(&mut self, text: &str) {
        if self.state == SurfaceState::EmbedInput {
            self.embed_input.clear();
            self.embed_input.push_str(text);
        }
    }

    pub fn close_embed_input(&mut self) {
        if self.state == SurfaceState::EmbedInput {
            self.hide_current();
        }
    }

    pub fn open_edit_actions(&mut self, block: BlockRef, anchor: Rect) {
        self.hide_current();
        self.selection = Some(ActiveSelection { block });
        self.show(SurfaceState::EditActions, Some(anchor));
    }

    pub fn close_edit_actions(&mut self) {
        if self.state == SurfaceState::EditActions {
            self.hide_current();
        }
    }

    /// Hand the selection over for deletion, closing whichever surface it
    /// was bound to
    pub fn take_selection(&mut self) -> Option<ActiveSelection> {
        let selection = self.selection.take()?;
        self.hide_current();
        Some(selection)
    }

    /// Leave edit-actions for a deferred preview of the selected block
    pub fn begin_preview(&mut self) -> Option<PendingPreview> {
        if self.state != SurfaceState::EditActions {
            return None;
        }

        let block = self.selection.as_ref()?.block.clone();
        self.hide_current();

        self.next_ticket += 1;
        let pending = PendingPreview {
            ticket: PreviewTicket(self.next_ticket),
            block,
        };
        self.pending.push(pending.clone());

        debug!(ticket = self.next_ticket, block_id = %pending.block.id, "Preview requested");
        Some(pending)
    }

    /// Remove a pending request, returning it if it was still outstanding
    pub fn settle(&mut self, ticket: PreviewTicket) -> Option<PendingPreview> {
        let index = self.pending.iter().position(|p| p.ticket == ticket)?;
        Some(self.pending.remove(index))
    }

    /// Show a settled preview. The newest completion wins over whatever
    /// surface is open.
    pub fn show_preview(&mut self, body: String, block: Option<BlockRef>) {
        self.hide_current();
        self.last_preview_error = None;
        self.selection = block.map(|block| ActiveSelection { block });
        self.modal.show(body);
        self.show(SurfaceState::Preview, None);
    }

    pub fn record_preview_error(&mut self, error: RenderError) {
        self.last_preview_error = Some(error);
    }

    pub fn dismiss_preview(&mut self) {
        if self.state == SurfaceState::Preview {
            self.hide_current();
        }
    }

    /// Escape closes the preview dialog when it is configured to
    pub fn escape(&mut self) {
        if self.state == SurfaceState::Preview && self.modal.dismisses_on_escape() {
            self.hide_current();
        }
    }

    /// Re-point the selection after the document changed underneath it.
    /// `locate` maps a block id to its current reference, or `None` when the
    /// block is gone, in which case the bound surface closes.
    pub fn reconcile(&mut self, locate: impl Fn(&BlockRef) -> Option<BlockRef>) {
        let Some(selection) = &self.selection else {
            return;
        };

        match locate(&selection.block) {
            Some(block) => self.selection = Some(ActiveSelection { block }),
            None => {
                debug!(block_id = %selection.block.id, "Selected block left the document");
                self.hide_current();
            }
        }
    }

    fn show(&mut self, surface: SurfaceState, anchor: Option<Rect>) {
        let placement = anchor.map(|rect| Placement::anchored_to(rect, self.toolbar, self.offset));

        self.state = surface;
        self.placement = placement;
        self.changes.push(SurfaceChange::Shown { surface, placement });
    }

    fn hide_current(&mut self) {
        let previous = self.state;
        if previous == SurfaceState::Closed {
            return;
        }

        match previous {
            SurfaceState::EditActions | SurfaceState::Preview => self.selection = None,
            SurfaceState::EmbedInput | SurfaceState::Closed => {}
        }
        if previous == SurfaceState::Preview {
            self.modal.hide();
        }

        self.state = SurfaceState::Closed;
        self.placement = None;
        self.changes.push(SurfaceChange::Hidden(previous));
    }
}
