//! # Edit Session
//!
//! One editing session over one document. The session owns the document,
//! its undo history, the block binder and the popup surface controller, and
//! it is the only thing the host integration talks to.
//!
//! ## Event flow
//!
//! Every input becomes a [`SessionEvent`] in a FIFO queue and is handled to
//! completion before the next one. The preview render is the only
//! asynchronous step. It runs as a spawned task, and its result comes back
//! as [`SessionEvent::PreviewSettled`] through the session's completion
//! channel. Nothing else can interleave with the state it resumes, because
//! the session handles events one at a time.
//!
//! ```text
//! host input ──▶ dispatch ──▶ queue ──▶ handle ──▶ binder / surfaces
//!                               ▲
//!           render task ────────┘ (PreviewSettled via completion channel)
//! ```

use crate::binder::{Binder, BlockRef, ClickResponse};
use crate::commands::{self, lookup, resolve_buttons, PopupButton};
use crate::config::EmbedConfig;
use crate::document::{Document, EmbeddedBlock, NodeContent};
use crate::errors::EditorError;
use crate::mutations::Mutation;
use crate::preview::{render_with_timeout, RenderError, RenderOptions, TweetRenderer};
use crate::surface::{
    ActiveSelection, PreviewTicket, SurfaceChange, SurfaceController, SurfaceState,
};
use crate::undo_stack::UndoStack;
use embedtweet_common::{BlockId, DetachedViewport, Placement, Rect, Viewport};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Input to the session's event queue
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ShowEmbedPopup,
    HideEmbedPopup,
    UpdateEmbedInput(String),
    /// Insert whatever is typed into the embed input
    SubmitEmbed,
    /// Insert the given raw embed markup
    EmbedTweet(String),
    ShowEditPopup(BlockId),
    HideEditPopup,
    DeleteTweet,
    PreviewTweet,
    /// Continuation of a preview render
    PreviewSettled {
        ticket: PreviewTicket,
        outcome: Result<String, RenderError>,
    },
    DismissPreview,
    Escape,
    /// Host typing: opaque markup inserted at the cursor
    InsertMarkup(String),
    SetCursor(usize),
    Undo,
    Redo,
    /// Post-command notification from the host editor
    CommandCompleted(String),
}

/// Observable result of handling an event
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Inserted(EmbeddedBlock),
    Deleted(EmbeddedBlock),
    HistoryMoved,
    PreviewShown,
}

/// Result of running a named command
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    /// The host should give focus back to the editor
    pub focus_editor: bool,
    /// The command is registered as recording an undo step
    pub records_undo: bool,
    pub outcomes: Vec<SessionOutcome>,
}

pub struct EditSession {
    /// Unique session identifier
    pub id: String,

    document: Document,
    history: UndoStack,
    binder: Binder,
    surfaces: SurfaceController,
    config: EmbedConfig,
    viewport: Box<dyn Viewport>,
    renderer: Arc<dyn TweetRenderer>,
    queue: VecDeque<SessionEvent>,
    completions_tx: mpsc::UnboundedSender<SessionEvent>,
    completions_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl EditSession {
    /// Start a session over `document`. Blocks already in the document are
    /// bound straight away.
    pub fn new(
        id: impl Into<String>,
        document: Document,
        config: EmbedConfig,
        renderer: Arc<dyn TweetRenderer>,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        let mut session = Self {
            id: id.into(),
            history: UndoStack::with_max_levels(config.undo_levels),
            binder: Binder::new(),
            surfaces: SurfaceController::new(config.toolbar_position, config.popup_offset),
            document,
            config,
            viewport: Box::new(DetachedViewport),
            renderer,
            queue: VecDeque::new(),
            completions_tx,
            completions_rx,
        };

        let bound = session.binder.rebind_all(&session.document);
        info!(session_id = %session.id, blocks = bound, "Edit session started");
        session
    }

    pub fn with_viewport(mut self, viewport: impl Viewport + 'static) -> Self {
        self.viewport = Box::new(viewport);
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    pub fn config(&self) -> &EmbedConfig {
        &self.config
    }

    pub fn surface_state(&self) -> SurfaceState {
        self.surfaces.state()
    }

    pub fn selection(&self) -> Option<&ActiveSelection> {
        self.surfaces.selection()
    }

    pub fn placement(&self) -> Option<Placement> {
        self.surfaces.placement()
    }

    pub fn embed_input(&self) -> &str {
        self.surfaces.embed_input()
    }

    /// Body of the preview dialog while it is visible
    pub fn preview_body(&self) -> Option<&str> {
        let modal = self.surfaces.modal();
        modal.is_visible().then(|| modal.body())
    }

    pub fn is_awaiting_preview(&self) -> bool {
        self.surfaces.is_awaiting_preview()
    }

    pub fn last_preview_error(&self) -> Option<&RenderError> {
        self.surfaces.last_preview_error()
    }

    pub fn is_block_bound(&self, id: &BlockId) -> bool {
        self.document
            .instance_of(id)
            .is_some_and(|instance| self.binder.is_bound(&BlockRef { id: id.clone(), instance }))
    }

    /// Drain the surface visibility changes since the last call
    pub fn take_surface_changes(&mut self) -> Vec<SurfaceChange> {
        self.surfaces.take_changes()
    }

    /// Button row of the visible popup
    pub fn popup_buttons(&self) -> Result<Vec<PopupButton>, EditorError> {
        match self.surfaces.state() {
            SurfaceState::EmbedInput => resolve_buttons(&self.config.embed_popup_buttons),
            SurfaceState::EditActions => resolve_buttons(&self.config.edit_popup_buttons),
            SurfaceState::Closed | SurfaceState::Preview => Ok(Vec::new()),
        }
    }

    /// Queue an event without handling it
    pub fn dispatch(&mut self, event: SessionEvent) {
        self.queue.push_back(event);
    }

    /// Handle queued events until the queue is empty
    pub fn process(&mut self) -> Vec<SessionOutcome> {
        let mut outcomes = Vec::new();

        while let Some(event) = self.queue.pop_front() {
            if let Some(outcome) = self.handle(event) {
                outcomes.push(outcome);
            }
        }

        outcomes
    }

    fn run(&mut self, event: SessionEvent) -> Vec<SessionOutcome> {
        self.dispatch(event);
        self.process()
    }

    pub fn show_embed_popup(&mut self) {
        self.run(SessionEvent::ShowEmbedPopup);
    }

    pub fn hide_embed_popup(&mut self) {
        self.run(SessionEvent::HideEmbedPopup);
    }

    pub fn update_embed_input(&mut self, text: impl Into<String>) {
        self.run(SessionEvent::UpdateEmbedInput(text.into()));
    }

    pub fn submit_embed(&mut self) -> Option<EmbeddedBlock> {
        inserted(self.run(SessionEvent::SubmitEmbed))
    }

    pub fn embed_tweet(&mut self, raw: &str) -> Option<EmbeddedBlock> {
        inserted(self.run(SessionEvent::EmbedTweet(raw.to_string())))
    }

    /// Route a click on a block through its handler. Returns `None` when the
    /// block has no live handler, in which case the click is inert.
    pub fn click_block(&mut self, id: &BlockId) -> Option<ClickResponse> {
        let response = self.binder.handle_click(&self.document, id)?;
        self.run(SessionEvent::ShowEditPopup(id.clone()));
        Some(response)
    }

    pub fn show_edit_popup(&mut self, id: &BlockId) {
        self.run(SessionEvent::ShowEditPopup(id.clone()));
    }

    pub fn hide_edit_popup(&mut self) {
        self.run(SessionEvent::HideEditPopup);
    }

    pub fn delete_tweet(&mut self) -> Option<EmbeddedBlock> {
        self.run(SessionEvent::DeleteTweet)
            .into_iter()
            .find_map(|outcome| match outcome {
                SessionOutcome::Deleted(block) => Some(block),
                _ => None,
            })
    }

    pub fn preview_tweet(&mut self) {
        self.run(SessionEvent::PreviewTweet);
    }

    pub fn dismiss_preview(&mut self) {
        self.run(SessionEvent::DismissPreview);
    }

    pub fn escape(&mut self) {
        self.run(SessionEvent::Escape);
    }

    pub fn insert_markup(&mut self, html: impl Into<String>) {
        self.run(SessionEvent::InsertMarkup(html.into()));
    }

    pub fn set_cursor(&mut self, index: usize) {
        self.run(SessionEvent::SetCursor(index));
    }

    /// Undo one step; handlers are rebound once it completes
    pub fn undo(&mut self) -> bool {
        self.history_command(commands::UNDO)
    }

    /// Redo one step; handlers are rebound once it completes
    pub fn redo(&mut self) -> bool {
        self.history_command(commands::REDO)
    }

    fn history_command(&mut self, name: &str) -> bool {
        self.execute_command(name)
            .map(|outcome| outcome.outcomes.contains(&SessionOutcome::HistoryMoved))
            .unwrap_or(false)
    }

    /// Tell the session the host finished running a command of its own
    pub fn notify_command_completed(&mut self, name: &str) {
        self.run(SessionEvent::CommandCompleted(name.to_string()));
    }

    /// Run a registered command by name, followed by its post-command event
    pub fn execute_command(&mut self, name: &str) -> Result<CommandOutcome, EditorError> {
        let spec = lookup(name).ok_or_else(|| EditorError::UnknownCommand(name.to_string()))?;

        let event = match spec.name {
            commands::EMBED_TWEET => SessionEvent::ShowEmbedPopup,
            commands::EMBED_POPUP_CLOSE => SessionEvent::HideEmbedPopup,
            commands::EMBED_INSERT => SessionEvent::SubmitEmbed,
            commands::EDIT_POPUP_CLOSE => SessionEvent::HideEditPopup,
            commands::DELETE_TWEET => SessionEvent::DeleteTweet,
            commands::PREVIEW_TWEET => SessionEvent::PreviewTweet,
            commands::UNDO => SessionEvent::Undo,
            commands::REDO => SessionEvent::Redo,
            other => return Err(EditorError::UnknownCommand(other.to_string())),
        };

        debug!(command = spec.name, "Executing command");
        self.dispatch(event);
        self.dispatch(SessionEvent::CommandCompleted(spec.name.to_string()));

        Ok(CommandOutcome {
            focus_editor: spec.focus,
            records_undo: spec.undo,
            outcomes: self.process(),
        })
    }

    /// Wait for the next preview render to settle and handle it. Returns
    /// false immediately when no render is pending.
    pub async fn next_completion(&mut self) -> bool {
        if !self.surfaces.is_awaiting_preview() {
            return false;
        }

        match self.completions_rx.recv().await {
            Some(event) => {
                self.run(event);
                true
            }
            None => false,
        }
    }

    /// Handle every completion that has already arrived, without waiting
    pub fn poll_completions(&mut self) -> usize {
        let mut received = 0;
        while let Ok(event) = self.completions_rx.try_recv() {
            self.dispatch(event);
            received += 1;
        }

        self.process();
        received
    }

    fn handle(&mut self, event: SessionEvent) -> Option<SessionOutcome> {
        match event {
            SessionEvent::ShowEmbedPopup => {
                let anchor = self.toolbar_anchor();
                self.surfaces.open_embed_input(anchor);
                None
            }
            SessionEvent::HideEmbedPopup => {
                self.surfaces.close_embed_input();
                None
            }
            SessionEvent::UpdateEmbedInput(text) => {
                self.surfaces.update_embed_input(&text);
                None
            }
            SessionEvent::SubmitEmbed => {
                let raw = self.surfaces.embed_input().to_string();
                self.insert_tweet(&raw)
            }
            SessionEvent::EmbedTweet(raw) => self.insert_tweet(&raw),
            SessionEvent::ShowEditPopup(id) => {
                self.open_edit_actions(&id);
                None
            }
            SessionEvent::HideEditPopup => {
                self.surfaces.close_edit_actions();
                None
            }
            SessionEvent::DeleteTweet => self.delete_selected(),
            SessionEvent::PreviewTweet => {
                self.request_preview();
                None
            }
            SessionEvent::PreviewSettled { ticket, outcome } => self.settle_preview(ticket, outcome),
            SessionEvent::DismissPreview => {
                self.surfaces.dismiss_preview();
                None
            }
            SessionEvent::Escape => {
                self.surfaces.escape();
                None
            }
            SessionEvent::InsertMarkup(html) => {
                self.insert_host_markup(html);
                None
            }
            SessionEvent::SetCursor(index) => {
                self.document.set_cursor(index);
                None
            }
            SessionEvent::Undo => self.step_history(true),
            SessionEvent::Redo => self.step_history(false),
            SessionEvent::CommandCompleted(name) => {
                self.after_command(&name);
                None
            }
        }
    }

    fn toolbar_anchor(&self) -> Rect {
        self.viewport
            .toolbar_button_rect(commands::EMBED_TWEET)
            .unwrap_or_else(|| {
                debug!("No geometry for the embed toolbar button");
                Rect::default()
            })
    }

    fn insert_tweet(&mut self, raw: &str) -> Option<SessionOutcome> {
        let tweet = embedtweet_parser::parse(raw);
        let result = self.binder.insert(&tweet, &mut self.document, &mut self.history);
        self.surfaces.close_embed_input();

        match result {
            Ok(block) => Some(SessionOutcome::Inserted(block)),
            Err(err) => {
                warn!(error = %err, "Tweet insertion failed");
                None
            }
        }
    }

    fn open_edit_actions(&mut self, id: &BlockId) {
        let Some(instance) = self.document.instance_of(id) else {
            debug!(block_id = %id, "Edit popup requested for a block not in the document");
            return;
        };

        let anchor = self.viewport.block_rect(id).unwrap_or_else(|| {
            debug!(block_id = %id, "No geometry for block");
            Rect::default()
        });

        self.surfaces.open_edit_actions(BlockRef { id: id.clone(), instance }, anchor);
    }

    fn delete_selected(&mut self) -> Option<SessionOutcome> {
        if self.surfaces.state() != SurfaceState::EditActions {
            debug!("Delete ignored: edit popup is not open");
            return None;
        }
        let Some(selection) = self.surfaces.take_selection() else {
            debug!("Delete ignored: no active selection");
            return None;
        };

        match self.binder.delete(selection, &mut self.document, &mut self.history) {
            Ok(block) => Some(SessionOutcome::Deleted(block)),
            Err(err) => {
                warn!(error = %err, "Tweet deletion failed");
                None
            }
        }
    }

    fn request_preview(&mut self) {
        if self.surfaces.state() != SurfaceState::EditActions {
            debug!("Preview ignored: edit popup is not open");
            return;
        }
        let Some(block_id) = self.surfaces.selection().map(|s| s.block.id.clone()) else {
            debug!("Preview ignored: no active selection");
            return;
        };

        let tweet_id = self.document.block(&block_id).and_then(|block| block.tweet_id.clone());
        let Some(tweet_id) = tweet_id else {
            warn!(block_id = %block_id, "Block has no tweet id; nothing to preview");
            self.surfaces.close_edit_actions();
            return;
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            error!(block_id = %block_id, "No async runtime; preview unavailable");
            self.surfaces.close_edit_actions();
            self.surfaces.record_preview_error(RenderError::NoRuntime);
            return;
        };

        let Some(pending) = self.surfaces.begin_preview() else {
            return;
        };

        let render = self.renderer.render(
            &tweet_id,
            RenderOptions {
                alignment: self.config.alignment,
            },
        );
        let timeout = self.config.preview_timeout();
        let completions = self.completions_tx.clone();
        let ticket = pending.ticket;

        runtime.spawn(async move {
            let outcome = render_with_timeout(render, timeout).await;
            if completions.send(SessionEvent::PreviewSettled { ticket, outcome }).is_err() {
                debug!("Session ended before the preview settled");
            }
        });
    }

    fn settle_preview(
        &mut self,
        ticket: PreviewTicket,
        outcome: Result<String, RenderError>,
    ) -> Option<SessionOutcome> {
        let Some(pending) = self.surfaces.settle(ticket) else {
            debug!(?ticket, "Completion for unknown preview request");
            return None;
        };

        match outcome {
            Ok(body) => {
                let block = self.document.instance_of(&pending.block.id).map(|instance| BlockRef {
                    id: pending.block.id.clone(),
                    instance,
                });
                self.surfaces.show_preview(body, block);
                Some(SessionOutcome::PreviewShown)
            }
            Err(err) => {
                warn!(block_id = %pending.block.id, error = %err, "Preview render failed");
                self.surfaces.record_preview_error(err);
                None
            }
        }
    }

    fn insert_host_markup(&mut self, html: String) {
        let mutation = Mutation::InsertNode {
            index: self.document.cursor(),
            content: NodeContent::markup(html),
        };

        if let Err(err) = self.history.apply(mutation, &mut self.document) {
            warn!(error = %err, "Markup insertion failed");
        }
    }

    fn step_history(&mut self, undo: bool) -> Option<SessionOutcome> {
        let moved = if undo {
            self.history.undo(&mut self.document)
        } else {
            self.history.redo(&mut self.document)
        };

        match moved {
            Ok(true) => Some(SessionOutcome::HistoryMoved),
            Ok(false) => None,
            Err(err) => {
                warn!(error = %err, undo, "History step failed");
                None
            }
        }
    }

    /// Undo and redo replace nodes, so every block needs its handler again
    /// and the selection may point at a node that is gone
    fn after_command(&mut self, name: &str) {
        if name != commands::UNDO && name != commands::REDO {
            return;
        }

        self.binder.rebind_all(&self.document);

        let document = &self.document;
        self.surfaces.reconcile(|block| {
            document.instance_of(&block.id).map(|instance| BlockRef {
                id: block.id.clone(),
                instance,
            })
        });
    }
}

fn inserted(outcomes: Vec<SessionOutcome>) -> Option<EmbeddedBlock> {
    outcomes.into_iter().find_map(|outcome| match outcome {
        SessionOutcome::Inserted(block) => Some(block),
        _ => None,
    })
}
