//! # Tweet Preview
//!
//! The preview surface is a modal dialog whose body is produced by an
//! external renderer. Rendering is the one asynchronous step in the editing
//! flow: the session spawns it as a task and resumes the surface transition
//! when the result comes back through its completion channel.

use embedtweet_parser::TweetId;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Horizontal alignment requested from the renderer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub alignment: Alignment,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Render failed: {0}")]
    Failed(String),

    #[error("Render timed out after {0:?}")]
    TimedOut(Duration),

    #[error("No async runtime available to render the preview")]
    NoRuntime,
}

/// Third-party widget renderer used for previews
pub trait TweetRenderer: Send + Sync {
    /// Render the tweet and resolve with the preview body markup
    fn render(&self, tweet_id: &TweetId, options: RenderOptions) -> BoxFuture<'static, Result<String, RenderError>>;
}

/// Await a render, giving up after `timeout` when one is set
pub(crate) async fn render_with_timeout<F>(render: F, timeout: Option<Duration>) -> Result<String, RenderError>
where
    F: Future<Output = Result<String, RenderError>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, render)
            .await
            .unwrap_or(Err(RenderError::TimedOut(limit))),
        None => render.await,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalOptions {
    pub initially_visible: bool,
    pub dismiss_on_escape: bool,
}

impl Default for ModalOptions {
    fn default() -> Self {
        Self {
            initially_visible: false,
            dismiss_on_escape: true,
        }
    }
}

/// Modal dialog hosting the rendered preview
#[derive(Debug, Clone)]
pub struct PreviewModal {
    options: ModalOptions,
    visible: bool,
    body: String,
}

impl PreviewModal {
    pub fn new(options: ModalOptions) -> Self {
        Self {
            options,
            visible: options.initially_visible,
            body: String::new(),
        }
    }

    /// Replace the body and show the dialog
    pub fn show(&mut self, body: String) {
        self.body = body;
        self.visible = true;
    }

    /// Hide the dialog and empty its body
    pub fn hide(&mut self) {
        self.visible = false;
        self.body.clear();
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn dismisses_on_escape(&self) -> bool {
        self.options.dismiss_on_escape
    }
}
