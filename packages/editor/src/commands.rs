//! Named commands the host editor registers for the tweet plugin, and the
//! button rows shown in each popup.

use crate::errors::EditorError;

/// Toolbar button that opens the embed popup
pub const EMBED_TWEET: &str = "embedTweet";
pub const EMBED_POPUP_CLOSE: &str = "embedPopupClose";
pub const EMBED_INSERT: &str = "embedInsert";
pub const EDIT_POPUP_CLOSE: &str = "editPopupClose";
pub const DELETE_TWEET: &str = "deleteTweet";
pub const PREVIEW_TWEET: &str = "previewTweet";

/// Host history commands
pub const UNDO: &str = "undo";
pub const REDO: &str = "redo";

/// Separator entry in popup button lists
pub const SEPARATOR: &str = "|";

/// Registration descriptor for one command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub title: &'static str,
    pub icon: &'static str,
    /// Whether running the command records an undo step
    pub undo: bool,
    /// Whether the editor regains focus afterwards
    pub focus: bool,
}

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec { name: EMBED_TWEET, title: "Embed Tweet", icon: "twitter", undo: false, focus: false },
    CommandSpec { name: EMBED_POPUP_CLOSE, title: "Close", icon: "times", undo: false, focus: false },
    CommandSpec { name: EMBED_INSERT, title: "Insert", icon: "sign-in", undo: true, focus: true },
    CommandSpec { name: EDIT_POPUP_CLOSE, title: "Close", icon: "times", undo: false, focus: false },
    CommandSpec { name: DELETE_TWEET, title: "Delete", icon: "trash", undo: true, focus: true },
    CommandSpec { name: PREVIEW_TWEET, title: "Preview", icon: "eye", undo: false, focus: false },
    CommandSpec { name: UNDO, title: "Undo", icon: "rotate-left", undo: false, focus: true },
    CommandSpec { name: REDO, title: "Redo", icon: "rotate-right", undo: false, focus: true },
];

pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

/// One entry of a popup's button row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupButton {
    Command(&'static CommandSpec),
    Separator,
}

/// Resolve a configured button list against the registry
pub fn resolve_buttons(names: &[String]) -> Result<Vec<PopupButton>, EditorError> {
    names
        .iter()
        .map(|name| match name.as_str() {
            SEPARATOR => Ok(PopupButton::Separator),
            other => lookup(other)
                .map(PopupButton::Command)
                .ok_or_else(|| EditorError::UnknownCommand(other.to_string())),
        })
        .collect()
}
