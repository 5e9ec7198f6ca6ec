use crate::commands::{self, resolve_buttons};
use crate::errors::EditorError;
use crate::preview::Alignment;
use embedtweet_common::ToolbarPosition;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "embedtweet.config.json";

/// Tweet embedding configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedConfig {
    /// Where the editor toolbar sits; decides which way popups open
    #[serde(default)]
    pub toolbar_position: ToolbarPosition,

    /// Vertical distance between a popup and the edge of its anchor
    #[serde(default = "default_popup_offset")]
    pub popup_offset: f64,

    /// Alignment passed to the preview renderer
    #[serde(default)]
    pub alignment: Alignment,

    /// Give up on a preview render after this long. No limit when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_timeout_ms: Option<u64>,

    /// Maximum undo levels (0 = unlimited)
    #[serde(default = "default_undo_levels")]
    pub undo_levels: usize,

    #[serde(default = "default_embed_popup_buttons")]
    pub embed_popup_buttons: Vec<String>,

    #[serde(default = "default_edit_popup_buttons")]
    pub edit_popup_buttons: Vec<String>,
}

fn default_popup_offset() -> f64 {
    10.0
}

fn default_undo_levels() -> usize {
    100
}

fn default_embed_popup_buttons() -> Vec<String> {
    vec![
        commands::EMBED_POPUP_CLOSE.to_string(),
        commands::SEPARATOR.to_string(),
        commands::EMBED_INSERT.to_string(),
    ]
}

fn default_edit_popup_buttons() -> Vec<String> {
    vec![
        commands::EDIT_POPUP_CLOSE.to_string(),
        commands::SEPARATOR.to_string(),
        commands::DELETE_TWEET.to_string(),
        commands::PREVIEW_TWEET.to_string(),
    ]
}

impl EmbedConfig {
    /// Load config from a directory, falling back to defaults when the file
    /// does not exist
    pub fn load(dir: &Path) -> Result<Self, EditorError> {
        let config_path = dir.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            Self::from_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, EditorError> {
        let content = std::fs::read_to_string(path)?;
        let config: EmbedConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EditorError> {
        if !self.popup_offset.is_finite() {
            return Err(EditorError::InvalidConfig("popupOffset must be a finite number".to_string()));
        }

        resolve_buttons(&self.embed_popup_buttons)?;
        resolve_buttons(&self.edit_popup_buttons)?;
        Ok(())
    }

    pub fn preview_timeout(&self) -> Option<Duration> {
        self.preview_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            toolbar_position: ToolbarPosition::default(),
            popup_offset: default_popup_offset(),
            alignment: Alignment::default(),
            preview_timeout_ms: None,
            undo_levels: default_undo_levels(),
            embed_popup_buttons: default_embed_popup_buttons(),
            edit_popup_buttons: default_edit_popup_buttons(),
        }
    }
}
