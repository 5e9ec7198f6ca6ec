use crate::ids::BlockId;
use serde::{Deserialize, Serialize};

/// Screen rectangle of an element, in page coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Horizontal center of the rectangle
    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }
}

/// Where the host editor renders its toolbar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolbarPosition {
    #[default]
    Top,
    Bottom,
}

/// Which side of its anchor a popup opens on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PopupDirection {
    Below,
    Above,
}

/// Resolved popup position relative to an anchor element
///
/// `anchor_height` is handed to the host so it can flip the popup to the
/// other side when there is no room in the requested direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub left: f64,
    pub top: f64,
    pub anchor_height: f64,
    pub direction: PopupDirection,
}

impl Placement {
    /// Anchor a popup to `rect`.
    ///
    /// With a top toolbar the popup hangs just inside the bottom edge of the
    /// anchor and opens downwards. With a bottom toolbar it sits just inside
    /// the top edge and opens upwards, so it never leaves the visible area
    /// above the anchor.
    pub fn anchored_to(rect: Rect, toolbar: ToolbarPosition, offset: f64) -> Self {
        let (top, direction) = match toolbar {
            ToolbarPosition::Top => (rect.top + rect.height - offset, PopupDirection::Below),
            ToolbarPosition::Bottom => (rect.top + offset, PopupDirection::Above),
        };

        Self {
            left: rect.center_x(),
            top,
            anchor_height: rect.height,
            direction,
        }
    }
}

/// Geometry queries answered by the host page
pub trait Viewport {
    /// Screen rectangle of the toolbar button bound to `command`
    fn toolbar_button_rect(&self, command: &str) -> Option<Rect>;

    /// Screen rectangle of the embedded block with the given id
    fn block_rect(&self, block: &BlockId) -> Option<Rect>;
}

/// Viewport that knows no geometry; every popup lands at the origin
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedViewport;

impl Viewport for DetachedViewport {
    fn toolbar_button_rect(&self, _command: &str) -> Option<Rect> {
        None
    }

    fn block_rect(&self, _block: &BlockId) -> Option<Rect> {
        None
    }
}
