//! Hover and click state for communities, the map's zoom and pan, and the
//! application state that owns them.
//!
//! UI events are turned into [`Message`]s and applied with
//! [`AppState::update`]; the caller re-renders afterwards.

use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

use crate::color::Colorizer;
use crate::error::StateError;
use crate::modes::TravelMode;

/// Interaction state of a single community.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Idle,
    Hovered,
    Selected,
    HoveredSelected,
}

impl EntityState {
    pub fn is_highlighted(self) -> bool {
        !matches!(self, EntityState::Idle)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionController {
    selected: BTreeSet<String>,
    hovered: BTreeSet<String>,
}

impl SelectionController {
    pub fn mouse_enter(&mut self, code: &str) {
        self.hovered.insert(code.to_string());
    }

    pub fn mouse_leave(&mut self, code: &str) {
        self.hovered.remove(code);
    }

    /// Toggles selection. Deselecting also drops the hover so the community
    /// shows its bucket colour straight away.
    pub fn click(&mut self, code: &str) {
        if !self.selected.remove(code) {
            self.selected.insert(code.to_string());
        } else {
            self.hovered.remove(code);
        }
    }

    pub fn reset(&mut self) {
        self.selected.clear();
        self.hovered.clear();
    }

    pub fn state(&self, code: &str) -> EntityState {
        match (self.hovered.contains(code), self.selected.contains(code)) {
            (false, false) => EntityState::Idle,
            (true, false) => EntityState::Hovered,
            (false, true) => EntityState::Selected,
            (true, true) => EntityState::HoveredSelected,
        }
    }

    pub fn is_highlighted(&self, code: &str) -> bool {
        self.state(code).is_highlighted()
    }

    pub fn selected(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }
}

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 8.0;

/// Pan and zoom of the community group: a map point `p` is drawn at
/// `k * p + (x, y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl ZoomTransform {
    pub const IDENTITY: Self = Self {
        k: 1.0,
        x: 0.0,
        y: 0.0,
    };

    /// Clamps `k` to [`MIN_ZOOM`]..=[`MAX_ZOOM`]. Non-finite values take the
    /// identity's.
    pub fn new(k: f64, x: f64, y: f64) -> Self {
        let finite_or = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };
        Self {
            k: finite_or(k, 1.0).clamp(MIN_ZOOM, MAX_ZOOM),
            x: finite_or(x, 0.0),
            y: finite_or(y, 0.0),
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// SVG `transform` attribute value.
impl fmt::Display for ZoomTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "translate({},{}) scale({})", self.x, self.y, self.k)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    MouseEnter(String),
    MouseLeave(String),
    Click(String),
    ChangeMode(TravelMode),
    Zoom(ZoomTransform),
    Reset,
}

/// Everything a render needs besides the data itself.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub mode: TravelMode,
    pub selection: SelectionController,
    pub zoom: ZoomTransform,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(TravelMode::Bicycle)
    }
}

impl AppState {
    pub fn new(mode: TravelMode) -> Self {
        Self {
            mode,
            selection: SelectionController::default(),
            zoom: ZoomTransform::IDENTITY,
        }
    }

    /// Applies one message. Mode changes keep the current selection and are
    /// rejected for modes the colorizer cannot map. Reset clears the
    /// selection and restores the identity zoom.
    pub fn update(&mut self, msg: Message, colorizer: &Colorizer) -> Result<(), StateError> {
        debug!(?msg, "Applying message");
        match msg {
            Message::MouseEnter(code) => self.selection.mouse_enter(&code),
            Message::MouseLeave(code) => self.selection.mouse_leave(&code),
            Message::Click(code) => self.selection.click(&code),
            Message::ChangeMode(mode) => {
                if !colorizer.has_palette(mode) {
                    return Err(StateError::UnmappableMode(mode));
                }
                self.mode = mode;
            }
            Message::Zoom(t) => self.zoom = ZoomTransform::new(t.k, t.x, t.y),
            Message::Reset => {
                self.selection.reset();
                self.zoom = ZoomTransform::IDENTITY;
            }
        }
        Ok(())
    }
}
