use serde::{Deserialize, Serialize};

use crate::shared::settings::Settings;

/// Viewport coordinates, CSS-pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Modifier key state carried on keyboard and pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        meta: false,
    };
}

/// Raw input consumed from the hosting page.
#[derive(Debug, Clone)]
pub enum InputEvent {
    PointerMove { x: f64, y: f64 },
    PointerLeave,
    KeyDown(Modifiers),
    KeyUp(Modifiers),
    SelectionChanged,
    SettingsChanged(Settings),
}

/// Where an extracted span came from; drives popup anchoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanOrigin {
    /// Active text selection; anchor is the selection rect's bottom-left.
    Selection,
    /// Word under the pointer; anchor is the raw pointer position.
    Pointer,
}

/// A candidate text span with its popup anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub origin: SpanOrigin,
    pub anchor: Point,
}
