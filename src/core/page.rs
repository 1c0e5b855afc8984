use crate::shared::types::Rect;

/// The active text selection on the page, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionInfo {
    /// Raw selection string, untrimmed.
    pub text: String,
    /// Bounding rectangle of the selection range, viewport coordinates.
    pub rect: Rect,
}

/// A text run hit by a point, with the byte offset of the hit inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct TextHit {
    pub text: String,
    pub offset: usize,
}

/// Read-only view of the hosting page. The engine never touches the document
/// directly; a host adapter implements this over the real DOM (or a simulation
/// in tests).
pub trait PageSurface: Send + Sync {
    fn selection(&self) -> Option<SelectionInfo>;

    /// Locate the text node content under the point and the byte offset of the
    /// caret position within it. None when the point hits no text.
    fn hit_test(&self, x: f64, y: f64) -> Option<TextHit>;

    /// Tear the content surface down and start over. Invoked when the backend
    /// transport reports its context as invalidated.
    fn reload(&self);
}
