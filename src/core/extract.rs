use std::sync::OnceLock;

use regex::Regex;

use crate::core::page::PageSurface;
use crate::shared::types::{Point, Span, SpanOrigin};

/// Vertical gap between a selection's bounding box and the popup.
pub const SELECTION_MARGIN: f64 = 5.0;

fn word_before() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\p{L}\p{N}_\-]+$").expect("valid word regex"))
}

fn word_after() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\p{L}\p{N}_\-]+").expect("valid word regex"))
}

/// Expand left and right from a byte offset inside a text run, collecting the
/// maximal contiguous run of letter/digit/underscore/hyphen characters that
/// straddles the offset. Returns an empty string when the offset touches no
/// word character.
pub fn word_at(text: &str, offset: usize) -> String {
    let mut offset = offset.min(text.len());
    while offset > 0 && !text.is_char_boundary(offset) {
        offset -= 1;
    }

    let before = word_before()
        .find(&text[..offset])
        .map(|m| m.as_str())
        .unwrap_or("");
    let after = word_after()
        .find(&text[offset..])
        .map(|m| m.as_str())
        .unwrap_or("");

    format!("{}{}", before, after)
}

/// Resolve the candidate span for a pointer position: an active non-empty
/// selection wins and anchors the popup below its bounding box; otherwise the
/// word under the pointer anchors at the pointer itself. None means suppress.
pub fn span_at(page: &dyn PageSurface, x: f64, y: f64) -> Option<Span> {
    if let Some(selection) = page.selection() {
        let text = selection.text.trim();
        if !text.is_empty() {
            return Some(Span {
                text: text.to_string(),
                origin: SpanOrigin::Selection,
                anchor: Point::new(selection.rect.left, selection.rect.bottom + SELECTION_MARGIN),
            });
        }
    }

    let hit = page.hit_test(x, y)?;
    let word = word_at(&hit.text, hit.offset);
    if word.is_empty() {
        return None;
    }
    Some(Span {
        text: word,
        origin: SpanOrigin::Pointer,
        anchor: Point::new(x, y),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::page::{SelectionInfo, TextHit};
    use crate::shared::types::Rect;

    struct FakePage {
        selection: Option<SelectionInfo>,
        hit: Option<TextHit>,
    }

    impl PageSurface for FakePage {
        fn selection(&self) -> Option<SelectionInfo> {
            self.selection.clone()
        }

        fn hit_test(&self, _x: f64, _y: f64) -> Option<TextHit> {
            self.hit.clone()
        }

        fn reload(&self) {}
    }

    #[test]
    fn test_word_at_expands_across_hyphen() {
        let text = "say hello-world now";
        // Offset at the hyphen itself.
        assert_eq!(word_at(text, 9), "hello-world");
        // Offset in the middle of either half.
        assert_eq!(word_at(text, 6), "hello-world");
        assert_eq!(word_at(text, 12), "hello-world");
    }

    #[test]
    fn test_word_at_stops_at_non_word_chars() {
        assert_eq!(word_at("one two three", 5), "two");
        assert_eq!(word_at("foo_bar, baz", 2), "foo_bar");
        assert_eq!(word_at("x(y)z", 3), "y");
    }

    #[test]
    fn test_word_at_whitespace_yields_empty() {
        assert_eq!(word_at("one  two", 4), "");
        assert_eq!(word_at("", 0), "");
    }

    #[test]
    fn test_word_at_boundary_offset_keeps_adjacent_word() {
        // An offset right after the last character still touches the word.
        assert_eq!(word_at("one two", 3), "one");
        assert_eq!(word_at("one two", 4), "two");
    }

    #[test]
    fn test_word_at_unicode() {
        let text = "un café noir";
        assert_eq!(word_at(text, 5), "café");
        // Offset landing inside the multi-byte 'é' snaps to a boundary.
        assert_eq!(word_at(text, 7), "café");
    }

    #[test]
    fn test_word_at_offset_past_end() {
        assert_eq!(word_at("word", 99), "word");
    }

    #[test]
    fn test_span_at_prefers_selection() {
        let page = FakePage {
            selection: Some(SelectionInfo {
                text: "  bonjour le monde  ".to_string(),
                rect: Rect {
                    left: 40.0,
                    top: 10.0,
                    right: 120.0,
                    bottom: 30.0,
                },
            }),
            hit: Some(TextHit {
                text: "ignored".to_string(),
                offset: 2,
            }),
        };
        let span = span_at(&page, 0.0, 0.0).unwrap();
        assert_eq!(span.text, "bonjour le monde");
        assert_eq!(span.origin, SpanOrigin::Selection);
        assert_eq!(span.anchor, Point::new(40.0, 35.0));
    }

    #[test]
    fn test_span_at_empty_selection_falls_back_to_word() {
        let page = FakePage {
            selection: Some(SelectionInfo {
                text: "   ".to_string(),
                rect: Rect::default(),
            }),
            hit: Some(TextHit {
                text: "hover target".to_string(),
                offset: 1,
            }),
        };
        let span = span_at(&page, 12.0, 34.0).unwrap();
        assert_eq!(span.text, "hover");
        assert_eq!(span.origin, SpanOrigin::Pointer);
        assert_eq!(span.anchor, Point::new(12.0, 34.0));
    }

    #[test]
    fn test_span_at_suppresses_when_nothing_hit() {
        let page = FakePage {
            selection: None,
            hit: None,
        };
        assert!(span_at(&page, 0.0, 0.0).is_none());

        let page = FakePage {
            selection: None,
            hit: Some(TextHit {
                text: " .. ".to_string(),
                offset: 2,
            }),
        };
        assert!(span_at(&page, 0.0, 0.0).is_none());
    }
}
