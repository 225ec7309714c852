//! Overlay position calculator: pure geometry, no widget state.
//!
//! All quantities are abstract integer units in document space. The grid
//! feeds terminal rows/columns through the same functions the tests feed
//! pixel-sized numbers through; the policy is unit-agnostic.

/// Measured geometry of the anchor field, viewport-relative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorRect {
    pub top: i32,
    pub left: i32,
    pub width: i32,
    pub height: i32,
}

impl AnchorRect {
    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }

    pub fn contains(&self, row: i32, col: i32) -> bool {
        row >= self.top && row < self.bottom() && col >= self.left && col < self.left + self.width
    }
}

/// Scroll offset converting viewport coordinates to document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollOffset {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementMetrics {
    /// Space between the anchor and the overlay edge.
    pub gap: i32,
    /// Keep the overlay this far off the document edge.
    pub edge_buffer: i32,
    /// Fixed-height helper/footer rendered below the editor.
    pub helper_height: i32,
    /// Height of one content line.
    pub line_unit: i32,
    /// Chrome around the content (borders, padding).
    pub padding: i32,
    pub min_height: i32,
    pub max_height: i32,
}

impl Default for PlacementMetrics {
    fn default() -> Self {
        Self {
            gap: 4,
            edge_buffer: 20,
            helper_height: 0,
            line_unit: 1,
            padding: 0,
            min_height: 1,
            max_height: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayPos {
    /// Document-relative top of the overlay.
    pub top: i32,
    pub left: i32,
    /// True when the overlay was flipped above the anchor.
    pub above: bool,
}

/// Content-driven overlay height: one unit per line plus chrome, clamped.
/// Content beyond `max_height` scrolls inside the overlay instead of
/// growing it.
pub fn desired_height(content: &str, metrics: &PlacementMetrics) -> i32 {
    let lines = content.matches('\n').count() as i32 + 1;
    (lines * metrics.line_unit + metrics.padding).clamp(metrics.min_height, metrics.max_height)
}

/// Decide above/below placement for an overlay of `overlay_height` anchored
/// at `anchor`. The overlay left-aligns with the anchor; it flips above when
/// the span below the anchor would run past the document edge (minus the
/// edge buffer). Callers re-run this at open time and on viewport resize,
/// never on scroll; document-relative output already tracks the page.
pub fn compute_position(
    anchor: AnchorRect,
    document_height: i32,
    scroll: ScrollOffset,
    overlay_height: i32,
    metrics: &PlacementMetrics,
) -> OverlayPos {
    let left = anchor.left + scroll.x;
    let top = anchor.top + scroll.y;
    let bottom = top + anchor.height;
    let total_span = overlay_height + metrics.gap + metrics.helper_height;

    if bottom + metrics.gap + total_span + metrics.edge_buffer > document_height {
        OverlayPos {
            top: top - total_span - metrics.gap,
            left,
            above: true,
        }
    } else {
        OverlayPos {
            top: bottom + metrics.gap,
            left,
            above: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor_with_bottom(bottom: i32) -> AnchorRect {
        AnchorRect {
            top: bottom - 20,
            left: 40,
            width: 120,
            height: 20,
        }
    }

    #[test]
    fn tight_document_places_above() {
        // bottom 900 + gap 4 + span (246 + 4) + buffer 20 = 1174 > 1000
        let pos = compute_position(
            anchor_with_bottom(900),
            1000,
            ScrollOffset::default(),
            246,
            &PlacementMetrics {
                max_height: 400,
                ..PlacementMetrics::default()
            },
        );
        assert!(pos.above);
        assert_eq!(pos.top, 880 - 250 - 4);
    }

    #[test]
    fn tall_document_places_below() {
        let pos = compute_position(
            anchor_with_bottom(900),
            2000,
            ScrollOffset::default(),
            246,
            &PlacementMetrics {
                max_height: 400,
                ..PlacementMetrics::default()
            },
        );
        assert!(!pos.above);
        assert_eq!(pos.top, 904);
    }

    #[test]
    fn left_edge_tracks_anchor_plus_scroll() {
        let pos = compute_position(
            anchor_with_bottom(100),
            2000,
            ScrollOffset { x: 15, y: 300 },
            50,
            &PlacementMetrics {
                max_height: 400,
                ..PlacementMetrics::default()
            },
        );
        assert_eq!(pos.left, 55);
        // Anchor bottom in document space is 100 + 300.
        assert_eq!(pos.top, 404);
    }

    #[test]
    fn helper_height_counts_toward_the_span() {
        let metrics = PlacementMetrics {
            helper_height: 30,
            max_height: 400,
            ..PlacementMetrics::default()
        };
        // 900 + 4 + (216 + 4 + 30) + 20 = 1174 > 1000
        let pos = compute_position(
            anchor_with_bottom(900),
            1000,
            ScrollOffset::default(),
            216,
            &metrics,
        );
        assert!(pos.above);
    }

    #[test]
    fn desired_height_clamps_between_min_and_max() {
        let metrics = PlacementMetrics {
            line_unit: 1,
            padding: 2,
            min_height: 3,
            max_height: 8,
            ..PlacementMetrics::default()
        };
        assert_eq!(desired_height("one line", &metrics), 3);
        assert_eq!(desired_height("a\nb\nc\nd", &metrics), 6);
        assert_eq!(desired_height(&"x\n".repeat(30), &metrics), 8);
    }
}
