//! CSS Float Layout.
//!
//! [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
//!
//! "A float is a box that is shifted to the left or right on the current line.
//! The most interesting characteristic of a float is that content may flow along
//! its side (or be prohibited from doing so by the 'clear' property)."
//!
//! All rectangles here are margin boxes in coordinates relative to the
//! content origin of the block formatting context root that owns the
//! context. Callers translate with [`FloatContext::origin_x`] and
//! [`FloatContext::origin_y`].

use quire_style::{Clear, FloatMode};
use serde::Serialize;

/// The side a float is pushed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FloatSide {
    /// "The element generates a block box that is floated to the left."
    Left,
    /// "The element generates a block box that is floated to the right."
    Right,
}

impl FloatSide {
    /// The side for a computed `float` value; `None` for `float: none`.
    #[must_use]
    pub const fn from_mode(mode: FloatMode) -> Option<Self> {
        match mode {
            FloatMode::Left => Some(Self::Left),
            FloatMode::Right => Some(Self::Right),
            FloatMode::None => None,
        }
    }
}

/// Margin-box extents of a placed float, in block/inline axis terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FloatRect {
    /// Block-start edge.
    pub top: f32,
    /// Block-end edge.
    pub bottom: f32,
    /// Inline-start edge.
    pub inline_start: f32,
    /// Inline-end edge.
    pub inline_end: f32,
}

impl FloatRect {
    /// Inline size of the margin box.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.inline_end - self.inline_start
    }

    /// Block size of the margin box.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Whether the float's block range intersects `[top, bottom)`.
    #[must_use]
    pub fn overlaps(&self, top: f32, bottom: f32) -> bool {
        self.top.max(top) < self.bottom.min(bottom)
    }
}

/// Tracks placed floats within one block formatting context.
///
/// [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
///
/// "Since a float is not in the flow, non-positioned block boxes created
/// before and after the float box flow vertically as if the float did not
/// exist. However, the current and subsequent line boxes created next to
/// the float are shortened as necessary to make room for the margin box
/// of the float."
///
/// Append-only: a float is visible to content laid out after it and never
/// to earlier content.
#[derive(Debug, Clone, Default)]
pub struct FloatContext {
    /// Absolute x of the BFC root's content box.
    pub origin_x: f32,
    /// Absolute y of the BFC root's content box.
    pub origin_y: f32,
    /// Content width of the BFC root.
    pub inline_size: f32,
    floats: Vec<(FloatSide, FloatRect)>,
}

impl FloatContext {
    /// An empty context for a BFC root whose content box starts at
    /// `(origin_x, origin_y)`.
    #[must_use]
    pub const fn new(origin_x: f32, origin_y: f32, inline_size: f32) -> Self {
        Self {
            origin_x,
            origin_y,
            inline_size,
            floats: Vec::new(),
        }
    }

    /// Returns true if no float has been placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.floats.is_empty()
    }

    /// Placed floats in placement order.
    #[must_use]
    pub fn floats(&self) -> &[(FloatSide, FloatRect)] {
        &self.floats
    }

    /// Record an already-positioned float.
    pub fn register(&mut self, side: FloatSide, rect: FloatRect) {
        self.floats.push((side, rect));
    }

    fn overlapping(
        &self,
        side: FloatSide,
        top: f32,
        bottom: f32,
    ) -> impl Iterator<Item = &FloatRect> + '_ {
        self.floats
            .iter()
            .filter(move |(s, r)| *s == side && r.overlaps(top, bottom))
            .map(|(_, r)| r)
    }

    /// How far floats on `side` intrude into the context at `[top, bottom)`.
    ///
    /// For left floats this is the largest inline-end edge; for right
    /// floats, the distance from the smallest inline-start edge to the
    /// context's inline end. Zero when nothing overlaps.
    #[must_use]
    pub fn occupied_width(&self, side: FloatSide, top: f32, bottom: f32) -> f32 {
        match side {
            FloatSide::Left => self
                .overlapping(side, top, bottom)
                .map(|r| r.inline_end)
                .fold(0.0_f32, f32::max),
            FloatSide::Right => self
                .overlapping(side, top, bottom)
                .map(|r| self.inline_size - r.inline_start)
                .fold(0.0_f32, f32::max),
        }
    }

    /// Lowest bottom edge of the floats on `side`, or 0 when there are none.
    #[must_use]
    pub fn bottom(&self, side: FloatSide) -> f32 {
        self.floats
            .iter()
            .filter(|(s, _)| *s == side)
            .map(|(_, r)| r.bottom)
            .fold(0.0_f32, f32::max)
    }

    /// [§ 10.6.7 'Auto' heights for block formatting context roots](https://www.w3.org/TR/CSS2/visudet.html#root-height)
    ///
    /// "If the element has any floating descendants whose bottom margin edge
    /// is below the element's bottom content edge, then the height is
    /// increased to include those edges."
    #[must_use]
    pub fn max_bottom(&self) -> f32 {
        self.bottom(FloatSide::Left).max(self.bottom(FloatSide::Right))
    }

    /// Usable `(start, end)` inline range at `[top, bottom)` for a box
    /// spanning `[start, end)` when no floats are present.
    #[must_use]
    pub fn available_span(&self, top: f32, bottom: f32, start: f32, end: f32) -> (f32, f32) {
        let left_intrusion = self.occupied_width(FloatSide::Left, top, bottom);
        let right_intrusion = self.occupied_width(FloatSide::Right, top, bottom);
        let left = if left_intrusion > 0.0 {
            start.max(left_intrusion)
        } else {
            start
        };
        let right = if right_intrusion > 0.0 {
            end.min(self.inline_size - right_intrusion)
        } else {
            end
        };
        (left, right.max(left))
    }

    /// Usable inline start and end at `[top, bottom)` after subtracting
    /// floats on both sides from `[0, containing_width)`.
    #[must_use]
    pub fn inline_offsets(&self, top: f32, bottom: f32, containing_width: f32) -> (f32, f32) {
        self.available_span(top, bottom, 0.0, containing_width)
    }

    /// Nearest position below `top` where a float blocking the band
    /// `[top, bottom)` ends and gives its inline space back.
    ///
    /// Returns `top` when no float overlaps the band.
    #[must_use]
    pub fn next_unblocked_y(&self, top: f32, bottom: f32) -> f32 {
        self.floats
            .iter()
            .filter(|(_, r)| r.overlaps(top, bottom))
            .map(|(_, r)| r.bottom)
            .filter(|&float_bottom| float_bottom > top)
            .reduce(f32::min)
            .unwrap_or(top)
    }

    /// [§ 9.5.1 Positioning the float: the 'float' property](https://www.w3.org/TR/CSS2/visuren.html#float-position)
    ///
    /// Find a position for a float with the given margin-box size at or
    /// below `y` inside the inline range `[start, end)`, register it, and
    /// return its rectangle.
    ///
    /// - Rules 1 and 9: pushed as far toward its side as the range allows.
    /// - Rules 2, 3 and 7: no overlap with earlier floats.
    /// - Rule 5: not higher than any earlier float.
    /// - Rules 4 and 8: as high as possible.
    pub fn place(
        &mut self,
        side: FloatSide,
        width: f32,
        height: f32,
        y: f32,
        start: f32,
        end: f32,
    ) -> FloatRect {
        // STEP 1: Start at the highest allowed position.
        // [§ 9.5.1 Rule 5](https://www.w3.org/TR/CSS2/visuren.html#float-position)
        //
        // "The outer top of a floating box may not be higher than the outer
        // top of any block or floated box generated by an element earlier in
        // the source document."
        let earlier_top = self.floats.iter().map(|(_, r)| r.top).fold(y, f32::max);
        let mut top = earlier_top;

        // STEP 2: Scan downward, one float bottom at a time, until the
        // float fits beside the floats already there.
        let (left, right) = loop {
            let band_bottom = top + height.max(0.0);
            let (left, right) = self.available_span(top, band_bottom, start, end);
            let unobstructed = left <= start && right >= end;
            if right - left >= width || unobstructed {
                break (left, right);
            }
            let next = self.next_unblocked_y(top, band_bottom);
            if next <= top {
                // Nothing below to wait for; overflow the range.
                break (left, right);
            }
            top = next;
        };

        // STEP 3: Push the float toward its side.
        let inline_start = match side {
            FloatSide::Left => left,
            FloatSide::Right => (right - width).max(start),
        };
        let rect = FloatRect {
            top,
            bottom: top + height.max(0.0),
            inline_start,
            inline_end: inline_start + width,
        };
        self.register(side, rect);
        rect
    }

    /// [§ 9.5.2 Controlling flow next to floats: the 'clear' property](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
    ///
    /// "This property indicates which sides of an element's box(es) may not
    /// be adjacent to an earlier floating box."
    ///
    /// Returns `y` advanced past the floats on the cleared side(s).
    #[must_use]
    pub fn clear(&self, clear: Clear, y: f32) -> f32 {
        match clear {
            Clear::None => y,
            Clear::Left => y.max(self.bottom(FloatSide::Left)),
            Clear::Right => y.max(self.bottom(FloatSide::Right)),
            Clear::Both => y.max(self.max_bottom()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(top: f32, bottom: f32, inline_start: f32, inline_end: f32) -> FloatRect {
        FloatRect {
            top,
            bottom,
            inline_start,
            inline_end,
        }
    }

    #[test]
    fn test_occupied_width_only_counts_overlapping_floats() {
        let mut ctx = FloatContext::new(0.0, 0.0, 400.0);
        ctx.register(FloatSide::Left, rect(0.0, 50.0, 0.0, 120.0));
        ctx.register(FloatSide::Right, rect(20.0, 40.0, 300.0, 400.0));

        assert_eq!(ctx.occupied_width(FloatSide::Left, 10.0, 20.0), 120.0);
        assert_eq!(ctx.occupied_width(FloatSide::Right, 10.0, 20.0), 0.0);
        assert_eq!(ctx.occupied_width(FloatSide::Right, 10.0, 21.0), 100.0);
        // Touching edges do not overlap.
        assert_eq!(ctx.occupied_width(FloatSide::Left, 50.0, 60.0), 0.0);
        assert_eq!(ctx.inline_offsets(25.0, 30.0, 400.0), (120.0, 300.0));
    }

    #[test]
    fn test_available_span_keeps_range_without_floats() {
        let mut ctx = FloatContext::new(0.0, 0.0, 400.0);
        assert_eq!(ctx.available_span(0.0, 10.0, -20.0, 380.0), (-20.0, 380.0));

        ctx.register(FloatSide::Left, rect(0.0, 50.0, 0.0, 120.0));
        ctx.register(FloatSide::Right, rect(0.0, 50.0, 300.0, 400.0));
        assert_eq!(ctx.available_span(0.0, 10.0, 50.0, 350.0), (120.0, 300.0));
        assert_eq!(ctx.available_span(0.0, 10.0, 150.0, 250.0), (150.0, 250.0));
        assert_eq!(ctx.available_span(60.0, 70.0, 50.0, 350.0), (50.0, 350.0));
    }

    #[test]
    fn test_place_left_floats_side_by_side() {
        let mut ctx = FloatContext::new(0.0, 0.0, 300.0);
        let a = ctx.place(FloatSide::Left, 100.0, 40.0, 0.0, 0.0, 300.0);
        let b = ctx.place(FloatSide::Left, 100.0, 40.0, 0.0, 0.0, 300.0);
        assert_eq!(a, rect(0.0, 40.0, 0.0, 100.0));
        assert_eq!(b, rect(0.0, 40.0, 100.0, 200.0));
    }

    #[test]
    fn test_place_moves_down_when_no_room() {
        let mut ctx = FloatContext::new(0.0, 0.0, 300.0);
        let _ = ctx.place(FloatSide::Left, 200.0, 40.0, 0.0, 0.0, 300.0);
        let right = ctx.place(FloatSide::Right, 150.0, 20.0, 0.0, 0.0, 300.0);
        assert_eq!(right, rect(40.0, 60.0, 150.0, 300.0));
    }

    #[test]
    fn test_clear_and_next_unblocked() {
        let mut ctx = FloatContext::new(0.0, 0.0, 300.0);
        ctx.register(FloatSide::Left, rect(0.0, 30.0, 0.0, 50.0));
        ctx.register(FloatSide::Right, rect(0.0, 70.0, 250.0, 300.0));

        assert_eq!(ctx.clear(Clear::Left, 10.0), 30.0);
        assert_eq!(ctx.clear(Clear::Both, 10.0), 70.0);
        assert_eq!(ctx.clear(Clear::None, 10.0), 10.0);
        assert_eq!(ctx.next_unblocked_y(5.0, 15.0), 30.0);
        assert_eq!(ctx.next_unblocked_y(30.0, 45.0), 70.0);
        assert_eq!(ctx.next_unblocked_y(70.0, 90.0), 70.0);
    }
}
