//! Used values of box-model properties.
//!
//! [§ 6.1 Used Values](https://www.w3.org/TR/css-cascade-4/#used)
//!
//! "The used value is the result of taking the computed value and
//! completing any remaining calculations to make it the absolute
//! theoretical value used in the layout of the document."

use quire_style::length::non_negative;
use quire_style::{AutoLength, BoxSizing, ComputedStyle, LengthContext, LengthValue};
use quire_tree::EdgeSizes;

use crate::context::Viewport;

/// [§ 4.4 Automatic values](https://www.w3.org/TR/CSS2/cascade.html#value-def-auto)
///
/// "Some properties can take the keyword 'auto' as a value. This keyword
/// allows the user agent to compute the value based on other properties."
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum AutoOr {
    /// The value is 'auto' and must be resolved during layout.
    #[default]
    Auto,
    /// The value is a specific length in pixels.
    Length(f32),
}

impl AutoOr {
    /// Check if the value is 'auto'.
    #[must_use]
    pub const fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }

    /// Get the length value, or a default if 'auto'.
    #[must_use]
    pub const fn to_px_or(&self, default: f32) -> f32 {
        match self {
            Self::Length(v) => *v,
            Self::Auto => default,
        }
    }
}

/// Edge values where each side can be 'auto' or a length. Used for margins
/// and for the `top`/`right`/`bottom`/`left` offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AutoEdgeSizes {
    /// Top edge value.
    pub top: AutoOr,
    /// Right edge value.
    pub right: AutoOr,
    /// Bottom edge value.
    pub bottom: AutoOr,
    /// Left edge value.
    pub left: AutoOr,
}

impl AutoEdgeSizes {
    /// Replace `auto` with 0 on every side.
    #[must_use]
    pub const fn or_zero(&self) -> EdgeSizes {
        EdgeSizes {
            top: self.top.to_px_or(0.0),
            right: self.right.to_px_or(0.0),
            bottom: self.bottom.to_px_or(0.0),
            left: self.left.to_px_or(0.0),
        }
    }
}

/// Length resolution context for a box: its own font size, the root font
/// size and the viewport.
#[must_use]
pub fn length_context(style: &ComputedStyle, viewport: Viewport, root_font_size: f32) -> LengthContext {
    LengthContext {
        font_size: non_negative(style.font_size),
        root_font_size,
        viewport_width: viewport.width,
        viewport_height: viewport.height,
    }
}

/// Resolves one box's computed values against its containing block.
#[derive(Debug, Clone, Copy)]
pub struct UsedValues<'a> {
    /// The box's computed style.
    pub style: &'a ComputedStyle,
    /// Font and viewport for relative units.
    pub lengths: LengthContext,
    /// Containing block width.
    ///
    /// [§ 8.3 Margin properties](https://www.w3.org/TR/CSS2/box.html#margin-properties)
    ///
    /// "The percentage is calculated with respect to the width of the
    /// generated box's containing block. Note that this is true for
    /// 'margin-top' and 'margin-bottom' as well."
    pub cb_width: f32,
    /// Containing block height, when definite.
    pub cb_height: Option<f32>,
}

impl<'a> UsedValues<'a> {
    /// Resolve `style` against a containing block of the given size.
    #[must_use]
    pub fn new(
        style: &'a ComputedStyle,
        cb_width: f32,
        cb_height: Option<f32>,
        viewport: Viewport,
        root_font_size: f32,
    ) -> Self {
        Self {
            style,
            lengths: length_context(style, viewport, root_font_size),
            cb_width: non_negative(cb_width),
            cb_height: cb_height.map(non_negative),
        }
    }

    fn auto_length(&self, value: AutoLength, basis: Option<f32>) -> AutoOr {
        value
            .resolve(basis, &self.lengths)
            .map_or(AutoOr::Auto, AutoOr::Length)
    }

    /// Margins; `auto` is kept for the width and offset equations.
    #[must_use]
    pub fn margin(&self) -> AutoEdgeSizes {
        let margin = self.style.margin();
        let basis = Some(self.cb_width);
        AutoEdgeSizes {
            top: self.auto_length(margin.top, basis),
            right: self.auto_length(margin.right, basis),
            bottom: self.auto_length(margin.bottom, basis),
            left: self.auto_length(margin.left, basis),
        }
    }

    /// [§ 8.4 Padding properties](https://www.w3.org/TR/CSS2/box.html#padding-properties)
    ///
    /// "Unlike margin properties, values for padding values cannot be
    /// negative."
    #[must_use]
    pub fn padding(&self) -> EdgeSizes {
        let padding = self.style.padding();
        let basis = Some(self.cb_width);
        let resolve = |value: LengthValue| non_negative(value.resolve_or_zero(basis, &self.lengths));
        EdgeSizes {
            top: resolve(padding.top),
            right: resolve(padding.right),
            bottom: resolve(padding.bottom),
            left: resolve(padding.left),
        }
    }

    /// [§ 8.5.1 Border width](https://www.w3.org/TR/CSS2/box.html#border-width-properties)
    ///
    /// Border widths do not take percentages; one resolves to 0.
    #[must_use]
    pub fn border(&self) -> EdgeSizes {
        let border = self.style.border_width();
        let resolve = |value: LengthValue| non_negative(value.resolve_or_zero(None, &self.lengths));
        EdgeSizes {
            top: resolve(border.top),
            right: resolve(border.right),
            bottom: resolve(border.bottom),
            left: resolve(border.left),
        }
    }

    /// [§ 9.3.2 Box offsets](https://www.w3.org/TR/CSS2/visuren.html#position-props)
    ///
    /// Vertical percentages refer to the containing block's height and are
    /// `auto` when it is indefinite.
    #[must_use]
    pub fn inset(&self) -> AutoEdgeSizes {
        let inset = self.style.inset();
        let horizontal = Some(self.cb_width);
        AutoEdgeSizes {
            top: self.auto_length(inset.top, self.cb_height),
            right: self.auto_length(inset.right, horizontal),
            bottom: self.auto_length(inset.bottom, self.cb_height),
            left: self.auto_length(inset.left, horizontal),
        }
    }

    /// Horizontal padding + border.
    #[must_use]
    pub fn frame_horizontal(&self) -> f32 {
        self.padding().horizontal() + self.border().horizontal()
    }

    /// Vertical padding + border.
    #[must_use]
    pub fn frame_vertical(&self) -> f32 {
        self.padding().vertical() + self.border().vertical()
    }

    /// [§ 4.4 box-sizing](https://www.w3.org/TR/css-box-4/#box-sizing)
    ///
    /// Convert a size given for the box named by `box-sizing` into a
    /// content-box size.
    fn to_content(&self, size: f32, frame: f32) -> f32 {
        match self.style.box_sizing {
            BoxSizing::ContentBox => non_negative(size),
            BoxSizing::BorderBox => non_negative(size - frame),
        }
    }

    /// Content width from `width`, or `None` for `auto`.
    #[must_use]
    pub fn content_width(&self) -> Option<f32> {
        let width = self.style.width.resolve(Some(self.cb_width), &self.lengths)?;
        Some(self.to_content(width, self.frame_horizontal()))
    }

    /// Content height from `height`, or `None` for `auto` and for a
    /// percentage of an indefinite containing block height.
    ///
    /// [§ 10.5 Content height](https://www.w3.org/TR/CSS2/visudet.html#the-height-property)
    ///
    /// "If the height of the containing block is not specified explicitly
    /// (i.e., it depends on content height), and this element is not
    /// absolutely positioned, the value computes to 'auto'."
    #[must_use]
    pub fn content_height(&self) -> Option<f32> {
        let height = self.style.height.resolve(self.cb_height, &self.lengths)?;
        Some(self.to_content(height, self.frame_vertical()))
    }

    /// [§ 10.4 Minimum and maximum widths](https://www.w3.org/TR/CSS2/visudet.html#min-max-widths)
    ///
    /// Apply `max-width`, then `min-width`, to a content width. When they
    /// conflict, `min-width` wins.
    #[must_use]
    pub fn clamp_width(&self, width: f32) -> f32 {
        let frame = self.frame_horizontal();
        let basis = Some(self.cb_width);
        let mut width = non_negative(width);
        if let Some(max) = self
            .style
            .max_width
            .and_then(|max| max.resolve(basis, &self.lengths))
        {
            width = width.min(self.to_content(max, frame));
        }
        let min = self.style.min_width.resolve_or_zero(basis, &self.lengths);
        width.max(self.to_content(min, frame))
    }

    /// [§ 10.7 Minimum and maximum heights](https://www.w3.org/TR/CSS2/visudet.html#min-max-heights)
    ///
    /// Percentages of an indefinite height: `min-height` is 0 and
    /// `max-height` is `none`.
    #[must_use]
    pub fn clamp_height(&self, height: f32) -> f32 {
        let frame = self.frame_vertical();
        let mut height = non_negative(height);
        if let Some(max) = self
            .style
            .max_height
            .and_then(|max| max.resolve(self.cb_height, &self.lengths))
        {
            height = height.min(self.to_content(max, frame));
        }
        let min = self.style.min_height.resolve_or_zero(self.cb_height, &self.lengths);
        height.max(self.to_content(min, frame))
    }

    /// [§ 9.4.3 Relative positioning](https://www.w3.org/TR/CSS2/visuren.html#relative-positioning)
    ///
    /// "If neither 'left' nor 'right' is 'auto', the position is
    /// over-constrained, and one of them has to be ignored. If the
    /// 'direction' property of the containing block is 'ltr', the value of
    /// 'left' wins and 'right' becomes -'left'."
    ///
    /// "If neither 'top' nor 'bottom' is 'auto', 'bottom' is ignored."
    #[must_use]
    pub fn relative_offset(&self) -> (f32, f32) {
        let inset = self.inset();
        let dx = match (inset.left, inset.right) {
            (AutoOr::Length(left), _) => left,
            (AutoOr::Auto, AutoOr::Length(right)) => -right,
            (AutoOr::Auto, AutoOr::Auto) => 0.0,
        };
        let dy = match (inset.top, inset.bottom) {
            (AutoOr::Length(top), _) => top,
            (AutoOr::Auto, AutoOr::Length(bottom)) => -bottom,
            (AutoOr::Auto, AutoOr::Auto) => 0.0,
        };
        (dx, dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn used(style: &ComputedStyle) -> UsedValues<'_> {
        UsedValues::new(style, 400.0, Some(300.0), Viewport::new(800.0, 600.0), 16.0)
    }

    #[test]
    fn test_percent_margins_refer_to_width() {
        let style = ComputedStyle {
            margin_top: AutoLength::Length(LengthValue::Percent(10.0)),
            margin_left: AutoLength::Auto,
            ..ComputedStyle::block()
        };
        let margin = used(&style).margin();
        assert_eq!(margin.top, AutoOr::Length(40.0));
        assert!(margin.left.is_auto());
    }

    #[test]
    fn test_border_box_sizing_subtracts_frame() {
        let style = ComputedStyle {
            width: AutoLength::px(200.0),
            box_sizing: BoxSizing::BorderBox,
            padding_left: LengthValue::Px(10.0),
            border_right_width: LengthValue::Px(5.0),
            ..ComputedStyle::block()
        };
        assert_eq!(used(&style).content_width(), Some(185.0));
    }

    #[test]
    fn test_min_width_wins_over_max_width() {
        let style = ComputedStyle {
            min_width: LengthValue::Px(300.0),
            max_width: Some(LengthValue::Px(100.0)),
            ..ComputedStyle::block()
        };
        assert!((used(&style).clamp_width(50.0) - 300.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_relative_offset_left_and_top_win() {
        let style = ComputedStyle {
            left: AutoLength::px(10.0),
            right: AutoLength::px(30.0),
            bottom: AutoLength::px(7.0),
            ..ComputedStyle::block()
        };
        assert_eq!(used(&style).relative_offset(), (10.0, -7.0));
    }

    #[test]
    fn test_percent_height_of_indefinite_block_is_auto() {
        let style = ComputedStyle {
            height: AutoLength::Length(LengthValue::Percent(50.0)),
            ..ComputedStyle::block()
        };
        let values = UsedValues::new(&style, 400.0, None, Viewport::new(800.0, 600.0), 16.0);
        assert_eq!(values.content_height(), None);
        assert_eq!(used(&style).content_height(), Some(150.0));
    }
}
