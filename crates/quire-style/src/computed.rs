//! The computed style record
//!
//! [§ 4.4 Computed values](https://www.w3.org/TR/css-cascade-4/#computed)
//!
//! "The computed value is the result of resolving the specified value as
//! defined in the 'Computed Value' line of the property definition table,
//! generally absolutizing it in preparation for inheritance."
//!
//! Properties are stored as longhands. Missing fields in a serialized
//! record take their CSS initial value.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::display::{DisplayValue, serde_display};
use crate::length::{AutoLength, DEFAULT_FONT_SIZE_PX, LengthValue, ParseLengthError};

/// Four physical sides of a box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges<T> {
    /// Top side.
    pub top: T,
    /// Right side.
    pub right: T,
    /// Bottom side.
    pub bottom: T,
    /// Left side.
    pub left: T,
}

impl<T: Copy> Edges<T> {
    /// The same value on every side.
    pub const fn uniform(value: T) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// Apply `f` to every side.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Edges<U> {
        Edges {
            top: f(self.top),
            right: f(self.right),
            bottom: f(self.bottom),
            left: f(self.left),
        }
    }
}

/// [§ 3 Positioning schemes](https://www.w3.org/TR/css-position-3/#position-property)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Position {
    /// "The box is not a positioned box."
    #[default]
    Static,
    /// "The box is laid out as for static, then offset from the resulting position."
    Relative,
    /// "The box is taken out of flow such that it has no impact on the size
    /// or position of its siblings and ancestors."
    Absolute,
    /// "Same as absolute, except the box is positioned and sized relative to
    /// a fixed positioning containing block (usually the viewport)."
    Fixed,
    /// "Identical to relative, except that its offsets are automatically
    /// adjusted in reference to the nearest ancestor scroll container's
    /// scrollport." Paged output has no scrollport, so no offset is
    /// applied.
    Sticky,
}

impl Position {
    /// Absolute and fixed boxes are taken out of normal flow.
    #[must_use]
    pub const fn is_out_of_flow(self) -> bool {
        matches!(self, Self::Absolute | Self::Fixed)
    }

    /// [§ 2.1 Containing Blocks of Positioned Boxes](https://www.w3.org/TR/css-position-3/#def-cb)
    ///
    /// Any non-static position makes the box the containing block for
    /// absolutely positioned descendants.
    #[must_use]
    pub const fn is_positioned(self) -> bool {
        !matches!(self, Self::Static)
    }
}

/// [§ 9.5.1 Positioning the float](https://www.w3.org/TR/CSS2/visuren.html#float-position)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FloatMode {
    /// "The box is not floated."
    #[default]
    None,
    /// "The element generates a block box that is floated to the left."
    Left,
    /// "Similar to 'left', except the box is floated to the right."
    Right,
}

/// [§ 9.5.2 Controlling flow next to floats: the 'clear' property](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Clear {
    /// "No constraint on the box's position with respect to floats."
    #[default]
    None,
    /// Below any left-floating boxes earlier in the formatting context.
    Left,
    /// Below any right-floating boxes earlier in the formatting context.
    Right,
    /// Below both left and right floats.
    Both,
}

/// [§ 11.1.1 Overflow](https://www.w3.org/TR/CSS2/visufx.html#overflow)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Overflow {
    /// Content is not clipped.
    #[default]
    Visible,
    /// Content is clipped, no scrolling.
    Hidden,
    /// Content is clipped, scrolling always offered.
    Scroll,
    /// Scrolling offered when content overflows.
    Auto,
}

/// [§ 4 Box-sizing](https://www.w3.org/TR/css-sizing-3/#box-sizing)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum BoxSizing {
    /// `width`/`height` size the content box.
    #[default]
    ContentBox,
    /// `width`/`height` size the border box; padding and border are carved out.
    BorderBox,
}

/// [§ 5.1 flex-direction](https://www.w3.org/TR/css-flexbox-1/#flex-direction-property)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FlexDirection {
    /// Main axis is the inline axis.
    #[default]
    Row,
    /// Like `row`, with main-start and main-end swapped.
    RowReverse,
    /// Main axis is the block axis.
    Column,
    /// Like `column`, with main-start and main-end swapped.
    ColumnReverse,
}

impl FlexDirection {
    /// Whether the main axis is horizontal.
    #[must_use]
    pub const fn is_row(self) -> bool {
        matches!(self, Self::Row | Self::RowReverse)
    }

    /// Whether items are placed from main-end.
    #[must_use]
    pub const fn is_reverse(self) -> bool {
        matches!(self, Self::RowReverse | Self::ColumnReverse)
    }
}

/// [§ 5.2 flex-wrap](https://www.w3.org/TR/css-flexbox-1/#flex-wrap-property)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FlexWrap {
    /// "The flex container is single-line."
    #[default]
    Nowrap,
    /// "The flex container is multi-line."
    Wrap,
    /// "Same as wrap", with cross-start and cross-end swapped.
    WrapReverse,
}

/// [§ 8.2 justify-content](https://www.w3.org/TR/css-flexbox-1/#justify-content-property)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum JustifyContent {
    /// "Flex items are packed toward the start of the line."
    #[default]
    FlexStart,
    /// "Flex items are packed toward the end of the line."
    FlexEnd,
    /// "Flex items are packed toward the center of the line."
    Center,
    /// "Flex items are evenly distributed in the line", no outer gaps.
    SpaceBetween,
    /// Half-size gaps at both ends.
    SpaceAround,
    /// Equal gaps everywhere, including both ends.
    SpaceEvenly,
}

/// [§ 8.3 align-items](https://www.w3.org/TR/css-flexbox-1/#align-items-property)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AlignItems {
    /// Auto-sized items fill the line's cross size.
    #[default]
    Stretch,
    /// Cross-start edge flush with the line's cross-start edge.
    FlexStart,
    /// Cross-end edge flush with the line's cross-end edge.
    FlexEnd,
    /// Centered in the line's cross axis.
    Center,
    /// First baselines aligned.
    Baseline,
}

/// [§ 8.3 align-self](https://www.w3.org/TR/css-flexbox-1/#propdef-align-self)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AlignSelf {
    /// Defer to the container's `align-items`.
    #[default]
    Auto,
    /// See [`AlignItems::Stretch`].
    Stretch,
    /// See [`AlignItems::FlexStart`].
    FlexStart,
    /// See [`AlignItems::FlexEnd`].
    FlexEnd,
    /// See [`AlignItems::Center`].
    Center,
    /// See [`AlignItems::Baseline`].
    Baseline,
}

impl AlignSelf {
    /// The used alignment given the container's `align-items`.
    #[must_use]
    pub const fn resolve(self, parent: AlignItems) -> AlignItems {
        match self {
            Self::Auto => parent,
            Self::Stretch => AlignItems::Stretch,
            Self::FlexStart => AlignItems::FlexStart,
            Self::FlexEnd => AlignItems::FlexEnd,
            Self::Center => AlignItems::Center,
            Self::Baseline => AlignItems::Baseline,
        }
    }
}

/// [§ 3.2 font-style](https://www.w3.org/TR/css-fonts-4/#font-style-prop)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FontStyle {
    /// Upright face.
    #[default]
    Normal,
    /// Italic face.
    Italic,
    /// Oblique face.
    Oblique,
}

/// [§ 10.8.1 Leading and half-leading](https://www.w3.org/TR/CSS2/visudet.html#propdef-line-height)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LineHeightRepr", into = "LineHeightRepr")]
pub enum LineHeight {
    /// "Tells user agents to set the used value to a 'reasonable' value based
    /// on the font of the element." The font's own line gap is used.
    #[default]
    Normal,
    /// "The used value of the property is this number multiplied by the
    /// element's font size."
    Number(f32),
    /// "The specified length is used in the calculation of the line box height."
    Length(LengthValue),
}

/// Wire form of `line-height`: a bare number or CSS text.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum LineHeightRepr {
    Number(f32),
    Text(String),
}

impl TryFrom<LineHeightRepr> for LineHeight {
    type Error = ParseLengthError;

    fn try_from(repr: LineHeightRepr) -> Result<Self, Self::Error> {
        match repr {
            LineHeightRepr::Number(n) => Ok(Self::Number(n)),
            LineHeightRepr::Text(text) if text.trim().eq_ignore_ascii_case("normal") => {
                Ok(Self::Normal)
            }
            LineHeightRepr::Text(text) => text.parse().map(Self::Length),
        }
    }
}

impl From<LineHeight> for LineHeightRepr {
    fn from(value: LineHeight) -> Self {
        match value {
            LineHeight::Normal => Self::Text("normal".to_string()),
            LineHeight::Number(n) => Self::Number(n),
            LineHeight::Length(len) => Self::Text(len.to_string()),
        }
    }
}

/// [§ 16.2 Alignment: the 'text-align' property](https://www.w3.org/TR/CSS2/text.html#alignment-prop)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TextAlign {
    /// Lines flush with the left edge.
    #[default]
    Left,
    /// Lines flush with the right edge.
    Right,
    /// Lines centered.
    Center,
    /// Lines stretched to both edges, except the last.
    Justify,
}

/// [§ 16.6 White space: the 'white-space' property](https://www.w3.org/TR/CSS2/text.html#white-space-prop)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum WhiteSpace {
    /// Collapse white space, wrap lines.
    #[default]
    Normal,
    /// Preserve white space, break only at newlines.
    Pre,
    /// Collapse white space, never wrap.
    Nowrap,
    /// Preserve white space, wrap lines.
    PreWrap,
}

impl WhiteSpace {
    /// Whether soft wrap opportunities may be taken.
    #[must_use]
    pub const fn wraps(self) -> bool {
        matches!(self, Self::Normal | Self::PreWrap)
    }

    /// Whether runs of white space collapse to a single space.
    #[must_use]
    pub const fn collapses(self) -> bool {
        matches!(self, Self::Normal | Self::Nowrap)
    }
}

/// Computed values for one box.
///
/// Shared between boxes by `Arc`; layout never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ComputedStyle {
    /// `display`; `None` is `display: none`.
    #[serde(with = "serde_display")]
    pub display: Option<DisplayValue>,
    /// `position`
    pub position: Position,
    /// `float`
    pub float: FloatMode,
    /// `clear`
    pub clear: Clear,
    /// `overflow`
    pub overflow: Overflow,
    /// `box-sizing`
    pub box_sizing: BoxSizing,

    /// `width`
    pub width: AutoLength,
    /// `height`
    pub height: AutoLength,
    /// `min-width`
    pub min_width: LengthValue,
    /// `min-height`
    pub min_height: LengthValue,
    /// `max-width`; `None` is `none`.
    pub max_width: Option<LengthValue>,
    /// `max-height`; `None` is `none`.
    pub max_height: Option<LengthValue>,

    /// `margin-top`
    pub margin_top: AutoLength,
    /// `margin-right`
    pub margin_right: AutoLength,
    /// `margin-bottom`
    pub margin_bottom: AutoLength,
    /// `margin-left`
    pub margin_left: AutoLength,
    /// `padding-top`
    pub padding_top: LengthValue,
    /// `padding-right`
    pub padding_right: LengthValue,
    /// `padding-bottom`
    pub padding_bottom: LengthValue,
    /// `padding-left`
    pub padding_left: LengthValue,
    /// `border-top-width`
    pub border_top_width: LengthValue,
    /// `border-right-width`
    pub border_right_width: LengthValue,
    /// `border-bottom-width`
    pub border_bottom_width: LengthValue,
    /// `border-left-width`
    pub border_left_width: LengthValue,

    /// `top`
    pub top: AutoLength,
    /// `right`
    pub right: AutoLength,
    /// `bottom`
    pub bottom: AutoLength,
    /// `left`
    pub left: AutoLength,

    /// `flex-direction`
    pub flex_direction: FlexDirection,
    /// `flex-wrap`
    pub flex_wrap: FlexWrap,
    /// `justify-content`
    pub justify_content: JustifyContent,
    /// `align-items`
    pub align_items: AlignItems,
    /// `align-self`
    pub align_self: AlignSelf,
    /// `flex-grow`
    pub flex_grow: f32,
    /// `flex-shrink`
    pub flex_shrink: f32,
    /// `flex-basis`; `auto` defers to the main size property.
    pub flex_basis: AutoLength,
    /// `row-gap`
    pub row_gap: LengthValue,
    /// `column-gap`
    pub column_gap: LengthValue,

    /// Number of columns a table cell spans (the `colspan` attribute).
    pub colspan: u32,
    /// `border-spacing`, applied on both axes.
    pub border_spacing: LengthValue,

    /// `font-family`, the first family name only.
    pub font_family: String,
    /// Computed `font-size` in px.
    pub font_size: f32,
    /// `font-weight`, 100..=900.
    pub font_weight: u16,
    /// `font-style`
    pub font_style: FontStyle,
    /// `line-height`
    pub line_height: LineHeight,
    /// `text-align`
    pub text_align: TextAlign,
    /// `white-space`
    pub white_space: WhiteSpace,
}

impl Default for ComputedStyle {
    /// CSS initial values, except `display`, which starts as `inline` like
    /// any element without a user agent rule.
    fn default() -> Self {
        Self {
            display: Some(DisplayValue::inline()),
            position: Position::Static,
            float: FloatMode::None,
            clear: Clear::None,
            overflow: Overflow::Visible,
            box_sizing: BoxSizing::ContentBox,
            width: AutoLength::Auto,
            height: AutoLength::Auto,
            min_width: LengthValue::ZERO,
            min_height: LengthValue::ZERO,
            max_width: None,
            max_height: None,
            margin_top: AutoLength::ZERO,
            margin_right: AutoLength::ZERO,
            margin_bottom: AutoLength::ZERO,
            margin_left: AutoLength::ZERO,
            padding_top: LengthValue::ZERO,
            padding_right: LengthValue::ZERO,
            padding_bottom: LengthValue::ZERO,
            padding_left: LengthValue::ZERO,
            border_top_width: LengthValue::ZERO,
            border_right_width: LengthValue::ZERO,
            border_bottom_width: LengthValue::ZERO,
            border_left_width: LengthValue::ZERO,
            top: AutoLength::Auto,
            right: AutoLength::Auto,
            bottom: AutoLength::Auto,
            left: AutoLength::Auto,
            flex_direction: FlexDirection::Row,
            flex_wrap: FlexWrap::Nowrap,
            justify_content: JustifyContent::FlexStart,
            align_items: AlignItems::Stretch,
            align_self: AlignSelf::Auto,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            flex_basis: AutoLength::Auto,
            row_gap: LengthValue::ZERO,
            column_gap: LengthValue::ZERO,
            colspan: 1,
            border_spacing: LengthValue::Px(2.0),
            font_family: "sans-serif".to_string(),
            font_size: DEFAULT_FONT_SIZE_PX,
            font_weight: 400,
            font_style: FontStyle::Normal,
            line_height: LineHeight::Normal,
            text_align: TextAlign::Left,
            white_space: WhiteSpace::Normal,
        }
    }
}

impl ComputedStyle {
    /// Initial values with the given display type.
    #[must_use]
    pub fn with_display(display: DisplayValue) -> Self {
        Self {
            display: Some(display),
            ..Self::default()
        }
    }

    /// Initial values with `display: block`.
    #[must_use]
    pub fn block() -> Self {
        Self::with_display(DisplayValue::block())
    }

    /// Initial values with `display: inline`.
    #[must_use]
    pub fn inline() -> Self {
        Self::with_display(DisplayValue::inline())
    }

    /// Style for an anonymous box or text run generated inside `self`.
    ///
    /// [§ 9.2.1.1 Anonymous block boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
    ///
    /// "The properties of anonymous boxes are inherited from the enclosing
    /// non-anonymous box. Non-inherited properties have their initial value."
    #[must_use]
    pub fn inherit_into(&self, display: DisplayValue) -> Self {
        Self {
            display: Some(display),
            font_family: self.font_family.clone(),
            font_size: self.font_size,
            font_weight: self.font_weight,
            font_style: self.font_style,
            line_height: self.line_height,
            text_align: self.text_align,
            white_space: self.white_space,
            border_spacing: self.border_spacing,
            ..Self::default()
        }
    }

    /// `margin-*` longhands as one value.
    #[must_use]
    pub const fn margin(&self) -> Edges<AutoLength> {
        Edges {
            top: self.margin_top,
            right: self.margin_right,
            bottom: self.margin_bottom,
            left: self.margin_left,
        }
    }

    /// `padding-*` longhands as one value.
    #[must_use]
    pub const fn padding(&self) -> Edges<LengthValue> {
        Edges {
            top: self.padding_top,
            right: self.padding_right,
            bottom: self.padding_bottom,
            left: self.padding_left,
        }
    }

    /// `border-*-width` longhands as one value.
    #[must_use]
    pub const fn border_width(&self) -> Edges<LengthValue> {
        Edges {
            top: self.border_top_width,
            right: self.border_right_width,
            bottom: self.border_bottom_width,
            left: self.border_left_width,
        }
    }

    /// `top`/`right`/`bottom`/`left` as one value.
    #[must_use]
    pub const fn inset(&self) -> Edges<AutoLength> {
        Edges {
            top: self.top,
            right: self.right,
            bottom: self.bottom,
            left: self.left,
        }
    }

    /// Set all four margins.
    #[must_use]
    pub const fn margins(mut self, margin: Edges<AutoLength>) -> Self {
        self.margin_top = margin.top;
        self.margin_right = margin.right;
        self.margin_bottom = margin.bottom;
        self.margin_left = margin.left;
        self
    }

    /// Set all four paddings.
    #[must_use]
    pub const fn paddings(mut self, padding: Edges<LengthValue>) -> Self {
        self.padding_top = padding.top;
        self.padding_right = padding.right;
        self.padding_bottom = padding.bottom;
        self.padding_left = padding.left;
        self
    }

    /// Set all four border widths.
    #[must_use]
    pub const fn borders(mut self, border: Edges<LengthValue>) -> Self {
        self.border_top_width = border.top;
        self.border_right_width = border.right;
        self.border_bottom_width = border.bottom;
        self.border_left_width = border.left;
        self
    }

    /// `display: none`
    #[must_use]
    pub const fn is_display_none(&self) -> bool {
        self.display.is_none()
    }

    /// Floated boxes leave normal flow unless they are also absolutely
    /// positioned, in which case `float` computes to `none`.
    ///
    /// [§ 9.7 Relationships between 'display', 'position', and 'float'](https://www.w3.org/TR/CSS2/visuren.html#dis-pos-flo)
    #[must_use]
    pub const fn is_floated(&self) -> bool {
        !matches!(self.float, FloatMode::None) && !self.position.is_out_of_flow()
    }

    /// Inline-level boxes take part in an inline formatting context.
    #[must_use]
    pub fn is_inline_level(&self) -> bool {
        self.display.is_some_and(|d| d.is_inline_level())
            && !self.is_floated()
            && !self.position.is_out_of_flow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_initial_values() {
        let style: ComputedStyle =
            serde_json::from_str(r#"{ "display": "block", "width": "50%", "margin-left": "auto" }"#)
                .expect("valid style");
        assert_eq!(style.display, Some(DisplayValue::block()));
        assert_eq!(style.width, AutoLength::Length(LengthValue::Percent(50.0)));
        assert_eq!(style.margin_left, AutoLength::Auto);
        assert_eq!(style.margin_right, AutoLength::ZERO);
        assert_eq!(style.top, AutoLength::Auto);
        assert!((style.flex_shrink - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_display_none_and_line_height() {
        let style: ComputedStyle =
            serde_json::from_str(r#"{ "display": "none", "line-height": 1.5 }"#)
                .expect("valid style");
        assert!(style.is_display_none());
        assert_eq!(style.line_height, LineHeight::Number(1.5));

        let style: ComputedStyle =
            serde_json::from_str(r#"{ "line-height": "normal" }"#).expect("valid style");
        assert_eq!(style.line_height, LineHeight::Normal);

        let style: ComputedStyle =
            serde_json::from_str(r#"{ "line-height": "24px" }"#).expect("valid style");
        assert_eq!(style.line_height, LineHeight::Length(LengthValue::Px(24.0)));
    }

    #[test]
    fn test_absolute_float_is_not_floated() {
        let style = ComputedStyle {
            float: FloatMode::Left,
            position: Position::Absolute,
            ..ComputedStyle::block()
        };
        assert!(!style.is_floated());
    }
}
