//! Font metrics and intrinsic text measurement.
//!
//! [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
//!
//! "CSS assumes that every font has font metrics that specify a
//! characteristic height above the baseline and a depth below it."

use quire_style::length::non_negative;
use quire_style::{ComputedStyle, FontStyle, LengthContext, LineHeight, WhiteSpace};
use quire_tree::{IntrinsicSizes, LayoutTree};
use unicode_linebreak::{BreakOpportunity, linebreaks};

use crate::config::LayoutConfig;

/// The font properties a metrics provider needs to pick a face.
#[derive(Debug, Clone, PartialEq)]
pub struct FontKey {
    /// `font-family`
    pub family: String,
    /// Used font size in px.
    pub size: f32,
    /// `font-weight`, 100..=900.
    pub weight: u16,
    /// `font-style` other than `normal`.
    pub italic: bool,
}

impl FontKey {
    /// The font selected by a computed style.
    #[must_use]
    pub fn from_style(style: &ComputedStyle) -> Self {
        Self {
            family: style.font_family.clone(),
            size: non_negative(style.font_size),
            weight: style.font_weight,
            italic: style.font_style != FontStyle::Normal,
        }
    }
}

/// Font metrics provider for text measurement.
///
/// Implementations must be deterministic: layout measures the same text
/// more than once and expects the same answer.
pub trait FontMetrics {
    /// Total advance width of `text` set in `font`.
    ///
    /// This should sum the advance width of each glyph in the string,
    /// matching the cursor advancement the painter uses.
    fn text_width(&self, text: &str, font: &FontKey) -> f32;

    /// [§ 10.8.1 Leading and half-leading](https://www.w3.org/TR/CSS2/visudet.html#leading)
    ///
    /// Used value of `line-height: normal` for `font`.
    fn line_height(&self, font: &FontKey) -> f32;

    /// Height of the font above the baseline.
    fn ascent(&self, font: &FontKey) -> f32;
}

/// Approximate font metrics using fixed ratios.
///
/// Without access to font data, the average advance of Latin glyphs in a
/// proportional face is about 0.6 of the font size, and 1.2 is the upper
/// end of the recommended range for `line-height: normal`.
///
/// Used when no provider is given, and in tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproximateFontMetrics {
    /// Advance per character as a fraction of the font size.
    pub char_width_ratio: f32,
    /// `line-height: normal` as a multiple of the font size.
    pub line_height_ratio: f32,
    /// Ascent as a fraction of the font size.
    pub ascent_ratio: f32,
}

impl ApproximateFontMetrics {
    /// Ratios taken from the engine configuration.
    #[must_use]
    pub const fn from_config(config: &LayoutConfig) -> Self {
        Self {
            char_width_ratio: config.approximate_char_width,
            line_height_ratio: config.line_height_ratio,
            ascent_ratio: config.ascent_ratio,
        }
    }
}

impl Default for ApproximateFontMetrics {
    fn default() -> Self {
        Self::from_config(&LayoutConfig::default())
    }
}

impl FontMetrics for ApproximateFontMetrics {
    fn text_width(&self, text: &str, font: &FontKey) -> f32 {
        let glyphs = text.chars().filter(|ch| !ch.is_control()).count();
        glyphs as f32 * font.size * self.char_width_ratio
    }

    fn line_height(&self, font: &FontKey) -> f32 {
        font.size * self.line_height_ratio
    }

    fn ascent(&self, font: &FontKey) -> f32 {
        font.size * self.ascent_ratio
    }
}

/// Used line height and the distance from the line-box top to the
/// baseline for text set in `style`.
///
/// [§ 10.8.1 Leading and half-leading](https://www.w3.org/TR/CSS2/visudet.html#leading)
///
/// "Half the leading is added above A and the other half below D, giving
/// the glyphs and their leading, L, a total height above the baseline of
/// A' = A + L/2 and a total depth of D' = D + L/2."
///
/// The em box stands in for A + D, which is what the CSS 2.1 definition of
/// the content area of an inline box suggests when real ascent and descent
/// are not available.
#[must_use]
pub fn used_line_height(
    style: &ComputedStyle,
    metrics: &dyn FontMetrics,
    ctx: &LengthContext,
) -> (f32, f32) {
    let font = FontKey::from_style(style);
    let line_height = match style.line_height {
        LineHeight::Normal => metrics.line_height(&font),
        LineHeight::Number(factor) => factor * font.size,
        // "Percentages: refer to the font size of the element itself"
        LineHeight::Length(length) => length.resolve_or_zero(Some(font.size), ctx),
    };
    let line_height = non_negative(line_height);
    let half_leading = (line_height - font.size) / 2.0;
    let ascent = non_negative(metrics.ascent(&font) + half_leading);
    (line_height, ascent)
}

/// [§ 16.6.1 The 'white-space' processing model](https://www.w3.org/TR/CSS2/text.html#white-space-model)
///
/// "If 'white-space' is set to 'normal', 'nowrap', or 'pre-line', ...
/// every tab is converted to a space ... any space immediately following
/// another collapsible space is removed."
///
/// Newlines collapse along with the rest for `normal` and `nowrap`; for
/// `pre` and `pre-wrap` the text is returned unchanged.
#[must_use]
pub fn collapse_white_space(text: &str, white_space: WhiteSpace) -> String {
    if !white_space.collapses() {
        return text.to_string();
    }
    let mut output = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if matches!(ch, ' ' | '\t' | '\n' | '\r' | '\u{c}') {
            if !in_space {
                output.push(' ');
            }
            in_space = true;
        } else {
            output.push(ch);
            in_space = false;
        }
    }
    output
}

/// Strip trailing white space and hard line breaks before measuring.
///
/// [§ 16.6.1](https://www.w3.org/TR/CSS2/text.html#white-space-model)
///
/// "If a space (U+0020) at the end of a line has 'white-space' set to
/// 'normal', 'nowrap', or 'pre-line', it is also removed."
pub(crate) fn trim_line_end(segment: &str) -> &str {
    segment.trim_end_matches(|ch: char| ch.is_whitespace())
}

/// [§ 4.1 Intrinsic Sizes](https://www.w3.org/TR/css-sizing-3/#intrinsic-sizes)
///
/// Measure `text` once for the intrinsic size of its box.
///
/// - max-content: the widest hard line when nothing wraps
/// - min-content: the widest segment between soft wrap opportunities
#[must_use]
pub fn measure_text(text: &str, style: &ComputedStyle, metrics: &dyn FontMetrics) -> (f32, f32) {
    let font = FontKey::from_style(style);
    let text = collapse_white_space(text, style.white_space);

    let mut max_content = 0.0_f32;
    let mut min_content = 0.0_f32;
    let mut line_start = 0;
    let mut segment_start = 0;
    for (index, opportunity) in linebreaks(&text) {
        let segment = trim_line_end(&text[segment_start..index]);
        let segment_width = metrics.text_width(segment.trim_start(), &font);
        if style.white_space.wraps() {
            min_content = min_content.max(segment_width);
        }
        segment_start = index;

        if matches!(opportunity, BreakOpportunity::Mandatory) {
            let line = trim_line_end(&text[line_start..index]);
            let line = if style.white_space.collapses() { line.trim_start() } else { line };
            max_content = max_content.max(metrics.text_width(line, &font));
            line_start = index;
        }
    }
    if !style.white_space.wraps() {
        min_content = max_content;
    }
    (non_negative(max_content), non_negative(min_content.min(max_content)))
}

/// Attach intrinsic measurements to every node before layout starts.
///
/// Every node gets the line height and baseline of its own font, which
/// block containers use as the strut of their line boxes. Nodes carrying
/// text also get their max-content and min-content widths.
pub fn assign_intrinsic_metrics(
    tree: &mut LayoutTree,
    metrics: &dyn FontMetrics,
    ctx: &LengthContext,
) {
    for index in 0..tree.len() {
        let id = quire_tree::NodeId(index);
        let Some(node) = tree.get(id) else {
            continue;
        };
        let style = &node.style;
        let (line_height, ascent) = used_line_height(
            style,
            metrics,
            &LengthContext {
                font_size: style.font_size,
                ..*ctx
            },
        );
        let (max_content_width, min_content_width) = node
            .text
            .as_deref()
            .map_or((0.0, 0.0), |text| measure_text(text, style, metrics));

        if let Some(node) = tree.get_mut(id) {
            node.intrinsic = IntrinsicSizes {
                max_content_width,
                min_content_width,
                line_height,
                ascent,
            };
        }
    }
    log::debug!("assigned intrinsic metrics to {} nodes", tree.len());
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quire_tree::{LayoutNode, NodeId};

    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_approximate_metrics() {
        let metrics = ApproximateFontMetrics::default();
        let font = FontKey::from_style(&ComputedStyle::default());
        assert!(approx(metrics.text_width("hello", &font), 48.0));
        assert!(approx(metrics.line_height(&font), 19.2));
    }

    #[test]
    fn test_half_leading_puts_baseline_below_ascent() {
        let metrics = ApproximateFontMetrics::default();
        let style = ComputedStyle::default();
        let (line_height, ascent) = used_line_height(&style, &metrics, &LengthContext::default());
        assert!(approx(line_height, 19.2));
        assert!(approx(ascent, 14.4));

        let style = ComputedStyle {
            line_height: LineHeight::Number(2.0),
            ..ComputedStyle::default()
        };
        let (line_height, ascent) = used_line_height(&style, &metrics, &LengthContext::default());
        assert!(approx(line_height, 32.0));
        assert!(approx(ascent, 20.8));
    }

    #[test]
    fn test_collapse_white_space() {
        assert_eq!(collapse_white_space("a \n\t b", WhiteSpace::Normal), "a b");
        assert_eq!(collapse_white_space("a  b", WhiteSpace::Pre), "a  b");
    }

    #[test]
    fn test_measure_text_min_and_max_content() {
        let metrics = ApproximateFontMetrics::default();
        let style = ComputedStyle::default();
        let (max, min) = measure_text("aa bbbb c", &style, &metrics);
        assert!(approx(max, 9.0 * 9.6));
        assert!(approx(min, 4.0 * 9.6));

        let nowrap = ComputedStyle {
            white_space: WhiteSpace::Nowrap,
            ..ComputedStyle::default()
        };
        let (max, min) = measure_text("aa bbbb c", &nowrap, &metrics);
        assert!(approx(max, min));
    }

    #[test]
    fn test_assign_intrinsic_metrics_covers_every_node() {
        let block = Arc::new(ComputedStyle::block());
        let mut tree = LayoutTree::new(LayoutNode::element("p", Arc::clone(&block)));
        let text = tree.append_child(
            NodeId::ROOT,
            LayoutNode::text("one two", Arc::new(ComputedStyle::inline())),
        );
        assign_intrinsic_metrics(&mut tree, &ApproximateFontMetrics::default(), &LengthContext::default());

        let root = tree.get(NodeId::ROOT).map(|n| n.intrinsic).unwrap_or_default();
        assert!(approx(root.line_height, 19.2));
        assert!(root.max_content_width.abs() < f32::EPSILON);
        let text = tree.get(text).map(|n| n.intrinsic).unwrap_or_default();
        assert!(approx(text.max_content_width, 7.0 * 9.6));
        assert!(approx(text.min_content_width, 3.0 * 9.6));
    }
}
