//! Line breaking.
//!
//! [UAX #14: Unicode Line Breaking Algorithm](https://www.unicode.org/reports/tr14/)
//!
//! Layout asks a [`LineBreaker`] how much of a text run fits in the space
//! left on the current line. The default implementation takes break
//! opportunities from `unicode-linebreak` and measures candidate lines
//! with the run's font.

use std::ops::Range;

use quire_style::ComputedStyle;
use unicode_linebreak::{BreakOpportunity, linebreaks};

use super::metrics::{FontKey, FontMetrics, trim_line_end};

/// Result of fitting the start of a text run onto a line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    /// Byte offset, into the text passed to [`LineBreaker::fit`], where the
    /// line ends. Zero when nothing fits.
    pub end: usize,
    /// Advance of the fitted text without trailing white space.
    pub width: f32,
    /// The line ends at a hard line break.
    pub forced_break: bool,
    /// The fitted text is wider than the space it was given. Only happens
    /// for an unbreakable segment at the start of an empty line.
    pub overflow: bool,
}

impl LineFit {
    const NOTHING: Self = Self {
        end: 0,
        width: 0.0,
        forced_break: false,
        overflow: false,
    };
}

/// One line of a run broken by [`LineBreaker::break_lines`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    /// Byte range of the line in the run.
    pub range: Range<usize>,
    /// Advance of the line without trailing white space.
    pub width: f32,
}

/// Line-breaking collaborator.
pub trait LineBreaker {
    /// Fit as much of `text` as possible into `available` px.
    ///
    /// When `line_is_empty` is true and not even the first unbreakable
    /// segment fits, that segment is returned anyway with `overflow` set,
    /// so that layout always makes progress.
    fn fit(
        &self,
        text: &str,
        style: &ComputedStyle,
        available: f32,
        line_is_empty: bool,
        metrics: &dyn FontMetrics,
    ) -> LineFit;

    /// Break a whole run into lines of at most `available_width` px.
    fn break_lines(
        &self,
        text: &str,
        style: &ComputedStyle,
        available_width: f32,
        metrics: &dyn FontMetrics,
    ) -> Vec<TextLine> {
        let mut lines = Vec::new();
        let mut start = 0;
        while start < text.len() {
            if style.white_space.collapses() {
                let rest = &text[start..];
                start += rest.len() - rest.trim_start_matches(' ').len();
                if start >= text.len() {
                    break;
                }
            }
            let fit = self.fit(&text[start..], style, available_width, true, metrics);
            if fit.end == 0 {
                break;
            }
            lines.push(TextLine {
                range: start..start + fit.end,
                width: fit.width,
            });
            start += fit.end;
        }
        lines
    }
}

/// [`LineBreaker`] over UAX #14 break opportunities.
///
/// Soft wrap opportunities are only taken when `white-space` allows
/// wrapping; mandatory breaks are always honoured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeLineBreaker;

fn ends_with_hard_break(segment: &str) -> bool {
    segment.ends_with(['\n', '\r', '\u{b}', '\u{c}', '\u{85}', '\u{2028}', '\u{2029}'])
}

impl LineBreaker for UnicodeLineBreaker {
    fn fit(
        &self,
        text: &str,
        style: &ComputedStyle,
        available: f32,
        line_is_empty: bool,
        metrics: &dyn FontMetrics,
    ) -> LineFit {
        if text.is_empty() {
            return LineFit::NOTHING;
        }
        let font = FontKey::from_style(style);
        let wraps = style.white_space.wraps();
        let mut best: Option<LineFit> = None;

        for (index, opportunity) in linebreaks(text) {
            let forced = matches!(opportunity, BreakOpportunity::Mandatory)
                && ends_with_hard_break(&text[..index]);
            // The end of text always reports a mandatory break.
            let is_end = index == text.len();
            if !wraps && !forced && !is_end {
                continue;
            }

            let width = metrics.text_width(trim_line_end(&text[..index]), &font);
            // Sub-pixel slack absorbs rounding in the caller's arithmetic.
            let fits = width <= available + 0.01;
            if fits {
                let fit = LineFit {
                    end: index,
                    width,
                    forced_break: forced,
                    overflow: false,
                };
                if forced {
                    return fit;
                }
                best = Some(fit);
                continue;
            }

            return match best {
                Some(fit) => fit,
                None if line_is_empty => LineFit {
                    end: index,
                    width,
                    forced_break: forced,
                    overflow: true,
                },
                None => LineFit::NOTHING,
            };
        }
        best.unwrap_or(LineFit::NOTHING)
    }
}

#[cfg(test)]
mod tests {
    use quire_style::WhiteSpace;

    use super::*;
    use crate::text::ApproximateFontMetrics;

    // 16px font, 9.6px per character.
    fn chars(n: f32) -> f32 {
        n * 9.6
    }

    #[test]
    fn test_fit_stops_at_last_opportunity_that_fits() {
        let style = ComputedStyle::default();
        let metrics = ApproximateFontMetrics::default();
        let fit = UnicodeLineBreaker.fit("aaa bbb ccc", &style, chars(8.0), false, &metrics);
        assert_eq!(fit.end, 8);
        assert!((fit.width - chars(7.0)).abs() < 0.01);
        assert!(!fit.overflow);
    }

    #[test]
    fn test_fit_on_empty_line_overflows_instead_of_stalling() {
        let style = ComputedStyle::default();
        let metrics = ApproximateFontMetrics::default();
        let breaker = UnicodeLineBreaker;
        let fit = breaker.fit("abcdefgh ij", &style, chars(3.0), true, &metrics);
        assert_eq!(fit.end, 9);
        assert!(fit.overflow);

        let nothing = breaker.fit("abcdefgh ij", &style, chars(3.0), false, &metrics);
        assert_eq!(nothing.end, 0);
    }

    #[test]
    fn test_mandatory_break_ends_line() {
        let style = ComputedStyle {
            white_space: WhiteSpace::Pre,
            ..ComputedStyle::default()
        };
        let metrics = ApproximateFontMetrics::default();
        let lines = UnicodeLineBreaker.break_lines("ab cd\nef", &style, chars(2.0), &metrics);
        let ranges: Vec<_> = lines.iter().map(|l| l.range.clone()).collect();
        assert_eq!(ranges, vec![0..6, 6..8]);
    }

    #[test]
    fn test_break_lines_wraps_normal_text() {
        let style = ComputedStyle::default();
        let metrics = ApproximateFontMetrics::default();
        let lines = UnicodeLineBreaker.break_lines("one two three", &style, chars(7.0), &metrics);
        let ranges: Vec<_> = lines.iter().map(|l| l.range.clone()).collect();
        assert_eq!(ranges, vec![0..8, 8..13]);
    }
}
