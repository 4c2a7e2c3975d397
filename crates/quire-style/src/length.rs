//! CSS length values and their resolution to pixels
//!
//! [CSS Values and Units Level 4](https://www.w3.org/TR/css-values-4/)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// User agent default font size.
/// [§ 3.5 font-size](https://www.w3.org/TR/css-fonts-4/#font-size-prop)
pub const DEFAULT_FONT_SIZE_PX: f32 = 16.0;

/// Error returned when a length string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseLengthError {
    /// The numeric part is missing or not a number.
    #[error("invalid number in length '{0}'")]
    InvalidNumber(String),
    /// The unit is not one the engine understands.
    #[error("unsupported unit '{unit}' in length '{input}'")]
    UnsupportedUnit {
        /// The full input.
        input: String,
        /// The unrecognized unit suffix.
        unit: String,
    },
    /// The keyword `auto` was given where only a length is allowed.
    #[error("'auto' is not allowed here")]
    AutoNotAllowed,
}

/// [§ 4.1 Lengths](https://www.w3.org/TR/css-values-4/#lengths)
/// "Lengths refer to distance measurements and are denoted by `<length>` in the
/// property definitions."
///
/// Serialized as CSS text (`"12px"`, `"50%"`, `"1.5em"`). Bare JSON numbers
/// are read as pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LengthRepr", into = "String")]
pub enum LengthValue {
    /// [§ 6.1 Absolute lengths](https://www.w3.org/TR/css-values-4/#absolute-lengths)
    /// "1px = 1/96th of 1in"
    Px(f32),
    /// [§ 5.1.1 Font-relative lengths](https://www.w3.org/TR/css-values-4/#font-relative-lengths)
    /// "Equal to the computed value of the font-size property of the element"
    Em(f32),
    /// [§ 5.1.1 Font-relative lengths](https://www.w3.org/TR/css-values-4/#font-relative-lengths)
    /// "Equal to the computed value of the font-size property of the root element."
    Rem(f32),
    /// [§ 5.1.2 Viewport-percentage lengths](https://www.w3.org/TR/css-values-4/#viewport-relative-lengths)
    /// "1vw = 1% of viewport width"
    Vw(f32),
    /// [§ 5.1.2 Viewport-percentage lengths](https://www.w3.org/TR/css-values-4/#viewport-relative-lengths)
    /// "1vh = 1% of viewport height"
    Vh(f32),
    /// [§ 4.3 Percentages](https://www.w3.org/TR/css-values-4/#percentages)
    /// "Percentages are always relative to another quantity, for example a length."
    Percent(f32),
}

impl Default for LengthValue {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Everything a relative length needs besides its percentage basis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthContext {
    /// Computed `font-size` of the element, in px.
    pub font_size: f32,
    /// Computed `font-size` of the root element, in px.
    pub root_font_size: f32,
    /// Width of the initial containing block.
    pub viewport_width: f32,
    /// Height of the initial containing block.
    pub viewport_height: f32,
}

impl Default for LengthContext {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE_PX,
            root_font_size: DEFAULT_FONT_SIZE_PX,
            viewport_width: 0.0,
            viewport_height: 0.0,
        }
    }
}

impl LengthValue {
    /// `0px`
    pub const ZERO: Self = Self::Px(0.0);

    /// Whether this value depends on a percentage basis.
    #[must_use]
    pub const fn is_percent(&self) -> bool {
        matches!(self, Self::Percent(_))
    }

    /// Resolve to pixels.
    ///
    /// `percent_basis` is the containing block dimension percentages refer to;
    /// `None` means that dimension is indefinite, and a percentage then has
    /// no resolved value.
    ///
    /// [§ 8.3 Margin properties](https://www.w3.org/TR/CSS2/box.html#margin-properties)
    /// NOTE: margin and padding percentages refer to the containing block's
    /// **width**, even for top/bottom. Callers pass the right basis.
    ///
    /// Non-finite results are sanitized to 0.
    #[must_use]
    pub fn resolve(self, percent_basis: Option<f32>, ctx: &LengthContext) -> Option<f32> {
        let px = match self {
            Self::Px(px) => px,
            Self::Em(em) => em * ctx.font_size,
            Self::Rem(rem) => rem * ctx.root_font_size,
            Self::Vw(vw) => vw * ctx.viewport_width / 100.0,
            Self::Vh(vh) => vh * ctx.viewport_height / 100.0,
            Self::Percent(pct) => pct * percent_basis? / 100.0,
        };
        Some(finite_or_zero(px))
    }

    /// Resolve to pixels, treating an unresolvable percentage as 0.
    #[must_use]
    pub fn resolve_or_zero(self, percent_basis: Option<f32>, ctx: &LengthContext) -> f32 {
        self.resolve(percent_basis, ctx).unwrap_or(0.0)
    }
}

impl fmt::Display for LengthValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(v) => write!(f, "{v}px"),
            Self::Em(v) => write!(f, "{v}em"),
            Self::Rem(v) => write!(f, "{v}rem"),
            Self::Vw(v) => write!(f, "{v}vw"),
            Self::Vh(v) => write!(f, "{v}vh"),
            Self::Percent(v) => write!(f, "{v}%"),
        }
    }
}

impl From<LengthValue> for String {
    fn from(value: LengthValue) -> Self {
        value.to_string()
    }
}

impl FromStr for LengthValue {
    type Err = ParseLengthError;

    /// [§ 4.1 Lengths](https://www.w3.org/TR/css-values-4/#lengths)
    ///
    /// Accepts `<number><unit>`, `<number>%`, and a bare number (read as px).
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Err(ParseLengthError::AutoNotAllowed);
        }

        let split = trimmed
            .find(|c: char| c.is_ascii_alphabetic() || c == '%')
            .unwrap_or(trimmed.len());
        let (number, unit) = trimmed.split_at(split);
        let value: f32 = number
            .trim()
            .parse()
            .map_err(|_| ParseLengthError::InvalidNumber(input.to_string()))?;

        match unit.to_ascii_lowercase().as_str() {
            "" | "px" => Ok(Self::Px(value)),
            "em" => Ok(Self::Em(value)),
            "rem" => Ok(Self::Rem(value)),
            "vw" => Ok(Self::Vw(value)),
            "vh" => Ok(Self::Vh(value)),
            "%" => Ok(Self::Percent(value)),
            // Absolute units from § 6.1, converted at parse time.
            "pt" => Ok(Self::Px(value * 96.0 / 72.0)),
            "in" => Ok(Self::Px(value * 96.0)),
            "cm" => Ok(Self::Px(value * 96.0 / 2.54)),
            "mm" => Ok(Self::Px(value * 96.0 / 25.4)),
            _ => Err(ParseLengthError::UnsupportedUnit {
                input: input.to_string(),
                unit: unit.to_string(),
            }),
        }
    }
}

/// Wire form of a length: CSS text or a bare pixel number.
#[derive(Deserialize)]
#[serde(untagged)]
enum LengthRepr {
    Number(f32),
    Text(String),
}

impl TryFrom<LengthRepr> for LengthValue {
    type Error = ParseLengthError;

    fn try_from(repr: LengthRepr) -> Result<Self, Self::Error> {
        match repr {
            LengthRepr::Number(px) => Ok(Self::Px(px)),
            LengthRepr::Text(text) => text.parse(),
        }
    }
}

/// [§ 4.4 Automatic values](https://www.w3.org/TR/CSS2/cascade.html#value-def-auto)
///
/// "Some properties can take the keyword 'auto' as a value. This keyword
/// allows the user agent to compute the value based on other properties."
///
/// [§ 10.3.3 Block-level, non-replaced elements in normal flow](https://www.w3.org/TR/CSS2/visudet.html#blockwidth)
///
/// "If both 'margin-left' and 'margin-right' are 'auto', their used values
/// are equal. This horizontally centers the element with respect to the
/// edges of the containing block."
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LengthRepr", into = "String")]
pub enum AutoLength {
    /// The value is 'auto' and will be resolved during layout.
    Auto,

    /// A specific length value (px, em, etc.).
    Length(LengthValue),
}

impl AutoLength {
    /// `0px`, the initial value of the margin properties.
    pub const ZERO: Self = Self::Length(LengthValue::ZERO);

    /// Shorthand for a pixel length.
    #[must_use]
    pub const fn px(px: f32) -> Self {
        Self::Length(LengthValue::Px(px))
    }

    /// Check if the value is 'auto'.
    #[must_use]
    pub const fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }

    /// Resolve to pixels. `None` for `auto` and for a percentage of an
    /// indefinite basis, which behaves as `auto` for sizing properties.
    #[must_use]
    pub fn resolve(self, percent_basis: Option<f32>, ctx: &LengthContext) -> Option<f32> {
        match self {
            Self::Auto => None,
            Self::Length(len) => len.resolve(percent_basis, ctx),
        }
    }
}

impl fmt::Display for AutoLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Length(len) => len.fmt(f),
        }
    }
}

impl From<AutoLength> for String {
    fn from(value: AutoLength) -> Self {
        value.to_string()
    }
}

impl FromStr for AutoLength {
    type Err = ParseLengthError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.trim().eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            input.parse().map(Self::Length)
        }
    }
}

impl TryFrom<LengthRepr> for AutoLength {
    type Error = ParseLengthError;

    fn try_from(repr: LengthRepr) -> Result<Self, Self::Error> {
        match repr {
            LengthRepr::Number(px) => Ok(Self::px(px)),
            LengthRepr::Text(text) => text.parse(),
        }
    }
}

/// Replace NaN and infinities with 0.
///
/// Upstream style resolution can hand over garbage for unresolved
/// percentages; layout never lets it into geometry.
#[must_use]
pub fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() { value } else { 0.0 }
}

/// Clamp a size to a finite, non-negative value.
#[must_use]
pub fn non_negative(value: f32) -> f32 {
    finite_or_zero(value).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!("12px".parse::<LengthValue>(), Ok(LengthValue::Px(12.0)));
        assert_eq!("1.5em".parse::<LengthValue>(), Ok(LengthValue::Em(1.5)));
        assert_eq!("50%".parse::<LengthValue>(), Ok(LengthValue::Percent(50.0)));
        assert_eq!("0".parse::<LengthValue>(), Ok(LengthValue::Px(0.0)));
        assert_eq!("72pt".parse::<LengthValue>(), Ok(LengthValue::Px(96.0)));
        assert!("12furlongs".parse::<LengthValue>().is_err());
        assert_eq!("auto".parse::<AutoLength>(), Ok(AutoLength::Auto));
    }

    #[test]
    fn test_percent_of_indefinite_basis_is_unresolved() {
        let ctx = LengthContext::default();
        assert_eq!(LengthValue::Percent(50.0).resolve(None, &ctx), None);
        assert_eq!(LengthValue::Percent(50.0).resolve(Some(300.0), &ctx), Some(150.0));
    }

    #[test]
    fn test_relative_units_use_context() {
        let ctx = LengthContext {
            font_size: 20.0,
            root_font_size: 10.0,
            viewport_width: 800.0,
            viewport_height: 600.0,
        };
        assert_eq!(LengthValue::Em(2.0).resolve(None, &ctx), Some(40.0));
        assert_eq!(LengthValue::Rem(2.0).resolve(None, &ctx), Some(20.0));
        assert_eq!(LengthValue::Vw(10.0).resolve(None, &ctx), Some(80.0));
        assert_eq!(LengthValue::Vh(10.0).resolve(None, &ctx), Some(60.0));
    }

    #[test]
    fn test_non_finite_values_are_sanitized() {
        let ctx = LengthContext::default();
        assert_eq!(LengthValue::Px(f32::NAN).resolve(None, &ctx), Some(0.0));
        assert_eq!(non_negative(-4.0), 0.0);
        assert_eq!(non_negative(f32::INFINITY), 0.0);
    }
}
