//! Computed style values for the Quire layout engine.
//!
//! The cascade has already run by the time a tree reaches layout. What is
//! left is a flat record of computed values per box: lengths that may
//! still be relative (percentages, font- and viewport-relative units),
//! the `auto` keyword, and the keyword properties that select a
//! formatting context.
//!
//! - [`length`]: `<length-percentage>` and `auto`, with resolution to px
//! - [`display`]: outer/inner display types
//! - [`computed`]: the [`ComputedStyle`] record and its keyword enums

pub mod computed;
pub mod display;
pub mod length;

pub use computed::{
    AlignItems, AlignSelf, BoxSizing, Clear, ComputedStyle, Edges, FlexDirection, FlexWrap,
    FloatMode, FontStyle, JustifyContent, LineHeight, Overflow, Position, TextAlign, WhiteSpace,
};
pub use display::{DisplayValue, InnerDisplayType, OuterDisplayType, TableSection};
pub use length::{AutoLength, LengthContext, LengthValue, ParseLengthError};
