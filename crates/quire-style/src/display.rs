//! CSS Display property types
//!
//! [§ 2 Box Layout Modes: the display property](https://www.w3.org/TR/css-display-3/#the-display-properties)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

// [§ 2 Box Layout Modes: the display property](https://www.w3.org/TR/css-display-3/#the-display-properties)
//
// "The display property defines an element's display type, which consists of
// the two basic qualities of how an element generates boxes:
//   - the inner display type, which defines the kind of formatting context
//     it generates, dictating how its descendant boxes are laid out.
//   - the outer display type, which dictates how the principal box itself
//     participates in flow layout."

/// [§ 2.1 Outer Display Roles](https://www.w3.org/TR/css-display-3/#outer-role)
///
/// "The `<display-outside>` keywords specify the element's outer display type,
/// which is essentially its principal box's role in flow layout."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OuterDisplayType {
    /// "The element generates a block-level box when placed in flow layout."
    Block,
    /// "The element generates an inline-level box when placed in flow layout."
    Inline,
}

/// [§ 17.2 The CSS table model](https://www.w3.org/TR/CSS2/tables.html#table-display)
///
/// Which row group a `table-*-group` box belongs to. Header groups are laid
/// out before all other rows and footer groups after them, whatever their
/// position in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TableSection {
    /// `table-header-group`
    Head,
    /// `table-row-group`
    Body,
    /// `table-footer-group`
    Foot,
}

/// [§ 2.2 Inner Display Layout Models](https://www.w3.org/TR/css-display-3/#inner-model)
///
/// "The `<display-inside>` keywords specify the element's inner display type,
/// which defines the type of formatting context that lays out its contents."
///
/// The table-internal layout types of [§ 2.4](https://www.w3.org/TR/css-display-3/#layout-specific-display)
/// are folded in here, since they only ever appear inside a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InnerDisplayType {
    /// "The element lays out its contents using flow layout (block-and-inline layout)."
    Flow,
    /// Same as Flow but always establishes a new block formatting context.
    FlowRoot,
    /// "The element lays out its contents using table layout."
    Table,
    /// A row group inside a table.
    TableRowGroup(TableSection),
    /// A row inside a table or row group.
    TableRow,
    /// A cell inside a row. Cells lay out their contents as flow roots.
    TableCell,
    /// "The element lays out its contents using flex layout."
    Flex,
    /// "The element lays out its contents using grid layout."
    Grid,
}

/// Combined display value
/// [§ 2 Box Layout Modes](https://www.w3.org/TR/css-display-3/#the-display-properties)
///
/// `display: none` is not a `DisplayValue`; computed styles carry it as
/// `Option::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayValue {
    /// "The outer display type, which dictates how the box participates in flow layout."
    pub outer: OuterDisplayType,
    /// "The inner display type, which dictates how its descendant boxes are laid out."
    pub inner: InnerDisplayType,
}

impl DisplayValue {
    const fn new(outer: OuterDisplayType, inner: InnerDisplayType) -> Self {
        Self { outer, inner }
    }

    /// `display: block` - block outer, flow inner
    #[must_use]
    pub const fn block() -> Self {
        Self::new(OuterDisplayType::Block, InnerDisplayType::Flow)
    }

    /// `display: inline` - inline outer, flow inner
    #[must_use]
    pub const fn inline() -> Self {
        Self::new(OuterDisplayType::Inline, InnerDisplayType::Flow)
    }

    /// `display: inline-block` - inline outer, flow-root inner
    #[must_use]
    pub const fn inline_block() -> Self {
        Self::new(OuterDisplayType::Inline, InnerDisplayType::FlowRoot)
    }

    /// `display: flow-root` - block outer, flow-root inner
    #[must_use]
    pub const fn flow_root() -> Self {
        Self::new(OuterDisplayType::Block, InnerDisplayType::FlowRoot)
    }

    /// `display: flex` - block outer, flex inner
    #[must_use]
    pub const fn flex() -> Self {
        Self::new(OuterDisplayType::Block, InnerDisplayType::Flex)
    }

    /// `display: inline-flex` - inline outer, flex inner
    #[must_use]
    pub const fn inline_flex() -> Self {
        Self::new(OuterDisplayType::Inline, InnerDisplayType::Flex)
    }

    /// `display: grid` - block outer, grid inner
    #[must_use]
    pub const fn grid() -> Self {
        Self::new(OuterDisplayType::Block, InnerDisplayType::Grid)
    }

    /// `display: table`
    #[must_use]
    pub const fn table() -> Self {
        Self::new(OuterDisplayType::Block, InnerDisplayType::Table)
    }

    /// `display: table-header-group`, `table-row-group`, `table-footer-group`
    #[must_use]
    pub const fn table_row_group(section: TableSection) -> Self {
        Self::new(OuterDisplayType::Block, InnerDisplayType::TableRowGroup(section))
    }

    /// `display: table-row`
    #[must_use]
    pub const fn table_row() -> Self {
        Self::new(OuterDisplayType::Block, InnerDisplayType::TableRow)
    }

    /// `display: table-cell`
    #[must_use]
    pub const fn table_cell() -> Self {
        Self::new(OuterDisplayType::Block, InnerDisplayType::TableCell)
    }

    /// Inline-level boxes participate in an inline formatting context.
    #[must_use]
    pub const fn is_inline_level(&self) -> bool {
        matches!(self.outer, OuterDisplayType::Inline)
    }

    /// Inline-level boxes that are laid out as a single unbreakable unit.
    #[must_use]
    pub const fn is_atomic_inline(&self) -> bool {
        self.is_inline_level() && !matches!(self.inner, InnerDisplayType::Flow)
    }

    /// Rows, row groups and cells: boxes that only make sense inside a table.
    #[must_use]
    pub const fn is_table_internal(&self) -> bool {
        matches!(
            self.inner,
            InnerDisplayType::TableRowGroup(_)
                | InnerDisplayType::TableRow
                | InnerDisplayType::TableCell
        )
    }
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use InnerDisplayType as Inner;
        use OuterDisplayType as Outer;

        let keyword = match (self.outer, self.inner) {
            (Outer::Block, Inner::Flow) => "block",
            (Outer::Inline, Inner::Flow) => "inline",
            (Outer::Inline, Inner::FlowRoot) => "inline-block",
            (Outer::Block, Inner::FlowRoot) => "flow-root",
            (Outer::Block, Inner::Flex) => "flex",
            (Outer::Inline, Inner::Flex) => "inline-flex",
            (Outer::Block, Inner::Grid) => "grid",
            (Outer::Inline, Inner::Grid) => "inline-grid",
            (Outer::Block, Inner::Table) => "table",
            (Outer::Inline, Inner::Table) => "inline-table",
            (_, Inner::TableRowGroup(TableSection::Head)) => "table-header-group",
            (_, Inner::TableRowGroup(TableSection::Body)) => "table-row-group",
            (_, Inner::TableRowGroup(TableSection::Foot)) => "table-footer-group",
            (_, Inner::TableRow) => "table-row",
            (_, Inner::TableCell) => "table-cell",
        };
        f.write_str(keyword)
    }
}

/// Error for a `display` keyword the engine does not recognize.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported display value '{0}'")]
pub struct ParseDisplayError(pub String);

impl FromStr for DisplayValue {
    type Err = ParseDisplayError;

    /// [§ 2 The display property](https://www.w3.org/TR/css-display-3/#the-display-properties)
    ///
    /// `none` is rejected here; see [`parse_display`].
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let value = match input.trim().to_ascii_lowercase().as_str() {
            "block" => Self::block(),
            "inline" => Self::inline(),
            "inline-block" => Self::inline_block(),
            "flow-root" => Self::flow_root(),
            "flex" => Self::flex(),
            "inline-flex" => Self::inline_flex(),
            "grid" => Self::grid(),
            "inline-grid" => Self::new(OuterDisplayType::Inline, InnerDisplayType::Grid),
            "table" => Self::table(),
            "inline-table" => Self::new(OuterDisplayType::Inline, InnerDisplayType::Table),
            "table-header-group" => Self::table_row_group(TableSection::Head),
            "table-row-group" => Self::table_row_group(TableSection::Body),
            "table-footer-group" => Self::table_row_group(TableSection::Foot),
            "table-row" => Self::table_row(),
            "table-cell" => Self::table_cell(),
            _ => return Err(ParseDisplayError(input.to_string())),
        };
        Ok(value)
    }
}

impl TryFrom<String> for DisplayValue {
    type Error = ParseDisplayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DisplayValue> for String {
    fn from(value: DisplayValue) -> Self {
        value.to_string()
    }
}

/// [§ 2.6 display: none](https://www.w3.org/TR/css-display-3/#valdef-display-none)
///
/// Parse a full `display` value, mapping `none` to `Ok(None)`.
///
/// # Errors
/// Returns [`ParseDisplayError`] for unrecognized keywords.
pub fn parse_display(input: &str) -> Result<Option<DisplayValue>, ParseDisplayError> {
    if input.trim().eq_ignore_ascii_case("none") {
        Ok(None)
    } else {
        input.parse().map(Some)
    }
}

/// Serde adapter for `Option<DisplayValue>` that spells `None` as `"none"`.
pub mod serde_display {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{DisplayValue, parse_display};

    /// Serialize `None` as `"none"`.
    ///
    /// # Errors
    /// Propagates serializer errors.
    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<DisplayValue>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(display) => serializer.serialize_str(&display.to_string()),
            None => serializer.serialize_str("none"),
        }
    }

    /// Deserialize a display keyword, with `"none"` as `None`.
    ///
    /// # Errors
    /// Fails on unrecognized keywords.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DisplayValue>, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_display(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_round_trip() {
        for keyword in ["block", "inline-block", "flex", "table-header-group", "table-cell"] {
            let value: DisplayValue = keyword.parse().expect("known keyword");
            assert_eq!(value.to_string(), keyword);
        }
    }

    #[test]
    fn test_none_is_not_a_display_value() {
        assert!("none".parse::<DisplayValue>().is_err());
        assert_eq!(parse_display("none"), Ok(None));
        assert_eq!(parse_display("grid"), Ok(Some(DisplayValue::grid())));
    }

    #[test]
    fn test_atomic_inline() {
        assert!(DisplayValue::inline_block().is_atomic_inline());
        assert!(DisplayValue::inline_flex().is_atomic_inline());
        assert!(!DisplayValue::inline().is_atomic_inline());
        assert!(!DisplayValue::block().is_atomic_inline());
    }
}
