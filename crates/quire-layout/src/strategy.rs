//! Layout strategies: one per family of display types.
//!
//! [§ 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen)
//!
//! The engine asks each configured strategy in turn whether it can lay out
//! a node and hands the node to the first that can. Strategies recurse into
//! children through [`LayoutContext::layout_child`], never directly.

use quire_tree::{BoxGeometry, LayoutNode, NodeId};
use strum_macros::{Display, EnumIter};

use crate::block::BlockStrategy;
use crate::context::{LayoutContext, LayoutInput, LayoutOutcome};
use crate::error::LayoutError;
use crate::flex::FlexStrategy;
use crate::inline::InlineStrategy;
use crate::out_of_flow::OutOfFlowStrategy;
use crate::table::TableStrategy;

/// Names the built-in strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum StrategyKind {
    /// `position: absolute | fixed`, deferred to the out-of-flow pass.
    OutOfFlow,
    /// `display: none`.
    Hidden,
    /// `display: table | inline-table`.
    Table,
    /// `display: flex | inline-flex`.
    Flex,
    /// Block containers, atomic inlines, replaced content and orphan table
    /// parts.
    Block,
    /// Inline-level content dispatched on its own.
    Inline,
}

impl StrategyKind {
    /// Instantiate the built-in strategy of this kind.
    #[must_use]
    pub fn build(self) -> Box<dyn LayoutStrategy> {
        match self {
            Self::OutOfFlow => Box::new(OutOfFlowStrategy),
            Self::Hidden => Box::new(HiddenStrategy),
            Self::Table => Box::new(TableStrategy),
            Self::Flex => Box::new(FlexStrategy),
            Self::Block => Box::new(BlockStrategy),
            Self::Inline => Box::new(InlineStrategy),
        }
    }
}

/// Priority order of the default engine. Earlier entries win when more
/// than one strategy accepts a node: an absolutely positioned flex
/// container is deferred before the flex strategy sees it, a hidden table
/// is never laid out as a table.
pub const DEFAULT_STRATEGY_ORDER: [StrategyKind; 6] = [
    StrategyKind::OutOfFlow,
    StrategyKind::Hidden,
    StrategyKind::Table,
    StrategyKind::Flex,
    StrategyKind::Block,
    StrategyKind::Inline,
];

/// Lays out one family of boxes.
pub trait LayoutStrategy {
    /// Which built-in strategy this is, for logging and for the out-of-flow
    /// pass, which must skip [`StrategyKind::OutOfFlow`].
    fn kind(&self) -> StrategyKind;

    /// Whether this strategy handles `node`.
    fn can_layout(&self, node: &LayoutNode) -> bool;

    /// Resolve the geometry of `id` and its subtree.
    ///
    /// # Errors
    /// Propagates failures from child dispatch.
    fn layout(
        &self,
        id: NodeId,
        input: &LayoutInput,
        ctx: &mut LayoutContext<'_>,
    ) -> Result<LayoutOutcome, LayoutError>;
}

/// [§ 9.2.4 The 'display' property](https://www.w3.org/TR/CSS2/visuren.html#display-prop)
///
/// "none: This value causes an element to not appear in the formatting
/// structure (i.e., in visual media the element generates no boxes and has
/// no effect on layout). Descendant elements do not generate any boxes
/// either."
#[derive(Debug, Clone, Copy, Default)]
pub struct HiddenStrategy;

impl LayoutStrategy for HiddenStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Hidden
    }

    fn can_layout(&self, node: &LayoutNode) -> bool {
        node.style.is_display_none()
    }

    fn layout(
        &self,
        id: NodeId,
        _input: &LayoutInput,
        ctx: &mut LayoutContext<'_>,
    ) -> Result<LayoutOutcome, LayoutError> {
        let subtree: Vec<NodeId> = ctx.tree.descendants(id).collect();
        for node in subtree {
            let node = ctx.node_mut(node)?;
            node.geometry = BoxGeometry::default();
            node.line_boxes.clear();
        }
        Ok(LayoutOutcome::out_of_flow())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quire_style::{ComputedStyle, DisplayValue};
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_built_strategies_report_their_kind() {
        for kind in StrategyKind::iter() {
            assert_eq!(kind.build().kind(), kind);
        }
    }

    #[test]
    fn test_default_order_covers_every_kind() {
        assert_eq!(DEFAULT_STRATEGY_ORDER.len(), StrategyKind::iter().count());
        for kind in StrategyKind::iter() {
            assert!(DEFAULT_STRATEGY_ORDER.contains(&kind));
        }
    }

    #[test]
    fn test_grid_matches_no_strategy() {
        let node = LayoutNode::element(
            "div",
            Arc::new(ComputedStyle::with_display(DisplayValue::grid())),
        );
        assert!(
            DEFAULT_STRATEGY_ORDER
                .iter()
                .all(|kind| !kind.build().can_layout(&node))
        );
    }

    #[test]
    fn test_hidden_accepts_display_none() {
        let node = LayoutNode::element(
            "div",
            Arc::new(ComputedStyle {
                display: None,
                ..ComputedStyle::default()
            }),
        );
        assert!(HiddenStrategy.can_layout(&node));
    }
}
