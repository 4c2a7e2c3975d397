//! Per-run layout state and the dispatch entry point strategies recurse
//! through.

use std::sync::Arc;

use quire_common::warning::WarningSet;
use quire_style::{ComputedStyle, Position};
use quire_tree::{LayoutNode, LayoutTree, NodeId};
use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::error::LayoutError;
use crate::float::FloatContext;
use crate::margin::CollapsedMargin;
use crate::resolve::UsedValues;
use crate::strategy::{LayoutStrategy, StrategyKind};
use crate::text::{FontMetrics, LineBreaker};

/// The page or window the root box is laid out in.
///
/// [§ 10.1 Definition of "containing block"](https://www.w3.org/TR/CSS2/visudet.html#containing-block-details)
///
/// "The containing block in which the root element lives is a rectangle
/// called the initial containing block."
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in px.
    pub width: f32,
    /// Height in px.
    pub height: f32,
}

impl Viewport {
    /// A viewport of the given size.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// The rectangle percentages and offsets of a box are resolved against.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContainingBlock {
    /// Absolute x of the left edge.
    pub x: f32,
    /// Absolute y of the top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height, when it does not depend on content.
    pub height: Option<f32>,
}

impl ContainingBlock {
    /// The initial containing block.
    #[must_use]
    pub const fn from_viewport(viewport: Viewport) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: viewport.width,
            height: Some(viewport.height),
        }
    }
}

/// Where and how big a box should be laid out, as decided by its parent's
/// formatting context.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayoutInput {
    /// Containing block for percentages.
    pub containing_block: ContainingBlock,
    /// Absolute x of the left edge of the space the margin box goes in.
    pub x: f32,
    /// Absolute y of the top margin edge.
    pub y: f32,
    /// Width of the space the margin box goes in.
    pub available_width: f32,
    /// Distance from `y` to the border-box top when the parent has already
    /// collapsed this box's top margin with its neighbours. `None` means
    /// the box's own top margin is used.
    pub collapsed_margin_top: Option<f32>,
    /// Used content width decided by the parent (flex main size, table
    /// column, absolute positioning).
    pub width_override: Option<f32>,
    /// Used content height decided by the parent.
    pub height_override: Option<f32>,
    /// Size an `auto` width with the shrink-to-fit rule instead of filling
    /// the available width.
    pub shrink_to_fit: bool,
}

impl LayoutInput {
    /// Fill the containing block, starting at its top-left corner.
    #[must_use]
    pub const fn in_block(containing_block: ContainingBlock) -> Self {
        Self {
            containing_block,
            x: containing_block.x,
            y: containing_block.y,
            available_width: containing_block.width,
            collapsed_margin_top: None,
            width_override: None,
            height_override: None,
            shrink_to_fit: false,
        }
    }
}

/// What a laid-out box reports back to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOutcome {
    /// Margins adjoining the bottom border edge that the parent still has to
    /// place: the box's own bottom margin, and its last child's when they
    /// collapse through.
    pub collapsed_bottom: CollapsedMargin,
    /// The box's top and bottom margins are adjoining: it has no height, no
    /// border or padding, and no in-flow content.
    pub collapsed_through: bool,
    /// The box takes part in its parent's flow. False for out-of-flow and
    /// `display: none` boxes, which the parent skips when stacking.
    pub in_flow: bool,
}

impl LayoutOutcome {
    /// An in-flow box whose bottom margin is `collapsed_bottom`.
    #[must_use]
    pub const fn in_flow(collapsed_bottom: CollapsedMargin) -> Self {
        Self {
            collapsed_bottom,
            collapsed_through: false,
            in_flow: true,
        }
    }

    /// A box that takes no room in its parent's flow.
    #[must_use]
    pub const fn out_of_flow() -> Self {
        Self {
            collapsed_bottom: CollapsedMargin::zero(),
            collapsed_through: false,
            in_flow: false,
        }
    }
}

/// Read-only services for one layout run.
#[derive(Clone, Copy)]
pub struct LayoutEnvironment<'a> {
    /// Initial containing block size.
    pub viewport: Viewport,
    /// Text measurement.
    pub metrics: &'a dyn FontMetrics,
    /// Line breaking.
    pub line_breaker: &'a dyn LineBreaker,
    /// Engine tunables.
    pub config: &'a LayoutConfig,
    /// Computed font size of the root box, for `rem`.
    pub root_font_size: f32,
}

/// Mutable state for one layout run.
///
/// Owns nothing past the run: the tree is borrowed, the float context stack
/// is dropped when the run ends.
pub struct LayoutContext<'a> {
    /// Services shared by every strategy.
    pub env: LayoutEnvironment<'a>,
    /// The tree being laid out.
    pub tree: &'a mut LayoutTree,
    strategies: &'a [Box<dyn LayoutStrategy>],
    /// One float context per block formatting context currently open;
    /// the innermost is last.
    pub floats: Vec<FloatContext>,
    depth: usize,
    warnings: WarningSet,
}

impl<'a> LayoutContext<'a> {
    /// Start a run over `tree` with the given strategies, in priority order.
    #[must_use]
    pub fn new(
        env: LayoutEnvironment<'a>,
        tree: &'a mut LayoutTree,
        strategies: &'a [Box<dyn LayoutStrategy>],
    ) -> Self {
        Self {
            env,
            tree,
            strategies,
            floats: Vec::new(),
            depth: 0,
            warnings: WarningSet::new(),
        }
    }

    /// Lay out `id` with the first strategy that accepts it.
    ///
    /// Strategies never call each other directly; every child goes through
    /// here.
    ///
    /// # Errors
    /// Fails when no strategy accepts the node, when the tree is too deep,
    /// or with any error from the chosen strategy.
    pub fn layout_child(&mut self, id: NodeId, input: &LayoutInput) -> Result<LayoutOutcome, LayoutError> {
        self.dispatch(id, input, false)
    }

    /// Like [`Self::layout_child`], but lays out an out-of-flow box in
    /// place instead of deferring it. Used by the out-of-flow pass.
    ///
    /// # Errors
    /// See [`Self::layout_child`].
    pub fn layout_child_in_flow(
        &mut self,
        id: NodeId,
        input: &LayoutInput,
    ) -> Result<LayoutOutcome, LayoutError> {
        self.dispatch(id, input, true)
    }

    fn dispatch(
        &mut self,
        id: NodeId,
        input: &LayoutInput,
        skip_out_of_flow: bool,
    ) -> Result<LayoutOutcome, LayoutError> {
        let limit = self.env.config.max_depth;
        if self.depth >= limit {
            return Err(LayoutError::TooDeep { node: id, limit });
        }

        let node = self.node(id)?;
        let strategies = self.strategies;
        let Some(strategy) = strategies.iter().find(|strategy| {
            !(skip_out_of_flow && strategy.kind() == StrategyKind::OutOfFlow) && strategy.can_layout(node)
        }) else {
            let display = node
                .style
                .display
                .map_or_else(|| "none".to_string(), |display| display.to_string());
            return Err(LayoutError::UnhandledDisplay { node: id, display });
        };
        log::trace!(target: "quire::layout", "{id} {} -> {}", node.label(), strategy.kind());

        self.depth += 1;
        let outcome = strategy.layout(id, input, self);
        self.depth -= 1;
        let outcome = outcome?;

        if outcome.in_flow {
            self.apply_relative_offset(id, input)?;
        }
        Ok(outcome)
    }

    /// [§ 9.4.3 Relative positioning](https://www.w3.org/TR/CSS2/visuren.html#relative-positioning)
    ///
    /// "Once a box has been laid out according to the normal flow or
    /// floated, it may be shifted relative to this position. ... Offsetting
    /// a box (B1) in this way has no effect on the box (B2) that follows."
    fn apply_relative_offset(&mut self, id: NodeId, input: &LayoutInput) -> Result<(), LayoutError> {
        let style = self.style(id)?;
        match style.position {
            Position::Relative => {
                let cb = input.containing_block;
                let (dx, dy) = self.used_values(&style, cb.width, cb.height).relative_offset();
                self.tree.shift_subtree(id, dx, dy);
            }
            Position::Sticky => {
                self.warn_once("position: sticky is laid out as static");
            }
            Position::Static | Position::Absolute | Position::Fixed => {}
        }
        Ok(())
    }

    /// Report an unsupported feature, once per run.
    pub fn warn_once(&self, message: &str) {
        let _ = self.warnings.warn_once("layout", message);
    }

    /// Unsupported features reported so far in this run.
    #[must_use]
    pub const fn warnings(&self) -> &WarningSet {
        &self.warnings
    }

    /// Borrow a node.
    ///
    /// # Errors
    /// [`LayoutError::MissingNode`] when `id` is not in the tree.
    pub fn node(&self, id: NodeId) -> Result<&LayoutNode, LayoutError> {
        self.tree.get(id).ok_or(LayoutError::MissingNode(id))
    }

    /// Mutably borrow a node.
    ///
    /// # Errors
    /// [`LayoutError::MissingNode`] when `id` is not in the tree.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut LayoutNode, LayoutError> {
        self.tree.get_mut(id).ok_or(LayoutError::MissingNode(id))
    }

    /// A node's shared style.
    ///
    /// # Errors
    /// [`LayoutError::MissingNode`] when `id` is not in the tree.
    pub fn style(&self, id: NodeId) -> Result<Arc<ComputedStyle>, LayoutError> {
        self.node(id).map(|node| Arc::clone(&node.style))
    }

    /// Children of `id`, copied out so the tree can be mutated while
    /// iterating.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.tree.children(id).to_vec()
    }

    /// Used-value resolver for `style` in a containing block of the given
    /// size.
    #[must_use]
    pub fn used_values<'s>(
        &self,
        style: &'s ComputedStyle,
        cb_width: f32,
        cb_height: Option<f32>,
    ) -> UsedValues<'s> {
        UsedValues::new(
            style,
            cb_width,
            cb_height,
            self.env.viewport,
            self.env.root_font_size,
        )
    }

    /// The float context of the innermost open block formatting context.
    #[must_use]
    pub fn float_context(&self) -> Option<&FloatContext> {
        self.floats.last()
    }

    /// Mutable access to the innermost float context.
    pub fn float_context_mut(&mut self) -> Option<&mut FloatContext> {
        self.floats.last_mut()
    }
}

#[cfg(test)]
mod tests {
    use quire_tree::LayoutNode;

    use super::*;
    use crate::strategy::DEFAULT_STRATEGY_ORDER;
    use crate::text::{ApproximateFontMetrics, UnicodeLineBreaker};

    #[test]
    fn test_each_run_reports_its_own_warnings() {
        let config = LayoutConfig::default();
        let metrics = ApproximateFontMetrics::from_config(&config);
        let line_breaker = UnicodeLineBreaker;
        let strategies: Vec<Box<dyn LayoutStrategy>> =
            DEFAULT_STRATEGY_ORDER.iter().map(|kind| kind.build()).collect();
        let env = LayoutEnvironment {
            viewport: Viewport::new(100.0, 100.0),
            metrics: &metrics,
            line_breaker: &line_breaker,
            config: &config,
            root_font_size: 16.0,
        };
        let mut tree = LayoutTree::new(LayoutNode::element("html", Arc::new(ComputedStyle::block())));

        for _ in 0..2 {
            let ctx = LayoutContext::new(env, &mut tree, &strategies);
            assert!(ctx.warnings().is_empty());
            ctx.warn_once("position: sticky is laid out as static");
            ctx.warn_once("position: sticky is laid out as static");
            assert_eq!(ctx.warnings().len(), 1);
            assert!(ctx.warnings().was_warned("layout", "position: sticky is laid out as static"));
        }
    }
}
