//! The layout orchestrator.

use std::sync::Arc;

use quire_tree::{BoxGeometry, LayoutTree, NodeId, Rect};

use crate::box_tree::normalize_box_tree;
use crate::config::LayoutConfig;
use crate::context::{ContainingBlock, LayoutContext, LayoutEnvironment, LayoutInput, Viewport};
use crate::error::LayoutError;
use crate::out_of_flow::layout_out_of_flow;
use crate::resolve::length_context;
use crate::strategy::{DEFAULT_STRATEGY_ORDER, LayoutStrategy};
use crate::text::{ApproximateFontMetrics, FontMetrics, UnicodeLineBreaker, assign_intrinsic_metrics};

/// A piece of laid-out content assigned to one page.
///
/// Fragmentation is not performed; see [`LayoutEngine::fragment_flow`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    /// The box this fragment belongs to.
    pub node: NodeId,
    /// Zero-based page index.
    pub page: usize,
    /// The part of the box on that page.
    pub bounds: Rect,
}

/// Lays out a [`LayoutTree`] in place.
///
/// Owns the strategy table and configuration; every call to
/// [`Self::layout_tree`] builds its own context, so an engine can be
/// reused for any number of trees.
pub struct LayoutEngine {
    strategies: Vec<Box<dyn LayoutStrategy>>,
    config: LayoutConfig,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<String> = self
            .strategies
            .iter()
            .map(|strategy| strategy.kind().to_string())
            .collect();
        f.debug_struct("LayoutEngine")
            .field("strategies", &kinds)
            .field("config", &self.config)
            .finish()
    }
}

impl LayoutEngine {
    /// An engine with the built-in strategies in
    /// [`DEFAULT_STRATEGY_ORDER`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_strategies(
            DEFAULT_STRATEGY_ORDER
                .iter()
                .map(|kind| kind.build())
                .collect(),
        )
    }

    /// An engine that tries `strategies` in the given order.
    #[must_use]
    pub fn with_strategies(strategies: Vec<Box<dyn LayoutStrategy>>) -> Self {
        Self {
            strategies,
            config: LayoutConfig::default(),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: LayoutConfig) -> Self {
        self.config = config;
        self
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Resolve the geometry of every box in `tree`.
    ///
    /// Without `font_metrics`, text is measured with
    /// [`ApproximateFontMetrics`] built from the configuration.
    ///
    /// # Errors
    /// [`LayoutError::UnhandledDisplay`] when no strategy accepts a box,
    /// [`LayoutError::TooDeep`] past the configured depth. The tree's
    /// geometry is unspecified after an error.
    pub fn layout_tree<'t>(
        &self,
        tree: &'t mut LayoutTree,
        viewport: Viewport,
        font_metrics: Option<&dyn FontMetrics>,
    ) -> Result<&'t mut LayoutTree, LayoutError> {
        let fallback = ApproximateFontMetrics::from_config(&self.config);
        let metrics = font_metrics.unwrap_or(&fallback);
        let viewport = Viewport::new(sanitize(viewport.width), sanitize(viewport.height));
        let root = tree.root();

        // STEP 1: Anonymous boxes, then intrinsic text metrics.
        let _ = normalize_box_tree(tree);
        let root_style = tree
            .get(root)
            .map(|node| Arc::clone(&node.style))
            .ok_or(LayoutError::MissingNode(root))?;
        let root_font_size = root_style.font_size;
        assign_intrinsic_metrics(tree, metrics, &length_context(&root_style, viewport, root_font_size));

        // STEP 2: Seed the root box with the viewport.
        if let Some(node) = tree.get_mut(root) {
            node.geometry = BoxGeometry {
                content: Rect::new(0.0, 0.0, viewport.width, viewport.height),
                ..BoxGeometry::default()
            };
        }

        // STEP 3: The in-flow pass, from the root down.
        let line_breaker = UnicodeLineBreaker;
        let env = LayoutEnvironment {
            viewport,
            metrics,
            line_breaker: &line_breaker,
            config: &self.config,
            root_font_size,
        };
        {
            let mut ctx = LayoutContext::new(env, tree, &self.strategies);
            let input = LayoutInput::in_block(ContainingBlock::from_viewport(viewport));
            log::debug!(
                target: "quire::layout",
                "in-flow pass over {} nodes in {}x{}",
                ctx.tree.len(),
                viewport.width,
                viewport.height
            );
            let _ = ctx.layout_child(root, &input)?;

            // STEP 4: Positioned boxes, now that in-flow geometry is final.
            let _ = layout_out_of_flow(&mut ctx)?;
            if !ctx.warnings().is_empty() {
                log::debug!(
                    target: "quire::layout",
                    "{} unsupported feature(s) reported",
                    ctx.warnings().len()
                );
            }
        }
        Ok(tree)
    }

    /// Split laid-out content into pages.
    ///
    /// Pagination is outside this engine: content is one continuous flow
    /// and this always returns no fragments.
    #[must_use]
    pub fn fragment_flow(&self, _tree: &LayoutTree, _page_height: f32) -> Vec<Fragment> {
        Vec::new()
    }
}

/// Viewport sizes must be finite and non-negative.
fn sanitize(size: f32) -> f32 {
    if size.is_finite() && size > 0.0 {
        size
    } else {
        log::trace!(target: "quire::layout", "viewport size {size} clamped to 0");
        0.0
    }
}

#[cfg(test)]
mod tests {
    use quire_style::ComputedStyle;
    use quire_tree::LayoutNode;

    use super::*;

    #[test]
    fn test_root_fills_viewport() {
        let mut tree = LayoutTree::new(LayoutNode::element("html", Arc::new(ComputedStyle::block())));
        let engine = LayoutEngine::new();
        let tree = engine
            .layout_tree(&mut tree, Viewport::new(640.0, 480.0), None)
            .unwrap();
        let root = tree.get(tree.root()).unwrap();
        assert_eq!(root.geometry.content, Rect::new(0.0, 0.0, 640.0, 480.0));
    }

    #[test]
    fn test_no_strategies_is_unhandled() {
        let mut tree = LayoutTree::new(LayoutNode::element("html", Arc::new(ComputedStyle::block())));
        let engine = LayoutEngine::with_strategies(Vec::new());
        let err = engine
            .layout_tree(&mut tree, Viewport::new(100.0, 100.0), None)
            .unwrap_err();
        assert!(matches!(err, LayoutError::UnhandledDisplay { .. }));
    }

    #[test]
    fn test_fragment_flow_is_empty() {
        let tree = LayoutTree::new(LayoutNode::element("html", Arc::new(ComputedStyle::block())));
        assert!(LayoutEngine::new().fragment_flow(&tree, 800.0).is_empty());
    }

    #[test]
    fn test_too_deep_trees_fail() {
        let style = Arc::new(ComputedStyle::block());
        let mut tree = LayoutTree::new(LayoutNode::element("div", Arc::clone(&style)));
        let mut parent = tree.root();
        for _ in 0..8 {
            parent = tree.append_child(parent, LayoutNode::element("div", Arc::clone(&style)));
        }
        let engine = LayoutEngine::new().with_config(LayoutConfig {
            max_depth: 4,
            ..LayoutConfig::default()
        });
        let err = engine
            .layout_tree(&mut tree, Viewport::new(100.0, 100.0), None)
            .unwrap_err();
        assert!(matches!(err, LayoutError::TooDeep { limit: 4, .. }));
    }
}
