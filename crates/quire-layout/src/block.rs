//! Block formatting context.
//!
//! [§ 9.4.1 Block formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
//!
//! "In a block formatting context, boxes are laid out one after the other,
//! vertically, beginning at the top of a containing block. The vertical
//! distance between two sibling boxes is determined by the 'margin'
//! properties. Vertical margins between adjacent block-level boxes in a
//! block formatting context collapse."

use quire_style::{Clear, ComputedStyle, InnerDisplayType, Overflow};
use quire_tree::{BoxGeometry, EdgeSizes, LayoutNode, NodeId, NodeKind, Rect};

use crate::context::{ContainingBlock, LayoutContext, LayoutInput, LayoutOutcome};
use crate::error::LayoutError;
use crate::float::{FloatContext, FloatSide};
use crate::inline::{InlineArea, InlineSource, layout_inline_content};
use crate::intrinsic::content_sizes;
use crate::margin::CollapsedMargin;
use crate::resolve::{AutoEdgeSizes, AutoOr, UsedValues};
use crate::strategy::{LayoutStrategy, StrategyKind};

/// Block containers, atomic inlines, replaced content and table parts
/// found outside a table.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockStrategy;

impl LayoutStrategy for BlockStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Block
    }

    fn can_layout(&self, node: &LayoutNode) -> bool {
        if matches!(node.kind, NodeKind::Text) {
            return false;
        }
        node.style.display.is_some_and(|display| {
            matches!(
                display.inner,
                InnerDisplayType::Flow
                    | InnerDisplayType::FlowRoot
                    | InnerDisplayType::TableCell
                    | InnerDisplayType::TableRow
                    | InnerDisplayType::TableRowGroup(_)
            )
        })
    }

    fn layout(
        &self,
        id: NodeId,
        input: &LayoutInput,
        ctx: &mut LayoutContext<'_>,
    ) -> Result<LayoutOutcome, LayoutError> {
        layout_block(ctx, id, input)
    }
}

/// [§ 9.4.1 Block formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
///
/// "Floats, absolutely positioned elements, block containers (such as
/// inline-blocks, table-cells, and table-captions) that are not block
/// boxes, and block boxes with 'overflow' other than 'visible' (except when
/// that value has been propagated to the viewport) establish new block
/// formatting contexts for their contents."
pub(crate) fn establishes_bfc(ctx: &LayoutContext<'_>, id: NodeId, style: &ComputedStyle) -> bool {
    if id == ctx.tree.root()
        || style.is_floated()
        || style.position.is_out_of_flow()
        || style.overflow != Overflow::Visible
    {
        return true;
    }
    let Some(display) = style.display else {
        return false;
    };
    if display.is_atomic_inline()
        || !matches!(display.inner, InnerDisplayType::Flow)
    {
        return true;
    }
    // Flex items are flow roots.
    ctx.tree
        .parent(id)
        .and_then(|parent| ctx.tree.get(parent))
        .and_then(|parent| parent.style.display)
        .is_some_and(|display| display.inner == InnerDisplayType::Flex)
}

/// Whether the top margin of `id` adjoins the top margin of its first
/// in-flow child.
///
/// [§ 8.3.1](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
///
/// "top margin of a box and top margin of its first in-flow child" are
/// adjoining when there is "no line boxes, no clearance, no padding and no
/// border" separating them.
fn top_adjoins_first_child(ctx: &LayoutContext<'_>, id: NodeId, used: &UsedValues<'_>) -> bool {
    let Ok(node) = ctx.node(id) else {
        return false;
    };
    used.padding().top == 0.0
        && used.border().top == 0.0
        && !node.has_text()
        && node.intrinsic_replaced_size().is_none()
        && !establishes_bfc(ctx, id, used.style)
}

/// Margins adjoining a box's top border edge, predicted from style before
/// layout.
#[derive(Debug, Clone, Copy)]
struct TopMargins {
    /// Its own top margin and those of its first in-flow descendants.
    set: CollapsedMargin,
    /// The box has no in-flow content and its top and bottom margins
    /// collapse together.
    ///
    /// [§ 8.3.1 Collapsing margins](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
    ///
    /// "top and bottom margins of a box that does not establish a new block
    /// formatting context and that has zero computed 'min-height', zero or
    /// 'auto' computed 'height', and no in-flow children"
    collapses_through: bool,
}

/// The set of margins adjoining the top border edge of `id`: its own top
/// margin, and those of its first in-flow descendants while they collapse
/// through.
///
/// Looks at most `max_depth` levels down. A box at the limit keeps only
/// its own margin and is treated as having content.
fn collapsed_top_set(
    ctx: &LayoutContext<'_>,
    id: NodeId,
    cb_width: f32,
) -> Result<CollapsedMargin, LayoutError> {
    Ok(top_margins(ctx, id, cb_width, ctx.env.config.max_depth)?.set)
}

fn top_margins(
    ctx: &LayoutContext<'_>,
    id: NodeId,
    cb_width: f32,
    levels_left: usize,
) -> Result<TopMargins, LayoutError> {
    let node = ctx.node(id)?;
    let style = &node.style;
    let used = ctx.used_values(style, cb_width, None);
    let margin = used.margin();
    let mut top = TopMargins {
        set: CollapsedMargin::new(margin.top.to_px_or(0.0)),
        collapses_through: false,
    };
    if levels_left == 0 || !top_adjoins_first_child(ctx, id, &used) {
        return Ok(top);
    }

    let is_block_flow = style.display.is_some_and(|display| {
        !display.is_inline_level() && display.inner == InnerDisplayType::Flow
    });
    top.collapses_through = is_block_flow
        && used.frame_vertical() == 0.0
        && used.content_height().is_none_or(|height| height <= 0.0)
        && used.clamp_height(0.0) <= 0.0;

    let inner_width = used
        .content_width()
        .unwrap_or_else(|| cb_width - margin.or_zero().horizontal() - used.frame_horizontal());
    // Clearance stops adjoining but the rest still decides collapse-through.
    let mut adjoining = true;
    for &child in &node.children {
        let child_style = ctx.style(child)?;
        if child_style.is_display_none()
            || child_style.position.is_out_of_flow()
            || child_style.is_floated()
        {
            continue;
        }
        if child_style.is_inline_level() {
            top.collapses_through = false;
            break;
        }
        if child_style.clear != Clear::None {
            adjoining = false;
        }
        let inner = top_margins(ctx, child, inner_width, levels_left - 1)?;
        if adjoining {
            top.set.adjoin_assign(inner.set);
        }
        if !inner.collapses_through {
            top.collapses_through = false;
            break;
        }
        if adjoining {
            let child_used = ctx.used_values(&child_style, inner_width, None);
            top.set
                .adjoin_assign(CollapsedMargin::new(child_used.margin().bottom.to_px_or(0.0)));
        } else if !top.collapses_through {
            break;
        }
    }
    Ok(top)
}

/// [§ 10.3.3 Block-level, non-replaced elements in normal flow](https://www.w3.org/TR/CSS2/visudet.html#blockwidth)
///
/// "The following constraints must hold among the used values of the
/// other properties:
///
/// 'margin-left' + 'border-left-width' + 'padding-left' + 'width' +
/// 'padding-right' + 'border-right-width' + 'margin-right' = width of
/// containing block"
///
/// Returns `(width, margin_left, margin_right)`.
pub(crate) fn solve_block_width(
    margin: &AutoEdgeSizes,
    width: Option<f32>,
    frame: f32,
    cb_width: f32,
) -> (f32, f32, f32) {
    let (mut margin_left, mut margin_right) = (margin.left, margin.right);

    // STEP 1: Over-constrained widths drop auto margins to zero.
    //
    // "If 'width' is not 'auto' and 'border-left-width' + 'padding-left' +
    // 'width' + 'padding-right' + 'border-right-width' (plus any of
    // 'margin-left' or 'margin-right' that are not 'auto') is larger than
    // the width of the containing block, then any 'auto' values for
    // 'margin-left' or 'margin-right' are, for the following rules, treated
    // as zero."
    if let Some(width) = width {
        let total = width + frame + margin_left.to_px_or(0.0) + margin_right.to_px_or(0.0);
        if total > cb_width {
            margin_left = AutoOr::Length(margin_left.to_px_or(0.0));
            margin_right = AutoOr::Length(margin_right.to_px_or(0.0));
        }
    }

    match (width, margin_left, margin_right) {
        // RULE A: "If 'width' is set to 'auto', any other 'auto' values
        // become '0' and 'width' follows from the resulting equality."
        (None, left, right) => {
            let (left, right) = (left.to_px_or(0.0), right.to_px_or(0.0));
            ((cb_width - left - right - frame).max(0.0), left, right)
        }
        // RULE B: "If both 'margin-left' and 'margin-right' are 'auto',
        // their used values are equal."
        (Some(width), AutoOr::Auto, AutoOr::Auto) => {
            let half = (cb_width - width - frame) / 2.0;
            (width, half, half)
        }
        // RULE C: "If there is exactly one value specified as 'auto', its
        // used value follows from the equality."
        (Some(width), AutoOr::Auto, AutoOr::Length(right)) => {
            (width, cb_width - width - frame - right, right)
        }
        // RULE D: over-constrained; 'margin-right' is ignored in ltr.
        (Some(width), AutoOr::Length(left), _) => {
            (width, left, cb_width - width - frame - left)
        }
    }
}

/// [§ 10.3.2 Inline, replaced elements](https://www.w3.org/TR/CSS2/visudet.html#inline-replaced-width)
/// and [§ 10.6.2](https://www.w3.org/TR/CSS2/visudet.html#inline-replaced-height)
///
/// Used `(width, height)` of replaced content from its intrinsic size, its
/// ratio, and the 300×150 fallback.
pub(crate) fn replaced_size(used: &UsedValues<'_>, intrinsic: (f32, f32)) -> (f32, f32) {
    let intrinsic_width = Some(intrinsic.0).filter(|w| *w > 0.0);
    let intrinsic_height = Some(intrinsic.1).filter(|h| *h > 0.0);
    let ratio = intrinsic_width.zip(intrinsic_height).map(|(w, h)| w / h);

    let specified_width = used.content_width();
    let specified_height = used.content_height();

    let width = match (specified_width, specified_height, ratio) {
        (Some(width), _, _) => width,
        (None, Some(height), Some(ratio)) => height * ratio,
        (None, _, _) => intrinsic_width.unwrap_or(300.0),
    };
    let width = used.clamp_width(width);
    let height = match (specified_height, ratio) {
        (Some(height), _) => height,
        (None, Some(ratio)) => width / ratio,
        (None, None) => intrinsic_height.unwrap_or(150.0),
    };
    (width, used.clamp_height(height))
}

/// Result of stacking block-level children.
struct BlockFlow {
    /// Border-box bottom of the last in-flow child, or the content top.
    cursor: f32,
    /// Margins below `cursor` not yet placed.
    pending: CollapsedMargin,
    /// A child that does not collapse through was placed.
    has_in_flow_content: bool,
    /// Absolute y of the first baseline.
    first_baseline: Option<f32>,
}

/// Horizontal metrics and content-box origin of a box, resolved before its
/// contents are laid out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PlacedBox {
    /// Absolute x of the content box.
    pub content_x: f32,
    /// Absolute y of the content box.
    pub content_y: f32,
    /// Used content width.
    pub content_width: f32,
    /// Used margins.
    pub margin: EdgeSizes,
    /// Used padding.
    pub padding: EdgeSizes,
    /// Used border widths.
    pub border: EdgeSizes,
}

/// Resolve the used width, margins and position of `id`, and write them
/// to its geometry with a zero content height.
///
/// Shared by every strategy that lays out a block-level box: the width
/// equation does not depend on the box's inner display type.
pub(crate) fn place_box(
    ctx: &mut LayoutContext<'_>,
    id: NodeId,
    input: &LayoutInput,
    used: &UsedValues<'_>,
) -> Result<PlacedBox, LayoutError> {
    let style = used.style;
    let cb = input.containing_block;
    let padding = used.padding();
    let border = used.border();
    let margin = used.margin();
    let frame_h = padding.horizontal() + border.horizontal();
    let is_root = id == ctx.tree.root();
    let bfc = establishes_bfc(ctx, id, style);
    let replaced = ctx.node(id)?.intrinsic_replaced_size();
    let shrink = input.shrink_to_fit
        || style.is_floated()
        || style.display.is_some_and(|display| display.is_atomic_inline());
    let margin_top = margin.top.to_px_or(0.0);
    let border_top = input.y + input.collapsed_margin_top.unwrap_or(margin_top);

    // STEP 1: Narrow a new formatting context to the space beside floats.
    //
    // [§ 9.5](https://www.w3.org/TR/CSS2/visuren.html#floats)
    //
    // "The border box of a table, a block-level replaced element, or an
    // element in the normal flow that establishes a new block formatting
    // context (such as an element with 'overflow' other than 'visible')
    // must not overlap the margin box of any floats in the same block
    // formatting context as the element itself."
    let (mut avail_x, mut avail_width) = (input.x, input.available_width);
    let in_normal_flow = !style.is_floated() && !style.position.is_out_of_flow();
    if (bfc || replaced.is_some()) && !is_root && in_normal_flow && !shrink
        && let Some(floats) = ctx.float_context()
        && !floats.is_empty()
    {
        let top = border_top - floats.origin_y;
        let band = used
            .content_height()
            .map_or(1.0, |height| height + used.frame_vertical())
            .max(1.0);
        let start = input.x - floats.origin_x;
        let (left, right) =
            floats.available_span(top, top + band, start, start + input.available_width);
        avail_x = left + floats.origin_x;
        avail_width = right - left;
    }

    // STEP 2: Resolve the used width and horizontal margins.
    let (content_width, margin_left, margin_right) = if let Some(width) = input.width_override {
        (width, margin.left.to_px_or(0.0), margin.right.to_px_or(0.0))
    } else if let Some(intrinsic) = replaced {
        let (width, _) = replaced_size(used, intrinsic);
        if shrink {
            (width, margin.left.to_px_or(0.0), margin.right.to_px_or(0.0))
        } else {
            solve_block_width(&margin, Some(width), frame_h, avail_width)
        }
    } else if shrink {
        // [§ 10.3.5](https://www.w3.org/TR/CSS2/visudet.html#float-width)
        //
        // "If 'margin-left', or 'margin-right' are computed as 'auto', their
        // used value is '0'. If 'width' is computed as 'auto', the used
        // value is the 'shrink-to-fit' width."
        let (left, right) = (margin.left.to_px_or(0.0), margin.right.to_px_or(0.0));
        let width = match used.content_width() {
            Some(width) => width,
            None => content_sizes(ctx, id, cb.width)?
                .shrink_to_fit(avail_width - left - right - frame_h),
        };
        (used.clamp_width(width), left, right)
    } else {
        // [§ 10.4](https://www.w3.org/TR/CSS2/visudet.html#min-max-widths)
        //
        // "If the tentative used width is greater than 'max-width', the
        // rules above are applied again, but this time using the computed
        // value of 'max-width' as the computed value for 'width'. If the
        // resulting width is smaller than 'min-width', the rules above are
        // applied again, but this time using the value of 'min-width' as
        // the computed value for 'width'."
        let tentative = solve_block_width(&margin, used.content_width(), frame_h, avail_width);
        let clamped = used.clamp_width(tentative.0);
        if clamped == tentative.0 {
            tentative
        } else {
            solve_block_width(&margin, Some(clamped), frame_h, avail_width)
        }
    };

    // STEP 3: Position the content box.
    let placed = PlacedBox {
        content_x: avail_x + margin_left + border.left + padding.left,
        content_y: border_top + border.top + padding.top,
        content_width,
        margin: EdgeSizes {
            top: margin_top,
            right: margin_right,
            bottom: margin.bottom.to_px_or(0.0),
            left: margin_left,
        },
        padding,
        border,
    };
    let node = ctx.node_mut(id)?;
    node.line_boxes.clear();
    node.geometry = BoxGeometry {
        content: Rect::new(placed.content_x, placed.content_y, content_width, 0.0),
        padding,
        border,
        margin: placed.margin,
        ..BoxGeometry::default()
    };
    Ok(placed)
}

/// Lay out a block container, a replaced box, or an atomic inline.
///
/// [§ 10.3.3](https://www.w3.org/TR/CSS2/visudet.html#blockwidth),
/// [§ 10.6.3](https://www.w3.org/TR/CSS2/visudet.html#normal-block)
pub(crate) fn layout_block(
    ctx: &mut LayoutContext<'_>,
    id: NodeId,
    input: &LayoutInput,
) -> Result<LayoutOutcome, LayoutError> {
    let style = ctx.style(id)?;
    if let Some(display) = style.display
        && matches!(
            display.inner,
            InnerDisplayType::TableRow | InnerDisplayType::TableRowGroup(_)
        )
    {
        ctx.warn_once("table row outside a table is laid out as a block");
    }

    let cb = input.containing_block;
    let used = ctx.used_values(&style, cb.width, cb.height);
    let is_root = id == ctx.tree.root();
    let bfc = establishes_bfc(ctx, id, &style);
    let replaced = ctx.node(id)?.intrinsic_replaced_size();
    let PlacedBox {
        content_x,
        content_y,
        content_width,
        margin,
        padding,
        border,
    } = place_box(ctx, id, input, &used)?;
    let (margin_top, margin_bottom) = (margin.top, margin.bottom);

    // Replaced content has no children to lay out.
    if let Some(intrinsic) = replaced {
        let (_, height) = replaced_size(&used, intrinsic);
        let height = input.height_override.unwrap_or(height);
        let geometry = &mut ctx.node_mut(id)?.geometry;
        geometry.content.height = height;
        geometry.scroll_width = content_width;
        geometry.scroll_height = height;
        return Ok(LayoutOutcome::in_flow(CollapsedMargin::new(margin_bottom)));
    }

    // STEP 4: The containing block for children.
    let specified_height = input
        .height_override
        .or_else(|| used.content_height().map(|height| used.clamp_height(height)));
    let child_cb = ContainingBlock {
        x: content_x,
        y: content_y,
        width: content_width,
        height: specified_height,
    };

    // STEP 5: A new formatting context gets its own floats.
    if bfc {
        ctx.floats.push(FloatContext::new(content_x, content_y, content_width));
    }

    // STEP 6: Lay out the children.
    let result = layout_contents(ctx, id, &used, child_cb, bfc);
    let (flow, line_height, collapses_bottom) = match result {
        Ok(contents) => contents,
        Err(err) => {
            if bfc {
                let _ = ctx.floats.pop();
            }
            return Err(err);
        }
    };

    // STEP 7: Resolve the used height.
    //
    // [§ 10.6.3](https://www.w3.org/TR/CSS2/visudet.html#normal-block)
    //
    // "the height is the distance between the top content edge and the
    // first applicable of the following: the bottom edge of the last line
    // box, ... the bottom border edge of the last in-flow child whose
    // margins do not collapse with the element's bottom margin"
    let mut content_bottom = flow.cursor;
    if !collapses_bottom {
        content_bottom += flow.pending.solve();
    }
    let mut auto_height = (content_bottom - content_y).max(line_height).max(0.0);

    // [§ 10.6.7](https://www.w3.org/TR/CSS2/visudet.html#root-height)
    if bfc && let Some(floats) = ctx.floats.pop() {
        let float_bottom = floats.max_bottom() + floats.origin_y - content_y;
        if !floats.is_empty() {
            auto_height = auto_height.max(float_bottom);
        }
    }

    let mut height = specified_height.unwrap_or_else(|| used.clamp_height(auto_height));
    if is_root && specified_height.is_none() && ctx.env.config.root_fills_viewport {
        let fill = ctx.env.viewport.height - used.frame_vertical() - margin_top - margin_bottom;
        height = used.clamp_height(height.max(fill));
    }

    // STEP 8: Scrollable overflow and the first baseline.
    let (scroll_width, scroll_height) = scroll_extent(ctx, id, content_x, content_y)?;
    let collapsed_through = !bfc
        && !flow.has_in_flow_content
        && line_height == 0.0
        && height == 0.0
        && used.frame_vertical() == 0.0;
    {
        let geometry = &mut ctx.node_mut(id)?.geometry;
        geometry.content.height = height;
        geometry.scroll_width = scroll_width.max(content_width);
        geometry.scroll_height = scroll_height.max(height);
        geometry.baseline = flow
            .first_baseline
            .map(|baseline| baseline - (content_y - padding.top - border.top));
    }

    log::trace!(
        target: "quire::layout",
        "{id} block {content_width}x{height} at ({content_x}, {content_y})"
    );

    let own_bottom = CollapsedMargin::new(margin_bottom);
    let collapsed_bottom = if collapses_bottom && !collapsed_through {
        flow.pending.adjoin(own_bottom)
    } else {
        own_bottom
    };
    Ok(LayoutOutcome {
        collapsed_bottom,
        collapsed_through,
        in_flow: true,
    })
}

/// Children of a block container: line boxes, stacked blocks, or both for
/// a table cell with its own text.
///
/// Returns the stacking result, the height of any line boxes, and whether
/// the last child's bottom margin collapses through the container.
fn layout_contents(
    ctx: &mut LayoutContext<'_>,
    id: NodeId,
    used: &UsedValues<'_>,
    child_cb: ContainingBlock,
    bfc: bool,
) -> Result<(BlockFlow, f32, bool), LayoutError> {
    let node = ctx.node(id)?;
    let own_text = node.has_text();
    let inline_children = node
        .children
        .iter()
        .any(|&child| ctx.tree.get(child).is_some_and(|c| c.style.is_inline_level()));
    let is_cell = used
        .style
        .display
        .is_some_and(|display| display.inner == InnerDisplayType::TableCell);
    let area = InlineArea {
        x: child_cb.x,
        y: child_cb.y,
        width: child_cb.width,
        containing_block: child_cb,
    };

    let empty = BlockFlow {
        cursor: child_cb.y,
        pending: CollapsedMargin::zero(),
        has_in_flow_content: false,
        first_baseline: None,
    };

    // A table cell keeps its own text beside block children; its content
    // height is the larger of the two.
    if is_cell && own_text && !inline_children && !node.children.is_empty() {
        let lines = layout_inline_content(ctx, id, InlineSource::OwnText, area)?;
        let mut flow = layout_block_children(ctx, id, child_cb, false)?;
        flow.first_baseline = lines.first_baseline.or(flow.first_baseline);
        return Ok((flow, lines.height, false));
    }

    if own_text || inline_children {
        let lines = layout_inline_content(ctx, id, InlineSource::Contents, area)?;
        let flow = BlockFlow {
            has_in_flow_content: lines.line_count > 0,
            first_baseline: lines.first_baseline,
            ..empty
        };
        return Ok((flow, lines.height, false));
    }

    let collapses_top = top_adjoins_first_child(ctx, id, used);
    let flow = layout_block_children(ctx, id, child_cb, collapses_top)?;

    // [§ 8.3.1](https://www.w3.org/TR/CSS2/box.html#collapsing-margins)
    //
    // "bottom margin of a last in-flow child and bottom margin of its
    // parent if the parent has 'auto' computed height"
    let collapses_bottom = !bfc
        && used.padding().bottom == 0.0
        && used.border().bottom == 0.0
        && used.content_height().is_none()
        && used.clamp_height(0.0) == 0.0;
    Ok((flow, 0.0, collapses_bottom))
}

/// [§ 9.4.1](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
///
/// Stack block-level children top to bottom, collapsing adjoining
/// margins, placing floats, and recording static positions of
/// absolutely positioned children.
fn layout_block_children(
    ctx: &mut LayoutContext<'_>,
    id: NodeId,
    child_cb: ContainingBlock,
    collapses_top: bool,
) -> Result<BlockFlow, LayoutError> {
    let mut flow = BlockFlow {
        cursor: child_cb.y,
        pending: CollapsedMargin::zero(),
        has_in_flow_content: false,
        first_baseline: None,
    };
    // While true, the children's top margins were already placed above
    // this box by its parent.
    let mut absorbing = collapses_top;

    for child in ctx.children(id) {
        let child_style = ctx.style(child)?;
        let base = LayoutInput {
            x: child_cb.x,
            available_width: child_cb.width,
            ..LayoutInput::in_block(child_cb)
        };

        // STEP 1: Boxes that take no room.
        if child_style.is_display_none() {
            let _ = ctx.layout_child(child, &base)?;
            continue;
        }
        let next_top = if absorbing {
            flow.cursor
        } else {
            flow.cursor + flow.pending.solve()
        };
        if child_style.position.is_out_of_flow() {
            // The static position: where the box would have been.
            let _ = ctx.layout_child(child, &LayoutInput { y: next_top, ..base })?;
            continue;
        }

        // STEP 2: Floats.
        if child_style.is_floated() {
            layout_float(ctx, child, &child_style, child_cb, next_top)?;
            continue;
        }

        // STEP 3: Collapse the child's top margin with what came before.
        if absorbing && child_style.clear != Clear::None {
            absorbing = false;
        }
        let child_top = collapsed_top_set(ctx, child, child_cb.width)?;
        let mut offset = if absorbing {
            0.0
        } else {
            flow.pending.adjoin(child_top).solve()
        };

        // STEP 4: Clearance.
        //
        // [§ 9.5.2](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
        //
        // "Clearance inhibits margin collapsing and acts as spacing above the
        // margin-top of an element."
        let mut cleared = false;
        if child_style.clear != Clear::None
            && let Some(floats) = ctx.float_context()
        {
            let local = flow.cursor + offset - floats.origin_y;
            let below = floats.clear(child_style.clear, local);
            if below > local {
                offset = below + floats.origin_y - flow.cursor;
                cleared = true;
            }
        }

        // STEP 5: Lay out the child.
        let input = LayoutInput {
            y: flow.cursor,
            collapsed_margin_top: Some(offset),
            ..base
        };
        let outcome = ctx.layout_child(child, &input)?;
        if !outcome.in_flow {
            continue;
        }

        // STEP 6: An empty child's margins join the pending set.
        if outcome.collapsed_through && !cleared {
            if !absorbing {
                flow.pending = flow.pending.adjoin(child_top).adjoin(outcome.collapsed_bottom);
            }
            continue;
        }

        // STEP 7: Advance past the child's border box.
        absorbing = false;
        let child_node = ctx.node(child)?;
        let border_box = child_node.geometry.border_box();
        if flow.first_baseline.is_none() {
            flow.first_baseline = child_node
                .geometry
                .baseline
                .map(|baseline| border_box.y + baseline);
        }
        flow.cursor = border_box.bottom();
        flow.pending = outcome.collapsed_bottom;
        flow.has_in_flow_content = true;
    }

    Ok(flow)
}

/// [§ 9.5.1 Positioning the float](https://www.w3.org/TR/CSS2/visuren.html#float-position)
///
/// Lay the float out at the current position, then move it to where the
/// float rules put it.
pub(crate) fn layout_float(
    ctx: &mut LayoutContext<'_>,
    child: NodeId,
    child_style: &ComputedStyle,
    child_cb: ContainingBlock,
    y: f32,
) -> Result<(), LayoutError> {
    let side = FloatSide::from_mode(child_style.float).unwrap_or(FloatSide::Left);
    let y = match ctx.float_context() {
        Some(floats) => floats.clear(child_style.clear, y - floats.origin_y) + floats.origin_y,
        None => y,
    };

    // STEP 1: Size the float at a provisional position.
    let input = LayoutInput {
        y,
        shrink_to_fit: true,
        ..LayoutInput::in_block(child_cb)
    };
    let _ = ctx.layout_child(child, &input)?;
    let margin_box = ctx.node(child)?.geometry.margin_box();

    // STEP 2: Place it beside the floats already there.
    let Some(floats) = ctx.float_context_mut() else {
        return Ok(());
    };
    let start = child_cb.x - floats.origin_x;
    let rect = floats.place(
        side,
        margin_box.width,
        margin_box.height,
        y - floats.origin_y,
        start,
        start + child_cb.width,
    );
    let dx = rect.inline_start + floats.origin_x - child_cb.x;
    let dy = rect.top + floats.origin_y - y;
    ctx.tree.shift_subtree(child, dx, dy);
    Ok(())
}

/// [§ 11.1 Overflow](https://www.w3.org/TR/CSS2/visufx.html#overflow)
///
/// Extent of in-flow children, floats and line boxes, measured from the
/// content origin.
fn scroll_extent(
    ctx: &LayoutContext<'_>,
    id: NodeId,
    content_x: f32,
    content_y: f32,
) -> Result<(f32, f32), LayoutError> {
    let node = ctx.node(id)?;
    let mut width = 0.0_f32;
    let mut height = 0.0_f32;
    for line in &node.line_boxes {
        width = width.max(line.bounds.x + line.content_width() - content_x);
        height = height.max(line.bounds.bottom() - content_y);
    }
    for &child in &node.children {
        let Some(child) = ctx.tree.get(child) else {
            continue;
        };
        if child.style.is_display_none() || child.style.position.is_out_of_flow() {
            continue;
        }
        let margin_box = child.geometry.margin_box();
        width = width.max(margin_box.right() - content_x);
        height = height.max(margin_box.bottom() - content_y);
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(left: AutoOr, right: AutoOr) -> AutoEdgeSizes {
        AutoEdgeSizes {
            top: AutoOr::Length(0.0),
            right,
            bottom: AutoOr::Length(0.0),
            left,
        }
    }

    #[test]
    fn test_auto_width_fills_containing_block() {
        let margin = edges(AutoOr::Length(10.0), AutoOr::Auto);
        assert_eq!(solve_block_width(&margin, None, 4.0, 200.0), (186.0, 10.0, 0.0));
    }

    #[test]
    fn test_auto_margins_center() {
        let margin = edges(AutoOr::Auto, AutoOr::Auto);
        assert_eq!(solve_block_width(&margin, Some(100.0), 0.0, 300.0), (100.0, 100.0, 100.0));
    }

    #[test]
    fn test_single_auto_margin_takes_remainder() {
        let margin = edges(AutoOr::Auto, AutoOr::Length(20.0));
        assert_eq!(solve_block_width(&margin, Some(100.0), 0.0, 300.0), (100.0, 180.0, 20.0));
    }

    #[test]
    fn test_over_constrained_ignores_margin_right() {
        let margin = edges(AutoOr::Length(10.0), AutoOr::Length(10.0));
        assert_eq!(solve_block_width(&margin, Some(100.0), 0.0, 300.0), (100.0, 10.0, 190.0));
    }

    #[test]
    fn test_too_wide_auto_margins_become_zero() {
        let margin = edges(AutoOr::Auto, AutoOr::Auto);
        assert_eq!(solve_block_width(&margin, Some(400.0), 0.0, 300.0), (400.0, 0.0, -100.0));
    }
}
