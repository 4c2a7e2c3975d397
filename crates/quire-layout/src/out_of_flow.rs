//! Absolute and fixed positioning.
//!
//! [§ 9.6 Absolute positioning](https://www.w3.org/TR/CSS2/visuren.html#absolute-positioning)
//!
//! "In the absolute positioning model, a box is explicitly offset with
//! respect to its containing block. It is removed from the normal flow
//! entirely (it has no impact on later siblings)."
//!
//! Layout happens in two passes. During the in-flow pass
//! [`OutOfFlowStrategy`] only records where the box would have been (its
//! static position) and takes no room. Once every in-flow box has its
//! final geometry, [`layout_out_of_flow`] resolves each positioned box
//! against its containing block and lays out its subtree.

use quire_style::Position;
use quire_tree::{BoxGeometry, EdgeSizes, LayoutNode, NodeId, Rect};

use crate::block::replaced_size;
use crate::context::{ContainingBlock, LayoutContext, LayoutInput, LayoutOutcome};
use crate::error::LayoutError;
use crate::intrinsic::content_sizes;
use crate::resolve::AutoOr;
use crate::strategy::{LayoutStrategy, StrategyKind};

/// `position: absolute | fixed`, in the in-flow pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutOfFlowStrategy;

impl LayoutStrategy for OutOfFlowStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::OutOfFlow
    }

    fn can_layout(&self, node: &LayoutNode) -> bool {
        node.style.position.is_out_of_flow() && !node.style.is_display_none()
    }

    /// [§ 10.3.7](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-width)
    ///
    /// "the static position for 'left' is the distance from the left edge
    /// of the containing block to the left margin edge of a hypothetical
    /// box that would have been the first box of the element if its
    /// 'position' property had been 'static' and 'float' had been 'none'."
    ///
    /// The static position is kept as a zero-size box at the margin edge,
    /// so it moves along when an ancestor is shifted.
    fn layout(
        &self,
        id: NodeId,
        input: &LayoutInput,
        ctx: &mut LayoutContext<'_>,
    ) -> Result<LayoutOutcome, LayoutError> {
        let node = ctx.node_mut(id)?;
        node.line_boxes.clear();
        node.geometry = BoxGeometry {
            content: Rect::new(input.x, input.y, 0.0, 0.0),
            ..BoxGeometry::default()
        };
        Ok(LayoutOutcome::out_of_flow())
    }
}

/// The second pass: position every absolutely positioned and fixed box.
///
/// Boxes are visited in document order, so a positioned box is placed
/// before the positioned boxes nested in it, whose containing block and
/// static position it determines. Returns how many boxes were placed.
///
/// # Errors
/// Propagates failures from laying out a positioned box's subtree.
pub fn layout_out_of_flow(ctx: &mut LayoutContext<'_>) -> Result<usize, LayoutError> {
    let root = ctx.tree.root();
    let candidates: Vec<NodeId> = ctx
        .tree
        .descendants(root)
        .filter(|&id| {
            ctx.tree
                .get(id)
                .is_some_and(|node| node.style.position.is_out_of_flow())
        })
        .collect();

    let mut placed = 0;
    for id in candidates {
        if is_hidden(ctx, id) {
            continue;
        }
        position_box(ctx, id)?;
        placed += 1;
    }
    log::debug!(target: "quire::layout", "out-of-flow pass placed {placed} boxes");
    Ok(placed)
}

/// Whether `id` or an ancestor has `display: none`.
fn is_hidden(ctx: &LayoutContext<'_>, id: NodeId) -> bool {
    std::iter::once(id)
        .chain(ctx.tree.ancestors(id))
        .any(|node| ctx.tree.get(node).is_none_or(|node| node.style.is_display_none()))
}

/// [§ 10.1 Definition of "containing block"](https://www.w3.org/TR/CSS2/visudet.html#containing-block-details)
///
/// "If the element has 'position: fixed', the containing block is
/// established by the viewport"
///
/// "If the element has 'position: absolute', the containing block is
/// established by the nearest ancestor with a 'position' of 'absolute',
/// 'relative' or 'fixed' ... If there is no such ancestor, the containing
/// block is the initial containing block."
///
/// The padding box of that ancestor is used.
fn containing_block_for(ctx: &LayoutContext<'_>, id: NodeId, position: Position) -> ContainingBlock {
    let initial = ContainingBlock::from_viewport(ctx.env.viewport);
    if position == Position::Fixed {
        return initial;
    }
    ctx.tree
        .ancestors(id)
        .filter_map(|ancestor| ctx.tree.get(ancestor))
        .find(|node| node.style.position != Position::Static)
        .map_or(initial, |node| {
            let padding_box = node.geometry.padding_box();
            ContainingBlock {
                x: padding_box.x,
                y: padding_box.y,
                width: padding_box.width,
                height: Some(padding_box.height),
            }
        })
}

/// One axis of the absolute positioning constraint equation.
///
/// `start + margin_start + frame + size + margin_end + end = containing
/// block size`
#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisConstraint {
    start: AutoOr,
    end: AutoOr,
    /// Specified content size, `None` for `auto`.
    size: Option<f32>,
    margin_start: AutoOr,
    margin_end: AutoOr,
    /// Padding and border on this axis.
    frame: f32,
    cb_size: f32,
    /// Static position, from the containing block's start edge.
    static_offset: f32,
    /// Negative free space goes to the end margin when both margins are
    /// `auto` on the horizontal axis only.
    horizontal: bool,
}

/// The solved axis, short of a content-dependent size.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisSolution {
    /// Offset of the margin edge from the containing block's start edge.
    /// `None` when it is solved from `end` once the size is known.
    start: Option<f32>,
    end: f32,
    /// Content size, `None` when it depends on the content.
    size: Option<f32>,
    margin_start: f32,
    margin_end: f32,
}

impl AxisSolution {
    /// The start offset once the content size is known.
    fn start_for(&self, size: f32, constraint: &AxisConstraint) -> f32 {
        self.start.unwrap_or_else(|| {
            constraint.cb_size
                - self.end
                - self.margin_end
                - constraint.frame
                - size
                - self.margin_start
        })
    }
}

/// [§ 10.3.7](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-width),
/// [§ 10.6.4](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-height)
fn solve_axis(c: &AxisConstraint) -> AxisSolution {
    let margins_or_zero = (c.margin_start.to_px_or(0.0), c.margin_end.to_px_or(0.0));
    match (c.start, c.size, c.end) {
        // CASE 1: "If all three of 'left', 'width', and 'right' are 'auto':
        // First set any 'auto' values for 'margin-left' and 'margin-right'
        // to 0. Then, if the 'direction' property of the element
        // establishing the static-position containing block is 'ltr' set
        // 'left' to the static position"
        (AutoOr::Auto, _, AutoOr::Auto) => AxisSolution {
            start: Some(c.static_offset),
            end: 0.0,
            size: c.size,
            margin_start: margins_or_zero.0,
            margin_end: margins_or_zero.1,
        },

        // CASE 2: "If none of the three is 'auto': If both 'margin-left' and
        // 'margin-right' are 'auto', solve the equation under the extra
        // constraint that the two margins get equal values, unless this
        // would make them negative, in which case when direction of the
        // containing block is 'ltr' ... solve for 'margin-right'."
        (AutoOr::Length(start), Some(size), AutoOr::Length(end)) => {
            let free = c.cb_size - start - end - size - c.frame;
            let (margin_start, margin_end) = match (c.margin_start, c.margin_end) {
                (AutoOr::Auto, AutoOr::Auto) => {
                    if c.horizontal && free < 0.0 {
                        (0.0, free)
                    } else {
                        (free / 2.0, free / 2.0)
                    }
                }
                (AutoOr::Auto, AutoOr::Length(margin_end)) => (free - margin_end, margin_end),
                (AutoOr::Length(margin_start), AutoOr::Auto) => {
                    (margin_start, free - margin_start)
                }
                // "If the values are over-constrained, ignore the value for
                // 'left' (in case the 'direction' property of the
                // containing block is 'rtl') or 'right' (in case 'direction'
                // is 'ltr') and solve for that value."
                (AutoOr::Length(margin_start), AutoOr::Length(margin_end)) => {
                    (margin_start, margin_end)
                }
            };
            AxisSolution {
                start: Some(start),
                end,
                size: Some(size),
                margin_start,
                margin_end,
            }
        }

        // CASE 3: "Otherwise, set 'auto' values for 'margin-left' and
        // 'margin-right' to 0, and pick the one of the following six rules
        // that applies."
        //
        // "5. 'width' is 'auto', 'left' and 'right' are not 'auto', then
        // solve for 'width'"
        (AutoOr::Length(start), None, AutoOr::Length(end)) => AxisSolution {
            start: Some(start),
            end,
            size: Some(
                (c.cb_size - start - end - c.frame - margins_or_zero.0 - margins_or_zero.1)
                    .max(0.0),
            ),
            margin_start: margins_or_zero.0,
            margin_end: margins_or_zero.1,
        },
        // "1. 'left' and 'width' are 'auto' and 'right' is not 'auto', then
        // the width is shrink-to-fit. Then solve for 'left'"
        //
        // "4. 'left' is 'auto', 'width' and 'right' are not 'auto', then
        // solve for 'left'"
        (AutoOr::Auto, size, AutoOr::Length(end)) => AxisSolution {
            start: None,
            end,
            size,
            margin_start: margins_or_zero.0,
            margin_end: margins_or_zero.1,
        },
        // "3. 'width' and 'right' are 'auto' and 'left' is not 'auto', then
        // the width is shrink-to-fit."
        //
        // "6. 'right' is 'auto', 'left' and 'width' are not 'auto', then
        // solve for 'right'"
        (AutoOr::Length(start), size, AutoOr::Auto) => AxisSolution {
            start: Some(start),
            end: 0.0,
            size,
            margin_start: margins_or_zero.0,
            margin_end: margins_or_zero.1,
        },
    }
}

/// Resolve and lay out one positioned box.
fn position_box(ctx: &mut LayoutContext<'_>, id: NodeId) -> Result<(), LayoutError> {
    let style = ctx.style(id)?;
    let node = ctx.node(id)?;
    let static_position = node.geometry.margin_box();
    let intrinsic = node.intrinsic_replaced_size();

    // STEP 1: Find the containing block.
    let cb = containing_block_for(ctx, id, style.position);
    let cb_height = cb.height.unwrap_or(0.0);
    let used = ctx.used_values(&style, cb.width, cb.height);
    let inset = used.inset();
    let margin = used.margin();
    let replaced = intrinsic.map(|intrinsic| replaced_size(&used, intrinsic));

    // STEP 2: Resolve the horizontal constraint equation.
    let horizontal = AxisConstraint {
        start: inset.left,
        end: inset.right,
        size: used
            .content_width()
            .map(|width| used.clamp_width(width))
            .or(replaced.map(|(width, _)| width)),
        margin_start: margin.left,
        margin_end: margin.right,
        frame: used.frame_horizontal(),
        cb_size: cb.width,
        static_offset: static_position.x - cb.x,
        horizontal: true,
    };
    let h = solve_axis(&horizontal);
    let width = match h.size {
        Some(width) => used.clamp_width(width),
        None => {
            // [§ 10.3.7](https://www.w3.org/TR/CSS2/visudet.html#abs-non-replaced-width)
            //
            // "Calculation of the shrink-to-fit width is similar to
            // calculating the width of a table cell using the automatic
            // table layout algorithm."
            let available = cb.width
                - h.start.unwrap_or(0.0)
                - h.end
                - h.margin_start
                - h.margin_end
                - horizontal.frame;
            used.clamp_width(content_sizes(ctx, id, cb.width)?.shrink_to_fit(available))
        }
    };
    let left = h.start_for(width, &horizontal);

    // STEP 3: Resolve the vertical constraint equation.
    let vertical = AxisConstraint {
        start: inset.top,
        end: inset.bottom,
        size: used
            .content_height()
            .map(|height| used.clamp_height(height))
            .or(replaced.map(|(_, height)| height)),
        margin_start: margin.top,
        margin_end: margin.bottom,
        frame: used.frame_vertical(),
        cb_size: cb_height,
        static_offset: static_position.y - cb.y,
        horizontal: false,
    };
    let v = solve_axis(&vertical);

    // STEP 4: Lay out the subtree. The input's origin is offset so that
    // the box's own (possibly auto) margins land its border box where the
    // equation put it.
    let input = LayoutInput {
        containing_block: cb,
        x: cb.x + left + h.margin_start - margin.left.to_px_or(0.0),
        y: cb.y + v.start.unwrap_or(0.0) + v.margin_start - margin.top.to_px_or(0.0),
        available_width: h.margin_start + horizontal.frame + width + h.margin_end,
        collapsed_margin_top: None,
        width_override: Some(width),
        height_override: v.size.map(|height| used.clamp_height(height)),
        shrink_to_fit: false,
    };
    let _ = ctx.layout_child_in_flow(id, &input)?;

    // STEP 5: "then solve for 'top'" once the height is known.
    let border_box = ctx.node(id)?.geometry.border_box();
    if v.start.is_none() {
        let top = v.start_for(border_box.height - vertical.frame, &vertical);
        let dy = cb.y + top + v.margin_start - border_box.y;
        ctx.tree.shift_subtree(id, 0.0, dy);
    }
    ctx.node_mut(id)?.geometry.margin = EdgeSizes {
        top: v.margin_start,
        right: h.margin_end,
        bottom: v.margin_end,
        left: h.margin_start,
    };

    log::trace!(
        target: "quire::layout",
        "{id} {} at ({}, {}) in ({}, {}) {}x{cb_height}",
        style.position,
        border_box.x,
        border_box.y,
        cb.x,
        cb.y,
        cb.width
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraint(start: AutoOr, size: Option<f32>, end: AutoOr) -> AxisConstraint {
        AxisConstraint {
            start,
            end,
            size,
            margin_start: AutoOr::Length(0.0),
            margin_end: AutoOr::Length(0.0),
            frame: 10.0,
            cb_size: 500.0,
            static_offset: 42.0,
            horizontal: true,
        }
    }

    #[test]
    fn test_all_auto_uses_static_position() {
        let c = constraint(AutoOr::Auto, None, AutoOr::Auto);
        let solved = solve_axis(&c);
        assert_eq!(solved.start, Some(42.0));
        assert_eq!(solved.size, None);
    }

    #[test]
    fn test_both_offsets_give_the_size() {
        let c = constraint(AutoOr::Length(20.0), None, AutoOr::Length(30.0));
        let solved = solve_axis(&c);
        assert_eq!(solved.size, Some(440.0));
        assert_eq!(solved.start, Some(20.0));
    }

    #[test]
    fn test_start_solved_from_end() {
        let c = constraint(AutoOr::Auto, Some(100.0), AutoOr::Length(50.0));
        let solved = solve_axis(&c);
        assert_eq!(solved.start, None);
        assert_eq!(solved.start_for(100.0, &c), 340.0);
    }

    #[test]
    fn test_auto_margins_center() {
        let c = AxisConstraint {
            margin_start: AutoOr::Auto,
            margin_end: AutoOr::Auto,
            ..constraint(AutoOr::Length(0.0), Some(90.0), AutoOr::Length(0.0))
        };
        let solved = solve_axis(&c);
        assert_eq!(solved.margin_start, 200.0);
        assert_eq!(solved.margin_end, 200.0);
    }

    #[test]
    fn test_negative_auto_margins_go_to_the_end_horizontally() {
        let c = AxisConstraint {
            margin_start: AutoOr::Auto,
            margin_end: AutoOr::Auto,
            ..constraint(AutoOr::Length(0.0), Some(600.0), AutoOr::Length(0.0))
        };
        let solved = solve_axis(&c);
        assert_eq!(solved.margin_start, 0.0);
        assert_eq!(solved.margin_end, -110.0);

        let vertical = AxisConstraint { horizontal: false, ..c };
        let solved = solve_axis(&vertical);
        assert_eq!(solved.margin_start, -55.0);
    }

    #[test]
    fn test_over_constrained_ignores_end_margin_solution() {
        let c = constraint(AutoOr::Length(10.0), Some(100.0), AutoOr::Length(10.0));
        let solved = solve_axis(&c);
        assert_eq!(solved.start, Some(10.0));
        assert_eq!(solved.margin_start, 0.0);
    }
}
