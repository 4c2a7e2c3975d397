//! Flex layout.
//!
//! [§ 9 Flex Layout Algorithm](https://www.w3.org/TR/css-flexbox-1/#layout-algorithm)
//!
//! Items are sized on the main axis first (flex base size, then the
//! § 9.7 freeze loop), laid out once at the flex container's content
//! origin with their resolved main size, and then shifted into place once
//! line cross sizes and alignment are known.

use std::ops::Range;

use quire_style::{
    AlignItems, BoxSizing, ComputedStyle, FlexWrap, InnerDisplayType, JustifyContent,
};
use quire_tree::{LayoutNode, NodeId, Rect};

use crate::block::{PlacedBox, place_box};
use crate::context::{ContainingBlock, LayoutContext, LayoutInput, LayoutOutcome};
use crate::error::LayoutError;
use crate::intrinsic::content_sizes;
use crate::margin::CollapsedMargin;
use crate::resolve::UsedValues;
use crate::strategy::{LayoutStrategy, StrategyKind};

/// `display: flex | inline-flex`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlexStrategy;

impl LayoutStrategy for FlexStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Flex
    }

    fn can_layout(&self, node: &LayoutNode) -> bool {
        node.style
            .display
            .is_some_and(|display| display.inner == InnerDisplayType::Flex)
    }

    fn layout(
        &self,
        id: NodeId,
        input: &LayoutInput,
        ctx: &mut LayoutContext<'_>,
    ) -> Result<LayoutOutcome, LayoutError> {
        layout_flex(ctx, id, input)
    }
}

/// Per-item data collected during flex layout.
///
/// [§ 9.2 Line Length Determination](https://www.w3.org/TR/css-flexbox-1/#algo-main-item)
#[derive(Debug, Clone, PartialEq)]
struct FlexItem {
    id: NodeId,
    /// [§ 9.2 step 3](https://www.w3.org/TR/css-flexbox-1/#algo-main-item)
    /// The flex base size.
    base_size: f32,
    /// The flex base size clamped by min/max main size.
    hypothetical_size: f32,
    min_main: f32,
    max_main: f32,
    grow: f32,
    shrink: f32,
    /// The resolved main size after § 9.7.
    target_size: f32,
    frozen: bool,
    /// Margin, border and padding on the main axis.
    outer_main: f32,
    /// Margin, border and padding on the cross axis.
    outer_cross: f32,
    align: AlignItems,
    /// `width` (column) or `height` (row) is `auto`.
    cross_auto: bool,
    /// Margin-box size on the cross axis after layout.
    cross_size: f32,
    /// Margin-box size on the main axis after layout.
    main_size: f32,
    /// First baseline, from the margin-box top.
    baseline: Option<f32>,
}

impl FlexItem {
    fn new(id: NodeId, base_size: f32, min_main: f32, max_main: f32, style: &ComputedStyle) -> Self {
        let hypothetical_size = base_size.min(max_main).max(min_main);
        Self {
            id,
            base_size,
            hypothetical_size,
            min_main,
            max_main,
            grow: style.flex_grow.max(0.0),
            shrink: style.flex_shrink.max(0.0),
            target_size: hypothetical_size,
            frozen: false,
            outer_main: 0.0,
            outer_cross: 0.0,
            align: AlignItems::Stretch,
            cross_auto: true,
            cross_size: 0.0,
            main_size: 0.0,
            baseline: None,
        }
    }

    fn clamp(&self, size: f32) -> f32 {
        size.min(self.max_main).max(self.min_main)
    }
}

/// Geometry of the flex container that items are sized against.
struct FlexFrame {
    is_row: bool,
    child_cb: ContainingBlock,
    /// Inner main size, when definite.
    available_main: Option<f32>,
}

/// Main entry point for flex layout.
///
/// [§ 9 Flex Layout Algorithm](https://www.w3.org/TR/css-flexbox-1/#layout-algorithm)
pub(crate) fn layout_flex(
    ctx: &mut LayoutContext<'_>,
    id: NodeId,
    input: &LayoutInput,
) -> Result<LayoutOutcome, LayoutError> {
    let style = ctx.style(id)?;
    let cb = input.containing_block;
    let used = ctx.used_values(&style, cb.width, cb.height);

    // STEP 1 (§ 9.2): The container's own width and position.
    let PlacedBox {
        content_x,
        content_y,
        content_width,
        margin,
        ..
    } = place_box(ctx, id, input, &used)?;
    let specified_height = input
        .height_override
        .or_else(|| used.content_height().map(|height| used.clamp_height(height)));
    let is_row = style.flex_direction.is_row();
    let frame = FlexFrame {
        is_row,
        child_cb: ContainingBlock {
            x: content_x,
            y: content_y,
            width: content_width,
            height: specified_height,
        },
        available_main: if is_row { Some(content_width) } else { specified_height },
    };
    let (main_gap, cross_gap) = {
        let column = style.column_gap.resolve_or_zero(Some(content_width), &used.lengths);
        let row = style.row_gap.resolve_or_zero(specified_height, &used.lengths);
        if is_row { (column, row) } else { (row, column) }
    };
    let origin = LayoutInput {
        x: content_x,
        y: content_y,
        available_width: content_width,
        ..LayoutInput::in_block(frame.child_cb)
    };

    // STEP 2 (§ 9.1, § 9.2): Collect items and determine flex base sizes.
    let mut items = Vec::new();
    for child in ctx.children(id) {
        let child_style = ctx.style(child)?;
        if child_style.is_display_none() || child_style.position.is_out_of_flow() {
            // [§ 4.1](https://www.w3.org/TR/css-flexbox-1/#abspos-items)
            //
            // "The static position of an absolutely-positioned child of a
            // flex container is determined such that the child is positioned
            // as if it were the sole flex item in the flex container"
            let _ = ctx.layout_child(child, &origin)?;
            continue;
        }
        items.push(collect_item(ctx, child, &child_style, &style, &frame, &origin)?);
    }

    // STEP 3 (§ 9.3): Collect items into flex lines.
    let lines = collect_lines(&items, style.flex_wrap, frame.available_main, main_gap);

    // STEP 4 (§ 9.7): Resolve flexible lengths.
    if let Some(available) = frame.available_main {
        for line in &lines {
            let gaps = main_gap * line.len().saturating_sub(1) as f32;
            resolve_flexible_lengths(&mut items[line.clone()], available - gaps);
        }
    }

    // STEP 5 (§ 9.4): Lay out each item once with its main size.
    for item in &mut items {
        layout_item(ctx, item, &frame, &origin)?;
    }

    // STEP 6 (§ 9.4 steps 8 and 11): Line cross sizes and stretching.
    let single_line_cross = if style.flex_wrap == FlexWrap::Nowrap {
        if is_row { specified_height } else { Some(content_width) }
    } else {
        None
    };
    let mut line_crosses = Vec::with_capacity(lines.len());
    for line in &lines {
        let cross = single_line_cross.unwrap_or_else(|| line_cross_size(&items[line.clone()]));
        line_crosses.push(cross);
        if is_row {
            for item in &mut items[line.clone()] {
                stretch_item(ctx, item, cross, &frame)?;
            }
        }
    }

    // STEP 7 (§ 9.6): The container's height.
    let auto_height = if is_row {
        line_crosses.iter().sum::<f32>() + cross_gap * lines.len().saturating_sub(1) as f32
    } else {
        lines
            .iter()
            .map(|line| {
                items[line.clone()].iter().map(|item| item.main_size).sum::<f32>()
                    + main_gap * line.len().saturating_sub(1) as f32
            })
            .fold(0.0, f32::max)
    };
    let height = specified_height.unwrap_or_else(|| used.clamp_height(auto_height));

    // STEP 8 (§ 9.5, § 9.6): Main and cross axis alignment.
    let (main_extent, cross_extent) = if is_row {
        (content_width, height)
    } else {
        (height, content_width)
    };
    let reverse_main = style.flex_direction.is_reverse();
    let reverse_cross = style.flex_wrap == FlexWrap::WrapReverse;
    let mut cross_cursor = 0.0;
    for (line, &line_cross) in lines.iter().zip(&line_crosses) {
        let line_items = &items[line.clone()];
        let used_main = line_items.iter().map(|item| item.main_size).sum::<f32>()
            + main_gap * line_items.len().saturating_sub(1) as f32;
        let (start, between) =
            justify_offsets(style.justify_content, main_extent - used_main, line_items.len());
        let max_baseline = line_items
            .iter()
            .filter(|item| item.align == AlignItems::Baseline)
            .map(|item| item.baseline.unwrap_or(item.cross_size))
            .fold(0.0, f32::max);

        let line_start = if reverse_cross {
            cross_extent - cross_cursor - line_cross
        } else {
            cross_cursor
        };
        let mut main_cursor = start;
        for item in line_items {
            let main_pos = if reverse_main {
                main_extent - main_cursor - item.main_size
            } else {
                main_cursor
            };
            let cross_pos = line_start + align_offset(item, line_cross, max_baseline, is_row);
            let (dx, dy) = if is_row {
                (main_pos, cross_pos)
            } else {
                (cross_pos, main_pos)
            };
            ctx.tree.shift_subtree(item.id, dx, dy);
            main_cursor += item.main_size + main_gap + between;
        }
        cross_cursor += line_cross + cross_gap;
    }

    // STEP 9: Finish the container's geometry.
    let mut extent = Rect::new(content_x, content_y, content_width, height);
    let mut baseline = None;
    for item in &items {
        let node = ctx.node(item.id)?;
        let margin_box = node.geometry.margin_box();
        extent = extent.union(&margin_box);
        if baseline.is_none() {
            baseline = node
                .geometry
                .baseline
                .map(|b| node.geometry.border_box().y + b);
        }
    }
    let border_top = content_y - used.padding().top - used.border().top;
    let geometry = &mut ctx.node_mut(id)?.geometry;
    geometry.content.height = height;
    geometry.scroll_width = extent.right() - content_x;
    geometry.scroll_height = extent.bottom() - content_y;
    geometry.baseline = baseline.map(|b| b - border_top);

    log::trace!(
        target: "quire::layout",
        "{id} flex {} items in {} lines, {content_width}x{height}",
        items.len(),
        lines.len()
    );
    Ok(LayoutOutcome::in_flow(CollapsedMargin::new(margin.bottom)))
}

/// [§ 9.2 step 3](https://www.w3.org/TR/css-flexbox-1/#algo-main-item)
///
/// "Determine the flex base size and hypothetical main size of each item"
fn collect_item(
    ctx: &mut LayoutContext<'_>,
    id: NodeId,
    style: &ComputedStyle,
    container: &ComputedStyle,
    frame: &FlexFrame,
    origin: &LayoutInput,
) -> Result<FlexItem, LayoutError> {
    let cb = frame.child_cb;
    let used = ctx.used_values(style, cb.width, cb.height);
    let margin = used.margin().or_zero();
    let (outer_main, outer_cross, frame_main) = if frame.is_row {
        (
            margin.horizontal() + used.frame_horizontal(),
            margin.vertical() + used.frame_vertical(),
            used.frame_horizontal(),
        )
    } else {
        (
            margin.vertical() + used.frame_vertical(),
            margin.horizontal() + used.frame_horizontal(),
            used.frame_vertical(),
        )
    };
    let main_basis = if frame.is_row { Some(cb.width) } else { cb.height };

    // "A. If the item has a definite used flex basis, that's the flex base
    // size."
    let basis = style
        .flex_basis
        .resolve(main_basis, &used.lengths)
        .map(|basis| match style.box_sizing {
            BoxSizing::ContentBox => basis.max(0.0),
            BoxSizing::BorderBox => (basis - frame_main).max(0.0),
        });
    // "flex-basis: auto ... retrieves the value of the main size property"
    let main_property = if frame.is_row {
        used.content_width()
    } else {
        used.content_height()
    };
    let align = style.align_self.resolve(container.align_items);
    let cross_auto = if frame.is_row {
        style.height.is_auto()
    } else {
        style.width.is_auto()
    };

    // "E. Otherwise, size the item into the available space using its used
    // flex basis in place of its main size, treating a value of content as
    // max-content."
    let base_size = match basis.or(main_property) {
        Some(size) => size,
        None if frame.is_row => content_sizes(ctx, id, cb.width)?.max_content,
        None => {
            let input = LayoutInput {
                width_override: column_cross_override(&used, align, cross_auto, outer_cross, cb),
                shrink_to_fit: true,
                ..*origin
            };
            let _ = ctx.layout_child(id, &input)?;
            ctx.node(id)?.geometry.content.height
        }
    };

    let (min_main, max_main) = if frame.is_row {
        (used.clamp_width(0.0), used.clamp_width(f32::MAX))
    } else {
        (used.clamp_height(0.0), used.clamp_height(f32::MAX))
    };
    Ok(FlexItem {
        outer_main,
        outer_cross,
        align,
        cross_auto,
        ..FlexItem::new(id, base_size, min_main, max_main, style)
    })
}

/// [§ 9.4 step 11](https://www.w3.org/TR/css-flexbox-1/#algo-stretch)
///
/// In a column container the cross size is the width, which has to be
/// known before the item is laid out.
fn column_cross_override(
    used: &UsedValues<'_>,
    align: AlignItems,
    cross_auto: bool,
    outer_cross: f32,
    cb: ContainingBlock,
) -> Option<f32> {
    if align == AlignItems::Stretch && cross_auto {
        Some(used.clamp_width(cb.width - outer_cross))
    } else {
        used.content_width().map(|width| used.clamp_width(width))
    }
}

/// [§ 9.3 Main Size Determination](https://www.w3.org/TR/css-flexbox-1/#algo-line-break)
///
/// "If the flex container is single-line, collect all the flex items into
/// a single flex line. Otherwise, starting from the first uncollected
/// item, collect consecutive items one by one until the first time that
/// the next collected item would not fit into the flex container's inner
/// main size"
fn collect_lines(
    items: &[FlexItem],
    wrap: FlexWrap,
    available_main: Option<f32>,
    gap: f32,
) -> Vec<Range<usize>> {
    let Some(available) = available_main.filter(|_| wrap != FlexWrap::Nowrap) else {
        return if items.is_empty() { Vec::new() } else { vec![0..items.len()] };
    };
    let mut lines = Vec::new();
    let mut start = 0;
    let mut used = 0.0;
    for (index, item) in items.iter().enumerate() {
        let outer = item.hypothetical_size + item.outer_main;
        let with_gap = if index == start { outer } else { used + gap + outer };
        if index > start && with_gap > available + 0.01 {
            lines.push(start..index);
            start = index;
            used = outer;
        } else {
            used = with_gap;
        }
    }
    if start < items.len() {
        lines.push(start..items.len());
    }
    lines
}

/// [§ 9.7 Resolving Flexible Lengths](https://www.w3.org/TR/css-flexbox-1/#resolve-flexible-lengths)
///
/// Full iterative freeze-loop algorithm.
fn resolve_flexible_lengths(items: &mut [FlexItem], available_main: f32) {
    if items.is_empty() {
        return;
    }

    // STEP 1: "Determine the used flex factor."
    //
    // "If the sum of the outer hypothetical main sizes of all items on the
    // line is less than the flex container's inner main size, use the flex
    // grow factor for the rest of this algorithm; otherwise, use the flex
    // shrink factor."
    let sum_outer_hypothetical: f32 = items
        .iter()
        .map(|item| item.hypothetical_size + item.outer_main)
        .sum();
    let growing = sum_outer_hypothetical < available_main;
    let factor = |item: &FlexItem| if growing { item.grow } else { item.shrink };

    // STEP 2: "Size inflexible items."
    for item in items.iter_mut() {
        item.frozen = false;
        let freeze = factor(item) == 0.0
            || (growing && item.base_size > item.hypothetical_size)
            || (!growing && item.base_size < item.hypothetical_size);
        if freeze {
            item.frozen = true;
            item.target_size = item.hypothetical_size;
        }
    }

    let free_space = |items: &[FlexItem]| {
        available_main
            - items
                .iter()
                .map(|item| {
                    let size = if item.frozen { item.target_size } else { item.base_size };
                    size + item.outer_main
                })
                .sum::<f32>()
    };

    // STEP 3: "Calculate initial free space."
    let initial_free_space = free_space(items);

    // STEP 4: Loop until all items are frozen.
    let mut violations = vec![0.0_f32; items.len()];
    while items.iter().any(|item| !item.frozen) {
        // 4a. "Calculate the remaining free space"
        let remaining = free_space(items);
        let factor_sum: f32 = items
            .iter()
            .filter(|item| !item.frozen)
            .map(factor)
            .sum();
        // "If the sum of the unfrozen flex items' flex factors is less than
        // one, multiply the initial free space by this sum. If the
        // magnitude of this value is less than the magnitude of the
        // remaining free space, use this as the remaining free space."
        let remaining = if factor_sum < 1.0 {
            let scaled = initial_free_space * factor_sum;
            if scaled.abs() < remaining.abs() { scaled } else { remaining }
        } else {
            remaining
        };

        // 4b. Distribute the free space.
        if growing {
            // "Find the ratio of the item's flex grow factor to the sum of
            // the flex grow factors of all unfrozen items on the line. Set
            // the item's target main size to its flex base size plus a
            // fraction of the remaining free space proportional to the
            // ratio."
            for item in items.iter_mut().filter(|item| !item.frozen) {
                item.target_size = item.base_size + remaining * (item.grow / factor_sum);
            }
        } else {
            // "For every unfrozen item on the line, multiply its flex shrink
            // factor by its inner flex base size, and note this as its
            // scaled flex shrink factor."
            let scaled_sum: f32 = items
                .iter()
                .filter(|item| !item.frozen)
                .map(|item| item.shrink * item.base_size)
                .sum();
            for item in items.iter_mut().filter(|item| !item.frozen) {
                let ratio = if scaled_sum > 0.0 {
                    item.shrink * item.base_size / scaled_sum
                } else {
                    0.0
                };
                item.target_size = remaining.abs().mul_add(-ratio, item.base_size);
            }
        }

        // 4c. "Fix min/max violations."
        let mut total_violation = 0.0_f32;
        for (item, violation) in items.iter_mut().zip(violations.iter_mut()) {
            *violation = 0.0;
            if item.frozen {
                continue;
            }
            let clamped = item.clamp(item.target_size).max(0.0);
            *violation = clamped - item.target_size;
            total_violation += *violation;
            item.target_size = clamped;
        }

        // 4d. "Freeze over-flexed items."
        //
        // "Zero: Freeze all items. Positive: Freeze all the items with min
        // violations. Negative: Freeze all the items with max violations."
        for (item, &violation) in items.iter_mut().zip(&violations) {
            let freeze = if total_violation.abs() < 0.01 {
                true
            } else if total_violation > 0.0 {
                violation > 0.0
            } else {
                violation < 0.0
            };
            if freeze {
                item.frozen = true;
            }
        }
    }
}

/// Lay the item out at the container's content origin with its resolved
/// main size; it is moved into place later.
fn layout_item(
    ctx: &mut LayoutContext<'_>,
    item: &mut FlexItem,
    frame: &FlexFrame,
    origin: &LayoutInput,
) -> Result<(), LayoutError> {
    let style = ctx.style(item.id)?;
    let cb = frame.child_cb;
    let used = ctx.used_values(&style, cb.width, cb.height);
    let input = if frame.is_row {
        LayoutInput {
            available_width: item.target_size + item.outer_main,
            width_override: Some(item.target_size),
            ..*origin
        }
    } else {
        let width_override =
            column_cross_override(&used, item.align, item.cross_auto, item.outer_cross, cb);
        LayoutInput {
            width_override,
            height_override: Some(item.target_size),
            shrink_to_fit: width_override.is_none(),
            ..*origin
        }
    };
    let _ = ctx.layout_child(item.id, &input)?;

    let geometry = &ctx.node(item.id)?.geometry;
    let margin_box = geometry.margin_box();
    (item.main_size, item.cross_size) = if frame.is_row {
        (margin_box.width, margin_box.height)
    } else {
        (margin_box.height, margin_box.width)
    };
    item.baseline = geometry
        .baseline
        .map(|baseline| geometry.margin.top + baseline);
    Ok(())
}

/// [§ 9.4 step 8](https://www.w3.org/TR/css-flexbox-1/#algo-cross-line)
///
/// "the used cross-size of the flex line is the largest of the numbers
/// found in the previous two steps": the largest baseline-aligned
/// ascent plus descent, and the largest outer hypothetical cross size.
fn line_cross_size(items: &[FlexItem]) -> f32 {
    let (ascent, descent) = items
        .iter()
        .filter(|item| item.align == AlignItems::Baseline)
        .fold((0.0_f32, 0.0_f32), |(ascent, descent), item| {
            let baseline = item.baseline.unwrap_or(item.cross_size);
            (ascent.max(baseline), descent.max(item.cross_size - baseline))
        });
    items
        .iter()
        .map(|item| item.cross_size)
        .fold(ascent + descent, f32::max)
}

/// [§ 9.4 step 11](https://www.w3.org/TR/css-flexbox-1/#algo-stretch)
///
/// "If a flex item has align-self: stretch, its computed cross size
/// property is auto, and neither of its cross-axis margins are auto, the
/// used outer cross size is the used cross size of its flex line, clamped
/// according to the item's used min and max cross sizes."
fn stretch_item(
    ctx: &mut LayoutContext<'_>,
    item: &mut FlexItem,
    line_cross: f32,
    frame: &FlexFrame,
) -> Result<(), LayoutError> {
    if item.align != AlignItems::Stretch || !item.cross_auto {
        return Ok(());
    }
    let style = ctx.style(item.id)?;
    let used = ctx.used_values(&style, frame.child_cb.width, frame.child_cb.height);
    let height = used.clamp_height(line_cross - item.outer_cross);
    let geometry = &mut ctx.node_mut(item.id)?.geometry;
    geometry.content.height = height;
    geometry.scroll_height = geometry.scroll_height.max(height);
    item.cross_size = geometry.margin_box().height;
    Ok(())
}

/// [§ 8.3 align-items](https://www.w3.org/TR/css-flexbox-1/#align-items-property)
fn align_offset(item: &FlexItem, line_cross: f32, max_baseline: f32, is_row: bool) -> f32 {
    let free = line_cross - item.cross_size;
    match item.align {
        AlignItems::Stretch | AlignItems::FlexStart => 0.0,
        AlignItems::FlexEnd => free,
        AlignItems::Center => free / 2.0,
        AlignItems::Baseline if is_row => {
            max_baseline - item.baseline.unwrap_or(item.cross_size)
        }
        AlignItems::Baseline => 0.0,
    }
}

/// Compute justify-content alignment offsets.
///
/// [§ 8.2 Axis Alignment: the justify-content property](https://www.w3.org/TR/css-flexbox-1/#justify-content-property)
///
/// Returns `(initial_offset, gap_between_items)`.
fn justify_offsets(justify: JustifyContent, free_space: f32, item_count: usize) -> (f32, f32) {
    match item_count {
        0 => return (0.0, 0.0),
        1 => return (single_item_offset(justify, free_space), 0.0),
        _ => {}
    }
    let count = item_count as f32;
    match justify {
        // "Flex items are packed toward the start of the line."
        JustifyContent::FlexStart => (0.0, 0.0),
        // "Flex items are packed toward the end of the line."
        JustifyContent::FlexEnd => (free_space, 0.0),
        // "Flex items are packed toward the center of the line."
        JustifyContent::Center => (free_space / 2.0, 0.0),
        // "If the leftover free-space is negative or there is only a single
        // flex item on the line, this value is identical to flex-start."
        JustifyContent::SpaceBetween => {
            if item_count <= 1 || free_space <= 0.0 {
                (0.0, 0.0)
            } else {
                (0.0, free_space / (count - 1.0))
            }
        }
        // "Flex items are evenly distributed in the line, with half-size
        // spaces on either end."
        JustifyContent::SpaceAround => {
            if free_space <= 0.0 {
                (0.0, 0.0)
            } else {
                let gap = free_space / count;
                (gap / 2.0, gap)
            }
        }
        JustifyContent::SpaceEvenly => {
            if free_space <= 0.0 {
                (0.0, 0.0)
            } else {
                let gap = free_space / (count + 1.0);
                (gap, gap)
            }
        }
    }
}

/// A lone item is only ever placed at the start, end or center of its
/// line: `space-between` degenerates to the start, `space-around` and
/// `space-evenly` to the center. Negative free space aligns to the start
/// for the distributed values.
fn single_item_offset(justify: JustifyContent, free_space: f32) -> f32 {
    match justify {
        JustifyContent::FlexStart | JustifyContent::SpaceBetween => 0.0,
        JustifyContent::FlexEnd => free_space,
        JustifyContent::Center => free_space / 2.0,
        JustifyContent::SpaceAround | JustifyContent::SpaceEvenly => (free_space / 2.0).max(0.0),
    }
}
