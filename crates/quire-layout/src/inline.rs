//! Inline formatting context.
//!
//! [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
//!
//! "In an inline formatting context, boxes are laid out horizontally, one
//! after the other, beginning at the top of a containing block. Horizontal
//! margins, borders, and padding are respected between these boxes."
//!
//! Inline content is flattened into a run of items (text, inline box
//! edges, atomic inlines, floats) which are then poured into line boxes.
//! Line boxes are stored on the block container that owns them; text runs
//! and inline boxes get the union of their fragments as geometry.

use std::collections::HashMap;
use std::sync::Arc;

use quire_style::{ComputedStyle, InnerDisplayType, Overflow, TextAlign};
use quire_tree::{
    BoxGeometry, EdgeSizes, FragmentContent, LayoutNode, LineBox, LineFragment, NodeId, NodeKind,
    Rect,
};

use crate::block::layout_float;
use crate::context::{ContainingBlock, LayoutContext, LayoutInput, LayoutOutcome};
use crate::error::LayoutError;
use crate::float::FloatContext;
use crate::intrinsic::outer_sizes;
use crate::margin::CollapsedMargin;
use crate::strategy::{LayoutStrategy, StrategyKind};
use crate::text::{FontKey, collapse_white_space};

/// Where line boxes go.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct InlineArea {
    /// Absolute x of the content edge.
    pub x: f32,
    /// Absolute y of the first line's top.
    pub y: f32,
    /// Width of the content box.
    pub width: f32,
    /// Containing block for atomic inlines and floats.
    pub containing_block: ContainingBlock,
}

/// Which content of the container is laid out in lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InlineSource {
    /// The container's own text followed by its children.
    Contents,
    /// Only the container's own text.
    OwnText,
}

/// Summary of an inline formatting context.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct InlineResult {
    /// Distance from the area top to the bottom of the last line box.
    pub height: f32,
    /// Absolute y of the first line's baseline.
    pub first_baseline: Option<f32>,
    /// Line boxes created.
    pub line_count: usize,
}

/// A piece of inline content, in document order.
enum InlineItem {
    Text {
        source: NodeId,
        text: String,
        style: Arc<ComputedStyle>,
    },
    BoxStart {
        source: NodeId,
        edge: f32,
    },
    BoxEnd {
        source: NodeId,
        edge: f32,
    },
    Atomic(NodeId),
    Float(NodeId),
    OutOfFlow(NodeId),
    Hidden(NodeId),
}

/// [§ 16.6.1 The 'white-space' processing model](https://www.w3.org/TR/CSS2/text.html#white-space-model)
///
/// Collapsible spaces collapse across element boundaries, so the item
/// collector remembers whether the last text it emitted ended in one.
struct ItemCollector {
    items: Vec<InlineItem>,
    after_space: bool,
}

impl ItemCollector {
    fn push_text(&mut self, source: NodeId, raw: &str, style: &Arc<ComputedStyle>) {
        let mut text = collapse_white_space(raw, style.white_space);
        if style.white_space.collapses() && self.after_space {
            text = text.trim_start_matches(' ').to_string();
        }
        if text.is_empty() {
            return;
        }
        self.after_space = style.white_space.collapses() && text.ends_with(' ');
        self.items.push(InlineItem::Text {
            source,
            text,
            style: Arc::clone(style),
        });
    }

    fn collect_children(
        &mut self,
        ctx: &LayoutContext<'_>,
        parent: NodeId,
        cb_width: f32,
    ) -> Result<(), LayoutError> {
        for child in ctx.children(parent) {
            let node = ctx.node(child)?;
            let style = &node.style;
            if style.is_display_none() {
                self.items.push(InlineItem::Hidden(child));
            } else if style.position.is_out_of_flow() {
                self.items.push(InlineItem::OutOfFlow(child));
            } else if style.is_floated() {
                self.items.push(InlineItem::Float(child));
            } else if matches!(node.kind, NodeKind::Text) {
                if let Some(text) = node.text.as_deref() {
                    self.push_text(child, text, style);
                }
            } else if is_inline_box(node) {
                self.collect_inline_box(ctx, child, cb_width)?;
            } else {
                if !style.is_inline_level() {
                    ctx.warn_once(
                        "block-level box inside inline content is laid out as an atomic inline",
                    );
                }
                self.after_space = false;
                self.items.push(InlineItem::Atomic(child));
            }
        }
        Ok(())
    }

    /// [§ 10.3.1 Inline, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#inline-width)
    ///
    /// "The 'width' property does not apply. A computed value of 'auto' for
    /// 'left', 'right', 'margin-left' or 'margin-right' becomes a used value
    /// of '0'."
    fn collect_inline_box(
        &mut self,
        ctx: &LayoutContext<'_>,
        id: NodeId,
        cb_width: f32,
    ) -> Result<(), LayoutError> {
        let style = ctx.style(id)?;
        let used = ctx.used_values(&style, cb_width, None);
        let margin = used.margin().or_zero();
        let padding = used.padding();
        let border = used.border();
        self.items.push(InlineItem::BoxStart {
            source: id,
            edge: margin.left + border.left + padding.left,
        });
        if let Some(text) = ctx.node(id)?.text.as_deref() {
            self.push_text(id, text, &style);
        }
        self.collect_children(ctx, id, cb_width)?;
        self.items.push(InlineItem::BoxEnd {
            source: id,
            edge: margin.right + border.right + padding.right,
        });
        Ok(())
    }
}

/// Non-atomic inline boxes: their content flows into the surrounding
/// lines.
fn is_inline_box(node: &LayoutNode) -> bool {
    node.intrinsic_replaced_size().is_none()
        && node.style.is_inline_level()
        && node
            .style
            .display
            .is_some_and(|display| display.inner == InnerDisplayType::Flow)
}

/// A fragment waiting for its line to be finished.
struct PendingFragment {
    source: NodeId,
    content: FragmentContent,
    /// Offset from the line's left edge.
    x: f32,
    width: f32,
    /// Height above the baseline.
    ascent: f32,
    /// Depth below the baseline.
    descent: f32,
    /// Inline boxes this fragment sits in, outermost first.
    owners: Vec<NodeId>,
    /// Where an atomic inline was provisionally laid out.
    provisional: Option<(f32, f32)>,
}

/// Builds line boxes for one inline formatting context.
struct LineBuilder {
    area: InlineArea,
    text_align: TextAlign,
    /// [§ 10.8.1](https://www.w3.org/TR/CSS2/visudet.html#leading)
    ///
    /// "each line box starts with a zero-width inline box with the
    /// element's font and line height properties"
    strut_height: f32,
    strut_ascent: f32,
    lines: Vec<LineBox>,
    fragments: Vec<PendingFragment>,
    open_boxes: Vec<NodeId>,
    cursor_x: f32,
    line_top: f32,
    line_left: f32,
    line_width: f32,
    line_open: bool,
    deferred_floats: Vec<NodeId>,
    bounds: HashMap<NodeId, Rect>,
}

impl LineBuilder {
    fn new(area: InlineArea, container: &LayoutNode) -> Self {
        Self {
            area,
            text_align: container.style.text_align,
            strut_height: container.intrinsic.line_height,
            strut_ascent: container.intrinsic.ascent,
            lines: Vec::new(),
            fragments: Vec::new(),
            open_boxes: Vec::new(),
            cursor_x: 0.0,
            line_top: area.y,
            line_left: area.x,
            line_width: area.width,
            line_open: false,
            deferred_floats: Vec::new(),
            bounds: HashMap::new(),
        }
    }

    fn line_is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// [§ 9.5](https://www.w3.org/TR/CSS2/visuren.html#floats)
    ///
    /// "the current and subsequent line boxes created next to the float are
    /// shortened as necessary to make room for the margin box of the float."
    fn update_span(&mut self, ctx: &LayoutContext<'_>) {
        let (left, width) = match ctx.float_context() {
            Some(floats) if !floats.is_empty() => {
                let top = self.line_top - floats.origin_y;
                let start = self.area.x - floats.origin_x;
                let (left, right) = floats.available_span(
                    top,
                    top + self.strut_height.max(1.0),
                    start,
                    start + self.area.width,
                );
                (left + floats.origin_x, right - left)
            }
            _ => (self.area.x, self.area.width),
        };
        self.line_left = left;
        self.line_width = width;
    }

    fn ensure_line(&mut self, ctx: &LayoutContext<'_>) {
        if !self.line_open {
            self.line_open = true;
            self.cursor_x = 0.0;
            self.update_span(ctx);
        }
    }

    fn remaining(&self) -> f32 {
        self.line_width - self.cursor_x
    }

    /// Move an empty line down to where a float beside it ends, when floats
    /// leave too little room. Returns false when there is nothing to move
    /// past.
    fn move_below_floats(&mut self, ctx: &LayoutContext<'_>) -> bool {
        if self.line_width >= self.area.width {
            return false;
        }
        let Some(floats) = ctx.float_context() else {
            return false;
        };
        let top = self.line_top - floats.origin_y;
        let next = floats.next_unblocked_y(top, top + self.strut_height.max(1.0));
        if next <= top {
            return false;
        }
        self.line_top = next + floats.origin_y;
        self.update_span(ctx);
        true
    }

    fn push(&mut self, fragment: PendingFragment) {
        self.cursor_x = fragment.x + fragment.width;
        self.fragments.push(fragment);
    }

    fn add_text(
        &mut self,
        ctx: &mut LayoutContext<'_>,
        source: NodeId,
        text: &str,
        style: &ComputedStyle,
    ) {
        let (line_height, ascent) = ctx
            .tree
            .get(source)
            .map_or((self.strut_height, self.strut_ascent), |node| {
                (node.intrinsic.line_height, node.intrinsic.ascent)
            });
        let font = FontKey::from_style(style);
        let mut rest = text;
        while !rest.is_empty() {
            self.ensure_line(ctx);

            // "A sequence of collapsible spaces at the beginning of a line is
            // removed."
            if self.line_is_empty() && style.white_space.collapses() {
                rest = rest.trim_start_matches(' ');
                if rest.is_empty() {
                    break;
                }
            }

            let fit = ctx.env.line_breaker.fit(
                rest,
                style,
                self.remaining(),
                self.line_is_empty(),
                ctx.env.metrics,
            );
            if fit.end == 0 {
                self.finish_line(ctx);
                continue;
            }
            if fit.overflow && self.move_below_floats(ctx) {
                continue;
            }

            let piece = &rest[..fit.end];
            let width = ctx.env.metrics.text_width(piece, &font);
            self.push(PendingFragment {
                source,
                content: FragmentContent::Text {
                    text: piece.to_string(),
                    font_size: style.font_size,
                },
                x: self.cursor_x,
                width,
                ascent,
                descent: line_height - ascent,
                owners: self.open_boxes.clone(),
                provisional: None,
            });
            rest = &rest[fit.end..];
            if fit.forced_break || !rest.is_empty() {
                self.finish_line(ctx);
            }
        }
    }

    fn add_edge(&mut self, ctx: &LayoutContext<'_>, source: NodeId, edge: f32) {
        self.ensure_line(ctx);
        let (line_height, ascent) = ctx
            .tree
            .get(source)
            .map_or((0.0, 0.0), |node| (node.intrinsic.line_height, node.intrinsic.ascent));
        self.push(PendingFragment {
            source,
            content: FragmentContent::InlineEdge,
            x: self.cursor_x,
            width: edge,
            ascent,
            descent: line_height - ascent,
            owners: self.open_boxes.clone(),
            provisional: None,
        });
    }

    /// [§ 10.8.1](https://www.w3.org/TR/CSS2/visudet.html#leading)
    ///
    /// "The baseline of an 'inline-block' is the baseline of its last line
    /// box in the normal flow, unless it has either no in-flow line boxes or
    /// if its 'overflow' property has a computed value other than
    /// 'visible', in which case the baseline is the bottom margin edge."
    fn add_atomic(&mut self, ctx: &mut LayoutContext<'_>, id: NodeId) -> Result<(), LayoutError> {
        self.ensure_line(ctx);
        let (x, y) = (self.area.x, self.line_top);
        let input = LayoutInput {
            x,
            y,
            available_width: self.area.width,
            shrink_to_fit: true,
            ..LayoutInput::in_block(self.area.containing_block)
        };
        let _ = ctx.layout_child(id, &input)?;
        let node = ctx.node(id)?;
        let geometry = &node.geometry;
        let margin_box = geometry.margin_box();
        let ascent = if node.style.overflow == Overflow::Visible {
            geometry
                .baseline
                .map_or(margin_box.height, |baseline| geometry.margin.top + baseline)
        } else {
            margin_box.height
        };

        if margin_box.width > self.remaining() + 0.01 {
            if !self.line_is_empty() {
                self.finish_line(ctx);
                self.ensure_line(ctx);
            }
            while margin_box.width > self.line_width + 0.01 && self.move_below_floats(ctx) {}
        }
        self.push(PendingFragment {
            source: id,
            content: FragmentContent::Atomic,
            x: self.cursor_x,
            width: margin_box.width,
            ascent,
            descent: margin_box.height - ascent,
            owners: self.open_boxes.clone(),
            provisional: Some((x, y)),
        });
        Ok(())
    }

    /// [§ 9.5](https://www.w3.org/TR/CSS2/visuren.html#floats)
    ///
    /// "If a shortened line box is too small to contain any content, then
    /// the line box is shifted downward (and its width recomputed) until
    /// either some content fits or there are no more floats present."
    ///
    /// A float that fits beside the current line is placed at its top;
    /// otherwise it waits for the next line.
    fn add_float(&mut self, ctx: &mut LayoutContext<'_>, id: NodeId) -> Result<(), LayoutError> {
        self.ensure_line(ctx);
        let style = ctx.style(id)?;
        let cb = self.area.containing_block;
        let cb_width = cb.width;
        let fits_now = self.line_is_empty()
            || outer_sizes(ctx, id, cb_width)?.max_content <= self.remaining();
        if fits_now {
            layout_float(ctx, id, &style, cb, self.line_top)?;
            self.update_span(ctx);
        } else {
            self.deferred_floats.push(id);
        }
        Ok(())
    }

    fn place_deferred_floats(&mut self, ctx: &mut LayoutContext<'_>) -> Result<(), LayoutError> {
        for id in std::mem::take(&mut self.deferred_floats) {
            let style = ctx.style(id)?;
            layout_float(ctx, id, &style, self.area.containing_block, self.line_top)?;
        }
        Ok(())
    }

    /// [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
    ///
    /// "The line box height is the distance between the uppermost box top
    /// and the lowermost box bottom."
    fn finish_line(&mut self, ctx: &mut LayoutContext<'_>) {
        if !self.line_open {
            return;
        }
        self.line_open = false;
        if self.fragments.is_empty() {
            return;
        }
        let mut fragments = std::mem::take(&mut self.fragments);

        // STEP 1: Drop trailing white space from the last text fragment.
        //
        // [§ 16.6.1](https://www.w3.org/TR/CSS2/text.html#white-space-model)
        //
        // "If a space (U+0020) at the end of a line has 'white-space' set to
        // 'normal', 'nowrap', or 'pre-line', it is also removed."
        if let Some(last) = fragments
            .iter_mut()
            .rev()
            .find(|fragment| matches!(fragment.content, FragmentContent::Text { .. }))
            && let FragmentContent::Text { text, .. } = &mut last.content
        {
            let collapses = ctx
                .tree
                .get(last.source)
                .is_none_or(|node| node.style.white_space.collapses());
            let trimmed = if collapses {
                text.trim_end_matches(|ch: char| ch.is_whitespace())
            } else {
                text.trim_end_matches(['\n', '\r'])
            };
            if trimmed.len() != text.len() {
                let font = ctx
                    .tree
                    .get(last.source)
                    .map(|node| FontKey::from_style(&node.style));
                *text = trimmed.to_string();
                if let Some(font) = font {
                    last.width = ctx.env.metrics.text_width(text, &font);
                }
            }
        }
        let content_width = fragments
            .last()
            .map_or(0.0, |fragment| fragment.x + fragment.width);

        // STEP 2: Line height from the strut and every fragment.
        let ascent = fragments
            .iter()
            .map(|fragment| fragment.ascent)
            .fold(self.strut_ascent, f32::max);
        let descent = fragments
            .iter()
            .map(|fragment| fragment.descent)
            .fold(self.strut_height - self.strut_ascent, f32::max);
        let height = (ascent + descent).max(0.0);

        // STEP 3: Horizontal alignment.
        //
        // [§ 16.2](https://www.w3.org/TR/CSS2/text.html#alignment-prop)
        let slack = (self.line_width - content_width).max(0.0);
        let offset = match self.text_align {
            TextAlign::Left => 0.0,
            TextAlign::Right => slack,
            TextAlign::Center => slack / 2.0,
            TextAlign::Justify => {
                ctx.warn_once("text-align: justify is laid out as left");
                0.0
            }
        };

        // STEP 4: Place the fragments.
        let mut placed = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            let x = self.line_left + offset + fragment.x;
            let y = self.line_top + ascent - fragment.ascent;
            let bounds = Rect::new(x, y, fragment.width, fragment.ascent + fragment.descent);
            if let Some((from_x, from_y)) = fragment.provisional {
                ctx.tree.shift_subtree(fragment.source, x - from_x, y - from_y);
            }
            for owner in fragment.owners.iter().copied().chain([fragment.source]) {
                let _ = self
                    .bounds
                    .entry(owner)
                    .and_modify(|rect| *rect = rect.union(&bounds))
                    .or_insert(bounds);
            }
            placed.push(LineFragment {
                bounds,
                source: fragment.source,
                content: fragment.content,
            });
        }

        self.lines.push(LineBox {
            bounds: Rect::new(self.line_left, self.line_top, self.line_width, height),
            fragments: placed,
            baseline: ascent,
        });
        self.line_top += height;
    }
}

/// Lay out the inline content of `container` into line boxes.
pub(crate) fn layout_inline_content(
    ctx: &mut LayoutContext<'_>,
    container: NodeId,
    source: InlineSource,
    area: InlineArea,
) -> Result<InlineResult, LayoutError> {
    // STEP 1: Flatten the content into items.
    let node = ctx.node(container)?;
    let style = Arc::clone(&node.style);
    let mut collector = ItemCollector {
        items: Vec::new(),
        after_space: true,
    };
    if let Some(text) = node.text.as_deref() {
        collector.push_text(container, text, &style);
    }
    if source == InlineSource::Contents {
        collector.collect_children(ctx, container, area.width)?;
    }

    // STEP 2: Pour the items into lines.
    let mut builder = LineBuilder::new(area, ctx.node(container)?);
    for item in collector.items {
        match item {
            InlineItem::Text { source, text, style } => {
                builder.add_text(ctx, source, &text, &style);
            }
            InlineItem::BoxStart { source, edge } => {
                builder.add_edge(ctx, source, edge);
                builder.open_boxes.push(source);
            }
            InlineItem::BoxEnd { source, edge } => {
                let _ = builder.open_boxes.pop();
                builder.add_edge(ctx, source, edge);
            }
            InlineItem::Atomic(id) => builder.add_atomic(ctx, id)?,
            InlineItem::Float(id) => builder.add_float(ctx, id)?,
            InlineItem::OutOfFlow(id) => {
                // The static position: where the box would start on this
                // line.
                builder.ensure_line(ctx);
                let input = LayoutInput {
                    x: builder.line_left + builder.cursor_x,
                    y: builder.line_top,
                    available_width: area.width,
                    ..LayoutInput::in_block(area.containing_block)
                };
                let _ = ctx.layout_child(id, &input)?;
            }
            InlineItem::Hidden(id) => {
                let _ = ctx.layout_child(id, &LayoutInput::in_block(area.containing_block))?;
            }
        }
        if !builder.deferred_floats.is_empty() && !builder.line_open {
            builder.place_deferred_floats(ctx)?;
        }
    }
    builder.finish_line(ctx);
    builder.place_deferred_floats(ctx)?;

    // STEP 3: Geometry of text runs and inline boxes.
    for (id, bounds) in std::mem::take(&mut builder.bounds) {
        if id == container {
            continue;
        }
        let node = ctx.node(id)?;
        if matches!(node.kind, NodeKind::Text) {
            ctx.node_mut(id)?.geometry.content = bounds;
        } else if is_inline_box(node) {
            set_inline_box_geometry(ctx, id, bounds, area.width)?;
        }
    }

    let first_baseline = builder
        .lines
        .first()
        .map(|line| line.bounds.y + line.baseline);
    let height = builder
        .lines
        .last()
        .map_or(0.0, |line| line.bounds.bottom() - area.y);
    let line_count = builder.lines.len();
    log::trace!(target: "quire::layout", "{container} {line_count} line boxes, {height}px");
    ctx.node_mut(container)?.line_boxes = builder.lines;

    Ok(InlineResult {
        height,
        first_baseline,
        line_count,
    })
}

/// [§ 10.6.1 Inline, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#inline-non-replaced)
///
/// "The vertical padding, border and margin of an inline, non-replaced box
/// start at the top and bottom of the content area, and has nothing to do
/// with the 'line-height'."
///
/// `bounds` covers every fragment of the box, its edges included.
fn set_inline_box_geometry(
    ctx: &mut LayoutContext<'_>,
    id: NodeId,
    bounds: Rect,
    cb_width: f32,
) -> Result<(), LayoutError> {
    let style = ctx.style(id)?;
    let used = ctx.used_values(&style, cb_width, None);
    let margin = used.margin().or_zero();
    let padding = used.padding();
    let border = used.border();
    let start = margin.left + border.left + padding.left;
    let end = margin.right + border.right + padding.right;
    ctx.node_mut(id)?.geometry = BoxGeometry {
        content: Rect::new(
            bounds.x + start,
            bounds.y,
            (bounds.width - start - end).max(0.0),
            bounds.height,
        ),
        padding,
        border,
        margin: EdgeSizes {
            top: 0.0,
            bottom: 0.0,
            ..margin
        },
        scroll_width: bounds.width,
        scroll_height: bounds.height,
        baseline: None,
    };
    Ok(())
}

/// Inline-level content dispatched on its own, outside any block
/// container: a text run that is a flex item or table cell content.
///
/// The run is laid out as if wrapped in an anonymous block.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineStrategy;

impl LayoutStrategy for InlineStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Inline
    }

    fn can_layout(&self, node: &LayoutNode) -> bool {
        node.style.display.is_some_and(|display| {
            display.is_inline_level() && display.inner == InnerDisplayType::Flow
        })
    }

    fn layout(
        &self,
        id: NodeId,
        input: &LayoutInput,
        ctx: &mut LayoutContext<'_>,
    ) -> Result<LayoutOutcome, LayoutError> {
        let node = ctx.node(id)?;
        let width = input.width_override.unwrap_or_else(|| {
            if input.shrink_to_fit {
                node.intrinsic
                    .min_content_width
                    .max(input.available_width)
                    .min(node.intrinsic.max_content_width)
            } else {
                input.available_width
            }
        });
        let width = width.max(0.0);
        let area = InlineArea {
            x: input.x,
            y: input.y,
            width,
            containing_block: ContainingBlock {
                x: input.x,
                y: input.y,
                width,
                height: input.height_override,
            },
        };

        ctx.floats.push(FloatContext::new(input.x, input.y, width));
        let result = layout_inline_content(ctx, id, InlineSource::Contents, area);
        let floats = ctx.floats.pop();
        let result = result?;
        let float_bottom = floats
            .filter(|floats| !floats.is_empty())
            .map_or(0.0, |floats| floats.max_bottom());

        let height = input
            .height_override
            .unwrap_or_else(|| result.height.max(float_bottom));
        ctx.node_mut(id)?.geometry = BoxGeometry {
            content: Rect::new(input.x, input.y, width, height),
            scroll_width: width,
            scroll_height: height,
            baseline: result.first_baseline.map(|baseline| baseline - input.y),
            ..BoxGeometry::default()
        };
        Ok(LayoutOutcome::in_flow(CollapsedMargin::zero()))
    }
}
