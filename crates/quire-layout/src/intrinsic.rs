//! Intrinsic (content-based) widths.
//!
//! [§ 4.1 Intrinsic Sizes](https://www.w3.org/TR/css-sizing-3/#intrinsic-sizes)
//!
//! Read-only measurement: nothing here writes geometry or calls a strategy,
//! and layout may call it for any subtree at any time.

use quire_style::{FlexWrap, InnerDisplayType};
use quire_tree::{NodeId, NodeKind};

use crate::context::LayoutContext;
use crate::error::LayoutError;

/// Min-content and max-content widths of a box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContentSizes {
    /// Narrowest width without overflow from breakable content.
    pub min_content: f32,
    /// Width with no soft wraps taken.
    pub max_content: f32,
}

impl ContentSizes {
    /// Both sizes equal to `size`.
    #[must_use]
    pub const fn exactly(size: f32) -> Self {
        Self {
            min_content: size,
            max_content: size,
        }
    }

    /// Side by side.
    #[must_use]
    fn sum(self, other: Self) -> Self {
        Self {
            min_content: self.min_content + other.min_content,
            max_content: self.max_content + other.max_content,
        }
    }

    /// Stacked, or on separate lines.
    #[must_use]
    fn max(self, other: Self) -> Self {
        Self {
            min_content: self.min_content.max(other.min_content),
            max_content: self.max_content.max(other.max_content),
        }
    }

    fn inflate(self, amount: f32) -> Self {
        Self {
            min_content: self.min_content + amount,
            max_content: self.max_content + amount,
        }
    }

    /// [§ 10.3.5 Floating, non-replaced elements](https://www.w3.org/TR/CSS2/visudet.html#float-width)
    ///
    /// "Then the shrink-to-fit width is:
    /// min(max(preferred minimum width, available width), preferred width)."
    #[must_use]
    pub fn shrink_to_fit(&self, available: f32) -> f32 {
        self.min_content.max(available).min(self.max_content).max(0.0)
    }
}

/// Depth at which measurement stops descending and counts a subtree as
/// empty.
const MAX_MEASURE_DEPTH: usize = 128;

/// Content-box min/max-content widths of `id`.
///
/// # Errors
/// [`LayoutError::MissingNode`] for an unknown ID.
pub fn content_sizes(
    ctx: &LayoutContext<'_>,
    id: NodeId,
    cb_width: f32,
) -> Result<ContentSizes, LayoutError> {
    measure_content(ctx, id, cb_width, 0)
}

/// Margin-box min/max-content contribution of `id` to its parent.
///
/// # Errors
/// [`LayoutError::MissingNode`] for an unknown ID.
pub fn outer_sizes(
    ctx: &LayoutContext<'_>,
    id: NodeId,
    cb_width: f32,
) -> Result<ContentSizes, LayoutError> {
    measure_outer(ctx, id, cb_width, 0)
}

fn measure_outer(
    ctx: &LayoutContext<'_>,
    id: NodeId,
    cb_width: f32,
    depth: usize,
) -> Result<ContentSizes, LayoutError> {
    let node = ctx.node(id)?;
    let style = &node.style;
    let used = ctx.used_values(style, cb_width, None);
    let margin = used.margin().or_zero();
    let edges = margin.horizontal() + used.frame_horizontal();

    // Text runs carry no box edges of their own.
    if matches!(node.kind, NodeKind::Text) {
        return measure_content(ctx, id, cb_width, depth);
    }

    // STEP 1: A definite width is the contribution.
    if let Some(width) = used.content_width() {
        return Ok(ContentSizes::exactly(used.clamp_width(width) + edges));
    }

    // STEP 2: Otherwise measure the content, within min/max.
    let content = measure_content(ctx, id, cb_width, depth)?;
    Ok(ContentSizes {
        min_content: used.clamp_width(content.min_content),
        max_content: used.clamp_width(content.max_content),
    }
    .inflate(edges))
}

fn measure_content(
    ctx: &LayoutContext<'_>,
    id: NodeId,
    cb_width: f32,
    depth: usize,
) -> Result<ContentSizes, LayoutError> {
    let node = ctx.node(id)?;

    // Case 1: Replaced content has its own width.
    if let Some((width, _)) = node.intrinsic_replaced_size() {
        return Ok(ContentSizes::exactly(width.max(0.0)));
    }

    // Case 2: Text measured up front.
    let own_text = if node.has_text() {
        ContentSizes {
            min_content: node.intrinsic.min_content_width,
            max_content: node.intrinsic.max_content_width,
        }
    } else {
        ContentSizes::default()
    };

    if depth >= MAX_MEASURE_DEPTH {
        return Ok(own_text);
    }

    let style = &node.style;
    let children: Vec<NodeId> = node
        .children
        .iter()
        .copied()
        .filter(|&child| {
            ctx.tree.get(child).is_some_and(|c| {
                !c.style.is_display_none() && !c.style.position.is_out_of_flow()
            })
        })
        .collect();

    let inner = style.display.map(|display| display.inner);
    let sizes = match inner {
        // Case 3: Flex containers lay items side by side on the main axis.
        Some(InnerDisplayType::Flex) if style.flex_direction.is_row() => {
            let lengths = ctx.used_values(style, cb_width, None).lengths;
            let gap = style.column_gap.resolve_or_zero(Some(cb_width), &lengths);
            let mut total = ContentSizes::default();
            let mut widest = ContentSizes::default();
            for (index, &child) in children.iter().enumerate() {
                let item = measure_outer(ctx, child, cb_width, depth + 1)?;
                let item = if index == 0 { item } else { item.inflate(gap) };
                total = total.sum(item);
                widest = widest.max(item);
            }
            if style.flex_wrap == FlexWrap::Nowrap {
                total
            } else {
                ContentSizes {
                    min_content: widest.min_content,
                    max_content: total.max_content,
                }
            }
        }
        // Case 4: Tables are as wide as their widest row.
        Some(InnerDisplayType::Table) => {
            let spacing = style
                .border_spacing
                .resolve_or_zero(None, &ctx.used_values(style, cb_width, None).lengths);
            let mut widest = ContentSizes::default();
            for row in table_rows(ctx, id) {
                let cells = ctx.tree.children(row);
                let mut row_sizes = ContentSizes::exactly(spacing * (cells.len() as f32 + 1.0));
                for &cell in cells {
                    row_sizes = row_sizes.sum(measure_outer(ctx, cell, cb_width, depth + 1)?);
                }
                widest = widest.max(row_sizes);
            }
            widest
        }
        // Case 5: Flow content. Inline-level children share lines, block
        // children stack.
        _ => {
            let mut line = ContentSizes::default();
            let mut stacked = ContentSizes::default();
            for &child in &children {
                let Some(child_node) = ctx.tree.get(child) else {
                    continue;
                };
                let sizes = measure_outer(ctx, child, cb_width, depth + 1)?;
                if child_node.style.is_inline_level() {
                    line = ContentSizes {
                        min_content: line.min_content.max(sizes.min_content),
                        max_content: line.max_content + sizes.max_content,
                    };
                } else {
                    stacked = stacked.max(line).max(sizes);
                    line = ContentSizes::default();
                }
            }
            stacked.max(line)
        }
    };

    Ok(ContentSizes {
        min_content: own_text.min_content.max(sizes.min_content),
        max_content: own_text.max_content + sizes.max_content,
    })
}

/// Rows of `table` in document order: its own rows, then rows inside its
/// row groups. Rows of nested tables belong to those tables.
fn table_rows(ctx: &LayoutContext<'_>, table: NodeId) -> Vec<NodeId> {
    let inner = |id: NodeId| {
        ctx.tree
            .get(id)
            .and_then(|node| node.style.display)
            .map(|display| display.inner)
    };
    let mut rows = Vec::new();
    for &child in ctx.tree.children(table) {
        match inner(child) {
            Some(InnerDisplayType::TableRow) => rows.push(child),
            Some(InnerDisplayType::TableRowGroup(_)) => rows.extend(
                ctx.tree
                    .children(child)
                    .iter()
                    .copied()
                    .filter(|&row| inner(row) == Some(InnerDisplayType::TableRow)),
            ),
            _ => {}
        }
    }
    rows
}
