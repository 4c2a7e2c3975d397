//! Table layout.
//!
//! [§ 17 Tables](https://www.w3.org/TR/CSS2/tables.html)
//!
//! The automatic table layout algorithm (§ 17.5.2) in the separated
//! borders model:
//! - row groups, with header rows first and footer rows last
//! - `colspan`
//! - column widths from cell max-content widths, scaled to fit
//! - `border-spacing`
//!
//! Not implemented: `rowspan`, `border-collapse: collapse`,
//! `table-layout: fixed`, `vertical-align` within cells.

use quire_style::{InnerDisplayType, TableSection};
use quire_tree::{LayoutNode, NodeId, Rect};

use crate::block::{PlacedBox, place_box};
use crate::context::{ContainingBlock, LayoutContext, LayoutInput, LayoutOutcome};
use crate::error::LayoutError;
use crate::intrinsic::outer_sizes;
use crate::margin::CollapsedMargin;
use crate::strategy::{LayoutStrategy, StrategyKind};

/// [HTML § 4.9.11 Processing model](https://html.spec.whatwg.org/multipage/tables.html#attr-tdth-colspan)
///
/// "The td and th elements may have a colspan content attribute specified,
/// whose value must be a valid non-negative integer greater than zero and
/// less than or equal to 1000."
const MAX_COLSPAN: u32 = 1000;

/// `display: table | inline-table`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableStrategy;

impl LayoutStrategy for TableStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Table
    }

    fn can_layout(&self, node: &LayoutNode) -> bool {
        node.style
            .display
            .is_some_and(|display| display.inner == InnerDisplayType::Table)
    }

    fn layout(
        &self,
        id: NodeId,
        input: &LayoutInput,
        ctx: &mut LayoutContext<'_>,
    ) -> Result<LayoutOutcome, LayoutError> {
        layout_table(ctx, id, input)
    }
}

/// A row and the cells in it, in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TableRow {
    id: NodeId,
    /// The row group the row belongs to, if any.
    group: Option<NodeId>,
    cells: Vec<CellInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellInfo {
    id: NodeId,
    /// Number of columns spanned, at least 1.
    colspan: usize,
}

/// Children of a table that are neither rows nor row groups: captions and
/// stray blocks, stacked above the grid.
type Captions = Vec<NodeId>;

/// Main entry point for table layout.
///
/// [§ 17.5.2 Automatic table layout](https://www.w3.org/TR/CSS2/tables.html#auto-table-layout)
pub(crate) fn layout_table(
    ctx: &mut LayoutContext<'_>,
    id: NodeId,
    input: &LayoutInput,
) -> Result<LayoutOutcome, LayoutError> {
    let style = ctx.style(id)?;
    let cb = input.containing_block;
    let used = ctx.used_values(&style, cb.width, cb.height);

    // STEP 1 (§ 17.5.2): Resolve the table's own width.
    //
    // "the used width of the table is the greater of W and the minimum
    // width required by all the columns plus cell spacing or borders (MIN).
    // If the used width is greater than MIN, the extra width should be
    // distributed over the columns." An `auto` width is shrink-to-fit.
    let explicit_width = input.width_override.is_some() || used.content_width().is_some();
    let table_input = LayoutInput {
        shrink_to_fit: input.shrink_to_fit || !explicit_width,
        ..*input
    };
    let PlacedBox {
        content_x,
        content_y,
        content_width,
        margin,
        padding,
        border,
    } = place_box(ctx, id, &table_input, &used)?;
    let specified_height = input
        .height_override
        .or_else(|| used.content_height().map(|height| used.clamp_height(height)));
    let child_cb = ContainingBlock {
        x: content_x,
        y: content_y,
        width: content_width,
        height: specified_height,
    };
    let spacing = style
        .border_spacing
        .resolve_or_zero(Some(content_width), &used.lengths)
        .max(0.0);

    // STEP 2 (§ 17.2): Identify the table structure.
    let (rows, captions) = collect_table_rows(ctx, id, child_cb)?;

    // STEP 3: Captions and stray blocks above the grid.
    let mut cursor = content_y;
    for caption in captions {
        let caption_input = LayoutInput {
            y: cursor,
            ..LayoutInput::in_block(child_cb)
        };
        let outcome = ctx.layout_child(caption, &caption_input)?;
        if outcome.in_flow {
            let margin_box = ctx.node(caption)?.geometry.margin_box();
            cursor = margin_box.bottom().max(cursor);
        }
    }

    // STEP 4 (§ 17.5.2.1): Column count.
    //
    // "The number of columns is determined by the row with the most
    // cells", counting spanned columns.
    let column_count = rows
        .iter()
        .map(|row| row.cells.iter().map(|cell| cell.colspan).sum::<usize>())
        .max()
        .unwrap_or(0);

    // STEP 5 (§ 17.5.2.2): Column widths.
    let columns = if column_count == 0 {
        Vec::new()
    } else {
        let max_widths = column_max_widths(ctx, &rows, column_count, content_width)?;
        let space = (content_width - spacing * (column_count + 1) as f32).max(0.0);
        fit_columns(&max_widths, space, explicit_width)
    };

    // STEP 6: Lay out rows top to bottom.
    let grid_top = cursor;
    if !rows.is_empty() {
        cursor += spacing;
    }
    let mut first_baseline = None;
    for row in &rows {
        let row_height = layout_row(ctx, row, &columns, spacing, cursor, child_cb)?;
        if first_baseline.is_none() {
            first_baseline = row_baseline(ctx, row)?;
        }
        cursor += row_height + spacing;
    }
    set_row_group_geometry(ctx, &rows, content_x, content_width)?;

    // STEP 7 (§ 17.5.3): Table height.
    //
    // "The height of a table is given by the 'height' property for the
    // 'table' or 'inline-table' element. A value of 'auto' means that the
    // height is the sum of the row heights plus any cell spacing or
    // borders." A specified height never cuts rows short.
    let grid_width = if columns.is_empty() {
        0.0
    } else {
        columns.iter().sum::<f32>() + spacing * (columns.len() + 1) as f32
    };
    let auto_height = cursor - content_y;
    let height = specified_height.map_or_else(
        || used.clamp_height(auto_height),
        |height| height.max(auto_height),
    );
    let border_top = content_y - padding.top - border.top;
    {
        let geometry = &mut ctx.node_mut(id)?.geometry;
        geometry.content.height = height;
        geometry.scroll_width = grid_width.max(content_width);
        geometry.scroll_height = height;
        geometry.baseline = first_baseline.map(|baseline| baseline - border_top);
    }

    log::trace!(
        target: "quire::layout",
        "{id} table {} rows x {column_count} columns, grid at {grid_top}",
        rows.len()
    );
    Ok(LayoutOutcome::in_flow(CollapsedMargin::new(margin.bottom)))
}

fn inner_display(node: &LayoutNode) -> Option<InnerDisplayType> {
    node.style.display.map(|display| display.inner)
}

/// [§ 17.2 The CSS table model](https://www.w3.org/TR/CSS2/tables.html#table-display)
///
/// "table-header-group: Like 'table-row-group', but for visual formatting
/// purposes, the row group is always displayed before all other rows and
/// row groups and after any top captions."
///
/// Hidden and out-of-flow children are dispatched here, so they never show
/// up as rows or cells.
fn collect_table_rows(
    ctx: &mut LayoutContext<'_>,
    id: NodeId,
    child_cb: ContainingBlock,
) -> Result<(Vec<TableRow>, Captions), LayoutError> {
    let mut head = Vec::new();
    let mut body = Vec::new();
    let mut foot = Vec::new();
    let mut captions = Vec::new();
    let static_input = LayoutInput::in_block(child_cb);

    for child in ctx.children(id) {
        if skip_cell_or_row(ctx, child, &static_input)? {
            continue;
        }
        let inner = inner_display(ctx.node(child)?);
        match inner {
            Some(InnerDisplayType::TableRow) => {
                body.push(collect_row(ctx, child, None, &static_input)?);
            }
            Some(InnerDisplayType::TableRowGroup(section)) => {
                let target = match section {
                    TableSection::Head => &mut head,
                    TableSection::Body => &mut body,
                    TableSection::Foot => &mut foot,
                };
                for row in ctx.children(child) {
                    if skip_cell_or_row(ctx, row, &static_input)? {
                        continue;
                    }
                    target.push(collect_row(ctx, row, Some(child), &static_input)?);
                }
            }
            _ => captions.push(child),
        }
    }

    head.append(&mut body);
    head.append(&mut foot);
    Ok((head, captions))
}

/// Dispatch `display: none` and out-of-flow table parts, and report
/// whether they should be skipped.
fn skip_cell_or_row(
    ctx: &mut LayoutContext<'_>,
    id: NodeId,
    input: &LayoutInput,
) -> Result<bool, LayoutError> {
    let style = ctx.style(id)?;
    if style.is_display_none() || style.position.is_out_of_flow() {
        let _ = ctx.layout_child(id, input)?;
        return Ok(true);
    }
    Ok(false)
}

fn collect_row(
    ctx: &mut LayoutContext<'_>,
    id: NodeId,
    group: Option<NodeId>,
    input: &LayoutInput,
) -> Result<TableRow, LayoutError> {
    let mut cells = Vec::new();
    for cell in ctx.children(id) {
        if skip_cell_or_row(ctx, cell, input)? {
            continue;
        }
        let colspan = ctx.style(cell)?.colspan.clamp(1, MAX_COLSPAN) as usize;
        cells.push(CellInfo { id: cell, colspan });
    }
    Ok(TableRow { id, group, cells })
}

/// [§ 17.5.2.2 Column width determination](https://www.w3.org/TR/CSS2/tables.html#auto-table-layout)
///
/// "For each column, determine a minimum and maximum column width from the
/// cells that span only that column." Cells spanning several columns then
/// widen those columns evenly when the spanned columns are too narrow.
fn column_max_widths(
    ctx: &LayoutContext<'_>,
    rows: &[TableRow],
    column_count: usize,
    cb_width: f32,
) -> Result<Vec<f32>, LayoutError> {
    let mut widths = vec![0.0_f32; column_count];
    let mut spanning = Vec::new();

    for row in rows {
        let mut column = 0;
        for cell in &row.cells {
            let width = outer_sizes(ctx, cell.id, cb_width)?.max_content;
            if cell.colspan == 1 {
                widths[column] = widths[column].max(width);
            } else {
                spanning.push((column, cell.colspan, width));
            }
            column += cell.colspan;
        }
    }

    for (start, span, width) in spanning {
        let end = (start + span).min(column_count);
        let current: f32 = widths[start..end].iter().sum();
        if width > current {
            let extra = (width - current) / (end - start) as f32;
            for column in &mut widths[start..end] {
                *column += extra;
            }
        }
    }
    Ok(widths)
}

/// Fit max-content column widths into `space`, the table's content width
/// less border spacing.
///
/// An explicitly sized table spreads leftover space evenly over the
/// columns. A table too narrow for its columns scales them down in
/// proportion.
fn fit_columns(max_widths: &[f32], space: f32, explicit_width: bool) -> Vec<f32> {
    if max_widths.is_empty() {
        return Vec::new();
    }
    let count = max_widths.len() as f32;
    let total: f32 = max_widths.iter().sum();
    if total <= 0.0 {
        return vec![space / count; max_widths.len()];
    }
    if total <= space {
        if !explicit_width {
            return max_widths.to_vec();
        }
        let bonus = (space - total) / count;
        return max_widths.iter().map(|width| width + bonus).collect();
    }
    let scale = space / total;
    max_widths.iter().map(|width| width * scale).collect()
}

/// Width of a cell spanning `span` columns from `start`, with the border
/// spacing between them.
fn cell_span_width(columns: &[f32], start: usize, span: usize, spacing: f32) -> f32 {
    let end = (start + span).min(columns.len());
    let start = start.min(end);
    let width: f32 = columns[start..end].iter().sum();
    width + spacing * (end - start).saturating_sub(1) as f32
}

/// Lay out the cells of one row at `y`, stretch them to the row height,
/// and return that height.
///
/// [§ 17.5.3 Table height algorithms](https://www.w3.org/TR/CSS2/tables.html#height-layout)
///
/// "The height of a 'table-row' element's box is calculated once the user
/// agent has all the cells in the row available: it is the maximum of the
/// row's computed 'height', the computed 'height' of each cell in the row,
/// and the minimum height (MIN) required by the cells."
fn layout_row(
    ctx: &mut LayoutContext<'_>,
    row: &TableRow,
    columns: &[f32],
    spacing: f32,
    y: f32,
    table_cb: ContainingBlock,
) -> Result<f32, LayoutError> {
    let row_x = table_cb.x + spacing;
    let row_width = (table_cb.width - 2.0 * spacing).max(0.0);
    let row_style = ctx.style(row.id)?;
    let row_used = ctx.used_values(&row_style, table_cb.width, table_cb.height);
    let mut row_height = row_used.content_height().unwrap_or(0.0);

    // Pass 1: lay out each cell at its column's width.
    let mut column = 0;
    let mut x = row_x;
    let mut placed = Vec::with_capacity(row.cells.len());
    for cell in &row.cells {
        if column >= columns.len() {
            break;
        }
        let span = cell.colspan.min(columns.len() - column);
        let width = cell_span_width(columns, column, span, spacing);

        let style = ctx.style(cell.id)?;
        let used = ctx.used_values(&style, table_cb.width, table_cb.height);
        let margin = used.margin().or_zero();
        let content_width =
            (width - used.frame_horizontal() - margin.horizontal()).max(0.0);
        let input = LayoutInput {
            containing_block: table_cb,
            x,
            y,
            available_width: width,
            collapsed_margin_top: None,
            width_override: Some(content_width),
            height_override: None,
            shrink_to_fit: false,
        };
        let _ = ctx.layout_child(cell.id, &input)?;
        let height = ctx.node(cell.id)?.geometry.margin_box().height;
        row_height = row_height.max(height);
        placed.push(cell.id);

        x += width + spacing;
        column += span;
    }

    // Pass 2: "cells are stretched to the row height".
    for cell in placed {
        let geometry = &mut ctx.node_mut(cell)?.geometry;
        let frame = geometry.margin_box().height - geometry.content.height;
        let height = (row_height - frame).max(geometry.content.height);
        geometry.content.height = height;
        geometry.scroll_height = geometry.scroll_height.max(height);
    }

    let node = ctx.node_mut(row.id)?;
    node.geometry.content = Rect::new(row_x, y, row_width, row_height);
    node.geometry.scroll_width = row_width;
    node.geometry.scroll_height = row_height;
    Ok(row_height)
}

/// The first cell baseline of a row, in absolute coordinates.
fn row_baseline(ctx: &LayoutContext<'_>, row: &TableRow) -> Result<Option<f32>, LayoutError> {
    for cell in &row.cells {
        let geometry = &ctx.node(cell.id)?.geometry;
        if let Some(baseline) = geometry.baseline {
            return Ok(Some(geometry.border_box().y + baseline));
        }
    }
    Ok(None)
}

/// Give each row group the union of its rows.
fn set_row_group_geometry(
    ctx: &mut LayoutContext<'_>,
    rows: &[TableRow],
    x: f32,
    width: f32,
) -> Result<(), LayoutError> {
    let mut bounds: Vec<(NodeId, f32, f32)> = Vec::new();
    for row in rows {
        let Some(group) = row.group else {
            continue;
        };
        let content = ctx.node(row.id)?.geometry.content;
        match bounds.iter_mut().find(|(id, _, _)| *id == group) {
            Some((_, top, bottom)) => {
                *top = top.min(content.y);
                *bottom = bottom.max(content.bottom());
            }
            None => bounds.push((group, content.y, content.bottom())),
        }
    }
    for (group, top, bottom) in bounds {
        let geometry = &mut ctx.node_mut(group)?.geometry;
        geometry.content = Rect::new(x, top, width, bottom - top);
        geometry.scroll_width = width;
        geometry.scroll_height = bottom - top;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_table_keeps_max_content_columns() {
        assert_eq!(fit_columns(&[40.0, 60.0], 200.0, false), vec![40.0, 60.0]);
    }

    #[test]
    fn test_explicit_table_spreads_extra_space() {
        assert_eq!(fit_columns(&[40.0, 60.0], 200.0, true), vec![90.0, 110.0]);
    }

    #[test]
    fn test_narrow_table_scales_columns() {
        assert_eq!(fit_columns(&[100.0, 300.0], 200.0, false), vec![50.0, 150.0]);
    }

    #[test]
    fn test_empty_columns_share_space() {
        assert_eq!(fit_columns(&[0.0, 0.0], 100.0, false), vec![50.0, 50.0]);
    }

    #[test]
    fn test_span_width_sums_columns() {
        assert_eq!(cell_span_width(&[10.0, 20.0, 30.0], 1, 2, 2.0), 52.0);
        assert_eq!(cell_span_width(&[10.0, 20.0, 30.0], 2, 5, 2.0), 30.0);
        assert_eq!(cell_span_width(&[10.0, 20.0, 30.0], 0, 1, 2.0), 10.0);
    }
}
