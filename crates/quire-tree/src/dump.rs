//! Debugging output for laid-out trees.

use std::fmt::{self, Write};

use serde::Serialize;

use crate::geometry::{EdgeSizes, Rect};
use crate::node::NodeId;
use crate::tree::LayoutTree;

/// Write an indented listing of every box's border box.
///
/// ```text
/// body [block] border=(0, 0, 800 x 46)
///   p [block] border=(8, 8, 784 x 19.2) lines=1
/// ```
///
/// # Errors
/// Propagates errors from the writer.
pub fn dump<W: Write>(tree: &LayoutTree, id: NodeId, out: &mut W) -> fmt::Result {
    dump_node(tree, id, 0, out)
}

fn dump_node<W: Write>(tree: &LayoutTree, id: NodeId, depth: usize, out: &mut W) -> fmt::Result {
    let Some(node) = tree.get(id) else {
        return Ok(());
    };
    let display = node
        .style
        .display
        .map_or_else(|| "none".to_string(), |d| d.to_string());
    let border = node.geometry.border_box();
    write!(
        out,
        "{:indent$}{} [{display}] border=({}, {}, {} x {})",
        "",
        node.label(),
        border.x,
        border.y,
        border.width,
        border.height,
        indent = depth * 2,
    )?;
    if !node.line_boxes.is_empty() {
        write!(out, " lines={}", node.line_boxes.len())?;
    }
    writeln!(out)?;

    for &child in &node.children {
        dump_node(tree, child, depth + 1, out)?;
    }
    Ok(())
}

/// Serializable snapshot of a laid-out subtree.
#[derive(Debug, Clone, Serialize)]
pub struct GeometrySnapshot {
    /// Arena index of the node.
    pub id: NodeId,
    /// Tag name, `#text`, or `(anonymous)`.
    pub label: String,
    /// Content box.
    pub content: Rect,
    /// Border box.
    pub border_box: Rect,
    /// Used margins.
    pub margin: EdgeSizes,
    /// Scrollable overflow size.
    pub scroll_size: (f32, f32),
    /// Baseline offset from the border-box top.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<f32>,
    /// Line box rectangles.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<Rect>,
    /// Child snapshots.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<GeometrySnapshot>,
}

/// Capture the geometry of `id` and its subtree.
#[must_use]
pub fn snapshot(tree: &LayoutTree, id: NodeId) -> Option<GeometrySnapshot> {
    let node = tree.get(id)?;
    let geometry = &node.geometry;
    Some(GeometrySnapshot {
        id,
        label: node.label(),
        content: geometry.content,
        border_box: geometry.border_box(),
        margin: geometry.margin,
        scroll_size: (geometry.scroll_width, geometry.scroll_height),
        baseline: geometry.baseline,
        lines: node.line_boxes.iter().map(|line| line.bounds).collect(),
        children: node
            .children
            .iter()
            .filter_map(|&child| snapshot(tree, child))
            .collect(),
    })
}
