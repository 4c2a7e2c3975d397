//! Box tree fixup before layout.
//!
//! [§ 9.2.1.1 Anonymous block boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
//!
//! The strategies assume a block container holds either only block-level
//! or only inline-level in-flow children, and that table cells sit in
//! rows. This pass generates the anonymous boxes that make those
//! assumptions hold.

use std::ops::Range;
use std::sync::Arc;

use quire_style::{ComputedStyle, DisplayValue, InnerDisplayType};
use quire_tree::{LayoutNode, LayoutTree, NodeId, NodeKind};

/// Generate anonymous boxes across the whole tree and return how many
/// were created.
pub fn normalize_box_tree(tree: &mut LayoutTree) -> usize {
    let mut created = 0;
    // Nodes created below never need fixing themselves.
    for index in 0..tree.len() {
        let id = NodeId(index);
        created += hoist_own_text(tree, id);
        created += wrap_table_cells(tree, id);
        created += wrap_inline_runs(tree, id);
    }
    if created > 0 {
        log::debug!(target: "quire::layout", "generated {created} anonymous boxes");
    }
    created
}

/// [§ 9.2.2.1 Anonymous inline boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous-inline)
///
/// "Any text that is directly contained inside a block container element
/// (not inside an inline element) must be treated as an anonymous inline
/// element."
///
/// An element carrying both text and children gets its text as a leading
/// text child. Table cells are left alone: their content height is the
/// larger of their own text and their children.
fn hoist_own_text(tree: &mut LayoutTree, id: NodeId) -> usize {
    let Some(node) = tree.get_mut(id) else {
        return 0;
    };
    let is_cell = node
        .style
        .display
        .is_some_and(|display| display.inner == InnerDisplayType::TableCell);
    if matches!(node.kind, NodeKind::Text) || is_cell || node.children.is_empty() || !node.has_text()
    {
        return 0;
    }
    let Some(text) = node.text.take() else {
        return 0;
    };
    let style = Arc::new(node.style.inherit_into(DisplayValue::inline()));
    let _ = tree.insert_child(id, 0, LayoutNode::text(text, style));
    1
}

/// [§ 17.2.1 Anonymous table objects](https://www.w3.org/TR/CSS2/tables.html#anonymous-boxes)
///
/// "If a child C of a 'table' or 'inline-table' box is not a proper table
/// child, then generate an anonymous 'table-row' box around C and all
/// consecutive siblings of C that are not proper table children."
///
/// Only runs of cells are wrapped; captions and other blocks are laid out
/// above the grid.
fn wrap_table_cells(tree: &mut LayoutTree, id: NodeId) -> usize {
    let Some(node) = tree.get(id) else {
        return 0;
    };
    let is_row_parent = node.style.display.is_some_and(|display| {
        matches!(
            display.inner,
            InnerDisplayType::Table | InnerDisplayType::TableRowGroup(_)
        )
    });
    if !is_row_parent {
        return 0;
    }
    let runs = runs_of(tree, id, |child| {
        child
            .style
            .display
            .is_some_and(|display| display.inner == InnerDisplayType::TableCell)
    });
    let style = Arc::new(node.style.inherit_into(DisplayValue::table_row()));
    wrap_runs(tree, id, runs, &style)
}

/// [§ 9.2.1.1](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
///
/// "if a block container box has a block-level box inside it, then we
/// force it to have only block-level boxes inside it."
///
/// Floats and absolutely positioned boxes do not count either way; they
/// join the run they sit in.
fn wrap_inline_runs(tree: &mut LayoutTree, id: NodeId) -> usize {
    let Some(node) = tree.get(id) else {
        return 0;
    };
    let is_block_container = node.style.display.is_some_and(|display| {
        matches!(
            display.inner,
            InnerDisplayType::Flow | InnerDisplayType::FlowRoot | InnerDisplayType::TableCell
        )
    });
    if !is_block_container || matches!(node.kind, NodeKind::Text) {
        return 0;
    }
    let in_flow = |style: &ComputedStyle| {
        !style.is_display_none() && !style.is_floated() && !style.position.is_out_of_flow()
    };
    let has_block = node.children.iter().any(|&child| {
        tree.get(child)
            .is_some_and(|c| in_flow(&c.style) && !c.style.is_inline_level())
    });
    let has_inline = node.children.iter().any(|&child| {
        tree.get(child)
            .is_some_and(|c| in_flow(&c.style) && c.style.is_inline_level())
    });
    if !(has_block && has_inline) {
        return 0;
    }

    // Runs of everything that is not an in-flow block, kept only when they
    // hold some inline content.
    let runs: Vec<Range<usize>> = runs_of(tree, id, |child| {
        !(in_flow(&child.style) && !child.style.is_inline_level())
    })
    .into_iter()
    .filter(|run| {
        tree.children(id)[run.clone()].iter().any(|&child| {
            tree.get(child)
                .is_some_and(|c| in_flow(&c.style) && c.style.is_inline_level())
        })
    })
    .collect();
    let style = Arc::new(node.style.inherit_into(DisplayValue::block()));
    wrap_runs(tree, id, runs, &style)
}

/// Maximal ranges of consecutive children of `id` matching `pred`.
fn runs_of(
    tree: &LayoutTree,
    id: NodeId,
    pred: impl Fn(&LayoutNode) -> bool,
) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = None;
    let children = tree.children(id);
    for (index, &child) in children.iter().enumerate() {
        let matches = tree.get(child).is_some_and(&pred);
        match (matches, start) {
            (true, None) => start = Some(index),
            (false, Some(begin)) => {
                runs.push(begin..index);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(begin) = start {
        runs.push(begin..children.len());
    }
    runs
}

/// Wrap each run in a new anonymous box. Runs are wrapped back to front so
/// earlier ranges stay valid.
fn wrap_runs(
    tree: &mut LayoutTree,
    id: NodeId,
    runs: Vec<Range<usize>>,
    style: &Arc<ComputedStyle>,
) -> usize {
    let count = runs.len();
    for run in runs.into_iter().rev() {
        let _ = tree.wrap_children(id, run, LayoutNode::anonymous(Arc::clone(style)));
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> Arc<ComputedStyle> {
        Arc::new(ComputedStyle::block())
    }

    fn inline() -> Arc<ComputedStyle> {
        Arc::new(ComputedStyle::inline())
    }

    #[test]
    fn test_mixed_children_get_anonymous_blocks() {
        let mut tree = LayoutTree::new(LayoutNode::element("div", block()));
        let root = tree.root();
        let _ = tree.append_child(root, LayoutNode::text("before", inline()));
        let _ = tree.append_child(root, LayoutNode::element("p", block()));
        let _ = tree.append_child(root, LayoutNode::text("after", inline()));

        assert_eq!(normalize_box_tree(&mut tree), 2);
        let children = tree.children(root).to_vec();
        assert_eq!(children.len(), 3);
        for index in [0, 2] {
            let node = tree.get(children[index]).unwrap();
            assert!(matches!(node.kind, NodeKind::Anonymous));
            assert!(!node.style.is_inline_level());
            assert_eq!(node.children.len(), 1);
        }
    }

    #[test]
    fn test_inline_only_children_are_untouched() {
        let mut tree = LayoutTree::new(LayoutNode::element("div", block()));
        let root = tree.root();
        let _ = tree.append_child(root, LayoutNode::text("a", inline()));
        let _ = tree.append_child(root, LayoutNode::element("span", inline()));

        assert_eq!(normalize_box_tree(&mut tree), 0);
        assert_eq!(tree.children(root).len(), 2);
    }

    #[test]
    fn test_own_text_moves_into_first_child() {
        let mut root = LayoutNode::element("div", block());
        root.text = Some("label".to_string());
        let mut tree = LayoutTree::new(root);
        let root = tree.root();
        let _ = tree.append_child(root, LayoutNode::element("p", block()));

        let _ = normalize_box_tree(&mut tree);
        assert!(tree.get(root).unwrap().text.is_none());
        let first = tree.children(root)[0];
        let wrapper = tree.get(first).unwrap();
        assert!(matches!(wrapper.kind, NodeKind::Anonymous));
        let text = tree.get(wrapper.children[0]).unwrap();
        assert_eq!(text.text.as_deref(), Some("label"));
    }

    #[test]
    fn test_cells_outside_rows_get_a_row() {
        let table = Arc::new(ComputedStyle::with_display(DisplayValue::table()));
        let cell = Arc::new(ComputedStyle::with_display(DisplayValue::table_cell()));
        let mut tree = LayoutTree::new(LayoutNode::element("table", table));
        let root = tree.root();
        let _ = tree.append_child(root, LayoutNode::element("td", Arc::clone(&cell)));
        let _ = tree.append_child(root, LayoutNode::element("td", cell));

        assert_eq!(normalize_box_tree(&mut tree), 1);
        let row = tree.children(root)[0];
        let row_node = tree.get(row).unwrap();
        assert_eq!(
            row_node.style.display.map(|display| display.inner),
            Some(InnerDisplayType::TableRow)
        );
        assert_eq!(row_node.children.len(), 2);
    }
}
