//! Arena-based box tree.

use std::ops::Range;

use quire_style::Position;

use crate::geometry::Rect;
use crate::node::{LayoutNode, NodeId};

/// Arena-based box tree with O(1) node access and traversal.
///
/// All nodes are stored in a contiguous vector, using indices for all
/// relationships. The root is always at index 0 ([`NodeId::ROOT`]).
#[derive(Debug, Clone)]
pub struct LayoutTree {
    nodes: Vec<LayoutNode>,
}

impl LayoutTree {
    /// Create a tree holding only `root`.
    #[must_use]
    pub fn new(mut root: LayoutNode) -> Self {
        root.parent = None;
        root.children.clear();
        Self { nodes: vec![root] }
    }

    /// Get the root node ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by its ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&LayoutNode> {
        self.nodes.get(id.0)
    }

    /// Get a mutable reference to a node by its ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut LayoutNode> {
        self.nodes.get_mut(id.0)
    }

    /// Get the number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add `node` as the last child of `parent` and return its ID.
    ///
    /// # Panics
    /// Panics if `parent` is not a node of this tree.
    pub fn append_child(&mut self, parent: NodeId, mut node: LayoutNode) -> NodeId {
        assert!(parent.0 < self.nodes.len(), "append_child: unknown parent {parent}");
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Add `node` as a child of `parent` at position `index` (clamped to
    /// the child count) and return its ID.
    ///
    /// # Panics
    /// Panics if `parent` is not a node of this tree.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, mut node: LayoutNode) -> NodeId {
        assert!(parent.0 < self.nodes.len(), "insert_child: unknown parent {parent}");
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(node);
        let children = &mut self.nodes[parent.0].children;
        children.insert(index.min(children.len()), id);
        id
    }

    /// [§ 9.2.1.1 Anonymous block boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
    ///
    /// Move `parent`'s children in `range` under a new node, which takes
    /// their place in `parent`'s child list. Returns the new node's ID.
    ///
    /// # Panics
    /// Panics if `parent` is unknown or `range` is out of bounds.
    pub fn wrap_children(
        &mut self,
        parent: NodeId,
        range: Range<usize>,
        mut wrapper: LayoutNode,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let moved: Vec<NodeId> = self.nodes[parent.0]
            .children
            .splice(range, [id])
            .collect();
        for &child in &moved {
            self.nodes[child.0].parent = Some(id);
        }
        wrapper.parent = Some(parent);
        wrapper.children = moved;
        self.nodes.push(wrapper);
        id
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Iterate over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Iterate over `id` and its descendants in document (pre-)order.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> DescendantIterator<'_> {
        DescendantIterator {
            tree: self,
            stack: vec![id],
        }
    }

    /// Check if `descendant` is a descendant of `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, descendant: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(descendant).any(|id| id == ancestor)
    }

    /// Origin of the containing block `id` was laid out in, in the same
    /// initial-containing-block coordinates as its geometry.
    ///
    /// [§ 10.1 Definition of "containing block"](https://www.w3.org/TR/CSS2/visudet.html#containing-block-details)
    ///
    /// Absolutely positioned boxes use the padding box of the nearest
    /// positioned ancestor, fixed boxes the viewport, anything else its
    /// parent's content box. The root's is the viewport origin.
    #[must_use]
    pub fn containing_block_origin(&self, id: NodeId) -> Option<(f32, f32)> {
        let node = self.get(id)?;
        let origin = match node.style.position {
            Position::Fixed => None,
            Position::Absolute => self
                .ancestors(id)
                .filter_map(|ancestor| self.get(ancestor))
                .find(|ancestor| ancestor.style.position.is_positioned())
                .map(|ancestor| ancestor.geometry.padding_box()),
            Position::Static | Position::Relative | Position::Sticky => node
                .parent
                .and_then(|parent| self.get(parent))
                .map(|parent| parent.geometry.content),
        };
        Some(origin.map_or((0.0, 0.0), |rect| (rect.x, rect.y)))
    }

    /// Border box of `id` with its containing block's origin at `(0, 0)`.
    #[must_use]
    pub fn border_box_in_containing_block(&self, id: NodeId) -> Option<Rect> {
        let (x, y) = self.containing_block_origin(id)?;
        let border_box = self.get(id)?.geometry.border_box();
        Some(Rect::new(
            border_box.x - x,
            border_box.y - y,
            border_box.width,
            border_box.height,
        ))
    }

    /// Translate the geometry and line boxes of `id` and its whole subtree.
    ///
    /// Geometry is stored in initial-containing-block coordinates, so
    /// moving a box after its descendants were placed means moving all of
    /// them too.
    pub fn shift_subtree(&mut self, id: NodeId, dx: f32, dy: f32) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get_mut(current.0) else {
                continue;
            };
            node.geometry.translate(dx, dy);
            for line in &mut node.line_boxes {
                line.bounds.x += dx;
                line.bounds.y += dy;
                for fragment in &mut line.fragments {
                    fragment.bounds.x += dx;
                    fragment.bounds.y += dy;
                }
            }
            stack.extend(node.children.iter().copied());
        }
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorIterator<'a> {
    tree: &'a LayoutTree,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}

/// Pre-order iterator over a subtree.
pub struct DescendantIterator<'a> {
    tree: &'a LayoutTree,
    stack: Vec<NodeId>,
}

impl Iterator for DescendantIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quire_style::ComputedStyle;

    use super::*;
    use crate::geometry::EdgeSizes;

    fn block() -> Arc<ComputedStyle> {
        Arc::new(ComputedStyle::block())
    }

    #[test]
    fn test_descendants_in_document_order() {
        let mut tree = LayoutTree::new(LayoutNode::element("root", block()));
        let a = tree.append_child(NodeId::ROOT, LayoutNode::element("a", block()));
        let a1 = tree.append_child(a, LayoutNode::element("a1", block()));
        let b = tree.append_child(NodeId::ROOT, LayoutNode::element("b", block()));

        let order: Vec<NodeId> = tree.descendants(NodeId::ROOT).collect();
        assert_eq!(order, vec![NodeId::ROOT, a, a1, b]);
        assert_eq!(tree.ancestors(a1).collect::<Vec<_>>(), vec![a, NodeId::ROOT]);
    }

    #[test]
    fn test_wrap_children_reparents() {
        let mut tree = LayoutTree::new(LayoutNode::element("root", block()));
        let a = tree.append_child(NodeId::ROOT, LayoutNode::element("a", block()));
        let b = tree.append_child(NodeId::ROOT, LayoutNode::element("b", block()));
        let c = tree.append_child(NodeId::ROOT, LayoutNode::element("c", block()));

        let wrapper = tree.wrap_children(NodeId::ROOT, 1..3, LayoutNode::anonymous(block()));

        assert_eq!(tree.children(NodeId::ROOT), &[a, wrapper]);
        assert_eq!(tree.children(wrapper), &[b, c]);
        assert_eq!(tree.parent(b), Some(wrapper));
        assert_eq!(tree.parent(wrapper), Some(NodeId::ROOT));
    }

    #[test]
    fn test_shift_subtree_moves_descendants() {
        let mut tree = LayoutTree::new(LayoutNode::element("root", block()));
        let a = tree.append_child(NodeId::ROOT, LayoutNode::element("a", block()));
        let a1 = tree.append_child(a, LayoutNode::element("a1", block()));

        tree.shift_subtree(a, 5.0, 7.0);

        let geometry = tree.get(a1).map(|n| n.geometry.content).unwrap_or_default();
        assert!((geometry.x - 5.0).abs() < f32::EPSILON);
        assert!((geometry.y - 7.0).abs() < f32::EPSILON);
        let root = tree.get(NodeId::ROOT).map(|n| n.geometry.content).unwrap_or_default();
        assert!(root.x.abs() < f32::EPSILON);
    }

    #[test]
    fn test_border_box_in_containing_block() {
        let positioned = Arc::new(ComputedStyle {
            position: Position::Relative,
            ..ComputedStyle::block()
        });
        let absolute = Arc::new(ComputedStyle {
            position: Position::Absolute,
            ..ComputedStyle::block()
        });
        let mut tree = LayoutTree::new(LayoutNode::element("root", block()));
        let outer = tree.append_child(NodeId::ROOT, LayoutNode::element("outer", positioned));
        let inner = tree.append_child(outer, LayoutNode::element("inner", block()));
        let child = tree.append_child(inner, LayoutNode::element("child", block()));
        let abs = tree.append_child(inner, LayoutNode::element("abs", absolute));

        let place = |tree: &mut LayoutTree, id: NodeId, content: Rect, padding: f32| {
            if let Some(node) = tree.get_mut(id) {
                node.geometry.content = content;
                node.geometry.padding = EdgeSizes {
                    top: padding,
                    right: padding,
                    bottom: padding,
                    left: padding,
                };
            }
        };
        place(&mut tree, outer, Rect::new(20.0, 30.0, 200.0, 100.0), 5.0);
        place(&mut tree, inner, Rect::new(40.0, 50.0, 100.0, 50.0), 0.0);
        place(&mut tree, child, Rect::new(45.0, 60.0, 10.0, 10.0), 0.0);
        place(&mut tree, abs, Rect::new(25.0, 35.0, 10.0, 10.0), 0.0);

        assert_eq!(tree.containing_block_origin(NodeId::ROOT), Some((0.0, 0.0)));
        assert_eq!(
            tree.border_box_in_containing_block(child),
            Some(Rect::new(5.0, 10.0, 10.0, 10.0))
        );
        // The positioned ancestor's padding box starts at (15, 25).
        assert_eq!(
            tree.border_box_in_containing_block(abs),
            Some(Rect::new(10.0, 10.0, 10.0, 10.0))
        );
        assert_eq!(tree.border_box_in_containing_block(NodeId(99)), None);
    }
}
