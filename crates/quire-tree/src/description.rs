//! Serialized box tree descriptions.
//!
//! A description is a nested JSON document of already-computed styles:
//!
//! ```json
//! { "tag": "body", "style": { "display": "block" },
//!   "children": [ { "text": "Hello" } ] }
//! ```
//!
//! Text nodes without an explicit style inherit the font properties of
//! their parent and are `display: inline`.

use std::sync::Arc;

use quire_style::{ComputedStyle, DisplayValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::node::{CustomData, LayoutNode, NodeId};
use crate::tree::LayoutTree;

/// Errors raised while turning a description into a tree.
#[derive(Debug, Error)]
pub enum TreeError {
    /// A text node was given children.
    #[error("text node {path} cannot have children")]
    TextWithChildren {
        /// Child indices from the root, e.g. `0/2/1`.
        path: String,
    },
    /// The root of a tree must be an element.
    #[error("the root of a box tree must be an element, not text")]
    TextRoot,
    /// The JSON did not match the description schema.
    #[error("invalid tree description: {0}")]
    Json(#[from] serde_json::Error),
}

/// One node of a serialized box tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeDescription {
    /// Element name; absent for text nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Text content; a node with text and no tag is a text node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Computed style. Missing properties take their initial value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<ComputedStyle>,
    /// Painter payload, e.g. an image with its intrinsic size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomData>,
    /// Children in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeDescription>,
}

impl TreeDescription {
    /// Parse a description from JSON text.
    ///
    /// # Errors
    /// Returns [`TreeError::Json`] when the text is not a valid description.
    pub fn from_json(json: &str) -> Result<Self, TreeError> {
        Ok(serde_json::from_str(json)?)
    }

    const fn is_text(&self) -> bool {
        self.tag.is_none() && self.text.is_some()
    }

    fn to_node(&self, parent_style: Option<&ComputedStyle>) -> (LayoutNode, Arc<ComputedStyle>) {
        let style = Arc::new(match (&self.style, parent_style) {
            (Some(style), _) => style.clone(),
            (None, Some(parent)) if self.is_text() => parent.inherit_into(DisplayValue::inline()),
            (None, _) => ComputedStyle::default(),
        });

        let mut node = if self.is_text() {
            LayoutNode::text(self.text.clone().unwrap_or_default(), Arc::clone(&style))
        } else {
            let mut node = LayoutNode::element(
                self.tag.clone().unwrap_or_else(|| "div".to_string()),
                Arc::clone(&style),
            );
            node.text.clone_from(&self.text);
            node
        };
        node.custom_data.clone_from(&self.custom);
        (node, style)
    }

    /// Build a [`LayoutTree`] with `self` as the root.
    ///
    /// # Errors
    /// Returns [`TreeError`] when a text node has children or is the root.
    pub fn into_tree(&self) -> Result<LayoutTree, TreeError> {
        if self.is_text() {
            return Err(TreeError::TextRoot);
        }
        let (root, style) = self.to_node(None);
        let mut tree = LayoutTree::new(root);
        self.append_children(&mut tree, NodeId::ROOT, &style, "")?;
        Ok(tree)
    }

    fn append_children(
        &self,
        tree: &mut LayoutTree,
        parent: NodeId,
        parent_style: &ComputedStyle,
        path: &str,
    ) -> Result<(), TreeError> {
        for (index, child) in self.children.iter().enumerate() {
            let child_path = if path.is_empty() {
                index.to_string()
            } else {
                format!("{path}/{index}")
            };
            if child.is_text() && !child.children.is_empty() {
                return Err(TreeError::TextWithChildren { path: child_path });
            }
            let (node, style) = child.to_node(Some(parent_style));
            let id = tree.append_child(parent, node);
            child.append_children(tree, id, &style, &child_path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use quire_style::{DisplayValue, LengthValue};

    use super::*;
    use crate::node::NodeKind;

    #[test]
    fn test_text_inherits_font_from_parent() {
        let description = TreeDescription::from_json(
            r#"{
                "tag": "p",
                "style": { "display": "block", "font-size": 20, "padding-left": "4px" },
                "children": [ { "text": "hello" } ]
            }"#,
        )
        .expect("valid description");
        let tree = description.into_tree().expect("valid tree");

        let text = tree.children(NodeId::ROOT)[0];
        let node = tree.get(text).expect("text node");
        assert_eq!(node.kind, NodeKind::Text);
        assert_eq!(node.style.display, Some(DisplayValue::inline()));
        assert!((node.style.font_size - 20.0).abs() < f32::EPSILON);
        assert_eq!(node.style.padding_left, LengthValue::ZERO);
    }

    #[test]
    fn test_text_with_children_is_rejected() {
        let description = TreeDescription::from_json(
            r#"{ "tag": "div", "children": [ { "text": "x", "children": [ { "text": "y" } ] } ] }"#,
        )
        .expect("valid json");
        assert!(matches!(
            description.into_tree(),
            Err(TreeError::TextWithChildren { path }) if path == "0"
        ));
    }
}
