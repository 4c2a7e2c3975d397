//! Box tree nodes.

use std::fmt;
use std::sync::Arc;

use quire_style::ComputedStyle;
use serde::{Deserialize, Serialize};

use crate::geometry::BoxGeometry;
use crate::line::LineBox;

/// A type-safe index into the box tree.
///
/// Doubles as the node's debug identity: it is stable for the lifetime of
/// the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root box is always at index 0.
    pub const ROOT: Self = Self(0);
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What generated the box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Principal box of an element.
    Element {
        /// Local name, used for debugging output only.
        tag: String,
    },
    /// A text run.
    Text,
    /// [§ 9.2.1.1 Anonymous block boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
    ///
    /// Generated during box tree fixup; never comes from the document.
    Anonymous,
}

/// Opaque per-feature payload carried through layout for the painter.
///
/// Images and SVG carry an intrinsic size that layout uses for replaced
/// element sizing; anything else is passed along untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CustomData {
    /// Raster image.
    Image {
        /// Intrinsic width in px.
        width: f32,
        /// Intrinsic height in px.
        height: f32,
        /// Where the painter finds the pixels.
        #[serde(default)]
        source: Option<String>,
    },
    /// Inline SVG document.
    Svg {
        /// Intrinsic width in px.
        width: f32,
        /// Intrinsic height in px.
        height: f32,
        /// Serialized SVG markup.
        #[serde(default)]
        markup: String,
    },
    /// Anything else the painter understands.
    Opaque {
        /// Free-form payload.
        value: serde_json::Value,
    },
}

impl CustomData {
    /// Intrinsic `(width, height)` for replaced content.
    #[must_use]
    pub const fn intrinsic_size(&self) -> Option<(f32, f32)> {
        match self {
            Self::Image { width, height, .. } | Self::Svg { width, height, .. } => {
                Some((*width, *height))
            }
            Self::Opaque { .. } => None,
        }
    }
}

/// Text measurements attached before layout starts.
///
/// [§ 4.1 Intrinsic Sizes](https://www.w3.org/TR/css-sizing-3/#intrinsic-sizes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IntrinsicSizes {
    /// Width of the text laid out on a single line.
    pub max_content_width: f32,
    /// Width of the widest unbreakable segment.
    pub min_content_width: f32,
    /// Used line height for this text's font.
    pub line_height: f32,
    /// Distance from the line top to the baseline.
    pub ascent: f32,
}

/// A node of the box tree.
#[derive(Debug, Clone)]
pub struct LayoutNode {
    /// Computed style, shared and immutable.
    pub style: Arc<ComputedStyle>,
    /// What generated this box.
    pub kind: NodeKind,
    /// Parent box; `None` only for the root.
    pub parent: Option<NodeId>,
    /// Children in document order.
    pub children: Vec<NodeId>,
    /// Author text, for text runs.
    pub text: Option<String>,
    /// Line boxes, written by inline layout.
    pub line_boxes: Vec<LineBox>,
    /// Used geometry, written by layout.
    pub geometry: BoxGeometry,
    /// Text measurements, written before layout.
    pub intrinsic: IntrinsicSizes,
    /// Per-feature payload for the painter.
    pub custom_data: Option<CustomData>,
}

impl LayoutNode {
    fn new(kind: NodeKind, style: Arc<ComputedStyle>) -> Self {
        Self {
            style,
            kind,
            parent: None,
            children: Vec::new(),
            text: None,
            line_boxes: Vec::new(),
            geometry: BoxGeometry::default(),
            intrinsic: IntrinsicSizes::default(),
            custom_data: None,
        }
    }

    /// An element's principal box.
    #[must_use]
    pub fn element(tag: impl Into<String>, style: Arc<ComputedStyle>) -> Self {
        Self::new(NodeKind::Element { tag: tag.into() }, style)
    }

    /// A text run.
    #[must_use]
    pub fn text(text: impl Into<String>, style: Arc<ComputedStyle>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(NodeKind::Text, style)
        }
    }

    /// An anonymous box.
    #[must_use]
    pub fn anonymous(style: Arc<ComputedStyle>) -> Self {
        Self::new(NodeKind::Anonymous, style)
    }

    /// Attach a painter payload.
    #[must_use]
    pub fn with_custom_data(mut self, data: CustomData) -> Self {
        self.custom_data = Some(data);
        self
    }

    /// Whether the node carries text to measure.
    #[must_use]
    pub fn has_text(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Replaced content has an intrinsic size that does not come from
    /// its children.
    #[must_use]
    pub fn intrinsic_replaced_size(&self) -> Option<(f32, f32)> {
        self.custom_data.as_ref().and_then(CustomData::intrinsic_size)
    }

    /// Short label for debugging output.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.kind {
            NodeKind::Element { tag } => tag.clone(),
            NodeKind::Text => "#text".to_string(),
            NodeKind::Anonymous => "(anonymous)".to_string(),
        }
    }
}
