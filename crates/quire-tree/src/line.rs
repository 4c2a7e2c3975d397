//! Line boxes produced by inline layout.
//!
//! [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
//!
//! "The rectangular area that contains the boxes that form a line is called
//! a line box."

use serde::Serialize;

use crate::geometry::Rect;
use crate::node::NodeId;

/// One line of an inline formatting context.
///
/// "The width of a line box is determined by a containing block and the
/// presence of floats."
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineBox {
    /// Bounding rectangle: full available width at this line's vertical
    /// position, after float intrusion.
    pub bounds: Rect,
    /// Fragments in visual order.
    pub fragments: Vec<LineFragment>,
    /// Baseline position relative to the line box top.
    ///
    /// [§ 10.8.1 Leading and half-leading](https://www.w3.org/TR/CSS2/visudet.html#leading)
    pub baseline: f32,
}

impl LineBox {
    /// Sum of fragment advances.
    #[must_use]
    pub fn content_width(&self) -> f32 {
        self.fragments.iter().map(|f| f.bounds.width).sum()
    }
}

/// A piece of inline content placed on a line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineFragment {
    /// Position and size on the line.
    pub bounds: Rect,
    /// Which box the fragment came from.
    pub source: NodeId,
    /// The content of this fragment.
    pub content: FragmentContent,
}

/// The content of a line fragment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FragmentContent {
    /// A run of text.
    Text {
        /// Text as it is painted, white space already processed.
        text: String,
        /// Font size in px.
        font_size: f32,
    },
    /// An atomic inline (`inline-block`, `inline-flex`, replaced content).
    /// Its own geometry lives on the source node.
    Atomic,
    /// Horizontal margin, border and padding of an inline box edge.
    InlineEdge,
}
