//! Box tree for the Quire layout engine.
//!
//! The tree is built once, by an upstream DOM/style collaborator or from a
//! serialized [`TreeDescription`], and then handed to layout, which fills
//! in every node's [`BoxGeometry`] in place.
//!
//! # Design
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Children
//! are owned by their parent's child list; the parent link is a plain index
//! used for upward queries such as "nearest positioned ancestor". There are
//! no reference cycles and no interior mutability.

pub mod description;
pub mod dump;
pub mod geometry;
pub mod line;
pub mod node;
pub mod tree;

pub use description::{TreeDescription, TreeError};
pub use geometry::{BoxGeometry, EdgeSizes, Rect};
pub use line::{FragmentContent, LineBox, LineFragment};
pub use node::{CustomData, IntrinsicSizes, LayoutNode, NodeId, NodeKind};
pub use tree::LayoutTree;
