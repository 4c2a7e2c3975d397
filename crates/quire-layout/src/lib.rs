//! CSS box layout for the Quire box tree.
//!
//! [§ 9 Visual formatting model](https://www.w3.org/TR/CSS2/visuren.html)
//!
//! Given a [`quire_tree::LayoutTree`] whose nodes carry computed styles,
//! [`LayoutEngine::layout_tree`] fills in every node's geometry in
//! viewport coordinates, ready for a painter.
//!
//! # Design
//!
//! Each family of display types is handled by a [`LayoutStrategy`]. The
//! engine tries its strategies in a fixed priority order and hands each
//! node to the first that accepts it. Strategies lay out their children
//! through [`LayoutContext::layout_child`], which routes back through the
//! same table.
//!
//! - [`block`]: block formatting contexts, margin collapsing, floats,
//!   replaced content
//! - [`inline`]: inline formatting contexts and line boxes
//! - [`flex`]: flex containers
//! - [`table`]: the automatic table layout algorithm
//! - [`out_of_flow`]: absolute and fixed positioning, as a second pass
//! - [`float`] and [`margin`]: the float registry and margin arithmetic
//! - [`text`]: font metrics and line breaking collaborators

pub mod block;
pub mod box_tree;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod flex;
pub mod float;
pub mod inline;
pub mod intrinsic;
pub mod margin;
pub mod out_of_flow;
pub mod resolve;
pub mod strategy;
pub mod table;
pub mod text;

pub use config::LayoutConfig;
pub use context::{
    ContainingBlock, LayoutContext, LayoutEnvironment, LayoutInput, LayoutOutcome, Viewport,
};
pub use engine::{Fragment, LayoutEngine};
pub use error::LayoutError;
pub use float::{FloatContext, FloatRect, FloatSide};
pub use margin::{CollapsedMargin, collapse_margin_set, collapsed_gap_between};
pub use strategy::{DEFAULT_STRATEGY_ORDER, LayoutStrategy, StrategyKind};
pub use text::{ApproximateFontMetrics, FontKey, FontMetrics, LineBreaker, UnicodeLineBreaker};
