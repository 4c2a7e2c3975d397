//! Text collaborators: font metrics, white-space processing and line
//! breaking.

pub mod line_break;
pub mod metrics;

pub use line_break::{LineBreaker, LineFit, TextLine, UnicodeLineBreaker};
pub use metrics::{
    ApproximateFontMetrics, FontKey, FontMetrics, assign_intrinsic_metrics, collapse_white_space,
    measure_text, used_line_height,
};
