//! Layout failures.
//!
//! Malformed numbers are not errors: they are clamped where they are
//! resolved. What remains is configuration trouble, which aborts the run.

use quire_tree::NodeId;
use thiserror::Error;

/// A fatal layout failure. No partially laid-out tree is valid after one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// No configured strategy accepts the node's display type.
    #[error("no layout strategy handles display '{display}' on node {node}")]
    UnhandledDisplay {
        /// The offending node.
        node: NodeId,
        /// Its computed display, as CSS text.
        display: String,
    },
    /// The tree nests deeper than the configured limit.
    #[error("box tree deeper than {limit} levels at node {node}")]
    TooDeep {
        /// The node at which the limit was hit.
        node: NodeId,
        /// The configured limit.
        limit: usize,
    },
    /// A node ID does not belong to the tree.
    #[error("node {0} is not part of the tree")]
    MissingNode(NodeId),
}
