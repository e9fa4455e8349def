use thiserror::Error;

use crate::node::NodeId;

/// Errors reported by the graph engine.
///
/// Numeric domain problems (log of a negative number, division by zero, ...)
/// are not errors: they surface as NaN or infinity in node values and
/// gradients.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("node {id} does not belong to this graph (graph has {len} nodes)")]
    UnknownNode { id: NodeId, len: usize },

    #[error("analytic gradient for input {name} is not finite: {value}")]
    NonFiniteGradient { name: String, value: f64 },
}
