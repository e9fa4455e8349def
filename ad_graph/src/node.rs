//! Core data structures for the computation graph.
//!
//! Nodes live by value inside a [`Graph`](crate::Graph) arena and refer to
//! their parents by [`NodeId`], the node's index in that arena. Because a
//! node can only be created from parents that already exist, every parent
//! index is strictly smaller than its child's and the graph is acyclic by
//! construction.

use std::fmt;

/// Identifier of a node within its graph.
///
/// Identifiers are allocated by the owning [`Graph`](crate::Graph), start at
/// zero for every graph and are only meaningful inside that graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in its graph.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0 + 1)
    }
}

/// The operation that produced a node.
///
/// This drives the backward step: a single switch over `Op` picks the
/// partial-derivative formula. Scalar parameters that are not nodes
/// (exponents, bases, slopes) are carried inline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    /// An independent input.
    Leaf,
    /// parents[0] + parents[1]
    Add,
    /// parents[0] - parents[1]
    Sub,
    /// parents[0] * parents[1]
    Mul,
    /// -parents[0]
    Neg,
    /// parents[0]^exponent, exponent fixed at construction
    Pow { exponent: f64 },
    /// Natural logarithm.
    Ln,
    /// Logarithm with a fixed base.
    LogBase { base: f64 },
    Exp,
    /// parents[0]^(1/degree)
    Root { degree: f64 },
    Abs,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
    Erf,
    Erfc,
    ErfInv,
    ErfcInv,
    Identity,
    Sigmoid,
    Relu,
    LeakyRelu { alpha: f64 },
}

impl Op {
    /// Number of parents a node with this operation has.
    pub fn arity(&self) -> usize {
        match self {
            Op::Leaf => 0,
            Op::Add | Op::Sub | Op::Mul => 2,
            _ => 1,
        }
    }

    /// The diagnostic tag a fresh node with this operation starts with.
    pub fn tag(&self) -> OpTag {
        match self {
            Op::Leaf => OpTag::Leaf,
            Op::Add => OpTag::Add,
            Op::Sub => OpTag::Sub,
            Op::Mul => OpTag::Mul,
            Op::Neg => OpTag::Neg,
            Op::Pow { .. } => OpTag::Pow,
            Op::Ln => OpTag::Ln,
            Op::LogBase { .. } => OpTag::LogBase,
            Op::Exp => OpTag::Exp,
            Op::Root { .. } => OpTag::Root,
            Op::Abs => OpTag::Abs,
            Op::Sin => OpTag::Sin,
            Op::Cos => OpTag::Cos,
            Op::Tan => OpTag::Tan,
            Op::Asin => OpTag::Asin,
            Op::Acos => OpTag::Acos,
            Op::Atan => OpTag::Atan,
            Op::Sinh => OpTag::Sinh,
            Op::Cosh => OpTag::Cosh,
            Op::Tanh => OpTag::Tanh,
            Op::Asinh => OpTag::Asinh,
            Op::Acosh => OpTag::Acosh,
            Op::Atanh => OpTag::Atanh,
            Op::Erf => OpTag::Erf,
            Op::Erfc => OpTag::Erfc,
            Op::ErfInv => OpTag::ErfInv,
            Op::ErfcInv => OpTag::ErfcInv,
            Op::Identity => OpTag::Identity,
            Op::Sigmoid => OpTag::Sigmoid,
            Op::Relu => OpTag::Relu,
            Op::LeakyRelu { .. } => OpTag::LeakyRelu,
        }
    }
}

/// Descriptive label of the operation that produced a node.
///
/// Only used for debugging output. Overwriting a node's tag does not change
/// how gradients flow through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpTag {
    Leaf,
    Add,
    Sub,
    Mul,
    Neg,
    Pow,
    Ln,
    LogBase,
    Exp,
    Root,
    Abs,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
    Erf,
    Erfc,
    ErfInv,
    ErfcInv,
    Identity,
    Sigmoid,
    Relu,
    LeakyRelu,
}

impl OpTag {
    /// Short label used in the debug string.
    pub fn as_str(self) -> &'static str {
        match self {
            OpTag::Leaf => "leaf",
            OpTag::Add => "add",
            OpTag::Sub => "sub",
            OpTag::Mul => "mul",
            OpTag::Neg => "neg",
            OpTag::Pow => "pow",
            OpTag::Ln => "log",
            OpTag::LogBase => "log_base",
            OpTag::Exp => "exp",
            OpTag::Root => "root",
            OpTag::Abs => "abs",
            OpTag::Sin => "sin",
            OpTag::Cos => "cos",
            OpTag::Tan => "tan",
            OpTag::Asin => "asin",
            OpTag::Acos => "acos",
            OpTag::Atan => "atan",
            OpTag::Sinh => "sinh",
            OpTag::Cosh => "cosh",
            OpTag::Tanh => "tanh",
            OpTag::Asinh => "asinh",
            OpTag::Acosh => "acosh",
            OpTag::Atanh => "atanh",
            OpTag::Erf => "erf",
            OpTag::Erfc => "erfc",
            OpTag::ErfInv => "erfinv",
            OpTag::ErfcInv => "erfcinv",
            OpTag::Identity => "identity",
            OpTag::Sigmoid => "sigmoid",
            OpTag::Relu => "relu",
            OpTag::LeakyRelu => "leaky_relu",
        }
    }
}

impl fmt::Display for OpTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single node of the graph: forward value, accumulated gradient and the
/// record of how it was produced.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) value: f64,
    pub(crate) grad: f64,
    pub(crate) op: Op,
    pub(crate) tag: OpTag,
    pub(crate) parents: Vec<NodeId>,
}

impl Node {
    pub(crate) fn new(id: NodeId, value: f64, op: Op, parents: Vec<NodeId>) -> Self {
        debug_assert_eq!(op.arity(), parents.len());
        debug_assert!(parents.iter().all(|p| *p < id));
        Node {
            id,
            value,
            grad: 0.0,
            op,
            tag: op.tag(),
            parents,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn grad(&self) -> f64 {
        self.grad
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn tag(&self) -> OpTag {
        self.tag
    }

    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    /// Whether this node is an independent input.
    pub fn is_leaf(&self) -> bool {
        self.parents.is_empty()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Node(value={:.6}, gradient={:.6}, op={}, name={})",
            self.value, self.grad, self.tag, self.id
        )
    }
}
