//! The node arena and the `Var` handle used to build expressions.

use std::cell::RefCell;
use std::fmt;

use crate::error::GraphError;
use crate::node::{Node, NodeId, Op, OpTag};

/// Arena owning every node of one computation graph.
///
/// Nodes are stored in creation order, so a node's parents always sit at
/// lower indices. Expressions are built through shared references
/// (`&Graph`), which lets many [`Var`] handles coexist while the graph
/// grows.
///
/// A graph is confined to one thread; it is `Send` but not `Sync`.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: RefCell<Vec<Node>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Graph {
            nodes: RefCell::new(Vec::with_capacity(capacity)),
        }
    }

    /// Create an independent input with the given value.
    pub fn leaf(&self, value: f64) -> Var<'_> {
        let id = self.push(value, Op::Leaf, Vec::new());
        Var { graph: self, id }
    }

    /// Number of nodes created so far.
    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().is_empty()
    }

    /// Resolve an identifier back to a handle.
    pub fn get(&self, id: NodeId) -> Result<Var<'_>, GraphError> {
        let len = self.len();
        if id.0 >= len {
            return Err(GraphError::UnknownNode { id, len });
        }
        Ok(self.var(id))
    }

    /// Reset every gradient in the graph to zero.
    ///
    /// `backward` accumulates into whatever gradients are already present;
    /// call this between passes to start from a clean slate.
    pub fn zero_grad(&self) {
        for node in self.nodes.borrow_mut().iter_mut() {
            node.grad = 0.0;
        }
    }

    /// A copy of the node with the given identifier.
    pub fn node(&self, id: NodeId) -> Result<Node, GraphError> {
        let nodes = self.nodes.borrow();
        nodes.get(id.0).cloned().ok_or(GraphError::UnknownNode {
            id,
            len: nodes.len(),
        })
    }

    pub(crate) fn push(&self, value: f64, op: Op, parents: Vec<NodeId>) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId(nodes.len());
        nodes.push(Node::new(id, value, op, parents));
        id
    }

    /// Handle for an identifier already known to be in this graph.
    pub(crate) fn var(&self, id: NodeId) -> Var<'_> {
        debug_assert!(id.0 < self.len());
        Var { graph: self, id }
    }

    pub(crate) fn with_node<R>(&self, id: NodeId, f: impl FnOnce(&Node) -> R) -> R {
        f(&self.nodes.borrow()[id.0])
    }

    pub(crate) fn with_node_mut<R>(&self, id: NodeId, f: impl FnOnce(&mut Node) -> R) -> R {
        f(&mut self.nodes.borrow_mut()[id.0])
    }

    pub(crate) fn nodes_mut(&self) -> std::cell::RefMut<'_, Vec<Node>> {
        self.nodes.borrow_mut()
    }
}

/// Handle to a node in a [`Graph`].
///
/// `Var` is `Copy`: it is just the owning graph plus an index, so the same
/// subexpression can be used as an operand any number of times.
#[derive(Clone, Copy)]
pub struct Var<'g> {
    graph: &'g Graph,
    id: NodeId,
}

impl<'g> Var<'g> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The graph this node lives in.
    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    /// Human-readable name, `v1` for the first node of a graph.
    pub fn name(&self) -> String {
        self.id.to_string()
    }

    pub fn value(&self) -> f64 {
        self.graph.with_node(self.id, |n| n.value)
    }

    /// Overwrite the stored value.
    ///
    /// Meant for reusing a leaf as a parameter slot. Nodes already built on
    /// top of this one keep their old values; nothing is recomputed.
    pub fn set_value(&self, value: f64) {
        self.graph.with_node_mut(self.id, |n| n.value = value);
    }

    pub fn grad(&self) -> f64 {
        self.graph.with_node(self.id, |n| n.grad)
    }

    pub fn set_grad(&self, grad: f64) {
        self.graph.with_node_mut(self.id, |n| n.grad = grad);
    }

    pub fn op(&self) -> Op {
        self.graph.with_node(self.id, |n| n.op)
    }

    pub fn op_tag(&self) -> OpTag {
        self.graph.with_node(self.id, |n| n.tag)
    }

    /// Relabel the node. Only affects debug output.
    pub fn set_op_tag(&self, tag: OpTag) {
        self.graph.with_node_mut(self.id, |n| n.tag = tag);
    }

    /// The operands this node was built from, in order.
    pub fn parents(&self) -> Vec<Var<'g>> {
        let graph = self.graph;
        graph.with_node(self.id, |n| {
            n.parents.iter().map(|&id| Var { graph, id }).collect()
        })
    }

    pub fn is_leaf(&self) -> bool {
        self.graph.with_node(self.id, |n| n.is_leaf())
    }

    /// Run the backward pass with this node as the output.
    ///
    /// See [`backward`](crate::backward()).
    pub fn backward(&self) {
        crate::backward::backward(*self)
    }

    pub(crate) fn unary(self, op: Op, value: f64) -> Var<'g> {
        let id = self.graph.push(value, op, vec![self.id]);
        Var {
            graph: self.graph,
            id,
        }
    }

    pub(crate) fn binary(self, other: Var<'g>, op: Op, value: f64) -> Var<'g> {
        assert!(
            std::ptr::eq(self.graph, other.graph),
            "cannot combine {} and {}: nodes belong to different graphs",
            self.id,
            other.id
        );
        let id = self.graph.push(value, op, vec![self.id, other.id]);
        Var {
            graph: self.graph,
            id,
        }
    }
}

impl PartialEq for Var<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.graph, other.graph) && self.id == other.id
    }
}

impl Eq for Var<'_> {}

impl fmt::Debug for Var<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.graph.with_node(self.id, |n| {
            f.debug_struct("Var")
                .field("id", &n.id)
                .field("value", &n.value)
                .field("grad", &n.grad)
                .field("tag", &n.tag)
                .finish()
        })
    }
}

impl fmt::Display for Var<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.graph.with_node(self.id, |n| fmt::Display::fmt(n, f))
    }
}
