//! Reverse-mode automatic differentiation.
//!
//! The backward pass:
//! 1. Builds a topological ordering of nodes reachable from the output
//! 2. Seeds the output gradient with 1
//! 3. Traverses the order in reverse, letting each node push its gradient
//!    into its parents
//!
//! Gradients are accumulated in place on the nodes. Nothing is reset first:
//! a second pass over the same graph adds on top of the first one's results.
//! Use [`Graph::zero_grad`](crate::Graph::zero_grad) to start over.

use log::{debug, trace};

use crate::graph::Var;
use crate::node::NodeId;
use crate::ops::local_gradients;

/// Every node reachable from `root`, each exactly once, parents first.
///
/// Depth-first post-order with a visited set, so a node shared by several
/// children (a diamond) is emitted once, and `root` is always last.
pub fn topological_order<'g>(root: Var<'g>) -> Vec<Var<'g>> {
    let graph = root.graph();
    let mut visited = vec![false; graph.len()];
    let mut order = Vec::new();

    // explicit stack so deep chains don't overflow the call stack
    let mut stack: Vec<(NodeId, bool)> = vec![(root.id(), false)];
    while let Some((id, expanded)) = stack.pop() {
        if expanded {
            order.push(id);
            continue;
        }
        if visited[id.index()] {
            continue;
        }
        visited[id.index()] = true;

        stack.push((id, true));
        let parents = graph.with_node(id, |n| n.parents.clone());
        // reversed so the first parent is visited first
        for parent in parents.into_iter().rev() {
            if !visited[parent.index()] {
                stack.push((parent, false));
            }
        }
    }

    order.into_iter().map(|id| graph.var(id)).collect()
}

/// Propagate gradients from `root` to everything it depends on.
///
/// Sets `root`'s gradient to 1, then walks the topological order backwards.
/// Since every consumer of a node comes later in the order, a node's gradient
/// is complete before it is propagated further.
pub fn backward(root: Var<'_>) {
    let order = topological_order(root);
    debug!("backward from {}: {} reachable nodes", root.id(), order.len());

    let mut nodes = root.graph().nodes_mut();
    nodes[root.id().index()].grad = 1.0;

    for var in order.iter().rev() {
        let node = &nodes[var.id().index()];
        if node.is_leaf() {
            continue;
        }

        let inputs: Vec<f64> = node.parents.iter().map(|p| nodes[p.index()].value).collect();
        let contributions = local_gradients(node.op, &inputs, node.value, node.grad);
        let parents = node.parents.clone();
        trace!("{} ({}) -> {:?}", node.id, node.tag, contributions);

        // Chain rule: parent.grad += d(node)/d(parent) * node.grad
        for (parent, contribution) in parents.iter().zip(contributions) {
            nodes[parent.index()].grad += contribution;
        }
    }
}
