//! # ad_graph - Reverse-mode Automatic Differentiation over Scalar Graphs
//!
//! Compose an expression from scalar operations and every intermediate
//! result is recorded as a node in a [`Graph`]. A single call to
//! [`backward`] then computes the gradient of the output with respect to
//! every node it depends on, accumulating the result into the nodes
//! themselves.
//!
//! ## Quick Start
//!
//! ```
//! use ad_graph::Graph;
//!
//! let g = Graph::new();
//! let x1 = g.leaf(3.0);
//! let x2 = g.leaf(4.0);
//!
//! // y = (x1 - x2) / (x1 * x2) = 1/x2 - 1/x1
//! let y = (&x1 - &x2) / (&x1 * &x2);
//! y.backward();
//!
//! assert!((x1.grad() - 1.0 / 9.0).abs() < 1e-10);
//! assert!((x2.grad() + 1.0 / 16.0).abs() < 1e-10);
//! ```
//!
//! ## Supported Operations
//!
//! | Category | Operations |
//! |----------|------------|
//! | Arithmetic | `+`, `-`, `*`, `/`, unary `-` |
//! | Power and roots | [`Var::powf`], [`Var::nth_root`], [`Var::sqrt`] |
//! | Exponential and logarithms | [`Var::exp`], [`Var::ln`], [`Var::log_base`] |
//! | Trigonometric | `sin`, `cos`, `tan`, `asin`, `acos`, `atan` |
//! | Hyperbolic | `sinh`, `cosh`, `tanh`, `asinh`, `acosh`, `atanh` |
//! | Error functions | [`Var::erf`], [`Var::erfc`], [`Var::erf_inv`], [`Var::erfc_inv`] |
//! | Activations | [`Var::identity`], [`Var::sigmoid`], [`Var::relu`], [`Var::leaky_relu`] |
//! | Other | [`Var::abs`] |
//!
//! Domain violations (log of a negative number, division by zero, `asin`
//! outside [-1, 1], the derivative of `abs` at zero) are not checked: they
//! show up as NaN or infinity, exactly as plain `f64` arithmetic would.
//!
//! ## Architecture
//!
//! - **[`Graph`]**: arena that owns every node; identifiers are indices into it.
//! - **[`Var`]**: `Copy` handle to a node, used to build expressions and read
//!   values and gradients back.
//! - **[`backward`] / [`topological_order`]**: the reverse pass.
//! - **[`gradcheck`]**: finite-difference validation of gradients.
//!
//! ## Accumulation
//!
//! Gradients are never cleared implicitly. Running `backward` a second time
//! adds to the gradients left by the first run; call [`Graph::zero_grad`]
//! in between when that is not what you want.

mod activations;
mod backward;
mod error;
mod graph;
mod node;
mod ops;

pub mod gradcheck;

pub use backward::{backward, topological_order};
pub use error::GraphError;
pub use gradcheck::{numeric_gradient, GradCheck};
pub use graph::{Graph, Var};
pub use node::{Node, NodeId, Op, OpTag};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_arithmetic() {
        let g = Graph::new();
        let x = g.leaf(2.0);
        let y = g.leaf(3.0);

        assert!(((&x + &y).value() - 5.0).abs() < 1e-10);
        assert!(((&x - &y).value() - (-1.0)).abs() < 1e-10);
        assert!(((&x * &y).value() - 6.0).abs() < 1e-10);
        assert!(((&x / &y).value() - (2.0 / 3.0)).abs() < 1e-10);
        assert!(((-&x).value() - (-2.0)).abs() < 1e-10);
    }

    #[test]
    fn test_operands_are_not_modified() {
        let g = Graph::new();
        let x = g.leaf(2.0);
        let y = g.leaf(5.0);

        let z = x.ln() + &x * &y - y.sin();
        z.backward();

        assert_eq!(x.value(), 2.0);
        assert_eq!(y.value(), 5.0);
    }

    #[test]
    fn test_log_mul_sin() {
        // y = ln(x1) + x1*x2 - sin(x2)
        // dy/dx1 = 1/x1 + x2, dy/dx2 = x1 - cos(x2)
        let g = Graph::new();
        let x1 = g.leaf(2.0);
        let x2 = g.leaf(5.0);

        let y = x1.ln() + &x1 * &x2 - x2.sin();
        y.backward();

        assert!((x1.grad() - 5.5).abs() < 1e-10);
        assert!((x2.grad() - (2.0 - 5.0_f64.cos())).abs() < 1e-10);
    }

    #[test]
    fn test_reused_variable() {
        // z = x * x, dz/dx = 2x
        let g = Graph::new();
        let x = g.leaf(3.0);
        let z = &x * &x;

        z.backward();
        assert!((x.grad() - 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_diamond_graph() {
        // z = (x + y) * (x - y) = x^2 - y^2
        let g = Graph::new();
        let x = g.leaf(3.0);
        let y = g.leaf(2.0);
        let a = &x + &y;
        let b = &x - &y;
        let z = &a * &b;

        z.backward();
        assert!((x.grad() - 6.0).abs() < 1e-10);
        assert!((y.grad() - (-4.0)).abs() < 1e-10);
        // intermediate nodes carry their own gradients too
        assert!((a.grad() - 1.0).abs() < 1e-10);
        assert!((b.grad() - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_debug_string() {
        let g = Graph::new();
        let x = g.leaf(2.0_f64.exp());
        let y = g.leaf(1.0);
        let l = x.ln();

        assert_eq!(
            l.to_string(),
            "Node(value=2.000000, gradient=0.000000, op=log, name=v3)"
        );
        assert_eq!(y.name(), "v2");
    }

    #[test]
    fn test_random_point_against_finite_differences() {
        use rand::Rng;
        let mut rng = rand::thread_rng();

        let x_val: f64 = rng.gen_range(-2.0..2.0);
        let y_val: f64 = rng.gen_range(0.5..2.0); // positive for ln

        // exp(x) * ln(y) + sin(x*y)
        let report = gradcheck::check(&[x_val, y_val], 1e-7, |_, v| {
            let (x, y) = (v[0], v[1]);
            x.exp() * y.ln() + (x * y).sin()
        })
        .unwrap();

        assert!(report.passes(1e-5), "x={x_val}, y={y_val}: {report:?}");
    }
}
