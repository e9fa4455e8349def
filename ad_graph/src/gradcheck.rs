//! Gradient verification against central finite differences.

use crate::error::GraphError;
use crate::graph::{Graph, Var};

/// Central finite-difference gradient of `f` at `point`.
///
/// # Example
/// ```
/// use ad_graph::numeric_gradient;
///
/// // f(x, y) = x^2 + y^2
/// let f = |v: &[f64]| v[0] * v[0] + v[1] * v[1];
/// let grads = numeric_gradient(f, &[3.0, 4.0], 1e-7);
///
/// assert!((grads[0] - 6.0).abs() < 1e-5);
/// assert!((grads[1] - 8.0).abs() < 1e-5);
/// ```
pub fn numeric_gradient<F>(f: F, point: &[f64], eps: f64) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut shifted = point.to_vec();
    (0..point.len())
        .map(|i| {
            shifted[i] = point[i] + eps;
            let f_plus = f(&shifted);
            shifted[i] = point[i] - eps;
            let f_minus = f(&shifted);
            shifted[i] = point[i];
            (f_plus - f_minus) / (2.0 * eps)
        })
        .collect()
}

/// Analytic and numeric gradients of one expression at one point.
#[derive(Debug, Clone, PartialEq)]
pub struct GradCheck {
    pub value: f64,
    pub analytic: Vec<f64>,
    pub numeric: Vec<f64>,
}

impl GradCheck {
    /// Largest absolute difference between the two gradients.
    pub fn max_abs_error(&self) -> f64 {
        self.analytic
            .iter()
            .zip(&self.numeric)
            .map(|(a, n)| (a - n).abs())
            .fold(0.0, f64::max)
    }

    pub fn passes(&self, tolerance: f64) -> bool {
        self.max_abs_error() < tolerance
    }
}

/// Compare `backward` against finite differences for the expression produced
/// by `build`.
///
/// `build` receives a fresh graph and one leaf per coordinate of `point`; it
/// is called once for the analytic pass and twice per coordinate for the
/// numeric one.
pub fn check<F>(point: &[f64], eps: f64, build: F) -> Result<GradCheck, GraphError>
where
    F: for<'g> Fn(&'g Graph, &[Var<'g>]) -> Var<'g>,
{
    let graph = Graph::new();
    let inputs: Vec<Var<'_>> = point.iter().map(|&x| graph.leaf(x)).collect();
    let output = build(&graph, &inputs);
    output.backward();

    let analytic: Vec<f64> = inputs.iter().map(|v| v.grad()).collect();
    if let Some((input, &value)) = inputs
        .iter()
        .zip(&analytic)
        .find(|(_, g)| !g.is_finite())
    {
        return Err(GraphError::NonFiniteGradient {
            name: input.name(),
            value,
        });
    }

    let numeric = numeric_gradient(
        |p| {
            let graph = Graph::new();
            let inputs: Vec<Var<'_>> = p.iter().map(|&x| graph.leaf(x)).collect();
            let output = build(&graph, &inputs);
            output.value()
        },
        point,
        eps,
    );

    Ok(GradCheck {
        value: output.value(),
        analytic,
        numeric,
    })
}
