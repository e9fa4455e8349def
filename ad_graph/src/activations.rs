//! Activation functions for neural-network style expressions.
//!
//! `tanh` lives with the other hyperbolic functions in the operation library.

use crate::graph::Var;
use crate::node::Op;

impl<'g> Var<'g> {
    /// Pass-through node: value x, gradient passed on unchanged.
    pub fn identity(self) -> Var<'g> {
        let value = self.value();
        self.unary(Op::Identity, value)
    }

    /// Logistic sigmoid: 1 / (1 + exp(-x))
    pub fn sigmoid(self) -> Var<'g> {
        let value = 1.0 / (1.0 + (-self.value()).exp());
        self.unary(Op::Sigmoid, value)
    }

    /// max(0, x). The gradient is zero for x <= 0, including x = 0.
    pub fn relu(self) -> Var<'g> {
        let x = self.value();
        // NaN propagates
        let value = if x > 0.0 || x.is_nan() { x } else { 0.0 };
        self.unary(Op::Relu, value)
    }

    /// max(0, x) + alpha * min(0, x)
    pub fn leaky_relu(self, alpha: f64) -> Var<'g> {
        let x = self.value();
        let value = if x > 0.0 { x } else { alpha * x };
        self.unary(Op::LeakyRelu { alpha }, value)
    }
}
