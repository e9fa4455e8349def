//! The operation library.
//!
//! Every operation computes its value eagerly, records a node with the
//! operands as parents, and relies on [`local_gradients`] to know how to push
//! gradient back to those operands.

use std::f64::consts::PI;

use statrs::function::erf;

use crate::graph::Var;
use crate::node::Op;

/// Contributions a node sends to each of its parents during the backward
/// pass.
///
/// `inputs` are the parents' values in order, `output` the node's own value
/// and `upstream` its accumulated gradient. The returned vector has one entry
/// per parent, already multiplied through by `upstream` (chain rule).
pub(crate) fn local_gradients(op: Op, inputs: &[f64], output: f64, upstream: f64) -> Vec<f64> {
    let g = upstream;
    match op {
        Op::Leaf => vec![],

        Op::Add => vec![g, g],
        Op::Sub => vec![g, -g],
        Op::Mul => {
            let (a, b) = (inputs[0], inputs[1]);
            vec![b * g, a * g]
        }
        Op::Neg => vec![-g],

        Op::Pow { exponent } => vec![exponent * inputs[0].powf(exponent - 1.0) * g],
        Op::Ln => vec![(1.0 / inputs[0]) * g],
        Op::LogBase { base } => vec![(1.0 / (inputs[0] * base.ln())) * g],
        Op::Exp => vec![inputs[0].exp() * g],
        Op::Root { degree } => {
            vec![(1.0 / degree) * inputs[0].powf(1.0 / degree - 1.0) * g]
        }
        // sign(x), NaN at exactly zero
        Op::Abs => vec![(inputs[0].abs() / inputs[0]) * g],

        Op::Sin => vec![inputs[0].cos() * g],
        Op::Cos => vec![-inputs[0].sin() * g],
        Op::Tan => vec![(1.0 / inputs[0].cos().powi(2)) * g],
        Op::Asin => vec![(1.0 / (1.0 - inputs[0].powi(2)).sqrt()) * g],
        Op::Acos => vec![(-1.0 / (1.0 - inputs[0].powi(2)).sqrt()) * g],
        Op::Atan => vec![(1.0 / (1.0 + inputs[0].powi(2))) * g],

        Op::Sinh => vec![inputs[0].cosh() * g],
        Op::Cosh => vec![inputs[0].sinh() * g],
        Op::Tanh => vec![(1.0 - inputs[0].tanh().powi(2)) * g],
        Op::Asinh => vec![(1.0 / (inputs[0].powi(2) + 1.0).sqrt()) * g],
        Op::Acosh => vec![(1.0 / (inputs[0].powi(2) - 1.0).sqrt()) * g],
        Op::Atanh => vec![(1.0 / (1.0 - inputs[0].powi(2))) * g],

        Op::Erf => vec![(2.0 / PI.sqrt()) * (-inputs[0].powi(2)).exp() * g],
        Op::Erfc => vec![(-2.0 / PI.sqrt()) * (-inputs[0].powi(2)).exp() * g],
        // d/dx erf^-1(x) = sqrt(pi)/2 * exp(erf^-1(x)^2), and output is erf^-1(x)
        Op::ErfInv => vec![(PI.sqrt() / 2.0) * output.powi(2).exp() * g],
        Op::ErfcInv => vec![(-PI.sqrt() / 2.0) * output.powi(2).exp() * g],

        Op::Identity => vec![g],
        // expressed through the forward output
        Op::Sigmoid => vec![g * output * (1.0 - output)],
        Op::Relu => {
            if inputs[0] > 0.0 {
                vec![g]
            } else {
                vec![0.0]
            }
        }
        Op::LeakyRelu { alpha } => {
            if inputs[0] > 0.0 {
                vec![g]
            } else {
                vec![alpha * g]
            }
        }
    }
}

// === Unary and parametric operations ===

impl<'g> Var<'g> {
    fn map(self, op: Op, f: impl FnOnce(f64) -> f64) -> Var<'g> {
        let value = f(self.value());
        self.unary(op, value)
    }

    /// Raise to a constant power: self^exponent
    pub fn powf(self, exponent: f64) -> Var<'g> {
        self.map(Op::Pow { exponent }, |x| x.powf(exponent))
    }

    /// Natural logarithm.
    pub fn ln(self) -> Var<'g> {
        self.map(Op::Ln, f64::ln)
    }

    /// Natural logarithm, same node as [`Var::ln`].
    pub fn log(self) -> Var<'g> {
        self.ln()
    }

    /// Logarithm in a fixed base: ln(self) / ln(base)
    pub fn log_base(self, base: f64) -> Var<'g> {
        self.map(Op::LogBase { base }, |x| x.ln() / base.ln())
    }

    pub fn exp(self) -> Var<'g> {
        self.map(Op::Exp, f64::exp)
    }

    /// The `degree`-th root: self^(1/degree)
    pub fn nth_root(self, degree: f64) -> Var<'g> {
        self.map(Op::Root { degree }, |x| x.powf(1.0 / degree))
    }

    pub fn sqrt(self) -> Var<'g> {
        self.nth_root(2.0)
    }

    /// Absolute value. The derivative is |x|/x, so it is NaN at zero.
    pub fn abs(self) -> Var<'g> {
        self.map(Op::Abs, f64::abs)
    }

    pub fn sin(self) -> Var<'g> {
        self.map(Op::Sin, f64::sin)
    }

    pub fn cos(self) -> Var<'g> {
        self.map(Op::Cos, f64::cos)
    }

    pub fn tan(self) -> Var<'g> {
        self.map(Op::Tan, f64::tan)
    }

    pub fn asin(self) -> Var<'g> {
        self.map(Op::Asin, f64::asin)
    }

    pub fn acos(self) -> Var<'g> {
        self.map(Op::Acos, f64::acos)
    }

    pub fn atan(self) -> Var<'g> {
        self.map(Op::Atan, f64::atan)
    }

    pub fn sinh(self) -> Var<'g> {
        self.map(Op::Sinh, f64::sinh)
    }

    pub fn cosh(self) -> Var<'g> {
        self.map(Op::Cosh, f64::cosh)
    }

    pub fn tanh(self) -> Var<'g> {
        self.map(Op::Tanh, f64::tanh)
    }

    pub fn asinh(self) -> Var<'g> {
        self.map(Op::Asinh, f64::asinh)
    }

    pub fn acosh(self) -> Var<'g> {
        self.map(Op::Acosh, f64::acosh)
    }

    pub fn atanh(self) -> Var<'g> {
        self.map(Op::Atanh, f64::atanh)
    }

    /// Gauss error function.
    pub fn erf(self) -> Var<'g> {
        self.map(Op::Erf, erf::erf)
    }

    /// Complementary error function, 1 - erf(x).
    pub fn erfc(self) -> Var<'g> {
        self.map(Op::Erfc, erf::erfc)
    }

    /// Inverse error function, defined on (-1, 1).
    pub fn erf_inv(self) -> Var<'g> {
        self.map(Op::ErfInv, erf::erf_inv)
    }

    /// Inverse complementary error function, defined on (0, 2).
    pub fn erfc_inv(self) -> Var<'g> {
        self.map(Op::ErfcInv, erf::erfc_inv)
    }
}

// === Binary operations ===

fn add_nodes<'g>(lhs: Var<'g>, rhs: Var<'g>) -> Var<'g> {
    lhs.binary(rhs, Op::Add, lhs.value() + rhs.value())
}

fn sub_nodes<'g>(lhs: Var<'g>, rhs: Var<'g>) -> Var<'g> {
    lhs.binary(rhs, Op::Sub, lhs.value() - rhs.value())
}

fn mul_nodes<'g>(lhs: Var<'g>, rhs: Var<'g>) -> Var<'g> {
    lhs.binary(rhs, Op::Mul, lhs.value() * rhs.value())
}

/// Division is not a primitive: lhs * rhs^-1.
fn div_nodes<'g>(lhs: Var<'g>, rhs: Var<'g>) -> Var<'g> {
    mul_nodes(lhs, rhs.powf(-1.0))
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $build:ident) => {
        impl<'g> std::ops::$trait<Var<'g>> for Var<'g> {
            type Output = Var<'g>;

            fn $method(self, rhs: Var<'g>) -> Var<'g> {
                $build(self, rhs)
            }
        }

        impl<'g> std::ops::$trait<&Var<'g>> for Var<'g> {
            type Output = Var<'g>;

            fn $method(self, rhs: &Var<'g>) -> Var<'g> {
                $build(self, *rhs)
            }
        }

        impl<'g> std::ops::$trait<Var<'g>> for &Var<'g> {
            type Output = Var<'g>;

            fn $method(self, rhs: Var<'g>) -> Var<'g> {
                $build(*self, rhs)
            }
        }

        impl<'g> std::ops::$trait<&Var<'g>> for &Var<'g> {
            type Output = Var<'g>;

            fn $method(self, rhs: &Var<'g>) -> Var<'g> {
                $build(*self, *rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, add_nodes);
impl_binary_op!(Sub, sub, sub_nodes);
impl_binary_op!(Mul, mul, mul_nodes);
impl_binary_op!(Div, div, div_nodes);

impl<'g> std::ops::Neg for Var<'g> {
    type Output = Var<'g>;

    fn neg(self) -> Var<'g> {
        self.map(Op::Neg, |x| -x)
    }
}

impl<'g> std::ops::Neg for &Var<'g> {
    type Output = Var<'g>;

    fn neg(self) -> Var<'g> {
        -*self
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use crate::gradcheck::numeric_gradient;
    use crate::node::OpTag;
    use crate::{Graph, Var};

    const TOL: f64 = 1e-5;

    /// Build `build(x)` on a fresh graph, run backward and return
    /// (value, dx).
    fn eval_unary<F>(x: f64, build: F) -> (f64, f64)
    where
        F: for<'g> Fn(Var<'g>) -> Var<'g>,
    {
        let g = Graph::new();
        let xv = g.leaf(x);
        let y = build(xv);
        y.backward();
        (y.value(), xv.grad())
    }

    fn check_unary<F>(x: f64, build: F, value: f64, derivative: f64)
    where
        F: for<'g> Fn(Var<'g>) -> Var<'g>,
    {
        let (v, d) = eval_unary(x, build);
        assert_abs_diff_eq!(v, value, epsilon = TOL);
        assert_abs_diff_eq!(d, derivative, epsilon = TOL);
    }

    fn eval_binary<F>(a: f64, b: f64, build: F) -> (f64, f64, f64)
    where
        F: for<'g> Fn(Var<'g>, Var<'g>) -> Var<'g>,
    {
        let g = Graph::new();
        let x = g.leaf(a);
        let y = g.leaf(b);
        let z = build(x, y);
        z.backward();
        (z.value(), x.grad(), y.grad())
    }

    #[test]
    fn test_add() {
        let (v, dx, dy) = eval_binary(2.0, 3.0, |x, y| x + y);
        assert_abs_diff_eq!(v, 5.0);
        assert_abs_diff_eq!(dx, 1.0);
        assert_abs_diff_eq!(dy, 1.0);
    }

    #[test]
    fn test_sub() {
        let (v, dx, dy) = eval_binary(2.0, 3.0, |x, y| x - y);
        assert_abs_diff_eq!(v, -1.0);
        assert_abs_diff_eq!(dx, 1.0);
        assert_abs_diff_eq!(dy, -1.0);
    }

    #[test]
    fn test_mul() {
        let (v, dx, dy) = eval_binary(2.0, 3.0, |x, y| x * y);
        assert_abs_diff_eq!(v, 6.0);
        assert_abs_diff_eq!(dx, 3.0);
        assert_abs_diff_eq!(dy, 2.0);
    }

    #[test]
    fn test_div_is_composed() {
        let g = Graph::new();
        let x = g.leaf(2.0);
        let y = g.leaf(4.0);
        let z = &x / &y;

        // x, y, y^-1, x * y^-1
        assert_eq!(g.len(), 4);
        assert_eq!(z.op_tag(), OpTag::Mul);
        assert_eq!(z.parents()[1].op_tag(), OpTag::Pow);

        z.backward();
        assert_abs_diff_eq!(z.value(), 0.5, epsilon = TOL);
        assert_abs_diff_eq!(x.grad(), 0.25, epsilon = TOL);
        assert_abs_diff_eq!(y.grad(), -2.0 / 16.0, epsilon = TOL);
    }

    #[test]
    fn test_div_by_zero_is_not_an_error() {
        let (v, dx, _) = eval_binary(1.0, 0.0, |x, y| x / y);
        assert!(v.is_infinite());
        assert!(dx.is_infinite());
    }

    #[test]
    fn test_neg() {
        check_unary(2.0, |x| -x, -2.0, -1.0);
        check_unary(2.0, |x| -&x, -2.0, -1.0);
    }

    #[test]
    fn test_mixed_reference_operands() {
        let g = Graph::new();
        let x = g.leaf(3.0);
        let y = g.leaf(2.0);
        let z = (&x + y) * (x - &y);
        z.backward();
        assert_abs_diff_eq!(z.value(), 5.0);
        assert_abs_diff_eq!(x.grad(), 6.0);
        assert_abs_diff_eq!(y.grad(), -4.0);
    }

    #[test]
    fn test_pow_and_roots() {
        check_unary(2.0, |x| x.powf(3.0), 8.0, 12.0);
        check_unary(9.0, |x| x.nth_root(2.0), 3.0, 1.0 / 6.0);
        check_unary(8.0, |x| x.nth_root(3.0), 2.0, 1.0 / 12.0);
        check_unary(4.0, |x| x.sqrt(), 2.0, 0.25);
    }

    #[test]
    fn test_logs_and_exp() {
        check_unary(2.0, |x| x.ln(), 2.0_f64.ln(), 0.5);
        check_unary(2.0, |x| x.log(), 2.0_f64.ln(), 0.5);
        check_unary(8.0, |x| x.log_base(2.0), 3.0, 1.0 / (8.0 * 2.0_f64.ln()));
        check_unary(1.0, |x| x.exp(), 1.0_f64.exp(), 1.0_f64.exp());
    }

    #[test]
    fn test_log_of_negative_is_nan() {
        let (v, d) = eval_unary(-1.0, |x| x.ln());
        assert!(v.is_nan());
        assert_abs_diff_eq!(d, -1.0);
    }

    #[test]
    fn test_abs() {
        check_unary(-3.0, |x| x.abs(), 3.0, -1.0);
        check_unary(2.0, |x| x.abs(), 2.0, 1.0);

        let (v, d) = eval_unary(0.0, |x| x.abs());
        assert_eq!(v, 0.0);
        assert!(d.is_nan());
    }

    #[test]
    fn test_trig() {
        let x: f64 = 0.7;
        check_unary(x, |v| v.sin(), x.sin(), x.cos());
        check_unary(x, |v| v.cos(), x.cos(), -x.sin());
        check_unary(x, |v| v.tan(), x.tan(), 1.0 / x.cos().powi(2));
    }

    #[test]
    fn test_inverse_trig() {
        let x: f64 = 0.3;
        let s = (1.0 - x * x).sqrt();
        check_unary(x, |v| v.asin(), x.asin(), 1.0 / s);
        check_unary(x, |v| v.acos(), x.acos(), -1.0 / s);
        check_unary(x, |v| v.atan(), x.atan(), 1.0 / (1.0 + x * x));
    }

    #[test]
    fn test_asin_outside_domain_is_nan() {
        let (v, d) = eval_unary(1.5, |x| x.asin());
        assert!(v.is_nan());
        assert!(d.is_nan());
    }

    #[test]
    fn test_hyperbolic() {
        let x: f64 = 0.4;
        check_unary(x, |v| v.sinh(), x.sinh(), x.cosh());
        check_unary(x, |v| v.cosh(), x.cosh(), x.sinh());
        check_unary(x, |v| v.tanh(), x.tanh(), 1.0 - x.tanh().powi(2));
    }

    #[test]
    fn test_inverse_hyperbolic() {
        check_unary(0.5, |v| v.asinh(), 0.5_f64.asinh(), 1.0 / 1.25_f64.sqrt());
        check_unary(2.0, |v| v.acosh(), 2.0_f64.acosh(), 1.0 / 3.0_f64.sqrt());
        check_unary(0.5, |v| v.atanh(), 0.5_f64.atanh(), 1.0 / 0.75);
    }

    #[test]
    fn test_error_functions() {
        let x: f64 = 0.5;
        let k = 2.0 / std::f64::consts::PI.sqrt() * (-x * x).exp();
        check_unary(x, |v| v.erf(), 0.520_499_877_813_046_5, k);
        check_unary(x, |v| v.erfc(), 1.0 - 0.520_499_877_813_046_5, -k);
    }

    #[test]
    fn test_inverse_error_functions_match_finite_differences() {
        for &x in &[-0.6, -0.1, 0.2, 0.75] {
            let (v, d) = eval_unary(x, |v| v.erf_inv());
            let fd = numeric_gradient(|p| statrs::function::erf::erf_inv(p[0]), &[x], 1e-6);
            assert_abs_diff_eq!(statrs::function::erf::erf(v), x, epsilon = 1e-9);
            assert_abs_diff_eq!(d, fd[0], epsilon = TOL);
        }

        for &x in &[0.3, 0.9, 1.4] {
            let (v, d) = eval_unary(x, |v| v.erfc_inv());
            let fd = numeric_gradient(|p| statrs::function::erf::erfc_inv(p[0]), &[x], 1e-6);
            assert_abs_diff_eq!(statrs::function::erf::erfc(v), x, epsilon = 1e-9);
            assert_abs_diff_eq!(d, fd[0], epsilon = TOL);
        }
    }

    #[test]
    fn test_tags() {
        let g = Graph::new();
        let x = g.leaf(0.5);
        assert_eq!(x.powf(2.0).op_tag(), OpTag::Pow);
        assert_eq!(x.log_base(3.0).op_tag(), OpTag::LogBase);
        assert_eq!(x.erfc_inv().op_tag(), OpTag::ErfcInv);
        assert_eq!((x * x).op_tag(), OpTag::Mul);
    }
}
