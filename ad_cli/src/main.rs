//! CLI demo for the ad_graph autodiff engine.
//!
//! Builds one expression, runs the backward pass, prints every node of the
//! graph and validates the gradients against finite differences.
//!
//! Usage:
//!   ad-demo [--expr <EXPR>] [--x1 <X1>] [--x2 <X2>] [--eps <EPS>] [--tolerance <TOL>] [-v]
//!
//! Examples:
//!   ad-demo
//!   ad-demo --expr exp-tan --x1 0.5
//!   RUST_LOG=trace ad-demo --expr cos-abs

use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::{debug, error, info};

use ad_graph::{gradcheck, topological_order, Graph, GraphError, Var};

/// Reverse-mode autodiff demo
#[derive(Parser, Debug)]
#[command(name = "ad-demo")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Expression to differentiate
    #[arg(short, long, value_enum, default_value_t = Expression::LogMulSin)]
    expr: Expression,

    /// Value of the first input (defaults to the expression's reference point)
    #[arg(long)]
    x1: Option<f64>,

    /// Value of the second input (defaults to the expression's reference point)
    #[arg(long)]
    x2: Option<f64>,

    /// Finite-difference step
    #[arg(long, default_value_t = 1e-7)]
    eps: f64,

    /// Maximum accepted |autodiff - finite difference|
    #[arg(long, default_value_t = 1e-5)]
    tolerance: f64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Expression {
    /// y = ln(x1) + x1*x2 - sin(x2)
    LogMulSin,
    /// y = (x1 - x2) / (x1*x2)
    Quotient,
    /// y = exp(x1)*tan(x2) - ln(x2)
    ExpTan,
    /// y = sin(x1) / log_7(x2) + sqrt(x1)
    SinLog,
    /// y = cos(x1) * |x2|
    CosAbs,
}

impl Expression {
    fn formula(self) -> &'static str {
        match self {
            Expression::LogMulSin => "y = ln(x1) + x1*x2 - sin(x2)",
            Expression::Quotient => "y = (x1 - x2) / (x1*x2)",
            Expression::ExpTan => "y = exp(x1)*tan(x2) - ln(x2)",
            Expression::SinLog => "y = sin(x1) / log_7(x2) + sqrt(x1)",
            Expression::CosAbs => "y = cos(x1) * |x2|",
        }
    }

    /// Reference input point.
    fn default_point(self) -> (f64, f64) {
        match self {
            Expression::LogMulSin => (2.0, 5.0),
            Expression::Quotient => (3.0, 4.0),
            Expression::ExpTan => (1.0, 2.0),
            Expression::SinLog => (3.0, 8.0),
            Expression::CosAbs => (2.0, 2.0),
        }
    }

    fn build<'g>(self, x1: Var<'g>, x2: Var<'g>) -> Var<'g> {
        match self {
            Expression::LogMulSin => x1.ln() + x1 * x2 - x2.sin(),
            Expression::Quotient => (x1 - x2) / (x1 * x2),
            Expression::ExpTan => x1.exp() * x2.tan() - x2.ln(),
            Expression::SinLog => x1.sin() / x2.log_base(7.0) + x1.nth_root(2.0),
            Expression::CosAbs => x1.cos() * x2.abs(),
        }
    }
}

fn run(args: &Args) -> Result<bool, GraphError> {
    let (d1, d2) = args.expr.default_point();
    let point = [args.x1.unwrap_or(d1), args.x2.unwrap_or(d2)];

    println!("=== Reverse-Mode Autodiff Demo ===\n");
    println!("Expression: {}", args.expr.formula());
    println!("At point:   x1 = {}, x2 = {}\n", point[0], point[1]);

    let graph = Graph::new();
    let x1 = graph.leaf(point[0]);
    let x2 = graph.leaf(point[1]);
    let y = args.expr.build(x1, x2);
    debug!("built {} nodes", graph.len());

    y.backward();

    println!("Graph (topological order):");
    for node in topological_order(y) {
        println!("  {node}");
    }

    println!("\nValue:      y = {:.10}", y.value());
    println!("Autodiff gradients:");
    println!("  dy/dx1 = {:.10}", x1.grad());
    println!("  dy/dx2 = {:.10}\n", x2.grad());

    let expr = args.expr;
    let report = gradcheck::check(&point, args.eps, |_, v| expr.build(v[0], v[1]))?;

    println!("Finite difference gradients (eps={:e}):", args.eps);
    println!("  dy/dx1 = {:.10}", report.numeric[0]);
    println!("  dy/dx2 = {:.10}\n", report.numeric[1]);

    let max_err = report.max_abs_error();
    println!("Max absolute error: {:.2e}", max_err);

    let passed = report.passes(args.tolerance);
    if passed {
        println!("PASS: {:.2e} < {:.2e}", max_err, args.tolerance);
    } else {
        println!("FAIL: {:.2e} >= {:.2e}", max_err, args.tolerance);
    }
    Ok(passed)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    info!("{:?}", args);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
