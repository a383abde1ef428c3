//! Built-in computer-algebra backend.
//!
//! The checker talks to algebra through [`SymbolicBackend`]; [`AlgebraEngine`]
//! is the in-process implementation covering single-variable
//! differentiation, elementary integration and polynomial root finding.

pub mod calculus;
pub mod expr;
pub mod parser;
pub mod rational;
pub mod solve;

pub use expr::{Expr, Func};
pub use rational::Rational;
pub use solve::Root;

use crate::error::SymbolicError;

/// Capability surface required by the symbolic checker.
pub trait SymbolicBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Parse the restricted grammar (implicit multiplication, `^` exponents).
    fn parse(&self, text: &str) -> Result<Expr, SymbolicError>;

    fn differentiate(&self, expr: &Expr, var: &str) -> Result<Expr, SymbolicError>;

    /// Antiderivative without the constant of integration.
    fn integrate(&self, expr: &Expr, var: &str) -> Result<Expr, SymbolicError>;

    /// Distinct roots of `expr = 0`, complex ones included.
    fn solve(&self, expr: &Expr, var: &str) -> Result<Vec<Root>, SymbolicError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlgebraEngine;

impl AlgebraEngine {
    pub const fn new() -> Self {
        Self
    }
}

impl SymbolicBackend for AlgebraEngine {
    fn name(&self) -> &str {
        "algebra"
    }

    fn parse(&self, text: &str) -> Result<Expr, SymbolicError> {
        parser::parse_expression(text)
    }

    fn differentiate(&self, expr: &Expr, var: &str) -> Result<Expr, SymbolicError> {
        calculus::differentiate(expr, var)
    }

    fn integrate(&self, expr: &Expr, var: &str) -> Result<Expr, SymbolicError> {
        calculus::integrate(expr, var)
    }

    fn solve(&self, expr: &Expr, var: &str) -> Result<Vec<Root>, SymbolicError> {
        solve::solve_polynomial(expr, var)
    }
}
