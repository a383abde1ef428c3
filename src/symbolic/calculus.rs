use super::expr::{Expr, Func, SymResult};
use super::rational::Rational;
use super::solve::polynomial_coefficients;
use crate::error::SymbolicError;

/// Derivative of `expr` with respect to `var`.
pub fn differentiate(expr: &Expr, var: &str) -> SymResult<Expr> {
    if expr.free_of(var) {
        return Ok(Expr::zero());
    }
    match expr {
        Expr::Num(_) => Ok(Expr::zero()),
        Expr::Sym(s) => Ok(if s == var { Expr::one() } else { Expr::zero() }),
        Expr::Add(terms) => Expr::add(
            terms
                .iter()
                .map(|t| differentiate(t, var))
                .collect::<SymResult<Vec<_>>>()?,
        ),
        Expr::Mul(factors) => {
            // Product rule: sum over i of f_i' * prod_{j != i} f_j.
            let mut terms = Vec::with_capacity(factors.len());
            for (i, factor) in factors.iter().enumerate() {
                let d = differentiate(factor, var)?;
                if d.is_zero() {
                    continue;
                }
                let mut product = Vec::with_capacity(factors.len());
                product.push(d);
                product.extend(
                    factors
                        .iter()
                        .enumerate()
                        .filter(|(j, _)| *j != i)
                        .map(|(_, f)| f.clone()),
                );
                terms.push(Expr::mul(product)?);
            }
            Expr::add(terms)
        }
        Expr::Pow(base, exp) => {
            let base = base.as_ref();
            let exp = exp.as_ref();
            if exp.free_of(var) {
                // d(u^n) = n * u^(n-1) * u'
                let lowered = Expr::add(vec![exp.clone(), Expr::int(-1)])?;
                Expr::mul(vec![
                    exp.clone(),
                    Expr::pow(base.clone(), lowered)?,
                    differentiate(base, var)?,
                ])
            } else if base.free_of(var) {
                // d(a^v) = a^v * log(a) * v'
                Expr::mul(vec![
                    expr.clone(),
                    Expr::func(Func::Log, base.clone())?,
                    differentiate(exp, var)?,
                ])
            } else {
                // d(u^v) = u^v * (v' log u + v u'/u)
                let log_term = Expr::mul(vec![
                    differentiate(exp, var)?,
                    Expr::func(Func::Log, base.clone())?,
                ])?;
                let ratio_term = Expr::mul(vec![
                    exp.clone(),
                    differentiate(base, var)?,
                    Expr::pow(base.clone(), Expr::int(-1))?,
                ])?;
                Expr::mul(vec![expr.clone(), Expr::add(vec![log_term, ratio_term])?])
            }
        }
        Expr::Func(f, arg) => {
            let inner = differentiate(arg, var)?;
            let arg = arg.as_ref().clone();
            let outer = match f {
                Func::Sin => Expr::func(Func::Cos, arg)?,
                Func::Cos => Expr::func(Func::Sin, arg)?.neg()?,
                Func::Tan => Expr::add(vec![
                    Expr::pow(Expr::func(Func::Tan, arg)?, Expr::int(2))?,
                    Expr::one(),
                ])?,
                Func::Exp => Expr::func(Func::Exp, arg)?,
                Func::Log => Expr::pow(arg, Expr::int(-1))?,
            };
            Expr::mul(vec![outer, inner])
        }
    }
}

/// `(a, b)` when `expr` is `a*var + b` with `a != 0`.
fn linear_parts(expr: &Expr, var: &str) -> Option<(Rational, Rational)> {
    let coeffs = polynomial_coefficients(expr, var).ok()?;
    match coeffs.as_slice() {
        [b, a] if !a.is_zero() => Some((*a, *b)),
        _ => None,
    }
}

/// Split a product into the factors free of `var` and those depending on it.
fn separate(expr: &Expr, var: &str) -> SymResult<(Expr, Expr)> {
    let factors = match expr {
        Expr::Mul(fs) => fs.clone(),
        other => vec![other.clone()],
    };
    let (constant, dependent): (Vec<Expr>, Vec<Expr>) =
        factors.into_iter().partition(|f| f.free_of(var));
    Ok((Expr::mul(constant)?, Expr::mul(dependent)?))
}

fn unsupported(expr: &Expr) -> SymbolicError {
    SymbolicError::Unsupported(format!("no antiderivative rule for {expr}"))
}

fn integrate_term(term: &Expr, var: &str) -> SymResult<Expr> {
    let (constant, dependent) = separate(term, var)?;
    let x = Expr::sym(var);

    let antiderivative = match &dependent {
        d if d.free_of(var) => Expr::mul(vec![d.clone(), x])?,
        Expr::Sym(_) => Expr::mul(vec![
            Expr::Num(Rational::new(1, 2)?),
            Expr::pow(x, Expr::int(2))?,
        ])?,
        Expr::Pow(base, exp) if exp.free_of(var) => {
            let (a, _) = linear_parts(base, var).ok_or_else(|| unsupported(term))?;
            let slope = Expr::Num(a);
            if exp.as_num() == Some(Rational::MINUS_ONE) {
                // ∫ 1/(a x + b) = log(a x + b) / a
                Expr::func(Func::Log, (**base).clone())?.div(slope)?
            } else {
                // ∫ (a x + b)^n = (a x + b)^(n+1) / (a (n+1))
                let raised = Expr::add(vec![(**exp).clone(), Expr::one()])?;
                Expr::pow((**base).clone(), raised.clone())?
                    .div(Expr::mul(vec![slope, raised])?)?
            }
        }
        Expr::Pow(base, exp) if base.free_of(var) => {
            // ∫ c^(a x + b) = c^(a x + b) / (a log c)
            let (a, _) = linear_parts(exp, var).ok_or_else(|| unsupported(term))?;
            dependent.clone().div(Expr::mul(vec![
                Expr::Num(a),
                Expr::func(Func::Log, (**base).clone())?,
            ])?)?
        }
        Expr::Func(f, arg) => {
            let (a, _) = linear_parts(arg, var).ok_or_else(|| unsupported(term))?;
            let arg = (**arg).clone();
            let primitive = match f {
                Func::Sin => Expr::func(Func::Cos, arg)?.neg()?,
                Func::Cos => Expr::func(Func::Sin, arg)?,
                Func::Exp => Expr::func(Func::Exp, arg)?,
                // ∫ tan u = -log(cos u)
                Func::Tan => Expr::func(Func::Log, Expr::func(Func::Cos, arg)?)?.neg()?,
                Func::Log => {
                    // ∫ log u = u log u - u, for u = a x + b
                    let log_u = Expr::func(Func::Log, arg.clone())?;
                    Expr::mul(vec![arg.clone(), log_u])?.sub(arg)?
                }
            };
            primitive.div(Expr::Num(a))?
        }
        _ => return Err(unsupported(term)),
    };

    Expr::mul(vec![constant, antiderivative])
}

/// Indefinite integral of `expr` with respect to `var`, without the constant.
///
/// Handles linear combinations of powers, reciprocals and elementary
/// functions of linear arguments after expansion; anything else is
/// reported as unsupported.
pub fn integrate(expr: &Expr, var: &str) -> SymResult<Expr> {
    let expanded = expr.expand()?;
    let pieces = expanded
        .terms()
        .iter()
        .map(|t| integrate_term(t, var))
        .collect::<SymResult<Vec<_>>>()?;
    Expr::add(pieces)
}
