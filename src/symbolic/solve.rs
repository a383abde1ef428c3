use super::expr::{Expr, SymResult};
use super::rational::Rational;
use crate::error::SymbolicError;
use std::fmt;

const MAX_DEGREE: usize = 32;
/// Rational-root search is skipped when coefficients exceed this.
const MAX_DIVISOR_SEARCH: i64 = 1_000_000;
const IMAG_EPSILON: f64 = 1e-9;

/// One root of a polynomial equation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Root {
    pub re: f64,
    pub im: f64,
    /// Present when the root is rational and was found exactly.
    pub exact: Option<Rational>,
}

impl Root {
    fn exact(r: Rational) -> Self {
        Self {
            re: r.to_f64(),
            im: 0.0,
            exact: Some(r),
        }
    }

    fn numeric(re: f64, im: f64) -> Self {
        Self {
            re,
            im: if im.abs() < IMAG_EPSILON { 0.0 } else { im },
            exact: None,
        }
    }

    pub fn is_real(&self) -> bool {
        self.im.abs() < IMAG_EPSILON
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(r) = self.exact {
            return write!(f, "{r}");
        }
        if self.is_real() {
            return write!(f, "{:.6}", self.re);
        }
        let sign = if self.im < 0.0 { '-' } else { '+' };
        write!(f, "{:.6} {sign} {:.6}*I", self.re, self.im.abs())
    }
}

/// Coefficients `[c0, c1, ..., cn]` of `expr` as a polynomial in `var`.
///
/// Fails with `Unsupported` for anything that is not a polynomial with
/// rational coefficients in exactly that variable.
pub fn polynomial_coefficients(expr: &Expr, var: &str) -> SymResult<Vec<Rational>> {
    let expanded = expr.expand()?;
    let mut coeffs = vec![Rational::ZERO];

    for term in expanded.terms() {
        let (coeff, degree) = monomial(&term, var)?;
        if degree > MAX_DEGREE {
            return Err(SymbolicError::Unsupported(format!("degree {degree} too high")));
        }
        if coeffs.len() <= degree {
            coeffs.resize(degree + 1, Rational::ZERO);
        }
        coeffs[degree] = coeffs[degree].checked_add(coeff)?;
    }

    while coeffs.len() > 1 && coeffs.last().is_some_and(|c| c.is_zero()) {
        coeffs.pop();
    }
    Ok(coeffs)
}

fn monomial(term: &Expr, var: &str) -> SymResult<(Rational, usize)> {
    let not_polynomial = || SymbolicError::Unsupported(format!("{term} is not a polynomial in {var}"));
    let power_of_var = |e: &Expr| -> SymResult<usize> {
        match e {
            Expr::Sym(s) if s == var => Ok(1),
            Expr::Pow(base, exp) if matches!(base.as_ref(), Expr::Sym(s) if s == var) => {
                let n = exp.as_num().filter(|n| n.is_integer() && !n.is_negative());
                n.and_then(|n| usize::try_from(n.numer()).ok())
                    .ok_or_else(not_polynomial)
            }
            _ => Err(not_polynomial()),
        }
    };

    match term {
        Expr::Num(r) => Ok((*r, 0)),
        Expr::Mul(factors) => {
            let mut coeff = Rational::ONE;
            let mut degree = 0;
            for f in factors {
                match f {
                    Expr::Num(r) => coeff = coeff.checked_mul(*r)?,
                    other => degree += power_of_var(other)?,
                }
            }
            Ok((coeff, degree))
        }
        other => Ok((Rational::ONE, power_of_var(other)?)),
    }
}

fn eval(coeffs: &[Rational], x: Rational) -> SymResult<Rational> {
    coeffs
        .iter()
        .rev()
        .try_fold(Rational::ZERO, |acc, c| acc.checked_mul(x)?.checked_add(*c))
}

/// Divide by `(x - root)`; `coeffs` is low-to-high.
fn deflate(coeffs: &[Rational], root: Rational) -> SymResult<Vec<Rational>> {
    let n = coeffs.len() - 1;
    let mut out = vec![Rational::ZERO; n];
    let mut carry = Rational::ZERO;
    for i in (0..n).rev() {
        carry = carry.checked_mul(root)?.checked_add(coeffs[i + 1])?;
        out[i] = carry;
    }
    Ok(out)
}

fn divisors(n: i64) -> Vec<i64> {
    let n = n.abs();
    let mut out = Vec::new();
    let mut d = 1;
    while d * d <= n {
        if n % d == 0 {
            out.push(d);
            if d != n / d {
                out.push(n / d);
            }
        }
        d += 1;
    }
    out.sort_unstable();
    out
}

fn lcm(a: i64, b: i64) -> SymResult<i64> {
    let (mut x, mut y) = (a, b);
    while y != 0 {
        (x, y) = (y, x % y);
    }
    (a / x).checked_mul(b).ok_or(SymbolicError::Overflow)
}

/// Peel off rational roots by the rational root theorem.
fn rational_roots(coeffs: &mut Vec<Rational>, roots: &mut Vec<Root>) -> SymResult<()> {
    while coeffs.len() > 2 {
        let scale = coeffs
            .iter()
            .try_fold(1_i64, |acc, c| lcm(acc, c.denom()))?;
        let integers = coeffs
            .iter()
            .map(|c| c.checked_mul(Rational::integer(scale)).map(Rational::numer))
            .collect::<SymResult<Vec<_>>>()?;
        let (a0, an) = (integers[0], integers[integers.len() - 1]);
        if a0.abs() > MAX_DIVISOR_SEARCH || an.abs() > MAX_DIVISOR_SEARCH {
            return Ok(());
        }

        let mut found = None;
        'search: for p in divisors(a0) {
            for q in divisors(an) {
                for sign in [1, -1] {
                    let candidate = Rational::new(sign * p, q)?;
                    if eval(coeffs, candidate)?.is_zero() {
                        found = Some(candidate);
                        break 'search;
                    }
                }
            }
        }

        let Some(root) = found else {
            return Ok(());
        };
        roots.push(Root::exact(root));
        *coeffs = deflate(coeffs, root)?;
    }
    Ok(())
}

fn quadratic_roots(c: Rational, b: Rational, a: Rational) -> SymResult<Vec<Root>> {
    let disc = b
        .checked_mul(b)?
        .checked_sub(Rational::integer(4).checked_mul(a)?.checked_mul(c)?)?;
    let two_a = Rational::integer(2).checked_mul(a)?;

    if let Some(sqrt) = disc.exact_root(2) {
        let neg_b = b.checked_neg()?;
        return Ok(vec![
            Root::exact(neg_b.checked_sub(sqrt)?.checked_div(two_a)?),
            Root::exact(neg_b.checked_add(sqrt)?.checked_div(two_a)?),
        ]);
    }

    let (a, b, d) = (a.to_f64(), b.to_f64(), disc.to_f64());
    if d >= 0.0 {
        let s = d.sqrt();
        Ok(vec![
            Root::numeric((-b - s) / (2.0 * a), 0.0),
            Root::numeric((-b + s) / (2.0 * a), 0.0),
        ])
    } else {
        let s = (-d).sqrt();
        Ok(vec![
            Root::numeric(-b / (2.0 * a), -s / (2.0 * a)),
            Root::numeric(-b / (2.0 * a), s / (2.0 * a)),
        ])
    }
}

#[derive(Debug, Clone, Copy)]
struct Complex {
    re: f64,
    im: f64,
}

impl Complex {
    fn plus(self, o: Self) -> Self {
        Self { re: self.re + o.re, im: self.im + o.im }
    }

    fn minus(self, o: Self) -> Self {
        Self { re: self.re - o.re, im: self.im - o.im }
    }

    fn times(self, o: Self) -> Self {
        Self {
            re: self.re * o.re - self.im * o.im,
            im: self.re * o.im + self.im * o.re,
        }
    }

    fn over(self, o: Self) -> Self {
        let d = o.re * o.re + o.im * o.im;
        Self {
            re: (self.re * o.re + self.im * o.im) / d,
            im: (self.im * o.re - self.re * o.im) / d,
        }
    }

    fn norm(self) -> f64 {
        self.re.hypot(self.im)
    }
}

/// Durand–Kerner iteration on a monic copy of the polynomial.
fn numeric_roots(coeffs: &[Rational]) -> Vec<Root> {
    let n = coeffs.len() - 1;
    let lead = coeffs[n].to_f64();
    let monic: Vec<f64> = coeffs.iter().map(|c| c.to_f64() / lead).collect();
    let value_at = |z: Complex| {
        monic.iter().rev().fold(Complex { re: 0.0, im: 0.0 }, |acc, c| {
            acc.times(z).plus(Complex { re: *c, im: 0.0 })
        })
    };

    let seed = Complex { re: 0.4, im: 0.9 };
    let mut z: Vec<Complex> = Vec::with_capacity(n);
    let mut power = Complex { re: 1.0, im: 0.0 };
    for _ in 0..n {
        z.push(power);
        power = power.times(seed);
    }

    for _ in 0..500 {
        let mut max_step: f64 = 0.0;
        for i in 0..n {
            let mut denom = Complex { re: 1.0, im: 0.0 };
            for j in 0..n {
                if i != j {
                    denom = denom.times(z[i].minus(z[j]));
                }
            }
            if denom.norm() == 0.0 {
                continue;
            }
            let step = value_at(z[i]).over(denom);
            z[i] = z[i].minus(step);
            max_step = max_step.max(step.norm());
        }
        if max_step < 1e-14 {
            break;
        }
    }

    z.into_iter()
        .map(|c| {
            let im = if c.im.abs() < 1e-7 * c.norm().max(1.0) { 0.0 } else { c.im };
            Root::numeric(c.re, im)
        })
        .collect()
}

/// Distinct roots of `expr = 0` in `var`, sorted by real then imaginary part.
pub fn solve_polynomial(expr: &Expr, var: &str) -> SymResult<Vec<Root>> {
    let mut coeffs = polynomial_coefficients(expr, var)?;
    if coeffs.len() == 1 {
        return if coeffs[0].is_zero() {
            Err(SymbolicError::Unsupported("equation holds for every value".into()))
        } else {
            Ok(Vec::new())
        };
    }

    let mut roots = Vec::new();
    while coeffs.len() > 1 && coeffs[0].is_zero() {
        roots.push(Root::exact(Rational::ZERO));
        coeffs.remove(0);
    }
    rational_roots(&mut coeffs, &mut roots)?;

    match coeffs.len() {
        0 | 1 => {}
        2 => {
            let root = coeffs[0].checked_neg()?.checked_div(coeffs[1])?;
            roots.push(Root::exact(root));
        }
        3 => roots.extend(quadratic_roots(coeffs[0], coeffs[1], coeffs[2])?),
        _ => roots.extend(numeric_roots(&coeffs)),
    }

    roots.sort_by(|a, b| a.re.total_cmp(&b.re).then(a.im.total_cmp(&b.im)));
    roots.dedup_by(|a, b| (a.re - b.re).abs() < 1e-9 && (a.im - b.im).abs() < 1e-9);
    Ok(roots)
}
