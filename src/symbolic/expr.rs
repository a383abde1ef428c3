use super::rational::Rational;
use crate::error::SymbolicError;
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub type SymResult<T> = Result<T, SymbolicError>;

/// Cap on intermediate term counts during expansion.
const MAX_EXPANDED_TERMS: usize = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Exp,
    Log,
}

impl Func {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(Self::Sin),
            "cos" => Some(Self::Cos),
            "tan" => Some(Self::Tan),
            "exp" => Some(Self::Exp),
            "log" | "ln" => Some(Self::Log),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Exp => "exp",
            Self::Log => "log",
        }
    }
}

/// Expression tree in canonical form.
///
/// Values are only built through the simplifying constructors
/// ([`Expr::add`], [`Expr::mul`], [`Expr::pow`], [`Expr::func`]), which
/// flatten nested sums and products, fold numeric parts and collect like
/// terms. Two mathematically equal polynomials therefore compare equal
/// after [`Expr::expand`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Expr {
    Num(Rational),
    Sym(String),
    Pow(Box<Expr>, Box<Expr>),
    Mul(Vec<Expr>),
    Add(Vec<Expr>),
    Func(Func, Box<Expr>),
}

impl Expr {
    pub const fn zero() -> Self {
        Self::Num(Rational::ZERO)
    }

    pub const fn one() -> Self {
        Self::Num(Rational::ONE)
    }

    pub const fn int(n: i64) -> Self {
        Self::Num(Rational::integer(n))
    }

    pub fn sym(name: &str) -> Self {
        Self::Sym(name.to_string())
    }

    pub fn as_num(&self) -> Option<Rational> {
        match self {
            Self::Num(r) => Some(*r),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.as_num().is_some_and(Rational::is_zero)
    }

    // ── Simplifying constructors ────────────────────────────────────────

    pub fn add(terms: Vec<Self>) -> SymResult<Self> {
        let mut constant = Rational::ZERO;
        let mut like: BTreeMap<Self, Rational> = BTreeMap::new();
        let mut stack = terms;

        while let Some(term) = stack.pop() {
            match term {
                Self::Add(inner) => stack.extend(inner),
                Self::Num(r) => constant = constant.checked_add(r)?,
                other => {
                    let (coeff, rest) = other.split_coefficient();
                    let slot = like.entry(rest).or_insert(Rational::ZERO);
                    *slot = slot.checked_add(coeff)?;
                }
            }
        }

        let mut out = Vec::with_capacity(like.len() + 1);
        for (rest, coeff) in like {
            if !coeff.is_zero() {
                out.push(Self::scale(coeff, rest));
            }
        }
        if !constant.is_zero() {
            out.push(Self::Num(constant));
        }

        if out.len() <= 1 {
            return Ok(out.pop().unwrap_or_else(Self::zero));
        }
        out.sort();
        Ok(Self::Add(out))
    }

    pub fn mul(factors: Vec<Self>) -> SymResult<Self> {
        let mut coeff = Rational::ONE;
        let mut powers: BTreeMap<Self, Vec<Self>> = BTreeMap::new();
        let mut stack = factors;

        while let Some(factor) = stack.pop() {
            match factor {
                Self::Mul(inner) => stack.extend(inner),
                Self::Num(r) => coeff = coeff.checked_mul(r)?,
                Self::Pow(base, exp) => powers.entry(*base).or_default().push(*exp),
                other => powers.entry(other).or_default().push(Self::one()),
            }
        }
        if coeff.is_zero() {
            return Ok(Self::zero());
        }

        let mut out = Vec::with_capacity(powers.len() + 1);
        let mut regroup = false;
        for (base, exps) in powers {
            match Self::pow(base, Self::add(exps)?)? {
                Self::Num(r) => coeff = coeff.checked_mul(r)?,
                Self::Mul(inner) => {
                    regroup = true;
                    out.extend(inner);
                }
                other => out.push(other),
            }
        }
        if regroup {
            out.push(Self::Num(coeff));
            return Self::mul(out);
        }
        if coeff.is_zero() {
            return Ok(Self::zero());
        }
        if out.is_empty() {
            return Ok(Self::Num(coeff));
        }
        out.sort();
        if coeff.is_one() && out.len() == 1 {
            return Ok(out.remove(0));
        }
        // A bare number times a single sum distributes: 2*(x + 1) -> 2*x + 2.
        if out.len() == 1
            && let Self::Add(terms) = &out[0]
        {
            return Self::add(
                terms
                    .iter()
                    .map(|t| Self::mul(vec![Self::Num(coeff), t.clone()]))
                    .collect::<SymResult<Vec<_>>>()?,
            );
        }
        if !coeff.is_one() {
            out.insert(0, Self::Num(coeff));
        }
        Ok(Self::Mul(out))
    }

    pub fn pow(base: Self, exp: Self) -> SymResult<Self> {
        if let Self::Num(e) = &exp {
            if e.is_zero() {
                return Ok(Self::one());
            }
            if e.is_one() {
                return Ok(base);
            }
        }
        match (base, exp) {
            (Self::Num(b), Self::Num(e)) => Self::pow_numeric(b, e),
            (Self::Pow(inner, e1), Self::Num(e2)) if e2.is_integer() => {
                Self::pow(*inner, Self::mul(vec![*e1, Self::Num(e2)])?)
            }
            (Self::Mul(factors), Self::Num(e)) if e.is_integer() => Self::mul(
                factors
                    .into_iter()
                    .map(|f| Self::pow(f, Self::Num(e)))
                    .collect::<SymResult<Vec<_>>>()?,
            ),
            (base, exp) => Ok(Self::Pow(Box::new(base), Box::new(exp))),
        }
    }

    fn pow_numeric(base: Rational, exp: Rational) -> SymResult<Self> {
        if base.is_zero() {
            return if exp.is_negative() {
                Err(SymbolicError::DivisionByZero)
            } else {
                Ok(Self::zero())
            };
        }
        if base.is_one() {
            return Ok(Self::one());
        }
        if exp.is_integer() {
            return Ok(Self::Num(base.checked_pow(exp.numer())?));
        }
        if let Some(root) = base.exact_root(exp.denom()) {
            return Ok(Self::Num(root.checked_pow(exp.numer())?));
        }
        Ok(Self::Pow(Box::new(Self::Num(base)), Box::new(Self::Num(exp))))
    }

    pub fn func(f: Func, arg: Self) -> SymResult<Self> {
        match (f, &arg) {
            (Func::Sin | Func::Tan, Self::Num(r)) if r.is_zero() => Ok(Self::zero()),
            (Func::Cos | Func::Exp, Self::Num(r)) if r.is_zero() => Ok(Self::one()),
            (Func::Log, Self::Num(r)) if r.is_one() => Ok(Self::zero()),
            (Func::Log, Self::Num(r)) if r.is_zero() => {
                Err(SymbolicError::Unsupported("log(0)".into()))
            }
            (Func::Exp, Self::Func(Func::Log, inner)) | (Func::Log, Self::Func(Func::Exp, inner)) => {
                Ok((**inner).clone())
            }
            _ => Ok(Self::Func(f, Box::new(arg))),
        }
    }

    pub fn sqrt(arg: Self) -> SymResult<Self> {
        Self::pow(arg, Self::Num(Rational::new(1, 2)?))
    }

    pub fn neg(self) -> SymResult<Self> {
        Self::mul(vec![Self::int(-1), self])
    }

    pub fn sub(self, other: Self) -> SymResult<Self> {
        Self::add(vec![self, other.neg()?])
    }

    pub fn div(self, other: Self) -> SymResult<Self> {
        if other.is_zero() {
            return Err(SymbolicError::DivisionByZero);
        }
        Self::mul(vec![self, Self::pow(other, Self::int(-1))?])
    }

    /// Multiply a non-numeric canonical term by a coefficient.
    fn scale(coeff: Rational, rest: Self) -> Self {
        if coeff.is_one() {
            return rest;
        }
        let mut factors = vec![Self::Num(coeff)];
        match rest {
            Self::Mul(inner) => factors.extend(inner),
            other => factors.push(other),
        }
        Self::Mul(factors)
    }

    /// `3*x*y` -> `(3, x*y)`; anything else -> `(1, self)`.
    fn split_coefficient(self) -> (Rational, Self) {
        match self {
            Self::Mul(mut factors) => match factors.first().and_then(Self::as_num) {
                Some(c) => {
                    factors.remove(0);
                    let rest = if factors.len() == 1 {
                        factors.remove(0)
                    } else {
                        Self::Mul(factors)
                    };
                    (c, rest)
                }
                None => (Rational::ONE, Self::Mul(factors)),
            },
            other => (Rational::ONE, other),
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn free_of(&self, var: &str) -> bool {
        match self {
            Self::Num(_) => true,
            Self::Sym(s) => s != var,
            Self::Add(items) | Self::Mul(items) => items.iter().all(|e| e.free_of(var)),
            Self::Pow(b, e) => b.free_of(var) && e.free_of(var),
            Self::Func(_, a) => a.free_of(var),
        }
    }

    pub fn symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::Num(_) => {}
            Self::Sym(s) => {
                out.insert(s.clone());
            }
            Self::Add(items) | Self::Mul(items) => {
                for e in items {
                    e.collect_symbols(out);
                }
            }
            Self::Pow(b, e) => {
                b.collect_symbols(out);
                e.collect_symbols(out);
            }
            Self::Func(_, a) => a.collect_symbols(out),
        }
    }

    /// Summands of a sum, or the expression itself.
    pub fn terms(&self) -> Vec<Self> {
        match self {
            Self::Add(items) => items.clone(),
            other => vec![other.clone()],
        }
    }

    // ── Expansion ───────────────────────────────────────────────────────

    /// Distribute products over sums and small positive integer powers of sums.
    pub fn expand(&self) -> SymResult<Self> {
        match self {
            Self::Num(_) | Self::Sym(_) => Ok(self.clone()),
            Self::Add(items) => Self::add(
                items
                    .iter()
                    .map(Self::expand)
                    .collect::<SymResult<Vec<_>>>()?,
            ),
            Self::Mul(factors) => {
                let mut acc = Self::one();
                for factor in factors {
                    acc = distribute(&acc, &factor.expand()?)?;
                }
                Ok(acc)
            }
            Self::Pow(base, exp) => {
                let base = base.expand()?;
                let exp = exp.expand()?;
                match (&base, exp.as_num()) {
                    (Self::Add(_), Some(n)) if n.is_integer() && (2..=16).contains(&n.numer()) => {
                        let mut acc = base.clone();
                        for _ in 1..n.numer() {
                            acc = distribute(&acc, &base)?;
                        }
                        Ok(acc)
                    }
                    _ => Self::pow(base, exp),
                }
            }
            Self::Func(f, arg) => Self::func(*f, arg.expand()?),
        }
    }

    // ── Rendering ───────────────────────────────────────────────────────

    pub fn to_latex(&self) -> String {
        latex(self)
    }
}

fn distribute(a: &Expr, b: &Expr) -> SymResult<Expr> {
    let left = a.terms();
    let right = b.terms();
    if left.len() * right.len() > MAX_EXPANDED_TERMS {
        return Err(SymbolicError::Unsupported("expansion too large".into()));
    }
    let mut products = Vec::with_capacity(left.len() * right.len());
    for l in &left {
        for r in &right {
            products.push(Expr::mul(vec![l.clone(), r.clone()])?);
        }
    }
    Expr::add(products)
}

// ── Display ordering ────────────────────────────────────────────────────────

/// Total polynomial degree, `None` for terms containing functions or
/// symbolic exponents.
fn degree(e: &Expr) -> Option<Rational> {
    match e {
        Expr::Num(_) => Some(Rational::ZERO),
        Expr::Sym(_) => Some(Rational::ONE),
        Expr::Pow(b, exp) => {
            let d = degree(b)?;
            d.checked_mul(exp.as_num()?).ok()
        }
        Expr::Mul(fs) => fs
            .iter()
            .try_fold(Rational::ZERO, |acc, f| acc.checked_add(degree(f)?).ok()),
        Expr::Add(ts) => ts.iter().filter_map(degree).max(),
        Expr::Func(..) => None,
    }
}

/// Polynomial terms by descending degree, then function terms, constants last.
fn display_order(terms: &[Expr]) -> Vec<&Expr> {
    let key = |t: &Expr| -> (u8, Reverse<Rational>) {
        match (t, degree(t)) {
            (Expr::Num(_), _) => (2, Reverse(Rational::ZERO)),
            (_, None) => (1, Reverse(Rational::ZERO)),
            (_, Some(d)) => (0, Reverse(d)),
        }
    };
    let mut ordered: Vec<&Expr> = terms.iter().collect();
    ordered.sort_by(|a, b| match key(a).cmp(&key(b)) {
        Ordering::Equal => a.cmp(b),
        other => other,
    });
    ordered
}

/// `(true, -t)` when `t` carries a negative leading coefficient.
fn split_sign(t: &Expr) -> (bool, Expr) {
    match t {
        Expr::Num(r) if r.is_negative() => match r.checked_neg() {
            Ok(pos) => (true, Expr::Num(pos)),
            Err(_) => (false, t.clone()),
        },
        Expr::Mul(fs) => match fs.first() {
            Some(Expr::Num(c)) if c.is_negative() => {
                let Ok(pos) = c.checked_neg() else {
                    return (false, t.clone());
                };
                let rest = &fs[1..];
                let magnitude = if pos.is_one() && rest.len() == 1 {
                    rest[0].clone()
                } else if pos.is_one() {
                    Expr::Mul(rest.to_vec())
                } else {
                    let mut v = vec![Expr::Num(pos)];
                    v.extend_from_slice(rest);
                    Expr::Mul(v)
                };
                (true, magnitude)
            }
            _ => (false, t.clone()),
        },
        _ => (false, t.clone()),
    }
}

/// Coefficient plus numerator/denominator factor lists of a product.
fn split_fraction(fs: &[Expr]) -> (Rational, Vec<Expr>, Vec<Expr>) {
    let mut coeff = Rational::ONE;
    let mut num = Vec::new();
    let mut den = Vec::new();
    for f in fs {
        match f {
            Expr::Num(r) => coeff = *r,
            Expr::Pow(b, e) if e.as_num().is_some_and(Rational::is_negative) => {
                let flipped = e
                    .as_num()
                    .and_then(|r| r.checked_neg().ok())
                    .unwrap_or(Rational::ONE);
                if flipped.is_one() {
                    den.push((**b).clone());
                } else {
                    den.push(Expr::Pow(b.clone(), Box::new(Expr::Num(flipped))));
                }
            }
            other => num.push(other.clone()),
        }
    }
    (coeff, num, den)
}

fn half() -> Rational {
    Rational::new(1, 2).unwrap_or(Rational::ONE)
}

// ── Plain (sympy-style) rendering ───────────────────────────────────────────

fn plain(e: &Expr) -> String {
    match e {
        Expr::Num(r) => r.to_string(),
        Expr::Sym(s) => s.clone(),
        Expr::Add(ts) => {
            let mut out = String::new();
            for (i, t) in display_order(ts).into_iter().enumerate() {
                let (negative, magnitude) = split_sign(t);
                match (i, negative) {
                    (0, true) => out.push('-'),
                    (0, false) => {}
                    (_, true) => out.push_str(" - "),
                    (_, false) => out.push_str(" + "),
                }
                out.push_str(&plain(&magnitude));
            }
            out
        }
        Expr::Mul(fs) => plain_mul(fs),
        Expr::Pow(b, exp) => plain_pow(b, exp),
        Expr::Func(f, a) => format!("{}({})", f.name(), plain(a)),
    }
}

fn plain_factor(e: &Expr) -> String {
    match e {
        Expr::Add(_) => format!("({})", plain(e)),
        _ => plain(e),
    }
}

fn plain_base(e: &Expr) -> String {
    match e {
        Expr::Add(_) | Expr::Mul(_) | Expr::Pow(..) => format!("({})", plain(e)),
        Expr::Num(r) if r.is_negative() || !r.is_integer() => format!("({r})"),
        _ => plain(e),
    }
}

fn plain_exponent(e: &Expr) -> String {
    match e {
        Expr::Num(r) if r.is_integer() && !r.is_negative() => r.to_string(),
        Expr::Sym(s) => s.clone(),
        _ => format!("({})", plain(e)),
    }
}

fn plain_pow(base: &Expr, exp: &Expr) -> String {
    let Some(r) = exp.as_num() else {
        return format!("{}**{}", plain_base(base), plain_exponent(exp));
    };
    if r == half() {
        return format!("sqrt({})", plain(base));
    }
    if r.is_negative() {
        let flipped = r.checked_neg().unwrap_or(Rational::ONE);
        let denominator = if flipped == half() {
            format!("sqrt({})", plain(base))
        } else if flipped.is_one() {
            plain_base(base)
        } else {
            format!("{}**{}", plain_base(base), plain_exponent(&Expr::Num(flipped)))
        };
        return format!("1/{denominator}");
    }
    format!("{}**{}", plain_base(base), plain_exponent(exp))
}

fn plain_mul(fs: &[Expr]) -> String {
    let (coeff, num, den) = split_fraction(fs);
    let mut out = String::new();
    if coeff.is_negative() {
        out.push('-');
    }
    let coeff = coeff.abs();

    let mut num_parts: Vec<String> = num.iter().map(plain_factor).collect();
    if coeff.numer() != 1 || num_parts.is_empty() {
        num_parts.insert(0, coeff.numer().to_string());
    }
    out.push_str(&num_parts.join("*"));

    let mut den_parts: Vec<String> = den.iter().map(plain_base).collect();
    if coeff.denom() != 1 {
        den_parts.insert(0, coeff.denom().to_string());
    }
    match den_parts.len() {
        0 => {}
        1 => {
            out.push('/');
            out.push_str(&den_parts[0]);
        }
        _ => {
            out.push_str("/(");
            out.push_str(&den_parts.join("*"));
            out.push(')');
        }
    }
    out
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&plain(self))
    }
}

// ── LaTeX rendering ─────────────────────────────────────────────────────────

fn latex_rational(r: Rational) -> String {
    if r.is_integer() {
        return r.to_string();
    }
    let sign = if r.is_negative() { "- " } else { "" };
    let r = r.abs();
    format!("{sign}\\frac{{{}}}{{{}}}", r.numer(), r.denom())
}

fn latex(e: &Expr) -> String {
    match e {
        Expr::Num(r) => latex_rational(*r),
        Expr::Sym(s) if s == "pi" => "\\pi".to_string(),
        Expr::Sym(s) => s.clone(),
        Expr::Add(ts) => {
            let mut out = String::new();
            for (i, t) in display_order(ts).into_iter().enumerate() {
                let (negative, magnitude) = split_sign(t);
                match (i, negative) {
                    (0, true) => out.push_str("- "),
                    (0, false) => {}
                    (_, true) => out.push_str(" - "),
                    (_, false) => out.push_str(" + "),
                }
                out.push_str(&latex(&magnitude));
            }
            out
        }
        Expr::Mul(fs) => latex_mul(fs),
        Expr::Pow(b, exp) => latex_pow(b, exp),
        Expr::Func(Func::Exp, a) => format!("e^{{{}}}", latex(a)),
        Expr::Func(f, a) => format!("\\{}{{\\left({} \\right)}}", f.name(), latex(a)),
    }
}

fn latex_base(e: &Expr) -> String {
    match e {
        Expr::Add(_) | Expr::Mul(_) | Expr::Pow(..) | Expr::Func(..) => {
            format!("\\left({}\\right)", latex(e))
        }
        Expr::Num(r) if r.is_negative() || !r.is_integer() => {
            format!("\\left({}\\right)", latex_rational(*r))
        }
        _ => latex(e),
    }
}

fn latex_pow(base: &Expr, exp: &Expr) -> String {
    if let Some(r) = exp.as_num() {
        if r == half() {
            return format!("\\sqrt{{{}}}", latex(base));
        }
        if r.is_negative() {
            let flipped = r.checked_neg().unwrap_or(Rational::ONE);
            let den = if flipped.is_one() {
                latex(base)
            } else {
                latex_pow(base, &Expr::Num(flipped))
            };
            return format!("\\frac{{1}}{{{den}}}");
        }
    }
    format!("{}^{{{}}}", latex_base(base), latex(exp))
}

fn latex_factor(e: &Expr) -> String {
    match e {
        Expr::Add(_) => format!("\\left({}\\right)", latex(e)),
        _ => latex(e),
    }
}

fn latex_mul(fs: &[Expr]) -> String {
    let (coeff, num, den) = split_fraction(fs);
    let sign = if coeff.is_negative() { "- " } else { "" };
    let coeff = coeff.abs();

    let mut num_parts: Vec<String> = num.iter().map(latex_factor).collect();
    if coeff.numer() != 1 || num_parts.is_empty() {
        num_parts.insert(0, coeff.numer().to_string());
    }
    let mut den_parts: Vec<String> = den.iter().map(latex_factor).collect();
    if coeff.denom() != 1 {
        den_parts.insert(0, coeff.denom().to_string());
    }

    if den_parts.is_empty() {
        format!("{sign}{}", num_parts.join(" "))
    } else {
        format!(
            "{sign}\\frac{{{}}}{{{}}}",
            num_parts.join(" "),
            den_parts.join(" ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::sym("x")
    }

    fn pow(b: Expr, n: i64) -> Expr {
        Expr::pow(b, Expr::int(n)).unwrap()
    }

    #[test]
    fn like_terms_are_collected() {
        let e = Expr::add(vec![x(), x(), Expr::int(3), Expr::int(-3)]).unwrap();
        assert_eq!(e.to_string(), "2*x");
    }

    #[test]
    fn powers_of_same_base_combine() {
        let e = Expr::mul(vec![x(), pow(x(), 2), Expr::int(3)]).unwrap();
        assert_eq!(e.to_string(), "3*x**3");
        let cancel = Expr::mul(vec![x(), pow(x(), -1)]).unwrap();
        assert_eq!(cancel, Expr::one());
    }

    #[test]
    fn polynomial_terms_print_by_descending_degree() {
        let e = Expr::add(vec![
            Expr::int(6),
            pow(x(), 2),
            Expr::mul(vec![Expr::int(-5), x()]).unwrap(),
        ])
        .unwrap();
        assert_eq!(e.to_string(), "x**2 - 5*x + 6");
    }

    #[test]
    fn fractional_coefficients_print_over_denominator() {
        let third = Expr::Num(Rational::new(1, 3).unwrap());
        let e = Expr::mul(vec![third, pow(x(), 3)]).unwrap();
        assert_eq!(e.to_string(), "x**3/3");
        assert_eq!(e.to_latex(), "\\frac{x^{3}}{3}");

        let three_halves = Expr::Num(Rational::new(3, 2).unwrap());
        let e = Expr::mul(vec![three_halves, pow(x(), 2)]).unwrap();
        assert_eq!(e.to_string(), "3*x**2/2");
    }

    #[test]
    fn reciprocal_and_sqrt_render_naturally() {
        assert_eq!(pow(x(), -1).to_string(), "1/x");
        assert_eq!(Expr::sqrt(x()).unwrap().to_string(), "sqrt(x)");
        assert_eq!(Expr::sqrt(x()).unwrap().to_latex(), "\\sqrt{x}");
    }

    #[test]
    fn functions_render_in_both_forms() {
        let e = Expr::func(Func::Sin, x()).unwrap();
        assert_eq!(e.to_string(), "sin(x)");
        assert_eq!(e.to_latex(), "\\sin{\\left(x \\right)}");
        let neg = e.neg().unwrap();
        assert_eq!(neg.to_string(), "-sin(x)");
    }

    #[test]
    fn perfect_square_roots_fold() {
        let e = Expr::sqrt(Expr::int(9)).unwrap();
        assert_eq!(e, Expr::int(3));
        let irrational = Expr::sqrt(Expr::int(2)).unwrap();
        assert_eq!(irrational.to_string(), "sqrt(2)");
    }

    #[test]
    fn expansion_distributes_products_and_powers() {
        let sum = Expr::add(vec![x(), Expr::one()]).unwrap();
        let squared = pow(sum, 2);
        assert_eq!(squared.to_string(), "(x + 1)**2");
        assert_eq!(squared.expand().unwrap().to_string(), "x**2 + 2*x + 1");
    }

    #[test]
    fn expanded_forms_compare_equal() {
        let a = Expr::mul(vec![
            Expr::add(vec![x(), Expr::int(-2)]).unwrap(),
            Expr::add(vec![x(), Expr::int(-3)]).unwrap(),
        ])
        .unwrap();
        let b = Expr::add(vec![
            pow(x(), 2),
            Expr::mul(vec![Expr::int(-5), x()]).unwrap(),
            Expr::int(6),
        ])
        .unwrap();
        assert_eq!(a.expand().unwrap(), b);
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(x().div(Expr::zero()), Err(SymbolicError::DivisionByZero));
    }

    #[test]
    fn free_of_tracks_variables() {
        let e = Expr::mul(vec![Expr::sym("a"), pow(x(), 2)]).unwrap();
        assert!(!e.free_of("x"));
        assert!(e.free_of("y"));
        assert_eq!(e.symbols().into_iter().collect::<Vec<_>>(), vec!["a", "x"]);
    }
}
