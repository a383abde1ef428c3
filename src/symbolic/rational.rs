use crate::error::SymbolicError;
use std::cmp::Ordering;
use std::fmt;

/// Exact fraction `num/den` kept in lowest terms with `den > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    num: i64,
    den: i64,
}

fn gcd(mut a: i128, mut b: i128) -> i128 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl Rational {
    pub const ZERO: Self = Self { num: 0, den: 1 };
    pub const ONE: Self = Self { num: 1, den: 1 };
    pub const MINUS_ONE: Self = Self { num: -1, den: 1 };

    pub const fn integer(n: i64) -> Self {
        Self { num: n, den: 1 }
    }

    pub fn new(num: i64, den: i64) -> Result<Self, SymbolicError> {
        Self::from_i128(i128::from(num), i128::from(den))
    }

    fn from_i128(num: i128, den: i128) -> Result<Self, SymbolicError> {
        if den == 0 {
            return Err(SymbolicError::DivisionByZero);
        }
        let g = gcd(num, den).max(1);
        let (mut num, mut den) = (num / g, den / g);
        if den < 0 {
            num = -num;
            den = -den;
        }
        Ok(Self {
            num: i64::try_from(num).map_err(|_| SymbolicError::Overflow)?,
            den: i64::try_from(den).map_err(|_| SymbolicError::Overflow)?,
        })
    }

    /// Parse a decimal literal such as `"12"` or `"0.25"` exactly.
    pub fn from_decimal(text: &str) -> Result<Self, SymbolicError> {
        let (int_part, frac_part) = text.split_once('.').unwrap_or((text, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(SymbolicError::Parse(format!("invalid number '{text}'")));
        }
        let digits = format!("{int_part}{frac_part}");
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(SymbolicError::Parse(format!("invalid number '{text}'")));
        }
        let frac_len = u32::try_from(frac_part.len()).map_err(|_| SymbolicError::Overflow)?;
        let num: i128 = digits.parse().map_err(|_| SymbolicError::Overflow)?;
        let den = 10_i128.checked_pow(frac_len).ok_or(SymbolicError::Overflow)?;
        Self::from_i128(num, den)
    }

    pub const fn numer(self) -> i64 {
        self.num
    }

    pub const fn denom(self) -> i64 {
        self.den
    }

    pub const fn is_zero(self) -> bool {
        self.num == 0
    }

    pub const fn is_one(self) -> bool {
        self.num == 1 && self.den == 1
    }

    pub const fn is_integer(self) -> bool {
        self.den == 1
    }

    pub const fn is_negative(self) -> bool {
        self.num < 0
    }

    pub fn abs(self) -> Self {
        Self {
            num: self.num.saturating_abs(),
            den: self.den,
        }
    }

    pub fn checked_add(self, other: Self) -> Result<Self, SymbolicError> {
        let (a, b, c, d) = self.wide(other);
        Self::from_i128(a * d + c * b, b * d)
    }

    pub fn checked_sub(self, other: Self) -> Result<Self, SymbolicError> {
        self.checked_add(other.checked_neg()?)
    }

    pub fn checked_mul(self, other: Self) -> Result<Self, SymbolicError> {
        let (a, b, c, d) = self.wide(other);
        Self::from_i128(a * c, b * d)
    }

    pub fn checked_div(self, other: Self) -> Result<Self, SymbolicError> {
        let (a, b, c, d) = self.wide(other);
        Self::from_i128(a * d, b * c)
    }

    pub fn checked_neg(self) -> Result<Self, SymbolicError> {
        Ok(Self {
            num: self.num.checked_neg().ok_or(SymbolicError::Overflow)?,
            den: self.den,
        })
    }

    pub fn recip(self) -> Result<Self, SymbolicError> {
        Self::ONE.checked_div(self)
    }

    /// Integer power; negative exponents invert.
    pub fn checked_pow(self, exp: i64) -> Result<Self, SymbolicError> {
        if exp.unsigned_abs() > 256 {
            return Err(SymbolicError::Overflow);
        }
        let mut acc = Self::ONE;
        for _ in 0..exp.unsigned_abs() {
            acc = acc.checked_mul(self)?;
        }
        if exp < 0 { acc.recip() } else { Ok(acc) }
    }

    /// Exact `q`-th root when both numerator and denominator are perfect powers.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn exact_root(self, q: i64) -> Option<Self> {
        if q <= 0 || (self.is_negative() && q % 2 == 0) {
            return None;
        }
        let root_of = |v: i64| -> Option<i64> {
            let guess = (v.unsigned_abs() as f64).powf(1.0 / q as f64).round() as i64;
            (guess.saturating_sub(1)..=guess.saturating_add(1)).find(|c| {
                u32::try_from(q)
                    .ok()
                    .and_then(|q| c.checked_pow(q))
                    .is_some_and(|p| p == v.abs())
            })
        };
        let n = root_of(self.num)?;
        let d = root_of(self.den)?;
        let n = if self.is_negative() { -n } else { n };
        Self::new(n, d).ok()
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    fn wide(self, other: Self) -> (i128, i128, i128, i128) {
        (
            i128::from(self.num),
            i128::from(self.den),
            i128::from(other.num),
            i128::from(other.den),
        )
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b, c, d) = self.wide(*other);
        (a * d).cmp(&(c * b))
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}
