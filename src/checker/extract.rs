//! Pulls the mathematical target out of free-form question and answer text.

use regex::Regex;
use std::sync::LazyLock;

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("valid number regex"));
static FRACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(-?\d+)\s*/\s*(\d+)|\\[dt]?frac\{\s*(-?\d+)\s*\}\{\s*(\d+)\s*\}")
        .expect("valid fraction regex")
});
static ROOTS_OF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\broots?\s+of\s+(.+)").expect("valid roots-of regex"));
static SOLVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bsolve\s+(.+)").expect("valid solve regex"));
static DIFFERENTIAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\bd\s*[a-z]$").expect("valid differential regex"));

const VARIABLE_PHRASES: &[&str] = &["with respect to x", "w.r.t. x", "w.r.t x", "wrt x"];
const TRAILING_CLAUSES: &[&str] = &[" at ", " from ", " when ", " where ", " for ", " over "];
const LEADING_FILLER: &[&str] = &[
    "the ",
    "function ",
    "expression ",
    "equation ",
    "polynomial ",
    "of ",
    "\\int",
    "∫",
    ":",
];

fn trim_punctuation(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '?' | '.' | '!' | ',' | '$'))
}

fn cut_trailing_clause(s: &str) -> &str {
    TRAILING_CLAUSES
        .iter()
        .filter_map(|clause| s.find(clause))
        .min()
        .map_or(s, |idx| &s[..idx])
}

fn strip_leading_filler(mut s: &str) -> &str {
    loop {
        let before = s;
        for filler in LEADING_FILLER {
            if let Some(rest) = s.strip_prefix(filler) {
                s = rest.trim_start();
            }
        }
        if s == before {
            return s;
        }
    }
}

fn clean_target(raw: &str) -> Option<String> {
    let mut text = raw.to_string();
    for phrase in VARIABLE_PHRASES {
        text = text.replace(phrase, " ");
    }
    let text = cut_trailing_clause(trim_punctuation(&text));
    let text = strip_leading_filler(trim_punctuation(text));
    // `f(x) = x^2` -> `x^2`
    let text = text.rsplit_once('=').map_or(text, |(_, rhs)| rhs);
    // `x^2 dx` -> `x^2`
    let text = DIFFERENTIAL_RE.replace(trim_punctuation(text), "");
    let text = trim_punctuation(&text);
    (!text.is_empty()).then(|| text.to_string())
}

/// Expression following the first matching prefix, e.g. the `x^2` in
/// "What is the derivative of x^2 with respect to x?".
pub fn expression_after(question: &str, prefixes: &[&str]) -> Option<String> {
    let q = question.to_lowercase();
    prefixes.iter().find_map(|prefix| {
        let idx = q.find(prefix)?;
        clean_target(&q[idx + prefix.len()..])
    })
}

/// Left-hand side (as `lhs - rhs` when the right side is not zero) of the
/// equation in "solve ... = ..." or "roots of ..." questions.
pub fn equation_lhs(question: &str) -> Option<String> {
    let q = question.to_lowercase();
    let body = SOLVE_RE
        .captures(&q)
        .or_else(|| ROOTS_OF_RE.captures(&q))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())?;

    let body = cut_trailing_clause(trim_punctuation(&body));
    let body = strip_leading_filler(trim_punctuation(body));

    let Some((lhs, rhs)) = body.split_once('=') else {
        let lhs = trim_punctuation(body);
        return (!lhs.is_empty()).then(|| lhs.to_string());
    };
    let lhs = strip_leading_filler(trim_punctuation(lhs));
    let rhs = trim_punctuation(rhs);
    if lhs.is_empty() {
        return None;
    }
    if rhs.is_empty() || rhs == "0" {
        Some(lhs.to_string())
    } else {
        Some(format!("({lhs}) - ({rhs})"))
    }
}

/// Every decimal number mentioned in `text`, plus the values of simple
/// fractions such as `1/2` or `\frac{1}{2}`.
pub fn numeric_values(text: &str) -> Vec<f64> {
    let mut values: Vec<f64> = NUMBER_RE
        .find_iter(text)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();

    for caps in FRACTION_RE.captures_iter(text) {
        let num = caps.get(1).or_else(|| caps.get(3));
        let den = caps.get(2).or_else(|| caps.get(4));
        if let (Some(num), Some(den)) = (num, den)
            && let (Ok(n), Ok(d)) = (num.as_str().parse::<f64>(), den.as_str().parse::<f64>())
            && d != 0.0
        {
            values.push(n / d);
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    const DERIVATIVE: &[&str] = &["derivative of", "differentiate", "d/dx"];

    #[test]
    fn derivative_target_after_prefix() {
        assert_eq!(
            expression_after("Differentiate x^2 + 3*x", DERIVATIVE).as_deref(),
            Some("x^2 + 3*x")
        );
    }

    #[test]
    fn variable_phrase_and_function_name_are_stripped() {
        assert_eq!(
            expression_after(
                "Find the derivative of f(x) = x^3 with respect to x.",
                DERIVATIVE
            )
            .as_deref(),
            Some("x^3")
        );
        assert_eq!(
            expression_after("What is the derivative of the function sin(x)?", DERIVATIVE)
                .as_deref(),
            Some("sin(x)")
        );
    }

    #[test]
    fn trailing_clauses_are_cut() {
        assert_eq!(
            expression_after("Integrate x^2 from 0 to 1", &["integrate"]).as_deref(),
            Some("x^2")
        );
    }

    #[test]
    fn trailing_differential_is_dropped() {
        let integral = &["integral of", "integrate", "∫"];
        assert_eq!(
            expression_after("Integrate x^2 dx", integral).as_deref(),
            Some("x^2")
        );
        assert_eq!(
            expression_after("∫ sin(x)dx", integral).as_deref(),
            Some("sin(x)")
        );
        assert_eq!(
            expression_after("Integrate \\int 3t^2 d t from 0 to 1", integral).as_deref(),
            Some("3t^2")
        );
        assert_eq!(
            expression_after("Differentiate x + d", DERIVATIVE).as_deref(),
            Some("x + d")
        );
    }

    #[test]
    fn missing_target_is_none() {
        assert_eq!(expression_after("Differentiate?", DERIVATIVE), None);
        assert_eq!(expression_after("Explain limits", DERIVATIVE), None);
    }

    #[test]
    fn equation_lhs_from_solve() {
        assert_eq!(
            equation_lhs("Solve x^2 - 5x + 6 = 0").as_deref(),
            Some("x^2 - 5x + 6")
        );
        assert_eq!(
            equation_lhs("Please solve the equation 2x + 1 = 7 for x.").as_deref(),
            Some("(2x + 1) - (7)")
        );
    }

    #[test]
    fn equation_lhs_from_roots_of() {
        assert_eq!(
            equation_lhs("What are the roots of x^2 - 4?").as_deref(),
            Some("x^2 - 4")
        );
        assert_eq!(
            equation_lhs("Find the roots of x^2 - 4 = 0.").as_deref(),
            Some("x^2 - 4")
        );
    }

    #[test]
    fn equation_without_target_is_none() {
        assert_eq!(equation_lhs("Explain the quadratic equation"), None);
    }

    #[test]
    fn numbers_and_fractions_are_extracted() {
        let values = numeric_values("The roots are x = 2 and x = -3.5, or 1/2 and \\frac{3}{4}");
        assert!(values.contains(&2.0));
        assert!(values.contains(&-3.5));
        assert!(values.contains(&0.5));
        assert!(values.contains(&0.75));
    }
}
