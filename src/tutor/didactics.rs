//! Structured explanations, quality checks and study aids around an answer.

use super::types::Check;
use crate::checker::{SymbolicChecker, names};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

const MIN_EXPLANATION_CHARS: usize = 30;
const AXIOMATIC_REFERENCE_CHARS: usize = 600;
const MAX_HINTS: usize = 4;
const MAX_TAKEAWAYS: usize = 3;
const MIN_TAKEAWAY_CHARS: usize = 18;
const MAX_NEXT_QUESTIONS: usize = 5;
const FOCUS_TRIM: &[char] = &[' ', '?', '!', '.', ',', ':'];

const EMPTY_PLAIN: &str = "I could not generate a full explanation yet.";

const EIGEN_AXIOMATIC: &str = "Axiomatic view:\n\
1. Definition: For a linear map represented by matrix \\(A\\), an eigenvector \\(v \\neq 0\\) satisfies \\(A\\mathbf{v}=\\lambda\\mathbf{v}\\).\n\
2. Existence condition: Non-trivial \\(v\\) exists only when \\(\\det(A-\\lambda I)=0\\).\n\
3. Construction: For each root \\(\\lambda\\), solve \\((A-\\lambda I)\\mathbf{v}=0\\).\n\
4. Interpretation: Eigenvectors are invariant directions under the map.";

const GENERIC_AXIOMATIC: &str = "Axiomatic view:\n\
1. State the core definitions and symbols first.\n\
2. List assumptions/conditions where the statement holds.\n\
3. Derive the result step-by-step from definitions.\n\
4. Conclude with the formal statement and scope.";

pub mod quality {
    pub const NON_EMPTY_EXPLANATION: &str = "non_empty_explanation";
    pub const CONTAINS_MATH_NOTATION: &str = "contains_math_notation";
    pub const INCLUDES_EXAMPLES: &str = "includes_examples";
}

// StructuredExplanation — plain and axiomatic views plus verdicts and hints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredExplanation {
    pub plain: String,
    pub axiomatic: String,
    pub checks: Vec<Check>,
    pub hints: Vec<String>,
}

// ExplanationMode — which view(s) a learner asked to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ExplanationMode {
    Plain,
    Axiomatic,
    #[default]
    Both,
}

// LearnerLevel — audience the follow-up prompts are phrased for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LearnerLevel {
    Kids,
    #[default]
    Teen,
    College,
    Adult,
}

impl LearnerLevel {
    /// Unknown labels fall back to `teen`.
    pub fn parse_lossy(label: &str) -> Self {
        label.trim().parse().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningAids {
    pub takeaways: Vec<String>,
    pub next_questions: Vec<String>,
}

pub fn build_structured_explanations(
    checker: &SymbolicChecker,
    question: &str,
    solution: &str,
) -> StructuredExplanation {
    let mut checks = quality_checks(solution);
    checks.extend(checker.run(question, solution));
    let hints = improvement_hints(&checks);
    StructuredExplanation {
        plain: plain_explanation(solution),
        axiomatic: axiomatic_explanation(question, solution),
        checks,
        hints,
    }
}

fn plain_explanation(solution: &str) -> String {
    let text = solution.trim();
    if text.is_empty() {
        EMPTY_PLAIN.to_string()
    } else {
        text.to_string()
    }
}

fn axiomatic_explanation(question: &str, solution: &str) -> String {
    if question.to_lowercase().contains("eigen") {
        return EIGEN_AXIOMATIC.to_string();
    }
    let reference: String = solution
        .trim()
        .chars()
        .take(AXIOMATIC_REFERENCE_CHARS)
        .collect();
    format!("{GENERIC_AXIOMATIC}\n\nReference explanation:\n{reference}")
}

fn quality_checks(solution: &str) -> Vec<Check> {
    let text = solution.trim();
    let has_math = ["\\(", "\\[", "$", "="].iter().any(|m| text.contains(m));
    vec![
        Check::verdict(
            quality::NON_EMPTY_EXPLANATION,
            text.chars().count() > MIN_EXPLANATION_CHARS,
            "Explanation length is sufficient.",
            "Explanation is too short.",
        ),
        Check::verdict(
            quality::CONTAINS_MATH_NOTATION,
            has_math,
            "Includes mathematical notation.",
            "No explicit mathematical notation detected.",
        ),
        Check::verdict(
            quality::INCLUDES_EXAMPLES,
            text.to_lowercase().contains("example"),
            "Contains at least one worked example section.",
            "No explicit examples section found.",
        ),
    ]
}

fn hint_for(check: &Check) -> &'static str {
    match check.name.as_str() {
        quality::INCLUDES_EXAMPLES => "Add 1-2 concrete worked examples with numbers.",
        quality::CONTAINS_MATH_NOTATION => "Include the key equation and define each symbol.",
        names::DERIVATIVE_MATCH | names::INTEGRAL_MATCH => {
            "Re-check symbolic steps and ensure final expression is simplified."
        }
        names::EQUATION_ROOTS => "Verify roots by substitution back into the original equation.",
        n if n.starts_with("eigen_") => {
            "Include both Av=lambda v and det(A-lambda I)=0 for completeness."
        }
        _ => "Clarify assumptions and provide a concise verification step.",
    }
}

fn improvement_hints(checks: &[Check]) -> Vec<String> {
    let mut hints: Vec<String> = Vec::new();
    for check in checks.iter().filter(|c| !c.passed()) {
        let hint = hint_for(check);
        if !hints.iter().any(|h| h == hint) {
            hints.push(hint.to_string());
        }
    }
    hints.truncate(MAX_HINTS);
    hints
}

/// Corrective note for the first warned symbolic rule, `None` when all pass.
pub fn build_self_correction(
    checker: &SymbolicChecker,
    question: &str,
    checks: &[Check],
) -> Option<String> {
    let warned = |name: &str| checks.iter().any(|c| !c.passed() && c.name == name);
    if checks.iter().all(Check::passed) {
        return None;
    }

    if warned(names::DERIVATIVE_MATCH)
        && let Some((target, derivative)) = checker.expected_derivative(question)
    {
        return Some(format!(
            "Self-correction:\nDifferentiate \\({target}\\) term-by-term.\nCorrect derivative: \\({derivative}\\)."
        ));
    }

    if warned(names::INTEGRAL_MATCH)
        && let Some((target, antiderivative)) = checker.expected_antiderivative(question)
    {
        return Some(format!(
            "Self-correction:\nIntegrate \\({target}\\) term-by-term.\nCorrect antiderivative: \\({antiderivative} + C\\)."
        ));
    }

    if warned(names::EQUATION_ROOTS)
        && let Some((lhs, roots)) = checker.expected_roots(question)
    {
        let listed: Vec<String> = roots.iter().map(ToString::to_string).collect();
        return Some(format!(
            "Self-correction:\nSolve \\({lhs}=0\\) and verify by substitution.\nExpected roots: \\({}\\).",
            listed.join(", ")
        ));
    }

    if checks
        .iter()
        .any(|c| !c.passed() && c.name.starts_with("eigen_"))
    {
        return Some(
            "Self-correction:\nFor eigen problems, include both conditions:\n\
             1) \\(A\\mathbf{v}=\\lambda\\mathbf{v}\\)\n\
             2) \\(\\det(A-\\lambda I)=0\\)."
                .to_string(),
        );
    }

    Some(
        "Self-correction: Re-state assumptions, show one verified step, and recompute the final result."
            .to_string(),
    )
}

pub fn compose_solution_for_mode(mode: ExplanationMode, plain: &str, axiomatic: &str) -> String {
    match mode {
        ExplanationMode::Plain => plain.to_string(),
        ExplanationMode::Axiomatic => axiomatic.to_string(),
        ExplanationMode::Both => format!("{plain}\n\n---\n\n{axiomatic}").trim().to_string(),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    text.get(..prefix.len())
        .filter(|head| head.eq_ignore_ascii_case(prefix))
        .map(|_| &text[prefix.len()..])
}

/// Core concept of a question, with stacked "can you explain ..." wrappers removed.
pub fn extract_learning_focus(question: &str) -> String {
    const PREFIXES: &[&str] = &[
        "i am still confused about ",
        "can you explain ",
        "can you show ",
        "can you give me ",
        "can you ask me ",
        "can you derive ",
        "can you test me ",
        "could you explain ",
        "please explain ",
        "explain ",
        "show ",
        "give me ",
        "ask me ",
        "derive ",
        "test me ",
    ];
    const SUFFIXES: &[&str] = &[
        "in simpler words with one analogy",
        "with one analogy",
        "using practical numbers",
        "with one real-world application",
        "from first principles",
        "step by step",
    ];

    let collapsed = collapse_whitespace(question);
    let mut text = collapsed.trim_matches(&[' ', '?', '!', '.'][..]).to_string();
    if text.is_empty() {
        return "this topic".to_string();
    }

    for _ in 0..4 {
        let Some(rest) = PREFIXES
            .iter()
            .find_map(|p| strip_prefix_ignore_case(&text, p))
        else {
            break;
        };
        text = rest.trim_matches(FOCUS_TRIM).to_string();
    }

    // Template wrappers keep only the concept after the last connective.
    let lowered = text.to_ascii_lowercase();
    for token in [" for ", " on ", " about "] {
        if let Some(idx) = lowered.rfind(token)
            && idx + token.len() < text.len()
        {
            let candidate = text[idx + token.len()..].trim_matches(FOCUS_TRIM);
            if candidate.chars().count() >= 6 {
                text = candidate.to_string();
                break;
            }
        }
    }

    for suffix in SUFFIXES {
        let lowered = text.to_ascii_lowercase();
        if lowered.ends_with(suffix) {
            text = text[..text.len() - suffix.len()]
                .trim_matches(FOCUS_TRIM)
                .to_string();
        }
    }

    let text = collapse_whitespace(&text);
    let text = text.trim_matches(&[' ', '?', '!', '.'][..]);
    if text.is_empty() {
        "this topic".to_string()
    } else {
        text.to_string()
    }
}

fn takeaways(plain: &str) -> Vec<String> {
    let picked: Vec<String> = plain
        .lines()
        .map(|l| l.trim_matches(&[' ', '-', '•', '\t'][..]))
        .filter(|l| l.chars().count() >= MIN_TAKEAWAY_CHARS)
        .filter(|l| {
            let lowered = l.to_lowercase();
            !["example", "self-correction", "axiomatic"]
                .iter()
                .any(|p| lowered.starts_with(p))
        })
        .take(MAX_TAKEAWAYS)
        .map(str::to_string)
        .collect();
    if picked.is_empty() {
        vec![
            "Focus on the main equation, one worked example, and one intuition sentence."
                .to_string(),
        ]
    } else {
        picked
    }
}

pub fn build_learning_aids(
    question: &str,
    plain: &str,
    checks: &[Check],
    level: LearnerLevel,
) -> LearningAids {
    let q = extract_learning_focus(question);
    let mut next_questions = match level {
        LearnerLevel::Kids => vec![
            format!("Can you explain {q} like a story with simple words?"),
            format!("Can you show one picture-style example for {q}?"),
            format!("Can you ask me 2 easy check questions for {q}?"),
        ],
        LearnerLevel::College => vec![
            format!("Can you derive the key result for {q} from first principles?"),
            format!("Can you give one formal example and one counterexample for {q}?"),
            format!("Can you test me with a proof-oriented question on {q}?"),
        ],
        LearnerLevel::Adult => vec![
            format!("Can you explain {q} with one real-world application?"),
            format!("Can you show a worked example for {q} using practical numbers?"),
            format!("Can you give a quick self-check quiz on {q}?"),
        ],
        LearnerLevel::Teen => vec![
            format!("Can you explain {q} in simpler words with one analogy?"),
            format!("Can you show one worked example for {q}?"),
            format!("Can you give me a 2-question quiz on {q}?"),
        ],
    };
    if checks.iter().any(|c| !c.passed()) {
        next_questions.insert(
            0,
            format!("I am still confused about {q}. Can we go one step at a time?"),
        );
    }
    if q.to_lowercase().contains("eigen") {
        next_questions.push("Can you show how Av=lambda v appears geometrically?".to_string());
    }
    next_questions.truncate(MAX_NEXT_QUESTIONS);

    LearningAids {
        takeaways: takeaways(plain),
        next_questions,
    }
}

/// Level-specific preamble in front of the plain explanation.
pub fn adapt_plain_for_level(plain: &str, level: LearnerLevel, question: &str) -> String {
    let q = question.trim();
    let q = if q.is_empty() { "this topic" } else { q };
    let body = plain.trim();
    let preamble = match level {
        LearnerLevel::Teen => return body.to_string(),
        LearnerLevel::Kids => format!(
            "Kid-friendly mode for **{q}**:\n\
             - We use very simple words.\n\
             - We connect ideas to everyday objects.\n\
             - We do one tiny step at a time."
        ),
        LearnerLevel::College => format!(
            "College mode for **{q}**:\n\
             - Keep formal notation and definitions precise.\n\
             - Include assumptions and concise derivations."
        ),
        LearnerLevel::Adult => format!(
            "Adult learner mode for **{q}**:\n\
             - Focus on intuition first, then formula.\n\
             - Connect each step to practical interpretation."
        ),
    };
    format!("{preamble}\n\n{body}").trim().to_string()
}
