use euclid_tutor::checker::SymbolicChecker;
use euclid_tutor::tutor::{Check, CheckStatus, didactics};

fn status(checks: &[Check], name: &str) -> CheckStatus {
    checks
        .iter()
        .find(|c| c.name == name)
        .unwrap_or_else(|| panic!("no check named {name} in {checks:?}"))
        .status
}

#[test]
fn derivative_match_passes_and_warns() {
    let checker = SymbolicChecker::default();
    let q = "Differentiate x^2 + 3*x";
    assert_eq!(
        status(&checker.run(q, "Derivative: 2*x + 3"), "derivative_symbolic_match"),
        CheckStatus::Pass
    );
    assert_eq!(
        status(&checker.run(q, "Derivative: x"), "derivative_symbolic_match"),
        CheckStatus::Warn
    );
}

#[test]
fn equation_roots_must_all_appear() {
    let checker = SymbolicChecker::default();
    let q = "Solve x^2 - 5x + 6 = 0";
    assert_eq!(
        status(&checker.run(q, "The roots are x = 2 and x = 3"), "equation_roots_match"),
        CheckStatus::Pass
    );
    assert_eq!(
        status(&checker.run(q, "x = 2"), "equation_roots_match"),
        CheckStatus::Warn
    );
}

#[test]
fn integral_differential_is_not_part_of_the_integrand() {
    let checker = SymbolicChecker::default();
    assert_eq!(
        status(&checker.run("Integrate x^2 dx", "x^3/3 + C"), "integral_symbolic_match"),
        CheckStatus::Pass
    );
    assert_eq!(
        status(&checker.run("∫ sin(x) dx", "-cos(x) + C"), "integral_symbolic_match"),
        CheckStatus::Pass
    );
}

#[test]
fn deeply_nested_question_warns() {
    let checker = SymbolicChecker::default();
    let q = format!("Differentiate {}x{}", "(".repeat(5_000), ")".repeat(5_000));
    assert_eq!(
        status(&checker.run(&q, "1"), "derivative_symbolic_match"),
        CheckStatus::Warn
    );
}

#[test]
fn running_twice_gives_identical_checks() {
    let checker = SymbolicChecker::default();
    let cases = [
        ("Differentiate x^2 + 3*x", "Derivative: 2*x + 3"),
        ("Integrate 2*x", "\\int 2x dx = x^2 + C"),
        ("Solve x^2 - 5x + 6 = 0", "x = 2"),
        ("What are eigenvalues?", "Av = λv and det(A - λI) = 0"),
        ("Differentiate sin(", "not an expression"),
    ];
    for (q, s) in cases {
        assert_eq!(checker.run(q, s), checker.run(q, s), "{q}");
    }
}

#[test]
fn missing_backend_warns_instead_of_failing() {
    let checker = SymbolicChecker::without_backend();
    let checks = checker.run("Differentiate x^2", "2x");
    assert!(checks.iter().all(|c| c.status == CheckStatus::Warn));
    assert!(!checks.is_empty());
}

#[test]
fn structured_explanation_feeds_self_correction() {
    let checker = SymbolicChecker::default();
    let q = "Differentiate x^2 + 3*x";
    let report = didactics::build_structured_explanations(&checker, q, "The derivative is x.");

    assert_eq!(report.plain, "The derivative is x.");
    assert!(report.checks.iter().any(|c| c.name == "non_empty_explanation"));
    assert!(report.hints.len() <= 4);

    let note = didactics::build_self_correction(&checker, q, &report.checks).unwrap();
    assert!(note.contains("Correct derivative: \\(2*x + 3\\)"));
}

#[test]
fn clean_solution_needs_no_correction() {
    let checker = SymbolicChecker::default();
    let q = "Solve x^2 - 5x + 6 = 0";
    let checks = checker.run(q, "The roots are x = 2 and x = 3");
    assert!(didactics::build_self_correction(&checker, q, &checks).is_none());
}
