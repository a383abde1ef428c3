use super::support::{PagesBackend, web};

const RIEMANN: &str = "The Riemann hypothesis is a conjecture that the Riemann zeta function has its zeros only at the negative even integers and complex numbers with real part 1/2. It is unsolved.";

#[tokio::test]
async fn notes_are_appended_once() {
    let enricher = web(
        PagesBackend::new(&[("Riemann hypothesis", RIEMANN)]),
        true,
    );
    let draft = "The hypothesis concerns the zeros of zeta.";

    let enriched = enricher.enrich("Explain the Riemann hypothesis", draft).await;
    assert!(enriched.starts_with(draft));
    assert!(enriched.contains("**Web RAG Notes**"));
    assert!(enriched.contains("https://en.wikipedia.org/wiki/Riemann_hypothesis"));

    let again = enricher.enrich("Explain the Riemann hypothesis", &enriched).await;
    assert_eq!(again, enriched);
}

#[tokio::test]
async fn ordinary_questions_are_left_alone() {
    let enricher = web(
        PagesBackend::new(&[("Riemann hypothesis", RIEMANN)]),
        true,
    );
    let draft = "2 + 2 = 4.";
    assert_eq!(enricher.enrich("What is 2 + 2?", draft).await, draft);
}

#[tokio::test]
async fn disabled_enricher_returns_input() {
    let enricher = web(
        PagesBackend::new(&[("Riemann hypothesis", RIEMANN)]),
        false,
    );
    let draft = "Zeta zeros.";
    assert_eq!(enricher.enrich("Explain the Riemann hypothesis", draft).await, draft);
}
