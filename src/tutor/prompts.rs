use super::agents::AgentId;
use super::types::HistoryTurn;
use serde::Serialize;
use tera::{Context, Tera};

pub const SYSTEM_PROMPT: &str = r#"You are a local math tutor that outputs STRICT JSON.
Solve the problem step-by-step and decide if a visualization helps.

Rules:
- Output ONLY valid JSON. No markdown, no extra text.
- If needs_visualization is false, visualization must be null.
- If needs_visualization is true, include:
  - type: "manim" or "plotly"
  - goal: short description
  - parameters: object
  - code: Python code string
- If the question explicitly asks for a visualization/plot/animation, set needs_visualization = true
  and ALWAYS include usable code. Prefer Plotly if unsure.
- In the solution, include 2-3 concise examples labeled "Examples:".
- Also provide:
  - plain_explanation: plain English explanation for learners
  - axiomatic_explanation: definition -> assumptions -> derivation style explanation
  - checks: array of {name, status(pass|warn), details}
- Use LaTeX delimiters for equations and symbols, e.g., \(\lambda\), \(A\mathbf{v}=\lambda\mathbf{v}\).

Code rules:
- Plotly: must create a variable named fig (plotly.graph_objects or plotly.express).
- Manim: must define a Scene class named GeneratedScene."#;

const PLANNER_TEMPLATE: &str = "\
{{ system }}

{{ history }}Question: {{ question }}

Return the JSON object now.";

const INTUITION_TEMPLATE: &str = "\
{{ history }}Provide a short intuition for: {{ question }}
Use LaTeX for symbols like \\(\\lambda\\). Keep it 3-5 sentences.";

const EXAMPLES_TEMPLATE: &str = "\
{{ history }}Provide 2-3 concise examples for: {{ question }}
Format as bullet points. Use LaTeX for math.";

const PROOF_TEMPLATE: &str = "\
{{ history }}Provide a short proof sketch or justification for: {{ question }}
Keep it brief and use LaTeX for math.";

const HISTORY_TEMPLATE: &str = "\
{{ history }}Provide a brief historical note or anecdote related to: {{ question }}
Keep it 2-3 sentences.";

const VISUALIZATION_TEMPLATE: &str = "\
{{ history }}Describe a visualization idea for: {{ question }}
Keep it 2-3 sentences and focus on intuition.";

const WEB_RESEARCH_TEMPLATE: &str = "\
Question: {{ question }}
Using only the retrieved web snippets, write 3 concise bullet points that improve factual coverage.
Keep wording learner-friendly and avoid speculation.
End with a short 'Sources:' list using the provided URLs.

Retrieved snippets:
{% for s in snippets %}- {{ s.title }}: {{ s.snippet }} (source: {{ s.url }})
{% endfor %}";

const PLANNER_NAME: &str = "planner";
const WEB_RESEARCH_NAME: &str = "web_research_agent";

/// Snippet text longer than this is cut before it reaches a prompt.
pub const SNIPPET_PROMPT_CHARS: usize = 320;

#[derive(Serialize)]
pub struct SnippetLine<'a> {
    pub title: &'a str,
    pub snippet: String,
    pub url: &'a str,
}

impl<'a> SnippetLine<'a> {
    pub fn new(title: &'a str, snippet: &str, url: &'a str) -> Self {
        Self {
            title,
            snippet: snippet.chars().take(SNIPPET_PROMPT_CHARS).collect(),
            url,
        }
    }
}

/// `Conversation context:` block over the last `window` turns, or an empty
/// string when there is nothing to show.
pub fn format_history(history: &[HistoryTurn], window: usize) -> String {
    let start = history.len().saturating_sub(window);
    let lines: Vec<String> = history[start..]
        .iter()
        .filter(|turn| !turn.content.trim().is_empty())
        .map(|turn| format!("{}: {}", capitalize(&turn.role), turn.content))
        .collect();
    if lines.is_empty() {
        return String::new();
    }
    format!("Conversation context:\n{}\n\n", lines.join("\n"))
}

fn capitalize(role: &str) -> String {
    let role = if role.trim().is_empty() { "user" } else { role.trim() };
    let mut chars = role.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}

/// Tera-backed registry of every tutor prompt.
pub struct PromptBook {
    tera: Tera,
}

impl PromptBook {
    pub fn new() -> anyhow::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (PLANNER_NAME, PLANNER_TEMPLATE),
            (AgentId::Intuition.id(), INTUITION_TEMPLATE),
            (AgentId::Examples.id(), EXAMPLES_TEMPLATE),
            (AgentId::Proof.id(), PROOF_TEMPLATE),
            (AgentId::History.id(), HISTORY_TEMPLATE),
            (AgentId::VisualizationIdea.id(), VISUALIZATION_TEMPLATE),
            (WEB_RESEARCH_NAME, WEB_RESEARCH_TEMPLATE),
        ])?;
        Ok(Self { tera })
    }

    /// Full single-shot prompt: system rules, history block, question.
    pub fn planner(&self, question: &str, history_block: &str) -> anyhow::Result<String> {
        let mut ctx = Context::new();
        ctx.insert("system", SYSTEM_PROMPT);
        ctx.insert("history", history_block);
        ctx.insert("question", question);
        Ok(self.tera.render(PLANNER_NAME, &ctx)?)
    }

    /// Prompt for one auxiliary agent.
    pub fn agent(
        &self,
        agent: AgentId,
        question: &str,
        history_block: &str,
    ) -> anyhow::Result<String> {
        let mut ctx = Context::new();
        ctx.insert("history", history_block);
        ctx.insert("question", question);
        Ok(self.tera.render(agent.id(), &ctx)?)
    }

    pub fn web_research(
        &self,
        question: &str,
        snippets: &[SnippetLine<'_>],
    ) -> anyhow::Result<String> {
        let mut ctx = Context::new();
        ctx.insert("question", question);
        ctx.insert("snippets", snippets);
        Ok(self.tera.render(WEB_RESEARCH_NAME, &ctx)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_block_keeps_last_turns() {
        let history: Vec<HistoryTurn> = (0..8)
            .map(|i| HistoryTurn::new("user", &format!("turn {i}")))
            .collect();
        let block = format_history(&history, 6);
        assert!(block.starts_with("Conversation context:\n"));
        assert!(!block.contains("turn 1\n"));
        assert!(block.contains("User: turn 2"));
        assert!(block.ends_with("User: turn 7\n\n"));
    }

    #[test]
    fn history_block_skips_empty_turns() {
        let history = vec![
            HistoryTurn::new("assistant", ""),
            HistoryTurn::new("ASSISTANT", "Hi"),
        ];
        assert_eq!(
            format_history(&history, 10),
            "Conversation context:\nAssistant: Hi\n\n"
        );
        assert_eq!(format_history(&[], 10), "");
    }

    #[test]
    fn planner_prompt_embeds_rules_history_and_question() {
        let book = PromptBook::new().unwrap();
        let prompt = book
            .planner("What is 2+2?", "Conversation context:\nUser: hi\n\n")
            .unwrap();
        assert!(prompt.starts_with("You are a local math tutor"));
        assert!(prompt.contains("GeneratedScene"));
        assert!(prompt.contains("User: hi\n\nQuestion: What is 2+2?"));
        assert!(prompt.ends_with("Return the JSON object now."));
    }

    #[test]
    fn agent_prompts_are_distinct() {
        let book = PromptBook::new().unwrap();
        let intuition = book.agent(AgentId::Intuition, "eigenvalues", "").unwrap();
        let proof = book.agent(AgentId::Proof, "eigenvalues", "").unwrap();
        assert!(intuition.starts_with("Provide a short intuition for: eigenvalues"));
        assert!(intuition.contains(r"\(\lambda\)"));
        assert!(proof.contains("proof sketch"));
    }

    #[test]
    fn web_research_prompt_lists_truncated_snippets() {
        let book = PromptBook::new().unwrap();
        let long = "x".repeat(400);
        let lines = vec![SnippetLine::new("Eigenvalue", &long, "https://example.org/e")];
        let prompt = book.web_research("eigenvalues", &lines).unwrap();
        assert!(prompt.contains(&format!("- Eigenvalue: {} (source: https://example.org/e)", "x".repeat(320))));
        assert!(!prompt.contains(&"x".repeat(321)));
    }
}
