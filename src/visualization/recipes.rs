//! Deterministic chart recipes keyed on topic keywords.
//!
//! Used when the model plan carries no usable visualization but the
//! question is clearly about a picturable topic.

use crate::tutor::types::{VisualizationKind, VisualizationRequest};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use strum::{Display, EnumIter, IntoEnumIterator};

/// Keywords that make a question worth a picture even when nobody asked.
const VISUAL_TOPIC_TOKENS: &[&str] = &[
    "graph theory",
    "hamiltonian",
    "euler path",
    "euler circuit",
    "fraction",
    "system of equations",
    "systems of equations",
    "simultaneous equations",
    "linear system",
    "imaginary",
    "complex number",
    "complex plane",
    "eigen",
    "parabola",
    "quadratic",
    "sine",
    "cosine",
    "trig",
    "sin(",
    "cos(",
    "derivative",
    "tangent",
    "vector",
    "matrix",
    "probability distribution",
    "normal distribution",
    "histogram",
    "slope",
];

// Recipe — one canned chart, matched in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Recipe {
    HamiltonianCycle,
    Fractions,
    LinearSystem,
    ComplexPlane,
    Eigenvectors,
    Parabola,
    Trigonometry,
    TangentLine,
}

impl Recipe {
    fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::HamiltonianCycle => &["hamiltonian graph", "hamiltonian cycle", "hamiltonian path"],
            Self::Fractions => &["fraction"],
            Self::LinearSystem => &[
                "system of equations",
                "systems of equations",
                "simultaneous equations",
                "linear system",
            ],
            Self::ComplexPlane => &["imaginary", "complex number", "complex plane"],
            Self::Eigenvectors => &["eigenvalue", "eigenvector"],
            Self::Parabola => &["parabola", "quadratic"],
            Self::Trigonometry => &["sine", "cosine", "trig", "sin(", "cos("],
            Self::TangentLine => &["derivative", "tangent"],
        }
    }

    pub fn matches(self, lowered: &str) -> bool {
        self.keywords().iter().any(|k| lowered.contains(k))
    }

    pub const fn goal(self) -> &'static str {
        match self {
            Self::HamiltonianCycle => "Hamiltonian cycle on a sample graph",
            Self::Fractions => "Fraction as parts of a whole",
            Self::LinearSystem => "Intersection point for a system of linear equations",
            Self::ComplexPlane => "Complex plane: real and imaginary axes",
            Self::Eigenvectors => "Eigenvectors under a linear transformation",
            Self::Parabola => "Quadratic curve visualization",
            Self::Trigonometry => "Sine and cosine wave intuition",
            Self::TangentLine => "Function with tangent line at a point",
        }
    }

    fn parameters(self) -> Value {
        match self {
            Self::HamiltonianCycle => json!({"nodes": 6, "cycle": [0, 1, 2, 3, 4, 5, 0]}),
            Self::Fractions => json!({"fraction": [3, 4]}),
            Self::LinearSystem => json!({"equations": ["y=2x+1", "y=-x+4"]}),
            Self::ComplexPlane => json!({"points": [[3, 2], [1, -1], [-2, 1]]}),
            Self::Eigenvectors => json!({"matrix": [[2, 0], [0, 1]], "vectors": [[1, 0], [1, 1]]}),
            Self::Parabola => json!({"a": 1, "b": 0, "c": -2}),
            Self::Trigonometry => json!({"domain": [0, 6.28]}),
            Self::TangentLine => json!({"function": "x**2", "x0": 1.0}),
        }
    }

    pub const fn source(self) -> &'static str {
        match self {
            Self::HamiltonianCycle => include_str!("recipes/hamiltonian_cycle.py"),
            Self::Fractions => include_str!("recipes/fractions.py"),
            Self::LinearSystem => include_str!("recipes/linear_system.py"),
            Self::ComplexPlane => include_str!("recipes/complex_plane.py"),
            Self::Eigenvectors => include_str!("recipes/eigenvectors.py"),
            Self::Parabola => include_str!("recipes/parabola.py"),
            Self::Trigonometry => include_str!("recipes/trigonometry.py"),
            Self::TangentLine => include_str!("recipes/tangent_line.py"),
        }
    }

    pub fn to_request(self) -> VisualizationRequest {
        let parameters = match self.parameters() {
            Value::Object(map) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        };
        VisualizationRequest {
            kind: VisualizationKind::Chart,
            goal: self.goal().to_string(),
            parameters,
            code: Some(self.source().to_string()),
        }
    }
}

/// Keyword-driven chooser over [`Recipe`].
#[derive(Debug, Default, Clone, Copy)]
pub struct VisualizationPlanner;

impl VisualizationPlanner {
    pub const fn new() -> Self {
        Self
    }

    pub fn recipe_for(&self, question: &str) -> Option<Recipe> {
        let lowered = question.to_lowercase();
        Recipe::iter().find(|r| r.matches(&lowered))
    }

    /// First matching recipe as a chart request, `None` when nothing fits.
    pub fn plan(&self, question: &str) -> Option<VisualizationRequest> {
        self.recipe_for(question).map(Recipe::to_request)
    }

    pub fn is_visual_topic(&self, question: &str) -> bool {
        let lowered = question.to_lowercase();
        VISUAL_TOPIC_TOKENS.iter().any(|t| lowered.contains(t))
    }
}
