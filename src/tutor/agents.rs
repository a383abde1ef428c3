use strum::{Display, IntoStaticStr};

// AgentId — stable identifier of one generation role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum AgentId {
    #[strum(serialize = "planner_agent")]
    Planner,
    #[strum(serialize = "intuition_agent")]
    Intuition,
    #[strum(serialize = "examples_agent")]
    Examples,
    #[strum(serialize = "proof_agent")]
    Proof,
    #[strum(serialize = "history_agent")]
    History,
    #[strum(serialize = "visualization_agent")]
    VisualizationIdea,
    #[strum(serialize = "web_research_agent")]
    WebResearch,
}

impl AgentId {
    pub const ALL: [Self; 7] = [
        Self::Planner,
        Self::Intuition,
        Self::Examples,
        Self::Proof,
        Self::History,
        Self::VisualizationIdea,
        Self::WebResearch,
    ];

    /// Auxiliary agents in the order their sections are appended.
    pub const AUXILIARY: [Self; 5] = [
        Self::Intuition,
        Self::Examples,
        Self::Proof,
        Self::History,
        Self::VisualizationIdea,
    ];

    pub fn id(self) -> &'static str {
        self.into()
    }

    /// Section heading for agents whose output is appended to a solution.
    pub const fn heading(self) -> Option<&'static str> {
        match self {
            Self::Planner => None,
            Self::Intuition => Some("💡 **Intuition**"),
            Self::Examples => Some("🧪 **Examples**"),
            Self::Proof => Some("🧾 **Proof Sketch**"),
            Self::History => Some("📜 **History**"),
            Self::VisualizationIdea => Some("🖼️ **Visualization Idea**"),
            Self::WebResearch => Some("🌐 **Web-Verified Notes**"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_stable() {
        assert_eq!(AgentId::Planner.id(), "planner_agent");
        assert_eq!(AgentId::VisualizationIdea.to_string(), "visualization_agent");
        assert_eq!(AgentId::WebResearch.id(), "web_research_agent");
    }

    #[test]
    fn only_planner_lacks_a_heading() {
        for agent in AgentId::ALL {
            assert_eq!(agent.heading().is_none(), agent == AgentId::Planner);
        }
    }
}
