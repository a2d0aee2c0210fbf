//! The per-tool configuration table. Each tool is the same submit/poll cycle
//! with its own event name, field names and budget.

use std::time::Duration;

use crate::polling::{PollConfig, TerminalStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    ResumeAnalyzer,
    CoverLetter,
    Roadmap,
    CareerChat,
}

/// Static description of one tool's job protocol.
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    /// Event name the runner dispatches on.
    pub event_name: &'static str,
    /// Discriminator stored with the result; also the UI route of the tool.
    pub agent_type: &'static str,
    /// Request/response/event field carrying the correlation id, if the tool
    /// persists a result.
    pub correlation_field: Option<&'static str>,
    /// Event field carrying the tool's raw input.
    pub input_field: &'static str,
    /// Whether a signed-in user is required.
    pub requires_user: bool,
    pub poll: PollConfig,
}

const RESUME: ToolSpec = ToolSpec {
    event_name: "AiResumeAgent",
    agent_type: "/ai-tools/ai-resume-analyzer",
    correlation_field: Some("recordId"),
    input_field: "resumeText",
    requires_user: true,
    poll: PollConfig::new(120, Duration::from_millis(500), TerminalStrategy::CompletedOnly),
};

const COVER_LETTER: ToolSpec = ToolSpec {
    event_name: "AiCoverLetterAgent",
    agent_type: "/ai-tools/ai-cover-letter-agent",
    correlation_field: Some("coverid"),
    input_field: "userInput",
    requires_user: true,
    poll: PollConfig::new(60, Duration::from_millis(1000), TerminalStrategy::FirstOutput),
};

const ROADMAP: ToolSpec = ToolSpec {
    event_name: "AIRoadmapAgent",
    agent_type: "/ai-tools/ai-roadmap-agent",
    correlation_field: Some("roadmapId"),
    input_field: "userInput",
    requires_user: true,
    poll: PollConfig::new(90, Duration::from_millis(1000), TerminalStrategy::FirstOutput),
};

const CAREER_CHAT: ToolSpec = ToolSpec {
    event_name: "AiCareerAgent",
    agent_type: "/ai-tools/ai-chat",
    correlation_field: None,
    input_field: "userInput",
    requires_user: false,
    poll: PollConfig::new(120, Duration::from_millis(500), TerminalStrategy::CompletedOnly),
};

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::ResumeAnalyzer,
        ToolKind::CoverLetter,
        ToolKind::Roadmap,
        ToolKind::CareerChat,
    ];

    pub fn spec(self) -> &'static ToolSpec {
        match self {
            ToolKind::ResumeAnalyzer => &RESUME,
            ToolKind::CoverLetter => &COVER_LETTER,
            ToolKind::Roadmap => &ROADMAP,
            ToolKind::CareerChat => &CAREER_CHAT,
        }
    }

    pub fn from_event_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.spec().event_name == name)
    }
}
