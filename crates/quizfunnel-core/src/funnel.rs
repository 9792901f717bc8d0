use serde::{Deserialize, Serialize};

/// Typing this literal into the name-collection field routes the visitor to
/// the dashboard and suppresses the session's analytics instead of
/// continuing the quiz.
pub const DASHBOARD_COMMAND: &str = "enter_dashboard";

/// The quiz steps tracked as `step` events, in funnel order. The intro view
/// is the landing screen and is counted through `visit`, never as a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStep {
    Name,
    Assessment,
    Routine,
    Intention,
    AudioMessage,
    Transition,
}

impl FunnelStep {
    pub const ALL: [FunnelStep; 6] = [
        FunnelStep::Name,
        FunnelStep::Assessment,
        FunnelStep::Routine,
        FunnelStep::Intention,
        FunnelStep::AudioMessage,
        FunnelStep::Transition,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FunnelStep::Name => "name",
            FunnelStep::Assessment => "assessment",
            FunnelStep::Routine => "routine",
            FunnelStep::Intention => "intention",
            FunnelStep::AudioMessage => "audio_message",
            FunnelStep::Transition => "transition",
        }
    }

    /// Dashboard row label for this step's funnel bar.
    pub fn label(&self) -> &'static str {
        match self {
            FunnelStep::Name => "Foi para Nome",
            FunnelStep::Assessment => "Respondeu Avaliação",
            FunnelStep::Routine => "Respondeu Rotina",
            FunnelStep::Intention => "Respondeu Intenção",
            FunnelStep::AudioMessage => "Ouviu Áudio",
            FunnelStep::Transition => "Viu Resultado",
        }
    }

    pub fn parse(raw: &str) -> Option<FunnelStep> {
        FunnelStep::ALL.into_iter().find(|s| s.as_str() == raw)
    }
}

impl std::fmt::Display for FunnelStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the visitor typed into the name field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameInput {
    Name(String),
    /// The operator entry point was typed instead of a name.
    DashboardRequest,
}

/// The name screen doubles as the operator entry point: the literal
/// [`DASHBOARD_COMMAND`] opens the dashboard (and marks the session ignored)
/// instead of advancing the quiz.
pub fn classify_name_input(raw: &str) -> NameInput {
    let trimmed = raw.trim();
    if trimmed == DASHBOARD_COMMAND {
        NameInput::DashboardRequest
    } else {
        NameInput::Name(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_names_round_trip() {
        for step in FunnelStep::ALL {
            assert_eq!(FunnelStep::parse(step.as_str()), Some(step));
        }
        assert_eq!(FunnelStep::parse("intro"), None);
    }

    #[test]
    fn serde_names_match_as_str() {
        for step in FunnelStep::ALL {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(json, format!("\"{}\"", step.as_str()));
        }
    }

    #[test]
    fn dashboard_command_is_detected() {
        assert_eq!(
            classify_name_input("enter_dashboard"),
            NameInput::DashboardRequest
        );
        assert_eq!(
            classify_name_input("  enter_dashboard  "),
            NameInput::DashboardRequest
        );
    }

    #[test]
    fn ordinary_names_pass_through_trimmed() {
        assert_eq!(
            classify_name_input("  Maria "),
            NameInput::Name("Maria".to_string())
        );
    }
}
